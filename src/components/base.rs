//! The component capability contract.
//!
//! A [`Component`] is an attachable unit of behavior owned by exactly one
//! [`Entity`](crate::entity::Entity). The entity only talks to it through
//! this trait: it reads the `active` flag, tags and property names to keep
//! its indices current, forwards signals to [`Component::slot`], and calls
//! [`Component::update`] once per frame while the component is active.
//!
//! Most implementors embed a [`ComponentBase`] holding the fields every
//! component shares (id, active flag, tags, entity tags, property names) and
//! only override the behavior hooks.

use std::any::Any;

use serde_json::{Map, Value};

use crate::components::context::ComponentContext;
use crate::entity::signal::SignalData;
use crate::error::{ComponentError, EngineError};
use crate::resources::worldtime::WorldTime;

/// Outcome of an interactive signal (`touches`, `zoom`, `scroll`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Propagation {
    /// `false` stops the event from reaching anything further down the
    /// z-order (or any later subscriber of the same entity).
    pub continue_propagation: bool,
    /// `true` asks the overlord to route the rest of the gesture here.
    pub capture: bool,
}

impl Propagation {
    /// Keep going, no capture. The reply for anything not handled.
    pub const CONTINUE: Propagation = Propagation {
        continue_propagation: true,
        capture: false,
    };
    /// Stop propagation without capturing.
    pub const STOP: Propagation = Propagation {
        continue_propagation: false,
        capture: false,
    };
    /// Stop propagation and capture the stream.
    pub const CAPTURE: Propagation = Propagation {
        continue_propagation: false,
        capture: true,
    };

    pub fn new(continue_propagation: bool, capture: bool) -> Self {
        Self {
            continue_propagation,
            capture,
        }
    }
}

impl Default for Propagation {
    fn default() -> Self {
        Propagation::CONTINUE
    }
}

/// What a component answers when one of its slots is invoked.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SlotReply {
    /// The signal was not handled.
    #[default]
    Ignored,
    /// Answer to an interactive event signal.
    Event(Propagation),
    /// Arbitrary answer to a plain signal.
    Value(Value),
}

impl SlotReply {
    /// Interpret the reply as an event answer. Anything that is not an
    /// [`SlotReply::Event`] lets the event continue uncaptured.
    pub fn propagation(&self) -> Propagation {
        match self {
            SlotReply::Event(p) => *p,
            _ => Propagation::CONTINUE,
        }
    }
}

/// Fields shared by every component.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentBase {
    pub id: String,
    pub active: bool,
    /// Tags used to address this component inside its entity.
    pub tags: Vec<String>,
    /// Tags this component contributes to its entity while active.
    pub entity_tags: Vec<String>,
    /// Property names this component publishes on its entity.
    pub properties: Vec<String>,
}

impl ComponentBase {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            active: true,
            tags: Vec::new(),
            entity_tags: Vec::new(),
            properties: Vec::new(),
        }
    }

    /// Read `active`, `tags` and `entityTags` from a descriptor.
    ///
    /// `tags`/`entityTags` accept either a single string or a list of
    /// strings.
    pub fn from_fields(id: impl Into<String>, fields: &Map<String, Value>) -> Result<Self, ComponentError> {
        let mut base = Self::new(id);
        if let Some(active) = fields.get("active") {
            base.active = active
                .as_bool()
                .ok_or_else(|| ComponentError::invalid_field("active", "expected a boolean"))?;
        }
        if let Some(tags) = fields.get("tags") {
            base.tags = string_list(tags).ok_or_else(|| {
                ComponentError::invalid_field("tags", "expected a string or a list of strings")
            })?;
        }
        if let Some(tags) = fields.get("entityTags") {
            base.entity_tags = string_list(tags).ok_or_else(|| {
                ComponentError::invalid_field("entityTags", "expected a string or a list of strings")
            })?;
        }
        Ok(base)
    }

    pub fn with_properties<I, S>(mut self, properties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.properties = properties.into_iter().map(Into::into).collect();
        self
    }
}

/// Accepts `"tag"` or `["a", "b"]`.
pub fn string_list(value: &Value) -> Option<Vec<String>> {
    match value {
        Value::String(s) => Some(vec![s.clone()]),
        Value::Array(items) => items
            .iter()
            .map(|v| v.as_str().map(str::to_owned))
            .collect(),
        _ => None,
    }
}

/// Read an optional numeric descriptor field.
pub fn f32_field(fields: &Map<String, Value>, name: &str, default: f32) -> Result<f32, ComponentError> {
    match fields.get(name) {
        None | Some(Value::Null) => Ok(default),
        Some(v) => v
            .as_f64()
            .map(|n| n as f32)
            .ok_or_else(|| ComponentError::invalid_field(name, "expected a number")),
    }
}

/// The capability contract between an entity and its components.
pub trait Component: Any + Send + Sync {
    /// Registered type name (e.g. `"Timer"`).
    fn type_name(&self) -> &'static str;

    fn base(&self) -> &ComponentBase;
    fn base_mut(&mut self) -> &mut ComponentBase;

    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;

    fn id(&self) -> &str {
        &self.base().id
    }

    fn active(&self) -> bool {
        self.base().active
    }

    fn tags(&self) -> &[String] {
        &self.base().tags
    }

    fn entity_tags(&self) -> &[String] {
        &self.base().entity_tags
    }

    fn properties(&self) -> &[String] {
        &self.base().properties
    }

    /// Value of one of the names listed in [`Component::properties`].
    fn get_property(&self, _name: &str) -> Option<Value> {
        None
    }

    fn set_property(&mut self, name: &str, _value: Value) -> Result<(), EngineError> {
        Err(EngineError::InvalidProperty {
            name: name.to_owned(),
            reason: format!("{} has no writable property `{name}`", self.type_name()),
        })
    }

    /// Called once when the component is added to an entity. Subscriptions
    /// are usually made here.
    fn attached(&mut self, _ctx: &mut ComponentContext) {}

    /// Second-phase initialization. Returning an error requeues the
    /// component; see [`crate::entity::MAX_INIT_ATTEMPTS`].
    fn init(&mut self, _ctx: &mut ComponentContext, _time: &WorldTime) -> Result<(), ComponentError> {
        Ok(())
    }

    /// Per-frame update, only called while active.
    fn update(&mut self, _ctx: &mut ComponentContext, _time: &WorldTime) {}

    /// Handle a signal.
    fn slot(
        &mut self,
        _signal: &str,
        _sender: Option<&str>,
        _data: &SignalData,
        _ctx: &mut ComponentContext,
    ) -> SlotReply {
        SlotReply::Ignored
    }
}

impl<'a> dyn Component + 'a {
    /// Downcast to a concrete component type.
    pub fn downcast_ref<T: Component>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    pub fn downcast_mut<T: Component>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }
}
