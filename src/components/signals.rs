// Signals: a per-entity blackboard of scalars, integers and flags

use std::any::Any;

use log::warn;
use rustc_hash::{FxHashMap, FxHashSet};
use serde_json::{Map, Value};

use crate::components::base::{Component, ComponentBase, SlotReply};
use crate::components::context::ComponentContext;
use crate::entity::signal::SignalData;
use crate::error::{ComponentError, EngineError};
use crate::resources::typeregistry::{ComponentDescriptor, TypeRegistry};

pub const TYPE_NAME: &str = "Signals";

pub const SET_SCALAR: &str = "set_scalar";
pub const SET_INTEGER: &str = "set_integer";
pub const SET_FLAG: &str = "set_flag";
pub const CLEAR_FLAG: &str = "clear_flag";

/// Named values other components read and write through signals or entity
/// properties. Every key declared in the descriptor is published as a
/// property of the entity.
///
/// ```json
/// { "type": "Signals", "scalars": {"speed": 1.5}, "integers": {"lives": 3}, "flags": ["alive"] }
/// ```
#[derive(Debug, Clone)]
pub struct Signals {
    base: ComponentBase,
    pub scalars: FxHashMap<String, f32>,
    pub integers: FxHashMap<String, i32>,
    pub flags: FxHashSet<String>,
    declared_flags: Vec<String>,
}

impl Signals {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            base: ComponentBase::new(id),
            scalars: FxHashMap::default(),
            integers: FxHashMap::default(),
            flags: FxHashSet::default(),
            declared_flags: Vec::new(),
        }
    }

    pub fn from_descriptor(desc: &ComponentDescriptor<'_>) -> Result<Box<dyn Component>, ComponentError> {
        let mut signals = Self::new(desc.id);
        signals.base = ComponentBase::from_fields(desc.id, desc.fields)?;

        if let Some(scalars) = object_field(desc.fields, "scalars")? {
            for (key, value) in scalars {
                let v = value
                    .as_f64()
                    .ok_or_else(|| ComponentError::invalid_field(format!("scalars.{key}"), "expected a number"))?;
                signals.scalars.insert(key.clone(), v as f32);
            }
        }
        if let Some(integers) = object_field(desc.fields, "integers")? {
            for (key, value) in integers {
                let v = value
                    .as_i64()
                    .and_then(|n| i32::try_from(n).ok())
                    .ok_or_else(|| ComponentError::invalid_field(format!("integers.{key}"), "expected an integer"))?;
                signals.integers.insert(key.clone(), v);
            }
        }
        match desc.fields.get("flags") {
            None | Some(Value::Null) => {}
            Some(Value::Array(items)) => {
                for item in items {
                    let key = item
                        .as_str()
                        .ok_or_else(|| ComponentError::invalid_field("flags", "expected a list of strings"))?;
                    signals.declare_flag(key, true);
                }
            }
            Some(Value::Object(map)) => {
                for (key, value) in map {
                    let set = value
                        .as_bool()
                        .ok_or_else(|| ComponentError::invalid_field(format!("flags.{key}"), "expected a boolean"))?;
                    signals.declare_flag(key, set);
                }
            }
            Some(_) => {
                return Err(ComponentError::invalid_field(
                    "flags",
                    "expected a list of set flags or a mapping of flag to boolean",
                ));
            }
        }

        signals.publish_keys();
        Ok(Box::new(signals))
    }

    fn declare_flag(&mut self, key: &str, set: bool) {
        if !self.declared_flags.iter().any(|f| f == key) {
            self.declared_flags.push(key.to_owned());
        }
        if set {
            self.flags.insert(key.to_owned());
        }
    }

    fn publish_keys(&mut self) {
        let mut keys: Vec<String> = self
            .scalars
            .keys()
            .chain(self.integers.keys())
            .cloned()
            .chain(self.declared_flags.iter().cloned())
            .collect();
        keys.sort();
        keys.dedup();
        self.base.properties = keys;
    }

    pub fn set_scalar(&mut self, key: impl Into<String>, value: f32) {
        self.scalars.insert(key.into(), value);
    }
    pub fn get_scalar(&self, key: &str) -> Option<f32> {
        self.scalars.get(key).copied()
    }
    pub fn set_integer(&mut self, key: impl Into<String>, value: i32) {
        self.integers.insert(key.into(), value);
    }
    pub fn get_integer(&self, key: &str) -> Option<i32> {
        self.integers.get(key).copied()
    }
    pub fn set_flag(&mut self, key: impl Into<String>) {
        self.flags.insert(key.into());
    }
    pub fn clear_flag(&mut self, key: &str) {
        self.flags.remove(key);
    }
    pub fn has_flag(&self, key: &str) -> bool {
        self.flags.contains(key)
    }
}

fn object_field<'a>(fields: &'a Map<String, Value>, name: &str) -> Result<Option<&'a Map<String, Value>>, ComponentError> {
    match fields.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(_) => Err(ComponentError::invalid_field(name, "expected a mapping")),
    }
}

impl Component for Signals {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn base(&self) -> &ComponentBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ComponentBase {
        &mut self.base
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn get_property(&self, name: &str) -> Option<Value> {
        if let Some(v) = self.scalars.get(name) {
            return Some(Value::from(*v as f64));
        }
        if let Some(v) = self.integers.get(name) {
            return Some(Value::from(*v));
        }
        if self.declared_flags.iter().any(|f| f == name) {
            return Some(Value::Bool(self.has_flag(name)));
        }
        None
    }

    fn set_property(&mut self, name: &str, value: Value) -> Result<(), EngineError> {
        let invalid = |reason: &str| EngineError::InvalidProperty {
            name: name.to_owned(),
            reason: reason.to_owned(),
        };
        if self.scalars.contains_key(name) {
            let v = value.as_f64().ok_or_else(|| invalid("expected a number"))?;
            self.set_scalar(name, v as f32);
        } else if self.integers.contains_key(name) {
            let v = value
                .as_i64()
                .and_then(|n| i32::try_from(n).ok())
                .ok_or_else(|| invalid("expected an integer"))?;
            self.set_integer(name, v);
        } else if self.declared_flags.iter().any(|f| f == name) {
            match value.as_bool() {
                Some(true) => self.set_flag(name),
                Some(false) => self.clear_flag(name),
                None => return Err(invalid("expected a boolean")),
            }
        } else {
            return Err(invalid("not a declared signal key"));
        }
        Ok(())
    }

    /// Slots take their arguments from the payload: `key`, plus `value`
    /// for the setters. Setting an undeclared key stores it without
    /// publishing it as a property.
    fn slot(
        &mut self,
        signal: &str,
        _sender: Option<&str>,
        data: &SignalData,
        _ctx: &mut ComponentContext,
    ) -> SlotReply {
        let Some(key) = data.get("key").and_then(Value::as_str) else {
            return SlotReply::Ignored;
        };
        let value = data.get("value");
        match signal {
            SET_SCALAR => match value.and_then(Value::as_f64) {
                Some(v) => self.set_scalar(key, v as f32),
                None => {
                    warn!("{}: `{}` without a numeric value", self.base.id, signal);
                    return SlotReply::Ignored;
                }
            },
            SET_INTEGER => match value.and_then(Value::as_i64).and_then(|n| i32::try_from(n).ok()) {
                Some(v) => self.set_integer(key, v),
                None => {
                    warn!("{}: `{}` without an integer value", self.base.id, signal);
                    return SlotReply::Ignored;
                }
            },
            SET_FLAG => self.set_flag(key),
            CLEAR_FLAG => self.clear_flag(key),
            _ => return SlotReply::Ignored,
        }
        SlotReply::Value(Value::String(key.to_owned()))
    }
}

pub fn register(registry: &mut TypeRegistry) {
    registry.register_component(TYPE_NAME, Signals::from_descriptor);
}
