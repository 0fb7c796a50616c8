//! Entities: composites of components sharing an identity in a scene.
//!
//! An [`Entity`] exclusively owns its components and keeps three indices over
//! them, all keyed by component id:
//!
//! - by tag – only active components are listed under their tags
//! - by signal – subscription order is preserved
//! - by property – property name to the component that publishes it
//!
//! It also keeps the entity's own tag set (the union of the entity tags of
//! its active components). Every change to that set is accumulated in a
//! [`TagDelta`] that the [`Overlord`](crate::resources::overlord::Overlord)
//! drains right after the call that caused it.
//!
//! # Lifecycle
//!
//! ```text
//! Constructed -> Loaded -> Initialized -> Registered -> Unregistered -> Released
//! ```
//!
//! Releasing is terminal. A second [`Entity::release`] is reported as
//! [`EngineError::DoubleRelease`] and otherwise does nothing.
//!
//! Signal routing and event dispatch live in [`dispatch`](self::dispatch).

pub mod dispatch;
pub mod signal;
pub mod tags;

use std::collections::VecDeque;
use std::fmt;

use log::{debug, error, warn};
use rustc_hash::FxHashMap;
use serde_json::Value;

use crate::components::base::Component;
use crate::components::context::{ComponentContext, EntityCommand};
use crate::error::EngineError;
use crate::resources::typeregistry::{EntityDescriptor, TypeRegistry};
use crate::resources::worldtime::WorldTime;

use self::signal::QueuedSignal;
use self::tags::TagDelta;

/// How many times a component's `init` is attempted before giving up.
pub const MAX_INIT_ATTEMPTS: u32 = 10;

/// Type name of the plain entity, always present in a [`TypeRegistry`].
pub const BASE_ENTITY_TYPE: &str = "Entity";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityPhase {
    Constructed,
    Loaded,
    Initialized,
    Registered,
    Unregistered,
    Released,
}

/// Result of resolving a name on an entity.
pub enum Attribute<'a> {
    /// Value of a property published by one of the components.
    Property(Value),
    /// The name is a component id.
    Component(&'a dyn Component),
}

impl Attribute<'_> {
    pub fn into_value(self) -> Option<Value> {
        match self {
            Attribute::Property(v) => Some(v),
            Attribute::Component(_) => None,
        }
    }
}

pub struct Entity {
    id: String,
    type_name: String,
    scene: Option<String>,
    phase: EntityPhase,
    components: FxHashMap<String, Box<dyn Component>>,
    components_by_tag: FxHashMap<String, Vec<String>>,
    components_by_signal: FxHashMap<String, Vec<String>>,
    properties: FxHashMap<String, String>,
    tags: Vec<String>,
    signal_queue: Vec<QueuedSignal>,
    tag_delta: TagDelta,
    scene_requests: Vec<String>,
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut components: Vec<&String> = self.components.keys().collect();
        components.sort();
        f.debug_struct("Entity")
            .field("id", &self.id)
            .field("type_name", &self.type_name)
            .field("phase", &self.phase)
            .field("components", &components)
            .field("tags", &self.tags)
            .field("queued_signals", &self.signal_queue.len())
            .finish()
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity with ID {}", self.id)
    }
}

impl Entity {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            type_name: BASE_ENTITY_TYPE.to_owned(),
            scene: None,
            phase: EntityPhase::Constructed,
            components: FxHashMap::default(),
            components_by_tag: FxHashMap::default(),
            components_by_signal: FxHashMap::default(),
            properties: FxHashMap::default(),
            tags: Vec::new(),
            signal_queue: Vec::new(),
            tag_delta: TagDelta::default(),
            scene_requests: Vec::new(),
        }
    }

    /// Build an entity of a registered type. Returns `None` (and logs) when
    /// `type_name` is unknown.
    pub fn create(
        registry: &TypeRegistry,
        type_name: &str,
        id: &str,
        data: &Value,
        scene: Option<&str>,
    ) -> Option<Entity> {
        registry.create_entity(type_name, id, data, scene)
    }

    /// Constructor registered for [`BASE_ENTITY_TYPE`]: a plain entity
    /// loaded from the descriptor.
    pub fn construct(desc: &EntityDescriptor<'_>, registry: &TypeRegistry) -> Option<Entity> {
        let mut entity = Entity::new(desc.id);
        entity.type_name = desc.type_name.to_owned();
        entity.scene = desc.scene.map(str::to_owned);
        entity.load(desc.data, registry);
        Some(entity)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Id of the scene this entity belongs to.
    pub fn scene(&self) -> Option<&str> {
        self.scene.as_deref()
    }

    pub fn set_scene(&mut self, scene: Option<String>) {
        self.scene = scene;
    }

    pub fn phase(&self) -> EntityPhase {
        self.phase
    }

    pub fn is_released(&self) -> bool {
        self.phase == EntityPhase::Released
    }

    // ------------------------------------------------------------------
    // Loading and two-phase initialization
    // ------------------------------------------------------------------

    /// Build components from `data["components"]`, given either as a list of
    /// descriptors or as a mapping of component id to descriptor.
    ///
    /// Descriptors whose type is unknown or whose constructor fails are
    /// logged and skipped.
    pub fn load(&mut self, data: &Value, registry: &TypeRegistry) {
        match data.get("components") {
            Some(Value::Object(map)) => {
                for (index, (component_id, component_data)) in map.iter().enumerate() {
                    self.load_component(Some(component_id), component_data, registry, index);
                }
            }
            Some(Value::Array(list)) => {
                for (index, component_data) in list.iter().enumerate() {
                    self.load_component(None, component_data, registry, index);
                }
            }
            Some(other) => {
                warn!(
                    "{}: `components` must be a list or a mapping, got {}",
                    self, other
                );
            }
            None => {}
        }
        self.phase = EntityPhase::Loaded;
    }

    fn load_component(&mut self, key: Option<&str>, data: &Value, registry: &TypeRegistry, index: usize) {
        let Some(fields) = data.as_object() else {
            error!("{}: component descriptor #{} is not a mapping", self, index);
            return;
        };
        let Some(type_name) = fields.get("type").and_then(Value::as_str) else {
            error!("{}: component descriptor #{} has no type", self, index);
            return;
        };
        let id = key
            .map(str::to_owned)
            .or_else(|| fields.get("id").and_then(Value::as_str).map(str::to_owned))
            .unwrap_or_else(|| format!("{type_name}{index}"));

        if let Some(component) = registry.create_component(type_name, &id, fields) {
            // A duplicate id is already logged by `add`.
            let _ = self.add(component);
        }
    }

    /// Run every component's `init`, retrying failures.
    ///
    /// Components are processed from a FIFO work queue. A failing component
    /// goes to the back of the queue with its failure count incremented;
    /// after [`MAX_INIT_ATTEMPTS`] failures it is left uninitialized and an
    /// [`EngineError::InitRetryExhausted`] is logged and returned. The other
    /// components are initialized regardless.
    pub fn init(&mut self, time: &WorldTime) -> Vec<EngineError> {
        let mut pending: VecDeque<String> = self.components.keys().cloned().collect();
        let mut failures: FxHashMap<String, u32> = FxHashMap::default();
        let mut exhausted = Vec::new();

        while let Some(component_id) = pending.pop_front() {
            let Some(Err(cause)) = self.run_hook(&component_id, |c, ctx| c.init(ctx, time)) else {
                continue;
            };
            let count = failures.entry(component_id.clone()).or_insert(0);
            *count += 1;
            if *count < MAX_INIT_ATTEMPTS {
                debug!(
                    "{}: init of `{}` failed ({}), retrying later",
                    self, component_id, cause
                );
                pending.push_back(component_id);
            } else {
                let err = EngineError::InitRetryExhausted {
                    entity: self.id.clone(),
                    component: component_id,
                    attempts: *count,
                };
                error!("{}: {}", err, cause);
                exhausted.push(err);
            }
        }

        self.phase = EntityPhase::Initialized;
        exhausted
    }

    pub fn register(&mut self) {
        if self.phase != EntityPhase::Released {
            self.phase = EntityPhase::Registered;
        }
    }

    /// Stop the entity and release it unless that already happened.
    pub fn unregister(&mut self) {
        if self.phase == EntityPhase::Released {
            return;
        }
        self.phase = EntityPhase::Unregistered;
        let _ = self.release();
    }

    /// Drop every component and clear all indices.
    ///
    /// Calling it again reports [`EngineError::DoubleRelease`] and changes
    /// nothing.
    pub fn release(&mut self) -> Result<(), EngineError> {
        if self.phase == EntityPhase::Released {
            let err = EngineError::DoubleRelease(self.id.clone());
            error!("{}", err);
            return Err(err);
        }
        self.components.clear();
        self.components_by_tag.clear();
        self.components_by_signal.clear();
        self.properties.clear();
        self.signal_queue.clear();
        self.tags.clear();
        self.tag_delta = TagDelta::default();
        self.scene_requests.clear();
        self.phase = EntityPhase::Released;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Components, tags, properties
    // ------------------------------------------------------------------

    pub fn component(&self, id: &str) -> Option<&dyn Component> {
        self.components.get(id).map(|c| c.as_ref())
    }

    pub fn component_mut(&mut self, id: &str) -> Option<&mut dyn Component> {
        match self.components.get_mut(id) {
            Some(c) => Some(&mut **c),
            None => None,
        }
    }

    /// Typed access to a component.
    pub fn get_component<T: Component>(&self, id: &str) -> Option<&T> {
        self.component(id)?.downcast_ref::<T>()
    }

    pub fn components(&self) -> impl Iterator<Item = &(dyn Component + 'static)> {
        self.components.values().map(|c| c.as_ref())
    }

    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    /// Deduplicated union of the active components carrying any of `tags`.
    pub fn components_by_tag(&self, tags: &[&str]) -> Vec<&dyn Component> {
        let mut ids: Vec<&String> = Vec::new();
        for tag in tags {
            if let Some(list) = self.components_by_tag.get(*tag) {
                for id in list {
                    if !ids.contains(&id) {
                        ids.push(id);
                    }
                }
            }
        }
        ids.into_iter()
            .filter_map(|id| self.component(id))
            .collect()
    }

    /// Add a component.
    ///
    /// Components are owned, so an occupied id always belongs to a different
    /// component: the add is rejected with [`EngineError::DuplicateId`] and
    /// the registered component is kept.
    pub fn add(&mut self, mut component: Box<dyn Component>) -> Result<(), EngineError> {
        let component_id = component.id().to_owned();
        if self.components.contains_key(&component_id) {
            let err = EngineError::DuplicateId {
                entity: self.id.clone(),
                component: component_id,
            };
            error!("{}", err);
            return Err(err);
        }

        let mut commands = Vec::new();
        component.attached(&mut ComponentContext::new(&self.id, &component_id, &mut commands));
        let active = component.active();
        self.components.insert(component_id.clone(), component);
        if active {
            self.index_component(&component_id);
        }
        self.apply_commands(commands);
        Ok(())
    }

    /// Detach a component by id, returning it.
    ///
    /// Its properties and subscriptions are dropped and the entity's tag set
    /// is recomputed from the remaining active components.
    pub fn remove(&mut self, id: &str) -> Option<Box<dyn Component>> {
        let component = self.components.remove(id);
        if component.is_some() {
            self.properties.retain(|_, owner| owner != id);
            self.drop_from_tag_index(id);
            self.unsubscribe(id, None);
        }
        self.refresh_tags();
        component
    }

    /// Merge an active component's properties and tags into the indices.
    fn index_component(&mut self, id: &str) {
        let Some(component) = self.components.get(id) else {
            return;
        };
        for property in component.properties() {
            self.properties.insert(property.clone(), id.to_owned());
        }
        for tag in component.tags() {
            let list = self.components_by_tag.entry(tag.clone()).or_default();
            if !list.iter().any(|c| c == id) {
                list.push(id.to_owned());
            }
        }
        let entity_tags = component.entity_tags().to_vec();
        self.add_tags(&entity_tags);
    }

    fn drop_from_tag_index(&mut self, id: &str) {
        for list in self.components_by_tag.values_mut() {
            list.retain(|c| c != id);
        }
        self.components_by_tag.retain(|_, list| !list.is_empty());
    }

    /// Keep the indices in line with a component whose `active` flag may
    /// have changed during a hook.
    fn sync_activity(&mut self, id: &str, was_active: bool) {
        let Some(now_active) = self.components.get(id).map(|c| c.active()) else {
            return;
        };
        if now_active == was_active {
            return;
        }
        if now_active {
            self.index_component(id);
        } else {
            self.properties.retain(|_, owner| owner != id);
            self.drop_from_tag_index(id);
            self.refresh_tags();
        }
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    pub fn add_tags(&mut self, tags: &[String]) {
        for tag in tags {
            if !self.has_tag(tag) {
                self.tags.push(tag.clone());
                self.tag_delta.record_added(tag);
            }
        }
    }

    pub fn remove_tags(&mut self, tags: &[String]) {
        for tag in tags {
            if let Some(pos) = self.tags.iter().position(|t| t == tag) {
                self.tags.remove(pos);
                self.tag_delta.record_removed(tag);
            }
        }
    }

    /// Rebuild the tag set from the active components and record the diff.
    pub fn refresh_tags(&mut self) {
        let mut fresh: Vec<String> = Vec::new();
        for component in self.components.values().filter(|c| c.active()) {
            for tag in component.entity_tags() {
                if !fresh.contains(tag) {
                    fresh.push(tag.clone());
                }
            }
        }
        let old = std::mem::replace(&mut self.tags, fresh);
        let delta = TagDelta::between(&old, &self.tags);
        self.tag_delta.merge(delta);
    }

    /// Hand the accumulated tag changes to the caller.
    pub fn take_tag_delta(&mut self) -> TagDelta {
        std::mem::take(&mut self.tag_delta)
    }

    /// Scene changes requested by components since the last call.
    pub fn take_scene_requests(&mut self) -> Vec<String> {
        std::mem::take(&mut self.scene_requests)
    }

    /// Published property names, sorted.
    pub fn property_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.properties.keys().cloned().collect();
        names.sort();
        names
    }

    /// Resolve `name` to a property value or, failing that, a component.
    pub fn get_property(&self, name: &str) -> Result<Attribute<'_>, EngineError> {
        if let Some(component) = self.properties.get(name).and_then(|owner| self.components.get(owner)) {
            return Ok(Attribute::Property(component.get_property(name).unwrap_or(Value::Null)));
        }
        if let Some(component) = self.components.get(name) {
            return Ok(Attribute::Component(component.as_ref()));
        }
        Err(self.attribute_not_found(name))
    }

    /// Write a property through to the component that publishes it.
    pub fn set_property(&mut self, name: &str, value: Value) -> Result<(), EngineError> {
        if let Some(owner) = self.properties.get(name) {
            if let Some(component) = self.components.get_mut(owner) {
                return component.set_property(name, value);
            }
        }
        if self.components.contains_key(name) {
            return Err(EngineError::InvalidProperty {
                name: name.to_owned(),
                reason: "names a component, not a property".to_owned(),
            });
        }
        Err(self.attribute_not_found(name))
    }

    fn attribute_not_found(&self, name: &str) -> EngineError {
        EngineError::AttributeNotFound {
            entity: self.id.clone(),
            name: name.to_owned(),
            available: self.property_names(),
        }
    }

    /// Ordering key for event traversal: the numeric `z` property, or 0.
    pub fn z(&self) -> f64 {
        self.get_property("z")
            .ok()
            .and_then(Attribute::into_value)
            .and_then(|v| v.as_f64())
            .unwrap_or(0.0)
    }

    // ------------------------------------------------------------------
    // Subscriptions
    // ------------------------------------------------------------------

    pub fn subscribe(&mut self, component: &str, signal: &str) {
        let list = self.components_by_signal.entry(signal.to_owned()).or_default();
        if !list.iter().any(|c| c == component) {
            list.push(component.to_owned());
        }
    }

    /// Drop one subscription, or all of them when `signal` is `None`.
    pub fn unsubscribe(&mut self, component: &str, signal: Option<&str>) {
        match signal {
            Some(signal) => {
                if let Some(list) = self.components_by_signal.get_mut(signal) {
                    list.retain(|c| c != component);
                    if list.is_empty() {
                        self.components_by_signal.remove(signal);
                    }
                }
            }
            None => {
                for list in self.components_by_signal.values_mut() {
                    list.retain(|c| c != component);
                }
                self.components_by_signal.retain(|_, list| !list.is_empty());
            }
        }
    }

    /// Component ids subscribed to `signal`, in subscription order.
    pub fn subscribers(&self, signal: &str) -> &[String] {
        self.components_by_signal
            .get(signal)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn signal_queue(&self) -> &[QueuedSignal] {
        &self.signal_queue
    }

    // ------------------------------------------------------------------
    // Hook plumbing
    // ------------------------------------------------------------------

    /// Run one component hook with a context, then apply whatever the
    /// component recorded and resync the indices if it toggled `active`.
    fn run_hook<R>(
        &mut self,
        id: &str,
        hook: impl FnOnce(&mut dyn Component, &mut ComponentContext<'_>) -> R,
    ) -> Option<R> {
        let mut commands = Vec::new();
        let component = self.components.get_mut(id)?;
        let was_active = component.active();
        let result = {
            let mut ctx = ComponentContext::new(&self.id, id, &mut commands);
            hook(&mut **component, &mut ctx)
        };
        self.sync_activity(id, was_active);
        self.apply_commands(commands);
        Some(result)
    }

    fn apply_commands(&mut self, commands: Vec<EntityCommand>) {
        for command in commands {
            match command {
                EntityCommand::Subscribe { component, signal } => self.subscribe(&component, &signal),
                EntityCommand::Unsubscribe { component, signal } => {
                    self.unsubscribe(&component, signal.as_deref())
                }
                EntityCommand::Signal(signal) => self.signal(signal),
                EntityCommand::RequestScene(scene) => self.scene_requests.push(scene),
            }
        }
    }
}
