//! Factories for entity and component types, keyed by type name.
//!
//! Scene descriptions name their entity and component types as strings.
//! The [`TypeRegistry`] maps those names to constructors. It is filled at
//! startup: [`TypeRegistry::with_builtins`] lets every built-in component
//! module register itself, and games add their own types with
//! [`TypeRegistry::register_component`] / [`TypeRegistry::register_entity`].

use log::error;
use rustc_hash::FxHashMap;
use serde_json::{Map, Value};

use crate::components::base::Component;
use crate::entity::{BASE_ENTITY_TYPE, Entity};
use crate::error::{ComponentError, EngineError};

/// Everything a component constructor gets.
pub struct ComponentDescriptor<'a> {
    pub type_name: &'a str,
    pub id: &'a str,
    /// The full descriptor mapping, `type` and `id` included.
    pub fields: &'a Map<String, Value>,
}

/// Everything an entity constructor gets.
pub struct EntityDescriptor<'a> {
    pub type_name: &'a str,
    pub id: &'a str,
    pub data: &'a Value,
    pub scene: Option<&'a str>,
}

pub type ComponentCtor = fn(&ComponentDescriptor<'_>) -> Result<Box<dyn Component>, ComponentError>;
pub type EntityCtor = fn(&EntityDescriptor<'_>, &TypeRegistry) -> Option<Entity>;

pub struct TypeRegistry {
    components: FxHashMap<String, ComponentCtor>,
    entities: FxHashMap<String, EntityCtor>,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeRegistry {
    /// Registry knowing only the plain [`BASE_ENTITY_TYPE`].
    pub fn new() -> Self {
        let mut registry = Self {
            components: FxHashMap::default(),
            entities: FxHashMap::default(),
        };
        registry.register_entity(BASE_ENTITY_TYPE, Entity::construct);
        registry
    }

    /// Registry with every built-in component type.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        crate::components::register_builtins(&mut registry);
        registry
    }

    pub fn register_component(&mut self, type_name: impl Into<String>, ctor: ComponentCtor) {
        self.components.insert(type_name.into(), ctor);
    }

    pub fn register_entity(&mut self, type_name: impl Into<String>, ctor: EntityCtor) {
        self.entities.insert(type_name.into(), ctor);
    }

    pub fn has_component(&self, type_name: &str) -> bool {
        self.components.contains_key(type_name)
    }

    pub fn has_entity(&self, type_name: &str) -> bool {
        self.entities.contains_key(type_name)
    }

    /// Build a component. Unknown types and constructor failures are logged
    /// and yield `None`.
    pub fn create_component(
        &self,
        type_name: &str,
        id: &str,
        fields: &Map<String, Value>,
    ) -> Option<Box<dyn Component>> {
        let Some(ctor) = self.components.get(type_name) else {
            error!("{}", EngineError::UnknownType(type_name.to_owned()));
            return None;
        };
        let desc = ComponentDescriptor {
            type_name,
            id,
            fields,
        };
        match ctor(&desc) {
            Ok(component) => Some(component),
            Err(e) => {
                error!("Failed creating component `{}` of type {}: {}", id, type_name, e);
                None
            }
        }
    }

    /// Build an entity. Unknown types are logged and yield `None`.
    pub fn create_entity(
        &self,
        type_name: &str,
        id: &str,
        data: &Value,
        scene: Option<&str>,
    ) -> Option<Entity> {
        let Some(ctor) = self.entities.get(type_name) else {
            error!("{}", EngineError::UnknownType(type_name.to_owned()));
            return None;
        };
        let desc = EntityDescriptor {
            type_name,
            id,
            data,
            scene,
        };
        ctor(&desc, self)
    }
}
