//! Z-index component for event ordering.
//!
//! The [`ZIndex`] component publishes the `z` property on its entity. The
//! overlord walks entities from the highest `z` down when routing pointer
//! events, so an entity drawn on top also gets the first chance to answer.
//! Entities without a `z` property sort as 0.

use std::any::Any;

use serde_json::Value;

use crate::components::base::{Component, ComponentBase, f32_field};
use crate::error::{ComponentError, EngineError};
use crate::resources::typeregistry::{ComponentDescriptor, TypeRegistry};

pub const TYPE_NAME: &str = "ZIndex";
pub const Z_PROPERTY: &str = "z";

#[derive(Debug, Clone, PartialEq)]
pub struct ZIndex {
    base: ComponentBase,
    pub z: f32,
}

impl ZIndex {
    pub fn new(id: impl Into<String>, z: f32) -> Self {
        Self {
            base: ComponentBase::new(id).with_properties([Z_PROPERTY]),
            z,
        }
    }

    pub fn from_descriptor(desc: &ComponentDescriptor<'_>) -> Result<Box<dyn Component>, ComponentError> {
        let base = ComponentBase::from_fields(desc.id, desc.fields)?.with_properties([Z_PROPERTY]);
        let z = f32_field(desc.fields, Z_PROPERTY, 0.0)?;
        Ok(Box::new(Self { base, z }))
    }
}

impl Component for ZIndex {
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
        (name == Z_PROPERTY).then(|| Value::from(self.z as f64))
    }

    fn set_property(&mut self, name: &str, value: Value) -> Result<(), EngineError> {
        match (name, value.as_f64()) {
            (Z_PROPERTY, Some(z)) => {
                self.z = z as f32;
                Ok(())
            }
            (Z_PROPERTY, None) => Err(EngineError::InvalidProperty {
                name: name.to_owned(),
                reason: format!("expected a number, got {value}"),
            }),
            _ => Err(EngineError::InvalidProperty {
                name: name.to_owned(),
                reason: "ZIndex only has `z`".to_owned(),
            }),
        }
    }
}

pub fn register(registry: &mut TypeRegistry) {
    registry.register_component(TYPE_NAME, ZIndex::from_descriptor);
}
