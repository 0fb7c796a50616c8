//! Tag-only component.
//!
//! A [`Group`] has no behavior. It exists to put tags on its entity (and to
//! be addressable by component tags) straight from a scene description:
//!
//! ```json
//! { "type": "Group", "entityTags": ["enemies", "wave-1"] }
//! ```

use std::any::Any;

use crate::components::base::{Component, ComponentBase};
use crate::error::ComponentError;
use crate::resources::typeregistry::{ComponentDescriptor, TypeRegistry};

pub const TYPE_NAME: &str = "Group";

#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    base: ComponentBase,
}

impl Group {
    pub fn new(id: impl Into<String>, entity_tags: &[&str]) -> Self {
        let mut base = ComponentBase::new(id);
        base.entity_tags = entity_tags.iter().map(|t| (*t).to_owned()).collect();
        Self { base }
    }

    pub fn from_descriptor(desc: &ComponentDescriptor<'_>) -> Result<Box<dyn Component>, ComponentError> {
        Ok(Box::new(Self {
            base: ComponentBase::from_fields(desc.id, desc.fields)?,
        }))
    }
}

impl Component for Group {
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
}

pub fn register(registry: &mut TypeRegistry) {
    registry.register_component(TYPE_NAME, Group::from_descriptor);
}
