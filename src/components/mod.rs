//! Components attached to entities.
//!
//! This module holds the [`Component`](base::Component) contract every
//! component implements, the [`ComponentContext`](context::ComponentContext)
//! hooks use to talk back to their entity, and the built-in component
//! types a scene description can name.
//!
//! Submodules overview:
//! - [`base`] – the component trait, shared fields and event replies
//! - [`context`] – deferred commands from a component to its entity
//! - [`draggable`] – pointer-captured movement inside a rectangle
//! - [`group`] – tag-only component
//! - [`signals`] – per-entity scalar/integer/flag storage
//! - [`timer`] – countdown that raises a signal when it expires
//! - [`zindex`] – the `z` property used for event ordering

pub mod base;
pub mod context;
pub mod draggable;
pub mod group;
pub mod signals;
pub mod timer;
pub mod zindex;

use crate::resources::typeregistry::TypeRegistry;

/// Register every built-in component type.
pub fn register_builtins(registry: &mut TypeRegistry) {
    draggable::register(registry);
    group::register(registry);
    signals::register(registry);
    timer::register(registry);
    zindex::register(registry);
}
