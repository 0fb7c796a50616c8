//! Sceneloom library.
//!
//! The runtime core of a 2D scene engine: entities composed of components,
//! scenes built from JSON descriptions, and the overlord that routes
//! pointer input and switches scenes. The bevy_ecs glue (resources, events,
//! observers and systems) is exposed for the headless runner and for
//! integration tests.

pub mod components;
pub mod entity;
pub mod error;
pub mod events;
pub mod resources;
pub mod scene;
pub mod systems;
