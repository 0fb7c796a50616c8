//! Event types and observers used by the engine.
//!
//! Submodules:
//! - [`platform`] – raw input from the platform layer, routed by the overlord
//! - [`scene`] – deferred scene switches requested during a frame
pub mod platform;
pub mod scene;
