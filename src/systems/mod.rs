//! Engine systems.
//!
//! Submodules overview
//! - [`overlord`] – drive the overlord's frame scheduler and apply scene requests
//! - [`time`] – update simulation time and delta

pub mod overlord;
pub mod time;
