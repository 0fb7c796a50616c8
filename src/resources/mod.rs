//! ECS resources and the engine services they hold.
//!
//! This module groups the long-lived data injected into the ECS world:
//! the overlord with its scenes and input state, the renderer contract,
//! the type registry, timing and configuration.
//!
//! Overview
//! - `engineconfig` – settings loaded from the INI configuration file
//! - `overlord` – scene lifecycle, entity indices and event routing
//! - `renderer` – screen/scene transform contract and a headless viewport
//! - `typeregistry` – entity and component constructors keyed by type name
//! - `worldtime` – simulation time and delta
pub mod engineconfig;
pub mod overlord;
pub mod renderer;
pub mod typeregistry;
pub mod worldtime;
