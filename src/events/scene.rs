//! Scene change event and observer.
//!
//! Components and systems request a scene switch through
//! [`Overlord::request_scene`] (components do it via
//! [`ComponentContext::request_scene`](crate::components::context::ComponentContext::request_scene)).
//! The request stays pending until
//! [`check_pending_scene`](crate::systems::overlord::check_pending_scene)
//! triggers a [`SceneChangeEvent`], whose observer tears down the active
//! scene and starts the requested one outside of any entity update.
use crate::resources::overlord::Overlord;
use bevy_ecs::observer::On;
use bevy_ecs::prelude::*;
use log::{debug, info, warn};

/// Apply the overlord's pending scene request.
#[derive(Event, Debug, Clone, Copy)]
pub struct SceneChangeEvent {}

/// Observer that switches to the pending scene.
///
/// An unknown scene id is logged by the overlord and leaves the active
/// scene running.
pub fn observe_scene_change_event(_trigger: On<SceneChangeEvent>, overlord: Option<ResMut<Overlord>>) {
    debug!("SceneChangeEvent triggered");
    let Some(mut overlord) = overlord else {
        warn!("Overlord resource missing in observe_scene_change_event");
        return;
    };
    match overlord.apply_pending_scene() {
        Some(Ok(())) => info!(
            "Now running scene {}",
            overlord.active_scene_id().unwrap_or("<none>")
        ),
        Some(Err(e)) => warn!("Scene change rejected: {}", e),
        None => debug!("No scene change pending."),
    }
}
