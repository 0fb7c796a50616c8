use crate::events::scene::SceneChangeEvent;
use crate::resources::overlord::Overlord;
use crate::resources::worldtime::WorldTime;
use bevy_ecs::prelude::*;

/// Run one frame of the overlord's scheduler: start the entities of a
/// freshly started scene, then update every running entity.
pub fn overlord_update_system(mut overlord: ResMut<Overlord>, time: Res<WorldTime>) {
    overlord.update(&time);
}

pub fn check_pending_scene(mut commands: Commands, overlord: Res<Overlord>) {
    // A request made this frame is applied once the frame is done.
    if overlord.pending_scene().is_some() {
        commands.trigger(SceneChangeEvent {});
    }
}

pub fn scene_is_active(overlord: Res<Overlord>) -> bool {
    overlord.active_scene_id().is_some()
}
