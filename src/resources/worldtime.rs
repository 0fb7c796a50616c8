use bevy_ecs::prelude::Resource;

/// Simulation clock, advanced once per frame by
/// [`update_world_time`](crate::systems::time::update_world_time).
///
/// Passed to component `init`/`update` hooks as the frame data.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct WorldTime {
    pub elapsed: f32,
    pub delta: f32,
    pub time_scale: f32,
    pub frame_count: u64,
}

impl Default for WorldTime {
    fn default() -> Self {
        WorldTime {
            elapsed: 0.0,
            delta: 0.0,
            time_scale: 1.0,
            frame_count: 0,
        }
    }
}

impl WorldTime {
    pub fn with_time_scale(mut self, time_scale: f32) -> Self {
        self.time_scale = time_scale;
        self
    }

    /// A clock that has just advanced by `delta` seconds. Handy for driving
    /// entities outside a schedule.
    pub fn from_delta(delta: f32) -> Self {
        WorldTime {
            elapsed: delta,
            delta,
            time_scale: 1.0,
            frame_count: 1,
        }
    }
}
