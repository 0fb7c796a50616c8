//! Renderer collaborator.
//!
//! The engine core never draws; it only needs the renderer for the
//! screen/scene transform and to pan and zoom the view. [`Renderer`] is that
//! contract. [`Viewport`] is a headless implementation keeping a scroll
//! offset and a scale, usable for tools, tests and the headless runner.

use log::debug;

/// Screen/scene transform and viewport control.
pub trait Renderer: Send + Sync {
    fn screen_to_scene(&self, x: f32, y: f32) -> (f32, f32);
    fn scene_to_screen(&self, x: f32, y: f32) -> (f32, f32);
    /// Pan by a screen-space delta.
    fn scroll_by(&mut self, dx: f32, dy: f32);
    fn scroll_to(&mut self, x: f32, y: f32);
    /// Zoom by a pinch delta (difference of squared finger distances).
    fn scale_by(&mut self, delta: f32);
    fn scale_by_factor(&mut self, factor: f32);
    fn set_native_resolution(&mut self, width: Option<f32>, height: Option<f32>, keep_aspect: bool);
    fn set_scene_size(&mut self, width: Option<f32>, height: Option<f32>);
}

/// Scale change per squared pixel of pinch delta.
pub const PINCH_SCALE_PER_SQ_PIXEL: f32 = 1.0 / 250_000.0;
pub const MIN_SCALE: f32 = 0.1;
pub const MAX_SCALE: f32 = 10.0;

/// Headless view: `screen = scene * scale + offset`.
#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    pub offset: (f32, f32),
    pub scale: f32,
    pub native_resolution: (Option<f32>, Option<f32>),
    pub keep_aspect: bool,
    pub scene_size: (Option<f32>, Option<f32>),
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            offset: (0.0, 0.0),
            scale: 1.0,
            native_resolution: (None, None),
            keep_aspect: true,
            scene_size: (None, None),
        }
    }
}

impl Viewport {
    pub fn new() -> Self {
        Self::default()
    }

    fn set_scale(&mut self, scale: f32) {
        self.scale = scale.clamp(MIN_SCALE, MAX_SCALE);
    }
}

impl Renderer for Viewport {
    fn screen_to_scene(&self, x: f32, y: f32) -> (f32, f32) {
        ((x - self.offset.0) / self.scale, (y - self.offset.1) / self.scale)
    }

    fn scene_to_screen(&self, x: f32, y: f32) -> (f32, f32) {
        (x * self.scale + self.offset.0, y * self.scale + self.offset.1)
    }

    fn scroll_by(&mut self, dx: f32, dy: f32) {
        self.offset.0 += dx;
        self.offset.1 += dy;
    }

    fn scroll_to(&mut self, x: f32, y: f32) {
        self.offset = (x, y);
    }

    fn scale_by(&mut self, delta: f32) {
        self.set_scale(self.scale + delta * PINCH_SCALE_PER_SQ_PIXEL);
    }

    fn scale_by_factor(&mut self, factor: f32) {
        self.set_scale(self.scale * factor);
    }

    fn set_native_resolution(&mut self, width: Option<f32>, height: Option<f32>, keep_aspect: bool) {
        debug!("Native resolution {:?}x{:?}, keep aspect: {}", width, height, keep_aspect);
        self.native_resolution = (width, height);
        self.keep_aspect = keep_aspect;
    }

    fn set_scene_size(&mut self, width: Option<f32>, height: Option<f32>) {
        self.scene_size = (width, height);
    }
}
