//! Platform input events.
//!
//! The platform layer reports pointer and ethereal input as
//! [`PlatformEvent`]s. Triggering one on the world runs
//! [`observe_platform_event`], which hands it to
//! [`Overlord::report_event`](crate::resources::overlord::Overlord::report_event)
//! for normalization, hit routing and gesture handling.
//!
//! Pointer events carry screen coordinates; ethereal events (focus, blur,
//! sensors, zoom buttons, scroll wheel) do not and are broadcast instead of
//! hit-tested.
//!
//! # Example
//!
//! ```ignore
//! world.trigger(PlatformEvent::pointer(EventKind::MouseDown, 120.0, 80.0));
//! ```

use bevy_ecs::observer::On;
use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

use crate::entity::signal::{SCROLL, TOUCHES, ZOOM};
use crate::resources::overlord::Overlord;

/// Raw event types as reported by the platform layer.
///
/// Several platform-specific aliases (`mouse*`, `moztouch*`) are folded into
/// the three canonical pointer kinds by [`EventKind::normalized`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    MouseOut,
    MouseOver,
    Click,
    MouseMove,
    MouseDown,
    MouseUp,
    MozTouchMove,
    MozTouchDown,
    MozTouchUp,
    TouchDown,
    TouchUp,
    TouchMove,
    Accelerometer,
    Compass,
    Focus,
    Blur,
    ZoomIn,
    ZoomOut,
    Scroll,
}

impl EventKind {
    /// Map platform aliases onto touchdown/touchup/touchmove.
    pub fn normalized(self) -> Self {
        match self {
            EventKind::MouseDown | EventKind::MozTouchDown => EventKind::TouchDown,
            EventKind::MouseUp | EventKind::MozTouchUp => EventKind::TouchUp,
            EventKind::MouseMove | EventKind::MozTouchMove => EventKind::TouchMove,
            other => other,
        }
    }

    /// Coordinate-less events that are broadcast rather than hit-tested.
    pub fn is_ethereal(self) -> bool {
        matches!(
            self,
            EventKind::Accelerometer
                | EventKind::Compass
                | EventKind::Focus
                | EventKind::Blur
                | EventKind::ZoomIn
                | EventKind::ZoomOut
                | EventKind::Scroll
        )
    }

    /// Logical signal an entity raises for this kind, if any.
    pub fn signal(self) -> Option<&'static str> {
        match self {
            EventKind::TouchDown | EventKind::TouchUp | EventKind::TouchMove => Some(TOUCHES),
            EventKind::ZoomIn | EventKind::ZoomOut => Some(ZOOM),
            EventKind::Scroll => Some(SCROLL),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modifier {
    Ctrl,
    Alt,
    Shift,
    Meta,
}

/// One input event from the platform.
#[derive(Event, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformEvent {
    #[serde(rename = "type")]
    pub kind: EventKind,
    #[serde(default)]
    pub x: Option<f32>,
    #[serde(default)]
    pub y: Option<f32>,
    #[serde(default, alias = "deltax")]
    pub dx: Option<f32>,
    #[serde(default, alias = "deltay")]
    pub dy: Option<f32>,
    #[serde(default)]
    pub button: Option<u8>,
    /// Pointer stream (finger index, or 0 for a mouse).
    #[serde(default)]
    pub stream: u32,
    #[serde(default)]
    pub pressure: Option<f32>,
    #[serde(default)]
    pub modifiers: Vec<Modifier>,
    /// Scene coordinates, filled in by the overlord before dispatch.
    #[serde(skip)]
    pub scene_x: Option<f32>,
    #[serde(skip)]
    pub scene_y: Option<f32>,
}

impl PlatformEvent {
    pub fn new(kind: EventKind) -> Self {
        Self {
            kind,
            x: None,
            y: None,
            dx: None,
            dy: None,
            button: None,
            stream: 0,
            pressure: None,
            modifiers: Vec::new(),
            scene_x: None,
            scene_y: None,
        }
    }

    /// Pointer event at screen position `(x, y)` on stream 0.
    pub fn pointer(kind: EventKind, x: f32, y: f32) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Self::new(kind)
        }
    }

    pub fn on_stream(mut self, stream: u32) -> Self {
        self.stream = stream;
        self
    }

    pub fn with_delta(mut self, dx: f32, dy: f32) -> Self {
        self.dx = Some(dx);
        self.dy = Some(dy);
        self
    }

    pub fn is_ethereal(&self) -> bool {
        self.kind.is_ethereal()
    }

    /// Screen position, when the event has one.
    pub fn position(&self) -> Option<(f32, f32)> {
        Some((self.x?, self.y?))
    }

    pub fn delta(&self) -> Option<(f32, f32)> {
        Some((self.dx?, self.dy?))
    }

    pub fn scene_position(&self) -> Option<(f32, f32)> {
        Some((self.scene_x?, self.scene_y?))
    }
}

/// Global observer that feeds triggered platform events to the overlord.
pub fn observe_platform_event(trigger: On<PlatformEvent>, mut overlord: ResMut<Overlord>) {
    overlord.report_event(trigger.event().clone());
}
