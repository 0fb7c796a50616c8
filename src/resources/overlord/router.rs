//! Pointer and ethereal event routing.
//!
//! Pointer events walk the running entities from the top of the z-order
//! down until one stops propagation. The first entity answering with
//! `capture` becomes the captor and receives every following pointer event alone
//! until it answers without `capture` or a touchup arrives. Events nobody
//! stopped drive the built-in gestures: one-finger pan and two-finger pinch
//! zoom. While a gesture runs the viewport holds the capture, so entities
//! are skipped until the touchup.
//!
//! Ethereal events (focus, sensors, zoom buttons, wheel) are broadcast in
//! z-order instead of being hit-tested.

use log::debug;

use crate::components::base::Propagation;
use crate::events::platform::{EventKind, PlatformEvent};

use super::{Capture, Overlord};

/// Scale factor of one zoomin step.
pub const ZOOM_IN_FACTOR: f32 = 1.2;
/// Scale factor of one zoomout step.
pub const ZOOM_OUT_FACTOR: f32 = 0.8;

fn squared_distance(a: (f32, f32), b: (f32, f32)) -> f32 {
    (a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)
}

impl Overlord {
    /// Single entry point for platform input.
    pub fn report_event(&mut self, mut event: PlatformEvent) {
        event.kind = event.kind.normalized();

        if event.is_ethereal() {
            self.route_ethereal(&event);
            return;
        }
        let Some((x, y)) = event.position() else {
            debug!("Dropping {:?} event without coordinates", event.kind);
            return;
        };

        if event.delta().is_none() {
            if let Some((lx, ly)) = self.touches.get(&event.stream).and_then(PlatformEvent::position) {
                event.dx = Some(x - lx);
                event.dy = Some(y - ly);
            }
        }
        let (sx, sy) = self.renderer.screen_to_scene(x, y);
        event.scene_x = Some(sx);
        event.scene_y = Some(sy);
        self.last_event = Some(event.clone());

        let propagation = match self.capture.clone() {
            Capture::None => self.broadcast(&event),
            Capture::Entity(captor) => match self.with_entity(&captor, |e| e.event(&event)) {
                Some(reply) => {
                    if !reply.capture {
                        debug!("{} released the capture", captor);
                        self.capture = Capture::None;
                    }
                    reply
                }
                None => {
                    self.capture = Capture::None;
                    Propagation::CONTINUE
                }
            },
            Capture::Viewport => Propagation::CONTINUE,
        };

        if propagation.continue_propagation && !matches!(self.capture, Capture::Entity(_)) {
            self.gestures(&event, (x, y));
        }

        if event.kind == EventKind::TouchUp {
            self.touches.remove(&event.stream);
            self.capture = Capture::None;
        } else if event.kind == EventKind::TouchDown || self.touches.contains_key(&event.stream) {
            // Plain pointer moves are not stored, or hovering would pan.
            self.touches.insert(event.stream, event);
        }
    }

    /// Walk the z-order until propagation stops. The first entity asking
    /// for capture becomes the captor.
    fn broadcast(&mut self, event: &PlatformEvent) -> Propagation {
        let mut propagation = Propagation::CONTINUE;
        for id in self.entities_by_z.clone() {
            let Some(reply) = self.with_entity(&id, |e| e.event(event)) else {
                continue;
            };
            propagation = reply;
            if reply.capture && !matches!(self.capture, Capture::Entity(_)) {
                debug!("{} captured {:?}", id, event.kind);
                self.capture = Capture::Entity(id);
            }
            if !reply.continue_propagation {
                break;
            }
        }
        propagation
    }

    fn gestures(&mut self, event: &PlatformEvent, (x, y): (f32, f32)) {
        let Some((dx, dy)) = event.delta() else {
            return;
        };
        if event.kind == EventKind::TouchDown {
            return;
        }
        let (can_scroll, can_zoom) = self
            .active_scene()
            .map(|s| (s.user_can_scroll, s.user_can_zoom))
            .unwrap_or((false, false));

        if can_scroll && event.stream == 0 && self.touches.len() == 1 && self.touches.contains_key(&0) {
            self.renderer.scroll_by(dx, dy);
            self.capture = Capture::Viewport;
        }

        if can_zoom && self.touches.len() == 2 && event.stream <= 1 {
            let first = self.touches.get(&0).and_then(PlatformEvent::position);
            let second = self.touches.get(&1).and_then(PlatformEvent::position);
            if let (Some(first), Some(second)) = (first, second) {
                let other = if event.stream == 0 { second } else { first };
                self.pinch(squared_distance(first, second), (x, y), other);
                self.capture = Capture::Viewport;
            }
        }
    }

    /// Scale by the change of squared finger distance, keeping the point
    /// between the fingers fixed on screen.
    fn pinch(&mut self, previous_area: f32, moving: (f32, f32), other: (f32, f32)) {
        let current_area = squared_distance(moving, other);
        let center = ((moving.0 + other.0) / 2.0, (moving.1 + other.1) / 2.0);
        let (cx, cy) = self.renderer.screen_to_scene(center.0, center.1);
        self.renderer.scale_by(current_area - previous_area);
        let (sx, sy) = self.renderer.scene_to_screen(cx, cy);
        self.renderer.scroll_by(center.0 - sx, center.1 - sy);
    }

    fn route_ethereal(&mut self, event: &PlatformEvent) {
        let propagation = self.broadcast(event);
        if !propagation.continue_propagation {
            return;
        }
        if !self.active_scene().is_some_and(|s| s.user_can_zoom) {
            return;
        }
        let factor = match event.kind {
            EventKind::ZoomIn => ZOOM_IN_FACTOR,
            EventKind::ZoomOut => ZOOM_OUT_FACTOR,
            _ => return,
        };

        let anchor = self.last_event.as_ref().and_then(PlatformEvent::position);
        let center = anchor.map(|(x, y)| self.renderer.screen_to_scene(x, y));
        self.renderer.scale_by_factor(factor);
        if let (Some((x, y)), Some((cx, cy))) = (anchor, center) {
            let (sx, sy) = self.renderer.scene_to_screen(cx, cy);
            self.renderer.scroll_by(x - sx, y - sy);
        }
    }
}
