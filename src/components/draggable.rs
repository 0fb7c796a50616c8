//! Pointer-driven movement.
//!
//! A [`Draggable`] subscribes to the `touches` signal when it is attached.
//! A touch that goes down inside its rectangle captures the pointer stream;
//! every following move on that stream shifts the rectangle by the scene
//! space delta, and the touchup releases the capture. Touches outside the
//! rectangle are left for entities further down the z-order.

use std::any::Any;

use serde_json::Value;

use crate::components::base::{Component, ComponentBase, Propagation, SlotReply, f32_field};
use crate::components::context::ComponentContext;
use crate::entity::signal::{SignalData, TOUCHES};
use crate::error::{ComponentError, EngineError};
use crate::events::platform::EventKind;
use crate::resources::typeregistry::{ComponentDescriptor, TypeRegistry};

pub const TYPE_NAME: &str = "Draggable";

#[derive(Debug, Clone, PartialEq)]
pub struct Draggable {
    base: ComponentBase,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Stream being dragged and the last scene position seen on it.
    grab: Option<(u32, (f32, f32))>,
}

impl Draggable {
    pub fn new(id: impl Into<String>, x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            base: ComponentBase::new(id).with_properties(["x", "y"]),
            x,
            y,
            width,
            height,
            grab: None,
        }
    }

    pub fn from_descriptor(desc: &ComponentDescriptor<'_>) -> Result<Box<dyn Component>, ComponentError> {
        let f = desc.fields;
        let mut draggable = Self::new(
            desc.id,
            f32_field(f, "x", 0.0)?,
            f32_field(f, "y", 0.0)?,
            f32_field(f, "width", 0.0)?,
            f32_field(f, "height", 0.0)?,
        );
        draggable.base = ComponentBase::from_fields(desc.id, f)?.with_properties(["x", "y"]);
        Ok(Box::new(draggable))
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x <= self.x + self.width && y >= self.y && y <= self.y + self.height
    }

    pub fn is_dragging(&self) -> bool {
        self.grab.is_some()
    }
}

impl Component for Draggable {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn base(&self) -> &ComponentBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ComponentBase {
        &mut self.base
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn get_property(&self, name: &str) -> Option<Value> {
        match name {
            "x" => Some(Value::from(self.x as f64)),
            "y" => Some(Value::from(self.y as f64)),
            _ => None,
        }
    }

    fn set_property(&mut self, name: &str, value: Value) -> Result<(), EngineError> {
        let Some(v) = value.as_f64() else {
            return Err(EngineError::InvalidProperty {
                name: name.to_owned(),
                reason: format!("expected a number, got {value}"),
            });
        };
        match name {
            "x" => self.x = v as f32,
            "y" => self.y = v as f32,
            _ => {
                return Err(EngineError::InvalidProperty {
                    name: name.to_owned(),
                    reason: "Draggable only has `x` and `y`".to_owned(),
                });
            }
        }
        Ok(())
    }

    fn attached(&mut self, ctx: &mut ComponentContext) {
        ctx.subscribe(TOUCHES);
    }

    fn slot(
        &mut self,
        signal: &str,
        _sender: Option<&str>,
        data: &SignalData,
        _ctx: &mut ComponentContext,
    ) -> SlotReply {
        if signal != TOUCHES {
            return SlotReply::Ignored;
        }
        let Some(event) = data.event() else {
            return SlotReply::Ignored;
        };
        let Some((sx, sy)) = event.scene_position() else {
            return SlotReply::Event(Propagation::CONTINUE);
        };

        let reply = match (event.kind, self.grab) {
            (EventKind::TouchDown, None) if self.contains(sx, sy) => {
                self.grab = Some((event.stream, (sx, sy)));
                Propagation::CAPTURE
            }
            (EventKind::TouchMove, Some((stream, (lx, ly)))) if stream == event.stream => {
                self.x += sx - lx;
                self.y += sy - ly;
                self.grab = Some((stream, (sx, sy)));
                Propagation::CAPTURE
            }
            (EventKind::TouchUp, Some((stream, _))) if stream == event.stream => {
                self.grab = None;
                Propagation::STOP
            }
            _ => Propagation::CONTINUE,
        };
        SlotReply::Event(reply)
    }
}

pub fn register(registry: &mut TypeRegistry) {
    registry.register_component(TYPE_NAME, Draggable::from_descriptor);
}
