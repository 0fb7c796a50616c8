// Counts a number of seconds and then raises a signal.

use std::any::Any;

use log::debug;
use serde_json::Value;

use crate::components::base::{Component, ComponentBase, f32_field, string_list};
use crate::components::context::ComponentContext;
use crate::entity::signal::Signal;
use crate::error::{ComponentError, EngineError};
use crate::resources::typeregistry::{ComponentDescriptor, TypeRegistry};
use crate::resources::worldtime::WorldTime;

pub const TYPE_NAME: &str = "Timer";

/// On expiry the timer queues `signal` for the components tagged with
/// `targets` and for its subscribers, requests `scene` if set, and then
/// switches itself off unless `repeat` is set.
///
/// ```json
/// { "type": "Timer", "duration": 2.5, "signal": "spawn", "targets": ["spawner"], "repeat": true }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Timer {
    base: ComponentBase,
    pub duration: f32,
    pub elapsed: f32,
    pub signal: String,
    pub targets: Vec<String>,
    pub repeat: bool,
    pub scene: Option<String>,
}

impl Timer {
    pub fn new(id: impl Into<String>, duration: f32, signal: impl Into<String>) -> Self {
        Timer {
            base: ComponentBase::new(id),
            duration,
            elapsed: 0.0,
            signal: signal.into(),
            targets: Vec::new(),
            repeat: false,
            scene: None,
        }
    }

    pub fn from_descriptor(desc: &ComponentDescriptor<'_>) -> Result<Box<dyn Component>, ComponentError> {
        let fields = desc.fields;
        let duration = f32_field(fields, "duration", 1.0)?;
        if duration <= 0.0 {
            return Err(ComponentError::invalid_field("duration", "must be positive"));
        }
        let signal = match fields.get("signal") {
            None => "timeout".to_owned(),
            Some(v) => v
                .as_str()
                .ok_or_else(|| ComponentError::invalid_field("signal", "expected a string"))?
                .to_owned(),
        };
        let targets = match fields.get("targets") {
            None => Vec::new(),
            Some(v) => string_list(v)
                .ok_or_else(|| ComponentError::invalid_field("targets", "expected a string or a list of strings"))?,
        };
        let repeat = match fields.get("repeat") {
            None | Some(Value::Null) => false,
            Some(v) => v
                .as_bool()
                .ok_or_else(|| ComponentError::invalid_field("repeat", "expected a boolean"))?,
        };
        let scene = match fields.get("scene") {
            None | Some(Value::Null) => None,
            Some(v) => Some(
                v.as_str()
                    .ok_or_else(|| ComponentError::invalid_field("scene", "expected a scene id"))?
                    .to_owned(),
            ),
        };

        Ok(Box::new(Timer {
            base: ComponentBase::from_fields(desc.id, fields)?.with_properties(["elapsed"]),
            duration,
            elapsed: 0.0,
            signal,
            targets,
            repeat,
            scene,
        }))
    }

    pub fn reset(&mut self) {
        self.elapsed = 0.0;
    }

    fn fire(&mut self, ctx: &mut ComponentContext) {
        debug!("{}: timer `{}` fired `{}`", ctx.entity_id(), self.base.id, self.signal);
        ctx.signal(Signal::new(self.signal.clone()).tagged(self.targets.iter().cloned()));
        if let Some(scene) = &self.scene {
            ctx.request_scene(scene.clone());
        }
    }
}

impl Component for Timer {
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
        (name == "elapsed").then(|| Value::from(self.elapsed as f64))
    }

    fn set_property(&mut self, name: &str, value: Value) -> Result<(), EngineError> {
        match (name, value.as_f64()) {
            ("elapsed", Some(v)) => {
                self.elapsed = v as f32;
                Ok(())
            }
            _ => Err(EngineError::InvalidProperty {
                name: name.to_owned(),
                reason: format!("cannot set to {value}"),
            }),
        }
    }

    fn update(&mut self, ctx: &mut ComponentContext, time: &WorldTime) {
        self.elapsed += time.delta;
        if self.elapsed < self.duration {
            return;
        }
        self.fire(ctx);
        if self.repeat {
            self.elapsed -= self.duration;
        } else {
            self.base.active = false;
        }
    }
}

pub fn register(registry: &mut TypeRegistry) {
    registry.register_component(TYPE_NAME, Timer::from_descriptor);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::context::EntityCommand;

    #[test]
    fn one_shot_timer_fires_once_and_deactivates() {
        let mut timer = Timer::new("t", 1.0, "ring");
        timer.targets = vec!["bell".into()];
        let mut commands = Vec::new();
        let step = WorldTime::from_delta(0.6);

        timer.update(&mut ComponentContext::new("e", "t", &mut commands), &step);
        assert!(commands.is_empty());
        timer.update(&mut ComponentContext::new("e", "t", &mut commands), &step);

        assert!(!timer.active());
        assert_eq!(commands.len(), 1);
        let EntityCommand::Signal(signal) = &commands[0] else {
            panic!("expected a signal, got {:?}", commands[0]);
        };
        assert_eq!(signal.name, "ring");
        assert_eq!(signal.tags, vec!["bell".to_string()]);
        assert_eq!(signal.sender.as_deref(), Some("t"));
    }

    #[test]
    fn repeating_timer_keeps_the_remainder() {
        let mut timer = Timer::new("t", 1.0, "tick");
        timer.repeat = true;
        timer.scene = Some("next".into());
        let mut commands = Vec::new();
        timer.update(&mut ComponentContext::new("e", "t", &mut commands), &WorldTime::from_delta(1.25));

        assert!(timer.active());
        assert!((timer.elapsed - 0.25).abs() < 1e-6);
        assert!(commands.contains(&EntityCommand::RequestScene("next".into())));
    }

    fn descriptor_error(fields: serde_json::Value) -> Option<ComponentError> {
        let desc = ComponentDescriptor {
            type_name: TYPE_NAME,
            id: "clock",
            fields: fields.as_object().unwrap(),
        };
        Timer::from_descriptor(&desc).err()
    }

    #[test]
    fn mistyped_repeat_and_scene_are_rejected() {
        assert_eq!(
            descriptor_error(serde_json::json!({"repeat": "yes"})),
            Some(ComponentError::invalid_field("repeat", "expected a boolean"))
        );
        assert_eq!(
            descriptor_error(serde_json::json!({"scene": 3})),
            Some(ComponentError::invalid_field("scene", "expected a scene id"))
        );
        assert_eq!(descriptor_error(serde_json::json!({"repeat": true, "scene": "next"})), None);
    }
}
