//! Test doubles shared by the integration tests.

#![allow(dead_code)]

use std::any::Any;
use std::sync::{Arc, Mutex};

use sceneloom::components::base::{Component, ComponentBase, Propagation, SlotReply};
use sceneloom::components::context::ComponentContext;
use sceneloom::entity::signal::{Signal, SignalData};
use sceneloom::error::ComponentError;
use sceneloom::resources::renderer::{Renderer, Viewport};
use sceneloom::resources::typeregistry::{ComponentDescriptor, TypeRegistry};
use sceneloom::resources::worldtime::WorldTime;

// =============================================================================
// Recording renderer
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    ScrollBy(f32, f32),
    ScrollTo(f32, f32),
    ScaleBy(f32),
    ScaleByFactor(f32),
    NativeResolution(Option<f32>, Option<f32>, bool),
    SceneSize(Option<f32>, Option<f32>),
}

/// A [`Viewport`] that also records every mutating call.
#[derive(Clone, Default)]
pub struct RecordingRenderer {
    pub viewport: Arc<Mutex<Viewport>>,
    pub calls: Arc<Mutex<Vec<Call>>>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

impl Renderer for RecordingRenderer {
    fn screen_to_scene(&self, x: f32, y: f32) -> (f32, f32) {
        self.viewport.lock().unwrap().screen_to_scene(x, y)
    }

    fn scene_to_screen(&self, x: f32, y: f32) -> (f32, f32) {
        self.viewport.lock().unwrap().scene_to_screen(x, y)
    }

    fn scroll_by(&mut self, dx: f32, dy: f32) {
        self.record(Call::ScrollBy(dx, dy));
        self.viewport.lock().unwrap().scroll_by(dx, dy);
    }

    fn scroll_to(&mut self, x: f32, y: f32) {
        self.record(Call::ScrollTo(x, y));
        self.viewport.lock().unwrap().scroll_to(x, y);
    }

    fn scale_by(&mut self, delta: f32) {
        self.record(Call::ScaleBy(delta));
        self.viewport.lock().unwrap().scale_by(delta);
    }

    fn scale_by_factor(&mut self, factor: f32) {
        self.record(Call::ScaleByFactor(factor));
        self.viewport.lock().unwrap().scale_by_factor(factor);
    }

    fn set_native_resolution(&mut self, width: Option<f32>, height: Option<f32>, keep_aspect: bool) {
        self.record(Call::NativeResolution(width, height, keep_aspect));
        self.viewport
            .lock()
            .unwrap()
            .set_native_resolution(width, height, keep_aspect);
    }

    fn set_scene_size(&mut self, width: Option<f32>, height: Option<f32>) {
        self.record(Call::SceneSize(width, height));
        self.viewport.lock().unwrap().set_scene_size(width, height);
    }
}

// =============================================================================
// Probe component
// =============================================================================

pub type Journal = Arc<Mutex<Vec<String>>>;

/// Component that logs every slot call as `"<component>:<signal>"` to a
/// shared journal and answers events with a fixed [`Propagation`].
pub struct Probe {
    base: ComponentBase,
    pub journal: Journal,
    pub reply: Propagation,
    /// Signals subscribed to when attached.
    pub subscriptions: Vec<String>,
    /// Raised (to subscribers) from inside every slot call.
    pub forward: Option<String>,
    /// How many `init` calls fail before one succeeds.
    pub failing_inits: u32,
    /// Switch itself on once `init` succeeds.
    pub wake_on_init: bool,
    pub init_calls: u32,
    pub updates: u32,
}

impl Probe {
    pub fn new(id: &str, journal: &Journal) -> Self {
        Self {
            base: ComponentBase::new(id),
            journal: journal.clone(),
            reply: Propagation::CONTINUE,
            subscriptions: Vec::new(),
            forward: None,
            failing_inits: 0,
            wake_on_init: false,
            init_calls: 0,
            updates: 0,
        }
    }

    pub fn subscribed(mut self, signal: &str) -> Self {
        self.subscriptions.push(signal.to_owned());
        self
    }

    pub fn replying(mut self, reply: Propagation) -> Self {
        self.reply = reply;
        self
    }

    pub fn tagged(mut self, tag: &str) -> Self {
        self.base.tags.push(tag.to_owned());
        self
    }

    pub fn entity_tagged(mut self, tag: &str) -> Self {
        self.base.entity_tags.push(tag.to_owned());
        self
    }

    pub fn inactive(mut self) -> Self {
        self.base.active = false;
        self
    }

    pub fn boxed(self) -> Box<dyn Component> {
        Box::new(self)
    }
}

impl Component for Probe {
    fn type_name(&self) -> &'static str {
        "Probe"
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

    fn attached(&mut self, ctx: &mut ComponentContext) {
        for signal in &self.subscriptions {
            ctx.subscribe(signal.clone());
        }
    }

    fn init(&mut self, _ctx: &mut ComponentContext, _time: &WorldTime) -> Result<(), ComponentError> {
        self.init_calls += 1;
        if self.init_calls <= self.failing_inits {
            return Err(ComponentError::NotReady(format!("attempt {}", self.init_calls)));
        }
        if self.wake_on_init {
            self.base.active = true;
        }
        Ok(())
    }

    fn update(&mut self, _ctx: &mut ComponentContext, _time: &WorldTime) {
        self.updates += 1;
    }

    fn slot(
        &mut self,
        signal: &str,
        _sender: Option<&str>,
        data: &SignalData,
        ctx: &mut ComponentContext,
    ) -> SlotReply {
        self.journal
            .lock()
            .unwrap()
            .push(format!("{}:{}", self.base.id, signal));
        if let Some(forward) = &self.forward {
            ctx.signal(Signal::new(forward.clone()));
        }
        if data.event().is_some() {
            SlotReply::Event(self.reply)
        } else {
            SlotReply::Ignored
        }
    }
}

/// Registry with the built-ins plus a `Probe` type whose descriptor may set
/// `subscribe` (list of signals) and `capture`/`stop`/`wakeOnInit`
/// (booleans). Probes
/// built from descriptors log to [`global_journal`].
pub fn registry_with_probe() -> TypeRegistry {
    let mut registry = TypeRegistry::with_builtins();
    registry.register_component("Probe", probe_from_descriptor);
    registry
}

static JOURNAL: std::sync::OnceLock<Journal> = std::sync::OnceLock::new();

/// Journal shared by descriptor-built probes. Tests using it must filter by
/// their own component ids since tests run in parallel.
pub fn global_journal() -> Journal {
    JOURNAL.get_or_init(Journal::default).clone()
}

fn probe_from_descriptor(desc: &ComponentDescriptor<'_>) -> Result<Box<dyn Component>, ComponentError> {
    let mut probe = Probe::new(desc.id, &global_journal());
    probe.base = ComponentBase::from_fields(desc.id, desc.fields)?;
    if let Some(signals) = desc.fields.get("subscribe").and_then(|v| v.as_array()) {
        probe.subscriptions = signals
            .iter()
            .filter_map(|s| s.as_str().map(str::to_owned))
            .collect();
    }
    let capture = desc.fields.get("capture").and_then(|v| v.as_bool()).unwrap_or(false);
    let stop = desc.fields.get("stop").and_then(|v| v.as_bool()).unwrap_or(capture);
    probe.reply = Propagation::new(!stop, capture);
    probe.wake_on_init = desc.fields.get("wakeOnInit").and_then(|v| v.as_bool()).unwrap_or(false);
    Ok(Box::new(probe))
}

pub fn journal_entries(journal: &Journal, prefix: &str) -> Vec<String> {
    journal
        .lock()
        .unwrap()
        .iter()
        .filter(|e| e.starts_with(prefix))
        .cloned()
        .collect()
}

pub const EPSILON: f32 = 1e-4;

pub fn approx_eq(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}
