//! The overlord: process-wide coordinator of scenes, entities and input.
//!
//! There is exactly one [`Overlord`] per world, stored as a bevy_ecs
//! resource. It owns:
//!
//! - the scene table and which scene is active ([`lifecycle`])
//! - the active scene's entity indices: by tag and by z-order
//! - pointer-stream, gesture and capture state ([`router`])
//! - the frame scheduler moving entities from loading to running
//!
//! Entities never reach back into the overlord. Every call into an entity
//! goes through [`Overlord::with_entity`], which drains the entity's tag
//! delta and scene requests as soon as the call returns, so the tag index
//! always matches the entities' tag sets.

pub mod lifecycle;
pub mod router;

use std::fmt;

use bevy_ecs::prelude::Resource;
use log::{debug, info};
use rustc_hash::FxHashMap;

use crate::components::base::Component;
use crate::entity::Entity;
use crate::entity::tags::TagDelta;
use crate::error::EngineError;
use crate::events::platform::PlatformEvent;
use crate::resources::renderer::{Renderer, Viewport};
use crate::resources::typeregistry::TypeRegistry;
use crate::resources::worldtime::WorldTime;
use crate::scene::Scene;

/// Who currently receives pointer events.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Capture {
    #[default]
    None,
    /// A built-in pan/pinch gesture owns the pointer.
    Viewport,
    /// An entity asked for the rest of the gesture.
    Entity(String),
}

#[derive(Resource)]
pub struct Overlord {
    registry: TypeRegistry,
    renderer: Box<dyn Renderer>,
    scenes: FxHashMap<String, Scene>,
    scene: Option<String>,
    first_scene: Option<String>,
    entities_by_tag: FxHashMap<String, Vec<String>>,
    entities_by_z: Vec<String>,
    /// Entities waiting for their two-phase start.
    loading: Vec<String>,
    /// Entities updated every frame.
    running: Vec<String>,
    touches: FxHashMap<u32, PlatformEvent>,
    capture: Capture,
    last_event: Option<PlatformEvent>,
    pending_scene: Option<String>,
}

impl fmt::Debug for Overlord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut scenes: Vec<&String> = self.scenes.keys().collect();
        scenes.sort();
        f.debug_struct("Overlord")
            .field("scenes", &scenes)
            .field("scene", &self.scene)
            .field("entities_by_z", &self.entities_by_z)
            .field("capture", &self.capture)
            .field("touches", &self.touches.len())
            .finish()
    }
}

impl Overlord {
    pub fn new(registry: TypeRegistry, renderer: Box<dyn Renderer>) -> Self {
        Self {
            registry,
            renderer,
            scenes: FxHashMap::default(),
            scene: None,
            first_scene: None,
            entities_by_tag: FxHashMap::default(),
            entities_by_z: Vec::new(),
            loading: Vec::new(),
            running: Vec::new(),
            touches: FxHashMap::default(),
            capture: Capture::None,
            last_event: None,
            pending_scene: None,
        }
    }

    /// Built-in types and a [`Viewport`] renderer.
    pub fn headless() -> Self {
        Self::new(TypeRegistry::with_builtins(), Box::new(Viewport::new()))
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut TypeRegistry {
        &mut self.registry
    }

    pub fn renderer(&self) -> &dyn Renderer {
        self.renderer.as_ref()
    }

    pub fn renderer_mut(&mut self) -> &mut dyn Renderer {
        &mut *self.renderer
    }

    // ------------------------------------------------------------------
    // Active scene access
    // ------------------------------------------------------------------

    /// The active scene, if any.
    pub fn active_scene(&self) -> Option<&Scene> {
        self.scenes.get(self.scene.as_deref()?)
    }

    pub fn active_scene_id(&self) -> Option<&str> {
        self.scene.as_deref()
    }

    /// Entity of the active scene.
    pub fn entity(&self, id: &str) -> Option<&Entity> {
        self.active_scene()?.entities.get(id)
    }

    /// Ids of the active scene's entities, sorted.
    pub fn entity_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .active_scene()
            .map(|s| s.entities.keys().cloned().collect())
            .unwrap_or_default();
        ids.sort();
        ids
    }

    /// Run `f` on an entity of the active scene, then fold its tag changes
    /// into the tag index and pick up any scene request it made.
    pub fn with_entity<R>(&mut self, id: &str, f: impl FnOnce(&mut Entity) -> R) -> Option<R> {
        let scene_id = self.scene.as_deref()?;
        let entity = self.scenes.get_mut(scene_id)?.entities.get_mut(id)?;
        let result = f(entity);
        let delta = entity.take_tag_delta();
        let requests = entity.take_scene_requests();

        if !delta.is_empty() {
            self.apply_tag_delta(id, &delta);
        }
        if let Some(scene) = requests.into_iter().last() {
            self.request_scene(scene);
        }
        Some(result)
    }

    /// Attach a component to an entity of the active scene.
    pub fn add_component(&mut self, entity: &str, component: Box<dyn Component>) -> Result<(), EngineError> {
        self.with_entity(entity, |e| e.add(component))
            .unwrap_or_else(|| Err(EngineError::UnknownEntity(entity.to_owned())))
    }

    /// Detach a component from an entity of the active scene.
    pub fn remove_component(&mut self, entity: &str, component: &str) -> Option<Box<dyn Component>> {
        self.with_entity(entity, |e| e.remove(component)).flatten()
    }

    // ------------------------------------------------------------------
    // Tag and z-order indices
    // ------------------------------------------------------------------

    /// Entity ids carrying `tag`, in the order they gained it.
    pub fn entities_by_tag(&self, tag: &str) -> &[String] {
        self.entities_by_tag.get(tag).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Traversal order for event routing: highest `z` first.
    pub fn entities_by_z(&self) -> &[String] {
        &self.entities_by_z
    }

    /// Fold a tag change of `entity` into the tag index.
    pub fn refresh_entity_tags(&mut self, entity: &str, added: &[String], removed: &[String]) {
        for tag in added {
            let list = self.entities_by_tag.entry(tag.clone()).or_default();
            if !list.iter().any(|e| e == entity) {
                list.push(entity.to_owned());
            }
        }
        for tag in removed {
            if let Some(list) = self.entities_by_tag.get_mut(tag) {
                list.retain(|e| e != entity);
                if list.is_empty() {
                    self.entities_by_tag.remove(tag);
                }
            }
        }
    }

    fn apply_tag_delta(&mut self, entity: &str, delta: &TagDelta) {
        debug!("Tags of {}: +{:?} -{:?}", entity, delta.added, delta.removed);
        self.refresh_entity_tags(entity, &delta.added, &delta.removed);
    }

    /// Rebuild the z-order from the active scene's entities: descending `z`,
    /// ties broken by id.
    pub fn refresh_z_order(&mut self) {
        let Some(scene) = self.active_scene() else {
            self.entities_by_z.clear();
            return;
        };
        let mut order: Vec<(f64, String)> = scene
            .entities
            .iter()
            .map(|(id, e)| (e.z(), id.clone()))
            .collect();
        order.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| a.1.cmp(&b.1)));
        self.entities_by_z = order.into_iter().map(|(_, id)| id).collect();
    }

    // ------------------------------------------------------------------
    // Frame scheduler
    // ------------------------------------------------------------------

    /// One frame: entities handed over by a scene start are initialized and
    /// registered, then every running entity is updated. The z-order is
    /// rebuilt afterwards.
    pub fn update(&mut self, time: &WorldTime) {
        if self.scene.is_none() {
            return;
        }

        let loading = std::mem::take(&mut self.loading);
        for id in loading {
            let started = self.with_entity(&id, |entity| {
                let failures = entity.init(time);
                entity.register();
                failures.len()
            });
            match started {
                Some(failures) => {
                    if failures > 0 {
                        debug!("{} started with {} abandoned component(s)", id, failures);
                    }
                    self.running.push(id);
                }
                None => debug!("Entity {} vanished before it could start", id),
            }
        }

        let running = self.running.clone();
        for id in &running {
            self.with_entity(id, |entity| entity.update(time));
        }
        self.refresh_z_order();
    }

    pub fn is_loading(&self, entity: &str) -> bool {
        self.loading.iter().any(|e| e == entity)
    }

    pub fn is_running(&self, entity: &str) -> bool {
        self.running.iter().any(|e| e == entity)
    }

    // ------------------------------------------------------------------
    // Scene requests
    // ------------------------------------------------------------------

    /// Ask for a scene change at the end of the frame. The last request of
    /// a frame wins.
    pub fn request_scene(&mut self, scene: impl Into<String>) {
        let scene = scene.into();
        info!("Scene change to {} requested", scene);
        self.pending_scene = Some(scene);
    }

    pub fn pending_scene(&self) -> Option<&str> {
        self.pending_scene.as_deref()
    }

    pub fn take_pending_scene(&mut self) -> Option<String> {
        self.pending_scene.take()
    }

    // ------------------------------------------------------------------
    // Input state
    // ------------------------------------------------------------------

    pub fn capture(&self) -> &Capture {
        &self.capture
    }

    /// Streams with a stored touch, sorted.
    pub fn tracked_streams(&self) -> Vec<u32> {
        let mut streams: Vec<u32> = self.touches.keys().copied().collect();
        streams.sort_unstable();
        streams
    }

    pub fn last_event(&self) -> Option<&PlatformEvent> {
        self.last_event.as_ref()
    }

    fn clear_input_state(&mut self) {
        self.touches.clear();
        self.capture = Capture::None;
        self.last_event = None;
    }
}
