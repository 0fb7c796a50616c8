//! Scene lifecycle.
//!
//! ```text
//! unloaded --load--> loaded --start--> active --reset--> resetting --> loaded
//!                                        \--change(id)--> resetting --> active(id)
//! ```
//!
//! Only one scene is active at a time. Resetting unregisters every entity
//! of the active scene and drops them before anything else starts, so a
//! scene switch never has two entity graphs alive. A scene that was reset
//! rebuilds its entities from its stored description the next time it
//! starts.

use std::fs;
use std::path::Path;

use log::{debug, error, info};
use serde_json::Value;

use crate::error::{ConfigError, EngineError};
use crate::scene::{Scene, SceneStatus};

use super::Overlord;

impl Overlord {
    /// Build a scene from its description and add it to the scene table,
    /// replacing any inactive scene with the same id.
    pub fn load_scene(&mut self, id: &str, description: &Value) -> Result<(), EngineError> {
        if self.scene.as_deref() == Some(id) {
            let err = EngineError::SceneActive(id.to_owned());
            error!("Cannot reload scene: {}", err);
            return Err(err);
        }
        let scene = Scene::from_description(id, description, &self.registry).inspect_err(|e| {
            error!("Failed loading scene {}: {}", id, e);
        })?;
        info!("Loaded scene {} with {} entities", id, scene.entities.len());
        self.scenes.insert(id.to_owned(), scene);
        Ok(())
    }

    /// Load every scene of a `{scene id: description}` mapping. Scenes that
    /// fail are logged and skipped; the number loaded is returned.
    pub fn load_scenes(&mut self, data: &Value) -> Result<usize, EngineError> {
        let Some(scenes) = data.as_object() else {
            let err = EngineError::InvalidDescription("scenes must be a mapping of id to scene".to_owned());
            error!("{}", err);
            return Err(err);
        };
        let mut loaded = 0;
        for (id, description) in scenes {
            if self.load_scene(id, description).is_ok() {
                loaded += 1;
            }
        }
        Ok(loaded)
    }

    /// Read a JSON scenes file and load every scene in it.
    pub fn load_scenes_from_file(&mut self, path: impl AsRef<Path>) -> Result<usize, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let data: Value = serde_json::from_str(&text).map_err(|source| ConfigError::Json {
            path: path.display().to_string(),
            source,
        })?;
        self.load_scenes(&data)
            .map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))
    }

    pub fn has_scene(&self, id: &str) -> bool {
        self.scenes.contains_key(id)
    }

    /// Lifecycle state of a scene, `None` when it is not loaded.
    pub fn scene_status(&self, id: &str) -> Option<SceneStatus> {
        self.scenes.get(id).map(|s| s.status)
    }

    /// Make `id` the active scene. If another scene is active this is a
    /// [`change_scene`](Overlord::change_scene).
    ///
    /// The scene pushes its viewport settings to the renderer and hands its
    /// entities to the frame scheduler, which initializes and registers
    /// them on the next [`update`](Overlord::update).
    pub fn start_scene(&mut self, id: &str) -> Result<(), EngineError> {
        if !self.scenes.contains_key(id) {
            let err = EngineError::UnknownScene(id.to_owned());
            error!("{}", err);
            return Err(err);
        }
        match self.scene.as_deref() {
            Some(current) if current == id => {
                debug!("Scene {} is already active", id);
                return Ok(());
            }
            Some(_) => return self.change_scene(id),
            None => {}
        }

        let Some(scene) = self.scenes.get_mut(id) else {
            return Err(EngineError::UnknownScene(id.to_owned()));
        };
        scene.rebuild_if_stale(&self.registry)?;
        scene.status = SceneStatus::Active;
        scene.init(&mut *self.renderer);

        let mut loading: Vec<String> = scene.entities.keys().cloned().collect();
        loading.sort();
        let deltas: Vec<_> = scene
            .entities
            .iter_mut()
            .map(|(entity_id, entity)| (entity_id.clone(), entity.take_tag_delta()))
            .collect();

        self.scene = Some(id.to_owned());
        for (entity_id, delta) in deltas {
            self.refresh_entity_tags(&entity_id, &delta.added, &delta.removed);
        }
        self.loading = loading;
        self.running.clear();
        self.refresh_z_order();
        info!("Started scene {} ({} entities)", id, self.loading.len());
        Ok(())
    }

    /// Tear down the active scene and start `id`, scrolling the view back
    /// to the origin. An unknown `id` is rejected before anything is torn
    /// down.
    pub fn change_scene(&mut self, id: &str) -> Result<(), EngineError> {
        if !self.scenes.contains_key(id) {
            let err = EngineError::UnknownScene(id.to_owned());
            error!("Cannot switch scene: {}", err);
            return Err(err);
        }
        debug!("Switching scene to: {}", id);
        self.reset_scene();
        self.renderer.scroll_to(0.0, 0.0);
        self.start_scene(id)
    }

    /// Unregister and drop every entity of the active scene and clear the
    /// per-scene indices and input state. The scene stays loaded.
    pub fn reset_scene(&mut self) {
        let Some(id) = self.scene.take() else {
            debug!("No active scene to reset");
            return;
        };
        if let Some(scene) = self.scenes.get_mut(&id) {
            scene.status = SceneStatus::Resetting;
            for entity in scene.entities.values_mut() {
                entity.unregister();
            }
            scene.entities.clear();
            scene.mark_stale();
            scene.status = SceneStatus::Loaded;
        }

        self.entities_by_z.clear();
        self.entities_by_tag.clear();
        self.loading.clear();
        self.running.clear();
        self.clear_input_state();
        info!("Reset scene {}", id);
    }

    /// Reset the active scene and forget every loaded scene.
    pub fn reset_scenes(&mut self) {
        self.reset_scene();
        self.scenes.clear();
        self.pending_scene = None;
    }

    pub fn set_first_scene(&mut self, id: impl Into<String>) {
        self.first_scene = Some(id.into());
    }

    pub fn first_scene(&self) -> Option<&str> {
        self.first_scene.as_deref()
    }

    /// Switch to the configured first scene.
    pub fn start_first_scene(&mut self) -> Result<(), EngineError> {
        let Some(id) = self.first_scene.clone() else {
            let err = EngineError::UnknownScene(String::new());
            error!("No first scene configured");
            return Err(err);
        };
        self.change_scene(&id).inspect_err(|e| error!("Error loading first scene: {}", e))
    }

    /// Apply a pending scene request, if any.
    pub fn apply_pending_scene(&mut self) -> Option<Result<(), EngineError>> {
        let id = self.take_pending_scene()?;
        Some(self.change_scene(&id))
    }
}
