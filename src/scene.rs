//! Scenes: a set of entities plus the viewport settings they are shown with.
//!
//! A [`Scene`] is built once from a declarative description:
//!
//! ```json
//! {
//!   "resolution": {"width": 1920, "height": 1200},
//!   "keepAspect": true,
//!   "size": {"width": 4000, "height": 1200},
//!   "userCanScroll": true,
//!   "userCanZoom": false,
//!   "entities": {
//!     "hero": {"components": [{"type": "ZIndex", "z": 3}]}
//!   }
//! }
//! ```
//!
//! `entities` may also be a list of entity descriptions, each carrying its
//! own `id`. Every other top-level key is kept verbatim in [`Scene::extra`].
//! The description itself is kept as well, so a scene torn down by the
//! overlord can be rebuilt when it is started again.

use log::{debug, warn};
use rustc_hash::FxHashMap;
use serde_json::{Map, Value};

use crate::entity::{BASE_ENTITY_TYPE, Entity};
use crate::error::EngineError;
use crate::resources::renderer::Renderer;
use crate::resources::typeregistry::TypeRegistry;

/// Width/height pair where either side may be left to the renderer.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Dimensions {
    pub width: Option<f32>,
    pub height: Option<f32>,
}

impl Dimensions {
    fn from_value(value: &Value, key: &str) -> Result<Self, EngineError> {
        let side = |name: &str| -> Result<Option<f32>, EngineError> {
            match value.get(name) {
                None | Some(Value::Null) => Ok(None),
                Some(v) => v.as_f64().map(|n| Some(n as f32)).ok_or_else(|| {
                    EngineError::InvalidDescription(format!("`{key}.{name}` must be a number or null"))
                }),
            }
        };
        if !value.is_object() {
            return Err(EngineError::InvalidDescription(format!("`{key}` must be a mapping")));
        }
        Ok(Self {
            width: side("width")?,
            height: side("height")?,
        })
    }
}

/// Where a scene is in the overlord's lifecycle. A scene that is not in the
/// scene table at all is unloaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneStatus {
    Loaded,
    Active,
    Resetting,
}

#[derive(Debug)]
pub struct Scene {
    pub id: String,
    pub entities: FxHashMap<String, Entity>,
    pub resolution: Dimensions,
    pub keep_aspect: bool,
    pub size: Dimensions,
    pub user_can_scroll: bool,
    pub user_can_zoom: bool,
    pub auto_scale: bool,
    pub auto_center: bool,
    /// Top-level keys with no dedicated field.
    pub extra: Map<String, Value>,
    pub status: SceneStatus,
    description: Value,
    /// Entities have been torn down and must be rebuilt before reuse.
    stale: bool,
}

const KNOWN_KEYS: &[&str] = &[
    "id",
    "entities",
    "resolution",
    "keepAspect",
    "size",
    "userCanScroll",
    "userCanZoom",
    "autoScale",
    "autoCenter",
];

fn bool_key(data: &Map<String, Value>, key: &str, default: bool) -> Result<bool, EngineError> {
    match data.get(key) {
        None | Some(Value::Null) => Ok(default),
        Some(v) => v
            .as_bool()
            .ok_or_else(|| EngineError::InvalidDescription(format!("`{key}` must be a boolean"))),
    }
}

impl Scene {
    /// Build a scene and all of its entities from `description`.
    ///
    /// Entities whose type is unknown are dropped (the registry logs them).
    pub fn from_description(id: &str, description: &Value, registry: &TypeRegistry) -> Result<Scene, EngineError> {
        let Some(data) = description.as_object() else {
            return Err(EngineError::InvalidDescription(format!(
                "scene `{id}` must be a mapping"
            )));
        };

        let resolution = match data.get("resolution") {
            None | Some(Value::Null) => Dimensions::default(),
            Some(v) => Dimensions::from_value(v, "resolution")?,
        };
        let size = match data.get("size") {
            None | Some(Value::Null) => Dimensions::default(),
            Some(v) => Dimensions::from_value(v, "size")?,
        };
        let extra: Map<String, Value> = data
            .iter()
            .filter(|(k, _)| !KNOWN_KEYS.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        let mut scene = Scene {
            id: id.to_owned(),
            entities: FxHashMap::default(),
            resolution,
            keep_aspect: bool_key(data, "keepAspect", true)?,
            size,
            user_can_scroll: bool_key(data, "userCanScroll", false)?,
            user_can_zoom: bool_key(data, "userCanZoom", false)?,
            auto_scale: bool_key(data, "autoScale", false)?,
            auto_center: bool_key(data, "autoCenter", false)?,
            extra,
            status: SceneStatus::Loaded,
            description: description.clone(),
            stale: false,
        };
        scene.build_entities(registry)?;
        Ok(scene)
    }

    fn build_entities(&mut self, registry: &TypeRegistry) -> Result<(), EngineError> {
        let entries: Vec<(String, &Value)> = match self.description.get("entities") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Object(map)) => map.iter().map(|(k, v)| (k.clone(), v)).collect(),
            Some(Value::Array(list)) => {
                let mut entries = Vec::with_capacity(list.len());
                for (index, data) in list.iter().enumerate() {
                    match data.get("id").and_then(Value::as_str) {
                        Some(entity_id) => entries.push((entity_id.to_owned(), data)),
                        None => warn!("Scene {}: entity #{} has no id, skipped", self.id, index),
                    }
                }
                entries
            }
            Some(_) => {
                return Err(EngineError::InvalidDescription(format!(
                    "scene `{}`: `entities` must be a list or a mapping",
                    self.id
                )));
            }
        };

        let mut entities = FxHashMap::default();
        for (entity_id, data) in entries {
            let type_name = data.get("type").and_then(Value::as_str).unwrap_or(BASE_ENTITY_TYPE);
            if let Some(entity) = registry.create_entity(type_name, &entity_id, data, Some(&self.id)) {
                entities.insert(entity_id, entity);
            }
        }
        debug!("Scene {}: built {} entities", self.id, entities.len());
        self.entities = entities;
        self.stale = false;
        Ok(())
    }

    /// The description this scene was built from.
    pub fn description(&self) -> &Value {
        &self.description
    }

    /// Entities were torn down; the next [`Scene::rebuild_if_stale`] builds
    /// fresh ones from the description.
    pub fn mark_stale(&mut self) {
        self.stale = true;
    }

    pub fn is_stale(&self) -> bool {
        self.stale
    }

    pub fn rebuild_if_stale(&mut self, registry: &TypeRegistry) -> Result<(), EngineError> {
        if self.stale {
            debug!("Scene {}: rebuilding entities", self.id);
            self.build_entities(registry)?;
        }
        Ok(())
    }

    /// Push the viewport configuration to the renderer.
    pub fn init(&self, renderer: &mut dyn Renderer) {
        renderer.set_native_resolution(self.resolution.width, self.resolution.height, self.keep_aspect);
        renderer.set_scene_size(self.size.width, self.size.height);
    }
}
