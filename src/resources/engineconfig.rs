//! Engine configuration resource.
//!
//! Manages engine settings loaded from an INI configuration file. Provides
//! defaults for safe startup and methods to load/save configuration.
//!
//! # Configuration File Format
//!
//! ```ini
//! [render]
//! width = 1920
//! height = 1200
//! keep_aspect = true
//!
//! [engine]
//! scenes = ./scenes.json
//! first_scene = main
//! frames = 600
//! frame_time = 0.016
//! ```

use bevy_ecs::prelude::*;
use configparser::ini::Ini;
use log::info;
use std::path::PathBuf;

use crate::error::ConfigError;

/// Default safe values for startup
const DEFAULT_RENDER_WIDTH: u32 = 1920;
const DEFAULT_RENDER_HEIGHT: u32 = 1200;
const DEFAULT_KEEP_ASPECT: bool = true;
const DEFAULT_SCENES_PATH: &str = "./scenes.json";
const DEFAULT_FIRST_SCENE: &str = "main";
const DEFAULT_FRAMES: u64 = 600;
const DEFAULT_FRAME_TIME: f32 = 0.016;
const DEFAULT_CONFIG_PATH: &str = "./config.ini";

/// Engine configuration resource.
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Native render width in pixels.
    pub render_width: u32,
    /// Native render height in pixels.
    pub render_height: u32,
    pub keep_aspect: bool,
    /// JSON file with the scene descriptions.
    pub scenes_path: PathBuf,
    pub first_scene: String,
    /// Frames the headless runner simulates.
    pub frames: u64,
    /// Simulated seconds per frame.
    pub frame_time: f32,
    /// Path to the configuration file.
    pub config_path: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineConfig {
    /// Create a new configuration with safe default values.
    pub fn new() -> Self {
        Self {
            render_width: DEFAULT_RENDER_WIDTH,
            render_height: DEFAULT_RENDER_HEIGHT,
            keep_aspect: DEFAULT_KEEP_ASPECT,
            scenes_path: PathBuf::from(DEFAULT_SCENES_PATH),
            first_scene: DEFAULT_FIRST_SCENE.to_owned(),
            frames: DEFAULT_FRAMES,
            frame_time: DEFAULT_FRAME_TIME,
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
        }
    }

    /// Create a new configuration with a custom config file path.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
            ..Self::new()
        }
    }

    /// Load configuration from the INI file.
    ///
    /// Missing values retain their current (default) values.
    pub fn load_from_file(&mut self) -> Result<(), ConfigError> {
        let mut config = Ini::new();
        config.load(&self.config_path).map_err(ConfigError::Load)?;

        // [render] section
        if let Some(width) = config.getuint("render", "width").ok().flatten() {
            self.render_width = width as u32;
        }
        if let Some(height) = config.getuint("render", "height").ok().flatten() {
            self.render_height = height as u32;
        }
        if let Some(keep_aspect) = config.getbool("render", "keep_aspect").ok().flatten() {
            self.keep_aspect = keep_aspect;
        }

        // [engine] section
        if let Some(scenes) = config.get("engine", "scenes") {
            self.scenes_path = PathBuf::from(scenes);
        }
        if let Some(first_scene) = config.get("engine", "first_scene") {
            self.first_scene = first_scene;
        }
        if let Some(frames) = config.getuint("engine", "frames").ok().flatten() {
            self.frames = frames;
        }
        if let Some(frame_time) = config.getfloat("engine", "frame_time").ok().flatten() {
            self.frame_time = frame_time as f32;
        }

        info!(
            "Loaded config: {}x{} render, keep_aspect={}, scenes={:?}, first_scene={}, frames={}, frame_time={}",
            self.render_width,
            self.render_height,
            self.keep_aspect,
            self.scenes_path,
            self.first_scene,
            self.frames,
            self.frame_time
        );

        Ok(())
    }

    /// Save configuration to the INI file.
    ///
    /// Creates the file if it doesn't exist.
    pub fn save_to_file(&self) -> Result<(), ConfigError> {
        let mut config = Ini::new();

        // [render] section
        config.set("render", "width", Some(self.render_width.to_string()));
        config.set("render", "height", Some(self.render_height.to_string()));
        config.set("render", "keep_aspect", Some(self.keep_aspect.to_string()));

        // [engine] section
        config.set("engine", "scenes", Some(self.scenes_path.display().to_string()));
        config.set("engine", "first_scene", Some(self.first_scene.clone()));
        config.set("engine", "frames", Some(self.frames.to_string()));
        config.set("engine", "frame_time", Some(self.frame_time.to_string()));

        config
            .write(&self.config_path)
            .map_err(|e| ConfigError::Save(e.to_string()))?;

        info!("Saved config to {:?}", self.config_path);

        Ok(())
    }

    /// Native resolution as the renderer expects it.
    pub fn render_size(&self) -> (f32, f32) {
        (self.render_width as f32, self.render_height as f32)
    }
}
