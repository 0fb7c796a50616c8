//! Sceneloom headless runner.
//!
//! Loads the engine configuration and the scenes file, starts the first
//! scene and simulates a fixed number of frames with a headless viewport.
//! An optional event script replays platform input at given frames:
//!
//! ```json
//! [
//!   {"frame": 2, "event": {"type": "mousedown", "x": 10, "y": 10}},
//!   {"frame": 3, "event": {"type": "mousemove", "x": 15, "y": 7}},
//!   {"frame": 4, "event": {"type": "mouseup", "x": 15, "y": 7}}
//! ]
//! ```
//!
//! # Main Loop
//!
//! 1. Read `config.ini` (defaults when absent) and apply CLI overrides
//! 2. Insert the overlord, time and config resources, register observers
//! 3. Each frame: advance time, trigger the frame's scripted events, run
//!    the schedule (entity updates, then pending scene changes)
//! 4. Reset every scene on exit
//!
//! # Running
//!
//! ```sh
//! cargo run --release -- --scenes scenes.json --scene main --frames 120
//! ```

use std::path::PathBuf;

use bevy_ecs::observer::Observer;
use bevy_ecs::prelude::*;
use clap::Parser;
use serde::Deserialize;

use sceneloom::error::ConfigError;
use sceneloom::events::platform::{PlatformEvent, observe_platform_event};
use sceneloom::events::scene::observe_scene_change_event;
use sceneloom::resources::engineconfig::EngineConfig;
use sceneloom::resources::overlord::Overlord;
use sceneloom::resources::renderer::{Renderer, Viewport};
use sceneloom::resources::typeregistry::TypeRegistry;
use sceneloom::resources::worldtime::WorldTime;
use sceneloom::systems::overlord::{check_pending_scene, overlord_update_system, scene_is_active};
use sceneloom::systems::time::update_world_time;

/// Sceneloom headless runner
#[derive(Parser)]
#[command(version, about = "Runs sceneloom scenes without a window.")]
struct Cli {
    /// INI configuration file.
    #[arg(long, value_name = "PATH", default_value = "./config.ini")]
    config: PathBuf,

    /// JSON file with the scene descriptions (overrides the config).
    #[arg(long, value_name = "PATH")]
    scenes: Option<PathBuf>,

    /// Scene to start (overrides the config).
    #[arg(long, value_name = "ID")]
    scene: Option<String>,

    /// Number of frames to simulate (overrides the config).
    #[arg(long)]
    frames: Option<u64>,

    /// JSON event script to replay.
    #[arg(long, value_name = "PATH")]
    events: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct ScriptedEvent {
    frame: u64,
    event: PlatformEvent,
}

fn load_script(path: &PathBuf) -> Result<Vec<ScriptedEvent>, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let mut script: Vec<ScriptedEvent> = serde_json::from_str(&text).map_err(|source| ConfigError::Json {
        path: path.display().to_string(),
        source,
    })?;
    script.sort_by_key(|e| e.frame);
    Ok(script)
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let mut config = EngineConfig::with_path(&cli.config);
    if let Err(e) = config.load_from_file() {
        log::warn!("{}; using defaults", e);
    }
    if let Some(scenes) = cli.scenes {
        config.scenes_path = scenes;
    }
    if let Some(scene) = cli.scene {
        config.first_scene = scene;
    }
    if let Some(frames) = cli.frames {
        config.frames = frames;
    }

    let script = match cli.events.as_ref().map(load_script) {
        Some(Ok(script)) => script,
        Some(Err(e)) => {
            log::error!("{}", e);
            std::process::exit(1);
        }
        None => Vec::new(),
    };

    // --------------- Overlord + scenes ---------------
    let mut viewport = Viewport::new();
    let (width, height) = config.render_size();
    viewport.set_native_resolution(Some(width), Some(height), config.keep_aspect);
    let mut overlord = Overlord::new(TypeRegistry::with_builtins(), Box::new(viewport));
    if let Err(e) = overlord.load_scenes_from_file(&config.scenes_path) {
        log::error!("{}", e);
        std::process::exit(1);
    }
    overlord.set_first_scene(config.first_scene.clone());
    if overlord.start_first_scene().is_err() {
        std::process::exit(1);
    }

    // --------------- ECS world + resources ---------------
    let mut world = World::new();
    world.insert_resource(WorldTime::default().with_time_scale(1.0));
    world.insert_resource(overlord);
    let frames = config.frames;
    let frame_time = config.frame_time;
    world.insert_resource(config);

    world.spawn(Observer::new(observe_platform_event));
    world.spawn(Observer::new(observe_scene_change_event));
    // Ensure the observers are registered before we run any systems that may trigger events.
    world.flush();

    let mut update = Schedule::default();
    update.add_systems(overlord_update_system.run_if(scene_is_active));
    update.add_systems(check_pending_scene.after(overlord_update_system));

    if let Err(e) = update.initialize(&mut world) {
        log::error!("Failed to initialize schedule: {}", e);
        std::process::exit(1);
    }

    // --------------- Main loop ---------------
    let mut script = script.into_iter().peekable();
    for frame in 0..frames {
        update_world_time(&mut world, frame_time);
        while let Some(scripted) = script.next_if(|s| s.frame <= frame) {
            world.trigger(scripted.event);
        }
        update.run(&mut world);
        world.clear_trackers();
    }

    let mut overlord = world.resource_mut::<Overlord>();
    log::info!("Finished {} frames in scene {:?}", frames, overlord.active_scene_id());
    overlord.reset_scenes();
}
