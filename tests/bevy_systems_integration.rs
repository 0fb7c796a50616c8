//! Bevy ECS wiring tests
//!
//! These run the overlord the way the binary does: as a resource in a
//! `World`, driven by a `Schedule` and fed platform events through
//! observers.

mod common;

use bevy_ecs::observer::Observer;
use bevy_ecs::prelude::*;
use serde_json::json;

use sceneloom::events::platform::{EventKind, PlatformEvent, observe_platform_event};
use sceneloom::events::scene::observe_scene_change_event;
use sceneloom::resources::overlord::{Capture, Overlord};
use sceneloom::resources::worldtime::WorldTime;
use sceneloom::systems::overlord::{check_pending_scene, overlord_update_system, scene_is_active};
use sceneloom::systems::time::update_world_time;

use common::{Call, RecordingRenderer, global_journal, journal_entries, registry_with_probe};

// =============================================================================
// Helpers
// =============================================================================

fn world_with(overlord: Overlord) -> (World, Schedule) {
    let mut world = World::new();
    world.insert_resource(WorldTime::default());
    world.insert_resource(overlord);
    world.spawn(Observer::new(observe_platform_event));
    world.spawn(Observer::new(observe_scene_change_event));
    world.flush();

    let mut schedule = Schedule::default();
    schedule.add_systems(overlord_update_system.run_if(scene_is_active));
    schedule.add_systems(check_pending_scene.after(overlord_update_system));
    (world, schedule)
}

fn step(world: &mut World, schedule: &mut Schedule, dt: f32) {
    update_world_time(world, dt);
    schedule.run(world);
    world.clear_trackers();
}

// =============================================================================
// Time
// =============================================================================

#[test]
fn world_time_counts_scaled_frames() {
    let mut world = World::new();
    world.insert_resource(WorldTime::default().with_time_scale(0.5));
    update_world_time(&mut world, 0.2);
    update_world_time(&mut world, 0.2);

    let time = world.resource::<WorldTime>();
    assert_eq!(time.frame_count, 2);
    assert!((time.delta - 0.1).abs() < 1e-6);
    assert!((time.elapsed - 0.2).abs() < 1e-6);
}

// =============================================================================
// Schedule
// =============================================================================

#[test]
fn schedule_is_idle_without_an_active_scene() {
    let mut overlord = Overlord::new(registry_with_probe(), Box::new(RecordingRenderer::new()));
    overlord.load_scene("idle", &json!({"entities": {"e": {"components": []}}})).unwrap();
    let (mut world, mut schedule) = world_with(overlord);

    step(&mut world, &mut schedule, 0.016);
    let overlord = world.resource::<Overlord>();
    assert_eq!(overlord.active_scene_id(), None);
    assert!(!overlord.is_running("e"));
}

#[test]
fn schedule_starts_entities_of_the_active_scene() {
    let mut overlord = Overlord::new(registry_with_probe(), Box::new(RecordingRenderer::new()));
    overlord.load_scene("main", &json!({"entities": {"e": {"components": []}}})).unwrap();
    overlord.start_scene("main").unwrap();
    let (mut world, mut schedule) = world_with(overlord);

    assert!(world.resource::<Overlord>().is_loading("e"));
    step(&mut world, &mut schedule, 0.016);
    assert!(world.resource::<Overlord>().is_running("e"));
}

#[test]
fn timer_scene_request_is_applied_by_the_observer() {
    let mut overlord = Overlord::new(registry_with_probe(), Box::new(RecordingRenderer::new()));
    overlord
        .load_scene("splash", &json!({"entities": {
            "clock": {"components": [{"type": "Timer", "duration": 0.05, "scene": "menu"}]}
        }}))
        .unwrap();
    overlord.load_scene("menu", &json!({"entities": {"title": {"components": []}}})).unwrap();
    overlord.start_scene("splash").unwrap();
    let (mut world, mut schedule) = world_with(overlord);

    step(&mut world, &mut schedule, 0.03);
    assert_eq!(world.resource::<Overlord>().active_scene_id(), Some("splash"));

    step(&mut world, &mut schedule, 0.03);
    let overlord = world.resource::<Overlord>();
    assert_eq!(overlord.active_scene_id(), Some("menu"));
    assert_eq!(overlord.pending_scene(), None);
    assert!(overlord.is_loading("title"));

    step(&mut world, &mut schedule, 0.03);
    assert!(world.resource::<Overlord>().is_running("title"));
}

#[test]
fn request_for_an_unknown_scene_keeps_the_current_one() {
    let mut overlord = Overlord::new(registry_with_probe(), Box::new(RecordingRenderer::new()));
    overlord.load_scene("main", &json!({"entities": {"e": {"components": []}}})).unwrap();
    overlord.start_scene("main").unwrap();
    overlord.request_scene("missing");
    let (mut world, mut schedule) = world_with(overlord);

    step(&mut world, &mut schedule, 0.016);
    let overlord = world.resource::<Overlord>();
    assert_eq!(overlord.active_scene_id(), Some("main"));
    assert_eq!(overlord.pending_scene(), None);
    assert!(overlord.is_running("e"));
}

// =============================================================================
// Observers
// =============================================================================

#[test]
fn triggered_platform_events_reach_entities() {
    let mut overlord = Overlord::new(registry_with_probe(), Box::new(RecordingRenderer::new()));
    overlord
        .load_scene("main", &json!({"entities": {
            "button": {"components": [
                {"type": "Probe", "id": "bevyButton", "subscribe": ["touches"], "capture": true}
            ]}
        }}))
        .unwrap();
    overlord.start_scene("main").unwrap();
    let (mut world, mut schedule) = world_with(overlord);
    step(&mut world, &mut schedule, 0.016);

    world.trigger(PlatformEvent::pointer(EventKind::MouseDown, 4.0, 4.0));
    world.flush();

    assert_eq!(world.resource::<Overlord>().capture(), &Capture::Entity("button".into()));
    assert_eq!(journal_entries(&global_journal(), "bevyButton:"), vec!["bevyButton:touches"]);
}

#[test]
fn triggered_drag_pans_the_viewport() {
    let renderer = RecordingRenderer::new();
    let mut overlord = Overlord::new(registry_with_probe(), Box::new(renderer.clone()));
    overlord.load_scene("map", &json!({"userCanScroll": true})).unwrap();
    overlord.start_scene("map").unwrap();
    renderer.clear();
    let (mut world, mut schedule) = world_with(overlord);
    step(&mut world, &mut schedule, 0.016);

    world.trigger(PlatformEvent::pointer(EventKind::TouchDown, 10.0, 10.0));
    world.trigger(PlatformEvent::pointer(EventKind::TouchMove, 16.0, 2.0));
    world.flush();

    assert_eq!(renderer.calls(), vec![Call::ScrollBy(6.0, -8.0)]);
    assert_eq!(world.resource::<Overlord>().capture(), &Capture::Viewport);

    world.trigger(PlatformEvent::pointer(EventKind::TouchUp, 16.0, 2.0));
    world.flush();
    assert_eq!(world.resource::<Overlord>().capture(), &Capture::None);
    assert!(world.resource::<Overlord>().tracked_streams().is_empty());
}
