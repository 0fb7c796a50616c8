//! Overlord event routing tests: z-order traversal, capture, built-in pan
//! and pinch gestures, and ethereal events.

mod common;

use serde_json::{Value, json};

use sceneloom::components::base::Propagation;
use sceneloom::events::platform::{EventKind, PlatformEvent};
use sceneloom::resources::overlord::{Capture, Overlord};
use sceneloom::resources::renderer::Renderer;
use sceneloom::resources::worldtime::WorldTime;

use common::{Call, Probe, RecordingRenderer, approx_eq, global_journal, journal_entries, registry_with_probe};

fn running(description: Value) -> (Overlord, RecordingRenderer) {
    let renderer = RecordingRenderer::new();
    let mut overlord = Overlord::new(registry_with_probe(), Box::new(renderer.clone()));
    overlord.load_scene("main", &description).unwrap();
    overlord.start_scene("main").unwrap();
    overlord.update(&WorldTime::from_delta(0.016));
    renderer.clear();
    (overlord, renderer)
}

fn probe_entity(z: f32, probe_id: &str, extra: Value) -> Value {
    let mut probe = json!({"type": "Probe", "id": probe_id, "subscribe": ["touches", "zoom"]});
    if let (Some(probe), Some(extra)) = (probe.as_object_mut(), extra.as_object()) {
        probe.extend(extra.clone());
    }
    json!({"components": [{"type": "ZIndex", "id": "depth", "z": z}, probe]})
}

fn down(x: f32, y: f32) -> PlatformEvent {
    PlatformEvent::pointer(EventKind::TouchDown, x, y)
}

fn moved(x: f32, y: f32) -> PlatformEvent {
    PlatformEvent::pointer(EventKind::TouchMove, x, y)
}

fn up(x: f32, y: f32) -> PlatformEvent {
    PlatformEvent::pointer(EventKind::TouchUp, x, y)
}

#[test]
fn z_order_is_descending_with_ties_by_id() {
    let (overlord, _) = running(json!({
        "entities": {
            "low": {"components": [{"type": "ZIndex", "z": 1}]},
            "top-b": {"components": [{"type": "ZIndex", "z": 5}]},
            "top-a": {"components": [{"type": "ZIndex", "z": 5}]},
            "flat": {"components": []}
        }
    }));
    assert_eq!(overlord.entities_by_z(), &["top-a", "top-b", "low", "flat"]);
}

#[test]
fn capturing_entity_receives_the_rest_of_the_gesture() {
    let (mut overlord, _) = running(json!({
        "entities": {
            "a": probe_entity(2.0, "capA", json!({"capture": true})),
            "b": probe_entity(1.0, "capB", json!({}))
        }
    }));
    let journal = global_journal();

    overlord.report_event(down(10.0, 10.0));
    assert_eq!(overlord.capture(), &Capture::Entity("a".into()));

    overlord.report_event(moved(12.0, 12.0));
    assert_eq!(overlord.capture(), &Capture::Entity("a".into()));
    assert_eq!(overlord.tracked_streams(), vec![0]);

    overlord.report_event(up(12.0, 12.0));
    assert_eq!(overlord.capture(), &Capture::None);
    assert!(overlord.tracked_streams().is_empty());

    assert_eq!(journal_entries(&journal, "capA:").len(), 3);
    assert!(journal_entries(&journal, "capB:").is_empty());
}

#[test]
fn topmost_capturing_entity_keeps_the_capture() {
    let (mut overlord, _) = running(json!({
        "entities": {
            "upper": probe_entity(9.0, "firstUpper", json!({"capture": true, "stop": false})),
            "lower": probe_entity(1.0, "firstLower", json!({"capture": true, "stop": false}))
        }
    }));

    overlord.report_event(down(5.0, 5.0));
    assert_eq!(overlord.capture(), &Capture::Entity("upper".into()));
    // Both answered since neither stopped propagation.
    assert_eq!(journal_entries(&global_journal(), "firstLower:").len(), 1);

    overlord.report_event(moved(6.0, 6.0));
    assert_eq!(journal_entries(&global_journal(), "firstUpper:").len(), 2);
    assert_eq!(journal_entries(&global_journal(), "firstLower:").len(), 1);
}

#[test]
fn captor_answering_without_capture_releases_it() {
    let (mut overlord, _) = running(json!({
        "entities": {
            "a": probe_entity(2.0, "relA", json!({"capture": true}))
        }
    }));

    overlord.report_event(down(1.0, 1.0));
    assert_eq!(overlord.capture(), &Capture::Entity("a".into()));

    overlord.with_entity("a", |e| {
        let probe = e.component_mut("relA").and_then(|c| c.downcast_mut::<Probe>()).unwrap();
        probe.reply = Propagation::STOP;
    });
    overlord.report_event(moved(2.0, 2.0));
    assert_eq!(overlord.capture(), &Capture::None);
    assert_eq!(journal_entries(&global_journal(), "relA:").len(), 2);
}

#[test]
fn stopping_entity_hides_lower_entities() {
    let (mut overlord, _) = running(json!({
        "entities": {
            "front": probe_entity(3.0, "stopFront", json!({"stop": true})),
            "back": probe_entity(1.0, "stopBack", json!({}))
        }
    }));
    overlord.report_event(down(0.0, 0.0));

    assert_eq!(overlord.capture(), &Capture::None);
    assert_eq!(journal_entries(&global_journal(), "stopFront:").len(), 1);
    assert!(journal_entries(&global_journal(), "stopBack:").is_empty());
}

#[test]
fn single_stream_drag_pans_the_viewport() {
    let (mut overlord, renderer) = running(json!({"userCanScroll": true}));

    overlord.report_event(down(100.0, 100.0));
    assert!(renderer.calls().is_empty());

    overlord.report_event(moved(105.0, 97.0).with_delta(5.0, -3.0));
    assert_eq!(renderer.calls(), vec![Call::ScrollBy(5.0, -3.0)]);
    assert_eq!(overlord.capture(), &Capture::Viewport);

    // Missing deltas come from the stream's stored event.
    overlord.report_event(moved(110.0, 99.0));
    assert_eq!(renderer.calls().last(), Some(&Call::ScrollBy(5.0, 2.0)));
}

#[test]
fn viewport_capture_keeps_entities_out_until_touchup() {
    let (mut overlord, renderer) = running(json!({
        "userCanScroll": true,
        "entities": {"bg": probe_entity(0.0, "vpBg", json!({}))}
    }));

    overlord.report_event(down(0.0, 0.0));
    overlord.report_event(moved(4.0, 0.0));
    overlord.report_event(moved(8.0, 0.0));
    assert_eq!(journal_entries(&global_journal(), "vpBg:").len(), 2);
    assert_eq!(renderer.calls(), vec![Call::ScrollBy(4.0, 0.0), Call::ScrollBy(4.0, 0.0)]);

    overlord.report_event(up(8.0, 0.0));
    assert_eq!(overlord.capture(), &Capture::None);
    overlord.report_event(down(1.0, 1.0));
    assert_eq!(journal_entries(&global_journal(), "vpBg:").len(), 3);
}

#[test]
fn scrolling_requires_permission() {
    let (mut overlord, renderer) = running(json!({"userCanScroll": false}));
    overlord.report_event(down(0.0, 0.0));
    overlord.report_event(moved(5.0, 5.0));
    assert!(renderer.calls().is_empty());
    assert_eq!(overlord.capture(), &Capture::None);
}

#[test]
fn hovering_pointer_is_not_tracked() {
    let (mut overlord, renderer) = running(json!({"userCanScroll": true}));
    overlord.report_event(PlatformEvent::pointer(EventKind::MouseMove, 10.0, 10.0));
    overlord.report_event(PlatformEvent::pointer(EventKind::MouseMove, 20.0, 20.0));
    assert!(renderer.calls().is_empty());
    assert!(overlord.tracked_streams().is_empty());

    overlord.report_event(PlatformEvent::pointer(EventKind::MouseDown, 20.0, 20.0));
    assert_eq!(overlord.tracked_streams(), vec![0]);
    assert_eq!(overlord.last_event().map(|e| e.kind), Some(EventKind::TouchDown));
}

#[test]
fn two_finger_pinch_scales_by_squared_distance_delta() {
    let (mut overlord, renderer) = running(json!({"userCanZoom": true, "userCanScroll": true}));

    overlord.report_event(down(0.0, 0.0));
    overlord.report_event(down(30.0, 40.0).on_stream(1));
    assert!(renderer.calls().is_empty());

    let anchor = renderer.screen_to_scene(30.0, 40.0);
    overlord.report_event(moved(60.0, 80.0).on_stream(1));

    let calls = renderer.calls();
    assert_eq!(calls[0], Call::ScaleBy(7500.0));
    assert!(matches!(calls[1], Call::ScrollBy(..)));
    assert_eq!(calls.len(), 2);
    assert_eq!(overlord.capture(), &Capture::Viewport);

    // The midpoint between the fingers stays put on screen.
    let (sx, sy) = renderer.scene_to_screen(anchor.0, anchor.1);
    assert!(approx_eq(sx, 30.0));
    assert!(approx_eq(sy, 40.0));
}

#[test]
fn zoom_buttons_scale_around_the_last_pointer() {
    let (mut overlord, renderer) = running(json!({"userCanZoom": true}));
    overlord.report_event(down(50.0, 20.0));
    overlord.report_event(up(50.0, 20.0));
    let anchor = renderer.screen_to_scene(50.0, 20.0);

    overlord.report_event(PlatformEvent::new(EventKind::ZoomIn));
    assert_eq!(renderer.calls()[0], Call::ScaleByFactor(1.2));
    let (sx, sy) = renderer.scene_to_screen(anchor.0, anchor.1);
    assert!(approx_eq(sx, 50.0));
    assert!(approx_eq(sy, 20.0));

    renderer.clear();
    overlord.report_event(PlatformEvent::new(EventKind::ZoomOut));
    assert_eq!(renderer.calls()[0], Call::ScaleByFactor(0.8));
}

#[test]
fn zoom_buttons_without_pointer_history_scale_only() {
    let (mut overlord, renderer) = running(json!({"userCanZoom": true}));
    overlord.report_event(PlatformEvent::new(EventKind::ZoomIn));
    assert_eq!(renderer.calls(), vec![Call::ScaleByFactor(1.2)]);
}

#[test]
fn ethereal_events_are_broadcast_until_stopped() {
    let (mut overlord, renderer) = running(json!({
        "userCanZoom": true,
        "entities": {
            "map": probe_entity(1.0, "ethMap", json!({"capture": true}))
        }
    }));

    overlord.report_event(PlatformEvent::new(EventKind::ZoomIn));
    assert!(renderer.calls().is_empty());
    assert_eq!(overlord.capture(), &Capture::Entity("map".into()));
    assert_eq!(journal_entries(&global_journal(), "ethMap:"), vec!["ethMap:zoom"]);

    // Focus maps to no signal: nobody answers and nothing zooms.
    overlord.report_event(PlatformEvent::new(EventKind::Focus));
    assert!(renderer.calls().is_empty());
}

#[test]
fn zoom_buttons_require_permission() {
    let (mut overlord, renderer) = running(json!({"userCanZoom": false}));
    overlord.report_event(PlatformEvent::new(EventKind::ZoomOut));
    assert!(renderer.calls().is_empty());
}

#[test]
fn draggable_moves_in_scene_coordinates() {
    let (mut overlord, renderer) = running(json!({
        "userCanScroll": true,
        "entities": {
            "box": {"components": [
                {"type": "ZIndex", "z": 1},
                {"type": "Draggable", "x": 0, "y": 0, "width": 10, "height": 10}
            ]}
        }
    }));

    overlord.report_event(down(5.0, 5.0));
    assert_eq!(overlord.capture(), &Capture::Entity("box".into()));
    overlord.report_event(moved(8.0, 9.0));
    overlord.report_event(up(8.0, 9.0));

    let entity = overlord.entity("box").unwrap();
    assert_eq!(entity.get_property("x").unwrap().into_value(), Some(json!(3.0)));
    assert_eq!(entity.get_property("y").unwrap().into_value(), Some(json!(4.0)));
    assert_eq!(overlord.capture(), &Capture::None);
    // The drag never reached the viewport.
    assert!(renderer.calls().is_empty());
}
