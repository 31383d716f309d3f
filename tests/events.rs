mod common;

use common::{props, Harness};
use serde_json::json;
use std::thread;
use surface_bridge::*;

#[test]
fn events_arrive_in_order() {
    let h = Harness::new();
    let surface = h.start_with_views(&[42]);

    let manager = h.manager.clone();
    thread::spawn(move || {
        for y in 0..20 {
            manager
                .receive_event(surface, ReactTag(42), "topScroll", Some(props(json!({ "y": y }))))
                .unwrap();
        }
    })
    .join()
    .unwrap();

    for y in 0..20 {
        let event = h.next_event().expect("event was not delivered");
        assert_eq!(event.surface, surface);
        assert_eq!(event.tag, ReactTag(42));
        assert_eq!(event.name, "topScroll");
        assert_eq!(event.payload["y"], json!(y));
    }
}

#[test]
fn events_for_stopped_surfaces_are_rejected() {
    let h = Harness::new();
    let surface = h.start_with_views(&[42]);
    h.manager.stop_surface(surface).unwrap();
    h.executor.run_pending();

    assert_eq!(
        h.manager.receive_event(surface, ReactTag(42), "topScroll", None),
        Err(BridgeError::StaleTarget(Target::Surface(surface)))
    );
    assert_eq!(
        h.manager.receive_event(SurfaceId(7), ReactTag(42), "topScroll", None),
        Err(BridgeError::StaleTarget(Target::Surface(SurfaceId(7))))
    );
}

#[test]
fn queued_events_are_dropped_once_teardown_completes() {
    let h = Harness::new();
    let surface = h.start_with_views(&[42]);

    let held = h.hold.lock();
    // blocks the delivery thread in the sink, outside of any surface
    h.manager
        .receive_event(SurfaceId::IMPLICIT, ReactTag(1), "topBlock", None)
        .unwrap();
    h.manager
        .receive_event(surface, ReactTag(42), "topScroll", None)
        .unwrap();
    h.manager.stop_surface(surface).unwrap();
    // still accepted while the surface is stopping
    h.manager
        .receive_event(surface, ReactTag(42), "topScroll", None)
        .unwrap();
    h.executor.run_pending();
    assert_eq!(h.manager.surface_state(surface), LifecycleState::Stopped);
    drop(held);

    h.manager
        .receive_event(SurfaceId::IMPLICIT, ReactTag(1), "topSentinel", None)
        .unwrap();
    assert_eq!(h.next_event().map(|event| event.name).as_deref(), Some("topBlock"));
    assert_eq!(h.next_event().map(|event| event.name).as_deref(), Some("topSentinel"));
}

#[test]
fn events_reach_starting_surfaces() {
    let h = Harness::new();
    let surface = h.start();
    h.manager
        .receive_event(surface, ReactTag(2), "topLayout", None)
        .unwrap();
    let event = h.next_event().unwrap();
    assert_eq!(event.surface, surface);
    assert!(event.payload.is_empty());
}

#[test]
#[allow(deprecated)]
fn legacy_events_use_the_implicit_surface() {
    let h = Harness::new();
    h.manager
        .receive_event_legacy(ReactTag(3), "topChange", Some(props(json!({ "value": true }))))
        .unwrap();

    let event = h.next_event().unwrap();
    assert_eq!(event.surface, SurfaceId::IMPLICIT);
    assert_eq!(event.tag, ReactTag(3));
    assert_eq!(event.payload["value"], json!(true));
    assert_eq!(h.manager.performance_counters()["calls.receive_event"], 1);
}

#[test]
#[allow(deprecated)]
fn direct_event_names() {
    let h = Harness::new();
    let resolve = |name| h.manager.resolve_custom_direct_event_name(name);

    assert_eq!(
        resolve(Some("topMomentumScrollEnd")).as_deref(),
        Some("onMomentumScrollEnded")
    );
    assert_eq!(resolve(Some("topChange")).as_deref(), Some("onChange"));
    assert_eq!(resolve(Some("top")), None);
    assert_eq!(resolve(Some("change")), None);
    assert_eq!(resolve(None), None);
}

#[test]
fn invalidated_bridges_refuse_events() {
    let h = Harness::new();
    h.manager.invalidate();
    assert_eq!(
        h.manager
            .receive_event(SurfaceId::IMPLICIT, ReactTag(1), "topChange", None),
        Err(BridgeError::Invalidated)
    );
}
