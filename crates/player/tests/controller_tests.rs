// ABOUTME: Integration tests for PlaybackController window management and event routing.
// ABOUTME: Uses the in-memory platform to count engines and inspect per-slot calls.

mod common;

use std::sync::Arc;

use common::{hls_item, mp4_item, Call, FakePlatform, RecordingMetrics};
use pretty_assertions::assert_eq;
use reelfeed_feed::VideoItem;
use reelfeed_player::{
    DeviceClass, Demand, NetworkSpeed, PlaybackController, PlaybackEvent, PlayerConfig, State,
    TelemetryEvent,
};

fn hls_items(n: usize) -> Vec<VideoItem> {
    (0..n).map(|i| hls_item(&format!("item{i}"))).collect()
}

fn controller(platform: &FakePlatform, items: Vec<VideoItem>) -> PlaybackController<FakePlatform> {
    let mut c = PlaybackController::new(Arc::new(platform.clone()), PlayerConfig::default());
    c.set_items(items);
    c
}

#[test]
fn test_activation_creates_active_and_preload_sessions() {
    let platform = FakePlatform::new();
    let mut c = controller(&platform, hls_items(4));
    assert!(c.live_slots().is_empty());

    assert!(c.activate(0));
    assert_eq!(c.live_slots(), vec![0, 1]);
    assert_eq!(c.session(0).unwrap().demand(), Demand::Active);
    assert_eq!(c.session(1).unwrap().demand(), Demand::Preload);
    assert_eq!(c.state(1), Some(State::Loading));
    assert_eq!(c.state(2), None);
}

#[test]
fn test_activate_out_of_range_is_rejected() {
    let platform = FakePlatform::new();
    let mut c = controller(&platform, hls_items(2));
    assert!(!c.activate(2));
    assert_eq!(c.active(), None);
}

#[test]
fn test_window_moves_and_destroys_outside_sessions() {
    let platform = FakePlatform::new();
    let mut c = controller(&platform, hls_items(4));
    c.activate(0);
    c.activate(2);

    assert_eq!(c.live_slots(), vec![2, 3]);
    assert_eq!(platform.live_engines(), 2);
    assert_eq!(platform.count(0, &Call::Destroy), 1);
    assert_eq!(platform.count(1, &Call::Destroy), 1);
}

#[test]
fn test_window_clamps_at_end_of_list() {
    let platform = FakePlatform::new();
    let mut c = controller(&platform, hls_items(3));
    c.activate(2);
    assert_eq!(c.live_slots(), vec![2]);
}

#[test]
fn test_preload_promoted_to_active_keeps_engine() {
    let platform = FakePlatform::new();
    let mut c = controller(&platform, hls_items(3));
    c.activate(0);
    let generation = c.session(1).unwrap().generation();

    c.activate(1);
    let session = c.session(1).unwrap();
    assert_eq!(session.demand(), Demand::Active);
    assert_eq!(session.generation(), generation);
    assert_eq!(platform.count(1, &Call::Destroy), 0);
}

#[test]
fn test_each_session_holds_at_most_one_engine() {
    let platform = FakePlatform::new();
    let mut c = controller(&platform, hls_items(3));
    c.activate(0);
    c.activate(1);
    c.activate(0);
    c.activate(1);

    assert_eq!(platform.live_engines(), c.live_slots().len());
    for slot in c.live_slots() {
        let calls = platform.calls(slot);
        let created = calls
            .iter()
            .filter(|call| matches!(call, Call::CreateEngine { .. }))
            .count();
        let destroyed = calls.iter().filter(|call| **call == Call::Destroy).count();
        assert_eq!(created - destroyed, 1);
    }
}

#[test]
fn test_deactivate_tears_everything_down() {
    let platform = FakePlatform::new();
    let mut c = controller(&platform, hls_items(3));
    c.activate(1);
    c.deactivate();
    assert!(c.live_slots().is_empty());
    assert_eq!(platform.live_engines(), 0);
}

#[test]
fn test_changed_item_supersedes_session() {
    let platform = FakePlatform::new();
    let mut c = controller(&platform, hls_items(2));
    c.activate(0);
    let stale_sink = platform.engine_sink(0);
    let kept_generation = c.session(1).unwrap().generation();

    let mut items = hls_items(2);
    items[0] = mp4_item("replacement");
    c.set_items(items);

    assert_eq!(c.session(0).unwrap().item_id(), "replacement");
    assert_eq!(c.session(1).unwrap().generation(), kept_generation);
    assert_eq!(platform.count(0, &Call::Destroy), 1);

    stale_sink.emit(PlaybackEvent::ManifestParsed);
    assert_eq!(c.process_pending(), 0);
    assert_eq!(c.state(0), Some(State::Loading));
}

#[test]
fn test_same_items_keep_sessions() {
    let platform = FakePlatform::new();
    let mut c = controller(&platform, hls_items(3));
    c.activate(0);
    c.set_items(hls_items(3));
    assert_eq!(platform.engines_created(), 2);
    assert_eq!(c.live_slots(), vec![0, 1]);
}

#[test]
fn test_shrinking_items_clears_active() {
    let platform = FakePlatform::new();
    let mut c = controller(&platform, hls_items(3));
    c.activate(2);
    c.set_items(hls_items(1));
    assert_eq!(c.active(), None);
    assert!(c.live_slots().is_empty());
}

#[test]
fn test_appended_items_join_window() {
    let platform = FakePlatform::new();
    let mut c = controller(&platform, hls_items(1));
    c.activate(0);
    assert_eq!(c.live_slots(), vec![0]);

    c.append_items(vec![hls_item("next")]);
    assert_eq!(c.live_slots(), vec![0, 1]);
    assert_eq!(c.session(1).unwrap().demand(), Demand::Preload);
}

#[test]
fn test_preloaded_session_does_not_play() {
    let platform = FakePlatform::new();
    let mut c = controller(&platform, hls_items(2));
    c.activate(0);
    platform.engine_sink(1).emit(PlaybackEvent::ManifestParsed);
    assert_eq!(c.process_pending(), 1);
    assert_eq!(c.state(1), Some(State::Ready));
    assert_eq!(platform.count(1, &Call::Play), 0);
}

#[test]
fn test_mute_change_reaches_next_play() {
    let platform = FakePlatform::new();
    let mut c = controller(&platform, hls_items(2));
    c.activate(0);
    c.set_muted(false);

    platform.engine_sink(0).emit(PlaybackEvent::ManifestParsed);
    c.process_pending();
    let calls = platform.calls(0);
    assert_eq!(&calls[calls.len() - 2..], &[Call::SetMuted(false), Call::Play]);
    assert!(!c.config().muted);
}

#[test]
fn test_network_change_applies_to_new_engines() {
    let platform = FakePlatform::new();
    let mut c = controller(&platform, hls_items(1));
    c.set_device(DeviceClass::Mobile);
    c.set_network_speed(NetworkSpeed::Fast);
    c.activate(0);
    assert_eq!(platform.calls(0)[0], Call::CreateEngine { manifest_timeout_ms: 5_000 });
}

#[test]
fn test_user_controls_route_to_session() {
    let platform = FakePlatform::new();
    platform.auto_play(PlaybackEvent::PlayStarted);
    let mut c = controller(&platform, vec![mp4_item("a")]);
    c.activate(0);
    platform.media_sink(0).emit(PlaybackEvent::CanPlay);
    c.process_pending();
    assert_eq!(c.state(0), Some(State::Playing));

    assert_eq!(c.user_pause(0), Some(State::Paused { awaiting_gesture: false }));
    c.user_play(0);
    c.process_pending();
    assert_eq!(c.state(0), Some(State::Playing));
    assert_eq!(c.user_play(5), None);
}

#[tokio::test]
async fn test_process_next_routes_callbacks_and_reports() {
    let platform = FakePlatform::new();
    platform.auto_play(PlaybackEvent::PlayStarted);
    let metrics = Arc::new(RecordingMetrics::default());
    let mut c = PlaybackController::new(Arc::new(platform.clone()), PlayerConfig::default())
        .with_metrics(metrics.clone());
    c.set_items(vec![mp4_item("a")]);
    c.activate(0);

    platform.media_sink(0).emit(PlaybackEvent::LoadedData);
    assert!(c.process_next().await);
    assert!(c.process_next().await);
    assert_eq!(c.state(0), Some(State::Playing));

    let events = metrics.events();
    assert_eq!(events.len(), 1);
    assert!(matches!(
        &events[0],
        TelemetryEvent::StartupLatency { item_id, preloaded: false, .. } if item_id == "a"
    ));
}
