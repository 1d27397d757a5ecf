// ABOUTME: In-memory platform for playback tests: records every media/engine call.
// ABOUTME: Exposes the latest event sinks so tests can play the role of the host media stack.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use reelfeed_feed::{video_item_from_entry, Embed, RawEntry, VideoItem};
use reelfeed_player::{
    EventSink, MediaElement, MetricsSink, NetworkProfile, PlaybackEvent, Platform, SlotId,
    StreamingEngine, TelemetryError, TelemetryEvent,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    SetSource { url: String, content_type: String },
    Load,
    SetMuted(bool),
    Play,
    Pause,
    ClearSource,
    CreateEngine { manifest_timeout_ms: u64 },
    Attach,
    LoadSource(String),
    RecoverMedia,
    Detach,
    Destroy,
}

#[derive(Debug, Default)]
pub struct Recorder {
    pub calls: Vec<(SlotId, Call)>,
    pub media_sinks: HashMap<SlotId, EventSink>,
    pub engine_sinks: HashMap<SlotId, EventSink>,
    pub live_engines: usize,
    pub max_live_engines: usize,
    pub engines_created: usize,
    /// Emitted automatically on every play() when set.
    pub play_response: Option<PlaybackEvent>,
}

#[derive(Debug, Clone, Default)]
pub struct FakePlatform {
    pub native_adaptive: bool,
    pub recorder: Arc<Mutex<Recorder>>,
}

impl FakePlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_native_adaptive() -> Self {
        Self {
            native_adaptive: true,
            ..Self::default()
        }
    }

    pub fn auto_play(&self, response: PlaybackEvent) {
        self.recorder.lock().play_response = Some(response);
    }

    pub fn calls(&self, slot: SlotId) -> Vec<Call> {
        self.recorder
            .lock()
            .calls
            .iter()
            .filter(|(s, _)| *s == slot)
            .map(|(_, c)| c.clone())
            .collect()
    }

    pub fn count(&self, slot: SlotId, call: &Call) -> usize {
        self.calls(slot).iter().filter(|c| *c == call).count()
    }

    pub fn media_sink(&self, slot: SlotId) -> EventSink {
        self.recorder.lock().media_sinks[&slot].clone()
    }

    pub fn engine_sink(&self, slot: SlotId) -> EventSink {
        self.recorder.lock().engine_sinks[&slot].clone()
    }

    pub fn live_engines(&self) -> usize {
        self.recorder.lock().live_engines
    }

    pub fn max_live_engines(&self) -> usize {
        self.recorder.lock().max_live_engines
    }

    pub fn engines_created(&self) -> usize {
        self.recorder.lock().engines_created
    }
}

pub struct FakeMedia {
    slot: Option<SlotId>,
    recorder: Arc<Mutex<Recorder>>,
}

impl FakeMedia {
    fn record(&self, call: Call) {
        if let Some(slot) = self.slot {
            self.recorder.lock().calls.push((slot, call));
        }
    }
}

impl MediaElement for FakeMedia {
    fn listen(&mut self, sink: EventSink) {
        self.slot = Some(sink.slot());
        self.recorder.lock().media_sinks.insert(sink.slot(), sink);
    }

    fn set_source(&mut self, url: &str, content_type: &str) {
        self.record(Call::SetSource {
            url: url.to_string(),
            content_type: content_type.to_string(),
        });
    }

    fn load(&mut self) {
        self.record(Call::Load);
    }

    fn set_muted(&mut self, muted: bool) {
        self.record(Call::SetMuted(muted));
    }

    fn play(&mut self) {
        self.record(Call::Play);
        let (response, sink) = {
            let rec = self.recorder.lock();
            (
                rec.play_response.clone(),
                self.slot.and_then(|s| rec.media_sinks.get(&s).cloned()),
            )
        };
        if let (Some(response), Some(sink)) = (response, sink) {
            sink.emit(response);
        }
    }

    fn pause(&mut self) {
        self.record(Call::Pause);
    }

    fn clear_source(&mut self) {
        self.record(Call::ClearSource);
    }
}

pub struct FakeEngine {
    slot: SlotId,
    recorder: Arc<Mutex<Recorder>>,
    destroyed: bool,
}

impl FakeEngine {
    fn record(&self, call: Call) {
        self.recorder.lock().calls.push((self.slot, call));
    }
}

impl StreamingEngine for FakeEngine {
    fn attach_media(&mut self, _media: &mut dyn MediaElement) {
        self.record(Call::Attach);
    }

    fn load_source(&mut self, url: &str) {
        self.record(Call::LoadSource(url.to_string()));
    }

    fn recover_media_error(&mut self) {
        self.record(Call::RecoverMedia);
    }

    fn detach_media(&mut self) {
        self.record(Call::Detach);
    }

    fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;
        self.record(Call::Destroy);
        self.recorder.lock().live_engines -= 1;
    }
}

impl Platform for FakePlatform {
    type Media = FakeMedia;
    type Engine = FakeEngine;

    fn supports_native_adaptive(&self) -> bool {
        self.native_adaptive
    }

    fn create_media(&self) -> FakeMedia {
        FakeMedia {
            slot: None,
            recorder: Arc::clone(&self.recorder),
        }
    }

    fn create_engine(&self, profile: &NetworkProfile, sink: EventSink) -> FakeEngine {
        let slot = sink.slot();
        let mut rec = self.recorder.lock();
        rec.calls.push((
            slot,
            Call::CreateEngine {
                manifest_timeout_ms: profile.manifest_timeout.as_millis() as u64,
            },
        ));
        rec.engine_sinks.insert(slot, sink);
        rec.live_engines += 1;
        rec.engines_created += 1;
        rec.max_live_engines = rec.max_live_engines.max(rec.live_engines);
        FakeEngine {
            slot,
            recorder: Arc::clone(&self.recorder),
            destroyed: false,
        }
    }
}

#[derive(Debug, Default)]
pub struct RecordingMetrics {
    pub events: Mutex<Vec<TelemetryEvent>>,
}

impl RecordingMetrics {
    pub fn events(&self) -> Vec<TelemetryEvent> {
        self.events.lock().clone()
    }
}

impl MetricsSink for RecordingMetrics {
    fn record(&self, event: &TelemetryEvent) -> Result<(), TelemetryError> {
        self.events.lock().push(event.clone());
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct FailingMetrics;

impl MetricsSink for FailingMetrics {
    fn record(&self, _event: &TelemetryEvent) -> Result<(), TelemetryError> {
        Err(TelemetryError::Unavailable("collector offline".into()))
    }
}

pub fn item(hash: &str, url: &str) -> VideoItem {
    let entry = RawEntry {
        hash: hash.to_string(),
        embeds: vec![Embed::url(url)],
        ..RawEntry::default()
    };
    video_item_from_entry(&entry).expect("url classifies as video")
}

pub fn hls_item(hash: &str) -> VideoItem {
    item(hash, &format!("https://stream.example.com/{hash}/index.m3u8"))
}

pub fn mp4_item(hash: &str) -> VideoItem {
    item(hash, &format!("https://cdn.example.com/{hash}.mp4"))
}
