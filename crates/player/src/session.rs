// ABOUTME: One playback session per item: runs the transition machine and applies its effects.
// ABOUTME: Owns the media element, at most one streaming engine, and any pending retry timer.

use std::sync::Arc;

use reelfeed_feed::{VideoDescriptor, VideoItem};
use tokio::sync::mpsc::UnboundedSender;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::config::PlayerConfig;
use crate::machine::{select_strategy, Demand, DeliveryStrategy, Effect, Machine, PlaybackEvent, Signal, State};
use crate::network::NetworkProfile;
use crate::platform::{EventSink, Generation, Generations, MediaElement, Platform, SlotEvent, SlotId, StreamingEngine};
use crate::telemetry::{MetricsSink, TelemetryEvent};

/// Drives one item from idle through playback to teardown.
///
/// Platform callbacks must be fed back through [`PlaybackSession::dispatch_from`]
/// so that events from a released attachment are dropped.
pub struct PlaybackSession<P: Platform> {
    slot: SlotId,
    item_id: String,
    descriptor: VideoDescriptor,
    machine: Machine,
    platform: Arc<P>,
    media: P::Media,
    engine: Option<P::Engine>,
    source_attached: bool,
    generation: Generation,
    generations: Generations,
    events: UnboundedSender<SlotEvent>,
    retry_timer: Option<CancellationToken>,
    started_at: Option<Instant>,
    preloaded: bool,
    muted: bool,
    profile: NetworkProfile,
    fallback_visible: bool,
    metrics: Arc<dyn MetricsSink>,
}

impl<P: Platform> PlaybackSession<P> {
    /// Creates an idle session for the item's primary descriptor.
    pub fn new(
        slot: SlotId,
        item: &VideoItem,
        platform: Arc<P>,
        config: &PlayerConfig,
        generations: Generations,
        events: UnboundedSender<SlotEvent>,
        metrics: Arc<dyn MetricsSink>,
    ) -> Self {
        let generation = generations.next();
        let descriptor = item.primary().clone();
        let strategy = select_strategy(descriptor.kind, platform.supports_native_adaptive());
        let mut media = platform.create_media();
        media.listen(EventSink::new(slot, generation, events.clone()));

        Self {
            slot,
            item_id: item.id().to_string(),
            descriptor,
            machine: Machine::new(strategy, config.max_retries),
            platform,
            media,
            engine: None,
            source_attached: false,
            generation,
            generations,
            events,
            retry_timer: None,
            started_at: None,
            preloaded: false,
            muted: config.muted,
            profile: config.profile(),
            fallback_visible: false,
            metrics,
        }
    }

    pub fn slot(&self) -> SlotId {
        self.slot
    }

    pub fn item_id(&self) -> &str {
        &self.item_id
    }

    pub fn descriptor(&self) -> &VideoDescriptor {
        &self.descriptor
    }

    pub fn state(&self) -> State {
        self.machine.state()
    }

    pub fn demand(&self) -> Demand {
        self.machine.demand()
    }

    pub fn strategy(&self) -> DeliveryStrategy {
        self.machine.strategy()
    }

    pub fn retries(&self) -> u32 {
        self.machine.retries()
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn has_engine(&self) -> bool {
        self.engine.is_some()
    }

    pub fn has_retry_pending(&self) -> bool {
        self.retry_timer.is_some()
    }

    /// Whether the static fallback image should be shown.
    pub fn fallback_visible(&self) -> bool {
        self.fallback_visible
    }

    /// Thumbnail to show while the fallback is visible.
    pub fn fallback_image(&self) -> Option<&str> {
        if self.fallback_visible {
            self.descriptor.thumbnail_url.as_deref()
        } else {
            None
        }
    }

    pub fn muted(&self) -> bool {
        self.muted
    }

    pub fn media(&self) -> &P::Media {
        &self.media
    }

    pub fn engine(&self) -> Option<&P::Engine> {
        self.engine.as_ref()
    }

    pub fn dispatch(&mut self, event: PlaybackEvent) -> State {
        let effects = self.machine.step(&event);
        for effect in effects {
            self.apply(effect);
        }
        self.machine.state()
    }

    /// Dispatches a platform callback unless it belongs to a released attachment.
    pub fn dispatch_from(&mut self, generation: Generation, event: PlaybackEvent) -> bool {
        if generation != self.generation {
            tracing::debug!(
                slot = self.slot,
                stale = generation,
                current = self.generation,
                ?event,
                "discarding stale playback event"
            );
            return false;
        }
        self.dispatch(event);
        true
    }

    pub fn set_demand(&mut self, demand: Demand) -> State {
        if demand == self.machine.demand() {
            return self.machine.state();
        }
        self.dispatch(PlaybackEvent::DemandChanged(demand))
    }

    pub fn teardown(&mut self) {
        self.dispatch(PlaybackEvent::Teardown);
    }

    /// Stored and applied before the next play attempt.
    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    /// Applies to the next engine this session creates.
    pub fn set_profile(&mut self, profile: NetworkProfile) {
        self.profile = profile;
    }

    pub fn profile(&self) -> &NetworkProfile {
        &self.profile
    }

    fn sink(&self) -> EventSink {
        EventSink::new(self.slot, self.generation, self.events.clone())
    }

    fn apply(&mut self, effect: Effect) {
        match effect {
            Effect::MarkStart => {
                if self.started_at.is_none() {
                    self.started_at = Some(Instant::now());
                    self.preloaded = self.machine.demand() == Demand::Preload;
                }
            }
            Effect::Setup(strategy) => self.setup(strategy),
            Effect::Release => self.release(),
            Effect::RecoverMedia => match self.engine.as_mut() {
                Some(engine) => engine.recover_media_error(),
                None => self.media.load(),
            },
            Effect::ApplyMuteAndPlay => {
                self.media.set_muted(self.muted);
                self.media.play();
            }
            Effect::Pause => self.media.pause(),
            Effect::ScheduleRetry { delay } => self.schedule_retry(delay),
            Effect::ShowFallback => self.fallback_visible = true,
            Effect::HideFallback => self.fallback_visible = false,
            Effect::Telemetry(signal) => self.report(signal),
        }
    }

    fn setup(&mut self, strategy: DeliveryStrategy) {
        // A new attachment never overlaps an old one.
        self.release();
        self.generation = self.generations.next();
        self.media.listen(self.sink());

        match strategy {
            DeliveryStrategy::StreamingEngine => {
                let mut engine = self.platform.create_engine(&self.profile, self.sink());
                engine.attach_media(&mut self.media);
                engine.load_source(&self.descriptor.url);
                self.engine = Some(engine);
            }
            DeliveryStrategy::Native => {
                self.media
                    .set_source(&self.descriptor.url, &self.descriptor.content_type);
                self.media.load();
            }
        }
        self.source_attached = true;
        tracing::debug!(
            slot = self.slot,
            item_id = %self.item_id,
            generation = self.generation,
            ?strategy,
            "playback source attached"
        );
    }

    fn release(&mut self) {
        if let Some(timer) = self.retry_timer.take() {
            timer.cancel();
        }
        if let Some(mut engine) = self.engine.take() {
            engine.detach_media();
            engine.destroy();
        }
        if self.source_attached {
            self.media.clear_source();
            self.source_attached = false;
            self.generation = self.generations.next();
        }
    }

    fn schedule_retry(&mut self, delay: std::time::Duration) {
        let token = CancellationToken::new();
        let sink = self.sink();
        let cancelled = token.clone();
        self.retry_timer = Some(token);

        tracing::info!(
            slot = self.slot,
            item_id = %self.item_id,
            attempt = self.machine.retries(),
            delay_ms = delay.as_millis() as u64,
            "scheduling playback retry"
        );

        tokio::spawn(async move {
            tokio::select! {
                _ = cancelled.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    sink.emit(PlaybackEvent::RetryElapsed);
                }
            }
        });
    }

    fn report(&self, signal: Signal) {
        let item_id = self.item_id.clone();
        let event = match signal {
            Signal::StartupComplete => {
                let Some(started) = self.started_at else {
                    return;
                };
                TelemetryEvent::StartupLatency {
                    item_id,
                    latency: started.elapsed(),
                    preloaded: self.preloaded,
                }
            }
            Signal::Error { kind, fatal, attempt } => TelemetryEvent::PlaybackError {
                item_id,
                kind,
                fatal,
                attempt,
            },
            Signal::Recovered { kind } => TelemetryEvent::Recovered { item_id, kind },
            Signal::RetriesExhausted { attempts } => TelemetryEvent::RetriesExhausted { item_id, attempts },
        };

        if let Err(err) = self.metrics.record(&event) {
            tracing::warn!(slot = self.slot, error = %err, "failed to record playback telemetry");
        }
    }
}

impl<P: Platform> Drop for PlaybackSession<P> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<P: Platform> std::fmt::Debug for PlaybackSession<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackSession")
            .field("slot", &self.slot)
            .field("item_id", &self.item_id)
            .field("state", &self.machine.state())
            .field("generation", &self.generation)
            .field("has_engine", &self.engine.is_some())
            .finish()
    }
}
