// ABOUTME: Pure playback state machine: one transition function over discrete events.
// ABOUTME: Produces effects for the session to apply; owns retry counting and failure classification.

use std::time::Duration;

use reelfeed_feed::VideoKind;
use serde::Serialize;

/// How a descriptor is delivered to the media element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryStrategy {
    /// Adaptive stream fed through a streaming engine.
    StreamingEngine,
    /// Source set directly on the media element.
    Native,
}

/// Adaptive streams need an engine only where the platform cannot play them natively.
pub fn select_strategy(kind: VideoKind, native_adaptive_support: bool) -> DeliveryStrategy {
    if kind.is_adaptive() && !native_adaptive_support {
        DeliveryStrategy::StreamingEngine
    } else {
        DeliveryStrategy::Native
    }
}

/// Exponential backoff: 2^attempt seconds, attempt 0-indexed.
pub fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_secs(1u64 << attempt.min(16))
}

/// Whether the item is on screen, queued for preload, or neither.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Demand {
    #[default]
    Inactive,
    Preload,
    Active,
}

impl Demand {
    /// The single derived input that gates loading.
    pub fn wants_load(self) -> bool {
        !matches!(self, Demand::Inactive)
    }

    pub fn wants_play(self) -> bool {
        matches!(self, Demand::Active)
    }
}

/// Error classes reported by the streaming engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamErrorKind {
    Network,
    Media,
    Manifest,
    Other,
}

/// An error event from the streaming engine or media element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamError {
    pub kind: StreamErrorKind,
    pub fatal: bool,
    pub detail: String,
}

impl StreamError {
    pub fn fatal(kind: StreamErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            fatal: true,
            detail: detail.into(),
        }
    }

    pub fn non_fatal(kind: StreamErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            fatal: false,
            detail: detail.into(),
        }
    }
}

/// Native media element error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaErrorCode {
    Aborted,
    Network,
    Decode,
    SrcNotSupported,
}

impl MediaErrorCode {
    pub fn into_stream_error(self) -> StreamError {
        match self {
            MediaErrorCode::Aborted => StreamError::non_fatal(StreamErrorKind::Other, "aborted"),
            MediaErrorCode::Network => StreamError::fatal(StreamErrorKind::Network, "media network error"),
            MediaErrorCode::Decode => StreamError::fatal(StreamErrorKind::Media, "media decode error"),
            MediaErrorCode::SrcNotSupported => {
                StreamError::fatal(StreamErrorKind::Other, "source not supported")
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    RetriesExhausted,
    Fatal(StreamErrorKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Idle,
    Loading,
    Ready,
    Playing,
    Paused { awaiting_gesture: bool },
    /// Waiting out the backoff before retry number `attempt` (1-based).
    Retrying { attempt: u32 },
    Failed { reason: FailureReason },
    Destroyed,
}

impl State {
    /// States that hold a media source.
    pub fn is_active(self) -> bool {
        matches!(
            self,
            State::Loading | State::Ready | State::Playing | State::Paused { .. }
        )
    }
}

/// Everything that can happen to a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackEvent {
    DemandChanged(Demand),
    LoadStart,
    LoadedData,
    CanPlay,
    MediaError(MediaErrorCode),
    ManifestParsed,
    EngineError(StreamError),
    PlayStarted,
    PlayRejected,
    UserPlay,
    UserPause,
    ManualRetry,
    RetryElapsed,
    Teardown,
}

/// Outcome notifications for the metrics collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    StartupComplete,
    Error {
        kind: StreamErrorKind,
        fatal: bool,
        attempt: u32,
    },
    Recovered {
        kind: StreamErrorKind,
    },
    RetriesExhausted {
        attempts: u32,
    },
}

/// Side effects requested by a transition, applied in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Record the load start instant if none is recorded yet.
    MarkStart,
    /// Attach the source via the strategy (engine or native).
    Setup(DeliveryStrategy),
    /// Detach/destroy the engine, cancel timers, clear the source. Idempotent.
    Release,
    RecoverMedia,
    ApplyMuteAndPlay,
    Pause,
    ScheduleRetry { delay: Duration },
    ShowFallback,
    HideFallback,
    Telemetry(Signal),
}

/// Transition state for one session.
#[derive(Debug, Clone)]
pub struct Machine {
    state: State,
    demand: Demand,
    strategy: DeliveryStrategy,
    retries: u32,
    max_retries: u32,
    media_recovery_used: bool,
    pending_recovery: Option<StreamErrorKind>,
    startup_reported: bool,
}

impl Machine {
    pub fn new(strategy: DeliveryStrategy, max_retries: u32) -> Self {
        Self {
            state: State::Idle,
            demand: Demand::Inactive,
            strategy,
            retries: 0,
            max_retries,
            media_recovery_used: false,
            pending_recovery: None,
            startup_reported: false,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn demand(&self) -> Demand {
        self.demand
    }

    pub fn strategy(&self) -> DeliveryStrategy {
        self.strategy
    }

    /// Retries consumed so far; never exceeds `max_retries`.
    pub fn retries(&self) -> u32 {
        self.retries
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Applies one event and returns the effects to run.
    pub fn step(&mut self, event: &PlaybackEvent) -> Vec<Effect> {
        if self.state == State::Destroyed {
            return Vec::new();
        }

        match event {
            PlaybackEvent::Teardown => {
                self.state = State::Destroyed;
                vec![Effect::Release, Effect::HideFallback]
            }
            PlaybackEvent::DemandChanged(demand) => self.on_demand(*demand),
            PlaybackEvent::LoadStart => Vec::new(),
            PlaybackEvent::ManifestParsed | PlaybackEvent::LoadedData | PlaybackEvent::CanPlay => {
                self.on_ready()
            }
            PlaybackEvent::MediaError(code) => self.on_error(&code.into_stream_error()),
            PlaybackEvent::EngineError(err) => self.on_error(err),
            PlaybackEvent::PlayStarted => self.on_play_started(),
            PlaybackEvent::PlayRejected => match self.state {
                State::Ready | State::Paused { .. } | State::Playing => {
                    self.state = State::Paused {
                        awaiting_gesture: true,
                    };
                    Vec::new()
                }
                _ => Vec::new(),
            },
            PlaybackEvent::UserPlay => match self.state {
                State::Ready | State::Paused { .. } if self.demand.wants_load() => {
                    vec![Effect::ApplyMuteAndPlay]
                }
                _ => Vec::new(),
            },
            PlaybackEvent::UserPause => match self.state {
                State::Playing => {
                    self.state = State::Paused {
                        awaiting_gesture: false,
                    };
                    vec![Effect::Pause]
                }
                _ => Vec::new(),
            },
            PlaybackEvent::ManualRetry => match self.state {
                State::Failed { .. } => {
                    self.retries = 0;
                    self.media_recovery_used = false;
                    let mut effects = vec![Effect::HideFallback];
                    effects.extend(self.begin_loading());
                    effects
                }
                _ => Vec::new(),
            },
            PlaybackEvent::RetryElapsed => match self.state {
                State::Retrying { .. } => self.begin_loading(),
                _ => Vec::new(),
            },
        }
    }

    fn on_demand(&mut self, demand: Demand) -> Vec<Effect> {
        self.demand = demand;

        if !demand.wants_load() {
            if self.state == State::Idle {
                return Vec::new();
            }
            self.go_idle();
            return vec![Effect::Release, Effect::HideFallback];
        }

        match self.state {
            State::Idle => self.begin_loading(),
            State::Ready if demand.wants_play() => vec![Effect::ApplyMuteAndPlay],
            State::Paused { .. } if demand.wants_play() => vec![Effect::ApplyMuteAndPlay],
            State::Playing if !demand.wants_play() => {
                self.state = State::Paused {
                    awaiting_gesture: false,
                };
                vec![Effect::Pause]
            }
            _ => Vec::new(),
        }
    }

    fn begin_loading(&mut self) -> Vec<Effect> {
        if !self.demand.wants_load() {
            self.go_idle();
            return vec![Effect::Release];
        }
        self.state = State::Loading;
        vec![Effect::MarkStart, Effect::Setup(self.strategy)]
    }

    fn go_idle(&mut self) {
        self.state = State::Idle;
        self.retries = 0;
        self.media_recovery_used = false;
        self.pending_recovery = None;
    }

    fn on_ready(&mut self) -> Vec<Effect> {
        if self.state != State::Loading {
            return Vec::new();
        }
        self.state = State::Ready;
        if self.demand.wants_play() {
            vec![Effect::ApplyMuteAndPlay]
        } else {
            Vec::new()
        }
    }

    fn on_play_started(&mut self) -> Vec<Effect> {
        if !matches!(self.state, State::Ready | State::Paused { .. } | State::Playing) {
            return Vec::new();
        }

        let mut effects = Vec::new();
        if !self.startup_reported {
            self.startup_reported = true;
            effects.push(Effect::Telemetry(Signal::StartupComplete));
        }
        if let Some(kind) = self.pending_recovery.take() {
            effects.push(Effect::Telemetry(Signal::Recovered { kind }));
        }

        if self.demand.wants_play() {
            self.state = State::Playing;
        } else {
            self.state = State::Paused {
                awaiting_gesture: false,
            };
            effects.push(Effect::Pause);
        }
        effects
    }

    fn on_error(&mut self, err: &StreamError) -> Vec<Effect> {
        if !self.state.is_active() {
            return Vec::new();
        }

        let report = Effect::Telemetry(Signal::Error {
            kind: err.kind,
            fatal: err.fatal,
            attempt: self.retries,
        });

        if !err.fatal {
            return vec![report];
        }

        match err.kind {
            StreamErrorKind::Network | StreamErrorKind::Manifest => {
                if self.retries < self.max_retries {
                    let delay = backoff_delay(self.retries);
                    self.retries += 1;
                    self.pending_recovery = Some(err.kind);
                    self.state = State::Retrying {
                        attempt: self.retries,
                    };
                    vec![report, Effect::Release, Effect::ScheduleRetry { delay }]
                } else {
                    self.state = State::Failed {
                        reason: FailureReason::RetriesExhausted,
                    };
                    vec![
                        report,
                        Effect::Release,
                        Effect::ShowFallback,
                        Effect::Telemetry(Signal::RetriesExhausted {
                            attempts: self.retries,
                        }),
                    ]
                }
            }
            StreamErrorKind::Media if !self.media_recovery_used => {
                self.media_recovery_used = true;
                self.pending_recovery = Some(StreamErrorKind::Media);
                // A native reload resets the element; readiness must be observed again.
                if self.strategy == DeliveryStrategy::Native {
                    self.state = State::Loading;
                }
                vec![report, Effect::RecoverMedia]
            }
            kind => {
                self.state = State::Failed {
                    reason: FailureReason::Fatal(kind),
                };
                vec![report, Effect::Release, Effect::ShowFallback]
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn net_error() -> PlaybackEvent {
        PlaybackEvent::EngineError(StreamError::fatal(StreamErrorKind::Network, "fragLoadError"))
    }

    fn loading_machine(demand: Demand) -> Machine {
        let mut m = Machine::new(DeliveryStrategy::StreamingEngine, 3);
        m.step(&PlaybackEvent::DemandChanged(demand));
        m
    }

    #[test]
    fn test_select_strategy() {
        assert_eq!(
            select_strategy(VideoKind::AdaptiveStream, false),
            DeliveryStrategy::StreamingEngine
        );
        assert_eq!(select_strategy(VideoKind::AdaptiveStream, true), DeliveryStrategy::Native);
        for kind in [
            VideoKind::ProgressiveMp4,
            VideoKind::ProgressiveWebm,
            VideoKind::ProgressiveMov,
            VideoKind::ProgressiveOgg,
        ] {
            assert_eq!(select_strategy(kind, false), DeliveryStrategy::Native);
            assert_eq!(select_strategy(kind, true), DeliveryStrategy::Native);
        }
    }

    #[test]
    fn test_backoff_doubles() {
        assert_eq!(backoff_delay(0), Duration::from_secs(1));
        assert_eq!(backoff_delay(1), Duration::from_secs(2));
        assert_eq!(backoff_delay(2), Duration::from_secs(4));
    }

    #[test]
    fn test_inactive_session_stays_idle() {
        let mut m = Machine::new(DeliveryStrategy::Native, 3);
        assert!(m.step(&PlaybackEvent::DemandChanged(Demand::Inactive)).is_empty());
        assert!(m.step(&PlaybackEvent::CanPlay).is_empty());
        assert_eq!(m.state(), State::Idle);
    }

    #[test]
    fn test_preload_loads_without_playing() {
        let mut m = Machine::new(DeliveryStrategy::Native, 3);
        let effects = m.step(&PlaybackEvent::DemandChanged(Demand::Preload));
        assert_eq!(effects, vec![Effect::MarkStart, Effect::Setup(DeliveryStrategy::Native)]);
        assert!(m.step(&PlaybackEvent::CanPlay).is_empty());
        assert_eq!(m.state(), State::Ready);

        let effects = m.step(&PlaybackEvent::DemandChanged(Demand::Active));
        assert_eq!(effects, vec![Effect::ApplyMuteAndPlay]);
        assert_eq!(m.state(), State::Ready);
    }

    #[test]
    fn test_play_only_after_ready() {
        let mut m = loading_machine(Demand::Active);
        assert!(m.step(&PlaybackEvent::UserPlay).is_empty());
        assert!(m.step(&PlaybackEvent::PlayStarted).is_empty());
        assert_eq!(m.state(), State::Loading);

        assert_eq!(m.step(&PlaybackEvent::ManifestParsed), vec![Effect::ApplyMuteAndPlay]);
        assert_eq!(
            m.step(&PlaybackEvent::PlayStarted),
            vec![Effect::Telemetry(Signal::StartupComplete)]
        );
        assert_eq!(m.state(), State::Playing);

        // Startup is reported once.
        m.step(&PlaybackEvent::UserPause);
        assert_eq!(m.step(&PlaybackEvent::PlayStarted), vec![]);
    }

    #[test]
    fn test_rejected_play_waits_for_gesture() {
        let mut m = loading_machine(Demand::Active);
        m.step(&PlaybackEvent::ManifestParsed);
        assert!(m.step(&PlaybackEvent::PlayRejected).is_empty());
        assert_eq!(m.state(), State::Paused { awaiting_gesture: true });
        assert_eq!(m.step(&PlaybackEvent::UserPlay), vec![Effect::ApplyMuteAndPlay]);
    }

    #[test]
    fn test_network_errors_retry_then_fail() {
        let mut m = loading_machine(Demand::Active);
        let mut delays = Vec::new();

        for attempt in 1..=3 {
            let effects = m.step(&net_error());
            assert_eq!(m.state(), State::Retrying { attempt });
            let delay = effects
                .iter()
                .find_map(|e| match e {
                    Effect::ScheduleRetry { delay } => Some(*delay),
                    _ => None,
                })
                .unwrap();
            delays.push(delay.as_secs());
            assert_eq!(
                m.step(&PlaybackEvent::RetryElapsed),
                vec![Effect::MarkStart, Effect::Setup(DeliveryStrategy::StreamingEngine)]
            );
            assert_eq!(m.state(), State::Loading);
        }
        assert_eq!(delays, vec![1, 2, 4]);

        let effects = m.step(&net_error());
        assert_eq!(m.state(), State::Failed { reason: FailureReason::RetriesExhausted });
        assert!(effects.contains(&Effect::ShowFallback));
        assert!(effects.contains(&Effect::Release));
        assert_eq!(m.retries(), 3);
    }

    #[test]
    fn test_manifest_error_is_retried() {
        let mut m = loading_machine(Demand::Active);
        m.step(&PlaybackEvent::EngineError(StreamError::fatal(
            StreamErrorKind::Manifest,
            "manifestLoadError",
        )));
        assert_eq!(m.state(), State::Retrying { attempt: 1 });
    }

    #[test]
    fn test_media_error_recovers_once_without_retry_count() {
        let mut m = loading_machine(Demand::Active);
        m.step(&PlaybackEvent::ManifestParsed);
        m.step(&PlaybackEvent::PlayStarted);

        let media = PlaybackEvent::EngineError(StreamError::fatal(StreamErrorKind::Media, "bufferStalled"));
        let effects = m.step(&media);
        assert!(effects.contains(&Effect::RecoverMedia));
        assert_eq!(m.state(), State::Playing);
        assert_eq!(m.retries(), 0);

        m.step(&media);
        assert_eq!(
            m.state(),
            State::Failed { reason: FailureReason::Fatal(StreamErrorKind::Media) }
        );
    }

    #[test]
    fn test_native_media_recovery_waits_for_readiness() {
        let mut m = Machine::new(DeliveryStrategy::Native, 3);
        m.step(&PlaybackEvent::DemandChanged(Demand::Active));
        m.step(&PlaybackEvent::CanPlay);
        m.step(&PlaybackEvent::PlayStarted);
        assert_eq!(m.state(), State::Playing);

        let effects = m.step(&PlaybackEvent::MediaError(MediaErrorCode::Decode));
        assert!(effects.contains(&Effect::RecoverMedia));
        assert_eq!(m.state(), State::Loading);

        assert_eq!(m.step(&PlaybackEvent::CanPlay), vec![Effect::ApplyMuteAndPlay]);
        assert_eq!(
            m.step(&PlaybackEvent::PlayStarted),
            vec![Effect::Telemetry(Signal::Recovered { kind: StreamErrorKind::Media })]
        );
        assert_eq!(m.state(), State::Playing);
    }

    #[test]
    fn test_other_fatal_fails_immediately() {
        let mut m = loading_machine(Demand::Active);
        let effects = m.step(&PlaybackEvent::EngineError(StreamError::fatal(
            StreamErrorKind::Other,
            "keySystemError",
        )));
        assert_eq!(m.state(), State::Failed { reason: FailureReason::Fatal(StreamErrorKind::Other) });
        assert!(effects.contains(&Effect::ShowFallback));
    }

    #[test]
    fn test_non_fatal_error_only_reported() {
        let mut m = loading_machine(Demand::Active);
        let effects = m.step(&PlaybackEvent::EngineError(StreamError::non_fatal(
            StreamErrorKind::Network,
            "fragLoadTimeOut",
        )));
        assert_eq!(effects.len(), 1);
        assert_eq!(m.state(), State::Loading);
    }

    #[test]
    fn test_manual_retry_resets_counter() {
        let mut m = loading_machine(Demand::Active);
        for _ in 0..3 {
            m.step(&net_error());
            m.step(&PlaybackEvent::RetryElapsed);
        }
        m.step(&net_error());
        assert!(matches!(m.state(), State::Failed { .. }));

        let effects = m.step(&PlaybackEvent::ManualRetry);
        assert_eq!(
            effects,
            vec![
                Effect::HideFallback,
                Effect::MarkStart,
                Effect::Setup(DeliveryStrategy::StreamingEngine)
            ]
        );
        assert_eq!(m.retries(), 0);
        assert_eq!(m.state(), State::Loading);
    }

    #[test]
    fn test_deactivation_releases_from_any_active_state() {
        let mut m = loading_machine(Demand::Active);
        m.step(&net_error());
        let effects = m.step(&PlaybackEvent::DemandChanged(Demand::Inactive));
        assert_eq!(effects, vec![Effect::Release, Effect::HideFallback]);
        assert_eq!(m.state(), State::Idle);
        assert_eq!(m.retries(), 0);
        // A late timer is ignored.
        assert!(m.step(&PlaybackEvent::RetryElapsed).is_empty());
    }

    #[test]
    fn test_playing_demoted_to_preload_pauses() {
        let mut m = loading_machine(Demand::Active);
        m.step(&PlaybackEvent::CanPlay);
        m.step(&PlaybackEvent::PlayStarted);
        assert_eq!(m.step(&PlaybackEvent::DemandChanged(Demand::Preload)), vec![Effect::Pause]);
        assert_eq!(m.state(), State::Paused { awaiting_gesture: false });
    }

    #[test]
    fn test_destroyed_is_terminal() {
        let mut m = loading_machine(Demand::Active);
        assert_eq!(
            m.step(&PlaybackEvent::Teardown),
            vec![Effect::Release, Effect::HideFallback]
        );
        assert!(m.step(&PlaybackEvent::Teardown).is_empty());
        assert!(m.step(&PlaybackEvent::DemandChanged(Demand::Active)).is_empty());
        assert_eq!(m.state(), State::Destroyed);
    }
}
