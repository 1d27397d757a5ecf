// ABOUTME: Client-side playback for video feed items: strategy, state machine, sessions, controller.
// ABOUTME: Host media stacks plug in through the Platform, MediaElement, and StreamingEngine traits.

pub mod config;
pub mod controller;
pub mod machine;
pub mod network;
pub mod platform;
pub mod session;
pub mod telemetry;

pub use config::PlayerConfig;
pub use controller::PlaybackController;
pub use machine::{
    backoff_delay, select_strategy, DeliveryStrategy, Demand, Effect, FailureReason, Machine,
    MediaErrorCode, PlaybackEvent, Signal, State, StreamError, StreamErrorKind,
};
pub use network::{profile_for, DeviceClass, NetworkProfile, NetworkSpeed};
pub use platform::{
    EventSink, Generation, Generations, MediaElement, Platform, SlotEvent, SlotId, StreamingEngine,
};
pub use session::PlaybackSession;
pub use telemetry::{MetricsSink, NoopMetrics, TelemetryError, TelemetryEvent, TracingMetrics};
