// ABOUTME: Best-effort playback telemetry: startup latency, errors, recoveries, exhaustion.
// ABOUTME: Sinks may fail; callers log and continue.

use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use crate::machine::StreamErrorKind;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TelemetryEvent {
    StartupLatency {
        item_id: String,
        #[serde(rename = "latency_ms", serialize_with = "as_millis")]
        latency: Duration,
        preloaded: bool,
    },
    PlaybackError {
        item_id: String,
        kind: StreamErrorKind,
        fatal: bool,
        attempt: u32,
    },
    Recovered {
        item_id: String,
        kind: StreamErrorKind,
    },
    RetriesExhausted {
        item_id: String,
        attempts: u32,
    },
}

impl TelemetryEvent {
    pub fn item_id(&self) -> &str {
        match self {
            TelemetryEvent::StartupLatency { item_id, .. }
            | TelemetryEvent::PlaybackError { item_id, .. }
            | TelemetryEvent::Recovered { item_id, .. }
            | TelemetryEvent::RetriesExhausted { item_id, .. } => item_id,
        }
    }
}

fn as_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_millis().min(u128::from(u64::MAX)) as u64)
}

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("metrics sink unavailable: {0}")]
    Unavailable(String),
}

/// External metrics collaborator.
pub trait MetricsSink: Send + Sync {
    fn record(&self, event: &TelemetryEvent) -> Result<(), TelemetryError>;
}

/// Writes events to the `reelfeed::telemetry` tracing target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingMetrics;

impl MetricsSink for TracingMetrics {
    fn record(&self, event: &TelemetryEvent) -> Result<(), TelemetryError> {
        match event {
            TelemetryEvent::StartupLatency {
                item_id,
                latency,
                preloaded,
            } => tracing::info!(
                target: "reelfeed::telemetry",
                item_id = %item_id,
                latency_ms = latency.as_millis() as u64,
                preloaded = *preloaded,
                "startup latency"
            ),
            TelemetryEvent::PlaybackError {
                item_id,
                kind,
                fatal,
                attempt,
            } => tracing::warn!(
                target: "reelfeed::telemetry",
                item_id = %item_id,
                kind = ?kind,
                fatal = *fatal,
                attempt = *attempt,
                "playback error"
            ),
            TelemetryEvent::Recovered { item_id, kind } => tracing::info!(
                target: "reelfeed::telemetry",
                item_id = %item_id,
                kind = ?kind,
                "playback recovered"
            ),
            TelemetryEvent::RetriesExhausted { item_id, attempts } => tracing::warn!(
                target: "reelfeed::telemetry",
                item_id = %item_id,
                attempts = *attempts,
                "retries exhausted"
            ),
        }
        Ok(())
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetrics;

impl MetricsSink for NoopMetrics {
    fn record(&self, _event: &TelemetryEvent) -> Result<(), TelemetryError> {
        Ok(())
    }
}
