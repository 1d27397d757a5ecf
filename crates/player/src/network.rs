// ABOUTME: Network quality estimation mapped to streaming-engine buffer and timeout profiles.
// ABOUTME: Pure functions of the connection class and device class; no I/O.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Coarse connection quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkSpeed {
    Slow,
    #[default]
    Medium,
    Fast,
}

impl NetworkSpeed {
    /// Maps a Network Information API `effectiveType` value.
    pub fn from_effective_type(effective_type: &str) -> Option<Self> {
        match effective_type.trim().to_ascii_lowercase().as_str() {
            "slow-2g" | "2g" => Some(NetworkSpeed::Slow),
            "3g" => Some(NetworkSpeed::Medium),
            "4g" | "5g" => Some(NetworkSpeed::Fast),
            _ => None,
        }
    }

    /// Maps an estimated downlink in megabits per second.
    pub fn from_downlink_mbps(mbps: f64) -> Self {
        if mbps < 1.5 {
            NetworkSpeed::Slow
        } else if mbps < 5.0 {
            NetworkSpeed::Medium
        } else {
            NetworkSpeed::Fast
        }
    }

    /// Combines the declared connection hints. Save-data always means slow.
    pub fn from_connection(effective_type: Option<&str>, downlink_mbps: Option<f64>, save_data: bool) -> Self {
        if save_data {
            return NetworkSpeed::Slow;
        }
        effective_type
            .and_then(Self::from_effective_type)
            .or_else(|| downlink_mbps.filter(|d| d.is_finite() && *d >= 0.0).map(Self::from_downlink_mbps))
            .unwrap_or_default()
    }
}

impl std::fmt::Display for NetworkSpeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            NetworkSpeed::Slow => "slow",
            NetworkSpeed::Medium => "medium",
            NetworkSpeed::Fast => "fast",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceClass {
    Mobile,
    #[default]
    Desktop,
}

impl DeviceClass {
    pub fn is_mobile(self) -> bool {
        matches!(self, DeviceClass::Mobile)
    }
}

/// Buffering and timeout parameters applied to a streaming engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkProfile {
    pub max_buffer_length: Duration,
    pub max_max_buffer_length: Duration,
    pub max_buffer_size_bytes: u64,
    pub manifest_timeout: Duration,
    pub manifest_max_retry: u32,
    pub fragment_timeout: Duration,
    pub fragment_max_retry: u32,
}

/// Mobile timeouts are divided by this factor.
pub const MOBILE_TIMEOUT_DIVISOR: u32 = 2;

const MB: u64 = 1024 * 1024;

/// Profile for a connection class on a device class.
pub fn profile_for(speed: NetworkSpeed, is_mobile: bool) -> NetworkProfile {
    let desktop = match speed {
        NetworkSpeed::Slow => NetworkProfile {
            max_buffer_length: Duration::from_secs(10),
            max_max_buffer_length: Duration::from_secs(30),
            max_buffer_size_bytes: 20 * MB,
            manifest_timeout: Duration::from_millis(20_000),
            manifest_max_retry: 2,
            fragment_timeout: Duration::from_millis(30_000),
            fragment_max_retry: 3,
        },
        NetworkSpeed::Medium => NetworkProfile {
            max_buffer_length: Duration::from_secs(20),
            max_max_buffer_length: Duration::from_secs(60),
            max_buffer_size_bytes: 60 * MB,
            manifest_timeout: Duration::from_millis(15_000),
            manifest_max_retry: 3,
            fragment_timeout: Duration::from_millis(20_000),
            fragment_max_retry: 4,
        },
        NetworkSpeed::Fast => NetworkProfile {
            max_buffer_length: Duration::from_secs(30),
            max_max_buffer_length: Duration::from_secs(120),
            max_buffer_size_bytes: 120 * MB,
            manifest_timeout: Duration::from_millis(10_000),
            manifest_max_retry: 4,
            fragment_timeout: Duration::from_millis(15_000),
            fragment_max_retry: 6,
        },
    };

    if !is_mobile {
        return desktop;
    }

    NetworkProfile {
        manifest_timeout: desktop.manifest_timeout / MOBILE_TIMEOUT_DIVISOR,
        fragment_timeout: desktop.fragment_timeout / MOBILE_TIMEOUT_DIVISOR,
        ..desktop
    }
}
