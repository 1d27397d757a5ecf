// ABOUTME: Player configuration with serde defaults.
// ABOUTME: Resolves the network profile used for new streaming engines.

use serde::{Deserialize, Serialize};

use crate::network::{profile_for, DeviceClass, NetworkProfile, NetworkSpeed};

pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_PRELOAD_AHEAD: usize = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub max_retries: u32,
    pub muted: bool,
    /// Slots after the active one that are preloaded.
    pub preload_ahead: usize,
    pub device: DeviceClass,
    pub speed: NetworkSpeed,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            muted: true,
            preload_ahead: DEFAULT_PRELOAD_AHEAD,
            device: DeviceClass::default(),
            speed: NetworkSpeed::default(),
        }
    }
}

impl PlayerConfig {
    pub fn profile(&self) -> NetworkProfile {
        profile_for(self.speed, self.device.is_mobile())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_partial_json_uses_defaults() {
        let cfg: PlayerConfig = serde_json::from_str(r#"{"device":"mobile","speed":"slow"}"#).unwrap();
        assert_eq!(cfg.max_retries, 3);
        assert!(cfg.muted);
        assert_eq!(cfg.preload_ahead, 1);
        assert_eq!(cfg.profile(), profile_for(NetworkSpeed::Slow, true));
    }
}
