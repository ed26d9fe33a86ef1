use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::{FramerateConfig, FramerateMode};

/// Persisted form of a [`FramerateConfig`]: `{ "f": limit, "m": mode }`.
///
/// Both keys are optional on load (`null` counts as absent); `f` falls back
/// to 0 and `m` to `"max-fps"`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    f: Option<u32>,
    #[serde(default)]
    m: Option<String>,
}

impl Snapshot {
    pub fn limit(&self) -> u32 {
        self.f.unwrap_or(0)
    }

    pub fn mode_name(&self) -> &str {
        self.m.as_deref().unwrap_or(FramerateMode::MaxFps.as_str())
    }

    /// Resolves the stored values into a config.
    ///
    /// An unrecognised mode name behaves like `max-fps`.
    pub fn to_config(&self) -> FramerateConfig {
        let mode = match self.mode_name().parse::<FramerateMode>() {
            Ok(mode) => mode,
            Err(err) => {
                log::warn!("snapshot: {err}; falling back to {}", FramerateMode::MaxFps);
                FramerateMode::MaxFps
            }
        };
        FramerateConfig::new(self.limit(), mode)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).context("failed to encode framerate snapshot")
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("failed to decode framerate snapshot")
    }
}

impl From<FramerateConfig> for Snapshot {
    fn from(config: FramerateConfig) -> Self {
        Self {
            f: Some(config.limit),
            m: Some(config.mode.as_str().to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_short_keys() {
        let snap = Snapshot::from(FramerateConfig::new(24, FramerateMode::ForkedFps));
        assert_eq!(snap.to_json().unwrap(), r#"{"f":24,"m":"forked-fps"}"#);
    }

    #[test]
    fn missing_keys_use_defaults() {
        let snap = Snapshot::from_json("{}").unwrap();
        assert_eq!(snap.to_config(), FramerateConfig::new(0, FramerateMode::MaxFps));

        let snap = Snapshot::from_json(r#"{"f":null,"m":null}"#).unwrap();
        assert_eq!(snap.to_config(), FramerateConfig::default());
    }

    #[test]
    fn unknown_mode_falls_back_to_max_fps() {
        let snap = Snapshot::from_json(r#"{"f":30,"m":"warp"}"#).unwrap();
        assert_eq!(snap.to_config(), FramerateConfig::new(30, FramerateMode::MaxFps));
    }

    #[test]
    fn negative_limit_is_an_error() {
        assert!(Snapshot::from_json(r#"{"f":-3}"#).is_err());
        assert!(Snapshot::from_json("not json").is_err());
    }

    #[test]
    fn round_trip_preserves_config() {
        for mode in FramerateMode::ALL {
            let config = FramerateConfig::new(48, mode);
            let json = Snapshot::from(config).to_json().unwrap();
            assert_eq!(Snapshot::from_json(&json).unwrap().to_config(), config);
        }
    }
}
