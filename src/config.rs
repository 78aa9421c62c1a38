use crate::error::ConfigError;
use crate::script::DEFAULT_CHANGE_CAPACITY;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const MIN_UPDATE_RATE: u32 = 25;
pub const MAX_UPDATE_RATE: u32 = 60;

/// Tunables of the update loop. Every field falls back to its default when omitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Updates per second, clamped to 25..=60.
    pub target_update_rate: u32,
    /// Buffer size of each script's structural change channel.
    pub change_channel_capacity: usize,
    /// Update profile elements in parallel.
    pub parallel_elements: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            target_update_rate: MIN_UPDATE_RATE,
            change_channel_capacity: DEFAULT_CHANGE_CAPACITY,
            parallel_elements: true,
        }
    }
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        Ok(config.normalized())
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_json(&json)
    }

    /// Clamps out-of-range values.
    pub fn normalized(mut self) -> Self {
        self.target_update_rate = self.target_update_rate.clamp(MIN_UPDATE_RATE, MAX_UPDATE_RATE);
        self.change_channel_capacity = self.change_channel_capacity.max(1);
        self
    }

    /// The fixed step of one update.
    pub fn frame_delta(&self) -> Duration {
        let rate = self.target_update_rate.clamp(MIN_UPDATE_RATE, MAX_UPDATE_RATE);
        Duration::from_nanos(1_000_000_000 / u64::from(rate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_use_defaults_and_rate_is_clamped() {
        let config = EngineConfig::from_json(r#"{ "targetUpdateRate": 240 }"#).unwrap();
        assert_eq!(config.target_update_rate, MAX_UPDATE_RATE);
        assert_eq!(config.change_channel_capacity, DEFAULT_CHANGE_CAPACITY);
        assert!(config.parallel_elements);
    }

    #[test]
    fn frame_delta_follows_rate() {
        let config = EngineConfig {
            target_update_rate: 50,
            ..EngineConfig::default()
        };
        assert_eq!(config.frame_delta(), Duration::from_millis(20));
    }
}
