//! Bridge configuration and its JSON persistence

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::command::Identifier;

/// Default double-tap window in seconds
pub const DEFAULT_DOUBLE_TAP_SENSITIVITY: f64 = 0.4;

/// Default number of gesture tags retained by the event processor
pub const DEFAULT_EVENT_BUFFER_CAPACITY: usize = 20;

/// Default name of the host message handler events are posted to
pub const DEFAULT_MESSAGE_HANDLER: &str = "mapbridge";

/// Configuration for one map session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Maximum seconds between two touch-ends that count as a double-tap
    pub double_tap_sensitivity: f64,

    /// Capacity of the gesture ring buffer
    pub event_buffer_capacity: usize,

    /// Host message handler used by event forwarding scripts
    pub message_handler: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            double_tap_sensitivity: DEFAULT_DOUBLE_TAP_SENSITIVITY,
            event_buffer_capacity: DEFAULT_EVENT_BUFFER_CAPACITY,
            message_handler: DEFAULT_MESSAGE_HANDLER.to_string(),
        }
    }
}

impl BridgeConfig {
    /// Check that every field is usable
    pub fn validate(&self) -> Result<()> {
        if self.event_buffer_capacity == 0 {
            bail!("event_buffer_capacity must be at least 1");
        }
        if !self.double_tap_sensitivity.is_finite() || self.double_tap_sensitivity < 0.0 {
            bail!(
                "double_tap_sensitivity must be a non-negative number of seconds, got {}",
                self.double_tap_sensitivity
            );
        }
        self.handler_identifier()?;
        Ok(())
    }

    /// The message handler as a script identifier
    pub fn handler_identifier(&self) -> Result<Identifier> {
        Identifier::new(self.message_handler.clone())
            .with_context(|| format!("Invalid message_handler '{}'", self.message_handler))
    }
}

/// Write configuration atomically as pretty JSON
pub fn write_config(path: &Path, config: &BridgeConfig) -> Result<()> {
    let json = serde_json::to_vec_pretty(config).context("Failed to serialize config")?;
    let temp_path = path.with_extension("tmp");

    let mut file = File::create(&temp_path)
        .with_context(|| format!("Failed to create temp file: {:?}", temp_path))?;
    file.write_all(&json).context("Failed to write config")?;
    file.sync_all().context("Failed to sync config")?;
    drop(file);

    fs::rename(&temp_path, path)
        .with_context(|| format!("Failed to rename {:?} to {:?}", temp_path, path))?;

    Ok(())
}

/// Load and validate configuration from a JSON file
///
/// Missing fields take their defaults.
pub fn load_config(path: &Path) -> Result<BridgeConfig> {
    let data = fs::read(path).with_context(|| format!("Failed to read config: {:?}", path))?;
    let config: BridgeConfig =
        serde_json::from_slice(&data).context("Failed to deserialize config")?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_and_load_config() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("bridge.json");

        let config = BridgeConfig {
            double_tap_sensitivity: 0.3,
            event_buffer_capacity: 8,
            message_handler: "mapEvents".to_string(),
        };

        write_config(&path, &config).unwrap();
        let loaded = load_config(&path).unwrap();

        assert_eq!(loaded, config);
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("bridge.json");
        fs::write(&path, br#"{"double_tap_sensitivity": 0.5}"#).unwrap();

        let loaded = load_config(&path).unwrap();
        assert_eq!(loaded.double_tap_sensitivity, 0.5);
        assert_eq!(loaded.event_buffer_capacity, DEFAULT_EVENT_BUFFER_CAPACITY);
        assert_eq!(loaded.message_handler, DEFAULT_MESSAGE_HANDLER);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = BridgeConfig::default();
        assert!(config.validate().is_ok());

        config.event_buffer_capacity = 0;
        assert!(config.validate().is_err());

        config = BridgeConfig {
            double_tap_sensitivity: -0.1,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        config = BridgeConfig {
            message_handler: "window.bad".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_missing_file_fails() {
        let temp = TempDir::new().unwrap();
        assert!(load_config(&temp.path().join("absent.json")).is_err());
    }
}
