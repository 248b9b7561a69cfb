//! Engine configuration.
//!
//! The config is an immutable snapshot: the engine copies what it needs at
//! `initialize` time, so later mutation of a config value has no effect on a
//! running engine.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Engine-wide configuration, consumed once at initialize.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Display/debug label for the application.
    pub app_name: String,
    /// Informational frame-rate target. The loop does not throttle to it.
    pub target_fps: u32,
    /// Fixed simulation step in seconds. Drives the fixed-update cadence.
    pub fixed_timestep: f32,
    /// Verbose lifecycle logging.
    pub enable_debug: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            app_name: "vesper".to_string(),
            target_fps: 60,
            fixed_timestep: 1.0 / 60.0,
            enable_debug: false,
        }
    }
}

impl EngineConfig {
    /// Load configuration from a TOML file, falling back to defaults when
    /// the file is missing or malformed. Configuration problems are worth a
    /// warning, never a startup failure.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            info!("No config file at {:?}, using defaults", path);
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => {
                    info!("Loaded engine config from {:?}", path);
                    config
                }
                Err(e) => {
                    warn!("Failed to parse config {:?}: {}, using defaults", path, e);
                    Self::default()
                }
            },
            Err(e) => {
                warn!("Failed to read config {:?}: {}, using defaults", path, e);
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.app_name, "vesper");
        assert_eq!(config.target_fps, 60);
        assert!((config.fixed_timestep - 1.0 / 60.0).abs() < f32::EPSILON);
        assert!(!config.enable_debug);
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let config: EngineConfig =
            toml::from_str("app_name = \"demo\"\nenable_debug = true\n").unwrap();
        assert_eq!(config.app_name, "demo");
        assert!(config.enable_debug);
        assert_eq!(config.target_fps, 60);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let config = EngineConfig::load_or_default("/nonexistent/vesper.toml");
        assert_eq!(config.app_name, "vesper");
    }
}
