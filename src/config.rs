//! Engine configuration file
//!
//! Every field has a default, so a config file only needs the values it
//! changes:
//!
//! ```json
//! { "width": 800, "antialias": true, "lighting": { "specular": false } }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::shade::Lighting;

pub const DEFAULT_WIDTH: u32 = 640;
pub const DEFAULT_HEIGHT: u32 = 480;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Output image size in pixels
    pub width: u32,
    pub height: u32,
    /// Render at twice the size and average 2x2 blocks
    pub antialias: bool,
    /// Color name or `#RRGGBB`
    pub background: String,
    /// Clear the next frame buffer on a worker thread
    pub clear_thread: bool,
    pub lighting: Lighting,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            antialias: false,
            background: "black".to_string(),
            clear_thread: true,
            lighting: Lighting::default(),
        }
    }
}

impl EngineConfig {
    /// Parse a config from JSON text
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a config from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json(&json)?;
        log::debug!("loaded config from {}", path.display());
        Ok(config)
    }

    /// Save the config as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config =
            EngineConfig::from_json(r#"{ "width": 800, "lighting": { "specular": false } }"#)
                .unwrap();
        assert_eq!(config.width, 800);
        assert_eq!(config.height, DEFAULT_HEIGHT);
        assert!(!config.lighting.specular);
        assert_eq!(
            config.lighting.ambient_percent,
            Lighting::default().ambient_percent
        );
        assert_eq!(config.background, "black");
    }

    #[test]
    fn test_invalid_json() {
        let err = EngineConfig::from_json(r#"{ "width": "wide" }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join(format!("molraster-config-{}.json", std::process::id()));
        let config = EngineConfig {
            antialias: true,
            background: "#102030".into(),
            ..EngineConfig::default()
        };
        config.save(&path).unwrap();
        let loaded = EngineConfig::load(&path).unwrap();
        let _ = fs::remove_file(&path);
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_file() {
        let err = EngineConfig::load("/nonexistent/molraster.json").unwrap_err();
        match err {
            ConfigError::Io { path, .. } => assert!(path.ends_with("molraster.json")),
            other => panic!("unexpected error: {}", other),
        }
    }
}
