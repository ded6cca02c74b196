//! Client configuration.
//!
//! Deployment details (gateway endpoint, static-file base) live in
//! `<config-dir>/braid/config.toml`; a missing file means development
//! defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use braid_core::BraidError;
use braid_core::error::Result;

fn default_endpoint() -> String {
    "ws://localhost:8000/ws/chat".to_string()
}

fn default_static_base() -> String {
    "http://localhost:8000/static/".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// WebSocket endpoint of the chat gateway.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Base URL generated files are served from.
    #[serde(default = "default_static_base")]
    pub static_base: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            static_base: default_static_base(),
        }
    }
}

impl ClientConfig {
    /// Loads the config file at `path`, falling back to defaults when it
    /// does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| BraidError::config(format!("failed to read {}: {e}", path.display())))?;
        Ok(toml::from_str(&content)?)
    }

    /// The per-user config file location.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("braid").join("config.toml"))
    }

    /// Loads from the per-user location, tolerating its absence.
    pub fn load_default() -> Result<Self> {
        match Self::default_path() {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ClientConfig::load(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(config, ClientConfig::default());
    }

    #[test]
    fn test_partial_file_keeps_field_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, r#"endpoint = "ws://gateway:9000/ws/chat""#).unwrap();

        let config = ClientConfig::load(&path).unwrap();
        assert_eq!(config.endpoint, "ws://gateway:9000/ws/chat");
        assert_eq!(config.static_base, default_static_base());
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "endpoint = [broken").unwrap();

        assert!(ClientConfig::load(&path).is_err());
    }
}
