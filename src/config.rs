// src/config.rs

//! Configuration loading for platform credentials and conversion defaults.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Target platform connection settings, loaded from a TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformConfig {
    /// API base URL, e.g. "https://api.platform.boomi.com/api/rest/v1"
    pub base_url: String,
    /// Platform account identifier appended to API paths
    pub account_id: String,
    pub username: String,
    /// API token used as the basic-auth password
    pub token: String,
}

/// Top-level configuration file layout
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub platform: Option<PlatformConfig>,
    #[serde(default)]
    pub conversion: ConversionConfig,
}

/// Conversion tuning knobs; all optional with sensible defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionConfig {
    /// Skip generating components for services that only call built-ins
    pub skip_builtin_only: bool,
    /// Treat documents whose names carry these substrings as flat-file
    pub flat_file_hints: Vec<String>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        ConversionConfig {
            skip_builtin_only: false,
            flat_file_hints: vec!["flat".to_string(), "csv".to_string()],
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        debug!("Loading configuration from {}", path.display());
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("read {}: {e}", path.display())))?;
        toml::from_str(&raw).map_err(|e| Error::Config(format!("parse {}: {e}", path.display())))
    }

    /// Platform settings, or an error naming what is missing.
    pub fn platform(&self) -> Result<&PlatformConfig> {
        self.platform
            .as_ref()
            .ok_or_else(|| Error::Config("no [platform] section in configuration".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn load_full_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("flowport.toml");
        fs::write(
            &path,
            r#"
[platform]
base_url = "https://api.example.com/api/rest/v1"
account_id = "acme-ABC123"
username = "migrator@example.com"
token = "secret"

[conversion]
skip_builtin_only = true
flat_file_hints = ["flat"]
"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        let platform = config.platform().unwrap();
        assert_eq!(platform.account_id, "acme-ABC123");
        assert!(config.conversion.skip_builtin_only);
        assert_eq!(config.conversion.flat_file_hints, vec!["flat"]);
    }

    #[test]
    fn missing_platform_section_is_detected_late() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("flowport.toml");
        fs::write(&path, "[conversion]\nskip_builtin_only = false\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert!(config.platform().is_err());
        assert_eq!(config.conversion.flat_file_hints.len(), 2);
    }

    #[test]
    fn unreadable_file_is_a_config_error() {
        let err = Config::load(Path::new("/nonexistent/flowport.toml")).unwrap_err();
        assert!(err.to_string().contains("flowport.toml"));
    }
}
