//! Service Configuration
//!
//! Layered with the `config` crate: built-in defaults, then
//! `config/default.toml` (optional), then the file named by
//! `STARTUP_PREDICTOR_CONFIG`, then `STARTUP_PREDICTOR__*` environment
//! variables (`__` separates nested keys, e.g. `STARTUP_PREDICTOR__SERVER__ADDR`).

use artifact_store::ArtifactConfig;
use config::{Config, ConfigError, Environment, File};
use data_validator::ValidationConfig;
use feature_engine::ReconstructionConfig;
use serde::{Deserialize, Serialize};

use crate::rate_limit::RateLimitConfig;

/// Environment variable naming an extra configuration file
pub const CONFIG_PATH_ENV: &str = "STARTUP_PREDICTOR_CONFIG";
const ENV_PREFIX: &str = "STARTUP_PREDICTOR";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub artifacts: ArtifactConfig,
    pub logging: LoggingSettings,
    pub rate_limit: RateLimitConfig,
    pub reconstruction: ReconstructionConfig,
    pub validation: ValidationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Listen address
    pub addr: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0:5000".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Maximum level: trace, debug, info, warn or error
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl Settings {
    /// Load settings from the standard sources
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_PATH_ENV).ok();
        Self::load_from(path.as_deref())
    }

    /// Load settings with an explicit extra file (must exist when given)
    pub fn load_from(path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder =
            Config::builder().add_source(File::with_name("config/default").required(false));
        if let Some(path) = path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        builder
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.server.addr, "0.0.0.0:5000");
        assert_eq!(settings.artifacts.model_file, "model.json");
        assert_eq!(settings.logging.level, "info");
        assert_eq!(settings.reconstruction.hub_states, vec!["CA", "NY", "MA"]);
    }

    #[test]
    fn test_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[server]
addr = "127.0.0.1:9000"

[artifacts]
dir = "/srv/models"

[logging]
json = true

[reconstruction]
tech_categories = ["software", "biotech"]
"#
        )
        .unwrap();

        let settings = Settings::load_from(file.path().to_str()).unwrap();
        assert_eq!(settings.server.addr, "127.0.0.1:9000");
        assert_eq!(settings.artifacts.dir.to_str(), Some("/srv/models"));
        assert_eq!(settings.artifacts.scaler_file, "scaler.json");
        assert!(settings.logging.json);
        assert_eq!(settings.reconstruction.tech_categories, vec!["software", "biotech"]);
        assert_eq!(settings.reconstruction.state.fallback_column, "is_otherstate");
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        assert!(Settings::load_from(Some("/nonexistent/startup-predictor")).is_err());
    }
}
