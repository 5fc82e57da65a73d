//! Loading and validating recorder configuration.
//!
//! Configuration is read once at startup from a JSON file; the file path
//! comes from the `TRAILPOST_CONFIG` environment variable, falling back to
//! `trailpost.json` in the working directory. Misconfiguration is the one
//! thing in this crate that fails loudly, and it only does so here and in
//! the builders.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

/// Environment variable naming the config file path.
pub const CONFIG_PATH_ENV: &str = "TRAILPOST_CONFIG";

/// Config file used when `TRAILPOST_CONFIG` is not set.
pub const DEFAULT_CONFIG_PATH: &str = "trailpost.json";

/// Buffer capacity applied when the file does not set one.
pub const DEFAULT_BUFFER_CAPACITY: usize = 1000;

/// Gag period in milliseconds applied when the file does not set one.
pub const DEFAULT_GAG_PERIOD_MS: u64 = 300_000;

/// Settings shared by every recorder built from one collector.
///
/// ```json
/// {
///     "endpoint": "http://collector.example.com:9090",
///     "enabled": true,
///     "buffer_capacity": 1000,
///     "gag_period_ms": 300000
/// }
/// ```
///
/// Only `endpoint` is required.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct RecorderConfig {
    /// Collector endpoint, `scheme://host[:port]`.
    pub endpoint: String,
    /// Master switch; a disabled config yields no-op recorders.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Fixed capacity of each recorder's buffer.
    #[serde(default = "default_buffer_capacity")]
    pub buffer_capacity: usize,
    /// Minimum spacing between repeated diagnostic log lines.
    #[serde(default = "default_gag_period_ms")]
    pub gag_period_ms: u64,
}

fn default_enabled() -> bool {
    true
}

fn default_buffer_capacity() -> usize {
    DEFAULT_BUFFER_CAPACITY
}

fn default_gag_period_ms() -> u64 {
    DEFAULT_GAG_PERIOD_MS
}

impl RecorderConfig {
    /// Config with defaults for everything but the endpoint.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            enabled: default_enabled(),
            buffer_capacity: default_buffer_capacity(),
            gag_period_ms: default_gag_period_ms(),
        }
    }

    /// Loads and validates the config file at `path`.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let shown = path.display().to_string();
        let raw = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: shown.clone(), source })?;
        let config: RecorderConfig = serde_json::from_str(&raw)
            .map_err(|source| ConfigError::Parse { path: shown.clone(), source })?;
        config.validate(&shown)?;
        Ok(config)
    }

    /// Loads the config from the path named by `TRAILPOST_CONFIG`, or from
    /// [`DEFAULT_CONFIG_PATH`] when the variable is unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());
        Self::from_file(path)
    }

    /// Checks the invariants a recorder will rely on. `origin` names where
    /// the config came from and appears in the error.
    pub fn validate(&self, origin: &str) -> Result<(), ConfigError> {
        if self.endpoint.is_empty() {
            return Err(invalid(origin, "endpoint must be set to a non-empty URL"));
        }
        if let Err(e) = reqwest::Url::parse(&self.endpoint) {
            return Err(invalid(origin, &format!("endpoint is not a valid URL: {e}")));
        }
        if self.buffer_capacity == 0 {
            return Err(invalid(origin, "buffer_capacity must be a positive integer"));
        }
        if self.gag_period_ms == 0 {
            return Err(invalid(origin, "gag_period_ms must be a positive integer"));
        }
        Ok(())
    }

    /// The gag period as a [`Duration`].
    pub fn gag_period(&self) -> Duration {
        Duration::from_millis(self.gag_period_ms)
    }
}

fn invalid(origin: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid { path: origin.to_string(), reason: reason.to_string() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(json: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn minimal_file_fills_in_defaults() {
        let file = write_config(r#"{"endpoint": "http://collector:9090"}"#);
        let config = RecorderConfig::from_file(file.path()).unwrap();
        assert_eq!(config.endpoint, "http://collector:9090");
        assert!(config.enabled);
        assert_eq!(config.buffer_capacity, DEFAULT_BUFFER_CAPACITY);
        assert_eq!(config.gag_period(), Duration::from_secs(300));
    }

    #[test]
    fn full_file_overrides_everything() {
        let file = write_config(
            r#"{
                "endpoint": "http://collector:9090",
                "enabled": false,
                "buffer_capacity": 32,
                "gag_period_ms": 1000
            }"#,
        );
        let config = RecorderConfig::from_file(file.path()).unwrap();
        assert!(!config.enabled);
        assert_eq!(config.buffer_capacity, 32);
        assert_eq!(config.gag_period(), Duration::from_secs(1));
    }

    #[test]
    fn missing_file_is_an_io_error_naming_the_path() {
        let err = RecorderConfig::from_file("/definitely/not/here.json").unwrap_err();
        match err {
            ConfigError::Io { path, .. } => assert!(path.contains("not/here.json")),
            other => panic!("expected Io error, got {other:?}"),
        }
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let file = write_config("{endpoint: nope}");
        assert!(matches!(
            RecorderConfig::from_file(file.path()),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn validation_rejects_bad_values_with_the_origin() {
        let file = write_config(r#"{"endpoint": "http://collector:9090", "buffer_capacity": 0}"#);
        let err = RecorderConfig::from_file(file.path()).unwrap_err();
        match err {
            ConfigError::Invalid { reason, .. } => {
                assert!(reason.contains("buffer_capacity"));
            }
            other => panic!("expected Invalid error, got {other:?}"),
        }

        let mut config = RecorderConfig::new("not a url");
        assert!(matches!(config.validate("inline"), Err(ConfigError::Invalid { .. })));
        config.endpoint = String::new();
        let err = config.validate("inline").unwrap_err();
        assert_eq!(err.to_string(), "invalid config in inline: endpoint must be set to a non-empty URL");
    }

    #[test]
    fn gag_period_of_zero_is_rejected() {
        let file = write_config(r#"{"endpoint": "http://c:1", "gag_period_ms": 0}"#);
        assert!(matches!(
            RecorderConfig::from_file(file.path()),
            Err(ConfigError::Invalid { .. })
        ));
    }
}
