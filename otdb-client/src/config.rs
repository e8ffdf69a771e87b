//! Client configuration.
//!
//! Configuration is loaded in the following order (later overrides earlier):
//! 1. Default values
//! 2. YAML config file (if specified via OTDB_CONFIG)
//! 3. Environment variables

use otdb_protocol::DEFAULT_SOCKET_PATH;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default reply line limit (1 MiB).
pub const DEFAULT_MAX_LINE_BYTES: usize = 1024 * 1024;

/// Minimum reply line limit (1 KiB).
pub const MIN_MAX_LINE_BYTES: usize = 1024;

/// Maximum reply line limit (64 MiB).
pub const MAX_MAX_LINE_BYTES: usize = 64 * 1024 * 1024;

/// Connection settings for one daemon socket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Path of the daemon's Unix domain socket.
    pub socket_path: PathBuf,
    /// Connect timeout in milliseconds.
    pub connect_timeout_ms: u64,
    /// Timeout for one send-and-read-reply exchange, in milliseconds.
    pub request_timeout_ms: u64,
    /// Longest reply line accepted, newline included.
    pub max_line_bytes: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            socket_path: PathBuf::from(DEFAULT_SOCKET_PATH),
            connect_timeout_ms: 5_000,
            request_timeout_ms: 30_000,
            max_line_bytes: DEFAULT_MAX_LINE_BYTES,
        }
    }
}

impl ClientConfig {
    pub fn new(socket_path: impl Into<PathBuf>) -> Self {
        Self {
            socket_path: socket_path.into(),
            ..Self::default()
        }
    }

    /// Loads configuration from file, then applies environment variable overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match std::env::var("OTDB_CONFIG") {
            Ok(path) => Self::from_file(&path)?,
            Err(_) => Self::default(),
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(path.to_path_buf(), e))?;
        let config: ClientConfig = serde_yaml::from_str(&content)
            .map_err(|e| ConfigError::ParseError(path.to_path_buf(), e.to_string()))?;
        Ok(config)
    }

    /// Loads configuration from environment variables only.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies overrides from a variable lookup. Unparseable values are ignored.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup("OTDB_SOCKET") {
            self.socket_path = PathBuf::from(path);
        }

        if let Some(ms) = lookup("OTDB_CONNECT_TIMEOUT_MS").and_then(|v| v.parse().ok()) {
            self.connect_timeout_ms = ms;
        }

        if let Some(ms) = lookup("OTDB_REQUEST_TIMEOUT_MS").and_then(|v| v.parse().ok()) {
            self.request_timeout_ms = ms;
        }

        if let Some(n) = lookup("OTDB_MAX_LINE_BYTES").and_then(|v| v.parse::<usize>().ok()) {
            self.max_line_bytes = n.clamp(MIN_MAX_LINE_BYTES, MAX_MAX_LINE_BYTES);
        }
    }

    /// Checks values a YAML file could have set out of range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.socket_path.as_os_str().is_empty() {
            return Err(ConfigError::ValidationError(
                "socket_path must not be empty".to_string(),
            ));
        }
        if self.connect_timeout_ms == 0 || self.request_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "timeouts must be greater than zero".to_string(),
            ));
        }
        if !(MIN_MAX_LINE_BYTES..=MAX_MAX_LINE_BYTES).contains(&self.max_line_bytes) {
            return Err(ConfigError::ValidationError(format!(
                "max_line_bytes must be between {} and {}",
                MIN_MAX_LINE_BYTES, MAX_MAX_LINE_BYTES
            )));
        }
        Ok(())
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout_ms = timeout.as_millis().max(1) as u64;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout_ms = timeout.as_millis().max(1) as u64;
        self
    }

    pub fn with_max_line_bytes(mut self, max: usize) -> Self {
        self.max_line_bytes = max.clamp(MIN_MAX_LINE_BYTES, MAX_MAX_LINE_BYTES);
        self
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {0:?}: {1}")]
    IoError(PathBuf, std::io::Error),

    #[error("failed to parse config file {0:?}: {1}")]
    ParseError(PathBuf, String),

    #[error("configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_config_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.socket_path, PathBuf::from("/opt/otdb/otdb.sock"));
        assert_eq!(config.connect_timeout(), Duration::from_secs(5));
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.max_line_bytes, DEFAULT_MAX_LINE_BYTES);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_line_limit_clamping() {
        let config = ClientConfig::default().with_max_line_bytes(10);
        assert_eq!(config.max_line_bytes, MIN_MAX_LINE_BYTES);

        let config = ClientConfig::default().with_max_line_bytes(usize::MAX);
        assert_eq!(config.max_line_bytes, MAX_MAX_LINE_BYTES);
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("OTDB_SOCKET", "/tmp/otdb.sock"),
            ("OTDB_CONNECT_TIMEOUT_MS", "250"),
            ("OTDB_REQUEST_TIMEOUT_MS", "not-a-number"),
            ("OTDB_MAX_LINE_BYTES", "4096"),
        ]
        .into_iter()
        .collect();

        let mut config = ClientConfig::default();
        config.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.socket_path, PathBuf::from("/tmp/otdb.sock"));
        assert_eq!(config.connect_timeout_ms, 250);
        assert_eq!(config.request_timeout_ms, 30_000);
        assert_eq!(config.max_line_bytes, 4096);
    }

    #[test]
    fn test_yaml_partial_file() {
        let yaml = "socket_path: /run/otdb.sock\nrequest_timeout_ms: 100\n";
        let config: ClientConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.socket_path, PathBuf::from("/run/otdb.sock"));
        assert_eq!(config.request_timeout_ms, 100);
        assert_eq!(config.connect_timeout_ms, 5_000);
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("otdb.yaml");
        std::fs::write(&path, "socket_path: /srv/otdb.sock\n").unwrap();

        let config = ClientConfig::from_file(&path).unwrap();
        assert_eq!(config.socket_path, PathBuf::from("/srv/otdb.sock"));

        let missing = ClientConfig::from_file(dir.path().join("nope.yaml"));
        assert!(matches!(missing, Err(ConfigError::IoError(..))));
    }

    #[test]
    fn test_validation() {
        let mut config = ClientConfig::default();
        config.request_timeout_ms = 0;
        assert!(config.validate().is_err());

        let mut config = ClientConfig::default();
        config.max_line_bytes = 1;
        assert!(config.validate().is_err());

        assert!(ClientConfig::new("").validate().is_err());
    }
}
