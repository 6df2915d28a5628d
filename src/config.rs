//! Configuration management
//!
//! Defaults, optionally overlaid by a TOML file, then by `FAIRFLIP_*`
//! environment variables, then validated.

use crate::errors::{ConfigurationError, FairflipResult};
use crate::games::seed::DEFAULT_SEED_BYTES;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

/// Smallest accepted seed size in bytes
pub const MIN_SEED_BYTES: usize = 16;
/// Largest accepted seed size in bytes
pub const MAX_SEED_BYTES: usize = 64;

/// Complete service configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FairflipConfig {
    pub server: ServerConfig,
    pub sessions: SessionConfig,
    pub logging: LoggingConfig,
}

/// HTTP listener settings
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            allowed_origins: vec!["*".to_string()],
            request_timeout_secs: 10,
        }
    }
}

/// Seed and session arena settings
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SessionConfig {
    /// Random bytes per seed; seeds are hex encoded so strings are twice as long
    pub seed_bytes: usize,
    pub max_active_sessions: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            seed_bytes: DEFAULT_SEED_BYTES,
            max_active_sessions: 10_000,
        }
    }
}

/// Tracing subscriber settings
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, overridden by `RUST_LOG` when set
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "fairflip=info,tower_http=info".to_string(),
        }
    }
}

/// Configuration loader with environment variable support
#[derive(Debug, Default)]
pub struct ConfigLoader {
    config_path: Option<String>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self { config_path: None }
    }

    /// Set the configuration file path
    pub fn with_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_path = Some(path.as_ref().to_string_lossy().to_string());
        self
    }

    /// Load configuration from file and environment variables
    pub fn load(&self) -> FairflipResult<FairflipConfig> {
        let mut config = match &self.config_path {
            Some(path) => self.load_from_file(path)?,
            None => FairflipConfig::default(),
        };

        self.apply_env_overrides(&mut config)?;
        self.validate(&config)?;
        Ok(config)
    }

    fn load_from_file(&self, path: &str) -> FairflipResult<FairflipConfig> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ConfigurationError::LoadFailed(format!("Failed to read {}: {}", path, e))
        })?;

        toml::from_str(&content)
            .map_err(|e| ConfigurationError::LoadFailed(format!("Failed to parse TOML: {}", e)).into())
    }

    fn apply_env_overrides(&self, config: &mut FairflipConfig) -> FairflipResult<()> {
        if let Ok(host) = env::var("FAIRFLIP_HOST") {
            config.server.host = host;
        }
        if let Ok(port) = env::var("FAIRFLIP_PORT") {
            config.server.port = parse_env("FAIRFLIP_PORT", port, "Invalid port number")?;
        }
        if let Ok(bytes) = env::var("FAIRFLIP_SEED_BYTES") {
            config.sessions.seed_bytes = parse_env("FAIRFLIP_SEED_BYTES", bytes, "Invalid byte count")?;
        }
        if let Ok(max) = env::var("FAIRFLIP_MAX_SESSIONS") {
            config.sessions.max_active_sessions =
                parse_env("FAIRFLIP_MAX_SESSIONS", max, "Invalid session count")?;
        }
        if let Ok(filter) = env::var("FAIRFLIP_LOG") {
            config.logging.filter = filter;
        }
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self, config: &FairflipConfig) -> FairflipResult<()> {
        if config.server.host.trim().is_empty() {
            return Err(ConfigurationError::MissingRequired("server.host".to_string()).into());
        }

        if config.server.port == 0 {
            return Err(invalid("server.port", "0", "Port cannot be zero"));
        }

        if config.server.request_timeout_secs == 0 {
            return Err(invalid(
                "server.request_timeout_secs",
                "0",
                "Timeout must be at least one second",
            ));
        }

        let seed_bytes = config.sessions.seed_bytes;
        if !(MIN_SEED_BYTES..=MAX_SEED_BYTES).contains(&seed_bytes) {
            return Err(invalid(
                "sessions.seed_bytes",
                &seed_bytes.to_string(),
                &format!("Must be between {} and {}", MIN_SEED_BYTES, MAX_SEED_BYTES),
            ));
        }

        if config.sessions.max_active_sessions == 0 {
            return Err(invalid(
                "sessions.max_active_sessions",
                "0",
                "At least one session must be allowed",
            ));
        }

        if config.logging.filter.trim().is_empty() {
            return Err(ConfigurationError::MissingRequired("logging.filter".to_string()).into());
        }

        Ok(())
    }

    /// Save configuration to file
    pub fn save(&self, config: &FairflipConfig, path: &str) -> FairflipResult<()> {
        let toml_string = toml::to_string_pretty(config).map_err(|e| {
            ConfigurationError::SaveFailed(format!("Failed to serialize config: {}", e))
        })?;

        std::fs::write(path, toml_string).map_err(|e| {
            ConfigurationError::SaveFailed(format!("Failed to write to {}: {}", path, e)).into()
        })
    }
}

fn parse_env<T: std::str::FromStr>(field: &str, value: String, reason: &str) -> FairflipResult<T> {
    value.parse().map_err(|_| {
        ConfigurationError::InvalidValue {
            field: field.to_string(),
            value,
            reason: reason.to_string(),
        }
        .into()
    })
}

fn invalid(field: &str, value: &str, reason: &str) -> crate::errors::FairflipError {
    ConfigurationError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
    .into()
}

/// Builder pattern for creating configurations
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: FairflipConfig,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: FairflipConfig::default(),
        }
    }

    pub fn server(mut self, server: ServerConfig) -> Self {
        self.config.server = server;
        self
    }

    pub fn sessions(mut self, sessions: SessionConfig) -> Self {
        self.config.sessions = sessions;
        self
    }

    pub fn logging(mut self, logging: LoggingConfig) -> Self {
        self.config.logging = logging;
        self
    }

    pub fn build(self) -> FairflipConfig {
        self.config
    }
}

/// Write the default configuration to `path`
pub fn generate_sample_config(path: &str) -> FairflipResult<()> {
    ConfigLoader::new().save(&FairflipConfig::default(), path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = FairflipConfig::default();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.sessions.seed_bytes, 32);
        assert!(ConfigLoader::new().validate(&config).is_ok());
    }

    #[test]
    fn test_config_validation() {
        let loader = ConfigLoader::new();
        let mut config = FairflipConfig::default();

        config.server.port = 0;
        assert!(loader.validate(&config).is_err());

        let mut config = FairflipConfig::default();
        config.sessions.seed_bytes = 8;
        assert!(loader.validate(&config).is_err());
        config.sessions.seed_bytes = 128;
        assert!(loader.validate(&config).is_err());

        let mut config = FairflipConfig::default();
        config.sessions.max_active_sessions = 0;
        assert!(loader.validate(&config).is_err());
    }

    #[test]
    fn test_config_builder() {
        let config = ConfigBuilder::new()
            .server(ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 9000,
                ..Default::default()
            })
            .sessions(SessionConfig {
                seed_bytes: 16,
                max_active_sessions: 5,
            })
            .build();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.sessions.max_active_sessions, 5);
        assert_eq!(config.logging, LoggingConfig::default());
    }

    #[test]
    fn test_save_and_load_config() -> FairflipResult<()> {
        let temp_file = NamedTempFile::new().unwrap();
        let path = temp_file.path().to_str().unwrap();

        let original = ConfigBuilder::new()
            .sessions(SessionConfig {
                seed_bytes: 48,
                max_active_sessions: 12,
            })
            .build();
        ConfigLoader::new().save(&original, path)?;

        let loaded = ConfigLoader::new().with_path(path).load_from_file(path)?;
        assert_eq!(loaded, original);
        Ok(())
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let loaded: FairflipConfig = toml::from_str("[server]\nport = 7000\n").unwrap();
        assert_eq!(loaded.server.port, 7000);
        assert_eq!(loaded.server.host, "127.0.0.1");
        assert_eq!(loaded.sessions, SessionConfig::default());
    }

    #[test]
    fn test_missing_file_fails() {
        let result = ConfigLoader::new()
            .with_path("/nonexistent/fairflip.toml")
            .load();
        assert!(result.is_err());
    }
}
