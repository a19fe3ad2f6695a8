//! Configuration loading and resolution
//!
//! Priority order for every setting:
//! 1. Command-line argument (applied by the binary)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default
//!
//! A missing or unreadable TOML file is never fatal: the service logs a
//! warning and starts with defaults.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const ENV_CONFIG_PATH: &str = "FILING_CONFIG";
/// Environment variable overriding the record store path
pub const ENV_DATABASE_PATH: &str = "FILING_DATABASE";
/// Environment variable overriding the processing backend URL
pub const ENV_BACKEND_URL: &str = "FILING_BACKEND_URL";
/// Environment variable overriding the log level
pub const ENV_LOG_LEVEL: &str = "FILING_LOG_LEVEL";
/// Environment variable overriding the listen port
pub const ENV_PORT: &str = "FILING_PORT";

/// Complete service configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub poller: PollerConfig,
    pub progress: ProgressConfig,
    pub transform: TransformConfig,
    pub backend: BackendConfig,
    pub logging: LoggingConfig,
}

/// HTTP listener settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5740,
        }
    }
}

/// Record store settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: PathBuf,
    /// Total time to keep retrying a write that hits SQLite lock contention
    pub max_lock_wait_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            max_lock_wait_ms: 5000,
        }
    }
}

/// Job status poller backoff and attempt limits
///
/// Transient failures back off exponentially:
/// `min(error_base_ms * error_factor^n, error_cap_ms)`.
/// `processing` answers back off linearly:
/// `min(processing_base_ms + n * processing_step_ms, processing_cap_ms)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollerConfig {
    pub max_attempts: u32,
    pub error_base_ms: u64,
    pub error_factor: f64,
    pub error_cap_ms: u64,
    pub processing_base_ms: u64,
    pub processing_step_ms: u64,
    pub processing_cap_ms: u64,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            max_attempts: 120,
            error_base_ms: 5000,
            error_factor: 1.5,
            error_cap_ms: 60_000,
            processing_base_ms: 2000,
            processing_step_ms: 500,
            processing_cap_ms: 10_000,
        }
    }
}

/// Synthetic progress curve parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressConfig {
    /// Time constant of the saturating exponential, in seconds
    pub tau_seconds: f64,
    /// Ceiling the estimate never exceeds before a real completion signal
    pub max_percent: u8,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            tau_seconds: 180.0,
            max_percent: 95,
        }
    }
}

/// Schema transformation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformConfig {
    /// Leaf value treated as "no value" in source payloads
    pub missing_sentinel: String,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            missing_sentinel: "N/A".to_string(),
        }
    }
}

/// Remote processing backend used by the `watch` client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub base_url: String,
    pub request_timeout_ms: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5740".to_string(),
            request_timeout_ms: 30_000,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl ServiceConfig {
    /// Resolve and load configuration, applying environment overrides
    ///
    /// `cli_path` is the `--config` argument, if any.
    pub fn load(cli_path: Option<&Path>) -> Result<Self> {
        let mut config = match resolve_config_path(cli_path) {
            Some(path) => Self::from_file_or_default(&path),
            None => {
                info!("No config file found, using compiled defaults");
                Self::default()
            }
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
    }

    /// Load a TOML file, degrading to defaults (with a warning) on any error
    pub fn from_file_or_default(path: &Path) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "Config file unreadable, using defaults"
                );
                return Self::default();
            }
        };

        match Self::from_toml_str(&content) {
            Ok(config) => {
                info!(path = %path.display(), "Loaded config file");
                config
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Config file invalid, using defaults");
                Self::default()
            }
        }
    }

    /// Apply `FILING_*` environment variable overrides
    pub fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var(ENV_DATABASE_PATH) {
            if !path.trim().is_empty() {
                self.database.path = PathBuf::from(path);
            }
        }

        if let Ok(url) = std::env::var(ENV_BACKEND_URL) {
            if !url.trim().is_empty() {
                self.backend.base_url = url;
            }
        }

        if let Ok(level) = std::env::var(ENV_LOG_LEVEL) {
            if !level.trim().is_empty() {
                self.logging.level = level;
            }
        }

        if let Ok(port) = std::env::var(ENV_PORT) {
            match port.parse::<u16>() {
                Ok(port) => self.server.port = port,
                Err(_) => warn!(value = %port, "Ignoring invalid {}", ENV_PORT),
            }
        }
    }

    /// Reject settings that would make the poller or estimator misbehave
    pub fn validate(&self) -> Result<()> {
        let poller = &self.poller;
        if poller.max_attempts == 0 {
            return Err(Error::Config("poller.max_attempts must be greater than zero".into()));
        }
        if poller.error_factor < 1.0 || !poller.error_factor.is_finite() {
            return Err(Error::Config("poller.error_factor must be a finite value >= 1.0".into()));
        }
        if poller.error_cap_ms < poller.error_base_ms {
            return Err(Error::Config("poller.error_cap_ms must not be below error_base_ms".into()));
        }
        if poller.processing_cap_ms < poller.processing_base_ms {
            return Err(Error::Config(
                "poller.processing_cap_ms must not be below processing_base_ms".into(),
            ));
        }

        let progress = &self.progress;
        if !(progress.tau_seconds > 0.0) || !progress.tau_seconds.is_finite() {
            return Err(Error::Config("progress.tau_seconds must be positive".into()));
        }
        if progress.max_percent > 100 {
            return Err(Error::Config("progress.max_percent must not exceed 100".into()));
        }

        if self.transform.missing_sentinel.is_empty() {
            return Err(Error::Config("transform.missing_sentinel must not be empty".into()));
        }

        Ok(())
    }
}

/// Locate the config file: CLI argument, then `FILING_CONFIG`, then the
/// per-user default location (only if it exists)
pub fn resolve_config_path(cli_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_path {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(ENV_CONFIG_PATH) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    default_config_path().filter(|p| p.exists())
}

/// `~/.config/filing/config.toml` (platform equivalent elsewhere)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("filing").join("config.toml"))
}

/// OS-dependent default record store location
pub fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("filing").join("filing.db"))
        .unwrap_or_else(|| PathBuf::from("./filing_data/filing.db"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        ServiceConfig::default().validate().unwrap();
    }

    #[test]
    fn defaults_match_documented_constants() {
        let cfg = ServiceConfig::default();
        assert_eq!(cfg.poller.error_base_ms, 5000);
        assert_eq!(cfg.poller.error_factor, 1.5);
        assert_eq!(cfg.poller.error_cap_ms, 60_000);
        assert_eq!(cfg.poller.processing_base_ms, 2000);
        assert_eq!(cfg.poller.processing_step_ms, 500);
        assert_eq!(cfg.poller.processing_cap_ms, 10_000);
        assert_eq!(cfg.progress.tau_seconds, 180.0);
        assert_eq!(cfg.progress.max_percent, 95);
        assert_eq!(cfg.transform.missing_sentinel, "N/A");
    }

    #[test]
    fn zero_attempts_rejected() {
        let mut cfg = ServiceConfig::default();
        cfg.poller.max_attempts = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn shrinking_factor_rejected() {
        let mut cfg = ServiceConfig::default();
        cfg.poller.error_factor = 0.5;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn cap_below_base_rejected() {
        let mut cfg = ServiceConfig::default();
        cfg.poller.processing_cap_ms = 1000;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn zero_tau_rejected() {
        let mut cfg = ServiceConfig::default();
        cfg.progress.tau_seconds = 0.0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let cfg = ServiceConfig::from_toml_str(
            r#"
            [poller]
            max_attempts = 7

            [server]
            port = 6000
            "#,
        )
        .unwrap();

        assert_eq!(cfg.poller.max_attempts, 7);
        assert_eq!(cfg.poller.error_base_ms, 5000);
        assert_eq!(cfg.server.port, 6000);
        assert_eq!(cfg.server.host, "127.0.0.1");
        assert_eq!(cfg.progress, ProgressConfig::default());
    }

    #[test]
    fn malformed_toml_is_config_error() {
        let err = ServiceConfig::from_toml_str("[poller\nmax_attempts = ").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn missing_file_degrades_to_defaults() {
        let cfg = ServiceConfig::from_file_or_default(Path::new("/nonexistent/filing/config.toml"));
        assert_eq!(cfg, ServiceConfig::default());
    }
}
