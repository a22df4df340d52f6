//! Configuration loading and config file resolution
//!
//! Bootstrap configuration is read once at startup. Sources, highest
//! priority first:
//! 1. Command-line arguments / environment variables (applied by the binary)
//! 2. TOML config file
//! 3. Compiled defaults
//!
//! A missing config file is not an error: the service logs a warning and
//! starts with compiled defaults. A config file that exists but cannot be
//! parsed is an error.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "QSYNC_CONFIG";

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub server: ServerConfig,
    pub oracle: OracleConfig,
    pub timings: SyncTimings,
    pub logging: LoggingConfig,
}

/// HTTP listener settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub addr: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// Session oracle (GraphQL) connection settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    /// GraphQL endpoint of the session service
    pub graphql_server: String,

    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            graphql_server: "http://localhost:4000".to_string(),
            request_timeout_secs: 30,
        }
    }
}

impl OracleConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Cadences and ceilings of the synchronization jobs
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SyncTimings {
    /// Song Advance status poller period
    pub status_interval_secs: u64,

    /// Delay after song job creation before the status poller is armed
    pub status_arm_delay_secs: u64,

    /// External-Resume Watch poller period
    pub paused_interval_secs: u64,

    /// External-Resume Watch hard ceiling
    pub resume_ceiling_secs: u64,

    /// Device-Acquisition listener period (milliseconds)
    pub device_interval_ms: u64,

    /// Device-Acquisition ceiling; 120 and 180 are both in use
    pub device_ceiling_secs: u64,
}

impl Default for SyncTimings {
    fn default() -> Self {
        Self {
            status_interval_secs: 10,
            status_arm_delay_secs: 5,
            paused_interval_secs: 10,
            resume_ceiling_secs: 15 * 60,
            device_interval_ms: 1000,
            device_ceiling_secs: 2 * 60,
        }
    }
}

/// Upper bound for every configured cadence or ceiling
pub const MAX_TIMING: Duration = Duration::from_secs(7 * 24 * 60 * 60);

impl SyncTimings {
    /// Reject values that would produce a busy loop, a job with no lifetime
    /// or a job that outlives any realistic session
    pub fn validate(&self) -> Result<()> {
        let nonzero = [
            ("status_interval_secs", self.status_interval_secs),
            ("paused_interval_secs", self.paused_interval_secs),
            ("resume_ceiling_secs", self.resume_ceiling_secs),
            ("device_interval_ms", self.device_interval_ms),
            ("device_ceiling_secs", self.device_ceiling_secs),
        ];

        for (name, value) in nonzero {
            if value == 0 {
                return Err(Error::Config(format!("timings.{} must be greater than 0", name)));
            }
        }

        let bounded = [
            ("status_interval_secs", self.status_interval()),
            ("status_arm_delay_secs", self.status_arm_delay()),
            ("paused_interval_secs", self.paused_interval()),
            ("resume_ceiling_secs", self.resume_ceiling()),
            ("device_interval_ms", self.device_interval()),
            ("device_ceiling_secs", self.device_ceiling()),
        ];

        for (name, value) in bounded {
            if value > MAX_TIMING {
                return Err(Error::Config(format!(
                    "timings.{} exceeds the maximum of {} seconds",
                    name,
                    MAX_TIMING.as_secs()
                )));
            }
        }

        Ok(())
    }

    pub fn status_interval(&self) -> Duration {
        Duration::from_secs(self.status_interval_secs)
    }

    pub fn status_arm_delay(&self) -> Duration {
        Duration::from_secs(self.status_arm_delay_secs)
    }

    pub fn paused_interval(&self) -> Duration {
        Duration::from_secs(self.paused_interval_secs)
    }

    pub fn resume_ceiling(&self) -> Duration {
        Duration::from_secs(self.resume_ceiling_secs)
    }

    pub fn device_interval(&self) -> Duration {
        Duration::from_millis(self.device_interval_ms)
    }

    pub fn device_ceiling(&self) -> Duration {
        Duration::from_secs(self.device_ceiling_secs)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error); RUST_LOG overrides it
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Config file resolution, priority order:
/// 1. Command-line argument (highest priority)
/// 2. `QSYNC_CONFIG` environment variable
/// 3. Per-user config directory (`<config_dir>/qsync/config.toml`)
/// 4. System-wide `/etc/qsync/config.toml` (Linux only)
///
/// Returns `None` when no candidate exists; callers fall back to defaults.
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: User config directory
    if let Some(path) = dirs::config_dir().map(|d| d.join("qsync").join("config.toml")) {
        if path.exists() {
            return Some(path);
        }
    }

    // Priority 4: System config (Linux)
    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/qsync/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

impl TomlConfig {
    /// Load configuration from `path`, or compiled defaults if there is none
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) if path.exists() => {
                let content = std::fs::read_to_string(path)?;
                let config: TomlConfig = toml::from_str(&content)?;
                info!("Loaded config file: {}", path.display());
                config
            }
            Some(path) => {
                warn!(
                    "Config file {} not found, using compiled defaults",
                    path.display()
                );
                Self::default()
            }
            None => {
                info!("No config file found, using compiled defaults");
                Self::default()
            }
        };

        config.timings.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_timings() {
        let timings = SyncTimings::default();
        assert_eq!(timings.status_interval(), Duration::from_secs(10));
        assert_eq!(timings.status_arm_delay(), Duration::from_secs(5));
        assert_eq!(timings.paused_interval(), Duration::from_secs(10));
        assert_eq!(timings.resume_ceiling(), Duration::from_secs(900));
        assert_eq!(timings.device_interval(), Duration::from_millis(1000));
        assert_eq!(timings.device_ceiling(), Duration::from_secs(120));
        assert!(timings.validate().is_ok());
    }

    #[test]
    fn test_zero_ceiling_rejected() {
        let timings = SyncTimings {
            device_ceiling_secs: 0,
            ..SyncTimings::default()
        };
        assert!(matches!(timings.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_oversized_timings_rejected() {
        let timings = SyncTimings {
            resume_ceiling_secs: u64::MAX,
            ..SyncTimings::default()
        };
        assert!(matches!(timings.validate(), Err(Error::Config(_))));

        let timings = SyncTimings {
            device_interval_ms: MAX_TIMING.as_millis() as u64 + 1,
            ..SyncTimings::default()
        };
        assert!(matches!(timings.validate(), Err(Error::Config(_))));

        let timings = SyncTimings {
            device_ceiling_secs: MAX_TIMING.as_secs(),
            ..SyncTimings::default()
        };
        assert!(timings.validate().is_ok(), "the maximum itself is allowed");
    }

    #[test]
    fn test_zero_arm_delay_allowed() {
        let timings = SyncTimings {
            status_arm_delay_secs: 0,
            ..SyncTimings::default()
        };
        assert!(timings.validate().is_ok());
    }
}
