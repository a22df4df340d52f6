//! Common error types for queue sync

use thiserror::Error;

/// Common result type for queue sync operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across queue sync services
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Config file present but not valid TOML for the expected schema
    #[error("Config parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}
