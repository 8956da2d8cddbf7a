//! Error types for configuration resolution.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors that can occur while loading or resolving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration file {}: {source}", path.display())]
    ReadFailed { path: PathBuf, source: io::Error },

    /// The configuration file is not valid INI.
    #[error("failed to parse configuration file {}: {reason}", path.display())]
    Parse { path: PathBuf, reason: String },

    /// No defaults exist for the requested environment.
    #[error("no configuration section for environment '{env}' in {}", path.display())]
    EnvironmentNotFound { env: String, path: PathBuf },

    /// A configuration value could not be interpreted.
    #[error("invalid value for '{key}': '{value}'")]
    InvalidValue { key: String, value: String },

    /// The merged settings ended up with an empty listen address.
    ///
    /// `listen` must be non-empty before a start is ever attempted.
    #[error("settings for environment '{env}' have an empty 'listen' address")]
    MissingListen { env: String },
}
