//! CLI error type.

use std::fmt;
use std::io;
use std::path::PathBuf;

use lacquerd::config::ConfigError;
use lacquerd::supervisor::SupervisorError;
use lacquerd::vcl::VclError;

/// Errors surfaced to the command line, one line each.
#[derive(Debug)]
pub enum CliError {
    /// Configuration could not be loaded or resolved.
    Config(ConfigError),

    /// VCL rendering failed.
    Vcl(VclError),

    /// Starting or stopping the daemon failed.
    Supervisor(SupervisorError),

    /// A file the CLI itself writes could not be written.
    Write { path: PathBuf, source: io::Error },
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(e) => write!(f, "{}", e),
            CliError::Vcl(e) => write!(f, "{}", e),
            CliError::Supervisor(e) => write!(f, "{}", e),
            CliError::Write { path, source } => {
                write!(f, "failed to write {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Config(e) => Some(e),
            CliError::Vcl(e) => Some(e),
            CliError::Supervisor(e) => Some(e),
            CliError::Write { source, .. } => Some(source),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Config(e)
    }
}

impl From<VclError> for CliError {
    fn from(e: VclError) -> Self {
        CliError::Vcl(e)
    }
}

impl From<SupervisorError> for CliError {
    fn from(e: SupervisorError) -> Self {
        CliError::Supervisor(e)
    }
}
