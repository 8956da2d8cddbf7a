//! CLI command implementations.

pub mod render;
pub mod start;
pub mod status;
pub mod stop;

use std::path::PathBuf;

use lacquerd::config::{ConfigFile, Overrides, Settings};
use tracing::debug;

use crate::error::CliError;

/// Shared invocation context: environment, project root, and the loaded
/// configuration document. Constructed once per run and passed into every
/// command; there is no ambient global state.
pub struct Context {
    env: String,
    root: PathBuf,
    config: ConfigFile,
}

impl Context {
    /// Load the configuration file and capture the invocation scope.
    ///
    /// `config` is resolved relative to `root` unless absolute.
    pub fn new(env: String, root: PathBuf, config: PathBuf) -> Result<Self, CliError> {
        let config_path = if config.is_absolute() {
            config
        } else {
            root.join(config)
        };
        let config = ConfigFile::load(&config_path)?;
        debug!(env = %env, root = %root.display(), config = %config.path().display(), "invocation context");
        Ok(Self { env, root, config })
    }

    /// Environment this invocation targets.
    pub fn env(&self) -> &str {
        &self.env
    }

    /// Resolve settings for this invocation with `overrides` applied.
    pub fn settings(&self, overrides: &Overrides) -> Result<Settings, CliError> {
        Ok(self.config.resolve(&self.env, &self.root, overrides)?)
    }
}
