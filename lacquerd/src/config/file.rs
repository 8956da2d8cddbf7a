//! Loading of the environment-keyed configuration file.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use ini::{Ini, Properties};
use tracing::{debug, warn};

use super::error::{ConfigError, ConfigResult};
use super::settings::{Overrides, Settings, SettingsBuilder};

/// An environment-keyed varnishd configuration document.
///
/// Scalars for an environment live in an `[<env>]` section; daemon tuning
/// parameters live in `[<env>.params]` and keep their file order.
///
/// ```ini
/// [test]
/// listen = 0.0.0.0:6081
/// telnet = localhost:6082
///
/// [test.params]
/// overflow_max = 2000
/// ```
pub struct ConfigFile {
    path: PathBuf,
    document: Ini,
}

impl fmt::Debug for ConfigFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigFile")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl ConfigFile {
    /// Load a configuration document from `path`.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let document = Ini::load_from_str(&contents).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        debug!(path = %path.display(), "loaded varnishd configuration");
        Ok(Self {
            path: path.to_path_buf(),
            document,
        })
    }

    /// Path this document was loaded from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Resolve [`Settings`] for `env`, merging built-in defaults, the file's
    /// `[<env>]` and `[<env>.params]` sections, and `overrides` (in that
    /// order, later layers winning per key).
    ///
    /// Fails with [`ConfigError::EnvironmentNotFound`] when the file has no
    /// section for `env`.
    pub fn resolve(
        &self,
        env: &str,
        root_path: &Path,
        overrides: &Overrides,
    ) -> ConfigResult<Settings> {
        let section = self
            .document
            .section(Some(env))
            .ok_or_else(|| ConfigError::EnvironmentNotFound {
                env: env.to_string(),
                path: self.path.clone(),
            })?;

        let mut builder = Settings::builder(env, root_path);
        builder = self.apply_section(builder, section)?;

        if let Some(params) = self.document.section(Some(format!("{env}.params"))) {
            for (key, value) in params.iter() {
                builder = builder.param(key, value);
            }
        }

        builder.apply(overrides).build()
    }

    fn apply_section(
        &self,
        mut builder: SettingsBuilder,
        section: &Properties,
    ) -> ConfigResult<SettingsBuilder> {
        for (key, value) in section.iter() {
            builder = match key {
                "listen" => builder.listen(value),
                "telnet" => builder.telnet(value),
                "sbin_path" => builder.sbin_path(value),
                "storage" => builder.storage(value),
                "log_dir" => builder.log_dir(value),
                "vcl_script_filename" => builder.vcl_script_filename(value),
                "backend_host" => builder.backend_host(value),
                "backend_port" => builder.backend_port(value),
                "started_check_delay" => {
                    let secs: u64 = value.parse().map_err(|_| ConfigError::InvalidValue {
                        key: key.to_string(),
                        value: value.to_string(),
                    })?;
                    builder.started_check_delay(Duration::from_secs(secs))
                }
                _ => {
                    warn!(key, file = %self.path.display(), "ignoring unknown configuration key");
                    builder
                }
            };
        }
        Ok(builder)
    }
}
