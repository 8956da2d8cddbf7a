//! Configuration resolution for the varnishd wrapper.
//!
//! Settings come from three layers, later layers winning per key:
//!
//! ```text
//! built-in defaults ──► config file [env] section ──► caller overrides
//! ```
//!
//! The config file is an INI document keyed by environment name: scalars live
//! in an `[<env>]` section, daemon tuning parameters in `[<env>.params]`.
//! The nested `params` map merges key-by-key rather than being replaced
//! wholesale, and insertion order is preserved end to end because the
//! argument builder must reproduce it exactly.

mod error;
mod file;
mod settings;

pub use error::{ConfigError, ConfigResult};
pub use file::ConfigFile;
pub use settings::{Overrides, Settings, SettingsBuilder, VARNISHD_BINARY};
