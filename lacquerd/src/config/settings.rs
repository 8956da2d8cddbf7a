//! Resolved varnishd settings and the builder/override types around them.

use std::path::{Path, PathBuf};
use std::time::Duration;

use super::error::{ConfigError, ConfigResult};

/// Name of the daemon binary inside `sbin_path`.
pub const VARNISHD_BINARY: &str = "varnishd";

/// Fully resolved varnishd settings for one environment.
///
/// Built by [`ConfigFile::resolve`](super::ConfigFile::resolve) (or directly
/// via [`Settings::builder`]) from built-in defaults, the environment's
/// config-file section, and caller overrides. Immutable after construction;
/// the builder enforces that `listen` is non-empty.
#[derive(Clone, Debug, PartialEq)]
pub struct Settings {
    env: String,
    root_path: PathBuf,
    listen: String,
    telnet: Option<String>,
    sbin_path: PathBuf,
    storage: Option<String>,
    log_dir: PathBuf,
    vcl_script_filename: String,
    backend_host: String,
    backend_port: String,
    started_check_delay: Duration,
    params: Vec<(String, String)>,
}

impl Settings {
    /// Start building settings for `env` rooted at `root_path`.
    pub fn builder(env: impl Into<String>, root_path: impl Into<PathBuf>) -> SettingsBuilder {
        SettingsBuilder::new(env.into(), root_path.into())
    }

    /// Environment name these settings were resolved for.
    pub fn env(&self) -> &str {
        &self.env
    }

    /// Project root; relative paths are resolved against it.
    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    /// Listen address passed to `-a`. Always non-empty.
    pub fn listen(&self) -> &str {
        &self.listen
    }

    /// Management (telnet) address passed to `-T`, if configured.
    pub fn telnet(&self) -> Option<&str> {
        self.telnet.as_deref()
    }

    /// Directory containing the `varnishd` binary.
    pub fn sbin_path(&self) -> &Path {
        &self.sbin_path
    }

    /// Storage specification passed to `-s`, if configured.
    pub fn storage(&self) -> Option<&str> {
        self.storage.as_deref()
    }

    /// Backend host substituted into the VCL template.
    pub fn backend_host(&self) -> &str {
        &self.backend_host
    }

    /// Backend port substituted into the VCL template.
    pub fn backend_port(&self) -> &str {
        &self.backend_port
    }

    /// Delay between liveness checks after a spawn. Zero in test contexts.
    pub fn started_check_delay(&self) -> Duration {
        self.started_check_delay
    }

    /// Daemon tuning parameters, in insertion order. May be empty.
    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    /// Full path to the daemon binary: `<sbin_path>/varnishd`.
    pub fn varnishd_path(&self) -> PathBuf {
        self.sbin_path.join(VARNISHD_BINARY)
    }

    /// Pid file the daemon writes: `<log_dir>/varnishd.<env>.pid`.
    pub fn pid_path(&self) -> PathBuf {
        self.log_path(format!("varnishd.{}.pid", self.env))
    }

    /// Rendered VCL artifact consumed by `-f`: `<log_dir>/varnishd.<env>.vcl`.
    pub fn vcl_path(&self) -> PathBuf {
        self.log_path(format!("varnishd.{}.vcl", self.env))
    }

    /// Path to the VCL template to render.
    pub fn vcl_template_path(&self) -> PathBuf {
        self.rooted(Path::new(&self.vcl_script_filename))
    }

    /// Variable table for VCL placeholder substitution.
    ///
    /// Optional settings (`telnet`, `storage`) only appear when configured,
    /// so a template referencing an unset one fails to render rather than
    /// silently emitting an empty value.
    pub fn template_vars(&self) -> Vec<(&'static str, String)> {
        let mut vars = vec![
            ("env", self.env.clone()),
            ("listen", self.listen.clone()),
            ("backend_host", self.backend_host.clone()),
            ("backend_port", self.backend_port.clone()),
        ];
        if let Some(telnet) = &self.telnet {
            vars.push(("telnet", telnet.clone()));
        }
        if let Some(storage) = &self.storage {
            vars.push(("storage", storage.clone()));
        }
        vars
    }

    fn log_path(&self, filename: String) -> PathBuf {
        self.rooted(&self.log_dir).join(filename)
    }

    fn rooted(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root_path.join(path)
        }
    }
}

/// Builder for [`Settings`], pre-populated with built-in defaults.
///
/// The config-file layer and caller overrides are both applied through this
/// builder, so merge semantics live in one place: scalar setters replace the
/// current value, [`SettingsBuilder::param`] merges key-by-key (an existing
/// key keeps its position, a new key appends).
#[derive(Clone, Debug)]
pub struct SettingsBuilder {
    env: String,
    root_path: PathBuf,
    listen: String,
    telnet: Option<String>,
    sbin_path: PathBuf,
    storage: Option<String>,
    log_dir: PathBuf,
    vcl_script_filename: String,
    backend_host: String,
    backend_port: String,
    started_check_delay: Duration,
    params: Vec<(String, String)>,
}

impl SettingsBuilder {
    fn new(env: String, root_path: PathBuf) -> Self {
        Self {
            env,
            root_path,
            listen: ":6081".to_string(),
            telnet: None,
            sbin_path: PathBuf::from("/usr/sbin"),
            storage: None,
            log_dir: PathBuf::from("log"),
            vcl_script_filename: "config/varnishd.vcl".to_string(),
            backend_host: "127.0.0.1".to_string(),
            backend_port: "3000".to_string(),
            started_check_delay: Duration::from_secs(1),
            params: Vec::new(),
        }
    }

    /// Set the listen address passed to `-a`.
    pub fn listen(mut self, listen: impl Into<String>) -> Self {
        self.listen = listen.into();
        self
    }

    /// Set the management (telnet) address passed to `-T`.
    pub fn telnet(mut self, telnet: impl Into<String>) -> Self {
        self.telnet = Some(telnet.into());
        self
    }

    /// Set the directory containing the `varnishd` binary.
    pub fn sbin_path(mut self, sbin_path: impl Into<PathBuf>) -> Self {
        self.sbin_path = sbin_path.into();
        self
    }

    /// Set the storage specification passed to `-s`.
    pub fn storage(mut self, storage: impl Into<String>) -> Self {
        self.storage = Some(storage.into());
        self
    }

    /// Set the directory for pid and rendered VCL artifacts.
    pub fn log_dir(mut self, log_dir: impl Into<PathBuf>) -> Self {
        self.log_dir = log_dir.into();
        self
    }

    /// Set the VCL template path, relative to the root unless absolute.
    pub fn vcl_script_filename(mut self, filename: impl Into<String>) -> Self {
        self.vcl_script_filename = filename.into();
        self
    }

    /// Set the backend host substituted into the VCL template.
    pub fn backend_host(mut self, host: impl Into<String>) -> Self {
        self.backend_host = host.into();
        self
    }

    /// Set the backend port substituted into the VCL template.
    pub fn backend_port(mut self, port: impl Into<String>) -> Self {
        self.backend_port = port.into();
        self
    }

    /// Set the delay between liveness checks after a spawn.
    pub fn started_check_delay(mut self, delay: Duration) -> Self {
        self.started_check_delay = delay;
        self
    }

    /// Merge one daemon tuning parameter.
    ///
    /// An existing key is updated in place so the original insertion order
    /// survives the merge; a new key appends.
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        let value = value.into();
        match self.params.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.params.push((key, value)),
        }
        self
    }

    /// Apply a set of caller overrides on top of the current state.
    pub fn apply(mut self, overrides: &Overrides) -> Self {
        if let Some(listen) = &overrides.listen {
            self = self.listen(listen.clone());
        }
        if let Some(telnet) = &overrides.telnet {
            self = self.telnet(telnet.clone());
        }
        if let Some(sbin_path) = &overrides.sbin_path {
            self = self.sbin_path(sbin_path.clone());
        }
        if let Some(storage) = &overrides.storage {
            self = self.storage(storage.clone());
        }
        if let Some(log_dir) = &overrides.log_dir {
            self = self.log_dir(log_dir.clone());
        }
        if let Some(filename) = &overrides.vcl_script_filename {
            self = self.vcl_script_filename(filename.clone());
        }
        if let Some(host) = &overrides.backend_host {
            self = self.backend_host(host.clone());
        }
        if let Some(port) = &overrides.backend_port {
            self = self.backend_port(port.clone());
        }
        if let Some(delay) = overrides.started_check_delay {
            self = self.started_check_delay(delay);
        }
        for (key, value) in &overrides.params {
            self = self.param(key.clone(), value.clone());
        }
        self
    }

    /// Finalize the settings.
    ///
    /// Fails with [`ConfigError::MissingListen`] if the merged `listen`
    /// address is empty.
    pub fn build(self) -> ConfigResult<Settings> {
        if self.listen.trim().is_empty() {
            return Err(ConfigError::MissingListen { env: self.env });
        }
        Ok(Settings {
            env: self.env,
            root_path: self.root_path,
            listen: self.listen,
            telnet: self.telnet,
            sbin_path: self.sbin_path,
            storage: self.storage,
            log_dir: self.log_dir,
            vcl_script_filename: self.vcl_script_filename,
            backend_host: self.backend_host,
            backend_port: self.backend_port,
            started_check_delay: self.started_check_delay,
            params: self.params,
        })
    }
}

/// Caller-supplied overrides applied on top of the config-file layer.
///
/// Every field is optional; `params` entries merge key-by-key.
#[derive(Clone, Debug, Default)]
pub struct Overrides {
    listen: Option<String>,
    telnet: Option<String>,
    sbin_path: Option<PathBuf>,
    storage: Option<String>,
    log_dir: Option<PathBuf>,
    vcl_script_filename: Option<String>,
    backend_host: Option<String>,
    backend_port: Option<String>,
    started_check_delay: Option<Duration>,
    params: Vec<(String, String)>,
}

impl Overrides {
    /// Create an empty override set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the listen address.
    pub fn listen(mut self, listen: impl Into<String>) -> Self {
        self.listen = Some(listen.into());
        self
    }

    /// Override the management (telnet) address.
    pub fn telnet(mut self, telnet: impl Into<String>) -> Self {
        self.telnet = Some(telnet.into());
        self
    }

    /// Override the daemon binary directory.
    pub fn sbin_path(mut self, sbin_path: impl Into<PathBuf>) -> Self {
        self.sbin_path = Some(sbin_path.into());
        self
    }

    /// Override the storage specification.
    pub fn storage(mut self, storage: impl Into<String>) -> Self {
        self.storage = Some(storage.into());
        self
    }

    /// Override the artifact directory.
    pub fn log_dir(mut self, log_dir: impl Into<PathBuf>) -> Self {
        self.log_dir = Some(log_dir.into());
        self
    }

    /// Override the VCL template path.
    pub fn vcl_script_filename(mut self, filename: impl Into<String>) -> Self {
        self.vcl_script_filename = Some(filename.into());
        self
    }

    /// Override the backend host.
    pub fn backend_host(mut self, host: impl Into<String>) -> Self {
        self.backend_host = Some(host.into());
        self
    }

    /// Override the backend port.
    pub fn backend_port(mut self, port: impl Into<String>) -> Self {
        self.backend_port = Some(port.into());
        self
    }

    /// Override the liveness-check delay.
    pub fn started_check_delay(mut self, delay: Duration) -> Self {
        self.started_check_delay = Some(delay);
        self
    }

    /// Merge one daemon tuning parameter on top of the file layer.
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> SettingsBuilder {
        Settings::builder("test", "/srv/app")
    }

    #[test]
    fn test_builder_defaults() {
        let settings = base().build().unwrap();
        assert_eq!(settings.env(), "test");
        assert_eq!(settings.listen(), ":6081");
        assert_eq!(settings.telnet(), None);
        assert_eq!(settings.storage(), None);
        assert!(settings.params().is_empty());
        assert_eq!(settings.started_check_delay(), Duration::from_secs(1));
    }

    #[test]
    fn test_varnishd_path_joins_sbin_and_binary() {
        let settings = base().sbin_path("/opt/varnishd/sbin").build().unwrap();
        assert_eq!(
            settings.varnishd_path(),
            PathBuf::from("/opt/varnishd/sbin/varnishd")
        );
    }

    #[test]
    fn test_pid_path_is_env_keyed_under_log_dir() {
        let settings = base().build().unwrap();
        assert_eq!(
            settings.pid_path(),
            PathBuf::from("/srv/app/log/varnishd.test.pid")
        );
    }

    #[test]
    fn test_vcl_path_is_env_keyed_under_log_dir() {
        let settings = base().build().unwrap();
        assert_eq!(
            settings.vcl_path(),
            PathBuf::from("/srv/app/log/varnishd.test.vcl")
        );
    }

    #[test]
    fn test_absolute_log_dir_ignores_root() {
        let settings = base().log_dir("/var/run/varnish").build().unwrap();
        assert_eq!(
            settings.pid_path(),
            PathBuf::from("/var/run/varnish/varnishd.test.pid")
        );
    }

    #[test]
    fn test_template_path_resolved_against_root() {
        let settings = base().build().unwrap();
        assert_eq!(
            settings.vcl_template_path(),
            PathBuf::from("/srv/app/config/varnishd.vcl")
        );
    }

    #[test]
    fn test_empty_listen_is_rejected() {
        let result = base().listen("  ").build();
        assert!(matches!(result, Err(ConfigError::MissingListen { .. })));
    }

    #[test]
    fn test_param_merge_keeps_position_of_existing_key() {
        let settings = base()
            .param("max", "1000")
            .param("add", "2")
            .param("max", "2000")
            .build()
            .unwrap();
        assert_eq!(
            settings.params(),
            &[
                ("max".to_string(), "2000".to_string()),
                ("add".to_string(), "2".to_string()),
            ]
        );
    }

    #[test]
    fn test_apply_overrides_win_per_key() {
        let overrides = Overrides::new()
            .listen(":80")
            .storage("malloc,1G")
            .param("thread_pools", "4");
        let settings = base()
            .listen(":6081")
            .param("thread_pools", "2")
            .param("overflow_max", "2000")
            .apply(&overrides)
            .build()
            .unwrap();

        assert_eq!(settings.listen(), ":80");
        assert_eq!(settings.storage(), Some("malloc,1G"));
        assert_eq!(
            settings.params(),
            &[
                ("thread_pools".to_string(), "4".to_string()),
                ("overflow_max".to_string(), "2000".to_string()),
            ]
        );
    }

    #[test]
    fn test_template_vars_omit_unset_optionals() {
        let settings = base().build().unwrap();
        let vars = settings.template_vars();
        assert!(vars.iter().any(|(k, _)| *k == "listen"));
        assert!(!vars.iter().any(|(k, _)| *k == "telnet"));
        assert!(!vars.iter().any(|(k, _)| *k == "storage"));
    }

    #[test]
    fn test_template_vars_include_backend_pair() {
        let settings = base()
            .backend_host("0.0.0.0")
            .backend_port("3000")
            .telnet("localhost:6082")
            .build()
            .unwrap();
        let vars = settings.template_vars();
        assert!(vars.contains(&("backend_host", "0.0.0.0".to_string())));
        assert!(vars.contains(&("backend_port", "3000".to_string())));
        assert!(vars.contains(&("telnet", "localhost:6082".to_string())));
    }
}
