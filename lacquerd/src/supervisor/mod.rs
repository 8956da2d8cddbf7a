//! Supervision of the external varnishd process.
//!
//! A [`Supervisor`] resolves the daemon binary, spawns it detached with the
//! built argument list, and confirms liveness by polling the pid file the
//! daemon writes. One external process per supervisor instance; supervisors
//! sharing a pid file are undefined behavior (documented limitation).
//!
//! Handle states move `Stopped → Starting → Running → Stopped`, with
//! `Starting → Failed` on a spawn error or startup timeout. A failed start
//! leaves no adopted daemon behind.

mod process;

pub use process::{Clock, ProcessControl, SystemClock, SystemProcess};

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::args;
use crate::config::Settings;

/// Default number of liveness checks before a start is reported as failed.
pub const DEFAULT_STARTUP_ATTEMPTS: u32 = 5;

/// Result type for supervisor operations.
pub type SupervisorResult<T> = Result<T, SupervisorError>;

/// Errors that can occur while starting or stopping the daemon.
#[derive(Debug, Error)]
pub enum SupervisorError {
    /// The resolved `<sbin_path>/varnishd` is missing or not executable.
    #[error("varnishd binary not found or not executable: {}", path.display())]
    BinaryNotFound { path: PathBuf },

    /// The launcher process could not be spawned.
    #[error("failed to spawn {}: {source}", path.display())]
    SpawnFailed { path: PathBuf, source: io::Error },

    /// The daemon never confirmed liveness via its pid file.
    #[error("varnishd did not come up after {attempts} checks ({delay:?} apart)")]
    StartupTimeout { attempts: u32, delay: Duration },

    /// This supervisor already has a running daemon.
    #[error("varnishd is already running with pid {pid}")]
    AlreadyRunning { pid: u32 },

    /// There is no running daemon to stop.
    #[error("varnishd is not running")]
    NotRunning,

    /// SIGTERM delivery failed.
    #[error("failed to stop varnishd (pid {pid}): {source}")]
    StopFailed { pid: u32, source: io::Error },
}

/// Lifecycle state of a supervised daemon.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum State {
    Stopped,
    Starting,
    Running,
    Failed,
}

/// A spawned (or adopted) varnishd process.
#[derive(Clone, Debug)]
pub struct VarnishdHandle {
    executable: PathBuf,
    args: Vec<String>,
    pid_file: PathBuf,
    pid: Option<u32>,
    state: State,
}

impl VarnishdHandle {
    /// Full path of the daemon binary.
    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// Argument list the daemon was spawned with. Empty for adopted handles.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Pid file used for liveness checks.
    pub fn pid_file(&self) -> &Path {
        &self.pid_file
    }

    /// Daemon pid, once confirmed via the pid file.
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Current lifecycle state.
    pub fn state(&self) -> State {
        self.state
    }
}

/// Process supervisor for a single varnishd daemon.
///
/// Capabilities are injected: production code uses [`SystemProcess`] and
/// [`SystemClock`], tests substitute fakes.
pub struct Supervisor<P = SystemProcess, C = SystemClock> {
    process: P,
    clock: C,
    startup_attempts: u32,
    handle: Option<VarnishdHandle>,
}

impl Supervisor<SystemProcess, SystemClock> {
    /// Create a supervisor with the production capabilities.
    pub fn new() -> Self {
        Self::with_capabilities(SystemProcess::new(), SystemClock::new())
    }
}

impl Default for Supervisor<SystemProcess, SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: ProcessControl, C: Clock> Supervisor<P, C> {
    /// Create a supervisor with explicit process and clock capabilities.
    pub fn with_capabilities(process: P, clock: C) -> Self {
        Self {
            process,
            clock,
            startup_attempts: DEFAULT_STARTUP_ATTEMPTS,
            handle: None,
        }
    }

    /// Set the number of liveness checks performed after a spawn.
    pub fn with_startup_attempts(mut self, attempts: u32) -> Self {
        self.startup_attempts = attempts;
        self
    }

    /// Handle of the current daemon, if any start or attach has happened.
    pub fn handle(&self) -> Option<&VarnishdHandle> {
        self.handle.as_ref()
    }

    /// Whether this supervisor's daemon is running right now.
    pub fn is_running(&self) -> bool {
        match &self.handle {
            Some(handle) => {
                handle.state == State::Running
                    && handle.pid.is_some_and(|pid| self.process.is_alive(pid))
            }
            None => false,
        }
    }

    /// Start the daemon described by `settings`.
    ///
    /// Spawns detached, then polls the pid file up to the configured attempt
    /// count, sleeping `settings.started_check_delay()` before each check.
    /// Fails with [`SupervisorError::AlreadyRunning`] if this supervisor's
    /// daemon is still up — a repeated `start` is rejected, not a no-op.
    pub fn start(&mut self, settings: &Settings) -> SupervisorResult<&VarnishdHandle> {
        if let Some(handle) = &self.handle {
            if handle.state == State::Running {
                if let Some(pid) = handle.pid {
                    if self.process.is_alive(pid) {
                        return Err(SupervisorError::AlreadyRunning { pid });
                    }
                }
            }
        }

        let executable = settings.varnishd_path();
        if !self.process.binary_available(&executable) {
            return Err(SupervisorError::BinaryNotFound { path: executable });
        }

        let args = args::build(settings);
        let pid_file = settings.pid_path();
        info!(command = %args::command_line(&executable, &args), "starting varnishd");

        let mut handle = VarnishdHandle {
            executable: executable.clone(),
            args,
            pid_file: pid_file.clone(),
            pid: None,
            state: State::Starting,
        };

        if let Err(source) = self.process.spawn(&handle.executable, &handle.args) {
            handle.state = State::Failed;
            self.handle = Some(handle);
            return Err(SupervisorError::SpawnFailed {
                path: executable,
                source,
            });
        }

        let delay = settings.started_check_delay();
        for attempt in 1..=self.startup_attempts {
            self.clock.sleep(delay);
            if let Some(pid) = read_pid_file(&pid_file) {
                if self.process.is_alive(pid) {
                    info!(pid, attempt, "varnishd is running");
                    handle.pid = Some(pid);
                    handle.state = State::Running;
                    return Ok(self.handle.insert(handle));
                }
            }
            debug!(attempt, pid_file = %pid_file.display(), "varnishd not up yet");
        }

        warn!(
            attempts = self.startup_attempts,
            pid_file = %pid_file.display(),
            "varnishd failed to come up"
        );
        handle.state = State::Failed;
        self.handle = Some(handle);
        Err(SupervisorError::StartupTimeout {
            attempts: self.startup_attempts,
            delay,
        })
    }

    /// Stop the running daemon with SIGTERM.
    ///
    /// Fails with [`SupervisorError::NotRunning`] if no daemon was started
    /// or attached, or if the handle is already stopped.
    pub fn stop(&mut self) -> SupervisorResult<()> {
        let handle = match self.handle.as_mut() {
            Some(handle) if handle.state == State::Running => handle,
            _ => return Err(SupervisorError::NotRunning),
        };
        let pid = match handle.pid {
            Some(pid) => pid,
            None => return Err(SupervisorError::NotRunning),
        };

        if !self.process.is_alive(pid) {
            // The daemon died underneath us; record that and report it.
            handle.state = State::Stopped;
            handle.pid = None;
            return Err(SupervisorError::NotRunning);
        }

        self.process
            .terminate(pid)
            .map_err(|source| SupervisorError::StopFailed { pid, source })?;
        info!(pid, "stopped varnishd");
        handle.state = State::Stopped;
        handle.pid = None;
        Ok(())
    }

    /// Stop the daemon if it is running, then start it with `settings`.
    pub fn restart(&mut self, settings: &Settings) -> SupervisorResult<&VarnishdHandle> {
        match self.stop() {
            Ok(()) | Err(SupervisorError::NotRunning) => {}
            Err(e) => return Err(e),
        }
        self.start(settings)
    }

    /// Adopt an already-running daemon from its pid file.
    ///
    /// Lets a fresh supervisor (e.g. a new CLI invocation) stop or query a
    /// daemon started elsewhere. Returns the adopted pid, or `None` when the
    /// pid file is missing, unparseable, or names a dead process.
    pub fn attach(&mut self, settings: &Settings) -> Option<u32> {
        let pid_file = settings.pid_path();
        let pid = read_pid_file(&pid_file)?;
        if !self.process.is_alive(pid) {
            debug!(pid, pid_file = %pid_file.display(), "stale pid file, not adopting");
            return None;
        }
        debug!(pid, "adopted running varnishd");
        self.handle = Some(VarnishdHandle {
            executable: settings.varnishd_path(),
            args: Vec::new(),
            pid_file,
            pid: Some(pid),
            state: State::Running,
        });
        Some(pid)
    }
}

fn read_pid_file(path: &Path) -> Option<u32> {
    let contents = fs::read_to_string(path).ok()?;
    contents.trim().parse().ok()
}
