//! Process-control and clock capabilities.
//!
//! The supervisor talks to the operating system only through these traits so
//! tests can substitute fakes instead of spawning real daemons or sleeping.

use std::fs;
use std::io;
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;
use std::time::Duration;

/// Operations the supervisor needs from the process layer.
pub trait ProcessControl {
    /// Whether `path` exists and is an executable file.
    fn binary_available(&self, path: &Path) -> bool;

    /// Spawn `program` detached with `args`, returning the launcher pid.
    ///
    /// The daemon forks away from the launcher; liveness is confirmed via
    /// the pid file, not this pid.
    fn spawn(&self, program: &Path, args: &[String]) -> io::Result<u32>;

    /// Whether a process with `pid` is currently alive.
    fn is_alive(&self, pid: u32) -> bool;

    /// Deliver SIGTERM to `pid`.
    fn terminate(&self, pid: u32) -> io::Result<()>;
}

/// Sleep capability used by the bounded liveness poll.
pub trait Clock {
    fn sleep(&self, duration: Duration);
}

/// Production [`ProcessControl`] backed by `std::process` and `libc`.
#[derive(Debug, Default)]
pub struct SystemProcess;

impl SystemProcess {
    pub fn new() -> Self {
        Self
    }
}

impl ProcessControl for SystemProcess {
    fn binary_available(&self, path: &Path) -> bool {
        use std::os::unix::fs::PermissionsExt;

        match fs::metadata(path) {
            Ok(metadata) => metadata.is_file() && metadata.permissions().mode() & 0o111 != 0,
            Err(_) => false,
        }
    }

    fn spawn(&self, program: &Path, args: &[String]) -> io::Result<u32> {
        // The child is not waited on: varnishd daemonizes itself and the
        // launcher exits on its own.
        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        Ok(child.id())
    }

    fn is_alive(&self, pid: u32) -> bool {
        // Signal 0 performs error checking only, no delivery.
        unsafe { libc::kill(pid as libc::pid_t, 0) == 0 }
    }

    fn terminate(&self, pid: u32) -> io::Result<()> {
        let rc = unsafe { libc::kill(pid as libc::pid_t, libc::SIGTERM) };
        if rc == 0 {
            Ok(())
        } else {
            Err(io::Error::last_os_error())
        }
    }
}

/// Production [`Clock`] backed by `std::thread::sleep`.
#[derive(Debug, Default)]
pub struct SystemClock;

impl SystemClock {
    pub fn new() -> Self {
        Self
    }
}

impl Clock for SystemClock {
    fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            thread::sleep(duration);
        }
    }
}
