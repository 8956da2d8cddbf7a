//! Status command - report whether the daemon is up.

use lacquerd::config::Overrides;
use lacquerd::supervisor::Supervisor;

use super::Context;
use crate::error::CliError;

/// Run the status command.
pub fn run(ctx: &Context) -> Result<(), CliError> {
    let settings = ctx.settings(&Overrides::new())?;

    let mut supervisor = Supervisor::new();
    match supervisor.attach(&settings) {
        Some(pid) => println!(
            "varnishd ({}) running (pid {}, pid file {})",
            ctx.env(),
            pid,
            settings.pid_path().display()
        ),
        None => println!("varnishd ({}) not running", ctx.env()),
    }
    Ok(())
}
