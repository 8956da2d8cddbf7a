//! Stop command - terminate the daemon recorded in the pid file.

use lacquerd::config::Overrides;
use lacquerd::supervisor::Supervisor;

use super::Context;
use crate::error::CliError;

/// Run the stop command.
pub fn run(ctx: &Context) -> Result<(), CliError> {
    let settings = ctx.settings(&Overrides::new())?;

    let mut supervisor = Supervisor::new();
    supervisor.attach(&settings);
    supervisor.stop()?;

    println!("varnishd stopped");
    Ok(())
}
