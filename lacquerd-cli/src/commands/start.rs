//! Start and restart commands - render the VCL, then launch the daemon.

use clap::Args;
use lacquerd::config::Overrides;
use lacquerd::supervisor::Supervisor;
use lacquerd::vcl;

use super::Context;
use crate::error::CliError;

/// Settings overrides shared by `start` and `restart`.
#[derive(Debug, Args)]
pub struct StartArgs {
    /// Listen address passed to varnishd -a (overrides the config file)
    #[arg(long)]
    pub listen: Option<String>,

    /// Management address passed to varnishd -T
    #[arg(long)]
    pub telnet: Option<String>,

    /// Storage specification passed to varnishd -s
    #[arg(long)]
    pub storage: Option<String>,

    /// Directory containing the varnishd binary
    #[arg(long)]
    pub sbin_path: Option<String>,
}

impl StartArgs {
    fn overrides(self) -> Overrides {
        let mut overrides = Overrides::new();
        if let Some(listen) = self.listen {
            overrides = overrides.listen(listen);
        }
        if let Some(telnet) = self.telnet {
            overrides = overrides.telnet(telnet);
        }
        if let Some(storage) = self.storage {
            overrides = overrides.storage(storage);
        }
        if let Some(sbin_path) = self.sbin_path {
            overrides = overrides.sbin_path(sbin_path);
        }
        overrides
    }
}

/// Run the start (or restart) command.
pub fn run(ctx: &Context, args: StartArgs, restart: bool) -> Result<(), CliError> {
    let settings = ctx.settings(&args.overrides())?;

    let vcl_path = vcl::write(&settings)?;
    println!("Rendered VCL: {}", vcl_path.display());

    let mut supervisor = Supervisor::new();
    // Adopt any daemon a previous invocation left running, so a repeated
    // start is rejected and a restart replaces it.
    supervisor.attach(&settings);

    let handle = if restart {
        supervisor.restart(&settings)?
    } else {
        supervisor.start(&settings)?
    };

    match handle.pid() {
        Some(pid) => println!("varnishd running (pid {}), listening on {}", pid, settings.listen()),
        None => println!("varnishd starting, listening on {}", settings.listen()),
    }
    Ok(())
}
