//! Render command - expand the VCL template without touching the daemon.

use std::fs;
use std::path::PathBuf;

use clap::Args;
use lacquerd::config::Overrides;
use lacquerd::vcl;

use super::Context;
use crate::error::CliError;

/// Arguments for the render command.
#[derive(Debug, Args)]
pub struct RenderArgs {
    /// Write the rendered VCL to this file instead of stdout
    #[arg(long)]
    pub output: Option<PathBuf>,
}

/// Run the render command.
pub fn run(ctx: &Context, args: RenderArgs) -> Result<(), CliError> {
    let settings = ctx.settings(&Overrides::new())?;
    let rendered = vcl::render(&settings.vcl_template_path(), &settings)?;

    match args.output {
        Some(path) => {
            fs::write(&path, &rendered).map_err(|source| CliError::Write {
                path: path.clone(),
                source,
            })?;
            println!("Rendered VCL written to {}", path.display());
        }
        None => print!("{}", rendered),
    }
    Ok(())
}
