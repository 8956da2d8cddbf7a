//! Lacquerd CLI - process management for the varnishd caching daemon.

mod commands;
mod error;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::commands::Context;
use crate::error::CliError;

#[derive(Debug, Parser)]
#[command(
    name = "lacquerd",
    version = lacquerd::VERSION,
    about = "Process manager for the varnishd caching daemon"
)]
struct Cli {
    /// Environment whose configuration section to use
    #[arg(long, global = true, default_value = "development")]
    env: String,

    /// Project root; config and log paths resolve relative to it
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,

    /// Configuration file, relative to the root unless absolute
    #[arg(long, global = true, default_value = "config/varnishd.ini")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Render the VCL and start the daemon
    Start(commands::start::StartArgs),

    /// Stop the running daemon
    Stop,

    /// Stop the daemon if it is running, then start it
    Restart(commands::start::StartArgs),

    /// Report whether the daemon is running
    Status,

    /// Render the VCL template to stdout or a file
    Render(commands::render::RenderArgs),
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let ctx = Context::new(cli.env, cli.root, cli.config)?;
    match cli.command {
        Command::Start(args) => commands::start::run(&ctx, args, false),
        Command::Stop => commands::stop::run(&ctx),
        Command::Restart(args) => commands::start::run(&ctx, args, true),
        Command::Status => commands::status::run(&ctx),
        Command::Render(args) => commands::render::run(&ctx, args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_parse_before_subcommand() {
        let cli = Cli::try_parse_from([
            "lacquerd", "--env", "test", "--root", "/srv/app", "status",
        ])
        .unwrap();
        assert_eq!(cli.env, "test");
        assert_eq!(cli.root, PathBuf::from("/srv/app"));
        assert!(matches!(cli.command, Command::Status));
    }

    #[test]
    fn test_start_accepts_overrides() {
        let cli = Cli::try_parse_from([
            "lacquerd",
            "start",
            "--listen",
            ":80",
            "--sbin-path",
            "/opt/varnishd/sbin",
        ])
        .unwrap();
        match cli.command {
            Command::Start(args) => {
                assert_eq!(args.listen.as_deref(), Some(":80"));
                assert_eq!(args.sbin_path.as_deref(), Some("/opt/varnishd/sbin"));
            }
            other => panic!("expected start command, got {:?}", other),
        }
    }
}
