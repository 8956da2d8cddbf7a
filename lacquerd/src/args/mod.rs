//! Command-line argument construction for the varnishd daemon.
//!
//! Flag order is fixed: `-a`, `-T` (optional), `-f`, `-s` (optional), `-P`,
//! then one `-p key=value` pair per tuning parameter in insertion order.

use std::path::Path;

use crate::config::Settings;

/// Build the full varnishd argument list for `settings`.
pub fn build(settings: &Settings) -> Vec<String> {
    let mut args = vec!["-a".to_string(), settings.listen().to_string()];

    if let Some(telnet) = settings.telnet() {
        args.push("-T".to_string());
        args.push(telnet.to_string());
    }

    args.push("-f".to_string());
    args.push(settings.vcl_path().display().to_string());

    if let Some(storage) = settings.storage() {
        args.push("-s".to_string());
        args.push(storage.to_string());
    }

    args.push("-P".to_string());
    args.push(settings.pid_path().display().to_string());

    args.extend(params_args(settings));
    args
}

/// Build only the `-p key=value` pairs, in insertion order.
pub fn params_args(settings: &Settings) -> Vec<String> {
    settings
        .params()
        .iter()
        .flat_map(|(key, value)| ["-p".to_string(), format!("{key}={value}")])
        .collect()
}

/// Join a program and its arguments into one line for logging.
pub fn command_line(program: &Path, args: &[String]) -> String {
    let mut line = program.display().to_string();
    for arg in args {
        line.push(' ');
        line.push_str(arg);
    }
    line
}
