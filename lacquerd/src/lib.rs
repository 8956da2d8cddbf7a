//! Lacquerd - process management for the varnishd caching daemon.
//!
//! This library wraps the external `varnishd` binary. It resolves
//! environment-keyed configuration into a [`config::Settings`] value, renders
//! a VCL configuration file from a template, builds the daemon's command line,
//! and supervises the spawned process via the pid file the daemon writes.
//!
//! The caching engine itself lives entirely inside `varnishd`; nothing here
//! implements cache, storage, or request-routing logic.

pub mod args;
pub mod config;
pub mod supervisor;
pub mod vcl;

/// Crate version, as compiled into the binary.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
