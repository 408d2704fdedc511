//! CLI command definitions for the `warden-engine` binary.
//!
//! Each subcommand starts exactly one interceptor standalone and runs it
//! until `Ctrl-C`.
pub mod base;
