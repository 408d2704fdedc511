//! `warden` driver library.
//!
//! This crate is the surrounding application: it is not itself part of
//! the content-blocking core, but it owns the lifecycle of the two
//! interceptors implemented by `warden-engine` and exposes a one-off
//! blocklist check for operators and tests.
//!
//! - `commands` contains the CLI subcommands (`check`, `run`) and their
//!   dispatch.
//! - `error` is the driver's own small error enum, a manual
//!   enum + `Display` pair rather than a derive-macro error crate.
pub mod commands;
pub mod error;
