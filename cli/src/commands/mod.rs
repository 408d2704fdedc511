//! CLI command definitions for the `warden` binary.
pub mod base;
