//! Core library for the on-device content-blocking engine.
//!
//! Exposes the three subsystems described by the component design:
//! [`filter`] (the blocklist store, rule compiler and host matcher),
//! [`dns`] (the DNS wire codec and UDP sink-holing relay) and [`stream`]
//! (the TLS SNI / HTTP head parsers and the TCP forward-proxy relay), plus
//! the ambient [`config`] and [`error`] layers each interceptor is built
//! on, and the [`commands`] module used by the `warden-engine` binary to
//! expose each interceptor as a standalone subcommand.

pub mod commands;
pub mod config;
pub mod dns;
pub mod error;
pub mod filter;
pub mod stream;
