//! Error definitions and conversions for the config, DNS and stream layers.
pub mod config;
pub mod dns;
pub mod stream;
