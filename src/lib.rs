//! busflow library
//!
//! Exposes the configuration model and the CLI for integration testing

pub mod cli;
pub mod config;

pub use config::{Config, ConfigError, LoadedConfig};
