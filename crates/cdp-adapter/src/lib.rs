//! Chromium launch and page access over the DevTools protocol.
//!
//! The adapter owns exactly one browser process and one page (the browsing
//! context of a run). Higher layers talk to it through scripts evaluated in
//! the page plus a handful of native input/screenshot commands.

pub mod adapter;
pub mod config;
pub mod error;
pub mod util;

pub use adapter::CdpAdapter;
pub use config::CdpConfig;
pub use error::{AdapterError, AdapterErrorKind};
