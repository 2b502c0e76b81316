//! Page-level building blocks for busflow.
//!
//! This crate provides:
//! - anchor descriptors (css, text, attribute, role, nested) and element references
//! - the [`BrowserPort`] seam every higher layer drives the page through
//! - [`CdpBrowserPort`], the Chromium implementation backed by `cdp-adapter`
//! - built-in waiting tiers and the action error taxonomy
//! - an in-memory page (feature `mock`) for exercising locators without a browser

pub mod cdp;
pub mod errors;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod port;
mod scripts;
pub mod types;
pub mod waiting;

pub use cdp::CdpBrowserPort;
pub use errors::*;
pub use port::BrowserPort;
pub use types::*;
pub use waiting::*;
