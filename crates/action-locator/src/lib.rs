//! Resilient element location
//!
//! Given an ordered list of candidate anchors, try each against the live page
//! with a bounded wait, skip candidates that error out or resolve to nothing
//! usable, and commit to the first match that is visible and passes the
//! exclusion filters. An exhausted list is reported through
//! [`Resolution`], never raised.

pub mod errors;
pub mod filters;
pub mod resolver;
pub mod types;

pub use errors::*;
pub use filters::*;
pub use resolver::*;
pub use types::*;
