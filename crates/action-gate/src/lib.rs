//! Post-step gate
//!
//! Checks the page after a step and turns a failed expectation into a hard
//! assertion failure:
//! - `UrlMatches`: the current URL matches a pattern
//! - `ListingCategory`: sampled bus listings carry the expected AC / Non-AC label

pub mod conditions;
pub mod errors;
pub mod evidence;
pub mod types;
pub mod validator;

pub use conditions::*;
pub use errors::*;
pub use evidence::*;
pub use types::*;
pub use validator::*;
