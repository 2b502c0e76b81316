//! Shared intent table: candidate lists keyed by what a step is looking for.

pub mod builtin;
pub mod errors;
pub mod intent;
pub mod table;

pub use errors::RecipeError;
pub use intent::Intent;
pub use table::{IntentTable, Recipe};
