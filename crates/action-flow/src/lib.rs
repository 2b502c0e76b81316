//! Flow orchestration
//!
//! A flow is a sequence of steps run against one browsing context. Each
//! step either succeeds, is skipped because nothing matched, or fails; a
//! failure aborts the run or is logged and passed over depending on the
//! step's strategy. Assertion failures always abort.

pub mod errors;
pub mod executor;
pub mod pacing;
pub mod scenarios;
pub mod strategies;
pub mod types;

pub use errors::FlowError;
pub use executor::{DefaultFlowExecutor, FlowExecutor};
pub use pacing::{Pacing, PacingProfile};
pub use scenarios::{build_flow, Booking, Passenger, Variant, MAX_DAYS_AHEAD};
pub use strategies::{DefaultFailureHandler, FailureHandler, FailureHandlerResult};
pub use types::{
    ActionType, FailureStrategy, Flow, FlowNode, FlowResult, StepOutcome, StepResult,
};
