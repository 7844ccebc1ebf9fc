//! Retry policy and failure classification for upstream attempts

mod classifier;
mod policy;

pub use classifier::{classify, CONFIGURATION_STATUS_CODES, DIAGNOSTIC_PATTERNS};
pub use policy::{AttemptPlan, DispatchState, RetryAxis, RetryPolicy};
