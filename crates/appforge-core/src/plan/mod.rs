//! Planning: break a build request into a dependency-ordered task list
//!
//! - Provider-produced plans are repaired into a DAG (unknown, self and
//!   cycle-closing dependencies are dropped)
//! - Any failure or the planning timeout yields a fixed six-task plan

mod decomposer;
mod fallback;
mod task;

pub use decomposer::{parse_plan, PlanOutcome, PlanningDecomposer};
pub use fallback::fallback_plan;
pub use task::{Plan, Task, TaskCategory, TaskPriority, TaskStatus};
