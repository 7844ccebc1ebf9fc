//! AppForge Core - gateway between an app-builder front end and hosted AI models
//!
//! - Provider registry and per-provider wire formats
//! - Dispatcher with a bounded retry and degradation policy
//! - Failure classification into a closed taxonomy
//! - Normalization of model output into single or multi-file artifacts
//! - Planning decomposer with a deterministic fallback plan
//! - HTTP surface (axum)

pub mod ai;
pub mod artifact;
pub mod config;
pub mod constants;
pub mod error;
pub mod extract;
pub mod plan;
pub mod server;

// Re-exports for convenience
pub use ai::types::{FailureKind, GenerationRequest, GenerationResult, HistoryTurn, Mode, Role};
pub use ai::{Dispatcher, ProviderId, ProviderRegistry};
pub use artifact::{normalize, Artifact, ProjectFile};
pub use config::GatewayConfig;
pub use error::{GatewayError, Result};
pub use plan::{Plan, PlanningDecomposer, Task};
pub use server::AppState;
