//! Provider client layer
//!
//! The dispatcher talks to providers through [`ProviderAdapter`]. The HTTP
//! implementation routes each attempt through the format handler matching the
//! provider's API format:
//! - Anthropic Messages
//! - OpenAI chat/completions (OpenAI, DeepSeek, OpenRouter)
//! - Google generateContent

pub mod core;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::ai::providers::ProviderProfile;
use crate::ai::types::{AttemptOutcome, HistoryTurn, Mode};

pub use core::HttpAdapter;

/// Everything one upstream call needs, already windowed and budgeted
#[derive(Debug, Clone)]
pub struct AttemptRequest<'a> {
    pub profile: &'a ProviderProfile,
    pub api_key: &'a str,
    pub mode: Mode,
    pub system_prompt: &'a str,
    pub prompt: &'a str,
    pub history: &'a [HistoryTurn],
    /// Only populated when the provider accepts images
    pub images: &'a [String],
    pub max_tokens: u32,
}

/// Performs exactly one upstream call
///
/// Implementations never retry and never raise: every failure comes back as
/// an [`AttemptOutcome`]. The token is cancelled when the dispatcher's
/// deadline for this attempt expires.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    async fn send(&self, request: &AttemptRequest<'_>, cancel: CancellationToken) -> AttemptOutcome;
}
