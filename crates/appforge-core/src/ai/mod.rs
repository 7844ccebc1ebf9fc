//! AI provider layer
//!
//! Generation gateway for Anthropic, OpenAI, Gemini, DeepSeek and OpenRouter.
//! Supports three API formats: Anthropic, OpenAI, and Google.

pub mod client;
pub mod dispatcher;
pub mod format;
pub mod prompts;
pub mod providers;
pub mod retry;
pub mod types;


pub use client::{AttemptRequest, HttpAdapter, ProviderAdapter};
pub use dispatcher::{DispatchOptions, DispatchReport, Dispatcher};
pub use providers::{ProviderId, ProviderProfile, ProviderRegistry};
