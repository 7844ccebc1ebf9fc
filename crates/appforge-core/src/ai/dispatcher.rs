//! Request dispatcher
//!
//! Drives one generation request through the retry/degradation state machine:
//! resolves the provider profile, sizes each attempt's output budget and
//! history window, enforces the per-attempt deadline, and turns the terminal
//! state into exactly one [`GenerationResult`].

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::ai::client::{AttemptRequest, ProviderAdapter};
use crate::ai::prompts::system_instruction;
use crate::ai::providers::{ProviderProfile, ProviderRegistry};
use crate::ai::retry::{DispatchState, RetryPolicy};
use crate::ai::types::{AttemptOutcome, AttemptRecord, GenerationRequest, GenerationResult};

/// Per-call knobs layered over the provider profile
#[derive(Debug, Clone, Default)]
pub struct DispatchOptions {
    /// Tighter per-attempt deadline; the effective one is `min(profile, this)`
    pub attempt_timeout: Option<Duration>,
    /// Replaces the per-mode system instruction
    pub system_prompt: Option<String>,
}

impl DispatchOptions {
    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = Some(timeout);
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }
}

/// Terminal result plus the attempt log that produced it
#[derive(Debug, Clone)]
pub struct DispatchReport {
    pub result: GenerationResult,
    pub attempts: Vec<AttemptRecord>,
}

impl DispatchReport {
    /// Budget fraction of the last upstream call, if any was made
    pub fn final_budget_fraction(&self) -> Option<f32> {
        self.attempts.last().map(|a| a.budget_fraction)
    }
}

/// Generic dispatcher shared by every request; holds no per-request state
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<ProviderRegistry>,
    adapter: Arc<dyn ProviderAdapter>,
}

impl Dispatcher {
    pub fn new(registry: Arc<ProviderRegistry>, adapter: Arc<dyn ProviderAdapter>) -> Self {
        Self { registry, adapter }
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Dispatch with default options and return only the result
    pub async fn generate(&self, request: &GenerationRequest) -> GenerationResult {
        self.dispatch(request, DispatchOptions::default()).await.result
    }

    /// Run a request to its terminal state
    pub async fn dispatch(
        &self,
        request: &GenerationRequest,
        options: DispatchOptions,
    ) -> DispatchReport {
        let profile = match self.registry.profile_for(&request.provider) {
            Ok(profile) => profile,
            Err(e) => {
                warn!(provider = %request.provider, error = %e, "Request rejected before dispatch");
                let diagnostic = e.to_string();
                return DispatchReport {
                    result: GenerationResult::failure(e.failure_kind(), None, Some(&diagnostic)),
                    attempts: Vec::new(),
                };
            }
        };
        // profile_for only succeeds for providers with a key
        let api_key = self.registry.api_key(profile.id).unwrap_or_default();

        let images: &[String] = if profile.supports_images || request.images.is_empty() {
            &request.images
        } else {
            warn!(
                provider = %profile.id,
                dropped = request.images.len(),
                "Provider does not accept images; dropping them"
            );
            &[]
        };

        let system_prompt = options
            .system_prompt
            .clone()
            .unwrap_or_else(|| system_instruction(request.mode, request.framework_hint));
        let deadline = effective_deadline(profile, options.attempt_timeout);

        let mut policy = RetryPolicy::new();
        let mut plan = policy.initial_plan();
        let mut attempts: Vec<AttemptRecord> = Vec::new();

        loop {
            let history = plan.history.apply(&request.history);
            let max_tokens = profile.budget_tokens(request.mode, plan.budget_fraction);
            let attempt = AttemptRequest {
                profile,
                api_key,
                mode: request.mode,
                system_prompt: &system_prompt,
                prompt: &request.prompt,
                history,
                images,
                max_tokens,
            };

            info!(
                provider = %profile.id,
                attempt = attempts.len() + 1,
                budget_fraction = plan.budget_fraction,
                max_tokens,
                history_turns = history.len(),
                "Dispatching attempt"
            );

            let started = Instant::now();
            let outcome = self.run_attempt(&attempt, deadline).await;
            let next = policy.record(&outcome);
            let record = AttemptRecord {
                outcome,
                budget_fraction: plan.budget_fraction,
                max_tokens,
                history_turns: history.len(),
                elapsed: started.elapsed(),
            };

            let result = match next {
                DispatchState::Attempting(next_plan) => {
                    warn!(
                        provider = %profile.id,
                        kind = ?record.outcome.failure_kind,
                        budget_fraction = next_plan.budget_fraction,
                        "Attempt failed; retrying"
                    );
                    attempts.push(record);
                    plan = next_plan;
                    continue;
                }
                DispatchState::Succeeded => GenerationResult::success(
                    record.outcome.content.clone().unwrap_or_default(),
                ),
                DispatchState::Failed(kind) => GenerationResult::from_outcome(kind, &record.outcome),
            };
            attempts.push(record);
            return finish(profile, result, attempts);
        }
    }

    /// One upstream call under a deadline; expiry cancels the call
    async fn run_attempt(&self, attempt: &AttemptRequest<'_>, deadline: Duration) -> AttemptOutcome {
        let cancel = CancellationToken::new();
        match tokio::time::timeout(deadline, self.adapter.send(attempt, cancel.clone())).await {
            Ok(outcome) => outcome,
            Err(_) => {
                cancel.cancel();
                AttemptOutcome::timed_out(deadline)
            }
        }
    }
}

fn finish(
    profile: &ProviderProfile,
    result: GenerationResult,
    attempts: Vec<AttemptRecord>,
) -> DispatchReport {
    match result.failure_kind() {
        None => info!(
            provider = %profile.id,
            attempts = attempts.len(),
            "Request succeeded"
        ),
        Some(kind) => warn!(
            provider = %profile.id,
            attempts = attempts.len(),
            %kind,
            "Request failed"
        ),
    }
    DispatchReport { result, attempts }
}

fn effective_deadline(profile: &ProviderProfile, cap: Option<Duration>) -> Duration {
    match cap {
        Some(cap) => cap.min(profile.timeout),
        None => profile.timeout,
    }
}
