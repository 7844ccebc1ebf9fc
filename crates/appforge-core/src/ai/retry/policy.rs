//! Retry/degradation state machine
//!
//! One request moves through `Attempting(budget, history)` states until it
//! reaches `Succeeded` or `Failed(kind)`. A request commits to at most one
//! retry axis for its whole lifetime:
//!
//! - timeout on the first attempt: one retry at full budget with the last two turns
//! - prompt too long: one retry at half budget with the last two turns
//! - quota exhaustion (or an empty answer): walk the budget ladder, same history
//!
//! Failures that belong to a different axis than the active one are terminal.

use crate::ai::types::{AttemptOutcome, FailureKind, HistoryWindow};
use crate::constants::gateway::{BUDGET_LADDER, PROMPT_TOO_LARGE_FRACTION, REDUCED_HISTORY_TURNS};

/// Parameters for the next upstream call
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttemptPlan {
    /// Share of the provider's per-mode output ceiling
    pub budget_fraction: f32,
    pub history: HistoryWindow,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DispatchState {
    Attempting(AttemptPlan),
    Succeeded,
    Failed(FailureKind),
}

impl DispatchState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, DispatchState::Attempting(_))
    }
}

/// The retry strategy a request has committed to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryAxis {
    Timeout,
    PromptLength,
    Budget,
}

/// Per-request policy; never shared between requests
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    state: DispatchState,
    axis: Option<RetryAxis>,
    ladder_step: usize,
    attempts: usize,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl RetryPolicy {
    pub fn new() -> Self {
        Self {
            state: DispatchState::Attempting(AttemptPlan {
                budget_fraction: BUDGET_LADDER[0],
                history: HistoryWindow::Full,
            }),
            axis: None,
            ladder_step: 0,
            attempts: 0,
        }
    }

    pub fn state(&self) -> DispatchState {
        self.state
    }

    pub fn axis(&self) -> Option<RetryAxis> {
        self.axis
    }

    /// Attempts recorded so far
    pub fn attempts(&self) -> usize {
        self.attempts
    }

    /// Plan for the first attempt
    pub fn initial_plan(&self) -> AttemptPlan {
        AttemptPlan {
            budget_fraction: BUDGET_LADDER[0],
            history: HistoryWindow::Full,
        }
    }

    /// Feed one attempt's outcome and get the next state
    ///
    /// Recording after a terminal state leaves it unchanged.
    pub fn record(&mut self, outcome: &AttemptOutcome) -> DispatchState {
        let DispatchState::Attempting(current) = self.state else {
            return self.state;
        };
        self.attempts += 1;

        self.state = if outcome.succeeded {
            DispatchState::Succeeded
        } else {
            let kind = outcome.failure_kind.unwrap_or(FailureKind::Upstream);
            self.on_failure(kind, current)
        };
        self.state
    }

    fn on_failure(&mut self, kind: FailureKind, current: AttemptPlan) -> DispatchState {
        let reduced = HistoryWindow::Last(REDUCED_HISTORY_TURNS);

        match (kind, self.axis) {
            (FailureKind::Timeout, None) => {
                self.axis = Some(RetryAxis::Timeout);
                DispatchState::Attempting(AttemptPlan {
                    budget_fraction: BUDGET_LADDER[0],
                    history: reduced,
                })
            }
            (FailureKind::PromptTooLarge, None) => {
                self.axis = Some(RetryAxis::PromptLength);
                DispatchState::Attempting(AttemptPlan {
                    budget_fraction: PROMPT_TOO_LARGE_FRACTION,
                    history: reduced,
                })
            }
            (
                FailureKind::QuotaExceeded | FailureKind::EmptyResponse,
                None | Some(RetryAxis::Budget),
            ) => {
                self.axis = Some(RetryAxis::Budget);
                self.ladder_step += 1;
                match BUDGET_LADDER.get(self.ladder_step) {
                    Some(&fraction) => DispatchState::Attempting(AttemptPlan {
                        budget_fraction: fraction,
                        history: current.history,
                    }),
                    None => DispatchState::Failed(kind),
                }
            }
            // Configuration, Upstream, or a second axis: stop here
            (kind, _) => DispatchState::Failed(kind),
        }
    }
}
