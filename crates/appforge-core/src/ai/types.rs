//! Gateway request/response types
//!
//! Shared by the dispatcher, the provider adapters and the HTTP surface.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::error::GatewayError;

/// Longest upstream diagnostic carried into an error payload
const MAX_DIAGNOSTIC_CHARS: usize = 500;

/// Conversation role of a history turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One prior conversation turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryTurn {
    pub role: Role,
    pub text: String,
}

impl HistoryTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
        }
    }
}

/// Generation mode; selects the output ceiling and system instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Produce a runnable document or project
    #[default]
    Builder,
    /// Explain and teach, shorter answers
    Tutor,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Builder => write!(f, "builder"),
            Mode::Tutor => write!(f, "tutor"),
        }
    }
}

impl std::str::FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "builder" | "build" => Ok(Mode::Builder),
            "tutor" | "teach" => Ok(Mode::Tutor),
            _ => Err(format!("Unknown mode: {}", s)),
        }
    }
}

/// Target framework the caller would like the output written for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameworkHint {
    Html,
    React,
    Nextjs,
    Vue,
    Svelte,
}

impl FrameworkHint {
    /// Human-readable framework name used in the system instruction
    pub fn label(&self) -> &'static str {
        match self {
            FrameworkHint::Html => "plain HTML, CSS and JavaScript",
            FrameworkHint::React => "React",
            FrameworkHint::Nextjs => "Next.js (app router)",
            FrameworkHint::Vue => "Vue 3",
            FrameworkHint::Svelte => "Svelte",
        }
    }
}

impl std::str::FromStr for FrameworkHint {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "html" | "vanilla" => Ok(FrameworkHint::Html),
            "react" => Ok(FrameworkHint::React),
            "nextjs" | "next" | "next.js" => Ok(FrameworkHint::Nextjs),
            "vue" => Ok(FrameworkHint::Vue),
            "svelte" => Ok(FrameworkHint::Svelte),
            _ => Err(format!("Unknown framework: {}", s)),
        }
    }
}

/// Which part of the history an attempt sends upstream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryWindow {
    /// Every prior turn
    Full,
    /// Only the most recent N turns
    Last(usize),
}

impl HistoryWindow {
    /// Slice the chronological history down to this window (oldest first is kept)
    pub fn apply<'a>(&self, history: &'a [HistoryTurn]) -> &'a [HistoryTurn] {
        match self {
            HistoryWindow::Full => history,
            HistoryWindow::Last(n) => &history[history.len().saturating_sub(*n)..],
        }
    }
}

/// One logical generation request as submitted by a caller
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub prompt: String,
    #[serde(default)]
    pub history: Vec<HistoryTurn>,
    #[serde(default)]
    pub mode: Mode,
    pub provider: String,
    /// Encoded image references (`data:` URLs or raw base64 PNG)
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub framework_hint: Option<FrameworkHint>,
}

impl GenerationRequest {
    pub fn new(provider: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            history: Vec::new(),
            mode: Mode::Builder,
            provider: provider.into(),
            images: Vec::new(),
            framework_hint: None,
        }
    }

    pub fn with_history(mut self, history: Vec<HistoryTurn>) -> Self {
        self.history = history;
        self
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    /// Reject requests the gateway must never forward
    pub fn validate(&self) -> Result<(), GatewayError> {
        if self.prompt.trim().is_empty() {
            return Err(GatewayError::InvalidRequest(
                "prompt must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Closed failure taxonomy surfaced by the gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Timeout,
    PromptTooLarge,
    QuotaExceeded,
    Configuration,
    EmptyResponse,
    Upstream,
    UnknownProvider,
}

impl FailureKind {
    /// HTTP status the generation endpoint answers with for this kind
    ///
    /// `Upstream` passes through the provider's own error status when it has one.
    pub fn http_status(&self, upstream_status: Option<u16>) -> u16 {
        match self {
            FailureKind::Timeout => 504,
            FailureKind::UnknownProvider => 400,
            FailureKind::Upstream => upstream_status
                .filter(|s| (400..=599).contains(s))
                .unwrap_or(500),
            FailureKind::Configuration
            | FailureKind::PromptTooLarge
            | FailureKind::QuotaExceeded
            | FailureKind::EmptyResponse => 500,
        }
    }

    /// Short error message for the `error` field
    pub fn message(&self) -> &'static str {
        match self {
            FailureKind::Timeout => "The AI provider took too long to respond",
            FailureKind::PromptTooLarge => "The request is too large for the selected model",
            FailureKind::QuotaExceeded => "The AI provider has insufficient quota for this request",
            FailureKind::Configuration => "The AI provider is not configured correctly",
            FailureKind::EmptyResponse => "The AI provider returned an empty response",
            FailureKind::Upstream => "The AI provider returned an error",
            FailureKind::UnknownProvider => "Unknown AI provider",
        }
    }

    /// What the caller can do about it
    pub fn guidance(&self) -> &'static str {
        match self {
            FailureKind::Configuration => {
                "Check that the provider's API key is set and valid, then restart the server."
            }
            FailureKind::PromptTooLarge => {
                "Shorten the prompt or start a new conversation with less history."
            }
            FailureKind::QuotaExceeded => {
                "Add credits to the provider account, choose another provider, or try again later."
            }
            FailureKind::Timeout => "The provider may be overloaded. Retry in a moment.",
            FailureKind::EmptyResponse => "Retry the request, or rephrase the prompt.",
            FailureKind::Upstream => "The provider reported a transient error. Retry later.",
            FailureKind::UnknownProvider => "Pick one of the providers listed by /api/providers.",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::PromptTooLarge => write!(f, "prompt_too_large"),
            FailureKind::QuotaExceeded => write!(f, "quota_exceeded"),
            FailureKind::Configuration => write!(f, "configuration"),
            FailureKind::EmptyResponse => write!(f, "empty_response"),
            FailureKind::Upstream => write!(f, "upstream"),
            FailureKind::UnknownProvider => write!(f, "unknown_provider"),
        }
    }
}

/// Result of one upstream call; never mutated after creation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptOutcome {
    pub succeeded: bool,
    pub content: Option<String>,
    pub failure_kind: Option<FailureKind>,
    pub http_status: Option<u16>,
    pub diagnostic: Option<String>,
}

impl AttemptOutcome {
    /// A call that returned text. Empty text is reclassified as `EmptyResponse`.
    pub fn success(content: impl Into<String>) -> Self {
        let content = content.into();
        if content.trim().is_empty() {
            return Self::failure(
                FailureKind::EmptyResponse,
                Some(200),
                "provider reported success with empty content",
            );
        }
        Self {
            succeeded: true,
            content: Some(content),
            failure_kind: None,
            http_status: Some(200),
            diagnostic: None,
        }
    }

    pub fn failure(
        kind: FailureKind,
        http_status: Option<u16>,
        diagnostic: impl Into<String>,
    ) -> Self {
        Self {
            succeeded: false,
            content: None,
            failure_kind: Some(kind),
            http_status,
            diagnostic: Some(diagnostic.into()),
        }
    }

    /// A failure whose kind is inferred from status and diagnostic text
    pub fn classified(http_status: Option<u16>, diagnostic: impl Into<String>) -> Self {
        let diagnostic = diagnostic.into();
        let kind = crate::ai::retry::classify(http_status, &diagnostic);
        Self::failure(kind, http_status, diagnostic)
    }

    /// The dispatcher's deadline expired before the provider answered
    pub fn timed_out(after: Duration) -> Self {
        Self::failure(
            FailureKind::Timeout,
            None,
            format!("attempt aborted after {} ms", after.as_millis()),
        )
    }
}

/// Attempt log entry: an outcome plus the parameters it was produced with
#[derive(Debug, Clone)]
pub struct AttemptRecord {
    pub outcome: AttemptOutcome,
    pub budget_fraction: f32,
    pub max_tokens: u32,
    pub history_turns: usize,
    pub elapsed: Duration,
}

/// Structured failure handed to callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPayload {
    pub error: String,
    pub detail: String,
    pub kind: FailureKind,
    pub status: u16,
}

/// Terminal outcome of one generation request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResult {
    pub success: bool,
    pub content: Option<String>,
    pub error_payload: Option<ErrorPayload>,
}

impl GenerationResult {
    pub fn success(content: impl Into<String>) -> Self {
        Self {
            success: true,
            content: Some(content.into()),
            error_payload: None,
        }
    }

    pub fn failure(kind: FailureKind, upstream_status: Option<u16>, diagnostic: Option<&str>) -> Self {
        let detail = match diagnostic.map(str::trim).filter(|d| !d.is_empty()) {
            Some(diag) => {
                let clipped: String = diag.chars().take(MAX_DIAGNOSTIC_CHARS).collect();
                format!("{} Provider said: {}", kind.guidance(), clipped)
            }
            None => kind.guidance().to_string(),
        };
        Self {
            success: false,
            content: None,
            error_payload: Some(ErrorPayload {
                error: kind.message().to_string(),
                detail,
                kind,
                status: kind.http_status(upstream_status),
            }),
        }
    }

    /// Terminal failure derived from the last attempt of a request
    pub fn from_outcome(kind: FailureKind, outcome: &AttemptOutcome) -> Self {
        Self::failure(kind, outcome.http_status, outcome.diagnostic.as_deref())
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        self.error_payload.as_ref().map(|p| p.kind)
    }

    /// HTTP status for the generation endpoint
    pub fn http_status(&self) -> u16 {
        self.error_payload.as_ref().map(|p| p.status).unwrap_or(200)
    }
}
