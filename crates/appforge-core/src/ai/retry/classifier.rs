//! Failure classification
//!
//! Providers return free-text diagnostics rather than structured error codes,
//! so classification is a pattern table over the diagnostic text combined with
//! a handful of well-known status codes. Wording changes upstream can move a
//! failure into `Upstream`; extend the table rather than adding checks elsewhere.

use crate::ai::types::FailureKind;

/// Statuses that always mean the credential is missing or rejected
pub const CONFIGURATION_STATUS_CODES: &[u16] = &[
    401, // Unauthorized
    403, // Forbidden
];

/// Case-insensitive substring -> kind, first match wins.
///
/// Context-length phrases come before quota phrases because some providers
/// mention `max_tokens` in both.
pub const DIAGNOSTIC_PATTERNS: &[(&str, FailureKind)] = &[
    // Context length
    ("prompt is too long", FailureKind::PromptTooLarge),
    ("context_length_exceeded", FailureKind::PromptTooLarge),
    ("maximum context length", FailureKind::PromptTooLarge),
    ("context window", FailureKind::PromptTooLarge),
    ("input is too long", FailureKind::PromptTooLarge),
    ("too many input tokens", FailureKind::PromptTooLarge),
    ("request too large", FailureKind::PromptTooLarge),
    ("exceeds the maximum number of tokens", FailureKind::PromptTooLarge),
    // Credits / quota
    ("insufficient_quota", FailureKind::QuotaExceeded),
    ("insufficient credits", FailureKind::QuotaExceeded),
    ("insufficient balance", FailureKind::QuotaExceeded),
    ("credit balance is too low", FailureKind::QuotaExceeded),
    ("requires more credits", FailureKind::QuotaExceeded),
    ("can only afford", FailureKind::QuotaExceeded),
    ("exceeded your current quota", FailureKind::QuotaExceeded),
    ("resource_exhausted", FailureKind::QuotaExceeded),
    ("quota", FailureKind::QuotaExceeded),
    // Credentials
    ("invalid x-api-key", FailureKind::Configuration),
    ("invalid api key", FailureKind::Configuration),
    ("incorrect api key", FailureKind::Configuration),
    ("api key not valid", FailureKind::Configuration),
    ("missing api key", FailureKind::Configuration),
    ("api key is missing", FailureKind::Configuration),
    ("no api key", FailureKind::Configuration),
    ("authentication_error", FailureKind::Configuration),
    ("permission_denied", FailureKind::Configuration),
    // Abort / timeout
    ("timed out", FailureKind::Timeout),
    ("timeout", FailureKind::Timeout),
    ("deadline exceeded", FailureKind::Timeout),
    ("aborted", FailureKind::Timeout),
];

/// Fallbacks applied when no text pattern matched
const STATUS_FALLBACKS: &[(u16, FailureKind)] = &[
    (402, FailureKind::QuotaExceeded),
    (408, FailureKind::Timeout),
    (413, FailureKind::PromptTooLarge),
    (504, FailureKind::Timeout),
];

/// Assign a failure kind to a failed attempt
///
/// `http_status` is `None` for client-side failures (connection reset, abort).
pub fn classify(http_status: Option<u16>, diagnostic: &str) -> FailureKind {
    if let Some(status) = http_status {
        if CONFIGURATION_STATUS_CODES.contains(&status) {
            return FailureKind::Configuration;
        }
    }

    let lowered = diagnostic.to_lowercase();
    if let Some((_, kind)) = DIAGNOSTIC_PATTERNS
        .iter()
        .find(|(pattern, _)| lowered.contains(pattern))
    {
        return *kind;
    }

    http_status
        .and_then(|status| {
            STATUS_FALLBACKS
                .iter()
                .find(|(code, _)| *code == status)
                .map(|(_, kind)| *kind)
        })
        .unwrap_or(FailureKind::Upstream)
}
