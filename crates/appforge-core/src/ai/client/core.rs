//! HTTP provider adapter
//!
//! One shared reqwest client for every provider. Each attempt is routed
//! through the format handler for the provider's API format, and every
//! failure (transport, HTTP status, unusable body) becomes a classified
//! [`AttemptOutcome`].

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use super::{AttemptRequest, ProviderAdapter};
use crate::ai::format::get_format_handler;
use crate::ai::providers::{AuthHeader, ProviderId, ProviderProfile};
use crate::ai::retry::classify;
use crate::ai::types::{AttemptOutcome, FailureKind};
use crate::constants;

/// API version header for Anthropic
const API_VERSION: &str = "2023-06-01";

/// Title reported to OpenRouter for attribution
const OPENROUTER_TITLE: &str = "AppForge";

/// Provider adapter speaking HTTPS to the real APIs
pub struct HttpAdapter {
    http: Client,
}

impl Default for HttpAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpAdapter {
    /// Create the HTTP client
    ///
    /// No overall timeout here: the dispatcher owns each attempt's deadline.
    fn create_http_client() -> Client {
        Client::builder()
            .user_agent(constants::http::USER_AGENT)
            .connect_timeout(constants::http::CONNECT_TIMEOUT)
            .build()
            .unwrap_or_else(|e| {
                error!("Failed to build HTTP client: {}. Using default client.", e);
                Client::new()
            })
    }

    pub fn new() -> Self {
        Self {
            http: Self::create_http_client(),
        }
    }

    /// Build a request with proper authentication headers
    fn build_request(
        &self,
        url: &str,
        profile: &ProviderProfile,
        api_key: &str,
    ) -> reqwest::RequestBuilder {
        let mut request = self.http.post(url);

        request = match profile.auth_header {
            AuthHeader::Bearer => request.header("authorization", format!("Bearer {}", api_key)),
            AuthHeader::XApiKey => request.header("x-api-key", api_key),
            AuthHeader::GoogApiKey => request.header("x-goog-api-key", api_key),
        };

        match profile.id {
            ProviderId::Anthropic => {
                request = request.header("anthropic-version", API_VERSION);
            }
            ProviderId::OpenRouter => {
                request = request.header("x-title", OPENROUTER_TITLE);
            }
            _ => {}
        }

        request.header("content-type", "application/json")
    }

    /// One call, start to finish
    async fn execute(&self, request: &AttemptRequest<'_>) -> AttemptOutcome {
        let profile = request.profile;
        let handler = get_format_handler(profile.api_format);
        let url = handler.endpoint_url(profile);
        let body = handler.build_request_body(request);

        debug!(
            provider = %profile.id,
            model = %profile.model_id,
            max_tokens = request.max_tokens,
            history_turns = request.history.len(),
            "Sending generation request"
        );

        let response = match self
            .build_request(&url, profile, request.api_key)
            .json(&body)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return transport_failure(e),
        };

        let status = response.status().as_u16();
        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => return transport_failure(e),
        };

        if !(200..300).contains(&status) {
            warn!(provider = %profile.id, status, "Provider returned an error status");
            let kind = classify(Some(status), &text);
            return AttemptOutcome::failure(kind, Some(status), error_message(&text));
        }

        let json: Value = match serde_json::from_str(&text) {
            Ok(json) => json,
            Err(e) => {
                return AttemptOutcome::failure(
                    FailureKind::Upstream,
                    Some(status),
                    format!("unparseable response body: {}", e),
                )
            }
        };

        // OpenRouter reports some upstream failures inside a 200 body
        if let Some((code, message)) = embedded_error(&json) {
            warn!(provider = %profile.id, ?code, "Provider embedded an error in a success body");
            return AttemptOutcome::classified(code, message);
        }

        AttemptOutcome::success(handler.extract_text(&json))
    }
}

#[async_trait]
impl ProviderAdapter for HttpAdapter {
    async fn send(&self, request: &AttemptRequest<'_>, cancel: CancellationToken) -> AttemptOutcome {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                AttemptOutcome::failure(FailureKind::Timeout, None, "request aborted")
            }
            outcome = self.execute(request) => outcome,
        }
    }
}

fn transport_failure(err: reqwest::Error) -> AttemptOutcome {
    if err.is_timeout() {
        return AttemptOutcome::failure(FailureKind::Timeout, None, err.to_string());
    }
    AttemptOutcome::classified(err.status().map(|s| s.as_u16()), err.to_string())
}

/// Human-readable message from an error body, falling back to the raw text
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|json| {
            let error = json.get("error")?;
            error
                .get("message")
                .and_then(|m| m.as_str())
                .or_else(|| error.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.trim().to_string())
}

/// `{"error": {"code": 402, "message": "..."}}` inside a success response
fn embedded_error(json: &Value) -> Option<(Option<u16>, String)> {
    let error = json.get("error").filter(|e| !e.is_null())?;
    let code = error
        .get("code")
        .and_then(|c| c.as_u64())
        .and_then(|c| u16::try_from(c).ok());
    let message = error
        .get("message")
        .and_then(|m| m.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| error.to_string());
    Some((code, message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::providers::test_profile;
    use crate::ai::types::Mode;
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::json;
    use std::time::Duration;

    /// Serve one canned response on a local port and return its URL
    async fn canned(status: StatusCode, body: Value) -> String {
        let app = Router::new().route(
            "/v1/messages",
            post(move || {
                let body = body.clone();
                async move { (status, Json(body)) }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/v1/messages", addr)
    }

    async fn send_to(url: String) -> AttemptOutcome {
        let mut profile = test_profile(ProviderId::Anthropic);
        profile.base_url = url;
        let request = AttemptRequest {
            profile: &profile,
            api_key: "sk-test",
            mode: Mode::Builder,
            system_prompt: "system",
            prompt: "todo app",
            history: &[],
            images: &[],
            max_tokens: 1000,
        };
        HttpAdapter::new()
            .send(&request, CancellationToken::new())
            .await
    }

    #[tokio::test]
    async fn test_success_extracts_text() {
        let url = canned(
            StatusCode::OK,
            json!({"content": [{"type": "text", "text": "<!DOCTYPE html><html></html>"}]}),
        )
        .await;
        let outcome = send_to(url).await;
        assert!(outcome.succeeded);
        assert_eq!(outcome.content.as_deref(), Some("<!DOCTYPE html><html></html>"));
    }

    #[tokio::test]
    async fn test_empty_success_is_empty_response() {
        let url = canned(StatusCode::OK, json!({"content": []})).await;
        let outcome = send_to(url).await;
        assert_eq!(outcome.failure_kind, Some(FailureKind::EmptyResponse));
    }

    #[tokio::test]
    async fn test_error_status_is_classified() {
        let url = canned(
            StatusCode::PAYMENT_REQUIRED,
            json!({"error": {"message": "This request requires more credits, or fewer max_tokens."}}),
        )
        .await;
        let outcome = send_to(url).await;
        assert_eq!(outcome.failure_kind, Some(FailureKind::QuotaExceeded));
        assert_eq!(outcome.http_status, Some(402));
        assert_eq!(
            outcome.diagnostic.as_deref(),
            Some("This request requires more credits, or fewer max_tokens.")
        );
    }

    #[tokio::test]
    async fn test_unauthorized_is_configuration() {
        let url = canned(
            StatusCode::UNAUTHORIZED,
            json!({"type": "error", "error": {"type": "authentication_error", "message": "invalid x-api-key"}}),
        )
        .await;
        let outcome = send_to(url).await;
        assert_eq!(outcome.failure_kind, Some(FailureKind::Configuration));
    }

    #[tokio::test]
    async fn test_embedded_error_in_success_body() {
        let url = canned(
            StatusCode::OK,
            json!({"error": {"code": 402, "message": "Insufficient credits"}}),
        )
        .await;
        let outcome = send_to(url).await;
        assert_eq!(outcome.failure_kind, Some(FailureKind::QuotaExceeded));
    }

    #[tokio::test]
    async fn test_cancelled_attempt_is_timeout() {
        let app = Router::new().route(
            "/v1/messages",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Json(json!({}))
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let mut profile = test_profile(ProviderId::Anthropic);
        profile.base_url = format!("http://{}/v1/messages", addr);
        let request = AttemptRequest {
            profile: &profile,
            api_key: "sk-test",
            mode: Mode::Builder,
            system_prompt: "",
            prompt: "slow",
            history: &[],
            images: &[],
            max_tokens: 10,
        };
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let outcome = HttpAdapter::new().send(&request, cancel).await;
        assert_eq!(outcome.failure_kind, Some(FailureKind::Timeout));
    }

    #[test]
    fn test_error_message_fallbacks() {
        assert_eq!(error_message(r#"{"error":{"message":"bad"}}"#), "bad");
        assert_eq!(error_message(r#"{"error":"plain"}"#), "plain");
        assert_eq!(error_message("  Bad Gateway  "), "Bad Gateway");
    }
}
