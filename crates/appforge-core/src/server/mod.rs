//! HTTP surface: generation, planning, health and provider listing

mod dto;
mod handlers;

use std::sync::Arc;

use anyhow::Context;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

pub use dto::{ErrorBody, GenerateResponse, HealthResponse, PlanFailureBody, PlanRequest};

use crate::ai::{Dispatcher, HttpAdapter, ProviderAdapter, ProviderRegistry};
use crate::config::GatewayConfig;
use crate::constants::http::MAX_BODY_BYTES;
use crate::plan::PlanningDecomposer;

/// Shared handler state. Cloned per request; everything inside is read-only.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Dispatcher,
    pub decomposer: PlanningDecomposer,
}

impl AppState {
    pub fn new(dispatcher: Dispatcher, decomposer: PlanningDecomposer) -> Self {
        Self {
            dispatcher,
            decomposer,
        }
    }

    /// Wire the registry, HTTP adapter and planner from startup config
    pub fn from_config(config: &GatewayConfig) -> Self {
        let registry = Arc::new(ProviderRegistry::from_config(config));
        let adapter: Arc<dyn ProviderAdapter> = Arc::new(HttpAdapter::new());
        let dispatcher = Dispatcher::new(registry, adapter);
        let decomposer = PlanningDecomposer::new(dispatcher.clone(), config.planning_timeout);
        Self::new(dispatcher, decomposer)
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/generate", post(handlers::generate))
        .route("/api/plan", post(handlers::plan))
        .route("/api/health", get(handlers::health))
        .route("/api/providers", get(handlers::providers))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until the process is stopped
pub async fn serve(state: AppState, bind: &str) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("failed to bind {}", bind))?;
    info!("AppForge gateway listening on {}", listener.local_addr()?);
    axum::serve(listener, router(state))
        .await
        .context("server error")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::client::AttemptRequest;
    use crate::ai::providers::{test_profile, ProviderId};
    use crate::ai::types::AttemptOutcome;
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;
    use tower::ServiceExt;

    #[derive(Clone, Copy)]
    enum Behavior {
        Reply(&'static str),
        Quota,
        Hang,
        Panic,
    }

    struct StubAdapter(Behavior);

    #[async_trait]
    impl ProviderAdapter for StubAdapter {
        async fn send(&self, _: &AttemptRequest<'_>, _: CancellationToken) -> AttemptOutcome {
            match self.0 {
                Behavior::Reply(text) => AttemptOutcome::success(text),
                Behavior::Quota => AttemptOutcome::classified(Some(402), "insufficient credits"),
                Behavior::Hang => std::future::pending().await,
                Behavior::Panic => panic!("adapter blew up"),
            }
        }
    }

    fn app(behavior: Behavior) -> Router {
        let mut registry = ProviderRegistry::default();
        registry.insert(test_profile(ProviderId::Anthropic), Some("sk".to_string()));
        registry.insert(test_profile(ProviderId::OpenAI), None);
        let dispatcher = Dispatcher::new(Arc::new(registry), Arc::new(StubAdapter(behavior)));
        let decomposer = PlanningDecomposer::new(dispatcher.clone(), Duration::from_secs(15));
        router(AppState::new(dispatcher, decomposer))
    }

    async fn call(app: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = call(app(Behavior::Hang), "GET", "/api/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert!(body["version"].is_string());
    }

    #[tokio::test]
    async fn test_providers_lists_configuration_state() {
        let (status, body) = call(app(Behavior::Hang), "GET", "/api/providers", None).await;
        assert_eq!(status, StatusCode::OK);
        let providers = body.as_array().unwrap();
        assert_eq!(providers.len(), 2);
        let openai = providers.iter().find(|p| p["id"] == "openai").unwrap();
        assert_eq!(openai["configured"], false);
        let anthropic = providers.iter().find(|p| p["id"] == "anthropic").unwrap();
        assert_eq!(anthropic["configured"], true);
        assert_eq!(anthropic["timeoutMs"], test_profile(ProviderId::Anthropic).timeout_millis());
    }

    #[tokio::test]
    async fn test_generate_success() {
        let (status, body) = call(
            app(Behavior::Reply("<html>hi</html>")),
            "POST",
            "/api/generate",
            Some(json!({"prompt": "landing page", "provider": "anthropic"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["content"], "<html>hi</html>");
    }

    #[tokio::test]
    async fn test_generate_quota_exhausted() {
        let (status, body) = call(
            app(Behavior::Quota),
            "POST",
            "/api/generate",
            Some(json!({"prompt": "landing page", "provider": "anthropic"})),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["kind"], "quota_exceeded");
        assert!(body["detail"].as_str().unwrap().contains("insufficient credits"));
    }

    #[tokio::test]
    async fn test_generate_rejects_empty_prompt() {
        let (status, body) = call(
            app(Behavior::Reply("x")),
            "POST",
            "/api/generate",
            Some(json!({"prompt": "   ", "provider": "anthropic"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid request");
    }

    #[tokio::test]
    async fn test_generate_rejects_malformed_body() {
        let (status, _) = call(
            app(Behavior::Reply("x")),
            "POST",
            "/api/generate",
            Some(json!({"provider": "anthropic"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_generate_unknown_provider() {
        let (status, body) = call(
            app(Behavior::Reply("x")),
            "POST",
            "/api/generate",
            Some(json!({"prompt": "app", "provider": "nope"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "unknown_provider");
    }

    #[tokio::test]
    async fn test_generate_unconfigured_provider() {
        let (status, body) = call(
            app(Behavior::Reply("x")),
            "POST",
            "/api/generate",
            Some(json!({"prompt": "app", "provider": "openai"})),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["kind"], "configuration");
    }

    #[tokio::test]
    async fn test_generate_panic_is_contained() {
        let app = app(Behavior::Panic);
        let (status, body) = call(
            app.clone(),
            "POST",
            "/api/generate",
            Some(json!({"prompt": "app", "provider": "anthropic"})),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Internal server error");

        let (status, _) = call(app, "GET", "/api/health", None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_plan_uses_provider_answer() {
        let reply = r#"{"tasks": [
            {"id": "a", "title": "Scaffold", "category": "setup", "estimatedMinutes": 10},
            {"id": "b", "title": "Build UI", "category": "component", "estimatedMinutes": 20, "dependencies": ["a"]}
        ]}"#;
        let (status, body) = call(
            app(Behavior::Reply(reply)),
            "POST",
            "/api/plan",
            Some(json!({"prompt": "todo app", "provider": "anthropic"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["tasks"].as_array().unwrap().len(), 2);
        assert_eq!(body["estimatedTotalTime"], 30);
        assert_eq!(body["tasks"][1]["dependencies"], json!(["a"]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_plan_timeout_falls_back() {
        let (status, body) = call(
            app(Behavior::Hang),
            "POST",
            "/api/plan",
            Some(json!({"prompt": "todo app", "provider": "anthropic"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["tasks"].as_array().unwrap().len(), 6);
        assert_eq!(body["estimatedTotalTime"], 30);
    }

    #[tokio::test]
    async fn test_plan_panic_returns_empty_plan_body() {
        let (status, body) = call(
            app(Behavior::Panic),
            "POST",
            "/api/plan",
            Some(json!({"prompt": "todo app", "provider": "anthropic"})),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["prompt"], "todo app");
        assert_eq!(body["tasks"], json!([]));
        assert_eq!(body["estimatedTotalTime"], 0);
    }

    #[tokio::test]
    async fn test_body_limit() {
        let huge = "x".repeat(MAX_BODY_BYTES + 1);
        let (status, _) = call(
            app(Behavior::Reply("x")),
            "POST",
            "/api/generate",
            Some(json!({"prompt": huge, "provider": "anthropic"})),
        )
        .await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    }
}
