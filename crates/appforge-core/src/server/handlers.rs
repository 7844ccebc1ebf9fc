//! Route handlers
//!
//! Generation and planning run in their own task so a fault inside one
//! request surfaces as a 500 for that request only.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::{error, info};

use super::dto::{ErrorBody, GenerateResponse, HealthResponse, PlanFailureBody, PlanRequest};
use super::AppState;
use crate::ai::providers::ProviderSummary;
use crate::ai::types::GenerationRequest;

const INTERNAL_ERROR: &str = "Internal server error";

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

pub async fn providers(State(state): State<AppState>) -> Json<Vec<ProviderSummary>> {
    Json(state.dispatcher.registry().providers())
}

pub async fn generate(
    State(state): State<AppState>,
    payload: Result<Json<GenerationRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return rejected(rejection),
    };
    if let Err(e) = request.validate() {
        return bad_request(e.to_string());
    }

    info!(provider = %request.provider, mode = %request.mode, "Generation request");
    let dispatcher = state.dispatcher.clone();
    let task = tokio::spawn(async move { dispatcher.generate(&request).await });

    let result = match task.await {
        Ok(result) => result,
        Err(e) => {
            error!("Generation task failed: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody::new(INTERNAL_ERROR, None)),
            )
                .into_response();
        }
    };

    match ErrorBody::from_result(&result) {
        None => Json(GenerateResponse {
            content: result.content.unwrap_or_default(),
        })
        .into_response(),
        Some((status, body)) => {
            let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (status, Json(body)).into_response()
        }
    }
}

pub async fn plan(
    State(state): State<AppState>,
    payload: Result<Json<PlanRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return rejected(rejection),
    };
    if request.prompt.trim().is_empty() {
        return bad_request("prompt must not be empty".to_string());
    }

    info!(provider = %request.provider, "Planning request");
    let decomposer = state.decomposer.clone();
    let prompt = request.prompt.clone();
    let task =
        tokio::spawn(async move { decomposer.decompose(&request.prompt, &request.provider).await });

    match task.await {
        // Degraded plans are still a 200
        Ok(outcome) => Json(outcome.plan).into_response(),
        Err(e) => {
            error!("Planning task failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(PlanFailureBody::new(INTERNAL_ERROR, prompt)),
            )
                .into_response()
        }
    }
}

/// Oversized bodies keep their 413; every other rejection is a 400
fn rejected(rejection: JsonRejection) -> Response {
    let status = match rejection.status() {
        StatusCode::PAYLOAD_TOO_LARGE => StatusCode::PAYLOAD_TOO_LARGE,
        _ => StatusCode::BAD_REQUEST,
    };
    (
        status,
        Json(ErrorBody::new("Invalid request", Some(rejection.body_text()))),
    )
        .into_response()
}

fn bad_request(detail: String) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorBody::new("Invalid request", Some(detail))),
    )
        .into_response()
}
