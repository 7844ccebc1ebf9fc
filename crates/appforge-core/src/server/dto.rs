//! Wire bodies for the HTTP surface (camelCase JSON)

use serde::{Deserialize, Serialize};

use crate::ai::types::{FailureKind, GenerationResult};
use crate::plan::Task;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<FailureKind>,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>, detail: Option<String>) -> Self {
        Self {
            error: error.into(),
            detail,
            kind: None,
        }
    }

    /// Failure body and status for a terminal generation failure
    pub fn from_result(result: &GenerationResult) -> Option<(u16, Self)> {
        let payload = result.error_payload.as_ref()?;
        Some((
            payload.status,
            Self {
                error: payload.error.clone(),
                detail: Some(payload.detail.clone()),
                kind: Some(payload.kind),
            },
        ))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanRequest {
    pub prompt: String,
    pub provider: String,
}

/// Body of a planning hard failure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanFailureBody {
    pub error: String,
    pub id: String,
    pub prompt: String,
    pub tasks: Vec<Task>,
    pub estimated_total_time: u32,
}

impl PlanFailureBody {
    pub fn new(error: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            id: uuid::Uuid::new_v4().to_string(),
            prompt: prompt.into(),
            tasks: Vec::new(),
            estimated_total_time: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}
