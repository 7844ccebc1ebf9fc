//! Google/Gemini generateContent format

use serde_json::{json, Value};

use super::{inline_images, FormatHandler};
use crate::ai::client::AttemptRequest;
use crate::ai::providers::ProviderProfile;
use crate::ai::types::Role;

pub struct GoogleFormat;

impl FormatHandler for GoogleFormat {
    fn endpoint_url(&self, profile: &ProviderProfile) -> String {
        format!(
            "{}/models/{}:generateContent",
            profile.base_url.trim_end_matches('/'),
            profile.model_id
        )
    }

    fn build_request_body(&self, request: &AttemptRequest<'_>) -> Value {
        let mut contents: Vec<Value> = request
            .history
            .iter()
            .map(|turn| {
                let role = match turn.role {
                    Role::User => "user",
                    Role::Assistant => "model",
                };
                json!({"role": role, "parts": [{"text": turn.text}]})
            })
            .collect();

        let mut parts: Vec<Value> = inline_images(request)
            .iter()
            .map(|image| {
                json!({
                    "inline_data": {
                        "mime_type": image.media_type,
                        "data": image.data,
                    }
                })
            })
            .collect();
        parts.push(json!({"text": request.prompt}));
        contents.push(json!({"role": "user", "parts": parts}));

        let mut body = json!({
            "contents": contents,
            "generationConfig": {
                "maxOutputTokens": request.max_tokens,
            }
        });
        if !request.system_prompt.is_empty() {
            body["systemInstruction"] = json!({
                "parts": [{"text": request.system_prompt}]
            });
        }
        body
    }

    fn extract_text(&self, response: &Value) -> String {
        response
            .get("candidates")
            .and_then(|c| c.as_array())
            .and_then(|arr| arr.first())
            .and_then(|candidate| candidate.get("content"))
            .and_then(|content| content.get("parts"))
            .and_then(|parts| parts.as_array())
            .map(|parts| {
                parts
                    .iter()
                    .filter(|part| part.get("thought").and_then(|t| t.as_bool()) != Some(true))
                    .filter_map(|part| part.get("text").and_then(|t| t.as_str()))
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default()
    }
}
