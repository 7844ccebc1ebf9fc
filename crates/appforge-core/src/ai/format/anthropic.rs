//! Anthropic Messages API format

use serde_json::{json, Value};

use super::{inline_images, role_name, FormatHandler};
use crate::ai::client::AttemptRequest;
use crate::ai::providers::ProviderProfile;

pub struct AnthropicFormat;

impl FormatHandler for AnthropicFormat {
    fn endpoint_url(&self, profile: &ProviderProfile) -> String {
        profile.base_url.clone()
    }

    fn build_request_body(&self, request: &AttemptRequest<'_>) -> Value {
        let mut messages: Vec<Value> = request
            .history
            .iter()
            .map(|turn| {
                json!({
                    "role": role_name(turn.role),
                    "content": turn.text,
                })
            })
            .collect();

        let images = inline_images(request);
        let content = if images.is_empty() {
            json!(request.prompt)
        } else {
            // Images go before the text block
            let mut blocks: Vec<Value> = images
                .iter()
                .map(|image| {
                    json!({
                        "type": "image",
                        "source": {
                            "type": "base64",
                            "media_type": image.media_type,
                            "data": image.data,
                        }
                    })
                })
                .collect();
            blocks.push(json!({"type": "text", "text": request.prompt}));
            Value::Array(blocks)
        };
        messages.push(json!({"role": "user", "content": content}));

        json!({
            "model": request.profile.model_id,
            "max_tokens": request.max_tokens,
            "system": request.system_prompt,
            "messages": messages,
        })
    }

    fn extract_text(&self, response: &Value) -> String {
        // Thinking blocks may precede the text blocks
        response
            .get("content")
            .and_then(|c| c.as_array())
            .map(|arr| {
                arr.iter()
                    .filter_map(|block| {
                        if block.get("type").and_then(|t| t.as_str()) == Some("text") {
                            block.get("text").and_then(|t| t.as_str())
                        } else {
                            None
                        }
                    })
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default()
    }
}
