//! OpenAI chat/completions format
//!
//! Also spoken by DeepSeek and OpenRouter.

use serde_json::{json, Value};

use super::{inline_images, role_name, FormatHandler};
use crate::ai::client::AttemptRequest;
use crate::ai::providers::{ProviderId, ProviderProfile};

pub struct OpenAIFormat;

impl OpenAIFormat {
    /// OpenAI's own API rejects `max_tokens` for newer models
    fn token_field(profile: &ProviderProfile) -> &'static str {
        match profile.id {
            ProviderId::OpenAI => "max_completion_tokens",
            _ => "max_tokens",
        }
    }
}

impl FormatHandler for OpenAIFormat {
    fn endpoint_url(&self, profile: &ProviderProfile) -> String {
        profile.base_url.clone()
    }

    fn build_request_body(&self, request: &AttemptRequest<'_>) -> Value {
        let mut messages = Vec::with_capacity(request.history.len() + 2);
        if !request.system_prompt.is_empty() {
            messages.push(json!({"role": "system", "content": request.system_prompt}));
        }
        messages.extend(request.history.iter().map(|turn| {
            json!({
                "role": role_name(turn.role),
                "content": turn.text,
            })
        }));

        let images = inline_images(request);
        let content = if images.is_empty() {
            json!(request.prompt)
        } else {
            let mut parts = vec![json!({"type": "text", "text": request.prompt})];
            parts.extend(images.iter().map(|image| {
                json!({
                    "type": "image_url",
                    "image_url": {"url": image.data_url()}
                })
            }));
            Value::Array(parts)
        };
        messages.push(json!({"role": "user", "content": content}));

        let mut body = json!({
            "model": request.profile.model_id,
            "messages": messages,
        });
        body[Self::token_field(request.profile)] = json!(request.max_tokens);
        body
    }

    fn extract_text(&self, response: &Value) -> String {
        let Some(choice) = response
            .get("choices")
            .and_then(|c| c.as_array())
            .and_then(|arr| arr.first())
        else {
            return String::new();
        };

        match choice.get("message").and_then(|msg| msg.get("content")) {
            Some(Value::String(text)) => text.clone(),
            // Some routers return content as a list of parts
            Some(Value::Array(parts)) => parts
                .iter()
                .filter_map(|part| part.get("text").and_then(|t| t.as_str()))
                .collect::<Vec<_>>()
                .join(""),
            _ => choice
                .get("text")
                .and_then(|t| t.as_str())
                .unwrap_or("")
                .to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::providers::test_profile;
    use crate::ai::types::Mode;

    fn request<'a>(
        profile: &'a ProviderProfile,
        images: &'a [String],
    ) -> AttemptRequest<'a> {
        AttemptRequest {
            profile,
            api_key: "k",
            mode: Mode::Tutor,
            system_prompt: "teach",
            prompt: "what is flexbox",
            history: &[],
            images,
            max_tokens: 3000,
        }
    }

    #[test]
    fn test_token_field_per_provider() {
        let openai = test_profile(ProviderId::OpenAI);
        let body = OpenAIFormat.build_request_body(&request(&openai, &[]));
        assert_eq!(body["max_completion_tokens"], 3000);
        assert!(body.get("max_tokens").is_none());

        let deepseek = test_profile(ProviderId::DeepSeek);
        let body = OpenAIFormat.build_request_body(&request(&deepseek, &[]));
        assert_eq!(body["max_tokens"], 3000);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "what is flexbox");
    }

    #[test]
    fn test_images_as_data_urls() {
        let openai = test_profile(ProviderId::OpenAI);
        let images = vec!["QUJD".to_string()];
        let body = OpenAIFormat.build_request_body(&request(&openai, &images));
        let parts = body["messages"][1]["content"].as_array().unwrap();
        assert_eq!(parts[1]["image_url"]["url"], "data:image/png;base64,QUJD");
    }

    #[test]
    fn test_extract_alternate_shapes() {
        let plain = json!({"choices": [{"message": {"content": "<html>"}}]});
        assert_eq!(OpenAIFormat.extract_text(&plain), "<html>");

        let parts = json!({"choices": [{"message": {"content": [{"type": "text", "text": "a"}, {"type": "text", "text": "b"}]}}]});
        assert_eq!(OpenAIFormat.extract_text(&parts), "ab");

        let legacy = json!({"choices": [{"text": "legacy"}]});
        assert_eq!(OpenAIFormat.extract_text(&legacy), "legacy");

        let null_content = json!({"choices": [{"message": {"content": null}}]});
        assert_eq!(OpenAIFormat.extract_text(&null_content), "");
        assert_eq!(OpenAIFormat.extract_text(&json!({"choices": []})), "");
    }
}
