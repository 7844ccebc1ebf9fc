//! API Format handling
//!
//! Abstracts the differences between Anthropic, OpenAI, and Google API formats.
//! Each handler knows its endpoint, how to build a request body from an
//! attempt, and where the generated text lives in a response.

pub mod anthropic;
pub mod google;
pub mod openai;

use serde_json::Value;

use crate::ai::client::AttemptRequest;
use crate::ai::providers::{ApiFormat, ProviderProfile};
use crate::ai::types::Role;

/// Media type assumed for raw base64 image references
const DEFAULT_IMAGE_MEDIA_TYPE: &str = "image/png";

/// Trait for handling different API formats
pub trait FormatHandler: Send + Sync {
    /// Full URL for a non-streaming generation call
    fn endpoint_url(&self, profile: &ProviderProfile) -> String;

    /// Build the complete request body
    fn build_request_body(&self, request: &AttemptRequest<'_>) -> Value;

    /// Generated text from a successful response; empty when there is none
    fn extract_text(&self, response: &Value) -> String;
}

/// Select the format handler for an API format
pub fn get_format_handler(format: ApiFormat) -> &'static dyn FormatHandler {
    match format {
        ApiFormat::Anthropic => &anthropic::AnthropicFormat,
        ApiFormat::OpenAI => &openai::OpenAIFormat,
        ApiFormat::Google => &google::GoogleFormat,
    }
}

/// A decoded image reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage<'a> {
    pub media_type: &'a str,
    /// Base64 payload without the `data:` prefix
    pub data: &'a str,
}

impl<'a> InlineImage<'a> {
    /// Accepts `data:<type>;base64,<payload>` URLs or raw base64 (assumed PNG)
    pub fn parse(reference: &'a str) -> Option<Self> {
        let reference = reference.trim();
        if let Some(rest) = reference.strip_prefix("data:") {
            let (header, data) = rest.split_once(',')?;
            let media_type = header.strip_suffix(";base64")?;
            if media_type.is_empty() || data.is_empty() {
                return None;
            }
            return Some(Self { media_type, data });
        }
        if reference.is_empty() {
            return None;
        }
        Some(Self {
            media_type: DEFAULT_IMAGE_MEDIA_TYPE,
            data: reference,
        })
    }

    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.media_type, self.data)
    }
}

/// Images of a request that could be decoded; malformed references are skipped
pub(crate) fn inline_images<'a>(request: &AttemptRequest<'a>) -> Vec<InlineImage<'a>> {
    request
        .images
        .iter()
        .filter_map(|reference| {
            let image = InlineImage::parse(reference);
            if image.is_none() {
                tracing::warn!("Skipping malformed image reference");
            }
            image
        })
        .collect()
}

/// Role name shared by the Anthropic and OpenAI formats
pub(crate) fn role_name(role: Role) -> &'static str {
    match role {
        Role::User => "user",
        Role::Assistant => "assistant",
    }
}
