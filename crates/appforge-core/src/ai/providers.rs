//! AI provider configuration
//!
//! Defines provider ids, API formats, the built-in provider table and the
//! read-only registry the dispatcher looks profiles up in.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;
use std::time::Duration;

use crate::ai::types::Mode;
use crate::config::GatewayConfig;
use crate::error::{GatewayError, Result};

/// Unique identifier for each supported provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProviderId {
    #[default]
    Anthropic,
    OpenAI,
    Gemini,
    DeepSeek,
    OpenRouter,
}

impl ProviderId {
    /// Get all available provider IDs
    pub fn all() -> &'static [ProviderId] {
        &[
            ProviderId::Anthropic,
            ProviderId::OpenAI,
            ProviderId::Gemini,
            ProviderId::DeepSeek,
            ProviderId::OpenRouter,
        ]
    }

    /// Logical id used on the wire and in configuration keys
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::Anthropic => "anthropic",
            ProviderId::OpenAI => "openai",
            ProviderId::Gemini => "gemini",
            ProviderId::DeepSeek => "deepseek",
            ProviderId::OpenRouter => "openrouter",
        }
    }

    /// Upper-case form used in `APPFORGE_<ID>_*` environment variables
    pub fn env_key(&self) -> String {
        self.as_str().to_uppercase()
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderId::Anthropic => write!(f, "Anthropic"),
            ProviderId::OpenAI => write!(f, "OpenAI"),
            ProviderId::Gemini => write!(f, "Gemini"),
            ProviderId::DeepSeek => write!(f, "DeepSeek"),
            ProviderId::OpenRouter => write!(f, "OpenRouter"),
        }
    }
}

impl std::str::FromStr for ProviderId {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "anthropic" | "claude" => Ok(ProviderId::Anthropic),
            "openai" | "gpt" => Ok(ProviderId::OpenAI),
            "gemini" | "google" => Ok(ProviderId::Gemini),
            "deepseek" => Ok(ProviderId::DeepSeek),
            "openrouter" => Ok(ProviderId::OpenRouter),
            _ => Err(GatewayError::UnknownProvider(s.to_string())),
        }
    }
}

/// Request/response wire format spoken by a provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ApiFormat {
    /// Anthropic Messages API (/v1/messages)
    #[default]
    Anthropic,
    /// OpenAI Chat Completions API (/v1/chat/completions)
    OpenAI,
    /// Google AI API (/v1beta/models/{model}:generateContent)
    Google,
}

/// How to send the API key in requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum AuthHeader {
    /// Use `x-api-key: <key>` header (Anthropic style)
    #[default]
    XApiKey,
    /// Use `Authorization: Bearer <key>` header (OpenAI style)
    Bearer,
    /// Use `x-goog-api-key: <key>` header (Google style)
    GoogApiKey,
}

/// Compiled-in defaults for one provider
#[derive(Debug, Clone)]
pub struct BuiltinProvider {
    pub id: ProviderId,
    pub api_format: ApiFormat,
    pub auth_header: AuthHeader,
    /// API endpoint (without model-specific suffix for Google)
    pub base_url: &'static str,
    pub model: &'static str,
    pub builder_max_tokens: u32,
    pub tutor_max_tokens: u32,
    pub timeout: Duration,
    pub supports_images: bool,
    /// Conventional environment variable holding the API key
    pub key_env: &'static str,
}

static BUILTIN_PROVIDERS: LazyLock<Vec<BuiltinProvider>> = LazyLock::new(|| {
    vec![
        BuiltinProvider {
            id: ProviderId::Anthropic,
            api_format: ApiFormat::Anthropic,
            auth_header: AuthHeader::XApiKey,
            base_url: "https://api.anthropic.com/v1/messages",
            model: "claude-sonnet-4-5-20250929",
            builder_max_tokens: 16384,
            tutor_max_tokens: 4096,
            timeout: Duration::from_secs(120),
            supports_images: true,
            key_env: "ANTHROPIC_API_KEY",
        },
        BuiltinProvider {
            id: ProviderId::OpenAI,
            api_format: ApiFormat::OpenAI,
            auth_header: AuthHeader::Bearer,
            base_url: "https://api.openai.com/v1/chat/completions",
            model: "gpt-4.1",
            builder_max_tokens: 16384,
            tutor_max_tokens: 4096,
            timeout: Duration::from_secs(120),
            supports_images: true,
            key_env: "OPENAI_API_KEY",
        },
        BuiltinProvider {
            id: ProviderId::Gemini,
            api_format: ApiFormat::Google,
            auth_header: AuthHeader::GoogApiKey,
            base_url: "https://generativelanguage.googleapis.com/v1beta",
            model: "gemini-2.5-pro",
            builder_max_tokens: 16384,
            tutor_max_tokens: 4096,
            timeout: Duration::from_secs(120),
            supports_images: true,
            key_env: "GEMINI_API_KEY",
        },
        BuiltinProvider {
            id: ProviderId::DeepSeek,
            api_format: ApiFormat::OpenAI,
            auth_header: AuthHeader::Bearer,
            base_url: "https://api.deepseek.com/chat/completions",
            model: "deepseek-chat",
            builder_max_tokens: 8192,
            tutor_max_tokens: 4096,
            timeout: Duration::from_secs(90),
            supports_images: false,
            key_env: "DEEPSEEK_API_KEY",
        },
        BuiltinProvider {
            id: ProviderId::OpenRouter,
            api_format: ApiFormat::OpenAI,
            auth_header: AuthHeader::Bearer,
            base_url: "https://openrouter.ai/api/v1/chat/completions",
            model: "anthropic/claude-sonnet-4.5",
            builder_max_tokens: 16384,
            tutor_max_tokens: 4096,
            timeout: Duration::from_secs(120),
            supports_images: false,
            key_env: "OPENROUTER_API_KEY",
        },
    ]
});

/// Get the compiled-in table
pub fn builtin_providers() -> &'static [BuiltinProvider] {
    &BUILTIN_PROVIDERS
}

/// Get a built-in provider by id
pub fn get_builtin(id: ProviderId) -> Option<&'static BuiltinProvider> {
    BUILTIN_PROVIDERS.iter().find(|p| p.id == id)
}

/// Resolved, immutable settings for one provider
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderProfile {
    pub id: ProviderId,
    pub model_id: String,
    pub api_format: ApiFormat,
    pub auth_header: AuthHeader,
    pub base_url: String,
    pub token_ceilings: HashMap<Mode, u32>,
    pub timeout: Duration,
    pub supports_images: bool,
}

impl ProviderProfile {
    /// Output-token ceiling for a mode
    pub fn token_ceiling(&self, mode: Mode) -> u32 {
        self.token_ceilings.get(&mode).copied().unwrap_or(4096)
    }

    /// Output tokens for one attempt at a given budget fraction, rounded up, at least 1
    pub fn budget_tokens(&self, mode: Mode, fraction: f32) -> u32 {
        let scaled = (self.token_ceiling(mode) as f64 * fraction as f64).ceil();
        (scaled as u32).max(1)
    }

    pub fn timeout_millis(&self) -> u64 {
        self.timeout.as_millis() as u64
    }
}

/// What `/api/providers` reports for each provider
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderSummary {
    pub id: ProviderId,
    pub name: String,
    pub model: String,
    pub supports_images: bool,
    /// Per-attempt deadline
    pub timeout_ms: u64,
    pub configured: bool,
}

#[derive(Debug, Clone)]
struct RegisteredProvider {
    profile: ProviderProfile,
    api_key: Option<String>,
}

/// Read-only provider table populated once at startup
#[derive(Debug, Clone, Default)]
pub struct ProviderRegistry {
    entries: HashMap<ProviderId, RegisteredProvider>,
}

impl ProviderRegistry {
    /// Build profiles from configuration. Credentials are resolved here, once.
    pub fn from_config(config: &GatewayConfig) -> Self {
        let mut registry = Self::default();
        for settings in &config.providers {
            let profile = ProviderProfile {
                id: settings.id,
                model_id: settings.model.clone(),
                api_format: settings.api_format,
                auth_header: settings.auth_header,
                base_url: settings.base_url.clone(),
                token_ceilings: HashMap::from([
                    (Mode::Builder, settings.builder_max_tokens),
                    (Mode::Tutor, settings.tutor_max_tokens),
                ]),
                timeout: settings.timeout,
                supports_images: settings.supports_images,
            };
            if settings.api_key.is_none() {
                tracing::warn!(provider = %settings.id, "No API key configured; provider disabled");
            }
            registry.insert(profile, settings.api_key.clone());
        }
        tracing::info!(
            providers = registry.entries.len(),
            configured = registry.configured_count(),
            "Provider registry initialized"
        );
        registry
    }

    /// Register a profile directly (used by tests and embedders)
    pub fn insert(&mut self, profile: ProviderProfile, api_key: Option<String>) {
        let api_key = api_key.filter(|k| !k.trim().is_empty());
        self.entries
            .insert(profile.id, RegisteredProvider { profile, api_key });
    }

    /// Look up a provider by its logical id
    pub fn profile_for(&self, provider_id: &str) -> Result<&ProviderProfile> {
        let id: ProviderId = provider_id.parse()?;
        let entry = self
            .entries
            .get(&id)
            .ok_or_else(|| GatewayError::UnknownProvider(provider_id.to_string()))?;
        if entry.api_key.is_none() {
            return Err(GatewayError::ProviderNotConfigured(id));
        }
        Ok(&entry.profile)
    }

    /// Credential resolved at startup
    pub fn api_key(&self, id: ProviderId) -> Option<&str> {
        self.entries.get(&id).and_then(|e| e.api_key.as_deref())
    }

    pub fn configured_count(&self) -> usize {
        self.entries.values().filter(|e| e.api_key.is_some()).count()
    }

    /// Every registered provider in display order
    pub fn providers(&self) -> Vec<ProviderSummary> {
        ProviderId::all()
            .iter()
            .filter_map(|id| self.entries.get(id))
            .map(|e| ProviderSummary {
                id: e.profile.id,
                name: e.profile.id.to_string(),
                model: e.profile.model_id.clone(),
                supports_images: e.profile.supports_images,
                timeout_ms: e.profile.timeout_millis(),
                configured: e.api_key.is_some(),
            })
            .collect()
    }
}

/// Profile with round token ceilings (16000 builder, 4000 tutor) for tests
#[cfg(test)]
pub(crate) fn test_profile(id: ProviderId) -> ProviderProfile {
    let builtin = get_builtin(id).expect("every provider has a builtin");
    ProviderProfile {
        id,
        model_id: builtin.model.to_string(),
        api_format: builtin.api_format,
        auth_header: builtin.auth_header,
        base_url: builtin.base_url.to_string(),
        token_ceilings: HashMap::from([(Mode::Builder, 16000), (Mode::Tutor, 4000)]),
        timeout: builtin.timeout,
        supports_images: builtin.supports_images,
    }
}
