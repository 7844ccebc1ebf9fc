//! Gateway configuration
//!
//! Read once at startup from, in increasing precedence:
//! 1. the built-in provider table
//! 2. an optional TOML file (`~/.appforge/config.toml` or `--config`)
//! 3. `APPFORGE_*` environment variables and each provider's conventional key variable
//!
//! Missing credentials never fail loading; the registry reports them per request.

use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::ai::providers::{builtin_providers, get_builtin, ApiFormat, AuthHeader, ProviderId};
use crate::constants;
use crate::error::{GatewayError, Result};

/// Per-provider overrides accepted in the config file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderOverrides {
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub builder_max_tokens: Option<u32>,
    pub tutor_max_tokens: Option<u32>,
    pub timeout_ms: Option<u64>,
    /// Set to false to remove the provider from the registry
    pub enabled: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    bind: Option<String>,
    planning_timeout_ms: Option<u64>,
    #[serde(default)]
    providers: HashMap<String, ProviderOverrides>,
}

/// Resolved settings for one provider
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub id: ProviderId,
    pub api_format: ApiFormat,
    pub auth_header: AuthHeader,
    pub model: String,
    pub base_url: String,
    pub builder_max_tokens: u32,
    pub tutor_max_tokens: u32,
    pub timeout: Duration,
    pub supports_images: bool,
    pub api_key: Option<String>,
}

/// Complete startup configuration
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Address `serve` binds to
    pub bind: String,
    /// Wall-clock budget for planning requests
    pub planning_timeout: Duration,
    pub providers: Vec<ProviderSettings>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind: constants::http::DEFAULT_BIND.to_string(),
            planning_timeout: constants::planning::DEFAULT_TIMEOUT,
            providers: builtin_providers()
                .iter()
                .map(|b| ProviderSettings {
                    id: b.id,
                    api_format: b.api_format,
                    auth_header: b.auth_header,
                    model: b.model.to_string(),
                    base_url: b.base_url.to_string(),
                    builder_max_tokens: b.builder_max_tokens,
                    tutor_max_tokens: b.tutor_max_tokens,
                    timeout: b.timeout,
                    supports_images: b.supports_images,
                    api_key: None,
                })
                .collect(),
        }
    }
}

impl GatewayConfig {
    /// Default config file location
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| {
            home.join(constants::config::CONFIG_DIR_NAME)
                .join(constants::config::CONFIG_FILE_NAME)
        })
    }

    /// Load from the process environment and an optional config file
    ///
    /// An explicit `path` must exist; the default path is only read if present.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file_contents = match path {
            Some(p) => Some(std::fs::read_to_string(p).map_err(|e| {
                GatewayError::Config(format!("cannot read {}: {}", p.display(), e))
            })?),
            None => match Self::default_path() {
                Some(p) if p.exists() => {
                    tracing::debug!("Reading config from {:?}", p);
                    Some(std::fs::read_to_string(&p)?)
                }
                _ => None,
            },
        };
        Self::from_sources(file_contents.as_deref(), |key| std::env::var(key).ok())
    }

    /// Build from file contents and an environment lookup
    pub fn from_sources<F>(file: Option<&str>, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let file: FileConfig = match file {
            Some(contents) => toml::from_str(contents)?,
            None => FileConfig::default(),
        };

        let mut overrides: HashMap<ProviderId, ProviderOverrides> = HashMap::new();
        for (key, value) in file.providers {
            let id: ProviderId = key
                .parse()
                .map_err(|_| GatewayError::Config(format!("unknown provider in config: {}", key)))?;
            overrides.insert(id, value);
        }

        let mut config = Self::default();
        if let Some(bind) = file.bind {
            config.bind = bind;
        }
        if let Some(ms) = file.planning_timeout_ms {
            config.planning_timeout = Duration::from_millis(ms);
        }

        let prefix = constants::config::ENV_PREFIX;
        if let Some(bind) = non_empty(env(&format!("{}_BIND", prefix))) {
            config.bind = bind;
        }
        if let Some(ms) = parse_env::<u64, _>(&env, &format!("{}_PLANNING_TIMEOUT_MS", prefix))? {
            config.planning_timeout = Duration::from_millis(ms);
        }

        let mut providers = Vec::with_capacity(config.providers.len());
        for mut settings in config.providers {
            let file_over = overrides.remove(&settings.id).unwrap_or_default();
            if file_over.enabled == Some(false) {
                tracing::info!(provider = %settings.id, "Provider disabled by config");
                continue;
            }
            apply_file_overrides(&mut settings, file_over);
            apply_env_overrides(&mut settings, &env)?;
            providers.push(settings);
        }
        config.providers = providers;

        Ok(config)
    }
}

fn apply_file_overrides(settings: &mut ProviderSettings, over: ProviderOverrides) {
    if let Some(model) = over.model {
        settings.model = model;
    }
    if let Some(url) = over.base_url {
        settings.base_url = url.trim_end_matches('/').to_string();
    }
    if let Some(key) = non_empty(over.api_key) {
        settings.api_key = Some(key);
    }
    if let Some(tokens) = over.builder_max_tokens {
        settings.builder_max_tokens = tokens;
    }
    if let Some(tokens) = over.tutor_max_tokens {
        settings.tutor_max_tokens = tokens;
    }
    if let Some(ms) = over.timeout_ms {
        settings.timeout = Duration::from_millis(ms);
    }
}

fn apply_env_overrides<F>(settings: &mut ProviderSettings, env: &F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    let id = settings.id;
    let env_key = id.env_key();
    let var = |suffix: &str| format!("{}_{}_{}", constants::config::ENV_PREFIX, env_key, suffix);

    // Gateway-specific key wins over the provider's conventional variable
    let key = non_empty(env(&var("API_KEY")))
        .or_else(|| get_builtin(id).and_then(|b| non_empty(env(b.key_env))));
    if key.is_some() {
        settings.api_key = key;
    }

    if let Some(model) = non_empty(env(&var("MODEL"))) {
        settings.model = model;
    }
    if let Some(url) = non_empty(env(&var("BASE_URL"))) {
        settings.base_url = url.trim_end_matches('/').to_string();
    }
    if let Some(tokens) = parse_env::<u32, _>(env, &var("BUILDER_MAX_TOKENS"))? {
        settings.builder_max_tokens = tokens;
    }
    if let Some(tokens) = parse_env::<u32, _>(env, &var("TUTOR_MAX_TOKENS"))? {
        settings.tutor_max_tokens = tokens;
    }
    if let Some(ms) = parse_env::<u64, _>(env, &var("TIMEOUT_MS"))? {
        settings.timeout = Duration::from_millis(ms);
    }
    Ok(())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_env<T, F>(env: &F, key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    match non_empty(env(key)) {
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|_| GatewayError::Config(format!("{} is not a valid number: {}", key, raw))),
        None => Ok(None),
    }
}
