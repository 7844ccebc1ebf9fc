//! Gateway error types

use thiserror::Error;

use crate::ai::providers::ProviderId;
use crate::ai::types::FailureKind;

/// Errors raised by the gateway outside of an upstream attempt
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Provider id not present in the registry
    #[error("unknown provider: {0}")]
    UnknownProvider(String),

    /// Provider exists but had no credentials at startup
    #[error("provider not configured: {0} has no API key")]
    ProviderNotConfigured(ProviderId),

    /// Caller sent something the gateway will not forward
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Startup configuration could not be read
    #[error("configuration error: {0}")]
    Config(String),

    /// Nothing usable came back from the provider
    #[error("empty response")]
    EmptyResponse,

    /// Artifact path escapes its output directory
    #[error("unsafe artifact path: {0}")]
    UnsafePath(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl GatewayError {
    /// Map onto the failure taxonomy reported to callers
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            GatewayError::UnknownProvider(_) => FailureKind::UnknownProvider,
            GatewayError::ProviderNotConfigured(_) | GatewayError::Config(_) => {
                FailureKind::Configuration
            }
            GatewayError::EmptyResponse => FailureKind::EmptyResponse,
            GatewayError::InvalidRequest(_) | GatewayError::UnsafePath(_) | GatewayError::Io(_) => {
                FailureKind::Upstream
            }
        }
    }
}

impl From<toml::de::Error> for GatewayError {
    fn from(err: toml::de::Error) -> Self {
        GatewayError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, GatewayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_kind_mapping() {
        assert_eq!(
            GatewayError::UnknownProvider("nope".into()).failure_kind(),
            FailureKind::UnknownProvider
        );
        assert_eq!(
            GatewayError::ProviderNotConfigured(ProviderId::OpenAI).failure_kind(),
            FailureKind::Configuration
        );
        assert_eq!(
            GatewayError::EmptyResponse.failure_kind(),
            FailureKind::EmptyResponse
        );
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        assert_eq!(GatewayError::from(io).failure_kind(), FailureKind::Upstream);
    }

    #[test]
    fn test_toml_errors_become_config_errors() {
        let err: GatewayError = toml::from_str::<toml::Table>("bind = ").unwrap_err().into();
        assert!(matches!(err, GatewayError::Config(_)));
        assert_eq!(err.failure_kind(), FailureKind::Configuration);
    }
}
