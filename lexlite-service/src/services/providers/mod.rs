//! LLM provider abstractions and implementations.
//!
//! The orchestrator only sees [`TextProvider`]: send a prompt, get text back
//! or a [`ProviderError`]. Backends (OpenAI, mock) are swappable behind it.

pub mod mock;
pub mod openai;

use async_trait::async_trait;
use thiserror::Error;

/// Error type for provider operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Provider rejected credentials")]
    Unauthorized,

    #[error("Rate limited")]
    RateLimited,

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Timed out after {0} seconds")]
    Timeout(u64),

    #[error("Provider returned no content")]
    EmptyResponse,
}

impl ProviderError {
    /// Transient failures worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ProviderError::RateLimited | ProviderError::NetworkError(_) | ProviderError::Timeout(_)
        )
    }

    /// Label used for metrics.
    pub fn error_type(&self) -> &'static str {
        match self {
            ProviderError::NotConfigured(_) => "not_configured",
            ProviderError::ApiError(_) => "api_error",
            ProviderError::Unauthorized => "unauthorized",
            ProviderError::RateLimited => "rate_limited",
            ProviderError::NetworkError(_) => "network_error",
            ProviderError::Timeout(_) => "timeout",
            ProviderError::EmptyResponse => "empty_response",
        }
    }
}

/// Result of a provider call.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderResponse {
    /// Generated text.
    pub text: String,

    /// Prompt tokens consumed, when the provider reports them.
    pub input_tokens: u32,

    /// Completion tokens generated, when the provider reports them.
    pub output_tokens: u32,
}

/// Generation parameters for a single request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationParams {
    /// Temperature (0.0 - 2.0).
    pub temperature: Option<f32>,

    /// Maximum output tokens.
    pub max_tokens: Option<u32>,
}

impl GenerationParams {
    pub fn with_temperature(temperature: f32) -> Self {
        Self {
            temperature: Some(temperature),
            ..Default::default()
        }
    }
}

/// Trait for text generation providers.
#[async_trait]
pub trait TextProvider: Send + Sync {
    /// Short provider name for logs and metrics.
    fn name(&self) -> &'static str;

    /// Model identifier requests are sent to.
    fn model(&self) -> &str;

    /// Generate a response for a single user prompt.
    async fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<ProviderResponse, ProviderError>;

    /// Health check.
    async fn health_check(&self) -> Result<(), ProviderError>;
}
