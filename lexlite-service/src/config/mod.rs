use crate::models::ReuploadPolicy;
use service_core::config::{self as core_config, get_env, get_env_parsed, is_production};
use service_core::error::AppError;
use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Free AI actions per session.
pub const DEFAULT_FREE_ACTIONS: u32 = 3;

/// Characters of extracted document text kept for prompting.
pub const DEFAULT_MAX_CHARS: usize = 25_000;

/// Upload request body limit (20MB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

pub const DEFAULT_UPGRADE_URL: &str = "https://buy.stripe.com/your-checkout-link";

#[derive(Debug, Clone)]
pub struct LexliteConfig {
    pub common: core_config::Config,
    pub quota: QuotaConfig,
    pub documents: DocumentConfig,
    pub sessions: SessionConfig,
    pub llm: LlmConfig,
}

#[derive(Debug, Clone)]
pub struct QuotaConfig {
    pub free_actions: u32,
    /// Shown once the quota is exhausted. Informational only.
    pub upgrade_url: String,
}

#[derive(Debug, Clone)]
pub struct DocumentConfig {
    pub max_chars: usize,
    pub max_upload_bytes: usize,
    pub reupload_policy: ReuploadPolicy,
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub idle_timeout_secs: u64,
}

impl SessionConfig {
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }
}

#[derive(Clone)]
pub struct LlmConfig {
    pub provider: ProviderKind,
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub summary_temperature: f32,
    pub answer_temperature: f32,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

impl LlmConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmConfig")
            .field("provider", &self.provider)
            .field("api_key", &self.api_key.as_ref().map(|_| "[redacted]"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("summary_temperature", &self.summary_temperature)
            .field("answer_temperature", &self.answer_temperature)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

/// Which LLM backend serves generation requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    OpenAi,
    Mock,
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(ProviderKind::OpenAi),
            "mock" => Ok(ProviderKind::Mock),
            other => Err(format!("unknown provider '{}'", other)),
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKind::OpenAi => write!(f, "openai"),
            ProviderKind::Mock => write!(f, "mock"),
        }
    }
}

impl LexliteConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;
        let is_prod = is_production();

        let provider: ProviderKind = get_env_parsed("LLM_PROVIDER", ProviderKind::OpenAi, is_prod)?;
        let api_key = match provider {
            ProviderKind::OpenAi => Some(get_env("OPENAI_API_KEY", None, is_prod)?),
            ProviderKind::Mock => env::var("OPENAI_API_KEY").ok(),
        };

        let config = LexliteConfig {
            common: common_config,
            quota: QuotaConfig {
                free_actions: get_env_parsed("LEXLITE_FREE_ACTIONS", DEFAULT_FREE_ACTIONS, is_prod)?,
                upgrade_url: get_env("LEXLITE_UPGRADE_URL", Some(DEFAULT_UPGRADE_URL), is_prod)?,
            },
            documents: DocumentConfig {
                max_chars: get_env_parsed("LEXLITE_MAX_CHARS", DEFAULT_MAX_CHARS, is_prod)?,
                max_upload_bytes: get_env_parsed(
                    "LEXLITE_MAX_UPLOAD_BYTES",
                    DEFAULT_MAX_UPLOAD_BYTES,
                    is_prod,
                )?,
                reupload_policy: get_env_parsed(
                    "LEXLITE_REUPLOAD_POLICY",
                    ReuploadPolicy::Ignore,
                    is_prod,
                )?,
            },
            sessions: SessionConfig {
                idle_timeout_secs: get_env_parsed("LEXLITE_SESSION_IDLE_SECS", 86_400, is_prod)?,
            },
            llm: LlmConfig {
                provider,
                api_key,
                base_url: get_env("OPENAI_BASE_URL", Some("https://api.openai.com/v1"), is_prod)?,
                model: get_env("LLM_MODEL", Some("gpt-4o-mini"), is_prod)?,
                summary_temperature: get_env_parsed("LLM_SUMMARY_TEMPERATURE", 0.2, is_prod)?,
                answer_temperature: get_env_parsed("LLM_ANSWER_TEMPERATURE", 0.1, is_prod)?,
                timeout_secs: get_env_parsed("LLM_TIMEOUT_SECS", 60, is_prod)?,
                max_retries: get_env_parsed("LLM_MAX_RETRIES", 2, is_prod)?,
            },
        };

        if config.documents.max_chars == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "LEXLITE_MAX_CHARS must be greater than zero"
            )));
        }

        Ok(config)
    }
}
