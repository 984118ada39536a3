//! Upload and action orchestration for a single session.
//!
//! The orchestrator owns no session state. Callers pass a `&mut Session`, so
//! exclusive access for the duration of an action is enforced by the borrow
//! (and, in the HTTP layer, by the session's mutex).
//!
//! An action attempt is decided in this order:
//!
//! 1. no document loaded: [`ActionError::NoDocument`]
//! 2. quota spent: [`ActionOutcome::QuotaExceeded`], the provider is not called
//! 3. prompt construction: [`ActionError::InvalidRequest`] for an empty question
//! 4. provider call (bounded by a per-attempt timeout, transient errors
//!    retried): [`ActionError::Llm`] on failure
//! 5. success: the session is charged exactly once and the text returned

use super::extractor::{ExtractionError, TextExtractor};
use super::metrics;
use super::prompt::build_prompt;
use super::providers::{GenerationParams, ProviderError, ProviderResponse, TextProvider};
use super::retry::{retry_provider_call, RetryConfig};
use crate::config::LexliteConfig;
use crate::models::{
    ActionError, ActionKind, ActionOutcome, ActionRequest, ActionResult, ReuploadPolicy, Session,
    SessionDocument,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Default bound on a single provider attempt.
pub const DEFAULT_LLM_TIMEOUT: Duration = Duration::from_secs(60);

/// What an upload did to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadOutcome {
    /// The session had no document; it has one now.
    Loaded,
    /// The previous document was swapped out (`ReuploadPolicy::Replace`).
    Replaced,
    /// A document was already loaded and kept (`ReuploadPolicy::Ignore`).
    Ignored,
}

impl UploadOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadOutcome::Loaded => "loaded",
            UploadOutcome::Replaced => "replaced",
            UploadOutcome::Ignored => "ignored",
        }
    }
}

pub struct Orchestrator {
    extractor: TextExtractor,
    provider: Arc<dyn TextProvider>,
    retry: RetryConfig,
    timeout: Duration,
    reupload_policy: ReuploadPolicy,
    summary_temperature: f32,
    answer_temperature: f32,
}

impl Orchestrator {
    pub fn new(provider: Arc<dyn TextProvider>, extractor: TextExtractor) -> Self {
        Self {
            extractor,
            provider,
            retry: RetryConfig::default(),
            timeout: DEFAULT_LLM_TIMEOUT,
            reupload_policy: ReuploadPolicy::default(),
            summary_temperature: 0.2,
            answer_temperature: 0.1,
        }
    }

    /// Wire an orchestrator from service configuration.
    pub fn from_config(config: &LexliteConfig, provider: Arc<dyn TextProvider>) -> Self {
        Self::new(provider, TextExtractor::new(config.documents.max_chars))
            .with_retry(RetryConfig::with_max_retries(config.llm.max_retries))
            .with_timeout(config.llm.timeout())
            .with_reupload_policy(config.documents.reupload_policy)
            .with_temperatures(config.llm.summary_temperature, config.llm.answer_temperature)
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_reupload_policy(mut self, policy: ReuploadPolicy) -> Self {
        self.reupload_policy = policy;
        self
    }

    pub fn with_temperatures(mut self, summary: f32, answer: f32) -> Self {
        self.summary_temperature = summary;
        self.answer_temperature = answer;
        self
    }

    pub fn provider(&self) -> &Arc<dyn TextProvider> {
        &self.provider
    }

    pub fn reupload_policy(&self) -> ReuploadPolicy {
        self.reupload_policy
    }

    /// Attach an uploaded PDF to the session.
    ///
    /// With [`ReuploadPolicy::Ignore`] a session that already has a document
    /// is left untouched and the bytes are not even parsed.
    pub async fn upload(
        &self,
        session: &mut Session,
        file_name: Option<String>,
        bytes: Vec<u8>,
    ) -> Result<UploadOutcome, ExtractionError> {
        session.touch();

        if session.has_document() && self.reupload_policy == ReuploadPolicy::Ignore {
            tracing::info!(session_id = %session.id, "Document already loaded, upload ignored");
            metrics::record_document(UploadOutcome::Ignored.as_str());
            return Ok(UploadOutcome::Ignored);
        }

        let extractor = self.extractor;
        let size = bytes.len();
        let extracted = match tokio::task::spawn_blocking(move || extractor.extract(&bytes)).await
        {
            Ok(Ok(extracted)) => extracted,
            Ok(Err(e)) => {
                tracing::warn!(session_id = %session.id, size, error = %e, "Document rejected");
                metrics::record_document("rejected");
                return Err(e);
            }
            Err(e) => {
                tracing::error!(session_id = %session.id, error = %e, "Extraction task failed");
                metrics::record_document("rejected");
                return Err(ExtractionError::Malformed(format!(
                    "extraction task failed: {}",
                    e
                )));
            }
        };

        let document = SessionDocument {
            text: extracted.text,
            file_name,
            page_count: extracted.page_count,
            truncated: extracted.truncated,
        };

        let outcome = if session.has_document() {
            session.replace_document(document);
            UploadOutcome::Replaced
        } else {
            session.set_document(document);
            UploadOutcome::Loaded
        };

        if let Some(doc) = session.document() {
            tracing::info!(
                session_id = %session.id,
                outcome = outcome.as_str(),
                size,
                page_count = doc.page_count,
                chars = doc.char_count(),
                truncated = doc.truncated,
                "Document loaded"
            );
        }
        metrics::record_document(outcome.as_str());

        Ok(outcome)
    }

    /// `requestSummary`: summarize the loaded document.
    pub async fn request_summary(&self, session: &mut Session) -> ActionResult {
        self.perform(session, ActionRequest::Summarize).await
    }

    /// `requestAnswer`: answer a question from the loaded document.
    pub async fn request_answer(&self, session: &mut Session, question: &str) -> ActionResult {
        self.perform(session, ActionRequest::answer(question)).await
    }

    /// Run one action attempt against the session.
    pub async fn perform(&self, session: &mut Session, request: ActionRequest) -> ActionResult {
        session.touch();
        let kind = request.kind();

        let result = self.decide(session, &request).await;

        let outcome = match &result {
            Ok(ActionOutcome::Content(_)) => "content",
            Ok(ActionOutcome::QuotaExceeded { .. }) => "quota_exceeded",
            Err(e) => e.kind(),
        };
        metrics::record_action(kind, outcome);

        match &result {
            Ok(_) => tracing::info!(
                session_id = %session.id,
                kind = kind.as_str(),
                outcome,
                used = session.usage_count(),
                remaining = session.remaining(),
                "Action completed"
            ),
            Err(e) => tracing::warn!(
                session_id = %session.id,
                kind = kind.as_str(),
                outcome,
                error = %e,
                "Action failed"
            ),
        }

        result
    }

    async fn decide(&self, session: &mut Session, request: &ActionRequest) -> ActionResult {
        let document = session.document().ok_or(ActionError::NoDocument)?;

        if !session.can_act() {
            return Ok(ActionOutcome::QuotaExceeded {
                remaining: session.remaining(),
            });
        }

        let prompt = build_prompt(request, &document.text)?;
        let params = GenerationParams::with_temperature(self.temperature_for(request.kind()));

        tracing::debug!(
            session_id = %session.id,
            kind = request.kind().as_str(),
            prompt_chars = prompt.chars().count(),
            "Calling text provider"
        );

        let response = self.generate(&prompt, &params).await?;

        session.record_use();
        Ok(ActionOutcome::Content(response.text))
    }

    fn temperature_for(&self, kind: ActionKind) -> f32 {
        match kind {
            ActionKind::Summarize => self.summary_temperature,
            ActionKind::Answer => self.answer_temperature,
        }
    }

    async fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<ProviderResponse, ProviderError> {
        let provider = self.provider.as_ref();
        let timeout = self.timeout;
        let start = Instant::now();

        let response = retry_provider_call(&self.retry, "generate", || async move {
            let attempt = match tokio::time::timeout(timeout, provider.generate(prompt, params)).await
            {
                Ok(result) => result,
                Err(_) => Err(ProviderError::Timeout(timeout.as_secs())),
            };
            if let Err(e) = &attempt {
                metrics::record_provider_error(e.error_type());
            }
            attempt
        })
        .await?;

        metrics::record_provider_latency(provider.model(), start.elapsed().as_secs_f64());
        tracing::debug!(
            provider = provider.name(),
            model = provider.model(),
            input_tokens = response.input_tokens,
            output_tokens = response.output_tokens,
            output_chars = response.text.chars().count(),
            "Text provider responded"
        );

        Ok(response)
    }
}
