//! Action requests and their outcomes.

use crate::services::providers::ProviderError;
use serde::Serialize;
use thiserror::Error;

/// The two kinds of AI action a session can spend quota on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Summarize,
    Answer,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Summarize => "summarize",
            ActionKind::Answer => "answer",
        }
    }
}

/// A single action request. A question exists exactly for `Answer`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionRequest {
    Summarize,
    Answer { question: String },
}

impl ActionRequest {
    pub fn answer(question: impl Into<String>) -> Self {
        ActionRequest::Answer {
            question: question.into(),
        }
    }

    pub fn kind(&self) -> ActionKind {
        match self {
            ActionRequest::Summarize => ActionKind::Summarize,
            ActionRequest::Answer { .. } => ActionKind::Answer,
        }
    }

    pub fn question(&self) -> Option<&str> {
        match self {
            ActionRequest::Summarize => None,
            ActionRequest::Answer { question } => Some(question),
        }
    }
}

/// Non-error results of an action attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// Generated text. The session was charged one action.
    Content(String),
    /// The gate refused the action; the model was not called.
    QuotaExceeded { remaining: u32 },
}

/// Failures of a single action attempt. None of them charge the session.
#[derive(Debug, Error)]
pub enum ActionError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("No document has been uploaded for this session")]
    NoDocument,

    #[error("LLM request failed: {0}")]
    Llm(#[from] ProviderError),
}

impl ActionError {
    /// Label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ActionError::InvalidRequest(_) => "invalid_request",
            ActionError::NoDocument => "no_document",
            ActionError::Llm(_) => "llm_error",
        }
    }
}

/// `Ok` carries content or a quota refusal; `Err` is the failure case.
pub type ActionResult = Result<ActionOutcome, ActionError>;
