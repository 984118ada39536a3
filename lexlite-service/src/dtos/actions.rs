use crate::models::UsageSnapshot;
use serde::{Deserialize, Serialize};
use validator::Validate;

pub const MAX_QUESTION_CHARS: u64 = 2000;

/// Body of `POST /sessions/:id/answer`.
///
/// Emptiness is not checked here: an empty question must still lose to the
/// missing-document and quota checks, so the orchestrator rejects it.
#[derive(Debug, Deserialize, Validate)]
pub struct AskRequest {
    #[validate(length(max = MAX_QUESTION_CHARS, message = "Question is too long"))]
    pub question: String,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ActionResponse {
    Content {
        content: String,
        usage: UsageSnapshot,
    },
    QuotaExceeded {
        remaining: u32,
        upgrade_url: String,
        usage: UsageSnapshot,
    },
}
