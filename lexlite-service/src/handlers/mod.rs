//! HTTP handlers for the LexLite service.

pub mod actions;
pub mod health;
pub mod metrics;
pub mod sessions;

pub use actions::{request_answer, request_summary};
pub use health::{health_check, readiness_check};
pub use metrics::metrics;
pub use sessions::{create_session, delete_session, get_session, upload_document};

use crate::models::{ActionError, SessionId};
use crate::services::providers::ProviderError;
use crate::services::{ExtractionError, SessionGuard};
use crate::startup::AppState;
use service_core::error::AppError;

impl From<ActionError> for AppError {
    fn from(err: ActionError) -> Self {
        match err {
            ActionError::InvalidRequest(msg) => AppError::BadRequest(anyhow::anyhow!(msg)),
            ActionError::NoDocument => AppError::Conflict(anyhow::anyhow!(
                "No document has been uploaded for this session"
            )),
            ActionError::Llm(e @ ProviderError::Timeout(_)) => {
                AppError::GatewayTimeout(format!("{}. Please try again", e))
            }
            ActionError::Llm(e) => AppError::BadGateway(format!("{}. Please try again", e)),
        }
    }
}

impl From<ExtractionError> for AppError {
    fn from(err: ExtractionError) -> Self {
        match err {
            ExtractionError::NotPdf => AppError::BadRequest(anyhow::anyhow!(err)),
            ExtractionError::Malformed(_) | ExtractionError::NoPages => {
                AppError::UnprocessableEntity(anyhow::anyhow!(err))
            }
        }
    }
}

fn session_not_found() -> AppError {
    AppError::NotFound(anyhow::anyhow!("Session not found"))
}

/// Take exclusive hold of a session for a mutating request.
///
/// Fails with 409 instead of queueing when another request already holds it.
pub(crate) fn lock_session(state: &AppState, id: &SessionId) -> Result<SessionGuard, AppError> {
    let handle = state.store.get(id).ok_or_else(session_not_found)?;
    handle.try_lock().ok_or_else(|| {
        tracing::warn!(session_id = %id, "Rejected request: session busy");
        AppError::Conflict(anyhow::anyhow!(
            "Another request is already in progress for this session"
        ))
    })
}
