use super::lock_session;
use crate::dtos::{ActionResponse, AskRequest};
use crate::models::{ActionOutcome, ActionResult, Session, SessionId, UsageSnapshot};
use crate::startup::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use service_core::error::AppError;
use validator::Validate;

#[tracing::instrument(skip(state), fields(kind = "summarize"))]
pub async fn request_summary(
    State(state): State<AppState>,
    Path(id): Path<SessionId>,
) -> Result<Response, AppError> {
    let mut session = lock_session(&state, &id)?;
    let result = state.orchestrator.request_summary(&mut session).await;
    render(&state, &session, result)
}

#[tracing::instrument(skip(state, request), fields(kind = "answer"))]
pub async fn request_answer(
    State(state): State<AppState>,
    Path(id): Path<SessionId>,
    Json(request): Json<AskRequest>,
) -> Result<Response, AppError> {
    request.validate()?;

    let mut session = lock_session(&state, &id)?;
    let result = state
        .orchestrator
        .request_answer(&mut session, &request.question)
        .await;
    render(&state, &session, result)
}

/// Content is 200; a quota refusal is 402 with the upgrade link.
fn render(state: &AppState, session: &Session, result: ActionResult) -> Result<Response, AppError> {
    let upgrade_url = &state.config.quota.upgrade_url;
    let usage = UsageSnapshot::from_session(session, upgrade_url);

    let response = match result? {
        ActionOutcome::Content(content) => {
            (StatusCode::OK, Json(ActionResponse::Content { content, usage })).into_response()
        }
        ActionOutcome::QuotaExceeded { remaining } => (
            StatusCode::PAYMENT_REQUIRED,
            Json(ActionResponse::QuotaExceeded {
                remaining,
                upgrade_url: upgrade_url.clone(),
                usage,
            }),
        )
            .into_response(),
    };

    Ok(response)
}
