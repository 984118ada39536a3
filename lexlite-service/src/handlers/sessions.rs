use super::{lock_session, session_not_found};
use crate::dtos::{DocumentView, SessionResponse, UploadResponse};
use crate::models::{SessionId, UsageSnapshot};
use crate::services::UploadOutcome;
use crate::startup::AppState;
use axum::{
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;

pub async fn create_session(State(state): State<AppState>) -> impl IntoResponse {
    let (id, handle) = state.store.create(state.config.quota.free_actions);
    let snapshot = handle.snapshot();

    tracing::info!(session_id = %id, quota = snapshot.quota, "Session created");

    (
        StatusCode::CREATED,
        Json(SessionResponse::new(snapshot, &state.config.quota.upgrade_url)),
    )
}

pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<SessionId>,
) -> Result<Json<SessionResponse>, AppError> {
    let handle = state.store.get(&id).ok_or_else(session_not_found)?;

    Ok(Json(SessionResponse::new(
        handle.snapshot(),
        &state.config.quota.upgrade_url,
    )))
}

pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<SessionId>,
) -> Result<StatusCode, AppError> {
    if !state.store.remove(&id) {
        return Err(session_not_found());
    }
    tracing::info!(session_id = %id, "Session disposed");
    Ok(StatusCode::NO_CONTENT)
}

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(e.body_text())
    } else {
        AppError::BadRequest(anyhow::anyhow!("Failed to read multipart body: {}", e))
    }
}

/// Accept a PDF in the multipart field `file` and attach it to the session.
pub async fn upload_document(
    State(state): State<AppState>,
    Path(id): Path<SessionId>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    if state.store.get(&id).is_none() {
        return Err(session_not_found());
    }

    let mut upload = None;
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().map(|name| name.to_string());
        let data = field.bytes().await.map_err(multipart_error)?;
        upload = Some((file_name, data.to_vec()));
        break;
    }

    let (file_name, data) = upload
        .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("No file uploaded")))?;
    if data.is_empty() {
        return Err(AppError::BadRequest(anyhow::anyhow!("Uploaded file is empty")));
    }

    let mut session = lock_session(&state, &id)?;
    let outcome = state
        .orchestrator
        .upload(&mut session, file_name, data)
        .await?;

    let status = match outcome {
        UploadOutcome::Loaded | UploadOutcome::Replaced => StatusCode::CREATED,
        UploadOutcome::Ignored => StatusCode::OK,
    };

    Ok((
        status,
        Json(UploadResponse {
            status: outcome,
            document: session.document().map(DocumentView::from),
            usage: UsageSnapshot::from_session(&session, &state.config.quota.upgrade_url),
        }),
    ))
}
