use super::state::AppState;
use crate::backend::{find_category, load_catalog, CodeExecutionRequest};
use crate::error::{DeviceError, SessionError, UploadError};
use crate::execution::RunOutcome;
use crate::media::TrackKind;
use crate::session::{ResumeFile, SessionController, SessionHandle, SessionPhase};
use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    pub category_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ResumeQuery {
    pub file_name: String,
}

#[derive(Debug, Deserialize)]
pub struct ScreenShareRequest {
    pub enabled: bool,
}

#[derive(Debug, Deserialize)]
pub struct TranscriptRequest {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct DeviceLostRequest {
    pub kind: TrackKind,
}

#[derive(Debug, Serialize)]
pub struct ToggleResponse {
    pub enabled: bool,
}

#[derive(Debug, Serialize)]
pub struct RunCodeResponse {
    /// ok | error | timeout | discarded
    pub status: &'static str,
    pub output: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ============================================================================
// Helpers
// ============================================================================

fn error_response(status: StatusCode, error: impl ToString) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
        }),
    )
        .into_response()
}

fn session_error_response(e: SessionError) -> Response {
    let status = match &e {
        SessionError::Precondition => StatusCode::PRECONDITION_FAILED,
        SessionError::AlreadyRunning | SessionError::InvalidPhase { .. } => StatusCode::CONFLICT,
        SessionError::Upload(UploadError::Rejected(_)) => StatusCode::UNPROCESSABLE_ENTITY,
        SessionError::Device(_) => StatusCode::FAILED_DEPENDENCY,
        SessionError::Upload(_) | SessionError::Channel(_) | SessionError::Start(_) => {
            StatusCode::BAD_GATEWAY
        }
        SessionError::Ended | SessionError::Cancelled => StatusCode::GONE,
    };

    warn!("Session request failed ({}): {}", status, e);
    error_response(status, e)
}

async fn current_session(state: &AppState) -> Result<SessionHandle, Response> {
    state
        .session
        .read()
        .await
        .clone()
        .ok_or_else(|| error_response(StatusCode::NOT_FOUND, "No interview session"))
}

/// Reply with the session snapshot after a successful command
async fn snapshot_response(handle: &SessionHandle, status: StatusCode) -> Response {
    match handle.snapshot().await {
        Ok(snapshot) => (status, Json(snapshot)).into_response(),
        Err(e) => session_error_response(e),
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// GET /categories
/// Interview categories, falling back to the built-in list
pub async fn list_categories(State(state): State<AppState>) -> impl IntoResponse {
    Json(load_catalog(state.catalog.as_ref()).await)
}

/// POST /session
/// Create a session for a category and present it
pub async fn create_session(
    State(state): State<AppState>,
    Json(req): Json<CreateSessionRequest>,
) -> Response {
    let mut slot = state.session.write().await;

    if let Some(existing) = slot.as_ref() {
        if let Ok(snapshot) = existing.snapshot().await {
            if snapshot.phase != SessionPhase::Ended {
                return error_response(
                    StatusCode::CONFLICT,
                    format!(
                        "Interview {} is still {}",
                        snapshot.category_id, snapshot.phase
                    ),
                );
            }
        }
    }

    let categories = load_catalog(state.catalog.as_ref()).await;
    let category = match find_category(&categories, &req.category_id) {
        Some(category) => category.clone(),
        None => {
            return error_response(
                StatusCode::NOT_FOUND,
                format!("Unknown interview category {}", req.category_id),
            )
        }
    };

    let mut controller = SessionController::new(
        category,
        state.session_config.clone(),
        state.collaborators.clone(),
    );
    if let Err(e) = controller.present() {
        return session_error_response(e);
    }

    let (handle, _task) = SessionHandle::spawn(controller);
    info!("Interview session created for {}", req.category_id);

    let response = snapshot_response(&handle, StatusCode::CREATED).await;
    *slot = Some(handle);
    response
}

/// GET /session
pub async fn get_session(State(state): State<AppState>) -> Response {
    match current_session(&state).await {
        Ok(handle) => snapshot_response(&handle, StatusCode::OK).await,
        Err(response) => response,
    }
}

/// POST /session/resume?file_name=cv.pdf
/// Upload the resume (raw document body)
pub async fn upload_resume(
    State(state): State<AppState>,
    Query(query): Query<ResumeQuery>,
    body: Bytes,
) -> Response {
    let handle = match current_session(&state).await {
        Ok(handle) => handle,
        Err(response) => return response,
    };

    let file = ResumeFile::new(query.file_name, body.to_vec());
    match handle.submit_resume(file).await {
        Ok(()) => snapshot_response(&handle, StatusCode::OK).await,
        Err(e) => session_error_response(e),
    }
}

/// POST /session/start
pub async fn start_session(State(state): State<AppState>) -> Response {
    let handle = match current_session(&state).await {
        Ok(handle) => handle,
        Err(response) => return response,
    };

    match handle.start().await {
        Ok(()) => snapshot_response(&handle, StatusCode::OK).await,
        Err(e) => {
            error!("Failed to start interview: {}", e);
            session_error_response(e)
        }
    }
}

/// POST /session/end
pub async fn end_session(State(state): State<AppState>) -> Response {
    let handle = match current_session(&state).await {
        Ok(handle) => handle,
        Err(response) => return response,
    };

    match handle.end().await {
        Ok(snapshot) => (StatusCode::OK, Json(snapshot)).into_response(),
        Err(e) => session_error_response(e),
    }
}

/// POST /session/media/video
pub async fn toggle_video(State(state): State<AppState>) -> Response {
    let handle = match current_session(&state).await {
        Ok(handle) => handle,
        Err(response) => return response,
    };

    match handle.toggle_video().await {
        Ok(enabled) => Json(ToggleResponse { enabled }).into_response(),
        Err(e) => session_error_response(e),
    }
}

/// POST /session/media/audio
pub async fn toggle_audio(State(state): State<AppState>) -> Response {
    let handle = match current_session(&state).await {
        Ok(handle) => handle,
        Err(response) => return response,
    };

    match handle.toggle_audio().await {
        Ok(enabled) => Json(ToggleResponse { enabled }).into_response(),
        Err(e) => session_error_response(e),
    }
}

/// POST /session/media/screen
pub async fn screen_share(
    State(state): State<AppState>,
    Json(req): Json<ScreenShareRequest>,
) -> Response {
    let handle = match current_session(&state).await {
        Ok(handle) => handle,
        Err(response) => return response,
    };

    match handle.set_screen_share(req.enabled).await {
        Ok(()) => snapshot_response(&handle, StatusCode::OK).await,
        Err(e) => session_error_response(e),
    }
}

/// POST /session/media/lost
/// A held device stopped (unplugged or revoked); ends an active interview
pub async fn device_lost(
    State(state): State<AppState>,
    Json(req): Json<DeviceLostRequest>,
) -> Response {
    let handle = match current_session(&state).await {
        Ok(handle) => handle,
        Err(response) => return response,
    };

    match handle.report_device_failure(DeviceError::Lost(req.kind)).await {
        Ok(snapshot) => Json(snapshot).into_response(),
        Err(e) => session_error_response(e),
    }
}

/// POST /session/transcript
/// Caption candidate speech recognized by the presentation layer
pub async fn record_transcript(
    State(state): State<AppState>,
    Json(req): Json<TranscriptRequest>,
) -> Response {
    let handle = match current_session(&state).await {
        Ok(handle) => handle,
        Err(response) => return response,
    };

    match handle.record_transcript(req.text).await {
        Ok(()) => snapshot_response(&handle, StatusCode::OK).await,
        Err(e) => session_error_response(e),
    }
}

/// POST /session/code/run
/// Run code for a technical interview; failures are reported in the output
pub async fn run_code(
    State(state): State<AppState>,
    Json(req): Json<CodeExecutionRequest>,
) -> Response {
    let handle = match current_session(&state).await {
        Ok(handle) => handle,
        Err(response) => return response,
    };

    let Some(runner) = handle.code_runner() else {
        return error_response(
            StatusCode::BAD_REQUEST,
            "Code execution is only available in technical interviews",
        );
    };

    let pending = match runner.submit(req) {
        Ok(pending) => pending,
        Err(e) => return session_error_response(e),
    };

    let outcome = pending.await;
    let status = match &outcome {
        RunOutcome::Output(_) => "ok",
        RunOutcome::Failed(_) => "error",
        RunOutcome::TimedOut(_) => "timeout",
        RunOutcome::Discarded => "discarded",
    };

    Json(RunCodeResponse {
        status,
        output: outcome.display_text(),
    })
    .into_response()
}
