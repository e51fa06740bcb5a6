//! Video session handlers.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use studyhall_core::{SessionId, VideoSession};

use super::NoBody;
use crate::auth::{Caller, CallerJson};
use crate::error::ApiError;
use crate::state::AppState;

/// Single session response.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    /// The session.
    pub session: VideoSession,
}

/// Session history response.
#[derive(Debug, Serialize)]
pub struct SessionListResponse {
    /// Sessions the caller created or joined, oldest first.
    pub sessions: Vec<VideoSession>,
}

fn parse_session_id(raw: &str) -> Result<SessionId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::NotFound(format!("session not found: {raw}")))
}

/// Start a billable session. No credits move until it ends.
pub async fn start_session(
    State(state): State<Arc<AppState>>,
    CallerJson(user_id, NoBody {}): CallerJson<NoBody>,
) -> Result<Json<SessionResponse>, ApiError> {
    let session = state
        .sessions
        .start(&user_id, state.config.video_session_cost)?;
    Ok(Json(SessionResponse { session }))
}

/// End a session and charge the caller.
pub async fn end_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    CallerJson(user_id, NoBody {}): CallerJson<NoBody>,
) -> Result<Json<SessionResponse>, ApiError> {
    let session_id = parse_session_id(&id)?;
    let ended = state.sessions.end(&session_id, &user_id)?;
    Ok(Json(SessionResponse {
        session: ended.session,
    }))
}

/// Record the caller as the session's second participant.
pub async fn join_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    CallerJson(user_id, NoBody {}): CallerJson<NoBody>,
) -> Result<Json<SessionResponse>, ApiError> {
    let session_id = parse_session_id(&id)?;
    let session = state.sessions.record_peer(&session_id, &user_id)?;
    Ok(Json(SessionResponse { session }))
}

/// List the caller's sessions.
pub async fn history(
    State(state): State<Arc<AppState>>,
    Caller(user_id): Caller,
) -> Result<Json<SessionListResponse>, ApiError> {
    let sessions = state.sessions.list(&user_id)?;
    Ok(Json(SessionListResponse { sessions }))
}
