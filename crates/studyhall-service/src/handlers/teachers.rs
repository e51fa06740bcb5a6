//! Teacher listing.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use studyhall_core::Teacher;

use crate::error::ApiError;
use crate::state::AppState;

/// Teacher list response.
#[derive(Debug, Serialize)]
pub struct TeachersResponse {
    /// Teachers available for booking.
    pub teachers: Vec<Teacher>,
}

/// List teachers.
pub async fn list_teachers(
    State(state): State<Arc<AppState>>,
) -> Result<Json<TeachersResponse>, ApiError> {
    Ok(Json(TeachersResponse {
        teachers: state.store.list_teachers()?,
    }))
}
