//! Teacher booking handlers.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use studyhall_core::{Booking, BookingId, BookingStatus, TransactionSource};

use crate::auth::CallerJson;
use crate::error::ApiError;
use crate::state::AppState;

/// Create booking request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    /// The teacher to book.
    pub teacher_id: String,
    /// Slot start (RFC 3339).
    pub start_iso: DateTime<Utc>,
    /// Slot end (RFC 3339).
    pub end_iso: DateTime<Utc>,
}

/// Single booking response.
#[derive(Debug, Serialize)]
pub struct BookingResponse {
    /// The booking.
    pub booking: Booking,
    /// The caller's balance after the charge, on creation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credits: Option<i64>,
}

/// Book a teacher, charging their hourly rate.
pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    CallerJson(user_id, request): CallerJson<CreateBookingRequest>,
) -> Result<Json<BookingResponse>, ApiError> {
    if request.end_iso <= request.start_iso {
        return Err(ApiError::BadRequest("endIso must be after startIso".into()));
    }

    let teacher = state
        .store
        .list_teachers()?
        .into_iter()
        .find(|t| t.id == request.teacher_id)
        .ok_or_else(|| ApiError::NotFound(format!("teacher not found: {}", request.teacher_id)))?;

    state.store.get_or_create_user(&user_id)?;
    let user = state.store.consume_credits(
        &user_id,
        teacher.hourly_credits,
        TransactionSource::TeacherBooking,
    )?;

    let booking = Booking::new(teacher.id, user_id, request.start_iso, request.end_iso);
    state.store.put_booking(&booking)?;

    tracing::info!(
        booking_id = %booking.id,
        teacher_id = %booking.teacher_id,
        user_id = %booking.user_id,
        "Booking created"
    );

    Ok(Json(BookingResponse {
        booking,
        credits: Some(user.credits),
    }))
}

/// Booking status update request.
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    /// New status (`pending`, `approved`, `rejected`, `cancelled`).
    pub status: String,
}

/// Update a booking's status.
pub async fn update_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<BookingResponse>, ApiError> {
    let booking_id: BookingId = id
        .parse()
        .map_err(|_| ApiError::NotFound(format!("booking not found: {id}")))?;
    let status: BookingStatus = request.status.parse().map_err(ApiError::BadRequest)?;

    let booking = state.store.set_booking_status(&booking_id, status)?;

    Ok(Json(BookingResponse {
        booking,
        credits: None,
    }))
}
