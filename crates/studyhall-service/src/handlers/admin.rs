//! Admin dashboard handlers.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use studyhall_store::StoreStats;

use crate::auth::AdminAuth;
use crate::error::ApiError;
use crate::state::AppState;

/// Aggregate counters for the dashboard.
pub async fn stats(
    State(state): State<Arc<AppState>>,
    _admin: AdminAuth,
) -> Result<Json<StoreStats>, ApiError> {
    Ok(Json(state.store.stats()?))
}
