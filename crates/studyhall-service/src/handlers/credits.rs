//! Credit balance and transaction handlers.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use studyhall_core::{CreditMeta, CreditTransaction, TransactionSource, User};

use crate::auth::{AdminAuth, Caller, CallerJson};
use crate::error::ApiError;
use crate::state::AppState;

/// Balance response.
#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    /// Current balance.
    pub credits: i64,
    /// The user record.
    pub user: User,
}

/// Get the caller's balance, creating the user on first reference.
pub async fn get_balance(
    State(state): State<Arc<AppState>>,
    Caller(user_id): Caller,
) -> Result<Json<BalanceResponse>, ApiError> {
    let user = state.store.get_or_create_user(&user_id)?;

    Ok(Json(BalanceResponse {
        credits: user.credits,
        user,
    }))
}

/// Transaction list query parameters.
#[derive(Debug, Deserialize)]
pub struct ListTransactionsQuery {
    /// Maximum number of transactions to return (default: 50).
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// Offset for pagination (default: 0).
    #[serde(default)]
    pub offset: usize,
}

fn default_limit() -> usize {
    50
}

/// List transactions response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTransactionsResponse {
    /// Transactions (newest first).
    pub transactions: Vec<CreditTransaction>,
    /// Whether there are more transactions.
    pub has_more: bool,
}

/// List the caller's transaction history.
pub async fn list_transactions(
    State(state): State<Arc<AppState>>,
    Caller(user_id): Caller,
    Query(query): Query<ListTransactionsQuery>,
) -> Result<Json<ListTransactionsResponse>, ApiError> {
    state.store.get_or_create_user(&user_id)?;

    // Fetch one more than requested to determine has_more
    let limit = query.limit.min(100);
    let mut transactions =
        state
            .store
            .list_transactions_by_user(&user_id, limit + 1, query.offset)?;

    let has_more = transactions.len() > limit;
    transactions.truncate(limit);

    Ok(Json(ListTransactionsResponse {
        transactions,
        has_more,
    }))
}

/// Amount request body.
#[derive(Debug, Deserialize)]
pub struct AmountRequest {
    /// Number of credits.
    #[serde(default)]
    pub amount: i64,
}

/// Credits response.
#[derive(Debug, Serialize)]
pub struct CreditsResponse {
    /// Balance after the operation.
    pub credits: i64,
}

/// Spend credits from the caller's balance.
pub async fn consume_credits(
    State(state): State<Arc<AppState>>,
    CallerJson(user_id, request): CallerJson<AmountRequest>,
) -> Result<Json<CreditsResponse>, ApiError> {
    let user = state
        .store
        .consume_credits(&user_id, request.amount, TransactionSource::Manual)?;

    Ok(Json(CreditsResponse {
        credits: user.credits,
    }))
}

/// Grant credits to a user (admin only).
pub async fn admin_add_credits(
    State(state): State<Arc<AppState>>,
    admin: AdminAuth,
    CallerJson(user_id, request): CallerJson<AmountRequest>,
) -> Result<Json<CreditsResponse>, ApiError> {
    let user = state.store.add_credits(
        &user_id,
        request.amount,
        CreditMeta::from_source(TransactionSource::Admin),
    )?;

    tracing::info!(
        admin_id = %admin.admin_id,
        user_id = %user_id,
        amount = %request.amount,
        "Admin granted credits"
    );

    Ok(Json(CreditsResponse {
        credits: user.credits,
    }))
}
