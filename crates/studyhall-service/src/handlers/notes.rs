//! Notes marketplace handlers.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use studyhall_core::{NewNote, Note, NoteId, NoteOrder, TransactionSource, NOTE_PURCHASE_CREDITS};

use super::NoBody;
use crate::auth::CallerJson;
use crate::error::ApiError;
use crate::state::AppState;

/// Create note request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNoteRequest {
    /// Title.
    #[serde(default)]
    pub title: String,
    /// Description.
    #[serde(default)]
    pub description: String,
    /// Category.
    #[serde(default)]
    pub category: String,
    /// Listed price (default: 1).
    #[serde(default = "default_price")]
    pub price_credits: i64,
    /// Path of the uploaded document.
    #[serde(default)]
    pub storage_path: String,
}

fn default_price() -> i64 {
    NOTE_PURCHASE_CREDITS
}

/// Single note response.
#[derive(Debug, Serialize)]
pub struct NoteResponse {
    /// The note.
    pub note: Note,
}

/// List a new note owned by the caller.
pub async fn create_note(
    State(state): State<Arc<AppState>>,
    CallerJson(user_id, request): CallerJson<CreateNoteRequest>,
) -> Result<Json<NoteResponse>, ApiError> {
    if [&request.title, &request.category, &request.storage_path]
        .iter()
        .any(|field| field.trim().is_empty())
    {
        return Err(ApiError::BadRequest(
            "title, category and storagePath are required".into(),
        ));
    }
    if request.price_credits <= 0 {
        return Err(ApiError::InvalidAmount(request.price_credits));
    }

    let note = Note::new(NewNote {
        owner_user_id: user_id,
        title: request.title,
        description: request.description,
        category: request.category,
        price_credits: request.price_credits,
        storage_path: request.storage_path,
    });
    state.store.put_note(&note)?;

    tracing::info!(note_id = %note.id, owner = %note.owner_user_id, "Note listed");

    Ok(Json(NoteResponse { note }))
}

/// Note list query parameters.
#[derive(Debug, Deserialize)]
pub struct ListNotesQuery {
    /// Only notes in this category.
    #[serde(default)]
    pub category: Option<String>,
    /// `popular` or `latest` (default).
    #[serde(default)]
    pub order: NoteOrder,
}

/// Note list response.
#[derive(Debug, Serialize)]
pub struct NotesResponse {
    /// Matching notes.
    pub notes: Vec<Note>,
}

/// List notes.
pub async fn list_notes(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListNotesQuery>,
) -> Result<Json<NotesResponse>, ApiError> {
    let category = query.category.as_deref().filter(|c| !c.is_empty());
    let notes = state.store.list_notes(category, query.order)?;
    Ok(Json(NotesResponse { notes }))
}

/// Purchase response.
#[derive(Debug, Serialize)]
pub struct PurchaseResponse {
    /// Always true on success.
    pub ok: bool,
    /// The note with its updated download count.
    pub note: Note,
    /// The caller's balance after the charge.
    pub credits: i64,
}

/// Buy a note download for one credit.
pub async fn purchase_note(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    CallerJson(user_id, NoBody {}): CallerJson<NoBody>,
) -> Result<Json<PurchaseResponse>, ApiError> {
    let not_found = || ApiError::NotFound(format!("note not found: {id}"));
    let note_id: NoteId = id.parse().map_err(|_| not_found())?;
    state.store.get_note(&note_id)?.ok_or_else(not_found)?;
    state.store.get_or_create_user(&user_id)?;

    let user = state.store.consume_credits(
        &user_id,
        NOTE_PURCHASE_CREDITS,
        TransactionSource::NotePurchase,
    )?;
    let note = state.store.increment_note_downloads(&note_id)?;

    Ok(Json(PurchaseResponse {
        ok: true,
        note,
        credits: user.credits,
    }))
}
