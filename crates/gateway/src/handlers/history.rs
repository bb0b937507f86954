//! Generation history handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::AppState;
use examforge_core::{auth::OwnerContext, errors::Result, model::HistoryEntry};

#[derive(Serialize)]
pub struct ClearHistoryResponse {
    pub deleted_count: usize,
}

/// List the caller's generation history, newest first
pub async fn list_history(
    State(state): State<AppState>,
    owner: OwnerContext,
) -> Json<Vec<HistoryEntry>> {
    Json(state.engine.list_history(&owner.owner_id).await)
}

/// Delete a single history entry; any paper it references is untouched
pub async fn delete_history_entry(
    State(state): State<AppState>,
    owner: OwnerContext,
    Path(entry_id): Path<Uuid>,
) -> Result<StatusCode> {
    state
        .engine
        .delete_history_entry(&owner.owner_id, entry_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Clear the caller's entire generation history
pub async fn clear_history(
    State(state): State<AppState>,
    owner: OwnerContext,
) -> Json<ClearHistoryResponse> {
    let deleted_count = state.engine.clear_history(&owner.owner_id).await;

    tracing::info!(
        owner_id = %owner.owner_id,
        deleted_count,
        "History cleared"
    );

    Json(ClearHistoryResponse { deleted_count })
}
