//! Approved-paper analytics handlers

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::AppState;
use examforge_core::{
    aggregate::PaperSetSummary,
    auth::OwnerContext,
    engine::SummaryFilter,
    errors::Result,
};

/// Filters and options for the summary endpoint
#[derive(Debug, Default, Deserialize)]
pub struct SummaryQuery {
    pub subject: Option<String>,
    pub department: Option<String>,
    /// Narrow the aggregation to a single approved paper
    pub paper_id: Option<Uuid>,
    /// When present, the insight generator is invoked with the aggregation
    pub custom_prompt: Option<String>,
}

/// Summarize the caller's approved papers
pub async fn summarize(
    State(state): State<AppState>,
    owner: OwnerContext,
    Query(query): Query<SummaryQuery>,
) -> Result<Json<PaperSetSummary>> {
    let filter = SummaryFilter {
        subject: query.subject,
        department: query.department,
        paper_id: query.paper_id,
    };

    let summary = state
        .engine
        .summarize(&owner.owner_id, filter, query.custom_prompt)
        .await?;

    Ok(Json(summary))
}
