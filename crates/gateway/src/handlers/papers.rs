//! Paper lifecycle handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::AppState;
use examforge_core::{
    auth::OwnerContext,
    engine::MetadataUpdate,
    errors::{AppError, Result},
    model::{
        ExamType, GenerationRequest, Paper, PaperStatus, ProvenanceRatio, QuestionCategory,
        QuestionSpec,
    },
};

/// Request to generate a new paper
#[derive(Debug, Deserialize, Validate)]
pub struct GeneratePaperRequest {
    #[validate(length(min = 1, max = 200))]
    pub subject: String,

    #[validate(length(min = 1, max = 200))]
    pub department: String,

    #[serde(default)]
    pub section: Option<String>,

    #[serde(default)]
    pub year: Option<i32>,

    pub exam_type: ExamType,

    /// Free-text topic focus forwarded to the generation service
    #[serde(default)]
    #[validate(length(max = 2000))]
    pub topic_focus: Option<String>,

    #[validate(length(min = 1, max = 4))]
    pub categories: Vec<CategoryInput>,

    pub provenance: ProvenanceInput,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct CategoryInput {
    pub category: QuestionCategory,
    pub count: u32,
    pub marks_each: u32,
}

#[derive(Debug, Deserialize)]
pub struct ProvenanceInput {
    pub previous_percent: u32,
    pub creative_percent: u32,
    pub new_percent: u32,
}

impl GeneratePaperRequest {
    fn into_core(self) -> GenerationRequest {
        GenerationRequest {
            subject: self.subject,
            department: self.department,
            section: self.section,
            year: self.year,
            exam_type: self.exam_type,
            topic_focus: self.topic_focus,
            categories: self
                .categories
                .into_iter()
                .map(|c| QuestionSpec {
                    category: c.category,
                    count: c.count,
                    marks_each: c.marks_each,
                })
                .collect(),
            provenance: ProvenanceRatio {
                previous_percent: self.provenance.previous_percent,
                creative_percent: self.provenance.creative_percent,
                new_percent: self.provenance.new_percent,
            },
        }
    }
}

/// Request to regenerate a paper's content
#[derive(Debug, Default, Deserialize)]
pub struct RegeneratePaperRequest {
    #[serde(default)]
    pub feedback_prompt: Option<String>,
}

/// Request to edit a draft paper's metadata
#[derive(Debug, Deserialize)]
pub struct UpdateMetadataRequest {
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub section: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub total_marks: Option<u32>,
}

/// Search filters for approved papers
#[derive(Debug, Default, Deserialize)]
pub struct SearchApprovedQuery {
    pub subject: Option<String>,
    pub department: Option<String>,
}

/// Condensed paper view for list and search responses
#[derive(Serialize)]
pub struct PaperListItem {
    pub id: Uuid,
    pub subject: String,
    pub department: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    pub total_marks: u32,
    pub question_count: usize,
    pub status: PaperStatus,
    pub regeneration_count: u32,
    pub is_edit_copy: bool,
    pub created_at: String,
}

impl From<&Paper> for PaperListItem {
    fn from(paper: &Paper) -> Self {
        Self {
            id: paper.id,
            subject: paper.subject.clone(),
            department: paper.department.clone(),
            section: paper.section.clone(),
            year: paper.year,
            total_marks: paper.total_marks,
            question_count: paper.questions.len(),
            status: paper.status,
            regeneration_count: paper.regeneration_count,
            is_edit_copy: paper.is_edit_copy,
            created_at: paper.created_at.to_rfc3339(),
        }
    }
}

#[derive(Serialize)]
pub struct SubjectsResponse {
    pub subjects: Vec<String>,
}

/// Generate a new paper from a request
pub async fn create_paper(
    State(state): State<AppState>,
    owner: OwnerContext,
    Json(request): Json<GeneratePaperRequest>,
) -> Result<(StatusCode, Json<Paper>)> {
    request.validate().map_err(|e| AppError::Validation {
        message: e.to_string(),
        field: None,
    })?;

    let paper = state
        .engine
        .create_paper(&owner.owner_id, request.into_core())
        .await?;

    Ok((StatusCode::CREATED, Json(paper)))
}

/// List all of the caller's papers
pub async fn list_papers(
    State(state): State<AppState>,
    owner: OwnerContext,
) -> Json<Vec<PaperListItem>> {
    let papers = state.engine.list_papers(&owner.owner_id).await;
    Json(papers.iter().map(PaperListItem::from).collect())
}

/// Get a paper by ID
pub async fn get_paper(
    State(state): State<AppState>,
    owner: OwnerContext,
    Path(paper_id): Path<Uuid>,
) -> Result<Json<Paper>> {
    let paper = state.engine.get_paper(&owner.owner_id, paper_id).await?;
    Ok(Json(paper))
}

/// Edit a draft paper's metadata
pub async fn update_metadata(
    State(state): State<AppState>,
    owner: OwnerContext,
    Path(paper_id): Path<Uuid>,
    Json(request): Json<UpdateMetadataRequest>,
) -> Result<Json<Paper>> {
    let update = MetadataUpdate {
        subject: request.subject,
        department: request.department,
        section: request.section,
        year: request.year,
        total_marks: request.total_marks,
    };

    let paper = state
        .engine
        .update_metadata(&owner.owner_id, paper_id, update)
        .await?;
    Ok(Json(paper))
}

/// Regenerate a draft paper's content, optionally steered by feedback
pub async fn regenerate_paper(
    State(state): State<AppState>,
    owner: OwnerContext,
    Path(paper_id): Path<Uuid>,
    Json(request): Json<RegeneratePaperRequest>,
) -> Result<Json<Paper>> {
    let paper = state
        .engine
        .regenerate(&owner.owner_id, paper_id, request.feedback_prompt)
        .await?;
    Ok(Json(paper))
}

/// Approve a draft paper, producing both PDF artifacts
pub async fn approve_paper(
    State(state): State<AppState>,
    owner: OwnerContext,
    Path(paper_id): Path<Uuid>,
) -> Result<Json<Paper>> {
    let paper = state.engine.approve(&owner.owner_id, paper_id).await?;
    Ok(Json(paper))
}

/// Delete a paper
pub async fn delete_paper(
    State(state): State<AppState>,
    owner: OwnerContext,
    Path(paper_id): Path<Uuid>,
) -> Result<StatusCode> {
    state.engine.delete_paper(&owner.owner_id, paper_id).await?;

    tracing::info!(
        paper_id = %paper_id,
        owner_id = %owner.owner_id,
        "Paper deleted"
    );

    Ok(StatusCode::NO_CONTENT)
}

/// Search approved papers by subject and department
pub async fn search_approved(
    State(state): State<AppState>,
    owner: OwnerContext,
    Query(query): Query<SearchApprovedQuery>,
) -> Json<Vec<PaperListItem>> {
    let papers = state
        .engine
        .search_approved(
            &owner.owner_id,
            query.subject.as_deref(),
            query.department.as_deref(),
        )
        .await;
    Json(papers.iter().map(PaperListItem::from).collect())
}

/// List distinct subjects across approved papers
pub async fn approved_subjects(
    State(state): State<AppState>,
    owner: OwnerContext,
) -> Json<SubjectsResponse> {
    let subjects = state.engine.approved_subjects(&owner.owner_id).await;
    Json(SubjectsResponse { subjects })
}

/// Fork an approved paper into a fresh draft lineage for editing
pub async fn copy_for_edit(
    State(state): State<AppState>,
    owner: OwnerContext,
    Path(paper_id): Path<Uuid>,
) -> Result<(StatusCode, Json<Paper>)> {
    let copy = state
        .engine
        .create_edit_copy(&owner.owner_id, paper_id)
        .await?;

    tracing::info!(
        paper_id = %copy.id,
        source_paper_id = %paper_id,
        owner_id = %owner.owner_id,
        "Edit copy created"
    );

    Ok((StatusCode::CREATED, Json(copy)))
}
