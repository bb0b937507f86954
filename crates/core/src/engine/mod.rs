//! Paper lifecycle controller
//!
//! Mediates every mutation of the paper store so the lifecycle invariants
//! hold after each operation:
//! - status follows the closed transition table (draft -> approved only)
//! - `regeneration_count` counts successful regenerations, monotonically
//! - `approved_artifacts` is present iff the paper is approved
//! - at most one mutating operation is in flight per lineage; the lineage
//!   lease is held for the full operation, external calls included
//! - a failed collaborator call leaves the paper exactly as it was
//!
//! Generation and regeneration attempts are recorded in the history ledger,
//! which is opened before the collaborator call and closed success/failed.

use crate::aggregate::{self, PaperSetSummary};
use crate::config::AppConfig;
use crate::distribution;
use crate::errors::{AppError, Result};
use crate::history::HistoryLedger;
use crate::metrics;
use crate::model::{
    ApprovedArtifacts, AttemptParameters, GenerationRequest, HistoryEntry, Paper, PaperStatus,
};
use crate::services::{
    create_document_renderer, create_generation_service, create_insight_generator,
    DocumentRenderer, GenerationService, InsightGenerator, RenderVariant,
};
use crate::store::PaperStore;
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

/// Metadata fields editable while a paper is in draft
#[derive(Clone, Debug, Default)]
pub struct MetadataUpdate {
    pub subject: Option<String>,
    pub department: Option<String>,
    pub section: Option<String>,
    pub year: Option<i32>,
    pub total_marks: Option<u32>,
}

impl MetadataUpdate {
    pub fn is_empty(&self) -> bool {
        self.subject.is_none()
            && self.department.is_none()
            && self.section.is_none()
            && self.year.is_none()
            && self.total_marks.is_none()
    }
}

/// Filters narrowing the paper set fed to the aggregation engine
#[derive(Clone, Debug, Default)]
pub struct SummaryFilter {
    pub subject: Option<String>,
    pub department: Option<String>,
    pub paper_id: Option<Uuid>,
}

/// Store sizes for readiness reporting
#[derive(Clone, Copy, Debug)]
pub struct EngineStats {
    pub papers: usize,
    pub history_entries: usize,
}

/// The paper store, lifecycle controller, and its collaborators
pub struct PaperEngine {
    store: PaperStore,
    ledger: HistoryLedger,
    generator: Arc<dyn GenerationService>,
    renderer: Arc<dyn DocumentRenderer>,
    insight: Arc<dyn InsightGenerator>,
}

impl PaperEngine {
    pub fn new(
        generator: Arc<dyn GenerationService>,
        renderer: Arc<dyn DocumentRenderer>,
        insight: Arc<dyn InsightGenerator>,
    ) -> Self {
        Self {
            store: PaperStore::new(),
            ledger: HistoryLedger::new(),
            generator,
            renderer,
            insight,
        }
    }

    /// Build an engine with collaborators from configuration
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            create_generation_service(&config.generation),
            create_document_renderer(&config.renderer),
            create_insight_generator(&config.insight),
        )
    }

    // ========================================================================
    // Paper operations
    // ========================================================================

    /// Validate a request, invoke the generation service, and persist the
    /// resulting paper as a new draft lineage
    pub async fn create_paper(&self, owner_id: &str, request: GenerationRequest) -> Result<Paper> {
        let targets = distribution::compute_targets(&request)?;

        let entry_id = self
            .ledger
            .open(owner_id, AttemptParameters::generation(&request))
            .await;

        let started = Instant::now();
        match self.generator.generate(&request, None).await {
            Ok(questions) => {
                metrics::record_generation(started.elapsed().as_secs_f64(), "generation", true);

                let paper = Paper {
                    id: Uuid::new_v4(),
                    owner_id: owner_id.to_string(),
                    subject: request.subject.clone(),
                    department: request.department.clone(),
                    section: request.section.clone(),
                    year: request.year,
                    exam_type: request.exam_type,
                    total_marks: targets.total_marks,
                    distribution: distribution::compute_realized(&questions),
                    questions,
                    status: PaperStatus::Draft,
                    regeneration_count: 0,
                    is_edit_copy: false,
                    source_paper_id: None,
                    approved_artifacts: None,
                    request,
                    created_at: Utc::now(),
                    approved_at: None,
                };

                self.store.insert(paper.clone()).await;
                self.ledger.complete(entry_id, paper.id).await?;

                metrics::record_lifecycle_event("generated");
                metrics::record_store_size(self.store.len().await);
                tracing::info!(
                    paper_id = %paper.id,
                    owner_id = %owner_id,
                    subject = %paper.subject,
                    total_marks = paper.total_marks,
                    questions = paper.questions.len(),
                    "Paper generated"
                );
                Ok(paper)
            }
            Err(err) => {
                metrics::record_generation(started.elapsed().as_secs_f64(), "generation", false);
                self.ledger.fail(entry_id, err.to_string()).await?;
                Err(err)
            }
        }
    }

    /// Get a paper by id
    pub async fn get_paper(&self, owner_id: &str, paper_id: Uuid) -> Result<Paper> {
        self.store.get_owned(paper_id, owner_id).await
    }

    /// List all of an owner's papers, newest first
    pub async fn list_papers(&self, owner_id: &str) -> Vec<Paper> {
        self.store.list(owner_id).await
    }

    /// Search approved papers by case-insensitive subject/department substring
    pub async fn search_approved(
        &self,
        owner_id: &str,
        subject: Option<&str>,
        department: Option<&str>,
    ) -> Vec<Paper> {
        self.store.search_approved(owner_id, subject, department).await
    }

    /// Distinct subjects across approved papers
    pub async fn approved_subjects(&self, owner_id: &str) -> Vec<String> {
        self.store.approved_subjects(owner_id).await
    }

    /// Edit metadata of a draft paper
    pub async fn update_metadata(
        &self,
        owner_id: &str,
        paper_id: Uuid,
        update: MetadataUpdate,
    ) -> Result<Paper> {
        if update.is_empty() {
            return Err(AppError::validation("No fields to update"));
        }
        if let Some(total_marks) = update.total_marks {
            if total_marks == 0 {
                return Err(AppError::Validation {
                    message: "total_marks must be a positive integer".to_string(),
                    field: Some("total_marks".to_string()),
                });
            }
        }

        let _lease = self.store.acquire_lease(paper_id, owner_id).await?;
        let mut paper = self.store.get_owned(paper_id, owner_id).await?;

        if paper.status.is_terminal() {
            return Err(AppError::invalid_state(format!(
                "Paper {} is approved; metadata is frozen",
                paper_id
            )));
        }

        if let Some(subject) = update.subject {
            paper.request.subject = subject.clone();
            paper.subject = subject;
        }
        if let Some(department) = update.department {
            paper.request.department = department.clone();
            paper.department = department;
        }
        if let Some(section) = update.section {
            paper.request.section = Some(section.clone());
            paper.section = Some(section);
        }
        if let Some(year) = update.year {
            paper.request.year = Some(year);
            paper.year = Some(year);
        }
        if let Some(total_marks) = update.total_marks {
            paper.total_marks = total_marks;
        }

        self.store.replace(paper.clone()).await;
        Ok(paper)
    }

    /// Regenerate a draft paper's content with the lineage's stored request
    ///
    /// On success the content is replaced, the distribution recomputed, and
    /// `regeneration_count` incremented. On failure the paper is untouched;
    /// the attempt is recorded in the ledger and never retried here.
    pub async fn regenerate(
        &self,
        owner_id: &str,
        paper_id: Uuid,
        feedback_prompt: Option<String>,
    ) -> Result<Paper> {
        let _lease = self.store.acquire_lease(paper_id, owner_id).await?;
        let paper = self.store.get_owned(paper_id, owner_id).await?;

        if paper.status.is_terminal() {
            return Err(AppError::invalid_state(format!(
                "Paper {} is approved; only draft papers can be regenerated",
                paper_id
            )));
        }

        let entry_id = self
            .ledger
            .open(
                owner_id,
                AttemptParameters::regeneration(&paper.request, paper_id, feedback_prompt.clone()),
            )
            .await;

        let started = Instant::now();
        match self
            .generator
            .generate(&paper.request, feedback_prompt.as_deref())
            .await
        {
            Ok(questions) => {
                metrics::record_generation(started.elapsed().as_secs_f64(), "regeneration", true);

                let mut updated = paper;
                updated.distribution = distribution::compute_realized(&questions);
                updated.questions = questions;
                updated.regeneration_count += 1;

                self.store.replace(updated.clone()).await;
                self.ledger.complete(entry_id, paper_id).await?;

                metrics::record_lifecycle_event("regenerated");
                tracing::info!(
                    paper_id = %paper_id,
                    owner_id = %owner_id,
                    regeneration_count = updated.regeneration_count,
                    "Paper regenerated"
                );
                Ok(updated)
            }
            Err(err) => {
                metrics::record_generation(started.elapsed().as_secs_f64(), "regeneration", false);
                self.ledger.fail(entry_id, err.to_string()).await?;
                Err(err)
            }
        }
    }

    /// Approve a draft paper, rendering both PDF artifacts first
    ///
    /// All-or-nothing: the status flips and artifacts are stored only after
    /// both renders succeed. A renderer failure leaves the paper in draft
    /// with no artifacts.
    pub async fn approve(&self, owner_id: &str, paper_id: Uuid) -> Result<Paper> {
        let _lease = self.store.acquire_lease(paper_id, owner_id).await?;
        let paper = self.store.get_owned(paper_id, owner_id).await?;

        if !paper.status.can_transition(PaperStatus::Approved) {
            return Err(AppError::invalid_state(format!(
                "Paper {} cannot move from {:?} to approved",
                paper_id, paper.status
            )));
        }

        let question_paper_artifact_id =
            self.render_timed(&paper, RenderVariant::QuestionsOnly).await?;
        let answer_key_artifact_id =
            self.render_timed(&paper, RenderVariant::WithAnswers).await?;

        let mut approved = paper;
        approved.status = PaperStatus::Approved;
        approved.approved_at = Some(Utc::now());
        approved.approved_artifacts = Some(ApprovedArtifacts {
            question_paper_artifact_id,
            answer_key_artifact_id,
        });

        self.store.replace(approved.clone()).await;
        metrics::record_lifecycle_event("approved");
        tracing::info!(paper_id = %paper_id, owner_id = %owner_id, "Paper approved");
        Ok(approved)
    }

    async fn render_timed(&self, paper: &Paper, variant: RenderVariant) -> Result<String> {
        let started = Instant::now();
        let result = self.renderer.render(paper, variant).await;
        metrics::record_render(
            started.elapsed().as_secs_f64(),
            variant.as_str(),
            result.is_ok(),
        );
        result
    }

    /// Fork an approved paper into a fresh draft lineage for editing
    ///
    /// The copy gets a new identity and a back-reference to its source; the
    /// source paper is never mutated through the copy.
    pub async fn create_edit_copy(&self, owner_id: &str, paper_id: Uuid) -> Result<Paper> {
        let _lease = self.store.acquire_lease(paper_id, owner_id).await?;
        let source = self.store.get_owned(paper_id, owner_id).await?;

        if source.status != PaperStatus::Approved {
            return Err(AppError::invalid_state(format!(
                "Paper {} is not approved; only approved papers can be copied for editing",
                paper_id
            )));
        }

        let copy = Paper {
            id: Uuid::new_v4(),
            status: PaperStatus::Draft,
            regeneration_count: 0,
            is_edit_copy: true,
            source_paper_id: Some(source.id),
            approved_artifacts: None,
            approved_at: None,
            created_at: Utc::now(),
            ..source
        };

        self.store.insert(copy.clone()).await;
        metrics::record_store_size(self.store.len().await);
        tracing::info!(
            paper_id = %copy.id,
            source_paper_id = %paper_id,
            owner_id = %owner_id,
            "Edit copy created"
        );
        Ok(copy)
    }

    /// Delete a paper; history entries referencing it are untouched
    pub async fn delete_paper(&self, owner_id: &str, paper_id: Uuid) -> Result<()> {
        let lease = self.store.acquire_lease(paper_id, owner_id).await?;
        self.store.remove(paper_id).await;
        drop(lease);

        metrics::record_lifecycle_event("deleted");
        metrics::record_store_size(self.store.len().await);
        tracing::info!(paper_id = %paper_id, owner_id = %owner_id, "Paper deleted");
        Ok(())
    }

    // ========================================================================
    // History operations
    // ========================================================================

    /// List generation history, newest first
    pub async fn list_history(&self, owner_id: &str) -> Vec<HistoryEntry> {
        self.ledger.list(owner_id).await
    }

    /// Delete one history entry
    pub async fn delete_history_entry(&self, owner_id: &str, entry_id: Uuid) -> Result<()> {
        self.ledger.delete(entry_id, owner_id).await
    }

    /// Delete all history entries for an owner, returning the number removed
    pub async fn clear_history(&self, owner_id: &str) -> usize {
        self.ledger.clear_all(owner_id).await
    }

    // ========================================================================
    // Aggregation
    // ========================================================================

    /// Summarize approved papers, optionally filtered and narrowed
    ///
    /// A custom prompt leaves the numeric aggregation unchanged and attaches
    /// the external insight generator's free-text output.
    pub async fn summarize(
        &self,
        owner_id: &str,
        filter: SummaryFilter,
        custom_prompt: Option<String>,
    ) -> Result<PaperSetSummary> {
        let mut papers = self
            .store
            .search_approved(
                owner_id,
                filter.subject.as_deref(),
                filter.department.as_deref(),
            )
            .await;

        if let Some(paper_id) = filter.paper_id {
            papers.retain(|p| p.id == paper_id);
        }

        let mut summary = aggregate::summarize(&papers);
        metrics::record_summary(papers.len());

        if let Some(prompt) = custom_prompt.filter(|p| !p.trim().is_empty()) {
            let output = self.insight.generate(&summary, &prompt).await?;
            summary.insights = output.insights;
            summary.suggestions = output.suggestions;
        }

        Ok(summary)
    }

    /// Current store sizes
    pub async fn stats(&self) -> EngineStats {
        EngineStats {
            papers: self.store.len().await,
            history_entries: self.ledger.len().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AppError;
    use crate::model::{
        ExamType, HistoryStatus, ProvenanceRatio, QuestionCategory, QuestionSpec,
    };
    use crate::services::{
        MockDocumentRenderer, MockGenerationService, MockInsightGenerator,
    };
    use async_trait::async_trait;
    use std::time::Duration;

    const OWNER: &str = "teacher-1";

    fn engine() -> PaperEngine {
        PaperEngine::new(
            Arc::new(MockGenerationService::new()),
            Arc::new(MockDocumentRenderer::new()),
            Arc::new(MockInsightGenerator::new()),
        )
    }

    fn request() -> GenerationRequest {
        GenerationRequest {
            subject: "Operating Systems".to_string(),
            department: "CSE".to_string(),
            section: Some("A".to_string()),
            year: Some(3),
            exam_type: ExamType::Final,
            topic_focus: None,
            categories: vec![
                QuestionSpec {
                    category: QuestionCategory::Mcq,
                    count: 10,
                    marks_each: 1,
                },
                QuestionSpec {
                    category: QuestionCategory::Short,
                    count: 5,
                    marks_each: 2,
                },
            ],
            provenance: ProvenanceRatio {
                previous_percent: 50,
                creative_percent: 0,
                new_percent: 50,
            },
        }
    }

    /// Renderer that holds the render call open long enough for a second
    /// mutation to arrive
    struct SlowRenderer;

    #[async_trait]
    impl DocumentRenderer for SlowRenderer {
        async fn render(&self, paper: &Paper, variant: RenderVariant) -> crate::errors::Result<String> {
            tokio::time::sleep(Duration::from_millis(100)).await;
            Ok(format!("{}-{}", variant.as_str(), paper.id))
        }

        fn name(&self) -> &str {
            "slow"
        }
    }

    #[tokio::test]
    async fn test_create_paper() {
        let engine = engine();
        let paper = engine.create_paper(OWNER, request()).await.unwrap();

        assert_eq!(paper.status, PaperStatus::Draft);
        assert_eq!(paper.regeneration_count, 0);
        assert_eq!(paper.total_marks, 20);
        assert_eq!(paper.questions.len(), 15);
        assert_eq!(paper.distribution.total_questions, 15);
        assert!(paper.approved_artifacts.is_none());

        let history = engine.list_history(OWNER).await;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].status, HistoryStatus::Success);
        assert_eq!(history[0].paper_id, Some(paper.id));
    }

    #[tokio::test]
    async fn test_create_paper_rejects_bad_ratio() {
        let engine = engine();
        let mut bad = request();
        bad.provenance.new_percent = 40;

        let err = engine.create_paper(OWNER, bad).await.unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
        // Validation happens before the ledger entry is opened
        assert!(engine.list_history(OWNER).await.is_empty());
    }

    #[tokio::test]
    async fn test_generation_failure_is_recorded_and_nothing_persisted() {
        let engine = PaperEngine::new(
            Arc::new(MockGenerationService::failing()),
            Arc::new(MockDocumentRenderer::new()),
            Arc::new(MockInsightGenerator::new()),
        );

        let err = engine.create_paper(OWNER, request()).await.unwrap_err();
        assert!(matches!(err, AppError::Generation { .. }));
        assert!(engine.list_papers(OWNER).await.is_empty());

        let history = engine.list_history(OWNER).await;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].status, HistoryStatus::Failed);
        assert!(history[0].error_message.is_some());
        assert!(history[0].paper_id.is_none());
    }

    #[tokio::test]
    async fn test_regenerate_increments_count() {
        let engine = engine();
        let paper = engine.create_paper(OWNER, request()).await.unwrap();

        let regenerated = engine
            .regenerate(OWNER, paper.id, Some("harder questions".to_string()))
            .await
            .unwrap();

        assert_eq!(regenerated.id, paper.id);
        assert_eq!(regenerated.regeneration_count, 1);
        assert_eq!(regenerated.status, PaperStatus::Draft);
        assert_eq!(regenerated.questions.len(), 15);

        let again = engine.regenerate(OWNER, paper.id, None).await.unwrap();
        assert_eq!(again.regeneration_count, 2);
    }

    #[tokio::test]
    async fn test_regenerate_failure_leaves_paper_untouched() {
        let engine = engine();
        let paper = engine.create_paper(OWNER, request()).await.unwrap();

        // Swap in a failing generator for the second attempt
        let failing = PaperEngine {
            store: engine.store,
            ledger: engine.ledger,
            generator: Arc::new(MockGenerationService::failing()),
            renderer: engine.renderer,
            insight: engine.insight,
        };

        let err = failing.regenerate(OWNER, paper.id, None).await.unwrap_err();
        assert!(matches!(err, AppError::Generation { .. }));

        let stored = failing.get_paper(OWNER, paper.id).await.unwrap();
        assert_eq!(stored.regeneration_count, 0);
        assert_eq!(stored.questions, paper.questions);

        let history = failing.list_history(OWNER).await;
        assert_eq!(history.len(), 2);
        assert!(history.iter().any(|e| e.status == HistoryStatus::Failed));
    }

    #[tokio::test]
    async fn test_approve_sets_artifacts_and_freezes() {
        let engine = engine();
        let paper = engine.create_paper(OWNER, request()).await.unwrap();

        let approved = engine.approve(OWNER, paper.id).await.unwrap();
        assert_eq!(approved.status, PaperStatus::Approved);
        assert!(approved.approved_artifacts.is_some());
        assert!(approved.approved_at.is_some());

        // Terminal: every further mutation is rejected
        let err = engine.approve(OWNER, paper.id).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidState { .. }));

        let err = engine.regenerate(OWNER, paper.id, None).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidState { .. }));

        let err = engine
            .update_metadata(
                OWNER,
                paper.id,
                MetadataUpdate {
                    subject: Some("Databases".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidState { .. }));
    }

    #[tokio::test]
    async fn test_approve_is_atomic_on_render_failure() {
        let engine = PaperEngine::new(
            Arc::new(MockGenerationService::new()),
            Arc::new(MockDocumentRenderer::failing()),
            Arc::new(MockInsightGenerator::new()),
        );
        let paper = engine.create_paper(OWNER, request()).await.unwrap();

        let err = engine.approve(OWNER, paper.id).await.unwrap_err();
        assert!(matches!(err, AppError::Render { .. }));

        let stored = engine.get_paper(OWNER, paper.id).await.unwrap();
        assert_eq!(stored.status, PaperStatus::Draft);
        assert!(stored.approved_artifacts.is_none());
        assert!(stored.approved_at.is_none());
    }

    #[tokio::test]
    async fn test_concurrent_approve_single_winner() {
        let engine = Arc::new(PaperEngine::new(
            Arc::new(MockGenerationService::new()),
            Arc::new(SlowRenderer),
            Arc::new(MockInsightGenerator::new()),
        ));
        let paper = engine.create_paper(OWNER, request()).await.unwrap();

        let first = {
            let engine = engine.clone();
            let id = paper.id;
            tokio::spawn(async move { engine.approve(OWNER, id).await })
        };
        let second = {
            let engine = engine.clone();
            let id = paper.id;
            tokio::spawn(async move {
                // Let the first call take the lease
                tokio::time::sleep(Duration::from_millis(20)).await;
                engine.approve(OWNER, id).await
            })
        };

        let results = [first.await.unwrap(), second.await.unwrap()];
        let successes = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(successes, 1);

        let loser = results.iter().find(|r| r.is_err()).unwrap();
        assert!(matches!(
            loser.as_ref().unwrap_err(),
            AppError::Conflict { .. } | AppError::InvalidState { .. }
        ));

        let stored = engine.get_paper(OWNER, paper.id).await.unwrap();
        assert_eq!(stored.status, PaperStatus::Approved);
    }

    #[tokio::test]
    async fn test_edit_copy_forks_a_new_lineage() {
        let engine = engine();
        let paper = engine.create_paper(OWNER, request()).await.unwrap();

        // Copying a draft is rejected
        let err = engine.create_edit_copy(OWNER, paper.id).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidState { .. }));

        engine.approve(OWNER, paper.id).await.unwrap();
        let copy = engine.create_edit_copy(OWNER, paper.id).await.unwrap();

        assert_ne!(copy.id, paper.id);
        assert_eq!(copy.status, PaperStatus::Draft);
        assert_eq!(copy.regeneration_count, 0);
        assert!(copy.is_edit_copy);
        assert_eq!(copy.source_paper_id, Some(paper.id));
        assert!(copy.approved_artifacts.is_none());
        assert_eq!(copy.questions, paper.questions);

        // Mutating the copy never touches the source
        engine
            .update_metadata(
                OWNER,
                copy.id,
                MetadataUpdate {
                    subject: Some("Advanced Operating Systems".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let source = engine.get_paper(OWNER, paper.id).await.unwrap();
        assert_eq!(source.subject, "Operating Systems");
        assert_eq!(source.status, PaperStatus::Approved);
    }

    #[tokio::test]
    async fn test_update_metadata_validation() {
        let engine = engine();
        let paper = engine.create_paper(OWNER, request()).await.unwrap();

        let err = engine
            .update_metadata(OWNER, paper.id, MetadataUpdate::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));

        let err = engine
            .update_metadata(
                OWNER,
                paper.id,
                MetadataUpdate {
                    total_marks: Some(0),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));

        let updated = engine
            .update_metadata(
                OWNER,
                paper.id,
                MetadataUpdate {
                    total_marks: Some(50),
                    year: Some(4),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.total_marks, 50);
        assert_eq!(updated.year, Some(4));
    }

    #[tokio::test]
    async fn test_delete_paper_keeps_history() {
        let engine = engine();
        let paper = engine.create_paper(OWNER, request()).await.unwrap();

        engine.delete_paper(OWNER, paper.id).await.unwrap();
        assert!(engine.get_paper(OWNER, paper.id).await.is_err());

        // The ledger entry referencing the deleted paper survives
        let history = engine.list_history(OWNER).await;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].paper_id, Some(paper.id));
    }

    #[tokio::test]
    async fn test_history_deletion_keeps_papers() {
        let engine = engine();
        let paper = engine.create_paper(OWNER, request()).await.unwrap();

        let history = engine.list_history(OWNER).await;
        engine
            .delete_history_entry(OWNER, history[0].id)
            .await
            .unwrap();

        assert!(engine.get_paper(OWNER, paper.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_search_scopes_to_approved() {
        let engine = engine();
        let draft = engine.create_paper(OWNER, request()).await.unwrap();
        let other = engine.create_paper(OWNER, request()).await.unwrap();
        engine.approve(OWNER, other.id).await.unwrap();

        let hits = engine.search_approved(OWNER, Some("operating"), None).await;
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, other.id);
        assert_ne!(hits[0].id, draft.id);
    }

    #[tokio::test]
    async fn test_summarize_without_prompt_has_no_insights() {
        let engine = engine();
        let paper = engine.create_paper(OWNER, request()).await.unwrap();
        engine.approve(OWNER, paper.id).await.unwrap();

        let summary = engine
            .summarize(OWNER, SummaryFilter::default(), None)
            .await
            .unwrap();
        assert_eq!(summary.total_papers, 1);
        assert_eq!(summary.total_questions, 15);
        assert!(summary.insights.is_empty());
        assert!(summary.suggestions.is_empty());
    }

    #[tokio::test]
    async fn test_summarize_with_prompt_attaches_insights() {
        let engine = engine();
        let paper = engine.create_paper(OWNER, request()).await.unwrap();
        engine.approve(OWNER, paper.id).await.unwrap();

        let summary = engine
            .summarize(
                OWNER,
                SummaryFilter::default(),
                Some("focus on difficulty balance".to_string()),
            )
            .await
            .unwrap();
        assert!(!summary.insights.is_empty());
        assert!(!summary.suggestions.is_empty());
    }

    #[tokio::test]
    async fn test_summarize_narrowed_to_one_paper() {
        let engine = engine();
        let first = engine.create_paper(OWNER, request()).await.unwrap();
        let second = engine.create_paper(OWNER, request()).await.unwrap();
        engine.approve(OWNER, first.id).await.unwrap();
        engine.approve(OWNER, second.id).await.unwrap();

        let summary = engine
            .summarize(
                OWNER,
                SummaryFilter {
                    paper_id: Some(first.id),
                    ..Default::default()
                },
                None,
            )
            .await
            .unwrap();
        assert_eq!(summary.total_papers, 1);
    }
}
