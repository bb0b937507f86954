//! External collaborator abstractions
//!
//! Provides unified interfaces for the services the engine delegates to:
//! - Generation service (question content and answer keys)
//! - Document renderer (PDF artifacts for approved papers)
//! - Insight generator (free-text analytics commentary)
//!
//! Each has an HTTP implementation and a deterministic mock. Calls are
//! single-attempt with a timeout; retry policy belongs to the caller.

use crate::aggregate::PaperSetSummary;
use crate::config::CollaboratorConfig;
use crate::errors::{AppError, Result};
use crate::model::{
    CognitiveLevel, GenerationRequest, Paper, Provenance, Question, QuestionCategory,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Which view of a paper the renderer should produce
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderVariant {
    QuestionsOnly,
    WithAnswers,
}

impl RenderVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            RenderVariant::QuestionsOnly => "questions_only",
            RenderVariant::WithAnswers => "with_answers",
        }
    }
}

/// Free-text output of the insight generator; attached to summaries
/// without being parsed or validated
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct InsightOutput {
    pub insights: Vec<String>,
    pub suggestions: Vec<String>,
}

/// Trait for question generation
#[async_trait]
pub trait GenerationService: Send + Sync {
    /// Generate questions for a request, optionally steered by feedback
    async fn generate(
        &self,
        request: &GenerationRequest,
        feedback_prompt: Option<&str>,
    ) -> Result<Vec<Question>>;

    /// Get the provider name
    fn name(&self) -> &str;
}

/// Trait for PDF artifact rendering
#[async_trait]
pub trait DocumentRenderer: Send + Sync {
    /// Render one view of a paper, returning the artifact id
    async fn render(&self, paper: &Paper, variant: RenderVariant) -> Result<String>;

    /// Get the provider name
    fn name(&self) -> &str;
}

/// Trait for free-text insight generation over an aggregation
#[async_trait]
pub trait InsightGenerator: Send + Sync {
    /// Produce insights and suggestions for a summary, guided by a prompt
    async fn generate(&self, summary: &PaperSetSummary, prompt: &str) -> Result<InsightOutput>;

    /// Get the provider name
    fn name(&self) -> &str;
}

// ============================================================================
// HTTP implementations
// ============================================================================

fn build_client(config: &CollaboratorConfig) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(config.timeout())
        .build()
        .expect("Failed to create HTTP client")
}

fn bearer(request: reqwest::RequestBuilder, api_key: &Option<String>) -> reqwest::RequestBuilder {
    match api_key {
        Some(key) => request.header("Authorization", format!("Bearer {}", key)),
        None => request,
    }
}

/// HTTP generation service client
pub struct HttpGenerationService {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

#[derive(Serialize)]
struct GenerateRequestBody<'a> {
    request: &'a GenerationRequest,
    #[serde(skip_serializing_if = "Option::is_none")]
    feedback_prompt: Option<&'a str>,
}

#[derive(Deserialize)]
struct GenerateResponseBody {
    questions: Vec<Question>,
}

impl HttpGenerationService {
    pub fn new(config: &CollaboratorConfig) -> Self {
        let base_url = config
            .base_url
            .clone()
            .expect("Generation service base_url required");
        Self {
            client: build_client(config),
            base_url,
            api_key: config.api_key.clone(),
        }
    }
}

#[async_trait]
impl GenerationService for HttpGenerationService {
    async fn generate(
        &self,
        request: &GenerationRequest,
        feedback_prompt: Option<&str>,
    ) -> Result<Vec<Question>> {
        let url = format!("{}/generate", self.base_url);
        let body = GenerateRequestBody {
            request,
            feedback_prompt,
        };

        let response = bearer(self.client.post(&url), &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Generation {
                message: format!("Request failed: {}", e),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Generation {
                message: format!("API error {}: {}", status, body),
            });
        }

        let result: GenerateResponseBody =
            response.json().await.map_err(|e| AppError::Generation {
                message: format!("Failed to parse response: {}", e),
            })?;

        Ok(result.questions)
    }

    fn name(&self) -> &str {
        "http"
    }
}

/// HTTP document renderer client
pub struct HttpDocumentRenderer {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

#[derive(Serialize)]
struct RenderRequestBody<'a> {
    paper: &'a Paper,
    variant: RenderVariant,
}

#[derive(Deserialize)]
struct RenderResponseBody {
    artifact_id: String,
}

impl HttpDocumentRenderer {
    pub fn new(config: &CollaboratorConfig) -> Self {
        let base_url = config
            .base_url
            .clone()
            .expect("Document renderer base_url required");
        Self {
            client: build_client(config),
            base_url,
            api_key: config.api_key.clone(),
        }
    }
}

#[async_trait]
impl DocumentRenderer for HttpDocumentRenderer {
    async fn render(&self, paper: &Paper, variant: RenderVariant) -> Result<String> {
        let url = format!("{}/render", self.base_url);
        let body = RenderRequestBody { paper, variant };

        let response = bearer(self.client.post(&url), &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Render {
                message: format!("Request failed: {}", e),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Render {
                message: format!("API error {}: {}", status, body),
            });
        }

        let result: RenderResponseBody = response.json().await.map_err(|e| AppError::Render {
            message: format!("Failed to parse response: {}", e),
        })?;

        Ok(result.artifact_id)
    }

    fn name(&self) -> &str {
        "http"
    }
}

/// HTTP insight generator client
pub struct HttpInsightGenerator {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

#[derive(Serialize)]
struct InsightRequestBody<'a> {
    summary: &'a PaperSetSummary,
    prompt: &'a str,
}

impl HttpInsightGenerator {
    pub fn new(config: &CollaboratorConfig) -> Self {
        let base_url = config
            .base_url
            .clone()
            .expect("Insight generator base_url required");
        Self {
            client: build_client(config),
            base_url,
            api_key: config.api_key.clone(),
        }
    }
}

#[async_trait]
impl InsightGenerator for HttpInsightGenerator {
    async fn generate(&self, summary: &PaperSetSummary, prompt: &str) -> Result<InsightOutput> {
        let url = format!("{}/insights", self.base_url);
        let body = InsightRequestBody { summary, prompt };

        let response = bearer(self.client.post(&url), &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Insight {
                message: format!("Request failed: {}", e),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Insight {
                message: format!("API error {}: {}", status, body),
            });
        }

        response.json().await.map_err(|e| AppError::Insight {
            message: format!("Failed to parse response: {}", e),
        })
    }

    fn name(&self) -> &str {
        "http"
    }
}

// ============================================================================
// Mock implementations
// ============================================================================

/// Cognitive levels a category draws from
fn level_band(category: QuestionCategory) -> &'static [CognitiveLevel] {
    match category {
        QuestionCategory::Mcq => &[CognitiveLevel::Remember, CognitiveLevel::Understand],
        QuestionCategory::Short => &[CognitiveLevel::Understand, CognitiveLevel::Apply],
        QuestionCategory::Medium => &[CognitiveLevel::Apply, CognitiveLevel::Analyze],
        QuestionCategory::Long => &[
            CognitiveLevel::Analyze,
            CognitiveLevel::Evaluate,
            CognitiveLevel::Create,
        ],
    }
}

/// Mock generation service for tests and local development
///
/// Produces a deterministic question set that honors the request's category
/// counts and marks. Cognitive levels cycle within each category's band and
/// provenance is assigned positionally from the requested ratio.
pub struct MockGenerationService {
    fail: bool,
}

impl MockGenerationService {
    pub fn new() -> Self {
        Self { fail: false }
    }

    /// A mock that fails every call
    pub fn failing() -> Self {
        Self { fail: true }
    }
}

impl Default for MockGenerationService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GenerationService for MockGenerationService {
    async fn generate(
        &self,
        request: &GenerationRequest,
        feedback_prompt: Option<&str>,
    ) -> Result<Vec<Question>> {
        if self.fail {
            return Err(AppError::Generation {
                message: "Mock generation service configured to fail".to_string(),
            });
        }

        let mut questions = Vec::new();
        for spec in &request.categories {
            let band = level_band(spec.category);
            for i in 0..spec.count {
                let number = questions.len() + 1;
                let answer_key = format!(
                    "Model answer for {} question {} on {}",
                    spec.category, number, request.subject
                );
                questions.push(Question {
                    text: format!(
                        "{} question {} on {}{}",
                        spec.category,
                        number,
                        request.subject,
                        feedback_prompt
                            .map(|f| format!(" (revised: {})", f))
                            .unwrap_or_default()
                    ),
                    explanation: Some(answer_key.clone()),
                    answer_key,
                    category: spec.category,
                    cognitive_level: band[(i as usize) % band.len()],
                    marks: spec.marks_each,
                    provenance: Provenance::New,
                    unit: None,
                });
            }
        }

        // Assign provenance positionally by the requested ratio
        let total = questions.len() as u32;
        let previous_count = total * request.provenance.previous_percent / 100;
        let creative_count = total * request.provenance.creative_percent / 100;
        for (i, question) in questions.iter_mut().enumerate() {
            let i = i as u32;
            question.provenance = if i < previous_count {
                Provenance::Previous
            } else if i < previous_count + creative_count {
                Provenance::Creative
            } else {
                Provenance::New
            };
        }

        Ok(questions)
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Mock renderer that fabricates artifact ids
pub struct MockDocumentRenderer {
    fail: bool,
}

impl MockDocumentRenderer {
    pub fn new() -> Self {
        Self { fail: false }
    }

    /// A mock that fails every call
    pub fn failing() -> Self {
        Self { fail: true }
    }
}

impl Default for MockDocumentRenderer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentRenderer for MockDocumentRenderer {
    async fn render(&self, paper: &Paper, variant: RenderVariant) -> Result<String> {
        if self.fail {
            return Err(AppError::Render {
                message: "Mock renderer configured to fail".to_string(),
            });
        }
        Ok(format!("{}-{}-{}", variant.as_str(), paper.id, uuid::Uuid::new_v4()))
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Mock insight generator with canned commentary
pub struct MockInsightGenerator {
    fail: bool,
}

impl MockInsightGenerator {
    pub fn new() -> Self {
        Self { fail: false }
    }

    /// A mock that fails every call
    pub fn failing() -> Self {
        Self { fail: true }
    }
}

impl Default for MockInsightGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InsightGenerator for MockInsightGenerator {
    async fn generate(&self, summary: &PaperSetSummary, prompt: &str) -> Result<InsightOutput> {
        if self.fail {
            return Err(AppError::Insight {
                message: "Mock insight generator configured to fail".to_string(),
            });
        }
        Ok(InsightOutput {
            insights: vec![format!(
                "Analyzed {} papers with {} questions",
                summary.total_papers, summary.total_questions
            )],
            suggestions: vec![format!("Prompt applied: {}", prompt)],
        })
    }

    fn name(&self) -> &str {
        "mock"
    }
}

// ============================================================================
// Provider factories
// ============================================================================

/// Create a generation service based on configuration
pub fn create_generation_service(config: &CollaboratorConfig) -> Arc<dyn GenerationService> {
    match config.provider.as_str() {
        "http" => Arc::new(HttpGenerationService::new(config)),
        "mock" => Arc::new(MockGenerationService::new()),
        other => {
            tracing::warn!(provider = other, "Unknown generation provider, using mock");
            Arc::new(MockGenerationService::new())
        }
    }
}

/// Create a document renderer based on configuration
pub fn create_document_renderer(config: &CollaboratorConfig) -> Arc<dyn DocumentRenderer> {
    match config.provider.as_str() {
        "http" => Arc::new(HttpDocumentRenderer::new(config)),
        "mock" => Arc::new(MockDocumentRenderer::new()),
        other => {
            tracing::warn!(provider = other, "Unknown renderer provider, using mock");
            Arc::new(MockDocumentRenderer::new())
        }
    }
}

/// Create an insight generator based on configuration
pub fn create_insight_generator(config: &CollaboratorConfig) -> Arc<dyn InsightGenerator> {
    match config.provider.as_str() {
        "http" => Arc::new(HttpInsightGenerator::new(config)),
        "mock" => Arc::new(MockInsightGenerator::new()),
        other => {
            tracing::warn!(provider = other, "Unknown insight provider, using mock");
            Arc::new(MockInsightGenerator::new())
        }
    }
}
