//! Domain model for exam papers and generation requests
//!
//! The paper entity is the only record in the system with real lifecycle
//! state. Everything here is a plain owned value; storage and transition
//! enforcement live in `store` and `engine`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// Question category requested and realized on papers
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum QuestionCategory {
    #[serde(rename = "MCQ")]
    Mcq,
    Short,
    Medium,
    Long,
}

impl fmt::Display for QuestionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            QuestionCategory::Mcq => "MCQ",
            QuestionCategory::Short => "Short",
            QuestionCategory::Medium => "Medium",
            QuestionCategory::Long => "Long",
        };
        write!(f, "{}", s)
    }
}

/// Bloom's taxonomy tier assigned to a question
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CognitiveLevel {
    Remember,
    Understand,
    Apply,
    Analyze,
    Evaluate,
    Create,
}

/// Origin of a question's content
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// Drawn from previous-year material
    Previous,
    /// Creative modification of existing material
    Creative,
    /// Newly generated
    New,
}

/// Exam type for a generated paper
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExamType {
    Mid,
    Final,
    Internal,
    Quiz,
}

/// Paper lifecycle status
///
/// `Approved` is terminal for a lineage; an approved paper can only spawn a
/// fresh draft lineage via an edit copy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaperStatus {
    Draft,
    Approved,
}

impl PaperStatus {
    /// Explicit transition table. Anything not listed here is rejected.
    pub fn can_transition(self, next: PaperStatus) -> bool {
        matches!((self, next), (PaperStatus::Draft, PaperStatus::Approved))
    }

    /// Check if this status is terminal for the lineage
    pub fn is_terminal(self) -> bool {
        matches!(self, PaperStatus::Approved)
    }
}

impl From<PaperStatus> for String {
    fn from(status: PaperStatus) -> Self {
        match status {
            PaperStatus::Draft => "draft".to_string(),
            PaperStatus::Approved => "approved".to_string(),
        }
    }
}

/// Per-category target in a generation request
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionSpec {
    pub category: QuestionCategory,
    pub count: u32,
    pub marks_each: u32,
}

impl QuestionSpec {
    /// Total marks contributed by this category
    pub fn category_marks(&self) -> u32 {
        self.count * self.marks_each
    }
}

/// Requested provenance split; must sum to exactly 100 on submission
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvenanceRatio {
    pub previous_percent: u32,
    pub creative_percent: u32,
    pub new_percent: u32,
}

impl ProvenanceRatio {
    pub fn total(&self) -> u32 {
        self.previous_percent + self.creative_percent + self.new_percent
    }

    /// True when the three components cover exactly 100 percent
    pub fn is_exhaustive(&self) -> bool {
        self.total() == 100
    }
}

/// A request to generate a paper
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub subject: String,
    pub department: String,
    #[serde(default)]
    pub section: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
    pub exam_type: ExamType,
    /// Free-text focus forwarded to the generation service
    #[serde(default)]
    pub topic_focus: Option<String>,
    pub categories: Vec<QuestionSpec>,
    pub provenance: ProvenanceRatio,
}

/// A generated question; immutable once produced
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub text: String,
    pub answer_key: String,
    #[serde(default)]
    pub explanation: Option<String>,
    pub category: QuestionCategory,
    pub cognitive_level: CognitiveLevel,
    pub marks: u32,
    pub provenance: Provenance,
    #[serde(default)]
    pub unit: Option<String>,
}

/// PDF artifact ids produced on approval
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovedArtifacts {
    pub question_paper_artifact_id: String,
    pub answer_key_artifact_id: String,
}

/// Realized tally for one question category
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTally {
    pub count: u32,
    pub marks: u32,
}

/// Provenance breakdown within one cognitive level
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvenanceBreakdown {
    pub total: u32,
    pub previous: u32,
    pub creative: u32,
    pub new: u32,
}

impl ProvenanceBreakdown {
    pub fn record(&mut self, provenance: Provenance) {
        self.total += 1;
        match provenance {
            Provenance::Previous => self.previous += 1,
            Provenance::Creative => self.creative += 1,
            Provenance::New => self.new += 1,
        }
    }
}

/// Realized distribution over a paper's content
///
/// Each grouping dimension partitions the question list: summing the counts
/// of any one dimension yields the number of questions.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DistributionSummary {
    pub total_questions: u32,
    pub total_marks: u32,
    pub by_category: BTreeMap<QuestionCategory, CategoryTally>,
    pub by_level: BTreeMap<CognitiveLevel, u32>,
    pub by_provenance: BTreeMap<Provenance, u32>,
    pub by_level_and_provenance: BTreeMap<CognitiveLevel, ProvenanceBreakdown>,
}

/// The central versioned entity
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Paper {
    pub id: Uuid,
    pub owner_id: String,
    pub subject: String,
    pub department: String,
    #[serde(default)]
    pub section: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
    pub exam_type: ExamType,
    pub total_marks: u32,
    pub questions: Vec<Question>,
    pub status: PaperStatus,
    /// Number of regenerate operations applied to this lineage
    pub regeneration_count: u32,
    /// True when this paper was forked from an approved paper for editing
    pub is_edit_copy: bool,
    /// Back-reference to the approved source of an edit copy
    #[serde(default)]
    pub source_paper_id: Option<Uuid>,
    /// Present iff `status == Approved`
    #[serde(default)]
    pub approved_artifacts: Option<ApprovedArtifacts>,
    pub distribution: DistributionSummary,
    /// The request this lineage was generated from; reused on regeneration
    pub request: GenerationRequest,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub approved_at: Option<DateTime<Utc>>,
}

/// Kind of generation attempt recorded in the history ledger
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptKind {
    Generation,
    Regeneration,
}

/// Parameters of a generation or regeneration attempt
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AttemptParameters {
    pub kind: AttemptKind,
    pub request: GenerationRequest,
    #[serde(default)]
    pub feedback_prompt: Option<String>,
    /// Paper the attempt was a regeneration of, when applicable
    #[serde(default)]
    pub source_paper_id: Option<Uuid>,
}

impl AttemptParameters {
    pub fn generation(request: &GenerationRequest) -> Self {
        Self {
            kind: AttemptKind::Generation,
            request: request.clone(),
            feedback_prompt: None,
            source_paper_id: None,
        }
    }

    pub fn regeneration(
        request: &GenerationRequest,
        paper_id: Uuid,
        feedback_prompt: Option<String>,
    ) -> Self {
        Self {
            kind: AttemptKind::Regeneration,
            request: request.clone(),
            feedback_prompt,
            source_paper_id: Some(paper_id),
        }
    }
}

/// History entry status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryStatus {
    InProgress,
    Success,
    Failed,
}

impl HistoryStatus {
    /// Check if the entry is in a terminal state
    pub fn is_terminal(self) -> bool {
        matches!(self, HistoryStatus::Success | HistoryStatus::Failed)
    }
}

/// Record of one generation or regeneration attempt
///
/// Lifecycle is independent of papers: deleting a paper never deletes its
/// entries and deleting an entry never touches the paper it references.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: Uuid,
    pub owner_id: String,
    pub status: HistoryStatus,
    pub parameters: AttemptParameters,
    #[serde(default)]
    pub paper_id: Option<Uuid>,
    #[serde(default)]
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_transition_table() {
        assert!(PaperStatus::Draft.can_transition(PaperStatus::Approved));
        assert!(!PaperStatus::Approved.can_transition(PaperStatus::Draft));
        assert!(!PaperStatus::Draft.can_transition(PaperStatus::Draft));
        assert!(!PaperStatus::Approved.can_transition(PaperStatus::Approved));
    }

    #[test]
    fn test_category_marks() {
        let spec = QuestionSpec {
            category: QuestionCategory::Short,
            count: 5,
            marks_each: 2,
        };
        assert_eq!(spec.category_marks(), 10);
    }

    #[test]
    fn test_provenance_ratio() {
        let ratio = ProvenanceRatio {
            previous_percent: 50,
            creative_percent: 0,
            new_percent: 50,
        };
        assert!(ratio.is_exhaustive());

        let short = ProvenanceRatio {
            previous_percent: 30,
            creative_percent: 30,
            new_percent: 30,
        };
        assert_eq!(short.total(), 90);
        assert!(!short.is_exhaustive());
    }

    #[test]
    fn test_category_serializes_as_display_name() {
        let json = serde_json::to_string(&QuestionCategory::Mcq).unwrap();
        assert_eq!(json, "\"MCQ\"");
        let json = serde_json::to_string(&QuestionCategory::Long).unwrap();
        assert_eq!(json, "\"Long\"");
    }

    #[test]
    fn test_provenance_breakdown_record() {
        let mut breakdown = ProvenanceBreakdown::default();
        breakdown.record(Provenance::Previous);
        breakdown.record(Provenance::New);
        breakdown.record(Provenance::New);
        assert_eq!(breakdown.total, 3);
        assert_eq!(breakdown.previous, 1);
        assert_eq!(breakdown.creative, 0);
        assert_eq!(breakdown.new, 2);
    }
}
