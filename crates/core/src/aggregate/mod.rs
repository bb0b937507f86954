//! Aggregation engine
//!
//! Combines an arbitrary set of approved papers into summary statistics by
//! reapplying the distribution calculator's grouping logic per paper and
//! summing the counts. Read-only and deterministic: permuting the input set
//! never changes any number, and repeated calls over an unchanged set yield
//! identical output.

use crate::distribution::{compute_realized, percentage};
use crate::model::{CognitiveLevel, Paper, Provenance, QuestionCategory};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Summary statistics over a set of papers
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PaperSetSummary {
    pub total_papers: u32,
    pub total_questions: u32,
    /// Mean paper marks, rounded to two decimal places; 0 for an empty set
    pub average_marks: f64,
    pub subject_distribution: BTreeMap<String, u32>,
    pub department_distribution: BTreeMap<String, u32>,
    pub question_type_distribution: BTreeMap<QuestionCategory, u32>,
    pub blooms_level_distribution: BTreeMap<CognitiveLevel, u32>,
    pub provenance_distribution: BTreeMap<Provenance, u32>,
    /// Free-text commentary from the external insight generator
    #[serde(default)]
    pub insights: Vec<String>,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

impl PaperSetSummary {
    /// Question-type shares as percentages of all questions
    pub fn question_type_percentages(&self) -> BTreeMap<QuestionCategory, f64> {
        self.question_type_distribution
            .iter()
            .map(|(category, count)| (*category, percentage(*count, self.total_questions)))
            .collect()
    }

    /// Cognitive-level shares as percentages of all questions
    pub fn blooms_level_percentages(&self) -> BTreeMap<CognitiveLevel, f64> {
        self.blooms_level_distribution
            .iter()
            .map(|(level, count)| (*level, percentage(*count, self.total_questions)))
            .collect()
    }
}

/// Summarize a set of papers
pub fn summarize(papers: &[Paper]) -> PaperSetSummary {
    let mut summary = PaperSetSummary {
        total_papers: papers.len() as u32,
        ..Default::default()
    };

    let mut marks_sum = 0u64;

    for paper in papers {
        *summary
            .subject_distribution
            .entry(paper.subject.clone())
            .or_insert(0) += 1;
        *summary
            .department_distribution
            .entry(paper.department.clone())
            .or_insert(0) += 1;
        marks_sum += paper.total_marks as u64;

        let realized = compute_realized(&paper.questions);
        summary.total_questions += realized.total_questions;

        for (category, tally) in realized.by_category {
            *summary
                .question_type_distribution
                .entry(category)
                .or_insert(0) += tally.count;
        }
        for (level, count) in realized.by_level {
            *summary
                .blooms_level_distribution
                .entry(level)
                .or_insert(0) += count;
        }
        for (provenance, count) in realized.by_provenance {
            *summary
                .provenance_distribution
                .entry(provenance)
                .or_insert(0) += count;
        }
    }

    if summary.total_papers > 0 {
        let mean = marks_sum as f64 / summary.total_papers as f64;
        summary.average_marks = (mean * 100.0).round() / 100.0;
    }

    summary
}
