//! Distribution calculator
//!
//! Pure functions shared by the request-validation path and the analytics
//! path, so the two can never disagree on how a count is computed. No side
//! effects; callable concurrently without coordination.

use crate::errors::{AppError, Result};
use crate::model::{
    CategoryTally, DistributionSummary, GenerationRequest, ProvenanceRatio, Question,
    QuestionCategory,
};
use crate::MAX_CATEGORIES;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Targets derived from a generation request
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestTargets {
    pub total_marks: u32,
    pub total_questions: u32,
    pub marks_by_category: BTreeMap<QuestionCategory, u32>,
}

/// Validate a provenance ratio: each component within 0-100, summing to 100
fn validate_ratio(ratio: &ProvenanceRatio) -> Result<()> {
    for (name, value) in [
        ("previous_percent", ratio.previous_percent),
        ("creative_percent", ratio.creative_percent),
        ("new_percent", ratio.new_percent),
    ] {
        if value > 100 {
            return Err(AppError::Validation {
                message: format!("{} must be between 0 and 100, got {}", name, value),
                field: Some(name.to_string()),
            });
        }
    }

    if !ratio.is_exhaustive() {
        return Err(AppError::Validation {
            message: format!(
                "Provenance percentages must sum to 100, got {}",
                ratio.total()
            ),
            field: Some("provenance".to_string()),
        });
    }

    Ok(())
}

/// Compute target totals for a generation request
///
/// Fails with a validation error when the provenance ratio does not cover
/// exactly 100 percent, when no category requests any questions, or when the
/// requested paper would carry zero marks.
pub fn compute_targets(request: &GenerationRequest) -> Result<RequestTargets> {
    if request.categories.is_empty() {
        return Err(AppError::Validation {
            message: "At least one question category is required".to_string(),
            field: Some("categories".to_string()),
        });
    }

    if request.categories.len() > MAX_CATEGORIES {
        return Err(AppError::Validation {
            message: format!(
                "At most {} question categories are supported, got {}",
                MAX_CATEGORIES,
                request.categories.len()
            ),
            field: Some("categories".to_string()),
        });
    }

    validate_ratio(&request.provenance)?;

    let mut total_marks = 0u32;
    let mut total_questions = 0u32;
    let mut marks_by_category = BTreeMap::new();

    for spec in &request.categories {
        total_questions += spec.count;
        total_marks += spec.category_marks();
        *marks_by_category.entry(spec.category).or_insert(0) += spec.category_marks();
    }

    if total_questions == 0 {
        return Err(AppError::Validation {
            message: "Total requested questions must be greater than zero".to_string(),
            field: Some("categories".to_string()),
        });
    }

    if total_marks == 0 {
        return Err(AppError::Validation {
            message: "Total marks must be greater than zero".to_string(),
            field: Some("categories".to_string()),
        });
    }

    Ok(RequestTargets {
        total_marks,
        total_questions,
        marks_by_category,
    })
}

/// Compute the realized distribution over generated content
///
/// Single pass; every question is counted exactly once in each grouping
/// dimension, so every dimension's counts sum to the question total.
pub fn compute_realized(questions: &[Question]) -> DistributionSummary {
    let mut summary = DistributionSummary {
        total_questions: questions.len() as u32,
        ..Default::default()
    };

    for question in questions {
        summary.total_marks += question.marks;

        let tally = summary
            .by_category
            .entry(question.category)
            .or_insert_with(CategoryTally::default);
        tally.count += 1;
        tally.marks += question.marks;

        *summary.by_level.entry(question.cognitive_level).or_insert(0) += 1;
        *summary
            .by_provenance
            .entry(question.provenance)
            .or_insert(0) += 1;

        summary
            .by_level_and_provenance
            .entry(question.cognitive_level)
            .or_default()
            .record(question.provenance);
    }

    summary
}

/// Share of `count` in `total` as a percentage, rounded to one decimal place
///
/// A zero total yields 0.0, never an error.
pub fn percentage(count: u32, total: u32) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (count as f64 / total as f64 * 1000.0).round() / 10.0
}
