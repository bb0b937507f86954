//! Generation history ledger
//!
//! Append-only record of every generation and regeneration attempt. Entries
//! have a lifecycle fully independent of papers: deleting a paper keeps its
//! entries, and deleting an entry never cascades into the paper it
//! references. Entries are immutable once completed or failed, except for
//! deletion.

use crate::errors::{AppError, Result};
use crate::model::{AttemptParameters, HistoryEntry, HistoryStatus};
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// In-memory ledger of generation attempts, keyed by entry id
#[derive(Default)]
pub struct HistoryLedger {
    entries: RwLock<HashMap<Uuid, HistoryEntry>>,
}

impl HistoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new in-progress entry and return its id
    pub async fn open(&self, owner_id: &str, parameters: AttemptParameters) -> Uuid {
        let entry = HistoryEntry {
            id: Uuid::new_v4(),
            owner_id: owner_id.to_string(),
            status: HistoryStatus::InProgress,
            parameters,
            paper_id: None,
            error_message: None,
            created_at: Utc::now(),
            completed_at: None,
        };
        let id = entry.id;

        self.entries.write().await.insert(id, entry);
        tracing::debug!(entry_id = %id, owner_id = %owner_id, "History entry opened");
        id
    }

    /// Mark an in-progress entry successful, recording the produced paper
    pub async fn complete(&self, entry_id: Uuid, paper_id: Uuid) -> Result<()> {
        let mut entries = self.entries.write().await;
        let entry = Self::open_entry_mut(&mut entries, entry_id)?;

        entry.status = HistoryStatus::Success;
        entry.paper_id = Some(paper_id);
        entry.completed_at = Some(Utc::now());
        Ok(())
    }

    /// Mark an in-progress entry failed with the collaborator's error
    pub async fn fail(&self, entry_id: Uuid, error_message: String) -> Result<()> {
        let mut entries = self.entries.write().await;
        let entry = Self::open_entry_mut(&mut entries, entry_id)?;

        entry.status = HistoryStatus::Failed;
        entry.error_message = Some(error_message);
        entry.completed_at = Some(Utc::now());
        Ok(())
    }

    /// List an owner's entries, newest first
    pub async fn list(&self, owner_id: &str) -> Vec<HistoryEntry> {
        let entries = self.entries.read().await;
        let mut result: Vec<HistoryEntry> = entries
            .values()
            .filter(|e| e.owner_id == owner_id)
            .cloned()
            .collect();
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        result
    }

    /// Delete a single entry; papers referencing it are untouched
    pub async fn delete(&self, entry_id: Uuid, owner_id: &str) -> Result<()> {
        let mut entries = self.entries.write().await;
        match entries.get(&entry_id) {
            Some(entry) if entry.owner_id == owner_id => {
                entries.remove(&entry_id);
                Ok(())
            }
            _ => Err(AppError::HistoryEntryNotFound {
                id: entry_id.to_string(),
            }),
        }
    }

    /// Delete all of an owner's entries, returning the number removed
    pub async fn clear_all(&self, owner_id: &str) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, e| e.owner_id != owner_id);
        let removed = before - entries.len();
        tracing::info!(owner_id = %owner_id, removed, "History cleared");
        removed
    }

    /// Total entry count across owners (readiness reporting)
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    fn open_entry_mut(
        entries: &mut HashMap<Uuid, HistoryEntry>,
        entry_id: Uuid,
    ) -> Result<&mut HistoryEntry> {
        match entries.get_mut(&entry_id) {
            Some(entry) if !entry.status.is_terminal() => Ok(entry),
            // Terminal entries are immutable; treat them like unknown ids
            _ => Err(AppError::HistoryEntryNotFound {
                id: entry_id.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        ExamType, GenerationRequest, ProvenanceRatio, QuestionCategory, QuestionSpec,
    };

    fn parameters() -> AttemptParameters {
        AttemptParameters::generation(&GenerationRequest {
            subject: "Databases".to_string(),
            department: "CSE".to_string(),
            section: None,
            year: None,
            exam_type: ExamType::Mid,
            topic_focus: None,
            categories: vec![QuestionSpec {
                category: QuestionCategory::Short,
                count: 5,
                marks_each: 2,
            }],
            provenance: ProvenanceRatio {
                previous_percent: 0,
                creative_percent: 0,
                new_percent: 100,
            },
        })
    }

    #[tokio::test]
    async fn test_open_complete_roundtrip() {
        let ledger = HistoryLedger::new();
        let entry_id = ledger.open("t1", parameters()).await;
        let paper_id = Uuid::new_v4();

        ledger.complete(entry_id, paper_id).await.unwrap();

        let entries = ledger.list("t1").await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].status, HistoryStatus::Success);
        assert_eq!(entries[0].paper_id, Some(paper_id));
        assert!(entries[0].completed_at.is_some());
    }

    #[tokio::test]
    async fn test_fail_records_error() {
        let ledger = HistoryLedger::new();
        let entry_id = ledger.open("t1", parameters()).await;

        ledger
            .fail(entry_id, "generation service unavailable".to_string())
            .await
            .unwrap();

        let entries = ledger.list("t1").await;
        assert_eq!(entries[0].status, HistoryStatus::Failed);
        assert_eq!(
            entries[0].error_message.as_deref(),
            Some("generation service unavailable")
        );
    }

    #[tokio::test]
    async fn test_terminal_entries_are_immutable() {
        let ledger = HistoryLedger::new();
        let entry_id = ledger.open("t1", parameters()).await;
        ledger.complete(entry_id, Uuid::new_v4()).await.unwrap();

        let err = ledger.complete(entry_id, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::HistoryEntryNotFound { .. }));

        let err = ledger.fail(entry_id, "late".to_string()).await.unwrap_err();
        assert!(matches!(err, AppError::HistoryEntryNotFound { .. }));
    }

    #[tokio::test]
    async fn test_unknown_entry_is_not_found() {
        let ledger = HistoryLedger::new();
        let err = ledger.complete(Uuid::new_v4(), Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::HistoryEntryNotFound { .. }));
    }

    #[tokio::test]
    async fn test_delete_is_owner_scoped() {
        let ledger = HistoryLedger::new();
        let entry_id = ledger.open("t1", parameters()).await;

        let err = ledger.delete(entry_id, "t2").await.unwrap_err();
        assert!(matches!(err, AppError::HistoryEntryNotFound { .. }));

        ledger.delete(entry_id, "t1").await.unwrap();
        assert!(ledger.list("t1").await.is_empty());
    }

    #[tokio::test]
    async fn test_clear_all_only_touches_owner() {
        let ledger = HistoryLedger::new();
        ledger.open("t1", parameters()).await;
        ledger.open("t1", parameters()).await;
        ledger.open("t2", parameters()).await;

        let removed = ledger.clear_all("t1").await;
        assert_eq!(removed, 2);
        assert!(ledger.list("t1").await.is_empty());
        assert_eq!(ledger.list("t2").await.len(), 1);
    }
}
