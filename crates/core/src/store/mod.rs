//! Canonical paper store
//!
//! Owns every paper record and the per-lineage mutation leases. Updates
//! replace the whole record under the write lock, so readers observe either
//! the pre- or post-mutation paper but never a torn record. Reads never touch
//! the lease map and are never blocked by in-flight mutations.

use crate::errors::{AppError, Result};
use crate::model::{Paper, PaperStatus};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use uuid::Uuid;

/// Exclusive mutation lease for one paper lineage
///
/// Held for the full duration of a mutating operation, including any
/// long-running external calls. Dropping the lease releases the lineage.
#[derive(Debug)]
pub struct MutationLease {
    _guard: OwnedMutexGuard<()>,
}

/// In-memory store of paper records keyed by id
#[derive(Default)]
pub struct PaperStore {
    papers: RwLock<HashMap<Uuid, Paper>>,
    leases: Mutex<HashMap<Uuid, Arc<Mutex<()>>>>,
}

impl PaperStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a freshly created paper
    pub async fn insert(&self, paper: Paper) {
        self.papers.write().await.insert(paper.id, paper);
    }

    /// Fetch a paper by id
    pub async fn get(&self, id: Uuid) -> Option<Paper> {
        self.papers.read().await.get(&id).cloned()
    }

    /// Fetch a paper by id, verifying the caller owns it
    pub async fn get_owned(&self, id: Uuid, owner_id: &str) -> Result<Paper> {
        match self.papers.read().await.get(&id) {
            Some(paper) if paper.owner_id == owner_id => Ok(paper.clone()),
            // Treat other owners' papers as unknown ids
            _ => Err(AppError::PaperNotFound { id: id.to_string() }),
        }
    }

    /// Acquire the exclusive mutation lease for a lineage
    ///
    /// Fails with `Conflict` when another mutating operation holds the lease,
    /// and with `PaperNotFound` when the lineage does not exist.
    pub async fn acquire_lease(&self, id: Uuid, owner_id: &str) -> Result<MutationLease> {
        // Existence/ownership check first so unknown ids do not allocate leases
        self.get_owned(id, owner_id).await?;

        let lease = {
            let mut leases = self.leases.lock().await;
            leases.entry(id).or_insert_with(|| Arc::new(Mutex::new(()))).clone()
        };

        match lease.try_lock_owned() {
            Ok(guard) => Ok(MutationLease { _guard: guard }),
            Err(_) => Err(AppError::Conflict { id: id.to_string() }),
        }
    }

    /// Replace a paper record as a whole
    ///
    /// Callers must hold the lineage's `MutationLease`.
    pub async fn replace(&self, paper: Paper) {
        self.papers.write().await.insert(paper.id, paper);
    }

    /// Remove a paper and its lease slot
    pub async fn remove(&self, id: Uuid) -> Option<Paper> {
        let removed = self.papers.write().await.remove(&id);
        if removed.is_some() {
            self.leases.lock().await.remove(&id);
        }
        removed
    }

    /// List an owner's papers, newest first
    pub async fn list(&self, owner_id: &str) -> Vec<Paper> {
        let papers = self.papers.read().await;
        let mut result: Vec<Paper> = papers
            .values()
            .filter(|p| p.owner_id == owner_id)
            .cloned()
            .collect();
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        result
    }

    /// Search an owner's approved papers
    ///
    /// Filters are case-insensitive substring matches on subject and
    /// department; empty filters return all approved papers.
    pub async fn search_approved(
        &self,
        owner_id: &str,
        subject: Option<&str>,
        department: Option<&str>,
    ) -> Vec<Paper> {
        let subject = subject.map(str::to_lowercase);
        let department = department.map(str::to_lowercase);

        let papers = self.papers.read().await;
        let mut result: Vec<Paper> = papers
            .values()
            .filter(|p| p.owner_id == owner_id && p.status == PaperStatus::Approved)
            .filter(|p| {
                subject
                    .as_deref()
                    .map(|s| p.subject.to_lowercase().contains(s))
                    .unwrap_or(true)
            })
            .filter(|p| {
                department
                    .as_deref()
                    .map(|d| p.department.to_lowercase().contains(d))
                    .unwrap_or(true)
            })
            .cloned()
            .collect();
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        result
    }

    /// Distinct subjects across an owner's approved papers, sorted
    pub async fn approved_subjects(&self, owner_id: &str) -> Vec<String> {
        let papers = self.papers.read().await;
        let mut subjects: Vec<String> = papers
            .values()
            .filter(|p| p.owner_id == owner_id && p.status == PaperStatus::Approved)
            .map(|p| p.subject.clone())
            .collect();
        subjects.sort_by_key(|s| s.to_lowercase());
        subjects.dedup();
        subjects
    }

    /// Total paper count across owners (readiness reporting)
    pub async fn len(&self) -> usize {
        self.papers.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.papers.read().await.is_empty()
    }
}
