//! Audit and finding persistence
//!
//! `AuditStore` is the persistence contract the scan pipeline writes
//! through: partial audit updates during a run, plus finding CRUD.
//! `MemoryStore` is the in-process implementation backing the CLI and
//! tests; findings are kept per audit in insertion order.

use crate::models::{
    Audit, CategoryScores, Finding, NewFinding, RemediationPhase, RepoMeta, ScanLogEntry,
    ScanStatus, TreeEntry,
};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use uuid::Uuid;

/// A partial update to an audit. `None` leaves a field untouched; for the
/// result fields a `Some(None)` explicitly clears the stored value.
#[derive(Debug, Default)]
pub struct AuditPatch {
    pub status: Option<ScanStatus>,
    pub repo_meta: Option<RepoMeta>,
    pub file_tree: Option<Vec<TreeEntry>>,
    pub scan_log: Option<Vec<ScanLogEntry>>,
    pub scanned_at: Option<DateTime<Utc>>,
    pub scores: Option<Option<CategoryScores>>,
    pub executive_summary: Option<Option<String>>,
    pub remediation_plan: Option<Option<Vec<RemediationPhase>>>,
}

impl AuditPatch {
    /// The state-reset transition at the start of a scan: mark the run
    /// in progress and clear all previous results and log entries.
    pub fn reset() -> Self {
        Self {
            status: Some(ScanStatus::InProgress),
            scan_log: Some(Vec::new()),
            scores: Some(None),
            executive_summary: Some(None),
            remediation_plan: Some(None),
            ..Default::default()
        }
    }

    fn apply(self, audit: &mut Audit) {
        if let Some(status) = self.status {
            audit.status = status;
        }
        if let Some(meta) = self.repo_meta {
            audit.repo_meta = Some(meta);
        }
        if let Some(tree) = self.file_tree {
            audit.file_tree = Some(tree);
        }
        if let Some(log) = self.scan_log {
            audit.scan_log = log;
        }
        if let Some(at) = self.scanned_at {
            audit.scanned_at = Some(at);
        }
        if let Some(scores) = self.scores {
            audit.scores = scores;
        }
        if let Some(summary) = self.executive_summary {
            audit.executive_summary = summary;
        }
        if let Some(plan) = self.remediation_plan {
            audit.remediation_plan = plan;
        }
    }
}

pub trait AuditStore: Send + Sync {
    fn create_audit(&self, owner: &str, repo: &str) -> Audit;
    fn audit(&self, id: &str) -> Option<Audit>;
    fn update_audit(&self, id: &str, patch: AuditPatch) -> Option<Audit>;
    /// Findings for an audit, in creation order.
    fn findings_for(&self, audit_id: &str) -> Vec<Finding>;
    fn create_finding(&self, audit_id: &str, draft: NewFinding) -> Finding;
    fn delete_finding(&self, id: &str) -> bool;
}

/// In-process store over concurrent maps.
#[derive(Default)]
pub struct MemoryStore {
    audits: DashMap<String, Audit>,
    findings: DashMap<String, Vec<Finding>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AuditStore for MemoryStore {
    fn create_audit(&self, owner: &str, repo: &str) -> Audit {
        let audit = Audit::new(Uuid::new_v4().to_string(), owner, repo);
        self.audits.insert(audit.id.clone(), audit.clone());
        audit
    }

    fn audit(&self, id: &str) -> Option<Audit> {
        self.audits.get(id).map(|a| a.value().clone())
    }

    fn update_audit(&self, id: &str, patch: AuditPatch) -> Option<Audit> {
        let mut audit = self.audits.get_mut(id)?;
        patch.apply(&mut audit);
        Some(audit.clone())
    }

    fn findings_for(&self, audit_id: &str) -> Vec<Finding> {
        self.findings
            .get(audit_id)
            .map(|f| f.value().clone())
            .unwrap_or_default()
    }

    fn create_finding(&self, audit_id: &str, draft: NewFinding) -> Finding {
        let finding = Finding {
            id: Uuid::new_v4().to_string(),
            audit_id: audit_id.to_string(),
            detail: draft,
        };
        self.findings
            .entry(audit_id.to_string())
            .or_default()
            .push(finding.clone());
        finding
    }

    fn delete_finding(&self, id: &str) -> bool {
        let mut deleted = false;
        for mut entry in self.findings.iter_mut() {
            let before = entry.len();
            entry.retain(|f| f.id != id);
            if entry.len() != before {
                deleted = true;
                break;
            }
        }
        deleted
    }
}
