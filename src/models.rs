//! Core data models for repovet
//!
//! These models are used throughout the codebase for representing
//! audits, findings, scan progress, and report artifacts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Severity levels for findings.
///
/// Ordering is by risk: `Low < Medium < High < Critical`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Low,
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Low => write!(f, "low"),
            Severity::Medium => write!(f, "medium"),
            Severity::High => write!(f, "high"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

/// The five risk dimensions an audit reports on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Security,
    Stability,
    Maintainability,
    Scalability,
    Cicd,
}

impl Default for Category {
    fn default() -> Self {
        Category::Security
    }
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Security,
        Category::Stability,
        Category::Maintainability,
        Category::Scalability,
        Category::Cicd,
    ];
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Category::Security => write!(f, "security"),
            Category::Stability => write!(f, "stability"),
            Category::Maintainability => write!(f, "maintainability"),
            Category::Scalability => write!(f, "scalability"),
            Category::Cicd => write!(f, "cicd"),
        }
    }
}

/// T-shirt estimate for fixing a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Effort {
    #[default]
    S,
    M,
    L,
}

/// Lifecycle of a finding after it has been raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FindingStatus {
    #[default]
    Open,
    InProgress,
    Resolved,
}

/// A detected issue, before it has been persisted.
///
/// Identity for deduplication is the (title, file_path) pair, not an id;
/// the store assigns ids when a draft is persisted as a [`Finding`].
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct NewFinding {
    pub category: Category,
    pub severity: Severity,
    pub title: String,
    pub description: String,
    pub file_path: Option<String>,
    pub line_start: Option<u32>,
    pub line_end: Option<u32>,
    pub code_snippet: Option<String>,
    pub business_impact: String,
    pub fix_steps: String,
    pub effort: Effort,
    pub status: FindingStatus,
    /// Machine-generated findings are cleared and recreated on each scan;
    /// manually entered ones (`false`) survive rescans.
    pub auto_detected: bool,
}

/// A persisted finding, bound to an audit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    pub id: String,
    pub audit_id: String,
    #[serde(flatten)]
    pub detail: NewFinding,
}

/// Outcome status of a single scan step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogStatus {
    Ok,
    Warn,
    Error,
}

/// One entry in the append-only audit trail of a scan run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanLogEntry {
    pub step: String,
    pub status: LogStatus,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl ScanLogEntry {
    pub fn new(step: impl Into<String>, status: LogStatus, message: impl Into<String>) -> Self {
        Self {
            step: step.into(),
            status,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Repository metadata captured once per scan.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RepoMeta {
    pub languages: BTreeMap<String, u64>,
    pub stars: u64,
    pub forks: u64,
    pub open_issues: u64,
    pub default_branch: String,
    pub last_push: Option<DateTime<Utc>>,
    pub private: bool,
    pub description: Option<String>,
    /// Repository size in kilobytes, as reported by the host.
    pub size: u64,
}

/// Whether a tree entry is a file or a directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Dir,
}

/// One entry in the flat repository file tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeEntry {
    pub path: String,
    pub kind: EntryKind,
    pub size: Option<u64>,
}

impl TreeEntry {
    pub fn file(path: impl Into<String>, size: u64) -> Self {
        Self {
            path: path.into(),
            kind: EntryKind::File,
            size: Some(size),
        }
    }

    pub fn dir(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: EntryKind::Dir,
            size: None,
        }
    }
}

/// Per-category health scores, each in `0..=10`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CategoryScores {
    pub security: u8,
    pub stability: u8,
    pub maintainability: u8,
    pub scalability: u8,
    pub cicd: u8,
}

impl CategoryScores {
    pub fn get(&self, category: Category) -> u8 {
        match category {
            Category::Security => self.security,
            Category::Stability => self.stability,
            Category::Maintainability => self.maintainability,
            Category::Scalability => self.scalability,
            Category::Cicd => self.cicd,
        }
    }

    pub fn set(&mut self, category: Category, score: u8) {
        match category {
            Category::Security => self.security = score,
            Category::Stability => self.stability = score,
            Category::Maintainability => self.maintainability = score,
            Category::Scalability => self.scalability = score,
            Category::Cicd => self.cicd = score,
        }
    }

    fn total(&self) -> u32 {
        u32::from(self.security)
            + u32::from(self.stability)
            + u32::from(self.maintainability)
            + u32::from(self.scalability)
            + u32::from(self.cicd)
    }

    /// Unweighted mean of the five scores, rounded to the nearest integer.
    pub fn mean(&self) -> u8 {
        (f64::from(self.total()) / 5.0).round() as u8
    }

    /// Unweighted mean without rounding, for log output.
    pub fn mean_exact(&self) -> f64 {
        f64::from(self.total()) / 5.0
    }
}

/// One phase of the remediation plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemediationPhase {
    pub phase: String,
    pub days: String,
    pub tasks: Vec<String>,
}

/// Scan run state machine. There is no failed terminal state; failed runs
/// land in `Complete` with a degraded summary and no scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ScanStatus {
    #[default]
    Pending,
    InProgress,
    Complete,
}

impl std::fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScanStatus::Pending => write!(f, "pending"),
            ScanStatus::InProgress => write!(f, "in_progress"),
            ScanStatus::Complete => write!(f, "complete"),
        }
    }
}

/// One audit target and the results of its most recent scan run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Audit {
    pub id: String,
    pub owner: String,
    pub repo: String,
    pub status: ScanStatus,
    pub scores: Option<CategoryScores>,
    pub executive_summary: Option<String>,
    pub remediation_plan: Option<Vec<RemediationPhase>>,
    pub repo_meta: Option<RepoMeta>,
    pub file_tree: Option<Vec<TreeEntry>>,
    pub scan_log: Vec<ScanLogEntry>,
    pub scanned_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Audit {
    pub fn new(id: impl Into<String>, owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            owner: owner.into(),
            repo: repo.into(),
            status: ScanStatus::Pending,
            scores: None,
            executive_summary: None,
            remediation_plan: None,
            repo_meta: None,
            file_tree: None,
            scan_log: Vec::new(),
            scanned_at: None,
            created_at: Utc::now(),
        }
    }

    /// `owner/repo` slug for display.
    pub fn slug(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_orders_by_risk() {
        assert!(Severity::Low < Severity::Medium);
        assert!(Severity::Medium < Severity::High);
        assert!(Severity::High < Severity::Critical);
    }

    #[test]
    fn severity_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&Severity::Critical).unwrap(),
            "\"critical\""
        );
        assert_eq!(serde_json::to_string(&Category::Cicd).unwrap(), "\"cicd\"");
    }

    #[test]
    fn scores_mean_rounds_to_nearest() {
        let scores = CategoryScores {
            security: 7,
            stability: 8,
            maintainability: 8,
            scalability: 10,
            cicd: 10,
        };
        // 43 / 5 = 8.6 -> 9
        assert_eq!(scores.mean(), 9);
    }

    #[test]
    fn scan_status_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&ScanStatus::InProgress).unwrap(),
            "\"in_progress\""
        );
    }
}
