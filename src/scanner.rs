//! Scan orchestration
//!
//! Sequences one audit run: repository metadata, languages, file tree,
//! structural checks, bounded content fetching + rule evaluation, manifest
//! analysis, dedup, scoring, and narrative synthesis. The run executes on
//! its own thread after `start_scan` returns, appending to the audit's
//! step log and persisting partial state as each stage completes so the
//! run can be observed mid-flight.
//!
//! A run never ends in a failed state: an unreachable repository or an
//! internal error lands the audit in `complete` with an explanatory
//! summary and no scores.

use crate::catalog::RuleCatalog;
use crate::checks;
use crate::config::ScanConfig;
use crate::dedup::dedup_findings;
use crate::engine::RuleEngine;
use crate::github::RepoHost;
use crate::models::{
    EntryKind, LogStatus, NewFinding, RepoMeta, ScanLogEntry, ScanStatus, TreeEntry,
};
use crate::narrative::{executive_summary, remediation_plan};
use crate::scoring::score_findings;
use crate::storage::{AuditPatch, AuditStore};
use chrono::Utc;
use dashmap::DashSet;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StartScanError {
    #[error("audit not found")]
    NotFound,
    #[error("a scan is already in progress for this audit")]
    AlreadyRunning,
}

/// Orchestrates scan runs. Cheap to clone; clones share the store, host,
/// catalog, and the in-flight run guard.
#[derive(Clone)]
pub struct Scanner {
    host: Arc<dyn RepoHost>,
    store: Arc<dyn AuditStore>,
    catalog: Arc<RuleCatalog>,
    config: ScanConfig,
    running: Arc<DashSet<String>>,
}

impl Scanner {
    pub fn new(
        host: Arc<dyn RepoHost>,
        store: Arc<dyn AuditStore>,
        catalog: Arc<RuleCatalog>,
        config: ScanConfig,
    ) -> Self {
        Self {
            host,
            store,
            catalog,
            config,
            running: Arc::new(DashSet::new()),
        }
    }

    /// Begin a scan for an audit and return immediately; the run proceeds
    /// on its own thread. Rejects when a run is already in flight for the
    /// same audit. Machine-generated findings from earlier runs are
    /// cleared before the run starts; manually entered findings are kept.
    pub fn start_scan(&self, audit_id: &str) -> Result<(), StartScanError> {
        let audit = self.store.audit(audit_id).ok_or(StartScanError::NotFound)?;

        if !self.running.insert(audit_id.to_string()) {
            return Err(StartScanError::AlreadyRunning);
        }
        if audit.status == ScanStatus::InProgress {
            self.running.remove(audit_id);
            return Err(StartScanError::AlreadyRunning);
        }

        for finding in self.store.findings_for(audit_id) {
            if finding.detail.auto_detected {
                self.store.delete_finding(&finding.id);
            }
        }
        self.store.update_audit(audit_id, AuditPatch::reset());

        let scanner = self.clone();
        std::thread::spawn(move || {
            let mut run = ScanRun {
                scanner: &scanner,
                audit_id: audit.id.clone(),
                owner: audit.owner.clone(),
                repo: audit.repo.clone(),
                log: Vec::new(),
            };
            if let Err(err) = run.execute() {
                warn!("scan of {} failed: {err}", run.slug());
                run.add_log("error", LogStatus::Error, err.to_string());
                run.finish_degraded(format!(
                    "Scan encountered an error: {err}. Some results may be incomplete."
                ));
            }
            scanner.running.remove(&audit.id);
        });

        Ok(())
    }
}

/// One in-flight run: the audit being scanned plus its growing step log.
struct ScanRun<'a> {
    scanner: &'a Scanner,
    audit_id: String,
    owner: String,
    repo: String,
    log: Vec<ScanLogEntry>,
}

impl ScanRun<'_> {
    fn slug(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }

    fn add_log(&mut self, step: &str, status: LogStatus, message: impl Into<String>) {
        let message = message.into();
        debug!("[{}] {step}: {message}", self.slug());
        self.log.push(ScanLogEntry::new(step, status, message));
    }

    /// Persist a partial update, always carrying the current step log so
    /// observers polling the audit see progress.
    fn persist(&self, mut patch: AuditPatch) {
        patch.scan_log = Some(self.log.clone());
        self.scanner.store.update_audit(&self.audit_id, patch);
    }

    /// Terminate the run as complete-but-degraded: summary only, no scores.
    fn finish_degraded(&self, summary: String) {
        self.persist(AuditPatch {
            status: Some(ScanStatus::Complete),
            scanned_at: Some(Utc::now()),
            executive_summary: Some(Some(summary)),
            ..Default::default()
        });
    }

    fn execute(&mut self) -> anyhow::Result<()> {
        let host = self.scanner.host.as_ref();
        let catalog = self.scanner.catalog.as_ref();
        let config = &self.scanner.config;

        self.add_log("connect", LogStatus::Ok, "Connected to GitHub API");

        let summary = match host.repository(&self.owner, &self.repo) {
            Ok(summary) => {
                self.add_log(
                    "fetch_repo",
                    LogStatus::Ok,
                    format!("Fetched repository: {}", summary.full_name),
                );
                summary
            }
            Err(err) => {
                self.add_log(
                    "fetch_repo",
                    LogStatus::Error,
                    format!("Cannot access repository: {err}"),
                );
                self.finish_degraded(
                    "Unable to access this repository. Please ensure the repository exists and the configured token has access."
                        .to_string(),
                );
                return Ok(());
            }
        };

        let mut meta = RepoMeta {
            languages: Default::default(),
            stars: summary.stars,
            forks: summary.forks,
            open_issues: summary.open_issues,
            default_branch: summary.default_branch.clone(),
            last_push: summary.last_push,
            private: summary.private,
            description: summary.description.clone(),
            size: summary.size,
        };

        match host.languages(&self.owner, &self.repo) {
            Ok(languages) => {
                let names: Vec<&str> = languages.keys().map(String::as_str).collect();
                self.add_log(
                    "languages",
                    LogStatus::Ok,
                    format!("Detected languages: {}", names.join(", ")),
                );
                meta.languages = languages;
            }
            Err(_) => self.add_log("languages", LogStatus::Warn, "Could not fetch language data"),
        }

        self.persist(AuditPatch {
            repo_meta: Some(meta),
            ..Default::default()
        });

        let tree = match host.tree(&self.owner, &self.repo, &summary.default_branch) {
            Ok(tree) => {
                self.add_log(
                    "file_tree",
                    LogStatus::Ok,
                    format!("Found {} files/directories", tree.len()),
                );
                tree
            }
            Err(err) => {
                self.add_log(
                    "file_tree",
                    LogStatus::Error,
                    format!("Cannot fetch file tree: {err}"),
                );
                Vec::new()
            }
        };

        self.persist(AuditPatch {
            file_tree: Some(tree.clone()),
            ..Default::default()
        });

        let files: Vec<TreeEntry> = tree
            .into_iter()
            .filter(|t| t.kind == EntryKind::File)
            .collect();

        let mut candidates: Vec<NewFinding> = Vec::new();

        for finding in checks::sensitive_file_findings(catalog, &files) {
            if let Some(path) = &finding.file_path {
                self.add_log(
                    "sensitive_file",
                    LogStatus::Warn,
                    format!("Found sensitive file: {path}"),
                );
            }
            candidates.push(finding);
        }
        candidates.extend(checks::missing_gitignore(&files));
        candidates.extend(checks::missing_lockfile(catalog, &files));
        candidates.extend(checks::missing_ci_workflow(&files));

        let scannable: Vec<&TreeEntry> = files
            .iter()
            .filter(|f| catalog.is_scannable(&f.path) && f.size.unwrap_or(0) < config.max_file_bytes)
            .take(config.max_files)
            .collect();

        self.add_log(
            "scan_files",
            LogStatus::Ok,
            format!("Scanning {} files for patterns", scannable.len()),
        );
        self.persist(AuditPatch::default());

        let (file_findings, files_scanned) = self.scan_contents(&scannable);
        candidates.extend(file_findings);

        self.add_log(
            "pattern_scan",
            LogStatus::Ok,
            format!(
                "Scanned {files_scanned} files, found {} issues",
                candidates.len()
            ),
        );

        if checks::has_root_manifest(&files) {
            match host.file_content(&self.owner, &self.repo, "package.json") {
                Ok(manifest) => match checks::manifest_findings(catalog, &manifest, &files) {
                    Ok((findings, dep_count)) => {
                        candidates.extend(findings);
                        self.add_log(
                            "package_analysis",
                            LogStatus::Ok,
                            format!("Analyzed package.json: {dep_count} dependencies"),
                        );
                    }
                    Err(_) => self.add_log(
                        "package_analysis",
                        LogStatus::Warn,
                        "Could not parse package.json",
                    ),
                },
                Err(_) => self.add_log(
                    "package_analysis",
                    LogStatus::Warn,
                    "Could not fetch package.json",
                ),
            }
        }

        let deduped = dedup_findings(candidates);
        for draft in &deduped {
            self.scanner.store.create_finding(&self.audit_id, draft.clone());
        }

        let scores = score_findings(&deduped);
        let summary_text = executive_summary(&self.owner, &self.repo, &deduped, &scores);
        let plan = remediation_plan(&deduped);

        self.add_log(
            "complete",
            LogStatus::Ok,
            format!(
                "Scan complete: {} findings, {} avg score",
                deduped.len(),
                scores.mean_exact()
            ),
        );
        info!("scan of {} complete: {} findings", self.slug(), deduped.len());

        self.persist(AuditPatch {
            status: Some(ScanStatus::Complete),
            scanned_at: Some(Utc::now()),
            scores: Some(Some(scores)),
            executive_summary: Some(Some(summary_text)),
            remediation_plan: Some(Some(plan)),
            ..Default::default()
        });

        Ok(())
    }

    /// Fetch and rule-scan the selected files on a bounded worker pool.
    ///
    /// Results are reassembled in selection order so downstream slicing is
    /// deterministic regardless of fetch completion order. A file whose
    /// fetch fails is skipped, not reported.
    fn scan_contents(&self, files: &[&TreeEntry]) -> (Vec<NewFinding>, usize) {
        if files.is_empty() {
            return (Vec::new(), 0);
        }

        let engine = RuleEngine::new(Arc::clone(&self.scanner.catalog), &self.scanner.config);
        let workers = self.scanner.config.workers.clamp(1, files.len());
        let host = self.scanner.host.as_ref();
        let owner = self.owner.as_str();
        let repo = self.repo.as_str();

        let (job_tx, job_rx) = crossbeam_channel::unbounded::<(usize, String)>();
        let (result_tx, result_rx) = crossbeam_channel::unbounded::<(usize, Vec<NewFinding>)>();

        for (index, file) in files.iter().enumerate() {
            let _ = job_tx.send((index, file.path.clone()));
        }
        drop(job_tx);

        std::thread::scope(|scope| {
            for _ in 0..workers {
                let job_rx = job_rx.clone();
                let result_tx = result_tx.clone();
                let engine = &engine;
                scope.spawn(move || {
                    while let Ok((index, path)) = job_rx.recv() {
                        match host.file_content(owner, repo, &path) {
                            Ok(content) => {
                                let _ = result_tx.send((index, engine.scan_file(&path, &content)));
                            }
                            Err(err) => debug!("skipping {path}: {err}"),
                        }
                    }
                });
            }
        });
        drop(result_tx);

        let mut slots: Vec<Option<Vec<NewFinding>>> = vec![None; files.len()];
        for (index, findings) in result_rx.iter() {
            slots[index] = Some(findings);
        }

        let mut findings = Vec::new();
        let mut scanned = 0;
        for slot in slots {
            if let Some(file_findings) = slot {
                scanned += 1;
                findings.extend(file_findings);
            }
        }
        (findings, scanned)
    }
}
