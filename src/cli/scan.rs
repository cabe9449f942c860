//! `repovet scan` - run one audit end to end and print the report

use crate::catalog::RuleCatalog;
use crate::config::ScanConfig;
use crate::github::GithubClient;
use crate::models::ScanStatus;
use crate::reporters::{self, OutputFormat};
use crate::scanner::Scanner;
use crate::storage::{AuditStore, MemoryStore};
use anyhow::{bail, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

pub fn run(
    slug: &str,
    format: &str,
    config_path: Option<&Path>,
    token: Option<String>,
    workers: Option<usize>,
    show_log: bool,
) -> Result<()> {
    let format = OutputFormat::from_str(format)?;
    let Some((owner, repo)) = slug.split_once('/') else {
        bail!("expected a repository as owner/repo, got '{slug}'");
    };
    if owner.is_empty() || repo.is_empty() {
        bail!("expected a repository as owner/repo, got '{slug}'");
    }

    let mut config = ScanConfig::load(config_path)?;
    if token.is_some() {
        config.token = token;
    }
    if let Some(workers) = workers {
        config.workers = workers;
    }

    let store: Arc<MemoryStore> = Arc::new(MemoryStore::new());
    let host = Arc::new(GithubClient::new(&config));
    let scanner = Scanner::new(
        host,
        Arc::clone(&store) as Arc<dyn AuditStore>,
        Arc::new(RuleCatalog::builtin()),
        config,
    );

    let audit = store.create_audit(owner, repo);
    scanner
        .start_scan(&audit.id)
        .context("could not start scan")?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner} {msg}").expect("static spinner template"),
    );
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner.set_message(format!("Scanning {owner}/{repo}..."));

    // The run is fire-and-forget; observe it through the persisted state.
    let finished = loop {
        let current = store
            .audit(&audit.id)
            .context("audit disappeared while scanning")?;
        if let Some(entry) = current.scan_log.last() {
            spinner.set_message(format!("{}: {}", entry.step, entry.message));
        }
        if current.status == ScanStatus::Complete {
            break current;
        }
        std::thread::sleep(Duration::from_millis(150));
    };
    spinner.finish_and_clear();

    let findings = store.findings_for(&audit.id);
    print!("{}", reporters::report(&finished, &findings, format)?);

    if show_log {
        println!();
        println!("Scan log:");
        for entry in &finished.scan_log {
            println!(
                "  {} [{:>5}] {}: {}",
                entry.timestamp.format("%H:%M:%S"),
                format!("{:?}", entry.status).to_lowercase(),
                entry.step,
                entry.message
            );
        }
    }

    Ok(())
}
