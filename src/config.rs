//! Scan configuration
//!
//! Supports loading config from:
//! - A `repovet.toml` file (optional)
//! - Environment variables (`GITHUB_TOKEN` overrides the file)
//!
//! All limits default to values tuned for a bounded, predictable scan cost
//! per run; tests and callers can override any of them.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Maximum number of files fetched and scanned per run. Files beyond
    /// the ceiling are silently skipped.
    pub max_files: usize,
    /// Files larger than this (bytes, per the tree entry) are skipped.
    pub max_file_bytes: u64,
    /// Context lines on each side of a security match snippet.
    pub snippet_context_lines: usize,
    /// Line count above which a file draws a low-severity size finding.
    pub large_file_lines: usize,
    /// Line count above which the size finding escalates to medium.
    pub very_large_file_lines: usize,
    /// Stability rules fire when per-file matches exceed this count.
    pub stability_threshold: usize,
    /// Maintainability rules fire when per-file matches exceed this count.
    pub maintainability_threshold: usize,
    /// Concurrent file-content fetch workers.
    pub workers: usize,
    /// Per-request timeout for host API calls, in seconds.
    pub timeout_secs: u64,
    /// Host API base URL. Tests point this at a fake server.
    pub api_base: String,
    /// Bearer token for the host API. `GITHUB_TOKEN` overrides.
    pub token: Option<String>,
    /// Substrings that suppress a secret match containing them. Empty by
    /// default; the generic password/secret/token rules are heuristic and
    /// this is the escape hatch for known false positives.
    pub secret_allowlist: Vec<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            max_files: 80,
            max_file_bytes: 200_000,
            snippet_context_lines: 2,
            large_file_lines: 500,
            very_large_file_lines: 1000,
            stability_threshold: 2,
            maintainability_threshold: 3,
            workers: 4,
            timeout_secs: 30,
            api_base: "https://api.github.com".to_string(),
            token: None,
            secret_allowlist: Vec::new(),
        }
    }
}

impl ScanConfig {
    /// Load config with priority: environment > file > defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                let content = std::fs::read_to_string(path)
                    .with_context(|| format!("reading config file {}", path.display()))?;
                toml::from_str(&content)
                    .with_context(|| format!("parsing config file {}", path.display()))?
            }
            None => Self::default(),
        };

        if let Ok(token) = std::env::var("GITHUB_TOKEN") {
            if !token.is_empty() {
                config.token = Some(token);
            }
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_bound_scan_cost() {
        let config = ScanConfig::default();
        assert_eq!(config.max_files, 80);
        assert_eq!(config.max_file_bytes, 200_000);
        assert_eq!(config.stability_threshold, 2);
        assert_eq!(config.maintainability_threshold, 3);
        assert!(config.secret_allowlist.is_empty());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "max_files = 10\nsecret_allowlist = [\"example\"]").unwrap();

        let config = ScanConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.max_files, 10);
        assert_eq!(config.secret_allowlist, vec!["example"]);
        // Untouched fields fall back to defaults.
        assert_eq!(config.max_file_bytes, 200_000);
        assert_eq!(config.api_base, "https://api.github.com");
    }

    #[test]
    fn unreadable_config_is_an_error() {
        assert!(ScanConfig::load(Some(Path::new("/nonexistent/repovet.toml"))).is_err());
    }
}
