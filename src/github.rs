//! Source host client
//!
//! `RepoHost` is the narrow contract the scanner consumes: repository
//! metadata, a language histogram, the flat file tree, and individual file
//! contents. `GithubClient` implements it against the GitHub REST API with
//! sync HTTP via ureq. Callers treat every method except `repository` as
//! best-effort.

use crate::config::ScanConfig;
use crate::models::{EntryKind, TreeEntry};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum HostError {
    #[error("repository not found")]
    NotFound,
    #[error("host returned status {0}")]
    Status(u16),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("could not decode response: {0}")]
    Decode(String),
}

/// Repository metadata as reported by the host, before the language
/// histogram is filled in.
#[derive(Debug, Clone, Deserialize)]
pub struct RepoSummary {
    pub full_name: String,
    #[serde(rename = "stargazers_count")]
    pub stars: u64,
    #[serde(rename = "forks_count")]
    pub forks: u64,
    #[serde(rename = "open_issues_count")]
    pub open_issues: u64,
    pub default_branch: String,
    #[serde(rename = "pushed_at")]
    pub last_push: Option<DateTime<Utc>>,
    pub private: bool,
    pub description: Option<String>,
    pub size: u64,
}

/// The fetch contract the scan pipeline consumes.
pub trait RepoHost: Send + Sync {
    /// Repository metadata. The only call whose failure aborts a run.
    fn repository(&self, owner: &str, repo: &str) -> Result<RepoSummary, HostError>;

    /// Byte counts per language. Best-effort.
    fn languages(&self, owner: &str, repo: &str) -> Result<BTreeMap<String, u64>, HostError>;

    /// Full recursive file tree for a ref, flattened. Best-effort.
    fn tree(&self, owner: &str, repo: &str, git_ref: &str) -> Result<Vec<TreeEntry>, HostError>;

    /// UTF-8 contents of one file. Best-effort; callers skip on failure.
    fn file_content(&self, owner: &str, repo: &str, path: &str) -> Result<String, HostError>;
}

/// GitHub REST v3 implementation of [`RepoHost`].
pub struct GithubClient {
    agent: ureq::Agent,
    base: String,
    token: Option<String>,
}

#[derive(Deserialize)]
struct TreeResponse {
    #[serde(default)]
    tree: Vec<TreeNode>,
}

#[derive(Deserialize)]
struct TreeNode {
    #[serde(default)]
    path: String,
    #[serde(rename = "type")]
    kind: String,
    size: Option<u64>,
}

#[derive(Deserialize)]
struct ContentResponse {
    content: Option<String>,
    encoding: Option<String>,
}

impl GithubClient {
    pub fn new(config: &ScanConfig) -> Self {
        let agent = ureq::config::Config::builder()
            .http_status_as_error(false)
            .timeout_global(Some(Duration::from_secs(config.timeout_secs)))
            .build()
            .new_agent();
        Self {
            agent,
            base: config.api_base.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        }
    }

    fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, HostError> {
        debug!("GET {url}");
        let mut request = self
            .agent
            .get(url)
            .header("Accept", "application/vnd.github+json")
            .header("User-Agent", "repovet");
        if let Some(token) = &self.token {
            request = request.header("Authorization", format!("Bearer {token}"));
        }
        let response = request
            .call()
            .map_err(|e| HostError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        if status == 404 {
            return Err(HostError::NotFound);
        }
        if status >= 400 {
            return Err(HostError::Status(status));
        }

        let text = response
            .into_body()
            .read_to_string()
            .map_err(|e| HostError::Transport(e.to_string()))?;
        serde_json::from_str(&text).map_err(|e| HostError::Decode(e.to_string()))
    }
}

impl RepoHost for GithubClient {
    fn repository(&self, owner: &str, repo: &str) -> Result<RepoSummary, HostError> {
        self.get_json(&format!("{}/repos/{owner}/{repo}", self.base))
    }

    fn languages(&self, owner: &str, repo: &str) -> Result<BTreeMap<String, u64>, HostError> {
        self.get_json(&format!("{}/repos/{owner}/{repo}/languages", self.base))
    }

    fn tree(&self, owner: &str, repo: &str, git_ref: &str) -> Result<Vec<TreeEntry>, HostError> {
        let response: TreeResponse = self.get_json(&format!(
            "{}/repos/{owner}/{repo}/git/trees/{git_ref}?recursive=true",
            self.base
        ))?;
        Ok(map_tree(response.tree))
    }

    fn file_content(&self, owner: &str, repo: &str, path: &str) -> Result<String, HostError> {
        let response: ContentResponse =
            self.get_json(&format!("{}/repos/{owner}/{repo}/contents/{path}", self.base))?;
        decode_blob(&response)
    }
}

/// Flatten the host's tree nodes, keeping only files and directories.
fn map_tree(nodes: Vec<TreeNode>) -> Vec<TreeEntry> {
    nodes
        .into_iter()
        .filter_map(|node| match node.kind.as_str() {
            "blob" => Some(TreeEntry {
                path: node.path,
                kind: EntryKind::File,
                size: node.size,
            }),
            "tree" => Some(TreeEntry {
                path: node.path,
                kind: EntryKind::Dir,
                size: None,
            }),
            _ => None,
        })
        .collect()
}

/// Decode a base64 content payload into UTF-8 text.
fn decode_blob(response: &ContentResponse) -> Result<String, HostError> {
    let (Some(content), Some(encoding)) = (&response.content, &response.encoding) else {
        return Err(HostError::Decode("missing content payload".to_string()));
    };
    if encoding != "base64" {
        return Err(HostError::Decode(format!("unexpected encoding {encoding}")));
    }
    // GitHub wraps base64 bodies with newlines.
    let compact: String = content.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = BASE64
        .decode(compact.as_bytes())
        .map_err(|e| HostError::Decode(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| HostError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_tree_keeps_blobs_and_trees() {
        let nodes = vec![
            TreeNode {
                path: "src".to_string(),
                kind: "tree".to_string(),
                size: None,
            },
            TreeNode {
                path: "src/main.ts".to_string(),
                kind: "blob".to_string(),
                size: Some(120),
            },
            TreeNode {
                path: "module".to_string(),
                kind: "commit".to_string(),
                size: None,
            },
        ];
        let entries = map_tree(nodes);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].kind, EntryKind::Dir);
        assert_eq!(entries[1].kind, EntryKind::File);
        assert_eq!(entries[1].size, Some(120));
    }

    #[test]
    fn decode_blob_handles_wrapped_base64() {
        let response = ContentResponse {
            content: Some("aGVsbG8g\nd29ybGQ=\n".to_string()),
            encoding: Some("base64".to_string()),
        };
        assert_eq!(decode_blob(&response).unwrap(), "hello world");
    }

    #[test]
    fn decode_blob_rejects_other_encodings() {
        let response = ContentResponse {
            content: Some("hello".to_string()),
            encoding: Some("utf-8".to_string()),
        };
        assert!(matches!(
            decode_blob(&response),
            Err(HostError::Decode(_))
        ));
    }
}
