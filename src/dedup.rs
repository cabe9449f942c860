//! Candidate finding deduplication
//!
//! Two rule matches that produce the same title on the same file collapse
//! into one finding. First occurrence wins and discovery order is
//! preserved, which downstream report slicing relies on.

use crate::models::NewFinding;
use std::collections::HashSet;

pub fn dedup_findings(findings: Vec<NewFinding>) -> Vec<NewFinding> {
    let mut seen: HashSet<(String, Option<String>)> = HashSet::new();
    findings
        .into_iter()
        .filter(|f| seen.insert((f.title.clone(), f.file_path.clone())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, Severity};

    fn finding(title: &str, path: Option<&str>) -> NewFinding {
        NewFinding {
            category: Category::Security,
            severity: Severity::High,
            title: title.to_string(),
            file_path: path.map(String::from),
            ..Default::default()
        }
    }

    #[test]
    fn removes_same_title_same_path() {
        let input = vec![
            finding("Use of eval()", Some("a.js")),
            finding("Use of eval()", Some("a.js")),
            finding("Use of eval()", Some("b.js")),
        ];
        let out = dedup_findings(input);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].file_path.as_deref(), Some("a.js"));
        assert_eq!(out[1].file_path.as_deref(), Some("b.js"));
    }

    #[test]
    fn pathless_findings_dedup_on_title() {
        let input = vec![finding("Missing .gitignore File", None), finding("Missing .gitignore File", None)];
        assert_eq!(dedup_findings(input).len(), 1);
    }

    #[test]
    fn preserves_discovery_order() {
        let input = vec![
            finding("c", Some("1")),
            finding("a", Some("1")),
            finding("b", Some("1")),
        ];
        let titles: Vec<_> = dedup_findings(input).into_iter().map(|f| f.title).collect();
        assert_eq!(titles, vec!["c", "a", "b"]);
    }

    #[test]
    fn is_idempotent() {
        let input = vec![
            finding("x", Some("1")),
            finding("x", Some("1")),
            finding("y", None),
        ];
        let once = dedup_findings(input);
        let twice = dedup_findings(once.clone());
        assert_eq!(once.len(), twice.len());
        let titles: Vec<_> = twice.iter().map(|f| &f.title).collect();
        assert_eq!(titles, vec!["x", "y"]);
    }
}
