//! Per-category health scoring
//!
//! Each category starts at 10 and loses a fixed penalty per finding, keyed
//! by severity. Categories are scored independently; a category with no
//! findings always scores exactly 10.

use crate::models::{Category, CategoryScores, NewFinding, Severity};

fn penalty(severity: Severity) -> f64 {
    match severity {
        Severity::Critical => 3.0,
        Severity::High => 2.0,
        Severity::Medium => 1.0,
        Severity::Low => 0.3,
    }
}

pub fn score_findings(findings: &[NewFinding]) -> CategoryScores {
    let mut scores = CategoryScores::default();
    for category in Category::ALL {
        let mut score = 10.0;
        for finding in findings.iter().filter(|f| f.category == category) {
            score -= penalty(finding.severity);
        }
        scores.set(category, score.round().clamp(0.0, 10.0) as u8);
    }
    scores
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finding(category: Category, severity: Severity) -> NewFinding {
        NewFinding {
            category,
            severity,
            title: format!("{category}/{severity}"),
            ..Default::default()
        }
    }

    #[test]
    fn empty_category_scores_ten() {
        let scores = score_findings(&[]);
        for category in Category::ALL {
            assert_eq!(scores.get(category), 10);
        }
    }

    #[test]
    fn penalties_subtract_by_severity() {
        let findings = vec![
            finding(Category::Security, Severity::Critical),
            finding(Category::Security, Severity::High),
            finding(Category::Stability, Severity::Medium),
            finding(Category::Maintainability, Severity::Low),
        ];
        let scores = score_findings(&findings);
        assert_eq!(scores.security, 5);
        assert_eq!(scores.stability, 9);
        // 9.7 rounds to 10
        assert_eq!(scores.maintainability, 10);
        assert_eq!(scores.scalability, 10);
        assert_eq!(scores.cicd, 10);
    }

    #[test]
    fn score_clamps_at_zero() {
        let findings: Vec<_> = (0..5)
            .map(|_| finding(Category::Security, Severity::Critical))
            .collect();
        assert_eq!(score_findings(&findings).security, 0);
    }

    #[test]
    fn categories_do_not_interact() {
        let findings = vec![finding(Category::Cicd, Severity::Medium)];
        let scores = score_findings(&findings);
        assert_eq!(scores.cicd, 9);
        assert_eq!(scores.security, 10);
    }
}
