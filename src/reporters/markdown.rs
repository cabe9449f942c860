//! GitHub-flavored Markdown reporter
//!
//! Suitable for README files, pull request comments, and issue bodies.

use crate::models::{Audit, Category, Finding, Severity};
use anyhow::Result;
use chrono::Local;
use std::fmt::Write;

pub fn render(audit: &Audit, findings: &[Finding]) -> Result<String> {
    let mut md = String::new();

    writeln!(md, "# Repository Audit: {}", audit.slug())?;
    writeln!(md)?;
    writeln!(
        md,
        "Generated: {}",
        Local::now().format("%Y-%m-%d %H:%M:%S")
    )?;
    writeln!(md)?;

    if let Some(scores) = &audit.scores {
        writeln!(md, "## Health Scores")?;
        writeln!(md)?;
        writeln!(md, "| Category | Score |")?;
        writeln!(md, "|----------|-------|")?;
        for category in Category::ALL {
            writeln!(md, "| {category} | {}/10 |", scores.get(category))?;
        }
        writeln!(md, "| **overall** | **{}/10** |", scores.mean())?;
        writeln!(md)?;
    }

    if let Some(summary) = &audit.executive_summary {
        writeln!(md, "## Executive Summary")?;
        writeln!(md)?;
        writeln!(md, "{summary}")?;
        writeln!(md)?;
    }

    if !findings.is_empty() {
        writeln!(md, "## Findings")?;
        writeln!(md)?;
        for severity in [
            Severity::Critical,
            Severity::High,
            Severity::Medium,
            Severity::Low,
        ] {
            let of_severity: Vec<&Finding> = findings
                .iter()
                .filter(|f| f.detail.severity == severity)
                .collect();
            if of_severity.is_empty() {
                continue;
            }
            writeln!(md, "### {severity} ({})", of_severity.len())?;
            writeln!(md)?;
            for finding in of_severity {
                writeln!(md, "#### {}", finding.detail.title)?;
                writeln!(md)?;
                if let Some(path) = &finding.detail.file_path {
                    match finding.detail.line_start {
                        Some(line) => writeln!(md, "`{path}:{line}`")?,
                        None => writeln!(md, "`{path}`")?,
                    }
                    writeln!(md)?;
                }
                writeln!(md, "{}", finding.detail.description)?;
                writeln!(md)?;
                if let Some(snippet) = &finding.detail.code_snippet {
                    writeln!(md, "```\n{snippet}\n```")?;
                    writeln!(md)?;
                }
                writeln!(md, "**Impact:** {}", finding.detail.business_impact)?;
                writeln!(md)?;
                writeln!(md, "**Fix:**")?;
                writeln!(md)?;
                writeln!(md, "{}", finding.detail.fix_steps)?;
                writeln!(md)?;
            }
        }
    }

    if let Some(plan) = &audit.remediation_plan {
        writeln!(md, "## Remediation Plan")?;
        writeln!(md)?;
        for phase in plan {
            writeln!(md, "### {} ({})", phase.phase, phase.days)?;
            writeln!(md)?;
            for task in &phase.tasks {
                writeln!(md, "- [ ] {task}")?;
            }
            writeln!(md)?;
        }
    }

    Ok(md)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewFinding, RemediationPhase};

    #[test]
    fn renders_findings_and_plan() {
        let mut audit = Audit::new("id-1", "acme", "shop");
        audit.remediation_plan = Some(vec![RemediationPhase {
            phase: "Stabilize".to_string(),
            days: "Day 1-5".to_string(),
            tasks: vec!["Fix the thing".to_string()],
        }]);
        let findings = vec![Finding {
            id: "f-1".to_string(),
            audit_id: "id-1".to_string(),
            detail: NewFinding {
                severity: Severity::High,
                title: "Missing Package Lock File".to_string(),
                description: "No lockfile found.".to_string(),
                ..Default::default()
            },
        }];

        let md = render(&audit, &findings).unwrap();
        assert!(md.contains("# Repository Audit: acme/shop"));
        assert!(md.contains("### high (1)"));
        assert!(md.contains("#### Missing Package Lock File"));
        assert!(md.contains("- [ ] Fix the thing"));
    }
}
