//! Terminal reporter with colors

use crate::models::{Audit, Category, Finding, Severity};
use anyhow::Result;
use console::style;
use std::fmt::Write;

pub fn render(audit: &Audit, findings: &[Finding]) -> Result<String> {
    let mut out = String::new();

    writeln!(out, "{}", style(format!("Audit: {}", audit.slug())).bold())?;
    writeln!(out, "Status: {}", audit.status)?;
    if let Some(meta) = &audit.repo_meta {
        let languages: Vec<&str> = meta.languages.keys().map(String::as_str).collect();
        writeln!(
            out,
            "Repo: ★ {}  ⑂ {}  issues {}  default branch {}",
            meta.stars, meta.forks, meta.open_issues, meta.default_branch
        )?;
        if !languages.is_empty() {
            writeln!(out, "Languages: {}", languages.join(", "))?;
        }
    }
    writeln!(out)?;

    if let Some(scores) = &audit.scores {
        writeln!(out, "{}", style("Health Scores").bold().underlined())?;
        for category in Category::ALL {
            let score = scores.get(category);
            writeln!(out, "  {:<16} {}", category.to_string(), colored_score(score))?;
        }
        writeln!(out, "  {:<16} {}", "overall", colored_score(scores.mean()))?;
        writeln!(out)?;
    }

    if let Some(summary) = &audit.executive_summary {
        writeln!(out, "{}", style("Executive Summary").bold().underlined())?;
        writeln!(out, "{summary}")?;
        writeln!(out)?;
    }

    if !findings.is_empty() {
        writeln!(out, "{}", style("Findings").bold().underlined())?;
        for severity in [
            Severity::Critical,
            Severity::High,
            Severity::Medium,
            Severity::Low,
        ] {
            for finding in findings.iter().filter(|f| f.detail.severity == severity) {
                let location = match (&finding.detail.file_path, finding.detail.line_start) {
                    (Some(path), Some(line)) => format!(" ({path}:{line})"),
                    (Some(path), None) => format!(" ({path})"),
                    _ => String::new(),
                };
                writeln!(
                    out,
                    "  {} {}{}",
                    severity_badge(severity),
                    finding.detail.title,
                    style(location).dim()
                )?;
            }
        }
        writeln!(out)?;
    }

    if let Some(plan) = &audit.remediation_plan {
        writeln!(out, "{}", style("Remediation Plan").bold().underlined())?;
        for phase in plan {
            writeln!(
                out,
                "  {} {}",
                style(&phase.phase).bold(),
                style(format!("({})", phase.days)).dim()
            )?;
            for task in &phase.tasks {
                writeln!(out, "    - {task}")?;
            }
        }
    }

    Ok(out)
}

fn severity_badge(severity: Severity) -> String {
    match severity {
        Severity::Critical => style("[CRITICAL]").red().bold().to_string(),
        Severity::High => style("[HIGH]").red().to_string(),
        Severity::Medium => style("[MEDIUM]").yellow().to_string(),
        Severity::Low => style("[LOW]").dim().to_string(),
    }
}

fn colored_score(score: u8) -> String {
    let rendered = format!("{score}/10");
    if score >= 8 {
        style(rendered).green().to_string()
    } else if score >= 5 {
        style(rendered).yellow().to_string()
    } else {
        style(rendered).red().to_string()
    }
}
