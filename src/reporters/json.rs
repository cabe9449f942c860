//! Machine-readable JSON reporter

use crate::models::{Audit, Finding};
use anyhow::Result;
use serde::Serialize;

#[derive(Serialize)]
struct Report<'a> {
    audit: &'a Audit,
    findings: &'a [Finding],
}

pub fn render(audit: &Audit, findings: &[Finding]) -> Result<String> {
    Ok(serde_json::to_string_pretty(&Report { audit, findings })?)
}
