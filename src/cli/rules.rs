//! `repovet rules` - list the detection rule catalog

use crate::catalog::RuleCatalog;
use anyhow::Result;
use console::style;

pub fn run() -> Result<()> {
    let catalog = RuleCatalog::builtin();

    println!("{}", style("Secret signatures (fire once per file)").bold());
    for rule in &catalog.secrets {
        println!("  {:<44} {}", rule.name, rule.severity);
    }

    println!();
    println!("{}", style("Security patterns (fire once per file)").bold());
    for rule in &catalog.security {
        println!("  {:<44} {}", rule.name, rule.severity);
    }

    println!();
    println!(
        "{}",
        style("Stability patterns (fire above 2 occurrences per file)").bold()
    );
    for rule in &catalog.stability {
        println!("  {:<44} {}", rule.name, rule.severity);
    }

    println!();
    println!(
        "{}",
        style("Maintainability patterns (fire above 3 occurrences per file)").bold()
    );
    for rule in &catalog.maintainability {
        println!("  {:<44} {}", rule.name, rule.severity);
    }

    println!();
    println!("{}", style("Sensitive filenames").bold());
    for file in &catalog.sensitive_files {
        println!("  {:<44} {}", file.name, file.severity);
    }

    Ok(())
}
