//! CLI command definitions and handlers

mod rules;
mod scan;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Parse and validate workers count (1-64)
fn parse_workers(s: &str) -> Result<usize, String> {
    let n: usize = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;
    if n == 0 {
        Err("workers must be at least 1".to_string())
    } else if n > 64 {
        Err("workers cannot exceed 64".to_string())
    } else {
        Ok(n)
    }
}

/// repovet - launch-readiness scanning for GitHub repositories
#[derive(Parser, Debug)]
#[command(name = "repovet")]
#[command(
    version,
    about = "Scan a GitHub repository for committed secrets, security anti-patterns, and stability risks, and score its health",
    after_help = "\
Examples:
  repovet scan acme/shop                     Scan a repository
  repovet scan acme/shop --format json       JSON output for scripting
  repovet scan acme/shop --format markdown   Markdown report for a PR comment
  repovet rules                              List the detection rule catalog

Private repositories need a token: set GITHUB_TOKEN or pass --token."
)]
pub struct Cli {
    /// Log level when RUST_LOG is not set (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "warn", value_parser = ["error", "warn", "info", "debug", "trace"])]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan a repository and print the audit report
    Scan {
        /// Repository to scan, as owner/repo
        repo: String,

        /// Output format: text, json, markdown (or md)
        #[arg(long, short = 'f', default_value = "text", value_parser = ["text", "json", "markdown", "md"])]
        format: String,

        /// Path to a repovet.toml config file
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,

        /// GitHub API token (for private repos and higher rate limits)
        #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
        token: Option<String>,

        /// Number of concurrent file fetch workers (1-64)
        #[arg(long, value_parser = parse_workers)]
        workers: Option<usize>,

        /// Print the scan step log after the report
        #[arg(long)]
        show_log: bool,
    },

    /// List the detection rule catalog
    Rules,
}

pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Scan {
            repo,
            format,
            config,
            token,
            workers,
            show_log,
        } => scan::run(&repo, &format, config.as_deref(), token, workers, show_log),
        Commands::Rules => rules::run(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workers_parser_bounds() {
        assert!(parse_workers("0").is_err());
        assert!(parse_workers("65").is_err());
        assert_eq!(parse_workers("8").unwrap(), 8);
    }

    #[test]
    fn cli_parses_scan_command() {
        let cli = Cli::try_parse_from(["repovet", "scan", "acme/shop", "--format", "json"]).unwrap();
        match cli.command {
            Commands::Scan { repo, format, .. } => {
                assert_eq!(repo, "acme/shop");
                assert_eq!(format, "json");
            }
            _ => panic!("expected scan command"),
        }
    }
}
