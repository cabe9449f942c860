//! Tree-level structural checks
//!
//! Content-independent checks over the flat file tree: committed sensitive
//! files, missing .gitignore, manifest-without-lockfile, missing CI
//! workflows, and package.json dependency analysis. All functions take the
//! tree pre-filtered to file entries.

use crate::catalog::RuleCatalog;
use crate::models::{Category, Effort, NewFinding, Severity, TreeEntry};

/// One finding per sensitive-filename pattern, for the first tree entry
/// that matches it. Later occurrences of the same pattern are ignored.
pub fn sensitive_file_findings(catalog: &RuleCatalog, files: &[TreeEntry]) -> Vec<NewFinding> {
    let mut findings = Vec::new();
    for sensitive in &catalog.sensitive_files {
        let nested = format!("/{}", sensitive.name);
        let hit = files
            .iter()
            .find(|f| f.path.ends_with(sensitive.name) || f.path.contains(&nested));
        let Some(hit) = hit else { continue };
        findings.push(NewFinding {
            category: Category::Security,
            severity: sensitive.severity,
            title: sensitive.title.to_string(),
            description: format!(
                "The file \"{}\" should never be committed to version control. It likely contains secrets, credentials, or sensitive configuration.",
                hit.path
            ),
            file_path: Some(hit.path.clone()),
            business_impact: "Anyone with access to the repository (including if it becomes public) can extract secrets from this file and gain unauthorized access to your systems.".to_string(),
            fix_steps: format!(
                "1. Remove the file from the repository: git rm --cached {}\n2. Add it to .gitignore\n3. Rotate any secrets that were in the file\n4. Use git filter-branch or BFG to remove from history",
                hit.path
            ),
            effort: Effort::S,
            auto_detected: true,
            ..Default::default()
        });
    }
    findings
}

/// High-severity security finding when no `.gitignore` exists at the root.
pub fn missing_gitignore(files: &[TreeEntry]) -> Option<NewFinding> {
    if files.iter().any(|f| f.path == ".gitignore") {
        return None;
    }
    Some(NewFinding {
        category: Category::Security,
        severity: Severity::High,
        title: "Missing .gitignore File".to_string(),
        description: "No .gitignore file found in the repository root. Without it, sensitive files, build artifacts, and dependency folders may be committed.".to_string(),
        business_impact: "Secrets, node_modules, .env files, and other sensitive/unnecessary files may be committed to the repo.".to_string(),
        fix_steps: "1. Create a .gitignore file at the project root\n2. Use a template from gitignore.io for your stack\n3. At minimum include: node_modules/, .env*, dist/, build/, *.log".to_string(),
        effort: Effort::S,
        auto_detected: true,
        ..Default::default()
    })
}

/// Whether any `package.json` exists, at the root or nested.
pub fn has_manifest(files: &[TreeEntry]) -> bool {
    files
        .iter()
        .any(|f| f.path == "package.json" || f.path.ends_with("/package.json"))
}

/// Whether a root-level `package.json` exists (the one dependency analysis
/// fetches).
pub fn has_root_manifest(files: &[TreeEntry]) -> bool {
    files.iter().any(|f| f.path == "package.json")
}

/// High-severity stability finding when a manifest exists but none of the
/// recognized lockfiles does.
pub fn missing_lockfile(catalog: &RuleCatalog, files: &[TreeEntry]) -> Option<NewFinding> {
    if !has_manifest(files) {
        return None;
    }
    let has_lockfile = files
        .iter()
        .any(|f| catalog.lockfiles.contains(&f.path.as_str()));
    if has_lockfile {
        return None;
    }
    Some(NewFinding {
        category: Category::Stability,
        severity: Severity::High,
        title: "Missing Package Lock File".to_string(),
        description: "No package-lock.json, yarn.lock, or pnpm-lock.yaml found. Builds are non-deterministic without a lockfile.".to_string(),
        business_impact: "Different installs will get different dependency versions. This leads to 'works on my machine' bugs and can introduce breaking changes without warning.".to_string(),
        fix_steps: "1. Run npm install (or yarn/pnpm install) to generate a lockfile\n2. Commit the lockfile to version control\n3. Use npm ci in CI/CD for deterministic builds".to_string(),
        effort: Effort::S,
        auto_detected: true,
        ..Default::default()
    })
}

/// Medium-severity CI/CD finding when no workflow file exists under
/// `.github/workflows/`.
pub fn missing_ci_workflow(files: &[TreeEntry]) -> Option<NewFinding> {
    if files.iter().any(|f| f.path.starts_with(".github/workflows/")) {
        return None;
    }
    Some(NewFinding {
        category: Category::Cicd,
        severity: Severity::Medium,
        title: "No CI/CD Pipeline Configured".to_string(),
        description: "No GitHub Actions workflows found. There are no automated checks running on pull requests or deployments.".to_string(),
        business_impact: "Without CI/CD, bugs and security issues reach production unchecked. Manual deployments are error-prone and not auditable.".to_string(),
        fix_steps: "1. Create .github/workflows/ci.yml\n2. Add steps for: lint, type-check, test, dependency audit\n3. Enable branch protection requiring CI to pass\n4. Consider adding secret scanning (gitleaks)".to_string(),
        effort: Effort::M,
        auto_detected: true,
        ..Default::default()
    })
}

/// Dependency analysis of a fetched root `package.json`.
///
/// Returns the findings plus the total dependency count for logging, or the
/// parse error for the caller to degrade on.
pub fn manifest_findings(
    catalog: &RuleCatalog,
    manifest: &str,
    files: &[TreeEntry],
) -> Result<(Vec<NewFinding>, usize), serde_json::Error> {
    let pkg: serde_json::Value = serde_json::from_str(manifest)?;

    let mut deps: Vec<String> = Vec::new();
    for key in ["dependencies", "devDependencies"] {
        if let Some(map) = pkg.get(key).and_then(|v| v.as_object()) {
            deps.extend(map.keys().cloned());
        }
    }

    let mut findings = Vec::new();

    let has_linter = catalog
        .linters
        .iter()
        .any(|linter| deps.iter().any(|d| d == linter));
    if !has_linter {
        findings.push(NewFinding {
            category: Category::Maintainability,
            severity: Severity::Low,
            title: "No Linter Configured".to_string(),
            description: "No ESLint or Biome found in dependencies. Code quality is not being enforced automatically.".to_string(),
            file_path: Some("package.json".to_string()),
            business_impact: "Without a linter, code quality degrades over time and common bugs go undetected.".to_string(),
            fix_steps: "1. Install ESLint: npm install -D eslint\n2. Create .eslintrc configuration\n3. Add lint script to package.json\n4. Consider adding to CI pipeline".to_string(),
            effort: Effort::S,
            auto_detected: true,
            ..Default::default()
        });
    }

    let has_typescript = deps.iter().any(|d| d == "typescript");
    let has_tsconfig = files.iter().any(|f| f.path == "tsconfig.json");
    if has_typescript && !has_tsconfig {
        findings.push(NewFinding {
            category: Category::Stability,
            severity: Severity::Medium,
            title: "TypeScript Installed but tsconfig.json Missing".to_string(),
            description: "TypeScript is in dependencies but no tsconfig.json found. TypeScript may not be properly configured.".to_string(),
            file_path: Some("package.json".to_string()),
            business_impact: "Without proper TypeScript configuration, type checking may be too loose or not running at all.".to_string(),
            fix_steps: "1. Run npx tsc --init to generate tsconfig.json\n2. Configure strict mode for best type safety\n3. Set appropriate target and module settings".to_string(),
            effort: Effort::S,
            auto_detected: true,
            ..Default::default()
        });
    }

    Ok((findings, deps.len()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> RuleCatalog {
        RuleCatalog::builtin()
    }

    #[test]
    fn sensitive_file_fires_once_per_pattern() {
        let files = vec![
            TreeEntry::file(".env", 10),
            TreeEntry::file("config/.env", 10),
            TreeEntry::file("src/index.ts", 100),
        ];
        let findings = sensitive_file_findings(&catalog(), &files);
        let env: Vec<_> = findings
            .iter()
            .filter(|f| f.title == ".env File Committed to Repository")
            .collect();
        assert_eq!(env.len(), 1);
        assert_eq!(env[0].file_path.as_deref(), Some(".env"));
        assert_eq!(env[0].severity, Severity::Critical);
    }

    #[test]
    fn sensitive_file_matches_nested_paths() {
        let files = vec![TreeEntry::file("keys/firebase-adminsdk-x1.json", 10)];
        let findings = sensitive_file_findings(&catalog(), &files);
        assert!(findings
            .iter()
            .any(|f| f.title == "Firebase Admin SDK Credentials File"));
    }

    #[test]
    fn gitignore_check_requires_root_entry() {
        let without = vec![TreeEntry::file("src/main.ts", 10)];
        assert!(missing_gitignore(&without).is_some());

        let with = vec![TreeEntry::file(".gitignore", 10)];
        assert!(missing_gitignore(&with).is_none());

        // A nested .gitignore does not count.
        let nested = vec![TreeEntry::file("pkg/.gitignore", 10)];
        assert!(missing_gitignore(&nested).is_some());
    }

    #[test]
    fn lockfile_check_needs_manifest_and_no_lockfile() {
        let no_manifest = vec![TreeEntry::file("main.go", 10)];
        assert!(missing_lockfile(&catalog(), &no_manifest).is_none());

        let manifest_only = vec![TreeEntry::file("package.json", 10)];
        let finding = missing_lockfile(&catalog(), &manifest_only).unwrap();
        assert_eq!(finding.title, "Missing Package Lock File");
        assert_eq!(finding.severity, Severity::High);
        assert_eq!(finding.category, Category::Stability);

        let locked = vec![
            TreeEntry::file("package.json", 10),
            TreeEntry::file("yarn.lock", 10),
        ];
        assert!(missing_lockfile(&catalog(), &locked).is_none());

        // A nested manifest still triggers the check.
        let nested = vec![TreeEntry::file("web/package.json", 10)];
        assert!(missing_lockfile(&catalog(), &nested).is_some());
    }

    #[test]
    fn ci_check_looks_for_workflow_entries() {
        let without = vec![TreeEntry::file("README.md", 10)];
        let finding = missing_ci_workflow(&without).unwrap();
        assert_eq!(finding.category, Category::Cicd);
        assert_eq!(finding.severity, Severity::Medium);

        let with = vec![TreeEntry::file(".github/workflows/ci.yml", 10)];
        assert!(missing_ci_workflow(&with).is_none());
    }

    #[test]
    fn manifest_without_linter_or_tsconfig() {
        let files = vec![TreeEntry::file("package.json", 10)];
        let manifest = r#"{"dependencies": {"typescript": "^5.0.0", "react": "^18.0.0"}}"#;
        let (findings, dep_count) = manifest_findings(&catalog(), manifest, &files).unwrap();
        assert_eq!(dep_count, 2);
        assert!(findings.iter().any(|f| f.title == "No Linter Configured"));
        assert!(findings
            .iter()
            .any(|f| f.title == "TypeScript Installed but tsconfig.json Missing"));
    }

    #[test]
    fn manifest_with_linter_and_tsconfig_is_quiet() {
        let files = vec![
            TreeEntry::file("package.json", 10),
            TreeEntry::file("tsconfig.json", 10),
        ];
        let manifest =
            r#"{"dependencies": {"typescript": "5"}, "devDependencies": {"eslint": "9"}}"#;
        let (findings, dep_count) = manifest_findings(&catalog(), manifest, &files).unwrap();
        assert!(findings.is_empty());
        assert_eq!(dep_count, 2);
    }

    #[test]
    fn manifest_parse_error_propagates() {
        let files = vec![TreeEntry::file("package.json", 10)];
        assert!(manifest_findings(&catalog(), "{not json", &files).is_err());
    }
}
