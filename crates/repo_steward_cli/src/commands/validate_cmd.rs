//! Validate command module.
//!
//! Loads a desired-state document and describes what an apply run would manage,
//! without contacting GitHub.

use std::path::PathBuf;

use clap::Args;
use repo_steward_core::configuration::GitignoreSource;
use repo_steward_core::{DesiredState, Target};

use crate::errors::Error;

#[cfg(test)]
#[path = "validate_cmd_tests.rs"]
mod validate_cmd_tests;

/// Command-line arguments for the validate command.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Path to the desired-state document.
    #[arg(long, short)]
    pub config: PathBuf,
}

/// A validated document and the plan derived from it.
#[derive(Debug)]
pub struct ValidationReport {
    pub target: Target,
    pub plan: Vec<String>,
}

/// Handles the validate command.
///
/// # Errors
///
/// Returns an error when the document cannot be read or parsed, or names an
/// invalid repository.
pub fn handle_validate_command(args: &ValidateArgs) -> Result<ValidationReport, Error> {
    let desired = DesiredState::from_path(&args.config)?;
    let target = desired.target()?;

    Ok(ValidationReport {
        target,
        plan: plan(&desired),
    })
}

fn count(n: usize, singular: &str, plural: &str) -> String {
    if n == 1 {
        format!("1 {}", singular)
    } else {
        format!("{} {}", n, plural)
    }
}

fn names<'a>(items: impl IntoIterator<Item = &'a String>) -> String {
    items
        .into_iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// One line per category that the document manages.
pub fn plan(desired: &DesiredState) -> Vec<String> {
    let mut lines = vec![format!(
        "repository: ensure exists ({})",
        desired.repository.visibility
    )];

    let properties = desired
        .custom_properties
        .values()
        .filter(|v| !v.trim().is_empty())
        .count();
    if properties > 0 {
        lines.push(format!("custom properties: {}", count(properties, "property", "properties")));
    }

    let mut files = vec!["README.md".to_string()];
    match desired.files.gitignore_source() {
        GitignoreSource::Unmanaged => {}
        GitignoreSource::Template(name) => files.push(format!(".gitignore (template {})", name)),
        GitignoreSource::Literal(_) => files.push(".gitignore".to_string()),
    }
    files.extend(desired.files.contents.keys().cloned());
    lines.push(format!("files: {}", files.join(", ")));

    let branches: Vec<&String> = desired
        .branch_protection
        .enabled_policies()
        .map(|(name, _)| name)
        .collect();
    if !branches.is_empty() {
        lines.push(format!("branch protection: {}", names(branches)));
    }

    if !desired.environments.is_empty() {
        lines.push(format!("environments: {}", names(&desired.environments)));
    }

    let unmanaged: Vec<&String> = desired
        .environment_protection
        .keys()
        .chain(desired.environment_variables.keys())
        .chain(desired.environment_secrets.keys())
        .filter(|name| !desired.has_environment(name))
        .collect();
    if !unmanaged.is_empty() {
        let mut unmanaged = unmanaged;
        unmanaged.sort();
        unmanaged.dedup();
        lines.push(format!("skipped (environment not managed): {}", names(unmanaged)));
    }

    if !desired.variables.is_empty() {
        lines.push(format!("variables: {}", names(desired.variables.keys())));
    }
    if !desired.secrets.is_empty() {
        lines.push(format!("secrets: {}", names(desired.secrets.keys())));
    }
    if !desired.team_access.is_empty() {
        lines.push(format!("team access: {}", count(desired.team_access.len(), "team", "teams")));
    }
    if !desired.user_access.is_empty() {
        lines.push(format!("user access: {}", count(desired.user_access.len(), "user", "users")));
    }

    lines
}
