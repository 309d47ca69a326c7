//! Apply command module.
//!
//! Loads a desired-state document, builds a token authenticated GitHub client and
//! hands both to the reconciliation engine. The handler takes the engine call as a
//! function so tests can observe the request without talking to GitHub.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, ValueEnum};
use colored::Colorize;
use github_client::{create_token_client, GitHubClient};
use repo_steward_core::{
    DesiredState, EngineSettings, FixedOwnerKind, GitHubOwnerKindProbe, OwnerKind, OwnerKindProbe,
    ReconcileReport, RepositoryReconciler, Severity, StewardResult,
};
use secrecy::SecretString;
use tracing::{debug, info};

use crate::errors::{Error, EXIT_CATEGORY_FAILURES, EXIT_SUCCESS};

#[cfg(test)]
#[path = "apply_cmd_tests.rs"]
mod apply_cmd_tests;

/// Owner kinds that can be forced from the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OwnerKindArg {
    Organization,
    User,
}

impl From<OwnerKindArg> for OwnerKind {
    fn from(value: OwnerKindArg) -> Self {
        match value {
            OwnerKindArg::Organization => OwnerKind::Organization,
            OwnerKindArg::User => OwnerKind::User,
        }
    }
}

/// Command-line arguments for the apply command.
#[derive(Args, Debug)]
pub struct ApplyArgs {
    /// Path to the desired-state document.
    ///
    /// Files ending in `.toml` are read as TOML, anything else as JSON.
    #[arg(long, short)]
    pub config: PathBuf,

    /// GitHub token used for every API call.
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Base URL of the GitHub API, for GitHub Enterprise Server.
    #[arg(long)]
    pub api_url: Option<String>,

    /// Seconds to wait after creating a repository before configuring it.
    #[arg(long, default_value_t = 2)]
    pub settle_delay_secs: u64,

    /// Skip the organization lookup and treat the owner as this kind of account.
    #[arg(long, value_enum)]
    pub owner_kind: Option<OwnerKindArg>,
}

/// Everything the engine needs for one run.
#[derive(Debug)]
pub struct ApplyRequest {
    pub desired: DesiredState,
    pub token: SecretString,
    pub api_url: Option<String>,
    pub settings: EngineSettings,
    pub owner_kind: Option<OwnerKind>,
}

/// Runs the engine against GitHub.
pub async fn apply_desired_state(request: ApplyRequest) -> StewardResult<ReconcileReport> {
    let github_client = GitHubClient::new(create_token_client(
        &request.token,
        request.api_url.as_deref(),
    )?);

    let owner_probe: Arc<dyn OwnerKindProbe> = match request.owner_kind {
        Some(kind) => {
            info!(owner_kind = ?kind, "Using owner kind from the command line");
            Arc::new(FixedOwnerKind(kind))
        }
        None => Arc::new(GitHubOwnerKindProbe::new(github_client.clone())),
    };

    RepositoryReconciler::new(github_client, owner_probe, request.settings)
        .reconcile(&request.desired)
        .await
}

/// Handles the apply command.
///
/// # Errors
///
/// Returns an error when no token is available, the document cannot be loaded, or
/// the engine could not complete the run.
pub async fn handle_apply_command<F, Fut>(
    args: &ApplyArgs,
    apply_fn: F,
) -> Result<ReconcileReport, Error>
where
    F: Fn(ApplyRequest) -> Fut,
    Fut: Future<Output = StewardResult<ReconcileReport>>,
{
    let token = args
        .token
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| {
            Error::InvalidArguments(
                "no GitHub token; pass --token or set GITHUB_TOKEN".to_string(),
            )
        })?;

    let desired = DesiredState::from_path(&args.config)?;
    debug!(
        config = %args.config.display(),
        owner = %desired.repository.owner,
        repo = %desired.repository.name,
        "Loaded desired state"
    );

    let request = ApplyRequest {
        desired,
        token: SecretString::from(token.to_string()),
        api_url: args.api_url.clone(),
        settings: EngineSettings {
            creation_settle_delay: Duration::from_secs(args.settle_delay_secs),
        },
        owner_kind: args.owner_kind.map(OwnerKind::from),
    };

    Ok(apply_fn(request).await?)
}

/// The process exit code for a completed run.
pub fn exit_code(report: &ReconcileReport) -> i32 {
    if report.is_success() {
        EXIT_SUCCESS
    } else {
        EXIT_CATEGORY_FAILURES
    }
}

/// Formats the run summary: one line per category followed by its diagnostics.
pub fn render_report(report: &ReconcileReport) -> String {
    let mut lines = Vec::new();

    let headline = if report.created {
        format!("Created {} ({})", report.target, report.repository_url)
    } else {
        format!("Reconciled {} ({})", report.target, report.repository_url)
    };
    lines.push(headline.bold().to_string());

    for category in &report.categories {
        let line = category.to_string();
        let line = if !category.is_success() {
            line.red().to_string()
        } else if category.has_changes() {
            line.green().to_string()
        } else {
            line
        };
        lines.push(format!("  {}", line));

        for diagnostic in &category.diagnostics {
            let text = format!("    - {}: {}", diagnostic.subject, diagnostic.message);
            lines.push(match diagnostic.severity {
                Severity::Failure => text.red().to_string(),
                Severity::Warning => text.yellow().to_string(),
            });
        }
    }

    let footer = if report.is_success() {
        "All categories succeeded".green().to_string()
    } else {
        format!("{} failure(s)", report.failures().len())
            .red()
            .to_string()
    };
    lines.push(footer);

    lines.join("\n")
}
