//! Sequencing the reconcilers for one repository.
//!
//! Existence is the only hard prerequisite: if the repository cannot be created the
//! run stops with an error. Every later category runs regardless of how the others
//! went and contributes one [`CategoryReport`] to the [`ReconcileReport`].

use std::sync::Arc;
use std::time::Duration;

use github_client::{create_token_client, ActionsScope, GitHubClient};
use secrecy::SecretString;
use tracing::{info, instrument, warn};

use crate::access_reconciler::AccessReconciler;
use crate::branch_protection_reconciler::BranchProtectionReconciler;
use crate::configuration::DesiredState;
use crate::environment_reconciler::EnvironmentReconciler;
use crate::errors::StewardResult;
use crate::existence_reconciler::ExistenceReconciler;
use crate::file_reconciler::FileReconciler;
use crate::owner_probe::{GitHubOwnerKindProbe, OwnerKindProbe};
use crate::property_reconciler::PropertyReconciler;
use crate::report::{Category, ReconcileReport};
use crate::secret_reconciler::SecretReconciler;

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;

/// Default wait after creating a repository before touching its sub-resources.
pub const DEFAULT_CREATION_SETTLE_DELAY: Duration = Duration::from_secs(2);

/// Engine tunables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    /// How long to wait after creating a repository; GitHub answers 404 for
    /// sub-resources of a repository that was created a moment ago.
    pub creation_settle_delay: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            creation_settle_delay: DEFAULT_CREATION_SETTLE_DELAY,
        }
    }
}

/// Converges a repository to a [`DesiredState`].
pub struct RepositoryReconciler {
    existence: ExistenceReconciler,
    properties: PropertyReconciler,
    files: FileReconciler,
    branch_protection: BranchProtectionReconciler,
    environments: EnvironmentReconciler,
    secrets: SecretReconciler,
    access: AccessReconciler,
    settings: EngineSettings,
}

impl RepositoryReconciler {
    pub fn new(
        github_client: GitHubClient,
        owner_probe: Arc<dyn OwnerKindProbe>,
        settings: EngineSettings,
    ) -> Self {
        Self {
            existence: ExistenceReconciler::new(github_client.clone(), owner_probe.clone()),
            properties: PropertyReconciler::new(github_client.clone(), owner_probe),
            files: FileReconciler::new(github_client.clone()),
            branch_protection: BranchProtectionReconciler::new(github_client.clone()),
            environments: EnvironmentReconciler::new(github_client.clone()),
            secrets: SecretReconciler::new(github_client.clone()),
            access: AccessReconciler::new(github_client),
            settings,
        }
    }

    /// Runs every category in order and collects their reports.
    ///
    /// # Errors
    ///
    /// Returns an error when the document names an invalid target or the
    /// repository is missing and cannot be created. Failures inside a category are
    /// reported, not returned.
    #[instrument(skip(self, desired), fields(owner = %desired.repository.owner, repo = %desired.repository.name))]
    pub async fn reconcile(&self, desired: &DesiredState) -> StewardResult<ReconcileReport> {
        let target = desired.target()?;

        let existence = self
            .existence
            .ensure_exists(&target, &desired.repository)
            .await?;

        if existence.created && !self.settings.creation_settle_delay.is_zero() {
            info!(
                target = %target,
                delay_ms = self.settings.creation_settle_delay.as_millis() as u64,
                "Waiting for the new repository to settle"
            );
            tokio::time::sleep(self.settings.creation_settle_delay).await;
        }

        let mut report = ReconcileReport::new(
            target.clone(),
            existence.repository.html_url.to_string(),
            existence.created,
        );

        report
            .categories
            .push(self.properties.reconcile(&target, desired).await);
        report
            .categories
            .push(self.files.reconcile(&target, desired).await);
        report
            .categories
            .push(self.branch_protection.reconcile(&target, desired).await);
        report
            .categories
            .extend(self.environments.reconcile(&target, desired).await.into_vec());
        report.categories.push(
            self.secrets
                .reconcile_variables(&target, &ActionsScope::Repository, &desired.variables, Category::Variables)
                .await,
        );
        report.categories.push(
            self.secrets
                .reconcile_secrets(&target, &ActionsScope::Repository, &desired.secrets, Category::Secrets)
                .await,
        );
        report
            .categories
            .push(self.access.reconcile_teams(&target, &desired.team_access).await);
        report
            .categories
            .push(self.access.reconcile_users(&target, &desired.user_access).await);

        for category in &report.categories {
            if category.is_success() {
                info!(target = %target, "{}", category);
            } else {
                warn!(target = %target, "{}", category);
            }
        }

        Ok(report)
    }
}

/// Builds a token authenticated client and converges one repository.
///
/// `api_url` selects a GitHub Enterprise Server API root; `None` uses
/// `https://api.github.com`.
///
/// # Errors
///
/// Returns an error when the client cannot be built or [`RepositoryReconciler::reconcile`]
/// fails.
pub async fn reconcile_repository(
    token: &SecretString,
    api_url: Option<&str>,
    desired: &DesiredState,
    settings: EngineSettings,
) -> StewardResult<ReconcileReport> {
    let github_client = GitHubClient::new(create_token_client(token, api_url)?);
    let owner_probe = Arc::new(GitHubOwnerKindProbe::new(github_client.clone()));

    RepositoryReconciler::new(github_client, owner_probe, settings)
        .reconcile(desired)
        .await
}
