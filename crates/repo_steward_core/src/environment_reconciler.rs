//! Deployment environments, their protection rules and their scoped Actions stores.
//!
//! Missing environments are created with a baseline document first. Protection is
//! then converged for every configured environment, new or old: the environment is
//! read back and the full document is written only when it differs. Entries that
//! name an environment outside the desired set are skipped, never treated as errors.

use std::collections::{BTreeSet, HashSet};

use github_client::{
    ActionsScope, EnvironmentDetails, EnvironmentReviewer, EnvironmentUpdate, GitHubClient,
};
use tracing::{debug, info, warn};

use crate::access_reconciler::resolve_team;
use crate::configuration::{DesiredState, EnvironmentProtection, ReviewerKind, ReviewerRef};
use crate::report::{Category, CategoryReport};
use crate::secret_reconciler::SecretReconciler;
use crate::target::Target;

#[cfg(test)]
#[path = "environment_reconciler_tests.rs"]
mod tests;

/// Reports produced by one environment pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentReports {
    pub environments: CategoryReport,
    pub variables: CategoryReport,
    pub secrets: CategoryReport,
}

impl EnvironmentReports {
    pub fn into_vec(self) -> Vec<CategoryReport> {
        vec![self.environments, self.variables, self.secrets]
    }
}

/// Whether an observed environment already carries the desired protection.
///
/// Reviewers are compared as a set. `prevent_self_review` is only meaningful when
/// reviewers are required, since GitHub does not report it otherwise.
pub fn environment_matches(observed: &EnvironmentDetails, desired: &EnvironmentUpdate) -> bool {
    let observed_reviewers: BTreeSet<EnvironmentReviewer> =
        observed.reviewers().into_iter().collect();
    let desired_reviewers: BTreeSet<EnvironmentReviewer> =
        desired.reviewers.iter().cloned().collect();

    let self_review_matches = desired_reviewers.is_empty()
        || observed.prevent_self_review() == desired.prevent_self_review.unwrap_or(false);

    observed.wait_timer() == desired.wait_timer
        && observed_reviewers == desired_reviewers
        && self_review_matches
        && observed.deployment_branch_policy == desired.deployment_branch_policy
}

/// Converges deployment environments.
pub struct EnvironmentReconciler {
    github_client: GitHubClient,
    secrets: SecretReconciler,
}

impl EnvironmentReconciler {
    pub fn new(github_client: GitHubClient) -> Self {
        Self {
            secrets: SecretReconciler::new(github_client.clone()),
            github_client,
        }
    }

    pub async fn reconcile(&self, target: &Target, desired: &DesiredState) -> EnvironmentReports {
        let mut environments = CategoryReport::new(Category::Environments);

        let failed_creations = self.create_missing(target, desired, &mut environments).await;

        for (name, protection) in &desired.environment_protection {
            if !desired.has_environment(name) {
                environments.record_skipped(
                    name.as_str(),
                    "protection configured for an environment that is not managed",
                );
                continue;
            }
            if failed_creations.contains(name.as_str()) {
                continue;
            }

            self.converge_protection(target, name, protection, &mut environments)
                .await;
        }

        let mut variables = CategoryReport::new(Category::EnvironmentVariables);
        for (name, values) in &desired.environment_variables {
            if !desired.has_environment(name) {
                variables.record_skipped(name.as_str(), "environment is not managed");
                continue;
            }
            let scope = ActionsScope::Environment(name.clone());
            variables.absorb(
                self.secrets
                    .reconcile_variables(target, &scope, values, Category::EnvironmentVariables)
                    .await,
            );
        }

        let mut secrets = CategoryReport::new(Category::EnvironmentSecrets);
        for (name, values) in &desired.environment_secrets {
            if !desired.has_environment(name) {
                secrets.record_skipped(name.as_str(), "environment is not managed");
                continue;
            }
            let scope = ActionsScope::Environment(name.clone());
            secrets.absorb(
                self.secrets
                    .reconcile_secrets(target, &scope, values, Category::EnvironmentSecrets)
                    .await,
            );
        }

        EnvironmentReports {
            environments,
            variables,
            secrets,
        }
    }

    /// Creates the desired environments that do not exist yet.
    ///
    /// Returns the names whose creation failed.
    async fn create_missing<'a>(
        &self,
        target: &Target,
        desired: &'a DesiredState,
        report: &mut CategoryReport,
    ) -> HashSet<&'a str> {
        let mut failed = HashSet::new();
        if desired.environments.is_empty() {
            return failed;
        }

        let existing: HashSet<String> = match self
            .github_client
            .list_environments(target.owner(), target.name())
            .await
        {
            Ok(names) => names.into_iter().collect(),
            Err(e) => {
                warn!(target = %target, error = %e, "Could not list environments");
                report.warn("environments", format!("could not list environments: {}", e));
                HashSet::new()
            }
        };

        let mut seen = HashSet::new();
        for name in &desired.environments {
            if !seen.insert(name.as_str()) {
                continue;
            }

            if existing.contains(name) {
                debug!(target = %target, environment = %name, "Environment exists");
                if !desired.environment_protection.contains_key(name) {
                    report.record_unchanged();
                }
                continue;
            }

            let protection = desired.environment_protection.get(name);
            let baseline = EnvironmentUpdate {
                wait_timer: protection.map(|p| p.wait_timer).unwrap_or(0),
                prevent_self_review: None,
                reviewers: Vec::new(),
                deployment_branch_policy: protection
                    .and_then(|p| p.deployment_branch_policy.settings()),
            };

            match self
                .github_client
                .upsert_environment(target.owner(), target.name(), name, &baseline)
                .await
            {
                Ok(()) => {
                    info!(target = %target, environment = %name, "Environment created");
                    report.record_created();
                }
                Err(e) => {
                    warn!(target = %target, environment = %name, error = %e, "Could not create environment");
                    report.record_failure(name.as_str(), format!("could not create environment: {}", e));
                    failed.insert(name.as_str());
                }
            }
        }

        failed
    }

    async fn converge_protection(
        &self,
        target: &Target,
        name: &str,
        protection: &EnvironmentProtection,
        report: &mut CategoryReport,
    ) {
        let mut reviewers = Vec::new();
        for reviewer_ref in &protection.reviewers {
            match self.resolve_reviewer(target, reviewer_ref).await {
                Ok(reviewer) => reviewers.push(reviewer),
                Err(message) => {
                    warn!(target = %target, environment = name, reviewer = %reviewer_ref.id, "Dropping unresolvable reviewer");
                    report.warn(name, message);
                }
            }
        }
        reviewers.sort();
        reviewers.dedup();

        let update = EnvironmentUpdate {
            wait_timer: protection.wait_timer,
            prevent_self_review: Some(protection.prevent_self_review),
            reviewers,
            deployment_branch_policy: protection.deployment_branch_policy.settings(),
        };

        let observed = match self
            .github_client
            .get_environment(target.owner(), target.name(), name)
            .await
        {
            Ok(observed) => observed,
            Err(e) => {
                warn!(target = %target, environment = name, error = %e, "Could not read environment, rewriting it");
                None
            }
        };

        let mut changed = false;
        let document_matches = observed
            .as_ref()
            .map(|o| environment_matches(o, &update))
            .unwrap_or(false);

        if !document_matches {
            match self
                .github_client
                .upsert_environment(target.owner(), target.name(), name, &update)
                .await
            {
                Ok(()) => {
                    info!(target = %target, environment = name, "Environment protection applied");
                    changed = true;
                }
                Err(e) => {
                    warn!(target = %target, environment = name, error = %e, "Could not apply environment protection");
                    report.record_failure(name, format!("could not apply protection: {}", e));
                    return;
                }
            }
        }

        if let Some(branches) = protection.deployment_branch_policy.managed_custom_branches() {
            match self.replace_branch_policies(target, name, branches).await {
                Ok(replaced) => changed |= replaced,
                Err(message) => {
                    report.record_failure(name, message);
                    return;
                }
            }
        }

        if changed {
            report.record_updated();
        } else {
            debug!(target = %target, environment = name, "Environment protection unchanged");
            report.record_unchanged();
        }
    }

    async fn resolve_reviewer(
        &self,
        target: &Target,
        reviewer_ref: &ReviewerRef,
    ) -> Result<EnvironmentReviewer, String> {
        match reviewer_ref.kind {
            ReviewerKind::Team => match resolve_team(&self.github_client, target.owner(), &reviewer_ref.id).await {
                Ok(Some(team)) => Ok(EnvironmentReviewer::team(team.id)),
                Ok(None) => Err(format!("reviewer team '{}' not found", reviewer_ref.id)),
                Err(e) => Err(format!("could not resolve reviewer team '{}': {}", reviewer_ref.id, e)),
            },
            ReviewerKind::User => match self.github_client.get_user(reviewer_ref.id.trim()).await {
                Ok(Some(user)) => Ok(EnvironmentReviewer::user(user.id)),
                Ok(None) => Err(format!("reviewer user '{}' not found", reviewer_ref.id)),
                Err(e) => Err(format!("could not resolve reviewer user '{}': {}", reviewer_ref.id, e)),
            },
        }
    }

    /// Replaces the custom deployment branch policies when their names differ.
    ///
    /// Returns whether anything was written.
    async fn replace_branch_policies(
        &self,
        target: &Target,
        name: &str,
        branches: &[String],
    ) -> Result<bool, String> {
        let existing = self
            .github_client
            .list_deployment_branch_policies(target.owner(), target.name(), name)
            .await
            .map_err(|e| format!("could not list deployment branch policies: {}", e))?;

        let observed: BTreeSet<&str> = existing.iter().map(|p| p.name.as_str()).collect();
        let wanted: BTreeSet<&str> = branches.iter().map(String::as_str).collect();
        if observed == wanted {
            return Ok(false);
        }

        for policy in &existing {
            self.github_client
                .delete_deployment_branch_policy(target.owner(), target.name(), name, policy.id)
                .await
                .map_err(|e| format!("could not delete branch policy '{}': {}", policy.name, e))?;
        }

        for branch in wanted {
            self.github_client
                .create_deployment_branch_policy(target.owner(), target.name(), name, branch)
                .await
                .map_err(|e| format!("could not add branch policy '{}': {}", branch, e))?;
        }

        info!(target = %target, environment = name, branches = ?branches, "Deployment branch policies replaced");
        Ok(true)
    }
}
