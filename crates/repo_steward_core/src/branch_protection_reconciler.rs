//! Per-branch protection convergence.
//!
//! Each enabled branch moves through the same steps: make sure the branch exists
//! (creating it from the default branch tip when allowed), read its protection,
//! and replace the whole protection document when it is missing or differs.
//! Branches are independent; a failure on one does not stop the others.

use std::collections::BTreeSet;

use github_client::{
    BranchProtection, BranchProtectionUpdate, CreateRefPayload, GitHubClient,
    RequiredPullRequestReviews, RequiredStatusChecks,
};
use tracing::{info, warn};

use crate::configuration::{BranchProtectionPolicy, DesiredState};
use crate::report::{Category, CategoryReport};
use crate::target::Target;

#[cfg(test)]
#[path = "branch_protection_reconciler_tests.rs"]
mod tests;

/// The full protection document for a policy.
pub fn protection_update(policy: &BranchProtectionPolicy) -> BranchProtectionUpdate {
    let required_status_checks = policy.require_status_checks.then(|| RequiredStatusChecks {
        strict: true,
        contexts: policy.required_contexts().into_iter().collect(),
    });

    BranchProtectionUpdate {
        required_status_checks,
        enforce_admins: policy.enforce_admins,
        required_pull_request_reviews: Some(RequiredPullRequestReviews {
            required_approving_review_count: policy.required_reviews,
            dismiss_stale_reviews: policy.dismiss_stale_reviews,
            require_code_owner_reviews: policy.require_code_owner_reviews,
        }),
        restrictions: None,
    }
}

/// Describes every field where `observed` differs from `desired`.
///
/// Status check contexts are compared as sets. An empty result means the branch
/// already carries the desired protection.
pub fn protection_differences(
    observed: &BranchProtection,
    desired: &BranchProtectionUpdate,
) -> Vec<String> {
    let mut differences = Vec::new();

    match (
        &observed.required_pull_request_reviews,
        &desired.required_pull_request_reviews,
    ) {
        (Some(current), Some(wanted)) => {
            if current.required_approving_review_count != wanted.required_approving_review_count {
                differences.push(format!(
                    "required reviews {} -> {}",
                    current.required_approving_review_count, wanted.required_approving_review_count
                ));
            }
            if current.dismiss_stale_reviews != wanted.dismiss_stale_reviews {
                differences.push(format!(
                    "dismiss stale reviews {} -> {}",
                    current.dismiss_stale_reviews, wanted.dismiss_stale_reviews
                ));
            }
            if current.require_code_owner_reviews != wanted.require_code_owner_reviews {
                differences.push(format!(
                    "require code owner reviews {} -> {}",
                    current.require_code_owner_reviews, wanted.require_code_owner_reviews
                ));
            }
        }
        (None, Some(_)) => differences.push("pull request reviews not required".to_string()),
        (Some(_), None) => differences.push("pull request reviews required".to_string()),
        (None, None) => {}
    }

    if observed.admin_enforced() != desired.enforce_admins {
        differences.push(format!(
            "enforce admins {} -> {}",
            observed.admin_enforced(),
            desired.enforce_admins
        ));
    }

    let current: BTreeSet<&str> = observed
        .status_check_contexts()
        .iter()
        .map(String::as_str)
        .collect();
    let wanted: BTreeSet<&str> = desired
        .required_status_checks
        .as_ref()
        .map(|c| c.contexts.iter().map(String::as_str).collect())
        .unwrap_or_default();
    if current != wanted {
        differences.push(format!("status checks {:?} -> {:?}", current, wanted));
    }

    differences
}

/// Converges branch protection.
pub struct BranchProtectionReconciler {
    github_client: GitHubClient,
}

impl BranchProtectionReconciler {
    pub fn new(github_client: GitHubClient) -> Self {
        Self { github_client }
    }

    pub async fn reconcile(&self, target: &Target, desired: &DesiredState) -> CategoryReport {
        let mut report = CategoryReport::new(Category::BranchProtection);
        let settings = &desired.branch_protection;

        for (branch, policy) in settings.enabled_policies() {
            if !self
                .ensure_branch(target, branch, settings.auto_create(policy), &mut report)
                .await
            {
                continue;
            }

            self.protect(target, branch, policy, &mut report).await;
        }

        report
    }

    /// Returns whether the branch exists (possibly after creating it).
    async fn ensure_branch(
        &self,
        target: &Target,
        branch: &str,
        auto_create: bool,
        report: &mut CategoryReport,
    ) -> bool {
        match self
            .github_client
            .get_branch(target.owner(), target.name(), branch)
            .await
        {
            Ok(Some(_)) => return true,
            Ok(None) => {}
            Err(e) => {
                warn!(target = %target, branch = branch, error = %e, "Could not look up branch");
                report.record_failure(branch, e.to_string());
                return false;
            }
        }

        if !auto_create {
            info!(target = %target, branch = branch, "Branch missing and auto-create disabled, skipping");
            report.record_skipped(branch, "branch does not exist and auto-create is disabled");
            return false;
        }

        match self.create_branch(target, branch).await {
            Ok(()) => {
                info!(target = %target, branch = branch, "Branch created");
                true
            }
            Err(message) => {
                warn!(target = %target, branch = branch, error = %message, "Could not create branch");
                report.record_failure(branch, format!("could not create branch: {}", message));
                false
            }
        }
    }

    /// Points a new branch at the tip of the default branch.
    async fn create_branch(&self, target: &Target, branch: &str) -> Result<(), String> {
        let repository = self
            .github_client
            .get_repository(target.owner(), target.name())
            .await
            .map_err(|e| e.to_string())?
            .ok_or_else(|| "repository not found".to_string())?;

        let default_branch = repository.default_branch();
        let tip = self
            .github_client
            .get_branch(target.owner(), target.name(), default_branch)
            .await
            .map_err(|e| e.to_string())?
            .ok_or_else(|| format!("default branch '{}' not found", default_branch))?;

        self.github_client
            .create_ref(
                target.owner(),
                target.name(),
                &CreateRefPayload::branch(branch, tip.commit.sha),
            )
            .await
            .map_err(|e| e.to_string())
    }

    async fn protect(
        &self,
        target: &Target,
        branch: &str,
        policy: &BranchProtectionPolicy,
        report: &mut CategoryReport,
    ) {
        let update = protection_update(policy);

        let existing = match self
            .github_client
            .get_branch_protection(target.owner(), target.name(), branch)
            .await
        {
            Ok(existing) => existing,
            Err(e) => {
                warn!(target = %target, branch = branch, error = %e, "Could not read branch protection, replacing it");
                None
            }
        };

        let is_update = existing.is_some();
        if let Some(observed) = &existing {
            let differences = protection_differences(observed, &update);
            if differences.is_empty() {
                info!(target = %target, branch = branch, "Branch protection already up to date");
                report.record_unchanged();
                return;
            }
            info!(target = %target, branch = branch, differences = ?differences, "Branch protection differs");
        }

        match self
            .github_client
            .update_branch_protection(target.owner(), target.name(), branch, &update)
            .await
        {
            Ok(()) => {
                info!(target = %target, branch = branch, "Branch protection applied");
                if is_update {
                    report.record_updated();
                } else {
                    report.record_created();
                }
            }
            Err(e) => {
                warn!(target = %target, branch = branch, error = %e, "Could not apply branch protection");
                report.record_failure(branch, e.to_string());
            }
        }
    }
}
