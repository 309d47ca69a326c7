//! Deployment environment API types.
//!
//! Environments are upserted with a single `PUT`. GitHub rejects a
//! `deployment_branch_policy` document in which both `protected_branches` and
//! `custom_branch_policies` are `false`; such a policy must be omitted instead, which
//! [`DeploymentBranchPolicySettings::from_flags`] encodes.

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::{segment, Error, GitHubClient, Verb};

#[cfg(test)]
#[path = "environment_tests.rs"]
mod tests;

/// The deployment branch policy flags of an environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentBranchPolicySettings {
    /// Only branches with protection rules can deploy
    pub protected_branches: bool,
    /// Only branches matching the environment's custom policies can deploy
    pub custom_branch_policies: bool,
}

impl DeploymentBranchPolicySettings {
    /// Builds the policy document, or `None` when both flags are off.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use github_client::DeploymentBranchPolicySettings;
    ///
    /// assert!(DeploymentBranchPolicySettings::from_flags(false, false).is_none());
    /// assert!(DeploymentBranchPolicySettings::from_flags(true, false).is_some());
    /// ```
    pub fn from_flags(protected_branches: bool, custom_branch_policies: bool) -> Option<Self> {
        if !protected_branches && !custom_branch_policies {
            return None;
        }

        Some(Self {
            protected_branches,
            custom_branch_policies,
        })
    }
}

/// A required reviewer as sent to GitHub: the kind (`Team` or `User`) and numeric id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EnvironmentReviewer {
    /// `Team` or `User`
    #[serde(rename = "type")]
    pub reviewer_type: String,
    /// The numeric database id of the team or user
    pub id: u64,
}

impl EnvironmentReviewer {
    /// A team reviewer.
    pub fn team(id: u64) -> Self {
        Self {
            reviewer_type: "Team".to_string(),
            id,
        }
    }

    /// A user reviewer.
    pub fn user(id: u64) -> Self {
        Self {
            reviewer_type: "User".to_string(),
            id,
        }
    }
}

/// Payload for `PUT /repos/{owner}/{repo}/environments/{environment_name}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnvironmentUpdate {
    /// Minutes to wait before a deployment may proceed
    pub wait_timer: u32,
    /// Whether the user who triggered a deployment may approve it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prevent_self_review: Option<bool>,
    /// Required reviewers
    pub reviewers: Vec<EnvironmentReviewer>,
    /// Deployment branch policy, omitted when no restriction applies
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deployment_branch_policy: Option<DeploymentBranchPolicySettings>,
}

#[derive(Debug, Clone, Deserialize)]
struct RuleReviewer {
    #[serde(rename = "type")]
    reviewer_type: String,
    reviewer: RuleReviewerIdentity,
}

#[derive(Debug, Clone, Deserialize)]
struct RuleReviewerIdentity {
    id: u64,
}

/// A protection rule as reported on an environment.
#[derive(Debug, Clone, Deserialize)]
pub struct ProtectionRule {
    /// `wait_timer`, `required_reviewers` or `branch_policy`
    #[serde(rename = "type")]
    pub rule_type: String,
    #[serde(default)]
    wait_timer: Option<u32>,
    #[serde(default)]
    prevent_self_review: Option<bool>,
    #[serde(default)]
    reviewers: Vec<RuleReviewer>,
}

/// An environment as returned by `GET /repos/{owner}/{repo}/environments/{name}`.
#[derive(Debug, Clone, Deserialize)]
pub struct EnvironmentDetails {
    /// The environment name
    pub name: String,
    /// Active protection rules
    #[serde(default)]
    pub protection_rules: Vec<ProtectionRule>,
    /// The deployment branch policy, `None` when any branch may deploy
    #[serde(default)]
    pub deployment_branch_policy: Option<DeploymentBranchPolicySettings>,
}

impl EnvironmentDetails {
    /// The configured wait timer in minutes (0 when no timer rule exists).
    pub fn wait_timer(&self) -> u32 {
        self.protection_rules
            .iter()
            .find_map(|r| r.wait_timer)
            .unwrap_or(0)
    }

    /// Whether self review is prevented (false when no reviewer rule exists).
    pub fn prevent_self_review(&self) -> bool {
        self.protection_rules
            .iter()
            .find_map(|r| r.prevent_self_review)
            .unwrap_or(false)
    }

    /// The required reviewers across all reviewer rules.
    pub fn reviewers(&self) -> Vec<EnvironmentReviewer> {
        self.protection_rules
            .iter()
            .flat_map(|r| r.reviewers.iter())
            .map(|r| EnvironmentReviewer {
                reviewer_type: r.reviewer_type.clone(),
                id: r.reviewer.id,
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct EnvironmentList {
    #[serde(default)]
    environments: Vec<EnvironmentDetails>,
}

/// A custom deployment branch policy entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentBranchPolicy {
    /// The policy id, used for deletion
    pub id: u64,
    /// The branch name pattern
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct DeploymentBranchPolicyList {
    #[serde(default)]
    branch_policies: Vec<DeploymentBranchPolicy>,
}

#[derive(Debug, Serialize)]
struct DeploymentBranchPolicyCreate<'a> {
    name: &'a str,
}

impl GitHubClient {
    /// Lists the names of the environments of a repository.
    #[instrument(skip(self), fields(owner = %owner, repo = %repo))]
    pub async fn list_environments(&self, owner: &str, repo: &str) -> Result<Vec<String>, Error> {
        let route = format!("/repos/{}/{}/environments", owner, repo);
        let environments = self
            .get_paged(&route, 100, |l: EnvironmentList| l.environments)
            .await?;

        Ok(environments
            .unwrap_or_default()
            .into_iter()
            .map(|e| e.name)
            .collect())
    }

    /// Fetches a single environment. `Ok(None)` when it does not exist.
    #[instrument(skip(self), fields(owner = %owner, repo = %repo, environment = %environment))]
    pub async fn get_environment(
        &self,
        owner: &str,
        repo: &str,
        environment: &str,
    ) -> Result<Option<EnvironmentDetails>, Error> {
        self.get_optional(&format!(
            "/repos/{}/{}/environments/{}",
            owner,
            repo,
            segment(environment)
        ))
        .await
    }

    /// Creates an environment or replaces its protection settings.
    #[instrument(skip(self, update), fields(owner = %owner, repo = %repo, environment = %environment))]
    pub async fn upsert_environment(
        &self,
        owner: &str,
        repo: &str,
        environment: &str,
        update: &EnvironmentUpdate,
    ) -> Result<(), Error> {
        let path = format!(
            "/repos/{}/{}/environments/{}",
            owner,
            repo,
            segment(environment)
        );
        self.write(Verb::Put, &path, Some(update)).await
    }

    /// Lists the custom deployment branch policies of an environment.
    #[instrument(skip(self), fields(owner = %owner, repo = %repo, environment = %environment))]
    pub async fn list_deployment_branch_policies(
        &self,
        owner: &str,
        repo: &str,
        environment: &str,
    ) -> Result<Vec<DeploymentBranchPolicy>, Error> {
        let route = format!(
            "/repos/{}/{}/environments/{}/deployment-branch-policies",
            owner,
            repo,
            segment(environment)
        );
        let policies = self
            .get_paged(&route, 100, |l: DeploymentBranchPolicyList| l.branch_policies)
            .await?;

        Ok(policies.unwrap_or_default())
    }

    /// Deletes one custom deployment branch policy.
    #[instrument(skip(self), fields(owner = %owner, repo = %repo, environment = %environment))]
    pub async fn delete_deployment_branch_policy(
        &self,
        owner: &str,
        repo: &str,
        environment: &str,
        policy_id: u64,
    ) -> Result<(), Error> {
        let path = format!(
            "/repos/{}/{}/environments/{}/deployment-branch-policies/{}",
            owner,
            repo,
            segment(environment),
            policy_id
        );
        self.write(Verb::Delete, &path, None::<&()>).await
    }

    /// Adds a custom deployment branch policy for a branch name pattern.
    #[instrument(skip(self), fields(owner = %owner, repo = %repo, environment = %environment))]
    pub async fn create_deployment_branch_policy(
        &self,
        owner: &str,
        repo: &str,
        environment: &str,
        name: &str,
    ) -> Result<(), Error> {
        let path = format!(
            "/repos/{}/{}/environments/{}/deployment-branch-policies",
            owner,
            repo,
            segment(environment)
        );
        self.write(Verb::Post, &path, Some(&DeploymentBranchPolicyCreate { name }))
            .await
    }
}
