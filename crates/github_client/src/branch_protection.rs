//! Branch and branch protection domain types.
//!
//! The protection endpoint is a whole-document replace: a `PUT` always carries the
//! complete policy, and keys that are switched off are sent as explicit `null`s.

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::{slash_path, Error, GitHubClient, Verb};

#[cfg(test)]
#[path = "branch_protection_tests.rs"]
mod tests;

/// A branch as returned by `GET /repos/{owner}/{repo}/branches/{branch}`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Branch {
    /// The branch name
    pub name: String,
    /// The commit at the tip of the branch
    pub commit: BranchCommit,
}

/// The commit a branch points at.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct BranchCommit {
    /// The commit SHA
    pub sha: String,
}

/// Payload for `POST /repos/{owner}/{repo}/git/refs`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CreateRefPayload {
    /// Fully qualified ref name, e.g. `refs/heads/develop`
    #[serde(rename = "ref")]
    pub reference: String,
    /// The SHA the new ref points at
    pub sha: String,
}

impl CreateRefPayload {
    /// Builds the payload for a new branch starting at `sha`.
    pub fn branch(name: &str, sha: impl Into<String>) -> Self {
        Self {
            reference: format!("refs/heads/{}", name),
            sha: sha.into(),
        }
    }
}

/// Pull request review requirements of a protected branch.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct RequiredPullRequestReviews {
    /// Required number of approving reviews before merging
    #[serde(default)]
    pub required_approving_review_count: u32,
    /// Whether stale reviews are dismissed when new commits are pushed
    #[serde(default)]
    pub dismiss_stale_reviews: bool,
    /// Whether code owner reviews are required
    #[serde(default)]
    pub require_code_owner_reviews: bool,
}

/// Status check requirements of a protected branch.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct RequiredStatusChecks {
    /// Whether the branch must be up to date before merging
    #[serde(default)]
    pub strict: bool,
    /// The status check contexts that must pass
    #[serde(default)]
    pub contexts: Vec<String>,
}

/// The admin enforcement flag as GitHub reports it (`{"url": ..., "enabled": true}`).
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct EnforceAdmins {
    /// Whether the rules also apply to administrators
    #[serde(default)]
    pub enabled: bool,
}

/// Branch protection as returned by `GET /repos/{owner}/{repo}/branches/{branch}/protection`.
///
/// # Examples
///
/// ```rust
/// use github_client::BranchProtection;
///
/// let protection: BranchProtection = serde_json::from_value(serde_json::json!({
///     "required_pull_request_reviews": { "required_approving_review_count": 2 },
///     "enforce_admins": { "enabled": true }
/// })).unwrap();
///
/// assert!(protection.admin_enforced());
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct BranchProtection {
    /// Review requirements, absent when reviews are not required
    #[serde(default)]
    pub required_pull_request_reviews: Option<RequiredPullRequestReviews>,
    /// Admin enforcement
    #[serde(default)]
    pub enforce_admins: Option<EnforceAdmins>,
    /// Status check requirements, absent when no checks are required
    #[serde(default)]
    pub required_status_checks: Option<RequiredStatusChecks>,
}

impl BranchProtection {
    /// Returns whether the protection also applies to administrators.
    pub fn admin_enforced(&self) -> bool {
        self.enforce_admins
            .as_ref()
            .map(|e| e.enabled)
            .unwrap_or(false)
    }

    /// Returns the required status check contexts (empty when none are required).
    pub fn status_check_contexts(&self) -> &[String] {
        self.required_status_checks
            .as_ref()
            .map(|c| c.contexts.as_slice())
            .unwrap_or(&[])
    }
}

impl From<&BranchProtectionUpdate> for BranchProtection {
    fn from(update: &BranchProtectionUpdate) -> Self {
        Self {
            required_pull_request_reviews: update.required_pull_request_reviews.clone(),
            enforce_admins: Some(EnforceAdmins {
                enabled: update.enforce_admins,
            }),
            required_status_checks: update.required_status_checks.clone(),
        }
    }
}

/// Payload for `PUT /repos/{owner}/{repo}/branches/{branch}/protection`.
///
/// All four keys are required by GitHub, so `None` serializes as `null`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct BranchProtectionUpdate {
    /// Status checks, `null` to disable
    pub required_status_checks: Option<RequiredStatusChecks>,
    /// Whether the rules also apply to administrators
    pub enforce_admins: bool,
    /// Review requirements, `null` to disable
    pub required_pull_request_reviews: Option<RequiredPullRequestReviews>,
    /// Push restrictions; never managed, always `null`
    pub restrictions: Option<serde_json::Value>,
}

impl GitHubClient {
    /// Fetches a branch. `Ok(None)` when it does not exist.
    #[instrument(skip(self), fields(owner = %owner, repo = %repo, branch = %branch))]
    pub async fn get_branch(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
    ) -> Result<Option<Branch>, Error> {
        self.get_optional(&format!(
            "/repos/{}/{}/branches/{}",
            owner,
            repo,
            slash_path(branch)
        ))
            .await
    }

    /// Creates a new git reference.
    #[instrument(skip(self, payload), fields(owner = %owner, repo = %repo, reference = %payload.reference))]
    pub async fn create_ref(
        &self,
        owner: &str,
        repo: &str,
        payload: &CreateRefPayload,
    ) -> Result<(), Error> {
        let path = format!("/repos/{}/{}/git/refs", owner, repo);
        self.write(Verb::Post, &path, Some(payload)).await
    }

    /// Fetches the protection of a branch. `Ok(None)` when the branch is unprotected.
    #[instrument(skip(self), fields(owner = %owner, repo = %repo, branch = %branch))]
    pub async fn get_branch_protection(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
    ) -> Result<Option<BranchProtection>, Error> {
        self.get_optional(&format!(
            "/repos/{}/{}/branches/{}/protection",
            owner,
            repo,
            slash_path(branch)
        ))
        .await
    }

    /// Replaces the protection of a branch with the given document.
    #[instrument(skip(self, update), fields(owner = %owner, repo = %repo, branch = %branch))]
    pub async fn update_branch_protection(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
        update: &BranchProtectionUpdate,
    ) -> Result<(), Error> {
        let path = format!(
            "/repos/{}/{}/branches/{}/protection",
            owner,
            repo,
            slash_path(branch)
        );
        self.write(Verb::Put, &path, Some(update)).await
    }
}
