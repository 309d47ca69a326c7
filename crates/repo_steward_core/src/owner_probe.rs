//! Deciding whether a repository owner is an organization or a user.
//!
//! Repository creation and custom properties go through different endpoints for
//! organizations and users. The decision sits behind [`OwnerKindProbe`] so tests
//! and callers that already know the answer can supply it without a network call.

use async_trait::async_trait;
use github_client::GitHubClient;
use tracing::{info, warn};

#[cfg(test)]
#[path = "owner_probe_tests.rs"]
mod tests;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OwnerKind {
    Organization,
    User,
}

/// Answers the organization-or-user question for an owner login.
///
/// Implementations never fail: an inconclusive answer is resolved to
/// [`OwnerKind::Organization`].
#[async_trait]
pub trait OwnerKindProbe: Send + Sync {
    async fn owner_kind(&self, owner: &str) -> OwnerKind;
}

/// Probes `GET /orgs/{owner}`.
///
/// | Outcome        | Answer         |
/// |----------------|----------------|
/// | HTTP 200       | Organization   |
/// | HTTP 404       | User           |
/// | anything else  | Organization   |
#[derive(Debug, Clone)]
pub struct GitHubOwnerKindProbe {
    github_client: GitHubClient,
}

impl GitHubOwnerKindProbe {
    pub fn new(github_client: GitHubClient) -> Self {
        Self { github_client }
    }
}

#[async_trait]
impl OwnerKindProbe for GitHubOwnerKindProbe {
    async fn owner_kind(&self, owner: &str) -> OwnerKind {
        match self.github_client.get_organization(owner).await {
            Ok(Some(_)) => {
                info!(owner = owner, "Owner is an organization");
                OwnerKind::Organization
            }
            Ok(None) => {
                info!(owner = owner, "Owner is not an organization, treating as user account");
                OwnerKind::User
            }
            Err(e) => {
                warn!(
                    owner = owner,
                    error = %e,
                    "Could not determine owner kind, assuming organization"
                );
                OwnerKind::Organization
            }
        }
    }
}

/// A probe with a predetermined answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedOwnerKind(pub OwnerKind);

#[async_trait]
impl OwnerKindProbe for FixedOwnerKind {
    async fn owner_kind(&self, _owner: &str) -> OwnerKind {
        self.0
    }
}
