//! Making sure the target repository exists.

use std::sync::Arc;

use github_client::{GitHubClient, Repository, RepositoryCreatePayload};
use tracing::{info, warn};

use crate::configuration::{RepositorySettings, Visibility};
use crate::errors::{StewardError, StewardResult};
use crate::owner_probe::{OwnerKind, OwnerKindProbe};
use crate::target::Target;

#[cfg(test)]
#[path = "existence_reconciler_tests.rs"]
mod tests;

/// The repository after the existence check.
#[derive(Debug, Clone)]
pub struct ExistenceOutcome {
    pub repository: Repository,
    /// True when this run created the repository
    pub created: bool,
}

/// Creates the target repository when it is missing.
///
/// An existing repository is returned as is; none of its settings are touched by
/// this step.
pub struct ExistenceReconciler {
    github_client: GitHubClient,
    owner_probe: Arc<dyn OwnerKindProbe>,
}

impl ExistenceReconciler {
    pub fn new(github_client: GitHubClient, owner_probe: Arc<dyn OwnerKindProbe>) -> Self {
        Self {
            github_client,
            owner_probe,
        }
    }

    /// Returns the repository, creating it first if it does not exist.
    ///
    /// A failed lookup is logged and treated like a missing repository.
    ///
    /// # Errors
    ///
    /// Returns `StewardError::RepositoryCreation` when the repository had to be
    /// created and GitHub rejected the request.
    pub async fn ensure_exists(
        &self,
        target: &Target,
        settings: &RepositorySettings,
    ) -> StewardResult<ExistenceOutcome> {
        match self
            .github_client
            .get_repository(target.owner(), target.name())
            .await
        {
            Ok(Some(repository)) => {
                info!(
                    target = %target,
                    url = %repository.html_url,
                    "Repository already exists"
                );
                return Ok(ExistenceOutcome {
                    repository,
                    created: false,
                });
            }
            Ok(None) => {
                info!(target = %target, "Repository does not exist, creating it");
            }
            Err(e) => {
                warn!(
                    target = %target,
                    error = %e,
                    "Could not check whether the repository exists, attempting creation"
                );
            }
        }

        let payload = creation_payload(target, settings);
        let owner_kind = self.owner_probe.owner_kind(target.owner()).await;

        let result = match owner_kind {
            OwnerKind::Organization => {
                info!(org = target.owner(), visibility = %settings.visibility, "Creating organization repository");
                self.github_client
                    .create_org_repository(target.owner(), &payload)
                    .await
            }
            OwnerKind::User => {
                info!(user = target.owner(), visibility = %settings.visibility, "Creating user repository");
                self.github_client.create_user_repository(&payload).await
            }
        };

        let repository = result.map_err(|e| StewardError::RepositoryCreation {
            target: target.to_string(),
            reason: e.to_string(),
        })?;

        info!(target = %target, url = %repository.html_url, "Repository created");
        Ok(ExistenceOutcome {
            repository,
            created: true,
        })
    }
}

/// Builds the creation request.
///
/// Public and private are expressed through the `private` flag; `internal` needs
/// the explicit `visibility` field. Repositories are always initialised with a
/// first commit so branches and files can be managed immediately.
pub(crate) fn creation_payload(
    target: &Target,
    settings: &RepositorySettings,
) -> RepositoryCreatePayload {
    let (private, visibility) = match settings.visibility {
        Visibility::Public => (Some(false), None),
        Visibility::Private => (Some(true), None),
        Visibility::Internal => (None, Some(Visibility::Internal.as_str().to_string())),
    };

    RepositoryCreatePayload {
        name: target.name().to_string(),
        description: Some(settings.description.clone()).filter(|d| !d.is_empty()),
        private,
        visibility,
        auto_init: Some(true),
    }
}
