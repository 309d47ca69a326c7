//! Team and collaborator access to a repository.

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::{segment, Error, GitHubClient, User, Verb};

#[cfg(test)]
#[path = "access_tests.rs"]
mod tests;

/// An organization team.
///
/// `permission` is only present when the team is listed through a repository
/// (`GET /repos/{owner}/{repo}/teams`) and carries the team's access to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    /// The unique numeric ID of the team
    pub id: u64,
    /// The URL friendly team identifier
    pub slug: String,
    /// The display name of the team
    pub name: String,
    /// Repository permission when listed through a repository
    #[serde(default)]
    pub permission: Option<String>,
}

/// Payload for granting a team or collaborator access.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeamPermissionPayload {
    /// One of `pull`, `triage`, `push`, `maintain` or `admin`
    pub permission: String,
}

/// A user's effective permission on a repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollaboratorPermission {
    /// Legacy permission name (`admin`, `write`, `read` or `none`)
    pub permission: String,
    /// Fine grained role name (`admin`, `maintain`, `write`, `triage`, `read`)
    #[serde(default)]
    pub role_name: Option<String>,
}

impl GitHubClient {
    /// Fetches a team by slug. `Ok(None)` when the organization has no such team.
    #[instrument(skip(self), fields(org = %org, team = %slug))]
    pub async fn get_team(&self, org: &str, slug: &str) -> Result<Option<Team>, Error> {
        self.get_optional(&format!("/orgs/{}/teams/{}", org, segment(slug)))
            .await
    }

    /// Lists the teams of an organization.
    #[instrument(skip(self), fields(org = %org))]
    pub async fn list_teams(&self, org: &str) -> Result<Vec<Team>, Error> {
        let route = format!("/orgs/{}/teams", org);
        self.get_paged(&route, 100, |l: Vec<Team>| l)
            .await?
            .ok_or(Error::NotFound)
    }

    /// Lists the teams with access to a repository, including their permission.
    #[instrument(skip(self), fields(owner = %owner, repo = %repo))]
    pub async fn list_repository_teams(&self, owner: &str, repo: &str) -> Result<Vec<Team>, Error> {
        let route = format!("/repos/{}/{}/teams", owner, repo);
        self.get_paged(&route, 100, |l: Vec<Team>| l)
            .await?
            .ok_or(Error::NotFound)
    }

    /// Grants a team the given permission on a repository.
    #[instrument(skip(self), fields(org = %org, team = %slug, owner = %owner, repo = %repo))]
    pub async fn set_team_permission(
        &self,
        org: &str,
        slug: &str,
        owner: &str,
        repo: &str,
        permission: &str,
    ) -> Result<(), Error> {
        let route = format!(
            "/orgs/{}/teams/{}/repos/{}/{}",
            org,
            segment(slug),
            owner,
            repo
        );
        let payload = TeamPermissionPayload {
            permission: permission.to_string(),
        };
        self.write(Verb::Put, &route, Some(&payload)).await
    }

    /// Fetches a user account by login. `Ok(None)` when no such user exists.
    #[instrument(skip(self), fields(login = %login))]
    pub async fn get_user(&self, login: &str) -> Result<Option<User>, Error> {
        self.get_optional(&format!("/users/{}", segment(login))).await
    }

    /// Lists the collaborators of a repository.
    #[instrument(skip(self), fields(owner = %owner, repo = %repo))]
    pub async fn list_collaborators(&self, owner: &str, repo: &str) -> Result<Vec<User>, Error> {
        let route = format!("/repos/{}/{}/collaborators", owner, repo);
        self.get_paged(&route, 100, |l: Vec<User>| l)
            .await?
            .ok_or(Error::NotFound)
    }

    /// Fetches a collaborator's effective permission on a repository.
    #[instrument(skip(self), fields(owner = %owner, repo = %repo, login = %login))]
    pub async fn get_collaborator_permission(
        &self,
        owner: &str,
        repo: &str,
        login: &str,
    ) -> Result<Option<CollaboratorPermission>, Error> {
        self.get_optional(&format!(
            "/repos/{}/{}/collaborators/{}/permission",
            owner,
            repo,
            segment(login)
        ))
        .await
    }

    /// Adds a collaborator or changes their permission.
    ///
    /// For accounts that are not yet collaborators GitHub answers 201 and sends an
    /// invitation; for existing collaborators it answers 204.
    #[instrument(skip(self), fields(owner = %owner, repo = %repo, login = %login))]
    pub async fn set_collaborator_permission(
        &self,
        owner: &str,
        repo: &str,
        login: &str,
        permission: &str,
    ) -> Result<(), Error> {
        let route = format!(
            "/repos/{}/{}/collaborators/{}",
            owner,
            repo,
            segment(login)
        );
        let payload = TeamPermissionPayload {
            permission: permission.to_string(),
        };
        self.write(Verb::Put, &route, Some(&payload)).await
    }
}
