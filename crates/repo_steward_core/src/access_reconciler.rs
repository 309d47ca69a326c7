//! Team and collaborator permissions on the repository.
//!
//! Access is additive: teams and users that are not configured keep whatever
//! access they have. Both permission-setting endpoints are upserts, so a single
//! `PUT` covers granting new access and changing existing access.

use std::collections::{BTreeMap, HashMap};

use github_client::{Error, GitHubClient, Team};
use tracing::{debug, info, warn};

use crate::configuration::PermissionLevel;
use crate::report::{Category, CategoryReport};
use crate::target::Target;

#[cfg(test)]
#[path = "access_reconciler_tests.rs"]
mod tests;

/// Strips an `org/` prefix from a team identifier.
pub fn team_identifier(raw: &str) -> &str {
    raw.rsplit_once('/').map(|(_, team)| team).unwrap_or(raw).trim()
}

fn looks_like_slug(identifier: &str) -> bool {
    !identifier.is_empty()
        && identifier
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Finds a team of `org` by slug, then by case-insensitive name or slug match.
///
/// `Ok(None)` means the organization has no matching team.
pub(crate) async fn resolve_team(
    github_client: &GitHubClient,
    org: &str,
    raw: &str,
) -> Result<Option<Team>, Error> {
    let identifier = team_identifier(raw);

    if looks_like_slug(identifier) {
        match github_client.get_team(org, identifier).await {
            Ok(Some(team)) => return Ok(Some(team)),
            Ok(None) => {}
            Err(e) => {
                debug!(org = org, team = identifier, error = %e, "Direct team lookup failed, searching the team list");
            }
        }
    }

    let teams = github_client.list_teams(org).await?;
    Ok(teams.into_iter().find(|team| {
        team.name.eq_ignore_ascii_case(identifier) || team.slug.eq_ignore_ascii_case(identifier)
    }))
}

/// Converges team and collaborator permissions.
pub struct AccessReconciler {
    github_client: GitHubClient,
}

impl AccessReconciler {
    pub fn new(github_client: GitHubClient) -> Self {
        Self { github_client }
    }

    pub async fn reconcile_teams(
        &self,
        target: &Target,
        desired: &BTreeMap<String, PermissionLevel>,
    ) -> CategoryReport {
        let mut report = CategoryReport::new(Category::TeamAccess);
        if desired.is_empty() {
            return report;
        }

        let current: HashMap<String, Option<PermissionLevel>> = match self
            .github_client
            .list_repository_teams(target.owner(), target.name())
            .await
        {
            Ok(teams) => teams
                .into_iter()
                .map(|t| {
                    let level = t.permission.as_deref().and_then(PermissionLevel::from_remote);
                    (t.slug, level)
                })
                .collect(),
            Err(e) => {
                warn!(target = %target, error = %e, "Could not list repository teams");
                report.warn("teams", format!("could not list current team access: {}", e));
                HashMap::new()
            }
        };

        for (raw, permission) in desired {
            let team = match resolve_team(&self.github_client, target.owner(), raw).await {
                Ok(Some(team)) => team,
                Ok(None) => {
                    info!(target = %target, team = %raw, "Team not found, skipping");
                    report.record_skipped(raw.as_str(), "team not found in the organization");
                    continue;
                }
                Err(e) => {
                    warn!(target = %target, team = %raw, error = %e, "Could not resolve team");
                    report.record_skipped(raw.as_str(), format!("could not resolve team: {}", e));
                    continue;
                }
            };

            let existing = current.get(&team.slug).copied();
            if existing == Some(Some(*permission)) {
                debug!(target = %target, team = %team.slug, permission = %permission, "Team access unchanged");
                report.record_unchanged();
                continue;
            }

            match self
                .github_client
                .set_team_permission(
                    target.owner(),
                    &team.slug,
                    target.owner(),
                    target.name(),
                    permission.api_name(),
                )
                .await
            {
                Ok(()) => {
                    info!(target = %target, team = %team.slug, permission = %permission, "Team access set");
                    if existing.is_some() {
                        report.record_updated();
                    } else {
                        report.record_created();
                    }
                }
                Err(e) => {
                    warn!(target = %target, team = %team.slug, error = %e, "Could not set team access");
                    report.record_failure(team.slug.as_str(), e.to_string());
                }
            }
        }

        report
    }

    pub async fn reconcile_users(
        &self,
        target: &Target,
        desired: &BTreeMap<String, PermissionLevel>,
    ) -> CategoryReport {
        let mut report = CategoryReport::new(Category::UserAccess);
        if desired.is_empty() {
            return report;
        }

        let collaborators = match self
            .github_client
            .list_collaborators(target.owner(), target.name())
            .await
        {
            Ok(users) => users,
            Err(e) => {
                warn!(target = %target, error = %e, "Could not list collaborators");
                report.warn("collaborators", format!("could not list current collaborators: {}", e));
                Vec::new()
            }
        };

        for (login, permission) in desired {
            let collaborator = collaborators
                .iter()
                .find(|user| user.login.eq_ignore_ascii_case(login));

            let existing = match collaborator {
                Some(user) => Some(self.effective_permission(target, &user.login).await),
                None => None,
            };

            if existing == Some(Some(*permission)) {
                debug!(target = %target, user = %login, permission = %permission, "User access unchanged");
                report.record_unchanged();
                continue;
            }

            match self
                .github_client
                .set_collaborator_permission(
                    target.owner(),
                    target.name(),
                    login,
                    permission.api_name(),
                )
                .await
            {
                Ok(()) => {
                    info!(target = %target, user = %login, permission = %permission, "User access set");
                    if existing.is_some() {
                        report.record_updated();
                    } else {
                        report.record_created();
                    }
                }
                Err(e) => {
                    warn!(target = %target, user = %login, error = %e, "Could not set user access");
                    report.record_failure(login.as_str(), e.to_string());
                }
            }
        }

        report
    }

    /// The collaborator's permission, preferring the fine grained role name.
    async fn effective_permission(&self, target: &Target, login: &str) -> Option<PermissionLevel> {
        match self
            .github_client
            .get_collaborator_permission(target.owner(), target.name(), login)
            .await
        {
            Ok(Some(found)) => found
                .role_name
                .as_deref()
                .and_then(PermissionLevel::from_remote)
                .or_else(|| PermissionLevel::from_remote(&found.permission)),
            Ok(None) => None,
            Err(e) => {
                warn!(target = %target, user = login, error = %e, "Could not read collaborator permission");
                None
            }
        }
    }
}
