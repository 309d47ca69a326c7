//! Crate for interacting with the GitHub REST API.
//!
//! This crate provides the request/response surface the repository reconciliation
//! engine depends on: repository lookup and creation, custom properties and topics,
//! file contents, branches and their protection, deployment environments, Actions
//! secrets and variables, and team/collaborator permissions.
//!
//! Every call is a single authenticated request carrying an explicit API version
//! header. Lookups that can legitimately miss return `Ok(None)` on HTTP 404; any other
//! unsuccessful status is reported as [`Error::UnexpectedStatus`] so the caller can
//! decide whether it is fatal.

use std::borrow::Cow;

use http::header::HeaderName;
use http::StatusCode;
use octocrab::Octocrab;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, error, info, instrument};

pub mod errors;
pub use errors::Error;

pub mod models;
pub use models::{Organization, Repository, RepositoryCreatePayload, User};

mod access;
pub use access::{CollaboratorPermission, Team, TeamPermissionPayload};

mod actions;
pub use actions::{ActionsScope, ActionsVariable, PublicKey, SecretPayload};

mod branch_protection;
pub use branch_protection::{
    Branch, BranchCommit, BranchProtection, BranchProtectionUpdate, CreateRefPayload, EnforceAdmins,
    RequiredPullRequestReviews, RequiredStatusChecks,
};

mod contents;
pub use contents::{FileContent, FileWritePayload, GitignoreTemplate};

mod environment;
pub use environment::{
    DeploymentBranchPolicy, DeploymentBranchPolicySettings, EnvironmentDetails,
    EnvironmentReviewer, EnvironmentUpdate, ProtectionRule,
};

mod properties;
pub use properties::{CustomPropertiesPayload, CustomPropertyValue, PropertyDefinition};

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;

/// The REST API version pinned on every request.
pub const GITHUB_API_VERSION: &str = "2022-11-28";

/// Upper bound on the pages read from one list endpoint.
const MAX_PAGES: usize = 50;

/// A client for interacting with the GitHub API, authenticated with a bearer credential.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    client: Octocrab,
}

/// HTTP verbs used by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verb {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

/// A decoded response: the status and the raw body text.
#[derive(Debug)]
struct RawResponse {
    status: StatusCode,
    body: String,
}

impl GitHubClient {
    /// Creates a new `GitHubClient` from an already configured octocrab instance.
    ///
    /// Use [`create_token_client`] to build an instance authenticated with a token.
    pub fn new(client: Octocrab) -> Self {
        Self { client }
    }

    /// Fetches details for a specific repository.
    ///
    /// # Arguments
    ///
    /// * `owner` - The owner of the repository (user or organization name).
    /// * `repo` - The name of the repository.
    ///
    /// # Returns
    ///
    /// `Ok(None)` when the repository does not exist (HTTP 404).
    ///
    /// # Errors
    /// Returns an `Error::UnexpectedStatus` for any other unsuccessful status.
    #[instrument(skip(self), fields(owner = %owner, repo = %repo))]
    pub async fn get_repository(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<Option<Repository>, Error> {
        self.get_optional(&format!("/repos/{}/{}", owner, repo))
            .await
    }

    /// Fetches an organization by login.
    ///
    /// Used as the owner-kind probe: `Ok(Some(_))` means the owner is an organization,
    /// `Ok(None)` means no organization with that login exists.
    #[instrument(skip(self), fields(org = %org))]
    pub async fn get_organization(&self, org: &str) -> Result<Option<Organization>, Error> {
        self.get_optional(&format!("/orgs/{}", org)).await
    }

    /// Creates a new repository within a specified organization.
    ///
    /// # Errors
    /// Returns `Error::UnexpectedStatus` when GitHub does not answer with a success status.
    #[instrument(skip(self, payload), fields(org = %org_name, repo = %payload.name))]
    pub async fn create_org_repository(
        &self,
        org_name: &str,
        payload: &RepositoryCreatePayload,
    ) -> Result<Repository, Error> {
        let path = format!("/orgs/{}/repos", org_name);
        self.write_json(Verb::Post, &path, Some(payload)).await
    }

    /// Creates a new repository for the authenticated user.
    ///
    /// # Errors
    /// Returns `Error::UnexpectedStatus` when GitHub does not answer with a success status.
    #[instrument(skip(self, payload), fields(repo = %payload.name))]
    pub async fn create_user_repository(
        &self,
        payload: &RepositoryCreatePayload,
    ) -> Result<Repository, Error> {
        self.write_json(Verb::Post, "/user/repos", Some(payload))
            .await
    }

    /// Sends a request and reads the whole response body.
    async fn send<B: Serialize>(
        &self,
        verb: Verb,
        route: &str,
        body: Option<&B>,
    ) -> Result<RawResponse, Error> {
        debug!(verb = ?verb, route = route, "Sending GitHub API request");

        let result = match verb {
            Verb::Get => self.client._get(route).await,
            Verb::Post => self.client._post(route, body).await,
            Verb::Put => self.client._put(route, body).await,
            Verb::Patch => self.client._patch(route, body).await,
            Verb::Delete => self.client._delete(route, body).await,
        };

        let response = result.map_err(|e| {
            let description = e.to_string();
            log_octocrab_error(&format!("Request to {} failed", route), e);
            Error::ApiError(description)
        })?;

        let status = response.status();
        let body = self.client.body_to_string(response).await.map_err(|e| {
            let description = e.to_string();
            log_octocrab_error(&format!("Failed to read response body from {}", route), e);
            Error::ApiError(description)
        })?;

        debug!(route = route, status = status.as_u16(), "Received GitHub API response");
        Ok(RawResponse { status, body })
    }

    /// GETs a document, mapping HTTP 404 to `Ok(None)`.
    async fn get_optional<T: DeserializeOwned>(&self, route: &str) -> Result<Option<T>, Error> {
        let response = self.send(Verb::Get, route, None::<&()>).await?;
        if response.status == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !response.status.is_success() {
            return Err(status_error(response));
        }

        Ok(Some(serde_json::from_str(&response.body)?))
    }

    /// GETs every page of a list endpoint.
    ///
    /// Pages are requested with `per_page` and `page` until one comes back shorter
    /// than `per_page`. `Ok(None)` when the first page is a 404.
    async fn get_paged<L, T, F>(
        &self,
        route: &str,
        per_page: usize,
        items: F,
    ) -> Result<Option<Vec<T>>, Error>
    where
        L: DeserializeOwned,
        F: Fn(L) -> Vec<T>,
    {
        let separator = if route.contains('?') { '&' } else { '?' };
        let mut collected = Vec::new();

        for page in 1..=MAX_PAGES {
            let paged_route = format!("{}{}per_page={}&page={}", route, separator, per_page, page);
            let batch = match self.get_optional::<L>(&paged_route).await? {
                Some(list) => items(list),
                None if page == 1 => return Ok(None),
                None => break,
            };

            let complete = batch.len() < per_page;
            collected.extend(batch);
            if complete {
                break;
            }
        }

        Ok(Some(collected))
    }

    /// GETs a document that must exist; HTTP 404 becomes `Error::NotFound`.
    async fn get_required<T: DeserializeOwned>(&self, route: &str) -> Result<T, Error> {
        self.get_optional(route).await?.ok_or(Error::NotFound)
    }

    /// Sends a mutating request and accepts any success status.
    async fn write<B: Serialize>(
        &self,
        verb: Verb,
        route: &str,
        body: Option<&B>,
    ) -> Result<(), Error> {
        let response = self.send(verb, route, body).await?;
        if !response.status.is_success() {
            return Err(status_error(response));
        }

        Ok(())
    }

    /// Sends a mutating request and decodes the returned document.
    async fn write_json<B: Serialize, T: DeserializeOwned>(
        &self,
        verb: Verb,
        route: &str,
        body: Option<&B>,
    ) -> Result<T, Error> {
        let response = self.send(verb, route, body).await?;
        if !response.status.is_success() {
            return Err(status_error(response));
        }

        Ok(serde_json::from_str(&response.body)?)
    }
}

/// Percent-encodes a single path segment, including any `/`.
pub(crate) fn segment(value: &str) -> Cow<'_, str> {
    urlencoding::encode(value)
}

/// Percent-encodes each part of a slash separated path, keeping the separators.
pub(crate) fn slash_path(value: &str) -> String {
    value
        .split('/')
        .map(|part| urlencoding::encode(part))
        .collect::<Vec<_>>()
        .join("/")
}

/// Builds an `Error::UnexpectedStatus` from an unsuccessful response.
fn status_error(response: RawResponse) -> Error {
    let message = serde_json::from_str::<serde_json::Value>(&response.body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or_else(|| {
            if response.body.is_empty() {
                "no response body".to_string()
            } else {
                response.body.clone()
            }
        });

    Error::UnexpectedStatus {
        status: response.status.as_u16(),
        message,
    }
}

/// Creates an `Octocrab` client authenticated with a bearer token.
///
/// Every request made by the client carries the `X-GitHub-Api-Version` header
/// set to [`GITHUB_API_VERSION`].
///
/// # Arguments
///
/// * `token` - The personal access or installation token.
/// * `base_uri` - Optional API root, e.g. for GitHub Enterprise Server. Defaults to
///   `https://api.github.com`.
///
/// # Errors
///
/// Returns an `Error::AuthError` if the base URI cannot be parsed or the client
/// cannot be built.
///
/// # Example
///
/// ```rust,no_run
/// use github_client::{create_token_client, GitHubClient};
/// use secrecy::SecretString;
///
/// # fn example() -> Result<(), github_client::Error> {
/// let token = SecretString::from("ghp_example".to_string());
/// let client = GitHubClient::new(create_token_client(&token, None)?);
/// # Ok(())
/// # }
/// ```
#[instrument(skip(token))]
pub fn create_token_client(token: &SecretString, base_uri: Option<&str>) -> Result<Octocrab, Error> {
    let mut builder = Octocrab::builder()
        .personal_token(token.expose_secret().to_string())
        .add_header(
            HeaderName::from_static("x-github-api-version"),
            GITHUB_API_VERSION.to_string(),
        );

    if let Some(uri) = base_uri {
        info!(base_uri = uri, "Using custom GitHub API base URI");
        builder = builder.base_uri(uri).map_err(|e| {
            Error::AuthError(format!("Invalid GitHub API base URI '{}': {}", uri, e))
        })?;
    }

    builder.build().map_err(|e| {
        error!(error = ?e, "Failed to build Octocrab client with token credentials");
        Error::AuthError("Failed to build the GitHub client.".to_string())
    })
}

fn log_octocrab_error(message: &str, e: octocrab::Error) {
    match e {
        octocrab::Error::GitHub { source, backtrace } => {
            let err = source;
            error!(
                error_message = err.message,
                backtrace = backtrace.to_string(),
                "{}. Received an error from GitHub",
                message
            )
        }
        octocrab::Error::UriParse { source, backtrace } => error!(
            error_message = source.to_string(),
            backtrace = backtrace.to_string(),
            "{}. Failed to parse URI.",
            message
        ),
        octocrab::Error::Uri { source, backtrace } => error!(
            error_message = source.to_string(),
            backtrace = backtrace.to_string(),
            "{}, Failed to parse URI.",
            message
        ),
        octocrab::Error::InvalidHeaderValue { source, backtrace } => error!(
            error_message = source.to_string(),
            backtrace = backtrace.to_string(),
            "{}. One of the header values was invalid.",
            message
        ),
        octocrab::Error::InvalidUtf8 { source, backtrace } => error!(
            error_message = source.to_string(),
            backtrace = backtrace.to_string(),
            "{}. The message wasn't valid UTF-8.",
            message,
        ),
        _ => error!(error_message = e.to_string(), message),
    };
}
