//! # Models
//!
//! Repository, organization and user documents shared by several endpoint families.
//! Only the fields the reconciliation engine reads are modelled; everything else in
//! the GitHub response is ignored during deserialization.

use serde::{Deserialize, Serialize};
use url::Url;

#[cfg(test)]
#[path = "models_tests.rs"]
mod tests;

/// Represents a GitHub organization.
///
/// # Examples
///
/// ```rust
/// use github_client::models::Organization;
///
/// let org = Organization {
///     id: 1,
///     login: "my-organization".to_string(),
/// };
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    /// The unique numeric ID of the organization
    pub id: u64,
    /// The login name of the organization
    pub login: String,
}

/// Represents a GitHub repository.
///
/// # Examples
///
/// ```rust
/// use github_client::models::Repository;
///
/// let repo: Repository = serde_json::from_value(serde_json::json!({
///     "name": "my-repo",
///     "full_name": "my-org/my-repo",
///     "html_url": "https://github.com/my-org/my-repo",
///     "private": true,
///     "default_branch": "main"
/// })).unwrap();
///
/// assert_eq!(repo.default_branch(), "main");
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Repository {
    /// The name of the repository
    pub name: String,
    /// The full name of the repository (owner/name)
    pub full_name: String,
    /// The browser URL of the repository
    pub html_url: Url,
    /// Whether the repository is private
    #[serde(default)]
    pub private: bool,
    /// The visibility (`public`, `private` or `internal`) when GitHub reports it
    #[serde(default)]
    pub visibility: Option<String>,
    /// The name of the default branch
    #[serde(default)]
    pub default_branch: Option<String>,
}

impl Repository {
    /// Returns the default branch, falling back to `main` when GitHub did not report one.
    pub fn default_branch(&self) -> &str {
        self.default_branch.as_deref().unwrap_or("main")
    }
}

/// Payload for `POST /orgs/{org}/repos` and `POST /user/repos`.
///
/// Use `Default::default()` and modify fields as needed. Organization owned
/// repositories select `internal` through `visibility`; the `private` flag is the
/// portable way to choose between public and private.
#[derive(Serialize, Default, Debug, Clone, PartialEq, Eq)]
pub struct RepositoryCreatePayload {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub private: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<String>,

    /// Create an initial commit so branches and files can be managed right away
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_init: Option<bool>,
}

/// Represents a GitHub user account.
///
/// # Examples
///
/// ```rust
/// use github_client::models::User;
///
/// let user = User {
///     id: 12345,
///     login: "octocat".to_string(),
/// };
///
/// println!("User: {} (ID: {})", user.login, user.id);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct User {
    /// The unique numeric ID of the user
    pub id: u64,
    /// The login name of the user
    pub login: String,
}
