//! Repository contents API types.
//!
//! This module covers single file reads and writes through the Contents API and
//! the lookup of named `.gitignore` templates.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::{segment, slash_path, Error, GitHubClient, Verb};

#[cfg(test)]
#[path = "contents_tests.rs"]
mod tests;

/// A file as returned by `GET /repos/{owner}/{repo}/contents/{path}`.
///
/// The content is base64 encoded and wrapped at 60 characters by GitHub.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileContent {
    /// Full path within the repository
    pub path: String,
    /// Blob SHA, required when the file is updated
    pub sha: String,
    /// Base64 encoded content
    #[serde(default)]
    pub content: String,
    /// Content encoding reported by GitHub, normally `base64`
    #[serde(default)]
    pub encoding: Option<String>,
}

impl FileContent {
    /// Decodes the file content as UTF-8 text.
    ///
    /// # Errors
    ///
    /// Returns `Error::ApiError` when the content is not valid base64 or not UTF-8.
    pub fn decoded(&self) -> Result<String, Error> {
        let compact: String = self
            .content
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();

        let bytes = STANDARD
            .decode(compact.as_bytes())
            .map_err(|e| Error::ApiError(format!("Invalid base64 content in {}: {}", self.path, e)))?;

        String::from_utf8(bytes)
            .map_err(|e| Error::ApiError(format!("Content of {} is not UTF-8: {}", self.path, e)))
    }
}

/// Payload for `PUT /repos/{owner}/{repo}/contents/{path}`.
///
/// `sha` must carry the blob SHA of the file being replaced; it is omitted when
/// the file is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileWritePayload {
    /// The commit message
    pub message: String,
    /// Base64 encoded content
    pub content: String,
    /// The blob SHA of the file being replaced
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha: Option<String>,
}

impl FileWritePayload {
    /// Builds a payload that creates a new file.
    pub fn create(path: &str, text: &str) -> Self {
        Self {
            message: format!("Add {}", path),
            content: STANDARD.encode(text.as_bytes()),
            sha: None,
        }
    }

    /// Builds a payload that replaces an existing file with the given blob SHA.
    pub fn update(path: &str, text: &str, sha: impl Into<String>) -> Self {
        Self {
            message: format!("Update {}", path),
            content: STANDARD.encode(text.as_bytes()),
            sha: Some(sha.into()),
        }
    }
}

/// A `.gitignore` template from `GET /gitignore/templates/{name}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitignoreTemplate {
    /// Template name, e.g. `Python`
    pub name: String,
    /// Template content
    pub source: String,
}

impl GitHubClient {
    /// Fetches a single file. `Ok(None)` when the path does not exist.
    #[instrument(skip(self), fields(owner = %owner, repo = %repo, path = %path))]
    pub async fn get_file(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
    ) -> Result<Option<FileContent>, Error> {
        self.get_optional(&format!(
            "/repos/{}/{}/contents/{}",
            owner,
            repo,
            slash_path(path)
        ))
            .await
    }

    /// Creates or replaces a single file with one commit.
    #[instrument(skip(self, payload), fields(owner = %owner, repo = %repo, path = %path))]
    pub async fn put_file(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        payload: &FileWritePayload,
    ) -> Result<(), Error> {
        let route = format!("/repos/{}/{}/contents/{}", owner, repo, slash_path(path));
        self.write(Verb::Put, &route, Some(payload)).await
    }

    /// Fetches a named `.gitignore` template. `Ok(None)` when no template has that name.
    #[instrument(skip(self), fields(name = %name))]
    pub async fn get_gitignore_template(
        &self,
        name: &str,
    ) -> Result<Option<GitignoreTemplate>, Error> {
        self.get_optional(&format!("/gitignore/templates/{}", segment(name)))
            .await
    }
}
