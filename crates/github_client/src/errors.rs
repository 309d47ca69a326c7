//! Error types for GitHub client operations.
//!
//! This module defines the error types that can occur when talking to the GitHub REST API
//! through the github_client crate. Unsuccessful HTTP statuses are kept as data so that
//! callers can turn them into diagnostics instead of opaque failures.

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

/// Errors that can occur during GitHub client operations.
///
/// ## Examples
///
/// ```rust,ignore
/// use github_client::Error;
///
/// match client.get_repository("my-org", "my-repo").await {
///     Ok(Some(repo)) => println!("Repository exists: {}", repo.full_name),
///     Ok(None) => println!("Repository does not exist"),
///     Err(Error::UnexpectedStatus { status, message }) => eprintln!("{status}: {message}"),
///     Err(err) => eprintln!("Other error: {}", err),
/// }
/// ```
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The request could not be sent or the response body could not be read.
    ///
    /// The contained string carries the transport level error description.
    #[error("API request failed: {0}")]
    ApiError(String),

    /// Authentication or GitHub client initialization failure.
    ///
    /// This error occurs when the octocrab client cannot be built, for example
    /// because the base URI is malformed or the credential cannot be used as a header.
    #[error("Failed to authenticate or initialize GitHub client: {0}")]
    AuthError(String),

    /// Error deserializing the response from GitHub.
    ///
    /// This error occurs when the GitHub API returns a response that cannot be
    /// parsed into the expected data structure.
    #[error("Failed to deserialize GitHub response: {0}")]
    Deserialization(#[from] serde_json::Error),

    /// The requested resource was not found.
    ///
    /// Returned by operations where a missing resource is an error rather than
    /// an expected answer (lookups that can legitimately miss return `Ok(None)`).
    #[error("Resource not found")]
    NotFound,

    /// GitHub answered with a status that the operation does not accept.
    ///
    /// `message` is the `message` field of the GitHub error document when one was
    /// returned, otherwise the raw response body.
    #[error("GitHub returned HTTP {status}: {message}")]
    UnexpectedStatus {
        /// The HTTP status code of the response
        status: u16,
        /// The error message reported by GitHub
        message: String,
    },
}

impl Error {
    /// Returns the HTTP status associated with the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::UnexpectedStatus { status, .. } => Some(*status),
            Error::NotFound => Some(404),
            _ => None,
        }
    }
}
