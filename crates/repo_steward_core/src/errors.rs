//! Error types for the reconciliation engine.
//!
//! Only a handful of conditions abort a run: the target repository could not be
//! created, or the desired-state document itself is unusable. Everything that goes
//! wrong inside a category is recorded in the run report instead (see
//! [`crate::report`]).

use std::path::PathBuf;

use thiserror::Error;

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

/// Result alias used throughout the engine.
pub type StewardResult<T> = Result<T, StewardError>;

/// Errors that end a reconciliation run.
#[derive(Error, Debug)]
pub enum StewardError {
    /// The repository did not exist and creating it failed.
    ///
    /// Every later category depends on the repository, so this is fatal.
    #[error("Failed to create repository '{target}': {reason}")]
    RepositoryCreation { target: String, reason: String },

    /// The desired-state document could not be interpreted.
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// The desired-state document could not be read from disk.
    #[error("Failed to read configuration file '{path}': {source}")]
    ConfigurationFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A field of the desired state failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A secret value could not be sealed with the repository public key.
    #[error("Failed to seal secret: {0}")]
    Sealing(String),

    /// A GitHub call failed in a place where the engine cannot continue.
    #[error("GitHub API error: {0}")]
    GitHub(#[from] github_client::Error),
}

/// Validation failures for names and identifiers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Field '{field}' must not be empty")]
    EmptyField { field: String },

    #[error("Field '{field}' is too long ({length} characters, at most {max} allowed)")]
    TooLong {
        field: String,
        length: usize,
        max: usize,
    },

    #[error("Field '{field}' has an invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    pub fn empty_field(field: &str) -> Self {
        Self::EmptyField {
            field: field.to_string(),
        }
    }

    pub fn too_long(field: &str, length: usize, max: usize) -> Self {
        Self::TooLong {
            field: field.to_string(),
            length,
            max,
        }
    }

    pub fn invalid_format(field: &str, reason: &str) -> Self {
        Self::InvalidFormat {
            field: field.to_string(),
            reason: reason.to_string(),
        }
    }
}
