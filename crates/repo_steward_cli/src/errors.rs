use thiserror::Error;

use repo_steward_core::StewardError;

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

/// Process exit code for a run in which every category succeeded.
pub const EXIT_SUCCESS: i32 = 0;

/// Process exit code for a run that completed with failures in some categories.
pub const EXIT_CATEGORY_FAILURES: i32 = 1;

/// Process exit code for configuration problems and runs that could not complete.
pub const EXIT_FATAL: i32 = 2;

/// Errors that can occur in the Repo Steward CLI application.
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid command-line arguments were provided.
    ///
    /// Returned when a required value, such as the GitHub token, is neither passed
    /// as a flag nor present in the environment.
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// The engine rejected the document or could not complete the run.
    ///
    /// Covers unreadable or malformed documents, invalid repository identities, a
    /// GitHub client that cannot be built, and repository creation failures.
    #[error(transparent)]
    Engine(#[from] StewardError),
}

impl Error {
    /// The process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        EXIT_FATAL
    }
}
