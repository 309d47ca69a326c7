//! Command modules for the Repo Steward CLI.
//!
//! - `apply_cmd`: converge a repository to a desired-state document
//! - `validate_cmd`: check a document offline and show what a run would manage

pub mod apply_cmd;
pub mod validate_cmd;
