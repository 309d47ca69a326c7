//! # Repo Steward Core
//!
//! Declarative reconciliation of GitHub repositories. A [`DesiredState`] document
//! describes a repository and its sub-resources; the engine reads the current state
//! from GitHub, works out the smallest set of writes that brings it in line, and
//! applies only those. Running it twice against an unchanged document performs no
//! writes the second time (Actions secrets excepted, since their values cannot be
//! read back).
//!
//! ## Categories
//!
//! A run first makes sure the repository exists, creating it when needed. It then
//! converges, in order:
//!
//! 1. custom properties (or topics where properties are unavailable)
//! 2. managed files (`README.md`, `.gitignore`, extra paths)
//! 3. branch protection
//! 4. deployment environments, their protection and scoped variables and secrets
//! 5. repository variables and secrets
//! 6. team and collaborator access
//!
//! A failing category is recorded in the [`ReconcileReport`] and does not stop the
//! others. Only a failure to create the repository aborts the run.
//!
//! ## Example
//!
//! ```no_run
//! use repo_steward_core::{reconcile_repository, DesiredState, EngineSettings};
//! use secrecy::SecretString;
//!
//! # async fn example() -> Result<(), repo_steward_core::StewardError> {
//! let desired = DesiredState::from_path("repository.json")?;
//! let token = SecretString::from("ghp_example".to_string());
//!
//! let report = reconcile_repository(&token, None, &desired, EngineSettings::default()).await?;
//! for category in &report.categories {
//!     println!("{}", category);
//! }
//! # Ok(())
//! # }
//! ```

pub mod access_reconciler;
pub mod branch_protection_reconciler;
pub mod configuration;
pub mod environment_reconciler;
pub mod errors;
pub mod existence_reconciler;
pub mod file_reconciler;
pub mod orchestrator;
pub mod owner_probe;
pub mod property_reconciler;
pub mod report;
pub mod secret_reconciler;
pub mod secret_sealer;
pub mod target;

pub use access_reconciler::AccessReconciler;
pub use branch_protection_reconciler::{
    protection_differences, protection_update, BranchProtectionReconciler,
};
pub use configuration::{
    BranchProtectionPolicy, BranchProtectionSettings, DesiredState, EnvironmentProtection,
    FileSettings, PermissionLevel, RepositorySettings, ReviewerKind, ReviewerRef, SecretValue,
    Visibility,
};
pub use environment_reconciler::{EnvironmentReconciler, EnvironmentReports};
pub use errors::{StewardError, StewardResult, ValidationError};
pub use existence_reconciler::{ExistenceOutcome, ExistenceReconciler};
pub use file_reconciler::FileReconciler;
pub use orchestrator::{reconcile_repository, EngineSettings, RepositoryReconciler};
pub use owner_probe::{FixedOwnerKind, GitHubOwnerKindProbe, OwnerKind, OwnerKindProbe};
pub use property_reconciler::PropertyReconciler;
pub use report::{Category, CategoryReport, Diagnostic, ReconcileReport, Severity};
pub use secret_reconciler::SecretReconciler;
pub use secret_sealer::{SealedSecret, SecretSealer};
pub use target::{OwnerName, RepositoryName, Target};

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
