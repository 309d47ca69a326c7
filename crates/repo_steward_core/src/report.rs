//! Structured outcome of a reconciliation run.
//!
//! Each reconciler fills in one [`CategoryReport`]; failures inside a category are
//! recorded as diagnostics rather than returned as errors, so a run where one
//! secret failed but everything else converged is reported as exactly that.

use std::fmt;

use crate::target::Target;

#[cfg(test)]
#[path = "report_tests.rs"]
mod tests;

/// The configuration categories, in the order they are reconciled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Properties,
    Files,
    BranchProtection,
    Environments,
    EnvironmentVariables,
    EnvironmentSecrets,
    Variables,
    Secrets,
    TeamAccess,
    UserAccess,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Properties => "custom properties",
            Category::Files => "files",
            Category::BranchProtection => "branch protection",
            Category::Environments => "environments",
            Category::EnvironmentVariables => "environment variables",
            Category::EnvironmentSecrets => "environment secrets",
            Category::Variables => "variables",
            Category::Secrets => "secrets",
            Category::TeamAccess => "team access",
            Category::UserAccess => "user access",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Something was skipped or degraded; the category still converged as far as it could.
    Warning,
    /// An item could not be reconciled.
    Failure,
}

/// One noteworthy event inside a category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    /// The item the diagnostic is about, e.g. a branch or secret name.
    pub subject: String,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.subject, self.message)
    }
}

/// Counters and diagnostics for one category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryReport {
    pub category: Category,
    /// Items that did not exist and were created
    pub created: usize,
    /// Items that existed and were changed
    pub updated: usize,
    /// Items that already matched
    pub unchanged: usize,
    /// Items that were deliberately not processed
    pub skipped: usize,
    /// Items that could not be reconciled
    pub failed: usize,
    pub diagnostics: Vec<Diagnostic>,
}

impl CategoryReport {
    pub fn new(category: Category) -> Self {
        Self {
            category,
            created: 0,
            updated: 0,
            unchanged: 0,
            skipped: 0,
            failed: 0,
            diagnostics: Vec::new(),
        }
    }

    pub fn record_created(&mut self) {
        self.created += 1;
    }

    pub fn record_updated(&mut self) {
        self.updated += 1;
    }

    pub fn record_unchanged(&mut self) {
        self.unchanged += 1;
    }

    /// Counts a skipped item and notes why.
    pub fn record_skipped(&mut self, subject: impl Into<String>, reason: impl Into<String>) {
        self.skipped += 1;
        self.warn(subject, reason);
    }

    /// Counts a failed item and keeps the message.
    pub fn record_failure(&mut self, subject: impl Into<String>, message: impl Into<String>) {
        self.failed += 1;
        self.diagnostics.push(Diagnostic {
            severity: Severity::Failure,
            subject: subject.into(),
            message: message.into(),
        });
    }

    /// Notes a degraded outcome without changing any counter.
    pub fn warn(&mut self, subject: impl Into<String>, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic {
            severity: Severity::Warning,
            subject: subject.into(),
            message: message.into(),
        });
    }

    /// Folds another report of the same category into this one.
    pub fn absorb(&mut self, other: CategoryReport) {
        self.created += other.created;
        self.updated += other.updated;
        self.unchanged += other.unchanged;
        self.skipped += other.skipped;
        self.failed += other.failed;
        self.diagnostics.extend(other.diagnostics);
    }

    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    pub fn has_changes(&self) -> bool {
        self.created > 0 || self.updated > 0
    }
}

impl fmt::Display for CategoryReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} created, {} updated, {} unchanged, {} skipped, {} failed",
            self.category, self.created, self.updated, self.unchanged, self.skipped, self.failed
        )
    }
}

/// The outcome of reconciling one repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileReport {
    pub target: Target,
    /// Browser URL of the repository
    pub repository_url: String,
    /// Whether the repository was created by this run
    pub created: bool,
    pub categories: Vec<CategoryReport>,
}

impl ReconcileReport {
    pub fn new(target: Target, repository_url: impl Into<String>, created: bool) -> Self {
        Self {
            target,
            repository_url: repository_url.into(),
            created,
            categories: Vec::new(),
        }
    }

    /// True when no category recorded a failure.
    pub fn is_success(&self) -> bool {
        self.categories.iter().all(CategoryReport::is_success)
    }

    /// True when the run created the repository or changed anything in it.
    pub fn has_changes(&self) -> bool {
        self.created || self.categories.iter().any(CategoryReport::has_changes)
    }

    /// All failure diagnostics with the category they belong to.
    pub fn failures(&self) -> Vec<(Category, &Diagnostic)> {
        self.categories
            .iter()
            .flat_map(|report| {
                report
                    .diagnostics
                    .iter()
                    .filter(|d| d.severity == Severity::Failure)
                    .map(move |d| (report.category, d))
            })
            .collect()
    }

    pub fn category(&self, category: Category) -> Option<&CategoryReport> {
        self.categories.iter().find(|r| r.category == category)
    }
}
