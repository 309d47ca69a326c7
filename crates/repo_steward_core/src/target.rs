//! The repository a reconciliation run is aimed at.
//!
//! A [`Target`] is the validated `(owner, name)` pair. It is built once from the
//! desired state and never changes for the duration of a run.

use serde::{Deserialize, Serialize};

use crate::errors::ValidationError;

#[cfg(test)]
#[path = "target_tests.rs"]
mod tests;

/// Validated GitHub repository name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepositoryName(String);

impl RepositoryName {
    /// Create a new repository name with validation
    ///
    /// # Validation Rules
    /// - Length: 1-100 characters
    /// - Characters: ASCII alphanumeric, hyphens, underscores, periods
    /// - Must not start with `-`
    /// - Must not be `.` or `..`
    ///
    /// # Errors
    /// Returns `ValidationError` if validation fails
    pub fn new(name: impl Into<String>) -> Result<Self, ValidationError> {
        let name = name.into();

        if name.is_empty() {
            return Err(ValidationError::empty_field("repository.name"));
        }

        if name.len() > 100 {
            return Err(ValidationError::too_long(
                "repository.name",
                name.len(),
                100,
            ));
        }

        if name == "." || name == ".." {
            return Err(ValidationError::invalid_format(
                "repository.name",
                "'.' and '..' are reserved",
            ));
        }

        if name.starts_with('-') {
            return Err(ValidationError::invalid_format(
                "repository.name",
                "must not start with '-'",
            ));
        }

        if !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
        {
            return Err(ValidationError::invalid_format(
                "repository.name",
                "must contain only alphanumeric characters, hyphens, underscores, or periods",
            ));
        }

        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RepositoryName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for RepositoryName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Validated GitHub account name; either an organization or a user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OwnerName(String);

impl OwnerName {
    /// Create a new owner name with validation
    ///
    /// # Validation Rules
    /// - Length: 1-39 characters
    /// - Characters: ASCII alphanumeric and hyphens only
    /// - Must not start or end with hyphen
    /// - No consecutive hyphens
    ///
    /// # Errors
    /// Returns `ValidationError` if validation fails
    pub fn new(name: impl Into<String>) -> Result<Self, ValidationError> {
        let name = name.into();

        if name.is_empty() {
            return Err(ValidationError::empty_field("repository.owner"));
        }

        if name.len() > 39 {
            return Err(ValidationError::too_long(
                "repository.owner",
                name.len(),
                39,
            ));
        }

        if name.starts_with('-') || name.ends_with('-') {
            return Err(ValidationError::invalid_format(
                "repository.owner",
                "must not start or end with hyphen",
            ));
        }

        if name.contains("--") {
            return Err(ValidationError::invalid_format(
                "repository.owner",
                "must not contain consecutive hyphens",
            ));
        }

        if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(ValidationError::invalid_format(
                "repository.owner",
                "must contain only alphanumeric characters and hyphens",
            ));
        }

        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OwnerName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for OwnerName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// The `(owner, name)` pair identifying the managed repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Target {
    owner: OwnerName,
    name: RepositoryName,
}

impl Target {
    pub fn new(owner: OwnerName, name: RepositoryName) -> Self {
        Self { owner, name }
    }

    /// Validates both parts and builds the target.
    pub fn parse(owner: &str, name: &str) -> Result<Self, ValidationError> {
        Ok(Self::new(OwnerName::new(owner)?, RepositoryName::new(name)?))
    }

    pub fn owner(&self) -> &str {
        self.owner.as_str()
    }

    pub fn name(&self) -> &str {
        self.name.as_str()
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}
