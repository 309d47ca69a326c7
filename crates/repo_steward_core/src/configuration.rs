//! The desired-state model.
//!
//! A [`DesiredState`] is read once from a JSON or TOML document and stays
//! read-only for the whole run. Sections that are absent from the document default
//! to "nothing to manage" so a document only has to describe what it cares about.
//!
//! # Example document
//!
//! ```json
//! {
//!   "repository": { "name": "payments", "owner": "acme", "visibility": "internal" },
//!   "custom_properties": { "team": "Platform Engineering" },
//!   "environments": ["dev", "prod"],
//!   "team_access": { "qa-team": "read" }
//! }
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::Path;

use github_client::DeploymentBranchPolicySettings;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use crate::errors::{StewardError, StewardResult};
use crate::target::Target;

#[cfg(test)]
#[path = "configuration_tests.rs"]
mod tests;

/// Gitignore template used when none is configured.
pub const DEFAULT_GITIGNORE_TEMPLATE: &str = "Python";

/// Branch protected by the single-branch configuration form.
pub const DEFAULT_PROTECTED_BRANCH: &str = "main";

const DEFAULT_REQUIRED_REVIEWS: u32 = 2;

fn default_true() -> bool {
    true
}

fn default_required_reviews() -> u32 {
    DEFAULT_REQUIRED_REVIEWS
}

fn default_gitignore_template() -> String {
    DEFAULT_GITIGNORE_TEMPLATE.to_string()
}

fn default_protected_branch() -> String {
    DEFAULT_PROTECTED_BRANCH.to_string()
}

/// Repository visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Private,
    #[default]
    Internal,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Private => "private",
            Visibility::Internal => "internal",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Repository permission levels, ordered from least to most access.
///
/// Documents may use either the role names (`read`, `write`) or the REST API
/// names (`pull`, `push`).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum PermissionLevel {
    #[serde(alias = "pull")]
    Read,
    Triage,
    #[serde(alias = "push")]
    Write,
    Maintain,
    Admin,
}

impl PermissionLevel {
    /// Parses a permission as reported by GitHub.
    ///
    /// Accepts both role names and REST API names, case-insensitively. Returns
    /// `None` for `none` and anything unrecognised.
    pub fn from_remote(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "read" | "pull" => Some(PermissionLevel::Read),
            "triage" => Some(PermissionLevel::Triage),
            "write" | "push" => Some(PermissionLevel::Write),
            "maintain" => Some(PermissionLevel::Maintain),
            "admin" => Some(PermissionLevel::Admin),
            _ => None,
        }
    }

    /// The name the permission-setting endpoints expect.
    pub fn api_name(&self) -> &'static str {
        match self {
            PermissionLevel::Read => "pull",
            PermissionLevel::Triage => "triage",
            PermissionLevel::Write => "push",
            PermissionLevel::Maintain => "maintain",
            PermissionLevel::Admin => "admin",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionLevel::Read => "read",
            PermissionLevel::Triage => "triage",
            PermissionLevel::Write => "write",
            PermissionLevel::Maintain => "maintain",
            PermissionLevel::Admin => "admin",
        }
    }
}

impl fmt::Display for PermissionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A secret value. Plaintext in memory, redacted from `Debug` output.
#[derive(Debug)]
pub struct SecretValue(SecretString);

impl SecretValue {
    pub fn new(value: impl Into<String>) -> Self {
        Self(SecretString::from(value.into()))
    }

    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl Clone for SecretValue {
    fn clone(&self) -> Self {
        Self::new(self.expose())
    }
}

impl<'de> Deserialize<'de> for SecretValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer).map(SecretValue::new)
    }
}

/// The `repository` section: identity plus the fields used when creating it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawRepositorySettings")]
pub struct RepositorySettings {
    pub name: String,
    pub owner: String,
    pub description: String,
    pub visibility: Visibility,
}

/// On-disk form; `private` is the older spelling of `visibility`.
#[derive(Deserialize)]
struct RawRepositorySettings {
    #[serde(default)]
    name: String,
    #[serde(default)]
    owner: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    visibility: Option<Visibility>,
    #[serde(default)]
    private: Option<bool>,
}

impl From<RawRepositorySettings> for RepositorySettings {
    fn from(raw: RawRepositorySettings) -> Self {
        let visibility = match (raw.visibility, raw.private) {
            (Some(visibility), _) => visibility,
            (None, Some(true)) => Visibility::Private,
            (None, Some(false)) => Visibility::Public,
            (None, None) => Visibility::default(),
        };

        Self {
            name: raw.name,
            owner: raw.owner,
            description: raw.description,
            visibility,
        }
    }
}

/// Where `.gitignore` content comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GitignoreSource<'a> {
    /// `.gitignore` is not managed
    Unmanaged,
    /// A GitHub template name such as `Rust`
    Template(&'a str),
    /// Literal file content
    Literal(&'a str),
}

/// The `files` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FileSettings {
    /// README content. Empty means "generate on creation, never overwrite".
    #[serde(default)]
    pub readme_content: String,

    /// A single-line template name, or multi-line literal content.
    #[serde(default = "default_gitignore_template")]
    pub gitignore_template: String,

    /// Additional files keyed by repository path.
    #[serde(default)]
    pub contents: BTreeMap<String, String>,
}

impl Default for FileSettings {
    fn default() -> Self {
        Self {
            readme_content: String::new(),
            gitignore_template: default_gitignore_template(),
            contents: BTreeMap::new(),
        }
    }
}

impl FileSettings {
    pub fn gitignore_source(&self) -> GitignoreSource<'_> {
        let value = self.gitignore_template.trim();
        if value.is_empty() {
            GitignoreSource::Unmanaged
        } else if value.contains('\n') {
            GitignoreSource::Literal(&self.gitignore_template)
        } else {
            GitignoreSource::Template(value)
        }
    }
}

/// Protection policy for one branch.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BranchProtectionPolicy {
    #[serde(default)]
    pub enable: bool,
    #[serde(default = "default_required_reviews")]
    pub required_reviews: u32,
    #[serde(default = "default_true")]
    pub dismiss_stale_reviews: bool,
    #[serde(default = "default_true")]
    pub require_code_owner_reviews: bool,
    #[serde(default = "default_true")]
    pub enforce_admins: bool,
    #[serde(default)]
    pub require_status_checks: bool,
    #[serde(default)]
    pub status_checks: Vec<String>,
    /// Overrides [`BranchProtectionSettings::auto_create_branches`] for this branch.
    #[serde(default)]
    pub auto_create: Option<bool>,
}

impl Default for BranchProtectionPolicy {
    fn default() -> Self {
        Self {
            enable: false,
            required_reviews: DEFAULT_REQUIRED_REVIEWS,
            dismiss_stale_reviews: true,
            require_code_owner_reviews: true,
            enforce_admins: true,
            require_status_checks: false,
            status_checks: Vec::new(),
            auto_create: None,
        }
    }
}

impl BranchProtectionPolicy {
    /// The status check contexts that must pass; empty when checks are not required.
    pub fn required_contexts(&self) -> BTreeSet<String> {
        if self.require_status_checks {
            self.status_checks.iter().cloned().collect()
        } else {
            BTreeSet::new()
        }
    }
}

/// The `branch_protection` section.
///
/// Accepts the named form `{ "branches": { "main": {...} }, "auto_create_branches": true }`
/// and the single-branch form `{ "enable": true, "protected_branch": "main", ... }`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawBranchProtection")]
pub struct BranchProtectionSettings {
    pub branches: BTreeMap<String, BranchProtectionPolicy>,
    pub auto_create_branches: bool,
}

impl Default for BranchProtectionSettings {
    fn default() -> Self {
        Self {
            branches: BTreeMap::new(),
            auto_create_branches: true,
        }
    }
}

impl BranchProtectionSettings {
    /// Policies that are switched on, keyed by branch name.
    pub fn enabled_policies(&self) -> impl Iterator<Item = (&String, &BranchProtectionPolicy)> {
        self.branches.iter().filter(|(_, policy)| policy.enable)
    }

    /// Whether a missing branch should be created before protecting it.
    pub fn auto_create(&self, policy: &BranchProtectionPolicy) -> bool {
        policy.auto_create.unwrap_or(self.auto_create_branches)
    }
}

#[derive(Deserialize)]
struct RawBranchProtection {
    #[serde(default)]
    branches: Option<BTreeMap<String, BranchProtectionPolicy>>,
    #[serde(default = "default_true")]
    auto_create_branches: bool,
    #[serde(default)]
    enable: bool,
    #[serde(default = "default_protected_branch")]
    protected_branch: String,
    #[serde(default = "default_required_reviews")]
    required_reviews: u32,
    #[serde(default = "default_true")]
    dismiss_stale_reviews: bool,
    #[serde(default = "default_true")]
    require_code_owner_reviews: bool,
}

impl From<RawBranchProtection> for BranchProtectionSettings {
    fn from(raw: RawBranchProtection) -> Self {
        if let Some(branches) = raw.branches {
            return Self {
                branches,
                auto_create_branches: raw.auto_create_branches,
            };
        }

        let mut branches = BTreeMap::new();
        if raw.enable {
            branches.insert(
                raw.protected_branch,
                BranchProtectionPolicy {
                    enable: true,
                    required_reviews: raw.required_reviews,
                    dismiss_stale_reviews: raw.dismiss_stale_reviews,
                    require_code_owner_reviews: raw.require_code_owner_reviews,
                    enforce_admins: true,
                    require_status_checks: false,
                    status_checks: Vec::new(),
                    auto_create: None,
                },
            );
        }

        Self {
            branches,
            auto_create_branches: raw.auto_create_branches,
        }
    }
}

/// Kind of an environment reviewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewerKind {
    #[serde(alias = "Team", alias = "TEAM")]
    Team,
    #[serde(alias = "User", alias = "USER")]
    User,
}

/// A required reviewer as written in the document.
///
/// Team identifiers may be written as `org/team`; only the part after the slash
/// is used.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReviewerRef {
    #[serde(rename = "type")]
    pub kind: ReviewerKind,
    pub id: String,
}

/// Which branches may deploy to an environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchRestriction<'a> {
    Unrestricted,
    ProtectedBranchesOnly,
    CustomBranches(&'a [String]),
}

/// The `deployment_branch_policy` of an environment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DeploymentBranchPolicyConfig {
    #[serde(default)]
    pub protected_branches: bool,
    #[serde(default)]
    pub custom_branch_policies: bool,
    #[serde(default)]
    pub custom_branches: Vec<String>,
}

impl DeploymentBranchPolicyConfig {
    /// The wire sub-document; `None` when both flags are false.
    pub fn settings(&self) -> Option<DeploymentBranchPolicySettings> {
        DeploymentBranchPolicySettings::from_flags(
            self.protected_branches,
            self.custom_branch_policies,
        )
    }

    /// The custom branch list when it is to be managed.
    pub fn managed_custom_branches(&self) -> Option<&[String]> {
        if self.custom_branch_policies && !self.custom_branches.is_empty() {
            Some(&self.custom_branches)
        } else {
            None
        }
    }

    pub fn restriction(&self) -> BranchRestriction<'_> {
        if self.protected_branches {
            BranchRestriction::ProtectedBranchesOnly
        } else if let Some(branches) = self.managed_custom_branches() {
            BranchRestriction::CustomBranches(branches)
        } else {
            BranchRestriction::Unrestricted
        }
    }
}

/// Protection rules for one environment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct EnvironmentProtection {
    /// Minutes to wait before a deployment may proceed
    #[serde(default)]
    pub wait_timer: u32,
    #[serde(default)]
    pub prevent_self_review: bool,
    #[serde(default)]
    pub reviewers: Vec<ReviewerRef>,
    #[serde(default)]
    pub deployment_branch_policy: DeploymentBranchPolicyConfig,
}

/// The complete desired configuration of one repository.
#[derive(Debug, Clone, Deserialize)]
pub struct DesiredState {
    pub repository: RepositorySettings,
    #[serde(default)]
    pub custom_properties: BTreeMap<String, String>,
    #[serde(default)]
    pub files: FileSettings,
    #[serde(default)]
    pub branch_protection: BranchProtectionSettings,
    #[serde(default)]
    pub environments: Vec<String>,
    #[serde(default)]
    pub secrets: BTreeMap<String, SecretValue>,
    #[serde(default)]
    pub variables: BTreeMap<String, String>,
    #[serde(default)]
    pub environment_secrets: BTreeMap<String, BTreeMap<String, SecretValue>>,
    #[serde(default)]
    pub environment_variables: BTreeMap<String, BTreeMap<String, String>>,
    #[serde(default)]
    pub environment_protection: BTreeMap<String, EnvironmentProtection>,
    #[serde(default)]
    pub team_access: BTreeMap<String, PermissionLevel>,
    #[serde(default)]
    pub user_access: BTreeMap<String, PermissionLevel>,
}

impl DesiredState {
    /// Loads a document from disk. Paths ending in `.toml` are parsed as TOML,
    /// everything else as JSON.
    pub fn from_path(path: impl AsRef<Path>) -> StewardResult<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Loading desired state");

        let text = std::fs::read_to_string(path).map_err(|source| {
            StewardError::ConfigurationFile {
                path: path.to_path_buf(),
                source,
            }
        })?;

        let is_toml = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("toml"))
            .unwrap_or(false);

        if is_toml {
            Self::from_toml_str(&text)
        } else {
            Self::from_json_str(&text)
        }
    }

    pub fn from_json_str(text: &str) -> StewardResult<Self> {
        serde_json::from_str(text).map_err(|e| StewardError::Configuration(e.to_string()))
    }

    pub fn from_toml_str(text: &str) -> StewardResult<Self> {
        toml::from_str(text).map_err(|e| StewardError::Configuration(e.to_string()))
    }

    /// The validated repository identity.
    pub fn target(&self) -> StewardResult<Target> {
        Ok(Target::parse(&self.repository.owner, &self.repository.name)?)
    }

    /// Whether `name` is one of the desired environments.
    pub fn has_environment(&self, name: &str) -> bool {
        self.environments.iter().any(|e| e == name)
    }

    /// A custom property value, treating empty strings as absent.
    pub fn property(&self, key: &str) -> Option<&str> {
        self.custom_properties
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }
}
