//! GitHub Actions secrets and variables.
//!
//! Secrets and variables exist at repository scope and at environment scope; the
//! two scopes share payload shapes and differ only in their route prefix, which
//! [`ActionsScope`] captures. Secret values are write-only: listings return names,
//! never values.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::{segment, Error, GitHubClient, Verb};

#[cfg(test)]
#[path = "actions_tests.rs"]
mod tests;

/// Where a secret or variable lives.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ActionsScope {
    /// Repository wide Actions secrets and variables
    Repository,
    /// Secrets and variables of one deployment environment
    Environment(String),
}

impl ActionsScope {
    fn base(&self, owner: &str, repo: &str, kind: &str) -> String {
        match self {
            ActionsScope::Repository => format!("/repos/{}/{}/actions/{}", owner, repo, kind),
            ActionsScope::Environment(env) => {
                format!(
                    "/repos/{}/{}/environments/{}/{}",
                    owner,
                    repo,
                    segment(env),
                    kind
                )
            }
        }
    }
}

impl fmt::Display for ActionsScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionsScope::Repository => write!(f, "repository"),
            ActionsScope::Environment(env) => write!(f, "environment '{}'", env),
        }
    }
}

/// A plaintext Actions variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionsVariable {
    /// The variable name
    pub name: String,
    /// The variable value
    pub value: String,
}

#[derive(Debug, Deserialize)]
struct VariableList {
    #[serde(default)]
    variables: Vec<ActionsVariable>,
}

#[derive(Debug, Deserialize)]
struct SecretName {
    name: String,
}

#[derive(Debug, Deserialize)]
struct SecretList {
    #[serde(default)]
    secrets: Vec<SecretName>,
}

/// The public key secrets of a scope must be sealed with.
///
/// The key id has to accompany every sealed value; GitHub rejects values sealed
/// under a rotated key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKey {
    /// The key identifier
    pub key_id: String,
    /// The base64 encoded Curve25519 public key
    pub key: String,
}

/// Payload for `PUT .../secrets/{secret_name}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SecretPayload {
    /// The base64 encoded sealed box
    pub encrypted_value: String,
    /// The id of the key the value was sealed with
    pub key_id: String,
}

impl GitHubClient {
    /// Lists the variables of a scope. A scope without variables (HTTP 404) has none.
    #[instrument(skip(self), fields(owner = %owner, repo = %repo, scope = %scope))]
    pub async fn list_variables(
        &self,
        owner: &str,
        repo: &str,
        scope: &ActionsScope,
    ) -> Result<Vec<ActionsVariable>, Error> {
        // The variables endpoints accept at most 30 entries per page.
        let route = scope.base(owner, repo, "variables");
        let variables = self
            .get_paged(&route, 30, |l: VariableList| l.variables)
            .await?;
        Ok(variables.unwrap_or_default())
    }

    /// Creates a variable.
    #[instrument(skip(self, variable), fields(owner = %owner, repo = %repo, scope = %scope, name = %variable.name))]
    pub async fn create_variable(
        &self,
        owner: &str,
        repo: &str,
        scope: &ActionsScope,
        variable: &ActionsVariable,
    ) -> Result<(), Error> {
        let route = scope.base(owner, repo, "variables");
        self.write(Verb::Post, &route, Some(variable)).await
    }

    /// Changes the value of an existing variable.
    #[instrument(skip(self, variable), fields(owner = %owner, repo = %repo, scope = %scope, name = %variable.name))]
    pub async fn update_variable(
        &self,
        owner: &str,
        repo: &str,
        scope: &ActionsScope,
        variable: &ActionsVariable,
    ) -> Result<(), Error> {
        let route = format!(
            "{}/{}",
            scope.base(owner, repo, "variables"),
            segment(&variable.name)
        );
        self.write(Verb::Patch, &route, Some(variable)).await
    }

    /// Lists the names of the secrets of a scope.
    #[instrument(skip(self), fields(owner = %owner, repo = %repo, scope = %scope))]
    pub async fn list_secret_names(
        &self,
        owner: &str,
        repo: &str,
        scope: &ActionsScope,
    ) -> Result<Vec<String>, Error> {
        let route = scope.base(owner, repo, "secrets");
        let secrets = self
            .get_paged(&route, 100, |l: SecretList| l.secrets)
            .await?;
        Ok(secrets
            .unwrap_or_default()
            .into_iter()
            .map(|s| s.name)
            .collect())
    }

    /// Fetches the current public key of a scope.
    #[instrument(skip(self), fields(owner = %owner, repo = %repo, scope = %scope))]
    pub async fn get_public_key(
        &self,
        owner: &str,
        repo: &str,
        scope: &ActionsScope,
    ) -> Result<PublicKey, Error> {
        let route = format!("{}/public-key", scope.base(owner, repo, "secrets"));
        self.get_required(&route).await
    }

    /// Creates or replaces a secret with an already sealed value.
    #[instrument(skip(self, payload), fields(owner = %owner, repo = %repo, scope = %scope, name = %name))]
    pub async fn put_secret(
        &self,
        owner: &str,
        repo: &str,
        scope: &ActionsScope,
        name: &str,
        payload: &SecretPayload,
    ) -> Result<(), Error> {
        let route = format!("{}/{}", scope.base(owner, repo, "secrets"), segment(name));
        self.write(Verb::Put, &route, Some(payload)).await
    }
}
