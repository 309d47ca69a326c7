//! Actions variables and secrets, at repository or environment scope.
//!
//! Variables are compared by value and written only when they differ. Secret values
//! cannot be read back, so every configured secret is sealed under the scope's
//! current public key and written on each run; the report distinguishes created
//! from updated by whether the name already existed. Neither store is pruned.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use github_client::{ActionsScope, ActionsVariable, GitHubClient, SecretPayload};
use tracing::{debug, info, warn};

use crate::configuration::SecretValue;
use crate::report::{Category, CategoryReport};
use crate::secret_sealer::SecretSealer;
use crate::target::Target;

#[cfg(test)]
#[path = "secret_reconciler_tests.rs"]
mod tests;

/// Converges Actions variables and secrets for one scope at a time.
pub struct SecretReconciler {
    github_client: GitHubClient,
}

impl SecretReconciler {
    pub fn new(github_client: GitHubClient) -> Self {
        Self { github_client }
    }

    /// Creates missing variables and patches the ones whose value differs.
    ///
    /// A failure to list the existing variables fails the whole scope, since
    /// creating blindly would collide with variables that already exist.
    pub async fn reconcile_variables(
        &self,
        target: &Target,
        scope: &ActionsScope,
        desired: &BTreeMap<String, String>,
        category: Category,
    ) -> CategoryReport {
        let mut report = CategoryReport::new(category);
        if desired.is_empty() {
            return report;
        }

        let existing: HashMap<String, String> = match self
            .github_client
            .list_variables(target.owner(), target.name(), scope)
            .await
        {
            Ok(variables) => variables.into_iter().map(|v| (v.name, v.value)).collect(),
            Err(e) => {
                warn!(target = %target, scope = %scope, error = %e, "Could not list variables");
                report.record_failure(scope.to_string(), format!("could not list variables: {}", e));
                return report;
            }
        };

        for (name, value) in desired {
            let variable = ActionsVariable {
                name: name.clone(),
                value: value.clone(),
            };

            let result = match existing.get(name) {
                Some(current) if current == value => {
                    debug!(target = %target, scope = %scope, variable = %name, "Variable unchanged");
                    report.record_unchanged();
                    continue;
                }
                Some(_) => self
                    .github_client
                    .update_variable(target.owner(), target.name(), scope, &variable)
                    .await
                    .map(|()| false),
                None => self
                    .github_client
                    .create_variable(target.owner(), target.name(), scope, &variable)
                    .await
                    .map(|()| true),
            };

            match result {
                Ok(true) => {
                    info!(target = %target, scope = %scope, variable = %name, "Variable created");
                    report.record_created();
                }
                Ok(false) => {
                    info!(target = %target, scope = %scope, variable = %name, "Variable updated");
                    report.record_updated();
                }
                Err(e) => {
                    warn!(target = %target, scope = %scope, variable = %name, error = %e, "Could not write variable");
                    report.record_failure(name.as_str(), e.to_string());
                }
            }
        }

        report
    }

    /// Seals and writes every configured secret.
    pub async fn reconcile_secrets(
        &self,
        target: &Target,
        scope: &ActionsScope,
        desired: &BTreeMap<String, SecretValue>,
        category: Category,
    ) -> CategoryReport {
        let mut report = CategoryReport::new(category);
        if desired.is_empty() {
            return report;
        }

        let existing: BTreeSet<String> = match self
            .github_client
            .list_secret_names(target.owner(), target.name(), scope)
            .await
        {
            Ok(names) => names.into_iter().collect(),
            Err(e) => {
                warn!(target = %target, scope = %scope, error = %e, "Could not list secrets, treating all as new");
                BTreeSet::new()
            }
        };

        let public_key = match self
            .github_client
            .get_public_key(target.owner(), target.name(), scope)
            .await
        {
            Ok(key) => key,
            Err(e) => {
                warn!(target = %target, scope = %scope, error = %e, "Could not fetch the secrets public key");
                for name in desired.keys() {
                    report.record_failure(name.as_str(), format!("public key unavailable: {}", e));
                }
                return report;
            }
        };

        for (name, value) in desired {
            let sealed = match SecretSealer::seal(&public_key, value.expose()) {
                Ok(sealed) => sealed,
                Err(e) => {
                    report.record_failure(name.as_str(), e.to_string());
                    continue;
                }
            };

            let payload = SecretPayload::from(sealed);
            match self
                .github_client
                .put_secret(target.owner(), target.name(), scope, name, &payload)
                .await
            {
                Ok(()) if existing.contains(name) => {
                    info!(target = %target, scope = %scope, secret = %name, "Secret updated");
                    report.record_updated();
                }
                Ok(()) => {
                    info!(target = %target, scope = %scope, secret = %name, "Secret created");
                    report.record_created();
                }
                Err(e) => {
                    warn!(target = %target, scope = %scope, secret = %name, error = %e, "Could not write secret");
                    report.record_failure(name.as_str(), e.to_string());
                }
            }
        }

        report
    }
}
