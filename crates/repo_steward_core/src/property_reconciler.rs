//! Custom property convergence, with repository topics as the fallback carrier.
//!
//! Organizations with a custom property schema get structured values; everybody
//! else (user accounts, organizations without a schema, or a rejected update) gets
//! the same information encoded as topics.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use github_client::{CustomPropertiesPayload, CustomPropertyValue, GitHubClient};
use tracing::{debug, info, warn};

use crate::configuration::DesiredState;
use crate::owner_probe::{OwnerKind, OwnerKindProbe};
use crate::report::{Category, CategoryReport};
use crate::target::Target;

#[cfg(test)]
#[path = "property_reconciler_tests.rs"]
mod tests;

/// Configuration keys and the organization property names they map to.
const PROPERTY_NAMES: &[(&str, &str)] = &[
    ("application", "Application"),
    ("compliance_audit_to_review", "ComplianceAuditToReview"),
    ("deployed_to_prod", "DeployedToProd"),
    ("impact_on_prod_app", "ImpactOnProdApp"),
    ("poc", "poc"),
    ("owner", "owner"),
    ("prod_deployment_method", "ProdDeploymentMethod"),
    ("team", "Team"),
];

const TOPICS_SUBJECT: &str = "topics";

/// The organization property name for a configuration key.
pub fn property_name(key: &str) -> &str {
    PROPERTY_NAMES
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, name)| *name)
        .unwrap_or(key)
}

/// Lowercases and replaces separators with hyphens, dropping characters GitHub
/// does not allow in topics.
pub(crate) fn slug(value: &str) -> String {
    value
        .trim()
        .to_lowercase()
        .chars()
        .filter_map(|c| match c {
            ' ' | '.' | '_' => Some('-'),
            c if c.is_ascii_alphanumeric() || c == '-' => Some(c),
            _ => None,
        })
        .collect()
}

fn is_yes(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("yes")
}

/// Encodes the non-empty properties as topic names.
pub fn topic_tokens(properties: &BTreeMap<String, String>) -> BTreeSet<String> {
    let mut topics = BTreeSet::new();

    for (key, value) in properties.iter().filter(|(_, v)| !v.trim().is_empty()) {
        let topic = match key.as_str() {
            "application" => Some(format!("app-{}", slug(value))),
            "team" => Some(format!("team-{}", slug(value))),
            "poc" => {
                let handle = value.split('@').next().unwrap_or(value);
                Some(format!("poc-{}", slug(handle)))
            }
            "deployed_to_prod" => is_yes(value).then(|| "production-deployed".to_string()),
            "compliance_audit_to_review" => {
                is_yes(value).then(|| "compliance-required".to_string())
            }
            _ => Some(format!("{}-{}", slug(key), slug(value))),
        };

        topics.extend(topic);
    }

    topics
}

/// The desired values that differ from what the repository has.
///
/// Properties with an identical observed value are left out, so the result is
/// empty when everything already matches.
pub fn property_changes(
    desired: &BTreeMap<String, String>,
    existing: &[CustomPropertyValue],
) -> Vec<CustomPropertyValue> {
    let observed: BTreeMap<&str, Option<String>> = existing
        .iter()
        .map(|p| (p.property_name.as_str(), p.value_as_string()))
        .collect();

    desired
        .iter()
        .filter(|(_, value)| !value.trim().is_empty())
        .map(|(key, value)| (property_name(key), value))
        .filter(|(name, value)| {
            observed.get(name).and_then(|v| v.as_deref()) != Some(value.as_str())
        })
        .map(|(name, value)| CustomPropertyValue::new(name, value.as_str()))
        .collect()
}

/// Converges custom properties.
pub struct PropertyReconciler {
    github_client: GitHubClient,
    owner_probe: Arc<dyn OwnerKindProbe>,
}

impl PropertyReconciler {
    pub fn new(github_client: GitHubClient, owner_probe: Arc<dyn OwnerKindProbe>) -> Self {
        Self {
            github_client,
            owner_probe,
        }
    }

    pub async fn reconcile(&self, target: &Target, desired: &DesiredState) -> CategoryReport {
        let mut report = CategoryReport::new(Category::Properties);
        let properties = &desired.custom_properties;

        if properties.values().all(|v| v.trim().is_empty()) {
            debug!(target = %target, "No custom properties configured");
            return report;
        }

        if self.supports_structured_properties(target).await {
            match self.apply_structured(target, properties, &mut report).await {
                Ok(()) => return report,
                Err(message) => {
                    warn!(target = %target, error = %message, "Custom property update failed, falling back to topics");
                    report.warn(
                        "custom properties",
                        format!("{}; falling back to topics", message),
                    );
                }
            }
        } else {
            info!(target = %target, "Custom properties not available, using topics");
        }

        self.apply_topics(target, properties, &mut report).await;
        report
    }

    async fn supports_structured_properties(&self, target: &Target) -> bool {
        if self.owner_probe.owner_kind(target.owner()).await != OwnerKind::Organization {
            return false;
        }

        match self
            .github_client
            .get_organization_property_schema(target.owner())
            .await
        {
            Ok(Some(schema)) => {
                debug!(org = target.owner(), defined = schema.len(), "Organization supports custom properties");
                true
            }
            Ok(None) => false,
            Err(e) => {
                warn!(org = target.owner(), error = %e, "Could not read custom property schema");
                false
            }
        }
    }

    async fn apply_structured(
        &self,
        target: &Target,
        properties: &BTreeMap<String, String>,
        report: &mut CategoryReport,
    ) -> Result<(), String> {
        let existing = match self
            .github_client
            .get_custom_property_values(target.owner(), target.name())
            .await
        {
            Ok(values) => values,
            Err(e) => {
                warn!(target = %target, error = %e, "Could not read custom property values, assuming none");
                Vec::new()
            }
        };

        let changes = property_changes(properties, &existing);
        let desired_count = properties.values().filter(|v| !v.trim().is_empty()).count();
        let unchanged = desired_count - changes.len();

        if changes.is_empty() {
            info!(target = %target, unchanged = unchanged, "Custom properties already up to date");
            for _ in 0..unchanged {
                report.record_unchanged();
            }
            return Ok(());
        }

        let existing_names: BTreeSet<&str> =
            existing.iter().map(|p| p.property_name.as_str()).collect();
        let created = changes
            .iter()
            .filter(|c| !existing_names.contains(c.property_name.as_str()))
            .count();

        info!(target = %target, count = changes.len(), "Updating custom properties");
        self.github_client
            .update_custom_property_values(
                target.owner(),
                target.name(),
                &CustomPropertiesPayload::new(changes.clone()),
            )
            .await
            .map_err(|e| e.to_string())?;

        for _ in 0..unchanged {
            report.record_unchanged();
        }
        for _ in 0..created {
            report.record_created();
        }
        for _ in created..changes.len() {
            report.record_updated();
        }

        Ok(())
    }

    async fn apply_topics(
        &self,
        target: &Target,
        properties: &BTreeMap<String, String>,
        report: &mut CategoryReport,
    ) {
        let desired = topic_tokens(properties);
        if desired.is_empty() {
            debug!(target = %target, "No topics derived from custom properties");
            return;
        }

        let current = match self
            .github_client
            .get_topics(target.owner(), target.name())
            .await
        {
            Ok(topics) => Some(topics.into_iter().collect::<BTreeSet<_>>()),
            Err(e) => {
                warn!(target = %target, error = %e, "Could not read topics");
                None
            }
        };

        if current.as_ref() == Some(&desired) {
            info!(target = %target, "Topics already up to date");
            report.record_unchanged();
            return;
        }

        let names: Vec<String> = desired.into_iter().collect();
        match self
            .github_client
            .replace_topics(target.owner(), target.name(), &names)
            .await
        {
            Ok(()) => {
                info!(target = %target, count = names.len(), "Topics replaced");
                match current {
                    Some(topics) if !topics.is_empty() => report.record_updated(),
                    _ => report.record_created(),
                }
            }
            Err(e) => {
                warn!(target = %target, error = %e, "Could not replace topics");
                report.record_failure(TOPICS_SUBJECT, e.to_string());
            }
        }
    }
}
