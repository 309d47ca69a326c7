//! GitHub custom property and topic API types.
//!
//! Custom properties are organization defined key/value metadata attached to a
//! repository. Topics are the free-form tag list used when an owner does not
//! support custom properties.
//!
//! See: https://docs.github.com/en/rest/repos/custom-properties

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::{Error, GitHubClient, Verb};

#[cfg(test)]
#[path = "properties_tests.rs"]
mod tests;

/// A custom property defined in an organization's schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyDefinition {
    /// The name of the property
    pub property_name: String,
    /// The value type (`string`, `single_select`, `multi_select`, `true_false`)
    #[serde(default)]
    pub value_type: Option<String>,
}

/// A custom property value set on a repository.
///
/// GitHub reports values as a string, a list of strings (multi select) or `null`.
///
/// # Examples
///
/// ```
/// use github_client::CustomPropertyValue;
///
/// let value = CustomPropertyValue::new("Team", "Platform");
/// assert_eq!(value.value_as_string().as_deref(), Some("Platform"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomPropertyValue {
    /// The name of the property
    pub property_name: String,
    /// The value of the property
    pub value: serde_json::Value,
}

impl CustomPropertyValue {
    /// Create a string valued property.
    pub fn new(property_name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            property_name: property_name.into(),
            value: serde_json::Value::String(value.into()),
        }
    }

    /// Returns the value rendered as a string; `None` when the property is unset.
    ///
    /// Multi select values are joined with commas.
    pub fn value_as_string(&self) -> Option<String> {
        match &self.value {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Array(items) => Some(
                items
                    .iter()
                    .filter_map(|i| i.as_str())
                    .collect::<Vec<_>>()
                    .join(","),
            ),
            other => Some(other.to_string()),
        }
    }
}

/// Payload for `PATCH /repos/{owner}/{repo}/properties/values`.
///
/// Only the properties listed are changed; properties absent from the list keep
/// their current value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomPropertiesPayload {
    /// Property values to set on the repository.
    pub properties: Vec<CustomPropertyValue>,
}

impl CustomPropertiesPayload {
    /// Create a new custom properties payload from a list of properties.
    pub fn new(properties: Vec<CustomPropertyValue>) -> Self {
        Self { properties }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct TopicNames {
    names: Vec<String>,
}

impl GitHubClient {
    /// Fetches the custom property schema of an organization.
    ///
    /// `Ok(None)` means the organization has no custom properties configured (HTTP 404).
    #[instrument(skip(self), fields(org = %org))]
    pub async fn get_organization_property_schema(
        &self,
        org: &str,
    ) -> Result<Option<Vec<PropertyDefinition>>, Error> {
        self.get_optional(&format!("/orgs/{}/properties/schema", org))
            .await
    }

    /// Lists the custom property values of a repository.
    ///
    /// A repository without property support (HTTP 404) has no values.
    #[instrument(skip(self), fields(owner = %owner, repo = %repo))]
    pub async fn get_custom_property_values(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<Vec<CustomPropertyValue>, Error> {
        let values = self
            .get_optional(&format!("/repos/{}/{}/properties/values", owner, repo))
            .await?;
        Ok(values.unwrap_or_default())
    }

    /// Creates or updates the listed custom property values in one batch.
    #[instrument(skip(self, payload), fields(owner = %owner, repo = %repo, count = payload.properties.len()))]
    pub async fn update_custom_property_values(
        &self,
        owner: &str,
        repo: &str,
        payload: &CustomPropertiesPayload,
    ) -> Result<(), Error> {
        let path = format!("/repos/{}/{}/properties/values", owner, repo);
        self.write(Verb::Patch, &path, Some(payload)).await
    }

    /// Lists the topics of a repository.
    #[instrument(skip(self), fields(owner = %owner, repo = %repo))]
    pub async fn get_topics(&self, owner: &str, repo: &str) -> Result<Vec<String>, Error> {
        let topics: TopicNames = self
            .get_required(&format!("/repos/{}/{}/topics", owner, repo))
            .await?;
        Ok(topics.names)
    }

    /// Replaces the complete topic list of a repository.
    #[instrument(skip(self, names), fields(owner = %owner, repo = %repo, count = names.len()))]
    pub async fn replace_topics(
        &self,
        owner: &str,
        repo: &str,
        names: &[String],
    ) -> Result<(), Error> {
        let path = format!("/repos/{}/{}/topics", owner, repo);
        let body = TopicNames {
            names: names.to_vec(),
        };
        self.write(Verb::Put, &path, Some(&body)).await
    }
}
