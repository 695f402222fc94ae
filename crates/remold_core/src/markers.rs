//! Built-in marker types.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use remold_tree::{Marker, MarkerPolicy};
use serde::{Deserialize, Serialize};

/// What a document is, independent of its syntax.
///
/// Attached to documents by whoever loads them; recipes gate on it with
/// [`has_role`](crate::precondition::has_role).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SourceRole {
    /// Project settings (plugin management, included modules).
    Settings,
    /// Build script of a single module.
    Build,
    Other(String),
}

impl SourceRole {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Settings => "settings",
            Self::Build => "build",
            Self::Other(name) => name,
        }
    }
}

impl From<String> for SourceRole {
    fn from(value: String) -> Self {
        match value.as_str() {
            "settings" => Self::Settings,
            "build" => Self::Build,
            _ => Self::Other(value),
        }
    }
}

impl From<SourceRole> for String {
    fn from(role: SourceRole) -> Self {
        role.as_str().to_string()
    }
}

impl FromStr for SourceRole {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s.to_string()))
    }
}

impl fmt::Display for SourceRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Marker for SourceRole {}

/// Plugin repositories a settings document can resolve plugins from, with
/// the versions each plugin has published there.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginRepositories {
    /// Repository names or URLs, in lookup order.
    #[serde(default)]
    pub repositories: Vec<String>,
    /// Plugin id -> published versions.
    #[serde(default)]
    pub versions: BTreeMap<String, Vec<String>>,
}

impl PluginRepositories {
    pub fn new(repositories: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            repositories: repositories.into_iter().map(Into::into).collect(),
            versions: BTreeMap::new(),
        }
    }

    /// Adds published versions for `plugin_id`.
    pub fn with_versions(
        mut self,
        plugin_id: impl Into<String>,
        versions: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.versions
            .entry(plugin_id.into())
            .or_default()
            .extend(versions.into_iter().map(Into::into));
        self
    }

    /// Published versions of `plugin_id`, empty if unknown.
    pub fn versions_of(&self, plugin_id: &str) -> &[String] {
        self.versions
            .get(plugin_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

impl Marker for PluginRepositories {}

/// A search hit attached to a node. Several hits may coexist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl SearchResult {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

impl Marker for SearchResult {
    fn policy(&self) -> MarkerPolicy {
        MarkerPolicy::Append
    }
}
