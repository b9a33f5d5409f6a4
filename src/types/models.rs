use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Scope value whose catalogs are visible to every environment.
pub const GLOBAL_SCOPE: &str = "global";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(skip)]
    pub id: String,
    pub environment_id: String,
    pub name: String,
    pub url: String,
    pub branch: String,
    pub commit: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Catalog {
    #[must_use]
    pub fn is_global(&self) -> bool {
        self.environment_id == GLOBAL_SCOPE
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Template {
    #[serde(skip)]
    pub id: String,
    #[serde(skip)]
    pub catalog_id: String,
    pub environment_id: String,
    pub catalog_name: String,
    pub name: String,
    pub is_system: bool,
    pub description: String,
    pub default_version: String,
    pub path: String,
    pub maintainer: String,
    pub license: String,
    pub project_url: String,
    pub upgrade_from: String,
    pub folder_name: String,
    #[serde(rename = "template_base")]
    pub base: String,
    /// Blob digest of the icon, empty when the template has none.
    #[serde(skip)]
    pub icon: String,
    pub icon_filename: String,
    /// Blob digest of the readme, empty when the template has none.
    #[serde(skip)]
    pub readme: String,
    pub categories: Vec<String>,
    pub labels: BTreeMap<String, String>,
    #[serde(skip)]
    pub versions: Vec<Version>,
}

impl Template {
    #[must_use]
    pub fn has_category(&self, category: &str) -> bool {
        self.categories.iter().any(|c| c == category)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Version {
    #[serde(skip)]
    pub id: String,
    #[serde(skip)]
    pub template_id: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revision: Option<i64>,
    pub minimum_platform_version: String,
    pub maximum_platform_version: String,
    pub upgrade_from: String,
    #[serde(skip)]
    pub readme: String,
    #[serde(skip)]
    pub files: BTreeMap<String, String>,
}
