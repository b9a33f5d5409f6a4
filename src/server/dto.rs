use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::descriptor::Question;
use crate::types::{Catalog, Template, Version};

#[derive(Debug, Default, Deserialize)]
pub struct ListTemplatesParams {
    #[serde(default)]
    pub catalog: Option<String>,
    /// Comma separated; a template matches when it has any of them.
    #[serde(default)]
    pub category: Option<String>,
    /// Comma separated; a template is dropped when it has any of them.
    #[serde(default, rename = "categoryNe")]
    pub category_ne: Option<String>,
    #[serde(default, rename = "platformVersion")]
    pub platform_version: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PlatformParams {
    #[serde(default, rename = "platformVersion")]
    pub platform_version: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CheckConstraintRequest {
    pub version: String,
    pub range: String,
}

#[derive(Debug, Serialize)]
pub struct CheckConstraintResponse {
    pub satisfies: bool,
}

#[derive(Debug, Serialize)]
pub struct CatalogResource {
    pub id: String,
    pub links: BTreeMap<String, String>,
    #[serde(flatten)]
    pub catalog: Catalog,
}

#[derive(Debug, Serialize)]
pub struct TemplateResource {
    pub id: String,
    pub links: BTreeMap<String, String>,
    pub version_links: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_template_version_id: Option<String>,
    #[serde(flatten)]
    pub template: Template,
}

#[derive(Debug, Serialize)]
pub struct TemplateVersionResource {
    pub id: String,
    pub template_id: String,
    pub links: BTreeMap<String, String>,
    pub files: BTreeMap<String, String>,
    pub questions: Vec<Question>,
    pub upgrade_version_links: BTreeMap<String, String>,
    #[serde(flatten)]
    pub version: Version,
}
