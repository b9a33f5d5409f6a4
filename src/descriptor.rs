//! Template descriptor files.
//!
//! A version's files may carry a `rancher-compose.yml` with a `.catalog`
//! section, or a standalone `template-version.yml`. Both describe the same
//! metadata, most importantly the questions shown to a user at install time.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, Result};

pub const RANCHER_COMPOSE_FILE: &str = "rancher-compose.yml";
pub const TEMPLATE_VERSION_FILE: &str = "template-version.yml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Question {
    pub variable: String,
    pub label: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub required: bool,
    #[serde(deserialize_with = "scalar_as_string")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    pub group: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<i64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    pub valid_chars: String,
    pub invalid_chars: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CatalogInfo {
    pub name: String,
    #[serde(deserialize_with = "scalar_or_empty")]
    pub version: String,
    pub description: String,
    #[serde(alias = "minimum_rancher_version", deserialize_with = "scalar_or_empty")]
    pub minimum_platform_version: String,
    #[serde(alias = "maximum_rancher_version", deserialize_with = "scalar_or_empty")]
    pub maximum_platform_version: String,
    pub upgrade_from: String,
    pub questions: Vec<Question>,
}

#[derive(Debug, Default, Deserialize)]
struct RancherCompose {
    #[serde(rename = ".catalog", default)]
    catalog: Option<CatalogInfo>,
}

/// YAML authors write `default: 3306` or `version: 1.0` as often as quoted
/// strings; keep scalars as their textual form.
pub(crate) fn scalar_as_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_yaml::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_yaml::Value::Null => None,
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::String(s) => Some(s),
        other => serde_yaml::to_string(&other)
            .ok()
            .map(|s| s.trim().to_string()),
    })
}

pub(crate) fn scalar_or_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(scalar_as_string(deserializer)?.unwrap_or_default())
}

fn parse_yaml<T: for<'de> Deserialize<'de> + Default>(file: &str, contents: &str) -> Result<T> {
    if contents.trim().is_empty() {
        return Ok(T::default());
    }
    serde_yaml::from_str(contents).map_err(|e| Error::Parse(format!("{file}: {e}")))
}

impl CatalogInfo {
    pub fn from_rancher_compose(contents: &str) -> Result<Self> {
        let compose: RancherCompose = parse_yaml(RANCHER_COMPOSE_FILE, contents)?;
        Ok(compose.catalog.unwrap_or_default())
    }

    pub fn from_template_version(contents: &str) -> Result<Self> {
        parse_yaml(TEMPLATE_VERSION_FILE, contents)
    }
}

/// Reads the catalog metadata from a version's files, preferring
/// `rancher-compose.yml` over `template-version.yml`.
pub fn catalog_info(files: &BTreeMap<String, String>) -> Result<Option<CatalogInfo>> {
    if let Some(contents) = files.get(RANCHER_COMPOSE_FILE) {
        return CatalogInfo::from_rancher_compose(contents).map(Some);
    }
    if let Some(contents) = files.get(TEMPLATE_VERSION_FILE) {
        return CatalogInfo::from_template_version(contents).map(Some);
    }
    Ok(None)
}

pub fn questions_for(files: &BTreeMap<String, String>) -> Result<Vec<Question>> {
    Ok(catalog_info(files)?
        .map(|info| info.questions)
        .unwrap_or_default())
}
