//! Catalog manifests: the write path that fills the registry.
//!
//! A manifest is one YAML document describing a catalog and its templates.
//! Importing it replaces whatever templates the catalog held before, the same
//! way a repository sync would.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::descriptor::{self, scalar_or_empty};
use crate::error::{Error, Result};
use crate::ident::{template_id, version_id_in};
use crate::resolve;
use crate::store::{Store, names};
use crate::types::{Catalog, Template, Version};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CatalogManifest {
    pub name: String,
    pub url: String,
    pub branch: String,
    pub commit: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub templates: Vec<TemplateManifest>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TemplateManifest {
    pub folder: String,
    pub base: String,
    pub name: String,
    pub is_system: bool,
    pub description: String,
    #[serde(deserialize_with = "scalar_or_empty")]
    pub default_version: String,
    pub path: String,
    pub maintainer: String,
    pub license: String,
    pub project_url: String,
    pub upgrade_from: String,
    pub categories: Vec<String>,
    pub labels: BTreeMap<String, String>,
    /// Icon file, relative to the manifest.
    pub icon: Option<PathBuf>,
    /// Readme file, relative to the manifest.
    pub readme: Option<PathBuf>,
    pub versions: Vec<VersionManifest>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct VersionManifest {
    #[serde(deserialize_with = "scalar_or_empty")]
    pub version: String,
    pub revision: Option<i64>,
    #[serde(deserialize_with = "scalar_or_empty")]
    pub minimum_platform_version: String,
    #[serde(deserialize_with = "scalar_or_empty")]
    pub maximum_platform_version: String,
    pub upgrade_from: String,
    pub readme: Option<PathBuf>,
    pub files: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSummary {
    pub catalog_id: String,
    pub templates: usize,
    pub versions: usize,
    pub replaced: usize,
}

impl CatalogManifest {
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&content)?)
    }

    /// Checks names and version identifiers before anything is written.
    pub fn validate(&self) -> Result<()> {
        names::validate_catalog_name(&self.name)?;

        let mut template_ids = HashSet::new();
        for template in &self.templates {
            names::validate_folder_name(&template.folder)?;
            names::validate_base(&template.base)?;

            let id = template_id(&self.name, &template.base, &template.folder);
            if !template_ids.insert(id.clone()) {
                return Err(Error::AmbiguousIdentifier(format!(
                    "template '{id}' is defined twice"
                )));
            }

            let mut version_ids = HashSet::new();
            for version in &template.versions {
                if version.version.is_empty() {
                    return Err(Error::Parse(format!(
                        "template '{id}' has a version without a label"
                    )));
                }
                let vid = version_id_in(&id, &version.version, version.revision);
                if !version_ids.insert(vid.clone()) {
                    return Err(Error::AmbiguousIdentifier(format!(
                        "version '{vid}' is defined twice; give the versions distinct revisions"
                    )));
                }
            }
        }
        Ok(())
    }
}

fn read_blob(store: &dyn Store, base_dir: &Path, path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => {
            let data = fs::read(base_dir.join(path))?;
            store.put_blob(&data)
        }
        None => Ok(String::new()),
    }
}

/// Fills empty platform bounds and upgrade range from the version's own
/// descriptor file. A descriptor that fails to parse is left for the API to
/// report when the version is requested.
fn apply_descriptor_defaults(version: &mut Version) {
    let info = match descriptor::catalog_info(&version.files) {
        Ok(Some(info)) => info,
        Ok(None) => return,
        Err(e) => {
            warn!("Ignoring descriptor of version {}: {}", version.version, e);
            return;
        }
    };
    if version.minimum_platform_version.is_empty() {
        version.minimum_platform_version = info.minimum_platform_version;
    }
    if version.maximum_platform_version.is_empty() {
        version.maximum_platform_version = info.maximum_platform_version;
    }
    if version.upgrade_from.is_empty() {
        version.upgrade_from = info.upgrade_from;
    }
}

fn build_template(
    store: &dyn Store,
    catalog: &Catalog,
    manifest: &TemplateManifest,
    base_dir: &Path,
) -> Result<Template> {
    let template_row_id = Uuid::new_v4().to_string();

    let mut versions = Vec::with_capacity(manifest.versions.len());
    for v in &manifest.versions {
        let mut version = Version {
            id: Uuid::new_v4().to_string(),
            template_id: template_row_id.clone(),
            version: v.version.clone(),
            revision: v.revision,
            minimum_platform_version: v.minimum_platform_version.clone(),
            maximum_platform_version: v.maximum_platform_version.clone(),
            upgrade_from: v.upgrade_from.clone(),
            readme: read_blob(store, base_dir, v.readme.as_deref())?,
            files: v.files.clone(),
        };
        apply_descriptor_defaults(&mut version);
        versions.push(version);
    }

    let icon_filename = manifest
        .icon
        .as_deref()
        .and_then(Path::file_name)
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    Ok(Template {
        id: template_row_id,
        catalog_id: catalog.id.clone(),
        environment_id: catalog.environment_id.clone(),
        catalog_name: catalog.name.clone(),
        name: if manifest.name.is_empty() {
            manifest.folder.clone()
        } else {
            manifest.name.clone()
        },
        is_system: manifest.is_system,
        description: manifest.description.clone(),
        default_version: manifest.default_version.clone(),
        path: manifest.path.clone(),
        maintainer: manifest.maintainer.clone(),
        license: manifest.license.clone(),
        project_url: manifest.project_url.clone(),
        upgrade_from: manifest.upgrade_from.clone(),
        folder_name: manifest.folder.clone(),
        base: manifest.base.clone(),
        icon: read_blob(store, base_dir, manifest.icon.as_deref())?,
        icon_filename,
        readme: read_blob(store, base_dir, manifest.readme.as_deref())?,
        categories: manifest.categories.clone(),
        labels: manifest.labels.clone(),
        versions,
    })
}

/// Writes the manifest's catalog into `environment_id`, replacing the
/// templates of an existing catalog with the same name in that scope.
/// Relative icon and readme paths resolve against `base_dir`.
pub fn import(
    store: &dyn Store,
    manifest: &CatalogManifest,
    environment_id: &str,
    base_dir: &Path,
) -> Result<ImportSummary> {
    manifest.validate()?;

    let now = Utc::now();
    let existing = store
        .find_catalog(environment_id, &manifest.name)?
        .filter(|c| c.environment_id == environment_id);

    let catalog = match existing {
        Some(mut catalog) => {
            catalog.url = manifest.url.clone();
            catalog.branch = manifest.branch.clone();
            catalog.commit = manifest.commit.clone();
            catalog.kind = manifest.kind.clone();
            catalog.updated_at = now;
            catalog
        }
        None => Catalog {
            id: Uuid::new_v4().to_string(),
            environment_id: environment_id.to_string(),
            name: manifest.name.clone(),
            url: manifest.url.clone(),
            branch: manifest.branch.clone(),
            commit: manifest.commit.clone(),
            kind: manifest.kind.clone(),
            created_at: now,
            updated_at: now,
        },
    };

    // Every file is read before the first write, so a missing icon or
    // readme leaves the stored catalog untouched.
    let templates = manifest
        .templates
        .iter()
        .map(|t| build_template(store, &catalog, t, base_dir))
        .collect::<Result<Vec<_>>>()?;

    let replaced = store.sync_catalog(&catalog, &templates)?;

    let mut versions = 0;
    for template in &templates {
        versions += template.versions.len();
        if !template.default_version.is_empty()
            && resolve::default_version_id(&catalog.name, template).is_none()
        {
            warn!(
                "Template {} declares default version {} which it does not publish",
                template_id(&catalog.name, &template.base, &template.folder_name),
                template.default_version
            );
        }
    }

    info!(
        "Imported catalog '{}' into {} ({} templates, {} versions, {} replaced)",
        catalog.name,
        environment_id,
        manifest.templates.len(),
        versions,
        replaced
    );

    Ok(ImportSummary {
        catalog_id: catalog.id,
        templates: manifest.templates.len(),
        versions,
        replaced,
    })
}
