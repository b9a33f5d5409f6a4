//! External identifiers for templates and versions.
//!
//! A template ID is `catalog:folder`, or `catalog:base*folder` for a variant
//! template. A version ID appends `:revision` when the version carries one,
//! else `:label`. Catalog names, bases and folders never contain `:` or `*`
//! (enforced on write by [`crate::store::names`]), which keeps these IDs
//! reversible by [`parse_resource_id`].

use crate::error::{Error, Result};
use crate::types::{Template, Version};

pub const CATALOG_SEPARATOR: char = ':';
pub const BASE_SEPARATOR: char = '*';

pub fn template_id(catalog_name: &str, base: &str, folder: &str) -> String {
    if base.is_empty() {
        format!("{catalog_name}{CATALOG_SEPARATOR}{folder}")
    } else {
        format!("{catalog_name}{CATALOG_SEPARATOR}{base}{BASE_SEPARATOR}{folder}")
    }
}

pub fn template_id_for(catalog_name: &str, template: &Template) -> String {
    template_id(catalog_name, &template.base, &template.folder_name)
}

pub fn version_id(catalog_name: &str, template: &Template, version: &Version) -> String {
    version_id_in(
        &template_id_for(catalog_name, template),
        &version.version,
        version.revision,
    )
}

/// Appends the version part to an already built template ID: the revision
/// when there is one, else the label.
pub fn version_id_in(template_id: &str, label: &str, revision: Option<i64>) -> String {
    match revision {
        Some(revision) => format!("{template_id}{CATALOG_SEPARATOR}{revision}"),
        None => format!("{template_id}{CATALOG_SEPARATOR}{label}"),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateRef {
    pub catalog: String,
    pub base: String,
    pub folder: String,
}

impl TemplateRef {
    #[must_use]
    pub fn id(&self) -> String {
        template_id(&self.catalog, &self.base, &self.folder)
    }
}

/// A version reference inside a template: either a revision number or a
/// version label, as written by [`version_id`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRef {
    pub template: TemplateRef,
    pub version: String,
}

impl VersionRef {
    /// The reference read as a revision number, if [`version_id`] could
    /// have written it that way. `05` or `+5` are labels, never revision 5.
    #[must_use]
    pub fn revision(&self) -> Option<i64> {
        self.version
            .parse::<i64>()
            .ok()
            .filter(|rev| rev.to_string() == self.version)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceId {
    Template(TemplateRef),
    Version(VersionRef),
}

impl ResourceId {
    #[must_use]
    pub fn template(&self) -> &TemplateRef {
        match self {
            Self::Template(t) => t,
            Self::Version(v) => &v.template,
        }
    }
}

/// Splits an ID produced by [`template_id`] or [`version_id`] back into its
/// parts. Everything after the second `:` is the version part, so version
/// labels may themselves contain `:`.
pub fn parse_resource_id(id: &str) -> Result<ResourceId> {
    let mut parts = id.splitn(3, CATALOG_SEPARATOR);
    let catalog = parts.next().unwrap_or_default();
    let middle = parts
        .next()
        .ok_or_else(|| Error::Parse(format!("identifier '{id}' has no template part")))?;
    let version = parts.next();

    if catalog.is_empty() {
        return Err(Error::Parse(format!("identifier '{id}' has no catalog")));
    }

    let (base, folder) = match middle.split_once(BASE_SEPARATOR) {
        Some((base, folder)) => (base, folder),
        None => ("", middle),
    };
    if folder.is_empty() {
        return Err(Error::Parse(format!("identifier '{id}' has no folder")));
    }

    let template = TemplateRef {
        catalog: catalog.to_string(),
        base: base.to_string(),
        folder: folder.to_string(),
    };

    match version {
        None => Ok(ResourceId::Template(template)),
        Some("") => Err(Error::Parse(format!("identifier '{id}' has an empty version"))),
        Some(version) => Ok(ResourceId::Version(VersionRef {
            template,
            version: version.to_string(),
        })),
    }
}
