//! Version visibility and upgrade-path resolution.
//!
//! Everything here is a pure function over already loaded templates. Empty
//! results are ordinary outcomes: a template may have no installable
//! versions, no default, or nothing to upgrade to.

use std::collections::BTreeMap;

use crate::error::Result;
use crate::ident::{VersionRef, version_id};
use crate::links::{LinkBuilder, ResourceKind};
use crate::types::{Template, Version};
use crate::version;

/// Reports whether `version` can be installed on `platform_version`.
pub fn is_installable(version: &Version, platform_version: &str) -> bool {
    version::between(
        &version.minimum_platform_version,
        platform_version,
        &version.maximum_platform_version,
    )
}

pub fn installable_versions<'a>(template: &'a Template, platform_version: &str) -> Vec<&'a Version> {
    template
        .versions
        .iter()
        .filter(|v| is_installable(v, platform_version))
        .collect()
}

/// Maps each installable version label to a link to that version. When two
/// versions share a label the later one wins.
pub fn version_links(
    catalog_name: &str,
    template: &Template,
    platform_version: &str,
    links: &dyn LinkBuilder,
) -> BTreeMap<String, String> {
    labelled_links(
        catalog_name,
        template,
        installable_versions(template, platform_version),
        links,
    )
}

/// The ID of the version whose label equals the template's default version.
pub fn default_version_id(catalog_name: &str, template: &Template) -> Option<String> {
    template
        .versions
        .iter()
        .rev()
        .find(|v| v.version == template.default_version)
        .map(|v| version_id(catalog_name, template, v))
}

/// Decides whether `candidate` is offered as an upgrade from `current`.
///
/// The candidate must be strictly newer, installable on the platform, and,
/// when it declares an upgrade-from range, `current` must satisfy it. A
/// malformed range disqualifies the candidate only.
pub fn is_upgrade_target(current: &Version, candidate: &Version, platform_version: &str) -> bool {
    if !version::greater_than(&candidate.version, &current.version) {
        return false;
    }
    if !is_installable(candidate, platform_version) {
        return false;
    }
    if candidate.upgrade_from.is_empty() {
        return true;
    }
    match version::satisfies_range(&current.version, &candidate.upgrade_from) {
        Ok(satisfied) => satisfied,
        Err(e) => {
            tracing::debug!(
                "Skipping upgrade candidate {}: bad upgrade_from '{}': {}",
                candidate.version,
                candidate.upgrade_from,
                e
            );
            false
        }
    }
}

pub fn upgrade_targets<'a>(
    template: &'a Template,
    current: &Version,
    platform_version: &str,
) -> Vec<&'a Version> {
    template
        .versions
        .iter()
        .filter(|candidate| is_upgrade_target(current, candidate, platform_version))
        .collect()
}

pub fn upgrade_links(
    catalog_name: &str,
    template: &Template,
    current: &Version,
    platform_version: &str,
    links: &dyn LinkBuilder,
) -> BTreeMap<String, String> {
    labelled_links(
        catalog_name,
        template,
        upgrade_targets(template, current, platform_version),
        links,
    )
}

fn labelled_links<'a>(
    catalog_name: &str,
    template: &Template,
    versions: impl IntoIterator<Item = &'a Version>,
    links: &dyn LinkBuilder,
) -> BTreeMap<String, String> {
    versions
        .into_iter()
        .map(|v| {
            let id = version_id(catalog_name, template, v);
            (v.version.clone(), links.link(ResourceKind::Template, &id))
        })
        .collect()
}

/// Dereferences the version part of a version ID. A numeric reference is
/// tried as a revision first, then every reference is tried as a label.
pub fn find_version<'a>(template: &'a Template, reference: &VersionRef) -> Option<&'a Version> {
    reference
        .revision()
        .and_then(|rev| template.versions.iter().find(|v| v.revision == Some(rev)))
        .or_else(|| {
            template
                .versions
                .iter()
                .rev()
                .find(|v| v.version == reference.version)
        })
}

/// Evaluates one version against one range on behalf of a caller, so a
/// malformed range is reported rather than swallowed.
pub fn check_constraint(version: &str, range: &str) -> Result<bool> {
    version::satisfies_range(version, range)
}
