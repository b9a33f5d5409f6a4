use crate::error::{Error, Result};
use crate::ident::{BASE_SEPARATOR, CATALOG_SEPARATOR};

const MAX_NAME_LEN: usize = 255;

fn validate_segment(segment: &str, entity: &str) -> Result<()> {
    if segment.len() > MAX_NAME_LEN {
        return Err(Error::InvalidName(format!(
            "{entity} cannot exceed {MAX_NAME_LEN} characters"
        )));
    }

    if segment.contains([CATALOG_SEPARATOR, BASE_SEPARATOR, '/']) {
        return Err(Error::InvalidName(format!(
            "{entity} '{segment}' cannot contain '{CATALOG_SEPARATOR}', '{BASE_SEPARATOR}' or '/'"
        )));
    }

    if segment.chars().any(char::is_control) {
        return Err(Error::InvalidName(format!(
            "{entity} contains control characters"
        )));
    }

    Ok(())
}

pub fn validate_catalog_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::InvalidName("Catalog name cannot be empty".to_string()));
    }
    validate_segment(name, "Catalog name")
}

pub fn validate_folder_name(folder: &str) -> Result<()> {
    if folder.trim().is_empty() {
        return Err(Error::InvalidName("Template folder cannot be empty".to_string()));
    }
    validate_segment(folder, "Template folder")
}

/// An empty base is valid and means the template is not a variant.
pub fn validate_base(base: &str) -> Result<()> {
    validate_segment(base, "Template base")
}
