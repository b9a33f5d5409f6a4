pub mod names;
mod schema;
mod sqlite;

pub use sqlite::SqliteStore;

use crate::error::Result;
use crate::types::*;

/// Filters for [`Store::list_templates`]. Empty fields do not filter.
#[derive(Debug, Clone, Default)]
pub struct TemplateFilter {
    pub catalog: Option<String>,
    /// Keep templates tagged with at least one of these.
    pub categories: Vec<String>,
    /// Drop templates tagged with any of these.
    pub categories_ne: Vec<String>,
}

impl TemplateFilter {
    /// Applies the same rules as the SQL query to an already loaded template.
    #[must_use]
    pub fn matches(&self, template: &Template) -> bool {
        if let Some(catalog) = self.catalog.as_deref().filter(|c| !c.is_empty()) {
            if template.catalog_name != catalog {
                return false;
            }
        }
        if !self.categories.is_empty()
            && !self.categories.iter().any(|c| template.has_category(c))
        {
            return false;
        }
        !self.categories_ne.iter().any(|c| template.has_category(c))
    }
}

/// Store defines the catalog registry.
///
/// Every read takes the caller's environment and sees that environment's
/// catalogs plus the global ones. A template is visible exactly when its
/// catalog is.
pub trait Store: Send + Sync {
    fn initialize(&self) -> Result<()>;

    // Catalog operations
    fn create_catalog(&self, catalog: &Catalog) -> Result<()>;
    fn update_catalog(&self, catalog: &Catalog) -> Result<()>;
    /// Returns the environment's own catalog if present, else the global one.
    fn find_catalog(&self, environment_id: &str, name: &str) -> Result<Option<Catalog>>;
    fn list_catalogs(&self, environment_id: &str) -> Result<Vec<Catalog>>;
    /// Deletes the catalog owned by exactly this environment, with its templates.
    fn delete_catalog(&self, environment_id: &str, name: &str) -> Result<bool>;

    // Template operations
    /// Inserts the template with its categories, labels, versions and files.
    fn create_template(&self, template: &Template) -> Result<()>;
    fn delete_catalog_templates(&self, catalog_id: &str) -> Result<usize>;
    /// Writes the catalog (inserting or updating it by ID) and replaces its
    /// templates with `templates`, all in one transaction. Returns how many
    /// templates were replaced.
    fn sync_catalog(&self, catalog: &Catalog, templates: &[Template]) -> Result<usize>;
    fn find_template(
        &self,
        environment_id: &str,
        catalog_name: &str,
        folder_name: &str,
        base: &str,
    ) -> Result<Option<Template>>;
    fn list_templates(&self, environment_id: &str, filter: &TemplateFilter)
    -> Result<Vec<Template>>;

    // Blob operations
    /// Stores bytes under their sha256 digest and returns the digest.
    fn put_blob(&self, data: &[u8]) -> Result<String>;
    fn get_blob(&self, digest: &str) -> Result<Option<Vec<u8>>>;
}
