use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter};
use sha2::{Digest, Sha256};

use super::schema::SCHEMA;
use super::{Store, TemplateFilter, names};
use crate::error::{Error, Result};
use crate::types::*;

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path)?;

        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "journal_mode", "WAL")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            // Handle SQLite's default datetime format: "YYYY-MM-DD HH:MM:SS"
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            tracing::error!("Invalid datetime in database: '{}' - {}", s, e);
            Utc::now()
        })
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

/// Builds `(?, ?, ...)` for an `IN` clause of the given size.
fn list_query(size: usize) -> String {
    format!("({})", vec!["?"; size].join(", "))
}

const CATALOG_COLUMNS: &str =
    "id, environment_id, name, url, branch, commit_sha, kind, created_at, updated_at";

fn catalog_from_row(row: &Row<'_>) -> rusqlite::Result<Catalog> {
    Ok(Catalog {
        id: row.get(0)?,
        environment_id: row.get(1)?,
        name: row.get(2)?,
        url: row.get(3)?,
        branch: row.get(4)?,
        commit: row.get(5)?,
        kind: row.get(6)?,
        created_at: parse_datetime(&row.get::<_, String>(7)?),
        updated_at: parse_datetime(&row.get::<_, String>(8)?),
    })
}

const TEMPLATE_COLUMNS: &str = "t.id, t.catalog_id, t.environment_id, c.name, t.name, t.is_system,
    t.description, t.default_version, t.path, t.maintainer, t.license, t.project_url,
    t.upgrade_from, t.folder_name, t.base, t.icon, t.icon_filename, t.readme";

fn template_from_row(row: &Row<'_>) -> rusqlite::Result<Template> {
    Ok(Template {
        id: row.get(0)?,
        catalog_id: row.get(1)?,
        environment_id: row.get(2)?,
        catalog_name: row.get(3)?,
        name: row.get(4)?,
        is_system: row.get(5)?,
        description: row.get(6)?,
        default_version: row.get(7)?,
        path: row.get(8)?,
        maintainer: row.get(9)?,
        license: row.get(10)?,
        project_url: row.get(11)?,
        upgrade_from: row.get(12)?,
        folder_name: row.get(13)?,
        base: row.get(14)?,
        icon: row.get(15)?,
        icon_filename: row.get(16)?,
        readme: row.get(17)?,
        categories: Vec::new(),
        labels: BTreeMap::new(),
        versions: Vec::new(),
    })
}

fn find_catalog_in(conn: &Connection, environment_id: &str, name: &str) -> Result<Option<Catalog>> {
    conn.query_row(
        &format!(
            "SELECT {CATALOG_COLUMNS} FROM catalogs
             WHERE name = ?2 AND (environment_id = ?1 OR environment_id = ?3)
             ORDER BY CASE WHEN environment_id = ?1 THEN 0 ELSE 1 END
             LIMIT 1"
        ),
        params![environment_id, name, GLOBAL_SCOPE],
        catalog_from_row,
    )
    .optional()
    .map_err(Error::from)
}

fn load_categories(conn: &Connection, template_id: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT cat.name FROM categories cat
         JOIN template_categories tc ON cat.id = tc.category_id
         WHERE tc.template_id = ?1
         ORDER BY cat.name",
    )?;
    let rows = stmt.query_map(params![template_id], |row| row.get::<_, String>(0))?;
    rows.collect::<std::result::Result<Vec<_>, _>>()
        .map_err(Error::from)
}

fn load_labels(conn: &Connection, template_id: &str) -> Result<BTreeMap<String, String>> {
    let mut stmt =
        conn.prepare("SELECT key, value FROM template_labels WHERE template_id = ?1")?;
    let rows = stmt.query_map(params![template_id], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
    })?;
    rows.collect::<std::result::Result<BTreeMap<_, _>, _>>()
        .map_err(Error::from)
}

fn load_versions(conn: &Connection, template_id: &str) -> Result<Vec<Version>> {
    let mut stmt = conn.prepare(
        "SELECT id, template_id, version, revision, minimum_platform_version,
                maximum_platform_version, upgrade_from, readme
         FROM versions WHERE template_id = ?1 ORDER BY position",
    )?;
    let rows = stmt.query_map(params![template_id], |row| {
        Ok(Version {
            id: row.get(0)?,
            template_id: row.get(1)?,
            version: row.get(2)?,
            revision: row.get(3)?,
            minimum_platform_version: row.get(4)?,
            maximum_platform_version: row.get(5)?,
            upgrade_from: row.get(6)?,
            readme: row.get(7)?,
            files: BTreeMap::new(),
        })
    })?;
    let mut versions = rows.collect::<std::result::Result<Vec<_>, _>>()?;

    let mut files_stmt =
        conn.prepare("SELECT name, contents FROM version_files WHERE version_id = ?1")?;
    for version in &mut versions {
        let files = files_stmt.query_map(params![version.id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        version.files = files.collect::<std::result::Result<BTreeMap<_, _>, _>>()?;
    }

    Ok(versions)
}

/// Fills categories, labels and versions.
fn load_children(conn: &Connection, template: &mut Template) -> Result<()> {
    template.categories = load_categories(conn, &template.id)?;
    template.labels = load_labels(conn, &template.id)?;
    template.versions = load_versions(conn, &template.id)?;
    Ok(())
}

fn insert_catalog(conn: &Connection, catalog: &Catalog) -> Result<()> {
    names::validate_catalog_name(&catalog.name)?;

    let result = conn.execute(
        "INSERT INTO catalogs (id, environment_id, name, url, branch, commit_sha, kind, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            catalog.id,
            catalog.environment_id,
            catalog.name,
            catalog.url,
            catalog.branch,
            catalog.commit,
            catalog.kind,
            format_datetime(&catalog.created_at),
            format_datetime(&catalog.updated_at),
        ],
    );

    match result {
        Ok(_) => Ok(()),
        Err(e) if is_constraint_violation(&e) => Err(Error::AlreadyExists),
        Err(e) => Err(Error::from(e)),
    }
}

fn update_catalog_row(conn: &Connection, catalog: &Catalog) -> Result<()> {
    let rows = conn.execute(
        "UPDATE catalogs SET url = ?1, branch = ?2, commit_sha = ?3, kind = ?4, updated_at = ?5
         WHERE id = ?6",
        params![
            catalog.url,
            catalog.branch,
            catalog.commit,
            catalog.kind,
            format_datetime(&catalog.updated_at),
            catalog.id
        ],
    )?;

    if rows == 0 {
        return Err(Error::NotFound);
    }
    Ok(())
}

fn insert_template(conn: &Connection, template: &Template) -> Result<()> {
    names::validate_folder_name(&template.folder_name)?;
    names::validate_base(&template.base)?;

    let result = conn.execute(
        "INSERT INTO templates (id, catalog_id, environment_id, name, is_system, description,
            default_version, path, maintainer, license, project_url, upgrade_from,
            folder_name, base, icon, icon_filename, readme)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
        params![
            template.id,
            template.catalog_id,
            template.environment_id,
            template.name,
            template.is_system,
            template.description,
            template.default_version,
            template.path,
            template.maintainer,
            template.license,
            template.project_url,
            template.upgrade_from,
            template.folder_name,
            template.base,
            template.icon,
            template.icon_filename,
            template.readme,
        ],
    );
    match result {
        Ok(_) => {}
        Err(e) if is_constraint_violation(&e) => return Err(Error::AlreadyExists),
        Err(e) => return Err(Error::from(e)),
    }

    for category in &template.categories {
        conn.execute(
            "INSERT OR IGNORE INTO categories (name) VALUES (?1)",
            params![category],
        )?;
        conn.execute(
            "INSERT OR IGNORE INTO template_categories (template_id, category_id)
             SELECT ?1, id FROM categories WHERE name = ?2",
            params![template.id, category],
        )?;
    }

    for (key, value) in &template.labels {
        conn.execute(
            "INSERT INTO template_labels (template_id, key, value) VALUES (?1, ?2, ?3)",
            params![template.id, key, value],
        )?;
    }

    for (position, version) in template.versions.iter().enumerate() {
        conn.execute(
            "INSERT INTO versions (id, template_id, position, version, revision,
                minimum_platform_version, maximum_platform_version, upgrade_from, readme)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                version.id,
                template.id,
                position as i64,
                version.version,
                version.revision,
                version.minimum_platform_version,
                version.maximum_platform_version,
                version.upgrade_from,
                version.readme,
            ],
        )?;
        for (name, contents) in &version.files {
            conn.execute(
                "INSERT INTO version_files (version_id, name, contents) VALUES (?1, ?2, ?3)",
                params![version.id, name, contents],
            )?;
        }
    }

    Ok(())
}

impl Store for SqliteStore {
    fn initialize(&self) -> Result<()> {
        self.conn().execute_batch(SCHEMA)?;
        Ok(())
    }

    // Catalog operations

    fn create_catalog(&self, catalog: &Catalog) -> Result<()> {
        insert_catalog(&self.conn(), catalog)
    }

    fn update_catalog(&self, catalog: &Catalog) -> Result<()> {
        update_catalog_row(&self.conn(), catalog)
    }

    fn find_catalog(&self, environment_id: &str, name: &str) -> Result<Option<Catalog>> {
        find_catalog_in(&self.conn(), environment_id, name)
    }

    fn list_catalogs(&self, environment_id: &str) -> Result<Vec<Catalog>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {CATALOG_COLUMNS} FROM catalogs
             WHERE environment_id = ?1 OR environment_id = ?2
             ORDER BY name, CASE WHEN environment_id = ?1 THEN 0 ELSE 1 END"
        ))?;

        let rows = stmt.query_map(params![environment_id, GLOBAL_SCOPE], catalog_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn delete_catalog(&self, environment_id: &str, name: &str) -> Result<bool> {
        let rows = self.conn().execute(
            "DELETE FROM catalogs WHERE environment_id = ?1 AND name = ?2",
            params![environment_id, name],
        )?;
        Ok(rows > 0)
    }

    // Template operations

    fn create_template(&self, template: &Template) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        insert_template(&tx, template)?;
        tx.commit()?;
        Ok(())
    }

    fn sync_catalog(&self, catalog: &Catalog, templates: &[Template]) -> Result<usize> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let exists = tx
            .query_row(
                "SELECT 1 FROM catalogs WHERE id = ?1",
                params![catalog.id],
                |_| Ok(()),
            )
            .optional()?
            .is_some();

        let replaced = if exists {
            update_catalog_row(&tx, catalog)?;
            tx.execute(
                "DELETE FROM templates WHERE catalog_id = ?1",
                params![catalog.id],
            )?
        } else {
            insert_catalog(&tx, catalog)?;
            0
        };

        for template in templates {
            insert_template(&tx, template)?;
        }

        tx.commit()?;
        Ok(replaced)
    }

    fn delete_catalog_templates(&self, catalog_id: &str) -> Result<usize> {
        let rows = self.conn().execute(
            "DELETE FROM templates WHERE catalog_id = ?1",
            params![catalog_id],
        )?;
        Ok(rows)
    }

    fn find_template(
        &self,
        environment_id: &str,
        catalog_name: &str,
        folder_name: &str,
        base: &str,
    ) -> Result<Option<Template>> {
        let conn = self.conn();
        let Some(catalog) = find_catalog_in(&conn, environment_id, catalog_name)? else {
            return Ok(None);
        };

        let template = conn
            .query_row(
                &format!(
                    "SELECT {TEMPLATE_COLUMNS}
                     FROM templates t JOIN catalogs c ON t.catalog_id = c.id
                     WHERE t.catalog_id = ?1 AND t.base = ?2 AND t.folder_name = ?3"
                ),
                params![catalog.id, base, folder_name],
                template_from_row,
            )
            .optional()?;

        match template {
            Some(mut template) => {
                load_children(&conn, &mut template)?;
                Ok(Some(template))
            }
            None => Ok(None),
        }
    }

    fn list_templates(
        &self,
        environment_id: &str,
        filter: &TemplateFilter,
    ) -> Result<Vec<Template>> {
        let mut query = format!(
            "SELECT {TEMPLATE_COLUMNS}
             FROM templates t JOIN catalogs c ON t.catalog_id = c.id
             WHERE (c.environment_id = ?
                    OR (c.environment_id = ? AND NOT EXISTS (
                        SELECT 1 FROM catalogs s
                        WHERE s.name = c.name AND s.environment_id = ?)))"
        );
        // A tenant catalog hides the global catalog of the same name.
        let mut args: Vec<&str> = vec![environment_id, GLOBAL_SCOPE, environment_id];

        if let Some(catalog) = filter.catalog.as_deref().filter(|c| !c.is_empty()) {
            query.push_str("\n AND c.name = ?");
            args.push(catalog);
        }
        if !filter.categories.is_empty() {
            query.push_str(&format!(
                "\n AND EXISTS (SELECT 1 FROM template_categories tc
                     JOIN categories cat ON cat.id = tc.category_id
                     WHERE tc.template_id = t.id AND cat.name IN {})",
                list_query(filter.categories.len())
            ));
            args.extend(filter.categories.iter().map(String::as_str));
        }
        if !filter.categories_ne.is_empty() {
            query.push_str(&format!(
                "\n AND NOT EXISTS (SELECT 1 FROM template_categories tc
                     JOIN categories cat ON cat.id = tc.category_id
                     WHERE tc.template_id = t.id AND cat.name IN {})",
                list_query(filter.categories_ne.len())
            ));
            args.extend(filter.categories_ne.iter().map(String::as_str));
        }
        query.push_str("\n ORDER BY c.name, t.base, t.folder_name");

        let conn = self.conn();
        let mut stmt = conn.prepare(&query)?;
        let rows = stmt.query_map(params_from_iter(args.iter()), template_from_row)?;
        let mut templates = rows.collect::<std::result::Result<Vec<_>, _>>()?;

        for template in &mut templates {
            load_children(&conn, template)?;
        }

        Ok(templates)
    }

    // Blob operations

    fn put_blob(&self, data: &[u8]) -> Result<String> {
        let digest = hex::encode(Sha256::digest(data));
        self.conn().execute(
            "INSERT OR IGNORE INTO blobs (digest, data) VALUES (?1, ?2)",
            params![digest, data],
        )?;
        Ok(digest)
    }

    fn get_blob(&self, digest: &str) -> Result<Option<Vec<u8>>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT data FROM blobs WHERE digest = ?1",
            params![digest],
            |row| row.get(0),
        )
        .optional()
        .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_store(temp: &TempDir) -> SqliteStore {
        let store = SqliteStore::new(temp.path().join("test.db")).unwrap();
        store.initialize().unwrap();
        store
    }

    fn catalog(id: &str, environment_id: &str, name: &str) -> Catalog {
        Catalog {
            id: id.to_string(),
            environment_id: environment_id.to_string(),
            name: name.to_string(),
            url: format!("https://git.example.com/{name}.git"),
            branch: "master".to_string(),
            commit: String::new(),
            kind: "git".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn template(id: &str, catalog: &Catalog, folder: &str, categories: &[&str]) -> Template {
        Template {
            id: id.to_string(),
            catalog_id: catalog.id.clone(),
            environment_id: catalog.environment_id.clone(),
            name: folder.to_string(),
            folder_name: folder.to_string(),
            categories: categories.iter().map(|c| c.to_string()).collect(),
            ..Default::default()
        }
    }

    fn list(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn folders(templates: &[Template]) -> Vec<&str> {
        templates.iter().map(|t| t.folder_name.as_str()).collect()
    }

    #[test]
    fn test_initialize_creates_tables() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);

        let conn = store.conn();
        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();

        for table in [
            "catalogs",
            "templates",
            "categories",
            "template_categories",
            "template_labels",
            "versions",
            "version_files",
            "blobs",
        ] {
            assert!(tables.contains(&table.to_string()), "missing {table}");
        }
    }

    #[test]
    fn test_find_catalog_prefers_environment() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);

        store
            .create_catalog(&catalog("cat-global", GLOBAL_SCOPE, "community"))
            .unwrap();
        store
            .create_catalog(&catalog("cat-a", "tenant-A", "community"))
            .unwrap();

        let found = store.find_catalog("tenant-A", "community").unwrap().unwrap();
        assert_eq!(found.id, "cat-a");

        let found = store.find_catalog("tenant-B", "community").unwrap().unwrap();
        assert_eq!(found.id, "cat-global");
        assert!(found.is_global());

        assert!(store.find_catalog("tenant-B", "missing").unwrap().is_none());
    }

    #[test]
    fn test_list_catalogs_is_union() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);

        store
            .create_catalog(&catalog("cat-global", GLOBAL_SCOPE, "library"))
            .unwrap();
        store
            .create_catalog(&catalog("cat-a", "tenant-A", "private"))
            .unwrap();
        store
            .create_catalog(&catalog("cat-b", "tenant-B", "other"))
            .unwrap();

        let names: Vec<String> = store
            .list_catalogs("tenant-A")
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["library", "private"]);
    }

    #[test]
    fn test_duplicate_catalog_rejected() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);

        store
            .create_catalog(&catalog("cat-1", "tenant-A", "library"))
            .unwrap();
        let result = store.create_catalog(&catalog("cat-2", "tenant-A", "library"));
        assert!(matches!(result, Err(Error::AlreadyExists)));
    }

    #[test]
    fn test_reserved_characters_rejected_on_write() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);

        let result = store.create_catalog(&catalog("cat-1", GLOBAL_SCOPE, "lib:rary"));
        assert!(matches!(result, Err(Error::InvalidName(_))));

        let lib = catalog("cat-2", GLOBAL_SCOPE, "library");
        store.create_catalog(&lib).unwrap();
        let mut bad = template("t-1", &lib, "mysql", &[]);
        bad.base = "infra*".to_string();
        assert!(matches!(
            store.create_template(&bad),
            Err(Error::InvalidName(_))
        ));
    }

    #[test]
    fn test_find_template_loads_children() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);
        let lib = catalog("cat-1", GLOBAL_SCOPE, "library");
        store.create_catalog(&lib).unwrap();

        let mut t = template("t-1", &lib, "mysql", &["database", "sql"]);
        t.base = "infra".to_string();
        t.labels.insert("io.example.tier".to_string(), "gold".to_string());
        t.versions = vec![
            Version {
                id: "v-1".to_string(),
                version: "5.6".to_string(),
                files: BTreeMap::from([(
                    "docker-compose.yml".to_string(),
                    "services: {}".to_string(),
                )]),
                ..Default::default()
            },
            Version {
                id: "v-2".to_string(),
                version: "5.7".to_string(),
                revision: Some(2),
                minimum_platform_version: "1.0".to_string(),
                ..Default::default()
            },
        ];
        store.create_template(&t).unwrap();

        let found = store
            .find_template("tenant-A", "library", "mysql", "infra")
            .unwrap()
            .unwrap();
        assert_eq!(found.catalog_name, "library");
        assert_eq!(found.categories, vec!["database", "sql"]);
        assert_eq!(found.labels["io.example.tier"], "gold");
        assert_eq!(found.versions.len(), 2);
        assert_eq!(found.versions[0].version, "5.6");
        assert_eq!(found.versions[0].files["docker-compose.yml"], "services: {}");
        assert_eq!(found.versions[1].revision, Some(2));

        assert!(
            store
                .find_template("tenant-A", "library", "mysql", "")
                .unwrap()
                .is_none()
        );
        assert!(
            store
                .find_template("tenant-A", "missing", "mysql", "infra")
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn test_list_templates_category_filters() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);
        let lib = catalog("cat-1", GLOBAL_SCOPE, "library");
        store.create_catalog(&lib).unwrap();

        for (id, folder, categories) in [
            ("t-1", "mysql", &["database"][..]),
            ("t-2", "mongo-old", &["database", "deprecated"][..]),
            ("t-3", "postgres", &["database", "sql", "web"][..]),
            ("t-4", "nginx", &["web"][..]),
            ("t-5", "plain", &[][..]),
        ] {
            store
                .create_template(&template(id, &lib, folder, categories))
                .unwrap();
        }

        let all = store
            .list_templates("tenant-A", &TemplateFilter::default())
            .unwrap();
        assert_eq!(all.len(), 5);

        let filter = TemplateFilter {
            categories: vec!["database".to_string()],
            categories_ne: vec!["deprecated".to_string()],
            ..Default::default()
        };
        let found = store.list_templates("tenant-A", &filter).unwrap();
        assert_eq!(folders(&found), vec!["mysql", "postgres"]);

        let filter = TemplateFilter {
            categories_ne: vec!["database".to_string()],
            ..Default::default()
        };
        let found = store.list_templates("tenant-A", &filter).unwrap();
        assert_eq!(folders(&found), vec!["nginx", "plain"]);

        let filter = TemplateFilter {
            categories: vec!["web".to_string(), "sql".to_string()],
            ..Default::default()
        };
        let found = store.list_templates("tenant-A", &filter).unwrap();
        assert_eq!(folders(&found), vec!["nginx", "postgres"]);
    }

    #[test]
    fn test_filter_matches_agrees_with_query() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);
        let lib = catalog("cat-1", GLOBAL_SCOPE, "library");
        let extra = catalog("cat-2", "tenant-A", "extra");
        store.create_catalog(&lib).unwrap();
        store.create_catalog(&extra).unwrap();

        for (id, c, folder, categories) in [
            ("t-1", &lib, "mysql", &["database"][..]),
            ("t-2", &lib, "mongo-old", &["database", "deprecated"][..]),
            ("t-3", &lib, "nginx", &["web"][..]),
            ("t-4", &lib, "plain", &[][..]),
            ("t-5", &extra, "cache", &["database", "web"][..]),
        ] {
            store
                .create_template(&template(id, c, folder, categories))
                .unwrap();
        }

        let all = store
            .list_templates("tenant-A", &TemplateFilter::default())
            .unwrap();

        for filter in [
            TemplateFilter::default(),
            TemplateFilter {
                categories: list(&["database"]),
                categories_ne: list(&["deprecated"]),
                ..Default::default()
            },
            TemplateFilter {
                categories_ne: list(&["web", "deprecated"]),
                ..Default::default()
            },
            TemplateFilter {
                catalog: Some("extra".to_string()),
                categories: list(&["web"]),
                ..Default::default()
            },
            TemplateFilter {
                catalog: Some("missing".to_string()),
                ..Default::default()
            },
        ] {
            let queried = store.list_templates("tenant-A", &filter).unwrap();
            let expected: Vec<&Template> = all.iter().filter(|t| filter.matches(t)).collect();
            assert_eq!(
                folders(&queried),
                expected
                    .iter()
                    .map(|t| t.folder_name.as_str())
                    .collect::<Vec<_>>(),
                "{filter:?}"
            );
        }
    }

    #[test]
    fn test_list_templates_scoping() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);
        let global = catalog("cat-g", GLOBAL_SCOPE, "library");
        let tenant_a = catalog("cat-a", "tenant-A", "private");
        let tenant_b = catalog("cat-b", "tenant-B", "private");
        for c in [&global, &tenant_a, &tenant_b] {
            store.create_catalog(c).unwrap();
        }
        store
            .create_template(&template("t-g", &global, "redis", &[]))
            .unwrap();
        store
            .create_template(&template("t-a", &tenant_a, "internal-a", &[]))
            .unwrap();
        store
            .create_template(&template("t-b", &tenant_b, "internal-b", &[]))
            .unwrap();

        let found = store
            .list_templates("tenant-A", &TemplateFilter::default())
            .unwrap();
        assert_eq!(folders(&found), vec!["redis", "internal-a"]);

        let filter = TemplateFilter {
            catalog: Some("private".to_string()),
            ..Default::default()
        };
        let found = store.list_templates("tenant-B", &filter).unwrap();
        assert_eq!(folders(&found), vec!["internal-b"]);
    }

    #[test]
    fn test_list_templates_hides_shadowed_global_catalog() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);
        let global = catalog("cat-g", GLOBAL_SCOPE, "library");
        let tenant = catalog("cat-a", "tenant-A", "library");
        store.create_catalog(&global).unwrap();
        store.create_catalog(&tenant).unwrap();

        let mut shared = template("t-g", &global, "mysql", &[]);
        shared.description = "global".to_string();
        store.create_template(&shared).unwrap();
        store
            .create_template(&template("t-g2", &global, "redis", &[]))
            .unwrap();
        let mut own = template("t-a", &tenant, "mysql", &[]);
        own.description = "tenant".to_string();
        store.create_template(&own).unwrap();

        let found = store
            .list_templates("tenant-A", &TemplateFilter::default())
            .unwrap();
        assert_eq!(folders(&found), vec!["mysql"]);
        assert_eq!(found[0].description, "tenant");

        let found = store
            .list_templates("tenant-B", &TemplateFilter::default())
            .unwrap();
        assert_eq!(folders(&found), vec!["mysql", "redis"]);
        assert_eq!(found[0].description, "global");

        let found = store
            .list_templates(GLOBAL_SCOPE, &TemplateFilter::default())
            .unwrap();
        assert_eq!(folders(&found), vec!["mysql", "redis"]);

        assert_eq!(store.list_catalogs("tenant-A").unwrap().len(), 2);
    }

    #[test]
    fn test_delete_catalog_cascades() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);
        let tenant = catalog("cat-a", "tenant-A", "private");
        store.create_catalog(&tenant).unwrap();

        let mut t = template("t-1", &tenant, "app", &["web"]);
        t.versions = vec![Version {
            id: "v-1".to_string(),
            version: "1.0".to_string(),
            files: BTreeMap::from([("README.md".to_string(), "hi".to_string())]),
            ..Default::default()
        }];
        store.create_template(&t).unwrap();

        assert!(store.delete_catalog("tenant-A", "private").unwrap());

        let conn = store.conn();
        for table in ["templates", "versions", "version_files", "template_categories"] {
            let count: i64 = conn
                .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
                .unwrap();
            assert_eq!(count, 0, "{table} not emptied");
        }
    }

    #[test]
    fn test_delete_catalog_does_not_touch_global() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);
        store
            .create_catalog(&catalog("cat-g", GLOBAL_SCOPE, "library"))
            .unwrap();

        assert!(!store.delete_catalog("tenant-A", "library").unwrap());
        assert!(store.find_catalog("tenant-A", "library").unwrap().is_some());
    }

    #[test]
    fn test_delete_catalog_templates() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);
        let lib = catalog("cat-1", GLOBAL_SCOPE, "library");
        store.create_catalog(&lib).unwrap();
        store
            .create_template(&template("t-1", &lib, "a", &[]))
            .unwrap();
        store
            .create_template(&template("t-2", &lib, "b", &[]))
            .unwrap();

        assert_eq!(store.delete_catalog_templates("cat-1").unwrap(), 2);
        assert!(
            store
                .list_templates(GLOBAL_SCOPE, &TemplateFilter::default())
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn test_update_catalog() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);
        let mut lib = catalog("cat-1", "tenant-A", "library");
        store.create_catalog(&lib).unwrap();

        lib.branch = "release".to_string();
        lib.commit = "abc123".to_string();
        store.update_catalog(&lib).unwrap();

        let found = store.find_catalog("tenant-A", "library").unwrap().unwrap();
        assert_eq!(found.branch, "release");
        assert_eq!(found.commit, "abc123");

        let missing = catalog("cat-x", "tenant-A", "other");
        assert!(matches!(store.update_catalog(&missing), Err(Error::NotFound)));
    }

    #[test]
    fn test_sync_catalog_creates_then_replaces() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);
        let lib = catalog("cat-1", "tenant-A", "library");

        let first = [
            template("t-1", &lib, "a", &[]),
            template("t-2", &lib, "b", &[]),
        ];
        assert_eq!(store.sync_catalog(&lib, &first).unwrap(), 0);

        let second = [template("t-3", &lib, "c", &["web"])];
        assert_eq!(store.sync_catalog(&lib, &second).unwrap(), 2);

        let found = store
            .list_templates("tenant-A", &TemplateFilter::default())
            .unwrap();
        assert_eq!(folders(&found), vec!["c"]);
    }

    #[test]
    fn test_sync_catalog_failure_keeps_previous_templates() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);
        let mut lib = catalog("cat-1", "tenant-A", "library");
        store
            .sync_catalog(
                &lib,
                &[
                    template("t-1", &lib, "a", &[]),
                    template("t-2", &lib, "b", &[]),
                ],
            )
            .unwrap();

        lib.branch = "next".to_string();
        let bad = [
            template("t-3", &lib, "c", &[]),
            template("t-4", &lib, "bad:name", &[]),
        ];
        assert!(matches!(
            store.sync_catalog(&lib, &bad),
            Err(Error::InvalidName(_))
        ));

        let found = store
            .list_templates("tenant-A", &TemplateFilter::default())
            .unwrap();
        assert_eq!(folders(&found), vec!["a", "b"]);
        let kept = store.find_catalog("tenant-A", "library").unwrap().unwrap();
        assert_eq!(kept.branch, "master");

        let fresh = catalog("cat-2", "tenant-A", "fresh");
        assert!(store.sync_catalog(&fresh, &bad).is_err());
        assert!(store.find_catalog("tenant-A", "fresh").unwrap().is_none());
    }

    #[test]
    fn test_blob_round_trip() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);

        let digest = store.put_blob(b"<svg/>").unwrap();
        assert_eq!(digest.len(), 64);
        assert_eq!(store.put_blob(b"<svg/>").unwrap(), digest);
        assert_eq!(store.get_blob(&digest).unwrap().unwrap(), b"<svg/>");
        assert!(store.get_blob("missing").unwrap().is_none());
    }
}
