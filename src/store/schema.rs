pub const SCHEMA: &str = r#"
-- Catalogs are template sources; environment_id = 'global' is shared by every environment
CREATE TABLE IF NOT EXISTS catalogs (
    id TEXT PRIMARY KEY,
    environment_id TEXT NOT NULL,
    name TEXT NOT NULL,
    url TEXT NOT NULL DEFAULT '',
    branch TEXT NOT NULL DEFAULT '',
    commit_sha TEXT NOT NULL DEFAULT '',
    kind TEXT NOT NULL DEFAULT '',
    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now')),

    UNIQUE(environment_id, name)
);

-- Templates belong to exactly one catalog
CREATE TABLE IF NOT EXISTS templates (
    id TEXT PRIMARY KEY,
    catalog_id TEXT NOT NULL REFERENCES catalogs(id) ON DELETE CASCADE,
    environment_id TEXT NOT NULL,
    name TEXT NOT NULL,
    is_system INTEGER NOT NULL DEFAULT 0,
    description TEXT NOT NULL DEFAULT '',
    default_version TEXT NOT NULL DEFAULT '',
    path TEXT NOT NULL DEFAULT '',
    maintainer TEXT NOT NULL DEFAULT '',
    license TEXT NOT NULL DEFAULT '',
    project_url TEXT NOT NULL DEFAULT '',
    upgrade_from TEXT NOT NULL DEFAULT '',
    folder_name TEXT NOT NULL,
    base TEXT NOT NULL DEFAULT '',     -- '' = not a variant
    icon TEXT NOT NULL DEFAULT '',     -- blob digest
    icon_filename TEXT NOT NULL DEFAULT '',
    readme TEXT NOT NULL DEFAULT '',   -- blob digest

    UNIQUE(catalog_id, base, folder_name)
);

-- Category names are shared across templates (many-to-many)
CREATE TABLE IF NOT EXISTS categories (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS template_categories (
    template_id TEXT NOT NULL REFERENCES templates(id) ON DELETE CASCADE,
    category_id INTEGER NOT NULL REFERENCES categories(id) ON DELETE CASCADE,
    PRIMARY KEY (template_id, category_id)
);

CREATE TABLE IF NOT EXISTS template_labels (
    template_id TEXT NOT NULL REFERENCES templates(id) ON DELETE CASCADE,
    key TEXT NOT NULL,
    value TEXT NOT NULL,
    PRIMARY KEY (template_id, key)
);

-- Published releases of a template
CREATE TABLE IF NOT EXISTS versions (
    id TEXT PRIMARY KEY,
    template_id TEXT NOT NULL REFERENCES templates(id) ON DELETE CASCADE,
    position INTEGER NOT NULL,
    version TEXT NOT NULL,
    revision INTEGER,                  -- NULL = identified by label
    minimum_platform_version TEXT NOT NULL DEFAULT '',
    maximum_platform_version TEXT NOT NULL DEFAULT '',
    upgrade_from TEXT NOT NULL DEFAULT '',
    readme TEXT NOT NULL DEFAULT ''    -- blob digest
);

CREATE TABLE IF NOT EXISTS version_files (
    version_id TEXT NOT NULL REFERENCES versions(id) ON DELETE CASCADE,
    name TEXT NOT NULL,
    contents TEXT NOT NULL,
    PRIMARY KEY (version_id, name)
);

-- Icons and readmes, addressed by sha256 digest
CREATE TABLE IF NOT EXISTS blobs (
    digest TEXT PRIMARY KEY,
    data BLOB NOT NULL,
    created_at TEXT DEFAULT (datetime('now'))
);

-- Create indexes
CREATE INDEX IF NOT EXISTS idx_catalogs_environment ON catalogs(environment_id);
CREATE INDEX IF NOT EXISTS idx_templates_catalog ON templates(catalog_id);
CREATE INDEX IF NOT EXISTS idx_template_categories_category ON template_categories(category_id);
CREATE INDEX IF NOT EXISTS idx_versions_template ON versions(template_id);
"#;
