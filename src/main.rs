use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use stackyard::config::ServerConfig;
use stackyard::manifest::{self, CatalogManifest};
use stackyard::server::{AppState, create_router};
use stackyard::store::{SqliteStore, Store};
use stackyard::types::GLOBAL_SCOPE;

#[derive(Parser)]
#[command(name = "stackyard")]
#[command(about = "A multi-tenant catalog of deployable application templates", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the catalog database
    Init {
        /// Data directory for the database
        #[arg(long, default_value = "./data")]
        data_dir: String,
    },

    /// Import a catalog manifest, replacing the catalog's templates if it exists
    Import {
        /// Data directory for the database
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Path to the catalog manifest (YAML)
        #[arg(long, short)]
        file: PathBuf,

        /// Environment that owns the catalog
        #[arg(long, default_value = GLOBAL_SCOPE)]
        scope: String,
    },

    /// Start the server
    Serve {
        /// TOML config file; flags given on the command line take precedence
        #[arg(long, short)]
        config: Option<PathBuf>,

        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(long, short)]
        port: Option<u16>,

        /// Data directory for the database
        #[arg(long)]
        data_dir: Option<String>,

        /// Public base URL for external access (e.g., "https://catalog.example.com").
        /// Used for resource links. If not set, links are derived from request headers.
        #[arg(long)]
        public_base_url: Option<String>,

        /// Platform version assumed when a request does not send one
        #[arg(long)]
        platform_version: Option<String>,
    },
}

fn open_store(config: &ServerConfig) -> anyhow::Result<SqliteStore> {
    let db_path = config.db_path();
    if !db_path.exists() {
        bail!(
            "No catalog database at {}. Run 'stackyard init' first.",
            db_path.display()
        );
    }
    Ok(SqliteStore::new(&db_path)?)
}

fn data_dir_config(data_dir: String) -> ServerConfig {
    ServerConfig {
        data_dir: data_dir.into(),
        ..Default::default()
    }
}

fn run_init(data_dir: String) -> anyhow::Result<()> {
    let config = data_dir_config(data_dir);
    fs::create_dir_all(&config.data_dir)?;

    let db_path = config.db_path();
    let store = SqliteStore::new(&db_path)?;
    store.initialize()?;

    println!("Initialized catalog database at {}", db_path.display());
    Ok(())
}

fn run_import(data_dir: String, file: PathBuf, scope: String) -> anyhow::Result<()> {
    let store = open_store(&data_dir_config(data_dir))?;
    store.initialize()?;

    let manifest = CatalogManifest::from_path(&file)
        .with_context(|| format!("Failed to read manifest {}", file.display()))?;
    let base_dir = file.parent().unwrap_or_else(|| Path::new("."));

    let summary = manifest::import(&store, &manifest, &scope, base_dir)
        .with_context(|| format!("Failed to import catalog '{}'", manifest.name))?;

    println!(
        "Imported catalog '{}' into {}: {} templates, {} versions ({} replaced)",
        manifest.name, scope, summary.templates, summary.versions, summary.replaced
    );
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("stackyard=info".parse()?))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init { data_dir } => {
            run_init(data_dir)?;
        }
        Commands::Import {
            data_dir,
            file,
            scope,
        } => {
            run_import(data_dir, file, scope)?;
        }
        Commands::Serve {
            config,
            host,
            port,
            data_dir,
            public_base_url,
            platform_version,
        } => {
            let mut config = match config {
                Some(path) => ServerConfig::from_file(&path)?,
                None => ServerConfig::default(),
            };
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }
            if let Some(data_dir) = data_dir {
                config.data_dir = data_dir.into();
            }
            if public_base_url.is_some() {
                config.public_base_url = public_base_url;
            }
            if platform_version.is_some() {
                config.platform_version = platform_version;
            }

            let store = open_store(&config)?;
            store.initialize()?;

            let state = Arc::new(AppState::new(
                Arc::new(store),
                config.public_base_url.clone(),
                config.platform_version.clone(),
            ));

            let app = create_router(state);
            let addr = config.socket_addr()?;

            info!("Starting server on {}", addr);

            let listener = tokio::net::TcpListener::bind(addr).await?;
            axum::serve(listener, app).await?;
        }
    }

    Ok(())
}
