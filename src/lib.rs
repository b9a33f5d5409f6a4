//! # Stackyard
//!
//! A multi-tenant catalog of deployable application templates, usable both
//! as a standalone binary and as a library.
//!
//! Catalogs belong either to one environment or to the shared `global`
//! scope. Readers see their own catalogs plus the global ones, with their own
//! winning on a name clash. Each template carries an ordered list of
//! versions; which of them a caller may install, and which it may upgrade to,
//! is decided by [`resolve`] on top of the comparator in [`version`].
//!
//! ## Library Usage
//!
//! ```toml
//! [dependencies]
//! stackyard = { version = "0.0.1", default-features = false }
//! ```
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use stackyard::server::{AppState, create_router};
//! use stackyard::store::{SqliteStore, Store};
//!
//! let store = SqliteStore::new("./data/stackyard.db").unwrap();
//! store.initialize().unwrap();
//!
//! let state = Arc::new(AppState::new(Arc::new(store), None, Some("v1.6.0".into())));
//! let router = create_router(state);
//! // Serve with axum...
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` (default): Builds the `stackyard` binary. Disable with `default-features = false`.

pub mod config;
pub mod descriptor;
pub mod error;
pub mod ident;
pub mod links;
pub mod manifest;
pub mod resolve;
pub mod server;
pub mod store;
pub mod types;
pub mod version;
