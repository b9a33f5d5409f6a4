mod catalogs;
mod constraints;
mod templates;

use std::sync::Arc;

use axum::{
    Router,
    http::{HeaderMap, header},
    routing::{get, post},
};

use crate::links::UrlLinkBuilder;
use crate::server::AppState;
use crate::server::scope::TenantScope;

pub fn catalog_router() -> Router<Arc<AppState>> {
    Router::new()
        // Catalogs
        .route("/catalogs", get(catalogs::list_catalogs))
        .route(
            "/catalogs/{name}",
            get(catalogs::get_catalog).delete(catalogs::delete_catalog),
        )
        // Templates and template versions share one ID space
        .route("/templates", get(templates::list_templates))
        .route("/templates/{id}", get(templates::get_template))
        .route("/templates/{id}/icon", get(templates::get_icon))
        .route("/templates/{id}/readme", get(templates::get_readme))
        // Constraints
        .route("/constraints/check", post(constraints::check_constraint))
}

#[must_use]
fn get_host_from_headers(headers: &HeaderMap) -> String {
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");

    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("http");

    format!("{scheme}://{host}")
}

/// Links point at the configured public URL, else back at the host the
/// request came in on, and carry the caller's environment.
fn link_builder(state: &AppState, headers: &HeaderMap, scope: &TenantScope) -> UrlLinkBuilder {
    let base = state
        .public_base_url
        .clone()
        .unwrap_or_else(|| get_host_from_headers(headers));
    UrlLinkBuilder::new(base).with_environment(scope.as_str())
}

/// The request's platform version, else the server default, else empty.
/// Empty sorts below every version, so versions with a minimum platform
/// bound are hidden when no platform version is known.
fn platform_version<'a>(state: &'a AppState, requested: Option<&'a str>) -> &'a str {
    requested
        .filter(|v| !v.is_empty())
        .or(state.platform_version.as_deref())
        .unwrap_or_default()
}
