use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};

use super::link_builder;
use crate::links::{LinkBuilder, ResourceKind};
use crate::server::AppState;
use crate::server::dto::CatalogResource;
use crate::server::response::{ApiError, ApiResponse, StoreOptionExt, StoreResultExt};
use crate::server::scope::TenantScope;
use crate::types::Catalog;

fn catalog_resource(catalog: Catalog, links: &dyn LinkBuilder) -> CatalogResource {
    let links = BTreeMap::from([(
        "self".to_string(),
        links.link(ResourceKind::Catalog, &catalog.name),
    )]);
    CatalogResource {
        id: catalog.name.clone(),
        links,
        catalog,
    }
}

pub async fn list_catalogs(
    scope: TenantScope,
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let catalogs = state
        .store
        .list_catalogs(scope.as_str())
        .api_err("Failed to list catalogs")?;

    let links = link_builder(&state, &headers, &scope);
    let data: Vec<CatalogResource> = catalogs
        .into_iter()
        .map(|c| catalog_resource(c, &links))
        .collect();

    Ok::<_, ApiError>(Json(ApiResponse::success(data)))
}

pub async fn get_catalog(
    scope: TenantScope,
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(name): Path<String>,
) -> impl IntoResponse {
    let catalog = state
        .store
        .find_catalog(scope.as_str(), &name)
        .api_err("Failed to get catalog")?
        .or_not_found("Catalog not found")?;

    let links = link_builder(&state, &headers, &scope);
    Ok::<_, ApiError>(Json(ApiResponse::success(catalog_resource(
        catalog, &links,
    ))))
}

pub async fn delete_catalog(
    scope: TenantScope,
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> impl IntoResponse {
    let deleted = state
        .store
        .delete_catalog(scope.as_str(), &name)
        .api_err("Failed to delete catalog")?;

    if !deleted {
        return Err(ApiError::not_found("Catalog not found"));
    }

    tracing::info!("Deleted catalog {} from environment {}", name, scope.as_str());
    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}
