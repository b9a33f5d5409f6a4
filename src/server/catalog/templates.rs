use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};

use super::{link_builder, platform_version};
use crate::descriptor;
use crate::ident::{self, ResourceId, TemplateRef};
use crate::links::{LinkBuilder, ResourceKind};
use crate::resolve;
use crate::server::AppState;
use crate::server::dto::{
    ListTemplatesParams, PlatformParams, TemplateResource, TemplateVersionResource,
};
use crate::server::response::{ApiError, ApiResponse, StoreOptionExt, StoreResultExt};
use crate::server::scope::TenantScope;
use crate::store::TemplateFilter;
use crate::types::{Template, Version};

fn split_list(value: Option<&str>) -> Vec<String> {
    value
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_id(id: &str) -> Result<ResourceId, ApiError> {
    ident::parse_resource_id(id).map_err(|e| ApiError::bad_request(e.to_string()))
}

fn load_template(
    state: &AppState,
    scope: &TenantScope,
    reference: &TemplateRef,
) -> Result<Template, ApiError> {
    state
        .store
        .find_template(
            scope.as_str(),
            &reference.catalog,
            &reference.folder,
            &reference.base,
        )
        .api_err("Failed to get template")?
        .or_not_found("Template not found")
}

fn template_resource(
    template: Template,
    platform_version: &str,
    links: &dyn LinkBuilder,
) -> TemplateResource {
    let catalog = template.catalog_name.as_str();
    let id = ident::template_id_for(catalog, &template);

    let mut resource_links = BTreeMap::new();
    resource_links.insert("self".to_string(), links.link(ResourceKind::Template, &id));
    if !template.icon.is_empty() {
        resource_links.insert("icon".to_string(), links.link(ResourceKind::Icon, &id));
    }
    if !template.readme.is_empty() {
        resource_links.insert("readme".to_string(), links.link(ResourceKind::Readme, &id));
    }
    if !template.project_url.is_empty() {
        resource_links.insert("project".to_string(), template.project_url.clone());
    }

    let version_links = resolve::version_links(catalog, &template, platform_version, links);
    let default_template_version_id = resolve::default_version_id(catalog, &template);

    TemplateResource {
        id,
        links: resource_links,
        version_links,
        default_template_version_id,
        template,
    }
}

fn version_resource(
    template: &Template,
    version: &Version,
    platform_version: &str,
    links: &dyn LinkBuilder,
) -> Result<TemplateVersionResource, ApiError> {
    let catalog = template.catalog_name.as_str();
    let id = ident::version_id(catalog, template, version);
    let template_id = ident::template_id_for(catalog, template);

    let questions = descriptor::questions_for(&version.files).map_err(|e| {
        tracing::warn!("Bad descriptor in {}: {}", id, e);
        ApiError::internal(e.to_string())
    })?;

    let mut resource_links = BTreeMap::new();
    resource_links.insert("self".to_string(), links.link(ResourceKind::Template, &id));
    resource_links.insert(
        "template".to_string(),
        links.link(ResourceKind::Template, &template_id),
    );
    if !template.icon.is_empty() {
        resource_links.insert("icon".to_string(), links.link(ResourceKind::Icon, &id));
    }
    if !version.readme.is_empty() {
        resource_links.insert("readme".to_string(), links.link(ResourceKind::Readme, &id));
    } else if !template.readme.is_empty() {
        resource_links.insert(
            "readme".to_string(),
            links.link(ResourceKind::Readme, &template_id),
        );
    }
    if !template.project_url.is_empty() {
        resource_links.insert("project".to_string(), template.project_url.clone());
    }

    let upgrade_version_links =
        resolve::upgrade_links(catalog, template, version, platform_version, links);

    Ok(TemplateVersionResource {
        id,
        template_id,
        links: resource_links,
        files: version.files.clone(),
        questions,
        upgrade_version_links,
        version: version.clone(),
    })
}

pub async fn list_templates(
    scope: TenantScope,
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(params): Query<ListTemplatesParams>,
) -> impl IntoResponse {
    let filter = TemplateFilter {
        catalog: params.catalog.clone().filter(|c| !c.is_empty()),
        categories: split_list(params.category.as_deref()),
        categories_ne: split_list(params.category_ne.as_deref()),
    };

    let templates = state
        .store
        .list_templates(scope.as_str(), &filter)
        .api_err("Failed to list templates")?;

    let platform = platform_version(&state, params.platform_version.as_deref());
    let links = link_builder(&state, &headers, &scope);
    let data: Vec<TemplateResource> = templates
        .into_iter()
        .map(|t| template_resource(t, platform, &links))
        .collect();

    Ok::<_, ApiError>(Json(ApiResponse::success(data)))
}

/// Serves either a template or one of its versions, depending on whether the
/// ID carries a version part.
pub async fn get_template(
    scope: TenantScope,
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Query(params): Query<PlatformParams>,
) -> impl IntoResponse {
    let resource_id = parse_id(&id)?;
    let template = load_template(&state, &scope, resource_id.template())?;
    let platform = platform_version(&state, params.platform_version.as_deref());
    let links = link_builder(&state, &headers, &scope);

    let response: Response = match resource_id {
        ResourceId::Template(_) => {
            Json(ApiResponse::success(template_resource(template, platform, &links)))
                .into_response()
        }
        ResourceId::Version(reference) => {
            let version = resolve::find_version(&template, &reference)
                .or_not_found("Template version not found")?;
            let resource = version_resource(&template, version, platform, &links)?;
            Json(ApiResponse::success(resource)).into_response()
        }
    };

    Ok::<_, ApiError>(response)
}

fn icon_content_type(filename: &str) -> &'static str {
    let ext = std::path::Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match ext.as_str() {
        "svg" => "image/svg+xml",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "ico" => "image/x-icon",
        _ => "application/octet-stream",
    }
}

fn read_blob(state: &AppState, digest: &str, missing: &'static str) -> Result<Vec<u8>, ApiError> {
    if digest.is_empty() {
        return Err(ApiError::not_found(missing));
    }
    state
        .store
        .get_blob(digest)
        .api_err("Failed to read blob")?
        .or_not_found(missing)
}

pub async fn get_icon(
    scope: TenantScope,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let resource_id = parse_id(&id)?;
    let template = load_template(&state, &scope, resource_id.template())?;
    let data = read_blob(&state, &template.icon, "Template has no icon")?;

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(icon_content_type(&template.icon_filename)),
    );

    Ok::<_, ApiError>((StatusCode::OK, headers, data).into_response())
}

/// A version ID serves that version's readme when it has one and falls back
/// to the template's.
pub async fn get_readme(
    scope: TenantScope,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let resource_id = parse_id(&id)?;
    let template = load_template(&state, &scope, resource_id.template())?;

    let digest = match &resource_id {
        ResourceId::Template(_) => template.readme.as_str(),
        ResourceId::Version(reference) => {
            let version = resolve::find_version(&template, reference)
                .or_not_found("Template version not found")?;
            if version.readme.is_empty() {
                template.readme.as_str()
            } else {
                version.readme.as_str()
            }
        }
    };
    let data = read_blob(&state, digest, "Template has no readme")?;

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/markdown; charset=utf-8"),
    );

    Ok::<_, ApiError>((StatusCode::OK, headers, data).into_response())
}
