use std::collections::HashMap;

use axum::{
    extract::{FromRequestParts, Query},
    http::request::Parts,
};

use super::response::ApiError;

pub const ENVIRONMENT_HEADER: &str = "x-api-project-id";
pub const ENVIRONMENT_QUERY: &str = "projectId";

/// The environment a request reads catalogs for.
///
/// Taken from the `x-api-project-id` header, falling back to the `projectId`
/// query parameter. Requests carrying neither are rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantScope(pub String);

impl TenantScope {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn scope_from_parts(parts: &Parts) -> Option<String> {
    let header = parts
        .headers
        .get(ENVIRONMENT_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    if let Some(value) = header {
        return Some(value.to_string());
    }

    Query::<HashMap<String, String>>::try_from_uri(&parts.uri)
        .ok()
        .and_then(|Query(mut params)| params.remove(ENVIRONMENT_QUERY))
        .filter(|v| !v.is_empty())
}

impl<S: Send + Sync> FromRequestParts<S> for TenantScope {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        scope_from_parts(parts)
            .map(TenantScope)
            .ok_or_else(|| ApiError::bad_request("Request is missing environment header"))
    }
}
