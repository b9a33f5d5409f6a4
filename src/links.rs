//! Externally addressable URLs for catalog resources.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Catalog,
    Template,
    Icon,
    Readme,
}

impl ResourceKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Catalog => "catalog",
            Self::Template => "template",
            Self::Icon => "icon",
            Self::Readme => "readme",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Turns a resource kind plus identifier into a URL. Callers only ever hand
/// over kind and ID; the URL shape belongs to the implementation.
pub trait LinkBuilder: Send + Sync {
    fn link(&self, kind: ResourceKind, id: &str) -> String;
}

/// Builds links under the HTTP routes served by [`crate::server`].
#[derive(Debug, Clone)]
pub struct UrlLinkBuilder {
    base_url: String,
    environment_id: Option<String>,
}

impl UrlLinkBuilder {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            environment_id: None,
        }
    }

    /// Appends `projectId` to every link so they resolve without the
    /// environment header.
    #[must_use]
    pub fn with_environment(mut self, environment_id: impl Into<String>) -> Self {
        self.environment_id = Some(environment_id.into());
        self
    }
}

impl LinkBuilder for UrlLinkBuilder {
    fn link(&self, kind: ResourceKind, id: &str) -> String {
        let id = urlencoding::encode(id);
        let path = match kind {
            ResourceKind::Catalog => format!("/v1-catalog/catalogs/{id}"),
            ResourceKind::Template => format!("/v1-catalog/templates/{id}"),
            ResourceKind::Icon => format!("/v1-catalog/templates/{id}/icon"),
            ResourceKind::Readme => format!("/v1-catalog/templates/{id}/readme"),
        };
        match &self.environment_id {
            Some(env) => format!(
                "{}{path}?projectId={}",
                self.base_url,
                urlencoding::encode(env)
            ),
            None => format!("{}{path}", self.base_url),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_encodes_identifier() {
        let links = UrlLinkBuilder::new("http://localhost:8080/");
        assert_eq!(
            links.link(ResourceKind::Template, "library:infra*mysql:5.7"),
            "http://localhost:8080/v1-catalog/templates/library%3Ainfra%2Amysql%3A5.7"
        );
    }

    #[test]
    fn test_link_with_environment() {
        let links = UrlLinkBuilder::new("https://catalog.example.com").with_environment("1a5");
        assert_eq!(
            links.link(ResourceKind::Icon, "library:mysql"),
            "https://catalog.example.com/v1-catalog/templates/library%3Amysql/icon?projectId=1a5"
        );
    }
}
