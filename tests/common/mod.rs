//! In-process harness: a temp database, manifests imported through the
//! library, and a router driven with `tower::ServiceExt::oneshot`.

#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Method, Request, StatusCode, header};
use serde_json::Value;
use stackyard::manifest::{self, CatalogManifest};
use stackyard::server::{AppState, create_router};
use stackyard::store::{SqliteStore, Store};
use tempfile::TempDir;
use tower::ServiceExt;

pub const HOST: &str = "catalog.test";

pub struct TestCatalog {
    pub temp_dir: TempDir,
    pub store: Arc<SqliteStore>,
}

impl TestCatalog {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("create temp dir");
        let store = SqliteStore::new(temp_dir.path().join("stackyard.db")).expect("open store");
        store.initialize().expect("initialize store");
        Self {
            temp_dir,
            store: Arc::new(store),
        }
    }

    pub fn dir(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn write_file(&self, name: &str, contents: &[u8]) {
        std::fs::write(self.dir().join(name), contents).expect("write file");
    }

    /// Imports a YAML manifest into `scope`. Icon and readme paths resolve
    /// against the temp directory.
    pub fn import(&self, scope: &str, yaml: &str) {
        let manifest: CatalogManifest = serde_yaml::from_str(yaml).expect("parse manifest");
        manifest::import(self.store.as_ref(), &manifest, scope, self.dir()).expect("import");
    }

    pub fn router(&self, platform_version: Option<&str>) -> Router {
        let state = Arc::new(AppState::new(
            self.store.clone(),
            None,
            platform_version.map(str::to_string),
        ));
        create_router(state)
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("json body")
    }

    pub fn data(&self) -> Value {
        self.json()["data"].clone()
    }

    pub fn text(&self) -> String {
        String::from_utf8(self.body.clone()).expect("utf-8 body")
    }
}

pub async fn send(
    router: &Router,
    method: Method,
    uri: &str,
    environment: Option<&str>,
    body: Option<Value>,
) -> TestResponse {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::HOST, HOST);
    if let Some(env) = environment {
        builder = builder.header("x-api-project-id", env);
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("build request");

    let response = router.clone().oneshot(request).await.expect("call router");
    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body")
        .to_vec();

    TestResponse {
        status,
        headers,
        body,
    }
}

pub async fn get(router: &Router, uri: &str, environment: Option<&str>) -> TestResponse {
    send(router, Method::GET, uri, environment, None).await
}
