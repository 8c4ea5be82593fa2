//! Shared helpers for API tests: a freshly seeded store behind a running
//! runtime, driven in-process through `Router::route`.

#![allow(dead_code)]

use std::sync::Arc;

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Method, Request, StatusCode};
use serde_json::Value;
use tokio::sync::mpsc;

use blog_api::router::Router;
use blog_core::config::BlogConfig;
use blog_core::fixtures::Fixtures;
use blog_core::Database;
use blog_runtime::Runtime;

/// Response status and decoded JSON body (`Value::Null` when empty).
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

pub struct TestApp {
    pub router: Router,
    pub database: Arc<Database>,
}

impl TestApp {
    /// Seeds the builtin fixtures into a fresh store and starts a runtime.
    pub fn seeded() -> anyhow::Result<Self> {
        let fixtures = Fixtures::builtin()?;
        Self::with_database(Database::seeded(&fixtures)?)
    }

    /// Starts a runtime over an empty store.
    pub fn empty() -> anyhow::Result<Self> {
        Self::with_database(Database::new())
    }

    fn with_database(database: Database) -> anyhow::Result<Self> {
        let config = BlogConfig {
            tickrate: 240,
            ..Default::default()
        };
        let database = Arc::new(database);
        let (api_tx, api_rx) = mpsc::channel(1000);

        // Exits on its own once the router (and its sender) is dropped.
        Runtime::new(database.clone(), config.clone(), api_rx, None).spawn()?;

        let router = Router::new(Arc::new(config), api_tx)?;
        Ok(Self { router, database })
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> anyhow::Result<TestResponse> {
        let bytes = match body {
            Some(json) => Bytes::from(serde_json::to_vec(&json)?),
            None => Bytes::new(),
        };
        let req = Request::builder()
            .method(method)
            .uri(uri)
            .header("Content-Type", "application/json")
            .body(Full::new(bytes))?;

        let response = self.router.route(req).await;
        let status = response.status();
        let body = if response.body().is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(response.body())?
        };
        Ok(TestResponse { status, body })
    }

    pub async fn get(&self, uri: &str) -> anyhow::Result<TestResponse> {
        self.request(Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> anyhow::Result<TestResponse> {
        self.request(Method::POST, uri, Some(body)).await
    }

    pub async fn put(&self, uri: &str, body: Option<Value>) -> anyhow::Result<TestResponse> {
        self.request(Method::PUT, uri, body).await
    }

    pub async fn delete(&self, uri: &str) -> anyhow::Result<TestResponse> {
        self.request(Method::DELETE, uri, None).await
    }
}

/// Asserts a `ResourceNotFoundError` body naming `resource`.
pub fn assert_not_found(response: &TestResponse, resource: &str) {
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["name"], "ResourceNotFoundError");
    assert_eq!(
        response.body["message"],
        format!("Could not find resource of type {}", resource)
    );
}
