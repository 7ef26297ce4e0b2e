//! Common test utilities for integration tests
//!
//! Every test gets its own router over a fresh in-memory store, so tests
//! need no external services and never share state.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::{collections::HashMap, sync::Arc};
use tasktrack_api::{
    app::{build_router, AppState},
    config::Config,
};
use tasktrack_shared::store::{MemoryStore, SharedStore};
use tower::ServiceExt;

/// Signing secret used by every test context
pub const TEST_SECRET: &str = "test-secret-key-at-least-32-bytes-long";

/// A password that satisfies the password policy
pub const TEST_PASSWORD: &str = "Red12345!";

/// Test context containing the router and direct access to its store
pub struct TestContext {
    pub app: Router,
    pub store: Arc<MemoryStore>,
}

/// A user registered through the API
pub struct TestUser {
    pub id: String,
    pub email: String,
    pub token: String,
}

impl TestContext {
    /// Creates a new test context with an empty store
    pub fn new() -> Self {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("STORAGE_BACKEND", "memory"),
            ("JWT_SECRET", TEST_SECRET),
        ]);
        let config = Config::from_lookup(|key| vars.get(key).map(|v| v.to_string()))
            .expect("test configuration is valid");

        let store = Arc::new(MemoryStore::new());
        let shared: SharedStore = store.clone();
        let app = build_router(AppState::new(shared, config));

        Self { app, store }
    }

    /// Sends a request and returns the status and the parsed JSON body
    ///
    /// An empty body comes back as `Value::Null`.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };

        (status, value)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    pub async fn patch(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request(Method::PATCH, uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, token, None).await
    }

    /// Registers a user and returns its id and first token
    pub async fn register(&self, name: &str, email: &str) -> TestUser {
        let (status, body) = self
            .post(
                "/users",
                None,
                json!({ "name": name, "email": email, "password": TEST_PASSWORD }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);

        TestUser {
            id: body["user"]["id"].as_str().unwrap().to_string(),
            email: body["user"]["email"].as_str().unwrap().to_string(),
            token: body["token"].as_str().unwrap().to_string(),
        }
    }

    /// Logs in with the shared test password and returns the new token
    pub async fn login(&self, email: &str) -> String {
        let (status, body) = self
            .post(
                "/users/login",
                None,
                json!({ "email": email, "password": TEST_PASSWORD }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {}", body);

        body["token"].as_str().unwrap().to_string()
    }
}
