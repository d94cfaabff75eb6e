#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use chrono::Utc;
use edupanel::app::auth::User;
use edupanel::app::document_store::{DocumentStore, InMemoryDocumentStore};
use edupanel::config::Tunables;
use edupanel::server::{AppState, router};
use http_body_util::BodyExt as _;
use serde_json::Value;
use tower::ServiceExt as _;

/// Router over an in-memory store with one signed-in user.
pub struct TestApp {
    pub state: AppState,
    pub router: Router,
    pub token: String,
    pub upload_dir: tempfile::TempDir,
}

impl TestApp {
    pub async fn new() -> anyhow::Result<Self> {
        Self::with_store(Arc::new(InMemoryDocumentStore::new()), Tunables::default()).await
    }

    pub async fn with_store(
        store: Arc<dyn DocumentStore>,
        tunables: Tunables,
    ) -> anyhow::Result<Self> {
        let upload_dir = tempfile::tempdir()?;
        let state = AppState::new(store, upload_dir.path(), tunables);

        // Sessions only need the user's identity, so skip password hashing here.
        let now = Utc::now();
        let user = User {
            id: uuid::Uuid::new_v4().to_string(),
            username: "tester".to_string(),
            password_hash: String::new(),
            role: "admin".to_string(),
            created_at: now,
            updated_at: now,
        };
        let (token, _) = state.sessions.issue(&user).await;

        Ok(Self {
            router: router(state.clone()),
            state,
            token,
            upload_dir,
        })
    }

    pub async fn send(&self, req: Request<Body>) -> anyhow::Result<(StatusCode, Value)> {
        let resp = self.router.clone().oneshot(req).await?;
        let status = resp.status();
        let bytes = resp.into_body().collect().await?.to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        Ok((status, body))
    }

    pub fn authed(&self, method: Method, uri: &str) -> axum::http::request::Builder {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.token))
    }

    pub fn get(&self, uri: &str) -> Request<Body> {
        self.authed(Method::GET, uri).body(Body::empty()).unwrap()
    }

    pub fn delete(&self, uri: &str) -> Request<Body> {
        self.authed(Method::DELETE, uri).body(Body::empty()).unwrap()
    }

    pub fn json(&self, method: Method, uri: &str, body: Value) -> Request<Body> {
        self.authed(method, uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }
}

pub fn anonymous_json(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn message(body: &Value) -> &str {
    body["message"].as_str().unwrap_or_default()
}
