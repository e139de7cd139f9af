use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
    response::Response,
};
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use tempfile::TempDir;
use tower::ServiceExt;

use crate::db::{Database, Schema};
use crate::handler::AppState;

pub async fn open_store() -> (Database, TempDir) {
    let dir = TempDir::new().expect("temp dir should be created");
    let db = Database::open_local(&dir.path().join("finsight.db"), &Schema::finsight())
        .await
        .expect("test store should open");
    (db, dir)
}

pub fn from_body<T: DeserializeOwned>(body: JsonValue) -> T {
    serde_json::from_value(body).expect("response body should match the response shape")
}

/// The assembled router over a throwaway store.
pub struct TestApp {
    router: Router,
    _dir: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        let (db, dir) = open_store().await;
        let state = AppState { db: Arc::new(db) };
        let router = crate::app(state, &["http://localhost:3000".to_string()])
            .expect("router should assemble");
        TestApp { router, _dir: dir }
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, JsonValue) {
        self.send(Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str, body: JsonValue) -> (StatusCode, JsonValue) {
        self.send(Method::POST, uri, Some(body)).await
    }

    pub async fn put(&self, uri: &str, body: JsonValue) -> (StatusCode, JsonValue) {
        self.send(Method::PUT, uri, Some(body)).await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, JsonValue) {
        self.send(Method::DELETE, uri, None).await
    }

    pub async fn preflight(&self, uri: &str, origin: &str) -> Response {
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri(uri)
            .header(header::ORIGIN, origin)
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .body(Body::empty())
            .expect("request");

        self.router.clone().oneshot(request).await.expect("response")
    }

    async fn send(&self, method: Method, uri: &str, body: Option<JsonValue>) -> (StatusCode, JsonValue) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request");

        let response = self.router.clone().oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        let json = if bytes.is_empty() {
            JsonValue::Null
        } else {
            serde_json::from_slice(&bytes).expect("response body should be JSON")
        };

        (status, json)
    }
}
