//! Router harness over a mocked database.

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use sea_orm::MockDatabase;
use serde_json::Value;
use tally_db::entities::users;
use tally_shared::types::UserId;
use tally_shared::{JwtConfig, JwtService};
use tower::ServiceExt;

use crate::{AppState, create_router};

pub struct TestApp {
    router: Router,
    pub jwt: Arc<JwtService>,
}

impl TestApp {
    pub fn new(db: MockDatabase) -> Self {
        let jwt = Arc::new(JwtService::new(JwtConfig {
            secret: "test-secret".to_string(),
            access_token_expires_secs: 3600,
        }));
        let state = AppState {
            db: Arc::new(db.into_connection()),
            jwt_service: jwt.clone(),
        };
        Self {
            router: create_router(state),
            jwt,
        }
    }

    pub fn token(&self, user: i64) -> String {
        self.jwt
            .generate_access_token(UserId::from_raw(user))
            .unwrap()
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, token, Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(Method::PUT, uri, token, Some(body)).await
    }

    pub async fn patch(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(Method::PATCH, uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(Method::DELETE, uri, token, None).await
    }
}

pub fn user_row(id: i64, email: &str, password_hash: &str) -> users::Model {
    let now = chrono::Utc::now().into();
    users::Model {
        id,
        email: email.to_string(),
        name: "Ana".to_string(),
        password_hash: password_hash.to_string(),
        is_active: true,
        is_staff: false,
        created_at: now,
        updated_at: now,
    }
}
