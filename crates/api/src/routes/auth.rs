//! Authentication routes for registration and login.

use std::sync::Arc;

use axum::{Json, Router, extract::State, http::StatusCode, routing::post};
use tracing::info;

use crate::extractors::ValidJson;
use crate::{ApiError, ApiResult, AppState};
use tally_core::auth::{hash_password, is_acceptable_password, normalize_email, verify_password};
use tally_db::UserRepository;
use tally_db::entities::users;
use tally_shared::AppError;
use tally_shared::auth::{LoginRequest, LoginResponse, RegisterRequest, UserInfo};
use tally_shared::types::UserId;

/// Creates the auth router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/register", post(register))
}

pub(crate) fn user_info(user: users::Model) -> UserInfo {
    UserInfo {
        id: UserId::from_raw(user.id),
        email: user.email,
        name: user.name,
    }
}

fn invalid_credentials() -> ApiError {
    ApiError(AppError::Unauthorized("Invalid email or password".to_string()))
}

/// POST /auth/login - Authenticate user and return an access token.
async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let Some(email) = normalize_email(&payload.email) else {
        return Err(invalid_credentials());
    };

    let user_repo = UserRepository::new(Arc::clone(&state.db));
    let Some(user) = user_repo.find_by_email(&email).await? else {
        info!(email = %email, "Login attempt for non-existent user");
        return Err(invalid_credentials());
    };

    if !user.is_active {
        return Err(ApiError(AppError::Unauthorized(
            "This account has been disabled".to_string(),
        )));
    }

    if !verify_password(&payload.password, &user.password_hash)? {
        info!(user_id = user.id, "Failed login attempt - invalid password");
        return Err(invalid_credentials());
    }

    let access_token = state
        .jwt_service
        .generate_access_token(UserId::from_raw(user.id))?;

    info!(user_id = user.id, "User logged in successfully");

    Ok(Json(LoginResponse {
        user: user_info(user),
        access_token,
        token_type: "Bearer",
        expires_in: state.jwt_service.access_token_expires_in(),
    }))
}

/// POST /auth/register - Register a new user.
async fn register(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<UserInfo>)> {
    let Some(email) = normalize_email(&payload.email) else {
        return Err(ApiError(AppError::Validation(
            "A valid email address is required".to_string(),
        )));
    };
    if !is_acceptable_password(&payload.password) {
        return Err(ApiError(AppError::Validation(
            "Password must be at least 8 characters".to_string(),
        )));
    }

    let user_repo = UserRepository::new(Arc::clone(&state.db));
    if user_repo.email_exists(&email).await? {
        return Err(ApiError(AppError::Conflict(
            "Email is already registered".to_string(),
        )));
    }

    let password_hash = hash_password(&payload.password)?;
    let user = user_repo
        .create(&email, &password_hash, payload.name.trim())
        .await?;

    info!(user_id = user.id, "User registered");
    Ok((StatusCode::CREATED, Json(user_info(user))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::test_support::{TestApp, user_row};
    use axum::http::StatusCode;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use serde_json::json;
    use std::collections::BTreeMap;

    fn count_row(n: i64) -> BTreeMap<&'static str, sea_orm::Value> {
        BTreeMap::from([("num_items", sea_orm::Value::from(n))])
    }

    #[tokio::test]
    async fn test_register_rejects_short_password() {
        let app = TestApp::new(MockDatabase::new(DatabaseBackend::Postgres));

        let (status, body) = app
            .post(
                "/api/v1/auth/register",
                None,
                json!({"email": "a@example.com", "password": "short", "name": "Ana"}),
            )
            .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "validation_error");
    }

    #[tokio::test]
    async fn test_register_rejects_duplicate_email() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[count_row(1)]]);
        let app = TestApp::new(db);

        let (status, body) = app
            .post(
                "/api/v1/auth/register",
                None,
                json!({"email": "a@Example.com", "password": "long enough", "name": "Ana"}),
            )
            .await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "conflict");
    }

    #[tokio::test]
    async fn test_login_with_wrong_password_is_unauthorized() {
        let hash = hash_password("correct horse").unwrap();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[user_row(1, "a@example.com", &hash)]]);
        let app = TestApp::new(db);

        let (status, body) = app
            .post(
                "/api/v1/auth/login",
                None,
                json!({"email": "a@example.com", "password": "battery staple"}),
            )
            .await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "unauthorized");
    }

    #[tokio::test]
    async fn test_login_returns_bearer_token() {
        let hash = hash_password("correct horse").unwrap();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[user_row(1, "a@example.com", &hash)]]);
        let app = TestApp::new(db);

        let (status, body) = app
            .post(
                "/api/v1/auth/login",
                None,
                json!({"email": " a@EXAMPLE.com ", "password": "correct horse"}),
            )
            .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["token_type"], "Bearer");
        assert_eq!(body["user"]["id"], 1);

        let token = body["access_token"].as_str().unwrap();
        let claims = app.jwt.validate_token(token).unwrap();
        assert_eq!(claims.user_id(), UserId::from_raw(1));
    }
}
