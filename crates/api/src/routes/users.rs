//! Profile of the authenticated user.

use std::sync::Arc;

use axum::{Json, Router, extract::State, routing::get};
use tracing::info;

use super::auth::user_info;
use crate::extractors::ValidJson;
use crate::{ApiError, ApiResult, AppState, middleware::AuthUser};
use tally_core::auth::{hash_password, is_acceptable_password};
use tally_db::UserRepository;
use tally_db::repositories::UpdateProfileInput;
use tally_shared::AppError;
use tally_shared::auth::{UpdateProfileRequest, UserInfo};

/// Creates the user routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new().route("/users/me", get(get_me).patch(update_me))
}

/// GET /users/me
async fn get_me(State(state): State<AppState>, auth: AuthUser) -> ApiResult<Json<UserInfo>> {
    UserRepository::new(Arc::clone(&state.db))
        .find_by_id(auth.user_id())
        .await?
        .map(|user| Json(user_info(user)))
        .ok_or_else(|| ApiError::not_found("User"))
}

/// PATCH /users/me - Change display name and/or password.
async fn update_me(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidJson(payload): ValidJson<UpdateProfileRequest>,
) -> ApiResult<Json<UserInfo>> {
    let password_hash = match payload.password.as_deref() {
        Some(password) if !is_acceptable_password(password) => {
            return Err(ApiError(AppError::Validation(
                "Password must be at least 8 characters".to_string(),
            )));
        }
        Some(password) => Some(hash_password(password)?),
        None => None,
    };
    let password_changed = password_hash.is_some();

    let user = UserRepository::new(Arc::clone(&state.db))
        .update_profile(
            auth.user_id(),
            UpdateProfileInput {
                name: payload.name.map(|name| name.trim().to_string()),
                password_hash,
            },
        )
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;

    info!(user_id = user.id, password_changed, "Profile updated");
    Ok(Json(user_info(user)))
}
