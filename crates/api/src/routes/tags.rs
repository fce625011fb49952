//! Tag routes.

use std::sync::Arc;

use axum::{Json, Router, extract::State, http::StatusCode, routing::get};
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use crate::extractors::{ApiPath, ValidJson};
use crate::{ApiError, ApiResult, AppState, middleware::AuthUser};
use tally_db::entities::tags;
use tally_db::repositories::{CreateTagInput, TagRepository, UpdateTagInput};
use tally_shared::types::TagId;

/// Creates the tag routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/tags", get(list_tags).post(create_tag))
        .route(
            "/tags/{id}",
            get(get_tag)
                .put(replace_tag)
                .patch(update_tag)
                .delete(delete_tag),
        )
}

/// Full tag body, used by POST and PUT.
#[derive(Debug, Deserialize, Validate)]
pub struct TagRequest {
    /// Display name.
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    /// Description.
    #[serde(default)]
    #[validate(length(max = 255))]
    pub description: String,
}

/// Partial tag body, used by PATCH.
#[derive(Debug, Deserialize, Validate)]
pub struct PatchTagRequest {
    /// Display name.
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    /// Description.
    #[validate(length(max = 255))]
    pub description: Option<String>,
}

/// Tag representation.
#[derive(Debug, Serialize)]
pub struct TagResponse {
    /// Tag ID.
    pub id: TagId,
    /// Display name.
    pub name: String,
    /// Description.
    pub description: String,
}

impl From<tags::Model> for TagResponse {
    fn from(m: tags::Model) -> Self {
        Self {
            id: TagId::from_raw(m.id),
            name: m.name,
            description: m.description,
        }
    }
}

fn repo(state: &AppState) -> TagRepository {
    TagRepository::new(Arc::clone(&state.db))
}

/// GET `/tags`
async fn list_tags(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<Vec<TagResponse>>> {
    let tags = repo(&state).list(auth.user_id()).await?;
    Ok(Json(tags.into_iter().map(TagResponse::from).collect()))
}

/// POST `/tags`
async fn create_tag(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidJson(payload): ValidJson<TagRequest>,
) -> ApiResult<(StatusCode, Json<TagResponse>)> {
    let created = repo(&state)
        .create(
            auth.user_id(),
            CreateTagInput {
                name: payload.name,
                description: payload.description,
            },
        )
        .await?;

    info!(user_id = %auth.user_id(), tag_id = created.id, "Tag created");
    Ok((StatusCode::CREATED, Json(created.into())))
}

/// GET `/tags/{id}`
async fn get_tag(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<TagId>,
) -> ApiResult<Json<TagResponse>> {
    repo(&state)
        .find(auth.user_id(), id)
        .await?
        .map(|m| Json(m.into()))
        .ok_or_else(|| ApiError::not_found("Tag"))
}

/// PUT `/tags/{id}`
async fn replace_tag(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<TagId>,
    ValidJson(payload): ValidJson<TagRequest>,
) -> ApiResult<Json<TagResponse>> {
    let input = UpdateTagInput::from(CreateTagInput {
        name: payload.name,
        description: payload.description,
    });
    store_update(&state, &auth, id, input).await
}

/// PATCH `/tags/{id}`
async fn update_tag(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<TagId>,
    ValidJson(payload): ValidJson<PatchTagRequest>,
) -> ApiResult<Json<TagResponse>> {
    let input = UpdateTagInput {
        name: payload.name,
        description: payload.description,
    };
    store_update(&state, &auth, id, input).await
}

async fn store_update(
    state: &AppState,
    auth: &AuthUser,
    id: TagId,
    input: UpdateTagInput,
) -> ApiResult<Json<TagResponse>> {
    let updated = repo(state)
        .update(auth.user_id(), id, input)
        .await?
        .ok_or_else(|| ApiError::not_found("Tag"))?;

    info!(user_id = %auth.user_id(), tag_id = %id, "Tag updated");
    Ok(Json(updated.into()))
}

/// DELETE `/tags/{id}` - Detaches the tag from every operation.
async fn delete_tag(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<TagId>,
) -> ApiResult<StatusCode> {
    if !repo(&state).delete(auth.user_id(), id).await? {
        return Err(ApiError::not_found("Tag"));
    }

    info!(user_id = %auth.user_id(), tag_id = %id, "Tag deleted");
    Ok(StatusCode::NO_CONTENT)
}
