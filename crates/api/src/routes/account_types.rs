//! Account type routes.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::get,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use crate::extractors::{ApiPath, ValidJson};
use crate::{ApiError, ApiResult, AppState, middleware::AuthUser};
use tally_db::entities::account_types;
use tally_db::repositories::{
    AccountTypeRepository, CreateAccountTypeInput, UpdateAccountTypeInput,
};
use tally_shared::types::AccountTypeId;

/// Creates the account type routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/account-types",
            get(list_account_types).post(create_account_type),
        )
        .route(
            "/account-types/{id}",
            get(get_account_type)
                .put(replace_account_type)
                .patch(update_account_type)
                .delete(delete_account_type),
        )
}

pub(crate) const fn default_true() -> bool {
    true
}

/// Full account type body, used by POST and PUT.
#[derive(Debug, Deserialize, Validate)]
pub struct AccountTypeRequest {
    /// Display name.
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    /// Description.
    #[serde(default)]
    #[validate(length(max = 255))]
    pub description: String,
    /// Whether accounts of this type count towards the total balance.
    #[serde(default = "default_true")]
    pub calculate: bool,
}

/// Partial account type body, used by PATCH.
#[derive(Debug, Deserialize, Validate)]
pub struct PatchAccountTypeRequest {
    /// Display name.
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    /// Description.
    #[validate(length(max = 255))]
    pub description: Option<String>,
    /// Calculation flag.
    pub calculate: Option<bool>,
}

/// Account type representation.
#[derive(Debug, Serialize)]
pub struct AccountTypeResponse {
    /// Account type ID.
    pub id: AccountTypeId,
    /// Display name.
    pub name: String,
    /// Description.
    pub description: String,
    /// Calculation flag.
    pub calculate: bool,
}

impl From<account_types::Model> for AccountTypeResponse {
    fn from(m: account_types::Model) -> Self {
        Self {
            id: AccountTypeId::from_raw(m.id),
            name: m.name,
            description: m.description,
            calculate: m.calculate,
        }
    }
}

impl From<AccountTypeRequest> for CreateAccountTypeInput {
    fn from(r: AccountTypeRequest) -> Self {
        Self {
            name: r.name,
            description: r.description,
            calculate: r.calculate,
        }
    }
}

fn repo(state: &AppState) -> AccountTypeRepository {
    AccountTypeRepository::new(Arc::clone(&state.db))
}

/// GET `/account-types`
async fn list_account_types(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<Vec<AccountTypeResponse>>> {
    let types = repo(&state).list(auth.user_id()).await?;
    Ok(Json(types.into_iter().map(Into::into).collect()))
}

/// POST `/account-types`
async fn create_account_type(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidJson(payload): ValidJson<AccountTypeRequest>,
) -> ApiResult<(StatusCode, Json<AccountTypeResponse>)> {
    let created = repo(&state).create(auth.user_id(), payload.into()).await?;

    info!(user_id = %auth.user_id(), account_type_id = created.id, "Account type created");
    Ok((StatusCode::CREATED, Json(created.into())))
}

/// GET `/account-types/{id}`
async fn get_account_type(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<AccountTypeId>,
) -> ApiResult<Json<AccountTypeResponse>> {
    repo(&state)
        .find(auth.user_id(), id)
        .await?
        .map(|m| Json(m.into()))
        .ok_or_else(|| ApiError::not_found("Account type"))
}

/// PUT `/account-types/{id}`
async fn replace_account_type(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<AccountTypeId>,
    ValidJson(payload): ValidJson<AccountTypeRequest>,
) -> ApiResult<Json<AccountTypeResponse>> {
    let input = UpdateAccountTypeInput::from(CreateAccountTypeInput::from(payload));
    store_update(&state, &auth, id, input).await
}

/// PATCH `/account-types/{id}`
async fn update_account_type(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<AccountTypeId>,
    ValidJson(payload): ValidJson<PatchAccountTypeRequest>,
) -> ApiResult<Json<AccountTypeResponse>> {
    let input = UpdateAccountTypeInput {
        name: payload.name,
        description: payload.description,
        calculate: payload.calculate,
    };
    store_update(&state, &auth, id, input).await
}

async fn store_update(
    state: &AppState,
    auth: &AuthUser,
    id: AccountTypeId,
    input: UpdateAccountTypeInput,
) -> ApiResult<Json<AccountTypeResponse>> {
    let updated = repo(state)
        .update(auth.user_id(), id, input)
        .await?
        .ok_or_else(|| ApiError::not_found("Account type"))?;

    info!(user_id = %auth.user_id(), account_type_id = %id, "Account type updated");
    Ok(Json(updated.into()))
}

/// DELETE `/account-types/{id}` - Accounts of this type are kept, untyped.
async fn delete_account_type(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<AccountTypeId>,
) -> ApiResult<StatusCode> {
    if !repo(&state).delete(auth.user_id(), id).await? {
        return Err(ApiError::not_found("Account type"));
    }

    info!(user_id = %auth.user_id(), account_type_id = %id, "Account type deleted");
    Ok(StatusCode::NO_CONTENT)
}
