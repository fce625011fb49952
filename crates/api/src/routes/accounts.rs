//! Account routes.

use std::sync::Arc;

use axum::{Json, Router, extract::State, http::StatusCode, routing::get};
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use super::account_types::{AccountTypeResponse, default_true};
use crate::extractors::{ApiPath, ValidJson};
use crate::{ApiResult, AppState, middleware::AuthUser};
use tally_db::entities::accounts;
use tally_db::repositories::{
    AccountRepository, AccountWithType, CreateAccountInput, UpdateAccountInput,
};
use tally_shared::types::{AccountId, AccountTypeId};

/// Creates the account routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/accounts", get(list_accounts).post(create_account))
        .route(
            "/accounts/{id}",
            get(get_account)
                .put(replace_account)
                .patch(update_account)
                .delete(delete_account),
        )
}

/// Full account body, used by POST and PUT.
#[derive(Debug, Deserialize, Validate)]
pub struct AccountRequest {
    /// Display name.
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    /// Whether the account is active (default: true).
    #[serde(default = "default_true")]
    pub active: bool,
    /// Account type, if any.
    #[serde(default)]
    pub account_type: Option<AccountTypeId>,
}

/// Partial account body, used by PATCH.
#[derive(Debug, Deserialize, Validate)]
pub struct PatchAccountRequest {
    /// Display name.
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    /// Whether the account is active.
    pub active: Option<bool>,
    /// Absent leaves the type alone, `null` clears it.
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub account_type: Option<Option<AccountTypeId>>,
}

/// Account representation.
#[derive(Debug, Serialize)]
pub struct AccountResponse {
    /// Account ID.
    pub id: AccountId,
    /// Display name.
    pub name: String,
    /// Whether the account is active.
    pub active: bool,
    /// Account type ID.
    pub account_type: Option<AccountTypeId>,
}

impl From<accounts::Model> for AccountResponse {
    fn from(m: accounts::Model) -> Self {
        Self {
            id: AccountId::from_raw(m.id),
            name: m.name,
            active: m.active,
            account_type: m.account_type_id.map(AccountTypeId::from_raw),
        }
    }
}

/// Account representation with the account type nested.
#[derive(Debug, Serialize)]
pub struct AccountDetailResponse {
    /// Account ID.
    pub id: AccountId,
    /// Display name.
    pub name: String,
    /// Whether the account is active.
    pub active: bool,
    /// Account type.
    pub account_type: Option<AccountTypeResponse>,
}

impl From<AccountWithType> for AccountDetailResponse {
    fn from(a: AccountWithType) -> Self {
        Self {
            id: AccountId::from_raw(a.account.id),
            name: a.account.name,
            active: a.account.active,
            account_type: a.account_type.map(Into::into),
        }
    }
}

impl From<AccountRequest> for CreateAccountInput {
    fn from(r: AccountRequest) -> Self {
        Self {
            name: r.name,
            active: r.active,
            account_type: r.account_type,
        }
    }
}

fn repo(state: &AppState) -> AccountRepository {
    AccountRepository::new(Arc::clone(&state.db))
}

/// GET `/accounts`
async fn list_accounts(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<Vec<AccountResponse>>> {
    let accounts = repo(&state).list(auth.user_id()).await?;
    Ok(Json(accounts.into_iter().map(AccountResponse::from).collect()))
}

/// POST `/accounts`
async fn create_account(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidJson(payload): ValidJson<AccountRequest>,
) -> ApiResult<(StatusCode, Json<AccountResponse>)> {
    let created = repo(&state).create(auth.user_id(), payload.into()).await?;

    info!(user_id = %auth.user_id(), account_id = created.id, "Account created");
    Ok((StatusCode::CREATED, Json(created.into())))
}

/// GET `/accounts/{id}` - Account with its type nested.
async fn get_account(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<AccountId>,
) -> ApiResult<Json<AccountDetailResponse>> {
    let account = repo(&state).find_with_type(auth.user_id(), id).await?;
    Ok(Json(account.into()))
}

/// PUT `/accounts/{id}`
async fn replace_account(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<AccountId>,
    ValidJson(payload): ValidJson<AccountRequest>,
) -> ApiResult<Json<AccountResponse>> {
    let input = UpdateAccountInput::from(CreateAccountInput::from(payload));
    store_update(&state, &auth, id, input).await
}

/// PATCH `/accounts/{id}`
async fn update_account(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<AccountId>,
    ValidJson(payload): ValidJson<PatchAccountRequest>,
) -> ApiResult<Json<AccountResponse>> {
    let input = UpdateAccountInput {
        name: payload.name,
        active: payload.active,
        account_type: payload.account_type,
    };
    store_update(&state, &auth, id, input).await
}

async fn store_update(
    state: &AppState,
    auth: &AuthUser,
    id: AccountId,
    input: UpdateAccountInput,
) -> ApiResult<Json<AccountResponse>> {
    let updated = repo(state).update(auth.user_id(), id, input).await?;

    info!(user_id = %auth.user_id(), account_id = %id, "Account updated");
    Ok(Json(updated.into()))
}

/// DELETE `/accounts/{id}` - Also deletes the account's operations.
async fn delete_account(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<AccountId>,
) -> ApiResult<StatusCode> {
    repo(&state).delete(auth.user_id(), id).await?;

    info!(user_id = %auth.user_id(), account_id = %id, "Account deleted");
    Ok(StatusCode::NO_CONTENT)
}
