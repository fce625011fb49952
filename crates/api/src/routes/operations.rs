//! Operation routes, including the filtered listing and the balance
//! endpoints.

use std::sync::Arc;

use axum::{Json, Router, extract::State, http::StatusCode, routing::get};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use super::accounts::AccountResponse;
use super::tags::TagResponse;
use crate::extractors::{ApiPath, ApiQuery, ValidJson};
use crate::{ApiResult, AppState, middleware::AuthUser};
use tally_core::balance::Balance;
use tally_core::operation::{DateScope, OperationFilter};
use tally_db::repositories::{
    CreateOperationInput, OperationDetail, OperationRepository, OperationWithTags,
    UpdateOperationInput,
};
use tally_shared::types::{AccountId, Amount, OperationId, TagId};

/// Creates the operation routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/operations", get(list_operations).post(create_operation))
        .route("/operations/total-balance", get(total_balance))
        .route(
            "/operations/account-balance/{account_id}",
            get(account_balance),
        )
        .route(
            "/operations/{id}",
            get(get_operation)
                .put(replace_operation)
                .patch(update_operation)
                .delete(delete_operation),
        )
}

/// Query parameters for listing operations.
///
/// `tags` and `account` are comma-separated id lists. `month` and `day`
/// only apply together with `year`.
#[derive(Debug, Default, Deserialize)]
pub struct ListOperationsQuery {
    /// Operations carrying any of these tags.
    pub tags: Option<String>,
    /// Operations on any of these accounts.
    pub account: Option<String>,
    /// Calendar year.
    pub year: Option<i32>,
    /// Month of `year`, 1-12.
    pub month: Option<u32>,
    /// Day of `month`.
    pub day: Option<u32>,
}

/// Date window of a balance query.
#[derive(Debug, Default, Clone, Copy, Deserialize)]
pub struct BalanceQuery {
    /// Calendar year.
    pub year: Option<i32>,
    /// Month of `year`, 1-12.
    pub month: Option<u32>,
    /// Day of `month`.
    pub day: Option<u32>,
}

impl BalanceQuery {
    fn scope(self) -> DateScope {
        DateScope::from_parts(self.year, self.month, self.day)
    }
}

/// Full operation body, used by POST and PUT.
#[derive(Debug, Deserialize, Validate)]
pub struct OperationRequest {
    /// Display name.
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    /// Description.
    #[serde(default)]
    #[validate(length(max = 255))]
    pub description: String,
    /// Signed value, at most two decimal places.
    pub value: Amount,
    /// Operation date.
    #[serde(default)]
    pub date: Option<NaiveDate>,
    /// Account the operation belongs to.
    pub account: AccountId,
    /// Tags. Omitting the list on PUT clears the tags.
    #[serde(default)]
    pub tags: Vec<TagId>,
}

/// Partial operation body, used by PATCH.
#[derive(Debug, Deserialize, Validate)]
pub struct PatchOperationRequest {
    /// Display name.
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    /// Description.
    #[validate(length(max = 255))]
    pub description: Option<String>,
    /// Signed value.
    pub value: Option<Amount>,
    /// Absent leaves the date alone, `null` clears it.
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub date: Option<Option<NaiveDate>>,
    /// Account.
    pub account: Option<AccountId>,
    /// Replaces the whole tag set.
    pub tags: Option<Vec<TagId>>,
}

/// Operation representation.
#[derive(Debug, Serialize)]
pub struct OperationResponse {
    /// Operation ID.
    pub id: OperationId,
    /// Display name.
    pub name: String,
    /// Description.
    pub description: String,
    /// Signed value.
    pub value: Decimal,
    /// Operation date.
    pub date: Option<NaiveDate>,
    /// Tag IDs.
    pub tags: Vec<TagId>,
    /// Account ID.
    pub account: AccountId,
}

impl From<OperationWithTags> for OperationResponse {
    fn from(o: OperationWithTags) -> Self {
        Self {
            id: OperationId::from_raw(o.operation.id),
            name: o.operation.name,
            description: o.operation.description,
            value: o.operation.value,
            date: o.operation.date,
            tags: o.tags,
            account: AccountId::from_raw(o.operation.account_id),
        }
    }
}

/// Operation representation with tags and account nested.
#[derive(Debug, Serialize)]
pub struct OperationDetailResponse {
    /// Operation ID.
    pub id: OperationId,
    /// Display name.
    pub name: String,
    /// Description.
    pub description: String,
    /// Signed value.
    pub value: Decimal,
    /// Operation date.
    pub date: Option<NaiveDate>,
    /// Tags.
    pub tags: Vec<TagResponse>,
    /// Account.
    pub account: AccountResponse,
}

impl From<OperationDetail> for OperationDetailResponse {
    fn from(d: OperationDetail) -> Self {
        Self {
            id: OperationId::from_raw(d.operation.id),
            name: d.operation.name,
            description: d.operation.description,
            value: d.operation.value,
            date: d.operation.date,
            tags: d.tags.into_iter().map(TagResponse::from).collect(),
            account: d.account.into(),
        }
    }
}

/// Balance of one account, or of all calculated accounts.
#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    /// Account ID, absent for the total balance.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<AccountId>,
    /// Sum of operation values, two decimal places.
    pub balance: Decimal,
    /// Number of operations summed.
    pub operation_count: u64,
    /// Requested year.
    pub year: Option<i32>,
    /// Requested month.
    pub month: Option<u32>,
    /// Requested day.
    pub day: Option<u32>,
}

impl BalanceResponse {
    fn new(balance: Balance, query: BalanceQuery) -> Self {
        Self {
            account_id: balance.account_id,
            balance: balance.total,
            operation_count: balance.operation_count,
            year: query.year,
            month: query.month,
            day: query.day,
        }
    }
}

impl From<OperationRequest> for CreateOperationInput {
    fn from(r: OperationRequest) -> Self {
        Self {
            name: r.name,
            description: r.description,
            value: r.value,
            date: r.date,
            account: r.account,
            tags: r.tags,
        }
    }
}

fn repo(state: &AppState) -> OperationRepository {
    OperationRepository::new(Arc::clone(&state.db))
}

/// GET `/operations?tags=1,2&account=3&year=&month=&day=`
async fn list_operations(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiQuery(query): ApiQuery<ListOperationsQuery>,
) -> ApiResult<Json<Vec<OperationResponse>>> {
    let filter = OperationFilter::from_query(
        query.tags.as_deref(),
        query.account.as_deref(),
        query.year,
        query.month,
        query.day,
    )?;

    let operations = repo(&state).list(auth.user_id(), &filter).await?;
    Ok(Json(
        operations.into_iter().map(OperationResponse::from).collect(),
    ))
}

/// POST `/operations`
async fn create_operation(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidJson(payload): ValidJson<OperationRequest>,
) -> ApiResult<(StatusCode, Json<OperationResponse>)> {
    let created = repo(&state).create(auth.user_id(), payload.into()).await?;

    info!(
        user_id = %auth.user_id(),
        operation_id = created.operation.id,
        account_id = created.operation.account_id,
        "Operation created"
    );
    Ok((StatusCode::CREATED, Json(created.into())))
}

/// GET `/operations/{id}` - Operation with tags and account nested.
async fn get_operation(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<OperationId>,
) -> ApiResult<Json<OperationDetailResponse>> {
    let detail = repo(&state).find_detail(auth.user_id(), id).await?;
    Ok(Json(detail.into()))
}

/// PUT `/operations/{id}`
async fn replace_operation(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<OperationId>,
    ValidJson(payload): ValidJson<OperationRequest>,
) -> ApiResult<Json<OperationResponse>> {
    let input = UpdateOperationInput::from(CreateOperationInput::from(payload));
    store_update(&state, &auth, id, input).await
}

/// PATCH `/operations/{id}`
async fn update_operation(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<OperationId>,
    ValidJson(payload): ValidJson<PatchOperationRequest>,
) -> ApiResult<Json<OperationResponse>> {
    let input = UpdateOperationInput {
        name: payload.name,
        description: payload.description,
        value: payload.value,
        date: payload.date,
        account: payload.account,
        tags: payload.tags,
    };
    store_update(&state, &auth, id, input).await
}

async fn store_update(
    state: &AppState,
    auth: &AuthUser,
    id: OperationId,
    input: UpdateOperationInput,
) -> ApiResult<Json<OperationResponse>> {
    let updated = repo(state).update(auth.user_id(), id, input).await?;

    info!(user_id = %auth.user_id(), operation_id = %id, "Operation updated");
    Ok(Json(updated.into()))
}

/// DELETE `/operations/{id}`
async fn delete_operation(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(id): ApiPath<OperationId>,
) -> ApiResult<StatusCode> {
    repo(&state).delete(auth.user_id(), id).await?;

    info!(user_id = %auth.user_id(), operation_id = %id, "Operation deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// GET `/operations/account-balance/{account_id}?year=&month=&day=`
///
/// Unknown or foreign accounts are a 400, not an empty sum.
async fn account_balance(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiPath(account_id): ApiPath<AccountId>,
    ApiQuery(query): ApiQuery<BalanceQuery>,
) -> ApiResult<Json<BalanceResponse>> {
    let balance = repo(&state)
        .account_balance(auth.user_id(), account_id, query.scope())
        .await?;
    Ok(Json(BalanceResponse::new(balance, query)))
}

/// GET `/operations/total-balance?year=&month=&day=`
async fn total_balance(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiQuery(query): ApiQuery<BalanceQuery>,
) -> ApiResult<Json<BalanceResponse>> {
    let balance = repo(&state)
        .total_balance(auth.user_id(), query.scope())
        .await?;
    Ok(Json(BalanceResponse::new(balance, query)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::test_support::TestApp;
    use rust_decimal_macros::dec;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use serde_json::json;
    use std::collections::BTreeMap;
    use tally_db::entities::{accounts, operation_tags, operations};

    fn value_row(value: Decimal) -> BTreeMap<&'static str, sea_orm::Value> {
        BTreeMap::from([("value", sea_orm::Value::from(value))])
    }

    fn wallet() -> accounts::Model {
        accounts::Model {
            id: 3,
            user_id: 1,
            name: "Wallet".to_string(),
            active: true,
            account_type_id: None,
        }
    }

    fn lunch(id: i64) -> operations::Model {
        operations::Model {
            id,
            user_id: 1,
            account_id: 3,
            name: "Lunch".to_string(),
            description: String::new(),
            value: dec!(-12.30),
            date: NaiveDate::from_ymd_opt(2023, 5, 4),
        }
    }

    #[test]
    fn test_request_rejects_three_decimal_places() {
        let parsed = serde_json::from_value::<OperationRequest>(json!({
            "name": "x", "value": "1.234", "account": 3
        }));
        assert!(parsed.is_err());
    }

    #[test]
    fn test_request_rejects_too_many_digits() {
        let parsed = serde_json::from_value::<OperationRequest>(json!({
            "name": "x", "value": "10000.00", "account": 3
        }));
        assert!(parsed.is_err());
    }

    #[tokio::test]
    async fn test_account_balance_response_shape() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[wallet()]])
            .append_query_results([[value_row(dec!(10.10)), value_row(dec!(2.2))]]);
        let app = TestApp::new(db);
        let token = app.token(1);

        let (status, body) = app
            .get(
                "/api/v1/operations/account-balance/3?year=2023&month=5",
                Some(&token),
            )
            .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({
                "account_id": 3,
                "balance": "12.30",
                "operation_count": 2,
                "year": 2023,
                "month": 5,
                "day": null,
            })
        );
    }

    #[tokio::test]
    async fn test_account_balance_of_unknown_account_is_bad_request() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<accounts::Model>::new()]);
        let app = TestApp::new(db);
        let token = app.token(1);

        let (status, body) = app
            .get("/api/v1/operations/account-balance/4", Some(&token))
            .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid_reference");
    }

    #[tokio::test]
    async fn test_total_balance_of_nothing_is_zero() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<BTreeMap<&'static str, sea_orm::Value>>::new()]);
        let app = TestApp::new(db);
        let token = app.token(1);

        let (status, body) = app
            .get("/api/v1/operations/total-balance", Some(&token))
            .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["balance"], "0.00");
        assert_eq!(body["operation_count"], 0);
        assert!(body.get("account_id").is_none());
    }

    #[tokio::test]
    async fn test_list_rejects_malformed_tag_list() {
        let app = TestApp::new(MockDatabase::new(DatabaseBackend::Postgres));
        let token = app.token(1);

        let (status, body) = app
            .get("/api/v1/operations?tags=1,a", Some(&token))
            .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "validation_error");
    }

    #[tokio::test]
    async fn test_list_includes_tag_ids() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[lunch(8), lunch(7)]])
            .append_query_results([[
                operation_tags::Model {
                    operation_id: 7,
                    tag_id: 1,
                },
                operation_tags::Model {
                    operation_id: 8,
                    tag_id: 2,
                },
                operation_tags::Model {
                    operation_id: 8,
                    tag_id: 5,
                },
            ]]);
        let app = TestApp::new(db);
        let token = app.token(1);

        let (status, body) = app
            .get("/api/v1/operations?tags=2,5,1", Some(&token))
            .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["id"], 8);
        assert_eq!(body[0]["tags"], json!([2, 5]));
        assert_eq!(body[0]["value"], "-12.30");
        assert_eq!(body[0]["date"], "2023-05-04");
        assert_eq!(body[1]["tags"], json!([1]));
        assert_eq!(body[1]["account"], 3);
    }

    #[tokio::test]
    async fn test_foreign_operation_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).append_exec_results([
            MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            },
        ]);
        let app = TestApp::new(db);
        let token = app.token(2);

        let (status, _) = app.delete("/api/v1/operations/7", Some(&token)).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
