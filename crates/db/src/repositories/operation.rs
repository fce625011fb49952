//! Operation repository: filtered listings, CRUD with tag links, balances.
//!
//! Listings and balances are built from a [`OperationFilter`] /
//! [`DateScope`] and always restricted to the requesting owner. Balances are
//! summed in Rust with `rust_decimal`, never in floating point.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, FromQueryResult, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
    sea_query::{Expr, Query, SelectStatement},
};
use tally_core::balance::{Balance, BalanceError};
use tally_core::operation::{DateScope, OperationFilter};
use tally_shared::AppError;
use tally_shared::types::{AccountId, Amount, OperationId, TagId, UserId};
use tracing::debug;

use crate::entities::{account_types, accounts, operation_tags, operations, tags};
use crate::ownership::{OwnerScoped, all_owned};

/// Error types for operation operations.
#[derive(Debug, thiserror::Error)]
pub enum OperationError {
    /// Operation not found (or owned by someone else).
    #[error("Operation not found: {0}")]
    NotFound(OperationId),

    /// Referenced account not found (or owned by someone else).
    #[error("Invalid account: {0}")]
    AccountNotFound(AccountId),

    /// At least one referenced tag not found (or owned by someone else).
    #[error("Invalid tags: one or more tags do not exist")]
    TagNotFound,

    /// Balance could not be summed.
    #[error("Balance error: {0}")]
    Balance(#[from] BalanceError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<OperationError> for AppError {
    fn from(e: OperationError) -> Self {
        match e {
            OperationError::NotFound(_) => Self::NotFound(e.to_string()),
            OperationError::AccountNotFound(_) | OperationError::TagNotFound => {
                Self::InvalidReference(e.to_string())
            }
            OperationError::Balance(b) => Self::Internal(b.to_string()),
            OperationError::Database(db) => Self::Database(db.to_string()),
        }
    }
}

/// Operation with the ids of its tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationWithTags {
    /// The operation record.
    pub operation: operations::Model,
    /// Tag ids, ascending.
    pub tags: Vec<TagId>,
}

/// Operation with its tags and account loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationDetail {
    /// The operation record.
    pub operation: operations::Model,
    /// Tags, by name.
    pub tags: Vec<tags::Model>,
    /// Owning account.
    pub account: accounts::Model,
}

/// Input for creating an operation.
#[derive(Debug, Clone)]
pub struct CreateOperationInput {
    /// Display name.
    pub name: String,
    /// Free-form description, may be empty.
    pub description: String,
    /// Signed value. Negative is a debit.
    pub value: Amount,
    /// Operation date.
    pub date: Option<NaiveDate>,
    /// Account, must be owned by the same user.
    pub account: AccountId,
    /// Tags, must be owned by the same user.
    pub tags: Vec<TagId>,
}

/// Input for updating an operation. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct UpdateOperationInput {
    /// Display name.
    pub name: Option<String>,
    /// Description.
    pub description: Option<String>,
    /// Signed value.
    pub value: Option<Amount>,
    /// `Some(None)` clears the date.
    pub date: Option<Option<NaiveDate>>,
    /// Account.
    pub account: Option<AccountId>,
    /// Replaces the whole tag set.
    pub tags: Option<Vec<TagId>>,
}

impl From<CreateOperationInput> for UpdateOperationInput {
    fn from(input: CreateOperationInput) -> Self {
        Self {
            name: Some(input.name),
            description: Some(input.description),
            value: Some(input.value),
            date: Some(input.date),
            account: Some(input.account),
            tags: Some(input.tags),
        }
    }
}

#[derive(Debug, FromQueryResult)]
struct ValueRow {
    value: Decimal,
}

/// Builds the `WHERE` clause for a filtered listing of `owner`'s operations.
#[must_use]
pub fn filter_condition(owner: UserId, filter: &OperationFilter) -> Condition {
    let mut condition =
        Condition::all().add(operations::Column::UserId.eq(owner.into_inner()));

    if let Some(tag_ids) = &filter.tags {
        let tagged = Query::select()
            .column(operation_tags::Column::OperationId)
            .from(operation_tags::Entity)
            .and_where(
                operation_tags::Column::TagId.is_in(tag_ids.iter().map(TagId::into_inner)),
            )
            .to_owned();
        condition = condition.add(operations::Column::Id.in_subquery(tagged));
    }

    if let Some(account_ids) = &filter.accounts {
        condition = condition.add(
            operations::Column::AccountId.is_in(account_ids.iter().map(AccountId::into_inner)),
        );
    }

    add_date_scope(condition, &filter.date)
}

fn add_date_scope(condition: Condition, scope: &DateScope) -> Condition {
    match scope {
        DateScope::All => condition,
        DateScope::Span(span) => condition
            .add(operations::Column::Date.gte(span.start()))
            .add(operations::Column::Date.lt(span.end())),
        DateScope::Never => condition.add(Expr::value(false)),
    }
}

/// Ids of `owner`'s accounts that count towards the total balance: accounts
/// without a type, or whose type has `calculate = true`.
fn calculated_accounts(owner: UserId) -> SelectStatement {
    let calculating_types = Query::select()
        .column(account_types::Column::Id)
        .from(account_types::Entity)
        .and_where(account_types::Column::UserId.eq(owner.into_inner()))
        .and_where(account_types::Column::Calculate.eq(true))
        .to_owned();

    Query::select()
        .column(accounts::Column::Id)
        .from(accounts::Entity)
        .and_where(accounts::Column::UserId.eq(owner.into_inner()))
        .cond_where(
            Condition::any()
                .add(accounts::Column::AccountTypeId.is_null())
                .add(accounts::Column::AccountTypeId.in_subquery(calculating_types)),
        )
        .to_owned()
}

/// Operation repository, always scoped to one owner.
#[derive(Debug, Clone)]
pub struct OperationRepository {
    db: Arc<DatabaseConnection>,
}

impl OperationRepository {
    /// Creates a new operation repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Lists the owner's operations matching `filter`, newest id first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(
        &self,
        owner: UserId,
        filter: &OperationFilter,
    ) -> Result<Vec<OperationWithTags>, OperationError> {
        let operations = operations::Entity::find()
            .filter(filter_condition(owner, filter))
            .order_by_desc(operations::Column::Id)
            .all(self.db.as_ref())
            .await?;

        let ids: Vec<i64> = operations.iter().map(|o| o.id).collect();
        let mut tag_map = load_tag_ids(self.db.as_ref(), &ids).await?;

        Ok(operations
            .into_iter()
            .map(|operation| {
                let tags = tag_map.remove(&operation.id).unwrap_or_default();
                OperationWithTags { operation, tags }
            })
            .collect())
    }

    /// Finds one of the owner's operations with its tag ids.
    ///
    /// # Errors
    ///
    /// Returns `OperationError::NotFound` if the operation is not owned by `owner`.
    pub async fn find(
        &self,
        owner: UserId,
        id: OperationId,
    ) -> Result<OperationWithTags, OperationError> {
        find_with_tags(self.db.as_ref(), owner, id).await
    }

    /// Finds one of the owner's operations with its tags and account loaded.
    ///
    /// # Errors
    ///
    /// Returns `OperationError::NotFound` if the operation is not owned by `owner`.
    pub async fn find_detail(
        &self,
        owner: UserId,
        id: OperationId,
    ) -> Result<OperationDetail, OperationError> {
        let (operation, account) = operations::Entity::find_owned_by_id(owner, id)
            .find_also_related(accounts::Entity)
            .one(self.db.as_ref())
            .await?
            .ok_or(OperationError::NotFound(id))?;

        // account_id is NOT NULL with a cascading FK
        let account = account.ok_or(OperationError::NotFound(id))?;

        let tags = tags::Entity::find()
            .inner_join(operation_tags::Entity)
            .filter(operation_tags::Column::OperationId.eq(operation.id))
            .order_by_asc(tags::Column::Name)
            .all(self.db.as_ref())
            .await?;

        Ok(OperationDetail {
            operation,
            tags,
            account,
        })
    }

    /// Creates an operation and its tag links in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `OperationError::AccountNotFound` or `OperationError::TagNotFound`
    /// if a reference is not owned by `owner`.
    pub async fn create(
        &self,
        owner: UserId,
        input: CreateOperationInput,
    ) -> Result<OperationWithTags, OperationError> {
        let txn = self.db.begin().await?;

        ensure_account(&txn, owner, input.account).await?;
        ensure_tags(&txn, owner, &input.tags).await?;

        let operation = operations::ActiveModel {
            user_id: Set(owner.into_inner()),
            account_id: Set(input.account.into_inner()),
            name: Set(input.name),
            description: Set(input.description),
            value: Set(input.value.value()),
            date: Set(input.date),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let tags = replace_tags(&txn, operation.id, &input.tags).await?;
        txn.commit().await?;

        debug!(operation_id = operation.id, tags = tags.len(), "Operation stored");
        Ok(OperationWithTags { operation, tags })
    }

    /// Updates one of the owner's operations.
    ///
    /// A supplied tag list replaces the existing tag set.
    ///
    /// # Errors
    ///
    /// Returns `OperationError::NotFound` for a foreign operation and
    /// `OperationError::AccountNotFound` / `OperationError::TagNotFound` for
    /// foreign references.
    pub async fn update(
        &self,
        owner: UserId,
        id: OperationId,
        input: UpdateOperationInput,
    ) -> Result<OperationWithTags, OperationError> {
        let txn = self.db.begin().await?;

        let existing = operations::Entity::find_owned_by_id(owner, id)
            .one(&txn)
            .await?
            .ok_or(OperationError::NotFound(id))?;

        if let Some(account) = input.account {
            ensure_account(&txn, owner, account).await?;
        }
        if let Some(tag_ids) = &input.tags {
            ensure_tags(&txn, owner, tag_ids).await?;
        }

        let mut active: operations::ActiveModel = existing.clone().into();
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(description) = input.description {
            active.description = Set(description);
        }
        if let Some(value) = input.value {
            active.value = Set(value.value());
        }
        if let Some(date) = input.date {
            active.date = Set(date);
        }
        if let Some(account) = input.account {
            active.account_id = Set(account.into_inner());
        }

        let operation = if active.is_changed() {
            active.update(&txn).await?
        } else {
            existing
        };

        let tags = match &input.tags {
            Some(tag_ids) => replace_tags(&txn, operation.id, tag_ids).await?,
            None => load_tag_ids(&txn, &[operation.id])
                .await?
                .remove(&operation.id)
                .unwrap_or_default(),
        };

        txn.commit().await?;
        Ok(OperationWithTags { operation, tags })
    }

    /// Deletes one of the owner's operations and its tag links.
    ///
    /// # Errors
    ///
    /// Returns `OperationError::NotFound` if nothing was deleted.
    pub async fn delete(&self, owner: UserId, id: OperationId) -> Result<(), OperationError> {
        let result = operations::Entity::delete_owned_by_id(owner, id)
            .exec(self.db.as_ref())
            .await?;

        if result.rows_affected == 0 {
            return Err(OperationError::NotFound(id));
        }
        Ok(())
    }

    /// Sums the values of `owner`'s operations on one account inside `scope`.
    ///
    /// The account must belong to `owner`; operations are filtered on both
    /// the account and the owner.
    ///
    /// # Errors
    ///
    /// Returns `OperationError::AccountNotFound` if the account does not exist
    /// or is owned by someone else.
    pub async fn account_balance(
        &self,
        owner: UserId,
        account_id: AccountId,
        scope: DateScope,
    ) -> Result<Balance, OperationError> {
        ensure_account(self.db.as_ref(), owner, account_id).await?;

        let filter = OperationFilter::default()
            .with_accounts([account_id])
            .with_date(scope);
        let values = self
            .sum_query(filter_condition(owner, &filter))
            .await?;

        Ok(Balance::from_values(Some(account_id), values)?)
    }

    /// Sums the values of `owner`'s operations inside `scope` over every
    /// account that counts towards the total.
    ///
    /// Accounts whose type has `calculate = false` are left out; accounts
    /// without a type are included.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn total_balance(
        &self,
        owner: UserId,
        scope: DateScope,
    ) -> Result<Balance, OperationError> {
        let condition = add_date_scope(
            Condition::all()
                .add(operations::Column::UserId.eq(owner.into_inner()))
                .add(operations::Column::AccountId.in_subquery(calculated_accounts(owner))),
            &scope,
        );
        let values = self.sum_query(condition).await?;

        Ok(Balance::from_values(None, values)?)
    }

    async fn sum_query(&self, condition: Condition) -> Result<Vec<Decimal>, DbErr> {
        let rows = operations::Entity::find()
            .select_only()
            .column(operations::Column::Value)
            .filter(condition)
            .into_model::<ValueRow>()
            .all(self.db.as_ref())
            .await?;

        Ok(rows.into_iter().map(|row| row.value).collect())
    }
}

async fn find_with_tags<C: ConnectionTrait>(
    db: &C,
    owner: UserId,
    id: OperationId,
) -> Result<OperationWithTags, OperationError> {
    let operation = operations::Entity::find_owned_by_id(owner, id)
        .one(db)
        .await?
        .ok_or(OperationError::NotFound(id))?;

    let tags = load_tag_ids(db, &[operation.id])
        .await?
        .remove(&operation.id)
        .unwrap_or_default();

    Ok(OperationWithTags { operation, tags })
}

async fn load_tag_ids<C: ConnectionTrait>(
    db: &C,
    operation_ids: &[i64],
) -> Result<HashMap<i64, Vec<TagId>>, DbErr> {
    if operation_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let links = operation_tags::Entity::find()
        .filter(operation_tags::Column::OperationId.is_in(operation_ids.iter().copied()))
        .order_by_asc(operation_tags::Column::TagId)
        .all(db)
        .await?;

    let mut map: HashMap<i64, Vec<TagId>> = HashMap::new();
    for link in links {
        map.entry(link.operation_id)
            .or_default()
            .push(TagId::from_raw(link.tag_id));
    }
    Ok(map)
}

async fn ensure_account<C: ConnectionTrait>(
    db: &C,
    owner: UserId,
    id: AccountId,
) -> Result<(), OperationError> {
    accounts::Entity::find_owned_by_id(owner, id)
        .one(db)
        .await?
        .map(|_| ())
        .ok_or(OperationError::AccountNotFound(id))
}

async fn ensure_tags<C: ConnectionTrait>(
    db: &C,
    owner: UserId,
    ids: &[TagId],
) -> Result<(), OperationError> {
    if all_owned::<tags::Entity, _>(db, owner, ids).await? {
        Ok(())
    } else {
        Err(OperationError::TagNotFound)
    }
}

/// Replaces the tag links of an operation, returning the new tag ids ascending.
async fn replace_tags<C: ConnectionTrait>(
    db: &C,
    operation_id: i64,
    ids: &[TagId],
) -> Result<Vec<TagId>, DbErr> {
    operation_tags::Entity::delete_many()
        .filter(operation_tags::Column::OperationId.eq(operation_id))
        .exec(db)
        .await?;

    let mut ids = ids.to_vec();
    ids.sort_unstable();
    ids.dedup();

    if !ids.is_empty() {
        let links = ids.iter().map(|tag_id| operation_tags::ActiveModel {
            operation_id: Set(operation_id),
            tag_id: Set(tag_id.into_inner()),
        });
        operation_tags::Entity::insert_many(links)
            .exec_without_returning(db)
            .await?;
    }

    Ok(ids)
}
