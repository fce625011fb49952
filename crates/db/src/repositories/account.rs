//! Account repository.

use std::sync::Arc;

use sea_orm::{ActiveModelTrait, DatabaseConnection, DbErr, QueryOrder, Set};
use tally_shared::AppError;
use tally_shared::types::{AccountId, AccountTypeId, UserId};

use crate::entities::{account_types, accounts};
use crate::ownership::OwnerScoped;

/// Error types for account operations.
#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    /// Account not found (or owned by someone else).
    #[error("Account not found: {0}")]
    NotFound(AccountId),

    /// Referenced account type not found (or owned by someone else).
    #[error("Invalid account type: {0}")]
    AccountTypeNotFound(AccountTypeId),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<AccountError> for AppError {
    fn from(e: AccountError) -> Self {
        match e {
            AccountError::NotFound(_) => Self::NotFound(e.to_string()),
            AccountError::AccountTypeNotFound(_) => Self::InvalidReference(e.to_string()),
            AccountError::Database(db) => Self::Database(db.to_string()),
        }
    }
}

/// Account together with its account type, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountWithType {
    /// The account record.
    pub account: accounts::Model,
    /// The account type, `None` when unset or deleted.
    pub account_type: Option<account_types::Model>,
}

/// Input for creating an account.
#[derive(Debug, Clone)]
pub struct CreateAccountInput {
    /// Display name.
    pub name: String,
    /// Whether the account is active.
    pub active: bool,
    /// Account type, must be owned by the same user.
    pub account_type: Option<AccountTypeId>,
}

/// Input for updating an account. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct UpdateAccountInput {
    /// Display name.
    pub name: Option<String>,
    /// Whether the account is active.
    pub active: Option<bool>,
    /// `Some(None)` clears the account type.
    pub account_type: Option<Option<AccountTypeId>>,
}

impl From<CreateAccountInput> for UpdateAccountInput {
    fn from(input: CreateAccountInput) -> Self {
        Self {
            name: Some(input.name),
            active: Some(input.active),
            account_type: Some(input.account_type),
        }
    }
}

/// Account repository, always scoped to one owner.
#[derive(Debug, Clone)]
pub struct AccountRepository {
    db: Arc<DatabaseConnection>,
}

impl AccountRepository {
    /// Creates a new account repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Lists the owner's accounts by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self, owner: UserId) -> Result<Vec<accounts::Model>, AccountError> {
        let accounts = accounts::Entity::find_owned(owner)
            .order_by_asc(accounts::Column::Name)
            .order_by_asc(accounts::Column::Id)
            .all(self.db.as_ref())
            .await?;
        Ok(accounts)
    }

    /// Finds one of the owner's accounts.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::NotFound` if the account does not exist or is
    /// owned by someone else.
    pub async fn find(&self, owner: UserId, id: AccountId) -> Result<accounts::Model, AccountError> {
        accounts::Entity::find_owned_by_id(owner, id)
            .one(self.db.as_ref())
            .await?
            .ok_or(AccountError::NotFound(id))
    }

    /// Finds one of the owner's accounts with its account type.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::NotFound` if the account does not exist or is
    /// owned by someone else.
    pub async fn find_with_type(
        &self,
        owner: UserId,
        id: AccountId,
    ) -> Result<AccountWithType, AccountError> {
        let (account, account_type) = accounts::Entity::find_owned_by_id(owner, id)
            .find_also_related(account_types::Entity)
            .one(self.db.as_ref())
            .await?
            .ok_or(AccountError::NotFound(id))?;

        Ok(AccountWithType {
            account,
            account_type,
        })
    }

    /// Creates an account owned by `owner`.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::AccountTypeNotFound` if the account type is not
    /// owned by `owner`.
    pub async fn create(
        &self,
        owner: UserId,
        input: CreateAccountInput,
    ) -> Result<accounts::Model, AccountError> {
        if let Some(type_id) = input.account_type {
            self.ensure_account_type(owner, type_id).await?;
        }

        let account = accounts::ActiveModel {
            user_id: Set(owner.into_inner()),
            name: Set(input.name),
            active: Set(input.active),
            account_type_id: Set(input.account_type.map(AccountTypeId::into_inner)),
            ..Default::default()
        }
        .insert(self.db.as_ref())
        .await?;

        Ok(account)
    }

    /// Updates one of the owner's accounts.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::NotFound` if the account is not owned by `owner`,
    /// or `AccountError::AccountTypeNotFound` for a foreign account type.
    pub async fn update(
        &self,
        owner: UserId,
        id: AccountId,
        input: UpdateAccountInput,
    ) -> Result<accounts::Model, AccountError> {
        let existing = self.find(owner, id).await?;

        if let Some(Some(type_id)) = input.account_type {
            self.ensure_account_type(owner, type_id).await?;
        }

        let mut active: accounts::ActiveModel = existing.clone().into();
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(is_active) = input.active {
            active.active = Set(is_active);
        }
        if let Some(account_type) = input.account_type {
            active.account_type_id = Set(account_type.map(AccountTypeId::into_inner));
        }

        if !active.is_changed() {
            return Ok(existing);
        }
        Ok(active.update(self.db.as_ref()).await?)
    }

    /// Deletes one of the owner's accounts and, through the foreign key,
    /// all of its operations.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::NotFound` if nothing was deleted.
    pub async fn delete(&self, owner: UserId, id: AccountId) -> Result<(), AccountError> {
        let result = accounts::Entity::delete_owned_by_id(owner, id)
            .exec(self.db.as_ref())
            .await?;

        if result.rows_affected == 0 {
            return Err(AccountError::NotFound(id));
        }
        Ok(())
    }

    async fn ensure_account_type(
        &self,
        owner: UserId,
        id: AccountTypeId,
    ) -> Result<(), AccountError> {
        account_types::Entity::find_owned_by_id(owner, id)
            .one(self.db.as_ref())
            .await?
            .map(|_| ())
            .ok_or(AccountError::AccountTypeNotFound(id))
    }
}
