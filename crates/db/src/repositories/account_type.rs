//! Account type repository.

use std::sync::Arc;

use sea_orm::{ActiveModelTrait, DatabaseConnection, DbErr, QueryOrder, Set};
use tally_shared::types::{AccountTypeId, UserId};

use crate::entities::account_types;
use crate::ownership::OwnerScoped;

/// Input for creating an account type.
#[derive(Debug, Clone)]
pub struct CreateAccountTypeInput {
    /// Display name.
    pub name: String,
    /// Free-form description, may be empty.
    pub description: String,
    /// Whether accounts of this type count towards the total balance.
    pub calculate: bool,
}

/// Input for updating an account type. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct UpdateAccountTypeInput {
    /// Display name.
    pub name: Option<String>,
    /// Description.
    pub description: Option<String>,
    /// Calculation flag.
    pub calculate: Option<bool>,
}

impl From<CreateAccountTypeInput> for UpdateAccountTypeInput {
    fn from(input: CreateAccountTypeInput) -> Self {
        Self {
            name: Some(input.name),
            description: Some(input.description),
            calculate: Some(input.calculate),
        }
    }
}

/// Account type repository, always scoped to one owner.
#[derive(Debug, Clone)]
pub struct AccountTypeRepository {
    db: Arc<DatabaseConnection>,
}

impl AccountTypeRepository {
    /// Creates a new account type repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Lists the owner's account types by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self, owner: UserId) -> Result<Vec<account_types::Model>, DbErr> {
        account_types::Entity::find_owned(owner)
            .order_by_asc(account_types::Column::Name)
            .order_by_asc(account_types::Column::Id)
            .all(self.db.as_ref())
            .await
    }

    /// Finds one of the owner's account types.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find(
        &self,
        owner: UserId,
        id: AccountTypeId,
    ) -> Result<Option<account_types::Model>, DbErr> {
        account_types::Entity::find_owned_by_id(owner, id)
            .one(self.db.as_ref())
            .await
    }

    /// Creates an account type owned by `owner`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails.
    pub async fn create(
        &self,
        owner: UserId,
        input: CreateAccountTypeInput,
    ) -> Result<account_types::Model, DbErr> {
        account_types::ActiveModel {
            user_id: Set(owner.into_inner()),
            name: Set(input.name),
            description: Set(input.description),
            calculate: Set(input.calculate),
            ..Default::default()
        }
        .insert(self.db.as_ref())
        .await
    }

    /// Updates one of the owner's account types.
    ///
    /// Returns `None` if the account type does not exist or is not owned by `owner`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn update(
        &self,
        owner: UserId,
        id: AccountTypeId,
        input: UpdateAccountTypeInput,
    ) -> Result<Option<account_types::Model>, DbErr> {
        let Some(existing) = self.find(owner, id).await? else {
            return Ok(None);
        };

        let mut active: account_types::ActiveModel = existing.clone().into();
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(description) = input.description {
            active.description = Set(description);
        }
        if let Some(calculate) = input.calculate {
            active.calculate = Set(calculate);
        }

        if !active.is_changed() {
            return Ok(Some(existing));
        }
        active.update(self.db.as_ref()).await.map(Some)
    }

    /// Deletes one of the owner's account types.
    ///
    /// Accounts of this type keep existing with no type. Returns false if
    /// nothing was deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn delete(&self, owner: UserId, id: AccountTypeId) -> Result<bool, DbErr> {
        let result = account_types::Entity::delete_owned_by_id(owner, id)
            .exec(self.db.as_ref())
            .await?;
        Ok(result.rows_affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::test_support::{mock_connection, transaction_log};
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Transaction};

    fn bills(owner: i64) -> account_types::Model {
        account_types::Model {
            id: 5,
            user_id: owner,
            name: "Bills".to_string(),
            description: String::new(),
            calculate: true,
        }
    }

    #[tokio::test]
    async fn test_find_is_scoped_to_owner() {
        let db = mock_connection(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<account_types::Model>::new()]),
        );
        let repo = AccountTypeRepository::new(Arc::clone(&db));

        let found = repo
            .find(UserId::from_raw(2), AccountTypeId::from_raw(5))
            .await
            .unwrap();
        assert!(found.is_none());

        drop(repo);
        assert_eq!(transaction_log(db).len(), 1);
    }

    #[tokio::test]
    async fn test_update_without_changes_skips_the_write() {
        let db = mock_connection(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[bills(1)]]),
        );
        let repo = AccountTypeRepository::new(Arc::clone(&db));

        let updated = repo
            .update(
                UserId::from_raw(1),
                AccountTypeId::from_raw(5),
                UpdateAccountTypeInput::default(),
            )
            .await
            .unwrap();

        assert_eq!(updated, Some(bills(1)));
        drop(repo);
        assert_eq!(transaction_log(db).len(), 1);
    }

    #[tokio::test]
    async fn test_delete_reports_missing_rows() {
        let db = mock_connection(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }]),
        );
        let repo = AccountTypeRepository::new(Arc::clone(&db));

        let deleted = repo
            .delete(UserId::from_raw(1), AccountTypeId::from_raw(99))
            .await
            .unwrap();
        assert!(!deleted);

        drop(repo);
        let log = transaction_log(db);
        assert_eq!(
            log,
            [Transaction::from_sql_and_values(
                DatabaseBackend::Postgres,
                r#"DELETE FROM "account_types" WHERE "account_types"."user_id" = $1 AND "account_types"."id" = $2"#,
                [1i64.into(), 99i64.into()],
            )]
        );
    }
}
