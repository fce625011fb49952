//! Tag repository.

use std::sync::Arc;

use sea_orm::{ActiveModelTrait, DatabaseConnection, DbErr, QueryOrder, Set};
use tally_shared::types::{TagId, UserId};

use crate::entities::tags;
use crate::ownership::OwnerScoped;

/// Input for creating a tag.
#[derive(Debug, Clone)]
pub struct CreateTagInput {
    /// Display name.
    pub name: String,
    /// Free-form description, may be empty.
    pub description: String,
}

/// Input for updating a tag. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct UpdateTagInput {
    /// Display name.
    pub name: Option<String>,
    /// Description.
    pub description: Option<String>,
}

impl From<CreateTagInput> for UpdateTagInput {
    fn from(input: CreateTagInput) -> Self {
        Self {
            name: Some(input.name),
            description: Some(input.description),
        }
    }
}

/// Tag repository, always scoped to one owner.
#[derive(Debug, Clone)]
pub struct TagRepository {
    db: Arc<DatabaseConnection>,
}

impl TagRepository {
    /// Creates a new tag repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Lists the owner's tags by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self, owner: UserId) -> Result<Vec<tags::Model>, DbErr> {
        tags::Entity::find_owned(owner)
            .order_by_asc(tags::Column::Name)
            .order_by_asc(tags::Column::Id)
            .all(self.db.as_ref())
            .await
    }

    /// Finds one of the owner's tags.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find(&self, owner: UserId, id: TagId) -> Result<Option<tags::Model>, DbErr> {
        tags::Entity::find_owned_by_id(owner, id).one(self.db.as_ref()).await
    }

    /// Creates a tag owned by `owner`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails.
    pub async fn create(&self, owner: UserId, input: CreateTagInput) -> Result<tags::Model, DbErr> {
        tags::ActiveModel {
            user_id: Set(owner.into_inner()),
            name: Set(input.name),
            description: Set(input.description),
            ..Default::default()
        }
        .insert(self.db.as_ref())
        .await
    }

    /// Updates one of the owner's tags.
    ///
    /// Returns `None` if the tag does not exist or is not owned by `owner`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn update(
        &self,
        owner: UserId,
        id: TagId,
        input: UpdateTagInput,
    ) -> Result<Option<tags::Model>, DbErr> {
        let Some(existing) = self.find(owner, id).await? else {
            return Ok(None);
        };

        let mut active: tags::ActiveModel = existing.clone().into();
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(description) = input.description {
            active.description = Set(description);
        }

        if !active.is_changed() {
            return Ok(Some(existing));
        }
        active.update(self.db.as_ref()).await.map(Some)
    }

    /// Deletes one of the owner's tags, detaching it from its operations.
    ///
    /// Returns false if nothing was deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn delete(&self, owner: UserId, id: TagId) -> Result<bool, DbErr> {
        let result = tags::Entity::delete_owned_by_id(owner, id)
            .exec(self.db.as_ref())
            .await?;
        Ok(result.rows_affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::test_support::{mock_connection, transaction_log};
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    #[tokio::test]
    async fn test_update_applies_only_supplied_fields() {
        let stored = tags::Model {
            id: 3,
            user_id: 1,
            name: "food".to_string(),
            description: "groceries".to_string(),
        };
        let renamed = tags::Model {
            name: "food & drinks".to_string(),
            ..stored.clone()
        };
        let db = mock_connection(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[stored]])
                .append_query_results([[renamed.clone()]]),
        );

        let updated = TagRepository::new(db)
            .update(
                UserId::from_raw(1),
                TagId::from_raw(3),
                UpdateTagInput {
                    name: Some("food & drinks".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated, renamed);
        assert_eq!(updated.description, "groceries");
    }

    #[tokio::test]
    async fn test_update_of_foreign_tag_returns_none() {
        let db = mock_connection(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<tags::Model>::new()]),
        );

        let updated = TagRepository::new(db)
            .update(
                UserId::from_raw(2),
                TagId::from_raw(3),
                UpdateTagInput::default(),
            )
            .await
            .unwrap();

        assert!(updated.is_none());
    }

    #[tokio::test]
    async fn test_delete_reports_deleted_rows() {
        let db = mock_connection(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }]),
        );

        assert!(
            TagRepository::new(db)
                .delete(UserId::from_raw(1), TagId::from_raw(3))
                .await
                .unwrap()
        );
    }
}
