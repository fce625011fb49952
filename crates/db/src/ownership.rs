//! Per-user row scoping.
//!
//! Every owned table carries a `user_id` column. Queries for account types,
//! accounts, tags and operations are always built through [`OwnerScoped`],
//! so a row owned by someone else looks exactly like a missing row.

use sea_orm::{
    ColumnTrait, ConnectionTrait, DbErr, DeleteMany, EntityTrait, PaginatorTrait, QueryFilter,
    Select,
};
use tally_shared::types::{AccountId, AccountTypeId, OperationId, TagId, UserId};

use crate::entities::{account_types, accounts, operations, tags};

/// An entity whose rows belong to exactly one user.
pub trait OwnerScoped: EntityTrait {
    /// Typed id of the entity.
    type Id: Into<i64> + Copy;

    /// Column holding the owning user id.
    fn owner_column() -> Self::Column;

    /// Primary key column.
    fn id_column() -> Self::Column;

    /// Selects every row owned by `owner`.
    fn find_owned(owner: UserId) -> Select<Self> {
        Self::find().filter(Self::owner_column().eq(owner.into_inner()))
    }

    /// Selects one row, only if it is owned by `owner`.
    fn find_owned_by_id(owner: UserId, id: Self::Id) -> Select<Self> {
        Self::find_owned(owner).filter(Self::id_column().eq(id.into()))
    }

    /// Deletes one row, only if it is owned by `owner`.
    fn delete_owned_by_id(owner: UserId, id: Self::Id) -> DeleteMany<Self> {
        Self::delete_many()
            .filter(Self::owner_column().eq(owner.into_inner()))
            .filter(Self::id_column().eq(id.into()))
    }
}

/// Returns true if every id in `ids` names a row owned by `owner`.
///
/// Duplicate ids are counted once.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub async fn all_owned<E, C>(db: &C, owner: UserId, ids: &[E::Id]) -> Result<bool, DbErr>
where
    E: OwnerScoped,
    E::Model: Sync,
    C: ConnectionTrait,
{
    let mut raw: Vec<i64> = ids.iter().map(|id| (*id).into()).collect();
    raw.sort_unstable();
    raw.dedup();

    if raw.is_empty() {
        return Ok(true);
    }

    let wanted = raw.len() as u64;
    let found = E::find_owned(owner)
        .filter(E::id_column().is_in(raw))
        .count(db)
        .await?;

    Ok(found == wanted)
}

impl OwnerScoped for account_types::Entity {
    type Id = AccountTypeId;

    fn owner_column() -> Self::Column {
        account_types::Column::UserId
    }

    fn id_column() -> Self::Column {
        account_types::Column::Id
    }
}

impl OwnerScoped for accounts::Entity {
    type Id = AccountId;

    fn owner_column() -> Self::Column {
        accounts::Column::UserId
    }

    fn id_column() -> Self::Column {
        accounts::Column::Id
    }
}

impl OwnerScoped for tags::Entity {
    type Id = TagId;

    fn owner_column() -> Self::Column {
        tags::Column::UserId
    }

    fn id_column() -> Self::Column {
        tags::Column::Id
    }
}

impl OwnerScoped for operations::Entity {
    type Id = OperationId;

    fn owner_column() -> Self::Column {
        operations::Column::UserId
    }

    fn id_column() -> Self::Column {
        operations::Column::Id
    }
}
