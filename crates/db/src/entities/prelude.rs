//! Entity re-exports.

pub use super::account_types::Entity as AccountTypes;
pub use super::accounts::Entity as Accounts;
pub use super::operation_tags::Entity as OperationTags;
pub use super::operations::Entity as Operations;
pub use super::tags::Entity as Tags;
pub use super::users::Entity as Users;
