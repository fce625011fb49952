//! Repository abstractions for data access.
//!
//! Every repository except [`UserRepository`] takes the requesting user on
//! each call and never reads or writes rows owned by anyone else.

pub mod account;
pub mod account_type;
pub mod operation;
pub mod tag;
pub mod user;

pub use account::{
    AccountError, AccountRepository, AccountWithType, CreateAccountInput, UpdateAccountInput,
};
pub use account_type::{AccountTypeRepository, CreateAccountTypeInput, UpdateAccountTypeInput};
pub use operation::{
    CreateOperationInput, OperationDetail, OperationError, OperationRepository,
    OperationWithTags, UpdateOperationInput, filter_condition,
};
pub use tag::{CreateTagInput, TagRepository, UpdateTagInput};
pub use user::{UpdateProfileInput, UserRepository};
