//! `SeaORM` entity definitions.

pub mod prelude;

pub mod account_types;
pub mod accounts;
pub mod operation_tags;
pub mod operations;
pub mod tags;
pub mod users;
