//! Operation filtering.
//!
//! An [`OperationFilter`] is a declarative description of which operations a
//! listing or a balance should cover. The database layer translates it into
//! a single query; [`OperationFilter::matches`] evaluates the same rules in
//! memory.
//!
//! Every dimension is optional and dimensions combine with AND:
//!
//! - `tags`: the operation carries ANY of the listed tags
//! - `accounts`: the operation belongs to one of the listed accounts
//! - `date`: the operation date falls inside a year, month, or day window

mod date_scope;
mod filter;

pub use date_scope::{DateScope, DateSpan, Granularity};
pub use filter::{FilterError, IdSet, OperationFacts, OperationFilter};
