//! Declarative filters for operation listings.

use std::collections::BTreeSet;
use std::str::FromStr;

use chrono::NaiveDate;
use tally_shared::types::{AccountId, TagId};
use thiserror::Error;

use super::DateScope;

/// Errors raised while reading filter parameters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    /// A comma-separated id list contained an empty or non-integer item.
    #[error("'{field}' must be a comma-separated list of integer ids, got '{value}'")]
    InvalidIdList {
        /// Query parameter name.
        field: &'static str,
        /// Raw parameter value.
        value: String,
    },
}

/// A de-duplicated set of ids, kept in ascending order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdSet<T: Ord>(BTreeSet<T>);

impl<T> IdSet<T>
where
    T: Ord + Copy + FromStr,
{
    /// Parses a comma-separated id list such as `"1, 2,3"`.
    ///
    /// Whitespace around items is ignored. Any empty or non-integer item
    /// rejects the whole list.
    pub fn parse(field: &'static str, raw: &str) -> Result<Self, FilterError> {
        let invalid = || FilterError::InvalidIdList {
            field,
            value: raw.to_string(),
        };

        raw.split(',')
            .map(|item| item.trim().parse::<T>().map_err(|_| invalid()))
            .collect::<Result<BTreeSet<T>, _>>()
            .map(Self)
    }
}

impl<T: Ord + Copy> IdSet<T> {
    /// Returns true if `id` is in the set.
    #[must_use]
    pub fn contains(&self, id: T) -> bool {
        self.0.contains(&id)
    }

    /// Iterates the ids in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        self.0.iter().copied()
    }

    /// Number of distinct ids.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the set has no ids.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<T: Ord> FromIterator<T> for IdSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// The facts about one operation that filters look at.
#[derive(Debug, Clone, Copy)]
pub struct OperationFacts<'a> {
    /// Account the operation belongs to.
    pub account: AccountId,
    /// Operation date, if any.
    pub date: Option<NaiveDate>,
    /// Tags attached to the operation.
    pub tags: &'a [TagId],
}

/// Which operations a listing should return.
///
/// Ownership is not part of the filter. Every query built from it is
/// additionally restricted to the requesting user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationFilter {
    /// Keep operations carrying ANY of these tags.
    pub tags: Option<IdSet<TagId>>,
    /// Keep operations belonging to one of these accounts.
    pub accounts: Option<IdSet<AccountId>>,
    /// Keep operations dated inside this scope.
    pub date: DateScope,
}

impl OperationFilter {
    /// Builds a filter from raw query parameters.
    ///
    /// # Errors
    ///
    /// Returns `FilterError::InvalidIdList` if `tags` or `account` is not a
    /// comma-separated list of integers.
    pub fn from_query(
        tags: Option<&str>,
        accounts: Option<&str>,
        year: Option<i32>,
        month: Option<u32>,
        day: Option<u32>,
    ) -> Result<Self, FilterError> {
        Ok(Self {
            tags: tags.map(|raw| IdSet::parse("tags", raw)).transpose()?,
            accounts: accounts.map(|raw| IdSet::parse("account", raw)).transpose()?,
            date: DateScope::from_parts(year, month, day),
        })
    }

    /// Restricts the filter to operations carrying any of `tags`.
    #[must_use]
    pub fn with_tags(mut self, tags: impl IntoIterator<Item = TagId>) -> Self {
        self.tags = Some(tags.into_iter().collect());
        self
    }

    /// Restricts the filter to operations of the given accounts.
    #[must_use]
    pub fn with_accounts(mut self, accounts: impl IntoIterator<Item = AccountId>) -> Self {
        self.accounts = Some(accounts.into_iter().collect());
        self
    }

    /// Restricts the filter to a date scope.
    #[must_use]
    pub const fn with_date(mut self, date: DateScope) -> Self {
        self.date = date;
        self
    }

    /// Returns true if the filter keeps every operation.
    #[must_use]
    pub const fn is_unrestricted(&self) -> bool {
        self.tags.is_none() && self.accounts.is_none() && matches!(self.date, DateScope::All)
    }

    /// Evaluates the filter against one operation.
    #[must_use]
    pub fn matches(&self, operation: &OperationFacts<'_>) -> bool {
        let tags_ok = self
            .tags
            .as_ref()
            .is_none_or(|wanted| operation.tags.iter().any(|t| wanted.contains(*t)));
        let account_ok = self
            .accounts
            .as_ref()
            .is_none_or(|wanted| wanted.contains(operation.account));

        tags_ok && account_ok && self.date.contains(operation.date)
    }
}
