//! Read query construction.
//!
//! This module provides the relational-style [`ReadQuery`] handed to
//! [`DocumentSource::read`](crate::source::DocumentSource::read): conditions,
//! field list, ordering, pagination and the recursion depth used for
//! association resolution.
//!
//! # Query Building
//!
//! ```ignore
//! use doclink::query::{ReadQuery, SortDirection};
//! use bson::doc;
//!
//! let query = ReadQuery::builder()
//!     .conditions(doc! { "Vehicle.year": [2008, 2009] })
//!     .sort("name", SortDirection::Asc)
//!     .limit(10)
//!     .recursive(2)
//!     .build();
//! ```

use bson::{Bson, Document};

/// Sort direction for query results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    /// Ascending order (A to Z, 0 to 9, earliest to latest).
    Asc,
    /// Descending order (Z to A, 9 to 0, latest to earliest).
    Desc,
}

impl SortDirection {
    /// Parses `asc`/`desc` in any case. Anything else sorts descending.
    pub fn parse(direction: &str) -> Self {
        if direction.eq_ignore_ascii_case("asc") {
            SortDirection::Asc
        } else {
            SortDirection::Desc
        }
    }

    /// The store's numeric form of the direction.
    pub fn as_i32(self) -> i32 {
        match self {
            SortDirection::Asc => 1,
            SortDirection::Desc => -1,
        }
    }
}

/// Sort order for query results.
#[derive(Debug, Clone, PartialEq)]
pub struct Sort {
    /// The field name to sort by.
    pub field: String,
    /// The sort direction.
    pub direction: SortDirection,
}

impl Sort {
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Sort { field: field.into(), direction }
    }

    pub fn asc(field: impl Into<String>) -> Self {
        Self::new(field, SortDirection::Asc)
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self::new(field, SortDirection::Desc)
    }
}

/// Remaining association depth of one read.
///
/// Each association hop descends by one. A budget below zero is exhausted: the
/// read returns its own records without resolving any association. A budget of
/// zero resolves the immediate associations but none of theirs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RecursionBudget(i32);

impl RecursionBudget {
    /// A budget that resolves no association at all.
    pub const NONE: RecursionBudget = RecursionBudget(-1);

    pub fn new(depth: i32) -> Self {
        RecursionBudget(depth.max(-1))
    }

    pub fn depth(self) -> i32 {
        self.0
    }

    /// The budget of the next hop.
    pub fn descend(self) -> Self {
        RecursionBudget::new(self.0 - 1)
    }

    pub fn is_exhausted(self) -> bool {
        self.0 < 0
    }
}

impl From<i32> for RecursionBudget {
    fn from(depth: i32) -> Self {
        RecursionBudget::new(depth)
    }
}

/// A relational read against one entity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReadQuery {
    /// Condition map, keys optionally prefixed by the entity alias.
    pub conditions: Document,
    /// Fields to return. Empty returns whole documents.
    pub fields: Vec<String>,
    /// Sort keys, in priority order.
    pub order: Vec<Sort>,
    /// Maximum number of records to return.
    pub limit: Option<i64>,
    /// Number of records to skip.
    pub offset: Option<u64>,
    /// One-based page number, used with `limit` when no offset is given.
    pub page: Option<u64>,
    /// Recursion depth. `None` uses the configured or entity default.
    pub recursive: Option<RecursionBudget>,
}

impl ReadQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> ReadQueryBuilder {
        ReadQueryBuilder::new()
    }

    /// The number of records to skip, derived from `page` when no offset is set.
    ///
    /// A page past `u64::MAX` records saturates, which skips everything.
    pub fn skip(&self) -> Option<u64> {
        match (self.offset, self.page, self.limit) {
            (Some(offset), _, _) if offset > 0 => Some(offset),
            (_, Some(page), Some(limit)) if page > 0 && limit > 0 => {
                Some((page - 1).saturating_mul(limit as u64))
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReadQueryBuilder {
    query: ReadQuery,
}

impl ReadQueryBuilder {
    pub fn new() -> Self {
        ReadQueryBuilder { query: ReadQuery::default() }
    }

    /// Replaces the condition map.
    pub fn conditions(mut self, conditions: Document) -> Self {
        self.query.conditions = conditions;
        self
    }

    /// Adds one condition.
    pub fn condition(mut self, field: impl Into<String>, value: impl Into<Bson>) -> Self {
        self.query.conditions.insert(field.into(), value.into());
        self
    }

    pub fn field(mut self, field: impl Into<String>) -> Self {
        self.query.fields.push(field.into());
        self
    }

    pub fn fields<I, F>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<String>,
    {
        self.query.fields.extend(fields.into_iter().map(Into::into));
        self
    }

    /// Appends a sort key.
    pub fn sort(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.query.order.push(Sort::new(field, direction));
        self
    }

    pub fn order(mut self, order: Vec<Sort>) -> Self {
        self.query.order = order;
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.query.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.query.offset = Some(offset);
        self
    }

    pub fn page(mut self, page: u64) -> Self {
        self.query.page = Some(page);
        self
    }

    pub fn recursive(mut self, depth: impl Into<RecursionBudget>) -> Self {
        self.query.recursive = Some(depth.into());
        self
    }

    pub fn build(self) -> ReadQuery {
        self.query
    }
}

/// A find-and-modify against one entity: the first record matching
/// `conditions` in `order` is updated with `update`, or removed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModifyQuery {
    pub conditions: Document,
    pub fields: Vec<String>,
    pub order: Vec<Sort>,
    /// Data written like [`DocumentSource::update`](crate::source::DocumentSource::update) writes it.
    pub update: Option<Document>,
    /// Remove the record instead of updating it.
    pub remove: bool,
    pub upsert: bool,
    /// Return the record after the update instead of before it.
    pub return_new: bool,
    pub recursive: Option<RecursionBudget>,
}

impl ModifyQuery {
    pub fn builder() -> ModifyQueryBuilder {
        ModifyQueryBuilder::default()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ModifyQueryBuilder {
    query: ModifyQuery,
}

impl ModifyQueryBuilder {
    pub fn conditions(mut self, conditions: Document) -> Self {
        self.query.conditions = conditions;
        self
    }

    pub fn condition(mut self, field: impl Into<String>, value: impl Into<Bson>) -> Self {
        self.query.conditions.insert(field.into(), value.into());
        self
    }

    pub fn fields<I, F>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<String>,
    {
        self.query.fields.extend(fields.into_iter().map(Into::into));
        self
    }

    pub fn sort(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.query.order.push(Sort::new(field, direction));
        self
    }

    pub fn update(mut self, data: Document) -> Self {
        self.query.update = Some(data);
        self
    }

    pub fn remove(mut self) -> Self {
        self.query.remove = true;
        self
    }

    pub fn upsert(mut self, upsert: bool) -> Self {
        self.query.upsert = upsert;
        self
    }

    pub fn return_new(mut self, return_new: bool) -> Self {
        self.query.return_new = return_new;
        self
    }

    pub fn recursive(mut self, depth: impl Into<RecursionBudget>) -> Self {
        self.query.recursive = Some(depth.into());
        self
    }

    pub fn build(self) -> ModifyQuery {
        self.query
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[test]
    fn test_budget_descends_to_exhaustion() {
        let budget = RecursionBudget::new(1);

        assert!(!budget.is_exhausted());
        assert!(!budget.descend().is_exhausted());
        assert!(budget.descend().descend().is_exhausted());
        assert_eq!(RecursionBudget::NONE.descend(), RecursionBudget::NONE);
        assert_eq!(RecursionBudget::new(-7), RecursionBudget::NONE);
    }

    #[test]
    fn test_sort_direction_parsing() {
        assert_eq!(SortDirection::parse("ASC"), SortDirection::Asc);
        assert_eq!(SortDirection::parse("asc"), SortDirection::Asc);
        assert_eq!(SortDirection::parse("desc"), SortDirection::Desc);
        assert_eq!(SortDirection::parse(""), SortDirection::Desc);
        assert_eq!(SortDirection::Desc.as_i32(), -1);
    }

    #[test]
    fn test_page_becomes_offset() {
        let query = ReadQuery::builder().limit(10).page(3).build();
        assert_eq!(query.skip(), Some(20));

        let query = ReadQuery::builder().limit(10).page(3).offset(5).build();
        assert_eq!(query.skip(), Some(5));

        assert_eq!(ReadQuery::builder().page(3).build().skip(), None);
    }

    #[test]
    fn test_modify_query_builder() {
        let query = ModifyQuery::builder()
            .condition("Counter.name", "visits")
            .update(doc! { "hits": 1 })
            .sort("hits", SortDirection::Desc)
            .upsert(true)
            .return_new(true)
            .build();

        assert_eq!(query.conditions, doc! { "Counter.name": "visits" });
        assert_eq!(query.update, Some(doc! { "hits": 1 }));
        assert_eq!(query.order, vec![Sort::desc("hits")]);
        assert!(query.upsert && query.return_new && !query.remove);
        assert!(ModifyQuery::builder().remove().build().remove);
    }

    #[test]
    fn test_huge_page_saturates_offset() {
        let query = ReadQuery::builder().limit(10).page(u64::MAX).build();

        assert_eq!(query.skip(), Some(u64::MAX));
    }
}
