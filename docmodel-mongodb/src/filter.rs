//! Filter and find-query builders.

use bson::{Bson, Document, doc, oid::ObjectId};
use mongodb::options::FindOptions;

use crate::error::{MongoError, MongoResult};
use crate::sort::SortDirection;

/// Builder for MongoDB filter documents.
///
/// Operator conditions on the same field are merged, so a range reads
/// naturally:
///
/// ```rust
/// use bson::doc;
/// use docmodel_mongodb::FilterBuilder;
///
/// let filter = FilterBuilder::new()
///     .eq("status", "active")
///     .gte("age", 18)
///     .lt("age", 65)
///     .build();
///
/// assert_eq!(filter, doc! { "status": "active", "age": { "$gte": 18, "$lt": 65 } });
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterBuilder {
    doc: Document,
}

impl FilterBuilder {
    /// Create an empty filter builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing filter document.
    pub fn from_doc(doc: Document) -> Self {
        Self { doc }
    }

    fn operator(mut self, field: &str, op: &str, value: Bson) -> Self {
        match self.doc.get_mut(field) {
            Some(Bson::Document(existing))
                if existing.keys().next().is_some_and(|k| k.starts_with('$')) =>
            {
                existing.insert(op, value);
            }
            _ => {
                let mut condition = Document::new();
                condition.insert(op, value);
                self.doc.insert(field, condition);
            }
        }
        self
    }

    /// Add an equality condition.
    pub fn eq(mut self, field: &str, value: impl Into<Bson>) -> Self {
        self.doc.insert(field, value.into());
        self
    }

    /// Add a not-equal condition.
    pub fn ne(self, field: &str, value: impl Into<Bson>) -> Self {
        self.operator(field, "$ne", value.into())
    }

    /// Add a greater-than condition.
    pub fn gt(self, field: &str, value: impl Into<Bson>) -> Self {
        self.operator(field, "$gt", value.into())
    }

    /// Add a greater-than-or-equal condition.
    pub fn gte(self, field: &str, value: impl Into<Bson>) -> Self {
        self.operator(field, "$gte", value.into())
    }

    /// Add a less-than condition.
    pub fn lt(self, field: &str, value: impl Into<Bson>) -> Self {
        self.operator(field, "$lt", value.into())
    }

    /// Add a less-than-or-equal condition.
    pub fn lte(self, field: &str, value: impl Into<Bson>) -> Self {
        self.operator(field, "$lte", value.into())
    }

    /// Value is one of `values`.
    pub fn in_array<I, V>(self, field: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Bson>,
    {
        let values: Vec<Bson> = values.into_iter().map(Into::into).collect();
        self.operator(field, "$in", Bson::Array(values))
    }

    /// Value is none of `values`.
    pub fn not_in<I, V>(self, field: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Bson>,
    {
        let values: Vec<Bson> = values.into_iter().map(Into::into).collect();
        self.operator(field, "$nin", Bson::Array(values))
    }

    /// Add a regex condition.
    pub fn regex(self, field: &str, pattern: &str) -> Self {
        self.operator(field, "$regex", Bson::String(pattern.to_string()))
    }

    /// Add an exists condition.
    pub fn exists(self, field: &str, exists: bool) -> Self {
        self.operator(field, "$exists", Bson::Boolean(exists))
    }

    /// Array contains all of `values`.
    pub fn all<I, V>(self, field: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Bson>,
    {
        let values: Vec<Bson> = values.into_iter().map(Into::into).collect();
        self.operator(field, "$all", Bson::Array(values))
    }

    /// Array element matches `query`.
    pub fn elem_match(self, field: &str, query: Document) -> Self {
        self.operator(field, "$elemMatch", Bson::Document(query))
    }

    /// Match on identifier.
    pub fn by_id(mut self, id: ObjectId) -> Self {
        self.doc.insert("_id", id);
        self
    }

    /// Match any of the identifiers.
    pub fn by_ids(self, ids: impl IntoIterator<Item = ObjectId>) -> Self {
        self.in_array("_id", ids)
    }

    /// Combine with AND ($and).
    pub fn and(mut self, conditions: Vec<Document>) -> Self {
        self.doc.insert("$and", conditions);
        self
    }

    /// Combine with OR ($or).
    pub fn or(mut self, conditions: Vec<Document>) -> Self {
        self.doc.insert("$or", conditions);
        self
    }

    /// Combine with NOR ($nor).
    pub fn nor(mut self, conditions: Vec<Document>) -> Self {
        self.doc.insert("$nor", conditions);
        self
    }

    /// Merge another filter; its keys win.
    pub fn merge(mut self, other: Document) -> Self {
        for (key, value) in other {
            self.doc.insert(key, value);
        }
        self
    }

    /// Build the filter document.
    pub fn build(self) -> Document {
        self.doc
    }

    /// Check if the filter is empty.
    pub fn is_empty(&self) -> bool {
        self.doc.is_empty()
    }
}

impl From<FilterBuilder> for Document {
    fn from(builder: FilterBuilder) -> Self {
        builder.build()
    }
}

/// A find query: filter, sort, skip, limit and projection.
///
/// ```rust
/// use bson::doc;
/// use docmodel_mongodb::{QueryBuilder, SortDirection};
///
/// let query = QueryBuilder::new()
///     .filter(doc! { "status": "open" })
///     .sort("created", SortDirection::Descending)
///     .skip(20)
///     .limit(10);
///
/// let options = query.find_options();
/// assert_eq!(options.sort, Some(doc! { "created": -1 }));
/// assert_eq!(options.limit, Some(10));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryBuilder {
    filter: Document,
    sort: Document,
    skip: Option<u64>,
    limit: Option<u64>,
    projection: Option<Document>,
}

impl QueryBuilder {
    /// Match every document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the filter.
    pub fn filter(mut self, filter: impl Into<Document>) -> Self {
        self.filter = filter.into();
        self
    }

    /// Add a sort key; keys apply in insertion order.
    pub fn sort(mut self, field: &str, direction: SortDirection) -> Self {
        self.sort.insert(field, direction);
        self
    }

    /// Add a sort key from loosely typed input.
    pub fn try_sort<D>(self, field: &str, direction: D) -> MongoResult<Self>
    where
        D: TryInto<SortDirection>,
        MongoError: From<D::Error>,
    {
        let direction = direction.try_into()?;
        Ok(self.sort(field, direction))
    }

    /// Skip this many results.
    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = Some(skip);
        self
    }

    /// Return at most this many results.
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Restrict returned fields.
    pub fn projection(mut self, projection: Document) -> Self {
        self.projection = Some(projection);
        self
    }

    /// The filter document.
    pub fn filter_doc(&self) -> &Document {
        &self.filter
    }

    /// Driver options for this query.
    pub fn find_options(&self) -> FindOptions {
        let mut options = FindOptions::default();
        if !self.sort.is_empty() {
            options.sort = Some(self.sort.clone());
        }
        options.skip = self.skip;
        options.limit = self.limit.map(|l| l.min(i64::MAX as u64) as i64);
        options.projection = self.projection.clone();
        options
    }

    /// Split into filter and driver options.
    pub fn into_parts(self) -> (Document, FindOptions) {
        let options = self.find_options();
        (self.filter, options)
    }
}

/// Match every document.
pub fn all() -> Document {
    doc! {}
}

/// Match on identifier.
pub fn by_id(id: ObjectId) -> Document {
    doc! { "_id": id }
}

/// Match on a single field.
pub fn where_eq(field: &str, value: impl Into<Bson>) -> Document {
    FilterBuilder::new().eq(field, value).build()
}

/// Match documents whose field differs from `value`.
pub fn where_ne(field: &str, value: impl Into<Bson>) -> Document {
    FilterBuilder::new().ne(field, value).build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_filter_builder_eq() {
        let filter = FilterBuilder::new()
            .eq("name", "Alice")
            .eq("age", 30)
            .build();
        assert_eq!(filter, doc! { "name": "Alice", "age": 30 });
    }

    #[test]
    fn test_operators_merge_per_field() {
        let filter = FilterBuilder::new().gte("age", 18).lt("age", 65).build();
        assert_eq!(filter, doc! { "age": { "$gte": 18, "$lt": 65 } });
    }

    #[test]
    fn test_operator_replaces_embedded_equality() {
        let filter = FilterBuilder::new()
            .eq("address", doc! { "city": "Oslo" })
            .ne("address", Bson::Null)
            .build();
        assert_eq!(filter, doc! { "address": { "$ne": Bson::Null } });
    }

    #[test]
    fn test_in_array() {
        let filter = FilterBuilder::new()
            .in_array("status", ["active", "pending"])
            .build();
        assert_eq!(filter, doc! { "status": { "$in": ["active", "pending"] } });
    }

    #[test]
    fn test_by_ids() {
        let a = ObjectId::new();
        let b = ObjectId::new();
        let filter = FilterBuilder::new().by_ids([a, b]).build();
        assert_eq!(filter, doc! { "_id": { "$in": [a, b] } });
    }

    #[test]
    fn test_or() {
        let filter = FilterBuilder::new()
            .or(vec![doc! { "status": "active" }, doc! { "priority": "high" }])
            .build();
        assert!(filter.contains_key("$or"));
    }

    #[test]
    fn test_helpers() {
        let oid = ObjectId::new();
        assert!(all().is_empty());
        assert_eq!(by_id(oid), doc! { "_id": oid });
        assert_eq!(where_eq("k", 1), doc! { "k": 1 });
        assert_eq!(where_ne("k", 1), doc! { "k": { "$ne": 1 } });
    }

    #[test]
    fn test_query_builder_options() {
        let (filter, options) = QueryBuilder::new()
            .filter(FilterBuilder::new().eq("open", true))
            .sort("priority", SortDirection::Descending)
            .sort("created", SortDirection::Ascending)
            .skip(5)
            .limit(10)
            .projection(doc! { "title": 1 })
            .into_parts();

        assert_eq!(filter, doc! { "open": true });
        assert_eq!(options.sort, Some(doc! { "priority": -1, "created": 1 }));
        assert_eq!(options.skip, Some(5));
        assert_eq!(options.limit, Some(10));
        assert_eq!(options.projection, Some(doc! { "title": 1 }));
    }

    #[test]
    fn test_query_builder_defaults() {
        let options = QueryBuilder::new().find_options();
        assert_eq!(options.sort, None);
        assert_eq!(options.skip, None);
        assert_eq!(options.limit, None);
    }

    #[test]
    fn test_try_sort_rejects_bad_direction() {
        assert!(QueryBuilder::new().try_sort("a", "desc").is_ok());
        assert!(QueryBuilder::new().try_sort("a", -1).is_ok());
        assert!(
            QueryBuilder::new()
                .try_sort("a", 3)
                .unwrap_err()
                .is_invalid_argument()
        );
    }
}
