//! Page-number and identifier-cursor pagination.

use bson::{Document, doc, oid::ObjectId};
use docmodel_core::{DocumentModel, Page, PageRequest, Paginate};
use tracing::debug;

use super::Service;
use crate::error::MongoResult;
use crate::filter::QueryBuilder;
use crate::sort::SortDirection;

/// Restrict `filter` to identifiers after `after`.
fn after_filter(filter: Document, after: Option<ObjectId>) -> Document {
    let Some(after) = after else {
        return filter;
    };
    let cursor = doc! { "_id": { "$gt": after } };
    if filter.is_empty() {
        cursor
    } else {
        doc! { "$and": [filter, cursor] }
    }
}

impl<M: DocumentModel> Service<M> {
    /// One page of the results of `query`.
    ///
    /// Offset requests keep the query's sort and count matches to fill in
    /// [`Paginate`]. Cursor requests use only the query's filter, order by
    /// identifier ascending and set `next_cursor` when the page came back
    /// full.
    pub async fn get_paginated(
        &self,
        query: QueryBuilder,
        request: PageRequest,
    ) -> MongoResult<Page<M>> {
        match request {
            PageRequest::Offset { page, per_page } => {
                let total = self.count(query.filter_doc().clone()).await?;
                let pagination = Paginate::new(total, page, per_page);
                debug!(
                    collection = %self.name(),
                    page = pagination.current_page(),
                    total_pages = pagination.total_pages(),
                    "Fetching page"
                );

                let query = query.skip(pagination.skip()).limit(pagination.limit());
                let items = self.find(query).await?;
                Ok(Page::offset(items, pagination))
            }
            PageRequest::After { after, limit } => {
                if limit == 0 {
                    return Ok(Page::cursor(Vec::new(), None));
                }
                let filter = after_filter(query.filter_doc().clone(), after);
                let query = QueryBuilder::new()
                    .filter(filter)
                    .sort("_id", SortDirection::Ascending)
                    .limit(limit);
                let items = self.find(query).await?;

                let next_cursor = if items.len() as u64 == limit {
                    items.last().and_then(M::id)
                } else {
                    None
                };
                Ok(Page::cursor(items, next_cursor))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_after_filter() {
        let id = ObjectId::new();
        assert_eq!(after_filter(doc! {}, None), doc! {});
        assert_eq!(after_filter(doc! {}, Some(id)), doc! { "_id": { "$gt": id } });
        assert_eq!(
            after_filter(doc! { "status": "open" }, Some(id)),
            doc! { "$and": [{ "status": "open" }, { "_id": { "$gt": id } }] }
        );
    }
}
