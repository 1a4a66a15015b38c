//! Deletions.

use bson::{Bson, Document, doc};
use docmodel_core::{DocumentModel, identifier};
use tracing::{debug, info};

use super::Service;
use crate::error::MongoResult;
use crate::filter;

impl<M: DocumentModel> Service<M> {
    /// Delete by identifier. An unparseable identifier deletes nothing.
    pub async fn delete_by_id(&self, id: impl Into<Bson>) -> MongoResult<bool> {
        match identifier::normalize(&id.into()) {
            Some(oid) => self.delete_one(filter::by_id(oid)).await,
            None => Ok(false),
        }
    }

    /// Delete the stored counterpart of `model`; the model itself is kept.
    pub async fn delete(&self, model: &M) -> MongoResult<bool> {
        match model.id() {
            Some(id) => self.delete_one(filter::by_id(id)).await,
            None => Ok(false),
        }
    }

    /// Delete the first document matching `filter`.
    pub async fn delete_one(&self, filter: Document) -> MongoResult<bool> {
        debug!(collection = %self.name(), filter = ?filter, "Deleting one document");
        let result = self.collection().delete_one(filter, None).await?;
        Ok(result.deleted_count > 0)
    }

    /// Delete every document matching `filter` and return how many went.
    pub async fn delete_many(&self, filter: Document) -> MongoResult<u64> {
        let result = self.collection().delete_many(filter, None).await?;
        info!(collection = %self.name(), deleted = result.deleted_count, "Deleted documents");
        Ok(result.deleted_count)
    }

    /// Delete the documents with the given identifiers.
    pub async fn delete_by_ids<I, V>(&self, ids: I) -> MongoResult<u64>
    where
        I: IntoIterator<Item = V>,
        V: Into<Bson>,
    {
        let ids = identifier::deduplicate(ids);
        if ids.is_empty() {
            return Ok(0);
        }
        self.delete_many(doc! { "_id": { "$in": ids } }).await
    }
}
