//! Insert, update and save.

use bson::{Bson, Document, oid::ObjectId};
use docmodel_core::{DocumentModel, SubModel};
use tracing::{debug, info};

use super::Service;
use crate::error::{MongoError, MongoResult};
use crate::filter;

/// How [`Service::update`] writes a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpdateMode {
    /// `$set`/`$unset` of the dirty attributes only.
    #[default]
    Partial,
    /// Replace the stored document with the full model.
    Replace,
}

impl<M: DocumentModel> Service<M> {
    /// Insert a new model and assign its identifier.
    ///
    /// Fails with an invalid argument error if the model already has one.
    pub async fn insert(&self, model: &mut M) -> MongoResult<ObjectId> {
        if let Some(id) = model.id() {
            return Err(MongoError::invalid_argument(format!(
                "model is already persisted with id {id}"
            )));
        }

        let id = ObjectId::new();
        let doc = self.insert_document(model, id)?;

        self.collection().insert_one(doc, None).await?;
        model.state_mut().assign_id(id)?;
        model.clear_dirty();

        info!(collection = %self.name(), id = %id, "Inserted document");
        Ok(id)
    }

    /// The stored form of a new model under `id`.
    ///
    /// A non-ObjectId `_id` carried in the unmapped values is dropped so the
    /// stored key always matches the assigned identifier.
    fn insert_document(&self, model: &M, id: ObjectId) -> MongoResult<Document> {
        let mut stored = self.dehydrate(model)?;
        if let Some(stale) = stored.remove("_id") {
            debug!(collection = %self.name(), id = %id, stale = %stale, "Dropping unmapped _id on insert");
        }

        let mut doc = Document::new();
        doc.insert("_id", id);
        doc.extend(stored);
        Ok(doc)
    }

    /// Write a persisted model back.
    ///
    /// Returns whether a stored document matched. A partial update of a clean
    /// model issues no write and returns `false`.
    pub async fn update(&self, model: &mut M, mode: UpdateMode) -> MongoResult<bool> {
        let id = model
            .id()
            .ok_or_else(|| MongoError::invalid_argument("cannot update a model without an id"))?;
        let filter = filter::by_id(id);

        let matched = match mode {
            UpdateMode::Partial => {
                let Some(mut update) = model.dirty_update() else {
                    debug!(collection = %self.name(), id = %id, "Nothing dirty, skipping update");
                    return Ok(false);
                };
                if let Ok(set) = update.get_document_mut("$set") {
                    self.seal(set)?;
                }
                debug!(collection = %self.name(), id = %id, fields = ?model.dirty_fields(), "Updating document");
                self.collection()
                    .update_one(filter, update, None)
                    .await?
                    .matched_count
            }
            UpdateMode::Replace => {
                let mut doc = self.dehydrate(model)?;
                doc.remove("_id");
                debug!(collection = %self.name(), id = %id, "Replacing document");
                self.collection()
                    .replace_one(filter, doc, None)
                    .await?
                    .matched_count
            }
        };

        if matched > 0 {
            model.clear_dirty();
        }
        Ok(matched > 0)
    }

    /// Insert the model if it has no identifier, else partially update it.
    pub async fn save(&self, model: &mut M) -> MongoResult<bool> {
        match model.id() {
            None => self.insert(model).await.map(|_| true),
            Some(_) => self.update(model, UpdateMode::Partial).await,
        }
    }

    /// Reload a model's stored state.
    pub async fn refresh(&self, model: &M) -> MongoResult<Option<M>> {
        match model.id() {
            Some(id) => self.get_by_id(Bson::ObjectId(id)).await,
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Order, service_for};
    use bson::doc;

    #[tokio::test]
    async fn test_insert_rejects_persisted_model() {
        let service = service_for::<Order>(None).await;
        let mut order = Order::from_document(doc! { "_id": ObjectId::new(), "total": 1 });
        let err = service.insert(&mut order).await.unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[tokio::test]
    async fn test_insert_document_uses_assigned_id() {
        let service = service_for::<Order>(None).await;
        let order = Order::from_document(doc! { "_id": "legacy-key", "total": 4 });
        assert_eq!(order.id(), None);

        let id = ObjectId::new();
        let stored = service.insert_document(&order, id).unwrap();
        assert_eq!(stored.get_object_id("_id").unwrap(), id);
        assert_eq!(stored.get("total"), Some(&Bson::Int32(4)));
    }

    #[tokio::test]
    async fn test_update_requires_id() {
        let service = service_for::<Order>(None).await;
        let mut order = Order::new();
        order.set("total", 3);
        let err = service.update(&mut order, UpdateMode::Partial).await.unwrap_err();
        assert!(err.is_invalid_argument());
        assert!(order.is_dirty());
    }

    #[tokio::test]
    async fn test_clean_partial_update_is_noop() {
        let service = service_for::<Order>(None).await;
        let mut order = Order::from_document(doc! { "_id": ObjectId::new(), "total": 1 });
        assert!(!service.update(&mut order, UpdateMode::Partial).await.unwrap());
    }

    #[test]
    fn test_default_mode_is_partial() {
        assert_eq!(UpdateMode::default(), UpdateMode::Partial);
    }
}
