//! Per-model gateway to a collection.
//!
//! [`Service`] is stateless: a collection handle plus the optional field
//! cipher. Its operations are split by capability:
//!
//! - [`lookup`]: finds, existence, counting and distinct values
//! - [`persist`]: insert, update and save
//! - [`atomic`]: `$inc`, `$push` and `$pull` updates
//! - [`delete`]: deletions
//! - [`paginate`]: page-number and cursor pagination
//!
//! Aggregations live on [`AggregationService`], obtained through
//! [`Service::aggregate`].
//!
//! Attributes named in filters are wire keys; use [`Service::wire`] to map
//! an aliased attribute name. Encrypted attributes are stored as randomized
//! ciphertext and cannot be matched by value.

pub mod atomic;
pub mod delete;
pub mod lookup;
pub mod paginate;
pub mod persist;

use std::marker::PhantomData;
use std::sync::Arc;

use bson::Document;
use docmodel_core::{DocumentModel, FieldCipher, SubModel, open_fields, seal_fields};
use mongodb::Collection;

use crate::aggregation::AggregationService;
use crate::error::MongoResult;

pub use atomic::Delta;
pub use persist::UpdateMode;

/// Gateway for the model type `M`.
pub struct Service<M: DocumentModel> {
    collection: Collection<Document>,
    cipher: Option<Arc<dyn FieldCipher>>,
    _model: PhantomData<fn() -> M>,
}

impl<M: DocumentModel> Service<M> {
    /// Build a service over a collection.
    ///
    /// Usually obtained from [`Registry::service`](crate::Registry::service).
    pub fn new(collection: Collection<Document>, cipher: Option<Arc<dyn FieldCipher>>) -> Self {
        Self {
            collection,
            cipher,
            _model: PhantomData,
        }
    }

    /// The underlying collection.
    pub fn collection(&self) -> &Collection<Document> {
        &self.collection
    }

    /// Collection name.
    pub fn name(&self) -> &str {
        self.collection.name()
    }

    /// Wire key for an attribute name.
    pub fn wire<'a>(&self, attribute: &'a str) -> &'a str {
        M::schema().wire_for(attribute)
    }

    /// Aggregations over this service's collection.
    pub fn aggregate(&self) -> AggregationService<M> {
        AggregationService::new(self.collection.clone())
    }

    /// Decrypt and inflate a stored document.
    pub fn inflate(&self, mut doc: Document) -> MongoResult<M> {
        if let Some(ref cipher) = self.cipher {
            open_fields(cipher.as_ref(), M::schema(), &mut doc)?;
        }
        Ok(M::from_document(doc))
    }

    /// Dehydrate a model and encrypt its encrypted attributes.
    pub fn dehydrate(&self, model: &M) -> MongoResult<Document> {
        let mut doc = model.to_document();
        self.seal(&mut doc)?;
        Ok(doc)
    }

    fn seal(&self, doc: &mut Document) -> MongoResult<()> {
        if let Some(ref cipher) = self.cipher {
            seal_fields(cipher.as_ref(), M::schema(), doc)?;
        }
        Ok(())
    }

    fn inflate_all(&self, docs: Vec<Document>) -> MongoResult<Vec<M>> {
        docs.into_iter().map(|doc| self.inflate(doc)).collect()
    }
}

impl<M: DocumentModel> Clone for Service<M> {
    fn clone(&self) -> Self {
        Self {
            collection: self.collection.clone(),
            cipher: self.cipher.clone(),
            _model: PhantomData,
        }
    }
}

impl<M: DocumentModel> std::fmt::Debug for Service<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Service")
            .field("collection", &self.collection.name())
            .field("model", &M::schema().name())
            .field("cipher", &self.cipher.is_some())
            .finish()
    }
}
