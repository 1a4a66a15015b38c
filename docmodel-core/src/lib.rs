//! # docmodel-core
//!
//! Document model mapping for docmodel.
//!
//! This crate holds everything that does not talk to a database:
//! - Typed models over raw BSON documents ([`SubModel`], [`DocumentModel`])
//! - Field aliasing between short wire keys and attribute names
//! - Recursive inflation of nested and repeated sub-models
//! - Dirty-field tracking that drives partial updates
//! - Identifier normalization and deduplication
//! - Pagination arithmetic
//! - Field-level encryption
//!
//! ## Models
//!
//! A model is a newtype over [`ModelState`] with a [`Schema`]:
//!
//! ```rust
//! use std::sync::OnceLock;
//! use bson::doc;
//! use docmodel_core::prelude::*;
//!
//! #[derive(Debug, Clone, PartialEq)]
//! struct Address(ModelState);
//!
//! impl SubModel for Address {
//!     fn schema() -> &'static Schema {
//!         static SCHEMA: OnceLock<Schema> = OnceLock::new();
//!         SCHEMA.get_or_init(|| Schema::builder("Address").alias("c", "city").build())
//!     }
//!     fn from_state(state: ModelState) -> Self { Self(state) }
//!     fn state(&self) -> &ModelState { &self.0 }
//!     fn state_mut(&mut self) -> &mut ModelState { &mut self.0 }
//! }
//!
//! #[derive(Debug, Clone, PartialEq)]
//! struct User(ModelState);
//!
//! impl SubModel for User {
//!     fn schema() -> &'static Schema {
//!         static SCHEMA: OnceLock<Schema> = OnceLock::new();
//!         SCHEMA.get_or_init(|| {
//!             Schema::builder("User")
//!                 .alias("n", "name")
//!                 .one::<Address>("address")
//!                 .build()
//!         })
//!     }
//!     fn from_state(state: ModelState) -> Self { Self(state) }
//!     fn state(&self) -> &ModelState { &self.0 }
//!     fn state_mut(&mut self) -> &mut ModelState { &mut self.0 }
//! }
//!
//! impl DocumentModel for User {
//!     const COLLECTION: &'static str = "users";
//! }
//!
//! let mut user = User::from_document(doc! { "n": "Ada", "address": { "c": "Oslo" } });
//! let address: &Address = user.embedded("address").unwrap();
//! assert_eq!(address.get_str("city"), Some("Oslo"));
//!
//! user.set("name", "Grace");
//! assert_eq!(user.dirty_update(), Some(doc! { "$set": { "n": "Grace" } }));
//! ```
//!
//! ## Identifiers
//!
//! ```rust
//! use docmodel_core::identifier;
//!
//! let ids = identifier::deduplicate([
//!     "65f1c0ffee0000000000beef",
//!     "not-an-id",
//!     "65f1c0ffee0000000000beef",
//! ]);
//! assert_eq!(ids.len(), 1);
//! ```
//!
//! ## Pagination
//!
//! ```rust
//! use docmodel_core::Paginate;
//!
//! let page = Paginate::new(95, 20, 10);
//! assert_eq!((page.current_page(), page.skip()), (10, 90));
//! ```

pub mod alias;
pub mod cipher;
pub mod coerce;
pub mod dirty;
pub mod error;
pub mod identifier;
pub mod inflate;
pub mod logging;
pub mod model;
pub mod pagination;
pub mod schema;

#[cfg(test)]
mod testing;

pub use alias::AliasMap;
pub use cipher::{FieldCipher, open_fields, seal_fields};
#[cfg(feature = "encryption")]
pub use cipher::AesFieldCipher;
pub use dirty::DirtyFields;
pub use error::{EncryptionError, ModelError, ModelResult};
pub use inflate::MAX_NESTING_DEPTH;
pub use model::{DEFAULT_CONNECTION, DocumentModel, Embedded, ModelState, SubModel, Value};
pub use pagination::{DEFAULT_PER_PAGE, Page, PageRequest, Paginate};
pub use schema::{NestedField, Schema, SchemaBuilder};

// Re-export logging utilities
pub use logging::{get_log_format, get_log_level, init as init_logging, is_debug_enabled};

// Re-export bson for model definitions
pub use bson;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::cipher::FieldCipher;
    pub use crate::error::{EncryptionError, ModelError, ModelResult};
    pub use crate::model::{DocumentModel, ModelState, SubModel, Value};
    pub use crate::pagination::{Page, PageRequest, Paginate};
    pub use crate::schema::{NestedField, Schema};
}
