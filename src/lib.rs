//! # docmodel
//!
//! Typed document models over MongoDB.
//!
//! docmodel provides:
//! - Models that inflate raw documents into typed, nested sub-models
//! - Short wire aliases for attribute names
//! - Dirty tracking so updates only send what changed
//! - A per-model service for lookups, atomic operators and pagination
//! - Aggregation helpers for percentiles, OHLC candles and moving averages
//! - Optional transparent field encryption
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::OnceLock;
//! use docmodel::prelude::*;
//!
//! #[derive(Debug, Clone, PartialEq)]
//! pub struct User(ModelState);
//!
//! impl SubModel for User {
//!     fn schema() -> &'static Schema {
//!         static SCHEMA: OnceLock<Schema> = OnceLock::new();
//!         SCHEMA.get_or_init(|| Schema::builder("User").alias("n", "name").build())
//!     }
//!
//!     fn from_state(state: ModelState) -> Self {
//!         Self(state)
//!     }
//!
//!     fn state(&self) -> &ModelState {
//!         &self.0
//!     }
//!
//!     fn state_mut(&mut self) -> &mut ModelState {
//!         &mut self.0
//!     }
//! }
//!
//! impl DocumentModel for User {
//!     const COLLECTION: &'static str = "users";
//! }
//!
//! struct UserService;
//!
//! impl ModelService for UserService {
//!     type Model = User;
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), MongoError> {
//!     docmodel::init_logging();
//!
//!     let registry = Registry::global();
//!     registry.connect(&Settings::load("docmodel.toml")?).await?;
//!     registry.register_service::<UserService>();
//!
//!     let users = registry.service::<User>()?;
//!     let ada = users.get_one_where("name", "Ada").await?;
//!
//!     Ok(())
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

/// Models, schemas, inflation and dirty tracking.
pub mod model {
    pub use docmodel_core::*;
}

/// MongoDB services, registry and aggregations.
pub mod mongo {
    pub use docmodel_mongodb::*;
}

/// Prelude module for convenient imports.
pub mod prelude {
    pub use docmodel_mongodb::prelude::*;
}

// Re-export key types at the crate root
pub use docmodel_core::{
    DocumentModel, ModelError, ModelState, Page, PageRequest, Paginate, Schema, SubModel, Value,
    init_logging,
};
pub use docmodel_mongodb::{MongoError, MongoResult, Registry, Service, Settings};
