//! # docmodel-mongodb
//!
//! MongoDB services for docmodel models.
//!
//! This crate provides:
//! - Connection configuration and TOML settings with `${ENV}` interpolation
//! - A registry binding each model type to its service and connection
//! - [`Service`], the per-model gateway for lookups, persistence, atomic
//!   operators, deletion and pagination
//! - [`AggregationService`] for sums, averages, percentiles, OHLC candles and
//!   moving averages
//! - Transparent field encryption through a [`FieldCipher`](docmodel_core::FieldCipher)
//!
//! ## Example
//!
//! ```rust,ignore
//! use docmodel_mongodb::prelude::*;
//!
//! struct UserService;
//!
//! impl ModelService for UserService {
//!     type Model = User;
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), MongoError> {
//!     let registry = Registry::global();
//!     registry.connect(&Settings::load("docmodel.toml")?).await?;
//!     registry.register_service::<UserService>();
//!
//!     let users = registry.service::<User>()?;
//!
//!     let mut user = User::default();
//!     user.set_name("Ada");
//!     users.insert(&mut user).await?;
//!
//!     users.inc(user.id().unwrap(), "logins", 1).await?;
//!
//!     let page = users
//!         .get_paginated(QueryBuilder::new(), PageRequest::page(1, 20))
//!         .await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Settings
//!
//! ```toml
//! [connections.default]
//! uri = "${MONGO_URI:-mongodb://localhost:27017}"
//! database = "app"
//! max_pool_size = 20
//!
//! [encryption]
//! secret = "${FIELD_SECRET}"
//! ```

pub mod aggregation;
pub mod client;
pub mod config;
pub mod error;
pub mod filter;
pub mod registry;
pub mod service;
pub mod settings;
pub mod sort;

#[cfg(test)]
mod testing;

pub use bson::oid::ObjectId;
pub use bson::{Bson, Document, doc};
pub use aggregation::{AggregationService, Candle, CandleQuery, SmaPoint, SmaQuery};
pub use client::MongoClient;
pub use config::{MongoConfig, MongoConfigBuilder, ReadPreference, WriteConcern};
pub use error::{MongoError, MongoResult};
pub use filter::{FilterBuilder, QueryBuilder};
pub use registry::{Binding, ModelService, Registry};
pub use service::{Delta, Service, UpdateMode};
pub use settings::{ConnectionSettings, EncryptionSettings, Settings};
pub use sort::SortDirection;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::aggregation::{AggregationService, Candle, CandleQuery, SmaPoint, SmaQuery};
    pub use crate::client::MongoClient;
    pub use crate::config::{MongoConfig, MongoConfigBuilder};
    pub use crate::error::{MongoError, MongoResult};
    pub use crate::filter::{FilterBuilder, QueryBuilder};
    pub use crate::registry::{Binding, ModelService, Registry};
    pub use crate::service::{Delta, Service, UpdateMode};
    pub use crate::settings::Settings;
    pub use crate::sort::SortDirection;
    pub use bson::oid::ObjectId;
    pub use bson::{Bson, Document, doc};
    pub use docmodel_core::prelude::*;
}
