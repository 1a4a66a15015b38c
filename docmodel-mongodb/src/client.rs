//! MongoDB client wrapper.

use std::sync::Arc;

use bson::Document;
use mongodb::{Client, Collection, Database};
use tracing::info;

use crate::config::MongoConfig;
use crate::error::{MongoError, MongoResult};

/// A driver client bound to one database.
///
/// The driver pools connections internally and connects lazily, so creating
/// a client performs no I/O.
#[derive(Clone)]
pub struct MongoClient {
    client: Client,
    database: Database,
    config: Arc<MongoConfig>,
}

impl MongoClient {
    /// Create a client from configuration.
    pub async fn new(config: MongoConfig) -> MongoResult<Self> {
        let options = config.to_client_options().await?;

        let client = Client::with_options(options)
            .map_err(|e| MongoError::connection(format!("failed to create client: {}", e)))?;
        let database = client.database(&config.database);

        info!(
            database = %config.database,
            app_name = ?config.app_name,
            "MongoDB client created"
        );

        Ok(Self {
            client,
            database,
            config: Arc::new(config),
        })
    }

    /// Raw document collection.
    pub fn collection(&self, name: &str) -> Collection<Document> {
        self.database.collection(name)
    }

    /// The configured database.
    pub fn database(&self) -> &Database {
        &self.database
    }

    /// The underlying driver client.
    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// The configuration the client was built from.
    pub fn config(&self) -> &MongoConfig {
        &self.config
    }
}

impl std::fmt::Debug for MongoClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MongoClient")
            .field("database", &self.config.database)
            .finish_non_exhaustive()
    }
}
