//! Model fixtures shared by unit tests.

use std::sync::{Arc, OnceLock};

use docmodel_core::{DocumentModel, FieldCipher, ModelState, Schema, SubModel};

use crate::client::MongoClient;
use crate::config::MongoConfig;
use crate::registry::ModelService;
use crate::service::Service;

#[derive(Debug, Clone, PartialEq)]
pub struct Order(ModelState);

impl SubModel for Order {
    fn schema() -> &'static Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            Schema::builder("Order")
                .alias("cust", "customer")
                .fields(["total", "status", "tags", "qty", "placed"])
                .build()
        })
    }

    fn from_state(state: ModelState) -> Self {
        Self(state)
    }

    fn state(&self) -> &ModelState {
        &self.0
    }

    fn state_mut(&mut self) -> &mut ModelState {
        &mut self.0
    }
}

impl DocumentModel for Order {
    const COLLECTION: &'static str = "orders";
}

pub struct OrderService;

impl ModelService for OrderService {
    type Model = Order;
}

#[derive(Debug, Clone, PartialEq)]
pub struct Card(ModelState);

impl SubModel for Card {
    fn schema() -> &'static Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            Schema::builder("Card")
                .alias("num", "number")
                .field("holder")
                .encrypted("number")
                .build()
        })
    }

    fn from_state(state: ModelState) -> Self {
        Self(state)
    }

    fn state(&self) -> &ModelState {
        &self.0
    }

    fn state_mut(&mut self) -> &mut ModelState {
        &mut self.0
    }
}

impl DocumentModel for Card {
    const COLLECTION: &'static str = "cards";
}

pub struct CardService;

impl ModelService for CardService {
    type Model = Card;
}

/// A service over a lazily connected client; nothing is sent to a server.
pub async fn service_for<M: DocumentModel>(cipher: Option<Arc<dyn FieldCipher>>) -> Service<M> {
    let client = MongoClient::new(MongoConfig::from_uri("mongodb://localhost:27017", "test"))
        .await
        .unwrap();
    Service::new(client.database().collection(M::COLLECTION), cipher)
}
