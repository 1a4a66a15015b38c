//! Connection and service registry.
//!
//! The registry maps connection ids to database handles and binds every
//! model type to exactly one service type. Services resolve their collection
//! through it, so a missing connection or binding surfaces as a
//! configuration error the moment a service is requested.
//!
//! Registration is expected at startup; afterwards the registry is only
//! read. Re-registering replaces the previous entry.
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
//! let registry = Registry::new();
//! registry.connect(&Settings::load("docmodel.toml")?).await?;
//! registry.register_service::<UserService>();
//!
//! let users = UserService::service(&registry)?;
//! let ada = users.get_one_where("name", "Ada").await?;
//! ```

use std::any::{TypeId, type_name};
use std::sync::{Arc, OnceLock};

use docmodel_core::{DocumentModel, FieldCipher};
use indexmap::IndexMap;
use mongodb::Database;
use parking_lot::RwLock;
use tracing::{debug, info};

use crate::client::MongoClient;
use crate::error::{MongoError, MongoResult};
use crate::service::Service;
use crate::settings::Settings;

/// A user service type bound to one model type.
pub trait ModelService: Send + Sync + 'static {
    /// The model this service handles.
    type Model: DocumentModel;

    /// The gateway for this service's model.
    fn service(registry: &Registry) -> MongoResult<Service<Self::Model>> {
        registry.service::<Self::Model>()
    }
}

/// One model ↔ service binding, for bulk registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Binding {
    model: TypeId,
    model_name: &'static str,
    service: TypeId,
    service_name: &'static str,
}

impl Binding {
    /// Binding for the service type `S`.
    pub fn of<S: ModelService>() -> Self {
        Self {
            model: TypeId::of::<S::Model>(),
            model_name: type_name::<S::Model>(),
            service: TypeId::of::<S>(),
            service_name: type_name::<S>(),
        }
    }

    /// Name of the model type.
    pub fn model_name(&self) -> &'static str {
        self.model_name
    }

    /// Name of the service type.
    pub fn service_name(&self) -> &'static str {
        self.service_name
    }
}

#[derive(Debug, Default)]
struct Bindings {
    by_model: IndexMap<TypeId, Binding>,
    by_service: IndexMap<TypeId, Binding>,
}

impl Bindings {
    fn insert(&mut self, binding: Binding) {
        // Both directions stay one-to-one.
        if let Some(old) = self.by_model.shift_remove(&binding.model) {
            self.by_service.shift_remove(&old.service);
        }
        if let Some(old) = self.by_service.shift_remove(&binding.service) {
            self.by_model.shift_remove(&old.model);
        }
        self.by_model.insert(binding.model, binding);
        self.by_service.insert(binding.service, binding);
    }
}

/// Registry of database handles, service bindings and the field cipher.
#[derive(Default)]
pub struct Registry {
    databases: RwLock<IndexMap<String, Database>>,
    bindings: RwLock<Bindings>,
    cipher: RwLock<Option<Arc<dyn FieldCipher>>>,
}

impl Registry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry.
    pub fn global() -> &'static Registry {
        static GLOBAL: OnceLock<Registry> = OnceLock::new();
        GLOBAL.get_or_init(Registry::new)
    }

    /// Register the database handle for a connection id.
    pub fn register_database(&self, connection: impl Into<String>, database: Database) {
        let connection = connection.into();
        debug!(connection = %connection, database = %database.name(), "Registering database");
        self.databases.write().insert(connection, database);
    }

    /// Register the client's database for a connection id.
    pub fn register_client(&self, connection: impl Into<String>, client: &MongoClient) {
        self.register_database(connection, client.database().clone());
    }

    /// Create a client for every connection in `settings` and register it.
    ///
    /// With the `encryption` feature, an `[encryption]` table installs an
    /// AES-GCM field cipher.
    pub async fn connect(&self, settings: &Settings) -> MongoResult<()> {
        for (id, config) in settings.configs()? {
            let client = MongoClient::new(config).await?;
            self.register_client(id, &client);
        }

        self.install_cipher(settings)?;

        info!(connections = settings.connections.len(), "Registry connected");
        Ok(())
    }

    #[cfg(feature = "encryption")]
    fn install_cipher(&self, settings: &Settings) -> MongoResult<()> {
        if let Some(ref encryption) = settings.encryption {
            self.set_cipher(Arc::new(docmodel_core::AesFieldCipher::new(
                &encryption.secret,
            )));
        }
        Ok(())
    }

    #[cfg(not(feature = "encryption"))]
    fn install_cipher(&self, settings: &Settings) -> MongoResult<()> {
        match settings.encryption {
            Some(_) => Err(MongoError::config(
                "settings enable encryption but the `encryption` feature is disabled",
            )),
            None => Ok(()),
        }
    }

    /// Database handle for a connection id.
    pub fn database(&self, connection: &str) -> MongoResult<Database> {
        self.databases
            .read()
            .get(connection)
            .cloned()
            .ok_or_else(|| {
                MongoError::config(format!("no database registered for connection '{connection}'"))
            })
    }

    /// Registered connection ids.
    pub fn connections(&self) -> Vec<String> {
        self.databases.read().keys().cloned().collect()
    }

    /// Bind `S::Model` to `S`.
    pub fn register_service<S: ModelService>(&self) {
        self.register_binding(Binding::of::<S>());
    }

    /// Register one binding.
    pub fn register_binding(&self, binding: Binding) {
        debug!(
            model = %binding.model_name,
            service = %binding.service_name,
            "Registering service"
        );
        self.bindings.write().insert(binding);
    }

    /// Register several bindings in order.
    pub fn register_bindings(&self, bindings: impl IntoIterator<Item = Binding>) {
        let mut guard = self.bindings.write();
        for binding in bindings {
            guard.insert(binding);
        }
    }

    /// The binding for model type `M`.
    pub fn binding_for_model<M: DocumentModel>(&self) -> MongoResult<Binding> {
        self.bindings
            .read()
            .by_model
            .get(&TypeId::of::<M>())
            .copied()
            .ok_or_else(|| {
                MongoError::config(format!("no service registered for model {}", type_name::<M>()))
            })
    }

    /// The binding for service type `S`.
    pub fn binding_for_service<S: ModelService>(&self) -> MongoResult<Binding> {
        self.bindings
            .read()
            .by_service
            .get(&TypeId::of::<S>())
            .copied()
            .ok_or_else(|| {
                MongoError::config(format!("service {} is not registered", type_name::<S>()))
            })
    }

    /// Install the field cipher used for encrypted attributes.
    pub fn set_cipher(&self, cipher: Arc<dyn FieldCipher>) {
        *self.cipher.write() = Some(cipher);
    }

    /// The installed field cipher.
    pub fn cipher(&self) -> Option<Arc<dyn FieldCipher>> {
        self.cipher.read().clone()
    }

    /// The gateway for model `M`.
    ///
    /// Fails when `M` has no registered service, when its connection has no
    /// database, or when it declares encrypted attributes and no cipher is
    /// installed.
    pub fn service<M: DocumentModel>(&self) -> MongoResult<Service<M>> {
        self.binding_for_model::<M>()?;
        let database = self.database(M::CONNECTION)?;
        let cipher = self.cipher();
        if M::schema().has_encrypted() && cipher.is_none() {
            return Err(MongoError::config(format!(
                "model {} has encrypted fields but no field cipher is installed",
                type_name::<M>()
            )));
        }
        Ok(Service::new(database.collection(M::COLLECTION), cipher))
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("connections", &self.connections())
            .field("bindings", &self.bindings.read().by_model.len())
            .field("cipher", &self.cipher.read().is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MongoConfig;
    use crate::testing::{Card, CardService, Order, OrderService};
    use pretty_assertions::assert_eq;

    struct OtherOrderService;

    impl ModelService for OtherOrderService {
        type Model = Order;
    }

    async fn database(name: &str) -> Database {
        MongoClient::new(MongoConfig::from_uri("mongodb://localhost:27017", name))
            .await
            .unwrap()
            .database()
            .clone()
    }

    #[tokio::test]
    async fn test_missing_connection_is_config_error() {
        let registry = Registry::new();
        registry.register_service::<OrderService>();
        let err = OrderService::service(&registry).unwrap_err();
        assert!(err.is_config_error());
        assert!(err.to_string().contains("connection 'default'"));
    }

    #[tokio::test]
    async fn test_missing_binding_is_config_error() {
        let registry = Registry::new();
        registry.register_database("default", database("shop").await);
        let err = registry.service::<Order>().unwrap_err();
        assert!(err.is_config_error());
        assert!(err.to_string().contains("no service registered"));
    }

    #[tokio::test]
    async fn test_service_resolves_collection() {
        let registry = Registry::new();
        registry.register_database("default", database("shop").await);
        registry.register_service::<OrderService>();

        let service = OrderService::service(&registry).unwrap();
        assert_eq!(service.collection().name(), "orders");
        assert_eq!(service.collection().namespace().db, "shop");
    }

    #[tokio::test]
    async fn test_last_database_wins() {
        let registry = Registry::new();
        registry.register_database("default", database("one").await);
        registry.register_database("default", database("two").await);
        assert_eq!(registry.database("default").unwrap().name(), "two");
        assert_eq!(registry.connections(), vec!["default".to_string()]);
    }

    #[test]
    fn test_rebinding_keeps_one_to_one() {
        let registry = Registry::new();
        registry.register_bindings([Binding::of::<OrderService>(), Binding::of::<CardService>()]);
        registry.register_service::<OtherOrderService>();

        let binding = registry.binding_for_model::<Order>().unwrap();
        assert!(binding.service_name().ends_with("OtherOrderService"));
        assert!(registry.binding_for_service::<OrderService>().is_err());
        assert!(registry.binding_for_service::<CardService>().is_ok());
    }

    #[tokio::test]
    async fn test_encrypted_model_requires_cipher() {
        let registry = Registry::new();
        registry.register_database("default", database("shop").await);
        registry.register_service::<CardService>();
        assert!(registry.service::<Card>().unwrap_err().is_config_error());

        #[cfg(feature = "encryption")]
        {
            registry.set_cipher(Arc::new(docmodel_core::AesFieldCipher::new("k")));
            assert!(registry.service::<Card>().is_ok());
        }
    }

    #[tokio::test]
    async fn test_connect_from_settings() {
        let settings = Settings::from_toml_str_with(
            r#"
            [connections.default]
            database = "shop"

            [connections.analytics]
            uri = "mongodb://localhost:27018"
            database = "events"
            "#,
            &crate::settings::MapEnvSource::new(),
        )
        .unwrap();

        let registry = Registry::new();
        registry.connect(&settings).await.unwrap();
        assert_eq!(registry.connections(), vec!["default", "analytics"]);
        assert_eq!(registry.database("analytics").unwrap().name(), "events");
    }
}
