//! MongoDB connection configuration.

use std::str::FromStr;
use std::time::Duration;

use mongodb::options::{Acknowledgment, ClientOptions, SelectionCriteria};
use serde::Deserialize;

use crate::error::{MongoError, MongoResult};

/// Default connection URI.
pub const DEFAULT_URI: &str = "mongodb://localhost:27017";

/// Default application name reported to the server.
pub const DEFAULT_APP_NAME: &str = "docmodel";

/// Connection configuration for one connection id.
#[derive(Debug, Clone, PartialEq)]
pub struct MongoConfig {
    /// MongoDB connection URI.
    pub uri: String,
    /// Database name.
    pub database: String,
    /// Application name (shown in server logs).
    pub app_name: Option<String>,
    /// Minimum connection pool size.
    pub min_pool_size: Option<u32>,
    /// Maximum connection pool size.
    pub max_pool_size: Option<u32>,
    /// Maximum idle time for pooled connections.
    pub max_idle_time: Option<Duration>,
    /// Connection timeout.
    pub connect_timeout: Option<Duration>,
    /// Server selection timeout.
    pub server_selection_timeout: Option<Duration>,
    /// Read preference.
    pub read_preference: Option<ReadPreference>,
    /// Write concern.
    pub write_concern: Option<WriteConcern>,
    /// Driver-level write retries. Off by default so each call makes at
    /// most one attempt.
    pub retry_writes: Option<bool>,
    /// Driver-level read retries. Off by default.
    pub retry_reads: Option<bool>,
    /// Direct connection (bypass replica set discovery).
    pub direct_connection: Option<bool>,
}

/// MongoDB read preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadPreference {
    /// Read from primary only.
    #[default]
    Primary,
    /// Read from primary preferred, fallback to secondary.
    PrimaryPreferred,
    /// Read from secondary only.
    Secondary,
    /// Read from secondary preferred, fallback to primary.
    SecondaryPreferred,
    /// Read from nearest member.
    Nearest,
}

impl ReadPreference {
    fn to_selection_criteria(self) -> SelectionCriteria {
        use mongodb::options::ReadPreference as Driver;

        let pref = match self {
            Self::Primary => Driver::Primary,
            Self::PrimaryPreferred => Driver::PrimaryPreferred {
                options: Default::default(),
            },
            Self::Secondary => Driver::Secondary {
                options: Default::default(),
            },
            Self::SecondaryPreferred => Driver::SecondaryPreferred {
                options: Default::default(),
            },
            Self::Nearest => Driver::Nearest {
                options: Default::default(),
            },
        };
        SelectionCriteria::ReadPreference(pref)
    }
}

/// MongoDB write concern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteConcern {
    /// Acknowledge writes from the specified number of nodes.
    W(u32),
    /// Acknowledge writes from majority of nodes.
    Majority,
    /// Custom tag set.
    Custom(String),
}

impl WriteConcern {
    fn to_driver(&self) -> mongodb::options::WriteConcern {
        let w = match self {
            Self::W(n) => Acknowledgment::Nodes(*n),
            Self::Majority => Acknowledgment::Majority,
            Self::Custom(tag) => Acknowledgment::Custom(tag.clone()),
        };
        mongodb::options::WriteConcern::builder().w(w).build()
    }
}

/// Parses `"majority"`, a node count, or any other string as a tag set.
impl FromStr for WriteConcern {
    type Err = MongoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(MongoError::config("write concern must not be empty"));
        }
        if s.eq_ignore_ascii_case("majority") {
            return Ok(Self::Majority);
        }
        Ok(match s.parse::<u32>() {
            Ok(n) => Self::W(n),
            Err(_) => Self::Custom(s.to_string()),
        })
    }
}

impl Default for MongoConfig {
    fn default() -> Self {
        Self {
            uri: DEFAULT_URI.to_string(),
            database: String::new(),
            app_name: Some(DEFAULT_APP_NAME.to_string()),
            min_pool_size: None,
            max_pool_size: Some(10),
            max_idle_time: Some(Duration::from_secs(300)),
            connect_timeout: Some(Duration::from_secs(10)),
            server_selection_timeout: Some(Duration::from_secs(30)),
            read_preference: Some(ReadPreference::Primary),
            write_concern: None,
            retry_writes: Some(false),
            retry_reads: Some(false),
            direct_connection: None,
        }
    }
}

impl MongoConfig {
    /// Create a configuration from a MongoDB URI.
    pub fn from_uri(uri: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            database: database.into(),
            ..Self::default()
        }
    }

    /// Create a builder for configuration.
    pub fn builder() -> MongoConfigBuilder {
        MongoConfigBuilder::new()
    }

    /// Convert to driver `ClientOptions`.
    ///
    /// Settings here override the same settings in the URI.
    pub async fn to_client_options(&self) -> MongoResult<ClientOptions> {
        let mut options = ClientOptions::parse(&self.uri)
            .await
            .map_err(|e| MongoError::config(format!("failed to parse URI: {}", e)))?;
        self.apply(&mut options);
        Ok(options)
    }

    fn apply(&self, options: &mut ClientOptions) {
        if let Some(ref app_name) = self.app_name {
            options.app_name = Some(app_name.clone());
        }
        if self.min_pool_size.is_some() {
            options.min_pool_size = self.min_pool_size;
        }
        if self.max_pool_size.is_some() {
            options.max_pool_size = self.max_pool_size;
        }
        if self.max_idle_time.is_some() {
            options.max_idle_time = self.max_idle_time;
        }
        if self.connect_timeout.is_some() {
            options.connect_timeout = self.connect_timeout;
        }
        if self.server_selection_timeout.is_some() {
            options.server_selection_timeout = self.server_selection_timeout;
        }
        if let Some(pref) = self.read_preference {
            options.selection_criteria = Some(pref.to_selection_criteria());
        }
        if let Some(ref wc) = self.write_concern {
            options.write_concern = Some(wc.to_driver());
        }
        if self.retry_writes.is_some() {
            options.retry_writes = self.retry_writes;
        }
        if self.retry_reads.is_some() {
            options.retry_reads = self.retry_reads;
        }
        if self.direct_connection.is_some() {
            options.direct_connection = self.direct_connection;
        }
    }
}

/// Builder for [`MongoConfig`].
#[derive(Debug, Default)]
pub struct MongoConfigBuilder {
    uri: Option<String>,
    database: Option<String>,
    app_name: Option<String>,
    min_pool_size: Option<u32>,
    max_pool_size: Option<u32>,
    max_idle_time: Option<Duration>,
    connect_timeout: Option<Duration>,
    server_selection_timeout: Option<Duration>,
    read_preference: Option<ReadPreference>,
    write_concern: Option<WriteConcern>,
    retry_writes: Option<bool>,
    retry_reads: Option<bool>,
    direct_connection: Option<bool>,
}

impl MongoConfigBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the MongoDB URI.
    pub fn uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    /// Set the database name.
    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    /// Set the application name.
    pub fn app_name(mut self, name: impl Into<String>) -> Self {
        self.app_name = Some(name.into());
        self
    }

    /// Set the minimum pool size.
    pub fn min_pool_size(mut self, size: u32) -> Self {
        self.min_pool_size = Some(size);
        self
    }

    /// Set the maximum pool size.
    pub fn max_pool_size(mut self, size: u32) -> Self {
        self.max_pool_size = Some(size);
        self
    }

    /// Set the maximum idle time for pooled connections.
    pub fn max_idle_time(mut self, duration: Duration) -> Self {
        self.max_idle_time = Some(duration);
        self
    }

    /// Set the connection timeout.
    pub fn connect_timeout(mut self, duration: Duration) -> Self {
        self.connect_timeout = Some(duration);
        self
    }

    /// Set the server selection timeout.
    pub fn server_selection_timeout(mut self, duration: Duration) -> Self {
        self.server_selection_timeout = Some(duration);
        self
    }

    /// Set the read preference.
    pub fn read_preference(mut self, pref: ReadPreference) -> Self {
        self.read_preference = Some(pref);
        self
    }

    /// Set the write concern.
    pub fn write_concern(mut self, wc: WriteConcern) -> Self {
        self.write_concern = Some(wc);
        self
    }

    /// Enable or disable retry writes.
    pub fn retry_writes(mut self, enabled: bool) -> Self {
        self.retry_writes = Some(enabled);
        self
    }

    /// Enable or disable retry reads.
    pub fn retry_reads(mut self, enabled: bool) -> Self {
        self.retry_reads = Some(enabled);
        self
    }

    /// Enable direct connection (bypass replica set discovery).
    pub fn direct_connection(mut self, enabled: bool) -> Self {
        self.direct_connection = Some(enabled);
        self
    }

    /// Build the configuration. The database name is required.
    pub fn build(self) -> MongoResult<MongoConfig> {
        let database = self
            .database
            .filter(|db| !db.is_empty())
            .ok_or_else(|| MongoError::config("database name is required"))?;
        let defaults = MongoConfig::default();

        Ok(MongoConfig {
            uri: self.uri.unwrap_or(defaults.uri),
            database,
            app_name: self.app_name.or(defaults.app_name),
            min_pool_size: self.min_pool_size,
            max_pool_size: self.max_pool_size.or(defaults.max_pool_size),
            max_idle_time: self.max_idle_time.or(defaults.max_idle_time),
            connect_timeout: self.connect_timeout.or(defaults.connect_timeout),
            server_selection_timeout: self
                .server_selection_timeout
                .or(defaults.server_selection_timeout),
            read_preference: self.read_preference.or(defaults.read_preference),
            write_concern: self.write_concern,
            retry_writes: self.retry_writes.or(defaults.retry_writes),
            retry_reads: self.retry_reads.or(defaults.retry_reads),
            direct_connection: self.direct_connection,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_uri() {
        let config = MongoConfig::from_uri("mongodb://db:27017", "shop");
        assert_eq!(config.uri, "mongodb://db:27017");
        assert_eq!(config.database, "shop");
        assert_eq!(config.app_name.as_deref(), Some(DEFAULT_APP_NAME));
    }

    #[test]
    fn test_config_builder() {
        let config = MongoConfig::builder()
            .database("shop")
            .app_name("checkout")
            .max_pool_size(20)
            .write_concern(WriteConcern::Majority)
            .build()
            .unwrap();

        assert_eq!(config.uri, DEFAULT_URI);
        assert_eq!(config.app_name, Some("checkout".to_string()));
        assert_eq!(config.max_pool_size, Some(20));
        assert_eq!(config.write_concern, Some(WriteConcern::Majority));
        assert_eq!(config.connect_timeout, Some(Duration::from_secs(10)));
    }

    #[test]
    fn test_config_builder_missing_database() {
        let err = MongoConfig::builder().uri(DEFAULT_URI).build().unwrap_err();
        assert!(err.is_config_error());

        let err = MongoConfig::builder().database("").build().unwrap_err();
        assert!(err.is_config_error());
    }

    #[test]
    fn test_write_concern_parse() {
        assert_eq!("majority".parse::<WriteConcern>().unwrap(), WriteConcern::Majority);
        assert_eq!("2".parse::<WriteConcern>().unwrap(), WriteConcern::W(2));
        assert_eq!(
            "dc-east".parse::<WriteConcern>().unwrap(),
            WriteConcern::Custom("dc-east".into())
        );
        assert!("  ".parse::<WriteConcern>().is_err());
    }

    #[tokio::test]
    async fn test_to_client_options() {
        let config = MongoConfig::builder()
            .uri("mongodb://localhost:27017/?appName=ignored")
            .database("shop")
            .app_name("checkout")
            .max_pool_size(5)
            .read_preference(ReadPreference::Nearest)
            .build()
            .unwrap();

        let options = config.to_client_options().await.unwrap();
        assert_eq!(options.app_name.as_deref(), Some("checkout"));
        assert_eq!(options.max_pool_size, Some(5));
        assert!(options.selection_criteria.is_some());
    }

    #[tokio::test]
    async fn test_driver_retries_disabled_by_default() {
        let options = MongoConfig::from_uri("mongodb://localhost:27017/?retryWrites=true", "shop")
            .to_client_options()
            .await
            .unwrap();
        assert_eq!(options.retry_writes, Some(false));
        assert_eq!(options.retry_reads, Some(false));

        let config = MongoConfig::builder()
            .database("shop")
            .retry_writes(true)
            .build()
            .unwrap();
        assert_eq!(config.retry_writes, Some(true));
        assert_eq!(config.retry_reads, Some(false));
    }

    #[tokio::test]
    async fn test_bad_uri_is_config_error() {
        let config = MongoConfig::from_uri("postgres://nope", "shop");
        let err = config.to_client_options().await.unwrap_err();
        assert!(err.is_config_error());
    }
}
