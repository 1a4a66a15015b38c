//! TOML settings mapping connection ids to connection configuration.
//!
//! ```toml
//! [connections.default]
//! uri = "mongodb://${MONGO_HOST:-localhost}:27017"
//! database = "shop"
//! max_pool_size = 20
//! connect_timeout_ms = 5000
//!
//! [connections.analytics]
//! uri = "${ANALYTICS_URI}"
//! database = "events"
//! read_preference = "secondary_preferred"
//!
//! [encryption]
//! secret = "${DOCMODEL_SECRET}"
//! ```
//!
//! String values may reference environment variables as `${VAR}` or
//! `${VAR:-default}`. A referenced variable that is unset (and has no
//! default) is a configuration error.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use indexmap::IndexMap;
use serde::Deserialize;
use tracing::debug;

use crate::config::{MongoConfig, ReadPreference, WriteConcern};
use crate::error::{MongoError, MongoResult};

/// Source for environment variables.
pub trait EnvSource: Send + Sync {
    /// Get a variable's value.
    fn get(&self, name: &str) -> Option<String>;
}

/// The process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdEnvSource;

impl EnvSource for StdEnvSource {
    fn get(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

/// Fixed variables, for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct MapEnvSource {
    vars: HashMap<String, String>,
}

impl MapEnvSource {
    /// Create an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a variable.
    pub fn set(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }
}

impl EnvSource for MapEnvSource {
    fn get(&self, name: &str) -> Option<String> {
        self.vars.get(name).cloned()
    }
}

/// Expand `${VAR}` and `${VAR:-default}` references in `input`.
///
/// A `$` not followed by `{` is kept literally.
pub fn expand_env(input: &str, env: &dyn EnvSource) -> MongoResult<String> {
    let mut result = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        result.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after
            .find('}')
            .ok_or_else(|| MongoError::config(format!("unterminated variable in '{input}'")))?;
        let reference = &after[..end];

        let (name, default) = match reference.split_once(":-") {
            Some((name, default)) => (name, Some(default)),
            None => (reference, None),
        };
        if name.is_empty() {
            return Err(MongoError::config(format!("empty variable name in '{input}'")));
        }

        match (env.get(name).filter(|v| !v.is_empty()), default) {
            (Some(value), _) => result.push_str(&value),
            (None, Some(default)) => result.push_str(default),
            (None, None) => {
                return Err(MongoError::config(format!(
                    "environment variable '{name}' is not set"
                )));
            }
        }
        rest = &after[end + 1..];
    }

    result.push_str(rest);
    Ok(result)
}

fn expand_value(value: &mut toml::Value, env: &dyn EnvSource) -> MongoResult<()> {
    match value {
        toml::Value::String(s) if s.contains("${") => {
            *s = expand_env(s, env)?;
        }
        toml::Value::Array(items) => {
            for item in items {
                expand_value(item, env)?;
            }
        }
        toml::Value::Table(table) => {
            for (_, item) in table.iter_mut() {
                expand_value(item, env)?;
            }
        }
        _ => {}
    }
    Ok(())
}

/// One `[connections.<id>]` table.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConnectionSettings {
    /// Connection URI; defaults to localhost.
    #[serde(default)]
    pub uri: Option<String>,
    /// Database name.
    pub database: String,
    /// Application name.
    #[serde(default)]
    pub app_name: Option<String>,
    /// Minimum pool size.
    #[serde(default)]
    pub min_pool_size: Option<u32>,
    /// Maximum pool size.
    #[serde(default)]
    pub max_pool_size: Option<u32>,
    /// Maximum idle time, in seconds.
    #[serde(default)]
    pub max_idle_time_secs: Option<u64>,
    /// Connect timeout, in milliseconds.
    #[serde(default)]
    pub connect_timeout_ms: Option<u64>,
    /// Server selection timeout, in milliseconds.
    #[serde(default)]
    pub server_selection_timeout_ms: Option<u64>,
    /// Read preference.
    #[serde(default)]
    pub read_preference: Option<ReadPreference>,
    /// Write concern: "majority", a node count or a tag set name.
    #[serde(default)]
    pub write_concern: Option<String>,
    /// Retry writes.
    #[serde(default)]
    pub retry_writes: Option<bool>,
    /// Retry reads.
    #[serde(default)]
    pub retry_reads: Option<bool>,
    /// Direct connection.
    #[serde(default)]
    pub direct_connection: Option<bool>,
}

impl ConnectionSettings {
    /// Convert to a connection configuration.
    pub fn to_config(&self) -> MongoResult<MongoConfig> {
        let mut builder = MongoConfig::builder().database(self.database.clone());

        if let Some(ref uri) = self.uri {
            builder = builder.uri(uri.clone());
        }
        if let Some(ref app_name) = self.app_name {
            builder = builder.app_name(app_name.clone());
        }
        if let Some(size) = self.min_pool_size {
            builder = builder.min_pool_size(size);
        }
        if let Some(size) = self.max_pool_size {
            builder = builder.max_pool_size(size);
        }
        if let Some(secs) = self.max_idle_time_secs {
            builder = builder.max_idle_time(Duration::from_secs(secs));
        }
        if let Some(ms) = self.connect_timeout_ms {
            builder = builder.connect_timeout(Duration::from_millis(ms));
        }
        if let Some(ms) = self.server_selection_timeout_ms {
            builder = builder.server_selection_timeout(Duration::from_millis(ms));
        }
        if let Some(pref) = self.read_preference {
            builder = builder.read_preference(pref);
        }
        if let Some(ref wc) = self.write_concern {
            builder = builder.write_concern(wc.parse::<WriteConcern>()?);
        }
        if let Some(enabled) = self.retry_writes {
            builder = builder.retry_writes(enabled);
        }
        if let Some(enabled) = self.retry_reads {
            builder = builder.retry_reads(enabled);
        }
        if let Some(enabled) = self.direct_connection {
            builder = builder.direct_connection(enabled);
        }

        builder.build()
    }
}

/// The `[encryption]` table.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EncryptionSettings {
    /// Secret the field cipher key is derived from.
    pub secret: String,
}

/// Parsed settings file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Connection tables by connection id, in file order.
    #[serde(default)]
    pub connections: IndexMap<String, ConnectionSettings>,
    /// Field encryption.
    #[serde(default)]
    pub encryption: Option<EncryptionSettings>,
}

impl Settings {
    /// Parse settings, expanding variables from the process environment.
    pub fn from_toml_str(input: &str) -> MongoResult<Self> {
        Self::from_toml_str_with(input, &StdEnvSource)
    }

    /// Parse settings, expanding variables from `env`.
    pub fn from_toml_str_with(input: &str, env: &dyn EnvSource) -> MongoResult<Self> {
        let table: toml::Table = toml::from_str(input)
            .map_err(|e| MongoError::config(format!("invalid settings: {e}")))?;
        let mut value = toml::Value::Table(table);
        expand_value(&mut value, env)?;

        let settings: Settings = value
            .try_into()
            .map_err(|e| MongoError::config(format!("invalid settings: {e}")))?;
        debug!(
            connections = settings.connections.len(),
            encryption = settings.encryption.is_some(),
            "Settings parsed"
        );
        Ok(settings)
    }

    /// Read and parse a settings file.
    pub fn load(path: impl AsRef<Path>) -> MongoResult<Self> {
        let path = path.as_ref();
        let input = std::fs::read_to_string(path).map_err(|e| {
            MongoError::config(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&input)
    }

    /// Configuration for one connection id.
    pub fn connection(&self, id: &str) -> MongoResult<MongoConfig> {
        self.connections
            .get(id)
            .ok_or_else(|| MongoError::config(format!("no connection '{id}' in settings")))?
            .to_config()
    }

    /// Configurations for every connection id, in file order.
    pub fn configs(&self) -> MongoResult<Vec<(String, MongoConfig)>> {
        self.connections
            .iter()
            .map(|(id, conn)| Ok((id.clone(), conn.to_config()?)))
            .collect()
    }
}
