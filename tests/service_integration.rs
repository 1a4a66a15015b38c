//! Integration tests for the registry and model services.
//!
//! Clients connect lazily, so everything here runs without a server: the
//! tests cover configuration failures and the checks that happen before any
//! request is sent.

use std::sync::{Arc, OnceLock};

use docmodel::mongo::aggregation::{CandleQuery, SmaQuery};
use docmodel::prelude::*;
use pretty_assertions::assert_eq;

#[derive(Debug, Clone, PartialEq)]
struct Account(ModelState);

impl SubModel for Account {
    fn schema() -> &'static Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            Schema::builder("Account")
                .alias("o", "owner")
                .alias("ib", "iban")
                .fields(["balance", "opened"])
                .encrypted("iban")
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

impl DocumentModel for Account {
    const COLLECTION: &'static str = "accounts";
}

#[derive(Debug, Clone, PartialEq)]
struct Tick(ModelState);

impl SubModel for Tick {
    fn schema() -> &'static Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA.get_or_init(|| Schema::builder("Tick").build())
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

impl DocumentModel for Tick {
    const COLLECTION: &'static str = "ticks";
    const CONNECTION: &'static str = "market";
}

struct AccountService;

impl ModelService for AccountService {
    type Model = Account;
}

struct TickService;

impl ModelService for TickService {
    type Model = Tick;
}

async fn registry() -> Registry {
    let registry = Registry::new();
    let client = MongoClient::new(MongoConfig::from_uri("mongodb://localhost:27017", "bank"))
        .await
        .unwrap();
    registry.register_client("default", &client);
    registry
}

/// Test services resolve once model, connection and cipher are in place
#[tokio::test]
async fn test_service_resolution() {
    let registry = registry().await;

    let err = registry.service::<Account>().unwrap_err();
    assert!(err.is_config_error());

    registry.register_service::<AccountService>();
    let err = registry.service::<Account>().unwrap_err();
    assert!(err.is_config_error(), "encrypted model without cipher");

    registry.set_cipher(Arc::new(docmodel::model::AesFieldCipher::new("secret")));
    let accounts = registry.service::<Account>().unwrap();
    assert_eq!(accounts.name(), "accounts");
}

/// Test a model on an unregistered connection fails loudly
#[tokio::test]
async fn test_missing_connection() {
    let registry = registry().await;
    registry.register_bindings([Binding::of::<AccountService>(), Binding::of::<TickService>()]);

    let err = registry.service::<Tick>().unwrap_err();
    assert!(err.is_config_error());
    assert_eq!(registry.connections(), vec!["default".to_string()]);
}

/// Test encrypted attributes are sealed on the wire and opened on load
#[tokio::test]
async fn test_encrypted_round_trip() {
    let registry = registry().await;
    registry.register_service::<AccountService>();
    registry.set_cipher(Arc::new(docmodel::model::AesFieldCipher::new("secret")));
    let accounts = registry.service::<Account>().unwrap();

    let mut account = Account::new();
    account.set("owner", "Ada");
    account.set("iban", "NO93 8601 1117 947");
    account.set("balance", 1200);

    let stored = accounts.dehydrate(&account).unwrap();
    assert_eq!(stored.get_str("o").unwrap(), "Ada");
    assert_ne!(stored.get_str("ib").unwrap(), "NO93 8601 1117 947");

    let loaded = accounts.inflate(stored).unwrap();
    assert_eq!(loaded.get_str("iban"), Some("NO93 8601 1117 947"));
    assert_eq!(loaded.get_as::<i32>("balance"), Some(1200));
}

/// Test a different secret cannot open sealed attributes
#[tokio::test]
async fn test_wrong_secret_fails() {
    let sealing = registry().await;
    sealing.register_service::<AccountService>();
    sealing.set_cipher(Arc::new(docmodel::model::AesFieldCipher::new("one")));

    let opening = registry().await;
    opening.register_service::<AccountService>();
    opening.set_cipher(Arc::new(docmodel::model::AesFieldCipher::new("two")));

    let mut account = Account::new();
    account.set("iban", "DE89 3704 0044 0532 0130 00");
    let stored = sealing.service::<Account>().unwrap().dehydrate(&account).unwrap();

    let err = opening.service::<Account>().unwrap().inflate(stored).unwrap_err();
    assert!(err.is_encryption());
}

/// Test argument checks that run before any request is sent
#[tokio::test]
async fn test_invalid_arguments_rejected_early() {
    let registry = registry().await;
    registry.register_service::<AccountService>();
    registry.set_cipher(Arc::new(docmodel::model::AesFieldCipher::new("secret")));
    let accounts = registry.service::<Account>().unwrap();

    let mut persisted = Account::from_document(doc! { "_id": ObjectId::new(), "o": "Ada" });
    assert!(accounts.insert(&mut persisted).await.unwrap_err().is_invalid_argument());

    let mut fresh = Account::new();
    assert!(
        accounts
            .update(&mut fresh, UpdateMode::Partial)
            .await
            .unwrap_err()
            .is_invalid_argument()
    );

    let mut clean = Account::from_document(doc! { "_id": ObjectId::new(), "o": "Ada" });
    assert!(!accounts.update(&mut clean, UpdateMode::Partial).await.unwrap());

    assert_eq!(accounts.get_by_id("not-an-id").await.unwrap(), None);

    let page = accounts
        .get_paginated(QueryBuilder::new(), PageRequest::first(0))
        .await
        .unwrap();
    assert!(page.is_empty());
    assert_eq!(page.next_cursor, None);

    let stats = accounts.aggregate();
    assert!(
        stats
            .percentile("balance", 0.5, "upwards", None)
            .await
            .unwrap_err()
            .is_invalid_argument()
    );
    assert!(
        stats
            .candles(CandleQuery::new("balance", "opened").minutes(0))
            .await
            .unwrap_err()
            .is_invalid_argument()
    );
    assert!(
        stats
            .simple_moving_average(SmaQuery::new("owner", "balance", "opened", 0))
            .await
            .unwrap_err()
            .is_invalid_argument()
    );
}

/// Test page arithmetic for page-number requests
#[test]
fn test_pagination_examples() {
    let page = Paginate::new(95, 3, 10);
    assert_eq!((page.skip(), page.limit(), page.total_pages()), (20, 10, 10));

    let clamped = Paginate::new(95, 50, 10);
    assert_eq!(clamped.current_page(), 10);

    let empty = Paginate::new(0, 4, 0);
    assert_eq!(
        (empty.total_pages(), empty.current_page(), empty.skip()),
        (0, 1, 0)
    );

    let middle = Paginate::new(200, 10, 10);
    let visible: Vec<u64> = (1..=20)
        .filter(|p| middle.should_show_page_on_ui(*p, Some(2)))
        .collect();
    assert_eq!(visible, vec![8, 9, 10, 11, 12]);
}

/// Test sort directions accept the loose spellings and nothing else
#[test]
fn test_sort_direction_parsing() {
    assert_eq!("asc".parse::<SortDirection>().unwrap(), SortDirection::Ascending);
    assert_eq!("desc".parse::<SortDirection>().unwrap(), SortDirection::Descending);
    assert_eq!(SortDirection::try_from(-1).unwrap(), SortDirection::Descending);
    assert!(SortDirection::try_from(0).unwrap_err().is_invalid_argument());
    assert!("up".parse::<SortDirection>().is_err());
}

/// Test filters and queries built through the public builders
#[test]
fn test_query_builders() {
    let filter = FilterBuilder::new()
        .gte("balance", 100)
        .lt("balance", 500)
        .eq("o", "Ada")
        .build();
    assert_eq!(
        filter,
        doc! { "balance": { "$gte": 100, "$lt": 500 }, "o": "Ada" }
    );

    let query = QueryBuilder::new()
        .filter(filter.clone())
        .sort("balance", SortDirection::Descending)
        .skip(10)
        .limit(5);
    let (query_filter, options) = query.into_parts();
    assert_eq!(query_filter, filter);
    assert_eq!(options.sort, Some(doc! { "balance": -1 }));
    assert_eq!(options.skip, Some(10));
    assert_eq!(options.limit, Some(5));
}
