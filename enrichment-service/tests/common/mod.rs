//! Common test utilities for enrichment-service integration tests.

use enrichment_service::config::{
    DatabaseConfig, EnrichmentConfig, RedisConfig, WorkerConfig,
};
use enrichment_service::services::{CacheStore, Database, InMemoryCache};
use enrichment_service::startup::Application;
use enrichment_service::workers::{BatchProcessor, ProcessingQueue};
use serde_json::{json, Value};
use std::sync::{Arc, Once};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

static INIT: Once = Once::new();

/// Initialize tracing for tests (only once).
pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("info,enrichment_service=debug,sqlx=warn")
            .with_test_writer()
            .try_init()
            .ok();
    });
}

fn test_config() -> EnrichmentConfig {
    let database_url = std::env::var("TEST_DATABASE_URL")
        .expect("TEST_DATABASE_URL must be set to a PostgreSQL URL to run integration tests");

    EnrichmentConfig {
        port: 0,
        service_name: "enrichment-service-test".to_string(),
        service_version: "test".to_string(),
        log_level: "debug".to_string(),
        database: DatabaseConfig {
            url: database_url,
            max_connections: 2,
            min_connections: 1,
        },
        redis: RedisConfig {
            url: String::new(), // Unused: tests inject an in-memory cache
        },
        worker: WorkerConfig {
            queue_size: 16,
            max_attempts: 1,
            trigger_expiry_seconds: 240,
            sweep_interval_seconds: 300,
            sweep_enabled: false, // Tests trigger processing explicitly
        },
    }
}

/// Test application wrapper.
#[allow(dead_code)]
pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub client: reqwest::Client,
    pub db: Arc<Database>,
    pub cache: Arc<dyn CacheStore>,
    pub processor: Arc<BatchProcessor>,
    pub queue: Arc<ProcessingQueue>,
    pub workers: CancellationToken,
}

/// Spawn a test application backed by an in-memory cache.
pub async fn spawn_app() -> TestApp {
    init_tracing();

    let config = test_config();
    let cache: Arc<dyn CacheStore> = Arc::new(InMemoryCache::new());

    let app = Application::build_with_cache(config, cache.clone())
        .await
        .expect("Failed to build application");

    let port = app.port();
    let db = app.db().clone();
    let processor = app.processor().clone();
    let queue = app.queue().clone();
    let workers = app.worker_shutdown_handle();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        app.run_until_stopped().await.ok();
    });

    // Wait for the HTTP server to come up
    let client = reqwest::Client::new();
    let health_url = format!("{}/health", address);
    for _ in 0..50 {
        if client.get(&health_url).send().await.is_ok() {
            break;
        }
        tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
    }

    TestApp {
        address,
        port,
        client,
        db,
        cache,
        processor,
        queue,
        workers,
    }
}

#[allow(dead_code)]
impl TestApp {
    /// Create a category via the admin API, returning its id.
    pub async fn create_category(&self, name: &str) -> Uuid {
        let response = self
            .client
            .post(format!("{}/api/categories", self.address))
            .json(&json!({ "name": name }))
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(201, response.status().as_u16());
        let body: Value = response.json().await.expect("Failed to parse JSON");
        body["category_id"]
            .as_str()
            .and_then(|s| Uuid::parse_str(s).ok())
            .expect("category id")
    }

    /// Attach a pattern to a category via the admin API.
    pub async fn add_pattern(&self, category_id: Uuid, pattern: &str) {
        let response = self
            .client
            .post(format!(
                "{}/api/categories/{}/patterns",
                self.address, category_id
            ))
            .json(&json!({ "pattern": pattern }))
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(201, response.status().as_u16());
    }

    /// Post an ingestion payload and return the response.
    pub async fn ingest(&self, payload: &Value) -> reqwest::Response {
        self.client
            .post(format!("{}/api/integrations/transactions", self.address))
            .json(payload)
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Trigger synchronous processing of a batch.
    pub async fn process(&self, batch_id: Uuid) -> reqwest::Response {
        self.client
            .post(format!("{}/api/batches/{}/process", self.address, batch_id))
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Fetch batch metadata.
    pub async fn get_batch(&self, batch_id: Uuid) -> reqwest::Response {
        self.client
            .get(format!("{}/api/batches/{}", self.address, batch_id))
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Fetch a spending summary for an account.
    pub async fn summary(
        &self,
        account_id: &str,
        start_date: &str,
        end_date: &str,
    ) -> reqwest::Response {
        self.client
            .get(format!(
                "{}/api/reports/accounts/{}/summary?start_date={}&end_date={}",
                self.address, account_id, start_date, end_date
            ))
            .send()
            .await
            .expect("Failed to execute request")
    }
}

/// A minimal account object for ingestion payloads.
#[allow(dead_code)]
pub fn test_account(account_id: &str) -> Value {
    json!({
        "account_id": account_id,
        "name": "Test Checking",
        "type": "depository",
        "subtype": "checking",
        "mask": "0000"
    })
}

/// A transaction object for ingestion payloads.
#[allow(dead_code)]
pub fn test_transaction(
    transaction_id: &str,
    account_id: &str,
    amount: &str,
    date: &str,
    name: &str,
    merchant_name: Option<&str>,
) -> Value {
    json!({
        "transaction_id": transaction_id,
        "account_id": account_id,
        "amount": amount,
        "iso_currency_code": "USD",
        "date": date,
        "name": name,
        "merchant_name": merchant_name,
        "pending": false
    })
}

/// Assemble an ingestion request body.
#[allow(dead_code)]
pub fn ingestion_payload(accounts: Vec<Value>, transactions: Vec<Value>) -> Value {
    let total = transactions.len();
    json!({
        "request_id": Uuid::new_v4().to_string(),
        "accounts": accounts,
        "transactions": transactions,
        "total_transactions": total
    })
}
