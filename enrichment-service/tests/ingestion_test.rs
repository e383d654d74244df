//! Batch ingestion integration tests.
//!
//! Run with: TEST_DATABASE_URL=postgres://... cargo test -- --ignored

mod common;

use common::{ingestion_payload, spawn_app, test_account, test_transaction};
use serde_json::{json, Value};
use uuid::Uuid;

fn unique_id(prefix: &str) -> String {
    format!("{}-{}", prefix, Uuid::new_v4())
}

#[tokio::test]
#[ignore]
async fn ingest_returns_accepted_with_batch_id() {
    let app = spawn_app().await;
    let account_id = unique_id("acct");

    let payload = ingestion_payload(
        vec![test_account(&account_id)],
        vec![
            test_transaction(
                &unique_id("txn"),
                &account_id,
                "12.50",
                "2026-03-01T12:00:00Z",
                "COFFEE SHOP",
                None,
            ),
            test_transaction(
                &unique_id("txn"),
                &account_id,
                "-45.00",
                "2026-03-02T09:30:00Z",
                "GAS STATION",
                Some("Shell"),
            ),
        ],
    );

    let response = app.ingest(&payload).await;
    assert_eq!(202, response.status().as_u16());

    let body: Value = response.json().await.expect("Failed to parse JSON");
    let batch_id = body["batch_id"]
        .as_str()
        .and_then(|s| Uuid::parse_str(s).ok())
        .expect("batch_id should be a UUID");
    assert_eq!(2, body["total_transactions"].as_i64().unwrap());

    // The batch record is queryable and starts out pending (or is already
    // picked up by the trigger consumer).
    let batch = app.get_batch(batch_id).await;
    assert_eq!(200, batch.status().as_u16());
    let batch: Value = batch.json().await.expect("Failed to parse JSON");
    assert_eq!(batch_id.to_string(), batch["batch_id"].as_str().unwrap());
}

#[tokio::test]
#[ignore]
async fn ingest_rejects_invalid_payload() {
    let app = spawn_app().await;

    // Missing account name fails field validation.
    let payload = json!({
        "accounts": [{
            "account_id": "acct-bad",
            "name": "",
            "type": "depository"
        }],
        "transactions": [],
        "total_transactions": 0
    });

    let response = app.ingest(&payload).await;
    assert_eq!(400, response.status().as_u16());

    let body: Value = response.json().await.expect("Failed to parse JSON");
    assert!(body["error"].as_str().is_some());
}

#[tokio::test]
#[ignore]
async fn ingest_rejects_negative_total() {
    let app = spawn_app().await;

    let payload = json!({
        "accounts": [],
        "transactions": [],
        "total_transactions": -1
    });

    let response = app.ingest(&payload).await;
    assert_eq!(400, response.status().as_u16());
}

#[tokio::test]
#[ignore]
async fn duplicate_transaction_ids_are_skipped() {
    let app = spawn_app().await;
    let account_id = unique_id("acct");
    let shared_txn_id = unique_id("txn");

    let first = ingestion_payload(
        vec![test_account(&account_id)],
        vec![test_transaction(
            &shared_txn_id,
            &account_id,
            "10.00",
            "2026-03-01T12:00:00Z",
            "FIRST COPY",
            None,
        )],
    );
    let response = app.ingest(&first).await;
    assert_eq!(202, response.status().as_u16());

    // Second batch carries the same transaction_id plus a fresh one.
    let fresh_txn_id = unique_id("txn");
    let second = ingestion_payload(
        vec![test_account(&account_id)],
        vec![
            test_transaction(
                &shared_txn_id,
                &account_id,
                "10.00",
                "2026-03-01T12:00:00Z",
                "DUPLICATE COPY",
                None,
            ),
            test_transaction(
                &fresh_txn_id,
                &account_id,
                "20.00",
                "2026-03-03T12:00:00Z",
                "NEW TXN",
                None,
            ),
        ],
    );
    let response = app.ingest(&second).await;
    assert_eq!(202, response.status().as_u16());
    let body: Value = response.json().await.expect("Failed to parse JSON");
    let second_batch: Uuid = body["batch_id"].as_str().unwrap().parse().unwrap();

    // Only the fresh transaction landed in the second batch.
    let stored: Vec<(String,)> =
        sqlx::query_as("SELECT transaction_id FROM transactions WHERE batch_id = $1")
            .bind(second_batch)
            .fetch_all(app.db.pool())
            .await
            .expect("query failed");
    assert_eq!(1, stored.len());
    assert_eq!(fresh_txn_id, stored[0].0);

    // The original row keeps its first description.
    let (description,): (String,) =
        sqlx::query_as("SELECT description FROM transactions WHERE transaction_id = $1")
            .bind(&shared_txn_id)
            .fetch_one(app.db.pool())
            .await
            .expect("original row");
    assert_eq!("FIRST COPY", description);
}

#[tokio::test]
#[ignore]
async fn reingested_account_is_upserted() {
    let app = spawn_app().await;
    let account_id = unique_id("acct");

    let mut account = test_account(&account_id);
    account["name"] = json!("Old Name");
    let payload = ingestion_payload(vec![account], vec![]);
    assert_eq!(202, app.ingest(&payload).await.status().as_u16());

    let mut account = test_account(&account_id);
    account["name"] = json!("New Name");
    account["mask"] = json!("9999");
    let payload = ingestion_payload(vec![account], vec![]);
    assert_eq!(202, app.ingest(&payload).await.status().as_u16());

    assert!(app.db.account_exists(&account_id).await.expect("query"));

    let row: (String, Option<String>) = sqlx::query_as(
        "SELECT name, mask FROM accounts WHERE account_id = $1",
    )
    .bind(&account_id)
    .fetch_one(app.db.pool())
    .await
    .expect("account row");
    assert_eq!("New Name", row.0);
    assert_eq!(Some("9999".to_string()), row.1);
}

#[tokio::test]
#[ignore]
async fn flexible_authorized_date_formats_are_accepted() {
    let app = spawn_app().await;
    let account_id = unique_id("acct");

    let mut txn = test_transaction(
        &unique_id("txn"),
        &account_id,
        "5.00",
        "2026-03-05T00:00:00Z",
        "TIMESTAMPED",
        None,
    );
    txn["authorized_date"] = json!("2026-03-04T18:30:00Z");

    let payload = ingestion_payload(vec![test_account(&account_id)], vec![txn]);
    let response = app.ingest(&payload).await;
    assert_eq!(202, response.status().as_u16());
}
