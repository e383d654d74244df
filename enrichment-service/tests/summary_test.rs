//! Account summary reporting integration tests.
//!
//! Run with: TEST_DATABASE_URL=postgres://... cargo test -- --ignored

mod common;

use chrono::{TimeZone, Utc};
use common::{spawn_app, TestApp};
use enrichment_service::models::{NewTransaction, UpsertAccount};
use rust_decimal::Decimal;
use serde_json::Value;
use uuid::Uuid;

fn unique_id(prefix: &str) -> String {
    format!("{}-{}", prefix, Uuid::new_v4())
}

fn txn(account_id: &str, amount: &str, day: u32, description: &str) -> NewTransaction {
    NewTransaction {
        transaction_id: unique_id("txn"),
        account_id: account_id.to_string(),
        amount: amount.parse::<Decimal>().unwrap(),
        currency: "USD".to_string(),
        date: Utc.with_ymd_and_hms(2026, 3, day, 12, 0, 0).unwrap(),
        authorized_date: None,
        merchant_name: None,
        description: description.to_string(),
        payment_channel: None,
        pending: false,
    }
}

async fn seed_account(app: &TestApp, account_id: &str, transactions: Vec<NewTransaction>) -> Uuid {
    let accounts = vec![UpsertAccount {
        account_id: account_id.to_string(),
        name: "Summary Checking".to_string(),
        account_type: "depository".to_string(),
        subtype: Some("checking".to_string()),
        mask: None,
    }];
    let total = transactions.len() as i32;
    let batch = app
        .db
        .ingest_batch(&accounts, &transactions, total, None)
        .await
        .expect("Failed to seed batch");
    batch.batch_id
}

#[tokio::test]
#[ignore]
async fn summary_reports_windowed_metrics_and_top_categories() {
    let app = spawn_app().await;
    let account_id = unique_id("acct");

    // Unique category names and patterns keep this run isolated.
    let food_name = unique_id("food");
    let transport_name = unique_id("transport");
    let food_pat = format!("grub{}", Uuid::new_v4().simple());
    let transport_pat = format!("ride{}", Uuid::new_v4().simple());

    let food = app.create_category(&food_name).await;
    app.add_pattern(food, &food_pat).await;
    let transport = app.create_category(&transport_name).await;
    app.add_pattern(transport, &transport_pat).await;

    let batch_id = seed_account(
        &app,
        &account_id,
        vec![
            txn(&account_id, "-60.00", 1, &food_pat.to_uppercase()),
            txn(&account_id, "-45.00", 2, &transport_pat.to_uppercase()),
            txn(&account_id, "-25.00", 3, "NO MATCH HERE"),
            txn(&account_id, "2500.00", 5, "PAYROLL DEPOSIT"),
        ],
    )
    .await;
    let body: Value = app
        .process(batch_id)
        .await
        .json()
        .await
        .expect("Failed to parse JSON");
    assert_eq!("completed", body["result"].as_str().unwrap());

    let response = app.summary(&account_id, "2026-03-01", "2026-03-31").await;
    assert_eq!(200, response.status().as_u16());
    let summary: Value = response.json().await.expect("Failed to parse JSON");

    assert_eq!(account_id, summary["account_id"].as_str().unwrap());
    assert_eq!("2026-03-01", summary["date_range"]["start"].as_str().unwrap());
    assert_eq!("2026-03-31", summary["date_range"]["end"].as_str().unwrap());

    let metrics = &summary["metrics"];
    assert_eq!(4, metrics["total_transactions"].as_i64().unwrap());
    assert_eq!("130.00", metrics["total_spend"].as_str().unwrap());
    assert_eq!("2500.00", metrics["total_income"].as_str().unwrap());
    assert_eq!("2370.00", metrics["net"].as_str().unwrap());

    // Largest spend first; the unmatched transaction lands in "other".
    let top = summary["top_categories"].as_array().unwrap();
    assert_eq!(3, top.len());
    assert_eq!(food_name, top[0]["category"].as_str().unwrap());
    assert_eq!("60.00", top[0]["total_spend"].as_str().unwrap());
    assert_eq!(1, top[0]["transaction_count"].as_i64().unwrap());
    assert_eq!("46.15", top[0]["percentage_of_spend"].as_str().unwrap());
    assert_eq!(transport_name, top[1]["category"].as_str().unwrap());
    assert_eq!("34.62", top[1]["percentage_of_spend"].as_str().unwrap());
    assert_eq!("other", top[2]["category"].as_str().unwrap());
    assert_eq!("19.23", top[2]["percentage_of_spend"].as_str().unwrap());

    let statuses = &summary["processing_status"];
    assert_eq!(4, statuses["completed"].as_i64().unwrap());
    assert_eq!(0, statuses["pending"].as_i64().unwrap());
    assert_eq!(0, statuses["processing"].as_i64().unwrap());
    assert_eq!(0, statuses["failed"].as_i64().unwrap());
}

#[tokio::test]
#[ignore]
async fn summary_is_cached_and_may_be_stale_within_ttl() {
    let app = spawn_app().await;
    let account_id = unique_id("acct");

    seed_account(
        &app,
        &account_id,
        vec![txn(&account_id, "-10.00", 1, "FIRST PURCHASE")],
    )
    .await;

    let first: Value = app
        .summary(&account_id, "2026-03-01", "2026-03-31")
        .await
        .json()
        .await
        .expect("Failed to parse JSON");
    assert_eq!(1, first["metrics"]["total_transactions"].as_i64().unwrap());

    // New data inside the window does not show up until the cache expires.
    seed_account(
        &app,
        &account_id,
        vec![txn(&account_id, "-20.00", 2, "SECOND PURCHASE")],
    )
    .await;

    let second: Value = app
        .summary(&account_id, "2026-03-01", "2026-03-31")
        .await
        .json()
        .await
        .expect("Failed to parse JSON");
    assert_eq!(1, second["metrics"]["total_transactions"].as_i64().unwrap());

    // A different window misses the cache and sees both rows.
    let fresh: Value = app
        .summary(&account_id, "2026-03-01", "2026-03-30")
        .await
        .json()
        .await
        .expect("Failed to parse JSON");
    assert_eq!(2, fresh["metrics"]["total_transactions"].as_i64().unwrap());
}

#[tokio::test]
#[ignore]
async fn summary_window_boundaries_are_inclusive() {
    let app = spawn_app().await;
    let account_id = unique_id("acct");

    seed_account(
        &app,
        &account_id,
        vec![
            // 23:30 on the end date is still inside the window.
            NewTransaction {
                date: Utc.with_ymd_and_hms(2026, 3, 31, 23, 30, 0).unwrap(),
                ..txn(&account_id, "-5.00", 31, "LATE NIGHT")
            },
            // April 1st is outside.
            NewTransaction {
                date: Utc.with_ymd_and_hms(2026, 4, 1, 0, 0, 0).unwrap(),
                ..txn(&account_id, "-7.00", 1, "NEXT MONTH")
            },
        ],
    )
    .await;

    let summary: Value = app
        .summary(&account_id, "2026-03-01", "2026-03-31")
        .await
        .json()
        .await
        .expect("Failed to parse JSON");
    assert_eq!(1, summary["metrics"]["total_transactions"].as_i64().unwrap());
    assert_eq!("5.00", summary["metrics"]["total_spend"].as_str().unwrap());
}

#[tokio::test]
#[ignore]
async fn summary_requires_both_dates() {
    let app = spawn_app().await;
    let account_id = unique_id("acct");

    let response = app
        .client
        .get(format!(
            "{}/api/reports/accounts/{}/summary?start_date=2026-03-01",
            app.address, account_id
        ))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(400, response.status().as_u16());
    let body: Value = response.json().await.expect("Failed to parse JSON");
    assert!(body["detail"].as_str().unwrap().contains("end_date"));
}

#[tokio::test]
#[ignore]
async fn summary_rejects_ranges_longer_than_a_year() {
    let app = spawn_app().await;
    let account_id = unique_id("acct");
    // An account exists once it has at least one transaction.
    seed_account(
        &app,
        &account_id,
        vec![txn(&account_id, "-1.00", 1, "ANCHOR")],
    )
    .await;

    // 365 days is the maximum allowed span.
    let ok = app.summary(&account_id, "2026-01-01", "2027-01-01").await;
    assert_eq!(200, ok.status().as_u16());

    let too_long = app.summary(&account_id, "2026-01-01", "2027-01-02").await;
    assert_eq!(400, too_long.status().as_u16());

    let inverted = app.summary(&account_id, "2026-03-31", "2026-03-01").await;
    assert_eq!(400, inverted.status().as_u16());

    let malformed = app.summary(&account_id, "03/01/2026", "2026-03-31").await;
    assert_eq!(400, malformed.status().as_u16());
}

#[tokio::test]
#[ignore]
async fn summary_for_unknown_account_returns_not_found() {
    let app = spawn_app().await;

    let response = app
        .summary(&unique_id("missing"), "2026-03-01", "2026-03-31")
        .await;
    assert_eq!(404, response.status().as_u16());
}
