//! Database service for enrichment-service.

use crate::error::AppError;
use crate::models::{
    Batch, Category, CategoryPattern, EnrichedTransaction, NewTransaction, Status, Transaction,
    UpsertAccount,
};
use crate::services::metrics::DB_QUERY_DURATION;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::FromRow;
use std::time::Duration;
use tracing::{info, instrument};
use uuid::Uuid;

/// Outcome of attempting to claim a batch for processing.
#[derive(Debug)]
pub enum BatchClaim {
    /// Row locked and flipped to `processing`; caller owns the transition.
    Claimed(Batch),
    /// Batch is already `processing` or `completed`; duplicate trigger.
    AlreadyHandled(Status),
    NotFound,
}

/// Windowed aggregate over an account's transactions. Spend is kept signed
/// (negative) here; presentation decides the sign.
#[derive(Debug, Clone, FromRow)]
pub struct AccountMetricsRow {
    pub total_transactions: i64,
    pub total_spend_signed: Decimal,
    pub total_income: Decimal,
}

/// Per-category spend aggregate, signed.
#[derive(Debug, Clone, FromRow)]
pub struct CategorySpendRow {
    pub category: String,
    pub total_spend_signed: Decimal,
    pub transaction_count: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct StatusCountRow {
    pub ingestion_status: String,
    pub count: i64,
}

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool.
    #[instrument(skip(database_url), fields(service = "enrichment-service"))]
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, AppError> {
        info!(
            max_connections = max_connections,
            min_connections = min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect(database_url)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Check database health.
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Health check failed: {}", e)))?;
        Ok(())
    }

    /// Run database migrations.
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Ingestion
    // -------------------------------------------------------------------------

    /// Persist one ingestion payload as a single transaction: upsert the
    /// accounts, create the batch, bulk-insert the transactions. Rows whose
    /// `transaction_id` already exists are skipped, not updated.
    #[instrument(skip(self, accounts, transactions), fields(accounts = accounts.len(), transactions = transactions.len()))]
    pub async fn ingest_batch(
        &self,
        accounts: &[UpsertAccount],
        transactions: &[NewTransaction],
        total_transactions: i32,
        request_id: Option<&str>,
    ) -> Result<Batch, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["ingest_batch"])
            .start_timer();

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to begin: {}", e)))?;

        for account in accounts {
            sqlx::query(
                r#"
                INSERT INTO accounts (account_id, name, account_type, subtype, mask)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (account_id) DO UPDATE
                SET name = EXCLUDED.name,
                    account_type = EXCLUDED.account_type,
                    subtype = EXCLUDED.subtype,
                    mask = EXCLUDED.mask,
                    updated_utc = NOW()
                "#,
            )
            .bind(&account.account_id)
            .bind(&account.name)
            .bind(&account.account_type)
            .bind(&account.subtype)
            .bind(&account.mask)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to upsert account: {}", e))
            })?;
        }

        let batch = sqlx::query_as::<_, Batch>(
            r#"
            INSERT INTO batches (total_transactions, request_id)
            VALUES ($1, $2)
            RETURNING batch_id, request_id, total_transactions, status, created_utc, updated_utc
            "#,
        )
        .bind(total_transactions)
        .bind(request_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to create batch: {}", e)))?;

        if !transactions.is_empty() {
            let mut ids = Vec::with_capacity(transactions.len());
            let mut account_ids = Vec::with_capacity(transactions.len());
            let mut amounts = Vec::with_capacity(transactions.len());
            let mut currencies = Vec::with_capacity(transactions.len());
            let mut dates = Vec::with_capacity(transactions.len());
            let mut authorized_dates = Vec::with_capacity(transactions.len());
            let mut merchant_names = Vec::with_capacity(transactions.len());
            let mut descriptions = Vec::with_capacity(transactions.len());
            let mut payment_channels = Vec::with_capacity(transactions.len());
            let mut pendings = Vec::with_capacity(transactions.len());

            for t in transactions {
                ids.push(t.transaction_id.clone());
                account_ids.push(t.account_id.clone());
                amounts.push(t.amount);
                currencies.push(t.currency.clone());
                dates.push(t.date);
                authorized_dates.push(t.authorized_date);
                merchant_names.push(t.merchant_name.clone());
                descriptions.push(t.description.clone());
                payment_channels.push(t.payment_channel.clone());
                pendings.push(t.pending);
            }

            sqlx::query(
                r#"
                INSERT INTO transactions
                    (transaction_id, account_id, batch_id, amount, currency, date,
                     authorized_date, merchant_name, description, payment_channel, pending)
                SELECT u.transaction_id, u.account_id, $1, u.amount, u.currency, u.date,
                       u.authorized_date, u.merchant_name, u.description, u.payment_channel,
                       u.pending
                FROM UNNEST(
                    $2::varchar[], $3::varchar[], $4::numeric[], $5::varchar[],
                    $6::timestamptz[], $7::date[], $8::varchar[], $9::text[],
                    $10::varchar[], $11::boolean[]
                ) AS u(transaction_id, account_id, amount, currency, date,
                       authorized_date, merchant_name, description, payment_channel, pending)
                ON CONFLICT (transaction_id) DO NOTHING
                "#,
            )
            .bind(batch.batch_id)
            .bind(&ids)
            .bind(&account_ids)
            .bind(&amounts)
            .bind(&currencies)
            .bind(&dates)
            .bind(&authorized_dates)
            .bind(&merchant_names)
            .bind(&descriptions)
            .bind(&payment_channels)
            .bind(&pendings)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to insert transactions: {}", e))
            })?;
        }

        tx.commit()
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to commit: {}", e)))?;

        timer.observe_duration();

        info!(
            batch_id = %batch.batch_id,
            total_transactions = batch.total_transactions,
            "Batch ingested"
        );

        Ok(batch)
    }

    // -------------------------------------------------------------------------
    // Batch lifecycle
    // -------------------------------------------------------------------------

    /// Lock the batch row and flip it to `processing`. The row lock
    /// serializes concurrent triggers for the same batch; a batch already
    /// `processing` or `completed` is left untouched.
    #[instrument(skip(self), fields(batch_id = %batch_id))]
    pub async fn claim_batch(&self, batch_id: Uuid) -> Result<BatchClaim, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["claim_batch"])
            .start_timer();

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to begin: {}", e)))?;

        let batch = sqlx::query_as::<_, Batch>(
            r#"
            SELECT batch_id, request_id, total_transactions, status, created_utc, updated_utc
            FROM batches
            WHERE batch_id = $1
            FOR UPDATE
            "#,
        )
        .bind(batch_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to load batch: {}", e)))?;

        let batch = match batch {
            Some(b) => b,
            None => {
                tx.rollback().await.ok();
                return Ok(BatchClaim::NotFound);
            }
        };

        let status = batch.parsed_status();
        if !status.is_reprocessable() {
            tx.rollback().await.ok();
            timer.observe_duration();
            return Ok(BatchClaim::AlreadyHandled(status));
        }

        let claimed = sqlx::query_as::<_, Batch>(
            r#"
            UPDATE batches
            SET status = 'processing', updated_utc = NOW()
            WHERE batch_id = $1
            RETURNING batch_id, request_id, total_transactions, status, created_utc, updated_utc
            "#,
        )
        .bind(batch_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to claim batch: {}", e)))?;

        tx.commit()
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to commit: {}", e)))?;

        timer.observe_duration();

        Ok(BatchClaim::Claimed(claimed))
    }

    /// All transactions of a batch still awaiting enrichment.
    #[instrument(skip(self), fields(batch_id = %batch_id))]
    pub async fn pending_transactions(&self, batch_id: Uuid) -> Result<Vec<Transaction>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["pending_transactions"])
            .start_timer();

        let transactions = sqlx::query_as::<_, Transaction>(
            r#"
            SELECT id, transaction_id, account_id, batch_id, amount, currency, date,
                   authorized_date, merchant_name, description, payment_channel, pending,
                   category, ingestion_status, created_utc, updated_utc
            FROM transactions
            WHERE batch_id = $1 AND ingestion_status = 'pending'
            "#,
        )
        .bind(batch_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to load transactions: {}", e))
        })?;

        timer.observe_duration();

        Ok(transactions)
    }

    /// Persist enrichment results in one bulk write and close the batch.
    /// Readers never observe the batch partially enriched: either all rows
    /// of this pass are visible or none are.
    #[instrument(skip(self, enriched), fields(batch_id = %batch_id, count = enriched.len()))]
    pub async fn complete_batch(
        &self,
        batch_id: Uuid,
        enriched: &[EnrichedTransaction],
    ) -> Result<(), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["complete_batch"])
            .start_timer();

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to begin: {}", e)))?;

        if !enriched.is_empty() {
            let ids: Vec<String> = enriched.iter().map(|e| e.transaction_id.clone()).collect();
            let categories: Vec<String> = enriched.iter().map(|e| e.category.clone()).collect();

            sqlx::query(
                r#"
                UPDATE transactions AS t
                SET category = u.category,
                    ingestion_status = 'completed',
                    updated_utc = NOW()
                FROM UNNEST($1::varchar[], $2::varchar[]) AS u(transaction_id, category)
                WHERE t.transaction_id = u.transaction_id
                "#,
            )
            .bind(&ids)
            .bind(&categories)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to update transactions: {}", e))
            })?;
        }

        sqlx::query(
            "UPDATE batches SET status = 'completed', updated_utc = NOW() WHERE batch_id = $1",
        )
        .bind(batch_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to close batch: {}", e)))?;

        tx.commit()
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to commit: {}", e)))?;

        timer.observe_duration();

        Ok(())
    }

    /// Best-effort transition to `failed` after a processing error.
    #[instrument(skip(self), fields(batch_id = %batch_id))]
    pub async fn mark_batch_failed(&self, batch_id: Uuid) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE batches SET status = 'failed', updated_utc = NOW() WHERE batch_id = $1",
        )
        .bind(batch_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to mark failed: {}", e)))?;
        Ok(())
    }

    /// Batches awaiting a sweep, oldest first.
    #[instrument(skip(self))]
    pub async fn pending_batches(&self) -> Result<Vec<Batch>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["pending_batches"])
            .start_timer();

        let batches = sqlx::query_as::<_, Batch>(
            r#"
            SELECT batch_id, request_id, total_transactions, status, created_utc, updated_utc
            FROM batches
            WHERE status = 'pending'
            ORDER BY created_utc ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list batches: {}", e)))?;

        timer.observe_duration();

        Ok(batches)
    }

    /// Fetch a batch without locking it.
    pub async fn get_batch(&self, batch_id: Uuid) -> Result<Option<Batch>, AppError> {
        let batch = sqlx::query_as::<_, Batch>(
            r#"
            SELECT batch_id, request_id, total_transactions, status, created_utc, updated_utc
            FROM batches
            WHERE batch_id = $1
            "#,
        )
        .bind(batch_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get batch: {}", e)))?;
        Ok(batch)
    }

    // -------------------------------------------------------------------------
    // Reporting
    // -------------------------------------------------------------------------

    /// An account is known once at least one transaction references it.
    #[instrument(skip(self), fields(account_id = %account_id))]
    pub async fn account_exists(&self, account_id: &str) -> Result<bool, AppError> {
        let exists: (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM transactions WHERE account_id = $1)",
        )
        .bind(account_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to check account: {}", e)))?;
        Ok(exists.0)
    }

    /// Count, spend, and income over the window. The window is half-open:
    /// `start` inclusive, `end` exclusive.
    #[instrument(skip(self), fields(account_id = %account_id))]
    pub async fn account_metrics(
        &self,
        account_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<AccountMetricsRow, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["account_metrics"])
            .start_timer();

        let row = sqlx::query_as::<_, AccountMetricsRow>(
            r#"
            SELECT COUNT(*) AS total_transactions,
                   COALESCE(SUM(amount) FILTER (WHERE amount < 0), 0) AS total_spend_signed,
                   COALESCE(SUM(amount) FILTER (WHERE amount >= 0), 0) AS total_income
            FROM transactions
            WHERE account_id = $1 AND date >= $2 AND date < $3
            "#,
        )
        .bind(account_id)
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to aggregate: {}", e)))?;

        timer.observe_duration();

        Ok(row)
    }

    /// Top spending categories over the window, most negative first.
    /// Uncategorized rows group under the literal `Uncategorized`.
    #[instrument(skip(self), fields(account_id = %account_id))]
    pub async fn top_spend_categories(
        &self,
        account_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<CategorySpendRow>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["top_spend_categories"])
            .start_timer();

        let rows = sqlx::query_as::<_, CategorySpendRow>(
            r#"
            SELECT COALESCE(category, 'Uncategorized') AS category,
                   SUM(amount) AS total_spend_signed,
                   COUNT(*) AS transaction_count
            FROM transactions
            WHERE account_id = $1 AND date >= $2 AND date < $3 AND amount < 0
            GROUP BY COALESCE(category, 'Uncategorized')
            ORDER BY SUM(amount) ASC
            LIMIT $4
            "#,
        )
        .bind(account_id)
        .bind(start)
        .bind(end)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to aggregate: {}", e)))?;

        timer.observe_duration();

        Ok(rows)
    }

    /// Transaction counts by ingestion status over the window.
    #[instrument(skip(self), fields(account_id = %account_id))]
    pub async fn status_breakdown(
        &self,
        account_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<StatusCountRow>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["status_breakdown"])
            .start_timer();

        let rows = sqlx::query_as::<_, StatusCountRow>(
            r#"
            SELECT ingestion_status, COUNT(*) AS count
            FROM transactions
            WHERE account_id = $1 AND date >= $2 AND date < $3
            GROUP BY ingestion_status
            "#,
        )
        .bind(account_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to aggregate: {}", e)))?;

        timer.observe_duration();

        Ok(rows)
    }

    // -------------------------------------------------------------------------
    // Pattern store
    // -------------------------------------------------------------------------

    /// Raw category/pattern pairs, ordered by category name. The
    /// categorizer normalizes and sorts these into its snapshot.
    #[instrument(skip(self))]
    pub async fn list_category_patterns(&self) -> Result<Vec<(String, String)>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_category_patterns"])
            .start_timer();

        let rows: Vec<(String, String)> = sqlx::query_as(
            r#"
            SELECT c.name, p.pattern
            FROM categories c
            JOIN category_patterns p ON p.category_id = c.category_id
            ORDER BY c.name ASC, p.created_utc DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to load patterns: {}", e)))?;

        timer.observe_duration();

        Ok(rows)
    }

    #[instrument(skip(self))]
    pub async fn list_categories(&self) -> Result<Vec<Category>, AppError> {
        let categories = sqlx::query_as::<_, Category>(
            r#"
            SELECT category_id, name, created_utc, updated_utc
            FROM categories
            ORDER BY name ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to list categories: {}", e))
        })?;
        Ok(categories)
    }

    #[instrument(skip(self), fields(name = %name))]
    pub async fn create_category(&self, name: &str) -> Result<Category, AppError> {
        let category = sqlx::query_as::<_, Category>(
            r#"
            INSERT INTO categories (name)
            VALUES ($1)
            RETURNING category_id, name, created_utc, updated_utc
            "#,
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict(anyhow::anyhow!("Category '{}' already exists", name))
            }
            _ => AppError::DatabaseError(anyhow::anyhow!("Failed to create category: {}", e)),
        })?;

        info!(category_id = %category.category_id, "Category created");

        Ok(category)
    }

    #[instrument(skip(self), fields(category_id = %category_id))]
    pub async fn add_pattern(
        &self,
        category_id: Uuid,
        pattern: &str,
    ) -> Result<CategoryPattern, AppError> {
        let pattern = sqlx::query_as::<_, CategoryPattern>(
            r#"
            INSERT INTO category_patterns (category_id, pattern)
            VALUES ($1, $2)
            RETURNING pattern_id, category_id, pattern, created_utc
            "#,
        )
        .bind(category_id)
        .bind(pattern)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict(anyhow::anyhow!("Pattern already exists for this category"))
            }
            sqlx::Error::Database(ref db_err) if db_err.is_foreign_key_violation() => {
                AppError::NotFound(anyhow::anyhow!("Category not found"))
            }
            _ => AppError::DatabaseError(anyhow::anyhow!("Failed to add pattern: {}", e)),
        })?;

        Ok(pattern)
    }

    #[instrument(skip(self), fields(pattern_id = %pattern_id))]
    pub async fn delete_pattern(&self, pattern_id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM category_patterns WHERE pattern_id = $1")
            .bind(pattern_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to delete pattern: {}", e))
            })?;
        Ok(result.rows_affected() > 0)
    }
}
