//! Configuration module for enrichment-service.

use crate::error::AppError;
use std::env;

#[derive(Debug, Clone)]
pub struct EnrichmentConfig {
    pub port: u16,
    pub service_name: String,
    pub service_version: String,
    pub log_level: String,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub worker: WorkerConfig,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

#[derive(Debug, Clone)]
pub struct RedisConfig {
    pub url: String,
}

/// Settings for the trigger queue and the periodic sweep.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Capacity of the in-process trigger queue.
    pub queue_size: usize,
    /// Maximum processing attempts for an on-demand trigger.
    pub max_attempts: u32,
    /// Triggers older than this are discarded instead of executed late.
    pub trigger_expiry_seconds: u64,
    /// Period of the pending-batch sweep.
    pub sweep_interval_seconds: u64,
    /// Disable the sweep loop (tests drive processing explicitly).
    pub sweep_enabled: bool,
}

impl EnrichmentConfig {
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        Ok(Self {
            port: env::var("PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(8080),
            service_name: env::var("SERVICE_NAME")
                .unwrap_or_else(|_| "enrichment-service".to_string()),
            service_version: env::var("SERVICE_VERSION")
                .unwrap_or_else(|_| env!("CARGO_PKG_VERSION").to_string()),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").map_err(|_| {
                    AppError::ConfigError(anyhow::anyhow!("DATABASE_URL is required"))
                })?,
                max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(10),
                min_connections: env::var("DATABASE_MIN_CONNECTIONS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(2),
            },
            redis: RedisConfig {
                url: env::var("REDIS_URL")
                    .unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string()),
            },
            worker: WorkerConfig {
                queue_size: env::var("WORKER_QUEUE_SIZE")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(256),
                max_attempts: env::var("WORKER_MAX_ATTEMPTS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(3),
                trigger_expiry_seconds: env::var("WORKER_TRIGGER_EXPIRY_SECONDS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(240),
                sweep_interval_seconds: env::var("WORKER_SWEEP_INTERVAL_SECONDS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(300),
                sweep_enabled: env::var("WORKER_SWEEP_ENABLED")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(true),
            },
        })
    }
}
