//! Application startup and lifecycle management.

use crate::config::EnrichmentConfig;
use crate::services::{
    init_metrics, CacheStore, Database, EnrichmentService, PatternCategorizer, RedisCache,
};
use crate::workers::{spawn_sweep_scheduler, BatchProcessor, ProcessingQueue};
use crate::{build_router, error::AppError};
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: EnrichmentConfig,
    pub db: Arc<Database>,
    pub cache: Arc<dyn CacheStore>,
    pub enrichment: EnrichmentService,
    pub processor: Arc<BatchProcessor>,
    pub queue: Arc<ProcessingQueue>,
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    server: Box<dyn std::future::Future<Output = std::io::Result<()>> + Send + Unpin>,
    state: AppState,
    shutdown_token: CancellationToken,
}

impl Application {
    /// Build the application with a Redis-backed cache.
    pub async fn build(config: EnrichmentConfig) -> Result<Self, AppError> {
        let cache: Arc<dyn CacheStore> = Arc::new(
            RedisCache::new(&config.redis)
                .await
                .map_err(AppError::InternalError)?,
        );
        Self::build_with_cache(config, cache).await
    }

    /// Build the application with an injected cache implementation.
    pub async fn build_with_cache(
        config: EnrichmentConfig,
        cache: Arc<dyn CacheStore>,
    ) -> Result<Self, AppError> {
        init_metrics();

        let db = Database::new(
            &config.database.url,
            config.database.max_connections,
            config.database.min_connections,
        )
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to connect to PostgreSQL");
            e
        })?;
        db.run_migrations().await?;
        let db = Arc::new(db);

        let categorizer = Arc::new(PatternCategorizer::new(db.as_ref().clone(), cache.clone()));
        let enrichment = EnrichmentService::new(categorizer);
        let processor = Arc::new(BatchProcessor::new(db.clone(), enrichment.clone()));

        let shutdown_token = CancellationToken::new();
        let queue = Arc::new(ProcessingQueue::start(
            &config.worker,
            processor.clone(),
            shutdown_token.clone(),
        ));
        spawn_sweep_scheduler(&config.worker, processor.clone(), shutdown_token.clone());

        let state = AppState {
            config: config.clone(),
            db,
            cache,
            enrichment,
            processor,
            queue,
        };

        let app = build_router(state.clone());

        let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!(error = %e, "Failed to bind TCP listener to {}", addr);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!(port = port, "Listening");

        let server = axum::serve(listener, app);

        Ok(Self {
            port,
            server: Box::new(server.into_future()),
            state,
            shutdown_token,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn db(&self) -> &Arc<Database> {
        &self.state.db
    }

    pub fn cache(&self) -> &Arc<dyn CacheStore> {
        &self.state.cache
    }

    pub fn processor(&self) -> &Arc<BatchProcessor> {
        &self.state.processor
    }

    pub fn queue(&self) -> &Arc<ProcessingQueue> {
        &self.state.queue
    }

    /// Handle for cancelling background workers after the server future
    /// has taken ownership of the application.
    pub fn worker_shutdown_handle(&self) -> CancellationToken {
        self.shutdown_token.clone()
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        self.server.await
    }
}
