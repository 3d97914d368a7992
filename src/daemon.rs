//! Long-running service mode.
//!
//! [`Daemon`] opens the database, serves the HTTP API and runs the two
//! scheduled jobs:
//!
//! 1. **Weather crawl**: scrapes the configured location once a day and stores a snapshot
//! 2. **Pet clinic sync**: walks the Seoul open-data feed once a day and upserts every clinic
//!
//! Every component subscribes to one broadcast channel. Ctrl+C sends on it and
//! the daemon waits for all of them to finish before returning.

use std::sync::Arc;

use anyhow::{Context, anyhow};
use log::{error, info};
use tokio::{signal, sync::broadcast, task::JoinHandle};

use crate::{
    api,
    config::ServiceConfig,
    db::{self, SqlitePool},
    ingest::{PetClinicLoader, SeoulOpenApi},
    tasks::{PetClinicSyncJob, Schedule, Ticker, WeatherCrawlJob},
    weather::WeatherCrawler,
};

pub struct Daemon {
    config: ServiceConfig,
}

impl Daemon {
    pub fn new(config: ServiceConfig) -> Self {
        Self { config }
    }

    /// Runs until Ctrl+C or until the API server stops on its own.
    ///
    /// # Errors
    ///
    /// Fails when the database cannot be opened, a schedule in the
    /// configuration is invalid, the API port cannot be bound, or the server
    /// exits with an error.
    pub async fn run(&self) -> anyhow::Result<()> {
        info!("Daemon started. Press Ctrl+C to stop.");

        let (shutdown_tx, _) = broadcast::channel::<()>(1);

        let db_pool = db::init_db(&self.config.database_path)
            .with_context(|| format!("Failed to open database {}", self.config.database_path.display()))?;

        let clinic_loader = Arc::new(PetClinicLoader::new(
            SeoulOpenApi::new(&self.config.seoul_open_api),
            db_pool.clone(),
        ));

        let mut task_handles = Vec::new();
        if let Some(handle) = self.start_weather_crawl(db_pool.clone(), &shutdown_tx)? {
            task_handles.push(handle);
        }
        if let Some(handle) = self.start_clinic_sync(clinic_loader.clone(), &shutdown_tx)? {
            task_handles.push(handle);
        }

        let router = api::create_router(db_pool, clinic_loader, &self.config.weather.location);
        let addr = format!("0.0.0.0:{}", self.config.api_port);
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .with_context(|| format!("Failed to bind API server to {addr}"))?;

        info!(address = &*addr; "API server listening");

        let mut shutdown_rx_api = shutdown_tx.subscribe();
        let mut api_server_handle = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    shutdown_rx_api.recv().await.ok();
                })
                .await
        });

        let server_result = tokio::select! {
            res = signal::ctrl_c() => {
                match res {
                    Ok(()) => info!("Received shutdown signal, stopping all tasks..."),
                    Err(e) => error!(error:% = e; "Failed to listen for Ctrl+C, stopping all tasks"),
                }
                None
            }
            res = &mut api_server_handle => Some(res),
        };

        if shutdown_tx.send(()).is_err() {
            error!("Failed to send shutdown signal. All tasks may not have received it.");
        }

        let server_result = match server_result {
            Some(res) => res,
            None => api_server_handle.await,
        };

        for handle in task_handles {
            handle
                .await
                .map_err(|e| anyhow!("A scheduled task panicked during shutdown: {e}"))?;
        }

        server_result
            .map_err(|e| anyhow!("API server task panicked: {e}"))?
            .context("API server failed")?;

        info!("Daemon stopped gracefully.");
        Ok(())
    }

    fn start_weather_crawl(
        &self,
        db_pool: SqlitePool,
        shutdown_tx: &broadcast::Sender<()>,
    ) -> anyhow::Result<Option<JoinHandle<()>>> {
        let cfg = &self.config.weather;
        if !cfg.enabled {
            info!("Weather crawl disabled");
            return Ok(None);
        }

        let schedule = Schedule::daily_at(cfg.crawl_hour, cfg.crawl_minute).context("Invalid weather crawl time")?;
        let crawler = WeatherCrawler::new(cfg)?;
        let job = Arc::new(WeatherCrawlJob::new(crawler, db_pool, &cfg.location));

        let handle = Ticker::new("weather_crawl", schedule).run(
            move || {
                let job = Arc::clone(&job);
                async move { job.run_tick().await }
            },
            shutdown_tx.subscribe(),
        );
        Ok(Some(handle))
    }

    fn start_clinic_sync(
        &self,
        loader: Arc<PetClinicLoader>,
        shutdown_tx: &broadcast::Sender<()>,
    ) -> anyhow::Result<Option<JoinHandle<()>>> {
        let cfg = &self.config.seoul_open_api;
        if !cfg.sync_enabled {
            info!("Pet clinic sync disabled");
            return Ok(None);
        }

        let schedule = Schedule::daily_at(cfg.sync_hour, cfg.sync_minute).context("Invalid pet clinic sync time")?;
        let job = Arc::new(PetClinicSyncJob::new(loader, cfg.page_size, cfg.max_rows));

        let handle = Ticker::new("pet_clinic_sync", schedule).run(
            move || {
                let job = Arc::clone(&job);
                async move { job.run_tick().await }
            },
            shutdown_tx.subscribe(),
        );
        Ok(Some(handle))
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[tokio::test]
    async fn test_invalid_crawl_time_fails_before_serving() {
        let temp_dir = tempdir().unwrap();
        let mut config = ServiceConfig {
            database_path: temp_dir.path().join("petple.db"),
            ..ServiceConfig::default()
        };
        config.weather.crawl_hour = 24;
        config.seoul_open_api.sync_enabled = false;

        let err = Daemon::new(config).run().await.unwrap_err();
        assert!(err.to_string().contains("Invalid weather crawl time"), "{err:#}");
    }
}
