//! Reusable parking service runtime.
//!
//! Provides [`ServiceHandle`] that encapsulates the full lifecycle: storage
//! init, migrations, the allocation coordinator, the reservation expiry
//! task, and graceful shutdown.

use std::sync::Arc;

use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::application::events::{create_event_bus, SharedEventBus};
use crate::application::parking::AllocationCoordinator;
use crate::application::services::{
    start_reservation_expiry_task, DeadlineParkingService, ParkingServiceImpl,
};
use crate::config::{AppConfig, StorageBackend};
use crate::domain::{ParkingService, ParkingStore};
use crate::infrastructure::database::migrator::Migrator;
use crate::infrastructure::{init_database, DatabaseConfig, InMemoryParkingStore, SeaOrmParkingStore};
use crate::shared::errors::{AppError, InfraError};
use crate::shared::shutdown::{listen_for_shutdown_signals, ShutdownSignal};

// ── Options ────────────────────────────────────────────────────────

/// Options for starting the parking service.
pub struct ServerOptions {
    /// Application configuration.
    pub config: AppConfig,
    /// Run database migrations on startup (default: true).
    pub auto_migrate: bool,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            config: AppConfig::default(),
            auto_migrate: true,
        }
    }
}

// ── ServiceHandle ──────────────────────────────────────────────────

/// Handle to a running parking service.
///
/// # Examples
///
/// ```rust,no_run
/// use parking_core::server::{ServiceHandle, ServerOptions};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let handle = ServiceHandle::start(ServerOptions::default()).await?;
///     let lots = handle.service().get_all_parking_lots().await?;
///     handle.shutdown().await;
///     Ok(())
/// }
/// ```
pub struct ServiceHandle {
    /// Lifecycle events for subscribers.
    pub event_bus: SharedEventBus,
    /// The configuration the service was started with.
    pub config: AppConfig,

    service: Arc<dyn ParkingService>,
    db: Option<DatabaseConnection>,
    shutdown: ShutdownSignal,
    expiry_task: Option<JoinHandle<()>>,
}

impl ServiceHandle {
    /// Start the service with the given options.
    ///
    /// This will:
    /// 1. Open the configured store (and migrate it, for SQLite)
    /// 2. Build the allocation coordinator and the service facade
    /// 3. Start the reservation expiry task, if enabled
    pub async fn start(opts: ServerOptions) -> Result<Self, AppError> {
        let app_cfg = opts.config;
        app_cfg.validate().map_err(InfraError::Config)?;

        info!("Starting parking service...");

        let (store, db): (Arc<dyn ParkingStore>, Option<DatabaseConnection>) =
            match app_cfg.database.backend {
                StorageBackend::Memory => {
                    info!("Using in-memory storage");
                    (Arc::new(InMemoryParkingStore::new()), None)
                }
                StorageBackend::Sqlite => {
                    let db = init_database(&DatabaseConfig::from(&app_cfg.database))
                        .await
                        .map_err(InfraError::Database)?;
                    if opts.auto_migrate {
                        info!("Running database migrations...");
                        Migrator::up(&db, None).await.map_err(InfraError::Database)?;
                        info!("Migrations completed");
                    }
                    (Arc::new(SeaOrmParkingStore::new(db.clone())), Some(db))
                }
            };

        let event_bus = create_event_bus();
        let coordinator = Arc::new(AllocationCoordinator::new(
            store,
            &app_cfg.allocation,
            event_bus.clone(),
        ));

        let mut service: Arc<dyn ParkingService> = Arc::new(ParkingServiceImpl::new(coordinator));
        if let Some(deadline) = app_cfg.service.call_timeout() {
            let deadline_ms = u64::try_from(deadline.as_millis()).unwrap_or(u64::MAX);
            info!(deadline_ms, "Call deadline enabled");
            service = Arc::new(DeadlineParkingService::new(service, deadline));
        }

        let shutdown = ShutdownSignal::new();
        let expiry_task = app_cfg.housekeeping.expiry_enabled.then(|| {
            start_reservation_expiry_task(
                service.clone(),
                shutdown.clone(),
                app_cfg.housekeeping.expiry_interval_secs,
            )
        });

        info!("Parking service started");

        Ok(Self {
            event_bus,
            config: app_cfg,
            service,
            db,
            shutdown,
            expiry_task,
        })
    }

    /// The service facade every caller goes through.
    pub fn service(&self) -> Arc<dyn ParkingService> {
        self.service.clone()
    }

    /// Get a cloneable shutdown signal.
    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.clone()
    }

    /// Install OS signal listeners (SIGTERM, SIGINT) that trigger shutdown.
    pub fn install_signal_handler(&self) {
        tokio::spawn(listen_for_shutdown_signals(self.shutdown.clone()));
    }

    /// Trigger graceful shutdown (non-blocking).
    pub fn trigger_shutdown(&self) {
        self.shutdown.trigger();
    }

    /// Wait for background tasks to stop after shutdown has been triggered.
    pub async fn wait(self) {
        if let Some(task) = self.expiry_task {
            if let Err(e) = task.await {
                error!("Reservation expiry task panicked: {}", e);
            }
        }

        if let Some(db) = self.db {
            if let Err(e) = db.close().await {
                warn!("Error closing database connection: {}", e);
            } else {
                info!("Database connection closed");
            }
        }

        info!("Parking service shutdown complete");
    }

    /// Trigger shutdown and wait for completion.
    pub async fn shutdown(self) {
        info!("Shutting down parking service...");
        self.trigger_shutdown();
        self.wait().await;
    }
}

/// Initialize tracing (logging) from the application config.
///
/// `RUST_LOG` wins over `logging.level`. Call once at process startup.
pub fn init_tracing(config: &AppConfig) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    match config.logging.format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::NewParkingLot;
    use rust_decimal::Decimal;

    fn memory_options() -> ServerOptions {
        let mut config = AppConfig::default();
        config.database.backend = StorageBackend::Memory;
        ServerOptions {
            config,
            auto_migrate: false,
        }
    }

    #[tokio::test]
    async fn memory_backend_serves_and_shuts_down() {
        let handle = ServiceHandle::start(memory_options()).await.unwrap();
        let lot = handle
            .service()
            .create_parking_lot(NewParkingLot::new("Gueliz", 3, Decimal::new(800, 2)))
            .await
            .unwrap();
        assert_eq!(lot.available_spots, 3);
        handle.shutdown().await;
    }

    #[tokio::test]
    async fn sqlite_backend_runs_migrations() {
        let mut options = memory_options();
        options.config.database.backend = StorageBackend::Sqlite;
        options.config.database.url = "sqlite::memory:".into();
        options.config.database.max_connections = 1;
        options.auto_migrate = true;

        let handle = ServiceHandle::start(options).await.unwrap();
        let service = handle.service();
        let lot = service
            .create_parking_lot(NewParkingLot::new("Hivernage", 2, Decimal::new(500, 2)))
            .await
            .unwrap();
        assert_eq!(service.get_available_spots_count(lot.id).await.unwrap(), 2);
        handle.shutdown().await;
    }

    #[tokio::test]
    async fn invalid_config_is_rejected() {
        let mut options = memory_options();
        options.config.database.max_connections = 0;
        assert!(ServiceHandle::start(options).await.is_err());
    }
}
