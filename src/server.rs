//! Reusable service runtime.
//!
//! Provides [`ServerHandle`] that encapsulates one service's lifecycle:
//! database init, migrations, ID sequences, the HTTP router, metrics and
//! graceful shutdown.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::{Arc, OnceLock};

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;
use tracing::{error, info, warn};

use crate::application::{ReservationManager, UserService};
use crate::config::{AppConfig, ServiceKind};
use crate::domain::{IdAllocator, ReservationKind};
use crate::infrastructure::crypto::jwt::JwtConfig;
use crate::infrastructure::database::migrator::Migrator;
use crate::infrastructure::database::repositories::{
    SeaOrmReservationRepository, SeaOrmSequenceAllocator, UserRepository,
};
use crate::infrastructure::init_database;
use crate::interfaces::http::{
    create_auth_router, create_booking_router, create_lease_router, CommonRoutes,
};
use crate::shared::shutdown::{ShutdownCoordinator, ShutdownSignal};

const USER_ID_SEQUENCE: &str = "user_id_sequence";

// ── Options ────────────────────────────────────────────────────────

/// Options for starting a service.
pub struct ServerOptions {
    pub service: ServiceKind,
    /// Application configuration.
    pub config: AppConfig,
    /// Run database migrations on startup (default: true).
    pub auto_migrate: bool,
}

impl ServerOptions {
    pub fn new(service: ServiceKind) -> Self {
        Self {
            service,
            config: AppConfig::for_service(service),
            auto_migrate: true,
        }
    }
}

// ── ServerHandle ───────────────────────────────────────────────────

/// Handle to a running service.
///
/// # Examples
///
/// ```rust,no_run
/// use car_rental::config::ServiceKind;
/// use car_rental::server::{ServerHandle, ServerOptions};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let handle = ServerHandle::start(ServerOptions::new(ServiceKind::Booking)).await?;
///     // ... wait for shutdown signal ...
///     handle.shutdown().await;
///     Ok(())
/// }
/// ```
pub struct ServerHandle {
    pub service: ServiceKind,
    /// The configuration the server was started with.
    pub config: AppConfig,
    /// Address the HTTP listener is bound to.
    pub local_addr: SocketAddr,

    db: DatabaseConnection,
    allocators: Vec<Arc<dyn IdAllocator>>,
    shutdown: ShutdownCoordinator,
    api_task: tokio::task::JoinHandle<()>,
}

/// Process-wide Prometheus recorder. The global recorder can only be
/// installed once, so a restarted server in the same process reuses it.
fn prometheus_handle() -> Option<PrometheusHandle> {
    static PROM_HANDLE: OnceLock<Option<PrometheusHandle>> = OnceLock::new();

    PROM_HANDLE
        .get_or_init(|| match PrometheusBuilder::new().install_recorder() {
            Ok(handle) => {
                info!("Prometheus metrics recorder installed");
                Some(handle)
            }
            Err(e) => {
                warn!("Metrics disabled, recorder not installed: {}", e);
                None
            }
        })
        .clone()
}

async fn read_secret(path: &Path) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    let secret = tokio::fs::read(path)
        .await
        .map_err(|e| format!("cannot read JWT secret {}: {}", path.display(), e))?;
    if secret.is_empty() {
        return Err(format!("JWT secret {} is empty", path.display()).into());
    }
    Ok(secret)
}

impl ServerHandle {
    /// Start a service with the given options.
    ///
    /// This will:
    /// 1. Install the Prometheus metrics recorder
    /// 2. Read the token signing key
    /// 3. Connect to the database and run migrations
    /// 4. Open the service's ID sequence
    /// 5. Bind and serve the service's router
    pub async fn start(opts: ServerOptions) -> Result<Self, Box<dyn std::error::Error>> {
        let service = opts.service;
        let app_cfg = opts.config;
        app_cfg.validate()?;

        info!(%service, "Starting car rental service...");

        let metrics = prometheus_handle();

        let secret = read_secret(&app_cfg.security.jwt_secret_path).await?;
        let jwt_config = JwtConfig::new(secret, app_cfg.security.token_ttl_hours);
        info!(
            "JWT configured with {}h token expiration",
            jwt_config.expiration_hours
        );

        // ── Database ───────────────────────────────────────────
        let db = init_database(&app_cfg.database.connection_config()).await?;

        if opts.auto_migrate {
            info!("Running database migrations...");
            Migrator::up(&db, None).await?;
            info!("Migrations completed");
        }

        // ── Service wiring ─────────────────────────────────────
        let bandwidth = app_cfg.sequence.bandwidth;
        let common = CommonRoutes {
            service: service.as_str(),
            db: db.clone(),
            metrics,
        };

        let (router, allocator): (axum::Router, Arc<dyn IdAllocator>) = match service {
            ServiceKind::Auth => {
                let ids: Arc<dyn IdAllocator> = Arc::new(
                    SeaOrmSequenceAllocator::open(db.clone(), USER_ID_SEQUENCE, bandwidth).await?,
                );
                let users = Arc::new(UserService::new(
                    Arc::new(UserRepository::new(db.clone())),
                    ids.clone(),
                    jwt_config,
                    app_cfg.security.bcrypt_cost,
                ));
                (create_auth_router(users, common), ids)
            }
            ServiceKind::Booking | ServiceKind::Lease => {
                let kind = if service == ServiceKind::Booking {
                    ReservationKind::Booking
                } else {
                    ReservationKind::Lease
                };
                let ids: Arc<dyn IdAllocator> = Arc::new(
                    SeaOrmSequenceAllocator::open(db.clone(), kind.sequence_name(), bandwidth)
                        .await?,
                );
                let manager = Arc::new(ReservationManager::new(
                    Arc::new(SeaOrmReservationRepository::new(db.clone(), kind)),
                    ids.clone(),
                    app_cfg.admission.retry_config(),
                ));
                let router = match kind {
                    ReservationKind::Booking => create_booking_router(manager, jwt_config, common),
                    ReservationKind::Lease => create_lease_router(manager, jwt_config, common),
                };
                (router, ids)
            }
        };

        // ── Shutdown coordinator ───────────────────────────────
        let shutdown = ShutdownCoordinator::new(app_cfg.server.shutdown_timeout);
        let shutdown_signal = shutdown.signal();

        // ── HTTP server ────────────────────────────────────────
        let addr = app_cfg.address();
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        let local_addr = listener.local_addr()?;
        info!(%service, "HTTP server listening on http://{}", local_addr);
        info!("OpenAPI document at http://{}/api-docs/openapi.json", local_addr);

        let api_server = axum::serve(listener, router).with_graceful_shutdown(async move {
            shutdown_signal.wait().await;
            info!("HTTP server received shutdown signal");
        });

        let api_task = tokio::spawn(async move {
            if let Err(e) = api_server.await {
                error!("HTTP server error: {}", e);
            }
        });

        Ok(Self {
            service,
            config: app_cfg,
            local_addr,
            db,
            allocators: vec![allocator],
            shutdown,
            api_task,
        })
    }

    /// Get a cloneable shutdown signal.
    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.signal()
    }

    /// Install OS signal listeners (SIGTERM, SIGINT) that trigger shutdown.
    pub fn install_signal_handler(&self) {
        self.shutdown.start_signal_listener();
    }

    /// Trigger graceful shutdown (non-blocking).
    pub fn trigger_shutdown(&self) {
        self.shutdown.signal().trigger();
    }

    /// Wait for the server to fully stop after shutdown has been triggered.
    ///
    /// In-flight requests get `shutdown_timeout` seconds to drain. The unused
    /// part of each ID lease is then handed back and the database closed.
    pub async fn wait(self) {
        info!("Waiting for in-flight requests to complete...");

        match tokio::time::timeout(self.shutdown.timeout(), self.api_task).await {
            Ok(Ok(())) => info!("HTTP server stopped"),
            Ok(Err(e)) => error!("HTTP server task panicked: {}", e),
            Err(_) => warn!(
                "HTTP server did not drain within {:?}, abandoning requests",
                self.shutdown.timeout()
            ),
        }

        for allocator in &self.allocators {
            if let Err(e) = allocator.release().await {
                warn!("Failed to release unused IDs: {}", e);
            }
        }

        if let Err(e) = self.db.close().await {
            warn!("Error closing database connection: {}", e);
        } else {
            info!("Database connection closed");
        }

        info!(service = %self.service, "Shutdown complete");
    }

    /// Trigger shutdown and wait for completion.
    pub async fn shutdown(self) {
        info!(service = %self.service, "Shutting down...");
        self.trigger_shutdown();
        self.wait().await;
    }

    /// Check if the server is still running.
    pub fn is_running(&self) -> bool {
        !self.api_task.is_finished()
    }
}

/// Initialize tracing (logging) from the application config.
///
/// Call this once at process startup (before [`ServerHandle::start`]).
/// `RUST_LOG` takes precedence over the configured level.
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
