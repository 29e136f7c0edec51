//! Car rental services: CLI server
//!
//! Runs one of the three services per process, suitable for deployment as a
//! systemd unit or container entrypoint.
//!
//! ```sh
//! # Run with default config (~/.config/car-rental/booking.toml)
//! rental-service booking
//!
//! # Custom config path and listen address
//! rental-service lease --config /etc/car-rental/lease.toml --addr 0.0.0.0:3001
//!
//! # Validate config without starting
//! rental-service auth --check
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing::{error, info};

use car_rental::config::{default_config_path, AppConfig, ServiceKind};
use car_rental::server::{init_tracing, ServerHandle, ServerOptions};

/// Car rental HTTP services: auth, booking and lease.
#[derive(Parser, Debug)]
#[command(
    name = "rental-service",
    version,
    about = "Car rental HTTP services",
    long_about = "Runs the auth, booking or lease service of the car rental system.\n\n\
                  Default config: <config dir>/car-rental/<service>.toml"
)]
struct Cli {
    #[command(subcommand)]
    service: Service,
}

#[derive(Subcommand, Debug)]
enum Service {
    /// User registration and token issuance.
    Auth(RunArgs),
    /// Time-bounded car bookings.
    Booking(RunArgs),
    /// Car leases.
    Lease(RunArgs),
}

impl Service {
    fn split(self) -> (ServiceKind, RunArgs) {
        match self {
            Service::Auth(args) => (ServiceKind::Auth, args),
            Service::Booking(args) => (ServiceKind::Booking, args),
            Service::Lease(args) => (ServiceKind::Lease, args),
        }
    }
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Path to the configuration file (TOML).
    #[arg(short, long, env = "RENTAL_CONFIG")]
    config: Option<PathBuf>,

    /// Override the listen address (host:port).
    #[arg(long)]
    addr: Option<String>,

    /// Override the file holding the token signing key.
    #[arg(long)]
    jwt_secret_path: Option<PathBuf>,

    /// Override the SQLite database path.
    #[arg(long)]
    database: Option<String>,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(short, long)]
    log_level: Option<String>,

    /// Validate the configuration file and exit without starting the server.
    #[arg(long)]
    check: bool,

    /// Skip database migrations on startup.
    #[arg(long)]
    no_migrate: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (service, cli) = Cli::parse().service.split();

    // ── Load configuration ─────────────────────────────────────
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| default_config_path(service));

    let (mut config, load_error) = match AppConfig::load(&config_path, service) {
        Ok(cfg) => (cfg, None),
        Err(e) => (AppConfig::for_service(service), Some(e)),
    };

    // The log level override has to land before tracing starts.
    if let Some(ref level) = cli.log_level {
        config.logging.level = level.clone();
    }
    init_tracing(&config);

    match load_error {
        None => info!("Configuration loaded from {}", config_path.display()),
        Some(e) => {
            error!("Failed to load config from {}: {}", config_path.display(), e);
            error!("Using default configuration.");
        }
    }

    // ── Apply CLI overrides ────────────────────────────────────
    if let Some(ref addr) = cli.addr {
        info!("CLI override: addr = {}", addr);
        config.set_address(addr)?;
    }
    if let Some(path) = cli.jwt_secret_path {
        info!("CLI override: jwt_secret_path = {}", path.display());
        config.security.jwt_secret_path = path;
    }
    if let Some(path) = cli.database {
        info!("CLI override: database = {}", path);
        config.database.path = path;
    }

    // ── Config validation mode ─────────────────────────────────
    if cli.check {
        config.validate()?;
        println!("Configuration is valid");
        println!("   Service     : {}", service);
        println!("   Config file : {}", config_path.display());
        println!("   Address     : {}", config.address());
        println!("   Database    : {}", config.database.path);
        println!("   JWT secret  : {}", config.security.jwt_secret_path.display());
        println!("   Log level   : {}", config.logging.level);
        return Ok(());
    }

    // ── Start server ───────────────────────────────────────────
    let handle = ServerHandle::start(ServerOptions {
        service,
        config,
        auto_migrate: !cli.no_migrate,
    })
    .await?;

    // Install OS signal handlers (SIGTERM, SIGINT)
    handle.install_signal_handler();

    info!("Press Ctrl+C to shutdown gracefully.");

    // Wait for shutdown signal, then clean up
    handle.shutdown_signal().wait().await;
    handle.wait().await;

    Ok(())
}
