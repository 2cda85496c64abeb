//! Bayline - Main Entry Point
//!
//! Composition root: wires the SQLite store into the scheduling and
//! reporting services and serves them over JSON-RPC.

mod telemetry;

use anyhow::Result;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use bayline_api_rpc::{RpcServer, RpcServerConfig};
use bayline_core::application::reporting::ReportingService;
use bayline_core::application::scheduling::{SchedulerConfig, SchedulerService};
use bayline_core::domain::{CapacityPlan, DEFAULT_POSTS_PER_DAY};
use bayline_core::port::SystemClock;
use bayline_infra_sqlite::{
    create_pool, run_migrations, SqliteBookingRepository, SqliteVehicleDirectory,
};

const VERSION: &str = env!("CARGO_PKG_VERSION");
const DEFAULT_DB_PATH: &str = "~/.bayline/bookings.db";
const DEFAULT_HORIZON_DAYS: u32 = 30;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize logging
    let log_format = std::env::var("BAYLINE_LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("bayline=info"))
        .expect("Failed to create env filter");

    match log_format.as_str() {
        "json" => {
            // Production: JSON structured logging
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json())
                .init();
        }
        _ => {
            // Development: Pretty formatting with colors
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().pretty())
                .init();
        }
    }

    info!("Bayline v{} starting...", VERSION);

    // 1.1. Initialize OpenTelemetry (optional)
    if let Err(e) = telemetry::init_telemetry() {
        tracing::warn!(error = ?e, "Failed to initialize OpenTelemetry (continuing without it)");
    }

    // 2. Load configuration
    let db_path = std::env::var("BAYLINE_DB_PATH")
        .unwrap_or_else(|_| shellexpand::tilde(DEFAULT_DB_PATH).into_owned());

    let rpc_port: u16 = std::env::var("BAYLINE_RPC_PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(RpcServerConfig::default().port);

    let posts_per_day: i64 = std::env::var("BAYLINE_POSTS_PER_DAY")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_POSTS_PER_DAY);

    let horizon_days: u32 = std::env::var("BAYLINE_HORIZON_DAYS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_HORIZON_DAYS);

    let capacity = CapacityPlan::new(posts_per_day)
        .map_err(|e| anyhow::anyhow!("Invalid BAYLINE_POSTS_PER_DAY: {}", e))?;

    info!(db_path = %db_path, "Initializing database...");

    // 3. Initialize database
    let pool = create_pool(&db_path)
        .await
        .map_err(|e| anyhow::anyhow!("DB pool creation failed: {}", e))?;
    run_migrations(&pool)
        .await
        .map_err(|e| anyhow::anyhow!("Migration failed: {}", e))?;

    // 4. Setup dependencies (DI wiring)
    let clock = Arc::new(SystemClock);
    let booking_repo = Arc::new(SqliteBookingRepository::new(pool.clone()));
    let booking_store = Arc::new(SqliteBookingRepository::new(pool.clone()));
    let directory = Arc::new(SqliteVehicleDirectory::new(pool.clone()));

    let scheduler = Arc::new(SchedulerService::new(
        booking_store,
        booking_repo.clone(),
        directory.clone(),
        clock.clone(),
        SchedulerConfig {
            capacity,
            horizon_days,
        },
    ));

    let reporting = Arc::new(ReportingService::new(booking_repo, clock));

    info!(
        posts_per_day = posts_per_day,
        horizon_days = horizon_days,
        "Scheduler configured"
    );

    // 5. Start JSON-RPC server
    info!("Starting JSON-RPC server...");
    let rpc_config = RpcServerConfig {
        port: rpc_port,
        ..Default::default()
    };
    let rpc_server = RpcServer::new(rpc_config, scheduler, reporting, directory);
    let rpc_handle = rpc_server
        .start()
        .await
        .map_err(|e| anyhow::anyhow!("RPC server start failed: {}", e))?;

    info!("System ready. Press Ctrl+C to shutdown");

    // 6. Wait for shutdown signal
    tokio::signal::ctrl_c().await?;

    info!("Shutdown signal received. Exiting gracefully...");

    rpc_handle
        .stop()
        .map_err(|e| anyhow::anyhow!("RPC server stop failed: {}", e))?;
    rpc_handle.stopped().await;

    info!("Shutdown complete.");

    Ok(())
}
