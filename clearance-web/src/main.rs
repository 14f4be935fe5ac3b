//! clearance-web - examination clearance service
//!
//! Accepts candidate roster uploads over HTTP, stores each as one record and
//! serves the clearance listing and QR verification pages for it.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use clearance_common::config::{load_toml_config, ConfigOverrides, ServiceConfig, StoreVariant};
use clearance_common::db::init_database;
use clearance_web::store::build_store;
use clearance_web::{build_router, AppState};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for clearance-web
#[derive(Parser, Debug)]
#[command(name = "clearance-web")]
#[command(about = "Examination clearance roster service")]
#[command(version)]
struct Args {
    /// Public base URL embedded in QR codes
    #[arg(long)]
    base_url: Option<String>,

    /// SQLite connection string
    #[arg(long)]
    database_url: Option<String>,

    /// Listen address (host:port)
    #[arg(long)]
    bind: Option<String>,

    /// Record store: minimal or segmented
    #[arg(long)]
    store: Option<StoreVariant>,

    /// TOML config file
    #[arg(short, long, env = "CLEARANCE_CONFIG")]
    config: Option<PathBuf>,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            base_url: self.base_url.clone(),
            database_url: self.database_url.clone(),
            bind: self.bind.clone(),
            store: self.store,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let toml_config = load_toml_config(args.config.as_deref())?;
    let config = ServiceConfig::resolve(args.overrides(), &toml_config)?;

    // RUST_LOG wins over the config file level
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_level.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting clearance-web v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    info!("Record store: {}", config.store);
    info!("Base URL: {}", config.base_url);

    let pool = match init_database(&config.database_url).await {
        Ok(pool) => {
            info!("✓ Database ready: {}", config.database_url);
            pool
        }
        Err(e) => {
            error!("Failed to initialize database: {}", e);
            return Err(e.into());
        }
    };

    let state = AppState::new(build_store(config.store, pool), config.base_url.clone());
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind))?;
    info!("clearance-web listening on http://{}", config.bind);
    info!("Health check: http://{}/health", config.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
