//! evalboard-ui - Evaluation board web service
//!
//! Serves the team browsing UI and the jury scoring API on top of a
//! hosted record store.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

use evalboard_common::config::{resolve_settings, StoreConfig};
use evalboard_common::store::{RecordStore, RestStore};
use evalboard_ui::{build_router, demo, AppState};

#[derive(Parser, Debug)]
#[command(name = "evalboard-ui")]
#[command(about = "Evaluation board web service")]
#[command(version)]
struct Args {
    /// Address to listen on (host:port)
    #[arg(short, long)]
    bind: Option<String>,

    /// Base URL of the hosted record store
    #[arg(long)]
    store_url: Option<String>,

    /// API key for the record store
    #[arg(long)]
    store_key: Option<String>,

    /// Run against a seeded in-memory store instead of a hosted one
    #[arg(long)]
    demo: bool,

    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    // Log build identification immediately after tracing init
    info!(
        "Starting EvalBoard UI (evalboard-ui) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let args = Args::parse();

    // Per-setting resolution: CLI > environment > config file > default
    let settings = resolve_settings(
        args.bind.as_deref(),
        args.store_url.as_deref(),
        args.store_key.as_deref(),
        args.demo,
        args.config.as_deref(),
    )?;

    let store: Arc<dyn RecordStore> = match &settings.store {
        StoreConfig::Demo => {
            info!("✓ Demo mode: seeded in-memory store");
            Arc::new(demo::demo_store())
        }
        StoreConfig::Rest { url, key } => {
            info!("Record store: {}", url);
            match RestStore::new(url, key) {
                Ok(store) => {
                    info!("✓ Record store client ready");
                    Arc::new(store)
                }
                Err(e) => {
                    error!("Failed to build record store client: {}", e);
                    return Err(e.into());
                }
            }
        }
    };

    // Create application state and router
    let state = AppState::new(store);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&settings.bind).await?;
    info!("evalboard-ui listening on http://{}", settings.bind);
    info!("Health check: http://{}/health", settings.bind);

    axum::serve(listener, app).await?;

    Ok(())
}
