//! Storefront API Server
//!
//! REST API server for the storefront.
//!
//! Author: hephaex@gmail.com

use anyhow::Context;
use clap::Parser;
use shop_api::{create_router, state::AppState};
use shop_core::config::{AppConfig, LoggingConfig};
use shop_core::PgStore;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "shop-api")]
#[command(author = "hephaex@gmail.com")]
#[command(version = "0.1.0")]
#[command(about = "Storefront REST API server", long_about = None)]
struct Args {
    /// TOML configuration file (takes precedence over SHOP_CONFIG)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Keep users and products in memory instead of PostgreSQL
    #[arg(long)]
    in_memory: bool,
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "shop_api={0},shop_core={0},audit=info,tower_http=debug",
            logging.level
        )
        .into()
    });

    if logging.json_format {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // A missing or weak signing secret stops the server here
    let config = match &args.config {
        Some(path) => {
            let config = AppConfig::from_file(path.clone())?.with_env_override()?;
            config.validate()?;
            config
        }
        None => AppConfig::load()?,
    };

    init_tracing(&config.logging);

    let addr = format!("{}:{}", config.server.host, config.server.port);

    let state = if args.in_memory {
        tracing::warn!("Running with in-memory stores; data is lost on exit");
        AppState::in_memory(config)
    } else {
        let store = Arc::new(
            PgStore::new(
                &config.database.postgres_url,
                config.database.postgres_pool_size,
            )
            .await
            .context("Failed to connect to PostgreSQL")?,
        );
        store.migrate().await.context("Failed to run migrations")?;
        AppState::new(config, store.clone(), store)
    };

    tokio::fs::create_dir_all(state.media.dir())
        .await
        .with_context(|| format!("Failed to create upload dir {}", state.media.dir().display()))?;

    let app = create_router(Arc::new(state));

    // Start server
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Storefront API starting on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", addr);
    tracing::info!("OpenAPI spec at http://{}/api-docs/openapi.json", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
