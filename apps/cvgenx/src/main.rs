mod cli;
mod config;
mod db;
mod errors;
mod export;
mod generation;
mod models;
mod profile;
mod provider;
mod routes;
mod state;
mod store;

use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::cli::{Cli, Commands};
use crate::config::Config;
use crate::provider::build_provider;
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::Store;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let store = Store::open(&config.database_url, config.reset_db || cli.reset_db)
        .await
        .with_context(|| format!("Failed to open database at {}", config.database_url))?;

    info!("Data directory: {}", config.data_dir.display());

    let provider = build_provider(config.provider, &config.provider_url);
    info!("Content provider: {} ({})", provider.name(), config.provider_url);

    let state = AppState {
        store,
        provider,
        config: config.clone(),
    };

    match cli.command {
        None | Some(Commands::Serve) => serve(state, config.port).await,
        Some(command) => cli::run(command, &state).await,
    }
}

async fn serve(state: AppState, port: u16) -> Result<()> {
    info!("Starting cvgenx API v{}", env!("CARGO_PKG_VERSION"));

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{port}").parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
