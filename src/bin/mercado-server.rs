// ABOUTME: Mercado server binary: configuration, wiring, and HTTP serve loop
// ABOUTME: Production entry point with graceful shutdown
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Mercado AI

//! # Mercado Server Binary
//!
//! Starts the shopping-list API with the Google OAuth broker, SQLite
//! storage, and JWT authentication.

use anyhow::Result;
use clap::Parser;
use mercado_server::{
    auth::AuthManager,
    config::environment::ServerConfig,
    database::Database,
    google::GoogleVerifier,
    logging,
    oauth2_server::OAuth2AuthorizationServer,
    providers::MockProvider,
    routes::{router, ServerResources},
};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

#[derive(Parser)]
#[command(name = "mercado-server")]
#[command(about = "Mercado shopping list API with Google sign-in broker")]
pub struct Args {
    /// Override HTTP port
    #[arg(long)]
    http_port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration from environment
    let mut config = ServerConfig::from_env()?;
    if let Some(http_port) = args.http_port {
        config.http_port = http_port;
    }

    // Initialize production logging
    logging::init_from_env()?;

    info!("Starting Mercado Server");
    info!("{}", config.summary());

    // Storage
    let database = Arc::new(Database::new(&config.database_url).await?);
    info!("Database connected and migrated");

    // Token signer
    let auth_manager = Arc::new(AuthManager::new(
        config.jwt_secret.as_bytes(),
        config.jwt_expires_days,
    ));

    // Upstream identity verifier
    let verifier = Arc::new(GoogleVerifier::new(
        config.google.client_id.clone(),
        config.google.client_secret.clone(),
        config.google.redirect_uri.clone(),
    ));

    // OAuth broker (spawns its background sweep tasks)
    let oauth2_server = Arc::new(OAuth2AuthorizationServer::new(
        database.clone(),
        auth_manager.clone(),
        verifier.clone(),
    ));

    let http_port = config.http_port;
    let resources = Arc::new(ServerResources {
        database,
        auth_manager,
        oauth2_server,
        verifier,
        provider: Arc::new(MockProvider::new()),
        config: Arc::new(config),
        started_at: Instant::now(),
    });

    let app = router(resources);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", http_port)).await?;
    info!("HTTP server listening on port {http_port}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

/// Resolve when ctrl-c is received
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to install ctrl-c handler: {e}");
    }
    info!("Shutdown signal received");
}
