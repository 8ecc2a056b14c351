// ABOUTME: HTTP route assembly and shared server resources
// ABOUTME: Builds the axum router with CORS and tracing layers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Mercado AI

//! # HTTP Routes
//!
//! Route modules follow one shape: a unit struct with a
//! `routes(resources) -> Router` builder. [`router`] merges them all and
//! applies the middleware layers.

/// Google sign-in verification routes
pub mod auth;
/// Service banner and health endpoints
pub mod health;
/// Shopping list CRUD routes
pub mod lists;
/// OAuth 2.0 broker endpoints
pub mod oauth2;
/// Price search routes
pub mod stores;

use crate::auth::AuthManager;
use crate::config::environment::ServerConfig;
use crate::database::Database;
use crate::google::IdentityVerifier;
use crate::oauth2_server::OAuth2AuthorizationServer;
use crate::providers::PriceProvider;
use axum::http::{HeaderValue, Method};
use axum::Router;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared state injected into every route handler
pub struct ServerResources {
    /// SQLite database handle
    pub database: Arc<Database>,
    /// JWT signer/validator
    pub auth_manager: Arc<AuthManager>,
    /// OAuth broker
    pub oauth2_server: Arc<OAuth2AuthorizationServer>,
    /// Upstream identity verifier (also used by the direct-verify route)
    pub verifier: Arc<dyn IdentityVerifier>,
    /// Price search provider
    pub provider: Arc<dyn PriceProvider>,
    /// Server configuration
    pub config: Arc<ServerConfig>,
    /// Process start time, for the health endpoint's uptime
    pub started_at: Instant,
}

/// Build the complete application router
#[must_use]
pub fn router(resources: Arc<ServerResources>) -> Router {
    let cors = setup_cors(&resources.config);

    // The broker endpoints answer under /oauth, /auth, and /api/auth alike;
    // the verify route joins them under the latter two
    Router::new()
        .merge(health::HealthRoutes::routes(resources.clone()))
        .nest("/oauth", oauth2::OAuth2Routes::routes(resources.clone()))
        .nest(
            "/auth",
            oauth2::OAuth2Routes::routes(resources.clone())
                .merge(auth::AuthRoutes::routes(resources.clone())),
        )
        .nest(
            "/api/auth",
            oauth2::OAuth2Routes::routes(resources.clone())
                .merge(auth::AuthRoutes::routes(resources.clone())),
        )
        .merge(lists::ListRoutes::routes(resources.clone()))
        .merge(stores::StoreRoutes::routes(resources))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Configure CORS from the `CORS_ALLOWED_ORIGINS`-derived setting: wildcard
/// for development, a comma-separated origin list for production
fn setup_cors(config: &ServerConfig) -> CorsLayer {
    let allow_origin = if config.cors_allowed_origins.is_empty()
        || config.cors_allowed_origins == "*"
    {
        AllowOrigin::any()
    } else {
        let origins: Vec<HeaderValue> = config
            .cors_allowed_origins
            .split(',')
            .filter_map(|s| {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    HeaderValue::from_str(trimmed).ok()
                }
            })
            .collect();
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::AUTHORIZATION,
            axum::http::header::ACCEPT,
        ])
}
