// ABOUTME: Service banner and health check route handlers
// ABOUTME: Provides the root endpoint map and a health endpoint for monitoring
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Mercado AI

//! Health check routes for service monitoring

use super::ServerResources;
use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use std::sync::Arc;

/// Health routes implementation
pub struct HealthRoutes;

impl HealthRoutes {
    /// Create the banner and health routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/", get(Self::banner))
            .route("/health", get(Self::health))
            .with_state(resources)
    }

    /// Service banner with the endpoint map
    async fn banner(State(resources): State<Arc<ServerResources>>) -> Json<serde_json::Value> {
        Json(serde_json::json!({
            "status": "online",
            "message": "Mercado API",
            "version": env!("CARGO_PKG_VERSION"),
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "endpoints": {
                "health": "/health",
                "auth": "/auth/google/verify",
                "oauth": "/oauth/authorize",
                "lists": "/lists",
                "stores": "/stores/search",
                "compare": "/compare/search",
            },
            "base_url": resources.config.base_url,
        }))
    }

    /// Health check with uptime and environment
    async fn health(State(resources): State<Arc<ServerResources>>) -> Json<serde_json::Value> {
        Json(serde_json::json!({
            "status": "healthy",
            "ok": true,
            "uptime": resources.started_at.elapsed().as_secs(),
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "environment": resources.config.environment.to_string(),
        }))
    }
}
