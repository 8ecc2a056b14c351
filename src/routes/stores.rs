// ABOUTME: Price search route handlers for store and comparison queries
// ABOUTME: JWT-authenticated lookups against the configured price provider
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Mercado AI

//! Price search routes

use super::ServerResources;
use crate::errors::AppError;
use crate::models::StoreItem;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Query parameters for GET /stores/search
#[derive(Debug, Deserialize)]
pub struct StoreSearchParams {
    /// Search query
    pub q: Option<String>,
    /// Zip code to narrow results
    pub zip: Option<String>,
    /// Provider name, defaults to `mock`
    pub provider: Option<String>,
}

/// Query parameters for GET /compare/search
#[derive(Debug, Deserialize)]
pub struct CompareSearchParams {
    /// Search query
    pub q: Option<String>,
    /// Zip code to narrow results
    pub zip: Option<String>,
    /// Comma-separated provider names, defaults to `mock`
    pub providers: Option<String>,
}

/// Response body for GET /stores/search
#[derive(Debug, Serialize, Deserialize)]
pub struct StoreSearchResponse {
    /// Priced items found
    pub results: Vec<StoreItem>,
}

/// Response body for GET /compare/search
#[derive(Debug, Serialize, Deserialize)]
pub struct CompareSearchResponse {
    /// The original query
    pub query: String,
    /// The zip filter, if any
    pub zip: Option<String>,
    /// Providers that answered
    pub providers: Vec<String>,
    /// Priced items found
    pub results: Vec<StoreItem>,
}

/// Store routes implementation
pub struct StoreRoutes;

impl StoreRoutes {
    /// Create the price search routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/stores/search", get(Self::stores_search))
            .route("/compare/search", get(Self::compare_search))
            .with_state(resources)
    }

    /// GET /stores/search
    async fn stores_search(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Query(params): Query<StoreSearchParams>,
    ) -> Result<Json<StoreSearchResponse>, AppError> {
        resources.auth_manager.authenticate_headers(&headers)?;

        let query = params
            .q
            .filter(|q| !q.is_empty())
            .ok_or_else(|| AppError::invalid_input("Query parameter \"q\" is required"))?;

        let provider_name = params.provider.as_deref().unwrap_or("mock");
        if provider_name != resources.provider.name() {
            return Err(AppError::invalid_input(format!(
                "Only \"{}\" provider is supported",
                resources.provider.name()
            )));
        }

        let results = resources
            .provider
            .search(&query, params.zip.as_deref())
            .await
            .map_err(|e| AppError::external_service(resources.provider.name(), e.to_string()))?;

        Ok(Json(StoreSearchResponse { results }))
    }

    /// GET /compare/search
    async fn compare_search(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Query(params): Query<CompareSearchParams>,
    ) -> Result<Json<CompareSearchResponse>, AppError> {
        resources.auth_manager.authenticate_headers(&headers)?;

        let query = params
            .q
            .filter(|q| !q.is_empty())
            .ok_or_else(|| AppError::invalid_input("Query parameter \"q\" is required"))?;

        let requested = params.providers.unwrap_or_else(|| "mock".to_owned());
        let valid: Vec<String> = requested
            .split(',')
            .map(str::trim)
            .filter(|p| *p == resources.provider.name())
            .map(str::to_owned)
            .collect();

        if valid.is_empty() {
            return Err(AppError::invalid_input("No valid providers specified"));
        }

        let results = resources
            .provider
            .search(&query, params.zip.as_deref())
            .await
            .map_err(|e| AppError::external_service(resources.provider.name(), e.to_string()))?;

        Ok(Json(CompareSearchResponse {
            query,
            zip: params.zip,
            providers: valid,
            results,
        }))
    }
}
