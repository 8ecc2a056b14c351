// ABOUTME: Deterministic mock price provider for development and tests
// ABOUTME: Synthesizes prices from query length and zip digits across three stores
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Mercado AI

use super::PriceProvider;
use crate::models::{Availability, StoreItem};
use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Simulated backend latency
const SEARCH_LATENCY: Duration = Duration::from_millis(100);

/// Mock provider with deterministic prices
#[derive(Debug, Default, Clone)]
pub struct MockProvider;

impl MockProvider {
    /// Create a mock provider
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Price seed derived from the query and the zip's last two digits
    fn base_price(query: &str, zip: Option<&str>) -> f64 {
        let zip_component = zip
            .and_then(|z| z.get(z.len().saturating_sub(2)..))
            .and_then(|tail| tail.parse::<f64>().ok())
            .map_or(1.0, |d| d / 100.0);

        query.len() as f64 * 0.5 + zip_component
    }

    fn rounded(price: f64) -> f64 {
        (price * 100.0).round() / 100.0
    }
}

#[async_trait]
impl PriceProvider for MockProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn search(&self, query: &str, zip: Option<&str>) -> Result<Vec<StoreItem>> {
        tokio::time::sleep(SEARCH_LATENCY).await;

        let base = Self::base_price(query, zip);

        Ok(vec![
            StoreItem {
                name: query.to_owned(),
                price: Self::rounded(base * 1.2),
                unit: "unit".to_owned(),
                store: "Mock Store A".to_owned(),
                availability: Availability::InStock,
            },
            StoreItem {
                name: query.to_owned(),
                price: Self::rounded(base * 0.9),
                unit: "unit".to_owned(),
                store: "Mock Store B".to_owned(),
                availability: Availability::InStock,
            },
            StoreItem {
                name: query.to_owned(),
                price: Self::rounded(base * 1.5),
                unit: "unit".to_owned(),
                store: "Mock Store C".to_owned(),
                availability: Availability::Limited,
            },
        ])
    }
}
