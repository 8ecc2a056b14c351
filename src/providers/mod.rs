// ABOUTME: Price provider abstraction for store and comparison search
// ABOUTME: Pluggable backends behind the PriceProvider trait
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Mercado AI

//! # Price Providers
//!
//! Abstract price-search backends. Each provider answers a free-text query
//! (optionally narrowed by zip code) with priced items per store. Only the
//! deterministic mock provider ships; real chains plug in behind the same
//! trait.

/// Deterministic mock provider
pub mod mock;

use crate::models::StoreItem;
use anyhow::Result;
use async_trait::async_trait;

pub use mock::MockProvider;

/// Price search capability
#[async_trait]
pub trait PriceProvider: Send + Sync {
    /// Provider name as addressed in requests (e.g. `mock`)
    fn name(&self) -> &'static str;

    /// Search for priced items matching `query`, optionally near `zip`
    ///
    /// # Errors
    ///
    /// Returns an error if the backing service fails.
    async fn search(&self, query: &str, zip: Option<&str>) -> Result<Vec<StoreItem>>;
}
