// ABOUTME: Main library entry point for the Mercado shopping list API
// ABOUTME: Exposes the OAuth broker, storage, providers, and HTTP routes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Mercado AI

#![deny(unsafe_code)]

//! # Mercado Server
//!
//! A shopping-list backend whose authentication front door is an OAuth 2.0
//! Authorization-Code-with-PKCE broker between Google Sign-In and the API's
//! own bearer-token clients.
//!
//! ## Architecture
//!
//! - **`oauth2_server`**: the broker — authorization sessions, one-time
//!   grants, PKCE validation, all state volatile and single-use
//! - **`google`**: upstream identity verification against Google
//! - **`auth`**: application JWT signing and validation
//! - **`database`**: SQLite persistence for users and shopping lists
//! - **`providers`**: pluggable price search backends
//! - **`routes`**: the axum HTTP surface
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mercado_server::config::environment::ServerConfig;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::from_env()?;
//!     println!("Mercado server configured for port {}", config.http_port);
//!     Ok(())
//! }
//! ```

/// JWT-based authentication and token signing
pub mod auth;
/// Configuration management
pub mod config;
/// SQLite database layer
pub mod database;
/// Unified error handling
pub mod errors;
/// Google identity verification
pub mod google;
/// Logging configuration
pub mod logging;
/// Core data models
pub mod models;
/// OAuth 2.0 authorization broker
pub mod oauth2_server;
/// Price providers
pub mod providers;
/// HTTP routes
pub mod routes;
/// Shopping list suggestions
pub mod suggestions;
