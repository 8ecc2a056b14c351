// ABOUTME: Configuration management module for centralized server settings
// ABOUTME: Handles environment-derived configuration and runtime options
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Mercado AI

//! Configuration module for the Mercado server
//!
//! Centralized configuration for all components:
//!
//! - **Environment**: server configuration from environment variables

/// Environment and server configuration
pub mod environment;

pub use environment::{Environment, GoogleOAuthConfig, LogLevel, ServerConfig};
