// ABOUTME: Environment configuration management for deployment-specific settings
// ABOUTME: Handles environment variables, deployment modes, and runtime configuration parsing
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Mercado AI

//! Environment-based configuration management for production deployment

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use tracing::info;

/// Minimum accepted JWT secret length in bytes
const MIN_JWT_SECRET_LEN: usize = 32;

/// Strongly typed log level configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Error level
    Error,
    /// Warn level
    Warn,
    /// Info level (default)
    #[default]
    Info,
    /// Debug level
    Debug,
    /// Trace level
    Trace,
}

impl LogLevel {
    /// Parse from string with fallback
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "error" => Self::Error,
            "warn" => Self::Warn,
            "debug" => Self::Debug,
            "trace" => Self::Trace,
            _ => Self::Info,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warn => write!(f, "warn"),
            Self::Info => write!(f, "info"),
            Self::Debug => write!(f, "debug"),
            Self::Trace => write!(f, "trace"),
        }
    }
}

/// Environment type for security and other configurations
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Local development
    #[default]
    Development,
    /// Production deployment
    Production,
    /// Test runs
    Testing,
}

impl Environment {
    /// Parse from string with fallback
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "testing" | "test" => Self::Testing,
            _ => Self::Development,
        }
    }

    /// Check if this is a production environment
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
            Self::Testing => write!(f, "testing"),
        }
    }
}

/// Google OAuth client credentials
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleOAuthConfig {
    /// OAuth client ID issued by Google
    pub client_id: String,
    /// OAuth client secret issued by Google
    pub client_secret: String,
    /// Redirect URI registered with Google (our callback endpoint)
    pub redirect_uri: String,
}

/// Server configuration loaded from environment variables
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP listen port
    pub http_port: u16,
    /// Externally visible base URL of this service
    pub base_url: String,
    /// SQLite database URL
    pub database_url: String,
    /// Secret used to sign application JWTs
    pub jwt_secret: String,
    /// Application JWT lifetime in days
    pub jwt_expires_days: i64,
    /// Google OAuth credentials
    pub google: GoogleOAuthConfig,
    /// Comma-separated CORS origin list, or "*"
    pub cors_allowed_origins: String,
    /// Deployment environment
    pub environment: Environment,
    /// Log level
    pub log_level: LogLevel,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or malformed:
    /// `JWT_SECRET` (min 32 bytes), `BASE_URL`, `GOOGLE_CLIENT_ID`,
    /// `GOOGLE_CLIENT_SECRET`, `GOOGLE_REDIRECT_URI`.
    pub fn from_env() -> Result<Self> {
        info!("Loading configuration from environment variables");

        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET is required")?;
        if jwt_secret.len() < MIN_JWT_SECRET_LEN {
            return Err(anyhow!(
                "JWT_SECRET must be at least {MIN_JWT_SECRET_LEN} characters"
            ));
        }

        let base_url = env::var("BASE_URL").context("BASE_URL is required")?;
        url::Url::parse(&base_url).context("BASE_URL must be a valid URL")?;

        let google = GoogleOAuthConfig {
            client_id: env::var("GOOGLE_CLIENT_ID").context("GOOGLE_CLIENT_ID is required")?,
            client_secret: env::var("GOOGLE_CLIENT_SECRET")
                .context("GOOGLE_CLIENT_SECRET is required")?,
            redirect_uri: env::var("GOOGLE_REDIRECT_URI")
                .context("GOOGLE_REDIRECT_URI is required")?,
        };
        url::Url::parse(&google.redirect_uri)
            .context("GOOGLE_REDIRECT_URI must be a valid URL")?;

        let config = Self {
            http_port: env_var_or("PORT", "8080")?
                .parse()
                .context("Invalid PORT value")?,
            base_url,
            database_url: env_var_or("DATABASE_URL", "sqlite:./data/mercado.db")?,
            jwt_secret,
            jwt_expires_days: env_var_or("JWT_EXPIRES_DAYS", "7")?
                .parse()
                .context("Invalid JWT_EXPIRES_DAYS value")?,
            google,
            cors_allowed_origins: env_var_or("CORS_ALLOWED_ORIGINS", "*")?,
            environment: Environment::from_str_or_default(&env_var_or(
                "ENVIRONMENT",
                "development",
            )?),
            log_level: LogLevel::from_str_or_default(&env_var_or("LOG_LEVEL", "info")?),
        };

        Ok(config)
    }

    /// Get a summary of the configuration for logging (without secrets)
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "Mercado Server Configuration:\n\
             - HTTP Port: {}\n\
             - Base URL: {}\n\
             - Database: {}\n\
             - Environment: {}\n\
             - Log Level: {}\n\
             - JWT Expiry: {} days\n\
             - Google OAuth: {}",
            self.http_port,
            self.base_url,
            if self.database_url.starts_with("sqlite:") {
                "SQLite"
            } else {
                &self.database_url
            },
            self.environment,
            self.log_level,
            self.jwt_expires_days,
            if self.google.client_id.is_empty() {
                "Disabled"
            } else {
                "Enabled"
            },
        )
    }
}

/// Get environment variable or default value
fn env_var_or(key: &str, default: &str) -> Result<String> {
    Ok(env::var(key).unwrap_or_else(|_| default.to_string()))
}
