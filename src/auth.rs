// ABOUTME: JWT-based user authentication and token signing
// ABOUTME: Handles application token generation, validation, and bearer-header extraction
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Mercado AI

//! # Authentication and Token Signing
//!
//! HS256 JWT signing and validation for application bearer tokens, plus the
//! bearer-header extraction helper protected routes use. The broker hands a
//! resolved user to [`AuthManager::generate_token`]; route handlers hand
//! inbound `Authorization` headers to [`AuthManager::authenticate_headers`].

use crate::errors::{AppError, ErrorCode};
use crate::models::User;
use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Seconds in a day, for `expires_in` math
const SECONDS_PER_DAY: i64 = 86_400;

/// `JWT` validation error with detailed information
#[derive(Debug, Clone)]
pub enum JwtValidationError {
    /// Token has expired
    TokenExpired {
        /// When the token expired
        expired_at: DateTime<Utc>,
        /// Current time for reference
        current_time: DateTime<Utc>,
    },
    /// Token signature is invalid
    TokenInvalid {
        /// Reason for invalidity
        reason: String,
    },
    /// Token is malformed (not proper `JWT` format)
    TokenMalformed {
        /// Details about malformation
        details: String,
    },
}

impl std::fmt::Display for JwtValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TokenExpired {
                expired_at,
                current_time,
            } => {
                let duration_expired = current_time.signed_duration_since(*expired_at);
                write!(
                    f,
                    "JWT token expired {} minutes ago at {}",
                    duration_expired.num_minutes(),
                    expired_at.format("%Y-%m-%d %H:%M:%S UTC")
                )
            }
            Self::TokenInvalid { reason } => {
                write!(f, "JWT token signature is invalid: {reason}")
            }
            Self::TokenMalformed { details } => {
                write!(f, "JWT token is malformed: {details}")
            }
        }
    }
}

impl std::error::Error for JwtValidationError {}

impl From<JwtValidationError> for AppError {
    fn from(error: JwtValidationError) -> Self {
        match &error {
            JwtValidationError::TokenExpired { .. } => {
                Self::new(ErrorCode::AuthExpired, error.to_string())
            }
            JwtValidationError::TokenInvalid { .. } => {
                Self::new(ErrorCode::AuthInvalid, error.to_string())
            }
            JwtValidationError::TokenMalformed { .. } => {
                Self::new(ErrorCode::AuthMalformed, error.to_string())
            }
        }
    }
}

/// `JWT` claims for application bearer tokens
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User `ID`
    pub sub: String,
    /// User email
    pub email: Option<String>,
    /// User display name
    pub name: Option<String>,
    /// Assigned roles
    pub roles: Vec<String>,
    /// Issued at timestamp
    pub iat: i64,
    /// Expiration timestamp
    pub exp: i64,
}

/// The authenticated caller extracted from a bearer token
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    /// User `ID` from the token subject
    pub user_id: Uuid,
    /// Email from the token claims
    pub email: Option<String>,
    /// Display name from the token claims
    pub name: Option<String>,
    /// Roles from the token claims
    pub roles: Vec<String>,
}

/// HS256 JWT signer and validator
pub struct AuthManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_expiry_days: i64,
}

impl AuthManager {
    /// Create a manager signing with `secret` and issuing tokens valid for
    /// `token_expiry_days`
    #[must_use]
    pub fn new(secret: &[u8], token_expiry_days: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            token_expiry_days,
        }
    }

    /// Token lifetime in seconds, as surfaced in `expires_in`
    #[must_use]
    pub const fn expires_in_secs(&self) -> i64 {
        self.token_expiry_days * SECONDS_PER_DAY
    }

    /// Generate a `JWT` token for a user
    ///
    /// # Errors
    ///
    /// Returns an error if JWT encoding fails.
    pub fn generate_token(&self, user: &User) -> Result<String> {
        let now = Utc::now();
        let expiry = now + Duration::days(self.token_expiry_days);

        let claims = Claims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            name: user.name.clone(),
            roles: user.roles.clone(),
            iat: now.timestamp(),
            exp: expiry.timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;
        Ok(token)
    }

    /// Validate a token with detailed error information
    ///
    /// # Errors
    ///
    /// Returns a [`JwtValidationError`] if the token is expired, its
    /// signature is invalid, or it is malformed.
    pub fn validate_token(&self, token: &str) -> Result<Claims, JwtValidationError> {
        // Decode without expiry validation first so expiry failures can be
        // reported with their timestamps
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;

        let claims = decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|token_data| token_data.claims)
            .map_err(|e| Self::convert_jwt_error(&e))?;

        let current_time = Utc::now();
        if current_time.timestamp() > claims.exp {
            let expired_at = DateTime::from_timestamp(claims.exp, 0).unwrap_or_else(Utc::now);
            tracing::warn!(
                "JWT token expired for user {} at {}",
                claims.sub,
                expired_at.to_rfc3339()
            );
            return Err(JwtValidationError::TokenExpired {
                expired_at,
                current_time,
            });
        }

        Ok(claims)
    }

    /// Extract and authenticate the caller from request headers.
    ///
    /// Expects `Authorization: Bearer <token>`.
    ///
    /// # Errors
    ///
    /// Returns an [`AppError`] when the header is missing or malformed, or
    /// when the token fails validation.
    pub fn authenticate_headers(
        &self,
        headers: &axum::http::HeaderMap,
    ) -> Result<AuthenticatedUser, AppError> {
        let auth_header = headers
            .get("authorization")
            .and_then(|h| h.to_str().ok())
            .ok_or_else(AppError::auth_required)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::auth_invalid("Authorization header must be a Bearer token"))?;

        let claims = self.validate_token(token)?;

        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AppError::auth_invalid("Token subject is not a valid user id"))?;

        Ok(AuthenticatedUser {
            user_id,
            email: claims.email,
            name: claims.name,
            roles: claims.roles,
        })
    }

    /// Convert JWT library errors to detailed validation errors
    fn convert_jwt_error(e: &jsonwebtoken::errors::Error) -> JwtValidationError {
        use jsonwebtoken::errors::ErrorKind;

        match e.kind() {
            ErrorKind::InvalidSignature => JwtValidationError::TokenInvalid {
                reason: "Token signature verification failed".into(),
            },
            ErrorKind::InvalidToken => JwtValidationError::TokenMalformed {
                details: "Token format is invalid".into(),
            },
            ErrorKind::Base64(base64_err) => JwtValidationError::TokenMalformed {
                details: format!("Token contains invalid base64: {base64_err}"),
            },
            ErrorKind::Json(json_err) => JwtValidationError::TokenMalformed {
                details: format!("Token contains invalid JSON: {json_err}"),
            },
            _ => JwtValidationError::TokenInvalid {
                reason: format!("Token validation failed: {e}"),
            },
        }
    }
}
