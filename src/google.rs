// ABOUTME: Google identity verifier for the OAuth broker's upstream leg
// ABOUTME: Authorization URL, code-for-token exchange, and RS256 id-token verification via JWKS
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Mercado AI

//! # Google Identity Verification
//!
//! The broker's upstream collaborator: builds the Google authorization URL,
//! exchanges an authorization code for Google tokens, and verifies Google
//! id tokens against Google's published JWKS. The [`IdentityVerifier`]
//! trait is the seam tests mock.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use url::Url;

/// Google's OAuth authorization endpoint
const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
/// Google's token endpoint
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
/// Google's JWKS endpoint for id-token signature keys
const GOOGLE_JWKS_URL: &str = "https://www.googleapis.com/oauth2/v3/certs";
/// Issuer values Google uses in id tokens
const GOOGLE_ISSUERS: [&str; 2] = ["accounts.google.com", "https://accounts.google.com"];
/// How long fetched JWKS keys are reused before refetching
const JWKS_CACHE_TTL: Duration = Duration::from_secs(3600);
/// Scopes requested from Google
const GOOGLE_SCOPES: &str = "openid email profile";

/// Tokens returned by Google's token endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleTokens {
    /// Google API access token
    pub access_token: Option<String>,
    /// OpenID Connect identity token
    pub id_token: Option<String>,
    /// Token lifetime in seconds
    pub expires_in: Option<i64>,
    /// Granted scopes
    pub scope: Option<String>,
}

/// Verified identity fields extracted from a Google id token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoogleProfile {
    /// Google-issued stable subject identifier
    pub sub: String,
    /// Email address, if in scope
    pub email: Option<String>,
    /// Display name, if in scope
    pub name: Option<String>,
    /// Avatar URL, if in scope
    pub picture: Option<String>,
}

/// Upstream identity verification capability consumed by the broker
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// Build the Google authorization URL carrying `state`
    fn authorization_url(&self, state: &str) -> String;

    /// Exchange an upstream authorization code for Google tokens
    ///
    /// # Errors
    ///
    /// Returns an error if the exchange request fails or Google rejects
    /// the code.
    async fn exchange_code(&self, code: &str) -> Result<GoogleTokens>;

    /// Verify an id token's signature and claims, returning the profile
    ///
    /// # Errors
    ///
    /// Returns an error if the token is malformed, its signature does not
    /// verify against Google's JWKS, or its audience/issuer are wrong.
    async fn verify_id_token(&self, id_token: &str) -> Result<GoogleProfile>;
}

/// Single key from a JWKS document
#[derive(Debug, Clone, Deserialize)]
struct Jwk {
    kid: Option<String>,
    n: String,
    e: String,
}

/// JWKS document shape
#[derive(Debug, Clone, Deserialize)]
struct Jwks {
    keys: Vec<Jwk>,
}

/// Claims we read out of a Google id token. Audience, issuer, and expiry
/// are checked by the validator against the raw token, not read from here.
#[derive(Debug, Serialize, Deserialize)]
struct GoogleIdClaims {
    sub: String,
    email: Option<String>,
    name: Option<String>,
    picture: Option<String>,
}

/// Production [`IdentityVerifier`] backed by Google's endpoints
pub struct GoogleVerifier {
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    http: reqwest::Client,
    jwks_cache: RwLock<Option<(Instant, Jwks)>>,
}

impl GoogleVerifier {
    /// Create a verifier for the given Google OAuth client
    #[must_use]
    pub fn new(client_id: String, client_secret: String, redirect_uri: String) -> Self {
        Self {
            client_id,
            client_secret,
            redirect_uri,
            http: reqwest::Client::new(),
            jwks_cache: RwLock::new(None),
        }
    }

    /// Fetch Google's JWKS, reusing a cached copy within its TTL
    async fn jwks(&self) -> Result<Jwks> {
        {
            let cache = self.jwks_cache.read().await;
            if let Some((fetched_at, jwks)) = cache.as_ref() {
                if fetched_at.elapsed() < JWKS_CACHE_TTL {
                    return Ok(jwks.clone());
                }
            }
        }

        let jwks: Jwks = self
            .http
            .get(GOOGLE_JWKS_URL)
            .send()
            .await
            .context("Failed to fetch Google JWKS")?
            .error_for_status()
            .context("Google JWKS endpoint returned an error")?
            .json()
            .await
            .context("Failed to parse Google JWKS")?;

        *self.jwks_cache.write().await = Some((Instant::now(), jwks.clone()));
        Ok(jwks)
    }
}

#[async_trait]
impl IdentityVerifier for GoogleVerifier {
    fn authorization_url(&self, state: &str) -> String {
        // GOOGLE_AUTH_URL is a compile-time constant and always parses
        let mut url = Url::parse(GOOGLE_AUTH_URL).unwrap_or_else(|_| unreachable!());
        url.query_pairs_mut()
            .append_pair("client_id", &self.client_id)
            .append_pair("redirect_uri", &self.redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("scope", GOOGLE_SCOPES)
            .append_pair("access_type", "offline")
            .append_pair("prompt", "consent")
            .append_pair("state", state);
        url.into()
    }

    async fn exchange_code(&self, code: &str) -> Result<GoogleTokens> {
        let params = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("code", code),
            ("grant_type", "authorization_code"),
            ("redirect_uri", self.redirect_uri.as_str()),
        ];

        let tokens: GoogleTokens = self
            .http
            .post(GOOGLE_TOKEN_URL)
            .form(&params)
            .send()
            .await
            .context("Google token exchange request failed")?
            .error_for_status()
            .context("Google rejected the authorization code")?
            .json()
            .await
            .context("Failed to parse Google token response")?;

        Ok(tokens)
    }

    async fn verify_id_token(&self, id_token: &str) -> Result<GoogleProfile> {
        let header = decode_header(id_token).context("Malformed id token header")?;
        let kid = header.kid;

        let jwks = self.jwks().await?;
        let jwk = jwks
            .keys
            .iter()
            .find(|k| kid.is_none() || k.kid == kid)
            .ok_or_else(|| anyhow!("No JWKS key matches the id token's kid"))?;

        let decoding_key = DecodingKey::from_rsa_components(&jwk.n, &jwk.e)
            .context("Invalid RSA components in Google JWKS")?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[self.client_id.as_str()]);
        validation.set_issuer(&GOOGLE_ISSUERS);

        let token_data = decode::<GoogleIdClaims>(id_token, &decoding_key, &validation)
            .context("Id token verification failed")?;

        let claims = token_data.claims;
        Ok(GoogleProfile {
            sub: claims.sub,
            email: claims.email,
            name: claims.name,
            picture: claims.picture,
        })
    }
}
