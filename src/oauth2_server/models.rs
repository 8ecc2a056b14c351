// ABOUTME: OAuth 2.0 data models for the authorization broker
// ABOUTME: Wire request/response structures plus the session and grant records
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Mercado AI

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::pkce::PkceChallenge;

/// OAuth 2.0 Authorization Request (GET /oauth/authorize query parameters)
#[derive(Debug, Deserialize, Clone)]
pub struct AuthorizeRequest {
    /// Response type; only `code` is supported
    pub response_type: String,
    /// Client identifier (opaque; there is no client registry)
    pub client_id: String,
    /// Absolute URI the grant code is delivered to
    pub redirect_uri: String,
    /// Client-chosen opaque correlation value, echoed back unchanged
    pub state: String,
    /// Requested scopes
    pub scope: Option<String>,
    /// PKCE code challenge (RFC 7636)
    pub code_challenge: Option<String>,
    /// PKCE code challenge method, `S256` or `plain`
    pub code_challenge_method: Option<String>,
}

/// OAuth 2.0 Token Request (POST /oauth/token form body)
#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    /// Grant type; only `authorization_code` is supported
    pub grant_type: String,
    /// The grant code being redeemed
    pub code: Option<String>,
    /// PKCE code verifier, mandatory iff the grant carries a challenge
    pub code_verifier: Option<String>,
    /// Redirect URI (accepted, not used for enforcement — public-client model)
    pub redirect_uri: Option<String>,
    /// Client ID (accepted, not used for enforcement)
    pub client_id: Option<String>,
    /// Client secret (accepted, not used for enforcement)
    pub client_secret: Option<String>,
}

/// OAuth 2.0 Token Response
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    /// Application JWT
    pub access_token: String,
    /// Always `Bearer`
    pub token_type: String,
    /// Token lifetime in seconds
    pub expires_in: i64,
    /// Granted scopes
    pub scope: Option<String>,
}

/// OAuth 2.0 Error Response (RFC 6749 Section 5.2)
#[derive(Debug, Serialize, Deserialize)]
pub struct OAuth2Error {
    /// Error code: `invalid_request` or `invalid_grant`
    pub error: String,
    /// Human-readable error description
    pub error_description: Option<String>,
}

impl OAuth2Error {
    /// Create an `invalid_request` error
    #[must_use]
    pub fn invalid_request(description: &str) -> Self {
        Self {
            error: "invalid_request".to_owned(),
            error_description: Some(description.to_owned()),
        }
    }

    /// Create an `invalid_grant` error
    #[must_use]
    pub fn invalid_grant(description: &str) -> Self {
        Self {
            error: "invalid_grant".to_owned(),
            error_description: Some(description.to_owned()),
        }
    }
}

impl IntoResponse for OAuth2Error {
    fn into_response(self) -> Response {
        (StatusCode::BAD_REQUEST, Json(self)).into_response()
    }
}

/// Server-side record of an in-flight sign-in attempt, keyed by `state`.
///
/// Created by `begin_authorization`, read-and-deleted exactly once by
/// `resolve_authorization` or evicted on expiry. Never mutated in place.
/// The expiry instant lives in the owning store's entry.
#[derive(Debug, Clone)]
pub struct AuthorizationSession {
    /// The correlation value this session is keyed by
    pub state: String,
    /// Where the grant code will be delivered
    pub redirect_uri: String,
    /// Challenge recorded iff the client opted into PKCE
    pub pkce: Option<PkceChallenge>,
}

/// One-time-use grant, keyed by its code.
///
/// Minted once an identity has been resolved for a session; redeemed exactly
/// once by the token endpoint or evicted on expiry.
#[derive(Debug, Clone)]
pub struct Grant {
    /// The bearer-redeemable code this grant is keyed by
    pub code: String,
    /// Resolved local identity the grant is bound to
    pub user_id: Uuid,
    /// Challenge copied unchanged from the originating session
    pub pkce: Option<PkceChallenge>,
}

/// The third-party identity proof presented when resolving a session:
/// either an authorization code still to be exchanged upstream, or a
/// pre-obtained identity token
#[derive(Debug, Clone)]
pub enum IdentityAssertion {
    /// Upstream authorization code, exchanged via the identity verifier
    AuthorizationCode(String),
    /// Pre-obtained identity token, verified directly
    IdToken(String),
}

/// Outcome of resolving an authorization session: everything the caller
/// needs to deliver the grant code, by HTTP redirect or as a JSON body
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedAuthorization {
    /// The session's registered redirect URI
    pub redirect_url: String,
    /// Freshly minted grant code
    pub code: String,
    /// The original `state`, echoed back unchanged
    pub state: String,
}

impl ResolvedAuthorization {
    /// Render the redirect delivery binding: the redirect URI with `code`
    /// and `state` appended as query parameters
    ///
    /// # Errors
    ///
    /// Returns an error if the stored redirect URI fails to parse; it was
    /// validated at `begin_authorization` time, so this indicates a bug.
    pub fn redirect_location(&self) -> Result<String, url::ParseError> {
        let mut url = url::Url::parse(&self.redirect_url)?;
        url.query_pairs_mut()
            .append_pair("code", &self.code)
            .append_pair("state", &self.state);
        Ok(url.into())
    }
}
