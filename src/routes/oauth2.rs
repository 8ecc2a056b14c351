// ABOUTME: OAuth 2.0 broker route handlers: authorize, Google callback, token
// ABOUTME: Redirect delivery binding of the authorization session state machine
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Mercado AI

//! OAuth 2.0 broker endpoints
//!
//! The redirect-based flow: `/authorize` opens a session and bounces the
//! browser to Google; `/google/callback` resolves the session from Google's
//! redirect and delivers the grant code to the client's redirect URI;
//! `/token` redeems the grant for an application bearer token. Routes are
//! mounted under `/oauth`, `/auth`, and `/api/auth` alike.

use super::ServerResources;
use crate::errors::AppError;
use crate::oauth2_server::models::{
    AuthorizeRequest, IdentityAssertion, OAuth2Error, TokenRequest, TokenResponse,
};
use axum::extract::{Form, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use std::sync::Arc;

/// Query parameters Google sends to the callback
#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    /// Upstream authorization code
    pub code: Option<String>,
    /// The `state` opened at authorize time
    pub state: Option<String>,
    /// Error code when the user denied or Google failed
    pub error: Option<String>,
}

/// `OAuth2` broker routes implementation
pub struct OAuth2Routes;

impl OAuth2Routes {
    /// Create the broker routes, un-prefixed; the route assembly nests them
    /// under `/oauth`, `/auth`, and `/api/auth`
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/authorize", get(Self::authorize))
            .route("/google/callback", get(Self::google_callback))
            .route("/token", post(Self::token))
            .with_state(resources)
    }

    /// GET /oauth/authorize — open a session and redirect to Google
    async fn authorize(
        State(resources): State<Arc<ServerResources>>,
        Query(request): Query<AuthorizeRequest>,
    ) -> Result<Response, OAuth2Error> {
        let auth_url = resources.oauth2_server.begin_authorization(request).await?;
        Ok(redirect_found(&auth_url))
    }

    /// GET /oauth/google/callback — resolve the session and deliver the
    /// grant code by redirect
    async fn google_callback(
        State(resources): State<Arc<ServerResources>>,
        Query(params): Query<CallbackParams>,
    ) -> Result<Response, AppError> {
        if let Some(error) = params.error {
            return Err(AppError::assertion_verification_failed(format!(
                "Google returned an error: {error}"
            )));
        }

        let code = params
            .code
            .ok_or_else(|| AppError::invalid_input("Missing authorization code"))?;
        let state = params
            .state
            .ok_or_else(|| AppError::invalid_input("Missing state parameter"))?;

        let resolved = resources
            .oauth2_server
            .resolve_authorization(&state, IdentityAssertion::AuthorizationCode(code))
            .await?;

        let location = resolved
            .redirect_location()
            .map_err(|e| AppError::internal(format!("Stored redirect URI failed to parse: {e}")))?;

        Ok(redirect_found(&location))
    }

    /// POST /oauth/token — redeem a grant for a bearer token
    async fn token(
        State(resources): State<Arc<ServerResources>>,
        Form(request): Form<TokenRequest>,
    ) -> Result<Json<TokenResponse>, OAuth2Error> {
        let response = resources.oauth2_server.token(request).await?;
        Ok(Json(response))
    }
}

/// 302 Found redirect (RFC 6749 uses 302 in its examples)
fn redirect_found(location: &str) -> Response {
    (
        StatusCode::FOUND,
        [(header::LOCATION, location.to_owned())],
    )
        .into_response()
}
