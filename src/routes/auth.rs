// ABOUTME: Google sign-in verification route: the JSON delivery binding
// ABOUTME: Resolves a broker session from a pre-obtained id token, or verifies directly
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Mercado AI

//! Google sign-in verification
//!
//! `POST /auth/google/verify` accepts a Google id token the client obtained
//! itself (the interactive variant). With a `state` it is the JSON delivery
//! binding of the broker state machine: the session is resolved and the
//! grant code returned in the body instead of a redirect. Without a `state`
//! it verifies the token and signs in directly, for first-party clients
//! that predate the broker flow.

use super::ServerResources;
use crate::errors::AppError;
use crate::oauth2_server::models::IdentityAssertion;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Request body for the verify endpoint
#[derive(Debug, Deserialize)]
pub struct GoogleVerifyRequest {
    /// Google id token obtained by the client
    pub id_token: String,
    /// When present, resolves the broker session opened under this state
    pub state: Option<String>,
}

/// Signed-in user summary returned by the direct-verify variant
#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    /// User id
    pub id: String,
    /// Email address
    pub email: Option<String>,
    /// Display name
    pub name: Option<String>,
    /// Avatar URL
    pub picture: Option<String>,
}

/// Response body for the direct-verify variant
#[derive(Debug, Serialize, Deserialize)]
pub struct GoogleVerifyResponse {
    /// Application bearer token
    pub token: String,
    /// The signed-in user
    pub user: UserResponse,
}

/// Google verification routes implementation
pub struct AuthRoutes;

impl AuthRoutes {
    /// Create the verify route, un-prefixed; the route assembly nests it
    /// under `/auth` and `/api/auth`
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/google/verify", post(Self::google_verify))
            .with_state(resources)
    }

    /// POST /auth/google/verify
    async fn google_verify(
        State(resources): State<Arc<ServerResources>>,
        Json(body): Json<GoogleVerifyRequest>,
    ) -> Result<Response, AppError> {
        if body.id_token.is_empty() {
            return Err(AppError::invalid_input("id_token is required"));
        }

        // JSON delivery binding: same state machine as the redirect flow,
        // the grant code just travels in the response body
        if let Some(state) = body.state {
            let resolved = resources
                .oauth2_server
                .resolve_authorization(&state, IdentityAssertion::IdToken(body.id_token))
                .await?;
            return Ok(Json(resolved).into_response());
        }

        let profile = resources
            .verifier
            .verify_id_token(&body.id_token)
            .await
            .map_err(|e| {
                tracing::warn!("direct id token verification failed: {e:#}");
                AppError::assertion_verification_failed("Identity token verification failed")
            })?;

        let user = resources
            .database
            .find_or_create_google_user(&profile)
            .await
            .map_err(|e| {
                tracing::error!("identity upsert failed: {e:#}");
                AppError::identity_resolution_failed("Failed to persist resolved identity")
            })?;

        let token = resources
            .auth_manager
            .generate_token(&user)
            .map_err(|e| AppError::internal(format!("Failed to generate token: {e}")))?;

        Ok(Json(GoogleVerifyResponse {
            token,
            user: UserResponse {
                id: user.id.to_string(),
                email: user.email,
                name: user.name,
                picture: user.picture,
            },
        })
        .into_response())
    }
}
