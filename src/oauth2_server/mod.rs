// ABOUTME: OAuth 2.0 authorization broker between Google Sign-In and API clients
// ABOUTME: PKCE-protected authorization-code flow with volatile single-use state
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Mercado AI

//! # OAuth 2.0 Authorization Broker
//!
//! Converts a Google identity assertion into an application-scoped bearer
//! token via the authorization-code flow with PKCE. All flow state is
//! volatile and single-use: authorization sessions (keyed by client
//! `state`, 10 minute TTL) and grants (keyed by their code, 60 second TTL)
//! live in expiring in-memory stores and are consumed exactly once.

/// Session and grant state machine
pub mod endpoints;
/// Wire and record types
pub mod models;
/// PKCE challenge computation and validation (RFC 7636)
pub mod pkce;
/// Generic expiring keyed store
pub mod store;

pub use endpoints::OAuth2AuthorizationServer;
pub use models::{
    AuthorizationSession, AuthorizeRequest, Grant, IdentityAssertion, OAuth2Error,
    ResolvedAuthorization, TokenRequest, TokenResponse,
};
pub use pkce::{CodeChallengeMethod, PkceChallenge};
pub use store::{ExpiringStore, StoreConfig};
