// ABOUTME: OAuth 2.0 authorization session and grant management
// ABOUTME: Begin/resolve/redeem state machine with single-use, TTL-bounded records
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Mercado AI

use super::models::{
    AuthorizationSession, AuthorizeRequest, Grant, IdentityAssertion, OAuth2Error,
    ResolvedAuthorization, TokenRequest, TokenResponse,
};
use super::pkce::{self, CodeChallengeMethod, PkceChallenge};
use super::store::{ExpiringStore, StoreConfig};
use crate::auth::AuthManager;
use crate::database::Database;
use crate::errors::{AppError, AppResult};
use crate::google::IdentityVerifier;
use anyhow::Result;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use ring::rand::{SecureRandom, SystemRandom};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Authorization session lifetime. Long enough for a human to complete the
/// external sign-in.
const SESSION_TTL: Duration = Duration::from_secs(600);

/// Grant lifetime. A grant is a live bearer secret in transit over a URL,
/// so its exposure window is kept far below the session TTL.
const GRANT_TTL: Duration = Duration::from_secs(60);

/// Grant code entropy in bytes (256 bits)
const GRANT_CODE_BYTES: usize = 32;

/// Scopes stamped on issued application tokens
const TOKEN_SCOPE: &str = "openid email profile";

/// OAuth 2.0 authorization broker between Google Sign-In and API clients.
///
/// Owns the two volatile stores exclusively: sessions keyed by client
/// `state`, grants keyed by their code. The two keyspaces never mix — a
/// session lookup can only ever touch the session store, a redemption only
/// the grant store.
pub struct OAuth2AuthorizationServer {
    sessions: ExpiringStore<AuthorizationSession>,
    grants: ExpiringStore<Grant>,
    verifier: Arc<dyn IdentityVerifier>,
    database: Arc<Database>,
    auth_manager: Arc<AuthManager>,
    rng: SystemRandom,
}

impl OAuth2AuthorizationServer {
    /// Create a broker with default store configuration (background sweep
    /// every 5 minutes). Must be called from within a tokio runtime.
    #[must_use]
    pub fn new(
        database: Arc<Database>,
        auth_manager: Arc<AuthManager>,
        verifier: Arc<dyn IdentityVerifier>,
    ) -> Self {
        Self::with_store_config(database, auth_manager, verifier, &StoreConfig::default())
    }

    /// Create a broker with explicit store configuration (tests disable the
    /// background sweep)
    #[must_use]
    pub fn with_store_config(
        database: Arc<Database>,
        auth_manager: Arc<AuthManager>,
        verifier: Arc<dyn IdentityVerifier>,
        store_config: &StoreConfig,
    ) -> Self {
        Self {
            sessions: ExpiringStore::new(store_config),
            grants: ExpiringStore::new(store_config),
            verifier,
            database,
            auth_manager,
            rng: SystemRandom::new(),
        }
    }

    /// Handle an authorization request (GET /oauth/authorize).
    ///
    /// Validates the request, records a session keyed by the client's
    /// `state`, and returns the Google authorization URL to redirect to. A
    /// second request with a colliding `state` overwrites the first.
    ///
    /// # Errors
    ///
    /// Returns `invalid_request` for malformed or missing fields.
    pub async fn begin_authorization(
        &self,
        request: AuthorizeRequest,
    ) -> Result<String, OAuth2Error> {
        if request.response_type != "code" {
            return Err(OAuth2Error::invalid_request(
                "Only 'code' response_type is supported",
            ));
        }

        if request.client_id.is_empty() {
            return Err(OAuth2Error::invalid_request("client_id is required"));
        }

        if request.state.is_empty() {
            return Err(OAuth2Error::invalid_request("state is required"));
        }

        match url::Url::parse(&request.redirect_uri) {
            Ok(parsed) if parsed.scheme() == "http" || parsed.scheme() == "https" => {}
            _ => {
                return Err(OAuth2Error::invalid_request(
                    "redirect_uri must be a well-formed absolute URI",
                ));
            }
        }

        let pkce = Self::parse_pkce(&request)?;

        let session = AuthorizationSession {
            state: request.state.clone(),
            redirect_uri: request.redirect_uri,
            pkce,
        };
        self.sessions
            .put(request.state.clone(), session, SESSION_TTL)
            .await;

        tracing::debug!(
            client_id = %request.client_id,
            pkce = request.code_challenge.is_some(),
            "authorization session opened"
        );

        Ok(self.verifier.authorization_url(&request.state))
    }

    /// Consume the session for `state` and mint a grant for the identity
    /// proven by `assertion`.
    ///
    /// The session is deleted before any external work happens, so a second
    /// resolution for the same `state` fails even while the first is still
    /// in flight. An unknown, expired, and already-consumed `state` all
    /// produce the same failure.
    ///
    /// # Errors
    ///
    /// - [`AppError::session_not_found`] for an unusable `state`
    /// - `AssertionVerificationFailed` when Google rejects the proof
    /// - `IdentityResolutionFailed` when the local upsert fails
    pub async fn resolve_authorization(
        &self,
        state: &str,
        assertion: IdentityAssertion,
    ) -> AppResult<ResolvedAuthorization> {
        let session = self
            .sessions
            .take_once(state)
            .await
            .ok_or_else(AppError::session_not_found)?;

        let profile = match assertion {
            IdentityAssertion::AuthorizationCode(code) => {
                let tokens = self.verifier.exchange_code(&code).await.map_err(|e| {
                    tracing::warn!("upstream code exchange failed: {e:#}");
                    AppError::assertion_verification_failed("Authorization code exchange failed")
                })?;
                let id_token = tokens.id_token.ok_or_else(|| {
                    AppError::assertion_verification_failed("Upstream response carried no id token")
                })?;
                self.verify_assertion(&id_token).await?
            }
            IdentityAssertion::IdToken(id_token) => self.verify_assertion(&id_token).await?,
        };

        let user = self
            .database
            .find_or_create_google_user(&profile)
            .await
            .map_err(|e| {
                tracing::error!("identity upsert failed for subject: {e:#}");
                AppError::identity_resolution_failed("Failed to persist resolved identity")
            })?;

        // The session's challenge travels onto the grant unchanged
        let code = self.mint_grant(user.id, session.pkce).await?;

        tracing::info!(user_id = %user.id, "authorization session resolved");

        Ok(ResolvedAuthorization {
            redirect_url: session.redirect_uri,
            code,
            state: state.to_owned(),
        })
    }

    /// Handle a token request (POST /oauth/token)
    ///
    /// # Errors
    ///
    /// Returns `invalid_request` for malformed requests and `invalid_grant`
    /// for unusable codes or failed PKCE validation.
    pub async fn token(&self, request: TokenRequest) -> Result<TokenResponse, OAuth2Error> {
        if request.grant_type != "authorization_code" {
            return Err(OAuth2Error::invalid_request(
                "Only 'authorization_code' grant_type is supported",
            ));
        }

        let code = request
            .code
            .ok_or_else(|| OAuth2Error::invalid_request("Missing authorization code"))?;

        let grant = self
            .redeem_grant(&code, request.code_verifier.as_deref())
            .await?;

        let user = self
            .database
            .get_user(grant.user_id)
            .await
            .map_err(|e| {
                tracing::error!("user lookup failed during redemption: {e:#}");
                OAuth2Error::invalid_request("Failed to load user")
            })?
            .ok_or_else(|| OAuth2Error::invalid_grant("User not found"))?;

        let access_token = self.auth_manager.generate_token(&user).map_err(|e| {
            tracing::error!("access token generation failed: {e:#}");
            OAuth2Error::invalid_request("Failed to generate access token")
        })?;

        Ok(TokenResponse {
            access_token,
            token_type: "Bearer".to_owned(),
            expires_in: self.auth_manager.expires_in_secs(),
            scope: Some(TOKEN_SCOPE.to_owned()),
        })
    }

    /// Mint a one-time grant bound to a resolved identity.
    ///
    /// The code is freshly drawn from the system CSPRNG — it is a bearer
    /// secret.
    ///
    /// # Errors
    ///
    /// Returns an error if the system RNG fails; the broker cannot mint
    /// secure codes without it.
    pub async fn mint_grant(
        &self,
        user_id: Uuid,
        pkce: Option<PkceChallenge>,
    ) -> AppResult<String> {
        let code = self.generate_code()?;

        let grant = Grant {
            code: code.clone(),
            user_id,
            pkce,
        };
        self.grants.put(code.clone(), grant, GRANT_TTL).await;

        Ok(code)
    }

    /// Redeem a grant exactly once.
    ///
    /// The grant is removed from its store before any validation happens:
    /// a concurrent or retried redemption of the same code finds nothing,
    /// and a grant that fails PKCE validation is already burned.
    ///
    /// # Errors
    ///
    /// Returns `invalid_grant` for an unusable code, a missing verifier on
    /// a PKCE-bound grant, or a verifier mismatch.
    pub async fn redeem_grant(
        &self,
        code: &str,
        code_verifier: Option<&str>,
    ) -> Result<Grant, OAuth2Error> {
        let grant = self
            .grants
            .take_once(code)
            .await
            .ok_or_else(|| OAuth2Error::invalid_grant("Invalid or expired authorization code"))?;

        if let Some(pkce) = &grant.pkce {
            let verifier = code_verifier
                .ok_or_else(|| OAuth2Error::invalid_grant("code_verifier is required (PKCE)"))?;

            if !pkce::is_valid_verifier(verifier) {
                return Err(OAuth2Error::invalid_grant(
                    "code_verifier must be 43-128 characters of [A-Za-z0-9-._~]",
                ));
            }

            if !pkce::verifier_matches(&pkce.challenge, verifier, pkce.method) {
                tracing::warn!("PKCE verification failed during grant redemption");
                return Err(OAuth2Error::invalid_grant("Invalid code verifier"));
            }
        }
        // A grant minted without a challenge ignores any supplied verifier:
        // PKCE is opt-in, enforced only when originally declared

        Ok(grant)
    }

    /// Number of live authorization sessions (test observability)
    pub async fn session_count(&self) -> usize {
        self.sessions.len().await
    }

    /// Number of live grants (test observability)
    pub async fn grant_count(&self) -> usize {
        self.grants.len().await
    }

    async fn verify_assertion(&self, id_token: &str) -> AppResult<crate::google::GoogleProfile> {
        self.verifier.verify_id_token(id_token).await.map_err(|e| {
            tracing::warn!("id token verification failed: {e:#}");
            AppError::assertion_verification_failed("Identity token verification failed")
        })
    }

    /// Draw a fresh URL-safe grant code from the system CSPRNG
    fn generate_code(&self) -> AppResult<String> {
        let mut bytes = vec![0u8; GRANT_CODE_BYTES];
        self.rng.fill(&mut bytes).map_err(|_| {
            tracing::error!("system RNG failure - cannot generate secure random bytes");
            AppError::internal("System RNG failure")
        })?;
        Ok(URL_SAFE_NO_PAD.encode(&bytes))
    }

    fn parse_pkce(request: &AuthorizeRequest) -> Result<Option<PkceChallenge>, OAuth2Error> {
        let Some(challenge) = request.code_challenge.clone() else {
            return Ok(None);
        };

        let method = request
            .code_challenge_method
            .as_deref()
            .ok_or_else(|| {
                OAuth2Error::invalid_request(
                    "code_challenge_method is required when code_challenge is present",
                )
            })?
            .parse::<CodeChallengeMethod>()
            .map_err(|e| OAuth2Error::invalid_request(&e.to_string()))?;

        // Challenge length bounds follow the verifier bounds: an S256
        // challenge is always 43 chars, a plain challenge IS a verifier
        if !(43..=128).contains(&challenge.len()) {
            return Err(OAuth2Error::invalid_request(
                "code_challenge must be between 43 and 128 characters",
            ));
        }

        Ok(Some(PkceChallenge { challenge, method }))
    }
}
