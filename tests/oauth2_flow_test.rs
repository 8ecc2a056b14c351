// ABOUTME: End-to-end tests for the OAuth broker state machine
// ABOUTME: Begin/resolve/redeem flows, single-use semantics, and PKCE enforcement
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Mercado AI

use anyhow::Result;
use async_trait::async_trait;
use mercado_server::auth::AuthManager;
use mercado_server::database::Database;
use mercado_server::google::{GoogleProfile, GoogleTokens, IdentityVerifier};
use mercado_server::oauth2_server::pkce::{challenge_from_verifier, CodeChallengeMethod};
use mercado_server::oauth2_server::store::StoreConfig;
use mercado_server::oauth2_server::{
    AuthorizeRequest, IdentityAssertion, OAuth2AuthorizationServer, TokenRequest,
};
use std::sync::Arc;
use std::time::Duration;

const TEST_JWT_SECRET: &[u8] = b"test-jwt-secret-0123456789abcdef-0123456789abcdef";
const TEST_VERIFIER: &str = "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk";

/// Identity verifier that accepts exactly one upstream code and id token
struct MockVerifier {
    profile: GoogleProfile,
}

impl MockVerifier {
    fn new() -> Self {
        Self {
            profile: GoogleProfile {
                sub: "g-123".to_owned(),
                email: Some("ada@example.com".to_owned()),
                name: Some("Ada".to_owned()),
                picture: None,
            },
        }
    }
}

#[async_trait]
impl IdentityVerifier for MockVerifier {
    fn authorization_url(&self, state: &str) -> String {
        format!("https://accounts.example/o/oauth2/auth?state={state}")
    }

    async fn exchange_code(&self, code: &str) -> Result<GoogleTokens> {
        if code == "upstream-code" {
            Ok(GoogleTokens {
                access_token: Some("ya29.mock".to_owned()),
                id_token: Some("mock-id-token".to_owned()),
                expires_in: Some(3600),
                scope: None,
            })
        } else {
            Err(anyhow::anyhow!("unknown upstream code"))
        }
    }

    async fn verify_id_token(&self, id_token: &str) -> Result<GoogleProfile> {
        if id_token == "mock-id-token" {
            Ok(self.profile.clone())
        } else {
            Err(anyhow::anyhow!("invalid id token"))
        }
    }
}

/// Helper: broker over in-memory SQLite with the background sweeps disabled
async fn test_broker() -> Result<(OAuth2AuthorizationServer, Arc<Database>, Arc<AuthManager>)> {
    let database = Arc::new(Database::new("sqlite::memory:").await?);
    let auth_manager = Arc::new(AuthManager::new(TEST_JWT_SECRET, 7));
    let broker = OAuth2AuthorizationServer::with_store_config(
        database.clone(),
        auth_manager.clone(),
        Arc::new(MockVerifier::new()),
        &StoreConfig {
            max_entries: 100,
            sweep_interval: Duration::from_secs(300),
            enable_background_sweep: false,
        },
    );
    Ok((broker, database, auth_manager))
}

fn authorize_request(state: &str, challenge: Option<String>) -> AuthorizeRequest {
    AuthorizeRequest {
        response_type: "code".to_owned(),
        client_id: "client-1".to_owned(),
        redirect_uri: "https://client.example/cb".to_owned(),
        state: state.to_owned(),
        scope: Some("openid email profile".to_owned()),
        code_challenge_method: challenge.as_ref().map(|_| "S256".to_owned()),
        code_challenge: challenge,
    }
}

fn token_request(code: &str, verifier: Option<&str>) -> TokenRequest {
    TokenRequest {
        grant_type: "authorization_code".to_owned(),
        code: Some(code.to_owned()),
        code_verifier: verifier.map(str::to_owned),
        redirect_uri: None,
        client_id: None,
        client_secret: None,
    }
}

#[tokio::test]
async fn test_full_flow_with_pkce() -> Result<()> {
    let (broker, database, auth_manager) = test_broker().await?;
    let challenge = challenge_from_verifier(TEST_VERIFIER, CodeChallengeMethod::S256);

    // Begin: session opened, client redirected to the identity provider
    let auth_url = broker
        .begin_authorization(authorize_request("s1", Some(challenge)))
        .await
        .unwrap();
    assert!(auth_url.starts_with("https://accounts.example/"));
    assert!(auth_url.contains("state=s1"));
    assert_eq!(broker.session_count().await, 1);

    // Resolve: session consumed, grant minted, delivery targets the
    // session's redirect URI
    let resolved = broker
        .resolve_authorization("s1", IdentityAssertion::AuthorizationCode("upstream-code".into()))
        .await
        .unwrap();
    assert_eq!(resolved.redirect_url, "https://client.example/cb");
    assert_eq!(resolved.state, "s1");
    // 256 bits of entropy, base64url: at least 43 characters
    assert!(resolved.code.len() >= 43);
    assert_eq!(broker.session_count().await, 0);
    assert_eq!(broker.grant_count().await, 1);

    let location = resolved.redirect_location().unwrap();
    assert!(location.starts_with("https://client.example/cb?"));
    assert!(location.contains(&format!("code={}", resolved.code)));
    assert!(location.contains("state=s1"));

    // Redeem: grant burned, bearer token bound to the resolved identity
    let response = broker
        .token(token_request(&resolved.code, Some(TEST_VERIFIER)))
        .await
        .unwrap();
    assert_eq!(response.token_type, "Bearer");
    assert_eq!(response.expires_in, 7 * 86_400);
    assert_eq!(broker.grant_count().await, 0);

    let claims = auth_manager.validate_token(&response.access_token).unwrap();
    let user = database
        .get_user_by_google_sub("g-123")
        .await?
        .expect("user created for subject");
    assert_eq!(claims.sub, user.id.to_string());
    assert_eq!(claims.email, Some("ada@example.com".to_owned()));

    Ok(())
}

#[tokio::test]
async fn test_grant_is_single_use() -> Result<()> {
    let (broker, _database, _auth_manager) = test_broker().await?;
    let challenge = challenge_from_verifier(TEST_VERIFIER, CodeChallengeMethod::S256);

    broker
        .begin_authorization(authorize_request("s1", Some(challenge)))
        .await
        .unwrap();
    let resolved = broker
        .resolve_authorization("s1", IdentityAssertion::IdToken("mock-id-token".into()))
        .await
        .unwrap();

    let first = broker
        .token(token_request(&resolved.code, Some(TEST_VERIFIER)))
        .await;
    assert!(first.is_ok());

    let second = broker
        .token(token_request(&resolved.code, Some(TEST_VERIFIER)))
        .await;
    let err = second.unwrap_err();
    assert_eq!(err.error, "invalid_grant");

    Ok(())
}

#[tokio::test]
async fn test_concurrent_redemptions_have_single_winner() -> Result<()> {
    let (broker, _database, _auth_manager) = test_broker().await?;

    broker
        .begin_authorization(authorize_request("s1", None))
        .await
        .unwrap();
    let resolved = broker
        .resolve_authorization("s1", IdentityAssertion::IdToken("mock-id-token".into()))
        .await
        .unwrap();

    let broker = Arc::new(broker);
    let mut handles = Vec::new();
    for _ in 0..8 {
        let broker = broker.clone();
        let code = resolved.code.clone();
        handles.push(tokio::spawn(async move {
            broker.redeem_grant(&code, None).await
        }));
    }

    let mut winners = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            winners += 1;
        }
    }
    assert_eq!(winners, 1);

    Ok(())
}

#[tokio::test]
async fn test_session_is_single_use() -> Result<()> {
    let (broker, _database, _auth_manager) = test_broker().await?;

    broker
        .begin_authorization(authorize_request("s1", None))
        .await
        .unwrap();

    let first = broker
        .resolve_authorization("s1", IdentityAssertion::IdToken("mock-id-token".into()))
        .await;
    assert!(first.is_ok());

    let second = broker
        .resolve_authorization("s1", IdentityAssertion::IdToken("mock-id-token".into()))
        .await;
    let err = second.unwrap_err();
    assert_eq!(
        err.code,
        mercado_server::errors::ErrorCode::SessionNotFound
    );

    Ok(())
}

#[tokio::test]
async fn test_unknown_state_fails_without_side_effects() -> Result<()> {
    let (broker, database, _auth_manager) = test_broker().await?;

    let result = broker
        .resolve_authorization(
            "unknown-state",
            IdentityAssertion::IdToken("mock-id-token".into()),
        )
        .await;
    let err = result.unwrap_err();
    assert_eq!(
        err.code,
        mercado_server::errors::ErrorCode::SessionNotFound
    );

    // Nothing was created anywhere
    assert_eq!(broker.session_count().await, 0);
    assert_eq!(broker.grant_count().await, 0);
    assert!(database.get_user_by_google_sub("g-123").await?.is_none());

    Ok(())
}

#[tokio::test]
async fn test_rejected_assertion_burns_the_session() -> Result<()> {
    let (broker, _database, _auth_manager) = test_broker().await?;

    broker
        .begin_authorization(authorize_request("s1", None))
        .await
        .unwrap();

    let result = broker
        .resolve_authorization("s1", IdentityAssertion::IdToken("forged-token".into()))
        .await;
    assert_eq!(
        result.unwrap_err().code,
        mercado_server::errors::ErrorCode::AssertionVerificationFailed
    );

    // The session was consumed before verification; the flow must restart
    let retry = broker
        .resolve_authorization("s1", IdentityAssertion::IdToken("mock-id-token".into()))
        .await;
    assert_eq!(
        retry.unwrap_err().code,
        mercado_server::errors::ErrorCode::SessionNotFound
    );

    Ok(())
}

#[tokio::test]
async fn test_pkce_optional_grant_ignores_verifier() -> Result<()> {
    let (broker, _database, _auth_manager) = test_broker().await?;

    // No challenge declared at begin time
    broker
        .begin_authorization(authorize_request("s1", None))
        .await
        .unwrap();
    let resolved = broker
        .resolve_authorization("s1", IdentityAssertion::IdToken("mock-id-token".into()))
        .await
        .unwrap();

    // Redeems with no verifier
    assert!(broker.redeem_grant(&resolved.code, None).await.is_ok());

    // A second flow: redeems with an arbitrary verifier, which is ignored
    broker
        .begin_authorization(authorize_request("s2", None))
        .await
        .unwrap();
    let resolved = broker
        .resolve_authorization("s2", IdentityAssertion::IdToken("mock-id-token".into()))
        .await
        .unwrap();
    assert!(broker
        .redeem_grant(&resolved.code, Some("completely-arbitrary-verifier-value-12345678"))
        .await
        .is_ok());

    Ok(())
}

#[tokio::test]
async fn test_pkce_enforced_when_declared() -> Result<()> {
    let (broker, _database, _auth_manager) = test_broker().await?;
    let challenge = challenge_from_verifier(TEST_VERIFIER, CodeChallengeMethod::S256);

    // Omitted verifier
    broker
        .begin_authorization(authorize_request("s1", Some(challenge.clone())))
        .await
        .unwrap();
    let resolved = broker
        .resolve_authorization("s1", IdentityAssertion::IdToken("mock-id-token".into()))
        .await
        .unwrap();
    let err = broker.redeem_grant(&resolved.code, None).await.unwrap_err();
    assert_eq!(err.error, "invalid_grant");

    // Wrong verifier
    broker
        .begin_authorization(authorize_request("s2", Some(challenge)))
        .await
        .unwrap();
    let resolved = broker
        .resolve_authorization("s2", IdentityAssertion::IdToken("mock-id-token".into()))
        .await
        .unwrap();
    let wrong = "wrong-verifier-wrong-verifier-wrong-verifier-wrong";
    let err = broker
        .redeem_grant(&resolved.code, Some(wrong))
        .await
        .unwrap_err();
    assert_eq!(err.error, "invalid_grant");

    Ok(())
}

#[tokio::test]
async fn test_begin_validation_failures() -> Result<()> {
    let (broker, _database, _auth_manager) = test_broker().await?;

    // Unsupported response_type
    let mut request = authorize_request("s1", None);
    request.response_type = "token".to_owned();
    assert_eq!(
        broker.begin_authorization(request).await.unwrap_err().error,
        "invalid_request"
    );

    // Relative redirect URI
    let mut request = authorize_request("s1", None);
    request.redirect_uri = "/relative/path".to_owned();
    assert_eq!(
        broker.begin_authorization(request).await.unwrap_err().error,
        "invalid_request"
    );

    // Challenge without a method
    let mut request = authorize_request("s1", None);
    request.code_challenge = Some("a".repeat(43));
    request.code_challenge_method = None;
    assert_eq!(
        broker.begin_authorization(request).await.unwrap_err().error,
        "invalid_request"
    );

    // Unsupported method
    let mut request = authorize_request("s1", None);
    request.code_challenge = Some("a".repeat(43));
    request.code_challenge_method = Some("S512".to_owned());
    assert_eq!(
        broker.begin_authorization(request).await.unwrap_err().error,
        "invalid_request"
    );

    // Nothing stored after any of the failures
    assert_eq!(broker.session_count().await, 0);

    Ok(())
}

#[tokio::test]
async fn test_colliding_state_overwrites() -> Result<()> {
    let (broker, _database, _auth_manager) = test_broker().await?;

    let mut first = authorize_request("s1", None);
    first.redirect_uri = "https://first.example/cb".to_owned();
    broker.begin_authorization(first).await.unwrap();

    let mut second = authorize_request("s1", None);
    second.redirect_uri = "https://second.example/cb".to_owned();
    broker.begin_authorization(second).await.unwrap();

    assert_eq!(broker.session_count().await, 1);

    // Last writer wins
    let resolved = broker
        .resolve_authorization("s1", IdentityAssertion::IdToken("mock-id-token".into()))
        .await
        .unwrap();
    assert_eq!(resolved.redirect_url, "https://second.example/cb");

    Ok(())
}

#[tokio::test]
async fn test_plain_method_round_trip() -> Result<()> {
    let (broker, _database, _auth_manager) = test_broker().await?;

    let verifier = "plain-verifier-plain-verifier-plain-verifier-01";
    let mut request = authorize_request("s1", Some(verifier.to_owned()));
    request.code_challenge_method = Some("plain".to_owned());
    broker.begin_authorization(request).await.unwrap();

    let resolved = broker
        .resolve_authorization("s1", IdentityAssertion::IdToken("mock-id-token".into()))
        .await
        .unwrap();

    assert!(broker
        .redeem_grant(&resolved.code, Some(verifier))
        .await
        .is_ok());

    Ok(())
}

#[tokio::test]
async fn test_token_endpoint_request_validation() -> Result<()> {
    let (broker, _database, _auth_manager) = test_broker().await?;

    // Unsupported grant type
    let mut request = token_request("any-code", None);
    request.grant_type = "client_credentials".to_owned();
    assert_eq!(broker.token(request).await.unwrap_err().error, "invalid_request");

    // Missing code
    let mut request = token_request("", None);
    request.code = None;
    assert_eq!(broker.token(request).await.unwrap_err().error, "invalid_request");

    // Unknown code
    let request = token_request("never-issued", None);
    assert_eq!(broker.token(request).await.unwrap_err().error, "invalid_grant");

    Ok(())
}

#[tokio::test]
async fn test_repeat_sign_in_reuses_user() -> Result<()> {
    let (broker, database, _auth_manager) = test_broker().await?;

    broker
        .begin_authorization(authorize_request("s1", None))
        .await
        .unwrap();
    broker
        .resolve_authorization("s1", IdentityAssertion::IdToken("mock-id-token".into()))
        .await
        .unwrap();

    let first = database
        .get_user_by_google_sub("g-123")
        .await?
        .expect("user exists");

    broker
        .begin_authorization(authorize_request("s2", None))
        .await
        .unwrap();
    broker
        .resolve_authorization("s2", IdentityAssertion::IdToken("mock-id-token".into()))
        .await
        .unwrap();

    let second = database
        .get_user_by_google_sub("g-123")
        .await?
        .expect("user exists");

    // The upsert is idempotent on the Google subject
    assert_eq!(first.id, second.id);

    Ok(())
}
