// ABOUTME: HTTP-level tests for the assembled router
// ABOUTME: Exercises route wiring, prefixes, redirects, and error payloads
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Mercado AI

use anyhow::Result;
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use mercado_server::auth::AuthManager;
use mercado_server::config::environment::{Environment, GoogleOAuthConfig, LogLevel, ServerConfig};
use mercado_server::database::Database;
use mercado_server::google::{GoogleProfile, GoogleTokens, IdentityVerifier};
use mercado_server::oauth2_server::store::StoreConfig;
use mercado_server::oauth2_server::OAuth2AuthorizationServer;
use mercado_server::providers::MockProvider;
use mercado_server::routes::{router, ServerResources};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower::ServiceExt;

const TEST_JWT_SECRET: &str = "test-jwt-secret-0123456789abcdef-0123456789abcdef";

struct MockVerifier;

#[async_trait]
impl IdentityVerifier for MockVerifier {
    fn authorization_url(&self, state: &str) -> String {
        format!("https://accounts.example/o/oauth2/auth?state={state}")
    }

    async fn exchange_code(&self, _code: &str) -> Result<GoogleTokens> {
        Ok(GoogleTokens {
            access_token: Some("ya29.mock".to_owned()),
            id_token: Some("mock-id-token".to_owned()),
            expires_in: Some(3600),
            scope: None,
        })
    }

    async fn verify_id_token(&self, id_token: &str) -> Result<GoogleProfile> {
        if id_token == "mock-id-token" {
            Ok(GoogleProfile {
                sub: "g-123".to_owned(),
                email: Some("ada@example.com".to_owned()),
                name: Some("Ada".to_owned()),
                picture: None,
            })
        } else {
            Err(anyhow::anyhow!("invalid id token"))
        }
    }
}

fn test_config() -> ServerConfig {
    ServerConfig {
        http_port: 0,
        base_url: "http://localhost:8080".to_owned(),
        database_url: "sqlite::memory:".to_owned(),
        jwt_secret: TEST_JWT_SECRET.to_owned(),
        jwt_expires_days: 7,
        google: GoogleOAuthConfig {
            client_id: "client-id".to_owned(),
            client_secret: "client-secret".to_owned(),
            redirect_uri: "http://localhost:8080/oauth/google/callback".to_owned(),
        },
        cors_allowed_origins: "*".to_owned(),
        environment: Environment::Testing,
        log_level: LogLevel::Info,
    }
}

async fn test_app() -> Result<(axum::Router, Arc<ServerResources>)> {
    let database = Arc::new(Database::new("sqlite::memory:").await?);
    let auth_manager = Arc::new(AuthManager::new(TEST_JWT_SECRET.as_bytes(), 7));
    let verifier = Arc::new(MockVerifier);
    let oauth2_server = Arc::new(OAuth2AuthorizationServer::with_store_config(
        database.clone(),
        auth_manager.clone(),
        verifier.clone(),
        &StoreConfig {
            max_entries: 100,
            sweep_interval: Duration::from_secs(300),
            enable_background_sweep: false,
        },
    ));

    let resources = Arc::new(ServerResources {
        database,
        auth_manager,
        oauth2_server,
        verifier,
        provider: Arc::new(MockProvider::new()),
        config: Arc::new(test_config()),
        started_at: Instant::now(),
    });

    Ok((router(resources.clone()), resources))
}

async fn body_json(response: axum::response::Response) -> Result<serde_json::Value> {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[tokio::test]
async fn test_health_endpoint() -> Result<()> {
    let (app, _resources) = test_app().await?;

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty())?)
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await?;
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["environment"], "testing");

    Ok(())
}

#[tokio::test]
async fn test_authorize_redirects_to_google() -> Result<()> {
    let (app, _resources) = test_app().await?;

    let uri = "/oauth/authorize?response_type=code&client_id=c1&redirect_uri=https%3A%2F%2Fclient.example%2Fcb&state=s1";
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty())?)
        .await?;

    assert_eq!(response.status(), StatusCode::FOUND);
    let location = response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    assert!(location.starts_with("https://accounts.example/"));
    assert!(location.contains("state=s1"));

    Ok(())
}

#[tokio::test]
async fn test_authorize_is_also_mounted_under_auth_prefixes() -> Result<()> {
    let (app, _resources) = test_app().await?;

    for prefix in ["/auth", "/api/auth"] {
        let uri = format!(
            "{prefix}/authorize?response_type=code&client_id=c1&redirect_uri=https%3A%2F%2Fclient.example%2Fcb&state=s-{prefix}"
        );
        let response = app
            .clone()
            .oneshot(Request::builder().uri(&uri).body(Body::empty())?)
            .await?;
        assert_eq!(response.status(), StatusCode::FOUND);
    }

    Ok(())
}

#[tokio::test]
async fn test_callback_delivers_grant_by_redirect() -> Result<()> {
    let (app, _resources) = test_app().await?;

    let authorize = "/oauth/authorize?response_type=code&client_id=c1&redirect_uri=https%3A%2F%2Fclient.example%2Fcb&state=s1";
    app.clone()
        .oneshot(Request::builder().uri(authorize).body(Body::empty())?)
        .await?;

    let callback = "/oauth/google/callback?code=upstream-code&state=s1";
    let response = app
        .oneshot(Request::builder().uri(callback).body(Body::empty())?)
        .await?;

    assert_eq!(response.status(), StatusCode::FOUND);
    let location = response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    assert!(location.starts_with("https://client.example/cb?code="));
    assert!(location.contains("state=s1"));

    Ok(())
}

#[tokio::test]
async fn test_token_endpoint_rejects_unknown_code() -> Result<()> {
    let (app, _resources) = test_app().await?;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/oauth/token")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(
                    "grant_type=authorization_code&code=never-issued",
                ))?,
        )
        .await?;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await?;
    assert_eq!(json["error"], "invalid_grant");

    Ok(())
}

#[tokio::test]
async fn test_verify_endpoint_json_binding() -> Result<()> {
    let (app, _resources) = test_app().await?;

    let authorize = "/oauth/authorize?response_type=code&client_id=c1&redirect_uri=https%3A%2F%2Fclient.example%2Fcb&state=s1";
    app.clone()
        .oneshot(Request::builder().uri(authorize).body(Body::empty())?)
        .await?;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/google/verify")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    r#"{"id_token": "mock-id-token", "state": "s1"}"#,
                ))?,
        )
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await?;
    assert_eq!(json["redirect_url"], "https://client.example/cb");
    assert_eq!(json["state"], "s1");
    assert!(json["code"].as_str().map_or(0, str::len) >= 43);

    Ok(())
}

#[tokio::test]
async fn test_verify_endpoint_direct_sign_in() -> Result<()> {
    let (app, _resources) = test_app().await?;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/google/verify")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"id_token": "mock-id-token"}"#))?,
        )
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await?;
    assert!(json["token"].as_str().is_some());
    assert_eq!(json["user"]["email"], "ada@example.com");

    Ok(())
}

#[tokio::test]
async fn test_lists_require_authentication() -> Result<()> {
    let (app, _resources) = test_app().await?;

    let response = app
        .oneshot(Request::builder().uri("/lists").body(Body::empty())?)
        .await?;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn test_lists_crud_with_bearer_token() -> Result<()> {
    let (app, resources) = test_app().await?;

    // Sign in a user and take the issued token
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/google/verify")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"id_token": "mock-id-token"}"#))?,
        )
        .await?;
    let token = body_json(response).await?["token"]
        .as_str()
        .map(str::to_owned)
        .expect("token issued");

    // Create a list
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/lists")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"title": "Groceries"}"#))?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::CREATED);
    let list = body_json(response).await?;
    let list_id = list["id"].as_str().map(str::to_owned).expect("list id");

    // Add an item
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/lists/{list_id}/items"))
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"name": "pasta", "qty": 2}"#))?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::CREATED);
    let list = body_json(response).await?;
    assert_eq!(list["items"][0]["name"], "pasta");
    assert_eq!(list["items"][0]["status"], "pending");

    // Suggestions reflect the new item
    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/lists/{list_id}/suggest"))
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await?;
    let suggestions: Vec<String> = serde_json::from_value(json["suggestions"].clone())?;
    assert!(suggestions.contains(&"salsa de tomate".to_owned()));

    drop(resources);
    Ok(())
}

#[tokio::test]
async fn test_stores_search_requires_query() -> Result<()> {
    let (app, resources) = test_app().await?;

    let user = resources
        .database
        .find_or_create_google_user(&mercado_server::google::GoogleProfile {
            sub: "g-123".to_owned(),
            email: None,
            name: None,
            picture: None,
        })
        .await?;
    let token = resources.auth_manager.generate_token(&user)?;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/stores/search")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/stores/search?q=pasta&zip=90210")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await?;
    assert_eq!(json["results"].as_array().map_or(0, Vec::len), 3);

    Ok(())
}
