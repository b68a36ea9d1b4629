// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Integration tests for the relay HTTP API.
//!
//! Uses `axum_test::TestServer` — no real TCP needed.

use std::sync::Arc;

use axum::http::header::{AUTHORIZATION, COOKIE, SET_COOKIE};
use axum::http::{HeaderValue, StatusCode};
use axum_test::TestServer;
use serde_json::{json, Value};

use guildrelay::auth::{ClientMeta, Identity, Role, TokenPair};
use guildrelay::config::RelayConfig;
use guildrelay::relay::handshake::sign_agent_proof;
use guildrelay::relay::registry::RelayRole;
use guildrelay::state::AppState;
use guildrelay::test_support::{test_config, test_state, TEST_AGENT_SECRET};
use guildrelay::transport::build_router;

fn server(state: Arc<AppState>) -> anyhow::Result<TestServer> {
    TestServer::new(build_router(state))
}

fn bearer(token: &str) -> anyhow::Result<HeaderValue> {
    Ok(HeaderValue::from_str(&format!("Bearer {token}"))?)
}

async fn login(state: &AppState, role: Role) -> anyhow::Result<TokenPair> {
    let identity = Identity { subject: "u1".to_owned(), external_id: "111".to_owned(), role };
    Ok(state.authority.login(&identity, &ClientMeta::default()).await?)
}

/// Register an authenticated agent directly on the relay.
fn attach_agent(state: &AppState) -> tokio::sync::mpsc::Receiver<String> {
    let (id, rx) = state.relay.open();
    let proof = sign_agent_proof(TEST_AGENT_SECRET, "bot", "1700000000");
    state.relay.authenticate(id, RelayRole::Agent, &proof);
    rx
}

// -- Health -------------------------------------------------------------------

#[tokio::test]
async fn health_reports_relay_counts() -> anyhow::Result<()> {
    let state = test_state(test_config())?;
    let _agent = attach_agent(&state);
    let server = server(state)?;

    let resp = server.get("/api/v1/health").await;
    resp.assert_status(StatusCode::OK);
    let body: Value = resp.json();
    assert_eq!(
        body,
        json!({"status": "running", "agentConnected": true, "panels": 0, "connections": 1})
    );
    Ok(())
}

// -- Refresh ------------------------------------------------------------------

#[tokio::test]
async fn refresh_via_body_rotates_and_sets_cookie() -> anyhow::Result<()> {
    let state = test_state(test_config())?;
    let pair = login(&state, Role::User).await?;
    let server = server(Arc::clone(&state))?;

    let resp = server
        .post("/api/v1/auth/refresh")
        .json(&json!({ "refreshToken": pair.refresh_token }))
        .await;
    resp.assert_status(StatusCode::OK);
    let next: TokenPair = resp.json();
    assert_ne!(next.refresh_token, pair.refresh_token);
    assert_eq!(next.expires_in, 900);
    assert_eq!(state.authority.verify_access(&next.access_token)?.sub, "u1");

    let cookie = resp.header(SET_COOKIE);
    let cookie = cookie.to_str()?;
    assert!(cookie.starts_with(&format!("refresh_token={}", next.refresh_token)));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Strict"));
    assert!(cookie.contains("Path=/api/v1/auth"));
    assert!(!cookie.contains("Secure"));

    // Original value is spent.
    let again = server
        .post("/api/v1/auth/refresh")
        .json(&json!({ "refreshToken": pair.refresh_token }))
        .await;
    again.assert_status(StatusCode::UNAUTHORIZED);
    let body: Value = again.json();
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
    assert_eq!(body["error"]["message"], "invalid token");
    Ok(())
}

#[tokio::test]
async fn refresh_via_cookie() -> anyhow::Result<()> {
    let state = test_state(RelayConfig { secure_cookies: true, ..test_config() })?;
    let pair = login(&state, Role::Moderator).await?;
    let server = server(state)?;

    let resp = server
        .post("/api/v1/auth/refresh")
        .add_header(COOKIE, HeaderValue::from_str(&format!("refresh_token={}", pair.refresh_token))?)
        .await;
    resp.assert_status(StatusCode::OK);
    assert!(resp.header(SET_COOKIE).to_str()?.contains("Secure"));
    Ok(())
}

#[tokio::test]
async fn refresh_without_credential_is_unauthorized() -> anyhow::Result<()> {
    let server = server(test_state(test_config())?)?;
    server.post("/api/v1/auth/refresh").await.assert_status(StatusCode::UNAUTHORIZED);
    server
        .post("/api/v1/auth/refresh")
        .json(&json!({ "refreshToken": "forged" }))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn rejected_cookie_is_cleared() -> anyhow::Result<()> {
    let server = server(test_state(test_config())?)?;

    let resp = server
        .post("/api/v1/auth/refresh")
        .add_header(COOKIE, HeaderValue::from_static("refresh_token=spent"))
        .await;
    resp.assert_status(StatusCode::UNAUTHORIZED);
    let cookie = resp.header(SET_COOKIE);
    let cookie = cookie.to_str()?;
    assert!(cookie.starts_with("refresh_token=;"));
    assert!(cookie.contains("Max-Age=0"));
    Ok(())
}

#[tokio::test]
async fn stale_body_token_keeps_valid_cookie() -> anyhow::Result<()> {
    let state = test_state(test_config())?;
    let pair = login(&state, Role::User).await?;
    let server = server(Arc::clone(&state))?;

    let resp = server
        .post("/api/v1/auth/refresh")
        .add_header(COOKIE, HeaderValue::from_str(&format!("refresh_token={}", pair.refresh_token))?)
        .json(&json!({ "refreshToken": "stale" }))
        .await;
    resp.assert_status(StatusCode::UNAUTHORIZED);
    assert!(resp.headers().get(SET_COOKIE).is_none());

    // The cookie's credential is still live.
    let resp = server
        .post("/api/v1/auth/refresh")
        .add_header(COOKIE, HeaderValue::from_str(&format!("refresh_token={}", pair.refresh_token))?)
        .await;
    resp.assert_status(StatusCode::OK);
    Ok(())
}

// -- Me / logout --------------------------------------------------------------

#[tokio::test]
async fn me_requires_valid_bearer() -> anyhow::Result<()> {
    let state = test_state(test_config())?;
    let pair = login(&state, Role::Admin).await?;
    let server = server(state)?;

    server.get("/api/v1/auth/me").await.assert_status(StatusCode::UNAUTHORIZED);
    server
        .get("/api/v1/auth/me")
        .add_header(AUTHORIZATION, bearer("not-a-token")?)
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    let resp = server.get("/api/v1/auth/me").add_header(AUTHORIZATION, bearer(&pair.access_token)?).await;
    resp.assert_status(StatusCode::OK);
    let body: Value = resp.json();
    assert_eq!(body, json!({"id": "u1", "externalId": "111", "role": "ADMIN"}));
    Ok(())
}

#[tokio::test]
async fn logout_revokes_presented_credential() -> anyhow::Result<()> {
    let state = test_state(test_config())?;
    let pair = login(&state, Role::User).await?;
    let server = server(Arc::clone(&state))?;

    let resp = server
        .post("/api/v1/auth/logout")
        .add_header(AUTHORIZATION, bearer(&pair.access_token)?)
        .json(&json!({ "refreshToken": pair.refresh_token }))
        .await;
    resp.assert_status(StatusCode::OK);
    let body: Value = resp.json();
    assert_eq!(body, json!({"ok": true}));
    assert!(resp.header(SET_COOKIE).to_str()?.contains("Max-Age=0"));

    assert!(state.authority.redeem_refresh(&pair.refresh_token).await.is_err());
    Ok(())
}

#[tokio::test]
async fn logout_without_credential_revokes_all() -> anyhow::Result<()> {
    let state = test_state(test_config())?;
    let first = login(&state, Role::User).await?;
    let second = login(&state, Role::User).await?;
    let server = server(Arc::clone(&state))?;

    server
        .post("/api/v1/auth/logout")
        .add_header(AUTHORIZATION, bearer(&first.access_token)?)
        .await
        .assert_status(StatusCode::OK);

    assert!(state.authority.redeem_refresh(&first.refresh_token).await.is_err());
    assert!(state.authority.redeem_refresh(&second.refresh_token).await.is_err());
    Ok(())
}

// -- Commands -----------------------------------------------------------------

#[tokio::test]
async fn command_without_agent_is_unavailable() -> anyhow::Result<()> {
    let state = test_state(test_config())?;
    let pair = login(&state, Role::Owner).await?;
    let server = server(state)?;

    let resp = server
        .post("/api/v1/commands/stats")
        .add_header(AUTHORIZATION, bearer(&pair.access_token)?)
        .await;
    resp.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = resp.json();
    assert_eq!(body["error"]["code"], "AGENT_UNAVAILABLE");
    Ok(())
}

#[tokio::test]
async fn command_reaches_agent() -> anyhow::Result<()> {
    let state = test_state(test_config())?;
    let mut agent = attach_agent(&state);
    let _handshake_reply = agent.try_recv()?;
    let pair = login(&state, Role::Moderator).await?;
    let server = server(state)?;

    let resp = server
        .post("/api/v1/commands/send-message")
        .add_header(AUTHORIZATION, bearer(&pair.access_token)?)
        .json(&json!({ "channelId": "42", "content": "hello", "embed": { "title": "t" } }))
        .await;
    resp.assert_status(StatusCode::OK);
    let body: Value = resp.json();
    assert_eq!(body, json!({"delivered": true}));

    let frame: Value = serde_json::from_str(&agent.try_recv()?)?;
    assert_eq!(
        frame,
        json!({"command": "message:send", "data": {"channelId": "42", "content": "hello", "embed": {"title": "t"}}})
    );
    Ok(())
}

#[yare::parameterized(
    user_reload_module = { Role::User, "/api/v1/commands/reload-module", StatusCode::FORBIDDEN },
    moderator_reload_module = { Role::Moderator, "/api/v1/commands/reload-module", StatusCode::FORBIDDEN },
    admin_reload_module = { Role::Admin, "/api/v1/commands/reload-module", StatusCode::OK },
    owner_reload_command = { Role::Owner, "/api/v1/commands/reload-command", StatusCode::OK },
    moderator_reload_command = { Role::Moderator, "/api/v1/commands/reload-command", StatusCode::FORBIDDEN },
)]
#[test_macro(tokio::test)]
async fn role_guard(role: Role, path: &str, expected: StatusCode) -> anyhow::Result<()> {
    let state = test_state(test_config())?;
    let _agent = attach_agent(&state);
    let pair = login(&state, role).await?;
    let server = server(state)?;

    let resp = server
        .post(path)
        .add_header(AUTHORIZATION, bearer(&pair.access_token)?)
        .json(&json!({ "name": "music" }))
        .await;
    resp.assert_status(expected);
    Ok(())
}
