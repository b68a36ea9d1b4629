// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Token endpoints: refresh, logout and the caller's identity.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};

use crate::auth::{AccessClaims, ClientMeta, Role, TokenPair};
use crate::error::{auth_error_response, RelayError};
use crate::state::AppState;

pub const REFRESH_COOKIE: &str = "refresh_token";
const COOKIE_PATH: &str = "/api/v1/auth";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    #[serde(default)]
    pub refresh_token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub ok: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub id: String,
    pub external_id: String,
    pub role: Role,
}

/// Build the HttpOnly refresh cookie.
pub fn refresh_cookie(value: String, max_age_secs: u64, secure: bool) -> Cookie<'static> {
    let max_age = i64::try_from(max_age_secs).unwrap_or(i64::MAX);
    Cookie::build((REFRESH_COOKIE, value))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Strict)
        .path(COOKIE_PATH)
        .max_age(time::Duration::seconds(max_age))
        .build()
}

fn clear_cookie(secure: bool) -> Cookie<'static> {
    refresh_cookie(String::new(), 0, secure)
}

/// Where a presented refresh credential came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RefreshSource {
    Body,
    Cookie,
}

/// Refresh credential from the JSON body, falling back to the cookie.
///
/// An empty body is fine; a non-empty body that is not JSON is a bad request.
fn presented_refresh(
    jar: &CookieJar,
    body: &Bytes,
) -> Result<Option<(String, RefreshSource)>, RelayError> {
    let req: RefreshRequest = if body.iter().all(u8::is_ascii_whitespace) {
        RefreshRequest::default()
    } else {
        serde_json::from_slice(body).map_err(|_| RelayError::BadRequest)?
    };
    let from_body = req.refresh_token.filter(|t| !t.is_empty()).map(|t| (t, RefreshSource::Body));
    Ok(from_body.or_else(|| {
        jar.get(REFRESH_COOKIE)
            .map(|c| c.value().to_owned())
            .filter(|v| !v.is_empty())
            .map(|v| (v, RefreshSource::Cookie))
    }))
}

fn client_meta(headers: &HeaderMap) -> ClientMeta {
    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok()).map(str::to_owned);
    let ip = header("x-forwarded-for")
        .and_then(|v| v.split(',').next().map(|s| s.trim().to_owned()))
        .or_else(|| header("x-real-ip"));
    ClientMeta { ip, user_agent: header("user-agent") }
}

/// `POST /api/v1/auth/refresh`
pub async fn refresh(State(s): State<Arc<AppState>>, jar: CookieJar, body: Bytes) -> Response {
    let (token, source) = match presented_refresh(&jar, &body) {
        Ok(Some(presented)) => presented,
        Ok(None) => return RelayError::Unauthorized.to_http_response("invalid token"),
        Err(code) => return code.to_http_response("malformed request body"),
    };

    match s.authority.redeem_refresh(&token).await {
        Ok(pair) => {
            let cookie = refresh_cookie(
                pair.refresh_token.clone(),
                s.authority.refresh_ttl().as_secs(),
                s.config.secure_cookies,
            );
            (jar.add(cookie), Json::<TokenPair>(pair)).into_response()
        }
        Err(e) => {
            tracing::info!(err = %e, source = ?source, "refresh rejected");
            // Only a rejected cookie is cleared; a stale body token leaves it alone.
            if source == RefreshSource::Cookie && e.is_credential_error() {
                let jar = jar.add(clear_cookie(s.config.secure_cookies));
                return (jar, auth_error_response(&e)).into_response();
            }
            auth_error_response(&e)
        }
    }
}

/// `POST /api/v1/auth/logout`
pub async fn logout(
    State(s): State<Arc<AppState>>,
    Extension(claims): Extension<AccessClaims>,
    headers: HeaderMap,
    jar: CookieJar,
    body: Bytes,
) -> Response {
    let token = match presented_refresh(&jar, &body) {
        Ok(presented) => presented.map(|(t, _)| t),
        Err(code) => return code.to_http_response("malformed request body"),
    };

    if let Err(e) = s.authority.logout(&claims, token.as_deref(), &client_meta(&headers)).await {
        return auth_error_response(&e);
    }
    let jar = jar.add(clear_cookie(s.config.secure_cookies));
    (jar, Json(LogoutResponse { ok: true })).into_response()
}

/// `GET /api/v1/auth/me`
pub async fn me(Extension(claims): Extension<AccessClaims>) -> impl IntoResponse {
    Json(MeResponse { id: claims.sub, external_id: claims.eid, role: claims.role })
}
