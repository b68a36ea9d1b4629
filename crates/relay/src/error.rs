// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::auth::AuthError;

/// Error codes for the relay HTTP API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelayError {
    Unauthorized,
    Forbidden,
    BadRequest,
    AgentUnavailable,
    Internal,
}

impl RelayError {
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Unauthorized => 401,
            Self::Forbidden => 403,
            Self::BadRequest => 400,
            Self::AgentUnavailable => 503,
            Self::Internal => 500,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Forbidden => "FORBIDDEN",
            Self::BadRequest => "BAD_REQUEST",
            Self::AgentUnavailable => "AGENT_UNAVAILABLE",
            Self::Internal => "INTERNAL",
        }
    }

    pub fn to_error_body(&self, message: impl Into<String>) -> ErrorBody {
        ErrorBody { code: self.as_str().to_owned(), message: message.into() }
    }

    pub fn to_http_response(&self, message: impl Into<String>) -> Response {
        let status =
            StatusCode::from_u16(self.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = ErrorResponse { error: self.to_error_body(message) };
        (status, Json(body)).into_response()
    }
}

impl fmt::Display for RelayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map a Token Authority failure onto the HTTP surface.
///
/// Credential failures collapse into one opaque 401 so unauthenticated callers
/// cannot tell a forged token from an expired or already-used one. Storage
/// and signing failures are server errors, never authentication failures.
impl From<&AuthError> for RelayError {
    fn from(err: &AuthError) -> Self {
        match err {
            AuthError::CredentialNotFound
            | AuthError::CredentialExpired
            | AuthError::InvalidToken => Self::Unauthorized,
            AuthError::Persistence(_) | AuthError::Signing(_) => Self::Internal,
        }
    }
}

/// Render an [`AuthError`] as the public HTTP response.
pub fn auth_error_response(err: &AuthError) -> Response {
    let code = RelayError::from(err);
    match code {
        RelayError::Internal => {
            tracing::error!(err = %err, "token authority failure");
            code.to_http_response("internal error")
        }
        _ => code.to_http_response("invalid token"),
    }
}

/// Top-level error response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

/// Error body with machine-readable code and human-readable message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
