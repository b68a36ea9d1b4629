// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Token Authority: short-lived signed access tokens plus single-use opaque
//! refresh credentials, backed by a pluggable [`store::CredentialStore`].

pub mod authority;
pub mod file;
pub mod memory;
pub mod store;
pub mod sweep;
pub mod token;

use serde::{Deserialize, Serialize};

pub use authority::TokenAuthority;

/// Coarse role carried in every access token. Ordered by privilege.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    User,
    Moderator,
    Admin,
    Owner,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "USER",
            Self::Moderator => "MODERATOR",
            Self::Admin => "ADMIN",
            Self::Owner => "OWNER",
        }
    }

    /// Whether this role grants at least the privileges of `required`.
    pub fn at_least(&self, required: Role) -> bool {
        *self >= required
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A verified identity, as handed to [`TokenAuthority::login`] by the
/// external login flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Internal user id.
    pub subject: String,
    /// Stable id on the chat platform.
    pub external_id: String,
    pub role: Role,
}

/// Client metadata recorded on sessions and audit entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientMeta {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

/// Access + refresh credentials returned by login and refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: u64,
}

/// Verified access token payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: String,
    /// External (chat platform) identity id.
    pub eid: String,
    pub role: Role,
    pub iat: u64,
    pub exp: u64,
    /// Random nonce; distinguishes tokens minted in the same second.
    pub jti: String,
}

impl AccessClaims {
    pub fn identity(&self) -> Identity {
        Identity { subject: self.sub.clone(), external_id: self.eid.clone(), role: self.role }
    }
}

/// Token Authority failures.
///
/// The credential variants are kept apart for logs and audit; the HTTP and
/// relay surfaces collapse them into a single opaque rejection.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("refresh credential not found")]
    CredentialNotFound,
    #[error("refresh credential expired")]
    CredentialExpired,
    #[error("invalid access token")]
    InvalidToken,
    #[error("credential store: {0:#}")]
    Persistence(#[source] anyhow::Error),
    #[error("access token encoding: {0}")]
    Signing(#[source] serde_json::Error),
}

impl AuthError {
    pub fn is_credential_error(&self) -> bool {
        matches!(self, Self::CredentialNotFound | Self::CredentialExpired | Self::InvalidToken)
    }
}

/// Return current epoch seconds.
pub fn epoch_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
