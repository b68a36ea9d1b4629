// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::RelayError;
use crate::auth::AuthError;

#[yare::parameterized(
    unauthorized = { RelayError::Unauthorized, 401, "UNAUTHORIZED" },
    forbidden = { RelayError::Forbidden, 403, "FORBIDDEN" },
    bad_request = { RelayError::BadRequest, 400, "BAD_REQUEST" },
    agent_unavailable = { RelayError::AgentUnavailable, 503, "AGENT_UNAVAILABLE" },
    internal = { RelayError::Internal, 500, "INTERNAL" },
)]
fn codes_map_to_status(code: RelayError, status: u16, name: &str) {
    assert_eq!(code.http_status(), status);
    assert_eq!(code.as_str(), name);
    assert_eq!(code.to_string(), name);
}

#[test]
fn credential_errors_are_indistinguishable() {
    assert_eq!(RelayError::from(&AuthError::CredentialNotFound), RelayError::Unauthorized);
    assert_eq!(RelayError::from(&AuthError::CredentialExpired), RelayError::Unauthorized);
    assert_eq!(RelayError::from(&AuthError::InvalidToken), RelayError::Unauthorized);
}

#[test]
fn persistence_errors_are_not_auth_failures() {
    let err = AuthError::Persistence(anyhow::anyhow!("disk full"));
    assert_eq!(RelayError::from(&err), RelayError::Internal);
    assert!(!err.is_credential_error());
}

#[test]
fn signing_errors_are_not_auth_failures() -> anyhow::Result<()> {
    let source = serde_json::from_str::<u8>("x")
        .err()
        .ok_or_else(|| anyhow::anyhow!("parse unexpectedly succeeded"))?;
    let err = AuthError::Signing(source);
    assert_eq!(RelayError::from(&err), RelayError::Internal);
    assert!(!err.is_credential_error());
    assert!(err.to_string().starts_with("access token encoding"));
    Ok(())
}
