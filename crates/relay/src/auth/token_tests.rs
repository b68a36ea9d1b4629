// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

use super::*;
use crate::auth::Role;

fn identity(role: Role) -> Identity {
    Identity { subject: "u-1".to_owned(), external_id: "1234567890".to_owned(), role }
}

#[yare::parameterized(
    user = { Role::User },
    moderator = { Role::Moderator },
    admin = { Role::Admin },
    owner = { Role::Owner },
)]
fn sign_then_verify_preserves_identity(role: Role) {
    let signer = AccessSigner::new(b"test-secret");
    let token = signer.sign(&identity(role), 900);
    let claims = token.and_then(|t| signer.verify(&t));
    let Ok(claims) = claims else {
        unreachable!("freshly signed token must verify");
    };
    assert_eq!(claims.identity(), identity(role));
    assert_eq!(claims.exp, claims.iat + 900);
}

#[test]
fn expired_token_is_rejected() -> anyhow::Result<()> {
    let signer = AccessSigner::new(b"test-secret");
    let token = signer.sign(&identity(Role::Admin), 0)?;
    assert!(matches!(signer.verify(&token), Err(AuthError::InvalidToken)));
    Ok(())
}

#[test]
fn token_from_other_key_is_rejected() -> anyhow::Result<()> {
    let ours = AccessSigner::new(b"ours");
    let theirs = AccessSigner::new(b"theirs");
    let token = theirs.sign(&identity(Role::Owner), 900)?;
    assert!(matches!(ours.verify(&token), Err(AuthError::InvalidToken)));
    Ok(())
}

#[test]
fn tampered_claims_are_rejected() -> anyhow::Result<()> {
    let signer = AccessSigner::new(b"test-secret");
    let token = signer.sign(&identity(Role::User), 900)?;
    let parts: Vec<&str> = token.split('.').collect();
    assert_eq!(parts.len(), 3);

    let mut claims: serde_json::Value =
        serde_json::from_slice(&URL_SAFE_NO_PAD.decode(parts[1])?)?;
    claims["role"] = serde_json::json!("OWNER");
    let forged_claims = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims)?);
    let forged = format!("{}.{}.{}", parts[0], forged_claims, parts[2]);

    assert!(matches!(signer.verify(&forged), Err(AuthError::InvalidToken)));
    Ok(())
}

#[test]
fn unsigned_token_is_rejected() -> anyhow::Result<()> {
    let signer = AccessSigner::new(b"test-secret");
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
    let claims = URL_SAFE_NO_PAD.encode(
        serde_json::to_vec(&serde_json::json!({
            "sub": "u-1", "eid": "1", "role": "OWNER",
            "iat": 0, "exp": u64::MAX, "jti": "x"
        }))?,
    );
    let token = format!("{header}.{claims}.");
    assert!(matches!(signer.verify(&token), Err(AuthError::InvalidToken)));
    Ok(())
}

#[yare::parameterized(
    empty = { "" },
    one_part = { "abc" },
    two_parts = { "abc.def" },
    four_parts = { "a.b.c.d" },
    not_base64 = { "!!!.???.***" },
)]
fn malformed_tokens_are_rejected(token: &str) {
    let signer = AccessSigner::new(b"test-secret");
    assert!(matches!(signer.verify(token), Err(AuthError::InvalidToken)));
}

#[test]
fn tokens_minted_together_differ() -> anyhow::Result<()> {
    let signer = AccessSigner::new(b"test-secret");
    let a = signer.sign(&identity(Role::User), 900)?;
    let b = signer.sign(&identity(Role::User), 900)?;
    assert_ne!(a, b);
    Ok(())
}

#[test]
fn refresh_tokens_are_unique_and_url_safe() {
    let a = generate_refresh_token();
    let b = generate_refresh_token();
    assert_ne!(a, b);
    assert_eq!(a.len(), 43);
    assert!(a.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
}
