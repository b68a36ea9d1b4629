// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HS256 compact access tokens and opaque refresh token generation.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::Rng;
use ring::hmac;
use serde::{Deserialize, Serialize};

use crate::auth::{epoch_secs, AccessClaims, AuthError, Identity};

/// Fixed JOSE header; the only algorithm this signer produces or accepts.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
struct Header {
    alg: String,
    typ: String,
}

const ALG: &str = "HS256";
const TYP: &str = "JWT";

/// Signs and verifies access tokens with a single HMAC-SHA256 key.
pub struct AccessSigner {
    key: hmac::Key,
}

impl AccessSigner {
    pub fn new(secret: &[u8]) -> Self {
        Self { key: hmac::Key::new(hmac::HMAC_SHA256, secret) }
    }

    /// Build a signer with a random 32-byte key.
    pub fn random() -> Self {
        let mut secret = [0u8; 32];
        rand::rng().fill(&mut secret);
        Self::new(&secret)
    }

    /// Mint an access token valid for `ttl_secs` from now.
    pub fn sign(&self, identity: &Identity, ttl_secs: u64) -> Result<String, AuthError> {
        let iat = epoch_secs();
        let claims = AccessClaims {
            sub: identity.subject.clone(),
            eid: identity.external_id.clone(),
            role: identity.role,
            iat,
            exp: iat.saturating_add(ttl_secs),
            jti: random_token(12),
        };
        let header = Header { alg: ALG.to_owned(), typ: TYP.to_owned() };

        let signing_input = format!("{}.{}", encode_segment(&header)?, encode_segment(&claims)?);
        let tag = hmac::sign(&self.key, signing_input.as_bytes());
        Ok(format!("{signing_input}.{}", URL_SAFE_NO_PAD.encode(tag.as_ref())))
    }

    /// Verify signature and expiry. Every failure is [`AuthError::InvalidToken`].
    pub fn verify(&self, token: &str) -> Result<AccessClaims, AuthError> {
        let mut parts = token.split('.');
        let (Some(header_b64), Some(claims_b64), Some(sig_b64), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(AuthError::InvalidToken);
        };

        let signature = URL_SAFE_NO_PAD.decode(sig_b64).map_err(|_| AuthError::InvalidToken)?;
        // Signature first: nothing from an unauthenticated payload is parsed.
        let signing_input_len = header_b64.len() + 1 + claims_b64.len();
        let signing_input = &token[..signing_input_len];
        hmac::verify(&self.key, signing_input.as_bytes(), &signature)
            .map_err(|_| AuthError::InvalidToken)?;

        let header: Header = decode_segment(header_b64)?;
        if header.alg != ALG {
            return Err(AuthError::InvalidToken);
        }
        let claims: AccessClaims = decode_segment(claims_b64)?;
        if epoch_secs() >= claims.exp {
            return Err(AuthError::InvalidToken);
        }
        Ok(claims)
    }
}

fn encode_segment<T: Serialize>(value: &T) -> Result<String, AuthError> {
    let json = serde_json::to_vec(value).map_err(AuthError::Signing)?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

fn decode_segment<T: serde::de::DeserializeOwned>(segment: &str) -> Result<T, AuthError> {
    let bytes = URL_SAFE_NO_PAD.decode(segment).map_err(|_| AuthError::InvalidToken)?;
    serde_json::from_slice(&bytes).map_err(|_| AuthError::InvalidToken)
}

/// Generate a URL-safe random token from `len` random bytes.
pub fn random_token(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    rand::rng().fill(bytes.as_mut_slice());
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Generate an opaque refresh credential (32 random bytes).
pub fn generate_refresh_token() -> String {
    random_token(32)
}

#[cfg(test)]
#[path = "token_tests.rs"]
mod tests;
