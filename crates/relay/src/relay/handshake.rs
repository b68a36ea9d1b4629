// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent HMAC proof: `prefix:timestamp:hex(HMAC-SHA256(secret, "prefix:timestamp"))`.
//!
//! There is no freshness window on the timestamp; a captured proof can be
//! replayed for as long as the secret is unchanged.

use ring::hmac;

/// A structurally valid agent proof.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentProof<'a> {
    pub prefix: &'a str,
    pub timestamp: &'a str,
    pub signature: Vec<u8>,
}

impl<'a> AgentProof<'a> {
    /// Split `prefix:timestamp:hexsig`. `None` for anything that is not even
    /// shaped like a proof.
    pub fn parse(raw: &'a str) -> Option<Self> {
        let mut parts = raw.splitn(3, ':');
        let prefix = parts.next()?;
        let timestamp = parts.next()?;
        let sig_hex = parts.next()?;
        if prefix.is_empty() || timestamp.is_empty() || sig_hex.is_empty() {
            return None;
        }
        let signature = hex::decode(sig_hex).ok()?;
        Some(Self { prefix, timestamp, signature })
    }

    fn signed_message(&self) -> String {
        format!("{}:{}", self.prefix, self.timestamp)
    }
}

/// Outcome of checking an agent proof.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProofCheck {
    Accepted,
    Rejected,
    /// Not a proof at all; the frame is dropped without a reply.
    Malformed,
}

/// Verifier keyed with the shared agent secret.
pub struct AgentVerifier {
    key: Option<hmac::Key>,
}

impl AgentVerifier {
    /// With no (or an empty) secret every well-formed proof is rejected.
    pub fn new(secret: Option<&str>) -> Self {
        let key = secret
            .filter(|s| !s.is_empty())
            .map(|s| hmac::Key::new(hmac::HMAC_SHA256, s.as_bytes()));
        Self { key }
    }

    pub fn is_configured(&self) -> bool {
        self.key.is_some()
    }

    /// Recompute the HMAC and compare in constant time.
    pub fn check(&self, raw: &str) -> ProofCheck {
        let Some(proof) = AgentProof::parse(raw) else {
            return ProofCheck::Malformed;
        };
        let Some(ref key) = self.key else {
            return ProofCheck::Rejected;
        };
        match hmac::verify(key, proof.signed_message().as_bytes(), &proof.signature) {
            Ok(()) => ProofCheck::Accepted,
            Err(_) => ProofCheck::Rejected,
        }
    }
}

/// Build a proof the way an agent does.
pub fn sign_agent_proof(secret: &str, prefix: &str, timestamp: &str) -> String {
    let key = hmac::Key::new(hmac::HMAC_SHA256, secret.as_bytes());
    let tag = hmac::sign(&key, format!("{prefix}:{timestamp}").as_bytes());
    format!("{prefix}:{timestamp}:{}", hex::encode(tag.as_ref()))
}

#[cfg(test)]
#[path = "handshake_tests.rs"]
mod tests;
