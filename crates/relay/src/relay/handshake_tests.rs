// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use proptest::prelude::*;

use super::*;

const SECRET: &str = "agent-shared-secret";

#[test]
fn signed_proof_is_accepted() {
    let verifier = AgentVerifier::new(Some(SECRET));
    let proof = sign_agent_proof(SECRET, "bot", "1700000000");
    assert_eq!(verifier.check(&proof), ProofCheck::Accepted);
}

#[test]
fn other_secret_is_rejected() {
    let verifier = AgentVerifier::new(Some(SECRET));
    let proof = sign_agent_proof("not-the-secret", "bot", "1700000000");
    assert_eq!(verifier.check(&proof), ProofCheck::Rejected);
}

#[test]
fn unconfigured_secret_rejects_everything() {
    let proof = sign_agent_proof(SECRET, "bot", "1700000000");
    assert_eq!(AgentVerifier::new(None).check(&proof), ProofCheck::Rejected);
    assert_eq!(AgentVerifier::new(Some("")).check(&proof), ProofCheck::Rejected);
    assert!(!AgentVerifier::new(None).is_configured());
}

#[yare::parameterized(
    empty = { "" },
    one_part = { "bot" },
    two_parts = { "bot:1700000000" },
    empty_prefix = { ":1700000000:abcd" },
    empty_timestamp = { "bot::abcd" },
    empty_signature = { "bot:1700000000:" },
    non_hex = { "bot:1700000000:zzzz" },
    odd_hex = { "bot:1700000000:abc" },
    extra_colon = { "bot:1700000000:ab:cd" },
)]
fn malformed_proofs(raw: &str) {
    assert_eq!(AgentVerifier::new(Some(SECRET)).check(raw), ProofCheck::Malformed);
}

#[test]
fn short_signature_is_rejected_not_malformed() {
    let verifier = AgentVerifier::new(Some(SECRET));
    assert_eq!(verifier.check("bot:1700000000:abcd"), ProofCheck::Rejected);
}

fn flip(s: &str, byte: usize, bit: u8) -> String {
    let mut bytes = s.as_bytes().to_vec();
    let i = byte % bytes.len();
    bytes[i] ^= 1 << (bit % 7);
    String::from_utf8_lossy(&bytes).into_owned()
}

proptest! {
    #[test]
    fn any_single_bit_flip_is_not_accepted(
        prefix in "[a-z0-9]{1,16}",
        timestamp in "[0-9]{1,13}",
        byte in 0usize..64,
        bit in 0u8..7,
        part in 0u8..3,
    ) {
        let verifier = AgentVerifier::new(Some(SECRET));
        let proof = sign_agent_proof(SECRET, &prefix, &timestamp);
        prop_assert_eq!(verifier.check(&proof), ProofCheck::Accepted);

        let tampered = match part {
            0 => sign_with_signature_of(&flip(&prefix, byte, bit), &timestamp, &proof),
            1 => sign_with_signature_of(&prefix, &flip(&timestamp, byte, bit), &proof),
            _ => {
                let Some(parsed) = AgentProof::parse(&proof) else {
                    return Err(TestCaseError::fail("signed proof must parse"));
                };
                let mut sig = parsed.signature.clone();
                let i = byte % sig.len();
                sig[i] ^= 1 << bit;
                format!("{prefix}:{timestamp}:{}", hex::encode(sig))
            }
        };
        prop_assert_ne!(verifier.check(&tampered), ProofCheck::Accepted);
    }
}

/// Keep the original signature but swap in a modified prefix/timestamp.
fn sign_with_signature_of(prefix: &str, timestamp: &str, original: &str) -> String {
    let sig = original.rsplit(':').next().unwrap_or_default();
    format!("{prefix}:{timestamp}:{sig}")
}
