//! One-way email hash embedded in convention-scoped tokens.
//!
//! Verification recomputes the hash of each admissible address (e.g.
//! every counsellor of the agency) and compares against the hash minted
//! at issuance time. The literal address is also embedded in the payload
//! for notification composition; the hash only serves matching against a
//! *different* set of addresses.

use sha2::{Digest, Sha256};

/// SHA-256 hex digest of the normalized (trimmed, lowercased) address.
pub fn email_hash(email: &str) -> String {
    let normalized = email.trim().to_lowercase();
    let digest = Sha256::digest(normalized.as_bytes());
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

/// Whether any of `admissible` hashes to `hash`.
pub fn matches_any(hash: &str, admissible: &[&str]) -> bool {
    admissible.iter().any(|email| email_hash(email) == hash)
}
