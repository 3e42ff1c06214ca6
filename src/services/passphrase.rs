// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Passphrase hashing for private workouts.
//!
//! Passphrases are stored as SHA-256 hex digests and compared in constant
//! time, never as plaintext.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Hash a passphrase for storage.
pub fn hash_passphrase(passphrase: &str) -> String {
    let digest = Sha256::digest(passphrase.as_bytes());
    hex::encode(digest)
}

/// Check a candidate passphrase against a stored digest.
pub fn verify_passphrase(candidate: &str, stored_hash: &str) -> bool {
    let candidate_hash = hash_passphrase(candidate);
    candidate_hash
        .as_bytes()
        .ct_eq(stored_hash.as_bytes())
        .into()
}
