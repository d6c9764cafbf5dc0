//! Fast master-password verification hash.
//!
//! This is not a key-derivation step: it is a SHA-256 digest kept in
//! memory for the unlocked session so `change_password` can check the
//! current password without paying for another Argon2 run.  It is never
//! written to disk and never used as key material.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Hash a password to a base64 SHA-256 digest.
pub fn hash_password(password: &str) -> String {
    BASE64.encode(Sha256::digest(password.as_bytes()))
}

/// Check `password` against a digest from `hash_password` in constant time.
pub fn verify_password(password: &str, digest: &str) -> bool {
    let candidate = hash_password(password);
    candidate.as_bytes().ct_eq(digest.as_bytes()).into()
}
