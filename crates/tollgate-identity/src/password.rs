use std::fmt::Write as _;

use sha2::{Digest, Sha256};

/// Canonical form of an email address: trimmed and lowercased
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// SHA-256 hex digest of a password, the format stored in the user file
pub fn hash_password(password: &str) -> String {
    hex(&Sha256::digest(password.as_bytes()))
}

/// Check a password against a stored digest
pub fn verify_password(password: &str, password_hash: &str) -> bool {
    hash_password(password).eq_ignore_ascii_case(password_hash)
}

/// Lowercase hex encoding
pub(crate) fn hex(bytes: &[u8]) -> String {
    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut out, byte| {
        let _ = write!(out, "{byte:02x}");
        out
    })
}
