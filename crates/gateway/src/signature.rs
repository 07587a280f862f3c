//! Integrity signature attached to every charge.

use sha2::{Digest, Sha256};

/// Hex SHA-256 of `reference + amount_in_cents + currency + integrity_key`.
pub fn integrity_signature(
    reference: &str,
    amount_in_cents: i64,
    currency: &str,
    integrity_key: &str,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(reference.as_bytes());
    hasher.update(amount_in_cents.to_string().as_bytes());
    hasher.update(currency.as_bytes());
    hasher.update(integrity_key.as_bytes());
    hex::encode(hasher.finalize())
}
