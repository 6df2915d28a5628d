//! Commitment hashing
//!
//! SHA-256 over UTF-8 input, rendered as lowercase hex. The play preimage
//! layout `server-client-nonce` is part of the public verification contract.

use sha2::{Digest, Sha256};

/// Separator between the fields of a play preimage
pub const FIELD_SEPARATOR: char = '-';

/// Hex-encoded SHA-256 of `data` (64 lowercase hex characters)
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Public commitment to a server seed
pub fn commitment(server_seed: &str) -> String {
    sha256_hex(server_seed.as_bytes())
}

/// Preimage of a play: `{server_seed}-{client_seed}-{nonce}` with the nonce in base 10
pub fn play_input(server_seed: &str, client_seed: &str, nonce: u64) -> String {
    format!(
        "{}{sep}{}{sep}{}",
        server_seed,
        client_seed,
        nonce,
        sep = FIELD_SEPARATOR
    )
}

/// Commit hash of a single play
pub fn commit_hash(server_seed: &str, client_seed: &str, nonce: u64) -> String {
    sha256_hex(play_input(server_seed, client_seed, nonce).as_bytes())
}
