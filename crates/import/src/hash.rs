use sha2::{Digest, Sha256};

/// Compute SHA-256 of an uploaded file's raw bytes.
pub fn sha256_bytes(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Encode a raw 32-byte hash as a lowercase hex string (64 chars).
pub fn to_hex(hash: &[u8; 32]) -> String {
    hash.iter().map(|b| format!("{b:02x}")).collect()
}

/// The dedup key for an upload: hex SHA-256 over the raw bytes.
/// Order-sensitive and format-agnostic; byte-identical files collide,
/// near-duplicates do not.
pub fn content_hash(data: &[u8]) -> String {
    to_hex(&sha256_bytes(data))
}
