//! SHA-1 and SHA-256 message digests
//!
//! Thin wrappers over the RustCrypto implementations with fixed-size outputs,
//! so callers can fingerprint keys and check integrity without touching the
//! `Digest` trait machinery.

use ::sha1::Sha1;
use sha2::{Digest, Sha256};

use crate::{SHA1_SIZE, SHA256_SIZE};

/// SHA-1 of `msg` (20 bytes). Kept for protocol interoperability only.
pub fn sha1(msg: &[u8]) -> [u8; SHA1_SIZE] {
    Sha1::digest(msg).into()
}

/// SHA-256 of `msg` (32 bytes).
pub fn sha256(msg: &[u8]) -> [u8; SHA256_SIZE] {
    Sha256::digest(msg).into()
}

/// SHA-256 of the concatenation of `parts`, without building the
/// concatenated buffer.
pub fn sha256_parts(parts: &[&[u8]]) -> [u8; SHA256_SIZE] {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}
