//! Key and IV types shared by the cipher-mode engines

use aes::cipher::{generic_array::GenericArray, KeyInit};
use aes::Aes256;
use zeroize::Zeroize;

use crate::{MtcError, MtcResult, BLOCK_SIZE, IGE_IV_SIZE, KEY_SIZE};

/// A 256-bit AES key. Zeroized on drop.
#[derive(Clone)]
pub struct AesKey {
    bytes: [u8; KEY_SIZE],
}

impl AesKey {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }

    /// Copy a key out of a caller buffer, rejecting anything but 32 bytes.
    pub fn from_slice(bytes: &[u8]) -> MtcResult<Self> {
        let bytes: [u8; KEY_SIZE] = bytes
            .try_into()
            .map_err(|_| MtcError::InvalidKey {
                actual: bytes.len(),
            })?;
        Ok(Self::from_bytes(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }

    /// Expand the key schedule for the block-cipher primitive.
    pub(crate) fn cipher(&self) -> Aes256 {
        Aes256::new(GenericArray::from_slice(&self.bytes))
    }
}

impl Drop for AesKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for AesKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AesKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// The 32-byte IGE initialization vector.
///
/// Bytes `0..16` seed the ciphertext chain (C₀), bytes `16..32` seed the
/// plaintext chain (P₀). Encrypt and decrypt both read it this way.
#[derive(Clone, PartialEq, Eq)]
pub struct IgeIv {
    bytes: [u8; IGE_IV_SIZE],
}

impl IgeIv {
    pub fn from_bytes(bytes: [u8; IGE_IV_SIZE]) -> Self {
        Self { bytes }
    }

    pub fn from_slice(bytes: &[u8]) -> MtcResult<Self> {
        let bytes: [u8; IGE_IV_SIZE] = bytes
            .try_into()
            .map_err(|_| MtcError::wrong_size("IGE IV", IGE_IV_SIZE, bytes.len()))?;
        Ok(Self::from_bytes(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; IGE_IV_SIZE] {
        &self.bytes
    }

    /// C₀: the "previous ciphertext" block for the first chaining step.
    pub fn cipher_half(&self) -> [u8; BLOCK_SIZE] {
        let mut half = [0u8; BLOCK_SIZE];
        half.copy_from_slice(&self.bytes[..BLOCK_SIZE]);
        half
    }

    /// P₀: the "previous plaintext" block for the first chaining step.
    pub fn plain_half(&self) -> [u8; BLOCK_SIZE] {
        let mut half = [0u8; BLOCK_SIZE];
        half.copy_from_slice(&self.bytes[BLOCK_SIZE..]);
        half
    }
}

impl std::fmt::Debug for IgeIv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IgeIv")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

#[inline]
pub(crate) fn xor_block(out: &mut [u8], other: &[u8; BLOCK_SIZE]) {
    for (a, b) in out.iter_mut().zip(other) {
        *a ^= *b;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_from_slice() {
        let key = AesKey::from_slice(&[7u8; KEY_SIZE]).unwrap();
        assert_eq!(key.as_bytes(), &[7u8; KEY_SIZE]);
    }

    #[test]
    fn test_key_wrong_length() {
        for len in [0, 16, 24, 31, 33, 64] {
            let result = AesKey::from_slice(&vec![0u8; len]);
            assert!(
                matches!(result, Err(MtcError::InvalidKey { actual }) if actual == len),
                "{len}-byte key must be rejected"
            );
        }
    }

    #[test]
    fn test_key_debug_redacted() {
        let key = AesKey::from_bytes([0xEEu8; KEY_SIZE]);
        let rendered = format!("{key:?}");
        assert!(rendered.contains("REDACTED"));
        assert!(!rendered.contains("238"));
    }

    #[test]
    fn test_iv_halves() {
        let mut bytes = [0u8; IGE_IV_SIZE];
        bytes[..BLOCK_SIZE].fill(0x11);
        bytes[BLOCK_SIZE..].fill(0x22);
        let iv = IgeIv::from_bytes(bytes);

        assert_eq!(iv.cipher_half(), [0x11u8; BLOCK_SIZE]);
        assert_eq!(iv.plain_half(), [0x22u8; BLOCK_SIZE]);
    }

    #[test]
    fn test_iv_wrong_length() {
        let result = IgeIv::from_slice(&[0u8; BLOCK_SIZE]);
        assert!(matches!(
            result,
            Err(MtcError::InvalidLength { actual: 16, .. })
        ));
    }

    #[test]
    fn test_xor_block() {
        let mut out = [0xF0u8; BLOCK_SIZE];
        xor_block(&mut out, &[0xFFu8; BLOCK_SIZE]);
        assert_eq!(out, [0x0Fu8; BLOCK_SIZE]);
    }
}
