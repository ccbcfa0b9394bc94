//! AES-256 in Infinite Garble Extension (IGE) mode
//!
//! ```text
//! encrypt:  C_i = E(K, P_i ⊕ C_{i-1}) ⊕ P_{i-1}
//! decrypt:  P_i = D(K, C_i ⊕ P_{i-1}) ⊕ C_{i-1}
//! C_0 = iv[0..16], P_0 = iv[16..32]
//! ```
//!
//! A flipped bit in ciphertext block `i` garbles every plaintext block from
//! `i` onwards. That propagation is the point of the mode and is left intact.
//!
//! Buffers must be a nonzero multiple of 16 bytes. Lengths are checked before
//! any block is touched, so a rejected call never produces partial output.

use aes::cipher::{generic_array::GenericArray, BlockDecrypt, BlockEncrypt};
use aes::Aes256;
use tracing::{debug, trace};
use zeroize::Zeroize;

use crate::key::{xor_block, AesKey, IgeIv};
use crate::{MtcError, MtcResult, BLOCK_SIZE};

/// Encrypt `plaintext` and return the ciphertext in a new buffer.
pub fn encrypt(key: &AesKey, iv: &IgeIv, plaintext: &[u8]) -> MtcResult<Vec<u8>> {
    check_len("plaintext", plaintext.len())?;
    let mut out = plaintext.to_vec();
    encrypt_blocks(&key.cipher(), iv, &mut out);
    Ok(out)
}

/// Decrypt `ciphertext` and return the plaintext in a new buffer.
pub fn decrypt(key: &AesKey, iv: &IgeIv, ciphertext: &[u8]) -> MtcResult<Vec<u8>> {
    check_len("ciphertext", ciphertext.len())?;
    let mut out = ciphertext.to_vec();
    decrypt_blocks(&key.cipher(), iv, &mut out);
    Ok(out)
}

/// Encrypt `buf` in place. On error `buf` is left untouched.
pub fn encrypt_in_place(key: &AesKey, iv: &IgeIv, buf: &mut [u8]) -> MtcResult<()> {
    check_len("plaintext", buf.len())?;
    encrypt_blocks(&key.cipher(), iv, buf);
    Ok(())
}

/// Decrypt `buf` in place. On error `buf` is left untouched.
pub fn decrypt_in_place(key: &AesKey, iv: &IgeIv, buf: &mut [u8]) -> MtcResult<()> {
    check_len("ciphertext", buf.len())?;
    decrypt_blocks(&key.cipher(), iv, buf);
    Ok(())
}

fn check_len(what: &'static str, len: usize) -> MtcResult<()> {
    if len == 0 || !len.is_multiple_of(BLOCK_SIZE) {
        debug!(what, len, "rejecting IGE buffer: not a whole number of blocks");
        return Err(MtcError::not_block_multiple(what, BLOCK_SIZE, len));
    }
    Ok(())
}

fn encrypt_blocks(cipher: &Aes256, iv: &IgeIv, buf: &mut [u8]) {
    trace!(len = buf.len(), "ige encrypt");

    let mut prev_cipher = iv.cipher_half();
    let mut prev_plain = iv.plain_half();
    let mut plain = [0u8; BLOCK_SIZE];

    for block in buf.chunks_exact_mut(BLOCK_SIZE) {
        plain.copy_from_slice(block);

        xor_block(block, &prev_cipher);
        cipher.encrypt_block(GenericArray::from_mut_slice(block));
        xor_block(block, &prev_plain);

        prev_cipher.copy_from_slice(block);
        prev_plain = plain;
    }

    plain.zeroize();
    prev_plain.zeroize();
}

fn decrypt_blocks(cipher: &Aes256, iv: &IgeIv, buf: &mut [u8]) {
    trace!(len = buf.len(), "ige decrypt");

    let mut prev_cipher = iv.cipher_half();
    let mut prev_plain = iv.plain_half();
    let mut ciphertext = [0u8; BLOCK_SIZE];

    for block in buf.chunks_exact_mut(BLOCK_SIZE) {
        ciphertext.copy_from_slice(block);

        xor_block(block, &prev_plain);
        cipher.decrypt_block(GenericArray::from_mut_slice(block));
        xor_block(block, &prev_cipher);

        prev_plain.copy_from_slice(block);
        prev_cipher = ciphertext;
    }

    prev_plain.zeroize();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{IGE_IV_SIZE, KEY_SIZE};
    use aes::cipher::KeyInit;
    use proptest::prelude::*;

    fn test_key() -> AesKey {
        let mut bytes = [0u8; KEY_SIZE];
        for (i, b) in bytes.iter_mut().enumerate() {
            *b = i as u8;
        }
        AesKey::from_bytes(bytes)
    }

    fn test_iv() -> IgeIv {
        let mut bytes = [0u8; IGE_IV_SIZE];
        for (i, b) in bytes.iter_mut().enumerate() {
            *b = 0xA0 ^ (i as u8);
        }
        IgeIv::from_bytes(bytes)
    }

    fn make_data(size: usize) -> Vec<u8> {
        (0..size)
            .map(|i| (i.wrapping_mul(31) ^ (i >> 2)) as u8)
            .collect()
    }

    fn raw_encrypt_block(key: &AesKey, input: [u8; BLOCK_SIZE]) -> [u8; BLOCK_SIZE] {
        let cipher = Aes256::new(GenericArray::from_slice(key.as_bytes()));
        let mut block = input;
        cipher.encrypt_block(GenericArray::from_mut_slice(&mut block));
        block
    }

    fn xor(a: [u8; BLOCK_SIZE], b: [u8; BLOCK_SIZE]) -> [u8; BLOCK_SIZE] {
        let mut out = a;
        xor_block(&mut out, &b);
        out
    }

    #[test]
    fn test_first_two_blocks_follow_chaining_equation() {
        let key = test_key();
        let iv = test_iv();
        let plaintext = make_data(32);

        let ciphertext = encrypt(&key, &iv, &plaintext).unwrap();

        let p1: [u8; BLOCK_SIZE] = plaintext[..16].try_into().unwrap();
        let p2: [u8; BLOCK_SIZE] = plaintext[16..].try_into().unwrap();

        // C_1 = E(P_1 ^ C_0) ^ P_0, with C_0 the first IV half
        let c1 = xor(
            raw_encrypt_block(&key, xor(p1, iv.cipher_half())),
            iv.plain_half(),
        );
        // C_2 = E(P_2 ^ C_1) ^ P_1
        let c2 = xor(raw_encrypt_block(&key, xor(p2, c1)), p1);

        assert_eq!(&ciphertext[..16], &c1);
        assert_eq!(&ciphertext[16..], &c2);
    }

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let key = test_key();
        let iv = test_iv();
        let plaintext = make_data(1024);

        let ciphertext = encrypt(&key, &iv, &plaintext).unwrap();
        assert_ne!(ciphertext, plaintext);

        let decrypted = decrypt(&key, &iv, &ciphertext).unwrap();
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn test_in_place_matches_owned() {
        let key = test_key();
        let iv = test_iv();
        let plaintext = make_data(256);

        let owned = encrypt(&key, &iv, &plaintext).unwrap();
        let mut buf = plaintext.clone();
        encrypt_in_place(&key, &iv, &mut buf).unwrap();
        assert_eq!(buf, owned);

        decrypt_in_place(&key, &iv, &mut buf).unwrap();
        assert_eq!(buf, plaintext);
    }

    #[test]
    fn test_iv_is_not_modified() {
        let key = test_key();
        let iv = test_iv();
        let before = iv.clone();

        let ciphertext = encrypt(&key, &iv, &make_data(64)).unwrap();
        decrypt(&key, &iv, &ciphertext).unwrap();

        assert_eq!(iv, before);
    }

    #[test]
    fn test_invalid_lengths_rejected() {
        let key = test_key();
        let iv = test_iv();

        for len in [0usize, 1, 15, 17, 31, 33] {
            let data = vec![0x5Au8; len];
            let result = encrypt(&key, &iv, &data);
            assert!(
                matches!(result, Err(MtcError::InvalidLength { actual, .. }) if actual == len),
                "encrypt must reject {len} bytes"
            );
            assert!(
                matches!(decrypt(&key, &iv, &data), Err(MtcError::InvalidLength { .. })),
                "decrypt must reject {len} bytes"
            );
        }
    }

    #[test]
    fn test_rejected_in_place_leaves_buffer_untouched() {
        let key = test_key();
        let iv = test_iv();
        let mut buf = vec![0x5Au8; 20];

        assert!(encrypt_in_place(&key, &iv, &mut buf).is_err());
        assert_eq!(buf, vec![0x5Au8; 20]);
    }

    #[test]
    fn test_ciphertext_bit_flip_garbles_from_that_block_on() {
        let key = test_key();
        let iv = test_iv();
        let plaintext = make_data(5 * BLOCK_SIZE);
        let ciphertext = encrypt(&key, &iv, &plaintext).unwrap();

        for flipped in 1..5 {
            let mut tampered = ciphertext.clone();
            tampered[flipped * BLOCK_SIZE + 3] ^= 0x01;
            let recovered = decrypt(&key, &iv, &tampered).unwrap();

            for i in 0..5 {
                let range = i * BLOCK_SIZE..(i + 1) * BLOCK_SIZE;
                if i < flipped {
                    assert_eq!(
                        recovered[range.clone()],
                        plaintext[range],
                        "block {i} precedes the flip in block {flipped} and must survive"
                    );
                } else {
                    assert_ne!(
                        recovered[range.clone()],
                        plaintext[range],
                        "block {i} must be garbled by the flip in block {flipped}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_plaintext_change_propagates_through_ciphertext() {
        let key = test_key();
        let iv = test_iv();
        let plaintext = make_data(4 * BLOCK_SIZE);
        let mut changed = plaintext.clone();
        changed[BLOCK_SIZE] ^= 0x80;

        let a = encrypt(&key, &iv, &plaintext).unwrap();
        let b = encrypt(&key, &iv, &changed).unwrap();

        assert_eq!(a[..BLOCK_SIZE], b[..BLOCK_SIZE]);
        for i in 1..4 {
            let range = i * BLOCK_SIZE..(i + 1) * BLOCK_SIZE;
            assert_ne!(a[range.clone()], b[range]);
        }
    }

    #[test]
    fn test_iv_half_order_matters() {
        let key = test_key();
        let iv = test_iv();
        let mut swapped = [0u8; IGE_IV_SIZE];
        swapped[..BLOCK_SIZE].copy_from_slice(&iv.plain_half());
        swapped[BLOCK_SIZE..].copy_from_slice(&iv.cipher_half());
        let swapped = IgeIv::from_bytes(swapped);

        let plaintext = make_data(64);
        let a = encrypt(&key, &iv, &plaintext).unwrap();
        let b = encrypt(&key, &swapped, &plaintext).unwrap();
        assert_ne!(a, b);

        // Decrypting with the wrong convention must not recover the plaintext
        assert_ne!(decrypt(&key, &swapped, &a).unwrap(), plaintext);
    }

    #[test]
    fn test_wrong_key_does_not_decrypt() {
        let iv = test_iv();
        let plaintext = make_data(48);
        let ciphertext = encrypt(&test_key(), &iv, &plaintext).unwrap();

        let other = AesKey::from_bytes([0x42u8; KEY_SIZE]);
        assert_ne!(decrypt(&other, &iv, &ciphertext).unwrap(), plaintext);
    }

    #[test]
    fn test_matches_reference_ige_in_both_directions() {
        use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
        type Aes256IgeEnc = ::ige::Encryptor<Aes256>;
        type Aes256IgeDec = ::ige::Decryptor<Aes256>;

        let key = test_key();
        let iv = test_iv();
        let plaintext = make_data(160);

        let mut reference = plaintext.clone();
        let mut enc = Aes256IgeEnc::new(
            GenericArray::from_slice(key.as_bytes()),
            GenericArray::from_slice(iv.as_bytes()),
        );
        for block in reference.chunks_exact_mut(BLOCK_SIZE) {
            enc.encrypt_block_mut(GenericArray::from_mut_slice(block));
        }
        assert_eq!(encrypt(&key, &iv, &plaintext).unwrap(), reference);

        let mut recovered = reference.clone();
        let mut dec = Aes256IgeDec::new(
            GenericArray::from_slice(key.as_bytes()),
            GenericArray::from_slice(iv.as_bytes()),
        );
        for block in recovered.chunks_exact_mut(BLOCK_SIZE) {
            dec.decrypt_block_mut(GenericArray::from_mut_slice(block));
        }
        assert_eq!(recovered, plaintext);
        assert_eq!(decrypt(&key, &iv, &reference).unwrap(), plaintext);
    }

    proptest! {
        #[test]
        fn roundtrip_any_whole_block_buffer(
            key in any::<[u8; KEY_SIZE]>(),
            iv_lo in any::<[u8; 16]>(),
            iv_hi in any::<[u8; 16]>(),
            blocks in 1usize..=32,
            seed in any::<u8>(),
        ) {
            let key = AesKey::from_bytes(key);
            let mut iv = [0u8; IGE_IV_SIZE];
            iv[..16].copy_from_slice(&iv_lo);
            iv[16..].copy_from_slice(&iv_hi);
            let iv = IgeIv::from_bytes(iv);
            let plaintext: Vec<u8> = (0..blocks * BLOCK_SIZE)
                .map(|i| (i as u8).wrapping_mul(seed | 1))
                .collect();

            let ciphertext = encrypt(&key, &iv, &plaintext).unwrap();
            prop_assert_eq!(ciphertext.len(), plaintext.len());
            let decrypted = decrypt(&key, &iv, &ciphertext).unwrap();
            prop_assert_eq!(decrypted, plaintext);
        }
    }
}
