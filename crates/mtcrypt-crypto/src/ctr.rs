//! Resumable AES-256 counter mode
//!
//! The keystream position is carried in a [`CtrState`] owned by the caller:
//!
//! ```text
//! counter  16 bytes   big-endian block counter, encrypted to make keystream
//! ecount   16 bytes   keystream block generated from the previous counter
//! num      0..16      bytes of ecount already consumed (0 = cache exhausted)
//! ```
//!
//! Applying a buffer in pieces with the state threaded through gives the same
//! bytes as applying it in one call, whatever the split points. Encryption and
//! decryption are the same operation.

use aes::cipher::{generic_array::GenericArray, BlockEncrypt};
use aes::Aes256;
use tracing::{debug, trace};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::key::{xor_block, AesKey};
use crate::{MtcError, MtcResult, BLOCK_SIZE};

/// Keystream position of one logical CTR stream. Zeroized on drop.
///
/// `num` is always below 16; the constructors enforce it, so [`apply`] never
/// has to re-check.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct CtrState {
    counter: [u8; BLOCK_SIZE],
    ecount: [u8; BLOCK_SIZE],
    num: u32,
}

impl CtrState {
    /// Start a fresh stream at `counter` with an empty keystream cache.
    pub fn new(counter: [u8; BLOCK_SIZE]) -> Self {
        Self {
            counter,
            ecount: [0u8; BLOCK_SIZE],
            num: 0,
        }
    }

    /// Rebuild a state previously taken apart with [`CtrState::into_parts`]
    /// (or handed over by a foreign caller).
    pub fn from_parts(
        counter: [u8; BLOCK_SIZE],
        ecount: [u8; BLOCK_SIZE],
        num: u32,
    ) -> MtcResult<Self> {
        if num as usize >= BLOCK_SIZE {
            debug!(num, "rejecting CTR state: offset out of range");
            return Err(MtcError::InvalidState { num });
        }
        Ok(Self {
            counter,
            ecount,
            num,
        })
    }

    pub fn counter(&self) -> &[u8; BLOCK_SIZE] {
        &self.counter
    }

    pub fn ecount(&self) -> &[u8; BLOCK_SIZE] {
        &self.ecount
    }

    pub fn num(&self) -> u32 {
        self.num
    }

    pub fn into_parts(self) -> ([u8; BLOCK_SIZE], [u8; BLOCK_SIZE], u32) {
        (self.counter, self.ecount, self.num)
    }

    /// ecount = E(counter); counter += 1
    fn refill(&mut self, cipher: &Aes256) {
        self.ecount = self.counter;
        cipher.encrypt_block(GenericArray::from_mut_slice(&mut self.ecount));
        let next = u128::from_be_bytes(self.counter).wrapping_add(1);
        self.counter = next.to_be_bytes();
    }
}

impl std::fmt::Debug for CtrState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CtrState")
            .field("counter", &"[REDACTED]")
            .field("ecount", &"[REDACTED]")
            .field("num", &self.num)
            .finish()
    }
}

/// XOR `buf` with the keystream, advancing `state`.
pub fn apply(key: &AesKey, state: &mut CtrState, buf: &mut [u8]) {
    trace!(len = buf.len(), num = state.num, "ctr apply");
    if buf.is_empty() {
        return;
    }

    let cipher = key.cipher();
    let mut num = state.num as usize;

    // Finish the partially consumed keystream block first.
    let cached = if num == 0 { 0 } else { BLOCK_SIZE - num };
    let (head, tail) = buf.split_at_mut(cached.min(buf.len()));
    for (byte, ks) in head.iter_mut().zip(&state.ecount[num..]) {
        *byte ^= *ks;
    }
    num = (num + head.len()) % BLOCK_SIZE;

    // Either tail is empty or the cache is now exhausted (num == 0).
    for chunk in tail.chunks_mut(BLOCK_SIZE) {
        state.refill(&cipher);
        xor_block(chunk, &state.ecount);
        num = chunk.len() % BLOCK_SIZE;
    }

    state.num = num as u32;
}

/// Owned form of [`apply`]: consumes the state and returns the output
/// together with the state to resume from.
pub fn apply_to_vec(key: &AesKey, mut state: CtrState, input: &[u8]) -> (Vec<u8>, CtrState) {
    let mut out = input.to_vec();
    apply(key, &mut state, &mut out);
    (out, state)
}
