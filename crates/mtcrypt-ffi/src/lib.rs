//! mtcrypt-ffi: C ABI over the mtcrypt engines
//!
//! Every function takes raw pointers with explicit lengths and returns an
//! `i32` status (`MTC_OK` or a negative `MTC_ERR_*`). Lengths are validated
//! before any transform runs; on failure no output buffer is written.
//!
//! ```text
//! host (JNI / C / Swift)
//!   │  pointer + length
//!   ▼
//! mtcrypt-ffi ── null/length/overlap checks ── mtcrypt-crypto engines
//! ```
//!
//! A C header is generated into `OUT_DIR/mtcrypt.h` by the build script.

pub mod logging;

use std::ffi::{c_char, CStr};
use std::path::Path;
use std::slice;

use mtcrypt_core::{MtcConfig, MtcError, MtcResult};
use mtcrypt_crypto::{ctr, digest, ige, random, AesKey, CtrState, IgeIv};
use mtcrypt_crypto::{BLOCK_SIZE, SHA1_SIZE, SHA256_SIZE};
use zeroize::Zeroize;

pub const MTC_OK: i32 = 0;
pub const MTC_ERR_NULL: i32 = -1; // null pointer
pub const MTC_ERR_BADLEN: i32 = -2; // buffer or IV length
pub const MTC_ERR_KEY: i32 = -3; // key length
pub const MTC_ERR_STATE: i32 = -4; // CTR num out of range
pub const MTC_ERR_ENTROPY: i32 = -5; // OS randomness unavailable
pub const MTC_ERR_OVERLAP: i32 = -6; // input and output partially overlap
pub const MTC_ERR_CONFIG: i32 = -7;
pub const MTC_ERR_LOGGING: i32 = -8;
pub const MTC_ERR_INTERNAL: i32 = -9;

/// Map a library error to its C status code.
pub fn status_of(err: &MtcError) -> i32 {
    match err {
        MtcError::InvalidLength { .. } => MTC_ERR_BADLEN,
        MtcError::InvalidKey { .. } => MTC_ERR_KEY,
        MtcError::InvalidState { .. } => MTC_ERR_STATE,
        MtcError::EntropyFailure(_) => MTC_ERR_ENTROPY,
        MtcError::Config(_) | MtcError::Io(_) => MTC_ERR_CONFIG,
        MtcError::Logging(_) => MTC_ERR_LOGGING,
        MtcError::Other(_) => MTC_ERR_INTERNAL,
    }
}

fn to_status(result: MtcResult<()>) -> i32 {
    match result {
        Ok(()) => MTC_OK,
        Err(e) => {
            tracing::debug!("boundary call failed: {e}");
            status_of(&e)
        }
    }
}

/// Borrow `len` bytes at `ptr`; a null pointer is accepted only for `len == 0`.
unsafe fn input_slice<'a>(ptr: *const u8, len: usize) -> Option<&'a [u8]> {
    if len == 0 {
        Some(&[])
    } else if ptr.is_null() {
        None
    } else {
        Some(slice::from_raw_parts(ptr, len))
    }
}

unsafe fn output_slice<'a>(ptr: *mut u8, len: usize) -> Option<&'a mut [u8]> {
    if len == 0 {
        Some(&mut [])
    } else if ptr.is_null() {
        None
    } else {
        Some(slice::from_raw_parts_mut(ptr, len))
    }
}

fn partially_overlaps(a: *const u8, b: *const u8, len: usize) -> bool {
    let (a, b) = (a as usize, b as usize);
    a != b && a < b.saturating_add(len) && b < a.saturating_add(len)
}

// ------------- randomness / digests -------------

/// Fill `buf[0..len]` with OS randomness.
///
/// # Safety
/// `buf` must be valid for writes of `len` bytes (or null with `len == 0`).
#[no_mangle]
pub unsafe extern "C" fn mtc_rand_bytes(buf: *mut u8, len: usize) -> i32 {
    let Some(buf) = output_slice(buf, len) else {
        return MTC_ERR_NULL;
    };
    to_status(random::fill_bytes(buf))
}

/// Write the 20-byte SHA-1 of `msg[0..len]` to `out`.
///
/// # Safety
/// `msg` must be valid for reads of `len` bytes (or null with `len == 0`);
/// `out` must be valid for writes of 20 bytes.
#[no_mangle]
pub unsafe extern "C" fn mtc_sha1(msg: *const u8, len: usize, out: *mut u8) -> i32 {
    if out.is_null() {
        return MTC_ERR_NULL;
    }
    let Some(msg) = input_slice(msg, len) else {
        return MTC_ERR_NULL;
    };
    let digest = digest::sha1(msg);
    slice::from_raw_parts_mut(out, SHA1_SIZE).copy_from_slice(&digest);
    MTC_OK
}

/// Write the 32-byte SHA-256 of `msg[0..len]` to `out`.
///
/// # Safety
/// `msg` must be valid for reads of `len` bytes (or null with `len == 0`);
/// `out` must be valid for writes of 32 bytes.
#[no_mangle]
pub unsafe extern "C" fn mtc_sha256(msg: *const u8, len: usize, out: *mut u8) -> i32 {
    if out.is_null() {
        return MTC_ERR_NULL;
    }
    let Some(msg) = input_slice(msg, len) else {
        return MTC_ERR_NULL;
    };
    let digest = digest::sha256(msg);
    slice::from_raw_parts_mut(out, SHA256_SIZE).copy_from_slice(&digest);
    MTC_OK
}

// ------------- AES-256-IGE -------------

#[derive(Clone, Copy)]
enum Direction {
    Encrypt,
    Decrypt,
}

/// Encrypt `len` bytes from `input` into `output` with AES-256-IGE.
///
/// `len` must be a nonzero multiple of 16, `key_len` 32 and `iv_len` 32.
/// `input == output` encrypts in place; any other overlap is rejected.
/// The IV is read only.
///
/// # Safety
/// `input` must be valid for reads and `output` for writes of `len` bytes;
/// `key` and `iv` must be valid for reads of `key_len` / `iv_len` bytes.
#[no_mangle]
pub unsafe extern "C" fn mtc_aes_ige_encrypt(
    input: *const u8,
    output: *mut u8,
    len: usize,
    key: *const u8,
    key_len: usize,
    iv: *const u8,
    iv_len: usize,
) -> i32 {
    ige_call(Direction::Encrypt, input, output, len, key, key_len, iv, iv_len)
}

/// Decrypt `len` bytes from `input` into `output` with AES-256-IGE.
///
/// Same contract as [`mtc_aes_ige_encrypt`].
///
/// # Safety
/// See [`mtc_aes_ige_encrypt`].
#[no_mangle]
pub unsafe extern "C" fn mtc_aes_ige_decrypt(
    input: *const u8,
    output: *mut u8,
    len: usize,
    key: *const u8,
    key_len: usize,
    iv: *const u8,
    iv_len: usize,
) -> i32 {
    ige_call(Direction::Decrypt, input, output, len, key, key_len, iv, iv_len)
}

#[allow(clippy::too_many_arguments)]
unsafe fn ige_call(
    direction: Direction,
    input: *const u8,
    output: *mut u8,
    len: usize,
    key: *const u8,
    key_len: usize,
    iv: *const u8,
    iv_len: usize,
) -> i32 {
    if input.is_null() || output.is_null() || key.is_null() || iv.is_null() {
        return MTC_ERR_NULL;
    }
    if partially_overlaps(input, output, len) {
        tracing::debug!(len, "rejecting IGE call: input and output partially overlap");
        return MTC_ERR_OVERLAP;
    }

    let key = match AesKey::from_slice(slice::from_raw_parts(key, key_len)) {
        Ok(key) => key,
        Err(e) => return status_of(&e),
    };
    let iv = match IgeIv::from_slice(slice::from_raw_parts(iv, iv_len)) {
        Ok(iv) => iv,
        Err(e) => return status_of(&e),
    };

    if std::ptr::eq(input, output) {
        let buf = slice::from_raw_parts_mut(output, len);
        return to_status(match direction {
            Direction::Encrypt => ige::encrypt_in_place(&key, &iv, buf),
            Direction::Decrypt => ige::decrypt_in_place(&key, &iv, buf),
        });
    }

    let input = slice::from_raw_parts(input, len);
    let result = match direction {
        Direction::Encrypt => ige::encrypt(&key, &iv, input),
        Direction::Decrypt => ige::decrypt(&key, &iv, input),
    };
    match result {
        Ok(mut out) => {
            slice::from_raw_parts_mut(output, len).copy_from_slice(&out);
            out.zeroize();
            MTC_OK
        }
        Err(e) => to_status(Err(e)),
    }
}

// ------------- AES-256-CTR -------------

/// XOR `inout[0..len]` with the AES-256-CTR keystream and advance the stream.
///
/// `counter` and `ecount` are 16-byte blocks and `num` the offset into
/// `ecount`; all three are read, advanced and written back so the next call
/// continues the same stream. `num` must be below 16.
///
/// # Safety
/// `inout` must be valid for reads and writes of `len` bytes (or null with
/// `len == 0`); `key` valid for reads of `key_len` bytes; `counter` and
/// `ecount` valid for reads and writes of 16 bytes; `num` a valid, aligned
/// `uint32_t`. None of the state buffers may overlap `inout`.
#[no_mangle]
pub unsafe extern "C" fn mtc_aes_ctr_encrypt(
    inout: *mut u8,
    len: usize,
    key: *const u8,
    key_len: usize,
    counter: *mut u8,
    ecount: *mut u8,
    num: *mut u32,
) -> i32 {
    if key.is_null() || counter.is_null() || ecount.is_null() || num.is_null() {
        return MTC_ERR_NULL;
    }
    if len != 0 && inout.is_null() {
        return MTC_ERR_NULL;
    }

    let key = match AesKey::from_slice(slice::from_raw_parts(key, key_len)) {
        Ok(key) => key,
        Err(e) => return status_of(&e),
    };

    let mut counter_block = [0u8; BLOCK_SIZE];
    counter_block.copy_from_slice(slice::from_raw_parts(counter, BLOCK_SIZE));
    let mut ecount_block = [0u8; BLOCK_SIZE];
    ecount_block.copy_from_slice(slice::from_raw_parts(ecount, BLOCK_SIZE));

    let mut state = match CtrState::from_parts(counter_block, ecount_block, *num) {
        Ok(state) => state,
        Err(e) => return status_of(&e),
    };
    ecount_block.zeroize();

    if let Some(buf) = output_slice(inout, len) {
        ctr::apply(&key, &mut state, buf);
    }

    slice::from_raw_parts_mut(counter, BLOCK_SIZE).copy_from_slice(state.counter());
    slice::from_raw_parts_mut(ecount, BLOCK_SIZE).copy_from_slice(state.ecount());
    *num = state.num();
    MTC_OK
}

// ------------- host setup -------------

/// Load configuration from the TOML file at `config_path` (null = defaults)
/// and install logging.
///
/// # Safety
/// `config_path` must be null or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn mtc_init(config_path: *const c_char) -> i32 {
    let config = if config_path.is_null() {
        Ok(MtcConfig::default())
    } else {
        match CStr::from_ptr(config_path).to_str() {
            Ok(path) => MtcConfig::load(Path::new(path)),
            Err(e) => Err(MtcError::Config(format!("config path is not UTF-8: {e}"))),
        }
    };
    to_status(config.and_then(|config| logging::init_logging(&config.logging)))
}

/// Set log verbosity: 0 fatal, 1 error, 2 warning, 3 info, 4 debug,
/// 5 and above verbose. Negative values are rejected.
#[no_mangle]
pub extern "C" fn mtc_set_log_verbosity_level(level: i32) -> i32 {
    to_status(logging::set_verbosity(level))
}
