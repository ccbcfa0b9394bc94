//! Cryptographically secure random bytes from the operating system
//!
//! Reads may block until the OS entropy pool is initialised. A failing
//! entropy source is reported as `EntropyFailure` and must be treated as
//! fatal by the caller; it is never retried here.

use rand::rngs::OsRng;
use rand::RngCore;
use tracing::{error, trace};

use crate::{MtcError, MtcResult};

/// Fill `buf` with OS randomness.
pub fn fill_bytes(buf: &mut [u8]) -> MtcResult<()> {
    trace!(len = buf.len(), "random fill");
    OsRng.try_fill_bytes(buf).map_err(|e| {
        error!("OS entropy source failed: {e}");
        MtcError::EntropyFailure(e.to_string())
    })
}

/// Return `len` fresh random bytes.
pub fn random_bytes(len: usize) -> MtcResult<Vec<u8>> {
    let mut buf = vec![0u8; len];
    fill_bytes(&mut buf)?;
    Ok(buf)
}
