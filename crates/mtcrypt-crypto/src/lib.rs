//! mtcrypt-crypto: symmetric primitives for an MTProto-style secure transport
//!
//! Every engine is stateless per call. Chaining state the caller wants to
//! carry between calls (the CTR counter, keystream cache and offset) lives in
//! an explicit value type owned by the caller.
//!
//! ```text
//! caller buffers ─┬── ige::encrypt / ige::decrypt   (AES-256, 32-byte IV)
//!                 ├── ctr::apply + CtrState          (AES-256, resumable)
//!                 ├── digest::sha1 / digest::sha256
//!                 └── random::fill_bytes             (OS entropy)
//! ```

pub mod ctr;
pub mod digest;
pub mod ige;
pub mod key;
pub mod random;

pub use self::ctr::CtrState;
pub use digest::{sha1, sha256, sha256_parts};
pub use key::{AesKey, IgeIv};
pub use mtcrypt_core::{MtcError, MtcResult};
pub use random::{fill_bytes, random_bytes};

/// Size of an AES-256 key in bytes
pub const KEY_SIZE: usize = 32;

/// Size of an AES block in bytes
pub const BLOCK_SIZE: usize = 16;

/// Size of an IGE IV (two blocks)
pub const IGE_IV_SIZE: usize = 2 * BLOCK_SIZE;

/// Size of a SHA-1 digest
pub const SHA1_SIZE: usize = 20;

/// Size of a SHA-256 digest
pub const SHA256_SIZE: usize = 32;
