use thiserror::Error;

pub type MtcResult<T> = Result<T, MtcError>;

#[derive(Debug, Error)]
pub enum MtcError {
    #[error("invalid {what} length: {actual} bytes (expected {expected})")]
    InvalidLength {
        what: &'static str,
        expected: String,
        actual: usize,
    },

    #[error("invalid key length: {actual} bytes (expected 32)")]
    InvalidKey { actual: usize },

    #[error("invalid CTR state: num = {num} (must be below 16)")]
    InvalidState { num: u32 },

    #[error("entropy source failure: {0}")]
    EntropyFailure(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("logging error: {0}")]
    Logging(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl MtcError {
    /// Length error for a buffer that must be a nonzero multiple of `block`.
    pub fn not_block_multiple(what: &'static str, block: usize, actual: usize) -> Self {
        Self::InvalidLength {
            what,
            expected: format!("a nonzero multiple of {block}"),
            actual,
        }
    }

    /// Length error for a buffer with one fixed valid size.
    pub fn wrong_size(what: &'static str, expected: usize, actual: usize) -> Self {
        Self::InvalidLength {
            what,
            expected: expected.to_string(),
            actual,
        }
    }
}
