pub mod config;
pub mod error;

pub use config::{LogFormat, LoggingConfig, MtcConfig};
pub use error::{MtcError, MtcResult};
