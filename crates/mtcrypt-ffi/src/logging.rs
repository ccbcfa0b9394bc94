//! Process-wide tracing subscriber for the embedding host
//!
//! The subscriber can only be installed once per process. The level filter
//! sits behind a reload handle and the output goes through a [`LogSink`]
//! whose target can be swapped, so later calls can change the verbosity and
//! the log file in place. The output format is fixed by the first install.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use mtcrypt_core::{LogFormat, LoggingConfig, MtcError, MtcResult};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, reload, util::SubscriberInitExt, EnvFilter, Registry,
};

type FilterHandle = reload::Handle<EnvFilter, Registry>;

/// Where formatted events end up.
enum LogTarget {
    Stderr,
    File { path: PathBuf, file: File },
}

impl LogTarget {
    fn open(path: Option<&Path>) -> MtcResult<Self> {
        match path {
            Some(path) => {
                let file = OpenOptions::new().create(true).append(true).open(path)?;
                Ok(Self::File {
                    path: path.to_path_buf(),
                    file,
                })
            }
            None => Ok(Self::Stderr),
        }
    }

    fn path(&self) -> Option<&Path> {
        match self {
            Self::Stderr => None,
            Self::File { path, .. } => Some(path.as_path()),
        }
    }
}

/// Shared handle to the current [`LogTarget`], handed to the fmt layer.
#[derive(Clone)]
struct LogSink(Arc<Mutex<LogTarget>>);

impl LogSink {
    fn lock(&self) -> io::Result<MutexGuard<'_, LogTarget>> {
        self.0.lock().map_err(|_| io::Error::other("log target poisoned"))
    }
}

impl Write for LogSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match &mut *self.lock()? {
            LogTarget::Stderr => io::stderr().write(buf),
            LogTarget::File { file, .. } => file.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut *self.lock()? {
            LogTarget::Stderr => io::stderr().flush(),
            LogTarget::File { file, .. } => file.flush(),
        }
    }
}

impl<'a> MakeWriter<'a> for LogSink {
    type Writer = LogSink;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// The installed subscriber's adjustable parts.
struct Installed {
    filter: FilterHandle,
    sink: LogSink,
    format: LogFormat,
}

static INSTALLED: Mutex<Option<Installed>> = Mutex::new(None);

/// Install the subscriber described by `config`, or, if one is already
/// installed, switch it to `config.level` and `config.file`.
///
/// `RUST_LOG` overrides `config.level` on first installation. Asking for a
/// different `format` after installation is a [`MtcError::Logging`] error and
/// changes nothing.
pub fn init_logging(config: &LoggingConfig) -> MtcResult<()> {
    let mut installed = INSTALLED
        .lock()
        .map_err(|_| MtcError::Logging("logging state poisoned".into()))?;

    if let Some(active) = installed.as_ref() {
        return reconfigure(active, config);
    }

    let filter = EnvFilter::try_from_default_env().or_else(|_| parse_filter(&config.level))?;
    let (filter, handle) = reload::Layer::new(filter);
    let sink = LogSink(Arc::new(Mutex::new(LogTarget::open(config.file.as_deref())?)));

    let registry = tracing_subscriber::registry().with(filter);
    let result = match config.format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(sink.clone()))
            .try_init(),
        LogFormat::Text => registry
            .with(fmt::layer().with_ansi(false).with_writer(sink.clone()))
            .try_init(),
    };
    result.map_err(|e| MtcError::Logging(format!("installing subscriber: {e}")))?;

    *installed = Some(Installed {
        filter: handle,
        sink,
        format: config.format,
    });
    tracing::debug!(level = %config.level, format = ?config.format, "logging initialised");
    Ok(())
}

/// Apply a host verbosity level (0 = fatal .. 5 = verbose).
pub fn set_verbosity(verbosity: i32) -> MtcResult<()> {
    let level = LoggingConfig::verbosity_to_level(verbosity)?;
    let installed = INSTALLED
        .lock()
        .map_err(|_| MtcError::Logging("logging state poisoned".into()))?;

    match installed.as_ref() {
        Some(active) => reload_filter(&active.filter, level),
        None => {
            drop(installed);
            init_logging(&LoggingConfig {
                level: level.to_string(),
                ..LoggingConfig::default()
            })
        }
    }
}

fn reconfigure(active: &Installed, config: &LoggingConfig) -> MtcResult<()> {
    if active.format != config.format {
        return Err(MtcError::Logging(format!(
            "log format is already {:?}, cannot switch to {:?}",
            active.format, config.format
        )));
    }
    // Validate the level before touching the target so a bad config is a no-op.
    let filter = parse_filter(&config.level)?;

    let mut target = active
        .sink
        .lock()
        .map_err(|_| MtcError::Logging("log target poisoned".into()))?;
    if target.path() != config.file.as_deref() {
        *target = LogTarget::open(config.file.as_deref())?;
    }
    drop(target);

    active
        .filter
        .reload(filter)
        .map_err(|e| MtcError::Logging(format!("reloading filter: {e}")))?;
    tracing::debug!(level = %config.level, file = ?config.file, "logging reconfigured");
    Ok(())
}

fn reload_filter(handle: &FilterHandle, level: &str) -> MtcResult<()> {
    let filter = parse_filter(level)?;
    handle
        .reload(filter)
        .map_err(|e| MtcError::Logging(format!("reloading filter: {e}")))?;
    tracing::debug!(level, "log level changed");
    Ok(())
}

fn parse_filter(level: &str) -> MtcResult<EnvFilter> {
    EnvFilter::try_new(level)
        .map_err(|e| MtcError::Config(format!("invalid log level '{level}': {e}")))
}
