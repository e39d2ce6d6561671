//! Reloadable logging
//!
//! The subscriber is installed once. Level and destination live behind
//! handles so every run cycle can re-apply `debug`, `quiet` and `logfile`
//! from the freshly parsed config. The output format is fixed at install.

use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use gde_config::{LogFormat, LogLevel, LogSettings};
use parking_lot::RwLock;
use tracing::debug;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::reload::{self, Handle};
use tracing_subscriber::{EnvFilter, Registry, fmt, prelude::*};

/// Type alias for the filter reload handle
pub type FilterHandle = Handle<EnvFilter, Registry>;

/// Handles to the installed subscriber
pub struct Logging {
    filter: FilterHandle,
    writer: LogWriter,
}

impl Logging {
    /// Install the global subscriber
    ///
    /// # Errors
    ///
    /// Fails if a global subscriber is already set or the log file cannot
    /// be opened.
    pub fn init(settings: &LogSettings) -> Result<Self> {
        let (filter_layer, filter) = reload::Layer::new(filter_for(settings.level));
        let writer = LogWriter::stderr();

        let ansi = settings.file.is_none() && io::stderr().is_terminal();
        let (console, json) = match settings.format {
            LogFormat::Console => (
                Some(
                    fmt::layer()
                        .with_target(true)
                        .with_ansi(ansi)
                        .with_writer(writer.clone()),
                ),
                None,
            ),
            LogFormat::Json => (None, Some(fmt::layer().json().with_writer(writer.clone()))),
        };

        tracing_subscriber::registry()
            .with(filter_layer)
            .with(console)
            .with(json)
            .try_init()
            .context("failed to set global default subscriber")?;

        let logging = Self { filter, writer };
        logging.apply(settings)?;
        Ok(logging)
    }

    /// Re-apply level and destination
    pub fn apply(&self, settings: &LogSettings) -> Result<()> {
        self.filter
            .reload(filter_for(settings.level))
            .context("failed to reload log filter")?;
        self.writer.set_file(settings.file.as_deref())?;
        debug!(level = settings.level.as_str(), file = ?settings.file, "logging configured");
        Ok(())
    }
}

fn filter_for(level: LogLevel) -> EnvFilter {
    EnvFilter::new(level.as_str())
}

// =============================================================================
// Writer
// =============================================================================

enum Target {
    Stderr,
    File {
        path: PathBuf,
        writer: NonBlocking,
        _guard: WorkerGuard,
    },
}

/// `MakeWriter` whose destination can be switched at runtime
#[derive(Clone)]
pub struct LogWriter {
    target: Arc<RwLock<Target>>,
}

impl LogWriter {
    /// Writer that starts on stderr
    pub fn stderr() -> Self {
        Self {
            target: Arc::new(RwLock::new(Target::Stderr)),
        }
    }

    /// Path of the current log file, if any
    pub fn file(&self) -> Option<PathBuf> {
        match &*self.target.read() {
            Target::Stderr => None,
            Target::File { path, .. } => Some(path.clone()),
        }
    }

    /// Switch to `path`, or back to stderr on `None`
    ///
    /// Switching away from a file flushes it. Re-applying the current
    /// destination is a no-op.
    pub fn set_file(&self, path: Option<&Path>) -> Result<()> {
        if self.file().as_deref() == path {
            return Ok(());
        }

        let next = match path {
            None => Target::Stderr,
            Some(path) => open(path)?,
        };
        // old target dropped outside the lock; its guard blocks until flushed
        let previous = std::mem::replace(&mut *self.target.write(), next);
        drop(previous);
        Ok(())
    }
}

fn open(path: &Path) -> Result<Target> {
    let name = path
        .file_name()
        .with_context(|| format!("logfile {} has no file name", path.display()))?;
    let dir = path
        .parent()
        .filter(|d| !d.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(name.to_string_lossy())
        .build(dir)
        .with_context(|| format!("failed to open logfile {}", path.display()))?;
    let (writer, guard) = tracing_appender::non_blocking(appender);

    Ok(Target::File {
        path: path.to_path_buf(),
        writer,
        _guard: guard,
    })
}

/// Writer handed out per event
pub enum LogSink {
    /// Standard error
    Stderr(io::Stderr),
    /// Background file writer
    File(NonBlocking),
}

impl Write for LogSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Stderr(w) => w.write(buf),
            Self::File(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Stderr(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

impl<'a> MakeWriter<'a> for LogWriter {
    type Writer = LogSink;

    fn make_writer(&'a self) -> Self::Writer {
        match &*self.target.read() {
            Target::Stderr => LogSink::Stderr(io::stderr()),
            Target::File { writer, .. } => LogSink::File(writer.clone()),
        }
    }
}
