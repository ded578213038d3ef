//! Core logging bootstrap.
//!
//! # Responsibility
//! - Start the rolling file logger at most once per process.
//! - Capture panics as metadata-only log events.
//!
//! # Invariants
//! - Re-initialization with the same level and directory is a no-op.
//! - Re-initialization with a different level or directory is rejected.
//! - Initialization never panics.

use flexi_logger::{Cleanup, Criterion, FileSpec, Logger, LoggerHandle, Naming, WriteMode};
use log::{error, info};
use once_cell::sync::OnceCell;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

const LOG_FILE_BASENAME: &str = "modelstore";
const MAX_LOG_FILE_SIZE_BYTES: u64 = 5 * 1024 * 1024;
const MAX_LOG_FILES: usize = 3;
const MAX_PANIC_PAYLOAD_CHARS: usize = 160;

static ACTIVE_LOGGER: OnceCell<ActiveLogger> = OnceCell::new();
static PANIC_HOOK: OnceCell<()> = OnceCell::new();

struct ActiveLogger {
    level: log::LevelFilter,
    log_dir: PathBuf,
    _handle: LoggerHandle,
}

/// Logging bootstrap failure.
#[derive(Debug)]
pub enum LoggingError {
    UnsupportedLevel(String),
    InvalidDirectory(String),
    AlreadyInitialized {
        level: log::LevelFilter,
        log_dir: PathBuf,
    },
    Backend(String),
}

impl Display for LoggingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedLevel(level) => write!(
                f,
                "unsupported log level `{level}`; expected trace|debug|info|warn|error"
            ),
            Self::InvalidDirectory(reason) => write!(f, "invalid log directory: {reason}"),
            Self::AlreadyInitialized { level, log_dir } => write!(
                f,
                "logging already initialized with level `{level}` at `{}`",
                log_dir.display()
            ),
            Self::Backend(reason) => write!(f, "failed to start logger: {reason}"),
        }
    }
}

impl Error for LoggingError {}

/// Starts file logging under `log_dir` with the given level.
///
/// # Errors
/// - `UnsupportedLevel` for unknown level names.
/// - `InvalidDirectory` when `log_dir` is blank, relative, or cannot be created.
/// - `AlreadyInitialized` when logging runs with a different configuration.
/// - `Backend` when `flexi_logger` fails to start.
pub fn init_logging(level: &str, log_dir: impl AsRef<Path>) -> Result<(), LoggingError> {
    let level = parse_level(level)?;
    let log_dir = checked_log_dir(log_dir.as_ref())?;

    let active = ACTIVE_LOGGER.get_or_try_init(|| start_logger(level, &log_dir))?;
    if active.level != level || active.log_dir != log_dir {
        return Err(LoggingError::AlreadyInitialized {
            level: active.level,
            log_dir: active.log_dir.clone(),
        });
    }
    Ok(())
}

/// Returns the active `(level, log_dir)`, or `None` before initialization.
pub fn logging_status() -> Option<(log::LevelFilter, PathBuf)> {
    ACTIVE_LOGGER
        .get()
        .map(|active| (active.level, active.log_dir.clone()))
}

/// Level used when the caller does not pick one.
pub fn default_log_level() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    }
}

fn start_logger(level: log::LevelFilter, log_dir: &Path) -> Result<ActiveLogger, LoggingError> {
    std::fs::create_dir_all(log_dir).map_err(|err| {
        LoggingError::InvalidDirectory(format!("cannot create `{}`: {err}", log_dir.display()))
    })?;

    let handle = Logger::try_with_str(level.to_string().to_ascii_lowercase())
        .map_err(|err| LoggingError::Backend(err.to_string()))?
        .log_to_file(
            FileSpec::default()
                .directory(log_dir)
                .basename(LOG_FILE_BASENAME),
        )
        .rotate(
            Criterion::Size(MAX_LOG_FILE_SIZE_BYTES),
            Naming::Numbers,
            Cleanup::KeepLogFiles(MAX_LOG_FILES),
        )
        .write_mode(WriteMode::BufferAndFlush)
        .append()
        .format_for_files(flexi_logger::detailed_format)
        .start()
        .map_err(|err| LoggingError::Backend(err.to_string()))?;

    install_panic_hook();
    info!(
        "event=logging_init module=core status=ok level={level} platform={} version={}",
        std::env::consts::OS,
        env!("CARGO_PKG_VERSION")
    );

    Ok(ActiveLogger {
        level,
        log_dir: log_dir.to_path_buf(),
        _handle: handle,
    })
}

fn parse_level(level: &str) -> Result<log::LevelFilter, LoggingError> {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => Ok(log::LevelFilter::Trace),
        "debug" => Ok(log::LevelFilter::Debug),
        "info" => Ok(log::LevelFilter::Info),
        "warn" | "warning" => Ok(log::LevelFilter::Warn),
        "error" => Ok(log::LevelFilter::Error),
        other => Err(LoggingError::UnsupportedLevel(other.to_string())),
    }
}

fn checked_log_dir(log_dir: &Path) -> Result<PathBuf, LoggingError> {
    if log_dir.as_os_str().is_empty() {
        return Err(LoggingError::InvalidDirectory(
            "log directory cannot be empty".to_string(),
        ));
    }
    if !log_dir.is_absolute() {
        return Err(LoggingError::InvalidDirectory(format!(
            "log directory must be absolute, got `{}`",
            log_dir.display()
        )));
    }
    Ok(log_dir.to_path_buf())
}

fn install_panic_hook() {
    if PANIC_HOOK.set(()).is_err() {
        return;
    }

    let previous_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let location = panic_info
            .location()
            .map(|loc| format!("{}:{}", loc.file(), loc.line()))
            .unwrap_or_else(|| "unknown".to_string());
        let payload = panic_info
            .payload()
            .downcast_ref::<&str>()
            .map(|message| (*message).to_string())
            .or_else(|| panic_info.payload().downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_string());
        error!(
            "event=panic_captured module=core status=error location={location} payload={}",
            truncate_single_line(&payload, MAX_PANIC_PAYLOAD_CHARS)
        );
        previous_hook(panic_info);
    }));
}

pub(crate) fn truncate_single_line(value: &str, max_chars: usize) -> String {
    let normalized = value.replace(['\n', '\r'], " ");
    let mut truncated = normalized.chars().take(max_chars).collect::<String>();
    if normalized.chars().count() > max_chars {
        truncated.push_str("...");
    }
    truncated
}

#[cfg(test)]
mod tests {
    use super::{
        checked_log_dir, init_logging, logging_status, parse_level, truncate_single_line,
        LoggingError,
    };
    use std::path::Path;

    #[test]
    fn parse_level_is_case_insensitive() {
        assert_eq!(parse_level(" WARNING ").unwrap(), log::LevelFilter::Warn);
        assert!(matches!(
            parse_level("loud"),
            Err(LoggingError::UnsupportedLevel(_))
        ));
    }

    #[test]
    fn relative_log_dir_is_rejected() {
        let err = checked_log_dir(Path::new("logs/dev")).unwrap_err();
        assert!(err.to_string().contains("absolute"));
    }

    #[test]
    fn truncation_removes_newlines() {
        let truncated = truncate_single_line("one\ntwo\rthree", 6);
        assert_eq!(truncated, "one tw...");
    }

    #[test]
    fn init_is_idempotent_and_rejects_reconfiguration() {
        let dir = tempfile::tempdir().unwrap();
        let other = tempfile::tempdir().unwrap();

        init_logging("info", dir.path()).unwrap();
        init_logging("INFO", dir.path()).unwrap();

        let level_err = init_logging("debug", dir.path()).unwrap_err();
        assert!(matches!(level_err, LoggingError::AlreadyInitialized { .. }));
        let dir_err = init_logging("info", other.path()).unwrap_err();
        assert!(matches!(dir_err, LoggingError::AlreadyInitialized { .. }));

        let (level, active_dir) = logging_status().unwrap();
        assert_eq!(level, log::LevelFilter::Info);
        assert_eq!(active_dir, dir.path());
    }
}
