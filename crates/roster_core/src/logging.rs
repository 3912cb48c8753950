//! Core logging bootstrap.
//!
//! # Responsibility
//! - Initialize file-based rolling logs exactly once per process.
//! - Capture panics as metadata-only log events.
//!
//! # Invariants
//! - Initialization is idempotent for the same level and directory.
//! - Reconfiguration with a different level or directory is rejected.
//! - Initialization never panics.
//! - Log lines carry ids and counts, never user-entered field values.

use flexi_logger::{Cleanup, Criterion, FileSpec, Logger, LoggerHandle, Naming, WriteMode};
use log::{error, info};
use once_cell::sync::OnceCell;
use std::any::Any;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::str::FromStr;

const LOG_FILE_BASENAME: &str = "roster";
const MAX_LOG_FILE_SIZE_BYTES: u64 = 10 * 1024 * 1024;
const MAX_LOG_FILES: usize = 5;
const MAX_PANIC_PAYLOAD_CHARS: usize = 160;

static LOGGING_STATE: OnceCell<LoggingState> = OnceCell::new();
static PANIC_HOOK_INSTALLED: OnceCell<()> = OnceCell::new();

struct LoggingState {
    level: LogLevel,
    log_dir: PathBuf,
    _logger: LoggerHandle,
}

/// Supported log levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl FromStr for LogLevel {
    type Err = LoggingError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            other => Err(LoggingError::UnsupportedLevel(other.to_string())),
        }
    }
}

impl Display for LogLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Logging bootstrap failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoggingError {
    UnsupportedLevel(String),
    EmptyLogDir,
    RelativeLogDir(String),
    /// Logging is active with a different level or directory.
    AlreadyInitialized { active: String, requested: String },
    Backend(String),
}

impl Display for LoggingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedLevel(level) => write!(
                f,
                "unsupported log level `{level}`; expected trace|debug|info|warn|error"
            ),
            Self::EmptyLogDir => write!(f, "log_dir cannot be empty"),
            Self::RelativeLogDir(dir) => {
                write!(f, "log_dir must be an absolute path, got `{dir}`")
            }
            Self::AlreadyInitialized { active, requested } => write!(
                f,
                "logging already initialized with `{active}`; refusing to switch to `{requested}`"
            ),
            Self::Backend(message) => write!(f, "{message}"),
        }
    }
}

impl Error for LoggingError {}

/// Initializes core logging with `level` into `log_dir`.
///
/// # Errors
/// - Unsupported `level`.
/// - Empty or relative `log_dir`, or one that cannot be created.
/// - Logging already active with a different configuration.
/// - Logger backend setup failure.
pub fn init_logging(level: &str, log_dir: &str) -> Result<(), LoggingError> {
    let level = level.parse::<LogLevel>()?;
    let log_dir = normalize_log_dir(log_dir)?;

    let state = LOGGING_STATE.get_or_try_init(|| start_logger(level, &log_dir))?;
    ensure_same_config(state, level, &log_dir)
}

/// Returns `(level, log_dir)` when logging is active.
pub fn logging_status() -> Option<(LogLevel, PathBuf)> {
    LOGGING_STATE
        .get()
        .map(|state| (state.level, state.log_dir.clone()))
}

/// `debug` in debug builds, `info` in release builds.
pub fn default_log_level() -> LogLevel {
    if cfg!(debug_assertions) {
        LogLevel::Debug
    } else {
        LogLevel::Info
    }
}

fn start_logger(level: LogLevel, log_dir: &Path) -> Result<LoggingState, LoggingError> {
    std::fs::create_dir_all(log_dir).map_err(|err| {
        LoggingError::Backend(format!(
            "failed to create log directory `{}`: {err}",
            log_dir.display()
        ))
    })?;

    let logger = Logger::try_with_str(level.as_str())
        .map_err(|err| LoggingError::Backend(format!("invalid log spec `{level}`: {err}")))?
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
        .map_err(|err| LoggingError::Backend(format!("failed to start logger: {err}")))?;

    install_panic_hook_once();

    info!(
        "event=app_start module=core status=ok platform={} version={}",
        std::env::consts::OS,
        env!("CARGO_PKG_VERSION")
    );
    info!(
        "event=core_init module=core status=ok level={level} log_dir={}",
        log_dir.display()
    );

    Ok(LoggingState {
        level,
        log_dir: log_dir.to_path_buf(),
        _logger: logger,
    })
}

fn ensure_same_config(
    state: &LoggingState,
    level: LogLevel,
    log_dir: &Path,
) -> Result<(), LoggingError> {
    if state.log_dir != log_dir {
        return Err(LoggingError::AlreadyInitialized {
            active: state.log_dir.display().to_string(),
            requested: log_dir.display().to_string(),
        });
    }
    if state.level != level {
        return Err(LoggingError::AlreadyInitialized {
            active: state.level.to_string(),
            requested: level.to_string(),
        });
    }
    Ok(())
}

fn normalize_log_dir(log_dir: &str) -> Result<PathBuf, LoggingError> {
    let trimmed = log_dir.trim();
    if trimmed.is_empty() {
        return Err(LoggingError::EmptyLogDir);
    }
    let path = Path::new(trimmed);
    if !path.is_absolute() {
        return Err(LoggingError::RelativeLogDir(trimmed.to_string()));
    }
    Ok(path.to_path_buf())
}

fn install_panic_hook_once() {
    if PANIC_HOOK_INSTALLED.set(()).is_err() {
        return;
    }

    let previous_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let location = panic_info
            .location()
            .map(|loc| format!("{}:{}", loc.file(), loc.line()))
            .unwrap_or_else(|| "unknown".to_string());
        error!(
            "event=panic_captured module=core status=error location={location} payload={}",
            panic_payload_summary(panic_info.payload())
        );
        previous_hook(panic_info);
    }));
}

/// One-line, length-capped text for a panic payload.
pub(crate) fn panic_payload_summary(payload: &(dyn Any + Send)) -> String {
    let message = payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload");
    sanitize_message(message, MAX_PANIC_PAYLOAD_CHARS)
}

/// Flattens newlines and caps length so a payload stays on one log line.
fn sanitize_message(value: &str, max_chars: usize) -> String {
    let normalized = value.replace(['\n', '\r'], " ");
    let mut truncated = normalized.chars().take(max_chars).collect::<String>();
    if normalized.chars().count() > max_chars {
        truncated.push_str("...");
    }
    truncated
}
