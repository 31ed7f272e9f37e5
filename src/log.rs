//! File logging for chief runs.
//!
//! Messages go to `~/.chief/chief.log` (or `Config::log_file`), which is
//! truncated whenever logging is pointed at it. Debug mode comes from
//! `--debug` or `CHIEF_DEBUG=1`; `CHIEF_DEBUG=trace` also records every
//! orchestrator event. With echo enabled, WARN and ERROR lines are also
//! written to stderr.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::RwLock;

static LOG_PATH: RwLock<Option<PathBuf>> = RwLock::new(None);
static ECHO_STDERR: AtomicBool = AtomicBool::new(false);
static LOG_LEVEL: AtomicU8 = AtomicU8::new(LogLevel::Info as u8);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LogLevel {
    Error = 0,
    Warn = 1,
    Info = 2,
    Debug = 3,
    Trace = 4,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warn => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
            LogLevel::Trace => "TRACE",
        }
    }

    fn from_u8(v: u8) -> Self {
        match v {
            0 => LogLevel::Error,
            1 => LogLevel::Warn,
            2 => LogLevel::Info,
            3 => LogLevel::Debug,
            _ => LogLevel::Trace,
        }
    }
}

/// Level requested by a `CHIEF_DEBUG` value, if any.
pub fn parse_debug_level(value: &str) -> Option<LogLevel> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "debug" => Some(LogLevel::Debug),
        "trace" => Some(LogLevel::Trace),
        _ => None,
    }
}

fn level_from_env() -> Option<LogLevel> {
    std::env::var("CHIEF_DEBUG")
        .ok()
        .as_deref()
        .and_then(parse_debug_level)
}

/// Default log location, `~/.chief/chief.log`.
pub fn default_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".chief").join("chief.log"))
}

/// Initialize logging. `path` overrides the default location.
///
/// `CHIEF_DEBUG` can raise the level above what `debug` asks for, never
/// lower it.
pub fn init(path: Option<&Path>, debug: bool) {
    let requested = if debug { LogLevel::Debug } else { LogLevel::Info };
    set_level(level_from_env().map_or(requested, |env| env.max(requested)));

    if let Some(path) = path.map(Path::to_path_buf).or_else(default_path) {
        redirect(&path);
    }
}

/// Point logging at `path`, truncating it. Does nothing if already there.
pub fn redirect(path: &Path) {
    let mut current = match LOG_PATH.write() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    if current.as_deref() == Some(path) {
        return;
    }
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    let _ = std::fs::write(path, "");
    *current = Some(path.to_path_buf());
}

/// Mirror WARN and ERROR lines to stderr (used by `--verbose`).
pub fn set_echo(enabled: bool) {
    ECHO_STDERR.store(enabled, Ordering::SeqCst);
}

pub fn set_level(level: LogLevel) {
    LOG_LEVEL.store(level as u8, Ordering::SeqCst);
}

pub fn level() -> LogLevel {
    LogLevel::from_u8(LOG_LEVEL.load(Ordering::Relaxed))
}

pub fn log_at(level: LogLevel, msg: &str) {
    if level > self::level() {
        return;
    }

    let line = format!(
        "[{}] [{}] {}",
        chrono::Local::now().format("%H:%M:%S%.3f"),
        level.as_str(),
        msg
    );

    if level <= LogLevel::Warn && ECHO_STDERR.load(Ordering::Relaxed) {
        eprintln!("{}", line);
    }

    let current = match LOG_PATH.read() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    if let Some(path) = current.as_deref() {
        if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(path) {
            let _ = writeln!(file, "{}", line);
        }
    }
}

#[macro_export]
macro_rules! clog {
    ($($arg:tt)*) => {
        $crate::log::log_at($crate::log::LogLevel::Info, &format!($($arg)*))
    };
}

#[macro_export]
macro_rules! clog_error {
    ($($arg:tt)*) => {
        $crate::log::log_at($crate::log::LogLevel::Error, &format!($($arg)*))
    };
}

#[macro_export]
macro_rules! clog_warn {
    ($($arg:tt)*) => {
        $crate::log::log_at($crate::log::LogLevel::Warn, &format!($($arg)*))
    };
}

#[macro_export]
macro_rules! clog_debug {
    ($($arg:tt)*) => {
        $crate::log::log_at($crate::log::LogLevel::Debug, &format!($($arg)*))
    };
}

#[macro_export]
macro_rules! clog_trace {
    ($($arg:tt)*) => {
        $crate::log::log_at($crate::log::LogLevel::Trace, &format!($($arg)*))
    };
}
