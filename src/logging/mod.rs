use crossbeam_channel::{bounded, Receiver, Sender};
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

// ---------------------------------------------------------------------------
// Log Level
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Trace = 0,
    Debug = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
    Off = 5,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "TRACE",
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
            Self::Off => "OFF",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "trace" => Self::Trace,
            "debug" => Self::Debug,
            "info" => Self::Info,
            "warn" | "warning" => Self::Warn,
            "error" => Self::Error,
            "off" | "none" | "disabled" => Self::Off,
            _ => Self::Info,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Trace,
            1 => Self::Debug,
            2 => Self::Info,
            3 => Self::Warn,
            4 => Self::Error,
            _ => Self::Off,
        }
    }

    fn as_log_level(&self) -> Option<log::Level> {
        match self {
            Self::Trace => Some(log::Level::Trace),
            Self::Debug => Some(log::Level::Debug),
            Self::Info => Some(log::Level::Info),
            Self::Warn => Some(log::Level::Warn),
            Self::Error => Some(log::Level::Error),
            Self::Off => None,
        }
    }

    fn color_code(&self) -> &'static str {
        match self {
            Self::Trace => "\x1b[90m", // gray
            Self::Debug => "\x1b[36m", // cyan
            Self::Info => "\x1b[32m",  // green
            Self::Warn => "\x1b[33m",  // yellow
            Self::Error => "\x1b[31m", // red
            Self::Off => "",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Log Entry
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct LogEntry {
    pub timestamp: f64,
    pub level: LogLevel,
    pub message: String,
    pub target: Option<String>,
    /// Channel topic the entry relates to, once known
    pub topic: Option<String>,
}

impl LogEntry {
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            timestamp: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs_f64(),
            level,
            message: message.into(),
            target: None,
            topic: None,
        }
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    /// Format the log entry as a colored string for terminal output.
    fn format_colored(&self) -> String {
        let reset = "\x1b[0m";
        let dim = "\x1b[2m";
        let color = self.level.color_code();

        let ts = format_timestamp(self.timestamp);

        let topic = self
            .topic
            .as_deref()
            .map(|t| format!(" \x1b[35m[{t}]{reset}"))
            .unwrap_or_default();
        let target = self
            .target
            .as_deref()
            .map(|t| format!(" {dim}{t}{reset}"))
            .unwrap_or_default();

        format!(
            "{dim}{ts}{reset} {color}{:<5}{reset}{target}{topic} {}",
            self.level.as_str(),
            self.message,
        )
    }
}

fn format_timestamp(ts: f64) -> String {
    use chrono::{DateTime, TimeZone, Utc};
    let secs = ts as i64;
    let micros = ((ts - secs as f64) * 1_000_000.0) as u32;
    let dt: DateTime<Utc> = Utc
        .timestamp_opt(secs, micros * 1_000)
        .single()
        .unwrap_or_else(Utc::now);
    // e.g. 2026-02-27T02:17:25.113520+00:00
    dt.format("%Y-%m-%dT%H:%M:%S%.6f+00:00").to_string()
}

// ---------------------------------------------------------------------------
// Log Config
// ---------------------------------------------------------------------------

/// Where entries end up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogSink {
    /// Bounded queue drained by a background thread writing to stderr.
    Stderr,
    /// Forward to the `log` facade; the host application picks the backend.
    Facade,
    /// Keep entries in memory, readable through [`Logger::entries`].
    Memory,
}

/// Configuration for a [`Logger`].
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Minimum log level to output.
    pub level: LogLevel,
    pub sink: LogSink,
    /// Queue capacity for the stderr sink.
    pub queue_size: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Off,
            sink: LogSink::Facade,
            queue_size: 10_000,
        }
    }
}

impl LogConfig {
    /// Debug level on stderr.
    pub fn verbose() -> Self {
        Self {
            level: LogLevel::Debug,
            sink: LogSink::Stderr,
            ..Self::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Logger handle
// ---------------------------------------------------------------------------

enum Output {
    Queue {
        sender: Sender<LogEntry>,
        running: Arc<AtomicBool>,
    },
    Facade,
    Memory(Mutex<Vec<LogEntry>>),
}

struct LoggerInner {
    level: AtomicU8,
    output: Output,
}

impl Drop for LoggerInner {
    fn drop(&mut self) {
        if let Output::Queue { running, .. } = &self.output {
            running.store(false, Ordering::SeqCst);
        }
    }
}

/// Cloneable logging handle handed to sockets and channels through
/// [`crate::config::ClientConfig`]. Clones share level and output.
#[derive(Clone)]
pub struct Logger {
    inner: Arc<LoggerInner>,
}

impl Logger {
    pub fn new(config: LogConfig) -> Self {
        let output = match config.sink {
            LogSink::Stderr => spawn_queue(config.queue_size),
            LogSink::Facade => Output::Facade,
            LogSink::Memory => Output::Memory(Mutex::new(Vec::new())),
        };
        Self {
            inner: Arc::new(LoggerInner {
                level: AtomicU8::new(config.level as u8),
                output,
            }),
        }
    }

    /// Logger that stays silent until [`Logger::enable_debug`] is called.
    pub fn disabled() -> Self {
        Self::new(LogConfig::default())
    }

    /// In-memory logger at the given level.
    pub fn memory(level: LogLevel) -> Self {
        Self::new(LogConfig {
            level,
            sink: LogSink::Memory,
            ..LogConfig::default()
        })
    }

    pub fn level(&self) -> LogLevel {
        LogLevel::from_u8(self.inner.level.load(Ordering::Relaxed))
    }

    pub fn set_level(&self, level: LogLevel) {
        self.inner.level.store(level as u8, Ordering::Relaxed);
    }

    /// Turn on diagnostic output for every holder of this handle.
    pub fn enable_debug(&self) {
        self.set_level(LogLevel::Debug);
    }

    #[inline]
    pub fn enabled(&self, level: LogLevel) -> bool {
        level != LogLevel::Off && level >= self.level()
    }

    /// Send an entry to the sink (non-blocking, drops if the queue is full).
    pub fn log_entry(&self, entry: LogEntry) {
        if !self.enabled(entry.level) {
            return;
        }
        match &self.inner.output {
            Output::Queue { sender, .. } => {
                let _ = sender.try_send(entry);
            }
            Output::Facade => {
                if let Some(level) = entry.level.as_log_level() {
                    let target = entry.target.as_deref().unwrap_or("jwp_client");
                    match entry.topic.as_deref() {
                        Some(topic) => log::log!(target: target, level, "[{}] {}", topic, entry.message),
                        None => log::log!(target: target, level, "{}", entry.message),
                    }
                }
            }
            Output::Memory(entries) => entries.lock().push(entry),
        }
    }

    /// Build the message lazily so disabled levels cost nothing.
    #[inline]
    pub fn emit(&self, level: LogLevel, target: &str, message: impl FnOnce() -> String) {
        if self.enabled(level) {
            self.log_entry(LogEntry::new(level, message()).with_target(target));
        }
    }

    /// Entries captured by a memory logger; empty for other sinks.
    pub fn entries(&self) -> Vec<LogEntry> {
        match &self.inner.output {
            Output::Memory(entries) => entries.lock().clone(),
            _ => Vec::new(),
        }
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::disabled()
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sink = match self.inner.output {
            Output::Queue { .. } => "stderr",
            Output::Facade => "facade",
            Output::Memory(_) => "memory",
        };
        f.debug_struct("Logger")
            .field("level", &self.level())
            .field("sink", &sink)
            .finish()
    }
}

fn spawn_queue(queue_size: usize) -> Output {
    let (sender, receiver) = bounded::<LogEntry>(queue_size.max(1));
    let running = Arc::new(AtomicBool::new(true));
    let flag = running.clone();

    let spawned = std::thread::Builder::new()
        .name("jwp-logger".into())
        .spawn(move || log_consumer(receiver, flag));

    match spawned {
        Ok(_) => Output::Queue { sender, running },
        // No thread, no queue: fall back to the facade.
        Err(_) => Output::Facade,
    }
}

/// Consumer thread: drains the queue and writes to stderr.
fn log_consumer(receiver: Receiver<LogEntry>, running: Arc<AtomicBool>) {
    use std::io::Write;

    let stderr = std::io::stderr();

    while running.load(Ordering::SeqCst) {
        match receiver.recv_timeout(std::time::Duration::from_millis(100)) {
            Ok(entry) => {
                let line = entry.format_colored();
                let mut handle = stderr.lock();
                let _ = writeln!(handle, "{}", line);
            }
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => continue,
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => break,
        }
    }

    // Flush remaining entries
    for entry in receiver.try_iter() {
        eprintln!("{}", entry.format_colored());
    }
}

// ---------------------------------------------------------------------------
// Convenience macros (internal use)
// ---------------------------------------------------------------------------

/// Log at trace level.
#[macro_export]
macro_rules! jlog_trace {
    ($logger:expr, $target:expr, $($arg:tt)*) => {
        ($logger).emit($crate::logging::LogLevel::Trace, $target, || format!($($arg)*))
    };
}

/// Log at debug level.
#[macro_export]
macro_rules! jlog_debug {
    ($logger:expr, $target:expr, $($arg:tt)*) => {
        ($logger).emit($crate::logging::LogLevel::Debug, $target, || format!($($arg)*))
    };
}

/// Log at info level.
#[macro_export]
macro_rules! jlog_info {
    ($logger:expr, $target:expr, $($arg:tt)*) => {
        ($logger).emit($crate::logging::LogLevel::Info, $target, || format!($($arg)*))
    };
}

/// Log at warn level.
#[macro_export]
macro_rules! jlog_warn {
    ($logger:expr, $target:expr, $($arg:tt)*) => {
        ($logger).emit($crate::logging::LogLevel::Warn, $target, || format!($($arg)*))
    };
}

/// Log at error level.
#[macro_export]
macro_rules! jlog_error {
    ($logger:expr, $target:expr, $($arg:tt)*) => {
        ($logger).emit($crate::logging::LogLevel::Error, $target, || format!($($arg)*))
    };
}
