//! Diagnostics sink injected into the provider
//!
//! The pipeline never logs through globals; it reports events to a
//! [`Diagnostics`] implementation handed to it at construction time.

use chrono::Local;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Debug,
    Info,
    Warn,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Debug => "DEBUG",
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
        };
        f.write_str(s)
    }
}

/// Structured key/value context attached to an event
pub type Context<'a> = &'a [(&'a str, &'a str)];

/// Receives diagnostic events from the provider
pub trait Diagnostics: Send + Sync {
    fn record(&self, severity: Severity, source: &str, message: &str, context: Context<'_>);

    fn debug(&self, source: &str, message: &str, context: Context<'_>) {
        self.record(Severity::Debug, source, message, context);
    }

    fn info(&self, source: &str, message: &str, context: Context<'_>) {
        self.record(Severity::Info, source, message, context);
    }

    fn warn(&self, source: &str, message: &str, context: Context<'_>) {
        self.record(Severity::Warn, source, message, context);
    }

    fn error(&self, source: &str, message: &str, context: Context<'_>) {
        self.record(Severity::Error, source, message, context);
    }
}

fn format_context(context: Context<'_>) -> String {
    context
        .iter()
        .map(|(k, v)| format!(" {}={:?}", k, v))
        .collect()
}

/// Forwards events to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn record(&self, severity: Severity, source: &str, message: &str, context: Context<'_>) {
        let context = format_context(context);
        match severity {
            Severity::Debug => tracing::debug!(source = source, "{}{}", message, context),
            Severity::Info => tracing::info!(source = source, "{}{}", message, context),
            Severity::Warn => tracing::warn!(source = source, "{}{}", message, context),
            Severity::Error => tracing::error!(source = source, "{}{}", message, context),
        }
    }
}

/// Appends events to a plain-text log file
#[derive(Debug)]
pub struct FileLog {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileLog {
    /// Default location: `<config dir>/corsaro/provider.log`
    pub fn default_path() -> Option<PathBuf> {
        Some(dirs::config_dir()?.join("corsaro").join("provider.log"))
    }

    /// Create (truncating) the log file at `path`
    pub fn init(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut file = File::create(&path)?;
        writeln!(
            file,
            "=== Provider Log Started {} ===",
            Local::now().format("%Y-%m-%d %H:%M:%S")
        )?;

        Ok(Self {
            path,
            lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Last `n` lines of the log
    pub fn read_recent(&self, n: usize) -> Vec<String> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => {
                let lines: Vec<&str> = content.lines().collect();
                let start = lines.len().saturating_sub(n);
                lines[start..].iter().map(|l| l.to_string()).collect()
            }
            Err(_) => vec!["Could not read log file".to_string()],
        }
    }
}

impl Diagnostics for FileLog {
    fn record(&self, severity: Severity, source: &str, message: &str, context: Context<'_>) {
        let timestamp = Local::now().format("%H:%M:%S");
        let line = format!(
            "[{}] [{}] {}: {}{}",
            timestamp,
            source,
            severity,
            message,
            format_context(context)
        );

        // Errors also go to stderr
        if severity == Severity::Error {
            eprintln!("{}", line);
        }

        let _guard = self.lock.lock();
        if let Ok(mut file) = OpenOptions::new().append(true).open(&self.path) {
            let _ = writeln!(file, "{}", line);
        }
    }
}

/// One captured event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub severity: Severity,
    pub source: String,
    pub message: String,
    pub context: Vec<(String, String)>,
}

impl Event {
    /// Value for a context key, if present
    pub fn get(&self, key: &str) -> Option<&str> {
        self.context
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Keeps events in memory
#[derive(Debug, Default)]
pub struct MemoryDiagnostics {
    events: Mutex<Vec<Event>>,
}

impl MemoryDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Events at or above `severity`
    pub fn at_least(&self, severity: Severity) -> Vec<Event> {
        self.events()
            .into_iter()
            .filter(|e| e.severity >= severity)
            .collect()
    }
}

impl Diagnostics for MemoryDiagnostics {
    fn record(&self, severity: Severity, source: &str, message: &str, context: Context<'_>) {
        if let Ok(mut events) = self.events.lock() {
            events.push(Event {
                severity,
                source: source.to_string(),
                message: message.to_string(),
                context: context
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_diagnostics_captures_context() {
        let diag = MemoryDiagnostics::new();
        diag.info("search", "Found 3 torrents", &[("query", "naruto")]);
        diag.error("search", "Request failed", &[("url", "https://x/search/?q=naruto")]);

        let events = diag.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].get("query"), Some("naruto"));
        assert_eq!(events[0].get("url"), None);

        let errors = diag.at_least(Severity::Warn);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "Request failed");
    }

    #[test]
    fn test_file_log_appends_lines() {
        let path = std::env::temp_dir()
            .join(format!("corsaro-log-test-{}", std::process::id()))
            .join("provider.log");
        let log = FileLog::init(&path).unwrap();

        log.warn("parse", "Unable to parse date", &[("text", "boh")]);
        log.info("search", "Found 2 torrents", &[]);

        let recent = log.read_recent(2);
        assert_eq!(recent.len(), 2);
        assert!(recent[0].contains("[parse] WARN: Unable to parse date text=\"boh\""));
        assert!(recent[1].ends_with("[search] INFO: Found 2 torrents"));

        let all = log.read_recent(10);
        assert!(all[0].starts_with("=== Provider Log Started"));

        let _ = std::fs::remove_file(log.path());
    }
}
