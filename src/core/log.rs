//! Process-global log sink for CLI diagnostics.
//!
//! All diagnostics go to stderr so stdout stays reserved for compiled
//! manifests. Two formats: plain `[level] message` lines, and JSON
//! sequence records (RFC 7464: each record is an ASCII record separator,
//! a compact JSON object, and a newline) for machine consumers driving
//! the compiler as a subprocess.

use std::io::Write;
use std::sync::OnceLock;

use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use crate::error::Error;

const RECORD_SEPARATOR: char = '\u{1e}';

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Error => "error",
            Level::Warn => "warn",
            Level::Info => "info",
            Level::Debug => "debug",
            Level::Trace => "trace",
        }
    }

    /// Map stacked `-v` flags to a level: warnings by default, then
    /// info, debug, trace.
    pub fn from_verbosity(count: u8) -> Self {
        match count {
            0 => Level::Warn,
            1 => Level::Info,
            2 => Level::Debug,
            _ => Level::Trace,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Text,
    JsonSeq,
}

#[derive(Debug, Clone)]
struct Sink {
    level: Level,
    format: Format,
    identifier: Option<String>,
}

impl Default for Sink {
    fn default() -> Self {
        Self {
            level: Level::Warn,
            format: Format::Text,
            identifier: None,
        }
    }
}

static SINK: OnceLock<Sink> = OnceLock::new();

/// Configure the sink. First call wins; later calls are ignored so the
/// sink stays immutable once the CLI has started logging.
pub fn init(level: Level, format: Format, identifier: Option<String>) {
    let _ = SINK.set(Sink {
        level,
        format,
        identifier,
    });
}

fn sink() -> Sink {
    SINK.get().cloned().unwrap_or_default()
}

pub fn enabled(level: Level) -> bool {
    level <= sink().level
}

#[derive(Debug, Serialize)]
struct Record<'a> {
    time: String,
    level: &'static str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    identifier: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<&'a serde_json::Value>,
}

fn render_text(level: Level, message: &str) -> String {
    format!("[{}] {}", level.as_str(), message)
}

fn render_json(record: &Record<'_>) -> String {
    // A record that cannot serialize would lose the diagnostic entirely,
    // so fall back to a minimal hand-built object.
    let body = serde_json::to_string(record).unwrap_or_else(|_| {
        format!(
            "{{\"level\":\"{}\",\"message\":\"unserializable log record\"}}",
            record.level
        )
    });
    format!("{}{}", RECORD_SEPARATOR, body)
}

fn write_line(line: &str) {
    let stderr = std::io::stderr();
    let mut handle = stderr.lock();
    let _ = writeln!(handle, "{}", line);
}

pub fn emit(level: Level, message: &str) {
    let sink = sink();
    if level > sink.level {
        return;
    }
    match sink.format {
        Format::Text => write_line(&render_text(level, message)),
        Format::JsonSeq => {
            let record = Record {
                time: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
                level: level.as_str(),
                message,
                identifier: sink.identifier.as_deref(),
                code: None,
                details: None,
            };
            write_line(&render_json(&record));
        }
    }
}

/// Emit a failed operation's error. The JSON format carries the error
/// code and structured details; the text format prints the message and
/// any hints as separate lines.
pub fn emit_error(err: &Error) {
    let sink = sink();
    match sink.format {
        Format::Text => {
            write_line(&render_text(Level::Error, &err.message));
            for hint in &err.hints {
                write_line(&render_text(Level::Error, &format!("hint: {}", hint.message)));
            }
        }
        Format::JsonSeq => {
            let record = Record {
                time: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
                level: Level::Error.as_str(),
                message: &err.message,
                identifier: sink.identifier.as_deref(),
                code: Some(err.code.as_str()),
                details: Some(&err.details),
            };
            write_line(&render_json(&record));
        }
    }
}
