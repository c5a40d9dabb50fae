use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Mutex, OnceLock};

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;

static SINK: OnceLock<LogSink> = OnceLock::new();

pub enum LogSink {
    Stderr,
    File(Mutex<File>),
    Disabled,
}

impl LogSink {
    pub fn file(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self::File(Mutex::new(file)))
    }
}

#[derive(Clone, Debug, Serialize)]
struct StructuredLogLine<'a> {
    timestamp: String,
    level: &'a str,
    event: &'a str,
    details: Value,
}

/// Selects where log lines go for the rest of the process. Only the first call wins.
pub fn init(sink: LogSink) {
    let _ = SINK.set(sink);
}

pub fn info(event: &str, details: Value) {
    emit_log("info", event, details);
}

pub fn warn(event: &str, details: Value) {
    emit_log("warn", event, details);
}

pub fn error(event: &str, details: Value) {
    emit_log("error", event, details);
}

pub fn emit_log(level: &str, event: &str, details: Value) {
    let Some(sink) = SINK.get() else {
        return;
    };
    if matches!(sink, LogSink::Disabled) {
        return;
    }
    let Some(line) = format_line(level, event, details) else {
        return;
    };
    match sink {
        LogSink::Stderr => eprintln!("{line}"),
        LogSink::File(file) => {
            if let Ok(mut file) = file.lock() {
                let _ = writeln!(file, "{line}");
            }
        }
        LogSink::Disabled => {}
    }
}

fn format_line(level: &str, event: &str, details: Value) -> Option<String> {
    let line = StructuredLogLine {
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        level,
        event,
        details,
    };
    serde_json::to_string(&line).ok()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::format_line;

    #[test]
    fn log_line_is_single_json_object() {
        let line = format_line("info", "game_started", json!({ "enemies": 4 }))
            .expect("line should serialize");
        assert!(!line.contains('\n'));
        let parsed: serde_json::Value = serde_json::from_str(&line).expect("valid json");
        assert_eq!(parsed["level"], "info");
        assert_eq!(parsed["event"], "game_started");
        assert_eq!(parsed["details"]["enemies"], 4);
        assert!(parsed["timestamp"].as_str().is_some_and(|ts| ts.ends_with('Z')));
    }
}
