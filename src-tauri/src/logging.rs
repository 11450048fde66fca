use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
    sync::Mutex,
};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::LogExportError;

const EXPORT_FILE_PREFIX: &str = "report-formatter-runtime";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

#[derive(Debug, Serialize)]
struct LogEntry<'a> {
    level: LogLevel,
    message: &'a str,
    timestamp: String,
    context: Value,
}

/// Append-only JSON-lines log shared by every part of the shell.
///
/// Writes and exports are serialized through `write_lock` so an export never
/// observes a half-written line. Write failures go to the console only.
#[derive(Debug)]
pub struct RuntimeLogger {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl RuntimeLogger {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, level: LogLevel, message: &str, context: Value) {
        let line = match serialize_log_entry(level, message, context, Utc::now()) {
            Ok(line) => line,
            Err(error) => {
                log::error!("failed to serialize runtime log entry: {error}");
                return;
            }
        };

        if let Some(parent) = self.path.parent() {
            if let Err(error) = fs::create_dir_all(parent) {
                log::error!(
                    "failed to create runtime log directory {}: {}",
                    parent.display(),
                    error
                );
                return;
            }
        }

        let _guard = match self.write_lock.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Err(error) = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .and_then(|mut file| file.write_all(line.as_bytes()))
        {
            log::error!(
                "failed to append runtime log {}: {}",
                self.path.display(),
                error
            );
        }
    }

    /// Byte-for-byte copy of the live log; returns the copied length.
    pub fn export_to(&self, destination: &Path) -> Result<u64, LogExportError> {
        let _guard = match self.write_lock.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if !self.path.is_file() {
            return Err(LogExportError::LogUnavailable);
        }
        fs::copy(&self.path, destination).map_err(|source| LogExportError::ExportFailed {
            destination: destination.to_path_buf(),
            source,
        })
    }
}

pub fn serialize_log_entry(
    level: LogLevel,
    message: &str,
    context: Value,
    timestamp: DateTime<Utc>,
) -> Result<String, serde_json::Error> {
    let context = match context {
        Value::Null => Value::Object(Map::new()),
        other => other,
    };
    let entry = LogEntry {
        level,
        message,
        timestamp: timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
        context,
    };
    let mut line = serde_json::to_string(&entry)?;
    line.push('\n');
    Ok(line)
}

pub fn default_export_file_name(now: DateTime<Utc>) -> String {
    let stamp = now
        .to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace(':', "-");
    format!("{EXPORT_FILE_PREFIX}-{stamp}.log")
}
