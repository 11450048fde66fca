use std::path::PathBuf;

use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use tauri::{AppHandle, Manager};
use tauri_plugin_dialog::DialogExt;

use crate::{
    app_helpers::{append_runtime_log, runtime_logger},
    error::LogExportError,
    logging::{default_export_file_name, LogLevel},
    ShellState,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogExportResult {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancelled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl LogExportResult {
    pub fn from_outcome(outcome: Result<PathBuf, LogExportError>) -> Self {
        match outcome {
            Ok(path) => Self {
                ok: true,
                file_path: Some(path.display().to_string()),
                cancelled: None,
                error: None,
            },
            Err(LogExportError::ExportCancelled) => Self {
                ok: false,
                file_path: None,
                cancelled: Some(true),
                error: None,
            },
            Err(error) => Self {
                ok: false,
                file_path: None,
                cancelled: None,
                error: Some(error.to_string()),
            },
        }
    }
}

/// Asks for a destination with a native save dialog, then copies the log.
///
/// Blocks on the dialog; call it from the blocking pool.
pub fn export_runtime_logs(app: &AppHandle) -> Result<PathBuf, LogExportError> {
    let logger = runtime_logger().ok_or(LogExportError::LogUnavailable)?;
    if !logger.path().is_file() {
        return Err(LogExportError::LogUnavailable);
    }

    let title = app.state::<ShellState>().texts.export_dialog_title;
    let mut dialog = app
        .dialog()
        .file()
        .set_title(title)
        .set_file_name(default_export_file_name(Utc::now()))
        .add_filter("Log files", &["log", "txt"]);
    if let Ok(downloads) = app.path().download_dir() {
        dialog = dialog.set_directory(downloads);
    }

    let destination = dialog
        .blocking_save_file()
        .ok_or(LogExportError::ExportCancelled)?
        .into_path()
        .map_err(|error| LogExportError::ExportFailed {
            destination: PathBuf::new(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidInput, error.to_string()),
        })?;

    let bytes = logger.export_to(&destination)?;
    append_runtime_log(
        LogLevel::Info,
        "Runtime logs exported",
        json!({ "filePath": destination.display().to_string(), "bytes": bytes }),
    );
    Ok(destination)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancelled_export_serializes_without_error() {
        let value = serde_json::to_value(LogExportResult::from_outcome(Err(
            LogExportError::ExportCancelled,
        )))
        .expect("serialize result");
        assert_eq!(value, json!({ "ok": false, "cancelled": true }));
    }

    #[test]
    fn successful_export_reports_file_path() {
        let value = serde_json::to_value(LogExportResult::from_outcome(Ok(PathBuf::from(
            "/tmp/report-formatter-runtime.log",
        ))))
        .expect("serialize result");
        assert_eq!(
            value,
            json!({ "ok": true, "filePath": "/tmp/report-formatter-runtime.log" })
        );
    }

    #[test]
    fn unavailable_log_reports_error_text() {
        let result = LogExportResult::from_outcome(Err(LogExportError::LogUnavailable));
        assert!(!result.ok);
        assert_eq!(result.cancelled, None);
        assert_eq!(
            result.error.as_deref(),
            Some("Runtime logs are not available yet.")
        );
    }
}
