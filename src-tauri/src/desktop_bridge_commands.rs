use serde::Serialize;
use serde_json::json;
use tauri::{AppHandle, State};
use url::Url;

use crate::{
    app_helpers::{append_runtime_log, log_warn, runtime_logger},
    desktop_bridge,
    log_export::{self, LogExportResult},
    logging::LogLevel,
    permission_policy::{should_grant_permission, PermissionKind},
    startup_status::StartupStatus,
    ShellState,
};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RuntimeInfo {
    pub deployment: &'static str,
    pub api_base_url: String,
    pub log_file_path: Option<String>,
    pub locale: &'static str,
    pub version: &'static str,
    pub platform: &'static str,
    pub backend_pid: Option<u32>,
}

#[tauri::command]
pub(crate) fn desktop_bridge_ping() -> &'static str {
    "pong"
}

#[tauri::command]
pub(crate) fn desktop_bridge_get_log_file_path() -> Option<String> {
    runtime_logger().map(|logger| logger.path().display().to_string())
}

#[tauri::command]
pub(crate) async fn desktop_bridge_export_logs(app_handle: AppHandle) -> LogExportResult {
    let outcome =
        tauri::async_runtime::spawn_blocking(move || log_export::export_runtime_logs(&app_handle))
            .await;
    match outcome {
        Ok(outcome) => {
            if let Err(error) = &outcome {
                log_warn(&format!("runtime log export did not complete: {error}"));
            }
            LogExportResult::from_outcome(outcome)
        }
        Err(error) => LogExportResult {
            ok: false,
            file_path: None,
            cancelled: None,
            error: Some(format!("Log export task failed: {error}")),
        },
    }
}

#[tauri::command]
pub(crate) fn desktop_bridge_get_backend_startup_status(
    state: State<'_, ShellState>,
) -> StartupStatus {
    state.current_startup_status()
}

#[tauri::command]
pub(crate) fn desktop_bridge_get_runtime_info(state: State<'_, ShellState>) -> RuntimeInfo {
    RuntimeInfo {
        deployment: state.deployment.as_str(),
        api_base_url: state.service_base_url(),
        log_file_path: desktop_bridge_get_log_file_path(),
        locale: state.locale,
        version: env!("CARGO_PKG_VERSION"),
        platform: std::env::consts::OS,
        backend_pid: state.supervisor.running_pid(),
    }
}

#[tauri::command]
pub(crate) fn desktop_bridge_check_permission(kind: String) -> bool {
    let parsed = PermissionKind::parse(&kind);
    let granted = should_grant_permission(parsed);
    if !granted {
        append_runtime_log(
            LogLevel::Warn,
            "Permission request denied",
            json!({ "permission": kind }),
        );
    }
    granted
}

#[tauri::command]
pub(crate) fn desktop_bridge_open_external(
    app_handle: AppHandle,
    url: String,
) -> Result<(), String> {
    let parsed = Url::parse(url.trim()).map_err(|error| format!("Invalid url '{url}': {error}"))?;
    desktop_bridge::open_in_external_browser(&app_handle, &parsed, log_warn)
}
