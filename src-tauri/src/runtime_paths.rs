use std::{
    env,
    path::{Path, PathBuf},
};
use tauri::{path::BaseDirectory, AppHandle, Manager};

use crate::startup_mode::DeploymentMode;

pub const BACKEND_PATH_ENV: &str = "REPORT_DESKTOP_BACKEND_PATH";
pub const LOG_PATH_ENV: &str = "REPORT_DESKTOP_LOG_PATH";

const BACKEND_DIR_NAME: &str = "backend";
const DATA_ROOT_DIR_NAME: &str = ".report-formatter";
const LOG_DIR_NAME: &str = "logs";
const RUNTIME_LOG_FILE_NAME: &str = "desktop-runtime.log";

pub fn backend_binary_name() -> &'static str {
    if cfg!(target_os = "windows") {
        "api-server.exe"
    } else {
        "api-server"
    }
}

pub fn default_data_root_dir() -> Option<PathBuf> {
    home::home_dir().map(|home| home.join(DATA_ROOT_DIR_NAME))
}

pub fn dev_backend_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(BACKEND_DIR_NAME)
}

pub fn resolve_resource_path<F>(app: &AppHandle, relative_path: &str, log: F) -> Option<PathBuf>
where
    F: Fn(&str),
{
    if let Ok(path) = app.path().resolve(relative_path, BaseDirectory::Resource) {
        if path.exists() {
            return Some(path);
        }
    }

    let updater_resource = Path::new("_up_").join("resources").join(relative_path);
    if let Ok(path) = app
        .path()
        .resolve(&updater_resource, BaseDirectory::Resource)
    {
        if path.exists() {
            return Some(path);
        }
    }

    log(&format!(
        "resource not found: {} (checked direct and _up_/resources)",
        relative_path
    ));
    None
}

/// Where the service executable is expected to live.
///
/// The returned path may not exist; `BackendSupervisor::launch` turns a
/// missing file into `ExecutableNotFound` before spawning anything.
pub fn resolve_backend_executable<F>(app: &AppHandle, mode: DeploymentMode, log: F) -> PathBuf
where
    F: Fn(&str),
{
    let explicit = env::var(BACKEND_PATH_ENV).ok();
    let relative = format!("{BACKEND_DIR_NAME}/{}", backend_binary_name());
    let packaged = match mode {
        DeploymentMode::Packaged => resolve_resource_path(app, &relative, &log).or_else(|| {
            app.path()
                .resource_dir()
                .ok()
                .map(|dir| dir.join(BACKEND_DIR_NAME).join(backend_binary_name()))
        }),
        DeploymentMode::Development => None,
    };
    resolve_backend_executable_with(explicit.as_deref(), mode, packaged, dev_backend_dir())
}

fn resolve_backend_executable_with(
    explicit: Option<&str>,
    mode: DeploymentMode,
    packaged_candidate: Option<PathBuf>,
    dev_dir: PathBuf,
) -> PathBuf {
    if let Some(explicit) = explicit.map(str::trim).filter(|value| !value.is_empty()) {
        return PathBuf::from(explicit);
    }

    match (mode, packaged_candidate) {
        (DeploymentMode::Packaged, Some(candidate)) => candidate,
        _ => dev_dir.join(backend_binary_name()),
    }
}

/// Log file location: env override, app data dir, home data root, temp dir.
pub fn resolve_runtime_log_path(app_data_dir: Option<PathBuf>) -> PathBuf {
    resolve_runtime_log_path_with(
        env::var(LOG_PATH_ENV).ok().as_deref(),
        app_data_dir,
        default_data_root_dir(),
    )
}

fn resolve_runtime_log_path_with(
    explicit: Option<&str>,
    app_data_dir: Option<PathBuf>,
    data_root_dir: Option<PathBuf>,
) -> PathBuf {
    if let Some(explicit) = explicit.map(str::trim).filter(|value| !value.is_empty()) {
        return PathBuf::from(explicit);
    }

    app_data_dir
        .or(data_root_dir)
        .unwrap_or_else(|| env::temp_dir().join("report-formatter"))
        .join(LOG_DIR_NAME)
        .join(RUNTIME_LOG_FILE_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_backend_path_overrides_both_modes() {
        let resolved = resolve_backend_executable_with(
            Some(" /opt/report/api-server "),
            DeploymentMode::Packaged,
            Some(PathBuf::from("/resources/backend/api-server")),
            PathBuf::from("/crate/backend"),
        );
        assert_eq!(resolved, PathBuf::from("/opt/report/api-server"));
    }

    #[test]
    fn packaged_mode_uses_resource_candidate() {
        let candidate = PathBuf::from("/resources/backend").join(backend_binary_name());
        let resolved = resolve_backend_executable_with(
            None,
            DeploymentMode::Packaged,
            Some(candidate.clone()),
            PathBuf::from("/crate/backend"),
        );
        assert_eq!(resolved, candidate);
    }

    #[test]
    fn development_mode_uses_crate_backend_dir() {
        let resolved = resolve_backend_executable_with(
            Some("   "),
            DeploymentMode::Development,
            None,
            PathBuf::from("/crate/backend"),
        );
        assert_eq!(
            resolved,
            PathBuf::from("/crate/backend").join(backend_binary_name())
        );
    }

    #[test]
    fn runtime_log_path_prefers_app_data_then_data_root() {
        let from_app_data = resolve_runtime_log_path_with(
            None,
            Some(PathBuf::from("/data/app")),
            Some(PathBuf::from("/home/user/.report-formatter")),
        );
        assert_eq!(
            from_app_data,
            PathBuf::from("/data/app/logs/desktop-runtime.log")
        );

        let from_root = resolve_runtime_log_path_with(
            None,
            None,
            Some(PathBuf::from("/home/user/.report-formatter")),
        );
        assert_eq!(
            from_root,
            PathBuf::from("/home/user/.report-formatter/logs/desktop-runtime.log")
        );
    }

    #[test]
    fn runtime_log_path_falls_back_to_temp_dir() {
        let path = resolve_runtime_log_path_with(None, None, None);
        assert!(path.starts_with(env::temp_dir()));
        assert!(path.ends_with("logs/desktop-runtime.log"));
    }
}
