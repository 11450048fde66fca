#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod app_helpers;
mod backend_config;
mod backend_exit_state;
mod backend_http;
mod backend_launch;
mod backend_process_lifecycle;
mod backend_readiness;
mod backend_supervisor;
mod desktop_bridge;
mod desktop_bridge_commands;
mod error;
mod exit_cleanup;
mod exit_events;
mod launch_plan;
mod log_export;
mod logging;
mod main_window;
mod origin_policy;
mod permission_policy;
mod port_resolver;
mod process_control;
mod runtime_paths;
mod service_events;
mod shell_locale;
mod startup_mode;
mod startup_status;
mod startup_task;
mod status_broadcast;
mod ui_dispatch;

use std::{
    env,
    sync::{Arc, Mutex},
};

use serde_json::json;
use tauri::{webview::PageLoadEvent, AppHandle, Manager, RunEvent};
use tauri_plugin_log::{Target, TargetKind};
use url::Url;

use crate::{
    app_helpers::{append_runtime_log, init_runtime_logger, log_info, log_warn},
    backend_config::LaunchConfig,
    backend_supervisor::BackendSupervisor,
    desktop_bridge_commands::{
        desktop_bridge_check_permission, desktop_bridge_export_logs,
        desktop_bridge_get_backend_startup_status, desktop_bridge_get_log_file_path,
        desktop_bridge_get_runtime_info, desktop_bridge_open_external, desktop_bridge_ping,
    },
    logging::LogLevel,
    origin_policy::{NavigationAllowlist, DEV_SERVER_URL_ENV},
    shell_locale::StartupTexts,
    startup_mode::{DeploymentMode, BACKEND_AUTO_START_ENV, DEPLOYMENT_ENV},
    startup_status::StartupStatusMachine,
};

/// Process-wide state shared by commands, the startup task and exit handling.
pub(crate) struct ShellState {
    pub(crate) supervisor: Arc<BackendSupervisor>,
    pub(crate) startup: Mutex<StartupStatusMachine>,
    service_base_url: Mutex<String>,
    pub(crate) deployment: DeploymentMode,
    pub(crate) auto_start_backend: bool,
    pub(crate) dev_server_url: Option<Url>,
    pub(crate) allowlist: NavigationAllowlist,
    pub(crate) locale: &'static str,
    pub(crate) texts: StartupTexts,
    pub(crate) launch_config: LaunchConfig,
}

impl ShellState {
    fn new(
        deployment: DeploymentMode,
        auto_start_backend: bool,
        dev_server_url: Option<Url>,
        locale: &'static str,
        launch_config: LaunchConfig,
    ) -> Self {
        let texts = shell_locale::startup_texts_for_locale(locale);
        let allowlist = NavigationAllowlist::for_deployment(deployment, dev_server_url.as_ref());
        let base_url =
            launch_plan::service_base_url(&launch_config.host, launch_config.preferred_port);
        Self {
            supervisor: Arc::new(BackendSupervisor::default()),
            startup: Mutex::new(StartupStatusMachine::new(texts.idle)),
            service_base_url: Mutex::new(base_url),
            deployment,
            auto_start_backend,
            dev_server_url,
            allowlist,
            locale,
            texts,
            launch_config,
        }
    }

    /// Preferred port until the resolver picked one, the resolved port after.
    pub(crate) fn service_base_url(&self) -> String {
        match self.service_base_url.lock() {
            Ok(url) => url.clone(),
            Err(error) => {
                log::warn!("service base url lock poisoned: {error}");
                error.into_inner().clone()
            }
        }
    }

    pub(crate) fn set_service_base_url(&self, base_url: String) -> String {
        let mut guard = match self.service_base_url.lock() {
            Ok(guard) => guard,
            Err(error) => {
                log::warn!("service base url lock poisoned: {error}");
                error.into_inner()
            }
        };
        *guard = base_url;
        guard.clone()
    }
}

fn console_log_plugin<R: tauri::Runtime>() -> tauri::plugin::TauriPlugin<R> {
    tauri_plugin_log::Builder::new()
        .level(if cfg!(debug_assertions) {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        })
        .targets([Target::new(TargetKind::Stdout)])
        .build()
}

fn build_shell_state(app_handle: &AppHandle) -> ShellState {
    let app_data_dir = app_handle.path().app_data_dir().ok();
    let logger = init_runtime_logger(runtime_paths::resolve_runtime_log_path(app_data_dir));
    let locale = shell_locale::resolve_shell_locale();
    let is_dev = tauri::is_dev();

    let (deployment, deployment_note) =
        startup_mode::resolve_deployment_mode(env::var(DEPLOYMENT_ENV).ok().as_deref(), is_dev);
    if let Some(note) = deployment_note {
        log_info(&note);
    }
    let auto_start_backend = startup_mode::should_auto_start_backend(
        deployment,
        env::var(BACKEND_AUTO_START_ENV).ok().as_deref(),
        |message| log_warn(&message),
    );
    let dev_server_url = match deployment {
        DeploymentMode::Development => origin_policy::resolve_dev_server_url(
            env::var(DEV_SERVER_URL_ENV).ok().as_deref(),
            app_handle.config().build.dev_url.as_ref(),
            log_warn,
        ),
        DeploymentMode::Packaged => None,
    };
    let launch_config = LaunchConfig::from_env(|message| log_warn(&message));

    let state = ShellState::new(
        deployment,
        auto_start_backend,
        dev_server_url,
        locale,
        launch_config,
    );
    append_runtime_log(
        LogLevel::Info,
        "Desktop shell starting",
        json!({
            "deployment": deployment.as_str(),
            "autoStartBackend": auto_start_backend,
            "locale": locale,
            "logFilePath": logger.path().display().to_string(),
            "allowedOrigins": state.allowlist.origins(),
        }),
    );
    state
}

fn main() {
    tauri::Builder::default()
        .plugin(console_log_plugin())
        .plugin(tauri_plugin_dialog::init())
        .plugin(tauri_plugin_opener::init())
        .invoke_handler(tauri::generate_handler![
            desktop_bridge_ping,
            desktop_bridge_get_log_file_path,
            desktop_bridge_export_logs,
            desktop_bridge_get_backend_startup_status,
            desktop_bridge_get_runtime_info,
            desktop_bridge_check_permission,
            desktop_bridge_open_external
        ])
        .on_page_load(|webview, payload| match payload.event() {
            PageLoadEvent::Started => {
                log::debug!("page-load started: {}", payload.url());
            }
            PageLoadEvent::Finished => {
                log::debug!("page-load finished: {}", payload.url());
                let app_handle = webview.app_handle();
                let Some(state) = app_handle.try_state::<ShellState>() else {
                    return;
                };
                status_broadcast::replay_status_on_load(webview, &state.current_startup_status());
                if webview.label() == main_window::MAIN_WINDOW_LABEL {
                    main_window::reveal_main_window(app_handle, log_warn);
                }
            }
        })
        .setup(|app| {
            let app_handle = app.handle().clone();
            let state = build_shell_state(&app_handle);
            let auto_start_backend = state.auto_start_backend;
            app.manage(state);

            if auto_start_backend {
                if let Err(error) = main_window::create_splash_window(&app_handle) {
                    log_warn(&error);
                }
            }
            startup_task::spawn_startup_task(app_handle);
            Ok(())
        })
        .build(tauri::generate_context!())
        .expect("error while building tauri application")
        .run(|app_handle, event| match event {
            RunEvent::ExitRequested { api, .. } => {
                exit_events::handle_exit_requested(app_handle, &api);
            }
            RunEvent::Exit => {
                exit_events::handle_exit_event(app_handle);
            }
            _ => {}
        });
}
