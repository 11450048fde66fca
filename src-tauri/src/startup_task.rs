use std::sync::Arc;

use serde_json::json;
use tauri::{AppHandle, Manager};

use crate::{
    app_helpers::{append_runtime_log, log_error, log_info, log_warn},
    backend_config::LaunchConfig,
    backend_http::HttpHealthProbe,
    backend_readiness::await_ready,
    backend_supervisor::ServiceEventReporter,
    error::SupervisorError,
    launch_plan::{self, LaunchPlan},
    logging::LogLevel,
    main_window, port_resolver, runtime_paths,
    startup_status::{
        readiness_progress, StartupTransition, PROGRESS_PORT_RESOLVED, PROGRESS_SPAWNING,
    },
    ui_dispatch, ShellState,
};

/// Routes asynchronous service failures into the same path as launch errors.
pub(crate) struct ShellEventReporter {
    app_handle: AppHandle,
}

impl ShellEventReporter {
    pub(crate) fn new(app_handle: AppHandle) -> Self {
        Self { app_handle }
    }
}

impl ServiceEventReporter for ShellEventReporter {
    fn report_fatal(&self, error: &SupervisorError) {
        fail_startup(&self.app_handle, error);
    }
}

/// Error phase, a structured log entry and an alert. Never exits the shell.
///
/// The alert blocks the calling thread until dismissed; keep this off the
/// main thread.
pub(crate) fn fail_startup(app_handle: &AppHandle, error: &SupervisorError) {
    let state = app_handle.state::<ShellState>();
    let texts = state.texts;
    let applied = state.update_startup_status(
        app_handle,
        StartupTransition::Fail {
            message: error.startup_message(&texts).to_string(),
        },
    );
    if applied.is_none() {
        log_info(&format!("ignoring backend failure after terminal error: {error}"));
        return;
    }

    let mut context = error.log_context();
    if let Some(object) = context.as_object_mut() {
        object.insert("baseUrl".to_string(), json!(state.service_base_url()));
    }
    append_runtime_log(LogLevel::Error, "Bundled backend marked as failed", context);

    ui_dispatch::show_error_alert(
        app_handle,
        error.alert_title(&texts),
        &error.to_string(),
        log_warn,
    );
}

pub fn spawn_startup_task(app_handle: AppHandle) {
    tauri::async_runtime::spawn(async move {
        let worker_handle = app_handle.clone();
        let joined =
            tauri::async_runtime::spawn_blocking(move || run_startup(&worker_handle)).await;
        if let Err(error) = joined {
            log_error(&format!("backend startup task failed: {error}"));
        }
    });
}

fn run_startup(app_handle: &AppHandle) {
    let state = app_handle.state::<ShellState>();
    if !state.auto_start_backend {
        log_info(&format!(
            "bundled backend auto-start disabled, expecting service at {}",
            state.service_base_url()
        ));
        open_main_window(app_handle);
        state.update_startup_status(
            app_handle,
            StartupTransition::Ready {
                message: state.texts.ready.to_string(),
            },
        );
        return;
    }

    let pid = match launch_backend(app_handle, &state) {
        Ok(pid) => pid,
        Err(error) if !is_reportable_launch_error(&error) => {
            log_info(&format!("bundled backend launch skipped: {error}"));
            return;
        }
        Err(error) => {
            open_main_window(app_handle);
            fail_startup(app_handle, &error);
            return;
        }
    };
    log_info(&format!("bundled backend launched with pid {pid}"));

    // The window does not wait for readiness; the page follows the status events.
    open_main_window(app_handle);
    wait_for_readiness(app_handle, &state.launch_config);
}

/// A launch refused because the shell is quitting is not a startup failure.
fn is_reportable_launch_error(error: &SupervisorError) -> bool {
    !matches!(error, SupervisorError::ShuttingDown)
}

fn launch_backend(app_handle: &AppHandle, state: &ShellState) -> Result<u32, SupervisorError> {
    let texts = state.texts;
    let config = &state.launch_config;
    state.update_startup_status(
        app_handle,
        StartupTransition::Begin {
            message: texts.preparing.to_string(),
        },
    );

    let port = port_resolver::resolve_port(&config.host, config.preferred_port)?;
    if port != config.preferred_port {
        log_warn(&format!(
            "preferred port {} is busy, using {port}",
            config.preferred_port
        ));
    }
    state.update_startup_status(
        app_handle,
        StartupTransition::Progress {
            progress: PROGRESS_PORT_RESOLVED,
            message: texts.allocating_port.to_string(),
        },
    );

    let base_url = state.set_service_base_url(launch_plan::service_base_url(&config.host, port));
    append_runtime_log(
        LogLevel::Info,
        "Desktop backend endpoint configured",
        json!({
            "baseUrl": base_url,
            "readyEndpoint": format!("{base_url}{}", launch_plan::HEALTH_PATH),
        }),
    );

    state.update_startup_status(
        app_handle,
        StartupTransition::Progress {
            progress: PROGRESS_SPAWNING,
            message: texts.launching.to_string(),
        },
    );

    let executable =
        runtime_paths::resolve_backend_executable(app_handle, state.deployment, log_warn);
    let plan = LaunchPlan::for_service(
        executable,
        &config.host,
        port,
        state.deployment.is_packaged(),
    );
    let reporter: Arc<dyn ServiceEventReporter> =
        Arc::new(ShellEventReporter::new(app_handle.clone()));
    state.supervisor.launch(&plan, reporter)
}

fn wait_for_readiness(app_handle: &AppHandle, config: &LaunchConfig) {
    let state = app_handle.state::<ShellState>();
    let base_url = state.service_base_url();
    let endpoint = match launch_plan::health_endpoint(&base_url) {
        Ok(endpoint) => endpoint,
        Err(error) => {
            log_error(&error);
            fail_startup(
                app_handle,
                &SupervisorError::ReadinessTimeout {
                    endpoint: base_url,
                    attempts: 0,
                },
            );
            return;
        }
    };

    let readiness = config.readiness;
    let probe = HttpHealthProbe::new(endpoint.clone(), readiness.probe_timeout);
    let waiting_message = state.texts.waiting_ready;
    let ready = await_ready(
        &probe,
        readiness.attempts,
        readiness.interval,
        |attempt, max_attempts| {
            state.update_startup_status(
                app_handle,
                StartupTransition::Progress {
                    progress: readiness_progress(attempt, max_attempts),
                    message: waiting_message.to_string(),
                },
            );
        },
    );

    if ready {
        log_info(&format!("bundled backend is ready at {endpoint}"));
        state.update_startup_status(
            app_handle,
            StartupTransition::Ready {
                message: state.texts.ready.to_string(),
            },
        );
        return;
    }

    fail_startup(
        app_handle,
        &SupervisorError::ReadinessTimeout {
            endpoint: endpoint.to_string(),
            attempts: readiness.attempts,
        },
    );
}

fn open_main_window(app_handle: &AppHandle) {
    if let Err(error) = ui_dispatch::run_on_main_thread_dispatch(
        app_handle,
        "create main window",
        |main_app| {
            if let Err(error) = main_window::create_main_window(main_app) {
                log_error(&error);
            }
        },
    ) {
        log_error(&error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn launch_refused_during_shutdown_is_not_reported() {
        assert!(!is_reportable_launch_error(&SupervisorError::ShuttingDown));
    }

    #[test]
    fn launch_failures_outside_shutdown_are_reported() {
        assert!(is_reportable_launch_error(&SupervisorError::AlreadyLaunched {
            pid: 42
        }));
        assert!(is_reportable_launch_error(&SupervisorError::PortExhausted {
            host: "127.0.0.1".to_string(),
            first: 8000,
            last: 8019,
        }));
    }
}
