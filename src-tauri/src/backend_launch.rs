use std::{
    process::{Command, Stdio},
    sync::Arc,
    thread,
};

#[cfg(target_os = "windows")]
use std::os::windows::process::CommandExt;

use serde_json::json;

use crate::{
    app_helpers::{append_runtime_log, log_error},
    backend_supervisor::{BackendSupervisor, ServiceEventReporter},
    error::SupervisorError,
    launch_plan::LaunchPlan,
    logging::LogLevel,
    service_events::{decide_service_event, ServiceEvent, ServiceEventOutcome},
};
#[cfg(target_os = "windows")]
use crate::process_control::WINDOWS_CREATE_NO_WINDOW;

impl BackendSupervisor {
    /// Spawns the service described by `plan` and starts its exit observer.
    ///
    /// Fatal events after this returns go to `reporter`; failures before the
    /// child exists are returned directly.
    pub fn launch(
        self: &Arc<Self>,
        plan: &LaunchPlan,
        reporter: Arc<dyn ServiceEventReporter>,
    ) -> Result<u32, SupervisorError> {
        let mut guard = self.lock_child();
        if self.is_intentional_shutdown() {
            return Err(SupervisorError::ShuttingDown);
        }
        if let Some(child) = guard.as_ref() {
            return Err(SupervisorError::AlreadyLaunched { pid: child.id() });
        }
        if !plan.executable.is_file() {
            return Err(SupervisorError::ExecutableNotFound {
                path: plan.executable.clone(),
            });
        }

        let mut command = Command::new(&plan.executable);
        command
            .args(&plan.args)
            .envs(plan.env.iter().map(|(key, value)| (key, value)))
            .stdin(Stdio::null());
        if plan.packaged_mode {
            command.stdout(Stdio::null()).stderr(Stdio::null());
            #[cfg(target_os = "windows")]
            {
                command.creation_flags(WINDOWS_CREATE_NO_WINDOW);
            }
        } else {
            command.stdout(Stdio::inherit()).stderr(Stdio::inherit());
        }

        let child = match command.spawn() {
            Ok(child) => child,
            Err(error) => {
                let event = ServiceEvent::SpawnError {
                    path: plan.executable.clone(),
                    cause: error.to_string(),
                };
                return Err(match decide_service_event(event, self.is_intentional_shutdown()) {
                    ServiceEventOutcome::Fatal(error) => error,
                    ServiceEventOutcome::Suppressed | ServiceEventOutcome::Clean => {
                        SupervisorError::ShuttingDown
                    }
                });
            }
        };

        let pid = child.id();
        *guard = Some(child);
        drop(guard);

        append_runtime_log(
            LogLevel::Info,
            "Bundled backend spawned",
            json!({
                "pid": pid,
                "executable": plan.executable.display().to_string(),
                "host": plan.host,
                "port": plan.port,
                "baseUrl": plan.base_url(),
                "packaged": plan.packaged_mode,
            }),
        );

        let supervisor = Arc::clone(self);
        if let Err(error) = thread::Builder::new()
            .name("backend-exit-observer".to_string())
            .spawn(move || supervisor.observe_exit(pid, reporter))
        {
            log_error(&format!(
                "failed to start backend exit observer: pid={pid}, error={error}"
            ));
        }

        Ok(pid)
    }
}
