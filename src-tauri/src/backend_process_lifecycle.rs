use std::{sync::Arc, thread};

use serde_json::json;

use crate::{
    app_helpers::{append_runtime_log, log_info, log_warn},
    backend_supervisor::{BackendSupervisor, ServiceEventReporter},
    logging::LogLevel,
    process_control,
    service_events::{decide_service_event, ServiceEvent, ServiceEventOutcome},
};

impl BackendSupervisor {
    pub(crate) fn observe_exit(&self, pid: u32, reporter: Arc<dyn ServiceEventReporter>) {
        loop {
            thread::sleep(self.exit_poll_interval);

            let event = {
                let mut guard = self.lock_child();
                let Some(child) = guard.as_mut() else {
                    return;
                };
                if child.id() != pid {
                    return;
                }
                match child.try_wait() {
                    Ok(None) => continue,
                    Ok(Some(status)) => {
                        *guard = None;
                        ServiceEvent::Exited {
                            code: status.code(),
                            signal: process_control::exit_signal(&status),
                        }
                    }
                    Err(error) => {
                        log_warn(&format!(
                            "failed to poll backend process status: pid={pid}, error={error}"
                        ));
                        *guard = None;
                        ServiceEvent::Exited {
                            code: None,
                            signal: None,
                        }
                    }
                }
            };

            self.handle_service_event(pid, event, reporter.as_ref());
            return;
        }
    }

    fn handle_service_event(
        &self,
        pid: u32,
        event: ServiceEvent,
        reporter: &dyn ServiceEventReporter,
    ) {
        match decide_service_event(event, self.is_intentional_shutdown()) {
            ServiceEventOutcome::Suppressed => {
                log_info(&format!(
                    "backend exit observed during intentional shutdown: pid={pid}"
                ));
            }
            ServiceEventOutcome::Clean => {
                append_runtime_log(
                    LogLevel::Warn,
                    "Bundled backend exited cleanly",
                    json!({ "pid": pid, "code": 0 }),
                );
            }
            ServiceEventOutcome::Fatal(error) => {
                let mut context = error.log_context();
                if let Some(object) = context.as_object_mut() {
                    object.insert("pid".to_string(), json!(pid));
                }
                append_runtime_log(LogLevel::Error, "Bundled backend exited unexpectedly", context);
                reporter.report_fatal(&error);
            }
        }
    }

    /// Stops the service if it is running.
    ///
    /// The intentional shutdown flag is set before anything else, so the exit
    /// observer never reports this stop as a crash.
    pub fn terminate(&self) -> Result<(), String> {
        self.mark_intentional_shutdown();

        let mut guard = self.lock_child();
        let Some(child) = guard.as_mut() else {
            return Ok(());
        };
        let pid = child.id();

        let outcome = process_control::stop_child_process_gracefully(
            child,
            self.graceful_stop_timeout,
            log_info,
        );
        if !outcome.is_stopped() {
            return Err(format!(
                "Backend process pid={pid} did not exit after {}ms graceful stop timeout.",
                self.graceful_stop_timeout.as_millis()
            ));
        }
        *guard = None;
        log_info(&format!("backend stopped: pid={pid}, outcome={outcome:?}"));
        Ok(())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::{error::SupervisorError, launch_plan::LaunchPlan};
    use std::{
        path::PathBuf,
        sync::Mutex,
        time::{Duration, Instant},
    };

    #[derive(Default)]
    struct RecordingReporter {
        reports: Mutex<Vec<String>>,
    }

    impl ServiceEventReporter for RecordingReporter {
        fn report_fatal(&self, error: &SupervisorError) {
            self.reports
                .lock()
                .expect("lock reports")
                .push(error.kind().to_string());
        }
    }

    impl RecordingReporter {
        fn kinds(&self) -> Vec<String> {
            self.reports.lock().expect("lock reports").clone()
        }
    }

    fn shell_plan(script: &str) -> LaunchPlan {
        let mut plan = LaunchPlan::for_service(PathBuf::from("/bin/sh"), "127.0.0.1", 8000, true);
        plan.args = vec!["-c".to_string(), script.to_string()];
        plan
    }

    fn fast_supervisor() -> Arc<BackendSupervisor> {
        Arc::new(BackendSupervisor::with_timings(
            Duration::from_millis(20),
            Duration::from_secs(5),
        ))
    }

    fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
        let start = Instant::now();
        while start.elapsed() < timeout {
            if condition() {
                return true;
            }
            thread::sleep(Duration::from_millis(20));
        }
        condition()
    }

    #[test]
    fn crash_is_reported_once_as_unexpected_exit() {
        let supervisor = fast_supervisor();
        let reporter = Arc::new(RecordingReporter::default());

        supervisor
            .launch(&shell_plan("exit 3"), reporter.clone())
            .expect("launch shell child");

        assert!(wait_until(Duration::from_secs(5), || !reporter.kinds().is_empty()));
        thread::sleep(Duration::from_millis(100));
        assert_eq!(reporter.kinds(), vec!["UnexpectedExit".to_string()]);
        assert_eq!(supervisor.running_pid(), None);
    }

    #[test]
    fn clean_exit_is_not_reported() {
        let supervisor = fast_supervisor();
        let reporter = Arc::new(RecordingReporter::default());

        supervisor
            .launch(&shell_plan("exit 0"), reporter.clone())
            .expect("launch shell child");

        assert!(wait_until(Duration::from_secs(5), || supervisor
            .running_pid()
            .is_none()));
        thread::sleep(Duration::from_millis(100));
        assert!(reporter.kinds().is_empty());
    }

    #[test]
    fn intentional_termination_is_never_reported() {
        let supervisor = fast_supervisor();
        let reporter = Arc::new(RecordingReporter::default());

        let pid = supervisor
            .launch(&shell_plan("exec sleep 30"), reporter.clone())
            .expect("launch shell child");
        assert_eq!(supervisor.running_pid(), Some(pid));

        supervisor.terminate().expect("terminate child");
        thread::sleep(Duration::from_millis(200));

        assert_eq!(supervisor.running_pid(), None);
        assert!(reporter.kinds().is_empty());
    }

    #[test]
    fn second_launch_is_rejected_while_child_lives() {
        let supervisor = fast_supervisor();
        let reporter = Arc::new(RecordingReporter::default());

        let pid = supervisor
            .launch(&shell_plan("exec sleep 30"), reporter.clone())
            .expect("launch shell child");
        match supervisor.launch(&shell_plan("exec sleep 30"), reporter.clone()) {
            Err(SupervisorError::AlreadyLaunched { pid: running }) => assert_eq!(running, pid),
            other => panic!("expected AlreadyLaunched, got {other:?}"),
        }

        supervisor.terminate().expect("terminate child");
    }

    #[test]
    fn launch_after_terminate_is_rejected() {
        let supervisor = fast_supervisor();
        supervisor.terminate().expect("terminate without child");

        let result = supervisor.launch(
            &shell_plan("exit 0"),
            Arc::new(RecordingReporter::default()),
        );
        assert!(matches!(result, Err(SupervisorError::ShuttingDown)));
    }

    #[test]
    fn missing_executable_is_rejected_before_spawn() {
        let supervisor = fast_supervisor();
        let plan = LaunchPlan::for_service(
            PathBuf::from("/nonexistent/report-formatter/api-server"),
            "127.0.0.1",
            8000,
            true,
        );

        let result = supervisor.launch(&plan, Arc::new(RecordingReporter::default()));
        assert!(matches!(
            result,
            Err(SupervisorError::ExecutableNotFound { .. })
        ));
        assert_eq!(supervisor.running_pid(), None);
    }
}
