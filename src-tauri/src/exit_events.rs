use tauri::{AppHandle, Manager};

use crate::{
    app_helpers::log_info,
    backend_supervisor::BackendSupervisor,
    exit_cleanup::{self, ExitTrigger},
    ShellState,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExitRequestPlan {
    /// Cleanup already finished; this is the `exit(0)` we issued ourselves.
    PassThrough,
    StopBackendThenExit,
    /// Another exit request owns the cleanup; keep the app alive until it ends.
    AwaitRunningCleanup,
}

fn plan_exit_request(supervisor: &BackendSupervisor) -> ExitRequestPlan {
    if supervisor.take_exit_request_allowance() {
        return ExitRequestPlan::PassThrough;
    }
    if exit_cleanup::try_begin_exit_cleanup(supervisor, ExitTrigger::ExitRequested, log_info) {
        ExitRequestPlan::StopBackendThenExit
    } else {
        ExitRequestPlan::AwaitRunningCleanup
    }
}

pub fn handle_exit_requested(app_handle: &AppHandle, api: &tauri::ExitRequestApi) {
    let supervisor = app_handle.state::<ShellState>().supervisor.clone();
    match plan_exit_request(&supervisor) {
        ExitRequestPlan::PassThrough => {
            log_info("exit request allowed to pass through after backend cleanup");
        }
        ExitRequestPlan::AwaitRunningCleanup => api.prevent_exit(),
        ExitRequestPlan::StopBackendThenExit => {
            api.prevent_exit();
            log_info("exit requested, stopping backend asynchronously");
            let exit_handle = app_handle.clone();
            tauri::async_runtime::spawn_blocking(move || {
                exit_cleanup::stop_backend_for_exit(
                    &supervisor,
                    ExitTrigger::ExitRequested,
                    log_info,
                );
                supervisor.allow_next_exit_request();
                exit_handle.exit(0);
            });
        }
    }
}

/// Last chance to stop the service when the loop exits without a request.
pub fn handle_exit_event(app_handle: &AppHandle) {
    let state = app_handle.state::<ShellState>();
    if !exit_cleanup::try_begin_exit_cleanup(&state.supervisor, ExitTrigger::ExitFallback, log_info)
    {
        return;
    }

    log_info("exit event triggered fallback backend cleanup");
    exit_cleanup::stop_backend_for_exit(&state.supervisor, ExitTrigger::ExitFallback, log_info);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_request_stops_backend_then_later_requests_wait() {
        let supervisor = BackendSupervisor::default();
        assert_eq!(
            plan_exit_request(&supervisor),
            ExitRequestPlan::StopBackendThenExit
        );
        assert_eq!(
            plan_exit_request(&supervisor),
            ExitRequestPlan::AwaitRunningCleanup
        );
    }

    #[test]
    fn request_after_cleanup_passes_through_once() {
        let supervisor = BackendSupervisor::default();
        assert_eq!(
            plan_exit_request(&supervisor),
            ExitRequestPlan::StopBackendThenExit
        );
        supervisor.allow_next_exit_request();

        assert_eq!(plan_exit_request(&supervisor), ExitRequestPlan::PassThrough);
        assert_eq!(
            plan_exit_request(&supervisor),
            ExitRequestPlan::AwaitRunningCleanup
        );
    }
}
