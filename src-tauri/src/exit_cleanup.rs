use crate::backend_supervisor::BackendSupervisor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitTrigger {
    ExitRequested,
    ExitFallback,
}

impl ExitTrigger {
    fn busy_message(self) -> &'static str {
        match self {
            Self::ExitRequested => "exit requested while backend cleanup is already running",
            Self::ExitFallback => "exit fallback cleanup skipped: backend cleanup already running",
        }
    }

    fn stop_failure_prefix(self) -> &'static str {
        match self {
            Self::ExitRequested => "backend graceful stop on ExitRequested failed",
            Self::ExitFallback => "backend fallback stop on Exit failed",
        }
    }
}

pub fn try_begin_exit_cleanup<F>(
    supervisor: &BackendSupervisor,
    trigger: ExitTrigger,
    log: F,
) -> bool
where
    F: Fn(&str),
{
    if supervisor.try_begin_exit_cleanup() {
        return true;
    }
    log(trigger.busy_message());
    false
}

/// Stops the service; a failure is logged and the exit continues regardless.
pub fn stop_backend_for_exit<F>(supervisor: &BackendSupervisor, trigger: ExitTrigger, log: F)
where
    F: Fn(&str),
{
    if let Err(error) = supervisor.terminate() {
        log(&format!("{}: {error}", trigger.stop_failure_prefix()));
    }
    if trigger == ExitTrigger::ExitRequested {
        log("backend stop finished, exiting desktop process");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn second_cleanup_attempt_is_rejected_and_logged() {
        let supervisor = BackendSupervisor::default();
        let messages = RefCell::new(Vec::new());
        let log = |message: &str| messages.borrow_mut().push(message.to_string());

        assert!(try_begin_exit_cleanup(&supervisor, ExitTrigger::ExitRequested, log));
        assert!(!try_begin_exit_cleanup(&supervisor, ExitTrigger::ExitFallback, log));
        assert_eq!(
            *messages.borrow(),
            vec!["exit fallback cleanup skipped: backend cleanup already running".to_string()]
        );
    }

    #[test]
    fn stopping_without_a_child_marks_shutdown() {
        let supervisor = BackendSupervisor::default();
        let messages = RefCell::new(Vec::new());

        stop_backend_for_exit(&supervisor, ExitTrigger::ExitRequested, |message| {
            messages.borrow_mut().push(message.to_string())
        });

        assert!(supervisor.is_intentional_shutdown());
        assert_eq!(
            *messages.borrow(),
            vec!["backend stop finished, exiting desktop process".to_string()]
        );
    }
}
