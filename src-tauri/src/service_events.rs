use std::path::PathBuf;

use crate::error::SupervisorError;

/// What the supervisor observed about the service process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceEvent {
    Exited {
        code: Option<i32>,
        signal: Option<i32>,
    },
    SpawnError {
        path: PathBuf,
        cause: String,
    },
}

#[derive(Debug)]
pub enum ServiceEventOutcome {
    Fatal(SupervisorError),
    Suppressed,
    Clean,
}

pub fn decide_service_event(
    event: ServiceEvent,
    intentional_shutdown: bool,
) -> ServiceEventOutcome {
    if intentional_shutdown {
        return ServiceEventOutcome::Suppressed;
    }

    match event {
        ServiceEvent::Exited {
            code: Some(0),
            signal: None,
        } => ServiceEventOutcome::Clean,
        ServiceEvent::Exited { code, signal } => {
            ServiceEventOutcome::Fatal(SupervisorError::UnexpectedExit { code, signal })
        }
        ServiceEvent::SpawnError { path, cause } => {
            ServiceEventOutcome::Fatal(SupervisorError::SpawnFailure { path, cause })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intentional_shutdown_suppresses_every_event() {
        let crash = ServiceEvent::Exited {
            code: Some(1),
            signal: None,
        };
        assert!(matches!(
            decide_service_event(crash, true),
            ServiceEventOutcome::Suppressed
        ));

        let spawn = ServiceEvent::SpawnError {
            path: PathBuf::from("/bin/api-server"),
            cause: "denied".to_string(),
        };
        assert!(matches!(
            decide_service_event(spawn, true),
            ServiceEventOutcome::Suppressed
        ));
    }

    #[test]
    fn zero_exit_code_is_clean() {
        let event = ServiceEvent::Exited {
            code: Some(0),
            signal: None,
        };
        assert!(matches!(
            decide_service_event(event, false),
            ServiceEventOutcome::Clean
        ));
    }

    #[test]
    fn nonzero_exit_and_signals_are_fatal() {
        let event = ServiceEvent::Exited {
            code: None,
            signal: Some(9),
        };
        match decide_service_event(event, false) {
            ServiceEventOutcome::Fatal(SupervisorError::UnexpectedExit { code, signal }) => {
                assert_eq!(code, None);
                assert_eq!(signal, Some(9));
            }
            other => panic!("expected UnexpectedExit, got {other:?}"),
        }
    }

    #[test]
    fn spawn_error_maps_to_spawn_failure() {
        let event = ServiceEvent::SpawnError {
            path: PathBuf::from("/bin/api-server"),
            cause: "exec format error".to_string(),
        };
        assert!(matches!(
            decide_service_event(event, false),
            ServiceEventOutcome::Fatal(SupervisorError::SpawnFailure { .. })
        ));
    }
}
