use std::{
    process::Child,
    sync::{Mutex, MutexGuard},
    time::Duration,
};

use crate::{
    app_helpers::log_warn, backend_exit_state::ShutdownLifecycle, error::SupervisorError,
};

pub const DEFAULT_EXIT_POLL_INTERVAL: Duration = Duration::from_millis(200);
pub const DEFAULT_GRACEFUL_STOP_TIMEOUT: Duration = Duration::from_secs(10);

/// Receives fatal events raised after `launch` returned.
pub trait ServiceEventReporter: Send + Sync {
    fn report_fatal(&self, error: &SupervisorError);
}

/// Owns the one service child process of the shell.
///
/// Shared as `Arc<BackendSupervisor>` so the exit observer thread can reap the
/// child. Lock order is child then shutdown; nothing takes them the other way.
#[derive(Debug)]
pub struct BackendSupervisor {
    pub(crate) child: Mutex<Option<Child>>,
    pub(crate) shutdown: Mutex<ShutdownLifecycle>,
    pub(crate) exit_poll_interval: Duration,
    pub(crate) graceful_stop_timeout: Duration,
}

impl Default for BackendSupervisor {
    fn default() -> Self {
        Self::with_timings(DEFAULT_EXIT_POLL_INTERVAL, DEFAULT_GRACEFUL_STOP_TIMEOUT)
    }
}

impl BackendSupervisor {
    pub fn with_timings(exit_poll_interval: Duration, graceful_stop_timeout: Duration) -> Self {
        Self {
            child: Mutex::new(None),
            shutdown: Mutex::new(ShutdownLifecycle::default()),
            exit_poll_interval,
            graceful_stop_timeout,
        }
    }

    pub(crate) fn lock_child(&self) -> MutexGuard<'_, Option<Child>> {
        match self.child.lock() {
            Ok(guard) => guard,
            Err(error) => {
                log_warn(&format!("backend child lock poisoned: {error}"));
                error.into_inner()
            }
        }
    }

    pub fn running_pid(&self) -> Option<u32> {
        self.lock_child().as_ref().map(Child::id)
    }
}
