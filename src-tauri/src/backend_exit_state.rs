use std::mem;

use crate::{app_helpers::log_warn, backend_supervisor::BackendSupervisor};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShutdownPhase {
    #[default]
    Running,
    ShutdownRequested,
    CleanupInProgress,
    ReadyToExit,
}

/// Intentional shutdown of the shell plus the one exit request allowed through
/// after cleanup.
///
/// Any phase past `Running` means the service is being stopped on purpose, so
/// its exit is never reported as a crash.
#[derive(Debug, Default)]
pub struct ShutdownLifecycle {
    phase: ShutdownPhase,
    exit_allowance: bool,
}

impl ShutdownLifecycle {
    #[cfg(test)]
    pub fn phase(&self) -> ShutdownPhase {
        self.phase
    }

    pub fn is_intentional_shutdown(&self) -> bool {
        self.phase != ShutdownPhase::Running
    }

    pub fn mark_intentional_shutdown(&mut self) {
        if self.phase == ShutdownPhase::Running {
            self.phase = ShutdownPhase::ShutdownRequested;
        }
    }

    /// True for exactly one caller; cleanup never runs twice.
    pub fn try_begin_cleanup(&mut self) -> bool {
        match self.phase {
            ShutdownPhase::Running | ShutdownPhase::ShutdownRequested => {
                self.phase = ShutdownPhase::CleanupInProgress;
                true
            }
            ShutdownPhase::CleanupInProgress | ShutdownPhase::ReadyToExit => false,
        }
    }

    pub fn finish_cleanup(&mut self) {
        self.phase = ShutdownPhase::ReadyToExit;
        self.exit_allowance = true;
    }

    /// Consumes the allowance granted by `finish_cleanup`.
    pub fn take_exit_allowance(&mut self) -> bool {
        mem::take(&mut self.exit_allowance)
    }
}

impl BackendSupervisor {
    fn with_shutdown_state<T>(
        &self,
        action: &str,
        apply: impl FnOnce(&mut ShutdownLifecycle) -> T,
    ) -> T {
        let mut guard = match self.shutdown.lock() {
            Ok(guard) => guard,
            Err(error) => {
                log_warn(&format!(
                    "shutdown state lock poisoned when {action}: {error}"
                ));
                error.into_inner()
            }
        };
        apply(&mut guard)
    }

    pub(crate) fn mark_intentional_shutdown(&self) {
        self.with_shutdown_state(
            "marking intentional shutdown",
            ShutdownLifecycle::mark_intentional_shutdown,
        );
    }

    pub(crate) fn is_intentional_shutdown(&self) -> bool {
        self.with_shutdown_state("reading shutdown flag", |lifecycle| {
            lifecycle.is_intentional_shutdown()
        })
    }

    pub(crate) fn try_begin_exit_cleanup(&self) -> bool {
        self.with_shutdown_state("beginning cleanup", ShutdownLifecycle::try_begin_cleanup)
    }

    pub(crate) fn allow_next_exit_request(&self) {
        self.with_shutdown_state("finishing cleanup", ShutdownLifecycle::finish_cleanup);
    }

    pub(crate) fn take_exit_request_allowance(&self) -> bool {
        self.with_shutdown_state(
            "taking exit request allowance",
            ShutdownLifecycle::take_exit_allowance,
        )
    }
}
