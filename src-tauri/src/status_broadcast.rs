use tauri::{AppHandle, Emitter, EventTarget, Manager, Runtime, Webview, WebviewWindow};

use crate::{
    startup_status::{StartupStatus, StartupTransition},
    ShellState,
};

pub const STARTUP_STATUS_EVENT: &str = "desktop://backend-startup-status";

/// A UI surface that can receive startup status pushes.
pub trait StatusSurface {
    fn surface_label(&self) -> String;
    fn deliver(&self, status: &StartupStatus) -> Result<(), String>;
}

impl<R: Runtime> StatusSurface for WebviewWindow<R> {
    fn surface_label(&self) -> String {
        self.label().to_string()
    }

    fn deliver(&self, status: &StartupStatus) -> Result<(), String> {
        self.emit_to(
            EventTarget::webview_window(self.label()),
            STARTUP_STATUS_EVENT,
            status.clone(),
        )
        .map_err(|error| error.to_string())
    }
}

impl<R: Runtime> StatusSurface for Webview<R> {
    fn surface_label(&self) -> String {
        self.label().to_string()
    }

    fn deliver(&self, status: &StartupStatus) -> Result<(), String> {
        self.emit_to(
            EventTarget::webview(self.label()),
            STARTUP_STATUS_EVENT,
            status.clone(),
        )
        .map_err(|error| error.to_string())
    }
}

/// Delivers `status` to every surface; failures are skipped. Returns the
/// number of surfaces that accepted it.
pub fn push_status<S: StatusSurface>(surfaces: &[S], status: &StartupStatus) -> usize {
    surfaces
        .iter()
        .filter(|surface| match surface.deliver(status) {
            Ok(()) => true,
            Err(error) => {
                log::debug!(
                    "startup status push skipped for surface '{}': {error}",
                    surface.surface_label()
                );
                false
            }
        })
        .count()
}

pub fn broadcast_to_windows(app: &AppHandle, status: &StartupStatus) -> usize {
    let windows: Vec<WebviewWindow> = app.webview_windows().into_values().collect();
    push_status(&windows, status)
}

/// Late subscribers get the current status once their page has loaded.
pub fn replay_status_on_load<R: Runtime>(webview: &Webview<R>, status: &StartupStatus) {
    push_status(std::slice::from_ref(webview), status);
}

impl ShellState {
    pub(crate) fn current_startup_status(&self) -> StartupStatus {
        match self.startup.lock() {
            Ok(machine) => machine.snapshot(),
            Err(error) => {
                log::warn!("startup status lock poisoned when reading status: {error}");
                error.into_inner().snapshot()
            }
        }
    }

    /// The only writer of the startup status. The broadcast happens under the
    /// lock so subscribers observe updates in the order they were applied.
    pub(crate) fn update_startup_status(
        &self,
        app: &AppHandle,
        transition: StartupTransition,
    ) -> Option<StartupStatus> {
        let mut machine = match self.startup.lock() {
            Ok(machine) => machine,
            Err(error) => {
                log::warn!("startup status lock poisoned when applying transition: {error}");
                error.into_inner()
            }
        };
        let changed = machine.apply(transition)?;
        broadcast_to_windows(app, &changed);
        Some(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::startup_status::StartupStatusMachine;
    use std::cell::RefCell;

    struct FakeSurface {
        label: &'static str,
        destroyed: bool,
        received: RefCell<Vec<u8>>,
    }

    impl FakeSurface {
        fn new(label: &'static str, destroyed: bool) -> Self {
            Self {
                label,
                destroyed,
                received: RefCell::new(Vec::new()),
            }
        }
    }

    impl StatusSurface for FakeSurface {
        fn surface_label(&self) -> String {
            self.label.to_string()
        }

        fn deliver(&self, status: &StartupStatus) -> Result<(), String> {
            if self.destroyed {
                return Err("webview destroyed".to_string());
            }
            self.received.borrow_mut().push(status.progress);
            Ok(())
        }
    }

    #[test]
    fn push_status_skips_destroyed_surfaces() {
        let surfaces = [
            FakeSurface::new("splash", true),
            FakeSurface::new("main", false),
        ];
        let status = StartupStatusMachine::new("standing by").snapshot();

        assert_eq!(push_status(&surfaces, &status), 1);
        assert!(surfaces[0].received.borrow().is_empty());
        assert_eq!(*surfaces[1].received.borrow(), vec![100]);
    }

    #[test]
    fn surfaces_observe_non_decreasing_progress() {
        let surfaces = [FakeSurface::new("main", false)];
        let mut machine = StartupStatusMachine::new("standing by");
        let transitions = [
            StartupTransition::Begin {
                message: "preparing".to_string(),
            },
            StartupTransition::Progress {
                progress: 18,
                message: "port".to_string(),
            },
            StartupTransition::Progress {
                progress: 10,
                message: "stale".to_string(),
            },
            StartupTransition::Progress {
                progress: 30,
                message: "spawn".to_string(),
            },
            StartupTransition::Ready {
                message: "ready".to_string(),
            },
        ];
        for transition in transitions {
            if let Some(status) = machine.apply(transition) {
                push_status(&surfaces, &status);
            }
        }

        let received = surfaces[0].received.borrow();
        assert!(received.windows(2).all(|pair| pair[0] <= pair[1]));
        assert_eq!(received.last(), Some(&100));
    }
}
