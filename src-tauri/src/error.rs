use std::{io, path::PathBuf};

use serde_json::{json, Value};

use crate::shell_locale::StartupTexts;

/// Fatal conditions on the service launch path.
///
/// Every variant ends the current launch attempt. `startup_task::fail_startup`
/// turns all but `ShuttingDown` into the `error` phase with an operator alert.
#[derive(Debug, thiserror::Error)]
pub enum SupervisorError {
    #[error("no available backend port found in range {first}-{last} on {host}")]
    PortExhausted { host: String, first: u16, last: u16 },

    #[error("bundled backend executable not found at {}", .path.display())]
    ExecutableNotFound { path: PathBuf },

    #[error("failed to start bundled backend {}: {cause}", .path.display())]
    SpawnFailure { path: PathBuf, cause: String },

    #[error(
        "bundled backend exited unexpectedly (code={}, signal={})",
        describe_optional(.code),
        describe_optional(.signal)
    )]
    UnexpectedExit {
        code: Option<i32>,
        signal: Option<i32>,
    },

    #[error("bundled backend did not become ready at {endpoint} after {attempts} attempts")]
    ReadinessTimeout { endpoint: String, attempts: u32 },

    #[error("bundled backend is already running (pid={pid})")]
    AlreadyLaunched { pid: u32 },

    #[error("backend launch rejected while the application is shutting down")]
    ShuttingDown,
}

fn describe_optional(value: &Option<i32>) -> String {
    value
        .map(|value| value.to_string())
        .unwrap_or_else(|| "none".to_string())
}

impl SupervisorError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::PortExhausted { .. } => "PortExhausted",
            Self::ExecutableNotFound { .. } => "ExecutableNotFound",
            Self::SpawnFailure { .. } => "SpawnFailure",
            Self::UnexpectedExit { .. } => "UnexpectedExit",
            Self::ReadinessTimeout { .. } => "ReadinessTimeout",
            Self::AlreadyLaunched { .. } => "AlreadyLaunched",
            Self::ShuttingDown => "ShuttingDown",
        }
    }

    /// Operator-facing status text; distinct for every cause.
    pub fn startup_message(&self, texts: &StartupTexts) -> &'static str {
        match self {
            Self::PortExhausted { .. } => texts.port_exhausted,
            Self::ExecutableNotFound { .. } => texts.executable_missing,
            Self::SpawnFailure { .. } | Self::AlreadyLaunched { .. } | Self::ShuttingDown => {
                texts.spawn_failed
            }
            Self::UnexpectedExit { .. } => texts.service_exited,
            Self::ReadinessTimeout { .. } => texts.readiness_timeout,
        }
    }

    pub fn alert_title(&self, texts: &StartupTexts) -> &'static str {
        match self {
            Self::ReadinessTimeout { .. } => texts.alert_timeout_title,
            Self::UnexpectedExit { .. } => texts.alert_exited_title,
            _ => texts.alert_error_title,
        }
    }

    pub fn log_context(&self) -> Value {
        let mut context = match self {
            Self::PortExhausted { host, first, last } => {
                json!({ "host": host, "firstPort": first, "lastPort": last })
            }
            Self::ExecutableNotFound { path } => json!({ "path": path.display().to_string() }),
            Self::SpawnFailure { path, cause } => {
                json!({ "path": path.display().to_string(), "cause": cause })
            }
            Self::UnexpectedExit { code, signal } => json!({
                "code": code,
                "signal": describe_optional(signal),
            }),
            Self::ReadinessTimeout { endpoint, attempts } => {
                json!({ "endpoint": endpoint, "attempts": attempts })
            }
            Self::AlreadyLaunched { pid } => json!({ "pid": pid }),
            Self::ShuttingDown => json!({}),
        };
        if let Some(object) = context.as_object_mut() {
            object.insert("kind".to_string(), Value::from(self.kind()));
            object.insert("message".to_string(), Value::from(self.to_string()));
        }
        context
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LogExportError {
    #[error("Runtime logs are not available yet.")]
    LogUnavailable,

    #[error("Runtime log export was cancelled.")]
    ExportCancelled,

    #[error("failed to export runtime logs to {}: {source}", .destination.display())]
    ExportFailed {
        destination: PathBuf,
        #[source]
        source: io::Error,
    },
}
