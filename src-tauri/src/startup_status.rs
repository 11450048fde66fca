use chrono::{SecondsFormat, Utc};
use serde::Serialize;

pub const PROGRESS_BEGIN: u8 = 5;
pub const PROGRESS_PORT_RESOLVED: u8 = 18;
pub const PROGRESS_SPAWNING: u8 = 30;
pub const PROGRESS_POLL_CEILING: u8 = 95;
pub const PROGRESS_COMPLETE: u8 = 100;

const PROGRESS_POLL_SPAN: u32 = (PROGRESS_POLL_CEILING - PROGRESS_SPAWNING) as u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StartupPhase {
    Idle,
    Starting,
    Ready,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartupStatus {
    pub phase: StartupPhase,
    pub progress: u8,
    pub message: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartupTransition {
    Begin { message: String },
    Progress { progress: u8, message: String },
    Ready { message: String },
    Fail { message: String },
}

/// Owns the one `StartupStatus` of the shell.
///
/// `apply` is the only mutation path: it rejects transitions out of `error`,
/// keeps progress non-decreasing while `starting`, and returns `None` when
/// nothing observable changed so callers skip the broadcast.
#[derive(Debug)]
pub struct StartupStatusMachine {
    status: StartupStatus,
}

impl StartupStatusMachine {
    pub fn new(idle_message: &str) -> Self {
        Self {
            status: StartupStatus {
                phase: StartupPhase::Idle,
                progress: PROGRESS_COMPLETE,
                message: idle_message.to_string(),
                updated_at: now_timestamp(),
            },
        }
    }

    pub fn snapshot(&self) -> StartupStatus {
        self.status.clone()
    }

    #[cfg(test)]
    pub fn phase(&self) -> StartupPhase {
        self.status.phase
    }

    pub fn apply(&mut self, transition: StartupTransition) -> Option<StartupStatus> {
        let current = self.status.phase;
        let (phase, progress, message) = match transition {
            StartupTransition::Begin { message } => match current {
                StartupPhase::Idle => (StartupPhase::Starting, PROGRESS_BEGIN, message),
                _ => return None,
            },
            StartupTransition::Progress { progress, message } => match current {
                StartupPhase::Starting => {
                    let progress = progress.min(PROGRESS_POLL_CEILING).max(self.status.progress);
                    (StartupPhase::Starting, progress, message)
                }
                _ => return None,
            },
            StartupTransition::Ready { message } => match current {
                StartupPhase::Idle | StartupPhase::Starting => {
                    (StartupPhase::Ready, PROGRESS_COMPLETE, message)
                }
                _ => return None,
            },
            StartupTransition::Fail { message } => match current {
                StartupPhase::Error => return None,
                _ => (StartupPhase::Error, PROGRESS_COMPLETE, message),
            },
        };

        if phase == self.status.phase
            && progress == self.status.progress
            && message == self.status.message
        {
            return None;
        }

        self.status = StartupStatus {
            phase,
            progress,
            message,
            updated_at: now_timestamp(),
        };
        Some(self.status.clone())
    }
}

/// Progress reported after readiness probe `attempt` of `max_attempts`.
pub fn readiness_progress(attempt: u32, max_attempts: u32) -> u8 {
    let max_attempts = max_attempts.max(1);
    let attempt = attempt.min(max_attempts);
    let scaled = (PROGRESS_POLL_SPAN * attempt + max_attempts / 2) / max_attempts;
    let progress = u32::from(PROGRESS_SPAWNING) + scaled;
    progress.min(u32::from(PROGRESS_POLL_CEILING)) as u8
}

fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
