#[cfg(target_os = "windows")]
use std::os::windows::process::CommandExt;
use std::{
    io,
    process::{Child, Command, ExitStatus, Stdio},
    thread,
    time::{Duration, Instant},
};

const EXIT_POLL_INTERVAL_MS: u64 = 120;
const FORCE_STOP_WAIT_MIN_MS: u64 = 200;
#[cfg(target_os = "windows")]
const GRACEFUL_FAILURE_WAIT_CAP_MS: u64 = 350;
#[cfg(target_os = "windows")]
const FORCE_STOP_WAIT_MAX_MS: u64 = 2_200;
#[cfg(not(target_os = "windows"))]
const FORCE_STOP_WAIT_MAX_MS: u64 = 1_500;
#[cfg(target_os = "windows")]
pub const WINDOWS_CREATE_NO_WINDOW: u32 = 0x0800_0000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    AlreadyExited,
    Graceful,
    Forced,
    Unresponsive,
}

impl StopOutcome {
    pub fn is_stopped(self) -> bool {
        self != Self::Unresponsive
    }
}

struct StopCommand {
    label: &'static str,
    program: &'static str,
    args: Vec<String>,
}

#[cfg(target_os = "windows")]
fn stop_commands(pid: u32) -> (StopCommand, StopCommand) {
    let pid = pid.to_string();
    (
        StopCommand {
            label: "taskkill graceful stop",
            program: "taskkill",
            args: vec!["/pid".into(), pid.clone(), "/t".into()],
        },
        StopCommand {
            label: "taskkill force stop",
            program: "taskkill",
            args: vec!["/pid".into(), pid, "/t".into(), "/f".into()],
        },
    )
}

#[cfg(not(target_os = "windows"))]
fn stop_commands(pid: u32) -> (StopCommand, StopCommand) {
    let pid = pid.to_string();
    (
        StopCommand {
            label: "kill -TERM",
            program: "kill",
            args: vec!["-TERM".into(), pid.clone()],
        },
        StopCommand {
            label: "kill -KILL",
            program: "kill",
            args: vec!["-KILL".into(), pid],
        },
    )
}

fn graceful_failure_wait_cap(timeout: Duration) -> Duration {
    #[cfg(target_os = "windows")]
    {
        timeout.min(Duration::from_millis(GRACEFUL_FAILURE_WAIT_CAP_MS))
    }
    #[cfg(not(target_os = "windows"))]
    {
        timeout
    }
}

fn wait_for_child_exit(child: &mut Child, timeout: Duration) -> bool {
    let start = Instant::now();
    loop {
        match child.try_wait() {
            Ok(Some(_)) => return true,
            Ok(None) if start.elapsed() >= timeout => return false,
            Ok(None) => thread::sleep(Duration::from_millis(EXIT_POLL_INTERVAL_MS)),
            Err(_) => return false,
        }
    }
}

fn run_stop_command<F>(pid: u32, stop: &StopCommand, log: F) -> io::Result<ExitStatus>
where
    F: Fn(&str) + Copy,
{
    let mut command = Command::new(stop.program);
    command
        .args(&stop.args)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .stdin(Stdio::null());
    #[cfg(target_os = "windows")]
    {
        command.creation_flags(WINDOWS_CREATE_NO_WINDOW);
    }
    let status = command.status();

    match &status {
        Ok(exit_status) if exit_status.success() => {}
        Ok(exit_status) => log(&format!(
            "{} returned non-zero: pid={pid}, status={exit_status:?}",
            stop.label
        )),
        Err(error) => log(&format!(
            "{} failed to start: pid={pid}, error={error}",
            stop.label
        )),
    }

    status
}

fn compute_followup_wait(timeout: Duration, max_extra_wait: Duration) -> Duration {
    if timeout.is_zero() {
        Duration::ZERO
    } else {
        (timeout / 4)
            .max(Duration::from_millis(FORCE_STOP_WAIT_MIN_MS))
            .min(max_extra_wait)
    }
}

fn graceful_wait_after<F>(
    pid: u32,
    timeout: Duration,
    graceful_status: &io::Result<ExitStatus>,
    label: &str,
    log: F,
) -> Duration
where
    F: Fn(&str) + Copy,
{
    if matches!(graceful_status, Ok(status) if status.success()) {
        return timeout;
    }

    let shortened = graceful_failure_wait_cap(timeout);
    if shortened < timeout {
        log(&format!(
            "{label} not successful; shorten graceful wait: pid={pid}, requested_wait_ms={}, effective_wait_ms={}",
            timeout.as_millis(),
            shortened.as_millis()
        ));
    }
    shortened
}

/// Requests termination, waits up to `timeout`, then forces the process tree
/// down and waits a bounded follow-up.
pub fn stop_child_process_gracefully<F>(child: &mut Child, timeout: Duration, log: F) -> StopOutcome
where
    F: Fn(&str) + Copy,
{
    if matches!(child.try_wait(), Ok(Some(_))) {
        return StopOutcome::AlreadyExited;
    }

    let pid = child.id();
    let (graceful, force) = stop_commands(pid);

    let graceful_status = run_stop_command(pid, &graceful, log);
    let graceful_wait = graceful_wait_after(pid, timeout, &graceful_status, graceful.label, log);
    if wait_for_child_exit(child, graceful_wait) {
        return StopOutcome::Graceful;
    }

    let force_status = run_stop_command(pid, &force, log);
    if force_status.is_err() {
        // `kill`/`taskkill` unavailable; fall back to the std handle.
        if let Err(error) = child.kill() {
            log(&format!("child.kill fallback failed: pid={pid}, error={error}"));
        }
    }
    let followup_wait =
        compute_followup_wait(timeout, Duration::from_millis(FORCE_STOP_WAIT_MAX_MS));
    log(&format!(
        "child graceful stop timed out, force-kill issued: pid={pid}, graceful={graceful_status:?}, force={force_status:?}, followup_wait_ms={}",
        followup_wait.as_millis(),
    ));

    if wait_for_child_exit(child, followup_wait) {
        StopOutcome::Forced
    } else {
        StopOutcome::Unresponsive
    }
}

#[cfg(unix)]
pub fn exit_signal(status: &ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal()
}

#[cfg(not(unix))]
pub fn exit_signal(_status: &ExitStatus) -> Option<i32> {
    None
}
