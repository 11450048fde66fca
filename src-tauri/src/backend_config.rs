use std::{env, time::Duration};

pub const API_HOST_ENV: &str = "REPORT_DESKTOP_API_HOST";
pub const API_PORT_ENV: &str = "REPORT_DESKTOP_API_PORT";
pub const READY_ATTEMPTS_ENV: &str = "REPORT_DESKTOP_READY_ATTEMPTS";
pub const READY_INTERVAL_ENV: &str = "REPORT_DESKTOP_READY_INTERVAL_MS";
pub const READY_PROBE_TIMEOUT_ENV: &str = "REPORT_DESKTOP_READY_PROBE_TIMEOUT_MS";

pub const DEFAULT_API_HOST: &str = "127.0.0.1";
pub const DEFAULT_API_PORT: u16 = 8000;
const DEFAULT_READY_ATTEMPTS: u64 = 120;
const READY_ATTEMPTS_MIN: u64 = 1;
const READY_ATTEMPTS_MAX: u64 = 10_000;
const DEFAULT_READY_INTERVAL_MS: u64 = 500;
const READY_INTERVAL_MIN_MS: u64 = 50;
const READY_INTERVAL_MAX_MS: u64 = 10_000;
const DEFAULT_READY_PROBE_TIMEOUT_MS: u64 = 800;
const READY_PROBE_TIMEOUT_MIN_MS: u64 = 100;
const READY_PROBE_TIMEOUT_MAX_MS: u64 = 30_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadinessSettings {
    pub attempts: u32,
    pub interval: Duration,
    pub probe_timeout: Duration,
}

impl Default for ReadinessSettings {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_READY_ATTEMPTS as u32,
            interval: Duration::from_millis(DEFAULT_READY_INTERVAL_MS),
            probe_timeout: Duration::from_millis(DEFAULT_READY_PROBE_TIMEOUT_MS),
        }
    }
}

/// Launch inputs for one attempt. The resolved port lives in `LaunchPlan`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchConfig {
    pub host: String,
    pub preferred_port: u16,
    pub readiness: ReadinessSettings,
}

impl LaunchConfig {
    pub fn from_env<F>(log: F) -> Self
    where
        F: FnMut(String),
    {
        Self::from_lookup(|name| env::var(name).ok(), log)
    }

    pub fn from_lookup<L, F>(lookup: L, mut log: F) -> Self
    where
        L: Fn(&str) -> Option<String>,
        F: FnMut(String),
    {
        let host = match lookup(API_HOST_ENV) {
            Some(raw) if !raw.trim().is_empty() => raw.trim().to_string(),
            Some(_) => {
                log(format!(
                    "{API_HOST_ENV} is empty/whitespace, fallback to default '{DEFAULT_API_HOST}'"
                ));
                DEFAULT_API_HOST.to_string()
            }
            None => DEFAULT_API_HOST.to_string(),
        };

        let preferred_port = lookup(API_PORT_ENV)
            .map(|raw| parse_port_env(&raw, API_PORT_ENV, DEFAULT_API_PORT, &mut log))
            .unwrap_or(DEFAULT_API_PORT);

        let attempts = lookup(READY_ATTEMPTS_ENV)
            .map(|raw| {
                parse_clamped_env(
                    &raw,
                    READY_ATTEMPTS_ENV,
                    DEFAULT_READY_ATTEMPTS,
                    READY_ATTEMPTS_MIN,
                    READY_ATTEMPTS_MAX,
                    "",
                    &mut log,
                )
            })
            .unwrap_or(DEFAULT_READY_ATTEMPTS);

        let interval_ms = lookup(READY_INTERVAL_ENV)
            .map(|raw| {
                parse_clamped_timeout_env(
                    &raw,
                    READY_INTERVAL_ENV,
                    DEFAULT_READY_INTERVAL_MS,
                    READY_INTERVAL_MIN_MS,
                    READY_INTERVAL_MAX_MS,
                    &mut log,
                )
            })
            .unwrap_or(DEFAULT_READY_INTERVAL_MS);

        let probe_timeout_ms = lookup(READY_PROBE_TIMEOUT_ENV)
            .map(|raw| {
                parse_clamped_timeout_env(
                    &raw,
                    READY_PROBE_TIMEOUT_ENV,
                    DEFAULT_READY_PROBE_TIMEOUT_MS,
                    READY_PROBE_TIMEOUT_MIN_MS,
                    READY_PROBE_TIMEOUT_MAX_MS,
                    &mut log,
                )
            })
            .unwrap_or(DEFAULT_READY_PROBE_TIMEOUT_MS);

        Self {
            host,
            preferred_port,
            readiness: ReadinessSettings {
                attempts: attempts as u32,
                interval: Duration::from_millis(interval_ms),
                probe_timeout: Duration::from_millis(probe_timeout_ms),
            },
        }
    }
}

pub fn parse_clamped_timeout_env<F>(
    raw: &str,
    env_name: &str,
    fallback_ms: u64,
    min_ms: u64,
    max_ms: u64,
    log: F,
) -> u64
where
    F: FnMut(String),
{
    parse_clamped_env(raw, env_name, fallback_ms, min_ms, max_ms, "ms", log)
}

fn parse_clamped_env<F>(
    raw: &str,
    env_name: &str,
    fallback: u64,
    min: u64,
    max: u64,
    unit: &str,
    mut log: F,
) -> u64
where
    F: FnMut(String),
{
    match raw.trim().parse::<u128>() {
        Ok(parsed) if parsed > 0 => {
            if parsed < min as u128 {
                log(format!(
                    "{env_name}='{raw}' is below minimum {min}{unit}, clamped to {min}{unit}"
                ));
                min
            } else if parsed > max as u128 {
                log(format!(
                    "{env_name}='{raw}' is above maximum {max}{unit}, clamped to {max}{unit}"
                ));
                max
            } else {
                parsed as u64
            }
        }
        _ => {
            log(format!(
                "invalid {env_name}='{raw}', fallback to {fallback}{unit}"
            ));
            fallback
        }
    }
}

fn parse_port_env<F>(raw: &str, env_name: &str, fallback: u16, mut log: F) -> u16
where
    F: FnMut(String),
{
    match raw.trim().parse::<u16>() {
        Ok(port) if port > 0 => port,
        _ => {
            log(format!("invalid {env_name}='{raw}', fallback to {fallback}"));
            fallback
        }
    }
}

/// `1/true/yes/on` and `0/false/no/off`; anything else falls back.
pub fn parse_bool_env<F>(raw: &str, env_name: &str, fallback: bool, mut log: F) -> bool
where
    F: FnMut(String),
{
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => {
            log(format!("invalid {env_name}='{raw}', fallback to {fallback}"));
            fallback
        }
    }
}
