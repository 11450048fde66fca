use std::env;

pub const DEFAULT_SHELL_LOCALE: &str = "zh-CN";
const LOCALE_ENV_KEYS: [&str; 3] = ["REPORT_DESKTOP_LOCALE", "LC_ALL", "LANG"];

/// Localized status and alert copy shown while the bundled service starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartupTexts {
    pub idle: &'static str,
    pub preparing: &'static str,
    pub allocating_port: &'static str,
    pub launching: &'static str,
    pub waiting_ready: &'static str,
    pub ready: &'static str,
    pub port_exhausted: &'static str,
    pub executable_missing: &'static str,
    pub spawn_failed: &'static str,
    pub service_exited: &'static str,
    pub readiness_timeout: &'static str,
    pub alert_timeout_title: &'static str,
    pub alert_exited_title: &'static str,
    pub alert_error_title: &'static str,
    pub splash_title: &'static str,
    pub main_title: &'static str,
    pub export_dialog_title: &'static str,
}

pub fn startup_texts_for_locale(locale: &str) -> StartupTexts {
    if locale == "en-US" {
        return StartupTexts {
            idle: "Local service on standby",
            preparing: "Preparing local service...",
            allocating_port: "Allocating service port...",
            launching: "Starting local service process...",
            waiting_ready: "Waiting for local service to become ready...",
            ready: "Local service is ready",
            port_exhausted: "No free port is available for the local service",
            executable_missing: "The bundled service executable is missing",
            spawn_failed: "Failed to start the local service",
            service_exited: "The local service has exited, please restart the app",
            readiness_timeout: "Timed out waiting for the local service",
            alert_timeout_title: "Backend Startup Timeout",
            alert_exited_title: "Backend Exited",
            alert_error_title: "Bundled Backend Error",
            splash_title: "Report Formatter - Starting",
            main_title: "Report Formatter",
            export_dialog_title: "Export Runtime Logs",
        };
    }

    StartupTexts {
        idle: "本地服务待命",
        preparing: "正在准备本地服务...",
        allocating_port: "正在分配服务端口...",
        launching: "正在启动本地服务进程...",
        waiting_ready: "正在等待本地服务就绪...",
        ready: "本地服务已就绪",
        port_exhausted: "没有可用的本地服务端口",
        executable_missing: "未找到内置服务程序",
        spawn_failed: "本地服务启动失败",
        service_exited: "本地服务已退出，请重启应用",
        readiness_timeout: "本地服务启动超时",
        alert_timeout_title: "Backend Startup Timeout",
        alert_exited_title: "Backend Exited",
        alert_error_title: "Bundled Backend Error",
        splash_title: "Report Formatter - 启动中",
        main_title: "Report Formatter",
        export_dialog_title: "导出运行日志",
    }
}

pub fn resolve_shell_locale() -> &'static str {
    resolve_shell_locale_with(|key| env::var(key).ok())
}

/// First recognized locale among the env keys, in order, else the default.
fn resolve_shell_locale_with(lookup: impl Fn(&str) -> Option<String>) -> &'static str {
    LOCALE_ENV_KEYS
        .into_iter()
        .filter_map(&lookup)
        .find_map(|value| normalize_shell_locale(&value))
        .unwrap_or(DEFAULT_SHELL_LOCALE)
}

fn normalize_shell_locale(raw: &str) -> Option<&'static str> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let lowered = raw.to_ascii_lowercase();
    if lowered.starts_with("zh") {
        return Some("zh-CN");
    }
    if lowered.starts_with("en") {
        return Some("en-US");
    }
    None
}
