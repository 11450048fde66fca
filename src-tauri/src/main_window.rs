use serde_json::json;
use tauri::{AppHandle, Manager, WebviewUrl, WebviewWindowBuilder};
use url::Url;

use crate::{
    app_helpers::{append_runtime_log, log_warn},
    desktop_bridge,
    logging::LogLevel,
    origin_policy::{decide_navigation, NavigationAllowlist, NavigationDecision},
    startup_mode::DeploymentMode,
    ShellState,
};

pub const MAIN_WINDOW_LABEL: &str = "main";
pub const SPLASH_WINDOW_LABEL: &str = "splash";

const SPLASH_PAGE: &str = "splash.html";
const MAIN_PAGE: &str = "index.html";

/// Cancels navigation outside the allowlist and hands web targets to the
/// default browser.
fn navigation_guard(
    app_handle: &AppHandle,
    allowlist: NavigationAllowlist,
) -> impl Fn(&Url) -> bool + Send + 'static {
    let app_handle = app_handle.clone();
    move |url| match decide_navigation(url, &allowlist) {
        NavigationDecision::Allow => true,
        NavigationDecision::Block { open_external } => {
            append_runtime_log(
                LogLevel::Warn,
                "Blocked navigation outside allowlist",
                json!({ "targetUrl": url.as_str() }),
            );
            if open_external {
                let _ = desktop_bridge::open_in_external_browser(&app_handle, url, log_warn);
            }
            false
        }
    }
}

fn main_window_url(deployment: DeploymentMode, dev_server_url: Option<&Url>) -> WebviewUrl {
    match (deployment, dev_server_url) {
        (DeploymentMode::Development, Some(url)) => WebviewUrl::External(url.clone()),
        _ => WebviewUrl::App(MAIN_PAGE.into()),
    }
}

pub fn create_splash_window(app_handle: &AppHandle) -> Result<(), String> {
    let state = app_handle.state::<ShellState>();
    let script = desktop_bridge::desktop_bridge_script(&state.service_base_url());
    WebviewWindowBuilder::new(
        app_handle,
        SPLASH_WINDOW_LABEL,
        WebviewUrl::App(SPLASH_PAGE.into()),
    )
    .title(state.texts.splash_title)
    .inner_size(480.0, 320.0)
    .resizable(false)
    .decorations(false)
    .center()
    .initialization_script(&script)
    .on_navigation(navigation_guard(app_handle, state.allowlist.clone()))
    .build()
    .map(|_| ())
    .map_err(|error| format!("Failed to create splash window: {error}"))
}

/// Created hidden while the splash is up; `reveal_main_window` swaps them once
/// the main page has loaded.
pub fn create_main_window(app_handle: &AppHandle) -> Result<(), String> {
    if app_handle.get_webview_window(MAIN_WINDOW_LABEL).is_some() {
        return Ok(());
    }

    let state = app_handle.state::<ShellState>();
    let script = desktop_bridge::desktop_bridge_script(&state.service_base_url());
    let has_splash = app_handle.get_webview_window(SPLASH_WINDOW_LABEL).is_some();
    WebviewWindowBuilder::new(
        app_handle,
        MAIN_WINDOW_LABEL,
        main_window_url(state.deployment, state.dev_server_url.as_ref()),
    )
    .title(state.texts.main_title)
    .inner_size(1360.0, 900.0)
    .min_inner_size(1024.0, 720.0)
    .center()
    .visible(!has_splash)
    .initialization_script(&script)
    .on_navigation(navigation_guard(app_handle, state.allowlist.clone()))
    .build()
    .map(|_| ())
    .map_err(|error| format!("Failed to create main window: {error}"))
}

pub fn reveal_main_window<F>(app_handle: &AppHandle, log: F)
where
    F: Fn(&str),
{
    let Some(window) = app_handle.get_webview_window(MAIN_WINDOW_LABEL) else {
        log("reveal_main_window skipped: main window not found");
        return;
    };

    if let Err(error) = window.show() {
        log(&format!("failed to show main window: {error}"));
    }
    if let Err(error) = window.set_focus() {
        log(&format!("failed to focus main window: {error}"));
    }

    if let Some(splash) = app_handle.get_webview_window(SPLASH_WINDOW_LABEL) {
        if let Err(error) = splash.close() {
            log(&format!("failed to close splash window: {error}"));
        }
    }
}
