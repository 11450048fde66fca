use tauri::AppHandle;
use tauri_plugin_opener::OpenerExt;
use url::Url;

use crate::{origin_policy, status_broadcast::STARTUP_STATUS_EVENT};

static DESKTOP_BRIDGE_BOOTSTRAP_TEMPLATE: &str = include_str!("bridge_bootstrap.js");

/// Initialization script exposing `window.desktop` with the given base URL.
pub fn desktop_bridge_script(api_base_url: &str) -> String {
    let api_base_url_json =
        serde_json::to_string(api_base_url).unwrap_or_else(|_| "\"\"".to_string());
    DESKTOP_BRIDGE_BOOTSTRAP_TEMPLATE
        .replace("{STARTUP_STATUS_EVENT}", STARTUP_STATUS_EVENT)
        .replace("{API_BASE_URL_JSON}", &api_base_url_json)
}

/// Opens http/https targets in the default browser; everything else is refused.
pub fn open_in_external_browser<F>(app: &AppHandle, url: &Url, log: F) -> Result<(), String>
where
    F: Fn(&str),
{
    if !origin_policy::is_external_web_url(url) {
        return Err(format!("Refusing to open non-web url externally: {url}"));
    }
    app.opener()
        .open_url(url.as_str(), None::<&str>)
        .map_err(|error| {
            let message = format!("Failed to open {url} in external browser: {error}");
            log(&message);
            message
        })
}
