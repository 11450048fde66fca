use url::Url;

use crate::startup_mode::DeploymentMode;

/// Origins the bundled frontend is served from, per platform.
pub const PACKAGED_ORIGINS: [&str; 3] = [
    "tauri://localhost",
    "http://tauri.localhost",
    "https://tauri.localhost",
];

pub const DEFAULT_DEV_SERVER_URL: &str = "http://localhost:3000";
pub const DEV_SERVER_URL_ENV: &str = "REPORT_DESKTOP_DEV_SERVER_URL";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationDecision {
    Allow,
    Block { open_external: bool },
}

/// Immutable set of origins in-app navigation may target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationAllowlist {
    origins: Vec<String>,
}

impl NavigationAllowlist {
    pub fn for_deployment(mode: DeploymentMode, dev_server_url: Option<&Url>) -> Self {
        let mut origins: Vec<String> = PACKAGED_ORIGINS
            .iter()
            .filter_map(|raw| Url::parse(raw).ok())
            .filter_map(|url| origin_key(&url))
            .collect();

        if mode == DeploymentMode::Development {
            if let Some(dev_origin) = dev_server_url.and_then(origin_key) {
                if !origins.contains(&dev_origin) {
                    origins.push(dev_origin);
                }
            }
        }

        Self { origins }
    }

    pub fn origins(&self) -> &[String] {
        &self.origins
    }

    pub fn contains(&self, url: &Url) -> bool {
        origin_key(url).is_some_and(|origin| self.origins.contains(&origin))
    }
}

/// `scheme://host[:port]` with the port elided when it is the scheme default.
///
/// `Url::origin` is opaque for custom schemes such as `tauri://`, so the
/// comparison key is built by hand.
pub fn origin_key(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    let scheme = url.scheme();
    Some(match url.port() {
        Some(port) => format!("{scheme}://{host}:{port}"),
        None => format!("{scheme}://{host}"),
    })
}

pub fn is_navigation_allowed(url: &Url, allowlist: &NavigationAllowlist) -> bool {
    allowlist.contains(url)
}

pub fn decide_navigation(url: &Url, allowlist: &NavigationAllowlist) -> NavigationDecision {
    if is_navigation_allowed(url, allowlist) {
        return NavigationDecision::Allow;
    }
    NavigationDecision::Block {
        open_external: is_external_web_url(url),
    }
}

pub fn is_external_web_url(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https")
}

/// Env override, then the configured dev URL, then the stock default.
pub fn resolve_dev_server_url<F>(
    raw_env: Option<&str>,
    configured: Option<&Url>,
    log: F,
) -> Option<Url>
where
    F: Fn(&str),
{
    if let Some(raw) = raw_env.map(str::trim).filter(|value| !value.is_empty()) {
        match Url::parse(raw) {
            Ok(url) => return Some(url),
            Err(error) => log(&format!(
                "invalid {DEV_SERVER_URL_ENV}='{raw}': {error}, fallback to configured dev url"
            )),
        }
    }

    configured
        .cloned()
        .or_else(|| Url::parse(DEFAULT_DEV_SERVER_URL).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> Url {
        Url::parse(raw).expect("parse test url")
    }

    #[test]
    fn packaged_allowlist_blocks_every_foreign_origin() {
        let allowlist = NavigationAllowlist::for_deployment(DeploymentMode::Packaged, None);

        assert!(is_navigation_allowed(&parse("tauri://localhost/index.html"), &allowlist));
        assert!(is_navigation_allowed(&parse("https://tauri.localhost/reports"), &allowlist));
        assert!(!is_navigation_allowed(&parse("http://localhost:3000/"), &allowlist));
        assert!(!is_navigation_allowed(&parse("https://example.com/"), &allowlist));
        assert!(!is_navigation_allowed(&parse("file:///etc/passwd"), &allowlist));
    }

    #[test]
    fn packaged_allowlist_ignores_dev_server() {
        let dev = parse("http://localhost:3000");
        let allowlist = NavigationAllowlist::for_deployment(DeploymentMode::Packaged, Some(&dev));
        assert!(!allowlist.contains(&dev));
        assert_eq!(allowlist.origins().len(), PACKAGED_ORIGINS.len());
    }

    #[test]
    fn development_allowlist_adds_exactly_the_dev_origin() {
        let dev = parse("http://localhost:3000/app");
        let allowlist =
            NavigationAllowlist::for_deployment(DeploymentMode::Development, Some(&dev));

        assert!(allowlist.contains(&parse("http://localhost:3000/other?x=1")));
        assert!(!allowlist.contains(&parse("http://localhost:3001/")));
        assert!(!allowlist.contains(&parse("https://localhost:3000/")));
        assert!(!allowlist.contains(&parse("http://127.0.0.1:3000/")));
        assert_eq!(allowlist.origins().len(), PACKAGED_ORIGINS.len() + 1);
    }

    #[test]
    fn origin_key_drops_default_ports() {
        assert_eq!(
            origin_key(&parse("https://tauri.localhost:443/x")).as_deref(),
            Some("https://tauri.localhost")
        );
        assert_eq!(origin_key(&parse("data:text/plain,hi")), None);
    }

    #[test]
    fn blocked_web_targets_request_external_open() {
        let allowlist = NavigationAllowlist::for_deployment(DeploymentMode::Packaged, None);
        assert_eq!(
            decide_navigation(&parse("https://example.com/docs"), &allowlist),
            NavigationDecision::Block {
                open_external: true
            }
        );
        assert_eq!(
            decide_navigation(&parse("mailto:ops@example.com"), &allowlist),
            NavigationDecision::Block {
                open_external: false
            }
        );
        assert_eq!(
            decide_navigation(&parse("tauri://localhost/"), &allowlist),
            NavigationDecision::Allow
        );
    }

    #[test]
    fn resolve_dev_server_url_prefers_env_and_logs_invalid_values() {
        let configured = parse("http://localhost:5173");
        let from_env =
            resolve_dev_server_url(Some("http://localhost:4000"), Some(&configured), |_| {});
        assert_eq!(from_env, Some(parse("http://localhost:4000")));

        let logs = std::cell::RefCell::new(Vec::new());
        let fallback = resolve_dev_server_url(Some("::not a url"), Some(&configured), |message| {
            logs.borrow_mut().push(message.to_string())
        });
        assert_eq!(fallback, Some(configured));
        assert_eq!(logs.borrow().len(), 1);

        assert_eq!(
            resolve_dev_server_url(None, None, |_| {}),
            Some(parse(DEFAULT_DEV_SERVER_URL))
        );
    }
}
