use std::path::PathBuf;

use url::Url;

use crate::origin_policy::PACKAGED_ORIGINS;

pub const HEALTH_PATH: &str = "/healthz";

const ENV_API_HOST: &str = "DESKTOP_API_HOST";
const ENV_API_PORT: &str = "DESKTOP_API_PORT";
const ENV_API_BASE_URL: &str = "DESKTOP_API_BASE_URL";
const ENV_CORS_EXTRA_ORIGINS: &str = "API_CORS_EXTRA_ORIGINS";

/// Everything needed to spawn the service for one attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchPlan {
    pub executable: PathBuf,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
    pub packaged_mode: bool,
    pub host: String,
    pub port: u16,
}

impl LaunchPlan {
    pub fn for_service(executable: PathBuf, host: &str, port: u16, packaged_mode: bool) -> Self {
        Self {
            executable,
            args: Vec::new(),
            env: build_backend_env(host, port),
            packaged_mode,
            host: host.to_string(),
            port,
        }
    }

    pub fn base_url(&self) -> String {
        service_base_url(&self.host, self.port)
    }
}

pub fn service_base_url(host: &str, port: u16) -> String {
    if host.contains(':') && !host.starts_with('[') {
        format!("http://[{host}]:{port}")
    } else {
        format!("http://{host}:{port}")
    }
}

pub fn health_endpoint(base_url: &str) -> Result<Url, String> {
    let base = Url::parse(base_url)
        .map_err(|error| format!("Invalid service base url {base_url}: {error}"))?;
    base.join(HEALTH_PATH)
        .map_err(|error| format!("Invalid health endpoint for {base_url}: {error}"))
}

/// `null` covers `file://` pages; the rest are the packaged webview origins.
pub fn cors_extra_origins() -> String {
    std::iter::once("null")
        .chain(PACKAGED_ORIGINS.iter().copied())
        .collect::<Vec<_>>()
        .join(",")
}

/// Variables added on top of the inherited environment.
pub fn build_backend_env(host: &str, port: u16) -> Vec<(String, String)> {
    vec![
        (ENV_API_HOST.to_string(), host.to_string()),
        (ENV_API_PORT.to_string(), port.to_string()),
        (ENV_API_BASE_URL.to_string(), service_base_url(host, port)),
        (ENV_CORS_EXTRA_ORIGINS.to_string(), cors_extra_origins()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env_value<'a>(env: &'a [(String, String)], key: &str) -> Option<&'a str> {
        env.iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }

    #[test]
    fn backend_env_carries_resolved_port_and_base_url() {
        let env = build_backend_env("127.0.0.1", 8003);
        assert_eq!(env_value(&env, "DESKTOP_API_HOST"), Some("127.0.0.1"));
        assert_eq!(env_value(&env, "DESKTOP_API_PORT"), Some("8003"));
        assert_eq!(
            env_value(&env, "DESKTOP_API_BASE_URL"),
            Some("http://127.0.0.1:8003")
        );
        let cors = env_value(&env, "API_CORS_EXTRA_ORIGINS").expect("cors origins");
        assert!(cors.starts_with("null,"));
        assert!(cors.contains("tauri://localhost"));
    }

    #[test]
    fn health_endpoint_appends_healthz() {
        let endpoint = health_endpoint("http://127.0.0.1:8000").expect("valid endpoint");
        assert_eq!(endpoint.as_str(), "http://127.0.0.1:8000/healthz");
    }

    #[test]
    fn service_base_url_brackets_ipv6_hosts() {
        assert_eq!(service_base_url("::1", 8000), "http://[::1]:8000");
        assert_eq!(service_base_url("localhost", 9000), "http://localhost:9000");
    }

    #[test]
    fn plan_for_service_uses_plan_port_in_base_url() {
        let plan =
            LaunchPlan::for_service(PathBuf::from("/bin/api-server"), "127.0.0.1", 8011, true);
        assert_eq!(plan.base_url(), "http://127.0.0.1:8011");
        assert!(plan.args.is_empty());
        assert!(plan.packaged_mode);
    }
}
