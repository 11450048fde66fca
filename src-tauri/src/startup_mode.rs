use crate::backend_config::parse_bool_env;

pub const DEPLOYMENT_ENV: &str = "REPORT_DESKTOP_DEPLOYMENT";
pub const BACKEND_AUTO_START_ENV: &str = "REPORT_DESKTOP_BACKEND_AUTO_START";

const DEPLOYMENT_PACKAGED: &str = "packaged";
const DEPLOYMENT_DEVELOPMENT: &str = "development";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeploymentMode {
    Packaged,
    Development,
}

impl DeploymentMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Packaged => DEPLOYMENT_PACKAGED,
            Self::Development => DEPLOYMENT_DEVELOPMENT,
        }
    }

    pub fn is_packaged(self) -> bool {
        self == Self::Packaged
    }
}

/// Env override first, otherwise whatever the build says.
pub fn resolve_deployment_mode(
    raw_env: Option<&str>,
    is_dev_build: bool,
) -> (DeploymentMode, Option<String>) {
    let build_mode = if is_dev_build {
        DeploymentMode::Development
    } else {
        DeploymentMode::Packaged
    };

    let Some(raw) = raw_env else {
        return (build_mode, None);
    };
    let normalized = raw.trim();
    if normalized.is_empty() {
        return (build_mode, None);
    }
    if normalized.eq_ignore_ascii_case(DEPLOYMENT_PACKAGED) {
        return (
            DeploymentMode::Packaged,
            Some("deployment mode forced to packaged by env".to_string()),
        );
    }
    if normalized.eq_ignore_ascii_case(DEPLOYMENT_DEVELOPMENT)
        || normalized.eq_ignore_ascii_case("dev")
    {
        return (
            DeploymentMode::Development,
            Some("deployment mode forced to development by env".to_string()),
        );
    }

    (
        build_mode,
        Some(format!(
            "invalid deployment mode in {DEPLOYMENT_ENV}: {normalized}, fallback to {}",
            build_mode.as_str()
        )),
    )
}

/// Packaged builds always own their service; development builds opt in.
pub fn should_auto_start_backend<F>(mode: DeploymentMode, raw_env: Option<&str>, log: F) -> bool
where
    F: FnMut(String),
{
    let default = mode.is_packaged();
    match raw_env {
        Some(raw) if !raw.trim().is_empty() => {
            parse_bool_env(raw, BACKEND_AUTO_START_ENV, default, log)
        }
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_deployment_mode_follows_build_without_env() {
        assert_eq!(
            resolve_deployment_mode(None, true),
            (DeploymentMode::Development, None)
        );
        assert_eq!(
            resolve_deployment_mode(Some("  "), false),
            (DeploymentMode::Packaged, None)
        );
    }

    #[test]
    fn resolve_deployment_mode_accepts_env_override_case_insensitive() {
        let (mode, message) = resolve_deployment_mode(Some("Packaged"), true);
        assert_eq!(mode, DeploymentMode::Packaged);
        assert!(message
            .expect("expected override message")
            .contains("forced to packaged"));
    }

    #[test]
    fn resolve_deployment_mode_rejects_unknown_values() {
        let (mode, message) = resolve_deployment_mode(Some("staging"), false);
        assert_eq!(mode, DeploymentMode::Packaged);
        assert!(message
            .expect("expected invalid env warning")
            .contains("invalid deployment mode"));
    }

    #[test]
    fn auto_start_defaults_by_mode_and_honors_env() {
        assert!(should_auto_start_backend(DeploymentMode::Packaged, None, |_| {}));
        assert!(!should_auto_start_backend(DeploymentMode::Development, None, |_| {}));
        assert!(should_auto_start_backend(
            DeploymentMode::Development,
            Some("1"),
            |_| {}
        ));
        assert!(!should_auto_start_backend(
            DeploymentMode::Packaged,
            Some("off"),
            |_| {}
        ));
    }
}
