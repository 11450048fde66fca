use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PermissionKind {
    ClipboardSanitizedWrite,
    Fullscreen,
    Geolocation,
    Media,
    DisplayCapture,
    Notifications,
    Midi,
    ClipboardRead,
    PointerLock,
    Unknown,
}

impl PermissionKind {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "clipboard-sanitized-write" => Self::ClipboardSanitizedWrite,
            "fullscreen" => Self::Fullscreen,
            "geolocation" => Self::Geolocation,
            "media" => Self::Media,
            "display-capture" => Self::DisplayCapture,
            "notifications" => Self::Notifications,
            "midi" | "midisysex" => Self::Midi,
            "clipboard-read" => Self::ClipboardRead,
            "pointer-lock" | "pointerlock" => Self::PointerLock,
            _ => Self::Unknown,
        }
    }
}

/// Fixed grant table; anything not listed here is denied.
pub fn should_grant_permission(kind: PermissionKind) -> bool {
    matches!(
        kind,
        PermissionKind::ClipboardSanitizedWrite | PermissionKind::Fullscreen
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grants_only_clipboard_write_and_fullscreen() {
        assert!(should_grant_permission(PermissionKind::parse(
            "clipboard-sanitized-write"
        )));
        assert!(should_grant_permission(PermissionKind::parse("Fullscreen")));

        for denied in [
            "geolocation",
            "media",
            "display-capture",
            "notifications",
            "midi",
            "clipboard-read",
            "pointer-lock",
        ] {
            assert!(
                !should_grant_permission(PermissionKind::parse(denied)),
                "{denied} must be denied"
            );
        }
    }

    #[test]
    fn unknown_kinds_are_denied() {
        assert_eq!(PermissionKind::parse("camera-pan"), PermissionKind::Unknown);
        assert!(!should_grant_permission(PermissionKind::parse("")));
    }

    #[test]
    fn kind_serializes_as_kebab_case() {
        let value = serde_json::to_value(PermissionKind::DisplayCapture).expect("serialize kind");
        assert_eq!(value, "display-capture");
    }
}
