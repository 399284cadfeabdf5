use crate::ir::DetectionInput;
use crate::rules::{Category, Extractor, ExtractorMetadata, Signal, SignalHit};

/// Permission names (both the web and extension spellings) per signal.
const PERMISSION_SIGNALS: &[(&[&str], Signal)] = &[
    (&["camera", "videoCapture"], Signal::PermissionCamera),
    (&["microphone", "audioCapture"], Signal::PermissionMicrophone),
    (&["geolocation"], Signal::PermissionGeolocation),
    (
        &["clipboardRead", "clipboardWrite", "clipboard-read", "clipboard-write"],
        Signal::PermissionClipboard,
    ),
    (&["notifications"], Signal::PermissionNotifications),
];

/// NAV-002: sensitive permissions held by the page.
pub struct PermissionRisk;

impl Extractor for PermissionRisk {
    fn metadata(&self) -> ExtractorMetadata {
        ExtractorMetadata {
            id: "NAV-002".into(),
            name: "Permission Risk".into(),
            description: "Camera, microphone, location, clipboard and notification access".into(),
            category: Category::Permission,
            signals: PERMISSION_SIGNALS.iter().map(|(_, s)| *s).collect(),
        }
    }

    fn run(&self, input: &DetectionInput) -> Vec<SignalHit> {
        PERMISSION_SIGNALS
            .iter()
            .filter_map(|(names, signal)| {
                names
                    .iter()
                    .find(|n| input.permissions.contains(**n))
                    .map(|n| SignalHit::new(Category::Permission, *signal).with_detail(*n))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score(permissions: &[&str]) -> u32 {
        PermissionRisk.score(&DetectionInput {
            permissions: permissions.iter().map(|p| p.to_string()).collect(),
            ..Default::default()
        })
    }

    #[test]
    fn each_permission_adds_its_weight() {
        assert_eq!(score(&["camera"]), 25);
        assert_eq!(score(&["audioCapture"]), 25);
        assert_eq!(score(&["geolocation"]), 15);
        assert_eq!(score(&["clipboard-write"]), 10);
        assert_eq!(score(&["notifications"]), 8);
    }

    #[test]
    fn aliases_count_once() {
        assert_eq!(score(&["camera", "videoCapture"]), 25);
        assert_eq!(score(&["clipboardRead", "clipboard-write"]), 10);
    }

    #[test]
    fn unknown_permissions_are_ignored() {
        assert_eq!(score(&[]), 0);
        assert_eq!(score(&["storage", "midi"]), 0);
        assert_eq!(
            score(&["camera", "microphone", "geolocation", "clipboardRead", "notifications"]),
            83
        );
    }
}
