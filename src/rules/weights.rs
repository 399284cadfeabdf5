//! The navigation weight table.
//!
//! Every extractor reads its points from `WEIGHTS` through `Signal::weight`;
//! no extractor carries its own literals.

use serde::{Deserialize, Serialize};

/// Points contributed by each navigation signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WeightTable {
    pub url_ip: u32,
    pub punycode: u32,
    pub suspicious_tld: u32,
    pub many_subdomains: u32,
    pub unparsable_url: u32,
    pub permission_camera: u32,
    pub permission_microphone: u32,
    pub permission_geolocation: u32,
    pub permission_clipboard: u32,
    pub permission_notifications: u32,
    pub eval_use: u32,
    pub document_write: u32,
    pub endless_loop: u32,
    pub obfuscation: u32,
    pub foreign_requests: u32,
    pub large_post: u32,
    pub pastebin_refer: u32,
    pub password_field: u32,
    pub phishing_text: u32,
    pub inline_handlers: u32,
    pub many_iframes: u32,
    pub timed_out: u32,
    pub collection_error: u32,
}

pub const WEIGHTS: WeightTable = WeightTable {
    url_ip: 30,
    punycode: 25,
    suspicious_tld: 12,
    many_subdomains: 10,
    unparsable_url: 5,
    permission_camera: 25,
    permission_microphone: 25,
    permission_geolocation: 15,
    permission_clipboard: 10,
    permission_notifications: 8,
    eval_use: 20,
    document_write: 8,
    endless_loop: 25,
    obfuscation: 25,
    foreign_requests: 12,
    large_post: 25,
    pastebin_refer: 12,
    password_field: 10,
    phishing_text: 12,
    inline_handlers: 10,
    many_iframes: 8,
    timed_out: 8,
    collection_error: 8,
};

/// A single navigation heuristic that can fire during extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    UrlIp,
    Punycode,
    SuspiciousTld,
    ManySubdomains,
    UnparsableUrl,
    PermissionCamera,
    PermissionMicrophone,
    PermissionGeolocation,
    PermissionClipboard,
    PermissionNotifications,
    EvalUse,
    DocumentWrite,
    EndlessLoop,
    Obfuscation,
    ForeignRequests,
    LargePost,
    PastebinRefer,
    PasswordField,
    PhishingTitle,
    PhishingText,
    InlineHandlers,
    ManyIframes,
    TimedOut,
    CollectionError,
}

impl Signal {
    pub const ALL: [Signal; 24] = [
        Signal::UrlIp,
        Signal::Punycode,
        Signal::SuspiciousTld,
        Signal::ManySubdomains,
        Signal::UnparsableUrl,
        Signal::PermissionCamera,
        Signal::PermissionMicrophone,
        Signal::PermissionGeolocation,
        Signal::PermissionClipboard,
        Signal::PermissionNotifications,
        Signal::EvalUse,
        Signal::DocumentWrite,
        Signal::EndlessLoop,
        Signal::Obfuscation,
        Signal::ForeignRequests,
        Signal::LargePost,
        Signal::PastebinRefer,
        Signal::PasswordField,
        Signal::PhishingTitle,
        Signal::PhishingText,
        Signal::InlineHandlers,
        Signal::ManyIframes,
        Signal::TimedOut,
        Signal::CollectionError,
    ];

    pub fn weight(self) -> u32 {
        self.weight_in(&WEIGHTS)
    }

    pub fn weight_in(self, table: &WeightTable) -> u32 {
        match self {
            Self::UrlIp => table.url_ip,
            Self::Punycode => table.punycode,
            Self::SuspiciousTld => table.suspicious_tld,
            Self::ManySubdomains => table.many_subdomains,
            Self::UnparsableUrl => table.unparsable_url,
            Self::PermissionCamera => table.permission_camera,
            Self::PermissionMicrophone => table.permission_microphone,
            Self::PermissionGeolocation => table.permission_geolocation,
            Self::PermissionClipboard => table.permission_clipboard,
            Self::PermissionNotifications => table.permission_notifications,
            Self::EvalUse => table.eval_use,
            Self::DocumentWrite => table.document_write,
            Self::EndlessLoop => table.endless_loop,
            Self::Obfuscation => table.obfuscation,
            Self::ForeignRequests => table.foreign_requests,
            Self::LargePost => table.large_post,
            Self::PastebinRefer => table.pastebin_refer,
            Self::PasswordField => table.password_field,
            // title and body keyword matches share one weight
            Self::PhishingTitle | Self::PhishingText => table.phishing_text,
            Self::InlineHandlers => table.inline_handlers,
            Self::ManyIframes => table.many_iframes,
            Self::TimedOut => table.timed_out,
            Self::CollectionError => table.collection_error,
        }
    }

    /// Stable snake_case name, matching the serialized form.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::UrlIp => "url_ip",
            Self::Punycode => "punycode",
            Self::SuspiciousTld => "suspicious_tld",
            Self::ManySubdomains => "many_subdomains",
            Self::UnparsableUrl => "unparsable_url",
            Self::PermissionCamera => "permission_camera",
            Self::PermissionMicrophone => "permission_microphone",
            Self::PermissionGeolocation => "permission_geolocation",
            Self::PermissionClipboard => "permission_clipboard",
            Self::PermissionNotifications => "permission_notifications",
            Self::EvalUse => "eval_use",
            Self::DocumentWrite => "document_write",
            Self::EndlessLoop => "endless_loop",
            Self::Obfuscation => "obfuscation",
            Self::ForeignRequests => "foreign_requests",
            Self::LargePost => "large_post",
            Self::PastebinRefer => "pastebin_refer",
            Self::PasswordField => "password_field",
            Self::PhishingTitle => "phishing_title",
            Self::PhishingText => "phishing_text",
            Self::InlineHandlers => "inline_handlers",
            Self::ManyIframes => "many_iframes",
            Self::TimedOut => "timed_out",
            Self::CollectionError => "collection_error",
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            Self::UrlIp => "Host is a literal IPv4 address",
            Self::Punycode => "Host contains a punycode (xn--) label",
            Self::SuspiciousTld => "Host uses a frequently abused TLD",
            Self::ManySubdomains => "Host has more than four labels",
            Self::UnparsableUrl => "URL could not be parsed",
            Self::PermissionCamera => "Page holds camera access",
            Self::PermissionMicrophone => "Page holds microphone access",
            Self::PermissionGeolocation => "Page holds geolocation access",
            Self::PermissionClipboard => "Page holds clipboard access",
            Self::PermissionNotifications => "Page holds notification access",
            Self::EvalUse => "Script builds code at runtime (eval / new Function)",
            Self::DocumentWrite => "Script rewrites the document (document.write)",
            Self::EndlessLoop => "Script contains an infinite loop literal",
            Self::Obfuscation => "Large script with a long base64-like run",
            Self::ForeignRequests => "More than ten requests to foreign origins",
            Self::LargePost => "POST with a body over 500000 bytes",
            Self::PastebinRefer => "Request to a paste or chat-drop service",
            Self::PasswordField => "Page has a password field",
            Self::PhishingTitle => "Title contains credential or urgency keywords",
            Self::PhishingText => "Body contains urgency or confirmation wording",
            Self::InlineHandlers => "Fifty or more inline event handlers",
            Self::ManyIframes => "Ten or more iframes",
            Self::TimedOut => "Page signal collection timed out",
            Self::CollectionError => "Page signal collection failed",
        }
    }
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_weight_is_positive() {
        for signal in Signal::ALL {
            assert!(signal.weight() > 0, "{signal} has no weight");
        }
    }

    #[test]
    fn phishing_signals_share_weight() {
        assert_eq!(Signal::PhishingTitle.weight(), WEIGHTS.phishing_text);
        assert_eq!(Signal::PhishingText.weight(), WEIGHTS.phishing_text);
    }

    #[test]
    fn display_uses_snake_case() {
        assert_eq!(Signal::UrlIp.to_string(), "url_ip");
        assert_eq!(Signal::CollectionError.to_string(), "collection_error");
    }
}
