use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use crate::ir::DetectionInput;
use crate::rules::{Category, Extractor, ExtractorMetadata, Signal, SignalHit};

static IPV4_HOST_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+\.\d+\.\d+\.\d+$").unwrap());

// Matches the TLD as a dot-prefixed word anywhere in the host, not only at
// the end: `login.top-deals.com` fires as well.
static SUSPICIOUS_TLD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\.(zip|mov|click|xyz|top|tk|ru|cn)\b").unwrap());

const PUNYCODE_MARKER: &str = "xn--";

const MAX_HOST_LABELS: usize = 4;

/// NAV-001: URL shape heuristics.
///
/// Looks at the hostname only. A URL that does not parse earns a flat
/// penalty instead of failing the evaluation.
pub struct UrlHeuristics;

impl Extractor for UrlHeuristics {
    fn metadata(&self) -> ExtractorMetadata {
        ExtractorMetadata {
            id: "NAV-001".into(),
            name: "URL Heuristics".into(),
            description: "IP hosts, punycode, abused TLDs and deep subdomain chains".into(),
            category: Category::Url,
            signals: vec![
                Signal::UrlIp,
                Signal::Punycode,
                Signal::SuspiciousTld,
                Signal::ManySubdomains,
                Signal::UnparsableUrl,
            ],
        }
    }

    fn run(&self, input: &DetectionInput) -> Vec<SignalHit> {
        let hit = |signal| SignalHit::new(Category::Url, signal);

        let parsed = match Url::parse(&input.url) {
            Ok(parsed) => parsed,
            Err(e) => {
                return vec![hit(Signal::UnparsableUrl).with_detail(e.to_string())];
            }
        };
        let host = parsed.host_str().unwrap_or_default();

        let mut hits = Vec::new();
        if IPV4_HOST_RE.is_match(host) {
            hits.push(hit(Signal::UrlIp).with_detail(host));
        }
        if host.contains(PUNYCODE_MARKER) {
            hits.push(hit(Signal::Punycode).with_detail(host));
        }
        if let Some(m) = SUSPICIOUS_TLD_RE.find(host) {
            hits.push(hit(Signal::SuspiciousTld).with_detail(m.as_str()));
        }
        let labels = host.split('.').count();
        if labels > MAX_HOST_LABELS {
            hits.push(hit(Signal::ManySubdomains).with_detail(format!("{labels} labels")));
        }
        hits
    }
}
