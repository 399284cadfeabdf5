use crate::ir::DetectionInput;
use crate::rules::{Category, Extractor, ExtractorMetadata, Signal, SignalHit};

/// More foreign requests than this in the window fires `ForeignRequests`.
const FOREIGN_REQUEST_LIMIT: usize = 10;

/// POST bodies larger than this fire `LargePost`.
const LARGE_POST_BYTES: u64 = 500_000;

/// URL substrings of paste and chat-drop services used for exfiltration.
const EXFIL_MARKERS: &[&str] = &["pastebin", "discord"];

/// NAV-004: the tab's recent network activity.
///
/// `LargePost` and `PastebinRefer` fire once per qualifying request.
pub struct NetworkRisk;

impl Extractor for NetworkRisk {
    fn metadata(&self) -> ExtractorMetadata {
        ExtractorMetadata {
            id: "NAV-004".into(),
            name: "Network Risk".into(),
            description: "Foreign request volume, large uploads and paste-site traffic".into(),
            category: Category::Network,
            signals: vec![
                Signal::ForeignRequests,
                Signal::LargePost,
                Signal::PastebinRefer,
            ],
        }
    }

    fn run(&self, input: &DetectionInput) -> Vec<SignalHit> {
        let hit = |signal| SignalHit::new(Category::Network, signal);
        let mut hits = Vec::new();

        let foreign = match input.page_origin.as_deref() {
            Some(origin) => input
                .requests
                .iter()
                .filter(|r| !r.url.starts_with(origin))
                .count(),
            None => input.requests.len(),
        };
        if foreign > FOREIGN_REQUEST_LIMIT {
            hits.push(hit(Signal::ForeignRequests).with_detail(format!("{foreign} foreign requests")));
        }

        for request in &input.requests {
            if request.method.eq_ignore_ascii_case("POST") && request.body_size > LARGE_POST_BYTES {
                hits.push(hit(Signal::LargePost).with_detail(format!(
                    "POST {} ({} bytes)",
                    request.url, request.body_size
                )));
            }
            if EXFIL_MARKERS.iter().any(|m| request.url.contains(m)) {
                hits.push(hit(Signal::PastebinRefer).with_detail(request.url.clone()));
            }
        }
        hits
    }
}
