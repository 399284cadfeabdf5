mod network_risk;
mod page_signal_risk;
mod permission_risk;
mod phishing_risk;
mod script_risk;
mod url_heuristics;

pub use network_risk::NetworkRisk;
pub use page_signal_risk::PageSignalRisk;
pub use permission_risk::PermissionRisk;
pub use phishing_risk::PhishingRisk;
pub use script_risk::ScriptRisk;
pub use url_heuristics::UrlHeuristics;

use super::Extractor;

/// Returns the six built-in navigation extractors.
pub fn all_extractors() -> Vec<Box<dyn Extractor>> {
    vec![
        Box::new(UrlHeuristics),
        Box::new(PermissionRisk),
        Box::new(ScriptRisk),
        Box::new(NetworkRisk),
        Box::new(PhishingRisk),
        Box::new(PageSignalRisk),
    ]
}
