//! Download risk scoring.
//!
//! Runs on every download-creation event with its own rule set and weights.
//! Nothing here reads the navigation weight table, so changes on either side
//! leave the other's decisions untouched.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Risk at or above this cancels the download.
pub const CANCEL_THRESHOLD: u32 = 60;

/// Points contributed by each download rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DownloadWeights {
    pub dangerous_extension: u32,
    pub double_extension: u32,
    pub archive: u32,
    pub lure_keyword: u32,
    pub test_malware: u32,
    pub opaque_source: u32,
    pub no_referrer: u32,
}

pub const DOWNLOAD_WEIGHTS: DownloadWeights = DownloadWeights {
    dangerous_extension: 40,
    double_extension: 50,
    archive: 15,
    lure_keyword: 20,
    test_malware: 100,
    opaque_source: 20,
    no_referrer: 15,
};

static DANGEROUS_EXT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\.(exe|msi|bat|cmd|scr|ps1|vbs|jar|apk|dll)$").unwrap());

// A benign-looking extension directly followed by an executable one.
static DOUBLE_EXT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\.(pdf|jpg|png|docx|zip)\.(exe|bat|scr)$").unwrap());

static ARCHIVE_EXT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.(zip|rar|7z)$").unwrap());

static LURE_KEYWORD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(invoice|payment|secure|update|verify|crack|keygen|patch)").unwrap()
});

/// EICAR anti-malware test file marker.
const TEST_MALWARE_MARKER: &str = "eicar";

const OPAQUE_SCHEMES: &[&str] = &["blob:", "data:"];

/// A download about to start.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DownloadCandidate {
    /// Host-assigned download identifier.
    pub id: u64,
    pub filename: String,
    pub source_url: String,
    /// Referrer URL, if the host reported one.
    pub referrer: Option<String>,
}

impl DownloadCandidate {
    pub fn has_referrer(&self) -> bool {
        self.referrer.as_deref().is_some_and(|r| !r.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DownloadRule {
    DangerousExtension,
    DoubleExtension,
    Archive,
    LureKeyword,
    TestMalware,
    OpaqueSource,
    NoReferrer,
}

impl DownloadRule {
    pub const ALL: [DownloadRule; 7] = [
        DownloadRule::DangerousExtension,
        DownloadRule::DoubleExtension,
        DownloadRule::Archive,
        DownloadRule::LureKeyword,
        DownloadRule::TestMalware,
        DownloadRule::OpaqueSource,
        DownloadRule::NoReferrer,
    ];

    pub fn weight(self) -> u32 {
        let w = &DOWNLOAD_WEIGHTS;
        match self {
            Self::DangerousExtension => w.dangerous_extension,
            Self::DoubleExtension => w.double_extension,
            Self::Archive => w.archive,
            Self::LureKeyword => w.lure_keyword,
            Self::TestMalware => w.test_malware,
            Self::OpaqueSource => w.opaque_source,
            Self::NoReferrer => w.no_referrer,
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            Self::DangerousExtension => "Executable or script file type",
            Self::DoubleExtension => "Benign extension followed by an executable one",
            Self::Archive => "Archive file type",
            Self::LureKeyword => "Social-engineering keyword in the filename",
            Self::TestMalware => "Anti-malware test file marker",
            Self::OpaqueSource => "Served from a blob: or data: URL",
            Self::NoReferrer => "No referrer (possible drive-by download)",
        }
    }
}

impl std::fmt::Display for DownloadRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DangerousExtension => write!(f, "dangerous_extension"),
            Self::DoubleExtension => write!(f, "double_extension"),
            Self::Archive => write!(f, "archive"),
            Self::LureKeyword => write!(f, "lure_keyword"),
            Self::TestMalware => write!(f, "test_malware"),
            Self::OpaqueSource => write!(f, "opaque_source"),
            Self::NoReferrer => write!(f, "no_referrer"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadHit {
    pub rule: DownloadRule,
    pub points: u32,
    pub detail: Option<String>,
}

impl DownloadHit {
    fn new(rule: DownloadRule, detail: Option<String>) -> Self {
        Self {
            rule,
            points: rule.weight(),
            detail,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadScoreResult {
    pub risk_score: u32,
    pub should_cancel: bool,
    pub hits: Vec<DownloadHit>,
}

/// Scores a single download candidate.
#[derive(Debug, Clone, Copy, Default)]
pub struct DownloadRiskScorer;

impl DownloadRiskScorer {
    pub fn new() -> Self {
        Self
    }

    pub fn score(&self, candidate: &DownloadCandidate) -> DownloadScoreResult {
        let filename = candidate.filename.to_lowercase();
        let url = candidate.source_url.to_lowercase();
        let mut hits = Vec::new();

        if let Some(ext) = first_match(&DANGEROUS_EXT_RE, &filename) {
            hits.push(DownloadHit::new(DownloadRule::DangerousExtension, Some(ext)));
        }
        if let Some(ext) = first_match(&DOUBLE_EXT_RE, &filename) {
            hits.push(DownloadHit::new(DownloadRule::DoubleExtension, Some(ext)));
        }
        if let Some(ext) = first_match(&ARCHIVE_EXT_RE, &filename) {
            hits.push(DownloadHit::new(DownloadRule::Archive, Some(ext)));
        }
        if let Some(word) = first_match(&LURE_KEYWORD_RE, &filename) {
            hits.push(DownloadHit::new(DownloadRule::LureKeyword, Some(word)));
        }
        if filename.contains(TEST_MALWARE_MARKER) || url.contains(TEST_MALWARE_MARKER) {
            hits.push(DownloadHit::new(DownloadRule::TestMalware, None));
        }
        if let Some(scheme) = OPAQUE_SCHEMES.iter().find(|s| url.starts_with(**s)) {
            hits.push(DownloadHit::new(
                DownloadRule::OpaqueSource,
                Some(scheme.trim_end_matches(':').to_owned()),
            ));
        }
        if !candidate.has_referrer() {
            hits.push(DownloadHit::new(DownloadRule::NoReferrer, None));
        }

        let risk_score = hits.iter().fold(0u32, |acc, h| acc.saturating_add(h.points));
        DownloadScoreResult {
            risk_score,
            should_cancel: risk_score >= CANCEL_THRESHOLD,
            hits,
        }
    }
}

fn first_match(re: &Regex, text: &str) -> Option<String> {
    re.find(text).map(|m| m.as_str().to_owned())
}
