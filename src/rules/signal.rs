use serde::{Deserialize, Serialize};

use super::weights::Signal;

/// A heuristic that fired during extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalHit {
    /// Which heuristic fired.
    pub signal: Signal,
    /// Signal category (one per extractor).
    pub category: Category,
    /// Points contributed to the total.
    pub points: u32,
    /// What triggered it (matched host, request URL, ...).
    pub detail: Option<String>,
}

impl SignalHit {
    /// A hit worth the signal's weight from the shared table.
    pub fn new(category: Category, signal: Signal) -> Self {
        Self {
            signal,
            category,
            points: signal.weight(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// The six signal categories, one per extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Url,
    Permission,
    Script,
    Network,
    Phishing,
    PageStructure,
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Url => write!(f, "URL"),
            Self::Permission => write!(f, "Permission"),
            Self::Script => write!(f, "Script"),
            Self::Network => write!(f, "Network"),
            Self::Phishing => write!(f, "Phishing"),
            Self::PageStructure => write!(f, "Page Structure"),
        }
    }
}

/// Metadata about an extractor, used for `list-signals` output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractorMetadata {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: Category,
    /// Signals this extractor can fire.
    pub signals: Vec<Signal>,
}

/// Points contributed by one extractor in an evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubScore {
    pub extractor_id: String,
    pub category: Category,
    pub points: u32,
}

/// Sum hit points without overflow.
pub fn total_points(hits: &[SignalHit]) -> u32 {
    hits.iter().fold(0u32, |acc, h| acc.saturating_add(h.points))
}
