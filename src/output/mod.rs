pub mod console;
pub mod json;

use serde::{Deserialize, Serialize};

use crate::download::{DownloadCandidate, DownloadScoreResult};
use crate::error::Result;
use crate::rules::ScoreReport;

/// Output format selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Console,
    Json,
}

impl OutputFormat {
    pub fn from_str_lenient(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "console" | "text" => Some(Self::Console),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Render a navigation score report.
pub fn render_score(report: &ScoreReport, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Console => Ok(console::render_score(report)),
        OutputFormat::Json => json::render_score(report),
    }
}

/// Render a download decision.
pub fn render_download(
    candidate: &DownloadCandidate,
    result: &DownloadScoreResult,
    format: OutputFormat,
) -> Result<String> {
    match format {
        OutputFormat::Console => Ok(console::render_download(candidate, result)),
        OutputFormat::Json => json::render_download(candidate, result),
    }
}
