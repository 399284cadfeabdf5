use crate::download::{DownloadCandidate, DownloadScoreResult};
use crate::error::Result;
use crate::rules::ScoreReport;

use serde::Serialize;

#[derive(Serialize)]
struct JsonDownloadReport<'a> {
    candidate: &'a DownloadCandidate,
    #[serde(flatten)]
    result: &'a DownloadScoreResult,
}

/// Render a score report as JSON.
pub fn render_score(report: &ScoreReport) -> Result<String> {
    let json = serde_json::to_string_pretty(report)?;
    Ok(json)
}

/// Render a download decision as JSON.
pub fn render_download(candidate: &DownloadCandidate, result: &DownloadScoreResult) -> Result<String> {
    let report = JsonDownloadReport { candidate, result };
    let json = serde_json::to_string_pretty(&report)?;
    Ok(json)
}
