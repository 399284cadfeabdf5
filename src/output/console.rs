use crate::download::{DownloadCandidate, DownloadScoreResult};
use crate::rules::{DecisionLevel, ScoreReport, SignalHit};

/// Render a score report for the terminal, highest-weighted signals first.
pub fn render_score(report: &ScoreReport) -> String {
    let mut output = String::new();
    let result = &report.result;

    output.push_str(&format!("\n  {}\n\n", report.url));

    if report.hits.is_empty() {
        output.push_str("  No risk signals detected.\n\n");
    } else {
        let mut sorted: Vec<&SignalHit> = report.hits.iter().collect();
        sorted.sort_by(|a, b| b.points.cmp(&a.points));

        output.push_str(&format!("  {} signal(s) fired:\n\n", sorted.len()));
        for hit in sorted {
            output.push_str(&format!(
                "  +{:<4} {:<16} {}\n",
                hit.points,
                hit.category.to_string(),
                hit.signal.describe()
            ));
            if let Some(detail) = &hit.detail {
                output.push_str(&format!("         {:<16} {}\n", "", detail));
            }
        }
        output.push('\n');
    }

    let tag = match result.decision_level {
        DecisionLevel::Allow => "[ALLOW]",
        DecisionLevel::Warn => "[WARN] ",
        DecisionLevel::Block => "[BLOCK]",
    };
    output.push_str(&format!("  Result: {} score {}\n\n", tag, result.total_score));

    output
}

/// Render a download decision for the terminal.
pub fn render_download(candidate: &DownloadCandidate, result: &DownloadScoreResult) -> String {
    let mut output = String::new();

    output.push_str(&format!("\n  {}\n", candidate.filename));
    if !candidate.source_url.is_empty() {
        output.push_str(&format!("  from {}\n", candidate.source_url));
    }
    output.push('\n');

    for hit in &result.hits {
        output.push_str(&format!("  +{:<4} {}", hit.points, hit.rule.describe()));
        if let Some(detail) = &hit.detail {
            output.push_str(&format!(" ({})", detail));
        }
        output.push('\n');
    }
    if !result.hits.is_empty() {
        output.push('\n');
    }

    let action = if result.should_cancel { "CANCEL" } else { "PROCEED" };
    output.push_str(&format!("  Result: {} risk {}\n\n", action, result.risk_score));

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::download::DownloadRiskScorer;
    use crate::ir::DetectionInput;
    use crate::rules::ScoreEngine;

    #[test]
    fn clean_report_says_so() {
        let input = DetectionInput {
            url: "https://news.example/".into(),
            page_origin: Some("https://news.example".into()),
            ..Default::default()
        };
        let text = render_score(&ScoreEngine::new().evaluate(&input));
        assert!(text.contains("No risk signals detected."));
        assert!(text.contains("[ALLOW] score 0"));
    }

    #[test]
    fn download_lists_rules_and_action() {
        let candidate = DownloadCandidate {
            id: 2,
            filename: "invoice.pdf.exe".into(),
            source_url: String::new(),
            referrer: None,
        };
        let text = render_download(&candidate, &DownloadRiskScorer::new().score(&candidate));
        assert!(text.contains("Result: CANCEL"));
        assert!(!text.contains("from "));
    }
}
