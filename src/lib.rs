//! NavShield: heuristic risk scoring for browser navigations and downloads.
//!
//! Observes outbound requests in a sliding window, collects page signals,
//! scores them with six independent extractors and maps the total to
//! ALLOW / WARN / BLOCK. Downloads are scored separately.
//!
//! # Quick Start
//!
//! ```no_run
//! use navshield::ir::{DetectionInput, PageSignals};
//!
//! let input = DetectionInput {
//!     url: "http://192.168.0.1/login".into(),
//!     page_signals: PageSignals {
//!         title: "Bank account".into(),
//!         has_password_field: true,
//!         ..Default::default()
//!     },
//!     ..Default::default()
//! };
//! let report = navshield::evaluate(&input);
//! println!("{} -> {}", report.result.total_score, report.result.decision_level);
//! ```

pub mod config;
pub mod download;
pub mod error;
pub mod ir;
pub mod output;
pub mod pipeline;
pub mod rules;
pub mod window;

use download::{DownloadCandidate, DownloadRiskScorer, DownloadScoreResult};
use ir::DetectionInput;
use rules::{ScoreEngine, ScoreReport};

/// Score a navigation with the built-in extractors.
pub fn evaluate(input: &DetectionInput) -> ScoreReport {
    ScoreEngine::new().evaluate(input)
}

/// Score a download candidate.
pub fn score_download(candidate: &DownloadCandidate) -> DownloadScoreResult {
    DownloadRiskScorer::new().score(candidate)
}

#[cfg(test)]
mod integration_tests {
    use super::*;
    use crate::ir::{PageSignals, RequestView};
    use crate::rules::{DecisionLevel, Signal};
    use pretty_assertions::assert_eq;

    fn signals_of(report: &ScoreReport) -> Vec<Signal> {
        report.hits.iter().map(|h| h.signal).collect()
    }

    #[test]
    fn ip_host_with_password_and_bank_title_warns() {
        let mut input = DetectionInput {
            url: "http://192.168.0.1/login".into(),
            page_signals: PageSignals {
                title: "Bank login".into(),
                has_password_field: true,
                ..Default::default()
            },
            ..Default::default()
        };
        input.fill_derived();

        let report = evaluate(&input);
        assert_eq!(report.result.total_score, 52);
        assert_eq!(report.result.decision_level, DecisionLevel::Warn);
        assert_eq!(
            signals_of(&report),
            vec![Signal::UrlIp, Signal::PasswordField, Signal::PhishingTitle]
        );
    }

    #[test]
    fn foreign_burst_with_large_upload_stays_allowed() {
        let mut requests: Vec<RequestView> = (0..15)
            .map(|i| RequestView::new(format!("https://cdn{i}.example/a.js"), "GET", 0))
            .collect();
        requests.push(RequestView::new("https://shop.example/upload", "POST", 600_000));
        let input = DetectionInput {
            url: "https://shop.example/".into(),
            page_origin: Some("https://shop.example".into()),
            requests,
            ..Default::default()
        };

        let report = evaluate(&input);
        assert_eq!(report.result.total_score, 37);
        assert_eq!(report.result.decision_level, DecisionLevel::Allow);
    }

    #[test]
    fn timeout_adds_exactly_its_penalty() {
        let mut base = DetectionInput {
            url: "https://news.example/".into(),
            ..Default::default()
        };
        base.fill_derived();
        let mut timed_out = DetectionInput {
            url: "https://news.example/".into(),
            page_signals: PageSignals::timed_out(),
            ..Default::default()
        };
        timed_out.fill_derived();

        let before = evaluate(&base).result.total_score;
        let after = evaluate(&timed_out).result.total_score;
        assert_eq!(after - before, Signal::TimedOut.weight());
    }

    #[test]
    fn double_extension_download_is_cancelled() {
        let result = score_download(&DownloadCandidate {
            id: 5,
            filename: "invoice.pdf.exe".into(),
            source_url: "https://mail.example/a/invoice.pdf.exe".into(),
            referrer: None,
        });
        assert!(result.risk_score >= 85);
        assert!(result.should_cancel);
    }

    #[test]
    fn download_and_navigation_scores_are_independent() {
        // the IP host only counts against the navigation
        let candidate = DownloadCandidate {
            id: 1,
            filename: "report.pdf".into(),
            source_url: "http://192.168.0.1/verify/report.pdf".into(),
            referrer: Some("http://192.168.0.1/".into()),
        };
        assert_eq!(score_download(&candidate).risk_score, 0);

        let input = DetectionInput {
            url: candidate.source_url.clone(),
            ..Default::default()
        };
        assert_eq!(evaluate(&input).result.total_score, Signal::UrlIp.weight());
    }
}
