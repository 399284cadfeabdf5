use once_cell::sync::Lazy;
use regex::Regex;

use crate::ir::DetectionInput;
use crate::rules::{Category, Extractor, ExtractorMetadata, Signal, SignalHit};

// Case-sensitive against the raw title.
static TITLE_KEYWORDS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"login|verify|secure|bank|account|confirm|suspended").unwrap());

// Matched against the lowercased body sample.
static BODY_KEYWORDS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"urgent|verify now|confirm your|suspended|limited access").unwrap()
});

const BODY_SAMPLE_CHARS: usize = 5000;

/// NAV-005: credential-harvesting page indicators.
pub struct PhishingRisk;

impl Extractor for PhishingRisk {
    fn metadata(&self) -> ExtractorMetadata {
        ExtractorMetadata {
            id: "NAV-005".into(),
            name: "Phishing Risk".into(),
            description: "Password fields and credential or urgency wording".into(),
            category: Category::Phishing,
            signals: vec![
                Signal::PasswordField,
                Signal::PhishingTitle,
                Signal::PhishingText,
            ],
        }
    }

    fn run(&self, input: &DetectionInput) -> Vec<SignalHit> {
        let page = &input.page_signals;
        let hit = |signal| SignalHit::new(Category::Phishing, signal);
        let mut hits = Vec::new();

        if page.has_password_field {
            hits.push(hit(Signal::PasswordField));
        }
        if let Some(m) = TITLE_KEYWORDS_RE.find(&page.title) {
            hits.push(hit(Signal::PhishingTitle).with_detail(m.as_str()));
        }

        let sample: String = page
            .body_text_sample
            .chars()
            .take(BODY_SAMPLE_CHARS)
            .collect::<String>()
            .to_lowercase();
        if let Some(m) = BODY_KEYWORDS_RE.find(&sample) {
            hits.push(hit(Signal::PhishingText).with_detail(m.as_str()));
        }
        hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::PageSignals;

    fn score(page_signals: PageSignals) -> u32 {
        PhishingRisk.score(&DetectionInput {
            page_signals,
            ..Default::default()
        })
    }

    #[test]
    fn password_and_title_keyword() {
        let page = PageSignals {
            title: "Verify your account".into(),
            has_password_field: true,
            ..Default::default()
        };
        assert_eq!(score(page), 10 + 12);
    }

    #[test]
    fn body_wording_is_case_insensitive() {
        let page = PageSignals {
            body_text_sample: "URGENT: Your access has been LIMITED ACCESS mode".into(),
            ..Default::default()
        };
        assert_eq!(score(page), 12);
    }

    #[test]
    fn title_match_is_case_sensitive() {
        let page = PageSignals {
            title: "LOGIN".into(),
            ..Default::default()
        };
        assert_eq!(score(page), 0);
    }

    #[test]
    fn body_beyond_sample_is_ignored() {
        let page = PageSignals {
            body_text_sample: format!("{}urgent", " ".repeat(BODY_SAMPLE_CHARS)),
            ..Default::default()
        };
        assert_eq!(score(page), 0);
    }

    #[test]
    fn empty_page_is_clean() {
        assert_eq!(score(PageSignals::default()), 0);
        assert_eq!(score(PageSignals::timed_out()), 0);
    }
}
