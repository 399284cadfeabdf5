use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::form_urlencoded;
use uuid::Uuid;

use crate::download::{DownloadCandidate, DownloadHit, DownloadScoreResult};
use crate::ir::{hostname_of, TabId};
use crate::rules::{DecisionLevel, ScoreReport, SignalHit};

/// Host shown on the interstitial for cancelled downloads.
pub const DOWNLOAD_INTERSTITIAL_HOST: &str = "Download";

/// What the warning page needs to explain a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interstitial {
    pub url: String,
    pub host: String,
    pub score: u32,
}

impl Interstitial {
    /// `url=..&host=..&score=..`, form-encoded.
    pub fn to_query(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .append_pair("url", &self.url)
            .append_pair("host", &self.host)
            .append_pair("score", &self.score.to_string())
            .finish()
    }

    /// Parse a query produced by `to_query`. A missing host is derived from
    /// the URL; a missing or malformed score reads as zero.
    pub fn from_query(query: &str) -> Self {
        let mut url = String::new();
        let mut host = None;
        let mut score = 0;
        for (key, value) in form_urlencoded::parse(query.trim_start_matches('?').as_bytes()) {
            match key.as_ref() {
                "url" => url = value.into_owned(),
                "host" if !value.is_empty() => host = Some(value.into_owned()),
                "score" => score = value.parse().unwrap_or(0),
                _ => {}
            }
        }
        let host = host.unwrap_or_else(|| {
            if url.is_empty() {
                "unknown".into()
            } else {
                hostname_of(&url)
            }
        });
        Self { url, host, score }
    }
}

/// Why a navigation decision was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionReason {
    /// The page was scored.
    Scored,
    /// The host is on the exception list; nothing was scored.
    AllowListed,
    /// Browser-internal page; never inspected.
    InternalPage,
    /// Block requested explicitly by the host.
    Forced,
}

/// What the actuator is asked to do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Effect {
    None,
    /// Show a warning indicator and clear it after the delay.
    TransientWarning { clear_after_ms: u64 },
    /// Close the tab and open the interstitial.
    Block {
        close_tab: bool,
        interstitial: Interstitial,
    },
}

/// The single event emitted per navigation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionEvent {
    pub id: Uuid,
    pub tab_id: Option<TabId>,
    pub level: DecisionLevel,
    pub score: u32,
    pub url: String,
    pub hostname: String,
    pub reason: DecisionReason,
    pub effect: Effect,
    pub hits: Vec<SignalHit>,
    pub decided_at: DateTime<Utc>,
}

impl DecisionEvent {
    /// An ALLOW that did no scoring work.
    pub fn unscored(tab_id: Option<TabId>, url: &str, hostname: String, reason: DecisionReason) -> Self {
        Self {
            id: Uuid::new_v4(),
            tab_id,
            level: DecisionLevel::Allow,
            score: 0,
            url: url.to_owned(),
            hostname,
            reason,
            effect: Effect::None,
            hits: Vec::new(),
            decided_at: Utc::now(),
        }
    }

    pub fn scored(tab_id: Option<TabId>, report: ScoreReport, hostname: String, warn_clear_ms: u64) -> Self {
        let level = report.result.decision_level;
        let score = report.result.total_score;
        let effect = match level {
            DecisionLevel::Allow => Effect::None,
            DecisionLevel::Warn => Effect::TransientWarning {
                clear_after_ms: warn_clear_ms,
            },
            DecisionLevel::Block => Effect::Block {
                close_tab: tab_id.is_some(),
                interstitial: Interstitial {
                    url: report.url.clone(),
                    host: hostname.clone(),
                    score,
                },
            },
        };
        Self {
            id: Uuid::new_v4(),
            tab_id,
            level,
            score,
            url: report.url,
            hostname,
            reason: DecisionReason::Scored,
            effect,
            hits: report.hits,
            decided_at: Utc::now(),
        }
    }

    pub fn forced_block(url: &str, score: u32) -> Self {
        let hostname = hostname_of(url);
        Self {
            id: Uuid::new_v4(),
            tab_id: None,
            level: DecisionLevel::Block,
            score,
            url: url.to_owned(),
            hostname: hostname.clone(),
            reason: DecisionReason::Forced,
            effect: Effect::Block {
                close_tab: false,
                interstitial: Interstitial {
                    url: url.to_owned(),
                    host: hostname,
                    score,
                },
            },
            hits: Vec::new(),
            decided_at: Utc::now(),
        }
    }

    pub fn interstitial(&self) -> Option<&Interstitial> {
        match &self.effect {
            Effect::Block { interstitial, .. } => Some(interstitial),
            _ => None,
        }
    }
}

/// The event emitted for every observed download.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadDecisionEvent {
    pub id: Uuid,
    pub download_id: u64,
    pub risk_score: u32,
    pub should_cancel: bool,
    pub hits: Vec<DownloadHit>,
    /// Present when the download is cancelled.
    pub interstitial: Option<Interstitial>,
    pub decided_at: DateTime<Utc>,
}

impl DownloadDecisionEvent {
    pub fn new(candidate: &DownloadCandidate, result: DownloadScoreResult) -> Self {
        let interstitial = result.should_cancel.then(|| Interstitial {
            url: candidate.source_url.clone(),
            host: DOWNLOAD_INTERSTITIAL_HOST.into(),
            score: result.risk_score,
        });
        Self {
            id: Uuid::new_v4(),
            download_id: candidate.id,
            risk_score: result.risk_score,
            should_cancel: result.should_cancel,
            hits: result.hits,
            interstitial,
            decided_at: Utc::now(),
        }
    }
}
