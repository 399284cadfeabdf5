use serde::{Deserialize, Serialize};

/// Totals at or above this are WARN.
pub const WARN_THRESHOLD: u32 = 45;

/// Totals at or above this are BLOCK.
pub const BLOCK_THRESHOLD: u32 = 85;

/// Categorical outcome of thresholding a navigation score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DecisionLevel {
    Allow,
    Warn,
    Block,
}

impl DecisionLevel {
    pub fn from_str_lenient(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "allow" | "pass" => Some(Self::Allow),
            "warn" | "warning" => Some(Self::Warn),
            "block" | "deny" => Some(Self::Block),
            _ => None,
        }
    }
}

impl std::fmt::Display for DecisionLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Allow => write!(f, "ALLOW"),
            Self::Warn => write!(f, "WARN"),
            Self::Block => write!(f, "BLOCK"),
        }
    }
}

/// Map a total score to a decision. Step function with breakpoints at
/// `WARN_THRESHOLD` and `BLOCK_THRESHOLD`.
pub fn interpret(score: u32) -> DecisionLevel {
    if score >= BLOCK_THRESHOLD {
        DecisionLevel::Block
    } else if score >= WARN_THRESHOLD {
        DecisionLevel::Warn
    } else {
        DecisionLevel::Allow
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreResult {
    pub total_score: u32,
    pub decision_level: DecisionLevel,
}

impl ScoreResult {
    pub fn from_score(total_score: u32) -> Self {
        Self {
            total_score,
            decision_level: interpret(total_score),
        }
    }
}
