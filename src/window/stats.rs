use serde::{Deserialize, Serialize};

/// Read-only projection of the request window for UI collaborators.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub requests_in_window: usize,
    pub total_requests_ever: u64,
    /// Busiest initiators, highest count first.
    pub top_initiators: Vec<InitiatorCount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitiatorCount {
    pub initiator: String,
    pub count: usize,
}

/// Request activity bucket, used to color the toolbar badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityLevel {
    Low,
    Elevated,
    High,
}

/// Badge text and activity level for a window request count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Badge {
    pub text: String,
    pub activity: ActivityLevel,
}

const ELEVATED_ACTIVITY: usize = 20;
const HIGH_ACTIVITY: usize = 100;
const BADGE_MAX: usize = 999;

impl Badge {
    pub fn for_count(count: usize) -> Self {
        let text = match count {
            0 => String::new(),
            n if n > BADGE_MAX => format!("{BADGE_MAX}+"),
            n => n.to_string(),
        };
        let activity = if count >= HIGH_ACTIVITY {
            ActivityLevel::High
        } else if count >= ELEVATED_ACTIVITY {
            ActivityLevel::Elevated
        } else {
            ActivityLevel::Low
        };
        Self { text, activity }
    }
}

impl Stats {
    pub fn badge(&self) -> Badge {
        Badge::for_count(self.requests_in_window)
    }
}
