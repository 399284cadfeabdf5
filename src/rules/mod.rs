pub mod builtin;
pub mod decision;
pub mod signal;
pub mod weights;

use serde::{Deserialize, Serialize};

use crate::ir::DetectionInput;

pub use decision::{interpret, DecisionLevel, ScoreResult, BLOCK_THRESHOLD, WARN_THRESHOLD};
pub use signal::{Category, ExtractorMetadata, SignalHit, SubScore};
pub use weights::{Signal, WeightTable, WEIGHTS};

/// An extractor turns one category of raw signals into hits.
///
/// Extractors never fail: malformed or missing input yields no hits or a
/// small fixed penalty.
pub trait Extractor: Send + Sync {
    /// Metadata about this extractor (id, name, category, signals).
    fn metadata(&self) -> ExtractorMetadata;

    /// Run the extractor against a detection input.
    fn run(&self, input: &DetectionInput) -> Vec<SignalHit>;

    /// The extractor's sub-score.
    fn score(&self, input: &DetectionInput) -> u32 {
        signal::total_points(&self.run(input))
    }
}

/// Full result of scoring one navigation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreReport {
    pub url: String,
    pub result: ScoreResult,
    pub sub_scores: Vec<SubScore>,
    pub hits: Vec<SignalHit>,
}

/// The score aggregator: runs every registered extractor once and sums
/// their sub-scores.
pub struct ScoreEngine {
    extractors: Vec<Box<dyn Extractor>>,
}

impl ScoreEngine {
    /// Create a new engine with all built-in extractors registered.
    pub fn new() -> Self {
        Self {
            extractors: builtin::all_extractors(),
        }
    }

    /// Create an engine with a custom set of extractors.
    pub fn with_extractors(extractors: Vec<Box<dyn Extractor>>) -> Self {
        Self { extractors }
    }

    /// Sum of all extractor sub-scores.
    pub fn calculate(&self, input: &DetectionInput) -> u32 {
        self.extractors
            .iter()
            .fold(0u32, |acc, e| acc.saturating_add(e.score(input)))
    }

    /// Score an input and keep the per-extractor breakdown.
    pub fn evaluate(&self, input: &DetectionInput) -> ScoreReport {
        let mut sub_scores = Vec::with_capacity(self.extractors.len());
        let mut hits = Vec::new();

        for extractor in &self.extractors {
            let meta = extractor.metadata();
            let found = extractor.run(input);
            sub_scores.push(SubScore {
                extractor_id: meta.id,
                category: meta.category,
                points: signal::total_points(&found),
            });
            hits.extend(found);
        }

        let total = sub_scores
            .iter()
            .fold(0u32, |acc, s| acc.saturating_add(s.points));

        ScoreReport {
            url: input.url.clone(),
            result: ScoreResult::from_score(total),
            sub_scores,
            hits,
        }
    }

    /// List metadata for all registered extractors.
    pub fn list_extractors(&self) -> Vec<ExtractorMetadata> {
        self.extractors.iter().map(|e| e.metadata()).collect()
    }
}

impl Default for ScoreEngine {
    fn default() -> Self {
        Self::new()
    }
}
