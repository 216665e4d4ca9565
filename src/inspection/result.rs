// RunResult - outcome of a completed detection run

use serde::{Deserialize, Serialize};

use crate::analysis::{
    matching_probability, to_percent, ClassPrediction, CleanlinessStatus, TallyEntry, TallyTable,
};

/// Modal class plus cleanliness reading for one run
///
/// Each run overwrites the previous result; nothing is persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    /// Label with the strictly greatest tally (first label on ties)
    pub top_label: String,
    /// Tally of `top_label`
    pub top_count: u32,
    /// round(100 × p) of the clean class on the final tick, in [0, 100]
    pub cleanliness_percent: u8,
    /// Status derived from `cleanliness_percent`
    pub status: CleanlinessStatus,
    /// Number of ticks observed during the run
    pub tick_count: u32,
    /// Full tally snapshot in classifier label order
    pub tally: Vec<TallyEntry>,
    /// Predictions from the final tick (empty if no tick happened)
    pub final_predictions: Vec<ClassPrediction>,
}

impl RunResult {
    /// Derive the result from a finished tally and the last prediction set
    ///
    /// # Arguments
    /// * `tally` - Tally table for the run (must have at least one label)
    /// * `last_predictions` - Predictions retained from the final tick
    /// * `clean_pattern` - Substring identifying the clean class
    /// * `tick_count` - Ticks observed during the run
    pub fn derive(
        tally: &TallyTable,
        last_predictions: &[ClassPrediction],
        clean_pattern: &str,
        tick_count: u32,
    ) -> Self {
        let (top_label, top_count) = tally
            .top()
            .map(|entry| (entry.label.clone(), entry.count))
            .unwrap_or_default();

        let cleanliness_percent =
            to_percent(matching_probability(last_predictions, clean_pattern));

        Self {
            top_label,
            top_count,
            cleanliness_percent,
            status: CleanlinessStatus::from_percent(cleanliness_percent),
            tick_count,
            tally: tally.entries().to_vec(),
            final_predictions: last_predictions.to_vec(),
        }
    }

    /// "Most likely" summary line
    pub fn summary(&self) -> String {
        format!(
            "Most likely: {} (detected {} times)",
            self.top_label, self.top_count
        )
    }
}
