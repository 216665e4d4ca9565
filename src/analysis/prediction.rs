// ClassPrediction - one (label, probability) pair from the classifier
//
// The classifier returns one prediction per known class on every tick. The
// probabilities across a tick sum to roughly 1.0 but nothing here relies on it.

use serde::{Deserialize, Serialize};

/// Output of the classifier for a single class on a single frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassPrediction {
    /// Class name as exported with the model metadata
    pub label: String,
    /// Probability in [0.0, 1.0]
    pub probability: f32,
}

impl ClassPrediction {
    pub fn new(label: impl Into<String>, probability: f32) -> Self {
        Self {
            label: label.into(),
            probability,
        }
    }

    /// Strict comparison: a probability equal to the threshold does not count
    pub fn exceeds(&self, threshold: f32) -> bool {
        self.probability > threshold
    }

    /// Case-insensitive substring match on the label
    pub fn label_contains(&self, pattern: &str) -> bool {
        self.label
            .to_lowercase()
            .contains(&pattern.to_lowercase())
    }

    /// Live readout line, e.g. `Clean Oil: 75.00%`
    pub fn readout(&self) -> String {
        format!("{}: {:.2}%", self.label, self.probability * 100.0)
    }
}

/// Probability of the last prediction whose label contains `pattern`
///
/// Returns 0.0 when no label matches.
pub fn matching_probability(predictions: &[ClassPrediction], pattern: &str) -> f32 {
    predictions
        .iter()
        .filter(|pred| pred.label_contains(pattern))
        .last()
        .map(|pred| pred.probability)
        .unwrap_or(0.0)
}

/// Convert a probability to a whole percent clamped to [0, 100]
pub fn to_percent(probability: f32) -> u8 {
    if !probability.is_finite() {
        return 0;
    }
    (probability * 100.0).round().clamp(0.0, 100.0) as u8
}
