// TallyTable - per-label count of ticks above the confidence threshold
//
// Keys are fixed at construction (the classifier's label set, in the
// classifier's order) and never change for the life of the table.

use serde::{Deserialize, Serialize};

use super::prediction::ClassPrediction;

/// One row of the tally
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TallyEntry {
    pub label: String,
    pub count: u32,
}

/// Ordered label → count table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TallyTable {
    entries: Vec<TallyEntry>,
}

impl TallyTable {
    /// Create a table with every label at zero
    ///
    /// Duplicate labels keep their first position.
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut entries: Vec<TallyEntry> = Vec::new();
        for label in labels {
            let label = label.into();
            if entries.iter().any(|entry| entry.label == label) {
                continue;
            }
            entries.push(TallyEntry { label, count: 0 });
        }
        Self { entries }
    }

    /// Reset every count to zero, keeping the key set
    pub fn reset(&mut self) {
        for entry in &mut self.entries {
            entry.count = 0;
        }
    }

    /// Count every prediction strictly above `threshold`
    ///
    /// Labels outside the key set are ignored.
    ///
    /// # Returns
    /// Number of labels incremented by this call
    pub fn record(&mut self, predictions: &[ClassPrediction], threshold: f32) -> usize {
        let mut incremented = 0;
        for pred in predictions.iter().filter(|pred| pred.exceeds(threshold)) {
            if let Some(entry) = self.entries.iter_mut().find(|e| e.label == pred.label) {
                entry.count = entry.count.saturating_add(1);
                incremented += 1;
            }
        }
        incremented
    }

    pub fn count(&self, label: &str) -> Option<u32> {
        self.entries
            .iter()
            .find(|entry| entry.label == label)
            .map(|entry| entry.count)
    }

    /// Entry with the strictly greatest count
    ///
    /// Ties keep the earliest label in key order, so an all-zero table
    /// yields the first label. Returns `None` only for an empty table.
    pub fn top(&self) -> Option<&TallyEntry> {
        let mut best: Option<&TallyEntry> = None;
        for entry in &self.entries {
            match best {
                Some(current) if entry.count <= current.count => {}
                _ => best = Some(entry),
            }
        }
        best
    }

    pub fn entries(&self) -> &[TallyEntry] {
        &self.entries
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.label.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
