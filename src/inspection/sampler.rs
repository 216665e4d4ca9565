// Sampler - tally aggregation for one detection run
//
// The sampler is the only owner of run state: the tally, the last prediction
// set, and the tick counter. Idle → Running on start_run(), Running → Idle on
// end_run() or abort(). Calls that do not fit the current phase are rejected.

use crate::analysis::{ClassPrediction, TallyTable};
use crate::config::DetectionConfig;
use crate::error::InspectionError;
use crate::inspection::result::RunResult;

/// Lifecycle phase of the sampler
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum RunPhase {
    /// No run active; start is enabled
    Idle,
    /// Tick loop active, window timer pending
    Running,
}

/// Sampler aggregates classifier output over a single run
pub struct Sampler {
    phase: RunPhase,
    tally: TallyTable,
    last_predictions: Vec<ClassPrediction>,
    tick_count: u32,
    /// Probability a prediction must strictly exceed to be counted
    threshold: f32,
    /// Case-insensitive substring identifying the clean class
    clean_pattern: String,
}

impl Sampler {
    /// Create an idle sampler
    ///
    /// # Arguments
    /// * `threshold` - Tally threshold (strict `>`), normally 0.8
    /// * `clean_pattern` - Substring of the clean class label, normally "clean"
    pub fn new(threshold: f32, clean_pattern: impl Into<String>) -> Self {
        Self {
            phase: RunPhase::Idle,
            tally: TallyTable::default(),
            last_predictions: Vec::new(),
            tick_count: 0,
            threshold,
            clean_pattern: clean_pattern.into(),
        }
    }

    pub fn from_config(config: &DetectionConfig) -> Self {
        Self::new(config.confidence_threshold, config.clean_label_pattern.clone())
    }

    /// Begin a run over the classifier's label set
    ///
    /// Resets every count to zero and drops the previous run's predictions.
    ///
    /// # Errors
    /// - `AlreadyRunning` if a run is active
    /// - `ClassifierFailed` if the label set is empty
    pub fn start_run(&mut self, labels: &[String]) -> Result<(), InspectionError> {
        if self.phase == RunPhase::Running {
            return Err(InspectionError::AlreadyRunning);
        }
        if labels.is_empty() {
            return Err(InspectionError::ClassifierFailed {
                reason: "classifier reported no class labels".to_string(),
            });
        }

        self.tally = TallyTable::new(labels.iter().cloned());
        self.last_predictions.clear();
        self.tick_count = 0;
        self.phase = RunPhase::Running;

        log::info!(
            "[Sampler] Run started with {} labels (threshold {:.2})",
            self.tally.entries().len(),
            self.threshold
        );
        Ok(())
    }

    /// Record one frame's predictions
    ///
    /// # Returns
    /// Number of labels whose tally was incremented
    ///
    /// # Errors
    /// - `NotRunning` if no run is active
    pub fn tick(&mut self, predictions: Vec<ClassPrediction>) -> Result<usize, InspectionError> {
        if self.phase != RunPhase::Running {
            return Err(InspectionError::NotRunning);
        }

        let incremented = self.tally.record(&predictions, self.threshold);
        self.tick_count = self.tick_count.saturating_add(1);
        self.last_predictions = predictions;

        tracing::debug!(
            tick = self.tick_count,
            incremented,
            "[Sampler] tick recorded"
        );
        Ok(incremented)
    }

    /// Finish the run and derive its result
    ///
    /// # Errors
    /// - `NotRunning` if no run is active
    pub fn end_run(&mut self) -> Result<RunResult, InspectionError> {
        if self.phase != RunPhase::Running {
            return Err(InspectionError::NotRunning);
        }
        self.phase = RunPhase::Idle;

        let result = RunResult::derive(
            &self.tally,
            &self.last_predictions,
            &self.clean_pattern,
            self.tick_count,
        );

        log::info!(
            "[Sampler] Run finished: {} ticks, top={} ({}), clean={}% ({})",
            result.tick_count,
            result.top_label,
            result.top_count,
            result.cleanliness_percent,
            result.status
        );
        Ok(result)
    }

    /// Drop the active run without producing a result
    ///
    /// No-op when idle.
    pub fn abort(&mut self) {
        if self.phase == RunPhase::Running {
            log::warn!("[Sampler] Run aborted after {} ticks", self.tick_count);
        }
        self.phase = RunPhase::Idle;
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase == RunPhase::Running
    }

    pub fn tally(&self) -> &TallyTable {
        &self.tally
    }

    pub fn tick_count(&self) -> u32 {
        self.tick_count
    }

    pub fn last_predictions(&self) -> &[ClassPrediction] {
        &self.last_predictions
    }
}

impl Default for Sampler {
    fn default() -> Self {
        Self::from_config(&DetectionConfig::default())
    }
}

#[cfg(test)]
#[path = "sampler_tests.rs"]
mod tests;
