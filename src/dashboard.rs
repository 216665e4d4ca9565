//! Dashboard view model.
//!
//! Flattens a [RunResult] into the fields the status card renders: badge,
//! note, cleanliness bar, "Most likely" summary, live readout, and the
//! last-updated time. Rendering itself (markup, styling) lives elsewhere.

use chrono::{Local, TimeZone};
use serde::{Deserialize, Serialize};

use crate::analysis::{Badge, ClassPrediction, CleanlinessStatus};
use crate::inspection::RunResult;

/// Everything the status card shows after a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardView {
    /// `None` until the first run completes
    pub status: Option<CleanlinessStatus>,
    pub status_label: String,
    pub note: String,
    pub badge: Badge,
    pub icon: String,
    pub percent: u8,
    /// CSS width for the progress bar, e.g. "75%"
    pub bar_width: String,
    /// "Most likely: X (detected N times)"; empty before the first run
    pub summary: String,
    /// Per-class lines from the final tick
    pub readout: Vec<String>,
    /// Wall-clock ms of the last completed run
    pub last_updated_ms: Option<u64>,
}

impl DashboardView {
    /// View shown before any run completes
    pub fn waiting() -> Self {
        Self {
            status: None,
            status_label: "Waiting".to_string(),
            note: "Not yet detected".to_string(),
            badge: Badge::Secondary,
            icon: "fas fa-question-circle".to_string(),
            percent: 0,
            bar_width: "0%".to_string(),
            summary: String::new(),
            readout: Vec::new(),
            last_updated_ms: None,
        }
    }

    pub fn from_result(result: &RunResult, updated_at_ms: u64) -> Self {
        let status = result.status;
        Self {
            status: Some(status),
            status_label: status.display_name().to_string(),
            note: status.note().to_string(),
            badge: status.badge(),
            icon: status.icon().to_string(),
            percent: result.cleanliness_percent,
            bar_width: format!("{}%", result.cleanliness_percent),
            summary: result.summary(),
            readout: result
                .final_predictions
                .iter()
                .map(ClassPrediction::readout)
                .collect(),
            last_updated_ms: Some(updated_at_ms),
        }
    }

    /// "Last updated: HH:MM:SS" in local wall-clock time, or "--" before
    /// the first run
    pub fn last_updated_label(&self) -> String {
        let local = self
            .last_updated_ms
            .and_then(|ms| i64::try_from(ms).ok())
            .and_then(|ms| Local.timestamp_millis_opt(ms).single());
        match local {
            Some(time) => format!("Last updated: {}", time.format("%H:%M:%S")),
            None => "Last updated: --".to_string(),
        }
    }
}

impl Default for DashboardView {
    fn default() -> Self {
        Self::waiting()
    }
}
