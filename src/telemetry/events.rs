//! Telemetry event types describing inspection runs for the CLI and HTTP
//! surfaces.

use serde::{Deserialize, Serialize};

use crate::analysis::CleanlinessStatus;

/// Lifecycle and diagnostics events published during inspection runs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum InspectionEvent {
    RunStarted {
        labels: Vec<String>,
        window_ms: u64,
        timestamp_ms: u64,
    },
    Countdown {
        seconds_remaining: u64,
    },
    Tick {
        index: u32,
        readout: Vec<String>,
        incremented: usize,
    },
    InferenceLatency {
        avg_ms: f32,
        max_ms: f32,
        sample_count: usize,
    },
    RunFinished {
        top_label: String,
        top_count: u32,
        cleanliness_percent: u8,
        status: CleanlinessStatus,
        tick_count: u32,
        timestamp_ms: u64,
    },
    RunCancelled {
        tick_count: u32,
    },
    Error {
        code: i32,
        context: String,
    },
}
