//! Inspection telemetry collector and helpers.
//!
//! The collector multiplexes run lifecycle, per-tick readouts, and inference
//! latency into a bounded history plus async broadcast stream.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use tokio::sync::{broadcast, mpsc};

use crate::analysis::ClassPrediction;
use crate::error::{ErrorCode, InspectionError};
use crate::inspection::RunResult;

pub mod events;

pub use events::InspectionEvent;

/// Snapshot of collector state for HTTP/CLI reporting.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TelemetrySnapshot {
    pub recent: Vec<InspectionEvent>,
    pub total_events: u64,
    pub dropped_events: u64,
}

/// Broadcast-based collector retaining a bounded history of events.
pub struct TelemetryCollector {
    tx: broadcast::Sender<InspectionEvent>,
    history: Mutex<VecDeque<InspectionEvent>>,
    history_capacity: usize,
    total_events: AtomicU64,
    dropped_history: AtomicU64,
}

impl TelemetryCollector {
    pub fn new(buffer: usize, history_capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(buffer);
        Self {
            tx,
            history: Mutex::new(VecDeque::with_capacity(history_capacity)),
            history_capacity,
            total_events: AtomicU64::new(0),
            dropped_history: AtomicU64::new(0),
        }
    }

    pub fn publish(&self, event: InspectionEvent) {
        self.total_events.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut history) = self.history.lock() {
            if history.len() == self.history_capacity {
                history.pop_front();
                self.dropped_history.fetch_add(1, Ordering::Relaxed);
            }
            history.push_back(event.clone());
        } else {
            log::error!("[Telemetry] history lock poisoned; event kept on broadcast only");
        }

        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<InspectionEvent> {
        self.tx.subscribe()
    }

    pub fn subscribe_unbounded(&self) -> mpsc::UnboundedReceiver<InspectionEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut broadcast_rx = self.tx.subscribe();

        tokio::spawn(async move {
            while let Ok(event) = broadcast_rx.recv().await {
                if tx.send(event).is_err() {
                    break;
                }
            }
        });

        rx
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        let recent = self
            .history
            .lock()
            .map(|history| history.iter().cloned().collect())
            .unwrap_or_default();
        TelemetrySnapshot {
            recent,
            total_events: self.total_events.load(Ordering::Relaxed),
            dropped_events: self.dropped_history.load(Ordering::Relaxed),
        }
    }
}

impl Default for TelemetryCollector {
    fn default() -> Self {
        Self::new(256, 64)
    }
}

/// Latency tracker maintains a rolling window to compute avg/max latency.
struct LatencyTracker {
    samples: VecDeque<f32>,
    max_samples: usize,
}

impl LatencyTracker {
    fn new(max_samples: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(max_samples),
            max_samples,
        }
    }

    fn observe(&mut self, value: f32) -> (f32, f32, usize) {
        if self.samples.len() == self.max_samples {
            self.samples.pop_front();
        }
        self.samples.push_back(value.abs());

        let count = self.samples.len();
        let sum: f32 = self.samples.iter().copied().sum();
        let max = self
            .samples
            .iter()
            .copied()
            .fold(0.0_f32, |acc, next| acc.max(next));
        let avg = if count == 0 { 0.0 } else { sum / count as f32 };
        (avg, max, count)
    }

    fn clear(&mut self) {
        self.samples.clear();
    }
}

/// Per-handle hub wrapping the collector plus derived latency gauge.
pub struct TelemetryHub {
    collector: TelemetryCollector,
    latency: Mutex<LatencyTracker>,
    /// Publish an inference latency summary every N ticks
    latency_every_n_ticks: u32,
}

impl TelemetryHub {
    pub fn new(channel_capacity: usize, history_capacity: usize, latency_window: usize) -> Self {
        Self {
            collector: TelemetryCollector::new(channel_capacity, history_capacity),
            latency: Mutex::new(LatencyTracker::new(latency_window)),
            latency_every_n_ticks: latency_window.max(1) as u32,
        }
    }

    pub fn collector(&self) -> &TelemetryCollector {
        &self.collector
    }

    pub fn subscribe(&self) -> broadcast::Receiver<InspectionEvent> {
        self.collector.subscribe()
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        self.collector.snapshot()
    }

    pub fn record_run_started(&self, labels: &[String], window_ms: u64) {
        if let Ok(mut tracker) = self.latency.lock() {
            tracker.clear();
        }
        self.collector.publish(InspectionEvent::RunStarted {
            labels: labels.to_vec(),
            window_ms,
            timestamp_ms: now_timestamp_ms(),
        });
    }

    pub fn record_countdown(&self, seconds_remaining: u64) {
        self.collector
            .publish(InspectionEvent::Countdown { seconds_remaining });
    }

    pub fn record_tick(
        &self,
        index: u32,
        predictions: &[ClassPrediction],
        incremented: usize,
        inference_ms: f32,
    ) {
        self.collector.publish(InspectionEvent::Tick {
            index,
            readout: predictions.iter().map(ClassPrediction::readout).collect(),
            incremented,
        });

        let observed = self
            .latency
            .lock()
            .map(|mut tracker| tracker.observe(inference_ms))
            .ok();

        if let Some((avg, max, count)) = observed {
            if index % self.latency_every_n_ticks == 0 {
                self.collector.publish(InspectionEvent::InferenceLatency {
                    avg_ms: avg,
                    max_ms: max,
                    sample_count: count,
                });
            }
        }
    }

    pub fn record_finished(&self, result: &RunResult) {
        self.collector.publish(InspectionEvent::RunFinished {
            top_label: result.top_label.clone(),
            top_count: result.top_count,
            cleanliness_percent: result.cleanliness_percent,
            status: result.status,
            tick_count: result.tick_count,
            timestamp_ms: now_timestamp_ms(),
        });
    }

    pub fn record_cancelled(&self, tick_count: u32) {
        self.collector
            .publish(InspectionEvent::RunCancelled { tick_count });
    }

    pub fn record_error(&self, err: &InspectionError, context: impl Into<String>) {
        self.collector.publish(InspectionEvent::Error {
            code: err.code(),
            context: context.into(),
        });
    }
}

impl Default for TelemetryHub {
    fn default() -> Self {
        Self::new(256, 64, 30)
    }
}

/// Wall-clock milliseconds since the Unix epoch.
pub fn now_timestamp_ms() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or_default()
}
