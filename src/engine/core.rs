//! InspectionHandle: run orchestration around the sampler.
//!
//! The handle owns the collaborators (classifier, frame source), the sampler,
//! the latest result/view, and a telemetry hub. A run is a single async loop
//! that selects over cancellation, the window deadline, a countdown ticker,
//! and the frame interval. The deadline arm wins over the frame arm, so
//! `end_run` always observes the final tick and never races it.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::Instant;

use futures::Stream;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval, interval_at, sleep, MissedTickBehavior};
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::config::AppConfig;
use crate::dashboard::DashboardView;
use crate::engine::backend::{Classifier, FrameSource};
use crate::error::{log_inspection_error, InspectionError};
use crate::inspection::{RunResult, Sampler};
use crate::telemetry::{now_timestamp_ms, InspectionEvent, TelemetryHub, TelemetrySnapshot};

/// How a run was triggered; both follow the identical sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunTrigger {
    Start,
    Recheck,
}

/// InspectionHandle orchestrates detection runs and shared state.
pub struct InspectionHandle {
    config: AppConfig,
    classifier: Mutex<Box<dyn Classifier>>,
    camera: Mutex<Box<dyn FrameSource>>,
    sampler: Mutex<Sampler>,
    /// Cancel sender of the active run; `None` while idle
    run_slot: Mutex<Option<watch::Sender<bool>>>,
    latest_result: RwLock<Option<RunResult>>,
    latest_view: RwLock<DashboardView>,
    telemetry: TelemetryHub,
    start_instant: Instant,
}

impl InspectionHandle {
    /// Create a handle around the given collaborators.
    ///
    /// # Errors
    /// - `InvalidConfig` if the configuration fails validation
    pub fn new(
        config: AppConfig,
        classifier: Box<dyn Classifier>,
        camera: Box<dyn FrameSource>,
    ) -> Result<Self, InspectionError> {
        config.validate()?;
        let sampler = Sampler::from_config(&config.detection);

        Ok(Self {
            config,
            classifier: Mutex::new(classifier),
            camera: Mutex::new(camera),
            sampler: Mutex::new(sampler),
            run_slot: Mutex::new(None),
            latest_result: RwLock::new(None),
            latest_view: RwLock::new(DashboardView::waiting()),
            telemetry: TelemetryHub::default(),
            start_instant: Instant::now(),
        })
    }

    /// "Start Detection" trigger.
    pub async fn run_inspection(&self) -> Result<RunResult, InspectionError> {
        self.run(RunTrigger::Start).await
    }

    /// "Recheck" trigger; resets state exactly like a fresh start.
    pub async fn recheck(&self) -> Result<RunResult, InspectionError> {
        self.run(RunTrigger::Recheck).await
    }

    /// Execute one full run for the given trigger.
    ///
    /// # Errors
    /// - `AlreadyRunning` if a run is active (the active run is untouched)
    /// - `Cancelled` if [InspectionHandle::cancel] was called mid-run
    /// - collaborator failures (`ClassifierFailed`, `CaptureFailed`)
    pub async fn run(&self, trigger: RunTrigger) -> Result<RunResult, InspectionError> {
        let cancel_rx = self.begin_run()?;
        self.drive_run(trigger, cancel_rx).await
    }

    /// Claim the run slot synchronously, then drive the run on a tokio task.
    ///
    /// Lets callers that cannot wait for the window (HTTP handlers) reject a
    /// concurrent trigger before returning.
    ///
    /// # Errors
    /// - `AlreadyRunning` if a run is active
    pub fn spawn_run(
        self: &Arc<Self>,
        trigger: RunTrigger,
    ) -> Result<JoinHandle<Result<RunResult, InspectionError>>, InspectionError> {
        let cancel_rx = self.begin_run()?;
        let handle = Arc::clone(self);
        Ok(tokio::spawn(async move {
            handle.drive_run(trigger, cancel_rx).await
        }))
    }

    fn begin_run(&self) -> Result<watch::Receiver<bool>, InspectionError> {
        let mut slot = self.lock_run_slot();
        if slot.is_some() {
            let err = InspectionError::AlreadyRunning;
            log_inspection_error(&err, "run_inspection");
            return Err(err);
        }

        let (cancel_tx, cancel_rx) = watch::channel(false);
        *slot = Some(cancel_tx);
        Ok(cancel_rx)
    }

    async fn drive_run(
        &self,
        trigger: RunTrigger,
        cancel_rx: watch::Receiver<bool>,
    ) -> Result<RunResult, InspectionError> {
        // Released on every exit path, including unwinding and a dropped future.
        let _slot = RunSlotGuard { handle: self };

        log::info!("[Inspection] {:?} triggered", trigger);
        let outcome = self.execute_run(cancel_rx).await;

        match &outcome {
            Ok(result) => {
                let updated_at = now_timestamp_ms();
                if let Ok(mut latest) = self.latest_result.write() {
                    *latest = Some(result.clone());
                }
                if let Ok(mut view) = self.latest_view.write() {
                    *view = DashboardView::from_result(result, updated_at);
                }
                self.telemetry.record_finished(result);
            }
            Err(InspectionError::Cancelled) => {
                let ticks = self.lock_sampler().map(|s| s.tick_count()).unwrap_or(0);
                log::warn!("[Inspection] Run cancelled after {} ticks", ticks);
                self.telemetry.record_cancelled(ticks);
            }
            Err(err) => {
                log_inspection_error(err, "run_inspection");
                self.telemetry.record_error(err, format!("{:?} run", trigger));
            }
        }

        outcome
    }

    async fn execute_run(
        &self,
        mut cancel_rx: watch::Receiver<bool>,
    ) -> Result<RunResult, InspectionError> {
        let detection = self.config.detection.clone();
        let labels = self.lock_classifier()?.labels();

        self.lock_sampler()?.start_run(&labels)?;

        if let Err(err) = self.lock_camera().and_then(|mut camera| camera.start()) {
            if let Ok(mut sampler) = self.lock_sampler() {
                sampler.abort();
            }
            return Err(err);
        }

        self.telemetry
            .record_run_started(&labels, detection.window_ms);
        self.telemetry
            .record_countdown(seconds_remaining(detection.window_ms, 0));

        let started = tokio::time::Instant::now();
        let deadline = sleep(detection.window());
        tokio::pin!(deadline);

        let mut frames = interval(detection.frame_interval());
        frames.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let countdown_period = detection.countdown_interval();
        let mut countdown = interval_at(started + countdown_period, countdown_period);

        let loop_outcome: Result<(), InspectionError> = loop {
            tokio::select! {
                biased;

                _ = cancel_rx.wait_for(|cancelled| *cancelled) => {
                    break Err(InspectionError::Cancelled);
                }
                _ = &mut deadline => break Ok(()),
                _ = countdown.tick() => {
                    let elapsed_ms = started.elapsed().as_millis() as u64;
                    let remaining = seconds_remaining(detection.window_ms, elapsed_ms);
                    if remaining > 0 {
                        self.telemetry.record_countdown(remaining);
                    }
                }
                _ = frames.tick() => {
                    if let Err(err) = self.process_frame() {
                        break Err(err);
                    }
                }
            }
        };

        // Frame loop has stopped; no tick can land after this point.
        let stopped = self.lock_camera().and_then(|mut camera| camera.stop());

        let mut sampler = self.lock_sampler()?;
        match loop_outcome {
            Ok(()) => {
                stopped?;
                sampler.end_run()
            }
            Err(err) => {
                sampler.abort();
                if let Err(stop_err) = stopped {
                    log_inspection_error(&stop_err, "camera_stop");
                }
                Err(err)
            }
        }
    }

    /// Capture one frame, classify it, and feed the sampler.
    fn process_frame(&self) -> Result<(), InspectionError> {
        let frame = self.lock_camera()?.capture()?;

        let inference_start = Instant::now();
        let predictions = self.lock_classifier()?.predict(&frame)?;
        let inference_ms = inference_start.elapsed().as_secs_f32() * 1000.0;

        let (incremented, index) = {
            let mut sampler = self.lock_sampler()?;
            let incremented = sampler.tick(predictions.clone())?;
            (incremented, sampler.tick_count())
        };

        tracing::debug!(
            tick = index,
            incremented,
            inference_ms = inference_ms as f64,
            "frame classified"
        );
        self.telemetry
            .record_tick(index, &predictions, incremented, inference_ms);
        Ok(())
    }

    /// Request cancellation of the active run.
    ///
    /// # Errors
    /// - `NotRunning` if no run is active
    pub fn cancel(&self) -> Result<(), InspectionError> {
        match self.lock_run_slot().as_ref() {
            Some(cancel_tx) => {
                cancel_tx.send_replace(true);
                Ok(())
            }
            None => Err(InspectionError::NotRunning),
        }
    }

    pub fn is_running(&self) -> bool {
        self.lock_run_slot().is_some()
    }

    /// Most recent completed result, if any.
    pub fn latest_result(&self) -> Option<RunResult> {
        self.latest_result
            .read()
            .ok()
            .and_then(|guard| guard.clone())
    }

    /// Most recent dashboard view ("Waiting" before the first run).
    pub fn latest_view(&self) -> DashboardView {
        self.latest_view
            .read()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn telemetry_receiver(&self) -> broadcast::Receiver<InspectionEvent> {
        self.telemetry.subscribe()
    }

    /// Lossless telemetry stream; must be called from within a tokio runtime.
    pub fn telemetry_stream(&self) -> impl Stream<Item = InspectionEvent> + Unpin {
        UnboundedReceiverStream::new(self.telemetry.collector().subscribe_unbounded())
    }

    pub fn telemetry_snapshot(&self) -> TelemetrySnapshot {
        self.telemetry.snapshot()
    }

    pub fn uptime_ms(&self) -> u64 {
        self.start_instant.elapsed().as_millis() as u64
    }

    fn lock_run_slot(&self) -> MutexGuard<'_, Option<watch::Sender<bool>>> {
        self.run_slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_sampler(&self) -> Result<MutexGuard<'_, Sampler>, InspectionError> {
        self.sampler
            .lock()
            .map_err(|_| InspectionError::StatePoisoned)
    }

    fn lock_classifier(&self) -> Result<MutexGuard<'_, Box<dyn Classifier>>, InspectionError> {
        self.classifier
            .lock()
            .map_err(|_| InspectionError::StatePoisoned)
    }

    fn lock_camera(&self) -> Result<MutexGuard<'_, Box<dyn FrameSource>>, InspectionError> {
        self.camera
            .lock()
            .map_err(|_| InspectionError::StatePoisoned)
    }
}

/// Frees the run slot when `drive_run` exits.
///
/// A run interrupted by a panic or by dropping its future leaves the
/// sampler Running, the camera started, and the collaborator locks
/// poisoned; all of that is rolled back here so the next trigger starts
/// clean.
struct RunSlotGuard<'a> {
    handle: &'a InspectionHandle,
}

impl Drop for RunSlotGuard<'_> {
    fn drop(&mut self) {
        let handle = self.handle;
        let interrupted = {
            let mut sampler = handle
                .sampler
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            let interrupted = sampler.is_running();
            sampler.abort();
            interrupted
        };

        if interrupted {
            log::warn!("[Inspection] Run interrupted; releasing camera and run slot");
            let mut camera = handle.camera.lock().unwrap_or_else(PoisonError::into_inner);
            if let Err(err) = camera.stop() {
                log_inspection_error(&err, "camera_stop");
            }
        }

        handle.sampler.clear_poison();
        handle.classifier.clear_poison();
        handle.camera.clear_poison();
        *handle.lock_run_slot() = None;
    }
}

/// Whole seconds left in the window, rounded up.
fn seconds_remaining(window_ms: u64, elapsed_ms: u64) -> u64 {
    window_ms.saturating_sub(elapsed_ms).div_ceil(1000)
}

#[cfg(test)]
#[path = "core/tests.rs"]
mod tests;
