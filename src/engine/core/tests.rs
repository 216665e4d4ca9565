use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::*;
use crate::analysis::{ClassPrediction, CleanlinessStatus};
use crate::engine::backend::{Frame, ScriptedClassifier, SyntheticCamera};

fn test_config(window_ms: u64, frame_interval_ms: u64) -> AppConfig {
    let mut config = AppConfig::default();
    config.detection.window_ms = window_ms;
    config.detection.frame_interval_ms = frame_interval_ms;
    config
}

fn scenario_handle() -> InspectionHandle {
    let classifier =
        ScriptedClassifier::constant(&[("A", 0.9), ("B", 0.2), ("clean-label", 0.75)]).unwrap();
    InspectionHandle::new(
        test_config(10_000, 1_000),
        Box::new(classifier),
        Box::new(SyntheticCamera::default()),
    )
    .unwrap()
}

/// Classifier that fails after serving `ok_frames` predictions
struct FlakyClassifier {
    ok_frames: usize,
    served: usize,
}

impl Classifier for FlakyClassifier {
    fn labels(&self) -> Vec<String> {
        vec!["Clean".to_string(), "Dirty".to_string()]
    }

    fn predict(&mut self, _frame: &Frame) -> Result<Vec<ClassPrediction>, InspectionError> {
        if self.served >= self.ok_frames {
            return Err(InspectionError::ClassifierFailed {
                reason: "inference backend lost".to_string(),
            });
        }
        self.served += 1;
        Ok(vec![
            ClassPrediction::new("Clean", 0.5),
            ClassPrediction::new("Dirty", 0.5),
        ])
    }
}

/// Camera exposing whether it is currently playing
struct TrackingCamera {
    inner: SyntheticCamera,
    playing: Arc<AtomicBool>,
    fail_start: bool,
}

impl FrameSource for TrackingCamera {
    fn start(&mut self) -> Result<(), InspectionError> {
        if self.fail_start {
            return Err(InspectionError::CaptureFailed {
                reason: "permission denied".to_string(),
            });
        }
        self.inner.start()?;
        self.playing.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn capture(&mut self) -> Result<Frame, InspectionError> {
        self.inner.capture()
    }

    fn stop(&mut self) -> Result<(), InspectionError> {
        self.playing.store(false, Ordering::SeqCst);
        self.inner.stop()
    }
}

#[tokio::test(start_paused = true)]
async fn ten_second_run_produces_ten_ticks() {
    let handle = scenario_handle();
    let result = handle.run_inspection().await.unwrap();

    assert_eq!(result.tick_count, 10);
    assert_eq!(result.top_label, "A");
    assert_eq!(result.top_count, 10);
    let counts: Vec<u32> = result.tally.iter().map(|entry| entry.count).collect();
    assert_eq!(counts, vec![10, 0, 0]);
    assert_eq!(result.cleanliness_percent, 75);
    assert_eq!(result.status, CleanlinessStatus::Clean);
    assert!(!handle.is_running());
}

#[tokio::test(start_paused = true)]
async fn latest_view_updates_after_run() {
    let handle = scenario_handle();
    assert_eq!(handle.latest_view().status_label, "Waiting");
    assert!(handle.latest_result().is_none());

    handle.run_inspection().await.unwrap();

    let view = handle.latest_view();
    assert_eq!(view.status_label, "Clean");
    assert_eq!(view.bar_width, "75%");
    assert_eq!(view.summary, "Most likely: A (detected 10 times)");
    assert!(view.last_updated_ms.is_some());
    assert_eq!(handle.latest_result().map(|r| r.top_count), Some(10));
}

#[tokio::test(start_paused = true)]
async fn recheck_matches_fresh_start() {
    let handle = scenario_handle();
    let first = handle.run_inspection().await.unwrap();
    let second = handle.recheck().await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test(start_paused = true)]
async fn second_trigger_while_running_is_rejected() {
    let handle = scenario_handle();

    let (first, second) = tokio::join!(handle.run_inspection(), async {
        tokio::task::yield_now().await;
        assert!(handle.is_running());
        handle.recheck().await
    });

    assert_eq!(second, Err(InspectionError::AlreadyRunning));
    let first = first.unwrap();
    assert_eq!(first.tick_count, 10);
}

#[tokio::test(start_paused = true)]
async fn cancel_stops_run_without_result() {
    let playing = Arc::new(AtomicBool::new(false));
    let camera = TrackingCamera {
        inner: SyntheticCamera::default(),
        playing: Arc::clone(&playing),
        fail_start: false,
    };
    let classifier = ScriptedClassifier::constant(&[("Clean", 0.9)]).unwrap();
    let handle = InspectionHandle::new(
        test_config(10_000, 1_000),
        Box::new(classifier),
        Box::new(camera),
    )
    .unwrap();

    let (outcome, cancelled) = tokio::join!(handle.run_inspection(), async {
        tokio::time::sleep(Duration::from_millis(2_500)).await;
        handle.cancel()
    });

    assert!(cancelled.is_ok());
    assert_eq!(outcome, Err(InspectionError::Cancelled));
    assert!(!handle.is_running());
    assert!(!playing.load(Ordering::SeqCst));
    assert!(handle.latest_result().is_none());
    assert_eq!(handle.latest_view().status_label, "Waiting");

    let snapshot = handle.telemetry_snapshot();
    assert!(snapshot
        .recent
        .iter()
        .any(|event| matches!(event, InspectionEvent::RunCancelled { tick_count: 3 })));
}

#[tokio::test(start_paused = true)]
async fn cancel_when_idle_is_rejected() {
    let handle = scenario_handle();
    assert_eq!(handle.cancel(), Err(InspectionError::NotRunning));
}

#[tokio::test(start_paused = true)]
async fn classifier_failure_ends_run() {
    let playing = Arc::new(AtomicBool::new(false));
    let camera = TrackingCamera {
        inner: SyntheticCamera::default(),
        playing: Arc::clone(&playing),
        fail_start: false,
    };
    let handle = InspectionHandle::new(
        test_config(10_000, 1_000),
        Box::new(FlakyClassifier {
            ok_frames: 2,
            served: 0,
        }),
        Box::new(camera),
    )
    .unwrap();

    let outcome = handle.run_inspection().await;
    assert!(matches!(
        outcome,
        Err(InspectionError::ClassifierFailed { .. })
    ));
    assert!(!handle.is_running());
    assert!(!playing.load(Ordering::SeqCst));
}

#[tokio::test(start_paused = true)]
async fn camera_start_failure_leaves_handle_idle() {
    let camera = TrackingCamera {
        inner: SyntheticCamera::default(),
        playing: Arc::new(AtomicBool::new(false)),
        fail_start: true,
    };
    let classifier = ScriptedClassifier::constant(&[("Clean", 0.9)]).unwrap();
    let handle = InspectionHandle::new(
        test_config(10_000, 1_000),
        Box::new(classifier),
        Box::new(camera),
    )
    .unwrap();

    let first = handle.run_inspection().await;
    assert!(matches!(first, Err(InspectionError::CaptureFailed { .. })));
    assert!(!handle.is_running());

    // Sampler was rolled back, so a retry fails the same way rather than
    // reporting AlreadyRunning.
    let second = handle.recheck().await;
    assert!(matches!(second, Err(InspectionError::CaptureFailed { .. })));
}

#[tokio::test(start_paused = true)]
async fn countdown_events_count_down_from_window() {
    let handle = scenario_handle();
    handle.run_inspection().await.unwrap();

    let countdown: Vec<u64> = handle
        .telemetry_snapshot()
        .recent
        .iter()
        .filter_map(|event| match event {
            InspectionEvent::Countdown { seconds_remaining } => Some(*seconds_remaining),
            _ => None,
        })
        .collect();
    assert_eq!(countdown, vec![10, 9, 8, 7, 6, 5, 4, 3, 2, 1]);
}

#[tokio::test(start_paused = true)]
async fn telemetry_stream_reports_finish() {
    let handle = scenario_handle();
    let mut rx = handle.telemetry_receiver();
    handle.run_inspection().await.unwrap();

    let mut finished = None;
    while let Ok(event) = rx.try_recv() {
        if let InspectionEvent::RunFinished {
            cleanliness_percent,
            status,
            ..
        } = event
        {
            finished = Some((cleanliness_percent, status));
        }
    }
    assert_eq!(finished, Some((75, CleanlinessStatus::Clean)));
}

#[test]
fn invalid_config_is_rejected() {
    let classifier = ScriptedClassifier::constant(&[("Clean", 0.9)]).unwrap();
    let result = InspectionHandle::new(
        test_config(0, 33),
        Box::new(classifier),
        Box::new(SyntheticCamera::default()),
    );
    assert!(matches!(result, Err(InspectionError::InvalidConfig { .. })));
}

#[test]
fn seconds_remaining_rounds_up() {
    assert_eq!(seconds_remaining(10_000, 0), 10);
    assert_eq!(seconds_remaining(10_000, 1_000), 9);
    assert_eq!(seconds_remaining(10_000, 9_500), 1);
    assert_eq!(seconds_remaining(10_000, 10_000), 0);
    assert_eq!(seconds_remaining(10_000, 12_000), 0);
}

#[tokio::test(start_paused = true)]
async fn telemetry_stream_yields_run_lifecycle_in_order() {
    use futures::StreamExt;

    let handle = scenario_handle();
    let mut stream = handle.telemetry_stream();
    handle.run_inspection().await.unwrap();

    let mut kinds = Vec::new();
    while let Some(event) = stream.next().await {
        let done = matches!(event, InspectionEvent::RunFinished { .. });
        kinds.push(event);
        if done {
            break;
        }
    }

    assert!(matches!(kinds.first(), Some(InspectionEvent::RunStarted { .. })));
    let ticks = kinds
        .iter()
        .filter(|event| matches!(event, InspectionEvent::Tick { .. }))
        .count();
    assert_eq!(ticks, 10);
}

/// Classifier whose first prediction panics
struct PanicOnceClassifier {
    panicked: bool,
}

impl Classifier for PanicOnceClassifier {
    fn labels(&self) -> Vec<String> {
        vec!["Clean".to_string(), "Dirty".to_string()]
    }

    fn predict(&mut self, _frame: &Frame) -> Result<Vec<ClassPrediction>, InspectionError> {
        if !self.panicked {
            self.panicked = true;
            panic!("inference runtime crashed");
        }
        Ok(vec![
            ClassPrediction::new("Clean", 0.9),
            ClassPrediction::new("Dirty", 0.1),
        ])
    }
}

#[tokio::test(start_paused = true)]
async fn panicking_classifier_releases_run_slot() {
    let playing = Arc::new(AtomicBool::new(false));
    let camera = TrackingCamera {
        inner: SyntheticCamera::default(),
        playing: Arc::clone(&playing),
        fail_start: false,
    };
    let handle = Arc::new(
        InspectionHandle::new(
            test_config(2_000, 100),
            Box::new(PanicOnceClassifier { panicked: false }),
            Box::new(camera),
        )
        .unwrap(),
    );

    let join = handle.spawn_run(RunTrigger::Start).unwrap();
    let err = join.await.unwrap_err();
    assert!(err.is_panic());
    assert!(!handle.is_running());
    assert!(!playing.load(Ordering::SeqCst));
    assert_eq!(handle.cancel(), Err(InspectionError::NotRunning));

    let retry = handle.recheck().await.unwrap();
    assert_eq!(retry.tick_count, 20);
    assert_eq!(retry.top_label, "Clean");
    assert_eq!(retry.cleanliness_percent, 90);
}

#[tokio::test(start_paused = true)]
async fn cancel_before_first_poll_is_not_lost() {
    let handle = Arc::new(scenario_handle());

    let join = handle.spawn_run(RunTrigger::Start).unwrap();
    assert!(handle.cancel().is_ok());

    let outcome = join.await.unwrap();
    assert_eq!(outcome, Err(InspectionError::Cancelled));
    assert!(!handle.is_running());

    // The next run gets a fresh cancel channel and completes normally.
    let result = handle.run_inspection().await.unwrap();
    assert_eq!(result.tick_count, 10);
    assert_eq!(handle.cancel(), Err(InspectionError::NotRunning));
}
