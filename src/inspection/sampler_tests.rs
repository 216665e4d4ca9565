use super::*;
use crate::analysis::CleanlinessStatus;

fn labels(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| name.to_string()).collect()
}

fn tick_of(values: &[(&str, f32)]) -> Vec<ClassPrediction> {
    values
        .iter()
        .map(|(label, p)| ClassPrediction::new(*label, *p))
        .collect()
}

#[test]
fn test_new_sampler_is_idle() {
    let sampler = Sampler::default();
    assert_eq!(sampler.phase(), RunPhase::Idle);
    assert_eq!(sampler.tick_count(), 0);
    assert!(sampler.tally().is_empty());
}

#[test]
fn test_ten_ticks_clean_scenario() {
    let mut sampler = Sampler::new(0.8, "clean");
    sampler
        .start_run(&labels(&["A", "B", "clean-oil"]))
        .unwrap();

    for _ in 0..10 {
        sampler
            .tick(tick_of(&[("A", 0.9), ("B", 0.2), ("clean-oil", 0.75)]))
            .unwrap();
    }

    let result = sampler.end_run().unwrap();
    assert_eq!(result.top_label, "A");
    assert_eq!(result.top_count, 10);
    assert_eq!(result.tick_count, 10);
    assert_eq!(sampler.tally().count("B"), Some(0));
    assert_eq!(sampler.tally().count("clean-oil"), Some(0));
    assert_eq!(result.cleanliness_percent, 75);
    assert_eq!(result.status, CleanlinessStatus::Clean);
    assert_eq!(sampler.phase(), RunPhase::Idle);
}

#[test]
fn test_nothing_above_threshold() {
    let mut sampler = Sampler::new(0.8, "clean");
    sampler.start_run(&labels(&["Dirty", "Clean"])).unwrap();

    for _ in 0..4 {
        sampler
            .tick(tick_of(&[("Dirty", 0.55), ("Clean", 0.45)]))
            .unwrap();
    }

    let result = sampler.end_run().unwrap();
    assert!(result.tally.iter().all(|entry| entry.count == 0));
    assert_eq!(result.top_label, "Dirty");
    assert_eq!(result.top_count, 0);
    // Percent ignores the threshold
    assert_eq!(result.cleanliness_percent, 45);
    assert_eq!(result.status, CleanlinessStatus::Moderate);
}

#[test]
fn test_percent_comes_from_final_tick_only() {
    let mut sampler = Sampler::new(0.8, "clean");
    sampler.start_run(&labels(&["Dirty", "Clean"])).unwrap();
    sampler.tick(tick_of(&[("Dirty", 0.1), ("Clean", 0.9)])).unwrap();
    sampler.tick(tick_of(&[("Dirty", 0.7), ("Clean", 0.3)])).unwrap();

    let result = sampler.end_run().unwrap();
    assert_eq!(result.top_label, "Clean");
    assert_eq!(result.top_count, 1);
    assert_eq!(result.cleanliness_percent, 30);
    assert_eq!(result.status, CleanlinessStatus::Dirty);
}

#[test]
fn test_missing_clean_label_yields_zero() {
    let mut sampler = Sampler::new(0.8, "clean");
    sampler.start_run(&labels(&["Murky", "Sludge"])).unwrap();
    sampler.tick(tick_of(&[("Murky", 0.95), ("Sludge", 0.05)])).unwrap();

    let result = sampler.end_run().unwrap();
    assert_eq!(result.cleanliness_percent, 0);
    assert_eq!(result.status, CleanlinessStatus::Unknown);
    assert_eq!(result.top_label, "Murky");
}

#[test]
fn test_start_while_running_is_rejected() {
    let mut sampler = Sampler::default();
    sampler.start_run(&labels(&["A"])).unwrap();
    sampler.tick(tick_of(&[("A", 0.9)])).unwrap();

    assert_eq!(
        sampler.start_run(&labels(&["A"])),
        Err(InspectionError::AlreadyRunning)
    );
    // The active run is untouched
    assert_eq!(sampler.tally().count("A"), Some(1));
}

#[test]
fn test_tick_and_end_while_idle_are_rejected() {
    let mut sampler = Sampler::default();
    assert_eq!(
        sampler.tick(tick_of(&[("A", 0.9)])),
        Err(InspectionError::NotRunning)
    );
    assert_eq!(sampler.end_run(), Err(InspectionError::NotRunning));
}

#[test]
fn test_end_run_consumed_once() {
    let mut sampler = Sampler::default();
    sampler.start_run(&labels(&["A"])).unwrap();
    assert!(sampler.end_run().is_ok());
    assert_eq!(sampler.end_run(), Err(InspectionError::NotRunning));
}

#[test]
fn test_empty_label_set_is_rejected() {
    let mut sampler = Sampler::default();
    assert!(matches!(
        sampler.start_run(&[]),
        Err(InspectionError::ClassifierFailed { .. })
    ));
    assert_eq!(sampler.phase(), RunPhase::Idle);
}

#[test]
fn test_recheck_resets_like_fresh_start() {
    let names = labels(&["A", "B", "Clean"]);
    let script = [
        tick_of(&[("A", 0.9), ("B", 0.05), ("Clean", 0.05)]),
        tick_of(&[("A", 0.1), ("B", 0.85), ("Clean", 0.05)]),
        tick_of(&[("A", 0.1), ("B", 0.1), ("Clean", 0.8)]),
    ];

    let mut fresh = Sampler::default();
    fresh.start_run(&names).unwrap();
    for tick in script.iter().cloned() {
        fresh.tick(tick).unwrap();
    }
    let fresh_result = fresh.end_run().unwrap();

    let mut reused = Sampler::default();
    reused.start_run(&names).unwrap();
    for _ in 0..7 {
        reused
            .tick(tick_of(&[("A", 0.99), ("B", 0.99), ("Clean", 0.99)]))
            .unwrap();
    }
    reused.end_run().unwrap();

    reused.start_run(&names).unwrap();
    assert!(reused.tally().entries().iter().all(|e| e.count == 0));
    assert!(reused.last_predictions().is_empty());
    for tick in script.iter().cloned() {
        reused.tick(tick).unwrap();
    }
    assert_eq!(reused.end_run().unwrap(), fresh_result);
}

#[test]
fn test_abort_returns_to_idle() {
    let mut sampler = Sampler::default();
    sampler.start_run(&labels(&["A"])).unwrap();
    sampler.abort();
    assert_eq!(sampler.phase(), RunPhase::Idle);
    assert_eq!(sampler.end_run(), Err(InspectionError::NotRunning));
    // Idle abort is harmless
    sampler.abort();
    assert!(!sampler.is_running());
}

#[test]
fn test_percent_always_in_range() {
    let mut sampler = Sampler::default();
    for p in [0.0_f32, 0.004, 0.41, 0.705, 0.999, 1.0, 1.7] {
        sampler.start_run(&labels(&["Clean"])).unwrap();
        sampler.tick(tick_of(&[("Clean", p)])).unwrap();
        let result = sampler.end_run().unwrap();
        assert!(result.cleanliness_percent <= 100);
    }
}
