//! Fixture utilities for the deterministic CLI harness.
//!
//! A fixture is a JSON prediction script (`<name>.json`) replayed by a
//! [ScriptedClassifier], with optional expectations (`<name>.expect.json`)
//! checked against the finished run. This stands in for the hosted model and
//! webcam in CI and QA workflows.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use crate::analysis::CleanlinessStatus;
use crate::config::AppConfig;
use crate::engine::backend::{ScriptedClassifier, SyntheticCamera};
use crate::engine::core::InspectionHandle;
use crate::inspection::RunResult;

/// Default location for fixture JSON assets.
pub const DEFAULT_FIXTURE_ROOT: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/fixtures");

const EXPECT_SUFFIX: &str = ".expect.json";

/// Metadata describing an available fixture.
#[derive(Clone, Debug)]
pub struct FixtureMetadata {
    pub name: String,
    pub script_path: PathBuf,
    pub expect_path: Option<PathBuf>,
}

/// Per-tick probability script in classifier label order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionScript {
    pub labels: Vec<String>,
    pub ticks: Vec<Vec<f32>>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl PredictionScript {
    pub fn classifier(&self) -> Result<ScriptedClassifier> {
        ScriptedClassifier::new(self.labels.clone(), self.ticks.clone())
            .map_err(|err| anyhow!("{}", err))
    }
}

/// Loaded fixture data.
pub struct FixtureData {
    pub metadata: FixtureMetadata,
    pub script: PredictionScript,
    pub expectations: Option<FixtureExpectations>,
}

/// JSON expectation schema for fixture verification.
///
/// Every field is optional; only the ones present are checked.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FixtureExpectations {
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub top_label: Option<String>,
    #[serde(default)]
    pub top_count: Option<u32>,
    #[serde(default)]
    pub cleanliness_percent: Option<u8>,
    #[serde(default)]
    pub percent_tolerance: u8,
    #[serde(default)]
    pub status: Option<CleanlinessStatus>,
}

impl FixtureExpectations {
    pub fn verify(&self, actual: &RunResult) -> std::result::Result<(), ExpectationDiff> {
        let mut failures = Vec::new();

        if let Some(label) = &self.top_label {
            if *label != actual.top_label {
                failures.push(ExpectationFailure::new("top_label", label, &actual.top_label));
            }
        }

        if let Some(count) = self.top_count {
            if count != actual.top_count {
                failures.push(ExpectationFailure::new("top_count", count, actual.top_count));
            }
        }

        if let Some(percent) = self.cleanliness_percent {
            if percent.abs_diff(actual.cleanliness_percent) > self.percent_tolerance {
                failures.push(ExpectationFailure::new(
                    "cleanliness_percent",
                    percent,
                    actual.cleanliness_percent,
                ));
            }
        }

        if let Some(status) = self.status {
            if status != actual.status {
                failures.push(ExpectationFailure::new("status", status, actual.status));
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(ExpectationDiff { failures })
        }
    }
}

/// Outcome of comparing actual results with expectations.
#[derive(Debug)]
pub struct ExpectationDiff {
    pub failures: Vec<ExpectationFailure>,
}

impl ExpectationDiff {
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "failures": self.failures.iter().map(|failure| {
                serde_json::json!({
                    "field": failure.field,
                    "expected": failure.expected,
                    "actual": failure.actual,
                })
            }).collect::<Vec<_>>()
        })
    }
}

/// Detailed diff entry for a single mismatched field.
#[derive(Debug)]
pub struct ExpectationFailure {
    pub field: &'static str,
    pub expected: serde_json::Value,
    pub actual: serde_json::Value,
}

impl ExpectationFailure {
    fn new<E: Serialize, A: Serialize>(field: &'static str, expected: E, actual: A) -> Self {
        Self {
            field,
            expected: serde_json::to_value(expected).unwrap_or_default(),
            actual: serde_json::to_value(actual).unwrap_or_default(),
        }
    }
}

/// Catalog responsible for discovering fixtures on disk.
pub struct FixtureCatalog {
    root: PathBuf,
}

impl FixtureCatalog {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// List all fixtures by their metadata.
    pub fn discover(&self) -> Result<Vec<FixtureMetadata>> {
        let mut fixtures = Vec::new();
        if !self.root.exists() {
            return Ok(fixtures);
        }

        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let path = entry.path();
            if is_script_path(&path) {
                fixtures.push(self.metadata_for_path(&path)?);
            }
        }

        fixtures.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(fixtures)
    }

    /// Load fixture script + expectations for provided name or path.
    pub fn load(&self, fixture: &str, override_expect: Option<PathBuf>) -> Result<FixtureData> {
        let script_path = self.resolve_fixture_path(fixture)?;
        let metadata = self.metadata_for_path(&script_path)?;

        let json = fs::read_to_string(&script_path)
            .with_context(|| format!("reading fixture {}", script_path.display()))?;
        let script: PredictionScript = serde_json::from_str(&json)
            .with_context(|| format!("parsing {}", script_path.display()))?;

        let expectation_path = override_expect.or(metadata.expect_path.clone());
        let expectations = match expectation_path {
            Some(path) => {
                let json = fs::read_to_string(&path)
                    .with_context(|| format!("reading expectation {}", path.display()))?;
                Some(
                    serde_json::from_str(&json)
                        .with_context(|| format!("parsing {}", path.display()))?,
                )
            }
            None => None,
        };

        Ok(FixtureData {
            metadata,
            script,
            expectations,
        })
    }

    fn resolve_fixture_path(&self, fixture: &str) -> Result<PathBuf> {
        let as_path = Path::new(fixture);
        if as_path.is_file() {
            return Ok(as_path.to_path_buf());
        }

        let candidate = self.root.join(format!("{fixture}.json"));
        if candidate.exists() {
            Ok(candidate)
        } else {
            Err(anyhow!(
                "Fixture '{fixture}' not found in {}",
                self.root.display()
            ))
        }
    }

    fn metadata_for_path(&self, script_path: &Path) -> Result<FixtureMetadata> {
        let name = script_path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| anyhow!("Invalid fixture name for {}", script_path.display()))?
            .to_string();
        let expect_path = script_path.with_file_name(format!("{name}{EXPECT_SUFFIX}"));
        Ok(FixtureMetadata {
            name,
            script_path: script_path.to_path_buf(),
            expect_path: expect_path.exists().then_some(expect_path),
        })
    }
}

impl Default for FixtureCatalog {
    fn default() -> Self {
        Self::new(DEFAULT_FIXTURE_ROOT)
    }
}

fn is_script_path(path: &Path) -> bool {
    let Some(file_name) = path.file_name().and_then(|name| name.to_str()) else {
        return false;
    };
    file_name.ends_with(".json") && !file_name.ends_with(EXPECT_SUFFIX)
}

/// Executes fixtures through a full inspection run.
pub struct FixtureRunner {
    config: AppConfig,
}

impl FixtureRunner {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn with_window_ms(mut self, window_ms: u64) -> Self {
        self.config.detection.window_ms = window_ms;
        self
    }

    pub fn with_frame_interval_ms(mut self, frame_interval_ms: u64) -> Self {
        self.config.detection.frame_interval_ms = frame_interval_ms;
        self
    }

    /// Build a handle wired to the fixture's scripted classifier.
    pub fn handle_for(&self, data: &FixtureData) -> Result<InspectionHandle> {
        let classifier = data.script.classifier()?;
        let camera = SyntheticCamera::new(self.config.camera.clone());
        InspectionHandle::new(self.config.clone(), Box::new(classifier), Box::new(camera))
            .map_err(|err| anyhow!("{}", err))
    }

    pub async fn run(&self, data: &FixtureData) -> Result<RunResult> {
        let handle = self.handle_for(data)?;
        handle
            .run_inspection()
            .await
            .map_err(|err| anyhow!("{}", err))
            .with_context(|| format!("running fixture {}", data.metadata.name))
    }
}
