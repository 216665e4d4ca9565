//! Configuration management for inspection runs
//!
//! This module provides runtime configuration loading from JSON files so the
//! detection window, confidence threshold, and camera geometry can be tuned
//! without recompilation.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::InspectionError;

/// Largest accepted capture width or height, in pixels
pub const MAX_FRAME_DIMENSION: u32 = 8_192;

/// Default location of the JSON config relative to the working directory
pub const DEFAULT_CONFIG_PATH: &str = "assets/inspector_config.json";

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub detection: DetectionConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub camera: CameraConfig,
}

/// Sampling window and aggregation parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Length of one detection run in milliseconds
    pub window_ms: u64,
    /// A prediction counts toward the tally only when strictly above this
    pub confidence_threshold: f32,
    /// Case-insensitive substring identifying the "clean" class
    pub clean_label_pattern: String,
    /// Delay between frame deliveries (one tick per frame)
    pub frame_interval_ms: u64,
    /// Period of countdown telemetry events
    pub countdown_interval_ms: u64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            window_ms: 10_000,
            confidence_threshold: 0.8,
            clean_label_pattern: "clean".to_string(),
            // ~30 fps, roughly an animation-frame cadence
            frame_interval_ms: 33,
            countdown_interval_ms: 1_000,
        }
    }
}

impl DetectionConfig {
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }

    pub fn countdown_interval(&self) -> Duration {
        Duration::from_millis(self.countdown_interval_ms)
    }
}

/// Hosted classifier location
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Base URL of the exported model; must end with '/'
    pub model_url: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_url: "https://teachablemachine.withgoogle.com/models/lxFOHSWfS/".to_string(),
        }
    }
}

impl ModelConfig {
    /// URL of the model topology file
    pub fn model_json_url(&self) -> String {
        format!("{}model.json", self.base())
    }

    /// URL of the class label metadata file
    pub fn metadata_url(&self) -> String {
        format!("{}metadata.json", self.base())
    }

    fn base(&self) -> String {
        if self.model_url.ends_with('/') {
            self.model_url.clone()
        } else {
            format!("{}/", self.model_url)
        }
    }
}

/// Capture geometry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub width: u32,
    pub height: u32,
    /// Mirror frames horizontally (selfie view)
    pub flip: bool,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            width: 300,
            height: 250,
            flip: true,
        }
    }
}

impl AppConfig {
    /// Load configuration from JSON file
    ///
    /// # Arguments
    /// * `path` - Path to JSON config file
    ///
    /// # Returns
    /// The loaded configuration, or defaults if the file is missing or invalid
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                    config
                }
                Err(err) => {
                    log::warn!(
                        "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "[Config] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }

    /// Load configuration from the default asset path
    pub fn load() -> Self {
        Self::load_from_file(DEFAULT_CONFIG_PATH)
    }

    /// Reject values that would make a run meaningless
    pub fn validate(&self) -> Result<(), InspectionError> {
        let detection = &self.detection;
        if detection.window_ms == 0 {
            return Err(InspectionError::InvalidConfig {
                reason: "window_ms must be greater than 0".to_string(),
            });
        }
        if detection.frame_interval_ms == 0 {
            return Err(InspectionError::InvalidConfig {
                reason: "frame_interval_ms must be greater than 0".to_string(),
            });
        }
        if detection.countdown_interval_ms == 0 {
            return Err(InspectionError::InvalidConfig {
                reason: "countdown_interval_ms must be greater than 0".to_string(),
            });
        }
        if detection.clean_label_pattern.trim().is_empty() {
            return Err(InspectionError::InvalidConfig {
                reason: "clean_label_pattern must not be empty".to_string(),
            });
        }
        let camera = &self.camera;
        let dimensions = 1..=MAX_FRAME_DIMENSION;
        if !dimensions.contains(&camera.width) || !dimensions.contains(&camera.height) {
            return Err(InspectionError::InvalidConfig {
                reason: format!(
                    "camera size {}x{} outside 1..={} per side",
                    camera.width, camera.height, MAX_FRAME_DIMENSION
                ),
            });
        }
        if !(0.0..=1.0).contains(&detection.confidence_threshold) {
            return Err(InspectionError::InvalidConfig {
                reason: format!(
                    "confidence_threshold {} out of range [0.0, 1.0]",
                    detection.confidence_threshold
                ),
            });
        }
        Ok(())
    }
}
