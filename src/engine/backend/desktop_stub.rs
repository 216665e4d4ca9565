use crate::analysis::ClassPrediction;
use crate::config::CameraConfig;
use crate::error::InspectionError;

use super::{Classifier, Frame, FrameSource};

/// Deterministic classifier replaying a fixed probability script.
///
/// Row `n` is returned on the `n`th prediction; once the script is exhausted
/// the final row repeats, which models a steady sample in front of the
/// camera.
pub struct ScriptedClassifier {
    labels: Vec<String>,
    rows: Vec<Vec<f32>>,
    cursor: usize,
}

impl ScriptedClassifier {
    /// Build a scripted classifier
    ///
    /// # Errors
    /// - `ClassifierFailed` if there are no labels, no rows, or a row's width
    ///   differs from the label count
    pub fn new(labels: Vec<String>, rows: Vec<Vec<f32>>) -> Result<Self, InspectionError> {
        if labels.is_empty() {
            return Err(InspectionError::ClassifierFailed {
                reason: "script has no labels".to_string(),
            });
        }
        if rows.is_empty() {
            return Err(InspectionError::ClassifierFailed {
                reason: "script has no prediction rows".to_string(),
            });
        }
        if let Some((idx, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != labels.len())
        {
            return Err(InspectionError::ClassifierFailed {
                reason: format!(
                    "row {} has {} probabilities, expected {}",
                    idx,
                    row.len(),
                    labels.len()
                ),
            });
        }

        Ok(Self {
            labels,
            rows,
            cursor: 0,
        })
    }

    /// Classifier that reports the same probabilities on every frame
    pub fn constant(values: &[(&str, f32)]) -> Result<Self, InspectionError> {
        let labels = values.iter().map(|(label, _)| label.to_string()).collect();
        let row = values.iter().map(|(_, p)| *p).collect();
        Self::new(labels, vec![row])
    }

    /// Number of predictions served so far
    pub fn predictions_served(&self) -> usize {
        self.cursor
    }
}

impl Classifier for ScriptedClassifier {
    fn labels(&self) -> Vec<String> {
        self.labels.clone()
    }

    fn predict(&mut self, _frame: &Frame) -> Result<Vec<ClassPrediction>, InspectionError> {
        let row_idx = self.cursor.min(self.rows.len() - 1);
        self.cursor += 1;

        Ok(self
            .labels
            .iter()
            .zip(&self.rows[row_idx])
            .map(|(label, p)| ClassPrediction::new(label.clone(), *p))
            .collect())
    }
}

/// Synthetic camera producing blank frames of the configured geometry.
pub struct SyntheticCamera {
    config: CameraConfig,
    playing: bool,
    sequence: u64,
}

impl SyntheticCamera {
    pub fn new(config: CameraConfig) -> Self {
        Self {
            config,
            playing: false,
            sequence: 0,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }
}

impl Default for SyntheticCamera {
    fn default() -> Self {
        Self::new(CameraConfig::default())
    }
}

impl FrameSource for SyntheticCamera {
    fn start(&mut self) -> Result<(), InspectionError> {
        if self.config.width == 0 || self.config.height == 0 {
            return Err(InspectionError::CaptureFailed {
                reason: format!(
                    "invalid frame size {}x{}",
                    self.config.width, self.config.height
                ),
            });
        }
        self.playing = true;
        self.sequence = 0;
        Ok(())
    }

    fn capture(&mut self) -> Result<Frame, InspectionError> {
        if !self.playing {
            return Err(InspectionError::CaptureFailed {
                reason: "camera not started".to_string(),
            });
        }

        let len = frame_len(self.config.width, self.config.height).ok_or_else(|| {
            InspectionError::CaptureFailed {
                reason: format!(
                    "frame size {}x{} overflows the pixel buffer",
                    self.config.width, self.config.height
                ),
            }
        })?;

        let frame = Frame {
            sequence: self.sequence,
            width: self.config.width,
            height: self.config.height,
            flipped: self.config.flip,
            pixels: vec![0; len],
        };
        self.sequence += 1;
        Ok(frame)
    }

    fn stop(&mut self) -> Result<(), InspectionError> {
        self.playing = false;
        Ok(())
    }
}

/// RGBA8 buffer length, or `None` if it does not fit in `usize`
fn frame_len(width: u32, height: u32) -> Option<usize> {
    usize::try_from(width)
        .ok()?
        .checked_mul(usize::try_from(height).ok()?)?
        .checked_mul(4)
}
