//! Collaborator abstractions for the inspection core.
//!
//! The hosted classifier and the capture device are external concerns. The
//! core only needs a fixed ordered label set, a way to grab the current
//! frame, and a way to turn a frame into one probability per label.

use crate::analysis::ClassPrediction;
use crate::error::InspectionError;

/// One captured image as delivered by a [FrameSource].
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Monotonic capture counter, starting at 0 for each session
    pub sequence: u64,
    pub width: u32,
    pub height: u32,
    /// Frame was mirrored horizontally before delivery
    pub flipped: bool,
    /// RGBA8 pixels, row-major
    pub pixels: Vec<u8>,
}

/// Trait implemented by image classifiers.
///
/// `predict` must return one prediction per entry of `labels()`, in the
/// same order.
pub trait Classifier: Send {
    /// Fixed ordered class label set
    fn labels(&self) -> Vec<String>;

    fn predict(&mut self, frame: &Frame) -> Result<Vec<ClassPrediction>, InspectionError>;
}

/// Trait implemented by capture devices (webcam or synthetic).
pub trait FrameSource: Send {
    fn start(&mut self) -> Result<(), InspectionError>;

    /// Grab the current frame; only valid between `start` and `stop`
    fn capture(&mut self) -> Result<Frame, InspectionError>;

    fn stop(&mut self) -> Result<(), InspectionError>;
}

mod desktop_stub;
pub use desktop_stub::{ScriptedClassifier, SyntheticCamera};
