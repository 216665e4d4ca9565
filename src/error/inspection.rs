// Inspection error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Inspection error code constants
///
/// Single source of truth for the numeric codes reported by the CLI exit
/// payloads and the debug HTTP surface.
///
/// Error code range: 3001-3007
pub struct InspectionErrorCodes {}

impl InspectionErrorCodes {
    /// A run is already active
    pub const ALREADY_RUNNING: i32 = 3001;

    /// No run is active
    pub const NOT_RUNNING: i32 = 3002;

    /// The classifier failed to load or predict
    pub const CLASSIFIER_FAILED: i32 = 3003;

    /// The frame source failed to start or capture
    pub const CAPTURE_FAILED: i32 = 3004;

    /// The run was cancelled before its window elapsed
    pub const CANCELLED: i32 = 3005;

    /// Sampler state Mutex was poisoned
    pub const STATE_POISONED: i32 = 3006;

    /// Configuration values are out of range
    pub const INVALID_CONFIG: i32 = 3007;
}

/// Log an inspection error with structured context
///
/// Fields logged:
/// - error_code: Numeric error code for programmatic handling
/// - component: The component where the error occurred
/// - message: Human-readable error message
/// - context: Additional contextual information
pub fn log_inspection_error(err: &InspectionError, context: &str) {
    error!(
        "Inspection error in {}: code={}, component=Sampler, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Inspection-related errors
///
/// These cover the run lifecycle (start/tick/end), collaborator failures,
/// and configuration validation.
///
/// Error code ranges: 3001-3007
#[derive(Debug, Clone, PartialEq)]
pub enum InspectionError {
    /// A run is already active
    AlreadyRunning,

    /// No run is active
    NotRunning,

    /// Classifier failed to load or predict
    ClassifierFailed { reason: String },

    /// Frame source failed to start or capture
    CaptureFailed { reason: String },

    /// Run cancelled before the window elapsed
    Cancelled,

    /// Sampler state Mutex was poisoned
    StatePoisoned,

    /// Configuration rejected by validation
    InvalidConfig { reason: String },
}

impl ErrorCode for InspectionError {
    fn code(&self) -> i32 {
        match self {
            InspectionError::AlreadyRunning => InspectionErrorCodes::ALREADY_RUNNING,
            InspectionError::NotRunning => InspectionErrorCodes::NOT_RUNNING,
            InspectionError::ClassifierFailed { .. } => InspectionErrorCodes::CLASSIFIER_FAILED,
            InspectionError::CaptureFailed { .. } => InspectionErrorCodes::CAPTURE_FAILED,
            InspectionError::Cancelled => InspectionErrorCodes::CANCELLED,
            InspectionError::StatePoisoned => InspectionErrorCodes::STATE_POISONED,
            InspectionError::InvalidConfig { .. } => InspectionErrorCodes::INVALID_CONFIG,
        }
    }

    fn message(&self) -> String {
        match self {
            InspectionError::AlreadyRunning => {
                "Detection already running. Wait for the current run to finish.".to_string()
            }
            InspectionError::NotRunning => {
                "Detection not running. Call run_inspection() first.".to_string()
            }
            InspectionError::ClassifierFailed { reason } => {
                format!("Classifier failed: {}", reason)
            }
            InspectionError::CaptureFailed { reason } => {
                format!("Frame capture failed: {}", reason)
            }
            InspectionError::Cancelled => "Detection cancelled".to_string(),
            InspectionError::StatePoisoned => "Sampler state lock poisoned".to_string(),
            InspectionError::InvalidConfig { reason } => {
                format!("Invalid configuration: {}", reason)
            }
        }
    }
}

impl fmt::Display for InspectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "InspectionError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for InspectionError {}
