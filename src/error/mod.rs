// Error types for the oil inspector
//
// This module defines the structured error type for inspection runs and the
// collaborators (classifier, frame source) they drive. Each error carries a
// stable numeric code so CLI and HTTP surfaces can report it consistently.

mod inspection;

pub use inspection::{log_inspection_error, InspectionError, InspectionErrorCodes};

/// Error codes for structured error reporting
///
/// This trait provides a standard way to get error codes and messages
/// from custom error types, enabling consistent error handling across
/// the CLI and HTTP boundaries.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}
