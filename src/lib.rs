// Oil Inspector Core - webcam sampling and cleanliness aggregation
// Timed detection runs over a frame source and classifier, reduced to a
// dashboard-ready cleanliness status

// Module declarations
pub mod analysis;
pub mod config;
pub mod dashboard;
pub mod engine;
pub mod error;
pub mod fixtures;
pub mod http;
pub mod inspection;
pub mod telemetry;

// Re-exports for convenience
pub use analysis::{ClassPrediction, CleanlinessStatus};
pub use config::AppConfig;
pub use dashboard::DashboardView;
pub use engine::{Classifier, Frame, FrameSource, InspectionHandle, RunTrigger};
pub use error::{ErrorCode, InspectionError};
pub use inspection::{RunResult, Sampler};

use tracing_subscriber::EnvFilter;

/// Initialize logging for binaries and tests
///
/// Honors `RUST_LOG`, defaulting to `info`. Output goes to stderr so CLI
/// reports on stdout stay machine-readable. Safe to call more than once.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
