// Inspection module - one detection run from trigger to result
//
// This module provides two main components:
// 1. Sampler: owns the tally and last prediction set for the active run
// 2. RunResult: the modal class and cleanliness percent derived at run end
//
// The run workflow:
// 1. start_run() with the classifier's label set (tally reset to zero)
// 2. tick() once per delivered frame
// 3. end_run() exactly once when the window elapses

pub mod result;
pub mod sampler;

pub use result::RunResult;
pub use sampler::{RunPhase, Sampler};
