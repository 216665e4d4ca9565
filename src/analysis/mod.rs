// Analysis module - prediction aggregation primitives
//
// Pure building blocks used by the sampler:
// - prediction: classifier output and clean-class lookup
// - tally: per-label threshold counts with deterministic top selection
// - status: cleanliness percent → dashboard status

pub mod prediction;
pub mod status;
pub mod tally;

pub use prediction::{matching_probability, to_percent, ClassPrediction};
pub use status::{Badge, CleanlinessStatus};
pub use tally::{TallyEntry, TallyTable};
