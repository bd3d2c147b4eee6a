//! Output rendering for reconstructed layouts.

mod json;
mod stats;

pub use json::{to_json, JsonFormat};
pub use stats::ReconstructionStats;
