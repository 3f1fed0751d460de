// src/lib.rs
// Public library surface for integration tests (and the host service).

pub mod config;
pub mod model;
pub mod stats;
pub mod store;
pub mod telemetry;
pub mod weighting;

// Per-submission trust pipeline (device resolution, trap checks, weighting)
pub mod processor;
pub mod verify;

// Batch analytics over committed rows
pub mod population;
pub mod seasonal;
pub mod stability;

// ---- Re-exports for stable public API ----
pub use crate::config::EngineConfig;
pub use crate::model::{
    ClinicProfile, ClinicPxValue, DeviceType, ProcessedSubmission, SubmissionInput, Verification,
};
pub use crate::processor::SubmissionProcessor;
pub use crate::seasonal::{seasonal_indices, SeasonalIndices, SeasonalLevel};
pub use crate::stability::stability_score;
pub use crate::store::{memory::MemoryStore, SurveyStore};
