//! Deduplication, run orchestration, and scheduling for fundscout.

pub mod dedup;
pub mod error;
pub mod orchestrator;
pub mod scheduler;

pub use dedup::{
    find_duplicate, is_duplicate, title_similarity, DedupIndex, TITLE_SIMILARITY_THRESHOLD,
};
pub use error::{OrchestratorError, SchedulerError};
pub use orchestrator::{Orchestrator, RunSettings};
pub use scheduler::{Cadences, Scheduler};
