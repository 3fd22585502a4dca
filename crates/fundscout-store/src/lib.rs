//! Persistence collaborator for the run pipeline.
//!
//! The pipeline only talks to [`OpportunityStore`]. [`MemoryStore`] is the
//! process-local implementation used by the CLI and the tests; it serializes
//! its own writes and is read-your-writes consistent within a process.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use fundscout_core::{ActivityRecord, CandidateOpportunity, PersistedOpportunity, Source};

pub mod memory;

pub use memory::MemoryStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found: {0}")]
    NotFound(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait OpportunityStore: Send + Sync {
    /// Sources with `is_active = true`, in registry order.
    async fn list_active_sources(&self) -> Result<Vec<Source>, StoreError>;

    /// Every persisted opportunity; the dedup comparison set.
    async fn list_all_opportunities(&self) -> Result<Vec<PersistedOpportunity>, StoreError>;

    /// Assign an id and `scraped_at`, mark active, and persist.
    async fn insert_opportunity(
        &self,
        candidate: CandidateOpportunity,
    ) -> Result<PersistedOpportunity, StoreError>;

    /// Append one activity record. Records are never updated.
    async fn record_activity(&self, entry: ActivityRecord) -> Result<(), StoreError>;

    /// Stamp `last_scraped` on a source.
    async fn mark_source_scraped(
        &self,
        source_id: &str,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Most recent activity first, at most `limit` entries.
    async fn list_activity(&self, limit: usize) -> Result<Vec<ActivityRecord>, StoreError>;
}
