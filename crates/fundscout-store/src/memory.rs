use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use fundscout_core::{ActivityRecord, CandidateOpportunity, PersistedOpportunity, Source};

use crate::{OpportunityStore, StoreError};

/// In-memory store backed by `tokio` read/write locks.
#[derive(Debug, Default)]
pub struct MemoryStore {
    sources: RwLock<Vec<Source>>,
    opportunities: RwLock<Vec<PersistedOpportunity>>,
    activity: RwLock<Vec<ActivityRecord>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with a source registry.
    #[must_use]
    pub fn with_sources(sources: Vec<Source>) -> Self {
        Self {
            sources: RwLock::new(sources),
            ..Self::default()
        }
    }

    /// Every source, active or not.
    pub async fn sources(&self) -> Vec<Source> {
        self.sources.read().await.clone()
    }

    pub async fn opportunity_count(&self) -> usize {
        self.opportunities.read().await.len()
    }
}

#[async_trait]
impl OpportunityStore for MemoryStore {
    async fn list_active_sources(&self) -> Result<Vec<Source>, StoreError> {
        Ok(self
            .sources
            .read()
            .await
            .iter()
            .filter(|s| s.is_active)
            .cloned()
            .collect())
    }

    async fn list_all_opportunities(&self) -> Result<Vec<PersistedOpportunity>, StoreError> {
        Ok(self.opportunities.read().await.clone())
    }

    async fn insert_opportunity(
        &self,
        candidate: CandidateOpportunity,
    ) -> Result<PersistedOpportunity, StoreError> {
        let record = PersistedOpportunity {
            id: Uuid::new_v4(),
            opportunity: candidate,
            scraped_at: Utc::now(),
            is_active: true,
        };
        self.opportunities.write().await.push(record.clone());
        tracing::debug!(
            id = %record.id,
            title = %record.opportunity.title,
            "store: inserted opportunity"
        );
        Ok(record)
    }

    async fn record_activity(&self, entry: ActivityRecord) -> Result<(), StoreError> {
        self.activity.write().await.push(entry);
        Ok(())
    }

    async fn mark_source_scraped(
        &self,
        source_id: &str,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut sources = self.sources.write().await;
        let source = sources
            .iter_mut()
            .find(|s| s.id == source_id)
            .ok_or_else(|| StoreError::NotFound(format!("source {source_id}")))?;
        source.last_scraped = Some(at);
        Ok(())
    }

    async fn list_activity(&self, limit: usize) -> Result<Vec<ActivityRecord>, StoreError> {
        let activity = self.activity.read().await;
        Ok(activity.iter().rev().take(limit).cloned().collect())
    }
}
