//! One collection pass over every active source.
//!
//! Sources are fetched in fixed-size batches. Members of a batch run
//! concurrently and the batch is awaited as a whole, so one source failing
//! (or panicking) never cancels its batch-mates. Each source is then
//! deduplicated against a fresh store snapshot, its survivors persisted,
//! and exactly one [`ActivityRecord`] written for it.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::future::join_all;
use futures::FutureExt;

use fundscout_core::{ActivityRecord, AppConfig, RunOutcome, RunSummary, Source, SourceFailure};
use fundscout_scraper::{AdapterProvider, FetchIssue, FetchOutcome, IssueKind};
use fundscout_store::OpportunityStore;

use crate::dedup::DedupIndex;
use crate::error::OrchestratorError;

const DEFAULT_BATCH_SIZE: usize = 3;
const DEFAULT_BATCH_DELAY: Duration = Duration::from_millis(2000);

#[derive(Debug, Clone, Copy)]
pub struct RunSettings {
    pub batch_size: usize,
    pub batch_delay: Duration,
}

impl RunSettings {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            batch_size: config.batch_size,
            batch_delay: Duration::from_millis(config.batch_delay_ms),
        }
    }
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            batch_delay: DEFAULT_BATCH_DELAY,
        }
    }
}

/// Per-source tallies, folded into the [`RunSummary`].
#[derive(Debug)]
struct SourceReport {
    outcome: RunOutcome,
    stored: usize,
    duplicates: usize,
    error: Option<String>,
}

pub struct Orchestrator {
    store: Arc<dyn OpportunityStore>,
    adapters: Arc<dyn AdapterProvider>,
    settings: RunSettings,
}

impl Orchestrator {
    #[must_use]
    pub fn new(
        store: Arc<dyn OpportunityStore>,
        adapters: Arc<dyn AdapterProvider>,
        settings: RunSettings,
    ) -> Self {
        Self {
            store,
            adapters,
            settings,
        }
    }

    /// Run one pass across all active sources.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::Sources`] only when the active source
    /// list cannot be loaded. Every per-source failure lands in the summary.
    pub async fn run_all(&self) -> Result<RunSummary, OrchestratorError> {
        let sources = self.store.list_active_sources().await?;
        let batch_size = self.settings.batch_size.max(1);

        tracing::info!(
            sources = sources.len(),
            batch_size,
            "orchestrator: starting run"
        );

        let mut summary = RunSummary {
            total_sources: sources.len(),
            ..RunSummary::default()
        };

        for (index, batch) in sources.chunks(batch_size).enumerate() {
            if index > 0 && !self.settings.batch_delay.is_zero() {
                tokio::time::sleep(self.settings.batch_delay).await;
            }

            let outcomes = join_all(batch.iter().map(|source| self.fetch_source(source))).await;

            for (source, outcome) in batch.iter().zip(outcomes) {
                let report = self.process_source(source, outcome).await;
                summary.total_opportunities_stored += report.stored;
                summary.total_duplicates_filtered += report.duplicates;
                match report.outcome {
                    RunOutcome::Success => summary.successful_sources += 1,
                    RunOutcome::Error => summary.errors.push(SourceFailure {
                        source: source.name.clone(),
                        error: report.error.unwrap_or_default(),
                    }),
                }
            }
        }

        tracing::info!(
            total = summary.total_sources,
            successful = summary.successful_sources,
            stored = summary.total_opportunities_stored,
            duplicates = summary.total_duplicates_filtered,
            failed = summary.errors.len(),
            "orchestrator: run complete"
        );
        Ok(summary)
    }

    async fn fetch_source(&self, source: &Source) -> FetchOutcome {
        let adapter = self.adapters.adapter_for(source);
        tracing::debug!(
            source = %source.name,
            category = %source.category,
            "orchestrator: fetching source"
        );
        match AssertUnwindSafe(adapter.fetch(source)).catch_unwind().await {
            Ok(outcome) => outcome,
            Err(_) => {
                tracing::error!(source = %source.name, "orchestrator: adapter panicked");
                FetchOutcome::failed(FetchIssue {
                    kind: IssueKind::Transport,
                    message: "adapter panicked while fetching source".to_string(),
                })
            }
        }
    }

    /// Dedup, persist, and audit one source's fetch outcome.
    async fn process_source(&self, source: &Source, fetched: FetchOutcome) -> SourceReport {
        let mut messages = fetched.errors();
        let mut failed = fetched.is_source_failure();
        let mut stored = 0;
        let mut duplicates = 0;

        if !fetched.candidates.is_empty() {
            match self.store.list_all_opportunities().await {
                Ok(existing) => {
                    let mut index = DedupIndex::from_records(&existing);
                    for candidate in fetched.candidates {
                        if index.is_duplicate(&candidate) {
                            duplicates += 1;
                            continue;
                        }
                        match self.store.insert_opportunity(candidate).await {
                            Ok(record) => {
                                index.insert(&record.opportunity);
                                stored += 1;
                            }
                            Err(e) => {
                                tracing::error!(
                                    source = %source.name,
                                    error = %e,
                                    "orchestrator: failed to store opportunity"
                                );
                                messages.push(format!("failed to store opportunity: {e}"));
                                failed = true;
                            }
                        }
                    }
                }
                Err(e) => {
                    tracing::error!(
                        source = %source.name,
                        error = %e,
                        "orchestrator: failed to load dedup snapshot"
                    );
                    messages.push(format!("failed to load stored opportunities: {e}"));
                    failed = true;
                }
            }
        }

        let outcome = if failed {
            RunOutcome::Error
        } else {
            RunOutcome::Success
        };
        let error = (!messages.is_empty()).then(|| messages.join("; "));

        if failed {
            tracing::warn!(
                source = %source.name,
                error = error.as_deref().unwrap_or_default(),
                "orchestrator: source failed"
            );
        } else {
            tracing::info!(
                source = %source.name,
                stored,
                duplicates,
                "orchestrator: source processed"
            );
        }

        let now = Utc::now();
        let entry = ActivityRecord {
            source_id: source.id.clone(),
            outcome,
            opportunities_stored: stored,
            duplicates_filtered: duplicates,
            error_message: error.clone(),
            timestamp: now,
        };
        if let Err(e) = self.store.record_activity(entry).await {
            tracing::error!(
                source = %source.name,
                error = %e,
                "orchestrator: failed to record activity"
            );
        }
        if let Err(e) = self.store.mark_source_scraped(&source.id, now).await {
            tracing::error!(
                source = %source.name,
                error = %e,
                "orchestrator: failed to mark source scraped"
            );
        }

        SourceReport {
            outcome,
            stored,
            duplicates,
            error,
        }
    }
}
