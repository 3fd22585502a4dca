//! Integration tests for `Orchestrator::run_all`.
//!
//! Adapters are stubbed per source id and the in-memory store stands in for
//! persistence, so these cover batching, dedup, and activity bookkeeping
//! without any network traffic.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Barrier;

use fundscout_core::{
    ActivityRecord, CandidateOpportunity, DegreeLevel, FundingType, PersistedOpportunity,
    RunOutcome, RunSummary, Source, SourceCategory, Subject,
};
use fundscout_pipeline::{Orchestrator, RunSettings};
use fundscout_scraper::{
    AdapterProvider, FetchIssue, FetchOutcome, IssueKind, ScraperError, SourceAdapter,
};
use fundscout_store::{MemoryStore, OpportunityStore, StoreError};

/// What the stub adapter returns for one source.
#[derive(Clone, Default)]
enum Scripted {
    #[default]
    Empty,
    Candidates(Vec<CandidateOpportunity>, Vec<FetchIssue>),
    Fails(u16),
    Panics,
}

#[derive(Default)]
struct StubAdapters {
    scripts: HashMap<String, Scripted>,
}

impl StubAdapters {
    fn with(mut self, source_id: &str, script: Scripted) -> Self {
        self.scripts.insert(source_id.to_string(), script);
        self
    }
}

#[async_trait]
impl SourceAdapter for StubAdapters {
    async fn fetch(&self, source: &Source) -> FetchOutcome {
        match self.scripts.get(&source.id).cloned().unwrap_or_default() {
            Scripted::Empty => FetchOutcome::default(),
            Scripted::Candidates(candidates, issues) => FetchOutcome { candidates, issues },
            Scripted::Fails(status) => FetchOutcome::failed(ScraperError::UnexpectedStatus {
                status,
                url: source.url.clone(),
            }),
            Scripted::Panics => panic!("adapter blew up on {}", source.id),
        }
    }
}

struct StubProvider(Arc<StubAdapters>);

impl AdapterProvider for StubProvider {
    fn adapter_for(&self, _source: &Source) -> Arc<dyn SourceAdapter> {
        self.0.clone()
    }
}

/// Each fetch waits for the barrier's other parties and fails with a
/// timeout if they never arrive.
struct RendezvousAdapter {
    barrier: Barrier,
}

#[async_trait]
impl SourceAdapter for RendezvousAdapter {
    async fn fetch(&self, source: &Source) -> FetchOutcome {
        match tokio::time::timeout(Duration::from_secs(2), self.barrier.wait()).await {
            Ok(_) => FetchOutcome::default(),
            Err(_) => FetchOutcome::failed(ScraperError::Timeout {
                url: source.url.clone(),
                secs: 2,
            }),
        }
    }
}

struct SharedProvider(Arc<dyn SourceAdapter>);

impl AdapterProvider for SharedProvider {
    fn adapter_for(&self, _source: &Source) -> Arc<dyn SourceAdapter> {
        self.0.clone()
    }
}

/// Which store call is down.
#[derive(Clone, Copy)]
enum Outage {
    Snapshot,
    Inserts,
}

/// A [`MemoryStore`] with one operation failing.
struct DegradedStore {
    inner: MemoryStore,
    outage: Outage,
}

#[async_trait]
impl OpportunityStore for DegradedStore {
    async fn list_active_sources(&self) -> Result<Vec<Source>, StoreError> {
        self.inner.list_active_sources().await
    }

    async fn list_all_opportunities(&self) -> Result<Vec<PersistedOpportunity>, StoreError> {
        match self.outage {
            Outage::Snapshot => Err(StoreError::Unavailable("replica lagging".to_string())),
            Outage::Inserts => self.inner.list_all_opportunities().await,
        }
    }

    async fn insert_opportunity(
        &self,
        candidate: CandidateOpportunity,
    ) -> Result<PersistedOpportunity, StoreError> {
        match self.outage {
            Outage::Inserts => Err(StoreError::Unavailable("disk full".to_string())),
            Outage::Snapshot => self.inner.insert_opportunity(candidate).await,
        }
    }

    async fn record_activity(&self, entry: ActivityRecord) -> Result<(), StoreError> {
        self.inner.record_activity(entry).await
    }

    async fn mark_source_scraped(
        &self,
        source_id: &str,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.inner.mark_source_scraped(source_id, at).await
    }

    async fn list_activity(&self, limit: usize) -> Result<Vec<ActivityRecord>, StoreError> {
        self.inner.list_activity(limit).await
    }
}

fn source(id: &str) -> Source {
    Source {
        id: id.to_string(),
        name: format!("Source {id}"),
        url: format!("https://{id}.example.edu/funding"),
        category: SourceCategory::AcademicSite,
        is_active: true,
        credential: None,
        last_scraped: None,
    }
}

fn candidate(title: &str, institution: &str) -> CandidateOpportunity {
    CandidateOpportunity {
        title: title.to_string(),
        description: format!("{title} for graduate students."),
        institution: institution.to_string(),
        deadline: "Not specified".to_string(),
        amount: "Amount varies".to_string(),
        degree_level: DegreeLevel::PhD,
        subject: Subject::AllFields,
        funding_type: FundingType::Fellowship,
        source_url: "https://example.edu/funding".to_string(),
        source_name: "Example".to_string(),
        social: None,
    }
}

fn no_delay(batch_size: usize) -> RunSettings {
    RunSettings {
        batch_size,
        batch_delay: Duration::ZERO,
    }
}

fn orchestrator(
    store: &Arc<MemoryStore>,
    adapters: StubAdapters,
    settings: RunSettings,
) -> Orchestrator {
    Orchestrator::new(
        store.clone(),
        Arc::new(StubProvider(Arc::new(adapters))),
        settings,
    )
}

// ---------------------------------------------------------------------------
// Batch isolation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn failing_source_does_not_affect_batch_mates() {
    let store = Arc::new(MemoryStore::with_sources(vec![
        source("s1"),
        source("s2"),
        source("s3"),
        source("s4"),
    ]));
    let adapters = StubAdapters::default()
        .with(
            "s1",
            Scripted::Candidates(vec![candidate("Hertz Fellowship", "Hertz Foundation")], vec![]),
        )
        .with("s2", Scripted::Fails(503))
        .with(
            "s3",
            Scripted::Candidates(
                vec![candidate("Knight-Hennessy Scholars", "Stanford University")],
                vec![],
            ),
        );

    let summary = orchestrator(&store, adapters, no_delay(3))
        .run_all()
        .await
        .expect("run completes");

    assert_eq!(summary.total_sources, 4);
    assert_eq!(summary.successful_sources, 3);
    assert_eq!(summary.total_opportunities_stored, 2);
    assert_eq!(summary.total_duplicates_filtered, 0);
    assert_eq!(summary.errors.len(), 1);
    assert_eq!(summary.errors[0].source, "Source s2");
    assert!(summary.errors[0].error.contains("503"));

    let activity = store.list_activity(10).await.unwrap();
    assert_eq!(activity.len(), 4, "one activity record per source");
    let failed: Vec<_> = activity
        .iter()
        .filter(|a| a.outcome == RunOutcome::Error)
        .collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].source_id, "s2");
    assert!(failed[0].error_message.is_some());
}

#[tokio::test]
async fn panicking_adapter_is_recorded_as_source_error() {
    let store = Arc::new(MemoryStore::with_sources(vec![source("ok"), source("boom")]));
    let adapters = StubAdapters::default()
        .with(
            "ok",
            Scripted::Candidates(
                vec![candidate("Gates Cambridge Scholarship", "Cambridge")],
                vec![],
            ),
        )
        .with("boom", Scripted::Panics);

    let summary = orchestrator(&store, adapters, no_delay(2))
        .run_all()
        .await
        .expect("run completes");

    assert_eq!(summary.successful_sources, 1);
    assert_eq!(summary.total_opportunities_stored, 1);
    assert_eq!(summary.errors.len(), 1);
    assert_eq!(summary.errors[0].source, "Source boom");
    assert_eq!(store.list_activity(10).await.unwrap().len(), 2);
}

#[tokio::test]
async fn batch_members_are_fetched_concurrently() {
    let store = Arc::new(MemoryStore::with_sources(vec![source("left"), source("right")]));
    let adapter = Arc::new(RendezvousAdapter {
        barrier: Barrier::new(2),
    });
    let orchestrator = Orchestrator::new(
        store.clone(),
        Arc::new(SharedProvider(adapter)),
        no_delay(2),
    );

    let summary = orchestrator.run_all().await.expect("run completes");

    assert!(summary.errors.is_empty(), "errors: {:?}", summary.errors);
    assert_eq!(summary.successful_sources, 2);
}

// ---------------------------------------------------------------------------
// Store failures
// ---------------------------------------------------------------------------

async fn run_with_outage(outage: Outage) -> (Arc<DegradedStore>, RunSummary) {
    let store = Arc::new(DegradedStore {
        inner: MemoryStore::with_sources(vec![source("writes"), source("idle")]),
        outage,
    });
    let adapters = StubAdapters::default().with(
        "writes",
        Scripted::Candidates(
            vec![candidate("Hertz Graduate Fellowship", "Hertz Foundation")],
            vec![],
        ),
    );
    let orchestrator = Orchestrator::new(
        store.clone(),
        Arc::new(StubProvider(Arc::new(adapters))),
        no_delay(2),
    );
    let summary = orchestrator.run_all().await.expect("run completes");
    (store, summary)
}

#[tokio::test]
async fn failed_insert_marks_source_as_error() {
    let (store, summary) = run_with_outage(Outage::Inserts).await;

    assert_eq!(summary.total_opportunities_stored, 0);
    assert_eq!(summary.successful_sources, 1, "the idle source still succeeds");
    assert_eq!(summary.errors.len(), 1);
    assert_eq!(summary.errors[0].source, "Source writes");
    assert_eq!(
        summary.errors[0].error,
        "failed to store opportunity: store unavailable: disk full"
    );

    let activity = store.list_activity(10).await.unwrap();
    let writes = activity.iter().find(|a| a.source_id == "writes").unwrap();
    assert_eq!(writes.outcome, RunOutcome::Error);
    assert_eq!(writes.opportunities_stored, 0);
    assert_eq!(
        writes.error_message.as_deref(),
        Some("failed to store opportunity: store unavailable: disk full")
    );
}

#[tokio::test]
async fn failed_dedup_snapshot_marks_source_as_error() {
    let (store, summary) = run_with_outage(Outage::Snapshot).await;

    assert_eq!(summary.total_opportunities_stored, 0);
    assert_eq!(summary.successful_sources, 1);
    assert_eq!(summary.errors.len(), 1);
    assert_eq!(summary.errors[0].source, "Source writes");
    assert!(summary.errors[0].error.contains("replica lagging"));

    let activity = store.list_activity(10).await.unwrap();
    let writes = activity.iter().find(|a| a.source_id == "writes").unwrap();
    assert_eq!(writes.outcome, RunOutcome::Error);
    assert_eq!(
        writes.error_message.as_deref(),
        Some("failed to load stored opportunities: store unavailable: replica lagging")
    );
    assert_eq!(store.inner.opportunity_count().await, 0, "nothing stored without a snapshot");
}

// ---------------------------------------------------------------------------
// Dedup
// ---------------------------------------------------------------------------

#[tokio::test]
async fn second_run_stores_nothing_new() {
    let store = Arc::new(MemoryStore::with_sources(vec![source("a"), source("b")]));
    let adapters = StubAdapters::default()
        .with(
            "a",
            Scripted::Candidates(
                vec![
                    candidate(
                        "NSF Graduate Research Fellowship Program",
                        "National Science Foundation",
                    ),
                    candidate("Ford Foundation Predoctoral Fellowship", "National Academies"),
                ],
                vec![],
            ),
        )
        .with(
            "b",
            Scripted::Candidates(
                vec![candidate(
                    "Fulbright US Student Program",
                    "Fulbright Commission",
                )],
                vec![],
            ),
        );
    let orchestrator = orchestrator(&store, adapters, no_delay(3));

    let first = orchestrator.run_all().await.unwrap();
    assert_eq!(first.total_opportunities_stored, 3);
    assert_eq!(first.total_duplicates_filtered, 0);

    let second = orchestrator.run_all().await.unwrap();
    assert_eq!(second.total_opportunities_stored, 0);
    assert_eq!(second.total_duplicates_filtered, 3);
    assert_eq!(store.opportunity_count().await, 3);
}

#[tokio::test]
async fn later_sources_see_earlier_inserts_in_same_run() {
    let store = Arc::new(MemoryStore::with_sources(vec![source("first"), source("second")]));
    let adapters = StubAdapters::default()
        .with(
            "first",
            Scripted::Candidates(
                vec![candidate("NSF Graduate Research Fellowship Program", "NSF")],
                vec![],
            ),
        )
        .with(
            "second",
            Scripted::Candidates(
                vec![candidate("NSF Graduate Research Fellowship", "nsf")],
                vec![],
            ),
        );

    // Batch size 1 so the sources are processed in separate batches.
    let summary = orchestrator(&store, adapters, no_delay(1))
        .run_all()
        .await
        .unwrap();

    assert_eq!(summary.total_opportunities_stored, 1);
    assert_eq!(summary.total_duplicates_filtered, 1);
}

#[tokio::test]
async fn repeats_within_one_source_are_filtered() {
    let store = Arc::new(MemoryStore::with_sources(vec![source("only")]));
    let adapters = StubAdapters::default().with(
        "only",
        Scripted::Candidates(
            vec![
                candidate("Hertz Graduate Fellowship", "Hertz Foundation"),
                candidate("Hertz Graduate Fellowship", "HERTZ FOUNDATION"),
                candidate("Hertz Graduate Fellowship", "MIT"),
            ],
            vec![],
        ),
    );

    let summary = orchestrator(&store, adapters, no_delay(3))
        .run_all()
        .await
        .unwrap();

    assert_eq!(summary.total_opportunities_stored, 2);
    assert_eq!(summary.total_duplicates_filtered, 1);

    let activity = store.list_activity(1).await.unwrap();
    assert_eq!(activity[0].opportunities_stored, 2);
    assert_eq!(activity[0].duplicates_filtered, 1);
}

// ---------------------------------------------------------------------------
// Outcome classification
// ---------------------------------------------------------------------------

#[tokio::test]
async fn item_issues_and_empty_results_are_still_success() {
    let store = Arc::new(MemoryStore::with_sources(vec![source("items"), source("quiet")]));
    let adapters = StubAdapters::default().with(
        "items",
        Scripted::Candidates(
            vec![candidate("Soros Fellowship for New Americans", "Soros Foundation")],
            vec![FetchIssue::item("post 2: post has no text")],
        ),
    );

    let summary = orchestrator(&store, adapters, no_delay(3))
        .run_all()
        .await
        .unwrap();

    assert_eq!(summary.successful_sources, 2);
    assert!(summary.errors.is_empty());

    let activity = store.list_activity(10).await.unwrap();
    assert!(activity.iter().all(|a| a.outcome == RunOutcome::Success));
    let items = activity.iter().find(|a| a.source_id == "items").unwrap();
    assert_eq!(
        items.error_message.as_deref(),
        Some("post 2: post has no text")
    );
}

#[tokio::test]
async fn auth_required_fails_the_source() {
    let store = Arc::new(MemoryStore::with_sources(vec![source("gated")]));
    let adapters = StubAdapters::default().with(
        "gated",
        Scripted::Candidates(
            vec![],
            vec![FetchIssue {
                kind: IssueKind::AuthRequired,
                message: "LinkedIn requires authentication - add valid API credentials".to_string(),
            }],
        ),
    );

    let summary = orchestrator(&store, adapters, no_delay(3))
        .run_all()
        .await
        .unwrap();

    assert_eq!(summary.successful_sources, 0);
    assert_eq!(
        summary.errors[0].error,
        "LinkedIn requires authentication - add valid API credentials"
    );
}

#[tokio::test]
async fn inactive_sources_are_skipped_and_active_ones_stamped() {
    let mut inactive = source("off");
    inactive.is_active = false;
    let store = Arc::new(MemoryStore::with_sources(vec![source("on"), inactive]));

    let summary = orchestrator(&store, StubAdapters::default(), no_delay(3))
        .run_all()
        .await
        .unwrap();

    assert_eq!(summary.total_sources, 1);
    let sources = store.sources().await;
    let on = sources.iter().find(|s| s.id == "on").unwrap();
    let off = sources.iter().find(|s| s.id == "off").unwrap();
    assert!(on.last_scraped.is_some());
    assert!(off.last_scraped.is_none());
}

#[tokio::test]
async fn batches_pause_between_each_other() {
    let store = Arc::new(MemoryStore::with_sources(vec![
        source("b1"),
        source("b2"),
        source("b3"),
    ]));
    let settings = RunSettings {
        batch_size: 1,
        batch_delay: Duration::from_millis(40),
    };

    let started = tokio::time::Instant::now();
    orchestrator(&store, StubAdapters::default(), settings)
        .run_all()
        .await
        .unwrap();

    // Three batches, two pauses.
    assert!(started.elapsed() >= Duration::from_millis(80));
}
