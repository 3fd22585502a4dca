//! Single-flight run control plus the two cron cadences.
//!
//! A [`Scheduler`] owns the "run in progress" flag. Manual triggers that
//! find it set fail with [`SchedulerError::AlreadyRunning`]; timer fires
//! that find it set are skipped with an info log. The flag is released by a
//! drop guard, so it resets even when a pass errors or panics.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use fundscout_core::{AppConfig, RunSummary};

use crate::error::SchedulerError;
use crate::orchestrator::Orchestrator;

const DEFAULT_INTERVAL_CRON: &str = "0 0 */6 * * *";
const DEFAULT_DAILY_CRON: &str = "0 0 6 * * *";

/// Cron expressions (6-field, seconds first, UTC) for the two cadences.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cadences {
    pub interval: String,
    pub daily: String,
}

impl Cadences {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            interval: config.interval_cron.clone(),
            daily: config.daily_cron.clone(),
        }
    }
}

impl Default for Cadences {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL_CRON.to_string(),
            daily: DEFAULT_DAILY_CRON.to_string(),
        }
    }
}

/// Clears the running flag when dropped.
struct RunGuard(Arc<AtomicBool>);

impl RunGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(Arc::clone(flag)))
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct Scheduler {
    orchestrator: Arc<Orchestrator>,
    running: Arc<AtomicBool>,
    cadences: Cadences,
    cron: Mutex<Option<JobScheduler>>,
}

impl Scheduler {
    #[must_use]
    pub fn new(orchestrator: Arc<Orchestrator>, cadences: Cadences) -> Self {
        Self {
            orchestrator,
            running: Arc::new(AtomicBool::new(false)),
            cadences,
            cron: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Manual trigger. Never queues or waits behind an in-flight pass.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::AlreadyRunning`] if a pass is in progress,
    /// or [`SchedulerError::Run`] if the pass itself fails.
    pub async fn run_once(&self) -> Result<RunSummary, SchedulerError> {
        let Some(_guard) = RunGuard::acquire(&self.running) else {
            return Err(SchedulerError::AlreadyRunning);
        };
        tracing::info!("scheduler: manual run started");
        Ok(self.orchestrator.run_all().await?)
    }

    /// Register both cadences and start the cron scheduler. Calling it again
    /// while a schedule is active does nothing and returns `false`.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::Cron`] if a cron expression is invalid or
    /// the scheduler cannot start.
    pub async fn start_schedule(&self) -> Result<bool, SchedulerError> {
        let mut cron = self.cron.lock().await;
        if cron.is_some() {
            tracing::debug!("scheduler: schedule already active");
            return Ok(false);
        }

        let scheduler = JobScheduler::new().await?;
        self.register_cadence(&scheduler, "interval", &self.cadences.interval)
            .await?;
        self.register_cadence(&scheduler, "daily", &self.cadences.daily)
            .await?;
        scheduler.start().await?;

        tracing::info!(
            interval = %self.cadences.interval,
            daily = %self.cadences.daily,
            "scheduler: schedule started"
        );
        *cron = Some(scheduler);
        Ok(true)
    }

    pub async fn is_scheduled(&self) -> bool {
        self.cron.lock().await.is_some()
    }

    /// Stop the cron scheduler if one is running. In-flight passes are not
    /// cancelled.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::Cron`] if the scheduler fails to shut down.
    pub async fn shutdown(&self) -> Result<(), SchedulerError> {
        if let Some(mut scheduler) = self.cron.lock().await.take() {
            scheduler.shutdown().await?;
            tracing::info!("scheduler: schedule stopped");
        }
        Ok(())
    }

    async fn register_cadence(
        &self,
        scheduler: &JobScheduler,
        cadence: &'static str,
        expression: &str,
    ) -> Result<(), JobSchedulerError> {
        let orchestrator = Arc::clone(&self.orchestrator);
        let running = Arc::clone(&self.running);

        let job = Job::new_async(expression, move |_uuid, _lock| {
            let orchestrator = Arc::clone(&orchestrator);
            let running = Arc::clone(&running);

            Box::pin(async move {
                scheduled_run(&orchestrator, &running, cadence).await;
            })
        })?;

        scheduler.add(job).await?;
        Ok(())
    }
}

/// One timer fire: run unless a pass is already in progress.
async fn scheduled_run(orchestrator: &Orchestrator, running: &Arc<AtomicBool>, cadence: &str) {
    let Some(_guard) = RunGuard::acquire(running) else {
        tracing::info!(cadence, "scheduler: run already in progress; skipping");
        return;
    };

    tracing::info!(cadence, "scheduler: starting scheduled run");
    match orchestrator.run_all().await {
        Ok(summary) => tracing::info!(
            cadence,
            stored = summary.total_opportunities_stored,
            duplicates = summary.total_duplicates_filtered,
            failed = summary.errors.len(),
            "scheduler: scheduled run complete"
        ),
        Err(e) => tracing::error!(cadence, error = %e, "scheduler: scheduled run failed"),
    }
}
