use thiserror::Error;
use tokio_cron_scheduler::JobSchedulerError;

use fundscout_store::StoreError;

/// The only way a whole pass fails; everything per-source is folded into
/// the run summary instead.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("failed to load active sources: {0}")]
    Sources(#[from] StoreError),
}

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("a collection run is already in progress")]
    AlreadyRunning,

    #[error(transparent)]
    Run(#[from] OrchestratorError),

    #[error("cron scheduler error: {0}")]
    Cron(#[from] JobSchedulerError),
}
