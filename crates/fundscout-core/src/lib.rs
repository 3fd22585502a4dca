//! Shared data model and configuration for fundscout.
//!
//! Everything the adapters, the store, and the run pipeline exchange lives
//! here: sources, candidate and persisted opportunities, activity records,
//! the run summary, and the environment-driven [`AppConfig`].

pub mod activity;
pub mod app_config;
pub mod config;
pub mod opportunity;
pub mod sources;
pub mod text;

use thiserror::Error;

pub use activity::{ActivityRecord, RunOutcome, RunSummary, SourceFailure};
pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env, DEFAULT_USER_AGENT};
pub use opportunity::{
    CandidateOpportunity, DegreeLevel, FundingType, PersistedOpportunity, SocialPlatform,
    SocialPost, Subject, AMOUNT_VARIES, DEADLINE_NOT_SPECIFIED,
};
pub use sources::{load_sources, Source, SourceCategory, SourceConfig, SourcesFile};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read sources file {path}: {source}")]
    SourcesFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse sources file: {0}")]
    SourcesFileParse(#[source] serde_yaml::Error),

    #[error("invalid sources file: {0}")]
    Validation(String),
}
