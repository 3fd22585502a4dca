use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunOutcome {
    Success,
    Error,
}

impl std::fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunOutcome::Success => write!(f, "success"),
            RunOutcome::Error => write!(f, "error"),
        }
    }
}

/// Audit entry written once per (source, run). Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityRecord {
    pub source_id: String,
    pub outcome: RunOutcome,
    pub opportunities_stored: usize,
    pub duplicates_filtered: usize,
    pub error_message: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// One failed source in a [`RunSummary`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFailure {
    pub source: String,
    pub error: String,
}

/// Aggregate result of one orchestrator pass, as reported to the caller
/// of a manual run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub total_sources: usize,
    pub successful_sources: usize,
    pub total_opportunities_stored: usize,
    pub total_duplicates_filtered: usize,
    pub errors: Vec<SourceFailure>,
}
