use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{message}")]
    AuthRequired {
        platform: &'static str,
        message: String,
    },

    #[error("render failed: {0}")]
    Render(String),

    #[error("timed out after {secs}s fetching {url}")]
    Timeout { url: String, secs: u64 },

    #[error("{0}")]
    Config(String),
}

/// How a fetch problem counts against its source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueKind {
    /// Network failure, timeout, or a non-2xx status.
    Transport,
    /// Malformed response body.
    Parse,
    /// Gated content without usable credentials.
    AuthRequired,
    /// The source cannot be handled as configured.
    Config,
    /// One record could not be built; the rest of the source still counts.
    Item,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchIssue {
    pub kind: IssueKind,
    pub message: String,
}

impl FetchIssue {
    pub fn item(message: impl Into<String>) -> Self {
        Self {
            kind: IssueKind::Item,
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self {
            kind: IssueKind::Config,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn is_source_failure(&self) -> bool {
        self.kind != IssueKind::Item
    }
}

impl std::fmt::Display for FetchIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl From<ScraperError> for FetchIssue {
    fn from(err: ScraperError) -> Self {
        let kind = match &err {
            ScraperError::Http(_)
            | ScraperError::UnexpectedStatus { .. }
            | ScraperError::Render(_)
            | ScraperError::Timeout { .. } => IssueKind::Transport,
            ScraperError::Deserialize { .. } => IssueKind::Parse,
            ScraperError::AuthRequired { .. } => IssueKind::AuthRequired,
            ScraperError::Config(_) => IssueKind::Config,
        };
        Self {
            kind,
            message: err.to_string(),
        }
    }
}
