//! Source adapters and the category dispatch table.
//!
//! One adapter type per source category, all behind [`SourceAdapter`].
//! [`AdapterRegistry`] maps a [`SourceCategory`] to its adapter.

pub mod json_api;
pub mod social;
pub mod static_html;

use std::sync::Arc;

use async_trait::async_trait;
use fundscout_core::{AppConfig, CandidateOpportunity, SocialPlatform, Source, SourceCategory};

use crate::error::{FetchIssue, ScraperError};

pub use json_api::GovernmentApiAdapter;
pub use social::render::{BrowserlessRenderer, PageRenderer};
pub use social::SocialAdapter;
pub use static_html::StaticHtmlAdapter;

/// What one adapter call produced: whatever candidates it could build plus
/// every problem it hit along the way.
#[derive(Debug, Default)]
pub struct FetchOutcome {
    pub candidates: Vec<CandidateOpportunity>,
    pub issues: Vec<FetchIssue>,
}

impl FetchOutcome {
    /// A source that produced nothing because of `err`.
    #[must_use]
    pub fn failed(err: impl Into<FetchIssue>) -> Self {
        Self {
            candidates: Vec::new(),
            issues: vec![err.into()],
        }
    }

    /// `true` when any issue is source-level. Item-level issues alone leave
    /// the source successful.
    #[must_use]
    pub fn is_source_failure(&self) -> bool {
        self.issues.iter().any(FetchIssue::is_source_failure)
    }

    /// Human-readable issue messages, in the order they were hit.
    #[must_use]
    pub fn errors(&self) -> Vec<String> {
        self.issues.iter().map(ToString::to_string).collect()
    }
}

/// Fetch one source and turn its content into candidates.
///
/// Implementations never return an error: transport, parse, and per-item
/// failures all land in [`FetchOutcome::issues`].
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    async fn fetch(&self, source: &Source) -> FetchOutcome;
}

/// Chooses the adapter for a source.
pub trait AdapterProvider: Send + Sync {
    fn adapter_for(&self, source: &Source) -> Arc<dyn SourceAdapter>;
}

/// Timeouts, endpoints, and platform-wide credentials for every adapter.
#[derive(Clone)]
pub struct AdapterSettings {
    pub user_agent: String,
    pub http_timeout_secs: u64,
    pub api_timeout_secs: u64,
    pub render_timeout_secs: u64,
    pub render_settle_ms: u64,
    pub browserless_url: Option<String>,
    pub browserless_token: Option<String>,
    pub grants_gov_base: String,
    pub nih_reporter_base: String,
    pub sam_gov_base: String,
    pub graph_api_base: String,
    pub linkedin_api_base: String,
    pub linkedin_api_key: Option<String>,
    pub facebook_api_key: Option<String>,
    pub sam_api_key: Option<String>,
}

impl AdapterSettings {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            http_timeout_secs: config.http_timeout_secs,
            api_timeout_secs: config.api_timeout_secs,
            render_timeout_secs: config.render_timeout_secs,
            render_settle_ms: config.render_settle_ms,
            browserless_url: config.browserless_url.clone(),
            browserless_token: config.browserless_token.clone(),
            linkedin_api_key: config.linkedin_api_key.clone(),
            facebook_api_key: config.facebook_api_key.clone(),
            sam_api_key: config.sam_api_key.clone(),
            ..Self::default()
        }
    }
}

impl Default for AdapterSettings {
    fn default() -> Self {
        Self {
            user_agent: fundscout_core::DEFAULT_USER_AGENT.to_string(),
            http_timeout_secs: 15,
            api_timeout_secs: 15,
            render_timeout_secs: 30,
            render_settle_ms: 3000,
            browserless_url: None,
            browserless_token: None,
            grants_gov_base: "https://api.grants.gov".to_string(),
            nih_reporter_base: "https://api.reporter.nih.gov".to_string(),
            sam_gov_base: "https://api.sam.gov".to_string(),
            graph_api_base: "https://graph.facebook.com".to_string(),
            linkedin_api_base: "https://api.linkedin.com".to_string(),
            linkedin_api_key: None,
            facebook_api_key: None,
            sam_api_key: None,
        }
    }
}

impl std::fmt::Debug for AdapterSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "[redacted]");
        f.debug_struct("AdapterSettings")
            .field("user_agent", &self.user_agent)
            .field("http_timeout_secs", &self.http_timeout_secs)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("render_timeout_secs", &self.render_timeout_secs)
            .field("render_settle_ms", &self.render_settle_ms)
            .field("browserless_url", &self.browserless_url)
            .field("browserless_token", &redact(&self.browserless_token))
            .field("grants_gov_base", &self.grants_gov_base)
            .field("nih_reporter_base", &self.nih_reporter_base)
            .field("sam_gov_base", &self.sam_gov_base)
            .field("graph_api_base", &self.graph_api_base)
            .field("linkedin_api_base", &self.linkedin_api_base)
            .field("linkedin_api_key", &redact(&self.linkedin_api_key))
            .field("facebook_api_key", &redact(&self.facebook_api_key))
            .field("sam_api_key", &redact(&self.sam_api_key))
            .finish()
    }
}

/// Category dispatch table over one shared instance per adapter type.
pub struct AdapterRegistry {
    static_html: Arc<StaticHtmlAdapter>,
    government: Arc<GovernmentApiAdapter>,
    linkedin: Arc<SocialAdapter>,
    facebook: Arc<SocialAdapter>,
}

impl AdapterRegistry {
    /// Build every adapter. A headless renderer is wired in when
    /// `browserless_url` is set.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if an HTTP client cannot be constructed.
    pub fn new(settings: &AdapterSettings) -> Result<Self, ScraperError> {
        let renderer = match &settings.browserless_url {
            Some(url) => {
                let renderer: Arc<dyn PageRenderer> = Arc::new(BrowserlessRenderer::new(
                    url,
                    settings.browserless_token.as_deref(),
                    settings.render_timeout_secs,
                    settings.render_settle_ms,
                )?);
                Some(renderer)
            }
            None => None,
        };
        Self::with_renderer(settings, renderer)
    }

    /// Build every adapter with an explicit renderer (or none).
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if an HTTP client cannot be constructed.
    pub fn with_renderer(
        settings: &AdapterSettings,
        renderer: Option<Arc<dyn PageRenderer>>,
    ) -> Result<Self, ScraperError> {
        Ok(Self {
            static_html: Arc::new(StaticHtmlAdapter::new(
                settings.http_timeout_secs,
                &settings.user_agent,
            )?),
            government: Arc::new(GovernmentApiAdapter::new(settings)?),
            linkedin: Arc::new(SocialAdapter::new(
                SocialPlatform::Linkedin,
                settings,
                renderer.clone(),
            )?),
            facebook: Arc::new(SocialAdapter::new(
                SocialPlatform::Facebook,
                settings,
                renderer,
            )?),
        })
    }
}

impl AdapterProvider for AdapterRegistry {
    fn adapter_for(&self, source: &Source) -> Arc<dyn SourceAdapter> {
        match source.category {
            SourceCategory::AcademicSite | SourceCategory::GenericHttp => self.static_html.clone(),
            SourceCategory::GovernmentApi => self.government.clone(),
            SourceCategory::SocialLinkedin => self.linkedin.clone(),
            SourceCategory::SocialFacebook => self.facebook.clone(),
        }
    }
}

/// Values people leave in config templates instead of a real token.
fn is_placeholder_credential(value: &str) -> bool {
    let lower = value.trim().to_lowercase();
    lower.is_empty()
        || lower.starts_with("encrypted_")
        || lower.starts_with("your_")
        || lower.starts_with("placeholder")
        || lower.contains("api_key_here")
}

/// The source's own credential if usable, else the platform-wide key.
pub(crate) fn resolve_credential(
    source_credential: Option<&str>,
    platform_key: Option<&str>,
) -> Option<String> {
    [source_credential, platform_key]
        .into_iter()
        .flatten()
        .find(|v| !is_placeholder_credential(v))
        .map(|v| v.trim().to_string())
}
