pub mod adapters;
pub mod client;
pub mod error;
pub mod extract;

pub use adapters::{
    AdapterProvider, AdapterRegistry, AdapterSettings, BrowserlessRenderer, FetchOutcome,
    GovernmentApiAdapter, PageRenderer, SocialAdapter, SourceAdapter, StaticHtmlAdapter,
};
pub use error::{FetchIssue, IssueKind, ScraperError};
