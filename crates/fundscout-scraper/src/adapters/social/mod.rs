//! LinkedIn and Facebook sources.
//!
//! Both platforms share one flow: an authenticated API call when a usable
//! credential exists, otherwise a headless render of the public page. A
//! login wall on the rendered page is reported as [`IssueKind::AuthRequired`]
//! and nothing on it is collected.
//!
//! [`IssueKind::AuthRequired`]: crate::error::IssueKind::AuthRequired

pub mod facebook;
pub mod linkedin;
pub mod render;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};

use fundscout_core::text::{collapse_whitespace, truncate_chars};
use fundscout_core::{CandidateOpportunity, SocialPlatform, SocialPost, Source};

use self::render::PageRenderer;
use super::{resolve_credential, AdapterSettings, FetchOutcome, SourceAdapter};
use crate::client::api_client;
use crate::error::{FetchIssue, ScraperError};
use crate::extract::{
    extract_amount, extract_deadline, extract_degree_level, extract_funding_type,
    extract_subject, institution_from_text, is_funding_post, INSTITUTION_NOT_SPECIFIED,
};

pub const MAX_POSTS: usize = 10;
const POST_TITLE_CHARS: usize = 100;
const FALLBACK_CONTENT_CHARS: usize = 500;
const EPOCH_SECONDS_DIGITS: usize = 10;

/// One post as pulled from an API response or a rendered page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawPost {
    pub text: String,
    pub author: Option<String>,
    pub permalink: Option<String>,
    /// RFC 3339, `+0000`-style offsets, or epoch milliseconds.
    pub timestamp: Option<String>,
}

/// A decoded post, or why its record could not be read.
pub type PostResult = Result<RawPost, String>;

/// CSS selectors describing a platform's rendered feed.
pub struct PlatformMarkup {
    pub posts: &'static str,
    pub content: &'static str,
    pub author: &'static str,
    pub time: &'static str,
    pub time_attr: &'static str,
    pub link: &'static str,
    pub login_wall: &'static str,
}

fn platform_label(platform: SocialPlatform) -> &'static str {
    match platform {
        SocialPlatform::Linkedin => "LinkedIn",
        SocialPlatform::Facebook => "Facebook",
    }
}

fn platform_origin(platform: SocialPlatform) -> &'static str {
    match platform {
        SocialPlatform::Linkedin => "https://www.linkedin.com",
        SocialPlatform::Facebook => "https://www.facebook.com",
    }
}

fn markup(platform: SocialPlatform) -> &'static PlatformMarkup {
    match platform {
        SocialPlatform::Linkedin => &linkedin::MARKUP,
        SocialPlatform::Facebook => &facebook::MARKUP,
    }
}

pub struct SocialAdapter {
    platform: SocialPlatform,
    client: Client,
    api_base: String,
    platform_key: Option<String>,
    renderer: Option<Arc<dyn PageRenderer>>,
}

impl SocialAdapter {
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the HTTP client cannot be constructed.
    pub fn new(
        platform: SocialPlatform,
        settings: &AdapterSettings,
        renderer: Option<Arc<dyn PageRenderer>>,
    ) -> Result<Self, ScraperError> {
        let (api_base, platform_key) = match platform {
            SocialPlatform::Linkedin => (&settings.linkedin_api_base, &settings.linkedin_api_key),
            SocialPlatform::Facebook => (&settings.graph_api_base, &settings.facebook_api_key),
        };
        Ok(Self {
            platform,
            client: api_client(settings.api_timeout_secs)?,
            api_base: api_base.trim_end_matches('/').to_string(),
            platform_key: platform_key.clone(),
            renderer,
        })
    }

    async fn collect_posts(&self, source: &Source) -> Result<Vec<PostResult>, ScraperError> {
        let credential = resolve_credential(
            source.credential.as_deref(),
            self.platform_key.as_deref(),
        );

        if let Some(token) = credential {
            tracing::debug!(
                source = %source.name,
                platform = %self.platform,
                "using platform API"
            );
            return match self.platform {
                SocialPlatform::Linkedin => {
                    linkedin::fetch_posts(&self.client, &self.api_base, &source.url, &token).await
                }
                SocialPlatform::Facebook => {
                    facebook::fetch_posts(&self.client, &self.api_base, &source.url, &token).await
                }
            };
        }

        let Some(renderer) = &self.renderer else {
            return Err(ScraperError::Config(format!(
                "no {} credential and no headless renderer configured",
                platform_label(self.platform)
            )));
        };

        tracing::debug!(
            source = %source.name,
            platform = %self.platform,
            "rendering public page"
        );
        let html = renderer.render(&source.url).await?;
        let posts = parse_rendered_posts(&html, self.platform)?;
        Ok(posts.into_iter().map(Ok).collect())
    }
}

#[async_trait]
impl SourceAdapter for SocialAdapter {
    async fn fetch(&self, source: &Source) -> FetchOutcome {
        let posts = match self.collect_posts(source).await {
            Ok(posts) => posts,
            Err(e) => {
                tracing::warn!(
                    source = %source.name,
                    platform = %self.platform,
                    error = %e,
                    "social fetch failed"
                );
                return FetchOutcome::failed(e);
            }
        };

        let mut outcome = FetchOutcome::default();
        for (index, post) in posts.into_iter().take(MAX_POSTS).enumerate() {
            match post.and_then(|post| post_to_candidate(post, source, self.platform)) {
                Ok(Some(candidate)) => outcome.candidates.push(candidate),
                Ok(None) => {}
                Err(message) => {
                    outcome
                        .issues
                        .push(FetchIssue::item(format!("post {}: {message}", index + 1)));
                }
            }
        }
        outcome
    }
}

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("valid CSS selector")
}

fn element_text(el: &ElementRef<'_>) -> String {
    collapse_whitespace(&el.text().collect::<String>())
}

/// Element text with whitespace collapsed inside each line; line breaks
/// survive so the first line can serve as a title.
fn post_text(el: &ElementRef<'_>) -> String {
    el.text()
        .collect::<String>()
        .lines()
        .map(collapse_whitespace)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Extract post-like nodes from a rendered feed.
///
/// # Errors
///
/// Returns [`ScraperError::AuthRequired`] when the page is a login wall.
pub fn parse_rendered_posts(
    html: &str,
    platform: SocialPlatform,
) -> Result<Vec<RawPost>, ScraperError> {
    let markup = markup(platform);
    let document = Html::parse_document(html);

    if document.select(&selector(markup.login_wall)).next().is_some() {
        let label = platform_label(platform);
        return Err(ScraperError::AuthRequired {
            platform: label,
            message: format!("{label} requires authentication - add valid API credentials"),
        });
    }

    let content_sel = selector(markup.content);
    let author_sel = selector(markup.author);
    let time_sel = selector(markup.time);
    let link_sel = selector(markup.link);

    let posts = document
        .select(&selector(markup.posts))
        .filter_map(|post| {
            let raw = element_text(&post);
            if !is_funding_post(&raw) {
                return None;
            }
            let text = post
                .select(&content_sel)
                .map(|c| post_text(&c))
                .find(|c| !c.is_empty())
                .unwrap_or_else(|| truncate_chars(&post_text(&post), FALLBACK_CONTENT_CHARS));
            let author = post
                .select(&author_sel)
                .map(|a| element_text(&a))
                .find(|a| !a.is_empty());
            let time = post.select(&time_sel).next();
            let timestamp = time
                .and_then(|t| t.value().attr(markup.time_attr))
                .map(str::to_string);
            let permalink = post
                .select(&link_sel)
                .next()
                .and_then(|l| l.value().attr("href"))
                .map(str::to_string);
            Some(RawPost {
                text,
                author,
                permalink,
                timestamp,
            })
        })
        .take(MAX_POSTS)
        .collect();
    Ok(posts)
}

/// Parse the timestamp shapes the two platforms produce. Bare integers of
/// up to ten digits are epoch seconds, longer ones epoch milliseconds.
#[must_use]
pub fn parse_post_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if raw.chars().all(|c| c.is_ascii_digit()) {
        let value = raw.parse::<i64>().ok()?;
        return if raw.len() <= EPOCH_SECONDS_DIGITS {
            DateTime::from_timestamp(value, 0)
        } else {
            DateTime::from_timestamp_millis(value)
        };
    }
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%z"))
        .ok()
        .map(|d| d.with_timezone(&Utc))
}

fn resolve_permalink(link: &str, platform: SocialPlatform) -> Option<String> {
    url::Url::parse(platform_origin(platform))
        .ok()?
        .join(link.trim())
        .ok()
        .map(String::from)
}

/// `Ok(None)` for posts that are not about funding; `Err` for posts that
/// cannot be turned into a record at all.
fn post_to_candidate(
    post: RawPost,
    source: &Source,
    platform: SocialPlatform,
) -> Result<Option<CandidateOpportunity>, String> {
    let text = post.text.trim().to_string();
    if text.is_empty() {
        return Err("post has no text".to_string());
    }
    if !is_funding_post(&text) {
        return Ok(None);
    }

    let title = text
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .map(|l| truncate_chars(l, POST_TITLE_CHARS))
        .unwrap_or_default();

    let source_url = post
        .permalink
        .as_deref()
        .filter(|l| !l.trim().is_empty())
        .and_then(|l| resolve_permalink(l, platform))
        .unwrap_or_else(|| source.url.clone());

    Ok(Some(
        CandidateOpportunity {
            title,
            description: text.clone(),
            institution: institution_from_text(&text)
                .unwrap_or_else(|| INSTITUTION_NOT_SPECIFIED.to_string()),
            deadline: extract_deadline(&text),
            amount: extract_amount(&text),
            degree_level: extract_degree_level(&text),
            subject: extract_subject(&text),
            funding_type: extract_funding_type(&text),
            source_url,
            source_name: source.name.clone(),
            social: Some(SocialPost {
                post_date: post.timestamp.as_deref().and_then(parse_post_date),
                professor_name: post.author,
                professor_profile: Some(source.url.clone()),
                social_platform: platform,
                original_post: text,
            }),
        }
        .normalized(),
    ))
}

#[cfg(test)]
#[path = "social_test.rs"]
mod tests;
