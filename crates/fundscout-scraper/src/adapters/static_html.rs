//! Static HTML pages: one GET, then a keyword scan over headings, list
//! items, and article/section blocks.

use std::collections::HashSet;

use async_trait::async_trait;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};

use fundscout_core::text::{collapse_whitespace, truncate_with_ellipsis};
use fundscout_core::{CandidateOpportunity, Source};

use super::{FetchOutcome, SourceAdapter};
use crate::client::{page_client, success_body};
use crate::error::ScraperError;
use crate::extract::{
    extract_amount, extract_deadline, extract_degree_level, extract_funding_type,
    extract_subject, has_funding_keyword, institution_from_url,
};

const CONTAINER_SELECTOR: &str = "h1, h2, h3, h4, li, article, section";
const TITLE_SELECTOR: &str = "h1, h2, h3, h4, .title, .heading";

const MIN_BLOCK_CHARS: usize = 20;
const MAX_BLOCK_CHARS: usize = 2000;
const MIN_TITLE_CHARS: usize = 10;
const EXCERPT_TITLE_CHARS: usize = 100;

pub struct StaticHtmlAdapter {
    client: Client,
}

impl StaticHtmlAdapter {
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the HTTP client cannot be constructed.
    pub fn new(timeout_secs: u64, user_agent: &str) -> Result<Self, ScraperError> {
        Ok(Self {
            client: page_client(timeout_secs, user_agent)?,
        })
    }

    async fn fetch_page(&self, url: &str) -> Result<String, ScraperError> {
        let response = self.client.get(url).send().await?;
        success_body(response, url).await
    }
}

#[async_trait]
impl SourceAdapter for StaticHtmlAdapter {
    async fn fetch(&self, source: &Source) -> FetchOutcome {
        let html = match self.fetch_page(&source.url).await {
            Ok(html) => html,
            Err(e) => {
                tracing::warn!(
                    source = %source.name,
                    url = %source.url,
                    error = %e,
                    "static page fetch failed"
                );
                return FetchOutcome::failed(e);
            }
        };

        let candidates = parse_page(&html, source);
        tracing::debug!(source = %source.name, count = candidates.len(), "static page parsed");
        FetchOutcome {
            candidates,
            issues: Vec::new(),
        }
    }
}

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("valid CSS selector")
}

fn element_text(el: &ElementRef<'_>) -> String {
    collapse_whitespace(&el.text().collect::<String>())
}

fn is_heading(el: &ElementRef<'_>) -> bool {
    matches!(el.value().name(), "h1" | "h2" | "h3" | "h4")
}

/// Turn a fetched page into candidates, suppressing repeats of the same
/// (title, institution) pair within the page.
pub(crate) fn parse_page(html: &str, source: &Source) -> Vec<CandidateOpportunity> {
    let document = Html::parse_document(html);
    let containers = selector(CONTAINER_SELECTOR);
    let titles = selector(TITLE_SELECTOR);
    let paragraphs = selector("p");
    let institution = institution_from_url(&source.url);

    let mut candidates: Vec<CandidateOpportunity> = document
        .select(&containers)
        .filter_map(|el| {
            let text = element_text(&el);
            let len = text.chars().count();
            if !(MIN_BLOCK_CHARS..=MAX_BLOCK_CHARS).contains(&len) || !has_funding_keyword(&text)
            {
                return None;
            }

            let (title, description) = if is_heading(&el) {
                (text.clone(), following_paragraph(&el))
            } else {
                let title = el
                    .select(&titles)
                    .map(|t| element_text(&t))
                    .find(|t| !t.is_empty());
                let description = el
                    .select(&paragraphs)
                    .map(|p| element_text(&p))
                    .find(|p| !p.is_empty());
                (
                    title.unwrap_or_else(|| truncate_with_ellipsis(&text, EXCERPT_TITLE_CHARS)),
                    description,
                )
            };

            if title.chars().count() < MIN_TITLE_CHARS {
                return None;
            }

            let description = description.unwrap_or_else(|| text.clone());
            let signal = format!("{title} {description} {text}");

            Some(
                CandidateOpportunity {
                    deadline: extract_deadline(&signal),
                    amount: extract_amount(&signal),
                    degree_level: extract_degree_level(&signal),
                    subject: extract_subject(&signal),
                    funding_type: extract_funding_type(&signal),
                    title,
                    description,
                    institution: institution.clone(),
                    source_url: source.url.clone(),
                    source_name: source.name.clone(),
                    social: None,
                }
                .normalized(),
            )
        })
        .collect();

    let mut seen = HashSet::new();
    candidates.retain(|c| seen.insert((c.title.to_lowercase(), c.institution.to_lowercase())));
    candidates
}

/// The paragraph right after a heading, if that is what follows it.
fn following_paragraph(heading: &ElementRef<'_>) -> Option<String> {
    heading
        .next_siblings()
        .filter_map(ElementRef::wrap)
        .next()
        .filter(|sibling| sibling.value().name() == "p")
        .map(|p| element_text(&p))
        .filter(|p| !p.is_empty())
}
