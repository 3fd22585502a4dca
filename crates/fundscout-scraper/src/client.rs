use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ScraperError;

const CONNECT_TIMEOUT_SECS: u64 = 10;

/// User agent sent to the JSON APIs, which want an honest client name.
pub const API_USER_AGENT: &str = concat!("fundscout/", env!("CARGO_PKG_VERSION"));

/// Client for HTML pages: browser user agent plus the accept headers a real
/// browser sends, so academic CMSes serve the full page.
///
/// # Errors
///
/// Returns [`ScraperError::Http`] if the client cannot be constructed.
pub fn page_client(timeout_secs: u64, user_agent: &str) -> Result<Client, ScraperError> {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
        ),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));

    let client = Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
        .user_agent(user_agent)
        .default_headers(headers)
        .redirect(reqwest::redirect::Policy::limited(5))
        .build()?;
    Ok(client)
}

/// Client for JSON APIs.
///
/// # Errors
///
/// Returns [`ScraperError::Http`] if the client cannot be constructed.
pub fn api_client(timeout_secs: u64) -> Result<Client, ScraperError> {
    let client = Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
        .user_agent(API_USER_AGENT)
        .build()?;
    Ok(client)
}

/// Read the body of a 2xx response; anything else is
/// [`ScraperError::UnexpectedStatus`].
pub(crate) async fn success_body(response: Response, url: &str) -> Result<String, ScraperError> {
    let status = response.status();
    if !status.is_success() {
        return Err(ScraperError::UnexpectedStatus {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }
    Ok(response.text().await?)
}

pub(crate) fn parse_json<T: DeserializeOwned>(
    body: &str,
    context: &str,
) -> Result<T, ScraperError> {
    serde_json::from_str(body).map_err(|source| ScraperError::Deserialize {
        context: context.to_string(),
        source,
    })
}

/// Decode one element of a record array. The error names the record's
/// 1-based position so it can be reported as an item issue.
pub(crate) fn decode_record<T: DeserializeOwned>(
    value: Value,
    label: &str,
    index: usize,
) -> Result<T, String> {
    serde_json::from_value(value)
        .map_err(|e| format!("{label} record {} is malformed: {e}", index + 1))
}
