//! Government/public JSON APIs. The endpoint is picked from the source URL's
//! host; each API maps its native records straight onto candidates.

pub mod grants_gov;
pub mod nih_reporter;
pub mod sam_gov;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde_json::Value;

use fundscout_core::{Source, AMOUNT_VARIES, DEADLINE_NOT_SPECIFIED};

use super::{resolve_credential, AdapterSettings, FetchOutcome, SourceAdapter};
use crate::client::api_client;
use crate::error::{FetchIssue, ScraperError};

/// Which modeled API a government source points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GovernmentApi {
    GrantsGov,
    NihReporter,
    SamGov,
}

impl GovernmentApi {
    /// Match on the URL host; `None` for hosts with no mapping.
    #[must_use]
    pub fn detect(url: &str) -> Option<Self> {
        let host = url::Url::parse(url).ok()?.host_str()?.to_lowercase();
        let is = |domain: &str| host == domain || host.ends_with(&format!(".{domain}"));
        if is("grants.gov") {
            Some(Self::GrantsGov)
        } else if is("nih.gov") {
            Some(Self::NihReporter)
        } else if is("sam.gov") {
            Some(Self::SamGov)
        } else {
            None
        }
    }
}

pub struct GovernmentApiAdapter {
    client: Client,
    grants_gov_base: String,
    nih_reporter_base: String,
    sam_gov_base: String,
    sam_api_key: Option<String>,
}

impl GovernmentApiAdapter {
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the HTTP client cannot be constructed.
    pub fn new(settings: &AdapterSettings) -> Result<Self, ScraperError> {
        Ok(Self {
            client: api_client(settings.api_timeout_secs)?,
            grants_gov_base: settings.grants_gov_base.trim_end_matches('/').to_string(),
            nih_reporter_base: settings.nih_reporter_base.trim_end_matches('/').to_string(),
            sam_gov_base: settings.sam_gov_base.trim_end_matches('/').to_string(),
            sam_api_key: settings.sam_api_key.clone(),
        })
    }
}

/// Mapped candidates plus item-level problems from one API response.
pub type Mapped = (Vec<fundscout_core::CandidateOpportunity>, Vec<FetchIssue>);

#[async_trait]
impl SourceAdapter for GovernmentApiAdapter {
    async fn fetch(&self, source: &Source) -> FetchOutcome {
        let Some(api) = GovernmentApi::detect(&source.url) else {
            return FetchOutcome::failed(FetchIssue::config(format!(
                "no API mapping for {}",
                source.url
            )));
        };

        let result = match api {
            GovernmentApi::GrantsGov => {
                grants_gov::fetch(&self.client, &self.grants_gov_base).await
            }
            GovernmentApi::NihReporter => {
                nih_reporter::fetch(&self.client, &self.nih_reporter_base).await
            }
            GovernmentApi::SamGov => {
                let key = resolve_credential(
                    source.credential.as_deref(),
                    self.sam_api_key.as_deref(),
                );
                match key {
                    Some(key) => sam_gov::fetch(&self.client, &self.sam_gov_base, &key).await,
                    None => Err(ScraperError::AuthRequired {
                        platform: "SAM.gov",
                        message: "SAM.gov requires an API key - set SAM_API_KEY or a source credential"
                            .to_string(),
                    }),
                }
            }
        };

        match result {
            Ok((candidates, issues)) => {
                tracing::debug!(
                    source = %source.name,
                    api = ?api,
                    count = candidates.len(),
                    "api records mapped"
                );
                FetchOutcome { candidates, issues }
            }
            Err(e) => {
                tracing::warn!(
                    source = %source.name,
                    api = ?api,
                    error = %e,
                    "api fetch failed"
                );
                FetchOutcome::failed(e)
            }
        }
    }
}

/// `1234567` → `"$1,234,567"`.
pub(crate) fn format_usd(amount: u64) -> String {
    let digits = amount.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    out.push('$');
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// A dollar amount from a JSON number or a numeric string, else the
/// "Amount varies" sentinel.
pub(crate) fn amount_from_value(value: Option<&Value>) -> String {
    let amount = match value {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(round_dollars)),
        Some(Value::String(s)) => {
            let digits: String = s
                .split('.')
                .next()
                .unwrap_or_default()
                .chars()
                .filter(char::is_ascii_digit)
                .collect();
            digits.parse::<u64>().ok()
        }
        _ => None,
    };
    amount
        .filter(|n| *n > 0)
        .map_or_else(|| AMOUNT_VARIES.to_string(), format_usd)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn round_dollars(f: f64) -> u64 {
    f.round() as u64
}

/// Re-render an API date in `format` as "Month D, YYYY". Unparseable
/// values are kept verbatim; missing ones become "Not specified".
pub(crate) fn render_date(raw: Option<&str>, format: &str) -> String {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => DEADLINE_NOT_SPECIFIED.to_string(),
        Some(s) => NaiveDate::parse_from_str(s, format)
            .map_or_else(|_| s.to_string(), |d| d.format("%B %-d, %Y").to_string()),
    }
}

/// Record ids arrive as strings from some APIs and numbers from others.
pub(crate) fn id_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
