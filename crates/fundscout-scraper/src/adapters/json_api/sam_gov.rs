use chrono::{Duration, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use fundscout_core::CandidateOpportunity;

use super::{amount_from_value, render_date, Mapped};
use crate::client::{decode_record, parse_json, success_body};
use crate::error::{FetchIssue, ScraperError};
use crate::extract::{extract_degree_level, extract_funding_type, extract_subject};

const LOOKBACK_DAYS: i64 = 90;
const SEARCH_LIMIT: &str = "20";
const SOURCE_NAME: &str = "SAM.gov";
const DEFAULT_AGENCY: &str = "Federal Agency";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    /// Decoded one by one so a malformed notice only costs that notice.
    #[serde(default)]
    pub opportunities_data: Vec<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notice {
    #[serde(default)]
    pub notice_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub full_parent_path_name: Option<String>,
    #[serde(default, rename = "responseDeadLine")]
    pub response_deadline: Option<String>,
    #[serde(default)]
    pub award: Option<Award>,
    #[serde(default)]
    pub ui_link: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Award {
    #[serde(default)]
    pub amount: Option<Value>,
}

pub(crate) async fn fetch(
    client: &Client,
    base: &str,
    api_key: &str,
) -> Result<Mapped, ScraperError> {
    let url = format!("{base}/opportunities/v2/search");
    let today = Utc::now().date_naive();
    let posted_from = (today - Duration::days(LOOKBACK_DAYS))
        .format("%m/%d/%Y")
        .to_string();
    let posted_to = today.format("%m/%d/%Y").to_string();

    let response = client
        .get(&url)
        .query(&[
            ("api_key", api_key),
            ("postedFrom", posted_from.as_str()),
            ("postedTo", posted_to.as_str()),
            ("limit", SEARCH_LIMIT),
        ])
        .send()
        .await?;

    let status = response.status();
    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        return Err(ScraperError::AuthRequired {
            platform: "SAM.gov",
            message: format!("SAM.gov rejected the API key (HTTP {})", status.as_u16()),
        });
    }
    let text = success_body(response, &url).await?;
    let parsed: SearchResponse = parse_json(&text, "SAM.gov opportunities search")?;
    Ok(map_response(parsed))
}

#[must_use]
pub fn map_response(response: SearchResponse) -> Mapped {
    let mut candidates = Vec::new();
    let mut issues = Vec::new();
    for (index, notice) in response.opportunities_data.into_iter().enumerate() {
        match decode_record::<Notice>(notice, "SAM.gov", index).and_then(map_notice) {
            Ok(candidate) => candidates.push(candidate),
            Err(message) => issues.push(FetchIssue::item(message)),
        }
    }
    (candidates, issues)
}

fn map_notice(notice: Notice) -> Result<CandidateOpportunity, String> {
    let title = notice
        .title
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| {
            format!(
                "SAM.gov notice {} has no title",
                notice.notice_id.as_deref().unwrap_or("(no id)")
            )
        })?;

    // "DEPT OF DEFENSE.DEPT OF THE ARMY.AMC" -> "DEPT OF DEFENSE"
    let institution = notice
        .full_parent_path_name
        .as_deref()
        .and_then(|p| p.split('.').next())
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .unwrap_or(DEFAULT_AGENCY)
        .to_string();

    let deadline_date = notice
        .response_deadline
        .as_deref()
        .map(|d| d.get(..10).unwrap_or(d));

    let source_url = notice
        .ui_link
        .filter(|l| !l.trim().is_empty())
        .or_else(|| {
            notice
                .notice_id
                .as_ref()
                .map(|id| format!("https://sam.gov/opp/{id}/view"))
        })
        .ok_or_else(|| format!("SAM.gov notice \"{title}\" has no link"))?;

    let description = format!("Federal opportunity posted by {institution}.");
    let signal = format!("{title} {description}");

    Ok(CandidateOpportunity {
        deadline: render_date(deadline_date, "%Y-%m-%d"),
        amount: amount_from_value(notice.award.and_then(|a| a.amount).as_ref()),
        degree_level: extract_degree_level(&signal),
        subject: extract_subject(&signal),
        funding_type: extract_funding_type(&signal),
        source_name: SOURCE_NAME.to_string(),
        social: None,
        title,
        description,
        institution,
        source_url,
    }
    .normalized())
}
