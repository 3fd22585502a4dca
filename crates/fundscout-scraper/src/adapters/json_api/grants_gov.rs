use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use fundscout_core::CandidateOpportunity;

use super::{amount_from_value, id_string, render_date, Mapped};
use crate::client::{decode_record, parse_json, success_body};
use crate::error::{FetchIssue, ScraperError};
use crate::extract::{extract_degree_level, extract_funding_type, extract_subject};

const SEARCH_KEYWORD: &str = "graduate fellowship scholarship PhD research";
const SEARCH_ROWS: u32 = 20;
const DETAIL_URL: &str = "https://www.grants.gov/search-results-detail";
const SOURCE_NAME: &str = "Grants.gov";
const DEFAULT_AGENCY: &str = "Federal Agency";

#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub errorcode: i64,
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(default)]
    pub data: Option<SearchData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchData {
    /// Decoded one by one so a malformed hit only costs that hit.
    #[serde(default)]
    pub opp_hits: Vec<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OppHit {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub number: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub agency: Option<String>,
    #[serde(default)]
    pub agency_name: Option<String>,
    #[serde(default)]
    pub close_date: Option<String>,
    #[serde(default)]
    pub award_ceiling: Option<Value>,
    #[serde(default)]
    pub synopsis: Option<String>,
}

pub(crate) async fn fetch(client: &Client, base: &str) -> Result<Mapped, ScraperError> {
    let url = format!("{base}/v1/api/search2");
    let body = json!({
        "keyword": SEARCH_KEYWORD,
        "rows": SEARCH_ROWS,
        "oppStatuses": "forecasted|posted",
    });
    let response = client.post(&url).json(&body).send().await?;
    let text = success_body(response, &url).await?;
    let parsed: SearchResponse = parse_json(&text, "grants.gov search2")?;
    map_response(parsed)
}

/// Map a `search2` response. Malformed or untitled records become item
/// issues.
///
/// # Errors
///
/// Returns [`ScraperError::Config`] when the API reports a non-zero
/// `errorcode`, which fails the whole source.
pub fn map_response(response: SearchResponse) -> Result<Mapped, ScraperError> {
    if response.errorcode != 0 {
        return Err(ScraperError::Config(format!(
            "grants.gov returned errorcode {}: {}",
            response.errorcode,
            response.msg.unwrap_or_default()
        )));
    }

    let mut candidates = Vec::new();
    let mut issues = Vec::new();
    let hits = response.data.map(|d| d.opp_hits).unwrap_or_default();
    for (index, hit) in hits.into_iter().enumerate() {
        match decode_record::<OppHit>(hit, "grants.gov", index).and_then(map_hit) {
            Ok(candidate) => candidates.push(candidate),
            Err(message) => issues.push(FetchIssue::item(message)),
        }
    }
    Ok((candidates, issues))
}

fn map_hit(hit: OppHit) -> Result<CandidateOpportunity, String> {
    let id = id_string(hit.id.as_ref());
    let title = hit
        .title
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| {
            format!(
                "grants.gov record {} has no title",
                id.as_deref().unwrap_or("(no id)")
            )
        })?;
    let id = id.ok_or_else(|| format!("grants.gov record \"{title}\" has no id"))?;

    let description = hit
        .synopsis
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| match &hit.number {
            Some(number) => format!(
                "Funding opportunity {number}. See Grants.gov for eligibility and full details."
            ),
            None => "See Grants.gov for eligibility and full details.".to_string(),
        });
    let signal = format!("{title} {description}");

    Ok(CandidateOpportunity {
        institution: hit
            .agency
            .or(hit.agency_name)
            .filter(|a| !a.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_AGENCY.to_string()),
        deadline: render_date(hit.close_date.as_deref(), "%m/%d/%Y"),
        amount: amount_from_value(hit.award_ceiling.as_ref()),
        degree_level: extract_degree_level(&signal),
        subject: extract_subject(&signal),
        funding_type: extract_funding_type(&signal),
        source_url: format!("{DETAIL_URL}/{id}"),
        source_name: SOURCE_NAME.to_string(),
        social: None,
        title,
        description,
    }
    .normalized())
}

#[cfg(test)]
mod tests {
    use fundscout_core::{DegreeLevel, FundingType, AMOUNT_VARIES, DEADLINE_NOT_SPECIFIED};

    use super::*;

    fn response(value: Value) -> SearchResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn maps_hits_to_candidates() {
        let (candidates, issues) = map_response(response(json!({
            "errorcode": 0,
            "msg": "Webservice Succeeds",
            "data": {
                "oppHits": [{
                    "id": "350137",
                    "number": "PD-24-123",
                    "title": "Graduate Research Fellowship Program (GRFP)",
                    "agency": "U.S. National Science Foundation",
                    "closeDate": "10/15/2026",
                    "awardCeiling": 159000
                }]
            }
        })))
        .unwrap();

        assert!(issues.is_empty());
        let c = &candidates[0];
        assert_eq!(c.title, "Graduate Research Fellowship Program (GRFP)");
        assert_eq!(c.institution, "U.S. National Science Foundation");
        assert_eq!(c.deadline, "October 15, 2026");
        assert_eq!(c.amount, "$159,000");
        assert_eq!(c.degree_level, DegreeLevel::Masters);
        assert_eq!(c.funding_type, FundingType::Fellowship);
        assert_eq!(
            c.source_url,
            "https://www.grants.gov/search-results-detail/350137"
        );
        assert_eq!(c.source_name, "Grants.gov");
    }

    #[test]
    fn missing_fields_fall_back_to_sentinels() {
        let (candidates, _) = map_response(response(json!({
            "data": { "oppHits": [{ "id": 42, "title": "Dissertation Research Grant" }] }
        })))
        .unwrap();
        let c = &candidates[0];
        assert_eq!(c.institution, "Federal Agency");
        assert_eq!(c.deadline, DEADLINE_NOT_SPECIFIED);
        assert_eq!(c.amount, AMOUNT_VARIES);
    }

    #[test]
    fn untitled_hit_is_item_issue() {
        let (candidates, issues) = map_response(response(json!({
            "data": { "oppHits": [
                { "id": "1" },
                { "id": "2", "title": "Training Program in Genomics" }
            ] }
        })))
        .unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(issues.len(), 1);
        assert!(!issues[0].is_source_failure());
        assert!(issues[0].message.contains("record 1 has no title"));
    }

    #[test]
    fn malformed_hit_does_not_drop_its_siblings() {
        let (candidates, issues) = map_response(response(json!({
            "data": { "oppHits": [
                { "id": "1", "title": "Graduate Research Fellowship", "agency": "NSF" },
                { "id": "2", "title": "Doctoral Dissertation Award", "agency": 12345 }
            ] }
        })))
        .unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].title, "Graduate Research Fellowship");
        assert_eq!(issues.len(), 1);
        assert!(!issues[0].is_source_failure());
        assert!(
            issues[0].message.starts_with("grants.gov record 2 is malformed"),
            "got: {}",
            issues[0].message
        );
    }

    #[test]
    fn nonzero_errorcode_fails_source() {
        let err = map_response(response(json!({ "errorcode": 3, "msg": "bad request" })))
            .unwrap_err();
        assert!(err.to_string().contains("errorcode 3"));
    }
}
