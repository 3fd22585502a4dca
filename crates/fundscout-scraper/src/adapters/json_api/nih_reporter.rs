use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use fundscout_core::{CandidateOpportunity, FundingType};

use super::{amount_from_value, id_string, Mapped};
use crate::client::{decode_record, parse_json, success_body};
use crate::error::{FetchIssue, ScraperError};
use crate::extract::{extract_degree_level, extract_funding_type, extract_subject};

const SEARCH_TEXT: &str = "training fellowship graduate";
const SEARCH_LIMIT: u32 = 15;
const DETAIL_URL: &str = "https://reporter.nih.gov/project-details";
const SOURCE_NAME: &str = "NIH RePORTER";
const DEFAULT_ORG: &str = "NIH";
const ONGOING: &str = "Ongoing applications";

#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    /// Decoded one by one so a malformed project only costs that project.
    #[serde(default)]
    pub results: Vec<Value>,
}

#[derive(Debug, Deserialize)]
pub struct Project {
    #[serde(default)]
    pub appl_id: Option<Value>,
    #[serde(default)]
    pub project_title: Option<String>,
    #[serde(default)]
    pub abstract_text: Option<String>,
    #[serde(default)]
    pub organization: Option<Organization>,
    #[serde(default)]
    pub award_amount: Option<Value>,
    #[serde(default)]
    pub activity_code: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Organization {
    #[serde(default)]
    pub org_name: Option<String>,
}

pub(crate) async fn fetch(client: &Client, base: &str) -> Result<Mapped, ScraperError> {
    let url = format!("{base}/v2/projects/search");
    let body = json!({
        "criteria": {
            "advanced_text_search": {
                "operator": "advanced",
                "search_field": "projecttitle",
                "search_text": SEARCH_TEXT,
            }
        },
        "offset": 0,
        "limit": SEARCH_LIMIT,
    });
    let response = client.post(&url).json(&body).send().await?;
    let text = success_body(response, &url).await?;
    let parsed: SearchResponse = parse_json(&text, "NIH RePORTER projects/search")?;
    Ok(map_response(parsed))
}

#[must_use]
pub fn map_response(response: SearchResponse) -> Mapped {
    let mut candidates = Vec::new();
    let mut issues = Vec::new();
    for (index, project) in response.results.into_iter().enumerate() {
        match decode_record::<Project>(project, "NIH RePORTER", index).and_then(map_project) {
            Ok(candidate) => candidates.push(candidate),
            Err(message) => issues.push(FetchIssue::item(message)),
        }
    }
    (candidates, issues)
}

/// NIH activity codes carry the mechanism: F = fellowship, T = training,
/// K = career award, R/U/P = research.
fn funding_type_from_activity(code: &str) -> Option<FundingType> {
    match code.trim().chars().next()?.to_ascii_uppercase() {
        'F' => Some(FundingType::Fellowship),
        'T' => Some(FundingType::TrainingGrant),
        'K' => Some(FundingType::Award),
        'R' | 'U' | 'P' => Some(FundingType::ResearchGrant),
        _ => None,
    }
}

fn map_project(project: Project) -> Result<CandidateOpportunity, String> {
    let appl_id = id_string(project.appl_id.as_ref())
        .ok_or_else(|| "NIH project without appl_id".to_string())?;
    let title = project
        .project_title
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| format!("NIH project {appl_id} has no title"))?;
    let description = project
        .abstract_text
        .map(|a| a.trim().to_string())
        .filter(|a| !a.is_empty())
        .unwrap_or_else(|| "NIH funded research project".to_string());
    let signal = format!("{title} {description}");

    let funding_type = project
        .activity_code
        .as_deref()
        .and_then(funding_type_from_activity)
        .unwrap_or_else(|| extract_funding_type(&signal));

    Ok(CandidateOpportunity {
        institution: project
            .organization
            .and_then(|o| o.org_name)
            .filter(|o| !o.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_ORG.to_string()),
        deadline: ONGOING.to_string(),
        amount: amount_from_value(project.award_amount.as_ref()),
        degree_level: extract_degree_level(&signal),
        subject: extract_subject(&signal),
        funding_type,
        source_url: format!("{DETAIL_URL}/{appl_id}"),
        source_name: SOURCE_NAME.to_string(),
        social: None,
        title,
        description,
    }
    .normalized())
}
