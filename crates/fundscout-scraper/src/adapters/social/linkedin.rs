use std::sync::LazyLock;

use regex::Regex;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;

use super::{PlatformMarkup, PostResult, RawPost};
use crate::client::{decode_record, parse_json, success_body};
use crate::error::ScraperError;

const API_VERSION: &str = "202401";
const RESTLI_PROTOCOL_VERSION: &str = "2.0.0";
const PAGE_SIZE: &str = "20";

pub(crate) const MARKUP: PlatformMarkup = PlatformMarkup {
    posts: r#"[data-id*="urn:li:activity"], .feed-shared-update-v2, .artdeco-card"#,
    content: ".feed-shared-text, .feed-shared-update-v2__commentary",
    author: ".feed-shared-actor__name, .update-components-actor__name",
    time: "time",
    time_attr: "datetime",
    link: r#"a[href*="/posts/"], a[href*="/feed/update/"]"#,
    login_wall: ".authwall",
};

static COMPANY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"linkedin\.com/company/(\d+)").expect("valid LinkedIn company regex")
});

#[derive(Debug, Deserialize)]
pub struct PostsResponse {
    #[serde(default)]
    pub elements: Vec<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub commentary: Option<String>,
    #[serde(default)]
    pub created_at: Option<i64>,
}

/// `urn:li:organization:<id>` for a numeric company page URL.
#[must_use]
pub fn organization_urn(url: &str) -> Option<String> {
    COMPANY_RE
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|id| format!("urn:li:organization:{}", id.as_str()))
}

pub(crate) async fn fetch_posts(
    client: &Client,
    base: &str,
    page_url: &str,
    token: &str,
) -> Result<Vec<PostResult>, ScraperError> {
    let urn = organization_urn(page_url).ok_or_else(|| {
        ScraperError::Config(format!(
            "LinkedIn API access needs a numeric company URL (linkedin.com/company/<id>), got {page_url}"
        ))
    })?;

    let url = format!("{base}/rest/posts");
    let response = client
        .get(&url)
        .query(&[("q", "author"), ("author", urn.as_str()), ("count", PAGE_SIZE)])
        .bearer_auth(token)
        .header("LinkedIn-Version", API_VERSION)
        .header("X-Restli-Protocol-Version", RESTLI_PROTOCOL_VERSION)
        .send()
        .await?;

    let status = response.status();
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(ScraperError::AuthRequired {
            platform: "LinkedIn",
            message: format!(
                "LinkedIn rejected the API credentials (HTTP {}) - add valid API credentials",
                status.as_u16()
            ),
        });
    }

    let body = success_body(response, &url).await?;
    let parsed: PostsResponse = parse_json(&body, "LinkedIn posts")?;
    Ok(parsed
        .elements
        .into_iter()
        .enumerate()
        .map(|(index, post)| decode_record::<Post>(post, "LinkedIn", index).map(to_raw_post))
        .collect())
}

fn to_raw_post(post: Post) -> RawPost {
    RawPost {
        text: post.commentary.unwrap_or_default(),
        author: None,
        permalink: post.id.map(|id| format!("/feed/update/{id}")),
        timestamp: post.created_at.map(|ms| ms.to_string()),
    }
}
