use std::sync::LazyLock;

use regex::Regex;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;

use super::{PlatformMarkup, PostResult, RawPost};
use crate::client::{decode_record, parse_json};
use crate::error::ScraperError;

const GRAPH_VERSION: &str = "v18.0";
const POST_FIELDS: &str = "message,created_time,permalink_url,from";
const PAGE_SIZE: &str = "20";

/// Rendered posts only carry a machine-readable time in the `data-utime`
/// (epoch seconds) attribute of the timestamp `abbr`. Feeds without it give
/// posts with no date.
pub(crate) const MARKUP: PlatformMarkup = PlatformMarkup {
    posts: r#"[data-pagelet*="FeedUnit"], [role="article"]"#,
    content: r#"[data-ad-preview="message"], div[data-ad-comet-preview="message"], div[dir="auto"]"#,
    author: "strong a, h3 a",
    time: "abbr[data-utime]",
    time_attr: "data-utime",
    link: r#"[data-testid="story-subtitle"] a"#,
    login_wall: r#"[data-testid="royal_login_form"], #login_form"#,
};

static GROUP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"facebook\.com/groups/([^/?#]+)").expect("valid Facebook group regex")
});
static PAGES_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"facebook\.com/pages/[^/?#]+/(\d+)").expect("valid Facebook pages regex")
});
static PAGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"facebook\.com/([^/?#]+)").expect("valid Facebook page regex")
});

#[derive(Debug, Deserialize)]
pub struct GraphResponse {
    #[serde(default)]
    pub data: Vec<Value>,
    #[serde(default)]
    pub error: Option<GraphError>,
}

#[derive(Debug, Deserialize)]
pub struct GraphPost {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub created_time: Option<String>,
    #[serde(default)]
    pub permalink_url: Option<String>,
    #[serde(default)]
    pub from: Option<GraphFrom>,
}

#[derive(Debug, Deserialize)]
pub struct GraphFrom {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GraphError {
    #[serde(default)]
    pub message: String,
    #[serde(default, rename = "type")]
    pub kind: String,
}

/// Page or group id from a Facebook URL.
#[must_use]
pub fn page_id(url: &str) -> Option<String> {
    let id = GROUP_RE
        .captures(url)
        .or_else(|| PAGES_RE.captures(url))
        .or_else(|| PAGE_RE.captures(url))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())?;
    match id.as_str() {
        "groups" | "pages" | "profile.php" => None,
        _ => Some(id),
    }
}

fn auth_required(detail: &str) -> ScraperError {
    ScraperError::AuthRequired {
        platform: "Facebook",
        message: format!(
            "Facebook rejected the API credentials ({detail}) - add valid API credentials"
        ),
    }
}

pub(crate) async fn fetch_posts(
    client: &Client,
    base: &str,
    page_url: &str,
    token: &str,
) -> Result<Vec<PostResult>, ScraperError> {
    let id = page_id(page_url).ok_or_else(|| {
        ScraperError::Config(format!(
            "unable to extract Facebook page/group id from {page_url}"
        ))
    })?;

    let url = format!("{base}/{GRAPH_VERSION}/{id}/posts");
    let response = client
        .get(&url)
        .query(&[
            ("fields", POST_FIELDS),
            ("limit", PAGE_SIZE),
            ("access_token", token),
        ])
        .send()
        .await?;

    let status = response.status();
    let body = response.text().await?;
    let parsed: Result<GraphResponse, ScraperError> = parse_json(&body, "Facebook Graph posts");

    if let Ok(GraphResponse {
        error: Some(err), ..
    }) = &parsed
    {
        if err.kind == "OAuthException" {
            return Err(auth_required(&err.message));
        }
    }
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(auth_required(&format!("HTTP {}", status.as_u16())));
    }
    if !status.is_success() {
        return Err(ScraperError::UnexpectedStatus {
            status: status.as_u16(),
            url,
        });
    }

    Ok(parsed?
        .data
        .into_iter()
        .enumerate()
        .map(|(index, post)| {
            decode_record::<GraphPost>(post, "Facebook Graph", index).map(to_raw_post)
        })
        .collect())
}

fn to_raw_post(post: GraphPost) -> RawPost {
    RawPost {
        text: post.message.unwrap_or_default(),
        author: post.from.and_then(|f| f.name),
        permalink: post.permalink_url,
        timestamp: post.created_time,
    }
}
