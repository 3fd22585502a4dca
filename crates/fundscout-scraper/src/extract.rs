//! Best-effort field extraction from free text.
//!
//! Every function here is pure, order-sensitive, and first-match: cheap and
//! explainable rather than correct. Callers must not treat the output as
//! validated data. Degree, subject, and funding-type matching is plain
//! case-insensitive substring search with no word boundaries, so "master"
//! also hits "mastermind".

use std::sync::LazyLock;

use fundscout_core::text::capitalize_first;
use fundscout_core::{DegreeLevel, FundingType, Subject, AMOUNT_VARIES, DEADLINE_NOT_SPECIFIED};
use regex::Regex;

/// Terms that mark an HTML block as funding-related.
pub const FUNDING_KEYWORDS: &[&str] = &[
    "fellowship",
    "scholarship",
    "grant",
    "funding",
    "award",
    "phd",
    "graduate",
    "doctoral",
];

/// Terms that mark a social post as funding-related.
pub const SOCIAL_FUNDING_KEYWORDS: &[&str] = &[
    "scholarship",
    "funding",
    "phd",
    "fellowship",
    "grant",
    "position",
    "opportunity",
    "deadline",
    "apply",
];

pub const INSTITUTION_NOT_SPECIFIED: &str = "Institution Not Specified";

const MONTH_DATE: &str = r"(?:january|february|march|april|may|june|july|august|september|october|november|december|jan|feb|mar|apr|jun|jul|aug|sept|sep|oct|nov|dec)\.?\s+\d{1,2},?\s+\d{4}";
const SLASH_DATE: &str = r"\d{1,2}/\d{1,2}/\d{4}";
const ISO_DATE: &str = r"\d{4}-\d{2}-\d{2}";

static AMOUNT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\$\d[\d,]*(?:\.\d+)?(?:[km]\b)?|full\s+funding|fully\s+funded|tuition\s+waiver")
        .expect("valid amount regex")
});

static LABELED_DEADLINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)(?:deadline|due|apply\s+by|closes?)\s*:?\s*({MONTH_DATE}|{SLASH_DATE}|{ISO_DATE})"
    ))
    .expect("valid deadline regex")
});

static BARE_DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)\b(?:{MONTH_DATE}|{SLASH_DATE}|{ISO_DATE})"))
        .expect("valid date regex")
});

static INSTITUTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(?i:at|from|by)\s+((?:[A-Z][A-Za-z&.'-]*\s+)+?(?:University|Institute|College|Lab|Foundation))\b",
    )
    .expect("valid institution regex")
});

const DEGREE_TIERS: &[(DegreeLevel, &[&str])] = &[
    (
        DegreeLevel::PhD,
        &["phd", "ph.d", "doctoral", "doctorate", "dissertation"],
    ),
    (DegreeLevel::Masters, &["master", "graduate", "msc"]),
    (DegreeLevel::Undergraduate, &["undergraduate", "bachelor"]),
];

const SUBJECT_KEYWORDS: &[(Subject, &[&str])] = &[
    (
        Subject::ComputerScience,
        &[
            "computer science",
            "computer",
            "software",
            "artificial intelligence",
            "machine learning",
            "data science",
            "cybersecurity",
            "programming",
        ],
    ),
    (
        Subject::Engineering,
        &["engineering", "engineer", "mechanical", "electrical", "civil"],
    ),
    (
        Subject::Biology,
        &[
            "biology",
            "biological",
            "life sciences",
            "biomedical",
            "genetics",
            "molecular",
        ],
    ),
    (
        Subject::Physics,
        &["physics", "physical sciences", "quantum", "astronomy"],
    ),
    (
        Subject::Chemistry,
        &["chemistry", "chemical", "biochemistry", "pharmaceutical"],
    ),
    (
        Subject::Mathematics,
        &["mathematics", "math", "statistics", "computational"],
    ),
    (
        Subject::HealthMedicine,
        &["medical", "health", "clinical", "nursing", "epidemiology"],
    ),
    (
        Subject::SocialSciences,
        &[
            "social science",
            "psychology",
            "sociology",
            "anthropology",
            "political science",
            "economics",
        ],
    ),
    (
        Subject::Humanities,
        &["history", "literature", "philosophy", "linguistics", "arts"],
    ),
];

const KNOWN_INSTITUTIONS: &[(&str, &str)] = &[
    ("nsf.gov", "National Science Foundation"),
    ("nih.gov", "National Institutes of Health"),
    ("fulbright", "Fulbright Commission"),
    ("stanford", "Stanford University"),
    ("mit.edu", "MIT"),
    ("harvard", "Harvard University"),
];

/// First currency amount or funding phrase in `text`, else "Amount varies".
#[must_use]
pub fn extract_amount(text: &str) -> String {
    AMOUNT_RE.find(text).map_or_else(
        || AMOUNT_VARIES.to_string(),
        |m| m.as_str().trim_end_matches(',').to_string(),
    )
}

/// A labeled deadline date ("Deadline: March 1, 2026"), else the first bare
/// date, else "Not specified". The result is display text, not a parsed date.
#[must_use]
pub fn extract_deadline(text: &str) -> String {
    if let Some(date) = LABELED_DEADLINE_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
    {
        return date.as_str().trim().to_string();
    }
    BARE_DATE_RE.find(text).map_or_else(
        || DEADLINE_NOT_SPECIFIED.to_string(),
        |m| m.as_str().trim().to_string(),
    )
}

/// First matching tier wins; nothing matching means `PhD`.
#[must_use]
pub fn extract_degree_level(text: &str) -> DegreeLevel {
    let lower = text.to_lowercase();
    DEGREE_TIERS
        .iter()
        .find(|(_, terms)| terms.iter().any(|t| lower.contains(t)))
        .map_or(DegreeLevel::PhD, |(level, _)| *level)
}

#[must_use]
pub fn extract_subject(text: &str) -> Subject {
    let lower = text.to_lowercase();
    SUBJECT_KEYWORDS
        .iter()
        .find(|(_, terms)| terms.iter().any(|t| lower.contains(t)))
        .map_or(Subject::AllFields, |(subject, _)| *subject)
}

#[must_use]
pub fn extract_funding_type(text: &str) -> FundingType {
    let lower = text.to_lowercase();
    if lower.contains("fellow") {
        FundingType::Fellowship
    } else if lower.contains("scholarship") {
        FundingType::Scholarship
    } else if lower.contains("training") || lower.contains("traineeship") {
        FundingType::TrainingGrant
    } else if lower.contains("research") && lower.contains("grant") {
        FundingType::ResearchGrant
    } else if lower.contains("award") {
        FundingType::Award
    } else {
        FundingType::Fellowship
    }
}

#[must_use]
pub fn has_funding_keyword(text: &str) -> bool {
    contains_any(text, FUNDING_KEYWORDS)
}

#[must_use]
pub fn is_funding_post(text: &str) -> bool {
    contains_any(text, SOCIAL_FUNDING_KEYWORDS)
}

fn contains_any(text: &str, keywords: &[&str]) -> bool {
    let lower = text.to_lowercase();
    keywords.iter().any(|k| lower.contains(k))
}

/// Institution name derived from a page URL: a known-host table first, then
/// the label in front of an academic suffix (`.edu`, `.ac.uk`), then the
/// first host label.
#[must_use]
pub fn institution_from_url(url: &str) -> String {
    let Some(host) = url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_lowercase))
    else {
        return INSTITUTION_NOT_SPECIFIED.to_string();
    };
    let host = host.strip_prefix("www.").unwrap_or(&host);

    if let Some((_, name)) = KNOWN_INSTITUTIONS
        .iter()
        .find(|(needle, _)| host.contains(needle))
    {
        return (*name).to_string();
    }

    let labels: Vec<&str> = host.split('.').collect();
    let label = labels
        .iter()
        .position(|l| *l == "edu" || *l == "ac")
        .filter(|&i| i > 0)
        .map_or(labels[0], |i| labels[i - 1]);
    capitalize_first(label)
}

/// Institution named in a post ("... at Stanford University").
#[must_use]
pub fn institution_from_text(text: &str) -> Option<String> {
    INSTITUTION_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().split_whitespace().collect::<Vec<_>>().join(" "))
}

#[cfg(test)]
#[path = "extract_test.rs"]
mod tests;
