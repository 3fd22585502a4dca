use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::text::{truncate_chars, truncate_with_ellipsis, DESCRIPTION_MAX_CHARS, TITLE_MAX_CHARS};

/// Deadline value used when no deadline could be extracted.
pub const DEADLINE_NOT_SPECIFIED: &str = "Not specified";

/// Amount value used when no amount could be extracted.
pub const AMOUNT_VARIES: &str = "Amount varies";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DegreeLevel {
    #[serde(rename = "PhD")]
    PhD,
    Masters,
    Both,
    Undergraduate,
}

impl std::fmt::Display for DegreeLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DegreeLevel::PhD => write!(f, "PhD"),
            DegreeLevel::Masters => write!(f, "Masters"),
            DegreeLevel::Both => write!(f, "Both"),
            DegreeLevel::Undergraduate => write!(f, "Undergraduate"),
        }
    }
}

/// Fixed subject taxonomy. `AllFields` is the catch-all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Subject {
    #[serde(rename = "Computer Science")]
    ComputerScience,
    Engineering,
    Biology,
    Physics,
    Chemistry,
    Mathematics,
    #[serde(rename = "Health & Medicine")]
    HealthMedicine,
    #[serde(rename = "Social Sciences")]
    SocialSciences,
    Humanities,
    #[serde(rename = "All Fields")]
    AllFields,
}

impl Subject {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Subject::ComputerScience => "Computer Science",
            Subject::Engineering => "Engineering",
            Subject::Biology => "Biology",
            Subject::Physics => "Physics",
            Subject::Chemistry => "Chemistry",
            Subject::Mathematics => "Mathematics",
            Subject::HealthMedicine => "Health & Medicine",
            Subject::SocialSciences => "Social Sciences",
            Subject::Humanities => "Humanities",
            Subject::AllFields => "All Fields",
        }
    }
}

impl std::fmt::Display for Subject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FundingType {
    Fellowship,
    Scholarship,
    #[serde(rename = "Research Grant")]
    ResearchGrant,
    #[serde(rename = "Fully Funded")]
    FullyFunded,
    #[serde(rename = "Training Grant")]
    TrainingGrant,
    Award,
}

impl std::fmt::Display for FundingType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FundingType::Fellowship => write!(f, "Fellowship"),
            FundingType::Scholarship => write!(f, "Scholarship"),
            FundingType::ResearchGrant => write!(f, "Research Grant"),
            FundingType::FullyFunded => write!(f, "Fully Funded"),
            FundingType::TrainingGrant => write!(f, "Training Grant"),
            FundingType::Award => write!(f, "Award"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SocialPlatform {
    Linkedin,
    Facebook,
}

impl std::fmt::Display for SocialPlatform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SocialPlatform::Linkedin => write!(f, "linkedin"),
            SocialPlatform::Facebook => write!(f, "facebook"),
        }
    }
}

/// Metadata carried by opportunities extracted from a social-media post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialPost {
    pub original_post: String,
    /// Display name of whoever published the post.
    pub professor_name: Option<String>,
    pub professor_profile: Option<String>,
    pub post_date: Option<DateTime<Utc>>,
    pub social_platform: SocialPlatform,
}

/// An opportunity produced by an adapter, before the store has seen it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateOpportunity {
    pub title: String,
    pub description: String,
    pub institution: String,
    /// Free display text, or [`DEADLINE_NOT_SPECIFIED`].
    pub deadline: String,
    /// Free display text, or [`AMOUNT_VARIES`].
    pub amount: String,
    pub degree_level: DegreeLevel,
    pub subject: Subject,
    pub funding_type: FundingType,
    pub source_url: String,
    pub source_name: String,
    #[serde(default, flatten, skip_serializing_if = "Option::is_none")]
    pub social: Option<SocialPost>,
}

impl CandidateOpportunity {
    /// Apply the stored-length limits: titles are cut at 150 characters,
    /// descriptions at 400 characters plus an ellipsis.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.title = truncate_chars(self.title.trim(), TITLE_MAX_CHARS);
        self.description = truncate_with_ellipsis(self.description.trim(), DESCRIPTION_MAX_CHARS);
        self
    }
}

/// A candidate the store has accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedOpportunity {
    pub id: Uuid,
    #[serde(flatten)]
    pub opportunity: CandidateOpportunity,
    pub scraped_at: DateTime<Utc>,
    pub is_active: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(title: &str, description: &str) -> CandidateOpportunity {
        CandidateOpportunity {
            title: title.to_string(),
            description: description.to_string(),
            institution: "National Science Foundation".to_string(),
            deadline: DEADLINE_NOT_SPECIFIED.to_string(),
            amount: AMOUNT_VARIES.to_string(),
            degree_level: DegreeLevel::PhD,
            subject: Subject::AllFields,
            funding_type: FundingType::Fellowship,
            source_url: "https://www.nsf.gov/funding/".to_string(),
            source_name: "NSF".to_string(),
            social: None,
        }
    }

    #[test]
    fn normalized_truncates_long_description_to_403_chars() {
        let c = candidate("GRFP", &"d".repeat(1_000)).normalized();
        assert_eq!(c.description.chars().count(), 403);
        assert!(c.description.ends_with("..."));
    }

    #[test]
    fn normalized_cuts_title_without_ellipsis() {
        let c = candidate(&"t".repeat(200), "short").normalized();
        assert_eq!(c.title.chars().count(), 150);
        assert!(!c.title.ends_with("..."));
        assert_eq!(c.description, "short");
    }

    #[test]
    fn enums_serialize_to_display_labels() {
        let json = serde_json::to_value(candidate("GRFP", "x")).unwrap();
        assert_eq!(json["degreeLevel"], "PhD");
        assert_eq!(json["subject"], "All Fields");
        assert_eq!(json["fundingType"], "Fellowship");
        assert!(json.get("originalPost").is_none());
    }

    #[test]
    fn social_metadata_is_flattened() {
        let mut c = candidate("Open PhD position", "x");
        c.social = Some(SocialPost {
            original_post: "Open PhD position in my lab".to_string(),
            professor_name: Some("Dr. Ada".to_string()),
            professor_profile: None,
            post_date: None,
            social_platform: SocialPlatform::Linkedin,
        });
        let json = serde_json::to_value(&c).unwrap();
        assert_eq!(json["originalPost"], "Open PhD position in my lab");
        assert_eq!(json["socialPlatform"], "linkedin");
    }

    #[test]
    fn subject_display_matches_label() {
        assert_eq!(Subject::HealthMedicine.to_string(), "Health & Medicine");
        assert_eq!(FundingType::TrainingGrant.to_string(), "Training Grant");
    }
}
