use std::collections::HashSet;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Which adapter handles a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceCategory {
    AcademicSite,
    GovernmentApi,
    SocialLinkedin,
    SocialFacebook,
    GenericHttp,
}

impl std::fmt::Display for SourceCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceCategory::AcademicSite => write!(f, "academic-site"),
            SourceCategory::GovernmentApi => write!(f, "government-api"),
            SourceCategory::SocialLinkedin => write!(f, "social-linkedin"),
            SourceCategory::SocialFacebook => write!(f, "social-facebook"),
            SourceCategory::GenericHttp => write!(f, "generic-http"),
        }
    }
}

/// A configured origin to crawl. Read-only to the run pipeline apart from
/// `last_scraped`, which the store updates after each run.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Source {
    pub id: String,
    pub name: String,
    pub url: String,
    pub category: SourceCategory,
    pub is_active: bool,
    /// Opaque credential token; never logged.
    pub credential: Option<String>,
    pub last_scraped: Option<DateTime<Utc>>,
}

impl std::fmt::Debug for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Source")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("url", &self.url)
            .field("category", &self.category)
            .field("is_active", &self.is_active)
            .field("credential", &self.credential.as_ref().map(|_| "[redacted]"))
            .field("last_scraped", &self.last_scraped)
            .finish()
    }
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Stable identifier; defaults to the slug of `name`.
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    pub url: String,
    pub category: SourceCategory,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub credential: Option<String>,
}

impl SourceConfig {
    /// Generate a URL-safe slug from the source name.
    #[must_use]
    pub fn slug(&self) -> String {
        self.name
            .to_lowercase()
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' {
                    c
                } else if c == ' ' || c == '.' {
                    '-'
                } else {
                    '\0'
                }
            })
            .filter(|&c| c != '\0')
            .collect::<String>()
            .split('-')
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("-")
    }

    /// The id the source is stored under.
    #[must_use]
    pub fn resolved_id(&self) -> String {
        self.id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map_or_else(|| self.slug(), str::to_string)
    }

    #[must_use]
    pub fn to_source(&self) -> Source {
        Source {
            id: self.resolved_id(),
            name: self.name.trim().to_string(),
            url: self.url.trim().to_string(),
            category: self.category,
            is_active: self.active,
            credential: self.credential.clone(),
            last_scraped: None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SourcesFile {
    pub sources: Vec<SourceConfig>,
}

impl SourcesFile {
    #[must_use]
    pub fn to_sources(&self) -> Vec<Source> {
        self.sources.iter().map(SourceConfig::to_source).collect()
    }
}

/// Load and validate the source registry from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_sources(path: &Path) -> Result<SourcesFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::SourcesFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let sources_file: SourcesFile =
        serde_yaml::from_str(&content).map_err(ConfigError::SourcesFileParse)?;

    validate_sources(&sources_file)?;

    Ok(sources_file)
}

fn validate_sources(sources_file: &SourcesFile) -> Result<(), ConfigError> {
    let mut seen_ids = HashSet::new();

    for source in &sources_file.sources {
        if source.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "source name must be non-empty".to_string(),
            ));
        }

        match url::Url::parse(source.url.trim()) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {}
            Ok(parsed) => {
                return Err(ConfigError::Validation(format!(
                    "source '{}' has unsupported URL scheme '{}'",
                    source.name,
                    parsed.scheme()
                )));
            }
            Err(e) => {
                return Err(ConfigError::Validation(format!(
                    "source '{}' has invalid URL '{}': {e}",
                    source.name, source.url
                )));
            }
        }

        let id = source.resolved_id();
        if id.is_empty() {
            return Err(ConfigError::Validation(format!(
                "source '{}' produces an empty id; set `id` explicitly",
                source.name
            )));
        }
        if !seen_ids.insert(id.clone()) {
            return Err(ConfigError::Validation(format!(
                "duplicate source id: '{id}' (from source '{}')",
                source.name
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "sources_test.rs"]
mod tests;
