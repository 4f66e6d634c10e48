use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use url::Url;

use crate::story::Entity;

pub type ArticleId = String;
pub type SourceId = String;
pub type StoryId = String;

/// An article as handed over by ingestion, before validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArticleRecord {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub source_id: Option<String>,
    /// RFC 3339 or RFC 2822 timestamp.
    #[serde(default)]
    pub published_at: Option<String>,
}

/// Why a record was left out of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum SkipReason {
    InvalidUrl(String),
    MissingTitle,
    MissingPublishedAt,
    InvalidPublishedAt(String),
    Duplicate(ArticleId),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::InvalidUrl(url) => write!(f, "invalid url: {}", url),
            SkipReason::MissingTitle => write!(f, "missing title"),
            SkipReason::MissingPublishedAt => write!(f, "missing publication date"),
            SkipReason::InvalidPublishedAt(raw) => write!(f, "unparseable publication date: {}", raw),
            SkipReason::Duplicate(id) => write!(f, "duplicate of article {}", id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedArticle {
    pub url: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: ArticleId,
    pub url: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Full article text, when ingestion fetched it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    pub published_at: DateTime<Utc>,
    pub source_id: SourceId,
    /// Filled lazily by the entity extractor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entities: Option<Vec<Entity>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub story_id: Option<StoryId>,
}

impl Article {
    /// Validates a raw record. Records without a source are attributed to
    /// `unknown:<host>` so they stay distinguishable per outlet.
    pub fn from_record(record: &ArticleRecord) -> std::result::Result<Self, SkipReason> {
        let url = normalize_url(&record.url)?;
        let id = Self::id_for_url(&url);

        let title = record
            .title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(SkipReason::MissingTitle)?
            .to_string();

        let raw_date = record
            .published_at
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .ok_or(SkipReason::MissingPublishedAt)?;
        let published_at = parse_timestamp(raw_date)
            .ok_or_else(|| SkipReason::InvalidPublishedAt(raw_date.to_string()))?;

        let description = record
            .description
            .as_deref()
            .map(str::trim)
            .unwrap_or_default()
            .to_string();
        let content = record
            .content
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string);

        let source_id = match record.source_id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => format!("unknown:{}", url.host_str().unwrap_or_default()),
        };

        Ok(Self {
            id,
            url: url.to_string(),
            title,
            description,
            content,
            published_at,
            source_id,
            entities: None,
            story_id: None,
        })
    }

    /// First 16 hex characters of the SHA-256 digest of the normalized URL.
    pub fn id_for_url(url: &Url) -> ArticleId {
        let digest = Sha256::digest(url.as_str().as_bytes());
        hex::encode(&digest[..8])
    }

    /// Title and description, the text stories are grouped on.
    pub fn headline_text(&self) -> String {
        if self.description.is_empty() {
            self.title.clone()
        } else {
            format!("{}\n{}", self.title, self.description)
        }
    }

    /// Description followed by full content, when present.
    pub fn body(&self) -> String {
        match &self.content {
            Some(content) if self.description.is_empty() => content.clone(),
            Some(content) => format!("{}\n\n{}", self.description, content),
            None => self.description.clone(),
        }
    }

    /// Title and body joined.
    pub fn text(&self) -> String {
        let body = self.body();
        if body.is_empty() {
            self.title.clone()
        } else {
            format!("{}\n\n{}", self.title, body)
        }
    }
}

fn normalize_url(raw: &str) -> std::result::Result<Url, SkipReason> {
    let mut url = Url::parse(raw.trim()).map_err(|_| SkipReason::InvalidUrl(raw.to_string()))?;
    if url.host_str().is_none() {
        return Err(SkipReason::InvalidUrl(raw.to_string()));
    }
    url.set_fragment(None);
    Ok(url)
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_rfc2822(raw))
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}
