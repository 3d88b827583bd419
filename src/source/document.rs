//! Raw content-source documents and their mapping into post models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::content::{reading_time, Banner, ContentBlock, Neighbors, PostDetail, PostSummary, RichText};
use crate::error::ContentError;

/// A document exactly as returned by the content source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,

    #[serde(default)]
    pub uid: Option<String>,

    #[serde(rename = "type")]
    pub doc_type: String,

    #[serde(default, with = "cms_date")]
    pub first_publication_date: Option<DateTime<Utc>>,

    #[serde(default, with = "cms_date")]
    pub last_publication_date: Option<DateTime<Utc>>,

    /// Custom-type fields, shaped by the repository's schema
    #[serde(default)]
    pub data: Value,
}

impl Document {
    /// Map into a feed entry, validating the fields the feed relies on
    pub fn to_summary(&self) -> Result<PostSummary, ContentError> {
        let uid = self
            .uid
            .clone()
            .filter(|uid| !uid.is_empty())
            .ok_or_else(|| ContentError::malformed(&self.id, "missing uid"))?;

        let title = text_field(&self.data, "title")
            .filter(|title| !title.trim().is_empty())
            .ok_or_else(|| ContentError::malformed(&self.id, "missing title"))?;

        Ok(PostSummary {
            id: self.id.clone(),
            uid,
            title,
            subtitle: text_field(&self.data, "subtitle").unwrap_or_default(),
            author: text_field(&self.data, "author").unwrap_or_default(),
            first_publication_date: self.first_publication_date,
        })
    }

    /// Map into a full post. Neighbors are left empty; the loader resolves them.
    pub fn to_detail(&self, words_per_minute: usize) -> Result<PostDetail, ContentError> {
        let summary = self.to_summary()?;

        let banner = match self.data.get("banner") {
            Some(Value::Object(banner)) => Banner {
                url: banner
                    .get("url")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                alt: banner.get("alt").and_then(Value::as_str).map(str::to_string),
            },
            _ => Banner::default(),
        };

        let content: Vec<ContentBlock> = match self.data.get("content") {
            Some(Value::Array(blocks)) => blocks
                .iter()
                .map(|block| ContentBlock {
                    heading: text_field(block, "heading").unwrap_or_default(),
                    body: block
                        .get("body")
                        .map(RichText::from_value)
                        .unwrap_or_default(),
                })
                .collect(),
            _ => Vec::new(),
        };

        let reading_time_minutes = reading_time::estimate_with_speed(&content, words_per_minute);

        Ok(PostDetail {
            summary,
            last_publication_date: self.last_publication_date,
            banner,
            content,
            neighbors: Neighbors::default(),
            reading_time_minutes,
        })
    }
}

/// Read a field that may be either a plain string or a rich-text title
fn text_field(data: &Value, key: &str) -> Option<String> {
    match data.get(key)? {
        Value::String(s) => Some(s.clone()),
        v @ Value::Array(_) => Some(RichText::from_value(v).as_text()),
        _ => None,
    }
}

/// Timestamps as the content source writes them (`2021-03-15T19:25:28+0000`)
mod cms_date {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(date: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match date {
            Some(date) => serializer.serialize_str(&date.to_rfc3339()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        Ok(raw.as_deref().and_then(parse))
    }

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(date) = DateTime::parse_from_rfc3339(raw) {
            return Some(date.with_timezone(&Utc));
        }
        if let Ok(date) = DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%z") {
            return Some(date.with_timezone(&Utc));
        }
        tracing::debug!("Unparseable publication date: {}", raw);
        None
    }
}
