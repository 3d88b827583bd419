//! In-memory content source backed by JSON fixtures

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use super::{ContentSource, Document, Ordering, PageRequest, Query, QueryResponse};
use crate::error::ContentError;

/// Ref naming the published revision
pub const MASTER_REF: &str = "master";

const CURSOR_PREFIX: &str = "mem:";

/// Fixture file layout
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Fixtures {
    /// Published documents
    #[serde(default)]
    pub documents: Vec<Document>,
    /// Draft documents visible under a preview ref, overlaid on the published ones
    #[serde(default)]
    pub previews: HashMap<String, Vec<Document>>,
}

/// Content source serving a fixed set of documents
#[derive(Debug, Clone, Default)]
pub struct MemoryContentSource {
    fixtures: Fixtures,
}

impl MemoryContentSource {
    pub fn new(documents: Vec<Document>) -> Self {
        Self {
            fixtures: Fixtures {
                documents,
                previews: HashMap::new(),
            },
        }
    }

    /// Register draft documents readable under `content_ref`
    pub fn with_preview(mut self, content_ref: &str, drafts: Vec<Document>) -> Self {
        self.fixtures.previews.insert(content_ref.to_string(), drafts);
        self
    }

    /// Load fixtures from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let fixtures: Fixtures = serde_json::from_str(&content)?;
        tracing::debug!(
            "Loaded {} documents and {} preview refs from {:?}",
            fixtures.documents.len(),
            fixtures.previews.len(),
            path.as_ref()
        );
        Ok(Self { fixtures })
    }

    /// Documents visible at a revision
    fn revision(&self, content_ref: Option<&str>) -> Result<Vec<&Document>, ContentError> {
        let mut docs: Vec<&Document> = self.fixtures.documents.iter().collect();

        let Some(content_ref) = content_ref.filter(|r| *r != MASTER_REF) else {
            return Ok(docs);
        };

        let drafts = self
            .fixtures
            .previews
            .get(content_ref)
            .ok_or_else(|| ContentError::InvalidRef(content_ref.to_string()))?;

        for draft in drafts {
            match docs.iter().position(|d| d.id == draft.id) {
                Some(pos) => docs[pos] = draft,
                None => docs.push(draft),
            }
        }

        Ok(docs)
    }
}

fn parse_cursor(cursor: &str) -> Result<u32, ContentError> {
    cursor
        .strip_prefix(CURSOR_PREFIX)
        .and_then(|n| n.parse::<u32>().ok())
        .filter(|n| *n >= 1)
        .ok_or_else(|| ContentError::InvalidCursor(cursor.to_string()))
}

#[async_trait]
impl ContentSource for MemoryContentSource {
    async fn query(&self, query: &Query) -> Result<QueryResponse, ContentError> {
        let mut docs: Vec<&Document> = self
            .revision(query.content_ref.as_deref())?
            .into_iter()
            .filter(|d| d.doc_type == query.doc_type)
            .collect();

        match query.ordering {
            Some(Ordering::PublishedAsc) => docs.sort_by(|a, b| {
                (a.first_publication_date, &a.id).cmp(&(b.first_publication_date, &b.id))
            }),
            Some(Ordering::PublishedDesc) => docs.sort_by(|a, b| {
                (b.first_publication_date, &b.id).cmp(&(a.first_publication_date, &a.id))
            }),
            None => {}
        }

        // Strictly after the anchor; an unknown anchor has nothing after it
        if let Some(after) = &query.after {
            let anchor = docs.iter().position(|d| &d.id == after);
            docs = match anchor {
                Some(pos) => docs.split_off(pos + 1),
                None => Vec::new(),
            };
        }

        let page = match &query.page {
            PageRequest::Number(n) => (*n).max(1),
            PageRequest::Cursor(cursor) => parse_cursor(cursor)?,
        };
        let page_size = query.page_size.max(1);

        let start = (page as usize - 1).saturating_mul(page_size).min(docs.len());
        let end = start.saturating_add(page_size).min(docs.len());

        let next_cursor = if end < docs.len() {
            Some(format!("{}{}", CURSOR_PREFIX, page + 1))
        } else {
            None
        };

        Ok(QueryResponse {
            results: docs[start..end].iter().map(|d| (*d).clone()).collect(),
            next_cursor,
        })
    }

    async fn get_by_uid(
        &self,
        doc_type: &str,
        uid: &str,
        content_ref: Option<&str>,
    ) -> Result<Document, ContentError> {
        self.revision(content_ref)?
            .into_iter()
            .find(|d| d.doc_type == doc_type && d.uid.as_deref() == Some(uid))
            .cloned()
            .ok_or_else(|| ContentError::NotFound(uid.to_string()))
    }

    async fn get_by_id(
        &self,
        id: &str,
        content_ref: Option<&str>,
    ) -> Result<Document, ContentError> {
        self.revision(content_ref)?
            .into_iter()
            .find(|d| d.id == id)
            .cloned()
            .ok_or_else(|| ContentError::NotFound(id.to_string()))
    }
}
