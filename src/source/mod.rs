//! Content source - the external headless CMS the blog reads from
//!
//! The rest of the crate only depends on the [`ContentSource`] trait: typed
//! queries in, raw [`Document`]s out. Two implementations are provided, one
//! talking to a Prismic-style REST API and one serving JSON fixtures.

mod document;
pub mod http;
pub mod memory;
#[cfg(test)]
pub(crate) mod testing;

use async_trait::async_trait;

pub use document::Document;
pub use http::HttpContentSource;
pub use memory::{Fixtures, MemoryContentSource};

use crate::error::ContentError;

/// Sort order of a listing query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ordering {
    /// Oldest first
    PublishedAsc,
    /// Newest first
    PublishedDesc,
}

impl Ordering {
    /// Orderings predicate, with the document id as tie-breaker
    pub fn as_predicate(&self) -> &'static str {
        match self {
            Ordering::PublishedAsc => "[document.first_publication_date,document.id]",
            Ordering::PublishedDesc => "[document.first_publication_date desc,document.id desc]",
        }
    }
}

/// Which page of a listing to fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageRequest {
    /// 1-based page number
    Number(u32),
    /// Opaque continuation returned by a previous query
    Cursor(String),
}

/// A listing query against the content source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub doc_type: String,
    pub page_size: usize,
    pub page: PageRequest,
    /// Revision to read; `None` reads published content
    pub content_ref: Option<String>,
    pub ordering: Option<Ordering>,
    /// Only return documents positioned after this document id
    pub after: Option<String>,
}

impl Query {
    /// First page of every document of `doc_type`
    pub fn by_type(doc_type: &str, page_size: usize) -> Self {
        Self {
            doc_type: doc_type.to_string(),
            page_size,
            page: PageRequest::Number(1),
            content_ref: None,
            ordering: None,
            after: None,
        }
    }

    pub fn with_ref(mut self, content_ref: Option<&str>) -> Self {
        self.content_ref = content_ref.map(str::to_string);
        self
    }

    pub fn ordered(mut self, ordering: Ordering) -> Self {
        self.ordering = Some(ordering);
        self
    }

    pub fn after(mut self, document_id: &str) -> Self {
        self.after = Some(document_id.to_string());
        self
    }

    pub fn at_cursor(mut self, cursor: &str) -> Self {
        self.page = PageRequest::Cursor(cursor.to_string());
        self
    }
}

/// One page of query results
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResponse {
    pub results: Vec<Document>,
    /// `None` once the listing is exhausted
    pub next_cursor: Option<String>,
}

/// Read access to the content repository
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Run a listing query
    async fn query(&self, query: &Query) -> Result<QueryResponse, ContentError>;

    /// Fetch a single document of `doc_type` by uid
    async fn get_by_uid(
        &self,
        doc_type: &str,
        uid: &str,
        content_ref: Option<&str>,
    ) -> Result<Document, ContentError>;

    /// Fetch a single document by its id
    async fn get_by_id(&self, id: &str, content_ref: Option<&str>)
        -> Result<Document, ContentError>;
}
