//! Test doubles for the content source

use async_trait::async_trait;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use std::sync::Mutex;
use std::time::Duration;

use super::{ContentSource, Document, MemoryContentSource, Query, QueryResponse};
use crate::error::ContentError;

/// A published post document with an empty body
pub fn post_doc(id: &str, uid: &str, title: &str, date: &str) -> Document {
    serde_json::from_value(json!({
        "id": id,
        "uid": uid,
        "type": "post",
        "first_publication_date": date,
        "last_publication_date": date,
        "data": {
            "title": title,
            "subtitle": format!("About {}", title),
            "author": "Tester",
            "banner": {"url": "https://images.example.com/banner.png"},
            "content": []
        }
    }))
    .expect("valid post fixture")
}

/// Three posts A, B, C published a month apart
pub fn sample_source() -> MemoryContentSource {
    MemoryContentSource::new(vec![
        post_doc("id-a", "a", "A", "2021-01-01T00:00:00Z"),
        post_doc("id-b", "b", "B", "2021-02-01T00:00:00Z"),
        post_doc("id-c", "c", "C", "2021-03-01T00:00:00Z"),
    ])
}

/// `count` posts named p1..pN, one day apart
pub fn numbered_source(count: usize) -> MemoryContentSource {
    let docs = (1..=count)
        .map(|n| {
            post_doc(
                &format!("id-{:03}", n),
                &format!("p{}", n),
                &format!("Post {}", n),
                &format!("2021-01-{:02}T12:00:00Z", n.min(28)),
            )
        })
        .collect();
    MemoryContentSource::new(docs)
}

/// Records the ref of every call it forwards
pub struct RecordingSource<S> {
    pub inner: S,
    refs: Mutex<Vec<Option<String>>>,
}

impl<S> RecordingSource<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            refs: Mutex::new(Vec::new()),
        }
    }

    pub fn refs(&self) -> Vec<Option<String>> {
        self.refs.lock().unwrap().clone()
    }

    fn record(&self, content_ref: Option<&str>) {
        self.refs.lock().unwrap().push(content_ref.map(str::to_string));
    }
}

#[async_trait]
impl<S: ContentSource> ContentSource for RecordingSource<S> {
    async fn query(&self, query: &Query) -> Result<QueryResponse, ContentError> {
        self.record(query.content_ref.as_deref());
        self.inner.query(query).await
    }

    async fn get_by_uid(
        &self,
        doc_type: &str,
        uid: &str,
        content_ref: Option<&str>,
    ) -> Result<Document, ContentError> {
        self.record(content_ref);
        self.inner.get_by_uid(doc_type, uid, content_ref).await
    }

    async fn get_by_id(&self, id: &str, content_ref: Option<&str>) -> Result<Document, ContentError> {
        self.record(content_ref);
        self.inner.get_by_id(id, content_ref).await
    }
}

/// Fails the next `failures` listing queries with a 503
pub struct FlakySource<S> {
    pub inner: S,
    failures: AtomicUsize,
}

impl<S> FlakySource<S> {
    pub fn new(inner: S, failures: usize) -> Self {
        Self {
            inner,
            failures: AtomicUsize::new(failures),
        }
    }
}

#[async_trait]
impl<S: ContentSource> ContentSource for FlakySource<S> {
    async fn query(&self, query: &Query) -> Result<QueryResponse, ContentError> {
        let remaining = self.failures.load(AtomicOrdering::SeqCst);
        if remaining > 0 {
            self.failures.store(remaining - 1, AtomicOrdering::SeqCst);
            return Err(ContentError::Status {
                status: 503,
                message: "unavailable".to_string(),
            });
        }
        self.inner.query(query).await
    }

    async fn get_by_uid(
        &self,
        doc_type: &str,
        uid: &str,
        content_ref: Option<&str>,
    ) -> Result<Document, ContentError> {
        self.inner.get_by_uid(doc_type, uid, content_ref).await
    }

    async fn get_by_id(&self, id: &str, content_ref: Option<&str>) -> Result<Document, ContentError> {
        self.inner.get_by_id(id, content_ref).await
    }
}

/// Treats `after` as inclusive, returning the anchor document first
pub struct InclusiveAfterSource<S> {
    pub inner: S,
}

#[async_trait]
impl<S: ContentSource> ContentSource for InclusiveAfterSource<S> {
    async fn query(&self, query: &Query) -> Result<QueryResponse, ContentError> {
        let mut response = self.inner.query(query).await?;
        if let Some(after) = &query.after {
            let anchor = self
                .inner
                .get_by_id(after, query.content_ref.as_deref())
                .await?;
            response.results.insert(0, anchor);
            response.results.truncate(query.page_size.max(1));
        }
        Ok(response)
    }

    async fn get_by_uid(
        &self,
        doc_type: &str,
        uid: &str,
        content_ref: Option<&str>,
    ) -> Result<Document, ContentError> {
        self.inner.get_by_uid(doc_type, uid, content_ref).await
    }

    async fn get_by_id(&self, id: &str, content_ref: Option<&str>) -> Result<Document, ContentError> {
        self.inner.get_by_id(id, content_ref).await
    }
}

/// Delays every call
pub struct SlowSource<S> {
    pub inner: S,
    pub delay: Duration,
}

#[async_trait]
impl<S: ContentSource> ContentSource for SlowSource<S> {
    async fn query(&self, query: &Query) -> Result<QueryResponse, ContentError> {
        tokio::time::sleep(self.delay).await;
        self.inner.query(query).await
    }

    async fn get_by_uid(
        &self,
        doc_type: &str,
        uid: &str,
        content_ref: Option<&str>,
    ) -> Result<Document, ContentError> {
        tokio::time::sleep(self.delay).await;
        self.inner.get_by_uid(doc_type, uid, content_ref).await
    }

    async fn get_by_id(&self, id: &str, content_ref: Option<&str>) -> Result<Document, ContentError> {
        tokio::time::sleep(self.delay).await;
        self.inner.get_by_id(id, content_ref).await
    }
}
