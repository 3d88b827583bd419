//! Incremental feed pagination
//!
//! A [`PaginationCursor`] starts from a server-rendered first page and grows
//! its list of loaded posts one page at a time. The list is append-only and
//! a single fetch may be in flight at any moment.

use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::content::PostSummary;
use crate::error::ContentError;
use crate::preview::PreviewSession;
use crate::source::{ContentSource, Document, Query};

/// One page of posts plus the cursor to the next one
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Page {
    pub results: Vec<PostSummary>,
    pub next_cursor: Option<String>,
}

/// Posts loaded so far
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PaginationState {
    /// Fetch order, oldest page first
    pub loaded_posts: Vec<PostSummary>,
    /// `None` once every page has been loaded
    pub next_cursor: Option<String>,
}

impl PaginationState {
    pub fn has_more(&self) -> bool {
        self.next_cursor.is_some()
    }
}

/// Result of a `load_more` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A page was fetched and this many new posts were appended
    Appended(usize),
    /// Nothing left to load
    Exhausted,
    /// Another load is still running; this call did nothing
    Busy,
    /// The fetch failed; state is unchanged and the call can be retried
    Failed,
}

/// Map raw documents to summaries, skipping the ones that fail validation
pub fn summarize(documents: &[Document]) -> Vec<PostSummary> {
    documents
        .iter()
        .filter_map(|doc| match doc.to_summary() {
            Ok(summary) => Some(summary),
            Err(e) => {
                tracing::warn!("Skipping document {}: {}", doc.id, e);
                None
            }
        })
        .collect()
}

/// Fetch the first page of the feed
pub async fn fetch_first_page(
    source: &dyn ContentSource,
    session: &PreviewSession,
    doc_type: &str,
    page_size: usize,
) -> Result<Page, ContentError> {
    let query = Query::by_type(doc_type, page_size).with_ref(session.content_ref());
    let response = source.query(&query).await?;

    Ok(Page {
        results: summarize(&response.results),
        next_cursor: response.next_cursor,
    })
}

/// Append-only feed state bound to one content source and preview session
pub struct PaginationCursor {
    source: Arc<dyn ContentSource>,
    session: PreviewSession,
    doc_type: String,
    page_size: usize,
    state: Mutex<PaginationState>,
}

impl PaginationCursor {
    /// Start from an already fetched first page
    pub fn initialize(
        source: Arc<dyn ContentSource>,
        session: PreviewSession,
        doc_type: &str,
        page_size: usize,
        first_page: Page,
    ) -> Self {
        Self {
            source,
            session,
            doc_type: doc_type.to_string(),
            page_size,
            state: Mutex::new(PaginationState {
                loaded_posts: first_page.results,
                next_cursor: first_page.next_cursor,
            }),
        }
    }

    /// Fetch the page at the current cursor and append it.
    ///
    /// Calls made while another load is running return [`LoadOutcome::Busy`]
    /// without touching the state, so pages can never interleave.
    pub async fn load_more(&self) -> LoadOutcome {
        let Ok(mut state) = self.state.try_lock() else {
            tracing::debug!("load_more ignored, a fetch is already in flight");
            return LoadOutcome::Busy;
        };

        let Some(cursor) = state.next_cursor.clone() else {
            return LoadOutcome::Exhausted;
        };

        let query = Query::by_type(&self.doc_type, self.page_size)
            .with_ref(self.session.content_ref())
            .at_cursor(&cursor);

        let response = match self.source.query(&query).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("Failed to load more posts: {}", e);
                return LoadOutcome::Failed;
            }
        };

        let mut appended = 0;
        for post in summarize(&response.results) {
            if state.loaded_posts.iter().any(|p| p.id == post.id) {
                tracing::debug!("Post {} already loaded, skipping", post.uid);
                continue;
            }
            state.loaded_posts.push(post);
            appended += 1;
        }
        state.next_cursor = response.next_cursor;

        tracing::debug!(
            "Loaded {} more posts ({} total)",
            appended,
            state.loaded_posts.len()
        );
        LoadOutcome::Appended(appended)
    }

    /// Load every remaining page, stopping at the first failure.
    ///
    /// Returns [`LoadOutcome::Exhausted`] once the feed is complete, or
    /// [`LoadOutcome::Failed`] if a fetch failed along the way.
    pub async fn load_all(&self) -> LoadOutcome {
        loop {
            match self.load_more().await {
                LoadOutcome::Appended(_) => continue,
                LoadOutcome::Busy => tokio::task::yield_now().await,
                outcome => return outcome,
            }
        }
    }

    /// Copy of the current state
    pub async fn snapshot(&self) -> PaginationState {
        self.state.lock().await.clone()
    }
}
