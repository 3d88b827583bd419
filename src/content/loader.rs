//! Content loader - fetches posts from the content source

use std::sync::Arc;

use super::PostDetail;
use crate::error::ContentError;
use crate::neighbors::resolve_neighbors;
use crate::pagination::{fetch_first_page, Page, PaginationCursor};
use crate::preview::PreviewSession;
use crate::Blog;

/// Loads posts for a blog, honoring the request's preview session
pub struct ContentLoader<'a> {
    blog: &'a Blog,
}

impl<'a> ContentLoader<'a> {
    /// Create a new content loader
    pub fn new(blog: &'a Blog) -> Self {
        Self { blog }
    }

    fn doc_type(&self) -> &str {
        &self.blog.config.content.document_type
    }

    /// First page of the feed
    pub async fn first_page(&self, session: &PreviewSession) -> Result<Page, ContentError> {
        fetch_first_page(
            self.blog.source.as_ref(),
            session,
            self.doc_type(),
            self.blog.config.per_page,
        )
        .await
    }

    /// Pagination cursor continuing from `first_page`
    pub fn cursor(&self, session: PreviewSession, first_page: Page) -> PaginationCursor {
        PaginationCursor::initialize(
            Arc::clone(&self.blog.source),
            session,
            self.doc_type(),
            self.blog.config.per_page,
            first_page,
        )
    }

    /// Load a post by uid with its reading time and neighbors
    pub async fn load_post(
        &self,
        uid: &str,
        session: &PreviewSession,
    ) -> Result<PostDetail, ContentError> {
        let doc = self
            .blog
            .source
            .get_by_uid(self.doc_type(), uid, session.content_ref())
            .await?;

        let mut post = doc.to_detail(self.blog.config.reading_speed())?;
        post.neighbors =
            resolve_neighbors(self.blog.source.as_ref(), &post.summary, self.doc_type(), session)
                .await;

        tracing::debug!(
            "Loaded post {} ({} min read)",
            post.summary.uid,
            post.reading_time_minutes
        );
        Ok(post)
    }
}
