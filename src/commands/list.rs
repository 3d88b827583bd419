//! List every post in the feed

use anyhow::Result;

use crate::pagination::{LoadOutcome, PaginationState};
use crate::preview::PreviewSession;
use crate::Blog;

/// Walk the feed page by page and collect every post
pub async fn collect(blog: &Blog, session: PreviewSession) -> Result<PaginationState> {
    let loader = blog.loader();
    let first = loader.first_page(&session).await?;
    let cursor = loader.cursor(session, first);

    if cursor.load_all().await == LoadOutcome::Failed {
        anyhow::bail!("Failed to load the whole feed, see the log for details");
    }

    Ok(cursor.snapshot().await)
}

/// List posts
pub async fn run(blog: &Blog, content_ref: Option<&str>) -> Result<()> {
    let session = content_ref
        .map(PreviewSession::active)
        .unwrap_or_default();
    let state = collect(blog, session).await?;
    let dates = crate::helpers::DateFormatter::new(&blog.config);

    println!("Posts ({}):", state.loaded_posts.len());
    for post in &state.loaded_posts {
        let date = post
            .first_publication_date
            .map(|d| dates.date(&d))
            .unwrap_or_else(|| "unpublished".to_string());
        println!("  {} - {} [{}]", date, post.title, post.uid);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use crate::source::testing::{numbered_source, FlakySource};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_collect_walks_every_page() {
        let blog = Blog::with_source(SiteConfig::default(), Arc::new(numbered_source(12)));
        let state = collect(&blog, PreviewSession::inactive()).await.unwrap();
        assert_eq!(state.loaded_posts.len(), 12);
        assert!(!state.has_more());
    }

    #[tokio::test]
    async fn test_collect_reports_failures() {
        let blog = Blog::with_source(
            SiteConfig::default(),
            Arc::new(FlakySource::new(numbered_source(12), 1)),
        );
        // The first page fails outright
        assert!(collect(&blog, PreviewSession::inactive()).await.is_err());
    }
}
