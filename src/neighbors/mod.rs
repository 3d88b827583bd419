//! Chronological neighbor resolution

use crate::content::{Neighbors, PostRef, PostSummary};
use crate::preview::PreviewSession;
use crate::source::{ContentSource, Ordering, Query};

/// Results requested per side. Two leaves room to skip the target itself when
/// the content source treats `after` as inclusive.
const PROBE_SIZE: usize = 2;

/// Find the posts published immediately before and after `target`.
///
/// Both sides are queried concurrently and independently. A side that fails
/// to load is logged and reported as absent, so this never fails.
pub async fn resolve_neighbors(
    source: &dyn ContentSource,
    target: &PostSummary,
    doc_type: &str,
    session: &PreviewSession,
) -> Neighbors {
    let (prev, next) = tokio::join!(
        resolve_side(source, target, doc_type, session, Ordering::PublishedDesc),
        resolve_side(source, target, doc_type, session, Ordering::PublishedAsc),
    );

    Neighbors { prev, next }
}

async fn resolve_side(
    source: &dyn ContentSource,
    target: &PostSummary,
    doc_type: &str,
    session: &PreviewSession,
    ordering: Ordering,
) -> Option<PostRef> {
    let query = Query::by_type(doc_type, PROBE_SIZE)
        .with_ref(session.content_ref())
        .ordered(ordering)
        .after(&target.id);

    let response = match source.query(&query).await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!(
                "Failed to resolve {:?} neighbor of {}: {}",
                ordering,
                target.uid,
                e
            );
            return None;
        }
    };

    response
        .results
        .iter()
        .filter(|doc| doc.id != target.id && doc.uid.as_deref() != Some(target.uid.as_str()))
        .find_map(|doc| match doc.to_summary() {
            Ok(summary) => Some(summary.to_ref()),
            Err(e) => {
                tracing::warn!("Skipping neighbor candidate: {}", e);
                None
            }
        })
}
