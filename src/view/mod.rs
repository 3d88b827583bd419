//! Presentation assembler
//!
//! Turns loaded posts and the preview session into display-ready view
//! models. Everything here is pure: no I/O, no clock, same input same output.

use serde::Serialize;

use crate::config::{CommentsConfig, LabelsConfig, SiteConfig};
use crate::content::{PostDetail, PostRef, PostSummary};
use crate::helpers::{date_xml, post_path, DateFormatter};
use crate::pagination::PaginationState;
use crate::preview::PreviewSession;

/// Route that leaves preview mode
pub const EXIT_PREVIEW_PATH: &str = "/api/exit-preview";

/// One row of the feed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListItem {
    pub uid: String,
    pub href: String,
    pub title: String,
    pub subtitle: String,
    pub author: String,
    /// Formatted first publication date, absent for unpublished drafts
    pub published: Option<String>,
    /// Same date as an ISO 8601 timestamp
    pub published_iso: Option<String>,
}

/// Link back to published content, shown while previewing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreviewExit {
    pub href: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListViewModel {
    pub posts: Vec<ListItem>,
    pub next_cursor: Option<String>,
    /// Label of the load-more control, present iff more pages exist
    pub load_more: Option<String>,
    pub preview_exit: Option<PreviewExit>,
}

/// Rendered section of a post body
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Section {
    pub heading: String,
    /// Sanitized HTML
    pub html: String,
}

/// One side of the navigation block
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NavSlot {
    Link { title: String, href: String },
    /// Keeps the layout stable when there is no post on this side
    Placeholder,
}

impl NavSlot {
    fn from_ref(post: Option<&PostRef>) -> Self {
        match post {
            Some(post) => NavSlot::Link {
                title: post.title.clone(),
                href: post_path(&post.uid),
            },
            None => NavSlot::Placeholder,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Navigation {
    pub prev: NavSlot,
    pub next: NavSlot,
}

/// Utterances comment thread
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentsWidget {
    pub repo: String,
    pub issue_term: String,
    pub theme: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailViewModel {
    pub uid: String,
    pub title: String,
    pub subtitle: String,
    pub author: String,
    pub banner_url: Option<String>,
    pub banner_alt: Option<String>,
    pub published: Option<String>,
    pub published_iso: Option<String>,
    /// e.g. `4 min`
    pub reading_time: String,
    /// e.g. `* edited on 20 Mar 2021, at 09:30`, iff the post was edited
    pub edited: Option<String>,
    pub sections: Vec<Section>,
    pub navigation: Navigation,
    pub preview_exit: Option<PreviewExit>,
    pub comments: Option<CommentsWidget>,
}

/// Which placeholder page is shown instead of a post or the feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusKind {
    /// The post is still being fetched; the page refreshes itself
    Loading,
    NotFound,
    FetchFailed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusViewModel {
    pub kind: StatusKind,
    pub message: String,
    pub preview_exit: Option<PreviewExit>,
}

/// Builds view models with the site's date format and labels
#[derive(Debug, Clone)]
pub struct Presenter {
    dates: DateFormatter,
    labels: LabelsConfig,
    comments: CommentsConfig,
}

impl Presenter {
    pub fn new(config: &SiteConfig) -> Self {
        Self {
            dates: DateFormatter::new(config),
            labels: config.labels.clone(),
            comments: config.comments.clone(),
        }
    }

    pub fn build_list_view_model(
        &self,
        state: &PaginationState,
        session: &PreviewSession,
    ) -> ListViewModel {
        ListViewModel {
            posts: state.loaded_posts.iter().map(|p| self.list_item(p)).collect(),
            next_cursor: state.next_cursor.clone(),
            load_more: state.has_more().then(|| self.labels.load_more.clone()),
            preview_exit: self.preview_exit(session),
        }
    }

    pub fn list_item(&self, post: &PostSummary) -> ListItem {
        ListItem {
            uid: post.uid.clone(),
            href: post_path(&post.uid),
            title: post.title.clone(),
            subtitle: post.subtitle.clone(),
            author: post.author.clone(),
            published: post.first_publication_date.map(|d| self.dates.date(&d)),
            published_iso: post.first_publication_date.as_ref().map(date_xml),
        }
    }

    pub fn build_detail_view_model(
        &self,
        post: &PostDetail,
        session: &PreviewSession,
    ) -> DetailViewModel {
        let edited = post.edited_at().map(|d| {
            format!(
                "* {} {}, {} {}",
                self.labels.edited_on,
                self.dates.date(&d),
                self.labels.at,
                self.dates.time(&d)
            )
        });

        let comments = (self.comments.enable && !session.active && !self.comments.repo.is_empty())
            .then(|| CommentsWidget {
                repo: self.comments.repo.clone(),
                issue_term: self.comments.issue_term.clone(),
                theme: self.comments.theme.clone(),
            });

        DetailViewModel {
            uid: post.summary.uid.clone(),
            title: post.summary.title.clone(),
            subtitle: post.summary.subtitle.clone(),
            author: post.summary.author.clone(),
            banner_url: Some(post.banner.url.clone()).filter(|u| !u.is_empty()),
            banner_alt: post.banner.alt.clone(),
            published: post.summary.first_publication_date.map(|d| self.dates.date(&d)),
            published_iso: post.summary.first_publication_date.as_ref().map(date_xml),
            reading_time: format!("{} min", post.reading_time_minutes),
            edited,
            sections: post
                .content
                .iter()
                .map(|block| Section {
                    heading: block.heading.clone(),
                    html: block.body.as_html(),
                })
                .collect(),
            navigation: Navigation {
                prev: NavSlot::from_ref(post.neighbors.prev.as_ref()),
                next: NavSlot::from_ref(post.neighbors.next.as_ref()),
            },
            preview_exit: self.preview_exit(session),
            comments,
        }
    }

    /// Loading, not-found and error pages. They keep the preview exit so a
    /// stale preview cookie can always be cleared.
    pub fn build_status_view_model(
        &self,
        kind: StatusKind,
        session: &PreviewSession,
    ) -> StatusViewModel {
        let message = match kind {
            StatusKind::Loading => &self.labels.loading,
            StatusKind::NotFound => &self.labels.not_found,
            StatusKind::FetchFailed => &self.labels.fetch_failed,
        };

        StatusViewModel {
            kind,
            message: message.clone(),
            preview_exit: self.preview_exit(session),
        }
    }

    fn preview_exit(&self, session: &PreviewSession) -> Option<PreviewExit> {
        session.active.then(|| PreviewExit {
            href: EXIT_PREVIEW_PATH.to_string(),
            label: self.labels.exit_preview.clone(),
        })
    }

    pub fn labels(&self) -> &LabelsConfig {
        &self.labels
    }
}
