//! Post models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::RichText;

/// A post as shown in the feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostSummary {
    /// Content-source document id
    pub id: String,

    /// URL-friendly identifier, unique within the content source
    pub uid: String,

    pub title: String,
    pub subtitle: String,
    pub author: String,

    /// Only missing transiently, before the post is first published
    pub first_publication_date: Option<DateTime<Utc>>,
}

impl PostSummary {
    /// Weak reference to this post, used for navigation
    pub fn to_ref(&self) -> PostRef {
        PostRef {
            uid: self.uid.clone(),
            title: self.title.clone(),
        }
    }
}

/// Reference to another post by uid
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostRef {
    pub uid: String,
    pub title: String,
}

/// Previous and next posts in chronological order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Neighbors {
    /// Most recent post published before this one
    pub prev: Option<PostRef>,
    /// Soonest post published after this one
    pub next: Option<PostRef>,
}

/// Banner image of a post
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Banner {
    pub url: String,
    pub alt: Option<String>,
}

/// A titled section of a post body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentBlock {
    pub heading: String,
    pub body: RichText,
}

/// A fully loaded post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostDetail {
    #[serde(flatten)]
    pub summary: PostSummary,

    /// Equal to the first publication date when the post was never edited
    pub last_publication_date: Option<DateTime<Utc>>,

    pub banner: Banner,

    pub content: Vec<ContentBlock>,

    pub neighbors: Neighbors,

    /// Derived from `content`, never authored
    pub reading_time_minutes: u32,
}

impl PostDetail {
    /// Date of the latest edit, if the post changed after it was first published
    pub fn edited_at(&self) -> Option<DateTime<Utc>> {
        match (self.summary.first_publication_date, self.last_publication_date) {
            (Some(first), Some(last)) if last != first => Some(last),
            (None, Some(last)) => Some(last),
            _ => None,
        }
    }
}
