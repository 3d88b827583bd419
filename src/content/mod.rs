//! Content module - post models, rich text and reading time

pub mod loader;
mod post;
pub mod reading_time;
mod rich_text;

pub use loader::ContentLoader;
pub use post::{Banner, ContentBlock, Neighbors, PostDetail, PostRef, PostSummary};
pub use reading_time::{estimate, DEFAULT_WORDS_PER_MINUTE};
pub use rich_text::{Embed, RichText, Span, SpanData, TextNode};
