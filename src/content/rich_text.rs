//! Structured rich text as delivered by the content source
//!
//! Rich text is a list of block nodes (paragraphs, headings, list items,
//! images, embeds), each carrying plain `text` plus inline `spans` that mark
//! character ranges as bold, italic, links and so on. It can be flattened to
//! plain text for word counting, or turned into an escaped HTML fragment.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::helpers::{html_escape, post_path};

/// Ordered sequence of rich-text nodes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RichText {
    pub nodes: Vec<TextNode>,
}

/// A single block-level node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextNode {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub spans: Vec<Span>,
    /// Image source
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Image alternative text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oembed: Option<Embed>,
}

/// Embedded third-party content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embed {
    #[serde(default)]
    pub embed_url: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

/// Inline formatting over a `[start, end)` range of UTF-16 code units
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<SpanData>,
}

/// Link target of a hyperlink span
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpanData {
    #[serde(default)]
    pub url: Option<String>,
    /// Set for links to other documents
    #[serde(default)]
    pub uid: Option<String>,
    #[serde(rename = "type", default)]
    pub doc_type: Option<String>,
}

impl RichText {
    /// Build rich text from a loosely shaped JSON value.
    ///
    /// Nodes that fail to deserialize are skipped and anything that is not an
    /// array (or a plain string) yields empty rich text.
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Array(items) => {
                let nodes = items
                    .iter()
                    .filter_map(|item| match serde_json::from_value::<TextNode>(item.clone()) {
                        Ok(node) => Some(node),
                        Err(e) => {
                            tracing::debug!("Skipping malformed rich-text node: {}", e);
                            None
                        }
                    })
                    .collect();
                Self { nodes }
            }
            Value::String(text) => Self::paragraph(text),
            _ => Self::default(),
        }
    }

    /// Rich text holding a single unformatted paragraph
    pub fn paragraph(text: &str) -> Self {
        Self {
            nodes: vec![TextNode {
                kind: "paragraph".to_string(),
                text: text.to_string(),
                spans: Vec::new(),
                url: None,
                alt: None,
                oembed: None,
            }],
        }
    }

    /// Flatten to plain text, one line per node
    pub fn as_text(&self) -> String {
        self.nodes
            .iter()
            .map(|n| n.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Number of whitespace-separated words
    pub fn word_count(&self) -> usize {
        self.nodes
            .iter()
            .map(|n| n.text.split_whitespace().count())
            .sum()
    }

    /// Render as an HTML fragment with all text escaped
    pub fn as_html(&self) -> String {
        let mut html = String::new();
        let mut open_list: Option<&'static str> = None;

        for node in &self.nodes {
            let list_tag = match node.kind.as_str() {
                "list-item" => Some("ul"),
                "o-list-item" => Some("ol"),
                _ => None,
            };

            if open_list != list_tag {
                if let Some(tag) = open_list {
                    html.push_str(&format!("</{}>", tag));
                }
                if let Some(tag) = list_tag {
                    html.push_str(&format!("<{}>", tag));
                }
                open_list = list_tag;
            }

            html.push_str(&render_node(node));
        }

        if let Some(tag) = open_list {
            html.push_str(&format!("</{}>", tag));
        }

        html
    }
}

fn render_node(node: &TextNode) -> String {
    match node.kind.as_str() {
        "heading1" | "heading2" | "heading3" | "heading4" | "heading5" | "heading6" => {
            let level = &node.kind["heading".len()..];
            format!(
                "<h{}>{}</h{}>",
                level,
                render_inline(&node.text, &node.spans),
                level
            )
        }
        "preformatted" => format!("<pre>{}</pre>", render_inline(&node.text, &node.spans)),
        "list-item" | "o-list-item" => {
            format!("<li>{}</li>", render_inline(&node.text, &node.spans))
        }
        "image" => match node.url.as_deref().filter(|u| is_safe_href(u)) {
            Some(url) => format!(
                r#"<img src="{}" alt="{}">"#,
                html_escape(url),
                html_escape(node.alt.as_deref().unwrap_or(""))
            ),
            None => String::new(),
        },
        "embed" => {
            let embed = node.oembed.as_ref();
            let url = embed
                .and_then(|e| e.embed_url.as_deref())
                .filter(|u| is_safe_href(u));
            match url {
                Some(url) => {
                    let title = embed.and_then(|e| e.title.as_deref()).unwrap_or(url);
                    format!(
                        r#"<div class="embed"><a href="{}" rel="noopener noreferrer">{}</a></div>"#,
                        html_escape(url),
                        html_escape(title)
                    )
                }
                None => String::new(),
            }
        }
        _ => format!("<p>{}</p>", render_inline(&node.text, &node.spans)),
    }
}

/// A span with its bounds converted to character indices
struct Mark<'a> {
    start: usize,
    end: usize,
    span: &'a Span,
}

/// Apply spans to `text`, keeping the produced tags properly nested.
///
/// Span offsets count UTF-16 code units. Overlapping spans are split: when an
/// outer span closes before an inner one, the inner one is closed and
/// reopened around the boundary.
fn render_inline(text: &str, spans: &[Span]) -> String {
    let chars: Vec<char> = text.chars().collect();
    let len = chars.len();

    // UTF-16 offset where each char starts
    let mut unit_starts = Vec::with_capacity(len);
    let mut unit = 0;
    for c in &chars {
        unit_starts.push(unit);
        unit += c.len_utf16();
    }
    // Offsets inside a surrogate pair round up to the next char
    let char_index = |offset: usize| unit_starts.partition_point(|&u| u < offset);

    let mut marks: Vec<Mark> = spans
        .iter()
        .map(|span| Mark {
            start: char_index(span.start),
            end: char_index(span.end),
            span,
        })
        .filter(|m| m.start < m.end)
        .collect();
    marks.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));

    let mut out = String::with_capacity(text.len());
    let mut stack: Vec<&Mark> = Vec::new();
    let mut next = 0;

    for i in 0..=len {
        if stack.iter().any(|m| m.end == i) {
            let mut reopen = Vec::new();
            while let Some(mark) = stack.pop() {
                out.push_str(close_tag(mark.span));
                if mark.end != i {
                    reopen.push(mark);
                }
                if !stack.iter().any(|m| m.end == i) {
                    break;
                }
            }
            for mark in reopen.into_iter().rev() {
                out.push_str(&open_tag(mark.span));
                stack.push(mark);
            }
        }

        while next < marks.len() && marks[next].start == i {
            out.push_str(&open_tag(marks[next].span));
            stack.push(&marks[next]);
            next += 1;
        }

        if let Some(&c) = chars.get(i) {
            push_escaped(&mut out, c);
        }
    }

    out
}

fn open_tag(span: &Span) -> String {
    match span.kind.as_str() {
        "strong" => "<strong>".to_string(),
        "em" => "<em>".to_string(),
        "hyperlink" => match span.data.as_ref().and_then(link_target) {
            Some(href) => format!(r#"<a href="{}" rel="noopener noreferrer">"#, html_escape(&href)),
            None => "<a>".to_string(),
        },
        "label" => r#"<span class="label">"#.to_string(),
        _ => "<span>".to_string(),
    }
}

fn close_tag(span: &Span) -> &'static str {
    match span.kind.as_str() {
        "strong" => "</strong>",
        "em" => "</em>",
        "hyperlink" => "</a>",
        _ => "</span>",
    }
}

fn link_target(data: &SpanData) -> Option<String> {
    if let Some(url) = data.url.as_deref().filter(|u| is_safe_href(u)) {
        return Some(url.to_string());
    }
    match (data.doc_type.as_deref(), data.uid.as_deref()) {
        (Some("post"), Some(uid)) => Some(post_path(uid)),
        (Some(_), _) => Some("/".to_string()),
        _ => None,
    }
}

/// Only web, mail and site-relative targets are emitted
fn is_safe_href(href: &str) -> bool {
    href.starts_with("https://")
        || href.starts_with("http://")
        || href.starts_with("mailto:")
        || (href.starts_with('/') && !href.starts_with("//"))
}

fn push_escaped(out: &mut String, c: char) {
    match c {
        '&' => out.push_str("&amp;"),
        '<' => out.push_str("&lt;"),
        '>' => out.push_str("&gt;"),
        '"' => out.push_str("&quot;"),
        '\'' => out.push_str("&#39;"),
        _ => out.push(c),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flatten_keeps_all_text() {
        let rt = RichText::from_value(&json!([
            {"type": "paragraph", "text": "First paragraph.", "spans": []},
            {"type": "list-item", "text": "one", "spans": []},
            {"type": "image", "url": "https://images.example.com/a.png", "alt": "alt"},
            {"type": "paragraph", "text": "Last.", "spans": []}
        ]));
        assert_eq!(rt.as_text(), "First paragraph.\none\n\nLast.");
        assert_eq!(rt.word_count(), 4);
    }

    #[test]
    fn test_malformed_value_is_empty() {
        assert!(RichText::from_value(&json!(42)).nodes.is_empty());
        assert!(RichText::from_value(&Value::Null).nodes.is_empty());

        // Nodes without a type are skipped, the rest is kept
        let rt = RichText::from_value(&json!([{"text": "no type"}, {"type": "paragraph", "text": "ok"}]));
        assert_eq!(rt.as_text(), "ok");
    }

    #[test]
    fn test_string_value_is_paragraph() {
        let rt = RichText::from_value(&json!("just text"));
        assert_eq!(rt.as_html(), "<p>just text</p>");
    }

    #[test]
    fn test_html_escapes_text() {
        let rt = RichText::paragraph("<script>alert('x')</script>");
        assert_eq!(
            rt.as_html(),
            "<p>&lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt;</p>"
        );
    }

    #[test]
    fn test_spans_and_links() {
        let rt = RichText::from_value(&json!([{
            "type": "paragraph",
            "text": "Read the docs now",
            "spans": [
                {"start": 0, "end": 4, "type": "strong"},
                {"start": 9, "end": 13, "type": "hyperlink", "data": {"link_type": "Web", "url": "https://docs.rs"}}
            ]
        }]));
        assert_eq!(
            rt.as_html(),
            r#"<p><strong>Read</strong> the <a href="https://docs.rs" rel="noopener noreferrer">docs</a> now</p>"#
        );
    }

    #[test]
    fn test_unsafe_link_is_dropped() {
        let rt = RichText::from_value(&json!([{
            "type": "paragraph",
            "text": "click",
            "spans": [{"start": 0, "end": 5, "type": "hyperlink", "data": {"url": "javascript:alert(1)"}}]
        }]));
        assert_eq!(rt.as_html(), "<p><a>click</a></p>");
    }

    #[test]
    fn test_document_link_resolves_to_post() {
        let rt = RichText::from_value(&json!([{
            "type": "paragraph",
            "text": "see",
            "spans": [{"start": 0, "end": 3, "type": "hyperlink", "data": {"link_type": "Document", "type": "post", "uid": "other"}}]
        }]));
        assert!(rt.as_html().contains(r#"href="/post/other""#));
    }

    #[test]
    fn test_overlapping_spans_nest() {
        let rt = RichText::from_value(&json!([{
            "type": "paragraph",
            "text": "abcdef",
            "spans": [
                {"start": 0, "end": 4, "type": "strong"},
                {"start": 2, "end": 6, "type": "em"}
            ]
        }]));
        assert_eq!(
            rt.as_html(),
            "<p><strong>ab<em>cd</em></strong><em>ef</em></p>"
        );
    }

    #[test]
    fn test_span_offsets_count_utf16_units() {
        // The rocket takes two UTF-16 units, the accented letters one each
        let rt = RichText::from_value(&json!([{
            "type": "paragraph",
            "text": "\u{1F680} Launch café day",
            "spans": [
                {"start": 3, "end": 9, "type": "strong"},
                {"start": 10, "end": 14, "type": "em"}
            ]
        }]));
        assert_eq!(
            rt.as_html(),
            "<p>\u{1F680} <strong>Launch</strong> <em>café</em> day</p>"
        );
    }

    #[test]
    fn test_span_past_the_end_is_clamped() {
        let rt = RichText::from_value(&json!([{
            "type": "paragraph",
            "text": "short",
            "spans": [
                {"start": 2, "end": 40, "type": "strong"},
                {"start": 9, "end": 12, "type": "em"}
            ]
        }]));
        assert_eq!(rt.as_html(), "<p>sh<strong>ort</strong></p>");
    }

    #[test]
    fn test_lists_are_grouped() {
        let rt = RichText::from_value(&json!([
            {"type": "list-item", "text": "a", "spans": []},
            {"type": "list-item", "text": "b", "spans": []},
            {"type": "o-list-item", "text": "c", "spans": []},
            {"type": "heading2", "text": "Title", "spans": []}
        ]));
        assert_eq!(
            rt.as_html(),
            "<ul><li>a</li><li>b</li></ul><ol><li>c</li></ol><h2>Title</h2>"
        );
    }
}
