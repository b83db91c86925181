//! Text extraction for HTML, plain text and JSON files

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{node::Element, Html, Node};

use crate::error::{Error, Result};
use crate::types::{Extracted, ExtractionResult};

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));
static MARKUP_COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<!--.*?-->").expect("valid regex"));
static MARKUP_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));
static LEADING_BOILERPLATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9\p{L}\s]+").expect("valid regex"));

/// Media types the extractor understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Json,
    Html,
    Text,
}

impl MediaKind {
    /// Classify a MIME type; `None` means the file is not ingestible
    pub fn from_media_type(media_type: &str) -> Option<Self> {
        let media_type = media_type.trim().to_ascii_lowercase();
        if media_type == "application/json" {
            Some(Self::Json)
        } else if media_type.starts_with("text/html") {
            Some(Self::Html)
        } else if media_type.starts_with("text/") {
            Some(Self::Text)
        } else {
            None
        }
    }
}

/// Extracts searchable text from file content
#[derive(Debug, Clone, Default)]
pub struct TextExtractor {
    sanitize: bool,
}

impl TextExtractor {
    pub fn new(sanitize: bool) -> Self {
        Self { sanitize }
    }

    /// Extract a file's content according to its media type
    pub fn extract(&self, content: &[u8], media_type: &str) -> Result<Extracted> {
        let kind = MediaKind::from_media_type(media_type)
            .ok_or_else(|| Error::UnsupportedMediaType(media_type.to_string()))?;

        match kind {
            MediaKind::Json => {
                let value: serde_json::Value = serde_json::from_slice(content)?;
                Ok(Extracted::Json(value))
            }
            MediaKind::Html => {
                let html = String::from_utf8_lossy(content);
                Ok(Extracted::Text(self.finish(parse_html(&html))))
            }
            MediaKind::Text => {
                let text = String::from_utf8_lossy(content);
                let stripped = strip_markup(&text);
                Ok(Extracted::Text(self.finish(ExtractionResult::text_only(
                    collapse_whitespace(&stripped),
                ))))
            }
        }
    }

    fn finish(&self, mut result: ExtractionResult) -> ExtractionResult {
        if self.sanitize {
            result.text = sanitize_text(&result.text);
        }
        result
    }
}

/// Scan an HTML document for `og:title`, `og:url` and its visible text.
///
/// Text inside `<script>` and inside anchors pointing somewhere other than
/// an `http(s)` URL is dropped.
pub fn parse_html(html: &str) -> ExtractionResult {
    let document = Html::parse_document(html);
    let mut title = None;
    let mut url = None;
    let mut text = String::new();

    for node in document.tree.root().descendants() {
        match node.value() {
            Node::Element(element) if element.name() == "meta" => {
                let content = element.attr("content").map(str::to_string);
                match element.attr("property") {
                    Some("og:title") => title = content,
                    Some("og:url") => url = content,
                    _ => {}
                }
            }
            Node::Text(fragment) => {
                let excluded = node.ancestors().any(|ancestor| {
                    ancestor.value().as_element().is_some_and(is_excluded_element)
                });
                if !excluded {
                    text.push_str(fragment);
                }
            }
            _ => {}
        }
    }

    ExtractionResult {
        title,
        url,
        text: collapse_whitespace(&text),
    }
}

fn is_excluded_element(element: &Element) -> bool {
    match element.name() {
        "script" => true,
        "a" => element
            .attr("href")
            .is_some_and(|href| !href.is_empty() && !href.to_ascii_lowercase().starts_with("http")),
        _ => false,
    }
}

/// Remove comments and tags, keeping the text between them
pub fn strip_markup(text: &str) -> String {
    let without_comments = MARKUP_COMMENT.replace_all(text, "");
    MARKUP_TAG.replace_all(&without_comments, "").into_owned()
}

/// Collapse every whitespace run (newlines included) to one space
pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE_RUN.replace_all(text, " ").into_owned()
}

/// Drop the leading run of letters, digits and whitespace, then re-collapse
pub fn sanitize_text(text: &str) -> String {
    let trimmed = LEADING_BOILERPLATE.replace(text, " ");
    collapse_whitespace(&trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html><head><meta property="og:title" content="X"><meta property="og:url" content="http://y"></head><body><script>bad()</script><p>Hello  world</p><a href="/local">skip</a><a href="http://ext">keep</a></body></html>"#;

    fn text_of(extracted: Extracted) -> ExtractionResult {
        match extracted {
            Extracted::Text(result) => result,
            Extracted::Json(_) => panic!("expected text"),
        }
    }

    #[test]
    fn test_html_extraction() {
        let result = text_of(TextExtractor::default().extract(PAGE.as_bytes(), "text/html").unwrap());
        assert_eq!(result.title.as_deref(), Some("X"));
        assert_eq!(result.url.as_deref(), Some("http://y"));
        assert!(result.text.contains("Hello world"));
        assert!(result.text.contains("keep"));
        assert!(!result.text.contains("bad()"));
        assert!(!result.text.contains("skip"));
    }

    #[test]
    fn test_html_anchor_rules() {
        let result = parse_html(
            r#"<body><a>plain</a> <a href="">empty</a> <a href="HTTPS://x">upper</a> <a href="page.html">rel</a></body>"#,
        );
        assert!(result.text.contains("plain"));
        assert!(result.text.contains("empty"));
        assert!(result.text.contains("upper"));
        assert!(!result.text.contains("rel"));
        assert_eq!(result.title, None);
        assert_eq!(result.url, None);
    }

    #[test]
    fn test_html_nested_text_in_internal_anchor() {
        let result = parse_html(r#"<body><p>a</p><a href="/x"><b>nav</b></a><p>b</p></body>"#);
        assert!(!result.text.contains("nav"));
        assert!(result.text.contains('a'));
        assert!(result.text.contains('b'));
    }

    #[test]
    fn test_html_decodes_entities() {
        let result = parse_html("<p>fish &amp; chips</p>");
        assert!(result.text.contains("fish & chips"));
    }

    #[test]
    fn test_plain_text_collapse() {
        let result = text_of(
            TextExtractor::default()
                .extract(b"a\n\n  b\t c", "text/plain")
                .unwrap(),
        );
        assert_eq!(result.text, "a b c");
        assert_eq!(result.title, None);
    }

    #[test]
    fn test_plain_text_strips_tags() {
        let result = text_of(
            TextExtractor::default()
                .extract(b"<b>bold</b>\n<!-- note -->text", "text/markdown")
                .unwrap(),
        );
        assert_eq!(result.text, "bold text");
    }

    #[test]
    fn test_json_object_and_array() {
        let extractor = TextExtractor::default();
        let object = extractor.extract(br#"{"title":"t"}"#, "application/json").unwrap();
        assert!(matches!(object, Extracted::Json(serde_json::Value::Object(_))));

        let array = extractor.extract(br#"[{"a":1},{"a":2}]"#, "application/json").unwrap();
        match array {
            Extracted::Json(serde_json::Value::Array(items)) => assert_eq!(items.len(), 2),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_invalid_json() {
        let result = TextExtractor::default().extract(b"{nope", "application/json");
        assert!(matches!(result, Err(Error::Json(_))));
    }

    #[test]
    fn test_unsupported_media_type() {
        let result = TextExtractor::default().extract(b"\x89PNG", "image/png");
        assert!(matches!(result, Err(Error::UnsupportedMediaType(_))));
    }

    #[test]
    fn test_sanitize_mode() {
        let extractor = TextExtractor::new(true);
        let result = text_of(
            extractor
                .extract(b"Page 12 Header\n\n- The actual body.", "text/plain")
                .unwrap(),
        );
        assert_eq!(result.text, " - The actual body.");
    }
}
