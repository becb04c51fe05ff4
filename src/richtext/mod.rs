//! Rich-text documents
//!
//! A rich-text field is an ordered list of blocks (paragraphs, headings,
//! list items, images, embeds). Each text block carries its plain text plus
//! a list of spans marking inline formatting by UTF-16 offsets.

mod html;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::cms::lenient::{lenient_seq, nullable, seq_from_value};

pub use html::as_html;

/// A rich-text field value
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RichText(Vec<Block>);

impl RichText {
    pub fn new(blocks: Vec<Block>) -> Self {
        Self(blocks)
    }

    /// Build from arbitrary JSON, keeping whatever blocks parse
    ///
    /// A bare string becomes a single paragraph; any other non-array
    /// value becomes an empty document.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::String(text) if text.is_empty() => Self::default(),
            Value::String(text) => Self(vec![Block::paragraph(text)]),
            value => Self(seq_from_value(value)),
        }
    }

    pub fn blocks(&self) -> &[Block] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'de> Deserialize<'de> for RichText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Self::from_value(Value::deserialize(deserializer)?))
    }
}

/// One block of a rich-text document
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Block {
    #[serde(rename = "type")]
    pub kind: BlockKind,

    #[serde(deserialize_with = "nullable")]
    pub text: String,

    #[serde(deserialize_with = "lenient_seq")]
    pub spans: Vec<Span>,

    // Image blocks
    pub url: Option<String>,
    pub alt: Option<String>,
    pub copyright: Option<String>,
    #[serde(rename = "linkTo")]
    pub link_to: Option<LinkData>,

    // Embed blocks
    pub oembed: Option<Embed>,
}

impl Block {
    /// A plain paragraph with no formatting
    pub fn paragraph(text: impl Into<String>) -> Self {
        Self {
            kind: BlockKind::Paragraph,
            text: text.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum BlockKind {
    #[default]
    #[serde(rename = "paragraph")]
    Paragraph,
    #[serde(rename = "heading1")]
    Heading1,
    #[serde(rename = "heading2")]
    Heading2,
    #[serde(rename = "heading3")]
    Heading3,
    #[serde(rename = "heading4")]
    Heading4,
    #[serde(rename = "heading5")]
    Heading5,
    #[serde(rename = "heading6")]
    Heading6,
    #[serde(rename = "preformatted")]
    Preformatted,
    #[serde(rename = "list-item")]
    ListItem,
    #[serde(rename = "o-list-item")]
    OrderedListItem,
    #[serde(rename = "image")]
    Image,
    #[serde(rename = "embed")]
    Embed,
    #[serde(other)]
    Unknown,
}

/// Inline formatting over `start..end` (UTF-16 code units)
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    #[serde(rename = "type")]
    pub kind: SpanKind,
    #[serde(default, deserialize_with = "nullable")]
    pub data: LinkData,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum SpanKind {
    #[serde(rename = "strong")]
    Strong,
    #[serde(rename = "em")]
    Em,
    #[serde(rename = "hyperlink")]
    Hyperlink,
    #[serde(rename = "label")]
    Label,
    #[serde(other)]
    Unknown,
}

/// Link target of a hyperlink span or a linked image; also carries label names
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct LinkData {
    pub link_type: Option<String>,
    pub url: Option<String>,
    pub target: Option<String>,
    pub uid: Option<String>,
    #[serde(rename = "type")]
    pub document_type: Option<String>,
    pub label: Option<String>,
}

impl LinkData {
    /// Resolve the link to an href
    ///
    /// Web and media links carry their own URL; document links are
    /// resolved to the post route by uid.
    pub fn href(&self) -> Option<String> {
        if let Some(url) = self.url.as_deref().filter(|u| !u.is_empty()) {
            return Some(url.to_string());
        }
        match self.link_type.as_deref() {
            Some("Document") => Some(match self.uid.as_deref() {
                Some(uid) => crate::helpers::post_path("/", uid),
                None => "/".to_string(),
            }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Embed {
    pub html: Option<String>,
    pub embed_url: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub provider_name: Option<String>,
}

/// Flatten a rich-text document to plain text
///
/// Block texts are joined with a single space in document order. Blocks
/// without text (images, embeds) count as empty, so they still add a separator.
pub fn as_text(rich: &RichText) -> String {
    rich.blocks()
        .iter()
        .map(|block| block.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rich(value: Value) -> RichText {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_as_text_drops_markup() {
        let title = rich(json!([
            {"type": "heading1", "text": "Hello", "spans": [{"start": 0, "end": 5, "type": "strong"}]}
        ]));
        assert_eq!(as_text(&title), "Hello");
    }

    #[test]
    fn test_as_text_joins_blocks_in_order() {
        let body = rich(json!([
            {"type": "paragraph", "text": "first", "spans": []},
            {"type": "image", "url": "https://images.prismic.io/a.png"},
            {"type": "paragraph", "text": "second", "spans": []}
        ]));
        assert_eq!(as_text(&body), "first  second");
    }

    #[test]
    fn test_as_text_keeps_separator_for_empty_blocks() {
        let body = rich(json!([
            {"type": "paragraph", "text": "", "spans": []},
            {"type": "paragraph", "text": "middle", "spans": []},
            {"type": "embed", "oembed": {}}
        ]));
        assert_eq!(as_text(&body), " middle ");
        assert_eq!(as_text(&rich(json!([]))), "");
    }

    #[test]
    fn test_as_text_is_stable() {
        let author = rich(json!([{"type": "paragraph", "text": "Jane", "spans": []}]));
        assert_eq!(as_text(&author), as_text(&author));
    }

    #[test]
    fn test_malformed_input_degrades() {
        assert!(rich(json!(null)).is_empty());
        assert!(rich(json!({"text": "object"})).is_empty());
        assert_eq!(as_text(&rich(json!("plain"))), "plain");

        let partial = rich(json!([
            42,
            {"type": "paragraph", "text": null},
            {"type": "mystery", "text": "kept", "spans": [{"start": "x"}]}
        ]));
        assert_eq!(partial.blocks().len(), 2);
        assert_eq!(partial.blocks()[1].kind, BlockKind::Unknown);
        assert!(partial.blocks()[1].spans.is_empty());
        assert_eq!(as_text(&partial), " kept");
    }

    #[test]
    fn test_document_link_href() {
        let link = LinkData {
            link_type: Some("Document".to_string()),
            uid: Some("como-utilizar-hooks".to_string()),
            ..LinkData::default()
        };
        assert_eq!(link.href().as_deref(), Some("/post/como-utilizar-hooks/"));

        let web = LinkData {
            link_type: Some("Web".to_string()),
            url: Some("https://rust-lang.org".to_string()),
            ..LinkData::default()
        };
        assert_eq!(web.href().as_deref(), Some("https://rust-lang.org"));
        assert_eq!(LinkData::default().href(), None);
    }
}
