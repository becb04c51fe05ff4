//! Raw post documents as delivered by the repository

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::lenient::{lenient_seq, lenient_string, nullable};
use crate::richtext::{self, RichText};

/// One document from a search response
///
/// Only the fields the site renders are kept; the rest of the envelope
/// (`id`, `type`, `tags`, ...) is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub uid: Option<String>,

    /// ISO 8601 timestamp, null for documents that were never published
    #[serde(default)]
    pub first_publication_date: Option<String>,

    #[serde(default, deserialize_with = "nullable")]
    pub data: PostData,
}

/// Fields of the `posts` custom type
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PostData {
    pub title: RichText,

    #[serde(deserialize_with = "lenient_string")]
    pub subtitle: String,

    pub author: RichText,

    #[serde(deserialize_with = "nullable")]
    pub banner: Image,

    #[serde(deserialize_with = "lenient_seq")]
    pub content: Vec<ContentBlock>,
}

/// Image field; an empty image is `{}`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Image {
    pub url: Option<String>,
}

/// One entry of the `content` group field
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ContentBlock {
    #[serde(deserialize_with = "heading_text")]
    pub heading: String,
    pub body: RichText,
}

/// Headings are key-text fields, but older documents carry them as rich text
fn heading_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        value @ Value::Array(_) => richtext::as_text(&RichText::from_value(value)),
        _ => String::new(),
    })
}
