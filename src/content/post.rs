//! Normalized post models

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// A post as shown in the list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostSummary {
    /// Slug used in the post URL
    pub uid: Option<String>,

    /// Formatted publication date, absent for unpublished documents
    pub first_publication_date: Option<String>,

    pub data: SummaryData,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryData {
    pub title: String,
    pub subtitle: String,
    pub author: String,
}

/// A full post ready for rendering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostDetail {
    pub uid: Option<String>,

    pub first_publication_date: Option<DateTime<FixedOffset>>,

    pub data: DetailData,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetailData {
    pub title: String,
    pub banner: Banner,
    pub author: String,
    pub content: Vec<ContentBlock>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Banner {
    pub url: String,
}

/// One section of a post: a heading followed by body fragments
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentBlock {
    pub heading: String,
    pub body: Vec<BodyFragment>,
}

/// A rendered HTML fragment of a section body
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BodyFragment {
    pub html: String,
}

impl PostDetail {
    /// Estimated minutes to read at `words_per_minute`
    pub fn reading_time(&self, words_per_minute: u32) -> u32 {
        super::reading_time::estimate_with(&self.data.content, words_per_minute)
    }
}
