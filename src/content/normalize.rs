//! Raw documents to normalized posts

use anyhow::{anyhow, Result};
use chrono_tz::Tz;

use super::post::{
    Banner, BodyFragment, ContentBlock, DetailData, PostDetail, PostSummary, SummaryData,
};
use crate::cms::Document;
use crate::config::SiteConfig;
use crate::helpers::{parse_timestamp, DateFormatter};
use crate::i18n::Locale;
use crate::richtext::{self, Block};

/// How section bodies are built
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BodyMode {
    /// Every section renders its own body
    #[default]
    PerBlock,
    /// Every section renders the first section's body, as older
    /// builds of the site did
    SharedFirstBlock,
}

/// Turns repository documents into the models the pages render
#[derive(Debug, Clone)]
pub struct Normalizer {
    dates: DateFormatter,
    body_mode: BodyMode,
}

impl Normalizer {
    pub fn new(dates: DateFormatter, body_mode: BodyMode) -> Self {
        Self { dates, body_mode }
    }

    /// Build from the site's language, timezone, date format and post settings
    pub fn from_config(config: &SiteConfig) -> Result<Self> {
        let timezone: Tz = config
            .timezone
            .parse()
            .map_err(|e| anyhow!("Unknown timezone {:?}: {}", config.timezone, e))?;
        let locale = Locale::for_language(&config.language);
        let body_mode = if config.posts.shared_first_body {
            BodyMode::SharedFirstBlock
        } else {
            BodyMode::PerBlock
        };

        Ok(Self::new(
            DateFormatter::new(&config.date_format, locale, timezone),
            body_mode,
        ))
    }

    pub fn dates(&self) -> &DateFormatter {
        &self.dates
    }

    /// Normalize a list record
    pub fn summary(&self, doc: &Document) -> PostSummary {
        PostSummary {
            uid: doc.uid.clone(),
            first_publication_date: self
                .dates
                .format_raw(doc.first_publication_date.as_deref()),
            data: SummaryData {
                title: richtext::as_text(&doc.data.title),
                subtitle: doc.data.subtitle.clone(),
                author: richtext::as_text(&doc.data.author),
            },
        }
    }

    /// Normalize every record of a page, keeping their order
    pub fn summaries(&self, docs: &[Document]) -> Vec<PostSummary> {
        docs.iter().map(|doc| self.summary(doc)).collect()
    }

    /// Normalize a full post
    pub fn detail(&self, doc: &Document) -> PostDetail {
        let content = &doc.data.content;
        let shared = match self.body_mode {
            BodyMode::SharedFirstBlock => content.first().map(|block| block.body.blocks()),
            BodyMode::PerBlock => None,
        };

        let content = content
            .iter()
            .map(|block| ContentBlock {
                heading: block.heading.clone(),
                body: body_fragments(shared.unwrap_or(block.body.blocks())),
            })
            .collect();

        PostDetail {
            uid: doc.uid.clone(),
            first_publication_date: doc
                .first_publication_date
                .as_deref()
                .and_then(parse_timestamp),
            data: DetailData {
                title: richtext::as_text(&doc.data.title),
                banner: Banner {
                    url: doc.data.banner.url.clone().unwrap_or_default(),
                },
                author: richtext::as_text(&doc.data.author),
                content,
            },
        }
    }
}

/// One HTML fragment per body block
fn body_fragments(blocks: &[Block]) -> Vec<BodyFragment> {
    blocks
        .iter()
        .map(|block| BodyFragment {
            html: richtext::as_html(std::slice::from_ref(block)),
        })
        .collect()
}
