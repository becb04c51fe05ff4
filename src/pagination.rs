//! "Load more" pagination over post summaries

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::cms::{ContentSource, Query, Result, ResultPage};
use crate::content::{Normalizer, PostSummary};

/// Summaries shown so far and the token for the next batch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationState {
    pub results: Vec<PostSummary>,
    pub next_page: Option<String>,
}

impl PaginationState {
    /// Normalize a fetched page into a fresh state
    pub fn from_page(page: &ResultPage, normalizer: &Normalizer) -> Self {
        Self {
            results: normalizer.summaries(&page.results),
            next_page: page.next_page.clone(),
        }
    }

    /// Whether the "load more" trigger should be offered
    pub fn has_more(&self) -> bool {
        self.next_page.is_some()
    }
}

/// Appends successive pages to a [`PaginationState`]
///
/// Loading takes `&mut self`, so a paginator never has two loads in flight.
pub struct Paginator<'a, S: ContentSource + ?Sized> {
    source: &'a S,
    normalizer: &'a Normalizer,
    state: PaginationState,
    seen: Option<HashSet<String>>,
}

impl<'a, S: ContentSource + ?Sized> Paginator<'a, S> {
    /// Continue from an existing state
    pub fn new(source: &'a S, normalizer: &'a Normalizer, state: PaginationState) -> Self {
        Self {
            source,
            normalizer,
            state,
            seen: None,
        }
    }

    /// Run `query` and start from its first page
    pub async fn start(source: &'a S, normalizer: &'a Normalizer, query: &Query) -> Result<Self> {
        let page = source.query(query).await?;
        let state = PaginationState::from_page(&page, normalizer);
        tracing::debug!(
            "First page: {} posts, more: {}",
            state.results.len(),
            state.has_more()
        );
        Ok(Self::new(source, normalizer, state))
    }

    /// Skip summaries whose uid is already listed
    pub fn dedupe(mut self, enabled: bool) -> Self {
        self.seen = enabled.then(|| {
            self.state
                .results
                .iter()
                .filter_map(|post| post.uid.clone())
                .collect()
        });
        self
    }

    pub fn state(&self) -> &PaginationState {
        &self.state
    }

    pub fn into_state(self) -> PaginationState {
        self.state
    }

    pub fn has_more(&self) -> bool {
        self.state.has_more()
    }

    /// Fetch the next batch and append it
    ///
    /// Returns how many summaries were appended. Without a next-page
    /// token this does nothing and returns 0.
    pub async fn load_more(&mut self) -> Result<usize> {
        let Some(token) = self.state.next_page.as_deref() else {
            return Ok(0);
        };

        let page = self.source.fetch_next(token).await?;
        let mut batch = self.normalizer.summaries(&page.results);

        if let Some(seen) = self.seen.as_mut() {
            batch.retain(|post| match &post.uid {
                Some(uid) => seen.insert(uid.clone()),
                None => true,
            });
        }

        let appended = batch.len();
        self.state.results.extend(batch);
        self.state.next_page = page.next_page;

        tracing::debug!(
            "Loaded {} more posts ({} total), more: {}",
            appended,
            self.state.results.len(),
            self.state.has_more()
        );
        Ok(appended)
    }

    /// Keep loading until the repository reports no further page
    ///
    /// Stops early if a token comes back that was already followed.
    pub async fn load_all(&mut self) -> Result<()> {
        let mut followed = HashSet::new();
        while let Some(token) = self.state.next_page.clone() {
            if !followed.insert(token.clone()) {
                tracing::warn!("Pagination token repeated, stopping: {}", token);
                self.state.next_page = None;
                break;
            }
            self.load_more().await?;
        }
        Ok(())
    }
}
