//! Rendered post pages kept by the server

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// What a finished fetch produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Page(String),
    Missing,
}

/// State of a slug as seen by a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// Rendered within the revalidation window
    Fresh(Arc<str>),
    /// Rendered, but due for a background refresh
    Stale(Arc<str>),
    /// The repository recently had no such post
    Missing,
    /// The first fetch failed and the retry backoff has not passed
    Failed,
    /// First fetch still running
    Pending,
    /// Never fetched
    Absent,
}

#[derive(Debug, Default)]
enum Slot {
    #[default]
    Empty,
    Page {
        html: Arc<str>,
        at: Instant,
    },
    Missing {
        at: Instant,
    },
    Failed {
        at: Instant,
    },
}

#[derive(Debug, Default)]
struct Entry {
    slot: Slot,
    /// Newest ticket issued for this slug
    latest: u64,
    in_flight: bool,
}

/// Per-slug pages with ticketed refreshes
///
/// Every fetch takes a ticket. A result is stored only if no newer ticket
/// was issued for the same slug in the meantime.
///
/// Slugs that only remember a miss or a failure are dropped once those
/// expire, so unknown slugs do not pile up.
pub struct PageCache {
    entries: RwLock<HashMap<String, Entry>>,
    tickets: AtomicU64,
    ttl: Duration,
    retry_after: Duration,
}

/// Wait before asking the repository again for a post whose first fetch failed
pub const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(30);

impl PageCache {
    pub fn new(ttl: Duration) -> Self {
        Self::with_retry_after(ttl, DEFAULT_RETRY_AFTER)
    }

    pub fn with_retry_after(ttl: Duration, retry_after: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            tickets: AtomicU64::new(0),
            ttl,
            retry_after,
        }
    }

    pub async fn lookup(&self, slug: &str) -> Lookup {
        let entries = self.entries.read().await;
        let Some(entry) = entries.get(slug) else {
            return Lookup::Absent;
        };

        match &entry.slot {
            Slot::Page { html, at } if at.elapsed() < self.ttl => Lookup::Fresh(html.clone()),
            Slot::Page { html, .. } => Lookup::Stale(html.clone()),
            Slot::Missing { at } if at.elapsed() < self.ttl => Lookup::Missing,
            Slot::Failed { at } if at.elapsed() < self.retry_after => Lookup::Failed,
            _ if entry.in_flight => Lookup::Pending,
            _ => Lookup::Absent,
        }
    }

    /// Start a fetch unless one is already running for `slug`
    pub async fn try_begin(&self, slug: &str) -> Option<u64> {
        let mut entries = self.entries.write().await;
        self.prune(&mut entries, slug);
        let entry = entries.entry(slug.to_string()).or_default();
        if entry.in_flight {
            return None;
        }
        Some(self.issue(entry))
    }

    /// Start a fetch that supersedes any running one
    pub async fn begin(&self, slug: &str) -> u64 {
        let mut entries = self.entries.write().await;
        self.prune(&mut entries, slug);
        let entry = entries.entry(slug.to_string()).or_default();
        self.issue(entry)
    }

    /// Drop idle entries holding nothing worth serving, before `slug` is added
    fn prune(&self, entries: &mut HashMap<String, Entry>, slug: &str) {
        if entries.contains_key(slug) {
            return;
        }
        let before = entries.len();
        entries.retain(|_, entry| entry.in_flight || !self.expired(&entry.slot));
        if entries.len() < before {
            tracing::debug!("Pruned {} expired cache entries", before - entries.len());
        }
    }

    fn expired(&self, slot: &Slot) -> bool {
        match slot {
            Slot::Empty => true,
            Slot::Page { .. } => false,
            Slot::Missing { at } => at.elapsed() >= self.ttl,
            Slot::Failed { at } => at.elapsed() >= self.retry_after,
        }
    }

    fn issue(&self, entry: &mut Entry) -> u64 {
        let ticket = self.tickets.fetch_add(1, Ordering::SeqCst) + 1;
        entry.latest = ticket;
        entry.in_flight = true;
        ticket
    }

    /// Store a finished fetch
    ///
    /// Returns false, leaving the entry untouched, when a newer ticket exists.
    pub async fn complete(&self, slug: &str, ticket: u64, outcome: Outcome) -> bool {
        let mut entries = self.entries.write().await;
        let entry = entries.entry(slug.to_string()).or_default();
        if ticket < entry.latest {
            tracing::debug!(
                "Discarding result #{} for {:?}, #{} is newer",
                ticket,
                slug,
                entry.latest
            );
            return false;
        }

        entry.slot = match outcome {
            Outcome::Page(html) => Slot::Page {
                html: html.into(),
                at: Instant::now(),
            },
            Outcome::Missing => Slot::Missing { at: Instant::now() },
        };
        entry.in_flight = false;
        true
    }

    /// Record a failed fetch
    ///
    /// A previously rendered page stays and is served stale. Without one the
    /// slug reports [`Lookup::Failed`] until the retry backoff passes.
    pub async fn fail(&self, slug: &str, ticket: u64) {
        let mut entries = self.entries.write().await;
        let Some(entry) = entries.get_mut(slug) else {
            return;
        };
        if ticket < entry.latest {
            return;
        }
        entry.in_flight = false;
        if !matches!(entry.slot, Slot::Page { .. }) {
            entry.slot = Slot::Failed { at: Instant::now() };
        }
    }

    /// Insert a page rendered ahead of time
    pub async fn seed(&self, slug: &str, html: String) {
        let mut entries = self.entries.write().await;
        let entry = entries.entry(slug.to_string()).or_default();
        entry.latest = self.tickets.fetch_add(1, Ordering::SeqCst) + 1;
        entry.slot = Slot::Page {
            html: html.into(),
            at: Instant::now(),
        };
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}
