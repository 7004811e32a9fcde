//! Scheduler for managing the crawl frontier
//!
//! This module handles:
//! - The FIFO frontier queue (breadth-first order)
//! - Deduplication of discovered URLs against the crawl session
//! - Depth-limit rejection
//! - Budget-checked dispatch

use crate::state::CrawlSession;
use std::collections::VecDeque;
use url::Url;

/// A URL waiting in the frontier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontierEntry {
    /// Canonical URL to fetch
    pub url: Url,

    /// Link distance from the seeds (0 for seeds)
    pub depth: u32,
}

impl FrontierEntry {
    pub fn new(url: Url, depth: u32) -> Self {
        Self { url, depth }
    }
}

/// Scheduler owns the frontier and decides what is dispatched next
///
/// All bookkeeping goes through the `CrawlSession`, so a URL is queued at
/// most once per run and a dispatched URL is never dispatched again.
#[derive(Debug, Default)]
pub struct Scheduler {
    /// Frontier queue of URLs to fetch, oldest first
    frontier: VecDeque<FrontierEntry>,

    /// Entries dropped by the depth limit so far
    discarded: u32,
}

impl Scheduler {
    /// Creates a scheduler with an empty frontier
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a URL to the back of the frontier if the session has never seen it
    ///
    /// # Arguments
    ///
    /// * `session` - The crawl session used for deduplication
    /// * `url` - A canonical URL
    /// * `depth` - Depth of the new entry
    ///
    /// # Returns
    ///
    /// `true` if the URL was queued, `false` if it was already known
    pub fn enqueue(&mut self, session: &mut CrawlSession, url: Url, depth: u32) -> bool {
        if !session.mark_queued(&url) {
            return false;
        }
        tracing::trace!("Queued {} at depth {}", url, depth);
        self.frontier.push_back(FrontierEntry::new(url, depth));
        true
    }

    /// Takes the next entry that may be fetched
    ///
    /// Entries already dispatched are skipped. Entries at or beyond the depth
    /// limit are discarded. The page budget is reserved before the entry is
    /// returned.
    ///
    /// # Returns
    ///
    /// * `Some(FrontierEntry)` - A URL that's ready to fetch, now `InFlight`
    /// * `None` - The frontier is empty or the budget is spent
    pub fn next_dispatch(&mut self, session: &mut CrawlSession) -> Option<FrontierEntry> {
        while !session.budget().is_exhausted() {
            let entry = self.frontier.pop_front()?;

            if session.is_visited(&entry.url) {
                tracing::trace!("Skipping already visited {}", entry.url);
                continue;
            }

            if !session.budget().admits_depth(entry.depth) {
                tracing::debug!(
                    "Discarding {} (depth {} >= limit {})",
                    entry.url,
                    entry.depth,
                    session.budget().depth_limit
                );
                session.mark_discarded(&entry.url);
                self.discarded += 1;
                continue;
            }

            if session.try_dispatch(&entry.url) {
                return Some(entry);
            }
        }
        None
    }

    /// Returns the number of URLs in the frontier
    pub fn frontier_size(&self) -> usize {
        self.frontier.len()
    }

    /// Returns whether the frontier is empty
    pub fn is_empty(&self) -> bool {
        self.frontier.is_empty()
    }

    /// Number of entries dropped by the depth limit
    pub fn discarded(&self) -> u32 {
        self.discarded
    }
}
