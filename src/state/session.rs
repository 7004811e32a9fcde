use crate::state::{PageState, PathRegistry};
use crate::url::Canonicalizer;
use std::collections::HashMap;
use std::sync::Arc;
use url::Url;

/// Page budget and depth limit for a crawl
///
/// The page count is reserved when a page is dispatched, never when it
/// finishes, so concurrent renders can't push the run past `max_pages`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlBudget {
    /// Pages dispatched to the renderer so far
    pub pages_crawled: u32,

    /// Upper bound on dispatched pages
    pub max_pages: u32,

    /// Depth limit; 0 disables it
    pub depth_limit: u32,
}

impl CrawlBudget {
    /// Creates a fresh budget
    pub fn new(max_pages: u32, depth_limit: u32) -> Self {
        Self {
            pages_crawled: 0,
            max_pages,
            depth_limit,
        }
    }

    /// Returns true once no further pages may be dispatched
    pub fn is_exhausted(&self) -> bool {
        self.pages_crawled >= self.max_pages
    }

    /// Reserves one page of budget
    ///
    /// # Returns
    ///
    /// * `true` - The page may be dispatched
    /// * `false` - The budget is already used up
    pub fn try_reserve(&mut self) -> bool {
        if self.is_exhausted() {
            return false;
        }
        self.pages_crawled += 1;
        true
    }

    /// Checks whether a page at `depth` may be dispatched
    pub fn admits_depth(&self, depth: u32) -> bool {
        self.depth_limit == 0 || depth < self.depth_limit
    }
}

/// All mutable state of one crawl
///
/// Owned by the coordinator; render tasks never touch it. Every lookup is
/// keyed by the canonical URL string.
#[derive(Debug)]
pub struct CrawlSession {
    canonicalizer: Canonicalizer,
    registry: PathRegistry,
    states: HashMap<String, PageState>,
    budget: CrawlBudget,
}

impl CrawlSession {
    /// Creates a session for a crawl scoped by `canonicalizer`
    pub fn new(canonicalizer: Canonicalizer, max_pages: u32, depth_limit: u32) -> Self {
        Self {
            canonicalizer,
            registry: PathRegistry::new(),
            states: HashMap::new(),
            budget: CrawlBudget::new(max_pages, depth_limit),
        }
    }

    pub fn canonicalizer(&self) -> &Canonicalizer {
        &self.canonicalizer
    }

    pub fn registry(&self) -> &PathRegistry {
        &self.registry
    }

    /// Splits the session into the canonicalizer and a mutable registry
    ///
    /// The rewriter needs both at once.
    pub fn naming_parts(&mut self) -> (&Canonicalizer, &mut PathRegistry) {
        (&self.canonicalizer, &mut self.registry)
    }

    pub fn budget(&self) -> &CrawlBudget {
        &self.budget
    }

    /// Returns the filename for `url`, registering it if needed
    pub fn path_for(&mut self, url: &Url) -> Arc<str> {
        self.registry.path_for(url)
    }

    /// Returns the state of `url`, or `None` if it was never seen
    pub fn state_of(&self, url: &Url) -> Option<PageState> {
        self.states.get(url.as_str()).copied()
    }

    /// Returns true if `url` was already dispatched in this run
    pub fn is_visited(&self, url: &Url) -> bool {
        self.state_of(url).is_some_and(|s| s.is_dispatched())
    }

    /// Records `url` as queued if the session has never seen it
    ///
    /// # Returns
    ///
    /// `true` if the URL was new and should be pushed onto the frontier.
    pub fn mark_queued(&mut self, url: &Url) -> bool {
        if self.states.contains_key(url.as_str()) {
            return false;
        }
        self.states.insert(url.to_string(), PageState::Queued);
        true
    }

    /// Reserves budget and moves `url` to `InFlight`
    ///
    /// Fails if the page was already dispatched or the budget is spent.
    pub fn try_dispatch(&mut self, url: &Url) -> bool {
        if self.is_visited(url) {
            return false;
        }
        if !self.budget.try_reserve() {
            return false;
        }
        self.states.insert(url.to_string(), PageState::InFlight);
        true
    }

    /// Marks a dispatched page as finished
    pub fn mark_visited(&mut self, url: &Url) {
        self.set_state(url, PageState::Visited);
    }

    /// Marks a queued page as dropped by the depth limit
    pub fn mark_discarded(&mut self, url: &Url) {
        self.set_state(url, PageState::Discarded);
    }

    fn set_state(&mut self, url: &Url, next: PageState) {
        let entry = self
            .states
            .entry(url.to_string())
            .or_insert(PageState::Queued);
        if !entry.can_transition_to(next) {
            tracing::debug!("Unexpected transition for {}: {} -> {}", url, entry, next);
        }
        *entry = next;
    }
}
