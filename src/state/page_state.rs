/// Page state definitions for tracking crawl progress
///
/// A URL the session has never seen has no state at all.
use std::fmt;

/// Represents the current state of a page in the crawl process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageState {
    // ===== Active States =====
    /// Page is waiting in the frontier
    Queued,

    /// Page has been dispatched to the renderer
    InFlight,

    // ===== Terminal States =====
    /// Page was dispatched and is finished, whether it was saved or skipped
    Visited,

    /// Page was dropped from the frontier by the depth limit
    Discarded,
}

impl PageState {
    /// Returns true once the page has been handed to the renderer
    ///
    /// Dispatched pages are never fetched again in the same run.
    pub fn is_dispatched(&self) -> bool {
        matches!(self, Self::InFlight | Self::Visited)
    }

    /// Checks whether moving from this state to `next` is allowed
    pub fn can_transition_to(&self, next: PageState) -> bool {
        matches!(
            (self, next),
            (Self::Queued, Self::InFlight)
                | (Self::Queued, Self::Discarded)
                | (Self::InFlight, Self::Visited)
        )
    }

    /// Short lowercase name used in logs and reports
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::InFlight => "in_flight",
            Self::Visited => "visited",
            Self::Discarded => "discarded",
        }
    }
}

impl fmt::Display for PageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
