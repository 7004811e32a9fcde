//! State module for tracking crawl progress
//!
//! This module holds everything the coordinator mutates while a crawl runs.
//!
//! # Components
//!
//! - `PageState`: Tracks the state of individual pages (queued, in flight, visited, discarded)
//! - `PathRegistry`: Assigns each canonical URL its local Markdown filename
//! - `CrawlSession`: Ties the two together with the page budget and depth limit

mod page_state;
mod path_registry;
mod session;

// Re-export main types
pub use page_state::PageState;
pub use path_registry::PathRegistry;
pub use session::{CrawlBudget, CrawlSession};
