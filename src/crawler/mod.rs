//! Crawler module for page rendering and crawl orchestration
//!
//! This module contains the core crawling logic, including:
//! - Page rendering behind the `Renderer` trait
//! - HTML link extraction
//! - Frontier scheduling under the page budget and depth limit
//! - Sitemap discovery and expansion
//! - Overall crawl coordination

mod coordinator;
mod parser;
mod renderer;
mod scheduler;
mod sitemap;

pub use coordinator::{run_crawl, Coordinator};
pub use parser::extract_links;
pub use renderer::{build_http_client, HttpRenderer, RenderError, RenderedPage, Renderer};
pub use scheduler::{FrontierEntry, Scheduler};
pub use sitemap::{
    maybe_gunzip, parse_sitemap, SitemapDocument, SitemapError, SitemapSeeder, SitemapSeeds,
    SITEMAP_LOCATIONS,
};
