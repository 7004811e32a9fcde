//! Crawl report
//!
//! Counters and skip records collected by the coordinator during a run,
//! printed by the CLI when the crawl finishes.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Why a page or reference was given up on
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SkipReason {
    /// The renderer failed; the page was not saved
    Render(String),

    /// The converter failed; the placeholder document was saved instead
    Convert(String),

    /// The page could not be written to disk
    Write(String),

    /// An image could not be mirrored; pages keep its remote URL
    Asset(String),

    /// A sitemap could not be fetched or parsed; its branch added no seeds
    Sitemap(String),
}

impl SkipReason {
    /// Short category name used when grouping skips
    pub fn kind(&self) -> &'static str {
        match self {
            SkipReason::Render(_) => "render",
            SkipReason::Convert(_) => "convert",
            SkipReason::Write(_) => "write",
            SkipReason::Asset(_) => "asset",
            SkipReason::Sitemap(_) => "sitemap",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Render(msg) => write!(f, "render failed: {}", msg),
            SkipReason::Convert(msg) => write!(f, "conversion failed: {}", msg),
            SkipReason::Write(msg) => write!(f, "write failed: {}", msg),
            SkipReason::Asset(msg) => write!(f, "asset download failed: {}", msg),
            SkipReason::Sitemap(msg) => write!(f, "sitemap unavailable: {}", msg),
        }
    }
}

/// One skipped page, asset or sitemap
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkipRecord {
    pub url: String,
    pub reason: SkipReason,
}

/// Summary of a crawl run
#[derive(Debug, Clone)]
pub struct CrawlReport {
    /// The URL the crawl started from
    pub start_url: String,

    /// Where the mirror was written
    pub output_dir: PathBuf,

    /// SHA-256 of the configuration file, if one was loaded
    pub config_hash: Option<String>,

    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,

    /// Pages handed to the renderer
    pub pages_dispatched: u32,

    /// Pages written to disk
    pub pages_saved: u32,

    /// Frontier entries dropped by the depth limit
    pub pages_discarded: u32,

    /// Assets fetched over the network
    pub assets_downloaded: u32,

    /// Seeds contributed by the sitemap
    pub sitemap_seeds: u32,

    /// Every page, asset or sitemap that failed somewhere along the way
    pub skips: Vec<SkipRecord>,
}

impl CrawlReport {
    /// Creates an empty report stamped with the current time
    pub fn new(start_url: impl Into<String>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            start_url: start_url.into(),
            output_dir: output_dir.into(),
            config_hash: None,
            started_at: Utc::now(),
            finished_at: None,
            pages_dispatched: 0,
            pages_saved: 0,
            pages_discarded: 0,
            assets_downloaded: 0,
            sitemap_seeds: 0,
            skips: Vec::new(),
        }
    }

    /// Records a skipped page, asset or sitemap
    pub fn record_skip(&mut self, url: impl Into<String>, reason: SkipReason) {
        let url = url.into();
        tracing::warn!("Skipping {}: {}", url, reason);
        self.skips.push(SkipRecord { url, reason });
    }

    /// Stamps the finish time
    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Wall-clock duration of the run in seconds, once finished
    pub fn duration_seconds(&self) -> Option<i64> {
        self.finished_at
            .map(|finished| (finished - self.started_at).num_seconds())
    }

    /// Skip counts grouped by category, in category order
    pub fn skips_by_kind(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for skip in &self.skips {
            *counts.entry(skip.reason.kind()).or_insert(0) += 1;
        }
        counts
    }
}

/// Prints a report to stdout in a formatted manner
///
/// # Arguments
///
/// * `report` - The report to display
pub fn print_report(report: &CrawlReport) {
    println!("=== Crawl Complete ===\n");

    println!("Overview:");
    println!("  Start URL: {}", report.start_url);
    println!("  Output directory: {}", report.output_dir.display());
    if let Some(hash) = &report.config_hash {
        println!("  Config hash: {}", hash);
    }
    println!("  Started: {}", report.started_at.to_rfc3339());
    if let Some(finished) = report.finished_at {
        println!("  Finished: {}", finished.to_rfc3339());
    }
    if let Some(seconds) = report.duration_seconds() {
        println!("  Duration: {}s", seconds);
    }
    println!();

    println!("Pages:");
    println!("  Crawled: {}", report.pages_dispatched);
    println!("  Saved: {}", report.pages_saved);
    println!("  Discarded by depth: {}", report.pages_discarded);
    if report.sitemap_seeds > 0 {
        println!("  Seeded from sitemap: {}", report.sitemap_seeds);
    }
    println!("  Assets downloaded: {}", report.assets_downloaded);
    println!();

    if !report.skips.is_empty() {
        let by_kind: Vec<String> = report
            .skips_by_kind()
            .iter()
            .map(|(kind, count)| format!("{} {}", count, kind))
            .collect();
        println!("Skipped ({}: {}):", report.skips.len(), by_kind.join(", "));
        for skip in &report.skips {
            println!("  - {} ({})", skip.url, skip.reason);
        }
        println!();
    }
}
