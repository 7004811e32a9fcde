//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the main crawl loop that coordinates all aspects of
//! the crawling process, including:
//! - Seeding the frontier from the start URL and, optionally, the sitemap
//! - Dispatching renders to a bounded set of concurrent tasks
//! - Converting, rewriting and persisting each rendered page
//! - Extracting links and growing the frontier
//! - Recording the crawl report
//!
//! The coordinator is the only owner of the crawl session. Render tasks get a
//! URL and hand back page source; every registry, budget and frontier update
//! happens here, one completed page at a time.

use crate::config::{validate, Config};
use crate::crawler::renderer::{build_http_client, HttpRenderer, RenderError, RenderedPage, Renderer};
use crate::crawler::scheduler::{FrontierEntry, Scheduler};
use crate::crawler::sitemap::SitemapSeeder;
use crate::output::{
    convert_or_placeholder, prepare_markup, rewrite_markdown, source_name_for, write_page,
    AssetCache, CrawlReport, DocumentConverter, HtmdConverter, SkipReason,
};
use crate::state::CrawlSession;
use crate::url::Canonicalizer;
use crate::{CrawlError, Result};
use reqwest::Client;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use url::Url;

type RenderOutcome = (FrontierEntry, std::result::Result<RenderedPage, RenderError>);

/// Main crawler coordinator structure
pub struct Coordinator {
    config: Arc<Config>,
    start_url: Url,
    output_dir: PathBuf,
    client: Client,
    renderer: Arc<dyn Renderer>,
    converter: Arc<dyn DocumentConverter>,
    session: CrawlSession,
    scheduler: Scheduler,
    assets: AssetCache,
    report: CrawlReport,
}

impl Coordinator {
    /// Creates a coordinator with the default HTTP renderer and converter
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    /// * `start_url` - Where the crawl starts; also fixes the crawl domain
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(CrawlError)` - Invalid configuration or start URL
    pub fn new(config: Config, start_url: &str) -> Result<Self> {
        let client = build_http_client(&config.renderer)?;
        let renderer = HttpRenderer::with_client(
            client.clone(),
            Duration::from_millis(config.renderer.settle_ms),
        );
        Self::build(
            config,
            start_url,
            client,
            Arc::new(renderer),
            Arc::new(HtmdConverter::new()),
        )
    }

    /// Creates a coordinator around caller-supplied collaborators
    ///
    /// The HTTP client built from the configuration is still used for the
    /// sitemap and for assets.
    pub fn with_collaborators(
        config: Config,
        start_url: &str,
        renderer: Arc<dyn Renderer>,
        converter: Arc<dyn DocumentConverter>,
    ) -> Result<Self> {
        let client = build_http_client(&config.renderer)?;
        Self::build(config, start_url, client, renderer, converter)
    }

    fn build(
        config: Config,
        start_url: &str,
        client: Client,
        renderer: Arc<dyn Renderer>,
        converter: Arc<dyn DocumentConverter>,
    ) -> Result<Self> {
        validate(&config)?;

        let parsed = Url::parse(start_url.trim())?;
        let canonicalizer = Canonicalizer::from_start_url(&parsed)?;
        let start_url = canonicalizer.try_normalize(&parsed, parsed.as_str())?;
        tracing::debug!(
            "Crawl domain: {}",
            canonicalizer.domain().unwrap_or_default()
        );

        let output_dir = PathBuf::from(&config.output.output_dir);
        let assets = AssetCache::new(
            config.crawler.download_assets,
            output_dir.clone(),
            client.clone(),
        );
        let session = CrawlSession::new(
            canonicalizer,
            config.crawler.max_pages,
            config.crawler.max_depth,
        );
        let report = CrawlReport::new(start_url.as_str(), output_dir.clone());

        Ok(Self {
            config: Arc::new(config),
            start_url,
            output_dir,
            client,
            renderer,
            converter,
            session,
            scheduler: Scheduler::new(),
            assets,
            report,
        })
    }

    /// Attaches the configuration file's hash to the report
    pub fn with_config_hash(mut self, hash: impl Into<String>) -> Self {
        self.report.config_hash = Some(hash.into());
        self
    }

    /// Runs the main crawl loop
    ///
    /// This is the core crawling logic that:
    /// 1. Seeds the frontier (sitemap first, then the start URL)
    /// 2. Keeps up to `workers` renders in flight
    /// 3. Converts, rewrites and saves each page as its render completes
    /// 4. Enqueues the page's links one level deeper
    ///
    /// Stops when the frontier is empty or the page budget is spent; renders
    /// already in flight are finished and saved.
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlReport)` - The crawl ran to completion
    /// * `Err(CrawlError)` - The output directory could not be created
    pub async fn run(mut self) -> Result<CrawlReport> {
        tokio::fs::create_dir_all(&self.output_dir).await?;

        tracing::info!(
            "Starting crawl of {} (max {} pages, depth limit {}, {} workers)",
            self.start_url,
            self.config.crawler.max_pages,
            self.config.crawler.max_depth,
            self.config.crawler.workers
        );

        self.seed().await;

        let workers = self.config.crawler.workers.max(1) as usize;
        let mut in_flight: JoinSet<RenderOutcome> = JoinSet::new();

        loop {
            while in_flight.len() < workers {
                let Some(entry) = self.scheduler.next_dispatch(&mut self.session) else {
                    break;
                };
                self.report.pages_dispatched += 1;
                tracing::info!(
                    "Crawling [{}/{}]: {} (depth {})",
                    self.report.pages_dispatched,
                    self.config.crawler.max_pages,
                    entry.url,
                    entry.depth
                );

                let renderer = Arc::clone(&self.renderer);
                in_flight.spawn(async move {
                    let result = renderer.render(&entry.url).await;
                    (entry, result)
                });
            }

            let Some(joined) = in_flight.join_next().await else {
                break;
            };
            match joined {
                Ok((entry, result)) => self.handle_rendered(entry, result).await,
                Err(e) => tracing::error!("Render task failed: {}", e),
            }
        }

        self.report.pages_discarded = self.scheduler.discarded();
        self.report.assets_downloaded = self.assets.downloaded();
        self.report.finish();

        tracing::info!(
            "Crawl completed: {} pages crawled, {} saved, {} skipped, {} filenames assigned",
            self.report.pages_dispatched,
            self.report.pages_saved,
            self.report.skips.len(),
            self.session.registry().len()
        );

        Ok(self.report)
    }

    /// Renders the start URL and returns its rewritten Markdown
    ///
    /// The frontier is never touched and nothing is written to the mirror.
    pub async fn single_page(mut self) -> Result<String> {
        let url = self.start_url.clone();
        let page = self
            .renderer
            .render(&url)
            .await
            .map_err(|source| CrawlError::Render {
                url: url.to_string(),
                source,
            })?;

        self.session.path_for(&url);
        Ok(self.process_page(&page).await)
    }

    /// Fills the frontier with the sitemap's URLs and then the start URL
    async fn seed(&mut self) {
        if self.config.crawler.use_sitemap {
            let seeder = SitemapSeeder::new(
                self.client.clone(),
                self.config.crawler.max_sitemap_depth,
            );
            let seeds = seeder
                .discover(&self.start_url, self.session.canonicalizer())
                .await;

            for (sitemap, error) in seeds.failures {
                self.report
                    .record_skip(sitemap.as_str(), SkipReason::Sitemap(error.to_string()));
            }
            for url in seeds.urls {
                if self.scheduler.enqueue(&mut self.session, url, 0) {
                    self.report.sitemap_seeds += 1;
                }
            }
            tracing::info!("Sitemap contributed {} seeds", self.report.sitemap_seeds);
        }

        let start = self.start_url.clone();
        self.scheduler.enqueue(&mut self.session, start, 0);
    }

    /// Handles one finished render
    async fn handle_rendered(
        &mut self,
        entry: FrontierEntry,
        result: std::result::Result<RenderedPage, RenderError>,
    ) {
        self.session.mark_visited(&entry.url);

        let page = match result {
            Ok(page) => page,
            Err(e) => {
                self.report
                    .record_skip(entry.url.as_str(), SkipReason::Render(e.to_string()));
                return;
            }
        };

        let filename = self.session.path_for(&entry.url);
        let body = self.process_page(&page).await;

        match write_page(&self.output_dir, &filename, &entry.url, &body).await {
            Ok(path) => {
                self.report.pages_saved += 1;
                tracing::debug!("Saved {} -> {}", entry.url, path.display());
            }
            Err(e) => {
                self.report
                    .record_skip(entry.url.as_str(), SkipReason::Write(e.to_string()));
            }
        }

        if self.session.budget().is_exhausted() {
            return;
        }

        let mut queued = 0;
        for href in self.renderer.extract_links(&page) {
            let Some(url) = self.session.canonicalizer().normalize(&page.url, &href) else {
                continue;
            };
            if self.scheduler.enqueue(&mut self.session, url, entry.depth + 1) {
                queued += 1;
            }
        }
        tracing::debug!(
            "{}: {} new links queued, frontier size {}",
            entry.url,
            queued,
            self.scheduler.frontier_size()
        );
    }

    /// Pass 1, asset mirroring, conversion, pass 2, snippet restore
    async fn process_page(&mut self, page: &RenderedPage) -> String {
        let mut prepared = prepare_markup(&page.source, &page.url);
        tracing::trace!("{}: {} images", page.url, prepared.images.len());

        if self.assets.is_enabled() {
            for image in &prepared.images {
                if let Err(e) = self.assets.localize(image).await {
                    self.report
                        .record_skip(image.as_str(), SkipReason::Asset(e.to_string()));
                }
            }
        }

        let (converted, error) = convert_or_placeholder(
            self.converter.as_ref(),
            &prepared.markup,
            &source_name_for(&page.url),
        );
        if let Some(e) = error {
            self.report
                .record_skip(page.url.as_str(), SkipReason::Convert(e.to_string()));
        }

        let (canonicalizer, registry) = self.session.naming_parts();
        let body = rewrite_markdown(&converted, &page.url, canonicalizer, registry, &self.assets);
        prepared.localize(&page.url, canonicalizer, registry, &self.assets);
        prepared.restore(&body)
    }
}

/// Runs a complete crawl with the default collaborators
///
/// # Example
///
/// ```no_run
/// use md_crawler::config::Config;
/// use md_crawler::crawler::run_crawl;
///
/// # async fn example() -> md_crawler::Result<()> {
/// let report = run_crawl(Config::default(), "https://example.com/").await?;
/// println!("{} pages saved", report.pages_saved);
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(config: Config, start_url: &str) -> Result<CrawlReport> {
    Coordinator::new(config, start_url)?.run().await
}
