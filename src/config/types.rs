use serde::Deserialize;

/// Main configuration structure for md-crawler
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub renderer: RendererConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Crawl bounds and optional features
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Maximum number of pages dispatched to the renderer
    #[serde(rename = "max-pages")]
    pub max_pages: u32,

    /// Maximum crawl depth from the seeds (0 = unlimited)
    #[serde(rename = "max-depth")]
    pub max_depth: u32,

    /// Maximum number of renders in flight at once
    pub workers: u32,

    /// Mirror images under `<output-dir>/assets`
    #[serde(rename = "download-assets")]
    pub download_assets: bool,

    /// Seed the frontier from the site's sitemap
    #[serde(rename = "use-sitemap")]
    pub use_sitemap: bool,

    /// Nesting limit for sitemap-of-sitemaps expansion
    #[serde(rename = "max-sitemap-depth")]
    pub max_sitemap_depth: u32,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_pages: 10,
            max_depth: 1,
            workers: 1,
            download_assets: false,
            use_sitemap: false,
            max_sitemap_depth: 5,
        }
    }
}

/// Settings for the default HTTP renderer
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// User-Agent header sent with every request
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,

    /// Fixed wait after a page has been fetched (milliseconds)
    #[serde(rename = "settle-ms")]
    pub settle_ms: u64,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("md-crawler/{}", env!("CARGO_PKG_VERSION")),
            timeout_secs: 30,
            settle_ms: 0,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory the mirror is written into
    #[serde(rename = "output-dir")]
    pub output_dir: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            output_dir: "mirror".to_string(),
        }
    }
}
