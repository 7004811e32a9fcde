//! Page renderer
//!
//! This module handles fetching the page source the rest of the pipeline
//! works on:
//! - The `Renderer` trait, so the crawl loop can be driven by a fake in tests
//! - Building HTTP clients with the configured user agent and timeout
//! - The default `HttpRenderer`, which fetches with a single GET
//! - Error classification for skipped pages

use crate::config::RendererConfig;
use crate::crawler::parser::extract_links;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Why a page could not be rendered
#[derive(Debug, Error)]
pub enum RenderError {
    /// The server answered with a non-2xx status
    #[error("HTTP status {0}")]
    Status(u16),

    /// The request timed out
    #[error("Request timeout")]
    Timeout,

    /// Connection failure, TLS error, redirect loop and the like
    #[error("Network error: {0}")]
    Network(String),

    /// The response body could not be read
    #[error("Failed to read body: {0}")]
    Body(String),
}

impl From<reqwest::Error> for RenderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            RenderError::Timeout
        } else if let Some(status) = e.status() {
            RenderError::Status(status.as_u16())
        } else if e.is_body() || e.is_decode() {
            RenderError::Body(e.to_string())
        } else {
            RenderError::Network(e.to_string())
        }
    }
}

/// A fetched page, ready for conversion
#[derive(Debug, Clone)]
pub struct RenderedPage {
    /// The URL that was requested
    pub url: Url,

    /// Full page source
    pub source: String,
}

/// Produces the page source for a URL
///
/// Implementations are expected to block until the page is ready; failures
/// make the crawler skip the page.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Renders the page at `url`
    async fn render(&self, url: &Url) -> Result<RenderedPage, RenderError>;

    /// Returns the raw hrefs of every outbound link on a rendered page
    ///
    /// The default parses the already rendered source, so a page is never
    /// navigated twice.
    fn extract_links(&self, page: &RenderedPage) -> Vec<String> {
        extract_links(&page.source, &page.url)
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The renderer configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use md_crawler::config::RendererConfig;
/// use md_crawler::crawler::build_http_client;
///
/// let client = build_http_client(&RendererConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &RendererConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Renderer backed by plain HTTP GET requests
///
/// Pages are taken as served; no script runs. `settle_ms` adds a fixed wait
/// after each fetch.
#[derive(Debug, Clone)]
pub struct HttpRenderer {
    client: Client,
    settle: Duration,
}

impl HttpRenderer {
    /// Creates a renderer with a client built from `config`
    pub fn new(config: &RendererConfig) -> Result<Self, reqwest::Error> {
        Ok(Self::with_client(
            build_http_client(config)?,
            Duration::from_millis(config.settle_ms),
        ))
    }

    /// Creates a renderer around an existing client
    pub fn with_client(client: Client, settle: Duration) -> Self {
        Self { client, settle }
    }
}

#[async_trait]
impl Renderer for HttpRenderer {
    async fn render(&self, url: &Url) -> Result<RenderedPage, RenderError> {
        tracing::debug!("Fetching {}", url);

        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(RenderError::Status(status.as_u16()));
        }

        let source = response
            .text()
            .await
            .map_err(|e| RenderError::Body(e.to_string()))?;

        if !self.settle.is_zero() {
            tokio::time::sleep(self.settle).await;
        }

        Ok(RenderedPage {
            url: url.clone(),
            source,
        })
    }
}
