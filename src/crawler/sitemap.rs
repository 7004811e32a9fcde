//! Sitemap seeding
//!
//! Finds the site's sitemap at one of the well-known locations and flattens
//! it, following sitemap indexes, into a list of canonical page URLs that
//! seed the frontier.
//!
//! Failures never abort the crawl. A broken branch contributes no URLs and
//! is reported alongside the URLs that were found.

use crate::url::Canonicalizer;
use flate2::read::GzDecoder;
use quick_xml::events::Event;
use quick_xml::reader::Reader;
use reqwest::Client;
use std::collections::HashSet;
use std::io::Read;
use thiserror::Error;
use url::Url;

/// Locations probed, in order, relative to the site root
pub const SITEMAP_LOCATIONS: [&str; 3] = ["/sitemap.xml", "/sitemap_index.xml", "/sitemap.xml.gz"];

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Errors raised while fetching or parsing one sitemap document
#[derive(Debug, Error)]
pub enum SitemapError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("Failed to decompress sitemap: {0}")]
    Gzip(#[from] std::io::Error),

    #[error("Malformed sitemap XML: {0}")]
    Xml(#[from] quick_xml::Error),
}

/// `<loc>` entries of one sitemap document, split by their parent element
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SitemapDocument {
    /// Child sitemaps listed in a sitemap index
    pub sitemaps: Vec<String>,

    /// Page URLs listed in a leaf sitemap
    pub urls: Vec<String>,
}

impl SitemapDocument {
    /// Returns true if the document lists other sitemaps
    pub fn is_index(&self) -> bool {
        !self.sitemaps.is_empty()
    }
}

/// Parses a sitemap or sitemap index
///
/// Namespace prefixes are ignored, as are `<loc>` elements outside
/// `<sitemap>` and `<url>`. Mismatched tags are an error.
///
/// # Example
///
/// ```
/// use md_crawler::crawler::parse_sitemap;
///
/// let xml = r#"<urlset><url><loc>https://ex.com/a</loc></url></urlset>"#;
/// let doc = parse_sitemap(xml.as_bytes()).unwrap();
/// assert_eq!(doc.urls, vec!["https://ex.com/a"]);
/// assert!(!doc.is_index());
/// ```
pub fn parse_sitemap(xml: &[u8]) -> Result<SitemapDocument, SitemapError> {
    #[derive(Clone, Copy, PartialEq)]
    enum Parent {
        None,
        Sitemap,
        Url,
    }

    let mut reader = Reader::from_reader(xml);
    reader.trim_text(true);

    let mut doc = SitemapDocument::default();
    let mut buf = Vec::new();
    let mut parent = Parent::None;
    let mut in_loc = false;
    let mut loc = String::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"sitemap" => parent = Parent::Sitemap,
                b"url" => parent = Parent::Url,
                b"loc" => {
                    in_loc = true;
                    loc.clear();
                }
                _ => {}
            },
            Event::Text(t) if in_loc => {
                loc.push_str(&t.unescape()?);
            }
            Event::CData(t) if in_loc => {
                loc.push_str(&String::from_utf8_lossy(&t.into_inner()));
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"loc" => {
                    in_loc = false;
                    let value = loc.trim();
                    if !value.is_empty() {
                        match parent {
                            Parent::Sitemap => doc.sitemaps.push(value.to_string()),
                            Parent::Url => doc.urls.push(value.to_string()),
                            Parent::None => {}
                        }
                    }
                }
                b"sitemap" | b"url" => parent = Parent::None,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(doc)
}

/// Decompresses `body` if it starts with the gzip magic bytes
pub fn maybe_gunzip(body: Vec<u8>) -> Result<Vec<u8>, SitemapError> {
    if !body.starts_with(&GZIP_MAGIC) {
        return Ok(body);
    }
    let mut out = Vec::new();
    GzDecoder::new(body.as_slice()).read_to_end(&mut out)?;
    Ok(out)
}

/// What flattening a sitemap tree produced
#[derive(Debug, Default)]
pub struct SitemapSeeds {
    /// Canonical page URLs, first occurrence only, in discovery order
    pub urls: Vec<Url>,

    /// Sitemaps that could not be fetched or parsed
    pub failures: Vec<(Url, SitemapError)>,
}

/// Discovers seed URLs from a site's sitemap
#[derive(Debug, Clone)]
pub struct SitemapSeeder {
    client: Client,
    max_depth: u32,
}

impl SitemapSeeder {
    /// Creates a seeder
    ///
    /// # Arguments
    ///
    /// * `client` - The HTTP client to use
    /// * `max_depth` - How many levels of sitemap indexes are followed
    pub fn new(client: Client, max_depth: u32) -> Self {
        Self { client, max_depth }
    }

    /// Finds the sitemap and returns the canonical page URLs it lists
    ///
    /// URLs are canonicalized against the sitemap that lists them and
    /// filtered to the crawl domain. Duplicates are removed, keeping the
    /// first occurrence. A site without a sitemap yields nothing and no
    /// failures.
    pub async fn discover(&self, start: &Url, canonicalizer: &Canonicalizer) -> SitemapSeeds {
        let Some(root) = self.locate(start).await else {
            tracing::info!("No sitemap found for {}", start);
            return SitemapSeeds::default();
        };
        tracing::info!("Using sitemap {}", root);
        self.expand(root, canonicalizer).await
    }

    /// Probes the well-known locations and returns the first that answers 2xx
    pub async fn locate(&self, start: &Url) -> Option<Url> {
        for location in SITEMAP_LOCATIONS {
            let Ok(candidate) = start.join(location) else {
                continue;
            };
            match self.client.head(candidate.clone()).send().await {
                Ok(response) if response.status().is_success() => return Some(candidate),
                Ok(response) => {
                    tracing::debug!("Sitemap probe {} -> {}", candidate, response.status());
                }
                Err(e) => {
                    tracing::debug!("Sitemap probe {} failed: {}", candidate, e);
                }
            }
        }
        None
    }

    /// Flattens the sitemap tree rooted at `root`
    ///
    /// Depth-first, in document order. A sitemap is fetched at most once and
    /// indexes nested deeper than `max_depth` are not followed. Each branch
    /// that fails is recorded and the walk carries on with its siblings.
    pub async fn expand(&self, root: Url, canonicalizer: &Canonicalizer) -> SitemapSeeds {
        let mut seen_sitemaps = HashSet::new();
        let mut seen_urls = HashSet::new();
        let mut seeds = SitemapSeeds::default();
        let mut stack = vec![(root, 0u32)];

        while let Some((sitemap_url, depth)) = stack.pop() {
            if !seen_sitemaps.insert(sitemap_url.to_string()) {
                tracing::debug!("Sitemap {} already expanded", sitemap_url);
                continue;
            }

            let doc = match self.fetch_document(&sitemap_url).await {
                Ok(doc) => doc,
                Err(e) => {
                    tracing::debug!("Sitemap {} failed: {}", sitemap_url, e);
                    seeds.failures.push((sitemap_url, e));
                    continue;
                }
            };

            if doc.is_index() {
                if depth + 1 >= self.max_depth {
                    tracing::warn!(
                        "Sitemap {} nests deeper than {} levels, not following",
                        sitemap_url,
                        self.max_depth
                    );
                    continue;
                }
                // Reverse so children are visited in document order
                for child in doc.sitemaps.iter().rev() {
                    match sitemap_url.join(child.trim()) {
                        Ok(child_url) if matches!(child_url.scheme(), "http" | "https") => {
                            stack.push((child_url, depth + 1));
                        }
                        _ => tracing::debug!("Ignoring child sitemap {:?}", child),
                    }
                }
                continue;
            }

            let before = seeds.urls.len();
            for loc in &doc.urls {
                if let Some(url) = canonicalizer.normalize(&sitemap_url, loc) {
                    if seen_urls.insert(url.to_string()) {
                        seeds.urls.push(url);
                    }
                }
            }
            tracing::debug!(
                "Sitemap {} contributed {} URLs",
                sitemap_url,
                seeds.urls.len() - before
            );
        }

        seeds
    }

    async fn fetch_document(&self, url: &Url) -> Result<SitemapDocument, SitemapError> {
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SitemapError::Status(status.as_u16()));
        }
        let body = response.bytes().await?.to_vec();
        parse_sitemap(&maybe_gunzip(body)?)
    }
}
