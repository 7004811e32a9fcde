//! Asset cache
//!
//! Mirrors images under `<output-dir>/assets/`. A file already on disk is the
//! cache hit; there is no content hashing, so two assets sharing a basename
//! overwrite each other.

use crate::url::asset_filename;
use reqwest::Client;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;

/// Directory under the output root that holds assets
pub const ASSETS_DIR: &str = "assets";

/// Why an asset could not be mirrored
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Downloads assets once and remembers where they went
#[derive(Debug)]
pub struct AssetCache {
    enabled: bool,
    output_root: PathBuf,
    client: Client,

    /// Asset filename -> path relative to the output root
    local_paths: HashMap<String, String>,

    /// Number of files actually fetched in this run
    downloaded: u32,
}

impl AssetCache {
    /// Creates a cache writing under `output_root/assets`
    ///
    /// When `enabled` is false every asset keeps its remote URL.
    pub fn new(enabled: bool, output_root: impl Into<PathBuf>, client: Client) -> Self {
        Self {
            enabled,
            output_root: output_root.into(),
            client,
            local_paths: HashMap::new(),
            downloaded: 0,
        }
    }

    /// A cache that never downloads anything
    pub fn disabled() -> Self {
        Self::new(false, PathBuf::new(), Client::new())
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Mirrors `url` and returns its path relative to the output root
    ///
    /// An asset already on disk is not fetched again. When downloads are
    /// disabled the URL itself is returned.
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - The reference pages should use for the asset
    /// * `Err(AssetError)` - The download failed; the asset stays remote
    pub async fn localize(&mut self, url: &Url) -> Result<String, AssetError> {
        if !self.enabled {
            return Ok(url.to_string());
        }

        let name = asset_filename(url);
        let relative = format!("{}/{}", ASSETS_DIR, name);
        let target = self.output_root.join(ASSETS_DIR).join(&name);

        if !target.exists() {
            self.download(url, &target).await?;
            self.downloaded += 1;
            tracing::debug!("Downloaded asset {} -> {}", url, relative);
        }

        self.local_paths.insert(name, relative.clone());
        Ok(relative)
    }

    async fn download(&self, url: &Url, target: &Path) -> Result<(), AssetError> {
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AssetError::Status(status.as_u16()));
        }
        let bytes = response.bytes().await?;

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(target, &bytes).await?;
        Ok(())
    }

    /// Local path of a previously localized asset, by filename
    pub fn lookup(&self, name: &str) -> Option<&str> {
        self.local_paths.get(name).map(String::as_str)
    }

    /// Number of files fetched over the network in this run
    pub fn downloaded(&self) -> u32 {
        self.downloaded
    }
}
