//! Page document generation
//!
//! Every mirrored page is written to `<output-dir>/<registry filename>` and
//! starts with a header linking back to the live page.

use std::path::{Path, PathBuf};
use url::Url;

/// Formats a mirrored page: source header, rule, converted body
///
/// # Arguments
///
/// * `url` - The page's canonical URL
/// * `body` - The rewritten Markdown
///
/// # Returns
///
/// The full document text
pub fn format_page_document(url: &Url, body: &str) -> String {
    let mut md = String::with_capacity(body.len() + 3 * url.as_str().len() + 32);

    md.push_str(&format!("# [{}]({})\n\n", url, url));
    md.push_str(&format!("**Source URL:** {}\n\n", url));
    md.push_str("---\n\n");
    md.push_str(body);

    md
}

/// Writes a mirrored page into `output_dir`
///
/// # Arguments
///
/// * `output_dir` - The mirror's root directory
/// * `filename` - Name assigned by the path registry
/// * `url` - The page's canonical URL
/// * `body` - The rewritten Markdown
///
/// # Returns
///
/// * `Ok(PathBuf)` - Where the page was written
/// * `Err(io::Error)` - Failed to write the page
pub async fn write_page(
    output_dir: &Path,
    filename: &str,
    url: &Url,
    body: &str,
) -> std::io::Result<PathBuf> {
    let path = output_dir.join(filename);
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(&path, format_page_document(url, body)).await?;
    Ok(path)
}
