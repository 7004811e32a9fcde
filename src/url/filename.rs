use sha2::{Digest, Sha256};
use url::Url;

/// Number of hex characters of the query digest appended to a page stem
const QUERY_DIGEST_LEN: usize = 8;

/// Replaces every character outside `[A-Za-z0-9_-]` with `_`, collapses
/// runs of `_` and strips the leading `_`
///
/// The result may be empty; callers pick their own fallback.
///
/// # Examples
///
/// ```
/// use md_crawler::url::sanitize_component;
///
/// assert_eq!(sanitize_component("/docs/getting started.html"), "docs_getting_started_html");
/// assert_eq!(sanitize_component("///"), "");
/// ```
pub fn sanitize_component(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        let c = if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
            c
        } else {
            '_'
        };
        if c == '_' && (out.is_empty() || out.ends_with('_')) {
            // Collapses runs and drops the leading underscore in one go
            continue;
        }
        out.push(c);
    }
    out
}

/// Derives the local Markdown filename for a canonical page URL
///
/// A trailing `/` names the directory's `index`. A non-empty query string
/// adds an 8-character hex digest of the query, so `?a=1` and `?a=2` on the
/// same path never share a file.
///
/// # Examples
///
/// ```
/// use md_crawler::url::page_filename;
/// use url::Url;
///
/// let url = Url::parse("https://ex.com/guide/intro").unwrap();
/// assert_eq!(page_filename(&url), "guide_intro.md");
///
/// let url = Url::parse("https://ex.com/").unwrap();
/// assert_eq!(page_filename(&url), "index.md");
/// ```
pub fn page_filename(url: &Url) -> String {
    let path = url.path();
    let path = if path.ends_with('/') {
        format!("{}index", path)
    } else {
        path.to_string()
    };

    let mut stem = sanitize_component(&path);
    if stem.is_empty() {
        stem = "index".to_string();
    }

    match url.query() {
        Some(query) if !query.is_empty() => {
            format!("{}_{}.md", stem, query_digest(query))
        }
        _ => format!("{}.md", stem),
    }
}

/// Short hex digest identifying a query string
///
/// The first 8 hex characters of the query's SHA-256. Filenames only need
/// to be stable across runs of this tool.
pub fn query_digest(query: &str) -> String {
    let digest = hex::encode(Sha256::digest(query.as_bytes()));
    digest[..QUERY_DIGEST_LEN].to_string()
}

/// Derives the local filename for an asset URL from its path basename
///
/// The extension is kept; stem and extension are sanitized separately.
pub fn asset_filename(url: &Url) -> String {
    let basename = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .unwrap_or("");
    asset_name_from_basename(basename)
}

/// Extracts the asset filename a Markdown image destination refers to
///
/// Works on absolute and relative destinations alike, since only the last
/// path segment matters.
pub fn reference_asset_name(reference: &str) -> Option<String> {
    let path = reference
        .split(|c| c == '?' || c == '#')
        .next()
        .unwrap_or("");
    let basename = path.rsplit('/').next().unwrap_or("");
    if basename.is_empty() {
        return None;
    }
    Some(asset_name_from_basename(basename))
}

fn asset_name_from_basename(basename: &str) -> String {
    let (stem, extension) = match basename.rfind('.') {
        Some(idx) if idx > 0 => (&basename[..idx], &basename[idx + 1..]),
        _ => (basename, ""),
    };

    let mut stem = sanitize_component(stem);
    if stem.is_empty() {
        stem = "asset".to_string();
    }

    let extension = sanitize_component(extension);
    if extension.is_empty() {
        stem
    } else {
        format!("{}.{}", stem, extension)
    }
}
