//! Document conversion
//!
//! Turns page markup into Markdown. Conversion is best-effort: an error or
//! an empty result is replaced by a fixed placeholder document so a page is
//! never dropped because of its content.

use thiserror::Error;

/// Written in place of a page body that could not be converted
pub const PLACEHOLDER_DOCUMENT: &str =
    "# Error converting content\n\n[Original HTML content could not be parsed]";

/// Why a document could not be converted
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("Conversion failed for {source_name}: {message}")]
    Failed {
        source_name: String,
        message: String,
    },

    #[error("Conversion of {0} produced no content")]
    Empty(String),
}

/// Converts markup to Markdown
pub trait DocumentConverter: Send + Sync {
    /// Converts `markup`; `source_name` identifies the document in errors
    fn convert(&self, markup: &str, source_name: &str) -> Result<String, ConvertError>;
}

/// Converter backed by `htmd`
///
/// `script`, `style` and `noscript` elements are dropped.
pub struct HtmdConverter {
    inner: htmd::HtmlToMarkdown,
}

impl HtmdConverter {
    pub fn new() -> Self {
        let inner = htmd::HtmlToMarkdown::builder()
            .skip_tags(vec!["script", "style", "noscript"])
            .build();
        Self { inner }
    }
}

impl Default for HtmdConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentConverter for HtmdConverter {
    fn convert(&self, markup: &str, source_name: &str) -> Result<String, ConvertError> {
        let markdown = self
            .inner
            .convert(markup)
            .map_err(|e| ConvertError::Failed {
                source_name: source_name.to_string(),
                message: e.to_string(),
            })?;

        if markdown.trim().is_empty() {
            return Err(ConvertError::Empty(source_name.to_string()));
        }
        Ok(markdown)
    }
}

/// Converts `markup`, substituting the placeholder document on failure
///
/// # Returns
///
/// The Markdown, plus the error if the placeholder was used
pub fn convert_or_placeholder(
    converter: &dyn DocumentConverter,
    markup: &str,
    source_name: &str,
) -> (String, Option<ConvertError>) {
    match converter.convert(markup, source_name) {
        Ok(markdown) if !markdown.trim().is_empty() => (markdown, None),
        Ok(_) => (
            PLACEHOLDER_DOCUMENT.to_string(),
            Some(ConvertError::Empty(source_name.to_string())),
        ),
        Err(e) => {
            tracing::debug!("Using placeholder document: {}", e);
            (PLACEHOLDER_DOCUMENT.to_string(), Some(e))
        }
    }
}

/// Name handed to the converter for a page: the last path segment
pub fn source_name_for(url: &url::Url) -> String {
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|segment| !segment.is_empty())
        .unwrap_or("index.html")
        .to_string()
}
