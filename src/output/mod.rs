//! Output module: everything between a rendered page and the mirror on disk
//!
//! This module handles:
//! - Converting page markup to Markdown
//! - Rewriting links and images so the mirror works offline
//! - Mirroring assets
//! - Writing page documents
//! - Recording the crawl report

mod assets;
mod converter;
mod markdown;
mod report;
mod rewriter;
pub mod scan;

pub use assets::{AssetCache, AssetError, ASSETS_DIR};
pub use converter::{
    convert_or_placeholder, source_name_for, ConvertError, DocumentConverter, HtmdConverter,
    PLACEHOLDER_DOCUMENT,
};
pub use markdown::{format_page_document, write_page};
pub use report::{print_report, CrawlReport, SkipReason, SkipRecord};
pub use rewriter::{prepare_markup, rewrite_markdown, PreparedMarkup};
