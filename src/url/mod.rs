//! URL handling module for md-crawler
//!
//! This module provides canonicalization and domain scoping of discovered
//! references, domain extraction, and the filename sanitation used to name
//! mirrored pages and assets.

mod domain;
mod filename;
mod normalize;

// Re-export main functions
pub use domain::extract_domain;
pub use filename::{
    asset_filename, page_filename, query_digest, reference_asset_name, sanitize_component,
};
pub use normalize::{resolve_reference, Canonicalizer};
