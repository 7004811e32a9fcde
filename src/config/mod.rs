//! Configuration module for md-crawler
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every key has a default; command-line flags override whatever is loaded here.
//!
//! # Example
//!
//! ```no_run
//! use md_crawler::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("crawler.toml")).unwrap();
//! println!("Crawler will fetch at most {} pages", config.crawler.max_pages);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlerConfig, OutputConfig, RendererConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
