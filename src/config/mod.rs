//! Configuration module for Reel-Dates
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every key has a default, so an empty file is a valid configuration.
//!
//! # Example
//!
//! ```no_run
//! use reel_dates::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("reel-dates.toml")).unwrap();
//! println!("Fetches give up after {} attempts", config.fetcher.max_attempts);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{CatalogueConfig, Config, FetcherConfig, ListingConfig, PipelineConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
