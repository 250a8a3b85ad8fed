//! Configuration module for tslove-dump
//!
//! This module handles loading, parsing, and validating the optional TOML
//! configuration file. Every setting has a default, so running without a
//! file behaves like the reference deployment.
//!
//! # Example
//!
//! ```no_run
//! use tslove_dump::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("tslove.toml")).unwrap();
//! println!("Retries start after {}s", config.retry.base_interval);
//! ```

mod parser;
mod types;
mod validation;

pub use types::{Config, OutputConfig, PacingConfig, RetryConfig, SiteConfig};

pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
