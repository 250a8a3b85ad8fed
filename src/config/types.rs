use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for tslove-dump
///
/// Every section has a default matching the reference deployment, so a
/// configuration file is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub site: SiteConfig,
    pub retry: RetryConfig,
    pub pacing: PacingConfig,
    pub output: OutputConfig,
}

/// Connection settings for the forum
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Root URL of the forum, ending with '/'
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// User-Agent header sent with every request
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout")]
    pub request_timeout: u64,

    /// Skip TLS certificate verification
    #[serde(rename = "accept-invalid-certs")]
    pub accept_invalid_certs: bool,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://tslove.net/".to_string(),
            user_agent: format!("tslove-dump/{}", env!("CARGO_PKG_VERSION")),
            request_timeout: 15,
            accept_invalid_certs: false,
        }
    }
}

impl SiteConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }
}

/// Retry policy shared by every fetch operation
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum number of attempts per fetch, including the first
    #[serde(rename = "max-attempts")]
    pub max_attempts: u32,

    /// Delay before the first retry (seconds)
    #[serde(rename = "base-interval")]
    pub base_interval: u64,

    /// Added to the delay for every further retry (seconds)
    pub increment: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            base_interval: 10,
            increment: 5,
        }
    }
}

/// Courtesy delay between remote diary fetches
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PacingConfig {
    /// Delay used while the site is healthy (seconds)
    #[serde(rename = "short-interval")]
    pub short_interval: u64,

    /// Delay used after retries were observed (seconds)
    #[serde(rename = "long-interval")]
    pub long_interval: u64,

    /// Retry-free fetches needed before switching to the short delay
    #[serde(rename = "change-threshold")]
    pub change_threshold: u32,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            short_interval: 10,
            long_interval: 20,
            change_threshold: 5,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Destination directory of the mirror
    pub directory: PathBuf,

    /// Stylesheet image references that are never downloaded or rewritten
    #[serde(rename = "excluded-stylesheet-images")]
    pub excluded_stylesheet_images: Vec<String>,

    /// Script paths (prefix match) that are stripped instead of mirrored
    #[serde(rename = "excluded-scripts")]
    pub excluded_scripts: Vec<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("./dump"),
            excluded_stylesheet_images: vec!["./skin/default/img/marker.gif".to_string()],
            excluded_scripts: vec![
                "./js/prototype.js".to_string(),
                "./js/Selection.js".to_string(),
                "./js/comment.js".to_string(),
            ],
        }
    }
}
