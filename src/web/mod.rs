//! Web access layer for the forum
//!
//! This module owns the authenticated HTTP session and everything needed to
//! get a usable body out of an unreliable origin:
//! - Sign-in and session token discovery
//! - Named validation policies per resource kind
//! - Linear backoff retries with a process-wide retry counter
//! - Error classification (transport failure vs. exhausted retries)

mod backoff;
mod policy;
mod session;

pub use backoff::LinearBackoff;
pub use policy::{Policy, ResponseMeta, Verdict, SESSION_COOKIE, SOFT_FAILURE_TITLE};
pub use session::{Credentials, Session};

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::path::Path;
use thiserror::Error;

/// Errors raised by the web access layer
#[derive(Debug, Error)]
pub enum WebError {
    #[error("Request to {url} failed: {source}")]
    Transport { url: String, source: reqwest::Error },

    #[error("Retry count exceeded ({attempts} attempts) for {target}")]
    RetryExhausted { target: String, attempts: u32 },

    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

/// Result of a single request attempt
#[derive(Debug)]
pub enum FetchOutcome {
    /// The response passed its validation policy
    Success(Payload),
    /// The response failed validation and may be retried
    Invalid(String),
    /// The request did not complete at the transport level
    TransportFailure(reqwest::Error),
}

impl FetchOutcome {
    /// Builds an outcome from a policy verdict and the response body
    pub fn from_verdict(verdict: Verdict, body: Vec<u8>) -> Self {
        match verdict {
            Verdict::Accept => Self::Success(Payload::Body(body)),
            Verdict::EmptyImage => Self::Success(Payload::EmptyImage),
            Verdict::SignedIn(cookie) => Self::Success(Payload::SignedIn(cookie)),
            Verdict::Denied => Self::Success(Payload::Denied),
            Verdict::Invalid(reason) => Self::Invalid(reason),
        }
    }
}

/// A validated response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Body(Vec<u8>),
    EmptyImage,
    SignedIn(String),
    Denied,
}

/// An image downloaded from the forum
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchedImage {
    /// Encoded image data as served
    Data(Vec<u8>),
    /// Stand-in for an intentionally empty image slot (1x1 white pixel)
    Placeholder,
}

impl FetchedImage {
    pub fn is_placeholder(&self) -> bool {
        matches!(self, Self::Placeholder)
    }

    /// Writes the image to `path`
    ///
    /// Placeholders are encoded in the format implied by the file extension,
    /// falling back to PNG.
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        match self {
            Self::Data(bytes) => std::fs::write(path, bytes),
            Self::Placeholder => {
                let format = ImageFormat::from_path(path).unwrap_or(ImageFormat::Png);
                let pixel = DynamicImage::ImageRgb8(RgbImage::from_pixel(1, 1, Rgb([255, 255, 255])));
                pixel
                    .save_with_format(path, format)
                    .map_err(std::io::Error::other)
            }
        }
    }
}
