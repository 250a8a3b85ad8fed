//! Page fetching capability used by the crawl
//!
//! The crawl only needs a handful of forum requests. They are gathered in
//! the [`PageFetcher`] trait so the crawl can run against any source of
//! pages, with [`Session`] as the production implementation.

use crate::web::{FetchedImage, Session, WebError};
use async_trait::async_trait;

/// Number of comments requested with a diary page
const COMMENT_PAGE_SIZE: &str = "100";

/// Source of forum pages and assets
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetches the page of one diary entry, comments in ascending order
    async fn fetch_diary(&self, id: &str) -> Result<String, WebError>;

    /// Fetches the logged-in member's profile page
    async fn fetch_profile(&self) -> Result<String, WebError>;

    /// Fetches the site stylesheet
    async fn fetch_stylesheet(&self) -> Result<String, WebError>;

    /// Fetches an image
    async fn fetch_image(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<FetchedImage, WebError>;

    /// Fetches a JavaScript file
    async fn fetch_script(&self, path: &str) -> Result<String, WebError>;

    /// Retries consumed so far, used to measure retry pressure
    fn total_retries(&self) -> u64;
}

#[async_trait]
impl PageFetcher for Session {
    async fn fetch_diary(&self, id: &str) -> Result<String, WebError> {
        self.fetch_page(
            "page_fh_diary",
            &[
                ("target_c_diary_id", id),
                ("order", "asc"),
                ("page_size", COMMENT_PAGE_SIZE),
            ],
        )
        .await
    }

    async fn fetch_profile(&self) -> Result<String, WebError> {
        self.fetch_page("page_h_prof", &[]).await
    }

    async fn fetch_stylesheet(&self) -> Result<String, WebError> {
        Session::fetch_stylesheet(self).await
    }

    async fn fetch_image(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<FetchedImage, WebError> {
        Session::fetch_image(self, path, params).await
    }

    async fn fetch_script(&self, path: &str) -> Result<String, WebError> {
        Session::fetch_script(self, path).await
    }

    fn total_retries(&self) -> u64 {
        Session::total_retries(self)
    }
}
