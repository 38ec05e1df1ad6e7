//! Render capability used by the catalog walker.
//!
//! The walker only needs to load a URL, wait for a selector, and read back
//! the page source; [`BrowserSession`] provides this over WebDriver and
//! tests provide scripted implementations.

mod webdriver;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::ScraperError;

pub use webdriver::{BrowserOptions, BrowserSession};

#[async_trait]
pub trait PageRenderer: Send {
    /// Navigate to `url`.
    async fn open(&mut self, url: &str) -> Result<(), ScraperError>;

    /// Wait until at least one element matches `selector`.
    ///
    /// Returns `Ok(false)` when `timeout` elapses first; errors are reserved
    /// for a broken session.
    async fn wait_until_present(
        &mut self,
        selector: &str,
        timeout: Duration,
    ) -> Result<bool, ScraperError>;

    /// Serialized DOM of the current page.
    async fn page_source(&mut self) -> Result<String, ScraperError>;

    /// Release the underlying browser. Calling it again is a no-op.
    async fn close(&mut self) -> Result<(), ScraperError>;
}
