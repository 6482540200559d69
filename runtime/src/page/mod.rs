//! Page interaction layer.
//!
//! The workflow talks to the browser only through [`PageDriver`]. Selectors
//! and visible texts of the target application live in [`selectors`], so a
//! markup change on their side is fixed in one place.

pub mod chromium;
#[cfg(test)]
pub mod mock;
pub mod selectors;

use crate::error::PageError;
use async_trait::async_trait;
use futures::stream::BoxStream;
use std::path::PathBuf;
use std::time::Duration;

/// A file the browser finished downloading into the staging folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedFile {
    /// Browser-assigned download id.
    pub guid: String,
    /// Where the browser wrote the bytes.
    pub path: PathBuf,
    /// File name the site suggested, if the browser reported one.
    pub suggested_filename: Option<String>,
}

/// Terminal state of a browser download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadEvent {
    Completed(DownloadedFile),
    Cancelled { guid: String },
}

/// Stream of download events seen after the subscription was made.
pub type DownloadStream = BoxStream<'static, DownloadEvent>;

/// A single browser page the export workflow can drive.
///
/// Every waiting method takes an explicit bound; nothing waits forever.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Navigate to a URL and wait for the load.
    async fn goto(&self, url: &str) -> Result<(), PageError>;

    /// Type `value` into the first element matching `selector`.
    async fn fill(&self, selector: &str, value: &str, timeout: Duration) -> Result<(), PageError>;

    /// Click the first element matching a CSS selector.
    async fn click(&self, selector: &str, timeout: Duration) -> Result<(), PageError>;

    /// Click the element whose visible text is exactly `text`.
    async fn click_text(&self, text: &str, timeout: Duration) -> Result<(), PageError>;

    /// Among the elements matching `selector`, click the one whose visible
    /// text is exactly `text`.
    async fn click_matching(
        &self,
        selector: &str,
        text: &str,
        timeout: Duration,
    ) -> Result<(), PageError>;

    /// Text content of the first element matching `selector`.
    async fn text_content(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<Option<String>, PageError>;

    /// Wait for the in-flight navigation to settle.
    async fn wait_for_navigation(&self, timeout: Duration) -> Result<(), PageError>;

    /// Subscribe to downloads. Only downloads finishing after this call
    /// are delivered.
    async fn downloads(&self) -> Result<DownloadStream, PageError>;
}

/// Run `fut` with a bound, mapping elapse to [`PageError::Timeout`].
pub(crate) async fn bounded<T, F>(what: &str, timeout: Duration, fut: F) -> Result<T, PageError>
where
    F: std::future::Future<Output = Result<T, PageError>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => Err(PageError::Timeout {
            what: what.to_string(),
            timeout_ms: timeout.as_millis() as u64,
        }),
    }
}
