//! Scripted in-memory page for exercising the workflow without a browser.

use super::{selectors, DownloadEvent, DownloadStream, PageDriver};
use crate::error::PageError;
use async_trait::async_trait;
use futures::StreamExt;
use std::collections::HashSet;
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;

/// Records every interaction and plays back a minimal export dialog.
///
/// Clicking [`selectors::FORMAT_DROPDOWN`] opens the dropdown; the next
/// text click then becomes the shown format. Clicking
/// [`selectors::EXPORT_ALL_TEXT`] while a download subscriber exists emits
/// the queued download.
pub struct MockPage {
    calls: Mutex<Vec<String>>,
    label: Mutex<Option<String>>,
    dropdown_open: Mutex<bool>,
    sticky_label: bool,
    missing: HashSet<String>,
    pending: Mutex<Vec<DownloadEvent>>,
    downloads: broadcast::Sender<DownloadEvent>,
}

impl MockPage {
    pub fn new() -> Self {
        let (downloads, _) = broadcast::channel(8);
        Self {
            calls: Mutex::new(Vec::new()),
            label: Mutex::new(None),
            dropdown_open: Mutex::new(false),
            sticky_label: false,
            missing: HashSet::new(),
            pending: Mutex::new(Vec::new()),
            downloads,
        }
    }

    /// Format the export dialog currently shows.
    pub fn with_label(self, label: &str) -> Self {
        *self.label.lock().unwrap() = Some(label.to_string());
        self
    }

    /// Selector or text that never appears on the page.
    pub fn missing(mut self, target: &str) -> Self {
        self.missing.insert(target.to_string());
        self
    }

    /// Option clicks leave the shown format unchanged.
    pub fn sticky_label(mut self) -> Self {
        self.sticky_label = true;
        self
    }

    /// Download emitted by the next export click, in queue order.
    pub fn with_download(self, event: DownloadEvent) -> Self {
        self.pending.lock().unwrap().push(event);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Index of the first call equal to `call`.
    pub fn position(&self, call: &str) -> Option<usize> {
        self.calls().iter().position(|c| c == call)
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn check(&self, target: &str, timeout: Duration) -> Result<(), PageError> {
        if self.missing.contains(target) {
            return Err(PageError::NotFound {
                selector: target.to_string(),
                timeout_ms: timeout.as_millis() as u64,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl PageDriver for MockPage {
    async fn goto(&self, url: &str) -> Result<(), PageError> {
        self.record(format!("goto:{url}"));
        Ok(())
    }

    async fn fill(&self, selector: &str, _value: &str, timeout: Duration) -> Result<(), PageError> {
        self.record(format!("fill:{selector}"));
        self.check(selector, timeout)
    }

    async fn click(&self, selector: &str, timeout: Duration) -> Result<(), PageError> {
        self.record(format!("click:{selector}"));
        self.check(selector, timeout)?;
        if selector == selectors::FORMAT_DROPDOWN {
            *self.dropdown_open.lock().unwrap() = true;
        }
        Ok(())
    }

    async fn click_text(&self, text: &str, timeout: Duration) -> Result<(), PageError> {
        self.record(format!("click_text:{text}"));
        self.check(text, timeout)?;

        let mut open = self.dropdown_open.lock().unwrap();
        if *open {
            *open = false;
            if !self.sticky_label {
                *self.label.lock().unwrap() = Some(text.to_string());
            }
            return Ok(());
        }
        drop(open);

        if text == selectors::EXPORT_ALL_TEXT && self.downloads.receiver_count() > 0 {
            let mut pending = self.pending.lock().unwrap();
            if !pending.is_empty() {
                let event = pending.remove(0);
                let _ = self.downloads.send(event);
            }
        }
        Ok(())
    }

    async fn click_matching(
        &self,
        selector: &str,
        text: &str,
        timeout: Duration,
    ) -> Result<(), PageError> {
        self.record(format!("click_matching:{selector}:{text}"));
        self.check(selector, timeout)?;
        self.check(text, timeout)
    }

    async fn text_content(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<Option<String>, PageError> {
        self.record(format!("text_content:{selector}"));
        self.check(selector, timeout)?;
        Ok(self.label.lock().unwrap().clone())
    }

    async fn wait_for_navigation(&self, _timeout: Duration) -> Result<(), PageError> {
        self.record("wait_for_navigation".to_string());
        Ok(())
    }

    async fn downloads(&self) -> Result<DownloadStream, PageError> {
        self.record("downloads".to_string());
        let rx = self.downloads.subscribe();
        Ok(BroadcastStream::new(rx)
            .filter_map(|item| async move { item.ok() })
            .boxed())
    }
}
