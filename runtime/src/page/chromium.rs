//! [`PageDriver`] backed by a Chromium page over the DevTools protocol.

use super::{bounded, DownloadEvent, DownloadStream, DownloadedFile, PageDriver};
use crate::error::PageError;
use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::browser::{
    DownloadProgressState, EventDownloadProgress, EventDownloadWillBegin,
    SetDownloadBehaviorBehavior, SetDownloadBehaviorParams,
};
use chromiumoxide::element::Element;
use chromiumoxide::error::CdpError;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, warn};

/// Delay between element lookups while waiting for markup to appear.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Launch a visible Chromium and spawn the task that drives its CDP handler.
pub async fn launch(executable: Option<&Path>) -> Result<(Browser, JoinHandle<()>), PageError> {
    let mut builder = BrowserConfig::builder().with_head().viewport(None);
    if let Some(path) = executable {
        builder = builder.chrome_executable(path);
    }
    let config = builder
        .build()
        .map_err(|e| PageError::Browser(format!("invalid browser config: {e}")))?;

    let (browser, mut handler) = Browser::launch(config).await?;

    let handler_task = tokio::spawn(async move {
        while let Some(event) = handler.next().await {
            if let Err(e) = event {
                debug!("cdp handler: {e}");
            }
        }
    });

    Ok((browser, handler_task))
}

/// Route browser downloads into `staging_dir` and fan completed downloads
/// out to every subscriber of the returned sender.
pub async fn watch_downloads(
    browser: &Browser,
    staging_dir: &Path,
) -> Result<(broadcast::Sender<DownloadEvent>, JoinHandle<()>), PageError> {
    let params = SetDownloadBehaviorParams::builder()
        .behavior(SetDownloadBehaviorBehavior::AllowAndName)
        .download_path(staging_dir.display().to_string())
        .events_enabled(true)
        .build()
        .map_err(PageError::Browser)?;
    browser.execute(params).await?;

    let mut begins = browser.event_listener::<EventDownloadWillBegin>().await?;
    let mut progress = browser.event_listener::<EventDownloadProgress>().await?;

    let (tx, _) = broadcast::channel(16);
    let sender = tx.clone();
    let staging = staging_dir.to_path_buf();

    let task = tokio::spawn(async move {
        let mut names: HashMap<String, String> = HashMap::new();
        loop {
            tokio::select! {
                Some(ev) = begins.next() => {
                    debug!(guid = %ev.guid, url = %ev.url, "download started");
                    names.insert(ev.guid.clone(), ev.suggested_filename.clone());
                }
                Some(ev) = progress.next() => {
                    let event = match ev.state {
                        DownloadProgressState::InProgress => continue,
                        DownloadProgressState::Completed => {
                            DownloadEvent::Completed(DownloadedFile {
                                guid: ev.guid.clone(),
                                path: staging.join(&ev.guid),
                                suggested_filename: names.remove(&ev.guid),
                            })
                        }
                        DownloadProgressState::Canceled => {
                            names.remove(&ev.guid);
                            DownloadEvent::Cancelled { guid: ev.guid.clone() }
                        }
                    };
                    if sender.send(event).is_err() {
                        warn!(guid = %ev.guid, "download finished with no handler attached");
                    }
                }
                else => break,
            }
        }
    });

    Ok((tx, task))
}

/// A Chromium tab.
pub struct ChromiumPage {
    page: Page,
    downloads: broadcast::Sender<DownloadEvent>,
}

impl ChromiumPage {
    pub fn new(page: Page, downloads: broadcast::Sender<DownloadEvent>) -> Self {
        Self { page, downloads }
    }

    /// Call an in-page arrow function and deserialize what it returns.
    async fn eval<T: serde::de::DeserializeOwned>(&self, js: String) -> Result<T, PageError> {
        self.page
            .evaluate_function(js)
            .await?
            .into_value::<T>()
            .map_err(|e| PageError::Script(e.to_string()))
    }

    /// First element matching `selector`, polling until it exists.
    async fn element(&self, selector: &str) -> Result<Element, PageError> {
        loop {
            match self.page.find_element(selector).await {
                Ok(el) => return Ok(el),
                Err(e) if is_missing_node(&e) => tokio::time::sleep(POLL_INTERVAL).await,
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Re-run `script` until it reports `true`.
    async fn until_true(&self, script: &str) -> Result<(), PageError> {
        loop {
            if self.eval::<bool>(script.to_string()).await? {
                return Ok(());
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn text_when_present(&self, selector: &str) -> Result<String, PageError> {
        let script = text_content_script(selector);
        loop {
            let probe: TextProbe = self.eval(script.clone()).await?;
            if let Some(text) = probe.text {
                return Ok(text);
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn wait_for_element(&self, selector: &str, timeout: Duration) -> Result<Element, PageError> {
        bounded(selector, timeout, self.element(selector))
            .await
            .map_err(|e| not_found(e, selector, timeout))
    }
}

/// Turn an elapsed wait into the "nothing matched" error callers expect.
/// Whether a lookup failed only because nothing matches yet.
fn is_missing_node(err: &CdpError) -> bool {
    if !matches!(err, CdpError::Chrome(_)) {
        return false;
    }
    let msg = err.to_string();
    msg.contains("Could not find node") || msg.contains("No node with given id")
}

fn not_found(err: PageError, selector: &str, timeout: Duration) -> PageError {
    match err {
        PageError::Timeout { .. } => PageError::NotFound {
            selector: selector.to_string(),
            timeout_ms: timeout.as_millis() as u64,
        },
        other => other,
    }
}

#[derive(serde::Deserialize)]
struct TextProbe {
    text: Option<String>,
}

/// Quote a Rust string as a JavaScript string literal.
fn js_str(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}

/// Click the innermost visible element whose trimmed text equals `text`,
/// preferring the last one in document order (dialogs render late).
fn click_text_script(text: &str) -> String {
    format!(
        r#"() => {{
            const text = {};
            const hits = [...document.querySelectorAll('body *')].filter(el =>
                el.textContent.trim() === text &&
                ![...el.children].some(c => c.textContent.trim() === text) &&
                el.getClientRects().length > 0);
            const target = hits[hits.length - 1];
            if (!target) return false;
            target.click();
            return true;
        }}"#,
        js_str(text)
    )
}

fn click_matching_script(selector: &str, text: &str) -> String {
    format!(
        r#"() => {{
            const text = {};
            const target = [...document.querySelectorAll({})]
                .find(el => el.textContent.trim() === text);
            if (!target) return false;
            target.click();
            return true;
        }}"#,
        js_str(text),
        js_str(selector)
    )
}

fn text_content_script(selector: &str) -> String {
    format!(
        r#"() => {{
            const el = document.querySelector({});
            return {{ text: el ? el.textContent : null }};
        }}"#,
        js_str(selector)
    )
}

#[async_trait]
impl PageDriver for ChromiumPage {
    async fn goto(&self, url: &str) -> Result<(), PageError> {
        self.page.goto(url).await?;
        Ok(())
    }

    async fn fill(&self, selector: &str, value: &str, timeout: Duration) -> Result<(), PageError> {
        let element = self.wait_for_element(selector, timeout).await?;
        element.click().await?;
        element.type_str(value).await?;
        Ok(())
    }

    async fn click(&self, selector: &str, timeout: Duration) -> Result<(), PageError> {
        self.wait_for_element(selector, timeout).await?.click().await?;
        Ok(())
    }

    async fn click_text(&self, text: &str, timeout: Duration) -> Result<(), PageError> {
        let what = format!("text={text}");
        let script = click_text_script(text);
        bounded(&what, timeout, self.until_true(&script))
            .await
            .map_err(|e| not_found(e, &what, timeout))
    }

    async fn click_matching(
        &self,
        selector: &str,
        text: &str,
        timeout: Duration,
    ) -> Result<(), PageError> {
        let what = format!("{selector} >> text={text}");
        let script = click_matching_script(selector, text);
        bounded(&what, timeout, self.until_true(&script))
            .await
            .map_err(|e| not_found(e, &what, timeout))
    }

    async fn text_content(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<Option<String>, PageError> {
        let text = bounded(selector, timeout, self.text_when_present(selector))
            .await
            .map_err(|e| not_found(e, selector, timeout))?;
        Ok(Some(text))
    }

    async fn wait_for_navigation(&self, timeout: Duration) -> Result<(), PageError> {
        let navigation = async {
            self.page
                .wait_for_navigation()
                .await
                .map(|_| ())
                .map_err(PageError::from)
        };
        bounded("navigation", timeout, navigation).await
    }

    async fn downloads(&self) -> Result<DownloadStream, PageError> {
        let rx = self.downloads.subscribe();
        let stream = BroadcastStream::new(rx).filter_map(|item| async move { item.ok() });
        Ok(stream.boxed())
    }
}
