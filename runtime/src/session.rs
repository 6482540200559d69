//! Session bootstrap — output folder, browser launch, login page.

use crate::error::{ExportError, PageError};
use crate::page::chromium::{self, ChromiumPage};
use crate::page::{selectors, PageDriver};
use chromiumoxide::Browser;
use std::path::{Path, PathBuf};
use std::process::Command;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Folder under the output folder the browser writes raw downloads into.
pub const STAGING_DIR: &str = ".downloads";

/// Resolve `out_dir` (default: the working directory) to an absolute path
/// and create it if missing. Only the last component is created.
pub fn output_folder(out_dir: Option<&Path>) -> Result<PathBuf, ExportError> {
    let cwd = std::env::current_dir().map_err(|source| ExportError::OutputFolder {
        path: PathBuf::from("."),
        source,
    })?;
    let folder = resolve_against(&cwd, out_dir);
    ensure_dir(&folder)?;
    Ok(folder)
}

/// `out_dir` made absolute relative to `base`.
pub fn resolve_against(base: &Path, out_dir: Option<&Path>) -> PathBuf {
    match out_dir {
        Some(p) if p.is_absolute() => p.to_path_buf(),
        Some(p) => base.join(p),
        None => base.to_path_buf(),
    }
}

fn ensure_dir(path: &Path) -> Result<(), ExportError> {
    if path.is_dir() {
        return Ok(());
    }
    match std::fs::create_dir(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists && path.is_dir() => Ok(()),
        Err(source) => Err(ExportError::OutputFolder {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Home of the tool's own files (`~/.roam-export/`).
pub fn export_home() -> PathBuf {
    if let Ok(p) = std::env::var("ROAM_EXPORT_HOME") {
        return PathBuf::from(p);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join(".roam-export")
}

/// Find a Chromium binary by checking multiple locations.
pub fn find_chromium() -> Option<PathBuf> {
    // 1. Explicit override
    if let Ok(p) = std::env::var("ROAM_EXPORT_CHROMIUM_PATH") {
        let path = PathBuf::from(&p);
        if path.exists() {
            return Some(path);
        }
    }

    // 2. Private install under the export home
    let home = export_home();
    for c in [
        home.join("chromium/chrome"),
        home.join("chromium/chrome-linux64/chrome"),
    ] {
        if c.exists() {
            return Some(c);
        }
    }

    // 3. System PATH
    for name in ["google-chrome", "chromium", "chromium-browser"] {
        if let Ok(path) = which::which(name) {
            return Some(path);
        }
    }

    // 4. Common macOS location
    if cfg!(target_os = "macos") {
        let common = PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome");
        if common.exists() {
            return Some(common);
        }
    }

    None
}

/// Chromium version string, if the binary answers `--version`.
pub fn chromium_version(path: &Path) -> Option<String> {
    let output = Command::new(path).arg("--version").output().ok()?;
    if output.status.success() {
        let raw = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Some(raw.replace("Google Chrome ", "").replace("Chromium ", ""))
    } else {
        None
    }
}

/// A running browser with one page sitting on the login screen.
pub struct BrowserSession {
    browser: Browser,
    page: ChromiumPage,
    output_folder: PathBuf,
    handler_task: JoinHandle<()>,
    download_task: JoinHandle<()>,
}

impl BrowserSession {
    /// Launch a visible browser, enable downloads into the output folder's
    /// staging area and open the login page.
    pub async fn start(out_dir: Option<&Path>) -> Result<Self, ExportError> {
        let output_folder = output_folder(out_dir)?;
        let staging = output_folder.join(STAGING_DIR);
        ensure_dir(&staging)?;

        let executable = find_chromium();
        debug!(executable = ?executable, "launching browser");
        let (browser, handler_task) = chromium::launch(executable.as_deref())
            .await
            .map_err(ExportError::Launch)?;

        let (downloads, download_task) = chromium::watch_downloads(&browser, &staging)
            .await
            .map_err(ExportError::Launch)?;

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| ExportError::Launch(PageError::from(e)))?;
        let page = ChromiumPage::new(page, downloads);

        info!("visiting {}", selectors::LOGIN_URL);
        page.goto(selectors::LOGIN_URL)
            .await
            .map_err(ExportError::Launch)?;

        Ok(Self {
            browser,
            page,
            output_folder,
            handler_task,
            download_task,
        })
    }

    pub fn page(&self) -> &ChromiumPage {
        &self.page
    }

    pub fn output_folder(&self) -> &Path {
        &self.output_folder
    }

    /// Close the browser and remove the staging folder.
    pub async fn close(mut self) -> Result<(), PageError> {
        let closed = self.browser.close().await;
        let _ = self.browser.wait().await;
        self.download_task.abort();
        self.handler_task.abort();

        let staging = self.output_folder.join(STAGING_DIR);
        if let Err(e) = tokio::fs::remove_dir_all(&staging).await {
            debug!("could not remove {}: {e}", staging.display());
        }
        closed.map(|_| ()).map_err(PageError::from)
    }
}
