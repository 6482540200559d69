//! Download handler — persists one export archive and optionally unpacks it.
//!
//! [`attach`] subscribes to the page's downloads *before* the export is
//! triggered and hands back a [`DownloadHandle`]. The handle resolves once
//! the first download after the subscription is saved (and extracted), so
//! the caller knows when the export is really finished.

use crate::error::{DownloadError, PageError};
use crate::format::{ExportFormat, ExportRequest};
use crate::page::{DownloadEvent, DownloadedFile, PageDriver};
use futures::StreamExt;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Where an export ended up on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SavedExport {
    pub format: ExportFormat,
    pub archive: PathBuf,
    pub extracted_to: Option<PathBuf>,
}

/// Completion signal for one registered download.
pub struct DownloadHandle {
    request: ExportRequest,
    rx: oneshot::Receiver<Option<DownloadEvent>>,
    task: JoinHandle<()>,
}

impl DownloadHandle {
    /// Wait for the download, giving up if none arrives within `timeout`.
    ///
    /// Only the wait for the browser is bounded. Once a download has
    /// arrived it is saved (and extracted) to completion before returning.
    pub async fn wait(self, timeout: Duration) -> Result<SavedExport, DownloadError> {
        let event = match tokio::time::timeout(timeout, self.rx).await {
            Ok(Ok(event)) => event,
            Ok(Err(_)) => return Err(DownloadError::HandlerDropped),
            Err(_) => {
                self.task.abort();
                return Err(DownloadError::Timeout {
                    timeout_ms: timeout.as_millis() as u64,
                });
            }
        };
        match event {
            Some(DownloadEvent::Completed(file)) => persist(&file, &self.request).await,
            Some(DownloadEvent::Cancelled { guid }) => Err(DownloadError::Cancelled { guid }),
            None => Err(DownloadError::StreamClosed),
        }
    }
}

/// Register a handler for the next download on `page`.
pub async fn attach(
    page: &dyn PageDriver,
    request: &ExportRequest,
) -> Result<DownloadHandle, PageError> {
    let mut events = page.downloads().await?;
    let (tx, rx) = oneshot::channel();

    let task = tokio::spawn(async move {
        let event = events.next().await;
        // Unsubscribe first so a later handler cannot race this one.
        drop(events);
        let _ = tx.send(event);
    });

    debug!(format = %request.format, "download handler attached");
    Ok(DownloadHandle {
        request: request.clone(),
        rx,
        task,
    })
}

/// Move a finished download to `<outputFolder>/<Format>.zip` and unpack it
/// when requested. An existing archive of the same name is replaced.
pub async fn persist(
    file: &DownloadedFile,
    request: &ExportRequest,
) -> Result<SavedExport, DownloadError> {
    let archive = request.archive_path();
    info!(
        guid = %file.guid,
        suggested = file.suggested_filename.as_deref().unwrap_or("-"),
        "download finished, saving to {}",
        archive.display()
    );
    move_file(&file.path, &archive).await?;
    info!("{} saved", request.format.archive_name());

    let extracted_to = if request.extract {
        let dir = request.extract_dir();
        info!("extracting into {}", dir.display());
        extract(&archive, &dir).await?;
        info!("files extracted");
        Some(dir)
    } else {
        None
    };

    Ok(SavedExport {
        format: request.format.clone(),
        archive,
        extracted_to,
    })
}

async fn move_file(from: &Path, to: &Path) -> Result<(), DownloadError> {
    let save_err = |source| DownloadError::Save {
        path: to.to_path_buf(),
        source,
    };
    if tokio::fs::rename(from, to).await.is_ok() {
        return Ok(());
    }
    // Rename fails across filesystems; fall back to copy + delete.
    tokio::fs::copy(from, to).await.map_err(save_err)?;
    tokio::fs::remove_file(from).await.map_err(save_err)?;
    Ok(())
}

/// Unpack `archive` into `dir`, creating it as needed.
pub async fn extract(archive: &Path, dir: &Path) -> Result<(), DownloadError> {
    let archive = archive.to_path_buf();
    let dir = dir.to_path_buf();
    let source = archive.clone();
    let job = tokio::task::spawn_blocking(move || extract_blocking(&source, &dir));
    match job.await {
        Ok(result) => result,
        Err(e) => Err(DownloadError::ExtractAborted {
            archive,
            reason: e.to_string(),
        }),
    }
}

fn extract_blocking(archive: &Path, dir: &Path) -> Result<(), DownloadError> {
    let file = std::fs::File::open(archive).map_err(|source| DownloadError::Save {
        path: archive.to_path_buf(),
        source,
    })?;
    std::fs::create_dir_all(dir).map_err(|source| DownloadError::Save {
        path: dir.to_path_buf(),
        source,
    })?;
    let extract_err = |source| DownloadError::Extract {
        archive: archive.to_path_buf(),
        source,
    };
    let mut zip = zip::ZipArchive::new(file).map_err(extract_err)?;
    zip.extract(dir).map_err(extract_err)?;
    Ok(())
}
