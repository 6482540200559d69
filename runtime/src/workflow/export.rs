//! Pick the export format in the open dialog and trigger the export.

use super::download::{self, DownloadHandle};
use crate::error::ExportError;
use crate::format::ExportRequest;
use crate::page::{selectors, PageDriver};
use tracing::{info, warn};

/// Make the dialog show `request.format`, attach a download handler and
/// press "Export All".
///
/// On success the export click has been delivered with the requested format
/// selected; the returned handle resolves when the archive is on disk.
pub async fn export_all(
    page: &dyn PageDriver,
    request: &ExportRequest,
) -> Result<DownloadHandle, ExportError> {
    let result = run(page, request).await;
    if let Err(e) = &result {
        warn!(step = "export", format = %request.format, "{e}");
    }
    result
}

async fn run(page: &dyn PageDriver, request: &ExportRequest) -> Result<DownloadHandle, ExportError> {
    let format = &request.format;
    info!(step = "export", %format, "reading selected format");

    let current = current_format(page).await?;
    info!(step = "export", current = %current, "dialog shows format");

    if format.matches_label(&current) {
        info!(step = "export", "format {format} is already selected");
    } else {
        select_format(page, request).await?;
    }

    let handle = download::attach(page, request)
        .await
        .map_err(|source| ExportError::Trigger {
            format: format.to_string(),
            source,
        })?;

    info!(step = "export", "format {format} selected, exporting");
    page.click_text(selectors::EXPORT_ALL_TEXT, selectors::ACTION_TIMEOUT)
        .await
        .map_err(|source| ExportError::Trigger {
            format: format.to_string(),
            source,
        })?;

    Ok(handle)
}

/// Label of the format the dialog currently shows. Empty means the dialog
/// is not what we expect.
async fn current_format(page: &dyn PageDriver) -> Result<String, ExportError> {
    let label = page
        .text_content(selectors::CURRENT_FORMAT, selectors::FORMAT_LABEL_TIMEOUT)
        .await
        .map_err(|e| ExportError::UnexpectedDialog(e.to_string()))?;

    match label.map(|l| l.trim().to_string()) {
        Some(l) if !l.is_empty() => Ok(l),
        _ => Err(ExportError::UnexpectedDialog(
            "no format label in the export dialog".to_string(),
        )),
    }
}

/// Open the dropdown, click the format's option and check the dialog took it.
async fn select_format(page: &dyn PageDriver, request: &ExportRequest) -> Result<(), ExportError> {
    let format = &request.format;
    let select_err = |source| ExportError::SelectFormat {
        format: format.to_string(),
        source,
    };

    info!(step = "export", "listing export format options");
    page.click(selectors::FORMAT_DROPDOWN, selectors::ACTION_TIMEOUT)
        .await
        .map_err(select_err)?;

    info!(step = "export", "selecting {format}");
    page.click_text(format.as_str(), selectors::ACTION_TIMEOUT)
        .await
        .map_err(select_err)?;

    let shown = current_format(page).await?;
    if !format.matches_label(&shown) {
        return Err(ExportError::FormatNotApplied {
            requested: format.to_string(),
            shown,
        });
    }
    Ok(())
}
