//! Open the "Export All" dialog from the overflow menu.

use crate::error::ExportError;
use crate::page::{selectors, PageDriver};
use tracing::{info, warn};

pub async fn open_export_dialog(page: &dyn PageDriver) -> Result<(), ExportError> {
    info!(step = "open-export-dialog", "opening more menu");

    let result = async {
        page.click(selectors::MORE_MENU, selectors::MENU_TIMEOUT)
            .await?;
        info!(step = "open-export-dialog", "opening export popup");
        page.click_text(selectors::EXPORT_ALL_TEXT, selectors::ACTION_TIMEOUT)
            .await
    }
    .await
    .map_err(ExportError::OpenDialog);

    if let Err(e) = &result {
        warn!(step = "open-export-dialog", "{e}");
    }
    result
}
