//! Export Roam Research graphs by driving a browser.
//!
//! The workflow signs in, opens a graph, and for each requested format
//! opens the "Export All" dialog, selects the format, triggers the export
//! and saves the download as `<out>/<Format>.zip`, optionally unpacked into
//! `<out>/<format>/`.

pub mod cli;
pub mod error;
pub mod format;
pub mod page;
pub mod session;
pub mod workflow;

pub use error::{DownloadError, ExportError, PageError};
pub use format::{ExportFormat, ExportRequest};
pub use page::PageDriver;
pub use session::BrowserSession;
pub use workflow::{ExportJob, ExportSummary};
