//! Error types for page interaction, downloads and the export workflow.

use std::path::PathBuf;
use thiserror::Error;

/// Failure of a single interaction with the browser page.
#[derive(Debug, Error)]
pub enum PageError {
    /// No element matched within the allotted time.
    #[error("no element matches '{selector}' after {timeout_ms} ms")]
    NotFound { selector: String, timeout_ms: u64 },

    /// A bounded wait elapsed.
    #[error("timed out after {timeout_ms} ms waiting for {what}")]
    Timeout { what: String, timeout_ms: u64 },

    /// An in-page script returned something unexpected.
    #[error("page script failed: {0}")]
    Script(String),

    /// The DevTools protocol connection reported an error.
    #[error("browser error: {0}")]
    Browser(String),
}

impl From<chromiumoxide::error::CdpError> for PageError {
    fn from(e: chromiumoxide::error::CdpError) -> Self {
        PageError::Browser(e.to_string())
    }
}

/// Failure while receiving, saving or unpacking a download.
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("download {guid} was cancelled by the browser")]
    Cancelled { guid: String },

    #[error("download event stream closed before a download completed")]
    StreamClosed,

    #[error("download handler went away without reporting")]
    HandlerDropped,

    #[error("no download arrived within {timeout_ms} ms")]
    Timeout { timeout_ms: u64 },

    #[error("failed to save {}: {source}", path.display())]
    Save {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("extraction of {} did not finish: {reason}", archive.display())]
    ExtractAborted { archive: PathBuf, reason: String },

    #[error("failed to extract {}: {source}", archive.display())]
    Extract {
        archive: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },
}

/// Failure of one step of the export workflow.
///
/// Every variant names the step it came from so the first failure is
/// reported instead of whatever breaks downstream.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("cannot prepare output folder {}: {source}", path.display())]
    OutputFolder {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("browser session failed to start: {0}")]
    Launch(#[source] PageError),

    #[error("login failed: {0}")]
    Login(#[source] PageError),

    #[error("could not open graph '{graph}': {source}")]
    OpenGraph {
        graph: String,
        #[source]
        source: PageError,
    },

    #[error("could not open the export dialog: {0}")]
    OpenDialog(#[source] PageError),

    #[error("export dialog is not as expected: {0}")]
    UnexpectedDialog(String),

    #[error("could not select format '{format}': {source}")]
    SelectFormat {
        format: String,
        #[source]
        source: PageError,
    },

    #[error("format '{requested}' was chosen but the dialog shows '{shown}'")]
    FormatNotApplied { requested: String, shown: String },

    #[error("could not trigger export for '{format}': {source}")]
    Trigger {
        format: String,
        #[source]
        source: PageError,
    },

    #[error("download for '{format}' failed: {source}")]
    Download {
        format: String,
        #[source]
        source: DownloadError,
    },
}

impl ExportError {
    /// Short name of the workflow step that failed.
    pub fn step(&self) -> &'static str {
        match self {
            ExportError::OutputFolder { .. } | ExportError::Launch(_) => "bootstrap",
            ExportError::Login(_) => "login",
            ExportError::OpenGraph { .. } => "open-graph",
            ExportError::OpenDialog(_) => "open-export-dialog",
            ExportError::UnexpectedDialog(_)
            | ExportError::SelectFormat { .. }
            | ExportError::FormatNotApplied { .. }
            | ExportError::Trigger { .. } => "export",
            ExportError::Download { .. } => "download",
        }
    }
}
