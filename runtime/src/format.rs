//! Export formats and the per-format export request.

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// An export format as labelled in the export dialog (e.g. `JSON`, `Markdown`).
///
/// Kept exactly as typed. The dialog decides which names exist, so nothing
/// here checks the value against a fixed list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ExportFormat(String);

impl ExportFormat {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether a label shown in the dialog denotes this format.
    pub fn matches_label(&self, label: &str) -> bool {
        label.trim().eq_ignore_ascii_case(self.0.trim())
    }

    /// File name of the saved archive: `<Format>.zip`.
    pub fn archive_name(&self) -> String {
        format!("{}.zip", self.0)
    }

    /// Folder the archive is unpacked into: the lowercased format.
    pub fn folder_name(&self) -> String {
        self.0.to_lowercase()
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ExportFormat {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        if name.is_empty() {
            return Err("export format cannot be empty".to_string());
        }
        // The name becomes a file and folder name under the output folder.
        if name.contains(['/', '\\']) || name == "." || name == ".." {
            return Err(format!("export format '{name}' is not a valid file name"));
        }
        Ok(Self::new(name))
    }
}

/// One format to export and where its output goes.
#[derive(Debug, Clone)]
pub struct ExportRequest {
    pub format: ExportFormat,
    pub extract: bool,
    pub output_folder: PathBuf,
}

impl ExportRequest {
    pub fn new(format: ExportFormat, extract: bool, output_folder: &Path) -> Self {
        Self {
            format,
            extract,
            output_folder: output_folder.to_path_buf(),
        }
    }

    /// `<outputFolder>/<Format>.zip`
    pub fn archive_path(&self) -> PathBuf {
        self.output_folder.join(self.format.archive_name())
    }

    /// `<outputFolder>/<format>/`
    pub fn extract_dir(&self) -> PathBuf {
        self.output_folder.join(self.format.folder_name())
    }
}
