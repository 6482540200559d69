//! The export workflow: login → open graph → per format (open dialog →
//! select format → export → download).
//!
//! Steps run strictly in order against one page. The first failing step
//! stops the run and its error is returned.

pub mod auth;
pub mod dialog;
pub mod download;
pub mod export;
pub mod graph;
#[cfg(test)]
pub(crate) mod log_capture;

use crate::error::ExportError;
use crate::format::{ExportFormat, ExportRequest};
use crate::page::PageDriver;
use chrono::{DateTime, Utc};
use download::SavedExport;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

/// Everything needed to export one graph.
#[derive(Clone)]
pub struct ExportJob {
    pub email: String,
    pub password: String,
    pub graph: String,
    pub formats: Vec<ExportFormat>,
    pub extract: bool,
    pub output_folder: PathBuf,
    /// Bound on each download, from export click to archive on disk.
    pub download_timeout: Duration,
}

/// What a finished run produced.
#[derive(Debug, Clone, Serialize)]
pub struct ExportSummary {
    pub graph: String,
    pub output_folder: PathBuf,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub exports: Vec<SavedExport>,
}

/// Drive `page` through the whole export for `job`.
///
/// `page` must already show the login screen.
pub async fn run(page: &dyn PageDriver, job: &ExportJob) -> Result<ExportSummary, ExportError> {
    let started_at = Utc::now();

    auth::login(page, &job.email, &job.password).await?;
    graph::open_graph(page, &job.graph).await?;

    let mut exports = Vec::with_capacity(job.formats.len());
    for format in &job.formats {
        let request = ExportRequest::new(format.clone(), job.extract, &job.output_folder);

        dialog::open_export_dialog(page).await?;
        let handle = export::export_all(page, &request).await?;

        info!(step = "download", %format, "waiting for download");
        let saved = handle
            .wait(job.download_timeout)
            .await
            .map_err(|source| ExportError::Download {
                format: format.to_string(),
                source,
            })?;
        exports.push(saved);
    }

    Ok(ExportSummary {
        graph: job.graph.clone(),
        output_folder: job.output_folder.clone(),
        started_at,
        finished_at: Utc::now(),
        exports,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::mock::MockPage;
    use crate::page::selectors;
    use crate::workflow::download::tests::staged_download;

    fn job(dir: &std::path::Path, formats: &[&str], extract: bool) -> ExportJob {
        ExportJob {
            email: "me@example.com".into(),
            password: "secret".into(),
            graph: "notes".into(),
            formats: formats.iter().map(|f| ExportFormat::new(*f)).collect(),
            extract,
            output_folder: dir.to_path_buf(),
            download_timeout: Duration::from_secs(5),
        }
    }

    #[tokio::test]
    async fn test_full_run_exports_each_format() {
        let dir = tempfile::tempdir().unwrap();
        let page = MockPage::new()
            .with_label("JSON")
            .with_download(staged_download(dir.path(), "g-1"))
            .with_download(staged_download(dir.path(), "g-2"));

        let summary = run(&page, &job(dir.path(), &["JSON", "Markdown"], true))
            .await
            .unwrap();

        assert_eq!(summary.exports.len(), 2);
        assert!(dir.path().join("JSON.zip").is_file());
        assert!(dir.path().join("json/graph.json").is_file());
        assert!(dir.path().join("Markdown.zip").is_file());
        assert!(dir.path().join("markdown/notes/page.md").is_file());
        assert!(summary.finished_at >= summary.started_at);
    }

    #[tokio::test]
    async fn test_login_failure_halts_workflow() {
        let dir = tempfile::tempdir().unwrap();
        let page = MockPage::new().missing(selectors::PASSWORD_FIELD);

        let err = run(&page, &job(dir.path(), &["JSON"], false))
            .await
            .unwrap_err();

        assert_eq!(err.step(), "login");
        assert!(page.position("click_text:notes").is_none());
        assert!(page.position(&format!("click:{}", selectors::MORE_MENU)).is_none());
    }

    #[tokio::test]
    async fn test_graph_failure_halts_before_dialog() {
        let dir = tempfile::tempdir().unwrap();
        let page = MockPage::new().missing("notes");

        let err = run(&page, &job(dir.path(), &["JSON"], false))
            .await
            .unwrap_err();

        assert_eq!(err.step(), "open-graph");
        assert!(page.position(&format!("click:{}", selectors::MORE_MENU)).is_none());
    }

    #[tokio::test]
    async fn test_missing_download_is_reported_per_format() {
        let dir = tempfile::tempdir().unwrap();
        let mut j = job(dir.path(), &["EDN"], false);
        j.download_timeout = Duration::from_millis(50);
        let page = MockPage::new().with_label("EDN");

        let err = run(&page, &j).await.unwrap_err();
        assert!(matches!(err, ExportError::Download { ref format, .. } if format == "EDN"));
    }
}
