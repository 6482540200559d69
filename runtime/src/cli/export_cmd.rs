//! `roam-export export` — run the full export against a live browser.

use crate::cli::output::{self, Styled};
use crate::format::ExportFormat;
use crate::page::selectors;
use crate::session::BrowserSession;
use crate::workflow::{self, ExportJob, ExportSummary};
use anyhow::{bail, Result};
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

/// Inputs for one export run, as collected from the command line.
pub struct ExportArgs {
    pub email: String,
    pub password: String,
    pub graph: String,
    pub formats: Vec<ExportFormat>,
    pub extract: bool,
    pub out_dir: Option<PathBuf>,
    pub download_timeout_secs: Option<u64>,
}

pub async fn run(args: ExportArgs) -> Result<()> {
    let s = Styled::new();
    if args.formats.is_empty() {
        bail!("at least one --format is required");
    }

    let spinner = if output::is_verbose() {
        indicatif::ProgressBar::hidden()
    } else {
        output::create_spinner("Starting browser")
    };

    let session = match BrowserSession::start(args.out_dir.as_deref()).await {
        Ok(session) => session,
        Err(e) => {
            spinner.finish_and_clear();
            return Err(anyhow::Error::new(e).context("could not start the browser session"));
        }
    };

    let job = ExportJob {
        email: args.email,
        password: args.password,
        graph: args.graph,
        formats: args.formats,
        extract: args.extract,
        output_folder: session.output_folder().to_path_buf(),
        download_timeout: args
            .download_timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(selectors::DOWNLOAD_TIMEOUT),
    };

    spinner.set_message(format!("Exporting graph '{}'", job.graph));
    let result = workflow::run(session.page(), &job).await;
    spinner.finish_and_clear();

    if let Err(e) = session.close().await {
        warn!("browser did not close cleanly: {e}");
    }

    match result {
        Ok(summary) => {
            if output::is_json() {
                output::print_json(&summary_json(&summary));
            } else if !output::is_quiet() {
                print_summary(&s, &summary);
            }
            Ok(())
        }
        Err(e) => {
            if output::is_json() {
                output::print_json(&serde_json::json!({
                    "error": e.step(),
                    "message": e.to_string(),
                }));
            } else if !output::is_quiet() {
                eprintln!("  {} {} step failed", s.fail_sym(), s.red(e.step()));
            }
            Err(anyhow::Error::new(e))
        }
    }
}

/// Machine-readable form of a finished run.
pub fn summary_json(summary: &ExportSummary) -> serde_json::Value {
    serde_json::json!({
        "graph": summary.graph,
        "output_folder": summary.output_folder,
        "duration_ms": (summary.finished_at - summary.started_at).num_milliseconds(),
        "exports": summary.exports,
    })
}

fn print_summary(s: &Styled, summary: &ExportSummary) {
    output::print_header(s);
    output::print_section(s, &format!("Graph '{}'", summary.graph));
    for export in &summary.exports {
        let size = std::fs::metadata(&export.archive)
            .map(|m| output::format_size(m.len()))
            .unwrap_or_else(|_| "?".to_string());
        output::print_check(
            s.ok_sym(),
            &format!("{}:", export.format),
            &format!("{} ({size})", export.archive.display()),
        );
        if let Some(dir) = &export.extracted_to {
            output::print_detail(&s.dim(&format!("extracted to {}", dir.display())));
        }
    }
    let secs = (summary.finished_at - summary.started_at).num_seconds();
    eprintln!();
    eprintln!(
        "  {} {} format(s) exported in {secs}s",
        s.ok_sym(),
        s.cyan(&summary.exports.len().to_string())
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::download::SavedExport;
    use assert_json_diff::assert_json_eq;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_summary_json_shape() {
        let summary = ExportSummary {
            graph: "notes".into(),
            output_folder: PathBuf::from("/out"),
            started_at: Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap(),
            finished_at: Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 7).unwrap(),
            exports: vec![SavedExport {
                format: "JSON".into(),
                archive: PathBuf::from("/out/JSON.zip"),
                extracted_to: Some(PathBuf::from("/out/json")),
            }],
        };

        assert_json_eq!(
            summary_json(&summary),
            serde_json::json!({
                "graph": "notes",
                "output_folder": "/out",
                "duration_ms": 2000,
                "exports": [{
                    "format": "JSON",
                    "archive": "/out/JSON.zip",
                    "extracted_to": "/out/json",
                }],
            })
        );
    }
}
