//! Environment readiness check: browser present, output folder usable.

use crate::cli::output::{self, Styled};
use crate::page::selectors;
use crate::session::{chromium_version, export_home, find_chromium};
use anyhow::Result;
use std::path::Path;

/// Run the doctor checks and print the result.
pub async fn run(out_dir: Option<&Path>) -> Result<()> {
    let report = Report::collect(out_dir);

    if output::is_json() {
        output::print_json(&report.to_json());
        return Ok(());
    }

    let s = Styled::new();
    output::print_header(&s);

    // ── System ──────────────────────────────────────────────────────────
    output::print_section(&s, "System");
    output::print_check(
        s.ok_sym(),
        "OS:",
        &format!("{} ({})", std::env::consts::OS, std::env::consts::ARCH),
    );
    output::print_check(s.ok_sym(), "Home:", &report.home);
    eprintln!();

    // ── Browser ─────────────────────────────────────────────────────────
    output::print_section(&s, "Browser");
    match &report.chromium_path {
        Some(path) => {
            let ver = report.chromium_version.as_deref().unwrap_or("unknown version");
            output::print_check(s.ok_sym(), "Chromium:", &format!("{ver} at {path}"));
        }
        None => {
            output::print_check(s.fail_sym(), "Chromium:", "NOT FOUND");
            output::print_detail("Install Google Chrome or Chromium,");
            output::print_detail("or set ROAM_EXPORT_CHROMIUM_PATH=/path/to/chrome");
        }
    }
    eprintln!();

    // ── Export ──────────────────────────────────────────────────────────
    output::print_section(&s, "Export");
    output::print_check(s.ok_sym(), "Login page:", selectors::LOGIN_URL);
    if report.output_writable {
        output::print_check(s.ok_sym(), "Output:", &format!("{} (writable)", report.output));
    } else {
        output::print_check(s.fail_sym(), "Output:", &format!("{} (not writable)", report.output));
    }

    eprintln!();
    if report.ready() {
        eprintln!("  {}: {}", s.bold("Status"), s.green("READY"));
    } else {
        eprintln!("  {}: {} (fix issues above)", s.bold("Status"), s.red("NOT READY"));
    }
    Ok(())
}

struct Report {
    home: String,
    chromium_path: Option<String>,
    chromium_version: Option<String>,
    output: String,
    output_writable: bool,
}

impl Report {
    fn collect(out_dir: Option<&Path>) -> Self {
        let chromium = find_chromium();
        let cwd = std::env::current_dir().unwrap_or_default();
        let output = crate::session::resolve_against(&cwd, out_dir);
        Self {
            home: export_home().display().to_string(),
            chromium_version: chromium.as_deref().and_then(chromium_version),
            chromium_path: chromium.map(|p| p.display().to_string()),
            output_writable: is_writable(&output),
            output: output.display().to_string(),
        }
    }

    fn ready(&self) -> bool {
        self.chromium_path.is_some() && self.output_writable
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "ready": self.ready(),
            "home": self.home,
            "chromium_path": self.chromium_path,
            "chromium_version": self.chromium_version,
            "output": self.output,
            "output_writable": self.output_writable,
        })
    }
}

/// Whether `dir` (or its parent, when `dir` does not exist yet) accepts writes.
fn is_writable(dir: &Path) -> bool {
    let target = if dir.exists() {
        dir
    } else {
        match dir.parent() {
            Some(p) if p.exists() => p,
            _ => return false,
        }
    };
    std::fs::metadata(target)
        .map(|m| m.is_dir() && !m.permissions().readonly())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writable_checks_parent_of_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(is_writable(dir.path()));
        assert!(is_writable(&dir.path().join("not-yet")));
        assert!(!is_writable(&dir.path().join("a/b")));
    }

    #[test]
    fn test_report_json_fields() {
        let report = Report {
            home: "/h".into(),
            chromium_path: None,
            chromium_version: None,
            output: "/o".into(),
            output_writable: true,
        };
        let json = report.to_json();
        assert_eq!(json["ready"], false);
        assert_eq!(json["output"], "/o");
        assert!(json["chromium_path"].is_null());
    }
}
