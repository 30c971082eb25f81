//! Suite result reporters
//!
//! Three outputs per run, matching what CI and humans each want: a pretty
//! JSON results file, a JUnit-style XML summary, and a static HTML page.
//! Per-target accessibility reports are written separately by the runner.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::HarnessResult;
use crate::runner::{SuiteResult, TargetStatus};

/// Write every suite output format. Returns the written paths.
pub fn write_all(suite: &SuiteResult, output_dir: &Path) -> HarnessResult<Vec<PathBuf>> {
    std::fs::create_dir_all(output_dir)?;

    let paths = vec![
        write_json(suite, output_dir)?,
        write_junit(suite, output_dir)?,
        write_html(suite, output_dir)?,
    ];

    for path in &paths {
        info!("Results written to: {}", path.display());
    }

    Ok(paths)
}

/// Machine-parseable results: the full suite record, pretty-printed.
pub fn write_json(suite: &SuiteResult, output_dir: &Path) -> HarnessResult<PathBuf> {
    let path = output_dir.join("audit-results.json");
    std::fs::write(&path, serde_json::to_string_pretty(suite)?)?;
    Ok(path)
}

/// JUnit-style XML for CI ingestion: one testcase per target.
pub fn write_junit(suite: &SuiteResult, output_dir: &Path) -> HarnessResult<PathBuf> {
    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    xml.push_str(&format!(
        "<testsuite name=\"siteaudit\" tests=\"{}\" failures=\"{}\" skipped=\"{}\" time=\"{:.3}\">\n",
        suite.total,
        suite.failed,
        suite.skipped,
        suite.duration_ms as f64 / 1000.0,
    ));

    for result in &suite.results {
        xml.push_str(&format!(
            "  <testcase name=\"{}\" classname=\"{}\" time=\"{:.3}\"",
            xml_escape(&result.name),
            xml_escape(&result.browser),
            result.duration_ms as f64 / 1000.0,
        ));

        match result.status {
            TargetStatus::Passed => xml.push_str("/>\n"),
            TargetStatus::Failed => {
                let message = result.error.as_deref().unwrap_or("audit failed");
                xml.push_str(&format!(
                    ">\n    <failure message=\"{}\">{}</failure>\n  </testcase>\n",
                    xml_escape(first_line(message)),
                    xml_escape(message),
                ));
            }
            TargetStatus::Skipped => {
                let reason = result.error.as_deref().unwrap_or("skipped");
                xml.push_str(&format!(
                    ">\n    <skipped message=\"{}\"/>\n  </testcase>\n",
                    xml_escape(reason),
                ));
            }
        }
    }

    xml.push_str("</testsuite>\n");

    let path = output_dir.join("audit-junit.xml");
    std::fs::write(&path, xml)?;
    Ok(path)
}

/// Static HTML results page for human review.
pub fn write_html(suite: &SuiteResult, output_dir: &Path) -> HarnessResult<PathBuf> {
    let mut rows = String::new();
    for result in &suite.results {
        let status = match result.status {
            TargetStatus::Passed => "passed",
            TargetStatus::Failed => "failed",
            TargetStatus::Skipped => "skipped",
        };
        let detail = result
            .error
            .as_deref()
            .map(|e| html_escape(e).replace('\n', "<br>"))
            .unwrap_or_default();
        let report = result
            .report_path
            .as_deref()
            .map(|p| format!("<a href=\"{}\">report</a>", html_escape(p)))
            .unwrap_or_default();

        rows.push_str(&format!(
            "      <tr class=\"{status}\"><td>{}</td><td>{status}</td><td>{} ms</td><td>{}</td><td>{}</td></tr>\n",
            html_escape(&result.name),
            result.duration_ms,
            report,
            detail,
        ));
    }

    let html = format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>Accessibility audit results</title>
  <style>
    body {{ font-family: system-ui, sans-serif; margin: 2rem; }}
    table {{ border-collapse: collapse; width: 100%; }}
    th, td {{ border: 1px solid #ccc; padding: 0.4rem 0.6rem; text-align: left; }}
    tr.passed td:nth-child(2) {{ color: #186218; }}
    tr.failed td:nth-child(2) {{ color: #b00020; }}
    tr.skipped td:nth-child(2) {{ color: #666; }}
  </style>
</head>
<body>
  <h1>Accessibility audit results</h1>
  <p>{passed} passed, {failed} failed, {skipped} skipped of {total} targets ({duration} ms)</p>
  <table>
    <thead>
      <tr><th>Target</th><th>Status</th><th>Duration</th><th>Report</th><th>Detail</th></tr>
    </thead>
    <tbody>
{rows}    </tbody>
  </table>
</body>
</html>
"#,
        passed = suite.passed,
        failed = suite.failed,
        skipped = suite.skipped,
        total = suite.total,
        duration = suite.duration_ms,
    );

    let path = output_dir.join("index.html");
    std::fs::write(&path, html)?;
    Ok(path)
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or(text)
}

fn xml_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
