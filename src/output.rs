//! CLI output formatting.
//!
//! Each command has a `format_*` function that returns lines (pure, testable)
//! and a `print_*` wrapper that writes them to stdout. Logging goes to stderr
//! through `tracing`, so stdout stays clean for these lines or `--json`.
//!
//! ```text
//! Resized 800x600 → 400x300
//!     Output: photos/cat-resized.jpg
//!     Quality: 0.48 (10 attempts)
//!     Download (≈ 50 KB)
//!     Target: 50 KB (met)
//! ```

use crate::batch::{BatchOutcome, BatchSummary};
use crate::pipeline::Report;
use crate::source::ImageInfo;
use std::path::Path;

/// The size label shown for a finished encode.
pub fn download_label(size_kb: u64) -> String {
    format!("Download (\u{2248} {} KB)", size_kb)
}

/// `50 KB`, `1.5 KB`: drop the fraction when there is none.
fn format_kb(kb: f64) -> String {
    if kb.fract() == 0.0 {
        format!("{} KB", kb as u64)
    } else {
        format!("{:.1} KB", kb)
    }
}

/// Lines describing one finished file.
pub fn format_report(report: &Report, action: &str) -> Vec<String> {
    let mut lines = vec![format!(
        "{} {}x{} \u{2192} {}x{}",
        action, report.source_width, report.source_height, report.width, report.height
    )];
    lines.push(format!("    Output: {}", report.output.display()));
    let attempts = match report.encoded.attempts {
        1 => String::new(),
        n => format!(" ({} attempts)", n),
    };
    lines.push(format!(
        "    Quality: {:.2}{}",
        report.encoded.quality, attempts
    ));
    lines.push(format!("    {}", download_label(report.encoded.size_kb)));
    if let Some(kb) = report.target_kb.filter(|kb| *kb > 0.0) {
        if report.missed_target() {
            lines.push(format!(
                "    Target: {} (not reachable, smallest is {} KB)",
                format_kb(kb),
                report.encoded.size_kb
            ));
        } else {
            lines.push(format!("    Target: {} (met)", format_kb(kb)));
        }
    }
    lines
}

pub fn print_report(report: &Report, action: &str) {
    for line in format_report(report, action) {
        println!("{}", line);
    }
}

/// Lines for `info`.
pub fn format_info(path: &Path, info: &ImageInfo) -> Vec<String> {
    vec![
        path.display().to_string(),
        format!("    Format: {}", info.format.name()),
        format!("    Dimensions: {}x{}", info.width, info.height),
        format!("    Aspect ratio: {:.4}", info.aspect_ratio()),
        format!(
            "    File size: {} KB",
            crate::imaging::calculations::size_kb(info.file_size as usize)
        ),
    ]
}

pub fn print_info(path: &Path, info: &ImageInfo) {
    for line in format_info(path, info) {
        println!("{}", line);
    }
}

/// One line per file plus a summary.
pub fn format_batch(outcomes: &[BatchOutcome]) -> Vec<String> {
    let mut lines = Vec::with_capacity(outcomes.len() + 1);
    for outcome in outcomes {
        match &outcome.result {
            Ok(report) => {
                let note = if report.missed_target() {
                    " (over target)"
                } else {
                    ""
                };
                lines.push(format!(
                    "{} \u{2192} {} ({}x{}, {} KB){}",
                    outcome.input.display(),
                    report.output.display(),
                    report.width,
                    report.height,
                    report.encoded.size_kb,
                    note
                ));
            }
            Err(e) => lines.push(format!("{}: failed: {}", outcome.input.display(), e)),
        }
    }
    lines.push(format_summary(&BatchSummary::from_outcomes(outcomes)));
    lines
}

fn format_summary(summary: &BatchSummary) -> String {
    let mut line = format!("Wrote {} files", summary.written);
    if summary.over_target > 0 {
        line.push_str(&format!(", {} over target", summary.over_target));
    }
    if summary.failed > 0 {
        line.push_str(&format!(", {} failed", summary.failed));
    }
    line
}

pub fn print_batch(outcomes: &[BatchOutcome]) {
    for line in format_batch(outcomes) {
        println!("{}", line);
    }
}
