//! CLI output formatting.
//!
//! Every file a cycle touches is shown as one status line, path relative to
//! the project root:
//!
//! ```text
//! Compiled 2 glyphs → icons_3f2a9c01d4e5b678
//!       create  fonts/icons_3f2a9c01d4e5b678.ttf
//!       create  fonts/icons_3f2a9c01d4e5b678.woff
//!       create  fonts/icons.css
//!       create  fonts/icons-preview.html
//!       delete  fonts/icons_77aa01be5c3d9e20.ttf
//!        error  Cannot write scss template to fonts/_icons.scss: ...
//! ```
//!
//! # Architecture
//!
//! Each `format_*` function returns `Vec<String>` and does no I/O; the
//! `print_*` wrappers write to stdout (status) or stderr (errors).

use crate::cache::Reconciled;
use crate::error::Error;
use crate::pipeline::CycleReport;
use std::path::Path;

const STATUS_WIDTH: usize = 12;

fn status(label: &str, message: impl std::fmt::Display) -> String {
    format!("{:>width$}  {}", label, message, width = STATUS_WIDTH)
}

fn display_path(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}

// ============================================================================
// Cycle
// ============================================================================

pub fn format_cycle_report(report: &CycleReport, root: &Path) -> Vec<String> {
    let glyphs = report.fonts.glyphs.len();
    let mut lines = vec![format!(
        "Compiled {} glyph{} → {}",
        glyphs,
        if glyphs == 1 { "" } else { "s" },
        report.fonts.base_name
    )];

    for path in report.fonts.paths() {
        lines.push(status("create", display_path(path, root)));
    }
    for (_, path) in &report.templates.written {
        lines.push(status("create", display_path(path, root)));
    }
    lines.extend(format_reconciled(&report.cleanup, root));
    lines.extend(format_problems(report));
    lines
}

/// Only the error lines of a report. Shown even in quiet mode.
pub fn format_problems(report: &CycleReport) -> Vec<String> {
    let mut lines: Vec<String> = report
        .templates
        .failures
        .iter()
        .map(|failure| status("error", failure))
        .collect();
    if let Some(e) = &report.cache_error {
        lines.push(status("error", format!("data cache not saved: {e}")));
    }
    lines
}

pub fn format_reconciled(result: &Reconciled, root: &Path) -> Vec<String> {
    let mut lines: Vec<String> = result
        .deleted
        .iter()
        .map(|p| status("delete", display_path(p, root)))
        .collect();
    for (path, e) in &result.failed {
        lines.push(status(
            "warn",
            format!("could not delete {}: {}", display_path(path, root), e),
        ));
    }
    lines
}

pub fn format_error(err: &Error) -> Vec<String> {
    vec![status("error", err)]
}

pub fn print_status(label: &str, message: impl std::fmt::Display) {
    println!("{}", status(label, message));
}

pub fn print_cycle_report(report: &CycleReport, root: &Path) {
    for line in format_cycle_report(report, root) {
        println!("{}", line);
    }
}

pub fn print_problems(report: &CycleReport) {
    for line in format_problems(report) {
        eprintln!("{}", line);
    }
}

pub fn print_reconciled(result: &Reconciled, root: &Path) {
    for line in format_reconciled(result, root) {
        println!("{}", line);
    }
}

pub fn print_error(err: &Error) {
    for line in format_error(err) {
        eprintln!("{}", line);
    }
}
