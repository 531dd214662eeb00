//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Batch
//!
//! ```text
//! [1/10] part1
//!     multiply with pattern1.tga
//!     → part1.tga (512x512): match
//! [2/10] part2
//!     subtract with layer2.tga
//!     → part2.tga (512x512): 42 samples differ
//!
//! Wrote 12 files for 10 tasks
//! Verification: 1 of 12 outputs failed
//! ```
//!
//! ## Inspect
//!
//! ```text
//! 001 car.tga
//!     512x512, bottom-left origin, 786450 bytes
//! 002 broken.tga
//!     Invalid: need 24 bits per pixel, got 32
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::batch::{BatchEvent, BatchReport, VerifyStatus};
use crate::pixels::Dimensions;
use crate::scan::{Inspection, ScanEntry};

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

// ============================================================================
// Batch output
// ============================================================================

fn format_verify(status: &VerifyStatus) -> String {
    match status {
        VerifyStatus::Match => "match".to_string(),
        VerifyStatus::Differs { samples } => format!("{} differ", plural(*samples, "sample")),
        VerifyStatus::SizeMismatch { expected, actual } => {
            format!("size mismatch, reference is {expected} but output is {actual}")
        }
        VerifyStatus::Missing { reference } => format!("missing reference {reference}"),
        VerifyStatus::Unreadable { reference, reason } => {
            format!("unreadable reference {reference}: {reason}")
        }
    }
}

/// Format a single batch progress event as display lines.
pub fn format_batch_event(event: &BatchEvent) -> Vec<String> {
    match event {
        BatchEvent::TaskStarted { index, total, name } => {
            vec![format!("[{index}/{total}] {name}")]
        }
        BatchEvent::StepApplied { description } => {
            vec![format!("{}{}", indent(1), description)]
        }
        BatchEvent::OutputWritten {
            file,
            dimensions,
            verify,
        } => {
            let mut line = format!("{}\u{2192} {} ({})", indent(1), file, dimensions);
            if let Some(status) = verify {
                line.push_str(": ");
                line.push_str(&format_verify(status));
            }
            vec![line]
        }
    }
}

/// Format the closing summary of a batch run.
pub fn format_batch_summary(report: &BatchReport) -> Vec<String> {
    let mut lines = vec![
        String::new(),
        format!(
            "Wrote {} for {}",
            plural(report.output_count(), "file"),
            plural(report.tasks.len(), "task")
        ),
    ];
    if report.verified {
        let failures = report.failures();
        if failures.is_empty() {
            lines.push(format!(
                "Verification: all {} outputs match",
                report.output_count()
            ));
        } else {
            lines.push(format!(
                "Verification: {} of {} outputs failed",
                failures.len(),
                report.output_count()
            ));
            for output in failures {
                if let Some(status) = &output.verify {
                    lines.push(format!(
                        "{}{}: {}",
                        indent(1),
                        output.file,
                        format_verify(status)
                    ));
                }
            }
        }
    }
    lines
}

/// Print the batch summary to stdout.
pub fn print_batch_summary(report: &BatchReport) {
    for line in format_batch_summary(report) {
        println!("{}", line);
    }
}

// ============================================================================
// Inspect output
// ============================================================================

/// Format scan entries: positional index + path, then indented header facts.
pub fn format_scan_output(entries: &[ScanEntry]) -> Vec<String> {
    if entries.is_empty() {
        return vec!["No TGA files found".to_string()];
    }

    let mut lines = Vec::new();
    for (i, entry) in entries.iter().enumerate() {
        lines.push(format!(
            "{} {}",
            format_index(i + 1),
            entry.path.display()
        ));
        match &entry.inspection {
            Inspection::Valid { info, complete } => {
                lines.push(format!(
                    "{}{}, {} origin, {} bytes",
                    indent(1),
                    info.dimensions,
                    info.origin.label(),
                    entry.file_len
                ));
                if info.id_length > 0 {
                    lines.push(format!(
                        "{}Image ID: {}",
                        indent(1),
                        plural(usize::from(info.id_length), "byte")
                    ));
                }
                if !complete {
                    lines.push(format!(
                        "{}Truncated: header needs {} bytes",
                        indent(1),
                        info.expected_file_len()
                    ));
                }
            }
            Inspection::Invalid { reason } => {
                lines.push(format!("{}Invalid: {}", indent(1), reason));
            }
        }
    }
    lines
}

/// Print scan output to stdout.
pub fn print_scan_output(entries: &[ScanEntry]) {
    for line in format_scan_output(entries) {
        println!("{}", line);
    }
}

// ============================================================================
// Single-file commands
// ============================================================================

/// One-line confirmation for commands that write a single image.
pub fn format_written(path: &std::path::Path, dimensions: Dimensions) -> String {
    format!("Wrote {} ({})", path.display(), dimensions)
}

/// Result line for `compare`.
pub fn format_compare(differences: usize, dimensions: Dimensions) -> String {
    if differences == 0 {
        format!("Identical ({dimensions})")
    } else {
        let total = dimensions.byte_len();
        format!(
            "{} of {} differ ({dimensions})",
            plural(differences, "sample"),
            total
        )
    }
}
