//! Output formatting for the mirror CLI.
//!
//! User-facing progress and warning lines go to an injected writer rather
//! than a process-wide logger, so callers (and tests) decide where they end
//! up.

use crate::catalog::PackageEntry;
use crate::report::MirrorReport;
use std::fmt::Display;
use std::io::Write;

/// Write one line to `stderr`, ignoring write failures.
pub fn write_stderr_line(stderr: &mut dyn Write, message: impl Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Best-effort output; ignore write failures.
    }
}

/// Warning line for a tolerated failure.
///
/// # Examples
///
/// ```
/// use chartmirror::catalog::PackageEntry;
/// use chartmirror::output::skip_warning;
///
/// let entry = PackageEntry::new("app", "1.0.0", Vec::<String>::new());
/// let line = skip_warning(&entry, "not found");
/// assert!(line.starts_with("WARNING: processing chart app(1.0.0)"));
/// ```
#[must_use]
pub fn skip_warning(entry: &PackageEntry, reason: impl Display) -> String {
    format!("WARNING: processing chart {entry} - {reason}")
}

/// Summary printed after a successful run.
#[must_use]
pub fn success_message(report: &MirrorReport) -> String {
    let written = report.written().count();
    let skipped = report.skipped().count();
    let plural = if written == 1 { "archive" } else { "archives" };
    let mut message = format!("Mirrored {written} chart {plural}");
    if skipped > 0 {
        message.push_str(&format!(" ({skipped} skipped)"));
    }
    if let Some(index) = report.index_path() {
        message.push_str(&format!("; index published at {index}"));
    }
    message
}
