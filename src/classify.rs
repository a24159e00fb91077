//! Presentational classification of step output.
//!
//! Classes only pick how a line is shown. Whether a step passed is decided by
//! its exit code alone.

/// Case-sensitive markers that tag a line as an error.
pub const FAILURE_MARKERS: &[&str] = &["FAILURE", "Error"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineClass {
    Info,
    Success,
    Error,
}

/// Classify one line of tool output.
pub fn classify_line(line: &str) -> LineClass {
    if FAILURE_MARKERS.iter().any(|marker| line.contains(marker)) {
        LineClass::Error
    } else {
        LineClass::Success
    }
}
