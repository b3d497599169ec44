//! Parsing and formatting of typst CLI diagnostics.
//!
//! The CLI reports errors and warnings as text on stderr. [`Report::parse`]
//! turns that text into [`Entry`] values and keeps the raw text for display
//! when nothing could be recognised.

mod format;
mod parse;
mod report;

// Re-export all public types
pub use format::{DiagnosticOptions, DisplayStyle};
pub use report::{
    DiagnosticSummary, Entry, EntryDisplay, Report, ReportDisplay, Severity,
};
