//! Structured diagnostics parsed from typst CLI output.

use std::fmt;

use super::format::{format_entry, DiagnosticOptions};
use super::parse::scan;

// ============================================================================
// Severity
// ============================================================================

/// Diagnostic severity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Severity {
    /// A fatal error.
    #[default]
    Error,
    /// A warning; compilation may still succeed.
    Warning,
    /// A trace note (`help: error occurred in this call ...`) pointing at a
    /// call site that led to the diagnostic before it.
    Help,
}

impl Severity {
    /// Label as printed by the typst CLI.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Help => "help",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Entry
// ============================================================================

/// One diagnostic parsed from the CLI's error stream.
///
/// Location fields are zero when unknown.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Entry {
    /// Error severity (error, warning or trace note).
    pub severity: Severity,
    /// The message, without the `error:` / `warning:` label. May span lines.
    pub message: String,
    /// File path (if available).
    pub path: Option<String>,
    /// Line number (1-indexed, 0 if unknown).
    pub line: usize,
    /// Column number (1-indexed, 0 if unknown).
    pub column: usize,
    /// Hint messages.
    pub hints: Vec<String>,
}

impl Entry {
    /// `path:line:col`, leaving out unknown parts. `None` without a path.
    pub fn location(&self) -> Option<String> {
        let path = self.path.as_deref()?;
        Some(match (self.line, self.column) {
            (0, _) => path.to_string(),
            (line, 0) => format!("{path}:{line}"),
            (line, column) => format!("{path}:{line}:{column}"),
        })
    }

    /// Format with custom options.
    pub fn with_options<'a>(&'a self, options: &'a DiagnosticOptions) -> EntryDisplay<'a> {
        EntryDisplay {
            entry: self,
            options,
        }
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.with_options(&crate::config::get().diagnostics).fmt(f)
    }
}

/// Display wrapper for formatting a single entry with custom options.
pub struct EntryDisplay<'a> {
    entry: &'a Entry,
    options: &'a DiagnosticOptions,
}

impl fmt::Display for EntryDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut output = String::new();
        format_entry(&mut output, self.entry, self.options);
        f.write_str(output.trim_end_matches('\n'))
    }
}

// ============================================================================
// DiagnosticSummary
// ============================================================================

/// Summary of diagnostic counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiagnosticSummary {
    /// Number of errors.
    pub errors: usize,
    /// Number of warnings.
    pub warnings: usize,
}

impl DiagnosticSummary {
    /// Total number of diagnostics.
    pub fn total(&self) -> usize {
        self.errors + self.warnings
    }

    /// Whether there are any errors.
    pub fn has_errors(&self) -> bool {
        self.errors > 0
    }

    /// Whether there are any diagnostics at all.
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

impl fmt::Display for DiagnosticSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.errors, self.warnings) {
            (0, 0) => write!(f, "no diagnostics"),
            (e, 0) => write!(f, "{e} error{}", if e == 1 { "" } else { "s" }),
            (0, w) => write!(f, "{w} warning{}", if w == 1 { "" } else { "s" }),
            (e, w) => write!(
                f,
                "{e} error{}, {w} warning{}",
                if e == 1 { "" } else { "s" },
                if w == 1 { "" } else { "s" }
            ),
        }
    }
}

// ============================================================================
// Report
// ============================================================================

/// Parsed diagnostics of one CLI invocation, plus the raw text.
///
/// Parsing never fails. Text the scanner does not understand yields no
/// entries, and the report then displays the raw text instead.
///
/// # Example
///
/// ```ignore
/// use typst_bridge::diagnostic::Report;
///
/// let report = Report::parse(String::from_utf8_lossy(&output.stderr));
/// for entry in report.errors() {
///     eprintln!("{}:{}: {}", entry.line, entry.column, entry.message);
/// }
/// return Err(report.into());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    entries: Vec<Entry>,
    raw: String,
}

impl Report {
    /// Parse the error stream of a finished typst invocation.
    pub fn parse(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let entries = scan(&raw);
        tracing::debug!(entries = entries.len(), bytes = raw.len(), "parsed diagnostics");
        Self { entries, raw }
    }

    /// All entries, in input order.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// The unparsed input text.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Get the number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over all entries.
    pub fn iter(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter()
    }

    /// Iterate over errors only.
    pub fn errors(&self) -> impl Iterator<Item = &Entry> {
        self.entries
            .iter()
            .filter(|e| e.severity == Severity::Error)
    }

    /// Iterate over warnings only.
    pub fn warnings(&self) -> impl Iterator<Item = &Entry> {
        self.entries
            .iter()
            .filter(|e| e.severity == Severity::Warning)
    }

    /// Check if there are any errors.
    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    /// The first entry, usually the one that stopped compilation.
    pub fn first(&self) -> Option<&Entry> {
        self.entries.first()
    }

    /// Get a summary of diagnostic counts.
    pub fn summary(&self) -> DiagnosticSummary {
        DiagnosticSummary {
            errors: self.errors().count(),
            warnings: self.warnings().count(),
        }
    }

    /// Format with custom options.
    ///
    /// # Example
    ///
    /// ```ignore
    /// use typst_bridge::diagnostic::DiagnosticOptions;
    ///
    /// // Configured formatting
    /// println!("{report}");
    ///
    /// // Custom options
    /// let options = DiagnosticOptions::short();
    /// println!("{}", report.with_options(&options));
    /// ```
    pub fn with_options<'a>(&'a self, options: &'a DiagnosticOptions) -> ReportDisplay<'a> {
        ReportDisplay {
            report: self,
            options,
        }
    }

    /// Take the entries out of the report.
    pub fn into_entries(self) -> Vec<Entry> {
        self.entries
    }
}

impl IntoIterator for Report {
    type Item = Entry;
    type IntoIter = std::vec::IntoIter<Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a Report {
    type Item = &'a Entry;
    type IntoIter = std::slice::Iter<'a, Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.with_options(&crate::config::get().diagnostics).fmt(f)
    }
}

impl std::error::Error for Report {}

/// Display wrapper for formatting a report with custom options.
pub struct ReportDisplay<'a> {
    report: &'a Report,
    options: &'a DiagnosticOptions,
}

impl fmt::Display for ReportDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.report.is_empty() {
            return f.write_str(self.report.raw.trim_end());
        }

        let mut output = String::new();
        for (i, entry) in self.report.entries.iter().enumerate() {
            if i > 0 {
                output.push('\n');
            }
            format_entry(&mut output, entry, self.options);
        }
        f.write_str(output.trim_end_matches('\n'))
    }
}
