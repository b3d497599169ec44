//! Rendering of parsed diagnostics back into text.

use std::fmt::Write;

use super::report::{Entry, Severity};

// ============================================================================
// Options
// ============================================================================

/// Display style for diagnostic output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DisplayStyle {
    /// Message, origin line and hints, laid out like the typst CLI.
    #[default]
    Rich,
    /// One `file:line:col: severity: message` line per diagnostic.
    Short,
}

/// How an [`Entry`] or a whole report is rendered.
///
/// Three switches: ANSI colouring of the severity label and gutter, the
/// layout, and whether hints are printed. The default is coloured rich
/// output with hints.
///
/// ```ignore
/// use typst_bridge::diagnostic::{DiagnosticOptions, DisplayStyle};
///
/// // Log files: no escape codes
/// let log = DiagnosticOptions::plain();
///
/// // Editors and CI annotations: one line per entry
/// let ci = DiagnosticOptions::short().with_colored(false);
///
/// let terse = DiagnosticOptions::default().with_hints(false);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiagnosticOptions {
    /// Paint severity labels and gutter glyphs with ANSI escapes. Ignored
    /// without the `colored-diagnostics` feature.
    pub colored: bool,
    /// Rich or one-line layout.
    pub style: DisplayStyle,
    /// Print `= hint:` lines (rich layout only).
    pub hints: bool,
}

impl Default for DiagnosticOptions {
    fn default() -> Self {
        Self {
            colored: true,
            style: DisplayStyle::Rich,
            hints: true,
        }
    }
}

impl DiagnosticOptions {
    /// Same as [`Default`], for call sites that want to say it.
    pub fn colored() -> Self {
        Self::default()
    }

    /// Rich layout without escape codes.
    pub fn plain() -> Self {
        Self {
            colored: false,
            ..Self::default()
        }
    }

    /// `path:line:col: severity: message`, still coloured.
    pub fn short() -> Self {
        Self {
            style: DisplayStyle::Short,
            ..Self::default()
        }
    }

    /// Replace the `colored` switch.
    pub fn with_colored(mut self, colored: bool) -> Self {
        self.colored = colored;
        self
    }

    /// Replace [`style`](Self::style).
    pub fn with_style(mut self, style: DisplayStyle) -> Self {
        self.style = style;
        self
    }

    /// Replace [`hints`](Self::hints).
    pub fn with_hints(mut self, hints: bool) -> Self {
        self.hints = hints;
        self
    }
}

// ============================================================================
// Gutter Characters
// ============================================================================

/// Box-drawing characters of the typst CLI's rich output.
pub(crate) mod gutter {
    /// Introduces the origin line: `  ┌─ main.typ:3:1`.
    pub const HEADER: &str = "┌─";
    /// Introduces a hint line: `  = hint: ...`.
    pub const NOTE: &str = "=";
}

// ============================================================================
// Coloring
// ============================================================================

/// Red for errors, yellow for warnings, cyan for trace notes.
#[cfg(feature = "colored-diagnostics")]
fn colorize(text: &str, severity: Severity) -> String {
    use owo_colors::OwoColorize;
    match severity {
        Severity::Error => text.red().to_string(),
        Severity::Warning => text.yellow().to_string(),
        Severity::Help => text.cyan().to_string(),
    }
}

#[cfg(feature = "colored-diagnostics")]
fn colorize_help(text: &str) -> String {
    use owo_colors::OwoColorize;
    text.cyan().to_string()
}

#[cfg(not(feature = "colored-diagnostics"))]
fn colorize(text: &str, _severity: Severity) -> String {
    text.to_owned()
}

#[cfg(not(feature = "colored-diagnostics"))]
fn colorize_help(text: &str) -> String {
    text.to_owned()
}

/// `paint` when colouring is on, identity otherwise.
fn painter(colored: bool, paint: impl Fn(&str) -> String + 'static) -> Box<dyn Fn(&str) -> String> {
    if colored {
        Box::new(paint)
    } else {
        Box::new(str::to_owned)
    }
}

// ============================================================================
// Entry Formatting
// ============================================================================

/// Format a single entry into the output string. Every line ends with `\n`.
pub(crate) fn format_entry(output: &mut String, entry: &Entry, options: &DiagnosticOptions) {
    let severity = entry.severity;
    let paint = painter(options.colored, move |s| colorize(s, severity));

    match options.style {
        DisplayStyle::Short => format_entry_short(output, entry, &paint),
        DisplayStyle::Rich => format_entry_rich(output, entry, &paint, options),
    }
}

fn format_entry_short(output: &mut String, entry: &Entry, paint: &dyn Fn(&str) -> String) {
    let label = paint(entry.severity.as_str());
    match entry.location() {
        Some(location) => _ = writeln!(output, "{location}: {label}: {}", entry.message),
        None => _ = writeln!(output, "{label}: {}", entry.message),
    }
}

fn format_entry_rich(
    output: &mut String,
    entry: &Entry,
    paint: &dyn Fn(&str) -> String,
    options: &DiagnosticOptions,
) {
    // Header: "error: message"
    _ = writeln!(output, "{}: {}", paint(entry.severity.as_str()), entry.message);

    if let Some(location) = entry.location() {
        _ = writeln!(output, "  {} {location}", paint(gutter::HEADER));
    }

    if options.hints {
        let help_paint = painter(options.colored, colorize_help);
        for hint in &entry.hints {
            _ = writeln!(output, "  {} hint: {hint}", help_paint(gutter::NOTE));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry() -> Entry {
        Entry {
            severity: Severity::Error,
            message: "unknown variable: x".into(),
            path: Some("/main.typ".into()),
            line: 3,
            column: 2,
            hints: vec!["if you meant to use subtraction, try adding spaces around the minus sign".into()],
        }
    }

    fn render(entry: &Entry, options: DiagnosticOptions) -> String {
        let mut output = String::new();
        format_entry(&mut output, entry, &options);
        output
    }

    #[test]
    fn test_rich_plain() {
        assert_eq!(
            render(&entry(), DiagnosticOptions::plain()),
            "error: unknown variable: x\n  ┌─ /main.typ:3:2\n  = hint: if you meant to use subtraction, try adding spaces around the minus sign\n"
        );
    }

    #[test]
    fn test_rich_without_hints_or_location() {
        let entry = Entry {
            path: None,
            line: 0,
            column: 0,
            ..entry()
        };
        assert_eq!(
            render(&entry, DiagnosticOptions::plain().with_hints(false)),
            "error: unknown variable: x\n"
        );
    }

    #[test]
    fn test_short_plain() {
        let options = DiagnosticOptions::short().with_colored(false);
        assert_eq!(
            render(&entry(), options),
            "/main.typ:3:2: error: unknown variable: x\n"
        );

        let warning = Entry {
            severity: Severity::Warning,
            path: None,
            ..entry()
        };
        assert_eq!(render(&warning, options), "warning: unknown variable: x\n");
    }

    #[test]
    fn test_help_entry_plain() {
        let trace = Entry {
            severity: Severity::Help,
            message: "error occurred in this call of function `check`".into(),
            hints: Vec::new(),
            ..entry()
        };
        assert_eq!(
            render(&trace, DiagnosticOptions::plain()),
            "help: error occurred in this call of function `check`\n  ┌─ /main.typ:3:2\n"
        );
    }

    #[cfg(feature = "colored-diagnostics")]
    #[test]
    fn test_colored_help_label() {
        let trace = Entry {
            severity: Severity::Help,
            ..entry()
        };
        let out = render(&trace, DiagnosticOptions::colored());
        assert!(out.starts_with("\u{1b}[36mhelp\u{1b}[39m: "));
    }

    #[cfg(feature = "colored-diagnostics")]
    #[test]
    fn test_colored_label() {
        let out = render(&entry(), DiagnosticOptions::colored());
        assert!(out.starts_with("\u{1b}[31merror\u{1b}[39m: unknown variable: x\n"));
        assert!(out.contains("\u{1b}[36m=\u{1b}[39m hint:"));
    }

    #[test]
    fn test_option_builders() {
        let options = DiagnosticOptions::plain()
            .with_style(DisplayStyle::Short)
            .with_hints(false);
        assert!(!options.colored);
        assert_eq!(options.style, DisplayStyle::Short);
        assert!(!options.hints);
        assert_eq!(DiagnosticOptions::colored(), DiagnosticOptions::default());
    }
}
