//! Block scanner for the typst CLI's error stream.
//!
//! Two layouts are understood. The rich layout, one block per diagnostic,
//! blocks separated by a blank line:
//!
//! ```text
//! error: unknown variable: foo
//!   ┌─ /main.typ:2:2
//!   │
//! 2 │ #foo
//!   │  ^^^
//!   │
//!   = hint: ...
//! ```
//!
//! And the short layout (`--diagnostic-format short`), one line each:
//!
//! ```text
//! /main.typ:2:2: error: unknown variable: foo
//! ```

use super::format::gutter;
use super::report::{Entry, Severity};

/// Scan raw CLI output into entries, in input order.
pub(crate) fn scan(raw: &str) -> Vec<Entry> {
    let text = raw.replace("\r\n", "\n");
    let mut entries: Vec<Entry> = Vec::new();

    for block in text.split("\n\n") {
        if block.trim().is_empty() {
            continue;
        }

        let has_origin = block.lines().any(|line| line.trim_start().starts_with(gutter::HEADER));
        if !has_origin && block.lines().any(|line| parse_short_line(line).is_some()) {
            scan_short_block(block, &mut entries);
            continue;
        }

        match scan_rich_block(block) {
            Block::Entry(entry) => entries.push(entry),
            // A hint separated from its diagnostic by a blank line
            Block::Hints(hints) => match entries.last_mut() {
                Some(last) => last.hints.extend(hints),
                None => tracing::trace!(block, "skipping hints without diagnostic"),
            },
            Block::Skip => tracing::trace!(block, "skipping diagnostic block"),
        }
    }

    entries
}

enum Block {
    Entry(Entry),
    Hints(Vec<String>),
    Skip,
}

/// Message lines up to the origin line, hints from anywhere in the block.
fn scan_rich_block(block: &str) -> Block {
    let mut message: Vec<&str> = Vec::new();
    let mut hints = Vec::new();
    let mut origin = None;

    for line in block.lines() {
        if let Some(hint) = parse_hint(line) {
            hints.push(hint.to_string());
            continue;
        }
        // Everything after the origin is source snippet
        if origin.is_some() {
            continue;
        }
        if let Some(reference) = line.trim_start().strip_prefix(gutter::HEADER) {
            origin = Some(reference.trim());
        } else if !(message.is_empty() && line.trim().is_empty()) {
            message.push(line);
        }
    }

    let message = message.join("\n");
    let message = message.trim_end();
    if message.is_empty() {
        return if hints.is_empty() {
            Block::Skip
        } else {
            Block::Hints(hints)
        };
    }

    let (severity, message) = split_severity(message);
    let (path, line, column) = origin.map(parse_location).unwrap_or_default();

    Block::Entry(Entry {
        severity,
        message: message.to_string(),
        path,
        line,
        column,
        hints,
    })
}

fn scan_short_block(block: &str, entries: &mut Vec<Entry>) {
    for line in block.lines() {
        if let Some(entry) = parse_short_line(line) {
            entries.push(entry);
        } else if let Some(hint) = parse_hint(line)
            && let Some(last) = entries.last_mut()
        {
            last.hints.push(hint.to_string());
        } else if !line.trim().is_empty() {
            tracing::trace!(line, "skipping diagnostic line");
        }
    }
}

/// `path:line:col: error: message`, also with `warning` or `help`.
fn parse_short_line(line: &str) -> Option<Entry> {
    let (index, severity, label) = [
        (Severity::Error, ": error: "),
        (Severity::Warning, ": warning: "),
        (Severity::Help, ": help: "),
    ]
    .into_iter()
    .filter_map(|(severity, label)| line.find(label).map(|index| (index, severity, label)))
    .min_by_key(|(index, ..)| *index)?;

    let (path, line_no, column) = parse_location(&line[..index]);
    if line_no == 0 || column == 0 {
        return None;
    }

    Some(Entry {
        severity,
        message: line[index + label.len()..].trim_end().to_string(),
        path,
        line: line_no,
        column,
        hints: Vec::new(),
    })
}

/// `= hint: text` in rich output, `hint: text` in short output.
fn parse_hint(line: &str) -> Option<&str> {
    let line = line.trim_start();
    let line = line.strip_prefix(gutter::NOTE).map_or(line, str::trim_start);
    line.strip_prefix("hint:").map(str::trim)
}

/// Strip a leading `error:` / `warning:` / `help:` label.
fn split_severity(message: &str) -> (Severity, &str) {
    [Severity::Error, Severity::Warning, Severity::Help]
        .into_iter()
        .find_map(|severity| {
            let rest = message.strip_prefix(severity.as_str())?.strip_prefix(':')?;
            Some((severity, rest.trim_start()))
        })
        .unwrap_or((Severity::Error, message))
}

/// Split `path:line:col` from the right, so paths may contain `:`.
///
/// Missing or malformed numbers are zero. A non-numeric line slot in front
/// of a column (`main.typ:x:3`) is dropped from the path; a slot holding a
/// separator or a `.`, or following a drive letter, is kept as part of it.
/// An empty path is `None`.
fn parse_location(reference: &str) -> (Option<String>, usize, usize) {
    let mut path = reference;
    let mut numbers = Vec::with_capacity(2);

    while numbers.len() < 2 {
        let Some((rest, last)) = path.rsplit_once(':') else {
            break;
        };
        if last.is_empty() || !last.bytes().all(|b| b.is_ascii_digit()) {
            break;
        }
        numbers.push(last.parse().unwrap_or(0));
        path = rest;
    }

    let (line, column) = match numbers[..] {
        [column, line] => (line, column),
        [number] => match malformed_line_slot(path) {
            Some(rest) => {
                path = rest;
                (0, number)
            }
            None => (number, 0),
        },
        _ => (0, 0),
    };
    let path = (!path.is_empty()).then(|| path.to_string());
    (path, line, column)
}

/// The path in front of a `:slot` that can only be a broken line number.
fn malformed_line_slot(path: &str) -> Option<&str> {
    let (rest, slot) = path.rsplit_once(':')?;
    let drive = rest.len() == 1 && rest.bytes().all(|b| b.is_ascii_alphabetic());
    (!drive && !slot.contains(['/', '\\', '.'])).then_some(rest)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(message: &str, path: Option<&str>, line: usize, column: usize) -> Entry {
        Entry {
            severity: Severity::Error,
            message: message.into(),
            path: path.map(Into::into),
            line,
            column,
            hints: Vec::new(),
        }
    }

    #[test]
    fn test_empty_input() {
        assert!(scan("").is_empty());
        assert!(scan("\n\n\n\n").is_empty());
    }

    #[test]
    fn test_two_blocks_in_order() {
        let raw = "\
error: first
  ┌─ /a.typ:1:2
  │
1 │ #x
  │  ^

error: second
  ┌─ /b.typ:30:4
  │
30 │ #y
   │    ^
";
        assert_eq!(
            scan(raw),
            vec![
                entry("first", Some("/a.typ"), 1, 2),
                entry("second", Some("/b.typ"), 30, 4),
            ]
        );
    }

    #[test]
    fn test_block_without_origin() {
        let entries = scan("error: input file not found (searched at /tmp/x.typ)\n");
        assert_eq!(
            entries,
            vec![entry("input file not found (searched at /tmp/x.typ)", None, 0, 0)]
        );
    }

    #[test]
    fn test_free_text_defaults_to_error() {
        let entries = scan("something went wrong\nacross two lines");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].severity, Severity::Error);
        assert_eq!(entries[0].message, "something went wrong\nacross two lines");
    }

    #[test]
    fn test_identical_blocks_are_kept() {
        let block = "warning: unused\n  ┌─ a.typ:1:1\n";
        let entries = scan(&format!("{block}\n{block}"));
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0], entries[1]);
        assert_eq!(entries[0].severity, Severity::Warning);
    }

    #[test]
    fn test_crlf_and_trailing_separator() {
        let raw = "error: one\r\n  ┌─ a.typ:1:1\r\n\r\nerror: two\r\n\r\n";
        let messages: Vec<_> = scan(raw).into_iter().map(|e| e.message).collect();
        assert_eq!(messages, vec!["one", "two"]);
    }

    #[test]
    fn test_hints_collected() {
        let raw = "\
error: expected expression
  ┌─ /main.typ:1:2
  │
1 │ #-
  │  ^
  │
  = hint: first hint
  = hint: second hint
";
        let entries = scan(raw);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].message, "expected expression");
        assert_eq!(entries[0].hints, vec!["first hint", "second hint"]);
    }

    #[test]
    fn test_detached_hint_block() {
        let raw = "error: a\n  ┌─ x.typ:1:1\n\n  = hint: try b\n";
        let entries = scan(raw);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].hints, vec!["try b"]);
        assert!(scan("  = hint: orphan\n").is_empty());
    }

    #[test]
    fn test_trace_blocks_kept_as_help() {
        let raw = "\
error: assertion failed
  ┌─ /lib.typ:2:2

help: error occurred in this call of function `check`
  ┌─ /main.typ:5:1
";
        let entries = scan(raw);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0], entry("assertion failed", Some("/lib.typ"), 2, 2));
        assert_eq!(
            entries[1],
            Entry {
                severity: Severity::Help,
                ..entry(
                    "error occurred in this call of function `check`",
                    Some("/main.typ"),
                    5,
                    1
                )
            }
        );
    }

    #[test]
    fn test_severity_labels() {
        assert_eq!(split_severity("help: x"), (Severity::Help, "x"));
        assert_eq!(split_severity("warning:y"), (Severity::Warning, "y"));
        assert_eq!(split_severity("helpful text"), (Severity::Error, "helpful text"));
    }

    #[test]
    fn test_windows_path_with_colon() {
        let entries = scan("error: x\n  ┌─ C:\\docs\\main.typ:12:5\n");
        assert_eq!(entries[0].path.as_deref(), Some("C:\\docs\\main.typ"));
        assert_eq!((entries[0].line, entries[0].column), (12, 5));
    }

    #[test]
    fn test_malformed_origin() {
        assert_eq!(parse_location("main.typ:x:3"), (Some("main.typ".into()), 0, 3));
        assert_eq!(parse_location("main.typ::3"), (Some("main.typ".into()), 0, 3));
        assert_eq!(parse_location("main.typ:12"), (Some("main.typ".into()), 12, 0));
        assert_eq!(
            parse_location("C:\\docs\\main.typ:12"),
            (Some("C:\\docs\\main.typ".into()), 12, 0)
        );
        assert_eq!(parse_location("C:main.typ:4"), (Some("C:main.typ".into()), 4, 0));
        assert_eq!(parse_location("main.typ"), (Some("main.typ".into()), 0, 0));
        assert_eq!(parse_location(":1:2"), (None, 1, 2));
        assert_eq!(parse_location("a.typ:99999999999999999999999:1").1, 0);

        let entries = scan("error: x\n  ┌─ \n");
        assert_eq!(entries, vec![entry("x", None, 0, 0)]);
    }

    #[test]
    fn test_short_format() {
        let raw = "\
/main.typ:3:1: error: assertion failed: Test
hint: check the condition
lib/x.typ:10:20: warning: unused variable
";
        let entries = scan(raw);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].message, "assertion failed: Test");
        assert_eq!(entries[0].path.as_deref(), Some("/main.typ"));
        assert_eq!((entries[0].line, entries[0].column), (3, 1));
        assert_eq!(entries[0].hints, vec!["check the condition"]);
        assert_eq!(entries[1].severity, Severity::Warning);
        assert_eq!(entries[1].path.as_deref(), Some("lib/x.typ"));
    }

    #[test]
    fn test_snippet_line_does_not_switch_to_short() {
        let raw = "\
error: unexpected argument
  ┌─ /main.typ:3:1
  │
3 │ a.typ:1:2: error: x
  │ ^
";
        assert_eq!(
            scan(raw),
            vec![entry("unexpected argument", Some("/main.typ"), 3, 1)]
        );
    }

    #[test]
    fn test_short_line_needs_location() {
        assert!(parse_short_line("error: no location").is_none());
        assert!(parse_short_line("a.typ: error: no numbers").is_none());
        let entry = parse_short_line("C:\\a.typ:1:2: error: boom: deep").unwrap();
        assert_eq!(entry.path.as_deref(), Some("C:\\a.typ"));
        assert_eq!(entry.message, "boom: deep");
    }
}
