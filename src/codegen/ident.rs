//! Typst identifier rules.
//!
//! Uses the lexer predicates from `typst-syntax`: an identifier starts with
//! an XID start character or `_`, and continues with XID continue
//! characters, `_` or `-`. Keywords are never identifiers.

use typst_syntax::{is_id_continue, is_id_start};

/// Reserved words of the code mode lexer.
const KEYWORDS: &[&str] = &[
    "none", "auto", "true", "false", "not", "and", "or", "let", "set", "show", "context", "if",
    "else", "for", "in", "while", "break", "continue", "return", "import", "include", "as",
];

/// Whether `input` is a reserved word.
pub fn is_keyword(input: &str) -> bool {
    KEYWORDS.contains(&input)
}

/// Placeholder for names with no usable characters.
///
/// A lone `_` is not usable either: it is the wildcard pattern.
const INVALID: &str = "_invalid_";

/// Check whether `input` is a valid binding name.
///
/// A lone `_` and keywords such as `none` or `let` are rejected.
///
/// # Example
///
/// ```ignore
/// use typst_bridge::codegen::is_identifier;
///
/// assert!(is_identifier("page-count"));
/// assert!(!is_identifier("-page"));
/// ```
pub fn is_identifier(input: &str) -> bool {
    if input.is_empty() || input == "_" || is_keyword(input) {
        return false;
    }

    let mut chars = input.chars();
    chars.next().is_some_and(is_id_start) && chars.all(is_id_continue)
}

/// Turn arbitrary text into a valid identifier.
///
/// Every illegal character becomes `_`. Empty results and a lone `_` become
/// `_invalid_`, and keywords get a trailing `_` (`let` → `let_`).
pub fn clean_identifier(input: &str) -> String {
    let cleaned: String = input
        .chars()
        .enumerate()
        .map(|(i, c)| {
            let legal = if i == 0 { is_id_start(c) } else { is_id_continue(c) };
            if legal { c } else { '_' }
        })
        .collect();

    match cleaned.as_str() {
        "" | "_" => INVALID.to_string(),
        keyword if is_keyword(keyword) => format!("{keyword}_"),
        _ => cleaned,
    }
}
