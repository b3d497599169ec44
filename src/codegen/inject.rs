//! Named `#let` bindings for document preambles.
//!
//! ```text
//! #let author = "Jane"
//! #let pages = 12
//! ```

use std::io::Write;

use super::encoder::ValueEncoder;
use super::error::{EncodeError, PathSegment};
use super::ident::{clean_identifier, is_identifier};
use super::value::ToValue;

/// Write one `#let <name> = <value>` line per entry.
///
/// Entries are written in ascending key order, so the output does not depend
/// on the iteration order of the input. Each key is checked before anything
/// is written for it; an invalid key aborts with
/// [`EncodeError::InvalidIdentifier`], leaving the earlier bindings in the
/// writer.
///
/// # Example
///
/// ```ignore
/// use std::collections::HashMap;
/// use typst_bridge::codegen::{inject_values, Value};
///
/// let mut preamble = Vec::new();
/// inject_values(&mut preamble, HashMap::from([("title", Value::Str("Report".into()))]))?;
/// assert_eq!(preamble, b"#let title = \"Report\"\n");
/// ```
pub fn inject_values<W, I, K, V>(writer: W, values: I) -> Result<(), EncodeError>
where
    W: Write,
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: ToValue,
{
    let mut bindings: Vec<_> = values.into_iter().collect();
    bindings.sort_by(|a, b| a.0.as_ref().cmp(b.0.as_ref()));

    if let Some(pair) = bindings
        .windows(2)
        .find(|pair| pair[0].0.as_ref() == pair[1].0.as_ref())
    {
        return Err(EncodeError::DuplicateKey(pair[0].0.as_ref().to_string()));
    }

    tracing::debug!(count = bindings.len(), "injecting bindings");

    let mut encoder = ValueEncoder::new(writer);
    for (name, value) in &bindings {
        let name = name.as_ref();
        if !is_identifier(name) {
            return Err(EncodeError::InvalidIdentifier(name.to_string()));
        }

        encoder.write_str("#let ")?;
        encoder.write_str(&clean_identifier(name))?;
        encoder.write_str(" = ")?;
        encoder
            .encode_value(value)
            .map_err(|e| e.within(PathSegment::Binding(name.to_string())))?;
        encoder.write_str("\n")?;
    }
    Ok(())
}

/// [`inject_values`] into a new string.
pub fn inject_to_string<I, K, V>(values: I) -> Result<String, EncodeError>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: ToValue,
{
    let mut buf = Vec::new();
    inject_values(&mut buf, values)?;
    String::from_utf8(buf)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e).into())
}
