//! Value → Typst markup encoding.
//!
//! The encoder writes Typst code expressions:
//!
//! | Value | Markup |
//! |-------|--------|
//! | `-123` | `{-123}` |
//! | `1.5` | `1.5e+00` |
//! | `"a\nb"` | `"a\nb"` |
//! | `[5]` | `(5,)` |
//! | `[1u8, 2]` | `bytes((1, 2))` |
//! | `{"b": 2, "a": 1}` | `(\n  "a": 1,\n  "b": 2,\n)` |
//!
//! Negative numbers are wrapped in a code block, otherwise `#let x = -1`
//! style contexts read the minus as continuing the previous expression.

use std::io::{self, Write};

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::Serialize;

use super::error::{EncodeError, PathSegment};
use super::value::{Record, ToValue, Value};

/// Encode a value into Typst markup.
///
/// # Example
///
/// ```ignore
/// use typst_bridge::codegen::marshal;
///
/// assert_eq!(marshal(&-123i64)?, "{-123}");
/// assert_eq!(marshal(&vec!["Foo"])?, r#"("Foo",)"#);
/// ```
pub fn marshal<T: ToValue + ?Sized>(value: &T) -> Result<String, EncodeError> {
    let mut encoder = ValueEncoder::new(Vec::new());
    encoder.encode(&value.to_value())?;
    into_string(encoder.into_inner())
}

/// Encode any `Serialize` type into Typst markup.
///
/// See [`to_value`](super::to_value) for how serde types are mapped.
pub fn marshal_serialize<T: Serialize + ?Sized>(value: &T) -> Result<String, EncodeError> {
    let mut encoder = ValueEncoder::new(Vec::new());
    encoder.encode_serialize(value)?;
    into_string(encoder.into_inner())
}

fn into_string(buf: Vec<u8>) -> Result<String, EncodeError> {
    String::from_utf8(buf).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e).into())
}

/// Streaming Typst markup encoder.
///
/// Holds the current indentation depth, so one encoder must not be shared
/// between concurrent encodes. The depth is restored on every exit path,
/// including errors, so an encoder stays usable after a failed encode.
///
/// Cyclic values cannot be built from [`Value`], which owns its children.
/// Deeply nested input recurses once per level.
#[derive(Debug)]
pub struct ValueEncoder<W> {
    writer: W,
    indent_level: usize,
}

impl<W: Write> ValueEncoder<W> {
    /// Create an encoder that writes into `writer`.
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            indent_level: 0,
        }
    }

    /// Encode a [`Value`].
    pub fn encode(&mut self, value: &Value) -> Result<(), EncodeError> {
        self.marshal(value)
    }

    /// Encode anything that converts via [`ToValue`].
    pub fn encode_value<T: ToValue + ?Sized>(&mut self, value: &T) -> Result<(), EncodeError> {
        self.marshal(&value.to_value())
    }

    /// Encode any `Serialize` type.
    pub fn encode_serialize<T: Serialize + ?Sized>(
        &mut self,
        value: &T,
    ) -> Result<(), EncodeError> {
        let value = super::ser::to_value(value)?;
        self.marshal(&value)
    }

    /// Current block nesting depth. Zero between encodes.
    pub fn indent_level(&self) -> usize {
        self.indent_level
    }

    /// Borrow the underlying writer.
    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    /// Consume the encoder, returning the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }

    // -------------------------------------------------------------------------
    // Writing primitives
    // -------------------------------------------------------------------------

    pub(crate) fn write_str(&mut self, s: &str) -> Result<(), EncodeError> {
        self.writer.write_all(s.as_bytes())?;
        Ok(())
    }

    fn write_indent(&mut self) -> Result<(), EncodeError> {
        for _ in 0..self.indent_level {
            self.write_str("  ")?;
        }
        Ok(())
    }

    fn write_string_literal(&mut self, s: &str) -> Result<(), EncodeError> {
        let mut dst = String::with_capacity(s.len() + 2);
        dst.push('"');
        for c in s.chars() {
            match c {
                '\\' | '"' => {
                    dst.push('\\');
                    dst.push(c);
                }
                '\n' => dst.push_str("\\n"),
                '\r' => dst.push_str("\\r"),
                '\t' => dst.push_str("\\t"),
                _ => dst.push(c),
            }
        }
        dst.push('"');
        self.write_str(&dst)
    }

    /// Write a `{ .. }` code block around a negative literal.
    fn write_wrapped(&mut self, literal: &str) -> Result<(), EncodeError> {
        self.write_str("{")?;
        self.write_str(literal)?;
        self.write_str("}")
    }

    // -------------------------------------------------------------------------
    // Dispatch
    // -------------------------------------------------------------------------

    fn marshal(&mut self, value: &Value) -> Result<(), EncodeError> {
        match value {
            Value::None => self.write_str("none"),
            Value::Bool(b) => self.write_str(if *b { "true" } else { "false" }),
            Value::Int(i) => self.encode_int(*i),
            Value::UInt(u) => self.write_str(&u.to_string()),
            Value::Float(f) => self.encode_float(*f),
            Value::Str(s) => self.write_string_literal(s),
            Value::Bytes(bytes) => self.encode_bytes(bytes),
            Value::Array(items) => self.encode_array(items),
            Value::Map(pairs) => self.encode_map(pairs),
            Value::Record(record) => self.encode_record(record),
            Value::DateTime(dt) => self.write_str(&format_datetime(dt)),
            Value::Date(date) => self.write_str(&format_date(date)),
            Value::Time(time) => self.write_str(&format_time(time)),
            Value::Duration { seconds } => {
                self.write_str(&format!("duration(seconds: {seconds})"))
            }
            Value::Literal(hook) => {
                let markup = hook.call().map_err(|source| EncodeError::MarshalHook {
                    type_name: hook.type_name(),
                    source,
                })?;
                self.write_str(&markup)
            }
            Value::Text(hook) => {
                let text = hook.call().map_err(|source| EncodeError::MarshalHook {
                    type_name: hook.type_name(),
                    source,
                })?;
                self.write_string_literal(&text)
            }
        }
    }

    // -------------------------------------------------------------------------
    // Scalars
    // -------------------------------------------------------------------------

    fn encode_int(&mut self, i: i64) -> Result<(), EncodeError> {
        match i {
            // 9223372036854775808 is not an integer literal
            i64::MIN => self.write_wrapped("-9223372036854775807 - 1"),
            i if i < 0 => self.write_wrapped(&i.to_string()),
            i => self.write_str(&i.to_string()),
        }
    }

    fn encode_float(&mut self, f: f64) -> Result<(), EncodeError> {
        if f.is_nan() {
            self.write_str("float.nan")
        } else if f.is_infinite() {
            if f.is_sign_negative() {
                self.write_wrapped("-float.inf")
            } else {
                self.write_str("float.inf")
            }
        } else if f.is_sign_negative() {
            self.write_wrapped(&format_float(f))
        } else {
            self.write_str(&format_float(f))
        }
    }

    // -------------------------------------------------------------------------
    // Sequences
    // -------------------------------------------------------------------------

    fn encode_bytes(&mut self, bytes: &[u8]) -> Result<(), EncodeError> {
        self.write_str("bytes(")?;
        self.write_str(&format_sequence(bytes.iter().map(u8::to_string)))?;
        self.write_str(")")
    }

    fn encode_array(&mut self, items: &[Value]) -> Result<(), EncodeError> {
        self.write_str("(")?;
        let len = items.len();
        for (index, item) in items.iter().enumerate() {
            if index > 0 {
                self.write_str(", ")?;
            }
            self.marshal(item)
                .map_err(|e| e.within(PathSegment::Index { index, len }))?;
        }
        if len == 1 {
            self.write_str(",")?;
        }
        self.write_str(")")
    }

    // -------------------------------------------------------------------------
    // Blocks
    // -------------------------------------------------------------------------

    fn encode_map(&mut self, pairs: &[(Value, Value)]) -> Result<(), EncodeError> {
        if pairs.is_empty() {
            return self.write_str("()");
        }

        let mut entries = pairs
            .iter()
            .enumerate()
            .map(|(index, (key, value))| {
                let key = resolve_key(key).map_err(|e| e.within(PathSegment::MapKey { index }))?;
                Ok((key, value))
            })
            .collect::<Result<Vec<_>, EncodeError>>()?;
        entries.sort_by(|a, b| a.0.cmp(&b.0));

        if let Some(pair) = entries.windows(2).find(|pair| pair[0].0 == pair[1].0) {
            return Err(EncodeError::DuplicateKey(pair[0].0.clone()));
        }

        self.write_block(|enc| {
            for (key, value) in &entries {
                enc.write_entry(key, value, || PathSegment::Key(key.clone()))?;
            }
            Ok(())
        })
    }

    fn encode_record(&mut self, record: &Record) -> Result<(), EncodeError> {
        if record.visible().next().is_none() {
            return self.write_str("()");
        }

        self.write_block(|enc| {
            for (key, field) in record.visible() {
                enc.write_entry(key, &field.value, || PathSegment::Field(field.name.clone()))?;
            }
            Ok(())
        })
    }

    /// Write `(\n <body> )` with the body one level deeper.
    fn write_block<F>(&mut self, body: F) -> Result<(), EncodeError>
    where
        F: FnOnce(&mut Self) -> Result<(), EncodeError>,
    {
        self.write_str("(\n")?;
        self.indent_level += 1;
        let result = body(self);
        self.indent_level -= 1;
        result?;
        self.write_indent()?;
        self.write_str(")")
    }

    /// Write one `"key": value,` line.
    fn write_entry<F>(&mut self, key: &str, value: &Value, segment: F) -> Result<(), EncodeError>
    where
        F: FnOnce() -> PathSegment,
    {
        self.write_indent()?;
        self.write_string_literal(key)?;
        self.write_str(": ")?;
        self.marshal(value).map_err(|e| e.within(segment()))?;
        self.write_str(",\n")
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Resolve a map key to the string it is written under.
fn resolve_key(key: &Value) -> Result<String, EncodeError> {
    match key {
        Value::Str(s) => Ok(s.clone()),
        Value::Text(hook) => hook.call().map_err(|source| EncodeError::MarshalHook {
            type_name: hook.type_name(),
            source,
        }),
        Value::Int(i) => Ok(i.to_string()),
        Value::UInt(u) => Ok(u.to_string()),
        other => Err(EncodeError::InvalidMapKeyType(other.kind())),
    }
}

/// Shortest round-trip scientific notation with a signed two-digit exponent.
///
/// `1.0` → `1e+00`, `-0.00015` → `-1.5e-04`, `1e100` → `1e+100`.
fn format_float(f: f64) -> String {
    let formatted = format!("{f:e}");
    let (mantissa, exponent) = formatted.split_once('e').unwrap_or((&formatted, "0"));
    let (sign, digits) = match exponent.strip_prefix('-') {
        Some(digits) => ('-', digits),
        None => ('+', exponent),
    };
    format!("{mantissa}e{sign}{digits:0>2}")
}

/// Format items as a Typst array literal.
///
/// Handles edge cases:
/// - Empty: `()`
/// - Single: `(item,)` (trailing comma required)
/// - Multiple: `(a, b, c)`
fn format_sequence<I>(items: I) -> String
where
    I: IntoIterator<Item = String>,
{
    let items: Vec<_> = items.into_iter().collect();
    match items.len() {
        0 => "()".to_string(),
        1 => format!("({},)", items[0]),
        _ => format!("({})", items.join(", ")),
    }
}

fn format_datetime(dt: &NaiveDateTime) -> String {
    format!(
        "datetime(year: {}, month: {}, day: {}, hour: {}, minute: {}, second: {})",
        dt.year(),
        dt.month(),
        dt.day(),
        dt.hour(),
        dt.minute(),
        dt.second(),
    )
}

fn format_date(date: &NaiveDate) -> String {
    format!(
        "datetime(year: {}, month: {}, day: {})",
        date.year(),
        date.month(),
        date.day(),
    )
}

fn format_time(time: &NaiveTime) -> String {
    format!(
        "datetime(hour: {}, minute: {}, second: {})",
        time.hour(),
        time.minute(),
        time.second(),
    )
}
