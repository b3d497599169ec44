//! Dynamically-typed host values and their conversion from Rust types.
//!
//! [`Value`] is the closed set of kinds the encoder understands. Rust types
//! reach it through [`ToValue`], or through serde with
//! [`to_value`](super::to_value).

use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, TimeZone};
use serde_json::Value as JsonValue;

use super::marshal::{Hook, TextMarshaler, ValueMarshaler};

/// Annotation value that omits a record field from the output.
pub const OMIT: &str = "-";

/// A host value, ready to be encoded as a Typst literal.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absent value, encoded as `none`.
    None,
    /// `true` or `false`.
    Bool(bool),
    /// Signed integer.
    Int(i64),
    /// Unsigned integer.
    UInt(u64),
    /// Floating point number.
    Float(f64),
    /// UTF-8 string.
    Str(String),
    /// Byte sequence, encoded as a `bytes(..)` call.
    Bytes(Vec<u8>),
    /// Sequence or fixed-size sequence.
    Array(Vec<Value>),
    /// Key/value pairs. Keys are resolved to strings at encode time.
    Map(Vec<(Value, Value)>),
    /// Named fields in declaration order.
    Record(Record),
    /// Calendar date and wall-clock time.
    DateTime(NaiveDateTime),
    /// Calendar date.
    Date(NaiveDate),
    /// Wall-clock time.
    Time(NaiveTime),
    /// Signed duration in whole seconds.
    Duration {
        /// Number of seconds.
        seconds: i64,
    },
    /// Custom markup from a [`ValueMarshaler`].
    Literal(Hook<dyn ValueMarshaler>),
    /// Custom text from a [`TextMarshaler`].
    Text(Hook<dyn TextMarshaler>),
}

impl Value {
    /// Wrap a [`ValueMarshaler`].
    pub fn literal<M: ValueMarshaler + 'static>(marshaler: M) -> Self {
        Self::Literal(Hook::<dyn ValueMarshaler>::literal(marshaler))
    }

    /// Wrap a [`TextMarshaler`].
    pub fn text<M: TextMarshaler + 'static>(marshaler: M) -> Self {
        Self::Text(Hook::<dyn TextMarshaler>::text(marshaler))
    }

    /// Build a map value from key/value pairs.
    pub fn map<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: ToValue,
        V: ToValue,
    {
        Self::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.to_value(), v.to_value()))
                .collect(),
        )
    }

    /// Name of the value's kind, as used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::UInt(_) => "uint",
            Self::Float(_) => "float",
            Self::Str(_) => "string",
            Self::Bytes(_) => "bytes",
            Self::Array(_) => "array",
            Self::Map(_) => "map",
            Self::Record(_) => "record",
            Self::DateTime(_) | Self::Date(_) | Self::Time(_) => "datetime",
            Self::Duration { .. } => "duration",
            Self::Literal(_) => "literal",
            Self::Text(_) => "text",
        }
    }
}

impl ToValue for Record {
    fn to_value(&self) -> Value {
        Value::Record(self.clone())
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        Self::Record(record)
    }
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// A record field.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// Declared field name.
    pub name: String,
    /// Name annotation. [`OMIT`] drops the field, an empty string is ignored.
    pub tag: Option<String>,
    /// Whether the field is externally visible. Hidden fields are skipped.
    pub exported: bool,
    /// Field value.
    pub value: Value,
}

impl Field {
    /// An exported field without annotation.
    pub fn new(name: impl Into<String>, value: impl ToValue) -> Self {
        Self {
            name: name.into(),
            tag: None,
            exported: true,
            value: value.to_value(),
        }
    }

    /// The key this field is written under, or `None` if it is skipped.
    pub fn key(&self) -> Option<&str> {
        if !self.exported {
            return None;
        }
        match self.tag.as_deref() {
            Some(OMIT) => None,
            Some(tag) if !tag.is_empty() => Some(tag),
            _ => Some(&self.name),
        }
    }
}

/// Named fields in declaration order.
///
/// # Example
///
/// ```ignore
/// use typst_bridge::codegen::{Record, ToValue, Value, OMIT};
///
/// impl ToValue for Entry {
///     fn to_value(&self) -> Value {
///         Record::new()
///             .field("Name", &self.name)
///             .tagged("Created", "created", &self.created)
///             .tagged("Secret", OMIT, &self.secret)
///             .into()
///     }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<Field>,
}

impl Record {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an exported field.
    pub fn field(self, name: impl Into<String>, value: impl ToValue) -> Self {
        self.push(Field::new(name, value))
    }

    /// Add an exported field with a name annotation.
    pub fn tagged(
        self,
        name: impl Into<String>,
        tag: impl Into<String>,
        value: impl ToValue,
    ) -> Self {
        self.push(Field {
            tag: Some(tag.into()),
            ..Field::new(name, value)
        })
    }

    /// Add a field that is not externally visible.
    pub fn hidden(self, name: impl Into<String>, value: impl ToValue) -> Self {
        self.push(Field {
            exported: false,
            ..Field::new(name, value)
        })
    }

    /// Append a field.
    pub fn push(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// All fields, including skipped ones.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Fields that will be written, with their keys.
    pub fn visible(&self) -> impl Iterator<Item = (&str, &Field)> {
        self.fields
            .iter()
            .filter_map(|field| field.key().map(|key| (key, field)))
    }
}

// ---------------------------------------------------------------------------
// ToValue
// ---------------------------------------------------------------------------

/// Convert a Rust value into a [`Value`].
///
/// # Example
///
/// ```ignore
/// use typst_bridge::codegen::{ToValue, Value};
///
/// assert_eq!(42i64.to_value(), Value::Int(42));
/// assert_eq!(None::<&str>.to_value(), Value::None);
/// assert_eq!(vec![1u8, 2].to_value(), Value::Bytes(vec![1, 2]));
/// ```
pub trait ToValue {
    /// Convert to a [`Value`].
    fn to_value(&self) -> Value;

    /// Convert a slice of `Self`. Byte slices override this to become `bytes`.
    #[doc(hidden)]
    fn slice_to_value(items: &[Self]) -> Value
    where
        Self: Sized,
    {
        Value::Array(items.iter().map(ToValue::to_value).collect())
    }
}

impl ToValue for Value {
    fn to_value(&self) -> Value {
        self.clone()
    }
}

impl ToValue for bool {
    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }
}

macro_rules! signed_to_value {
    ($($ty:ty),*) => {$(
        impl ToValue for $ty {
            fn to_value(&self) -> Value {
                Value::Int(i64::from(*self))
            }
        }
    )*};
}

macro_rules! unsigned_to_value {
    ($($ty:ty),*) => {$(
        impl ToValue for $ty {
            fn to_value(&self) -> Value {
                Value::UInt(u64::from(*self))
            }
        }
    )*};
}

signed_to_value!(i8, i16, i32, i64);
unsigned_to_value!(u16, u32, u64);

impl ToValue for u8 {
    fn to_value(&self) -> Value {
        Value::UInt(u64::from(*self))
    }

    fn slice_to_value(items: &[Self]) -> Value {
        Value::Bytes(items.to_vec())
    }
}

impl ToValue for isize {
    fn to_value(&self) -> Value {
        // isize is at most 64 bits on every supported target
        Value::Int(*self as i64)
    }
}

impl ToValue for usize {
    fn to_value(&self) -> Value {
        Value::UInt(*self as u64)
    }
}

impl ToValue for f32 {
    fn to_value(&self) -> Value {
        Value::Float(f64::from(*self))
    }
}

impl ToValue for f64 {
    fn to_value(&self) -> Value {
        Value::Float(*self)
    }
}

impl ToValue for char {
    fn to_value(&self) -> Value {
        Value::Str(self.to_string())
    }
}

impl ToValue for str {
    fn to_value(&self) -> Value {
        Value::Str(self.to_owned())
    }
}

impl ToValue for String {
    fn to_value(&self) -> Value {
        Value::Str(self.clone())
    }
}

impl ToValue for () {
    fn to_value(&self) -> Value {
        Value::None
    }
}

impl<T: ToValue + ?Sized> ToValue for &T {
    fn to_value(&self) -> Value {
        (**self).to_value()
    }
}

impl<T: ToValue + ?Sized> ToValue for Box<T> {
    fn to_value(&self) -> Value {
        (**self).to_value()
    }
}

impl<T: ToValue + ?Sized> ToValue for Rc<T> {
    fn to_value(&self) -> Value {
        (**self).to_value()
    }
}

impl<T: ToValue + ?Sized> ToValue for Arc<T> {
    fn to_value(&self) -> Value {
        (**self).to_value()
    }
}

impl<T: ToValue> ToValue for Option<T> {
    fn to_value(&self) -> Value {
        match self {
            Some(v) => v.to_value(),
            None => Value::None,
        }
    }
}

impl<T: ToValue> ToValue for [T] {
    fn to_value(&self) -> Value {
        T::slice_to_value(self)
    }
}

impl<T: ToValue> ToValue for Vec<T> {
    fn to_value(&self) -> Value {
        T::slice_to_value(self)
    }
}

impl<T: ToValue, const N: usize> ToValue for [T; N] {
    fn to_value(&self) -> Value {
        Value::Array(self.iter().map(ToValue::to_value).collect())
    }
}

macro_rules! tuple_to_value {
    ($($name:ident),+) => {
        impl<$($name: ToValue),+> ToValue for ($($name,)+) {
            #[allow(non_snake_case)]
            fn to_value(&self) -> Value {
                let ($($name,)+) = self;
                Value::Array(vec![$($name.to_value()),+])
            }
        }
    };
}

tuple_to_value!(A);
tuple_to_value!(A, B);
tuple_to_value!(A, B, C);
tuple_to_value!(A, B, C, D);
tuple_to_value!(A, B, C, D, E);
tuple_to_value!(A, B, C, D, E, F);

impl<K: ToValue, V: ToValue, S> ToValue for HashMap<K, V, S> {
    fn to_value(&self) -> Value {
        Value::map(self.iter())
    }
}

impl<K: ToValue, V: ToValue> ToValue for BTreeMap<K, V> {
    fn to_value(&self) -> Value {
        Value::map(self.iter())
    }
}

// ---------------------------------------------------------------------------
// Date and time
// ---------------------------------------------------------------------------

impl ToValue for NaiveDateTime {
    fn to_value(&self) -> Value {
        Value::DateTime(*self)
    }
}

impl ToValue for NaiveDate {
    fn to_value(&self) -> Value {
        Value::Date(*self)
    }
}

impl ToValue for NaiveTime {
    fn to_value(&self) -> Value {
        Value::Time(*self)
    }
}

/// Uses the wall-clock fields of the value's own time zone.
impl<Tz: TimeZone> ToValue for DateTime<Tz> {
    fn to_value(&self) -> Value {
        Value::DateTime(self.naive_local())
    }
}

impl ToValue for TimeDelta {
    fn to_value(&self) -> Value {
        let seconds = (self.num_milliseconds() as f64 / 1000.0).round() as i64;
        Value::Duration { seconds }
    }
}

impl ToValue for std::time::Duration {
    fn to_value(&self) -> Value {
        Value::Duration {
            seconds: self.as_secs_f64().round() as i64,
        }
    }
}

// ---------------------------------------------------------------------------
// JSON
// ---------------------------------------------------------------------------

impl ToValue for JsonValue {
    fn to_value(&self) -> Value {
        match self {
            JsonValue::Null => Value::None,
            JsonValue::Bool(b) => Value::Bool(*b),
            JsonValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else if let Some(u) = n.as_u64() {
                    Value::UInt(u)
                } else {
                    Value::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            JsonValue::String(s) => Value::Str(s.clone()),
            JsonValue::Array(arr) => Value::Array(arr.iter().map(ToValue::to_value).collect()),
            JsonValue::Object(obj) => Value::map(obj.iter()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_primitives() {
        assert_eq!(true.to_value(), Value::Bool(true));
        assert_eq!((-5i8).to_value(), Value::Int(-5));
        assert_eq!(7u32.to_value(), Value::UInt(7));
        assert_eq!(1.5f32.to_value(), Value::Float(1.5));
        assert_eq!('x'.to_value(), Value::Str("x".into()));
        assert_eq!("hi".to_value(), Value::Str("hi".into()));
    }

    #[test]
    fn test_option_and_references() {
        assert_eq!(None::<i64>.to_value(), Value::None);
        assert_eq!(Some(3i64).to_value(), Value::Int(3));
        assert_eq!(Box::new(Some("a")).to_value(), Value::Str("a".into()));
        assert_eq!(Arc::new(2u64).to_value(), Value::UInt(2));
    }

    #[test]
    fn test_byte_slices_become_bytes() {
        assert_eq!(vec![1u8, 2, 3].to_value(), Value::Bytes(vec![1, 2, 3]));
        assert_eq!(b"ab"[..].to_value(), Value::Bytes(vec![b'a', b'b']));
    }

    #[test]
    fn test_byte_arrays_stay_sequences() {
        assert_eq!(
            [1u8, 2].to_value(),
            Value::Array(vec![Value::UInt(1), Value::UInt(2)])
        );
    }

    #[test]
    fn test_tuple_is_fixed_sequence() {
        assert_eq!(
            (1i32, "a").to_value(),
            Value::Array(vec![Value::Int(1), Value::Str("a".into())])
        );
    }

    #[test]
    fn test_record_visibility() {
        let record = Record::new()
            .field("Foo", "x")
            .tagged("Bar", "bar", 1i64)
            .tagged("Baz", OMIT, 2i64)
            .tagged("Qux", "", 3i64)
            .hidden("secret", 4i64);

        let keys: Vec<_> = record.visible().map(|(key, _)| key).collect();
        assert_eq!(keys, vec!["Foo", "bar", "Qux"]);
        assert_eq!(record.fields().len(), 5);
    }

    #[test]
    fn test_durations_round_to_seconds() {
        assert_eq!(TimeDelta::seconds(60).to_value(), Value::Duration { seconds: 60 });
        assert_eq!(
            TimeDelta::milliseconds(-1500).to_value(),
            Value::Duration { seconds: -2 }
        );
        assert_eq!(
            std::time::Duration::from_millis(2499).to_value(),
            Value::Duration { seconds: 2 }
        );
    }

    #[test]
    fn test_datetime_uses_local_fields() {
        use chrono::FixedOffset;

        let offset = FixedOffset::east_opt(3600).unwrap();
        let dt = offset.with_ymd_and_hms(2024, 12, 14, 12, 34, 56).unwrap();
        let Value::DateTime(naive) = dt.to_value() else {
            panic!("expected datetime");
        };
        assert_eq!(naive.to_string(), "2024-12-14 12:34:56");
    }

    #[test]
    fn test_json_conversion() {
        let value = json!({"a": [1, -2, 1.5, null, true], "b": "x"});
        let Value::Map(pairs) = value.to_value() else {
            panic!("expected map");
        };
        assert_eq!(pairs.len(), 2);
        let (_, a) = pairs
            .iter()
            .find(|(k, _)| *k == Value::Str("a".into()))
            .unwrap();
        assert_eq!(
            *a,
            Value::Array(vec![
                Value::Int(1),
                Value::Int(-2),
                Value::Float(1.5),
                Value::None,
                Value::Bool(true),
            ])
        );
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(Value::Float(1.0).kind(), "float");
        assert_eq!(Value::Record(Record::new()).kind(), "record");
        assert_eq!(Value::Duration { seconds: 1 }.kind(), "duration");
    }
}
