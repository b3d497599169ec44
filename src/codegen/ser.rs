//! Serde → [`Value`] conversion.
//!
//! Lets any `Serialize` type be encoded without a hand-written
//! [`ToValue`](super::ToValue) impl:
//!
//! - structs become records; `#[serde(rename = "..")]` renames a field and
//!   `#[serde(skip)]` omits it
//! - `Option::None`, `()` and unit structs become `none`
//! - unit variants become their name as a string, other variants a
//!   single-entry map `{variant: payload}`
//! - `serialize_bytes` (e.g. via [`forms::bytes`]) becomes `bytes(..)`
//!
//! Types without a serde-visible special form (dates, durations) can opt in
//! field by field with the [`forms`] helpers.

use serde::ser::{self, Serialize};

use super::error::{EncodeError, PathSegment};
use super::marshal::{LITERAL_TOKEN, Literal};
use super::value::{Field, Record, Value};

/// Convert any `Serialize` type into a [`Value`].
///
/// # Example
///
/// ```ignore
/// #[derive(Serialize)]
/// struct Post {
///     title: String,
///     #[serde(rename = "tag-list")]
///     tags: Vec<String>,
///     #[serde(skip)]
///     draft: bool,
/// }
///
/// let value = typst_bridge::codegen::to_value(&post)?;
/// ```
pub fn to_value<T: Serialize + ?Sized>(value: &T) -> Result<Value, EncodeError> {
    value.serialize(ValueSerializer)
}

/// Serializer whose output is a [`Value`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ValueSerializer;

fn int_128<T: TryInto<i64>>(v: T, kind: &str) -> Result<Value, EncodeError> {
    v.try_into()
        .map(Value::Int)
        .map_err(|_| EncodeError::UnsupportedType(kind.to_string()))
}

/// Name a serialized map key for error paths.
fn key_label(key: &Value) -> String {
    match key {
        Value::Str(s) => s.clone(),
        Value::Int(n) => n.to_string(),
        Value::UInt(n) => n.to_string(),
        other => other.kind().to_string(),
    }
}

impl ser::Serializer for ValueSerializer {
    type Ok = Value;
    type Error = EncodeError;

    type SerializeSeq = SerializeArray;
    type SerializeTuple = SerializeArray;
    type SerializeTupleStruct = SerializeArray;
    type SerializeTupleVariant = SerializeTupleVariant;
    type SerializeMap = SerializeMap;
    type SerializeStruct = SerializeRecord;
    type SerializeStructVariant = SerializeStructVariant;

    fn serialize_bool(self, v: bool) -> Result<Value, EncodeError> {
        Ok(Value::Bool(v))
    }

    fn serialize_i8(self, v: i8) -> Result<Value, EncodeError> {
        Ok(Value::Int(v.into()))
    }

    fn serialize_i16(self, v: i16) -> Result<Value, EncodeError> {
        Ok(Value::Int(v.into()))
    }

    fn serialize_i32(self, v: i32) -> Result<Value, EncodeError> {
        Ok(Value::Int(v.into()))
    }

    fn serialize_i64(self, v: i64) -> Result<Value, EncodeError> {
        Ok(Value::Int(v))
    }

    fn serialize_i128(self, v: i128) -> Result<Value, EncodeError> {
        int_128(v, "i128")
    }

    fn serialize_u8(self, v: u8) -> Result<Value, EncodeError> {
        Ok(Value::UInt(v.into()))
    }

    fn serialize_u16(self, v: u16) -> Result<Value, EncodeError> {
        Ok(Value::UInt(v.into()))
    }

    fn serialize_u32(self, v: u32) -> Result<Value, EncodeError> {
        Ok(Value::UInt(v.into()))
    }

    fn serialize_u64(self, v: u64) -> Result<Value, EncodeError> {
        Ok(Value::UInt(v))
    }

    fn serialize_u128(self, v: u128) -> Result<Value, EncodeError> {
        u64::try_from(v)
            .map(Value::UInt)
            .map_err(|_| EncodeError::UnsupportedType("u128".into()))
    }

    fn serialize_f32(self, v: f32) -> Result<Value, EncodeError> {
        Ok(Value::Float(v.into()))
    }

    fn serialize_f64(self, v: f64) -> Result<Value, EncodeError> {
        Ok(Value::Float(v))
    }

    fn serialize_char(self, v: char) -> Result<Value, EncodeError> {
        Ok(Value::Str(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> Result<Value, EncodeError> {
        Ok(Value::Str(v.to_owned()))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<Value, EncodeError> {
        Ok(Value::Bytes(v.to_vec()))
    }

    fn serialize_none(self) -> Result<Value, EncodeError> {
        Ok(Value::None)
    }

    fn serialize_some<T: Serialize + ?Sized>(self, value: &T) -> Result<Value, EncodeError> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<Value, EncodeError> {
        Ok(Value::None)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<Value, EncodeError> {
        Ok(Value::None)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<Value, EncodeError> {
        Ok(Value::Str(variant.to_owned()))
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        name: &'static str,
        value: &T,
    ) -> Result<Value, EncodeError> {
        if name == LITERAL_TOKEN {
            return match value.serialize(self)? {
                Value::Str(markup) => Ok(Value::literal(Literal(markup))),
                other => Err(EncodeError::Custom(format!(
                    "expected literal markup string, got {}",
                    other.kind()
                ))),
            };
        }
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<Value, EncodeError> {
        let inner = value
            .serialize(self)
            .map_err(|e| e.within(PathSegment::Key(variant.to_owned())))?;
        Ok(Value::Map(vec![(Value::Str(variant.to_owned()), inner)]))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<SerializeArray, EncodeError> {
        let len = len.unwrap_or(0);
        Ok(SerializeArray {
            items: Vec::with_capacity(len),
            len,
        })
    }

    fn serialize_tuple(self, len: usize) -> Result<SerializeArray, EncodeError> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> Result<SerializeArray, EncodeError> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<SerializeTupleVariant, EncodeError> {
        Ok(SerializeTupleVariant {
            variant,
            items: Vec::with_capacity(len),
            len,
        })
    }

    fn serialize_map(self, len: Option<usize>) -> Result<SerializeMap, EncodeError> {
        Ok(SerializeMap {
            pairs: Vec::with_capacity(len.unwrap_or(0)),
            pending_key: None,
        })
    }

    fn serialize_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<SerializeRecord, EncodeError> {
        Ok(SerializeRecord {
            record: Record::new(),
        })
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<SerializeStructVariant, EncodeError> {
        Ok(SerializeStructVariant {
            variant,
            record: Record::new(),
        })
    }
}

// =============================================================================
// Compound serializers
// =============================================================================

/// Collects sequence, tuple and tuple struct elements.
#[doc(hidden)]
pub struct SerializeArray {
    items: Vec<Value>,
    len: usize,
}

/// Path segment for the next element of a sequence with a length hint.
fn next_index(items: &[Value], len: usize) -> PathSegment {
    let index = items.len();
    PathSegment::Index {
        index,
        len: len.max(index + 1),
    }
}

impl ser::SerializeSeq for SerializeArray {
    type Ok = Value;
    type Error = EncodeError;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), EncodeError> {
        let item = to_value(value).map_err(|e| e.within(next_index(&self.items, self.len)))?;
        self.items.push(item);
        Ok(())
    }

    fn end(self) -> Result<Value, EncodeError> {
        Ok(Value::Array(self.items))
    }
}

impl ser::SerializeTuple for SerializeArray {
    type Ok = Value;
    type Error = EncodeError;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), EncodeError> {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<Value, EncodeError> {
        ser::SerializeSeq::end(self)
    }
}

impl ser::SerializeTupleStruct for SerializeArray {
    type Ok = Value;
    type Error = EncodeError;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), EncodeError> {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<Value, EncodeError> {
        ser::SerializeSeq::end(self)
    }
}

/// Collects tuple variant elements.
#[doc(hidden)]
pub struct SerializeTupleVariant {
    variant: &'static str,
    items: Vec<Value>,
    len: usize,
}

impl ser::SerializeTupleVariant for SerializeTupleVariant {
    type Ok = Value;
    type Error = EncodeError;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), EncodeError> {
        let item = to_value(value).map_err(|e| {
            e.within(next_index(&self.items, self.len))
                .within(PathSegment::Key(self.variant.to_owned()))
        })?;
        self.items.push(item);
        Ok(())
    }

    fn end(self) -> Result<Value, EncodeError> {
        Ok(Value::Map(vec![(
            Value::Str(self.variant.to_owned()),
            Value::Array(self.items),
        )]))
    }
}

/// Collects map entries. Keys stay values until the encoder resolves them.
#[doc(hidden)]
pub struct SerializeMap {
    pairs: Vec<(Value, Value)>,
    pending_key: Option<Value>,
}

impl ser::SerializeMap for SerializeMap {
    type Ok = Value;
    type Error = EncodeError;

    fn serialize_key<T: Serialize + ?Sized>(&mut self, key: &T) -> Result<(), EncodeError> {
        let index = self.pairs.len();
        let key = to_value(key).map_err(|e| e.within(PathSegment::MapKey { index }))?;
        self.pending_key = Some(key);
        Ok(())
    }

    fn serialize_value<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), EncodeError> {
        let key = self
            .pending_key
            .take()
            .ok_or_else(|| EncodeError::Custom("map value serialized before its key".into()))?;
        let value = to_value(value).map_err(|e| e.within(PathSegment::Key(key_label(&key))))?;
        self.pairs.push((key, value));
        Ok(())
    }

    fn end(self) -> Result<Value, EncodeError> {
        Ok(Value::Map(self.pairs))
    }
}

/// Collects struct fields in declaration order.
#[doc(hidden)]
pub struct SerializeRecord {
    record: Record,
}

impl ser::SerializeStruct for SerializeRecord {
    type Ok = Value;
    type Error = EncodeError;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), EncodeError> {
        let value = to_value(value).map_err(|e| e.within(PathSegment::Field(key.to_owned())))?;
        let record = std::mem::take(&mut self.record);
        self.record = record.push(Field::new(key, value));
        Ok(())
    }

    fn end(self) -> Result<Value, EncodeError> {
        Ok(Value::Record(self.record))
    }
}

/// Collects struct variant fields.
#[doc(hidden)]
pub struct SerializeStructVariant {
    variant: &'static str,
    record: Record,
}

impl ser::SerializeStructVariant for SerializeStructVariant {
    type Ok = Value;
    type Error = EncodeError;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), EncodeError> {
        let value = to_value(value).map_err(|e| {
            e.within(PathSegment::Field(key.to_owned()))
                .within(PathSegment::Key(self.variant.to_owned()))
        })?;
        let record = std::mem::take(&mut self.record);
        self.record = record.push(Field::new(key, value));
        Ok(())
    }

    fn end(self) -> Result<Value, EncodeError> {
        Ok(Value::Map(vec![(
            Value::Str(self.variant.to_owned()),
            Value::Record(self.record),
        )]))
    }
}

// =============================================================================
// Field helpers
// =============================================================================

/// `#[serde(serialize_with = "..")]` helpers that emit Typst constructor forms.
///
/// Other serializers see the rendered markup as a plain string.
///
/// ```ignore
/// #[derive(Serialize)]
/// struct Entry {
///     #[serde(serialize_with = "typst_bridge::codegen::forms::datetime")]
///     created: chrono::NaiveDateTime,
///     #[serde(serialize_with = "typst_bridge::codegen::forms::bytes")]
///     checksum: Vec<u8>,
/// }
/// ```
pub mod forms {
    use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
    use serde::{Serialize, Serializer};

    use crate::codegen::encoder::marshal;
    use crate::codegen::marshal::Literal;
    use crate::codegen::value::ToValue;

    fn literal<S: Serializer>(value: &impl ToValue, serializer: S) -> Result<S::Ok, S::Error> {
        let markup = marshal(value).map_err(<S::Error as serde::ser::Error>::custom)?;
        Literal(markup).serialize(serializer)
    }

    /// Emit `datetime(year: .., month: .., day: .., hour: .., minute: .., second: ..)`.
    pub fn datetime<S: Serializer>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        literal(value, serializer)
    }

    /// Emit `datetime(year: .., month: .., day: ..)`.
    pub fn date<S: Serializer>(value: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        literal(value, serializer)
    }

    /// Emit `datetime(hour: .., minute: .., second: ..)`.
    pub fn time<S: Serializer>(value: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        literal(value, serializer)
    }

    /// Emit `duration(seconds: ..)`, rounded to whole seconds.
    pub fn duration<S: Serializer>(value: &TimeDelta, serializer: S) -> Result<S::Ok, S::Error> {
        literal(value, serializer)
    }

    /// Emit `bytes((..))` instead of an integer sequence.
    pub fn bytes<T, S>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: AsRef<[u8]> + ?Sized,
        S: Serializer,
    {
        serializer.serialize_bytes(value.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
    use serde::Serialize;

    use super::*;
    use crate::codegen::encoder::marshal_serialize;

    #[derive(Serialize)]
    struct Size {
        x: f64,
        y: f64,
    }

    #[derive(Serialize)]
    struct Entry {
        #[serde(rename = "name")]
        title: String,
        size: Size,
        numbers: Vec<i32>,
        #[serde(skip)]
        #[allow(dead_code)]
        internal: u32,
        #[serde(serialize_with = "forms::datetime")]
        created: NaiveDateTime,
    }

    #[derive(Serialize)]
    enum Shape {
        Empty,
        Circle(f64),
        Line(i32, i32),
        Rect { w: u8, h: u8 },
    }

    #[test]
    fn test_struct_becomes_record() {
        let entry = Entry {
            title: "Bell".into(),
            size: Size { x: 80.0, y: 40.0 },
            numbers: vec![1, -2],
            internal: 7,
            created: NaiveDate::from_ymd_opt(2010, 12, 1)
                .unwrap()
                .and_hms_opt(12, 13, 14)
                .unwrap(),
        };
        assert_eq!(
            marshal_serialize(&entry).unwrap(),
            "(\n  \"name\": \"Bell\",\n  \"size\": (\n    \"x\": 8e+01,\n    \"y\": 4e+01,\n  ),\n  \"numbers\": (1, {-2}),\n  \"created\": datetime(year: 2010, month: 12, day: 1, hour: 12, minute: 13, second: 14),\n)"
        );
    }

    #[test]
    fn test_skipped_field_is_absent() {
        let Value::Record(record) = to_value(&Entry {
            title: String::new(),
            size: Size { x: 0.0, y: 0.0 },
            numbers: vec![],
            internal: 1,
            created: NaiveDate::from_ymd_opt(2000, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
        })
        .unwrap() else {
            panic!("expected record");
        };
        assert!(record.visible().all(|(key, _)| key != "internal"));
    }

    #[test]
    fn test_options_and_units() {
        assert_eq!(to_value(&None::<i32>).unwrap(), Value::None);
        assert_eq!(to_value(&Some(5u8)).unwrap(), Value::UInt(5));
        assert_eq!(to_value(&()).unwrap(), Value::None);
    }

    #[test]
    fn test_enum_variants() {
        assert_eq!(marshal_serialize(&Shape::Empty).unwrap(), r#""Empty""#);
        assert_eq!(
            marshal_serialize(&Shape::Circle(2.0)).unwrap(),
            "(\n  \"Circle\": 2e+00,\n)"
        );
        assert_eq!(
            marshal_serialize(&Shape::Line(1, -1)).unwrap(),
            "(\n  \"Line\": (1, {-1}),\n)"
        );
        assert_eq!(
            marshal_serialize(&Shape::Rect { w: 2, h: 3 }).unwrap(),
            "(\n  \"Rect\": (\n    \"w\": 2,\n    \"h\": 3,\n  ),\n)"
        );
    }

    #[test]
    fn test_maps_sorted() {
        let map = BTreeMap::from([("b", 2), ("a", 1)]);
        assert_eq!(
            marshal_serialize(&map).unwrap(),
            "(\n  \"a\": 1,\n  \"b\": 2,\n)"
        );
    }

    #[test]
    fn test_non_string_map_keys() {
        let map = BTreeMap::from([(3u8, "x")]);
        assert_eq!(marshal_serialize(&map).unwrap(), "(\n  \"3\": \"x\",\n)");

        let map = BTreeMap::from([(true, "x")]);
        let err = marshal_serialize(&map).unwrap_err();
        assert_eq!(err.path(), vec![&PathSegment::MapKey { index: 0 }]);
        assert!(matches!(err.root_cause(), EncodeError::InvalidMapKeyType("bool")));
    }

    #[test]
    fn test_error_path_through_fields_and_elements() {
        #[derive(Serialize)]
        struct Outer {
            numbers: Vec<u128>,
        }

        let err = to_value(&Outer {
            numbers: vec![1, u128::MAX],
        })
        .unwrap_err();
        assert_eq!(
            err.path(),
            vec![
                &PathSegment::Field("numbers".into()),
                &PathSegment::Index { index: 1, len: 2 },
            ]
        );
        assert!(matches!(err.root_cause(), EncodeError::UnsupportedType(kind) if kind == "u128"));
        assert_eq!(
            err.to_string(),
            r#"failed to encode struct field "numbers": failed to encode element 2 of 2: unsupported type "u128""#
        );
    }

    #[test]
    fn test_error_path_through_maps_and_variants() {
        let map = BTreeMap::from([("big", i128::MIN)]);
        let err = to_value(&map).unwrap_err();
        assert_eq!(err.path(), vec![&PathSegment::Key("big".into())]);

        #[derive(Serialize)]
        enum Wide {
            Pair(u8, u128),
            Named { value: i128 },
        }

        let err = to_value(&Wide::Pair(1, u128::MAX)).unwrap_err();
        assert_eq!(
            err.path(),
            vec![
                &PathSegment::Key("Pair".into()),
                &PathSegment::Index { index: 1, len: 2 },
            ]
        );

        let err = to_value(&Wide::Named { value: i128::MAX }).unwrap_err();
        assert_eq!(
            err.path(),
            vec![
                &PathSegment::Key("Named".into()),
                &PathSegment::Field("value".into()),
            ]
        );
    }

    #[test]
    fn test_wide_integers() {
        assert_eq!(to_value(&5i128).unwrap(), Value::Int(5));
        assert_eq!(to_value(&5u128).unwrap(), Value::UInt(5));
        assert!(matches!(
            to_value(&i128::MAX),
            Err(EncodeError::UnsupportedType(kind)) if kind == "i128"
        ));
        assert!(matches!(
            to_value(&u128::MAX),
            Err(EncodeError::UnsupportedType(kind)) if kind == "u128"
        ));
    }

    #[test]
    fn test_literal_survives_serde() {
        #[derive(Serialize)]
        struct Styled {
            color: Literal,
        }

        let styled = Styled {
            color: Literal::new("rgb(\"#ff0000\")"),
        };
        assert_eq!(
            marshal_serialize(&styled).unwrap(),
            "(\n  \"color\": rgb(\"#ff0000\"),\n)"
        );
        // Other serializers see the markup string.
        assert_eq!(
            serde_json::to_string(&styled).unwrap(),
            r##"{"color":"rgb(\"#ff0000\")"}"##
        );
    }

    #[test]
    fn test_field_forms() {
        #[derive(Serialize)]
        struct Forms {
            #[serde(serialize_with = "forms::date")]
            day: NaiveDate,
            #[serde(serialize_with = "forms::duration")]
            timeout: TimeDelta,
            #[serde(serialize_with = "forms::bytes")]
            data: Vec<u8>,
            plain: Vec<u8>,
        }

        let value = Forms {
            day: NaiveDate::from_ymd_opt(2024, 2, 29).unwrap(),
            timeout: TimeDelta::seconds(90),
            data: vec![7],
            plain: vec![7],
        };
        assert_eq!(
            marshal_serialize(&value).unwrap(),
            "(\n  \"day\": datetime(year: 2024, month: 2, day: 29),\n  \"timeout\": duration(seconds: 90),\n  \"data\": bytes((7,)),\n  \"plain\": (7,),\n)"
        );
    }

    #[test]
    fn test_json_value_through_serde() {
        let json = serde_json::json!({"z": [1, 2.5], "a": null});
        assert_eq!(
            marshal_serialize(&json).unwrap(),
            "(\n  \"a\": none,\n  \"z\": (1, 2.5e+00),\n)"
        );
    }
}
