//! Dynamic value tree and the traits binding Rust types to it
//!
//! Typed objects are lowered to a [`Value`] tree before encoding and lifted
//! back after decoding. [`Encodable`] covers primitives, `Vec<T>` and
//! `[T; N]`; fieldless enums get it from [`impl_enum!`](crate::impl_enum);
//! composite types implement [`Schematic`] on top of it.

use crate::error::{CodecError, CodecResult};
use crate::schema::{FieldType, Primitive, Schema};

/// Value of a primitive, sequence or composite field
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    U8(u8),
    I8(i8),
    U16(u16),
    I16(i16),
    U32(u32),
    I32(i32),
    U64(u64),
    I64(i64),
    F32(f32),
    F64(f64),
    Char(char),
    Seq(Vec<Value>),
    Record(Record),
}

impl Value {
    /// Integer value, if this is an integer primitive that fits in `i64`
    pub fn as_integer(&self) -> Option<i64> {
        match *self {
            Value::U8(v) => Some(i64::from(v)),
            Value::I8(v) => Some(i64::from(v)),
            Value::U16(v) => Some(i64::from(v)),
            Value::I16(v) => Some(i64::from(v)),
            Value::U32(v) => Some(i64::from(v)),
            Value::I32(v) => Some(i64::from(v)),
            Value::U64(v) => i64::try_from(v).ok(),
            Value::I64(v) => Some(v),
            _ => None,
        }
    }

    /// Wire type of a primitive value
    pub fn primitive(&self) -> Option<Primitive> {
        Some(match self {
            Value::Bool(_) => Primitive::Bool,
            Value::U8(_) => Primitive::U8,
            Value::I8(_) => Primitive::I8,
            Value::U16(_) => Primitive::U16,
            Value::I16(_) => Primitive::I16,
            Value::U32(_) => Primitive::U32,
            Value::I32(_) => Primitive::I32,
            Value::U64(_) => Primitive::U64,
            Value::I64(_) => Primitive::I64,
            Value::F32(_) => Primitive::F32,
            Value::F64(_) => Primitive::F64,
            Value::Char(_) => Primitive::Char,
            Value::Seq(_) | Value::Record(_) => return None,
        })
    }

    /// Name of the primitive or composite type held, for error messages
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Seq(_) => "sequence",
            Value::Record(record) => record.type_name,
            other => other.primitive().map_or("unknown", Primitive::type_name),
        }
    }
}

/// Field values of one composite object, in declaration order
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub type_name: &'static str,
    pub fields: Vec<(&'static str, Value)>,
}

impl Record {
    /// Empty record for `type_name`
    pub fn new(type_name: &'static str) -> Self {
        Self {
            type_name,
            fields: Vec::new(),
        }
    }

    /// Append a field value
    pub fn with(mut self, name: &'static str, value: impl Into<Value>) -> Self {
        self.fields.push((name, value.into()));
        self
    }

    /// Append a typed field value
    pub fn with_field<T: Encodable>(self, name: &'static str, value: &T) -> Self {
        self.with(name, value.to_value())
    }

    /// Value of a field, without removing it
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(n, _)| *n == name).map(|(_, v)| v)
    }

    /// Remove a field and convert it to `T`
    pub fn take<T: Encodable>(&mut self, name: &'static str) -> CodecResult<T> {
        let index = self
            .fields
            .iter()
            .position(|(n, _)| *n == name)
            .ok_or(CodecError::MissingValue { field: name })?;
        let (_, value) = self.fields.swap_remove(index);
        T::from_value(value).map_err(|e| e.in_field(self.type_name, name))
    }

    /// Unwrap a record value of the expected type
    pub fn unpack(value: Value, type_name: &'static str) -> CodecResult<Self> {
        match value {
            Value::Record(record) => {
                record.expect_type(type_name)?;
                Ok(record)
            }
            other => Err(mismatch(type_name, &other)),
        }
    }

    /// Check the record was produced for the expected type
    pub fn expect_type(&self, type_name: &'static str) -> CodecResult<()> {
        if self.type_name == type_name {
            Ok(())
        } else {
            Err(CodecError::TypeMismatch {
                expected: type_name,
                found: self.type_name,
            })
        }
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        Value::Record(record)
    }
}

/// Rust type with a codec representation
pub trait Encodable: Sized {
    /// Field type used when this type appears in a schema
    fn field_type() -> FieldType;

    /// Lower to a value tree
    fn to_value(&self) -> Value;

    /// Lift from a value tree
    fn from_value(value: Value) -> CodecResult<Self>;
}

/// Composite type described by a [`Schema`].
///
/// `field_type` of a schematic type is `FieldType::Composite(Self::schema)`.
pub trait Schematic: Encodable {
    /// Field table of this type
    fn schema() -> Schema;
}

fn mismatch(expected: &'static str, found: &Value) -> CodecError {
    CodecError::TypeMismatch {
        expected,
        found: found.kind_name(),
    }
}

macro_rules! impl_primitive {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl Encodable for $ty {
                fn field_type() -> FieldType {
                    FieldType::Primitive(Primitive::$variant)
                }

                fn to_value(&self) -> Value {
                    Value::$variant(*self)
                }

                fn from_value(value: Value) -> CodecResult<Self> {
                    match value {
                        Value::$variant(v) => Ok(v),
                        other => Err(mismatch(Primitive::$variant.type_name(), &other)),
                    }
                }
            }

            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::$variant(value)
                }
            }
        )*
    };
}

impl_primitive! {
    bool => Bool,
    u8 => U8,
    i8 => I8,
    u16 => U16,
    i16 => I16,
    u32 => U32,
    i32 => I32,
    u64 => U64,
    i64 => I64,
    f32 => F32,
    f64 => F64,
    char => Char,
}

/// Implement [`Encodable`] for a fieldless enum stored as an integer primitive.
///
/// Each variant maps to its wire value; decoding any other value fails with
/// [`CodecError::InvalidDiscriminant`].
///
/// ```ignore
/// nyaconv_codec::impl_enum!(Shading as u8 { Flat = 0, Gouraud = 2 });
/// ```
#[macro_export]
macro_rules! impl_enum {
    ($ty:ident as $repr:ty { $($variant:ident = $value:expr),+ $(,)? }) => {
        impl $crate::Encodable for $ty {
            fn field_type() -> $crate::FieldType {
                <$repr as $crate::Encodable>::field_type()
            }

            fn to_value(&self) -> $crate::Value {
                let raw: $repr = match self {
                    $($ty::$variant => $value,)+
                };
                $crate::Encodable::to_value(&raw)
            }

            fn from_value(value: $crate::Value) -> $crate::CodecResult<Self> {
                let raw = <$repr as $crate::Encodable>::from_value(value)?;
                $(
                    if raw == $value {
                        return Ok($ty::$variant);
                    }
                )+
                Err($crate::CodecError::InvalidDiscriminant {
                    type_name: stringify!($ty),
                    value: i64::try_from(raw).unwrap_or(i64::MAX),
                })
            }
        }
    };
}

impl<T: Encodable> Encodable for Vec<T> {
    fn field_type() -> FieldType {
        FieldType::sequence_of(T::field_type())
    }

    fn to_value(&self) -> Value {
        Value::Seq(self.iter().map(Encodable::to_value).collect())
    }

    fn from_value(value: Value) -> CodecResult<Self> {
        match value {
            Value::Seq(items) => items.into_iter().map(T::from_value).collect(),
            other => Err(mismatch("sequence", &other)),
        }
    }
}

impl<T: Encodable, const N: usize> Encodable for [T; N] {
    fn field_type() -> FieldType {
        FieldType::sequence_of(T::field_type())
    }

    fn to_value(&self) -> Value {
        Value::Seq(self.iter().map(Encodable::to_value).collect())
    }

    fn from_value(value: Value) -> CodecResult<Self> {
        let items = Vec::<T>::from_value(value)?;
        let actual = items.len();
        items.try_into().map_err(|_| CodecError::SizeMismatch {
            expected: N,
            actual,
        })
    }
}

impl Encodable for String {
    fn field_type() -> FieldType {
        FieldType::sequence_of(FieldType::Primitive(Primitive::Char))
    }

    fn to_value(&self) -> Value {
        Value::Seq(self.chars().map(Value::Char).collect())
    }

    fn from_value(value: Value) -> CodecResult<Self> {
        Vec::<char>::from_value(value).map(|chars| chars.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_as_integer() {
        assert_eq!(Value::U16(0xFFFF).as_integer(), Some(65535));
        assert_eq!(Value::I8(-3).as_integer(), Some(-3));
        assert_eq!(Value::U64(u64::MAX).as_integer(), None);
        assert_eq!(Value::F32(1.0).as_integer(), None);
        assert_eq!(Value::Bool(true).as_integer(), None);
        assert_eq!(Value::Seq(vec![]).as_integer(), None);
    }

    #[test]
    fn test_primitive_mismatch() {
        let err = i32::from_value(Value::U32(1)).unwrap_err();
        assert!(matches!(
            err,
            CodecError::TypeMismatch {
                expected: "i32",
                found: "u32"
            }
        ));
    }

    #[test]
    fn test_fixed_array_length() {
        let ok = <[i16; 4]>::from_value([1i16, 2, 3, 4].to_value());
        assert_eq!(ok.ok(), Some([1, 2, 3, 4]));

        let short = <[i16; 4]>::from_value(vec![1i16, 2].to_value());
        assert!(matches!(
            short,
            Err(CodecError::SizeMismatch {
                expected: 4,
                actual: 2
            })
        ));
    }

    #[test]
    fn test_record_take() {
        let mut record = Record::new("Pair").with("a", 1i32).with("b", 2u8);

        assert_eq!(record.take::<u8>("b").ok(), Some(2));
        assert_eq!(record.take::<i32>("a").ok(), Some(1));
        assert!(matches!(
            record.take::<i32>("a"),
            Err(CodecError::MissingValue { field: "a" })
        ));
    }

    #[test]
    fn test_record_take_reports_field() {
        let mut record = Record::new("Pair").with("a", 1.5f32);
        let err = record.take::<i32>("a").unwrap_err();
        assert_eq!(err.field_path(), vec!["a"]);
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Facing {
        Front,
        Back,
    }

    crate::impl_enum!(Facing as i16 { Front = 1, Back = -1 });

    #[test]
    fn test_enum_value() {
        assert!(matches!(Facing::field_type(), FieldType::Primitive(Primitive::I16)));
        assert_eq!(Facing::Back.to_value(), Value::I16(-1));
        assert_eq!(Facing::from_value(Value::I16(1)).ok(), Some(Facing::Front));
        assert!(matches!(
            Facing::from_value(Value::I16(0)),
            Err(CodecError::InvalidDiscriminant {
                type_name: "Facing",
                value: 0
            })
        ));
        assert!(matches!(
            Facing::from_value(Value::I32(1)),
            Err(CodecError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_string_roundtrip() {
        let name = String::from("hull+7f");
        assert_eq!(String::from_value(name.to_value()).ok(), Some(name));
    }
}
