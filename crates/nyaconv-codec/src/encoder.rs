//! Schema-driven encoder
//!
//! Walks the ordered fields of a record and writes them big-endian with no
//! padding or separators.

use byteorder::{BigEndian, WriteBytesExt};
use tracing::debug;

use crate::error::{CodecError, CodecResult};
use crate::schema::{FieldDescriptor, FieldKind, FieldType, Primitive, Schema};
use crate::scope::ScopeStack;
use crate::value::{Record, Schematic, Value};

/// Encode a schematic object to bytes
pub fn encode<T: Schematic>(object: &T) -> CodecResult<Vec<u8>> {
    let schema = T::schema();
    let bytes = encode_record(&schema, &record_of(object.to_value(), &schema)?)?;
    debug!(type_name = schema.type_name(), bytes = bytes.len(), "Encoded object");
    Ok(bytes)
}

/// Encode a record against an explicit schema
pub fn encode_record(schema: &Schema, record: &Record) -> CodecResult<Vec<u8>> {
    let mut encoder = Encoder::default();
    encoder.write_record(schema, record)?;
    Ok(encoder.out)
}

fn record_of(value: Value, schema: &Schema) -> CodecResult<Record> {
    match value {
        Value::Record(record) => Ok(record),
        other => Err(CodecError::TypeMismatch {
            expected: schema.type_name(),
            found: other.kind_name(),
        }),
    }
}

#[derive(Debug, Default)]
struct Encoder {
    out: Vec<u8>,
    scopes: ScopeStack,
}

impl Encoder {
    fn write_record(&mut self, schema: &Schema, record: &Record) -> CodecResult<()> {
        let fields = schema.ordered_fields();
        if fields.is_empty() {
            return Err(CodecError::Unsupported {
                type_name: schema.type_name(),
                reason: "composite type has no ordered fields",
            });
        }

        self.scopes.push(schema);
        let result = fields
            .into_iter()
            .try_for_each(|field| self.write_field(schema, record, field));
        self.scopes.pop();
        result
    }

    fn write_field(
        &mut self,
        schema: &Schema,
        record: &Record,
        field: &FieldDescriptor,
    ) -> CodecResult<()> {
        let value = record
            .get(field.name)
            .ok_or(CodecError::MissingValue { field: field.name })
            .and_then(|value| {
                self.write_sized(&field.ty, field.kind, value)?;
                Ok(value)
            })
            .map_err(|e| e.in_field(schema.type_name(), field.name))?;

        self.scopes.record(field.name, value);
        Ok(())
    }

    fn write_sized(&mut self, ty: &FieldType, kind: FieldKind, value: &Value) -> CodecResult<()> {
        match kind {
            FieldKind::Plain => self.write_value(ty, value),
            FieldKind::Fixed(size) => {
                let count = usize::try_from(size).map_err(|_| CodecError::NegativeSize {
                    size: i64::from(size),
                })?;
                self.write_array(ty, value, count)
            }
            FieldKind::Dynamic(name) => {
                let count = self.scopes.resolve_size(name)?;
                self.write_array(ty, value, count)
            }
        }
    }

    fn write_array(&mut self, ty: &FieldType, value: &Value, count: usize) -> CodecResult<()> {
        let FieldType::Sequence(element) = ty else {
            return Err(CodecError::Unsupported {
                type_name: ty.type_name(),
                reason: "array size declared on a non-sequence field",
            });
        };
        let Value::Seq(items) = value else {
            return Err(CodecError::TypeMismatch {
                expected: "sequence",
                found: value.kind_name(),
            });
        };
        if items.len() < count {
            return Err(CodecError::SizeMismatch {
                expected: count,
                actual: items.len(),
            });
        }

        match element.as_ref() {
            FieldType::Composite(schema_fn) => {
                let schema = schema_fn();
                for item in &items[..count] {
                    let record = match item {
                        Value::Record(record) => record,
                        other => {
                            return Err(CodecError::TypeMismatch {
                                expected: schema.type_name(),
                                found: other.kind_name(),
                            })
                        }
                    };
                    self.write_record(&schema, record)?;
                }
                Ok(())
            }
            element => items[..count]
                .iter()
                .try_for_each(|item| self.write_value(element, item)),
        }
    }

    fn write_value(&mut self, ty: &FieldType, value: &Value) -> CodecResult<()> {
        match (ty, value) {
            (FieldType::Primitive(primitive), value) => self.write_primitive(*primitive, value),
            (FieldType::Composite(schema_fn), Value::Record(record)) => {
                self.write_record(&schema_fn(), record)
            }
            (FieldType::Composite(schema_fn), other) => Err(CodecError::TypeMismatch {
                expected: schema_fn().type_name(),
                found: other.kind_name(),
            }),
            (FieldType::Sequence(_), _) => Err(CodecError::UnsizedArray),
        }
    }

    fn write_primitive(&mut self, primitive: Primitive, value: &Value) -> CodecResult<()> {
        let out = &mut self.out;
        match (primitive, value) {
            (Primitive::Bool, Value::Bool(v)) => out.write_u8(u8::from(*v))?,
            (Primitive::U8, Value::U8(v)) => out.write_u8(*v)?,
            (Primitive::I8, Value::I8(v)) => out.write_i8(*v)?,
            (Primitive::U16, Value::U16(v)) => out.write_u16::<BigEndian>(*v)?,
            (Primitive::I16, Value::I16(v)) => out.write_i16::<BigEndian>(*v)?,
            (Primitive::U32, Value::U32(v)) => out.write_u32::<BigEndian>(*v)?,
            (Primitive::I32, Value::I32(v)) => out.write_i32::<BigEndian>(*v)?,
            (Primitive::U64, Value::U64(v)) => out.write_u64::<BigEndian>(*v)?,
            (Primitive::I64, Value::I64(v)) => out.write_i64::<BigEndian>(*v)?,
            (Primitive::F32, Value::F32(v)) => out.write_f32::<BigEndian>(*v)?,
            (Primitive::F64, Value::F64(v)) => out.write_f64::<BigEndian>(*v)?,
            (Primitive::Char, Value::Char(v)) => out.write_u32::<BigEndian>(u32::from(*v))?,
            (primitive, other) => {
                return Err(CodecError::TypeMismatch {
                    expected: primitive.type_name(),
                    found: other.kind_name(),
                })
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header_schema() -> Schema {
        Schema::builder("Header")
            .field::<i32>("magic", 0)
            .field::<u8>("flags", 1)
            .build()
    }

    #[test]
    fn test_big_endian_i32() {
        let record = Record::new("Header").with("magic", 0x0001_0000i32).with("flags", 0u8);
        let bytes = encode_record(&header_schema(), &record).unwrap();
        assert_eq!(bytes, vec![0x00, 0x01, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn test_ordered_by_tag_not_declaration() {
        let schema = Schema::builder("Pair")
            .field::<u8>("second", 1)
            .field::<u8>("first", 0)
            .build();
        let record = Record::new("Pair").with("second", 2u8).with("first", 1u8);

        assert_eq!(encode_record(&schema, &record).unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_fixed_array_writes_first_n() {
        let schema = Schema::builder("Quad")
            .fixed_array::<Vec<i16>>("indices", 0, 2)
            .build();
        let record = Record::new("Quad").with("indices", Value::Seq(vec![
            Value::I16(1),
            Value::I16(-1),
            Value::I16(7),
        ]));

        assert_eq!(
            encode_record(&schema, &record).unwrap(),
            vec![0x00, 0x01, 0xFF, 0xFF]
        );
    }

    #[test]
    fn test_short_fixed_array_fails() {
        let schema = Schema::builder("Quad")
            .fixed_array::<Vec<i16>>("indices", 0, 4)
            .build();
        let record = Record::new("Quad").with("indices", Value::Seq(vec![Value::I16(1)]));

        let err = encode_record(&schema, &record).unwrap_err();
        assert_eq!(err.field_path(), vec!["indices"]);
        assert!(matches!(
            err.root_cause(),
            CodecError::SizeMismatch {
                expected: 4,
                actual: 1
            }
        ));
    }

    #[test]
    fn test_empty_schema_unsupported() {
        let schema = Schema::builder("Empty").untagged::<i32>("ignored").build();
        let record = Record::new("Empty").with("ignored", 1i32);

        assert!(matches!(
            encode_record(&schema, &record),
            Err(CodecError::Unsupported {
                type_name: "Empty",
                ..
            })
        ));
    }

    #[test]
    fn test_unsized_sequence() {
        let schema = Schema::builder("Loose").field::<Vec<u8>>("data", 0).build();
        let record = Record::new("Loose").with("data", Value::Seq(vec![]));

        let err = encode_record(&schema, &record).unwrap_err();
        assert!(matches!(err.root_cause(), CodecError::UnsizedArray));
    }

    #[test]
    fn test_bool_and_char() {
        let schema = Schema::builder("Misc")
            .field::<bool>("on", 0)
            .field::<char>("letter", 1)
            .build();
        let record = Record::new("Misc").with("on", true).with("letter", 'A');

        assert_eq!(
            encode_record(&schema, &record).unwrap(),
            vec![0x01, 0x00, 0x00, 0x00, 0x41]
        );
    }
}
