//! Schema-driven decoder, the mirror of [`encoder`](crate::encoder)

use std::io::{self, Cursor};

use byteorder::{BigEndian, ReadBytesExt};
use tracing::debug;

use crate::error::{CodecError, CodecResult};
use crate::schema::{FieldDescriptor, FieldKind, FieldType, Primitive, Schema};
use crate::scope::ScopeStack;
use crate::value::{Record, Schematic, Value};

/// Decode a schematic object; the whole input must be consumed
pub fn decode<T: Schematic>(bytes: &[u8]) -> CodecResult<T> {
    let (object, consumed) = decode_prefix(bytes)?;
    if consumed != bytes.len() {
        return Err(CodecError::TrailingBytes {
            remaining: bytes.len() - consumed,
        });
    }
    Ok(object)
}

/// Decode a schematic object from the start of `bytes`, returning it with
/// the number of bytes consumed
pub fn decode_prefix<T: Schematic>(bytes: &[u8]) -> CodecResult<(T, usize)> {
    let schema = T::schema();
    let (record, consumed) = decode_record(&schema, bytes)?;
    debug!(type_name = schema.type_name(), bytes = consumed, "Decoded object");
    Ok((T::from_value(Value::Record(record))?, consumed))
}

/// Decode a record against an explicit schema
pub fn decode_record(schema: &Schema, bytes: &[u8]) -> CodecResult<(Record, usize)> {
    let mut decoder = Decoder {
        input: Cursor::new(bytes),
        scopes: ScopeStack::default(),
    };
    let record = decoder.read_record(schema)?;
    // position never exceeds the slice length
    let consumed = usize::try_from(decoder.input.position()).unwrap_or(bytes.len());
    Ok((record, consumed))
}

struct Decoder<'a> {
    input: Cursor<&'a [u8]>,
    scopes: ScopeStack,
}

impl Decoder<'_> {
    fn read_record(&mut self, schema: &Schema) -> CodecResult<Record> {
        let fields = schema.ordered_fields();
        if fields.is_empty() {
            return Err(CodecError::Unsupported {
                type_name: schema.type_name(),
                reason: "composite type has no ordered fields",
            });
        }

        self.scopes.push(schema);
        let mut record = Record::new(schema.type_name());
        let result = fields
            .into_iter()
            .try_for_each(|field| self.read_field(schema, &mut record, field));
        self.scopes.pop();
        result.map(|()| record)
    }

    fn read_field(
        &mut self,
        schema: &Schema,
        record: &mut Record,
        field: &FieldDescriptor,
    ) -> CodecResult<()> {
        let value = self
            .read_sized(&field.ty, field.kind)
            .map_err(|e| e.in_field(schema.type_name(), field.name))?;

        self.scopes.record(field.name, &value);
        record.fields.push((field.name, value));
        Ok(())
    }

    fn read_sized(&mut self, ty: &FieldType, kind: FieldKind) -> CodecResult<Value> {
        match kind {
            FieldKind::Plain => self.read_value(ty),
            FieldKind::Fixed(size) => {
                let count = usize::try_from(size).map_err(|_| CodecError::NegativeSize {
                    size: i64::from(size),
                })?;
                self.read_array(ty, count)
            }
            FieldKind::Dynamic(name) => {
                let count = self.scopes.resolve_size(name)?;
                self.read_array(ty, count)
            }
        }
    }

    fn read_array(&mut self, ty: &FieldType, count: usize) -> CodecResult<Value> {
        let FieldType::Sequence(element) = ty else {
            return Err(CodecError::Unsupported {
                type_name: ty.type_name(),
                reason: "array size declared on a non-sequence field",
            });
        };

        // cap the up-front allocation by what the input could possibly hold
        let remaining = self.remaining();
        let mut items = Vec::with_capacity(count.min(remaining));

        match element.as_ref() {
            FieldType::Composite(schema_fn) => {
                let schema = schema_fn();
                for _ in 0..count {
                    items.push(Value::Record(self.read_record(&schema)?));
                }
            }
            element => {
                for _ in 0..count {
                    items.push(self.read_value(element)?);
                }
            }
        }

        Ok(Value::Seq(items))
    }

    fn read_value(&mut self, ty: &FieldType) -> CodecResult<Value> {
        match ty {
            FieldType::Primitive(primitive) => self.read_primitive(*primitive),
            FieldType::Composite(schema_fn) => self.read_record(&schema_fn()).map(Value::Record),
            FieldType::Sequence(_) => Err(CodecError::UnsizedArray),
        }
    }

    fn read_primitive(&mut self, primitive: Primitive) -> CodecResult<Value> {
        let offset = self.input.position();
        let input = &mut self.input;
        let value = match primitive {
            Primitive::Bool => input.read_u8().map(|v| Value::Bool(v != 0)),
            Primitive::U8 => input.read_u8().map(Value::U8),
            Primitive::I8 => input.read_i8().map(Value::I8),
            Primitive::U16 => input.read_u16::<BigEndian>().map(Value::U16),
            Primitive::I16 => input.read_i16::<BigEndian>().map(Value::I16),
            Primitive::U32 => input.read_u32::<BigEndian>().map(Value::U32),
            Primitive::I32 => input.read_i32::<BigEndian>().map(Value::I32),
            Primitive::U64 => input.read_u64::<BigEndian>().map(Value::U64),
            Primitive::I64 => input.read_i64::<BigEndian>().map(Value::I64),
            Primitive::F32 => input.read_f32::<BigEndian>().map(Value::F32),
            Primitive::F64 => input.read_f64::<BigEndian>().map(Value::F64),
            Primitive::Char => {
                let scalar = input.read_u32::<BigEndian>().map_err(|e| eof(e, offset))?;
                return char::from_u32(scalar)
                    .map(Value::Char)
                    .ok_or(CodecError::InvalidChar(scalar));
            }
        };
        value.map_err(|e| eof(e, offset))
    }

    fn remaining(&self) -> usize {
        let len = self.input.get_ref().len();
        let position = usize::try_from(self.input.position()).unwrap_or(len);
        len.saturating_sub(position)
    }
}

fn eof(error: io::Error, offset: u64) -> CodecError {
    if error.kind() == io::ErrorKind::UnexpectedEof {
        CodecError::UnexpectedEof { offset }
    } else {
        CodecError::Io(error)
    }
}
