//! Field descriptors and per-type schemas
//!
//! A [`Schema`] lists the fields of one composite type. Only fields carrying
//! an order tag take part in serialization; they are walked in ascending tag
//! order. Sequence fields additionally carry a [`FieldKind`] telling the codec
//! how many elements to expect.

use crate::scope::Frame;
use crate::value::Encodable;

/// Primitive wire types. Multi-byte values are big-endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    /// One byte, zero is false
    Bool,
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    U64,
    I64,
    F32,
    F64,
    /// Unicode scalar value as a 32-bit integer
    Char,
}

impl Primitive {
    /// Size in bytes on the wire
    pub fn size(self) -> usize {
        match self {
            Primitive::Bool | Primitive::U8 | Primitive::I8 => 1,
            Primitive::U16 | Primitive::I16 => 2,
            Primitive::U32 | Primitive::I32 | Primitive::F32 | Primitive::Char => 4,
            Primitive::U64 | Primitive::I64 | Primitive::F64 => 8,
        }
    }

    /// Integer types may be used as dynamic array sizes
    pub fn is_integer(self) -> bool {
        matches!(
            self,
            Primitive::U8
                | Primitive::I8
                | Primitive::U16
                | Primitive::I16
                | Primitive::U32
                | Primitive::I32
                | Primitive::U64
                | Primitive::I64
        )
    }

    /// Rust name of the type, as used in error messages
    pub fn type_name(self) -> &'static str {
        match self {
            Primitive::Bool => "bool",
            Primitive::U8 => "u8",
            Primitive::I8 => "i8",
            Primitive::U16 => "u16",
            Primitive::I16 => "i16",
            Primitive::U32 => "u32",
            Primitive::I32 => "i32",
            Primitive::U64 => "u64",
            Primitive::I64 => "i64",
            Primitive::F32 => "f32",
            Primitive::F64 => "f64",
            Primitive::Char => "char",
        }
    }
}

/// Builds the schema of a composite type on demand
pub type SchemaFn = fn() -> Schema;

/// Type of a field as seen by the codec
#[derive(Debug, Clone)]
pub enum FieldType {
    Primitive(Primitive),
    /// Nested object with its own schema
    Composite(SchemaFn),
    /// Homogeneous sequence; needs a fixed or dynamic size
    Sequence(Box<FieldType>),
}

impl FieldType {
    /// Field type of any [`Encodable`] Rust type
    pub fn of<T: Encodable>() -> Self {
        T::field_type()
    }

    /// Sequence of `element`
    pub fn sequence_of(element: FieldType) -> Self {
        FieldType::Sequence(Box::new(element))
    }

    /// Primitive name, or `composite`/`sequence`
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldType::Primitive(p) => p.type_name(),
            FieldType::Composite(_) => "composite",
            FieldType::Sequence(_) => "sequence",
        }
    }
}

/// How many elements a sequence field holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Not an array: encoded by the field type's own rules
    Plain,
    /// Exactly `N` elements
    Fixed(i32),
    /// Count read from a named integer value of this or an enclosing object
    Dynamic(&'static str),
}

/// One field of a composite type
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    pub name: &'static str,
    /// Serialization order; `None` excludes the field from the byte stream
    pub order: Option<i32>,
    pub ty: FieldType,
    pub kind: FieldKind,
}

impl FieldDescriptor {
    /// Whether the field carries an order tag
    pub fn is_serialized(&self) -> bool {
        self.order.is_some()
    }
}

/// Computes a named, non-serialized integer from the values of one object
pub type DeriveFn = fn(&Frame) -> Option<i64>;

/// Named integer computed from sibling values, visible to dynamic-size lookup
#[derive(Debug, Clone, Copy)]
pub struct DerivedValue {
    pub name: &'static str,
    pub compute: DeriveFn,
}

/// Ordered field layout of a composite type
#[derive(Debug, Clone)]
pub struct Schema {
    type_name: &'static str,
    fields: Vec<FieldDescriptor>,
    derived: Vec<DerivedValue>,
}

impl Schema {
    /// Start a schema for the named type
    pub fn builder(type_name: &'static str) -> SchemaBuilder {
        SchemaBuilder {
            schema: Schema {
                type_name,
                fields: Vec::new(),
                derived: Vec::new(),
            },
        }
    }

    /// Name of the composite type
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// All declared fields, including untagged ones
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Field by name, serialized or not
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Serialized fields in ascending order; equal tags keep declaration order
    pub fn ordered_fields(&self) -> Vec<&FieldDescriptor> {
        let mut ordered: Vec<_> = self.fields.iter().filter(|f| f.is_serialized()).collect();
        ordered.sort_by_key(|f| f.order);
        ordered
    }

    /// Derived value by name
    pub fn derived(&self, name: &str) -> Option<&DerivedValue> {
        self.derived.iter().find(|d| d.name == name)
    }

    /// Derived values in declaration order
    pub fn derived_values(&self) -> &[DerivedValue] {
        &self.derived
    }

    /// Fixed encoded size, if no field depends on a runtime count
    pub fn static_size(&self) -> Option<usize> {
        self.ordered_fields()
            .iter()
            .map(|f| static_field_size(&f.ty, f.kind))
            .sum()
    }
}

fn static_type_size(ty: &FieldType) -> Option<usize> {
    match ty {
        FieldType::Primitive(p) => Some(p.size()),
        FieldType::Composite(schema) => schema().static_size(),
        FieldType::Sequence(_) => None,
    }
}

fn static_field_size(ty: &FieldType, kind: FieldKind) -> Option<usize> {
    match (ty, kind) {
        (FieldType::Sequence(element), FieldKind::Fixed(count)) => {
            let count = usize::try_from(count).ok()?;
            static_type_size(element).map(|size| size * count)
        }
        (_, FieldKind::Plain) => static_type_size(ty),
        _ => None,
    }
}

/// Builder for [`Schema`]
#[derive(Debug)]
pub struct SchemaBuilder {
    schema: Schema,
}

impl SchemaBuilder {
    /// Plain field of type `T`
    pub fn field<T: Encodable>(self, name: &'static str, order: i32) -> Self {
        self.descriptor(FieldDescriptor {
            name,
            order: Some(order),
            ty: T::field_type(),
            kind: FieldKind::Plain,
        })
    }

    /// Sequence field holding exactly `size` elements
    pub fn fixed_array<T: Encodable>(self, name: &'static str, order: i32, size: i32) -> Self {
        self.descriptor(FieldDescriptor {
            name,
            order: Some(order),
            ty: T::field_type(),
            kind: FieldKind::Fixed(size),
        })
    }

    /// Sequence field whose length is the integer value named `size_field`
    pub fn dynamic_array<T: Encodable>(
        self,
        name: &'static str,
        order: i32,
        size_field: &'static str,
    ) -> Self {
        self.descriptor(FieldDescriptor {
            name,
            order: Some(order),
            ty: T::field_type(),
            kind: FieldKind::Dynamic(size_field),
        })
    }

    /// Declared but never serialized
    pub fn untagged<T: Encodable>(self, name: &'static str) -> Self {
        self.descriptor(FieldDescriptor {
            name,
            order: None,
            ty: T::field_type(),
            kind: FieldKind::Plain,
        })
    }

    /// Add a prepared descriptor
    pub fn descriptor(mut self, descriptor: FieldDescriptor) -> Self {
        self.schema.fields.push(descriptor);
        self
    }

    /// Named integer computed from already-processed values of the same object
    pub fn derived(mut self, name: &'static str, compute: DeriveFn) -> Self {
        self.schema.derived.push(DerivedValue { name, compute });
        self
    }

    /// Take over the fields and derived values of a base type
    pub fn inherit(mut self, base: Schema) -> Self {
        let mut fields = base.fields;
        fields.append(&mut self.schema.fields);
        self.schema.fields = fields;

        let mut derived = base.derived;
        derived.append(&mut self.schema.derived);
        self.schema.derived = derived;
        self
    }

    /// Finish the schema
    pub fn build(self) -> Schema {
        self.schema
    }
}
