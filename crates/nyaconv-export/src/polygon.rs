//! Quad polygon record

use nyaconv_codec::{CodecResult, Encodable, FieldType, Record, Schema, Schematic, Value};

use crate::fixed::FxVector;

/// Quad with a clipping normal; indices point into the owning mesh's points
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Polygon {
    pub normal: FxVector,
    pub vertices: [i16; 4],
}

impl Encodable for Polygon {
    fn field_type() -> FieldType {
        FieldType::Composite(Self::schema)
    }

    fn to_value(&self) -> Value {
        Record::new("Polygon")
            .with_field("normal", &self.normal)
            .with_field("vertices", &self.vertices)
            .into()
    }

    fn from_value(value: Value) -> CodecResult<Self> {
        let mut record = Record::unpack(value, "Polygon")?;
        Ok(Self {
            normal: record.take("normal")?,
            vertices: record.take("vertices")?,
        })
    }
}

impl Schematic for Polygon {
    fn schema() -> Schema {
        Schema::builder("Polygon")
            .field::<FxVector>("normal", 0)
            .fixed_array::<[i16; 4]>("vertices", 1, 4)
            .build()
    }
}
