//! Integration tests for the schema codec
//!
//! These tests cover typed objects going through the public API:
//! - Ordered, fixed-size and dynamic-size fields
//! - Sibling lookup through enclosing objects and derived values
//! - Inherited schemas
//! - Enumerations written as their underlying integer
//! - Error attribution to the owning field

use nyaconv_codec::{
    decode, decode_prefix, encode, CodecError, CodecResult, Encodable, FieldType, Record,
    Schema, Schematic, Value,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct Point {
    x: i32,
    y: i32,
    z: i32,
}

impl Encodable for Point {
    fn field_type() -> FieldType {
        FieldType::Composite(Self::schema)
    }

    fn to_value(&self) -> Value {
        Record::new("Point")
            .with("x", self.x)
            .with("y", self.y)
            .with("z", self.z)
            .into()
    }

    fn from_value(value: Value) -> CodecResult<Self> {
        let mut record = Record::unpack(value, "Point")?;
        Ok(Self {
            x: record.take("x")?,
            y: record.take("y")?,
            z: record.take("z")?,
        })
    }
}

impl Schematic for Point {
    fn schema() -> Schema {
        Schema::builder("Point")
            .field::<i32>("x", 0)
            .field::<i32>("y", 1)
            .field::<i32>("z", 2)
            .build()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct Quad {
    indices: [i16; 4],
    flags: u8,
}

impl Encodable for Quad {
    fn field_type() -> FieldType {
        FieldType::Composite(Self::schema)
    }

    fn to_value(&self) -> Value {
        Record::new("Quad")
            .with_field("indices", &self.indices)
            .with("flags", self.flags)
            .into()
    }

    fn from_value(value: Value) -> CodecResult<Self> {
        let mut record = Record::unpack(value, "Quad")?;
        Ok(Self {
            indices: record.take("indices")?,
            flags: record.take("flags")?,
        })
    }
}

impl Schematic for Quad {
    fn schema() -> Schema {
        Schema::builder("Quad")
            .field::<u8>("flags", 1)
            .fixed_array::<[i16; 4]>("indices", 0, 4)
            .build()
    }
}

/// Counts first, arrays after; `label` is never serialized
#[derive(Debug, Clone, PartialEq, Default)]
struct Shape {
    point_count: i32,
    quad_count: i32,
    points: Vec<Point>,
    quads: Vec<Quad>,
    label: String,
}

impl Shape {
    fn new(points: Vec<Point>, quads: Vec<Quad>) -> Self {
        Self {
            point_count: points.len() as i32,
            quad_count: quads.len() as i32,
            points,
            quads,
            label: "shape".into(),
        }
    }
}

impl Encodable for Shape {
    fn field_type() -> FieldType {
        FieldType::Composite(Self::schema)
    }

    fn to_value(&self) -> Value {
        Record::new("Shape")
            .with("point_count", self.point_count)
            .with("quad_count", self.quad_count)
            .with_field("points", &self.points)
            .with_field("quads", &self.quads)
            .with_field("label", &self.label)
            .into()
    }

    fn from_value(value: Value) -> CodecResult<Self> {
        let mut record = Record::unpack(value, "Shape")?;
        Ok(Self {
            point_count: record.take("point_count")?,
            quad_count: record.take("quad_count")?,
            points: record.take("points")?,
            quads: record.take("quads")?,
            label: String::new(),
        })
    }
}

impl Schematic for Shape {
    fn schema() -> Schema {
        Schema::builder("Shape")
            .field::<i32>("point_count", 0)
            .field::<i32>("quad_count", 1)
            .dynamic_array::<Vec<Point>>("points", 2, "point_count")
            .dynamic_array::<Vec<Quad>>("quads", 3, "quad_count")
            .untagged::<String>("label")
            .build()
    }
}

/// Shape plus one weight per point, sized by the inherited count
#[derive(Debug, Clone, PartialEq, Default)]
struct WeightedShape {
    base: Shape,
    weights: Vec<u16>,
}

impl Encodable for WeightedShape {
    fn field_type() -> FieldType {
        FieldType::Composite(Self::schema)
    }

    fn to_value(&self) -> Value {
        let Value::Record(mut record) = self.base.to_value() else {
            unreachable!("shape lowers to a record");
        };
        record.type_name = "WeightedShape";
        record.with_field("weights", &self.weights).into()
    }

    fn from_value(value: Value) -> CodecResult<Self> {
        let mut record = Record::unpack(value, "WeightedShape")?;
        let weights = record.take("weights")?;
        record.type_name = "Shape";
        Ok(Self {
            base: Shape::from_value(record.into())?,
            weights,
        })
    }
}

impl Schematic for WeightedShape {
    fn schema() -> Schema {
        Schema::builder("WeightedShape")
            .inherit(Shape::schema())
            .dynamic_array::<Vec<u16>>("weights", 4, "point_count")
            .build()
    }
}

/// Texture-like record whose payload size is derived from its dimensions
#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct Image {
    width: u16,
    height: u16,
    pixels: Vec<u16>,
}

impl Encodable for Image {
    fn field_type() -> FieldType {
        FieldType::Composite(Self::schema)
    }

    fn to_value(&self) -> Value {
        Record::new("Image")
            .with("width", self.width)
            .with("height", self.height)
            .with_field("pixels", &self.pixels)
            .into()
    }

    fn from_value(value: Value) -> CodecResult<Self> {
        let mut record = Record::unpack(value, "Image")?;
        Ok(Self {
            width: record.take("width")?,
            height: record.take("height")?,
            pixels: record.take("pixels")?,
        })
    }
}

impl Schematic for Image {
    fn schema() -> Schema {
        Schema::builder("Image")
            .field::<u16>("width", 0)
            .field::<u16>("height", 1)
            .dynamic_array::<Vec<u16>>("pixels", 2, "pixel_count")
            .derived("pixel_count", |frame| {
                Some(frame.integer("width")? * frame.integer("height")?)
            })
            .build()
    }
}

/// Inner records sized by a count stored on the outer record
#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct Palette {
    entry_count: u8,
    rows: Vec<Row>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct Row {
    id: u8,
    entries: Vec<u16>,
}

impl Encodable for Row {
    fn field_type() -> FieldType {
        FieldType::Composite(Self::schema)
    }

    fn to_value(&self) -> Value {
        Record::new("Row")
            .with("id", self.id)
            .with_field("entries", &self.entries)
            .into()
    }

    fn from_value(value: Value) -> CodecResult<Self> {
        let mut record = Record::unpack(value, "Row")?;
        Ok(Self {
            id: record.take("id")?,
            entries: record.take("entries")?,
        })
    }
}

impl Schematic for Row {
    fn schema() -> Schema {
        Schema::builder("Row")
            .field::<u8>("id", 0)
            .dynamic_array::<Vec<u16>>("entries", 1, "entry_count")
            .build()
    }
}

impl Encodable for Palette {
    fn field_type() -> FieldType {
        FieldType::Composite(Self::schema)
    }

    fn to_value(&self) -> Value {
        Record::new("Palette")
            .with("entry_count", self.entry_count)
            .with_field("rows", &self.rows)
            .into()
    }

    fn from_value(value: Value) -> CodecResult<Self> {
        let mut record = Record::unpack(value, "Palette")?;
        Ok(Self {
            entry_count: record.take("entry_count")?,
            rows: record.take("rows")?,
        })
    }
}

impl Schematic for Palette {
    fn schema() -> Schema {
        Schema::builder("Palette")
            .field::<u8>("entry_count", 0)
            .fixed_array::<Vec<Row>>("rows", 1, 2)
            .build()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Blend {
    Opaque,
    Additive,
    Mesh,
}

nyaconv_codec::impl_enum!(Blend as u16 { Opaque = 0, Additive = 3, Mesh = 0x100 });

#[derive(Debug, Clone, PartialEq, Eq)]
struct Layer {
    id: u8,
    blend: Blend,
}

impl Encodable for Layer {
    fn field_type() -> FieldType {
        FieldType::Composite(Self::schema)
    }

    fn to_value(&self) -> Value {
        Record::new("Layer")
            .with("id", self.id)
            .with_field("blend", &self.blend)
            .into()
    }

    fn from_value(value: Value) -> CodecResult<Self> {
        let mut record = Record::unpack(value, "Layer")?;
        Ok(Self {
            id: record.take("id")?,
            blend: record.take("blend")?,
        })
    }
}

impl Schematic for Layer {
    fn schema() -> Schema {
        Schema::builder("Layer")
            .field::<u8>("id", 0)
            .field::<Blend>("blend", 1)
            .build()
    }
}

/// Helper to build a small two-quad shape
fn sample_shape() -> Shape {
    Shape::new(
        vec![
            Point { x: 0x0001_0000, y: 0, z: -1 },
            Point { x: 1, y: 2, z: 3 },
        ],
        vec![
            Quad { indices: [0, 1, 1, 1], flags: 0x80 },
            Quad { indices: [1, 0, 0, 0], flags: 0x00 },
        ],
    )
}

mod layout_tests {
    use super::*;

    #[test]
    fn test_shape_byte_layout() {
        let bytes = encode(&sample_shape()).unwrap();

        let mut expected = vec![
            0x00, 0x00, 0x00, 0x02, // point_count
            0x00, 0x00, 0x00, 0x02, // quad_count
            0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF,
            0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x02, 0x00, 0x00, 0x00, 0x03,
        ];
        expected.extend([0x00, 0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x01, 0x80]);
        expected.extend([0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00]);

        assert_eq!(bytes, expected);
    }

    #[test]
    fn test_untagged_field_not_written() {
        let mut shape = sample_shape();
        let before = encode(&shape).unwrap();
        shape.label = "renamed".into();

        assert_eq!(encode(&shape).unwrap(), before);
    }

    #[test]
    fn test_inherited_fields_share_scope() {
        let shape = WeightedShape {
            base: sample_shape(),
            weights: vec![0x0102, 0x0304],
        };
        let bytes = encode(&shape).unwrap();
        let base = encode(&shape.base).unwrap();

        assert_eq!(&bytes[..base.len()], base.as_slice());
        assert_eq!(&bytes[base.len()..], &[0x01, 0x02, 0x03, 0x04]);
    }

    #[test]
    fn test_derived_size() {
        let image = Image {
            width: 2,
            height: 2,
            pixels: vec![0x8000, 0xFFFF, 0x0000, 0x801F],
        };
        let bytes = encode(&image).unwrap();

        assert_eq!(bytes.len(), 4 + 8);
        assert_eq!(&bytes[..4], &[0x00, 0x02, 0x00, 0x02]);
    }

    #[test]
    fn test_lookup_walks_to_enclosing_object() {
        let palette = Palette {
            entry_count: 2,
            rows: vec![
                Row { id: 1, entries: vec![0xAAAA, 0xBBBB] },
                Row { id: 2, entries: vec![0xCCCC, 0xDDDD, 0xEEEE] },
            ],
        };
        let bytes = encode(&palette).unwrap();

        // the second row only writes the first two entries
        assert_eq!(bytes.len(), 1 + 2 * (1 + 4));
        assert_eq!(&bytes[6..], &[0x02, 0xCC, 0xCC, 0xDD, 0xDD]);
    }
}

mod roundtrip_tests {
    use super::*;

    #[test]
    fn test_shape_roundtrip() {
        let shape = sample_shape();
        let decoded: Shape = decode(&encode(&shape).unwrap()).unwrap();

        assert_eq!(decoded.points, shape.points);
        assert_eq!(decoded.quads, shape.quads);
        assert!(decoded.label.is_empty());
    }

    #[test]
    fn test_weighted_roundtrip() {
        let shape = WeightedShape {
            base: sample_shape(),
            weights: vec![7, 9],
        };
        let decoded: WeightedShape = decode(&encode(&shape).unwrap()).unwrap();

        assert_eq!(decoded.weights, shape.weights);
        assert_eq!(decoded.base.quads, shape.base.quads);
    }

    #[test]
    fn test_enum_roundtrip() {
        for blend in [Blend::Opaque, Blend::Additive, Blend::Mesh] {
            let layer = Layer { id: 7, blend };
            let decoded: Layer = decode(&encode(&layer).unwrap()).unwrap();
            assert_eq!(decoded, layer);
        }

        let bytes = encode(&Layer { id: 7, blend: Blend::Mesh }).unwrap();
        assert_eq!(bytes, vec![0x07, 0x01, 0x00]);
    }

    #[test]
    fn test_decode_prefix_reports_consumed() {
        let mut bytes = encode(&sample_shape()).unwrap();
        let len = bytes.len();
        bytes.extend([0xDE, 0xAD]);

        let (_, consumed) = decode_prefix::<Shape>(&bytes).unwrap();
        assert_eq!(consumed, len);
        assert!(matches!(
            decode::<Shape>(&bytes),
            Err(CodecError::TrailingBytes { remaining: 2 })
        ));
    }
}

mod error_tests {
    use super::*;

    #[test]
    fn test_unknown_enum_value() {
        let err = decode::<Layer>(&[0x07, 0x00, 0x02]).unwrap_err();

        assert_eq!(err.field_path(), vec!["blend"]);
        assert!(matches!(
            err.root_cause(),
            CodecError::InvalidDiscriminant {
                type_name: "Blend",
                value: 2
            }
        ));
    }

    #[test]
    fn test_count_larger_than_array() {
        let mut shape = sample_shape();
        shape.point_count = 3;

        let err = encode(&shape).unwrap_err();
        assert_eq!(err.field_path(), vec!["points"]);
        assert!(matches!(
            err.root_cause(),
            CodecError::SizeMismatch {
                expected: 3,
                actual: 2
            }
        ));
    }

    #[test]
    fn test_negative_count() {
        let mut shape = sample_shape();
        shape.quad_count = -2;

        let err = encode(&shape).unwrap_err();
        assert!(matches!(err.root_cause(), CodecError::NegativeSize { size: -2 }));
    }

    #[test]
    fn test_nested_error_attribution() {
        let mut shape = sample_shape();
        shape.quads[1] = Quad { indices: [0; 4], flags: 1 };
        let mut bytes = encode(&shape).unwrap();
        bytes.truncate(bytes.len() - 3);

        let err = decode::<Shape>(&bytes).unwrap_err();
        assert_eq!(err.field_path(), vec!["quads", "indices"]);
        assert!(matches!(err.root_cause(), CodecError::UnexpectedEof { .. }));
    }

    #[test]
    fn test_missing_size_field() {
        let row = Row { id: 1, entries: vec![1, 2] };
        let err = encode(&row).unwrap_err();

        assert!(err.to_string().starts_with("Row.entries"));
        assert!(matches!(
            err.root_cause(),
            CodecError::MissingSizeField { name: "entry_count" }
        ));
    }
}

mod proptest_tests {
    use super::*;
    use proptest::prelude::*;

    fn point() -> impl Strategy<Value = Point> {
        (any::<i32>(), any::<i32>(), any::<i32>()).prop_map(|(x, y, z)| Point { x, y, z })
    }

    fn quad() -> impl Strategy<Value = Quad> {
        (any::<[i16; 4]>(), any::<u8>()).prop_map(|(indices, flags)| Quad { indices, flags })
    }

    proptest! {
        #[test]
        fn test_shape_roundtrip(
            points in prop::collection::vec(point(), 0..16),
            quads in prop::collection::vec(quad(), 0..16),
        ) {
            let shape = Shape::new(points, quads);
            let bytes = encode(&shape).unwrap();
            prop_assert_eq!(bytes.len(), 8 + shape.points.len() * 12 + shape.quads.len() * 9);

            let decoded: Shape = decode(&bytes).unwrap();
            prop_assert_eq!(decoded.points, shape.points);
            prop_assert_eq!(decoded.quads, shape.quads);
        }

        #[test]
        fn test_image_roundtrip(width in 0u16..16, height in 0u16..16, seed in any::<u16>()) {
            let pixels = (0..usize::from(width) * usize::from(height))
                .map(|i| seed.wrapping_add(i as u16))
                .collect();
            let image = Image { width, height, pixels };

            let decoded: Image = decode(&encode(&image).unwrap()).unwrap();
            prop_assert_eq!(decoded, image);
        }

        #[test]
        fn test_decode_never_panics(bytes in prop::collection::vec(any::<u8>(), 0..64)) {
            let _ = decode::<Shape>(&bytes);
            let _ = decode::<Image>(&bytes);
        }
    }
}
