//! Q16.16 fixed-point vectors

use nyaconv_codec::{CodecResult, Encodable, FieldType, Record, Schema, Schematic, Value};
use nyaconv_core::Vector3;

/// Scale of the 16.16 fixed-point format
pub const FIXED_ONE: f64 = 65536.0;

/// Convert to fixed point. The value is narrowed to `f32` first, then
/// scaled and truncated toward zero.
pub fn to_fixed(value: f64) -> i32 {
    (f64::from(value as f32) * FIXED_ONE) as i32
}

pub fn from_fixed(value: i32) -> f64 {
    f64::from(value) / FIXED_ONE
}

/// Vector of three 16.16 fixed-point components
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct FxVector {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl FxVector {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Back to floating point (lossy)
    pub fn to_vector(&self) -> Vector3 {
        Vector3::new(from_fixed(self.x), from_fixed(self.y), from_fixed(self.z))
    }
}

impl From<Vector3> for FxVector {
    fn from(v: Vector3) -> Self {
        Self::new(to_fixed(v.x), to_fixed(v.y), to_fixed(v.z))
    }
}

impl Encodable for FxVector {
    fn field_type() -> FieldType {
        FieldType::Composite(Self::schema)
    }

    fn to_value(&self) -> Value {
        Record::new("FxVector")
            .with("x", self.x)
            .with("y", self.y)
            .with("z", self.z)
            .into()
    }

    fn from_value(value: Value) -> CodecResult<Self> {
        let mut record = Record::unpack(value, "FxVector")?;
        Ok(Self {
            x: record.take("x")?,
            y: record.take("y")?,
            z: record.take("z")?,
        })
    }
}

impl Schematic for FxVector {
    fn schema() -> Schema {
        Schema::builder("FxVector")
            .field::<i32>("x", 0)
            .field::<i32>("y", 1)
            .field::<i32>("z", 2)
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_to_fixed() {
        assert_eq!(to_fixed(1.0), 0x0001_0000);
        assert_eq!(to_fixed(-1.0), -0x0001_0000);
        assert_eq!(to_fixed(0.5), 0x8000);
        // truncation toward zero
        assert_eq!(to_fixed(-0.000_001), 0);
    }

    #[test]
    fn test_narrowed_through_f32() {
        // 0.1 is not representable; the f32 rounding shows in the result
        let via_f32 = (f64::from(0.1f32) * FIXED_ONE) as i32;
        assert_eq!(to_fixed(0.1), via_f32);
    }

    #[test]
    fn test_encode_unit_x() {
        let bytes = nyaconv_codec::encode(&FxVector::from(Vector3::new(1.0, 0.0, 0.0))).unwrap();
        assert_eq!(bytes, vec![0, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
    }

    proptest! {
        #[test]
        fn test_fixed_roundtrip_error_bound(v in -30000.0f64..30000.0) {
            let back = from_fixed(to_fixed(v));
            // f32 narrowing plus one fixed-point step
            let bound = v.abs() * f64::from(f32::EPSILON) + 1.0 / FIXED_ONE;
            prop_assert!((back - v).abs() <= bound);
        }
    }
}
