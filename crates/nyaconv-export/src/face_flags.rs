//! Per-face flags, color and texture slot

use nyaconv_codec::{CodecResult, Encodable, FieldType, Record, Schema, Schematic, Value};

/// Face carries a texture; `texture_id` is valid
pub const HAS_TEXTURE: u8 = 0x80;
/// Mesh (screen-door) transparency
pub const MESH_EFFECT: u8 = 0x40;
pub const DOUBLE_SIDED: u8 = 0x20;
pub const HALF_TRANSPARENT: u8 = 0x10;
/// Flat shaded
pub const FLAT: u8 = 0x08;
pub const HALF_BRIGHT: u8 = 0x04;
/// Bits read back as the depth sort mode
pub const SORT_MODE_MASK: u8 = 0x03;

/// Default base color, opaque black in ABGR1555
pub const DEFAULT_BASE_COLOR: u16 = 0x8000;

/// Face attributes as written next to each polygon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FaceFlags {
    pub flags: u8,
    pub reserved: u8,
    /// ABGR1555 color used when the face is not textured
    pub base_color: u16,
    pub texture_id: i32,
}

impl Default for FaceFlags {
    fn default() -> Self {
        Self {
            flags: 0,
            reserved: 0,
            base_color: DEFAULT_BASE_COLOR,
            texture_id: 0,
        }
    }
}

impl FaceFlags {
    fn bit(&self, mask: u8) -> bool {
        self.flags & mask != 0
    }

    fn set_bit(&mut self, mask: u8, on: bool) {
        if on {
            self.flags |= mask;
        } else {
            self.flags &= !mask;
        }
    }

    pub fn has_texture(&self) -> bool {
        self.bit(HAS_TEXTURE)
    }

    pub fn set_has_texture(&mut self, on: bool) {
        self.set_bit(HAS_TEXTURE, on);
    }

    pub fn has_mesh_effect(&self) -> bool {
        self.bit(MESH_EFFECT)
    }

    pub fn set_mesh_effect(&mut self, on: bool) {
        self.set_bit(MESH_EFFECT, on);
    }

    pub fn is_double_sided(&self) -> bool {
        self.bit(DOUBLE_SIDED)
    }

    pub fn set_double_sided(&mut self, on: bool) {
        self.set_bit(DOUBLE_SIDED, on);
    }

    pub fn is_half_transparent(&self) -> bool {
        self.bit(HALF_TRANSPARENT)
    }

    pub fn set_half_transparent(&mut self, on: bool) {
        self.set_bit(HALF_TRANSPARENT, on);
    }

    pub fn is_flat(&self) -> bool {
        self.bit(FLAT)
    }

    pub fn set_flat(&mut self, on: bool) {
        self.set_bit(FLAT, on);
    }

    pub fn is_half_bright(&self) -> bool {
        self.bit(HALF_BRIGHT)
    }

    pub fn set_half_bright(&mut self, on: bool) {
        self.set_bit(HALF_BRIGHT, on);
    }

    /// Raw bits 0-1 of the flags byte
    pub fn sort_mode(&self) -> u8 {
        self.flags & SORT_MODE_MASK
    }

    /// Clears bits 0-1 and ORs the low two bits of `mode` in one bit up.
    ///
    /// This is the legacy NYA layout: modes 1, 2 and 3 emit `0x02`, `0x04` and
    /// `0x06`, and bit 2 is shared with [`HALF_BRIGHT`]. The setter does not
    /// round-trip through [`sort_mode`](Self::sort_mode).
    pub fn set_sort_mode(&mut self, mode: u8) {
        self.flags = (self.flags & !SORT_MODE_MASK) | ((mode & SORT_MODE_MASK) << 1);
    }

    /// Drop the texture and fall back to a flat color
    pub fn use_color(&mut self, base_color: u16) {
        self.set_has_texture(false);
        self.base_color = base_color;
        self.texture_id = 0;
    }
}

impl Encodable for FaceFlags {
    fn field_type() -> FieldType {
        FieldType::Composite(Self::schema)
    }

    fn to_value(&self) -> Value {
        Record::new("FaceFlags")
            .with("flags", self.flags)
            .with("reserved", self.reserved)
            .with("base_color", self.base_color)
            .with("texture_id", self.texture_id)
            .into()
    }

    fn from_value(value: Value) -> CodecResult<Self> {
        let mut record = Record::unpack(value, "FaceFlags")?;
        Ok(Self {
            flags: record.take("flags")?,
            reserved: record.take("reserved")?,
            base_color: record.take("base_color")?,
            texture_id: record.take("texture_id")?,
        })
    }
}

impl Schematic for FaceFlags {
    fn schema() -> Schema {
        Schema::builder("FaceFlags")
            .field::<u8>("flags", 0)
            .field::<u8>("reserved", 1)
            .field::<u16>("base_color", 2)
            .field::<i32>("texture_id", 3)
            .build()
    }
}
