//! 16-bit textures and UV tile baking
//!
//! Textures hold row-major ABGR1555 samples. Reference textures come from
//! material bitmaps; atlas tiles are baked from a reference texture by
//! sampling it across one quad's UV footprint.

use std::collections::hash_map::RandomState;
use std::hash::{BuildHasher, Hash, Hasher};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use image::RgbaImage;
use tracing::{debug, trace};

use nyaconv_codec::{CodecResult, Encodable, FieldType, Record, Schema, Schematic, Value};
use nyaconv_core::{Color, Material, Vector3};

use crate::error::{ExportError, ExportResult};

/// Tile widths are rounded to a multiple of this
const TILE_WIDTH_STEP: f64 = 8.0;

/// Texture as written to the output file.
///
/// Equality and hashing consider only the dimensions and samples; `name`,
/// `source` and `footprint` are bookkeeping and never serialized.
#[derive(Debug, Clone, Default)]
pub struct Texture {
    pub width: u16,
    pub height: u16,
    pub data: Vec<u16>,
    pub name: String,
    /// Material the texture was loaded or baked from
    pub source: String,
    /// UV coordinates of the quad an atlas tile was baked for
    pub footprint: Option<[Vector3; 4]>,
}

impl Texture {
    /// Texture from packed samples; `data` must hold `width * height` entries
    pub fn new(name: impl Into<String>, width: u16, height: u16, data: Vec<u16>) -> ExportResult<Self> {
        let name = name.into();
        let expected = usize::from(width) * usize::from(height);
        if data.len() != expected {
            return Err(ExportError::InvalidTextureData {
                name,
                expected,
                actual: data.len(),
            });
        }

        Ok(Self {
            width,
            height,
            data,
            source: name.clone(),
            name,
            footprint: None,
        })
    }

    /// Pack a color bitmap; pixels with alpha below 0x80 become transparent
    pub fn from_colors(name: impl Into<String>, width: u32, height: u32, pixels: &[Color]) -> ExportResult<Self> {
        let name = name.into();
        let (Ok(w), Ok(h)) = (u16::try_from(width), u16::try_from(height)) else {
            return Err(ExportError::TextureTooLarge {
                name,
                width: u64::from(width),
                height: u64::from(height),
            });
        };
        Self::new(name, w, h, pixels.iter().map(Color::to_texel).collect())
    }

    /// Texture from an RGBA image; alpha below `0x80` is transparent
    pub fn from_image(name: impl Into<String>, image: &RgbaImage) -> ExportResult<Self> {
        let pixels: Vec<Color> = image
            .pixels()
            .map(|p| Color::rgba(p[0], p[1], p[2], p[3]))
            .collect();
        Self::from_colors(name, image.width(), image.height(), &pixels)
    }

    /// Load an image file
    pub fn load(name: impl Into<String>, path: impl AsRef<Path>) -> ExportResult<Self> {
        let path = path.as_ref();
        let image = image::open(path)?.to_rgba8();
        debug!(
            path = %path.display(),
            width = image.width(),
            height = image.height(),
            "Loaded texture"
        );
        Self::from_image(name, &image)
    }

    /// Texture for a material, `None` for plain colors
    pub fn from_material(name: &str, material: &Material) -> ExportResult<Option<Self>> {
        match material {
            Material::Color { .. } => Ok(None),
            Material::Texture {
                width,
                height,
                pixels,
                ..
            } => Self::from_colors(name, *width, *height, pixels).map(Some),
            Material::TextureReference { path, .. } => Self::load(name, path).map(Some),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Number of samples, `width * height`
    pub fn data_length(&self) -> usize {
        usize::from(self.width) * usize::from(self.height)
    }

    /// Encoded size: two dimensions plus the samples
    pub fn encoded_size(&self) -> usize {
        4 + self.data.len() * 2
    }

    /// CRC-32 over dimensions and samples
    pub fn content_hash(&self) -> u32 {
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(&self.width.to_be_bytes());
        hasher.update(&self.height.to_be_bytes());
        for sample in &self.data {
            hasher.update(&sample.to_be_bytes());
        }
        hasher.finalize()
    }

    /// Whether this is the tile baked from `source` for the given UV corners
    pub fn is_tile_of(&self, source: &str, uv: &[Vector3; 4]) -> bool {
        self.source == source
            && self.footprint.is_some_and(|footprint| {
                footprint
                    .iter()
                    .zip(uv)
                    .all(|(a, b)| a.distance(b) <= f64::EPSILON)
            })
    }

    /// Bake the region of this texture covered by a quad's UV corners.
    ///
    /// Corners are expected in quad order starting at the smallest UV. The
    /// tile is sampled from the top row down; sample positions wrap around
    /// the source edges.
    pub fn bake_tile(&self, uv: &[Vector3; 4]) -> ExportResult<Texture> {
        let (min, max) = uv_bounds(uv);
        let source_w = f64::from(self.width);
        let source_h = f64::from(self.height);

        let width = ((max.x - min.x).abs() * source_w / TILE_WIDTH_STEP).round_ties_even() * TILE_WIDTH_STEP;
        let width = width.max(TILE_WIDTH_STEP);
        let height = ((max.y - min.y).abs() * source_h).max(1.0);

        let name = format!("{}+{}", self.source, tile_suffix());
        if !(width <= f64::from(u16::MAX) && height <= f64::from(u16::MAX)) {
            return Err(ExportError::TextureTooLarge {
                name,
                width: width as u64,
                height: height as u64,
            });
        }
        let (width, height) = (width as u16, height as u16);

        let data = if self.is_empty() {
            vec![0; usize::from(width) * usize::from(height)]
        } else {
            self.sample_region(uv, usize::from(width), usize::from(height))
        };

        trace!(name = %name, width, height, "Baked UV tile");

        Ok(Texture {
            width,
            height,
            data,
            name,
            source: self.source.clone(),
            footprint: Some(*uv),
        })
    }

    fn sample_region(&self, uv: &[Vector3; 4], width: usize, height: usize) -> Vec<u16> {
        let source_w = i64::from(self.width);
        let source_h = i64::from(self.height);
        let top_direction = uv[1] - uv[0];
        let bottom_direction = uv[2] - uv[3];

        let mut data = Vec::with_capacity(width * height);
        for y in (0..height).rev() {
            let portion_y = (y + 1) as f64 / height as f64;

            for x in 0..width {
                let portion_x = (x + 1) as f64 / width as f64;

                let top = uv[0] + top_direction * portion_x;
                let bottom = uv[3] + bottom_direction * portion_x;
                let location = bottom + (top - bottom) * portion_y;

                let sample_x = (location.x * (source_w - 1) as f64) as i64;
                let sample_y = (source_h - 1) - (location.y * (source_h - 1) as f64) as i64;
                let index = sample_y.rem_euclid(source_h) * source_w + sample_x.rem_euclid(source_w);

                data.push(
                    usize::try_from(index)
                        .ok()
                        .and_then(|i| self.data.get(i))
                        .copied()
                        .unwrap_or(0),
                );
            }
        }
        data
    }

    /// Expand the samples back to an RGBA image
    pub fn to_image(&self) -> Option<RgbaImage> {
        let pixels = self
            .data
            .iter()
            .flat_map(|&sample| {
                let channel = |shift: u16| (((sample >> shift) & 0x1F) << 3) as u8;
                let alpha = if sample & 0x8000 != 0 { 0xFF } else { 0x00 };
                [channel(0), channel(5), channel(10), alpha]
            })
            .collect();
        RgbaImage::from_raw(u32::from(self.width), u32::from(self.height), pixels)
    }
}

impl PartialEq for Texture {
    fn eq(&self, other: &Self) -> bool {
        self.width == other.width && self.height == other.height && self.data == other.data
    }
}

impl Eq for Texture {}

impl Hash for Texture {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u32(self.content_hash());
    }
}

fn uv_bounds(uv: &[Vector3; 4]) -> (Vector3, Vector3) {
    uv.iter().fold(
        (
            Vector3::new(f64::MAX, f64::MAX, 0.0),
            Vector3::new(f64::MIN, f64::MIN, 0.0),
        ),
        |(min, max), p| {
            (
                Vector3::new(min.x.min(p.x), min.y.min(p.y), 0.0),
                Vector3::new(max.x.max(p.x), max.y.max(p.y), 0.0),
            )
        },
    )
}

/// Random suffix keeping baked tile names distinct
fn tile_suffix() -> String {
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let seed = COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("{:016x}", RandomState::new().hash_one(seed))
}

impl Encodable for Texture {
    fn field_type() -> FieldType {
        FieldType::Composite(Self::schema)
    }

    fn to_value(&self) -> Value {
        Record::new("Texture")
            .with("width", self.width)
            .with("height", self.height)
            .with_field("data", &self.data)
            .with_field("name", &self.name)
            .into()
    }

    fn from_value(value: Value) -> CodecResult<Self> {
        let mut record = Record::unpack(value, "Texture")?;
        Ok(Self {
            width: record.take("width")?,
            height: record.take("height")?,
            data: record.take("data")?,
            ..Self::default()
        })
    }
}

impl Schematic for Texture {
    fn schema() -> Schema {
        Schema::builder("Texture")
            .field::<u16>("width", 0)
            .field::<u16>("height", 1)
            .dynamic_array::<Vec<u16>>("data", 2, "data_length")
            .derived("data_length", |frame| {
                Some(frame.integer("width")? * frame.integer("height")?)
            })
            .untagged::<String>("name")
            .build()
    }
}
