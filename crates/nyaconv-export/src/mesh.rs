//! Flat and smooth mesh records
//!
//! Field order on disk: point count, polygon count, points, polygons, face
//! flags and, for smooth meshes, one normal per point.

use nyaconv_codec::{CodecResult, Encodable, FieldType, Record, Schema, Schematic, Value};

use crate::face_flags::FaceFlags;
use crate::fixed::FxVector;
use crate::polygon::Polygon;

/// Kind of mesh stored in a file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MeshKind {
    /// One clipping normal per polygon
    #[default]
    Flat,
    /// Additional per-point normals
    Smooth,
}

impl MeshKind {
    /// Discriminator written at the start of a file
    pub fn discriminator(self) -> i32 {
        match self {
            MeshKind::Flat => 0,
            MeshKind::Smooth => 1,
        }
    }

    /// Kind for a file discriminator, `None` when unknown
    pub fn from_discriminator(value: i32) -> Option<Self> {
        match value {
            0 => Some(MeshKind::Flat),
            1 => Some(MeshKind::Smooth),
            _ => None,
        }
    }

    /// Lowercase name used by the CLI and reports
    pub fn name(self) -> &'static str {
        match self {
            MeshKind::Flat => "flat",
            MeshKind::Smooth => "smooth",
        }
    }
}

nyaconv_codec::impl_enum!(MeshKind as i32 { Flat = 0, Smooth = 1 });

impl std::fmt::Display for MeshKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Mesh record type usable inside a [`MeshGroup`](crate::MeshGroup)
pub trait MeshLayout: Schematic {
    const KIND: MeshKind;

    fn mesh(&self) -> &Mesh;
}

/// Deduplicated points with one quad and one face-flags entry per polygon
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mesh {
    pub points: Vec<FxVector>,
    pub polygons: Vec<Polygon>,
    pub face_flags: Vec<FaceFlags>,
}

impl Mesh {
    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    pub fn polygon_count(&self) -> usize {
        self.polygons.len()
    }

    fn record(&self, type_name: &'static str) -> Record {
        Record::new(type_name)
            .with("point_count", count(self.points.len()))
            .with("polygon_count", count(self.polygons.len()))
            .with_field("points", &self.points)
            .with_field("polygons", &self.polygons)
            .with_field("face_flags", &self.face_flags)
    }

    fn from_record(record: &mut Record) -> CodecResult<Self> {
        // counts are implied by the array lengths
        record.take::<i32>("point_count")?;
        record.take::<i32>("polygon_count")?;
        Ok(Self {
            points: record.take("points")?,
            polygons: record.take("polygons")?,
            face_flags: record.take("face_flags")?,
        })
    }
}

fn count(len: usize) -> i32 {
    i32::try_from(len).unwrap_or(i32::MAX)
}

impl Encodable for Mesh {
    fn field_type() -> FieldType {
        FieldType::Composite(Self::schema)
    }

    fn to_value(&self) -> Value {
        self.record("Mesh").into()
    }

    fn from_value(value: Value) -> CodecResult<Self> {
        Self::from_record(&mut Record::unpack(value, "Mesh")?)
    }
}

impl Schematic for Mesh {
    fn schema() -> Schema {
        Schema::builder("Mesh")
            .field::<i32>("point_count", 0)
            .field::<i32>("polygon_count", 1)
            .dynamic_array::<Vec<FxVector>>("points", 2, "point_count")
            .dynamic_array::<Vec<Polygon>>("polygons", 3, "polygon_count")
            .dynamic_array::<Vec<FaceFlags>>("face_flags", 4, "polygon_count")
            .build()
    }
}

impl MeshLayout for Mesh {
    const KIND: MeshKind = MeshKind::Flat;

    fn mesh(&self) -> &Mesh {
        self
    }
}

/// [`Mesh`] with one normal per point
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SmoothMesh {
    pub mesh: Mesh,
    pub normals: Vec<FxVector>,
}

impl Encodable for SmoothMesh {
    fn field_type() -> FieldType {
        FieldType::Composite(Self::schema)
    }

    fn to_value(&self) -> Value {
        self.mesh
            .record("SmoothMesh")
            .with_field("normals", &self.normals)
            .into()
    }

    fn from_value(value: Value) -> CodecResult<Self> {
        let mut record = Record::unpack(value, "SmoothMesh")?;
        let mesh = Mesh::from_record(&mut record)?;
        Ok(Self {
            mesh,
            normals: record.take("normals")?,
        })
    }
}

impl Schematic for SmoothMesh {
    fn schema() -> Schema {
        Schema::builder("SmoothMesh")
            .inherit(Mesh::schema())
            .dynamic_array::<Vec<FxVector>>("normals", 5, "point_count")
            .build()
    }
}

impl MeshLayout for SmoothMesh {
    const KIND: MeshKind = MeshKind::Smooth;

    fn mesh(&self) -> &Mesh {
        &self.mesh
    }
}
