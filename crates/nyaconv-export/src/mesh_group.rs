//! Root record of a NYA file

use byteorder::{BigEndian, ByteOrder};
use serde::Serialize;

use nyaconv_codec::{CodecError, CodecResult, Encodable, FieldType, Record, Schema, Schematic, Value};

use crate::error::{ExportError, ExportResult};
use crate::mesh::{Mesh, MeshKind, MeshLayout, SmoothMesh};
use crate::texture::Texture;

/// Meshes of one kind plus the textures their faces index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeshGroup<M> {
    pub meshes: Vec<M>,
    pub textures: Vec<Texture>,
}

impl<M> Default for MeshGroup<M> {
    fn default() -> Self {
        Self {
            meshes: Vec::new(),
            textures: Vec::new(),
        }
    }
}

impl<M: MeshLayout> MeshGroup<M> {
    pub fn new(meshes: Vec<M>, textures: Vec<Texture>) -> Self {
        Self { meshes, textures }
    }

    pub fn kind(&self) -> MeshKind {
        M::KIND
    }

    /// Counts and texture hashes
    pub fn summary(&self) -> MeshGroupSummary {
        MeshGroupSummary {
            kind: M::KIND,
            meshes: self
                .meshes
                .iter()
                .map(|m| {
                    let mesh = m.mesh();
                    MeshSummary {
                        points: mesh.point_count(),
                        polygons: mesh.polygon_count(),
                        textured_faces: mesh.face_flags.iter().filter(|f| f.has_texture()).count(),
                    }
                })
                .collect(),
            textures: self
                .textures
                .iter()
                .map(|t| TextureSummary {
                    width: t.width,
                    height: t.height,
                    crc32: t.content_hash(),
                })
                .collect(),
        }
    }
}

fn count(len: usize) -> i32 {
    i32::try_from(len).unwrap_or(i32::MAX)
}

impl<M: MeshLayout> Encodable for MeshGroup<M> {
    fn field_type() -> FieldType {
        FieldType::Composite(Self::schema)
    }

    fn to_value(&self) -> Value {
        Record::new("MeshGroup")
            .with_field("kind", &M::KIND)
            .with("mesh_count", count(self.meshes.len()))
            .with("texture_count", count(self.textures.len()))
            .with_field("meshes", &self.meshes)
            .with_field("textures", &self.textures)
            .into()
    }

    fn from_value(value: Value) -> CodecResult<Self> {
        let mut record = Record::unpack(value, "MeshGroup")?;
        let kind: MeshKind = record.take("kind")?;
        if kind != M::KIND {
            return Err(CodecError::TypeMismatch {
                expected: M::KIND.name(),
                found: kind.name(),
            }
            .in_field("MeshGroup", "kind"));
        }
        record.take::<i32>("mesh_count")?;
        record.take::<i32>("texture_count")?;

        Ok(Self {
            meshes: record.take("meshes")?,
            textures: record.take("textures")?,
        })
    }
}

impl<M: MeshLayout> Schematic for MeshGroup<M> {
    fn schema() -> Schema {
        Schema::builder("MeshGroup")
            .field::<MeshKind>("kind", 0)
            .field::<i32>("mesh_count", 1)
            .field::<i32>("texture_count", 2)
            .dynamic_array::<Vec<M>>("meshes", 3, "mesh_count")
            .dynamic_array::<Vec<Texture>>("textures", 4, "texture_count")
            .build()
    }
}

/// A decoded file of either kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnyMeshGroup {
    Flat(MeshGroup<Mesh>),
    Smooth(MeshGroup<SmoothMesh>),
}

impl AnyMeshGroup {
    /// Decode a file, dispatching on its leading kind discriminator
    pub fn decode(bytes: &[u8]) -> ExportResult<Self> {
        if bytes.len() < 4 {
            return Err(CodecError::UnexpectedEof {
                offset: bytes.len() as u64,
            }
            .into());
        }

        let found = BigEndian::read_i32(bytes);
        match MeshKind::from_discriminator(found) {
            Some(MeshKind::Flat) => Ok(AnyMeshGroup::Flat(nyaconv_codec::decode(bytes)?)),
            Some(MeshKind::Smooth) => Ok(AnyMeshGroup::Smooth(nyaconv_codec::decode(bytes)?)),
            None => Err(ExportError::UnexpectedMeshKind {
                expected: "flat or smooth",
                found,
            }),
        }
    }

    pub fn kind(&self) -> MeshKind {
        match self {
            AnyMeshGroup::Flat(_) => MeshKind::Flat,
            AnyMeshGroup::Smooth(_) => MeshKind::Smooth,
        }
    }

    /// Textures carried by the file
    pub fn textures(&self) -> &[Texture] {
        match self {
            AnyMeshGroup::Flat(group) => &group.textures,
            AnyMeshGroup::Smooth(group) => &group.textures,
        }
    }

    pub fn summary(&self) -> MeshGroupSummary {
        match self {
            AnyMeshGroup::Flat(group) => group.summary(),
            AnyMeshGroup::Smooth(group) => group.summary(),
        }
    }
}

/// Overview of a mesh group, for reports and inspection
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MeshGroupSummary {
    pub kind: MeshKind,
    pub meshes: Vec<MeshSummary>,
    pub textures: Vec<TextureSummary>,
}

impl MeshGroupSummary {
    /// Points across all meshes
    pub fn point_count(&self) -> usize {
        self.meshes.iter().map(|m| m.points).sum()
    }

    /// Polygons across all meshes
    pub fn polygon_count(&self) -> usize {
        self.meshes.iter().map(|m| m.polygons).sum()
    }
}

/// Counts for one mesh
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MeshSummary {
    pub points: usize,
    pub polygons: usize,
    pub textured_faces: usize,
}

/// Dimensions and content hash of one texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TextureSummary {
    pub width: u16,
    pub height: u16,
    pub crc32: u32,
}
