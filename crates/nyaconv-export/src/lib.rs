//! NYA export pipeline
//!
//! Flattens mesh groups into quads over deduplicated points, bakes UV atlas
//! tiles and encodes the result in the Sega Saturn NYA mesh layout:
//! - fixed-point vectors, polygons and face flags ([`fixed`], [`polygon`], [`face_flags`])
//! - textures and tile baking ([`texture`])
//! - flat and smooth mesh records ([`mesh`], [`mesh_group`])
//! - the flattening pipeline and exporter ([`flatten`], [`exporter`])

pub mod error;
pub mod exporter;
pub mod face_flags;
pub mod fixed;
pub mod flatten;
pub mod mesh;
pub mod mesh_group;
pub mod polygon;
pub mod texture;

pub use error::{ExportError, ExportResult};
pub use exporter::{reference_textures, ExportReport, NyaExport, NyaExportOptions, NyaExporter};
pub use face_flags::FaceFlags;
pub use fixed::{from_fixed, to_fixed, FxVector, FIXED_ONE};
pub use flatten::{FlatFace, FlatModel, Flattener, NormalPool, MAX_POINTS};
pub use mesh::{Mesh, MeshKind, MeshLayout, SmoothMesh};
pub use mesh_group::{AnyMeshGroup, MeshGroup, MeshGroupSummary, MeshSummary, TextureSummary};
pub use polygon::Polygon;
pub use texture::Texture;
