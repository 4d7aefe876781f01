//! NYA exporter
//!
//! Flattens a [`Group`] and encodes it as a flat or smooth mesh group.

use std::fs;
use std::path::Path;

use serde::Serialize;
use tracing::{debug, info, warn};

use nyaconv_core::{Group, Model};

use crate::error::{ExportError, ExportResult};
use crate::flatten::Flattener;
use crate::mesh::{MeshKind, MeshLayout};
use crate::mesh_group::MeshGroup;
use crate::texture::Texture;

/// NYA export options
#[derive(Debug, Clone)]
pub struct NyaExportOptions {
    /// Flat or smooth meshes
    pub mesh_kind: MeshKind,
    /// Bake one atlas tile per UV footprint instead of writing the
    /// material textures as they are
    pub unwrap_textures: bool,
}

impl Default for NyaExportOptions {
    fn default() -> Self {
        Self {
            mesh_kind: MeshKind::Flat,
            unwrap_textures: true,
        }
    }
}

/// Summary of a finished export
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportReport {
    pub mesh_kind: MeshKind,
    pub mesh_count: usize,
    pub point_count: usize,
    pub polygon_count: usize,
    pub texture_count: usize,
    /// Encoded size of all texture records
    pub texture_bytes: usize,
    pub total_bytes: usize,
}

/// Encoded file plus its report
#[derive(Debug, Clone)]
pub struct NyaExport {
    pub bytes: Vec<u8>,
    pub report: ExportReport,
}

/// Group to NYA exporter
pub struct NyaExporter {
    options: NyaExportOptions,
}

impl NyaExporter {
    /// Create new exporter with default options
    pub fn new() -> Self {
        Self {
            options: NyaExportOptions::default(),
        }
    }

    /// Create exporter with custom options
    pub fn with_options(options: NyaExportOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &NyaExportOptions {
        &self.options
    }

    /// Flatten and encode a group. Nothing is produced when any face fails.
    pub fn export(&self, group: &Group) -> ExportResult<NyaExport> {
        info!(
            kind = %self.options.mesh_kind,
            unwrap_textures = self.options.unwrap_textures,
            models = group.models.len(),
            faces = group.face_count(),
            "Exporting mesh group"
        );

        group.validate()?;
        let references = reference_textures(group)?;

        match self.options.mesh_kind {
            MeshKind::Flat => self.encode(group, references, |flattener, model| flattener.flat_mesh(model)),
            MeshKind::Smooth => self.encode(group, references, |flattener, model| flattener.smooth_mesh(model)),
        }
    }

    /// Export and write to `path`. The file is only touched after a
    /// successful encode.
    pub fn export_to_file(&self, group: &Group, path: impl AsRef<Path>) -> ExportResult<ExportReport> {
        let path = path.as_ref();
        let export = self.export(group)?;

        fs::write(path, &export.bytes)
            .map_err(|e| ExportError::from(e).with_context(format!("writing {}", path.display())))?;
        info!(path = %path.display(), bytes = export.bytes.len(), "Wrote NYA file");

        Ok(export.report)
    }

    fn encode<M, F>(&self, group: &Group, references: Vec<Texture>, mut flatten: F) -> ExportResult<NyaExport>
    where
        M: MeshLayout,
        F: FnMut(&mut Flattener<'_>, &Model) -> ExportResult<M>,
    {
        let mut flattener = Flattener::new(group, &references, self.options.unwrap_textures);
        let meshes = group
            .models
            .iter()
            .map(|model| flatten(&mut flattener, model))
            .collect::<ExportResult<Vec<M>>>()?;
        let tiles = flattener.into_tiles();

        let textures = if self.options.unwrap_textures {
            info!(
                "UV mapping generated {} texture{}",
                tiles.len(),
                if tiles.len() == 1 { "" } else { "s" }
            );
            tiles
        } else {
            references
        };
        if i32::try_from(textures.len()).is_err() {
            return Err(ExportError::TooManyTextures {
                count: textures.len(),
            });
        }

        let texture_bytes = textures.iter().map(Texture::encoded_size).sum();
        info!("Texture data size {} bytes", texture_bytes);

        let mesh_group = MeshGroup::new(meshes, textures);
        let summary = mesh_group.summary();
        let bytes = nyaconv_codec::encode(&mesh_group)?;

        let report = ExportReport {
            mesh_kind: M::KIND,
            mesh_count: summary.meshes.len(),
            point_count: summary.point_count(),
            polygon_count: summary.polygon_count(),
            texture_count: summary.textures.len(),
            texture_bytes,
            total_bytes: bytes.len(),
        };
        debug!(?report, "Encoded mesh group");

        Ok(NyaExport { bytes, report })
    }
}

impl Default for NyaExporter {
    fn default() -> Self {
        Self::new()
    }
}

/// Load the textures of every textured material, in material name order.
///
/// Unreadable or empty textures are skipped with a warning; faces using
/// them fall back to the material color.
pub fn reference_textures(group: &Group) -> ExportResult<Vec<Texture>> {
    let mut textures = Vec::new();

    for (name, material) in group.materials.iter().filter(|(_, m)| m.is_textured()) {
        match Texture::from_material(name, material) {
            Ok(Some(texture)) if texture.is_empty() => {
                warn!(material = %name, "Texture has no pixels, using material color");
            }
            Ok(Some(texture)) => textures.push(texture),
            Ok(None) => {}
            Err(e @ (ExportError::Io(_) | ExportError::Image(_))) => {
                warn!(material = %name, error = %e, "Could not load texture, using material color");
            }
            Err(e) => return Err(e.with_context(format!("material '{}'", name))),
        }
    }

    debug!(count = textures.len(), "Loaded reference textures");
    Ok(textures)
}

