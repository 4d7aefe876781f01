//! Mesh flattening
//!
//! Converts the faces of a [`Group`] into quads over a per-model
//! deduplicated point list, resolving face flags, textures and clipping
//! normals on the way. Atlas tiles baked for textured faces are shared by
//! every model flattened with the same [`Flattener`].

use tracing::{debug, trace, warn};

use nyaconv_core::{average_normal, face_normal, Error, Face, Group, Material, Model, Vector3};

use crate::error::{ExportError, ExportResult};
use crate::face_flags::FaceFlags;
use crate::fixed::FxVector;
use crate::mesh::{Mesh, SmoothMesh};
use crate::polygon::Polygon;
use crate::texture::Texture;

/// Largest number of points a single mesh can address with `i16` indices
pub const MAX_POINTS: usize = i16::MAX as usize;

/// Append-only normal buffer.
///
/// Starts as a copy of the group's normals; normals synthesized for faces
/// without vertex normals are appended and referenced by index.
#[derive(Debug, Clone, Default)]
pub struct NormalPool {
    normals: Vec<Vector3>,
}

impl NormalPool {
    pub fn new(normals: Vec<Vector3>) -> Self {
        Self { normals }
    }

    /// Normal at `index`, or an `InvalidReference` error
    pub fn get(&self, index: usize) -> ExportResult<Vector3> {
        self.normals
            .get(index)
            .copied()
            .ok_or_else(|| Error::invalid_reference("normal", index, self.normals.len()).into())
    }

    /// Append a normal and return its index
    pub fn push(&mut self, normal: Vector3) -> usize {
        self.normals.push(normal);
        self.normals.len() - 1
    }

    pub fn len(&self) -> usize {
        self.normals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.normals.is_empty()
    }
}

/// Flattened face
#[derive(Debug, Clone, PartialEq)]
pub struct FlatFace {
    pub flags: FaceFlags,
    pub polygon: Polygon,
    /// Normal pool index for each corner
    pub corner_normals: [usize; 4],
}

/// One model after flattening, before conversion to fixed point
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlatModel {
    pub name: String,
    pub points: Vec<Vector3>,
    pub faces: Vec<FlatFace>,
}

impl FlatModel {
    /// Flat mesh record of this model
    pub fn to_mesh(&self) -> Mesh {
        Mesh {
            points: self.points.iter().copied().map(FxVector::from).collect(),
            polygons: self.faces.iter().map(|f| f.polygon).collect(),
            face_flags: self.faces.iter().map(|f| f.flags).collect(),
        }
    }

    /// Mesh with one normal per point. Where faces disagree on a shared
    /// point, the last face wins; unreferenced points keep a zero normal.
    pub fn to_smooth_mesh(&self, pool: &NormalPool) -> ExportResult<SmoothMesh> {
        let mut normals = vec![FxVector::default(); self.points.len()];

        for face in &self.faces {
            for (&vertex, &normal) in face.polygon.vertices.iter().zip(&face.corner_normals) {
                let slot = usize::try_from(vertex)
                    .ok()
                    .and_then(|i| normals.get_mut(i))
                    .ok_or_else(|| {
                        ExportError::from(Error::invalid_reference(
                            "point",
                            usize::from(vertex.unsigned_abs()),
                            self.points.len(),
                        ))
                    })?;
                *slot = FxVector::from(pool.get(normal)?.normalized());
            }
        }

        Ok(SmoothMesh {
            mesh: self.to_mesh(),
            normals,
        })
    }
}

/// Per-export flattening state
pub struct Flattener<'a> {
    group: &'a Group,
    references: &'a [Texture],
    unwrap_textures: bool,
    normals: NormalPool,
    tiles: Vec<Texture>,
}

impl<'a> Flattener<'a> {
    /// `references` are the textures loaded from the group's materials,
    /// looked up by material name. With `unwrap_textures` every textured
    /// face gets its own atlas tile; otherwise faces index `references`.
    pub fn new(group: &'a Group, references: &'a [Texture], unwrap_textures: bool) -> Self {
        Self {
            group,
            references,
            unwrap_textures,
            normals: NormalPool::new(group.normals.clone()),
            tiles: Vec::new(),
        }
    }

    /// Normal pool including synthesized normals
    pub fn normals(&self) -> &NormalPool {
        &self.normals
    }

    /// Atlas tiles baked so far
    pub fn tiles(&self) -> &[Texture] {
        &self.tiles
    }

    /// Atlas tiles baked so far
    pub fn into_tiles(self) -> Vec<Texture> {
        self.tiles
    }

    /// Flatten `model` into a flat mesh record
    pub fn flat_mesh(&mut self, model: &Model) -> ExportResult<Mesh> {
        Ok(self.flatten_model(model)?.to_mesh())
    }

    /// Flatten `model` into a smooth mesh record with per-point normals
    pub fn smooth_mesh(&mut self, model: &Model) -> ExportResult<SmoothMesh> {
        let flat = self.flatten_model(model)?;
        flat.to_smooth_mesh(&self.normals)
    }

    /// Flatten every face of a model, in order
    pub fn flatten_model(&mut self, model: &Model) -> ExportResult<FlatModel> {
        let mut flat = FlatModel {
            name: model.name.clone(),
            points: Vec::new(),
            faces: Vec::with_capacity(model.faces.len()),
        };

        for (index, face) in model.faces.iter().enumerate() {
            let face = self.flatten_face(&model.name, index, face, &mut flat.points)?;
            flat.faces.push(face);
        }

        debug!(
            model = %model.name,
            points = flat.points.len(),
            polygons = flat.faces.len(),
            "Flattened model"
        );
        Ok(flat)
    }

    fn flatten_face(
        &mut self,
        model: &str,
        index: usize,
        face: &Face,
        points: &mut Vec<Vector3>,
    ) -> ExportResult<FlatFace> {
        let material = self.group.material(&face.material);
        let mut flags = face_flags(face, material);
        if material.is_none() {
            warn!(
                model,
                face = index,
                material = %face.material,
                "Material not found, using default color"
            );
        }

        let mut vertices = to_quad(&face.vertices).ok_or_else(|| ExportError::UnsupportedTopology {
            model: model.to_string(),
            face: index,
            vertices: face.vertices.len(),
        })?;
        let mut normals = if face.normals.is_empty() {
            None
        } else {
            to_quad(&fit_to_count(&face.normals, face.vertices.len()))
        };
        let uv = face
            .uv
            .get(..face.vertices.len())
            .and_then(to_quad);

        if let Some(material) = material.filter(|_| flags.has_texture()) {
            match self.resolve_texture(model, index, face, uv)? {
                Some((texture_id, start)) => {
                    vertices.rotate_left(start);
                    if let Some(normals) = normals.as_mut() {
                        normals.rotate_left(start);
                    }
                    flags.texture_id = texture_id;
                }
                None => flags.use_color(material.base_color().to_abgr555()),
            }
        }

        let mut positions = [Vector3::ZERO; 4];
        for (position, &vertex) in positions.iter_mut().zip(&vertices) {
            *position = self.group.vertex(vertex)?;
        }

        let corner_normals = match normals {
            Some(normals) => normals,
            None => [self.normals.push(face_normal(&positions)); 4],
        };
        let mut clipping = Vec::with_capacity(4);
        for &normal in &corner_normals {
            clipping.push(self.normals.get(normal)?);
        }

        let mut polygon = Polygon {
            normal: FxVector::from(average_normal(clipping)),
            vertices: [0; 4],
        };
        for (slot, position) in polygon.vertices.iter_mut().zip(positions) {
            *slot = local_point(points, position, model)?;
        }

        trace!(model, face = index, vertices = ?polygon.vertices, "Flattened face");

        Ok(FlatFace {
            flags,
            polygon,
            corner_normals,
        })
    }

    /// Texture id for a textured face and the corner the quad must start
    /// at, or `None` when the face has to fall back to its flat color
    fn resolve_texture(
        &mut self,
        model: &str,
        index: usize,
        face: &Face,
        uv: Option<[usize; 4]>,
    ) -> ExportResult<Option<(i32, usize)>> {
        let references = self.references;
        let reference = references
            .iter()
            .position(|texture| texture.source == face.material);

        let Some(reference) = reference else {
            warn!(
                model,
                face = index,
                material = %face.material,
                "Texture not available, using material color"
            );
            return Ok(None);
        };

        if !self.unwrap_textures {
            return texture_id(reference).map(|id| Some((id, 0)));
        }

        let Some(uv) = uv else {
            warn!(
                model,
                face = index,
                material = %face.material,
                "Face has no texture coordinates, using material color"
            );
            return Ok(None);
        };

        let mut coords = [Vector3::ZERO; 4];
        for (coord, &i) in coords.iter_mut().zip(&uv) {
            *coord = self.group.uv(i)?;
        }
        let start = smallest_uv_corner(&coords);
        coords.rotate_left(start);

        let tile = self.tile_for(&references[reference], &coords)?;
        texture_id(tile).map(|id| Some((id, start)))
    }

    /// Index of the atlas tile for a UV footprint, baking it on first use
    fn tile_for(&mut self, source: &Texture, uv: &[Vector3; 4]) -> ExportResult<usize> {
        if let Some(existing) = self.tiles.iter().position(|t| t.is_tile_of(&source.source, uv)) {
            return Ok(existing);
        }

        let tile = source.bake_tile(uv)?;
        debug!(
            source = %source.source,
            name = %tile.name,
            width = tile.width,
            height = tile.height,
            "Baked atlas tile"
        );
        self.tiles.push(tile);
        Ok(self.tiles.len() - 1)
    }
}

fn face_flags(face: &Face, material: Option<&Material>) -> FaceFlags {
    let mut flags = FaceFlags::default();
    flags.set_double_sided(face.double_sided);
    flags.set_mesh_effect(face.mesh_effect);
    flags.set_half_transparent(face.half_transparent);
    flags.set_flat(face.flat);
    // sort mode shares bit 2 with half-bright, which is applied last
    flags.set_sort_mode(face.sort_mode);
    flags.set_half_bright(face.half_bright);

    match material {
        Some(material) if material.is_textured() => flags.set_has_texture(true),
        Some(material) => flags.base_color = material.base_color().to_abgr555(),
        None => {}
    }
    flags
}

/// Triangles repeat their last index; anything other than 3 or 4 indices is rejected
pub fn to_quad(indices: &[usize]) -> Option<[usize; 4]> {
    match *indices {
        [a, b, c] => Some([a, b, c, c]),
        [a, b, c, d] => Some([a, b, c, d]),
        _ => None,
    }
}

/// Pad with the last index or truncate to `count` entries
fn fit_to_count(indices: &[usize], count: usize) -> Vec<usize> {
    let last = indices.last().copied().unwrap_or_default();
    indices
        .iter()
        .copied()
        .chain(std::iter::repeat(last))
        .take(count)
        .collect()
}

/// Corner holding the smallest UV. Ties go to the later corner.
pub fn smallest_uv_corner(uv: &[Vector3; 4]) -> usize {
    let mut start = 0;
    let mut smallest = Vector3::new(f64::MAX, f64::MAX, 0.0);
    for (i, coord) in uv.iter().enumerate() {
        if smallest.x >= coord.x && smallest.y >= coord.y {
            start = i;
            smallest = *coord;
        }
    }
    start
}

fn texture_id(index: usize) -> ExportResult<i32> {
    i32::try_from(index).map_err(|_| ExportError::TooManyTextures { count: index + 1 })
}

/// Index of `position` in the model's point list, appending it when new
fn local_point(points: &mut Vec<Vector3>, position: Vector3, model: &str) -> ExportResult<i16> {
    let index = match points.iter().position(|p| p.is_colocated(&position)) {
        Some(existing) => existing,
        None => {
            points.push(position);
            points.len() - 1
        }
    };

    if points.len() > MAX_POINTS {
        return Err(ExportError::TooManyPoints {
            model: model.to_string(),
            max: MAX_POINTS,
        });
    }
    Ok(index as i16)
}
