//! Wavefront OBJ import
//!
//! Builds a [`Group`] from an OBJ file and its MTL library using `tobj`.
//! Faces are kept as written (no triangulation); texture paths are resolved
//! against the directory of the OBJ file.

use std::ops::Range;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, warn};

use nyaconv_core::{Color, Face, Group, Material, Model, Vector3};

/// Name of the material used by faces without `usemtl`
pub const DEFAULT_MATERIAL: &str = "";

/// OBJ import options
#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// Multiplier applied to every vertex position
    pub scale: f64,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self { scale: 1.0 }
    }
}

/// Load one OBJ file into a group
pub fn load_obj(path: impl AsRef<Path>, options: &ImportOptions) -> Result<Group> {
    let path = path.as_ref();
    let load_options = tobj::LoadOptions {
        triangulate: false,
        single_index: false,
        ..Default::default()
    };

    let (models, materials) =
        tobj::load_obj(path, &load_options).with_context(|| format!("Failed to read {}", path.display()))?;

    let materials = match materials {
        Ok(materials) => materials,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "No usable material library, faces use the default material");
            Vec::new()
        }
    };

    let directory = path.parent().map(Path::to_path_buf).unwrap_or_default();
    let names: Vec<String> = materials.iter().map(|m| m.name.clone()).collect();

    let mut group: Group = models
        .iter()
        .map(|model| model_group(model, &names, options.scale))
        .collect();

    group
        .materials
        .insert(DEFAULT_MATERIAL.to_string(), Material::color(Color::WHITE));
    for material in &materials {
        group
            .materials
            .insert(material.name.clone(), convert_material(material, &directory));
    }

    debug!(
        path = %path.display(),
        models = group.models.len(),
        vertices = group.vertices.len(),
        materials = group.materials.len(),
        "Imported OBJ"
    );
    Ok(group)
}

/// Load several OBJ files and merge them, in order
pub fn load_all(paths: &[PathBuf], options: &ImportOptions) -> Result<Group> {
    let mut merged = Group::new();
    for path in paths {
        merged.merge(load_obj(path, options)?);
    }
    Ok(merged)
}

fn model_group(model: &tobj::Model, materials: &[String], scale: f64) -> Group {
    let mesh = &model.mesh;
    let material = mesh
        .material_id
        .and_then(|id| materials.get(id))
        .map_or(DEFAULT_MATERIAL, String::as_str);

    let mut group = Group::new();
    group.vertices = mesh
        .positions
        .chunks_exact(3)
        .map(|p| Vector3::from([p[0], p[1], p[2]]) * scale)
        .collect();
    group.normals = mesh
        .normals
        .chunks_exact(3)
        .map(|n| Vector3::from([n[0], n[1], n[2]]))
        .collect();
    group.uv = mesh
        .texcoords
        .chunks_exact(2)
        .map(|t| Vector3::new(f64::from(t[0]), f64::from(t[1]), 0.0))
        .collect();
    group
        .models
        .push(Model::new(model.name.clone()).with_faces(faces(mesh, material)));
    group
}

fn faces(mesh: &tobj::Mesh, material: &str) -> Vec<Face> {
    // no arities means every face is a triangle
    let arities: Vec<usize> = if mesh.face_arities.is_empty() {
        vec![3; mesh.indices.len() / 3]
    } else {
        mesh.face_arities.iter().map(|&a| a as usize).collect()
    };

    let mut start = 0;
    arities
        .into_iter()
        .map(|arity| {
            let range = start..start + arity;
            start += arity;

            let mut face = Face::new(material, indices(&mesh.indices, range.clone()));
            face.uv = indices(&mesh.texcoord_indices, range.clone());
            face.normals = indices(&mesh.normal_indices, range);
            face
        })
        .collect()
}

fn indices(pool: &[u32], range: Range<usize>) -> Vec<usize> {
    pool.get(range)
        .map(|slice| slice.iter().map(|&i| i as usize).collect())
        .unwrap_or_default()
}

fn convert_material(material: &tobj::Material, directory: &Path) -> Material {
    let color = material
        .diffuse
        .map_or(Color::WHITE, |[r, g, b]| Color::from_unit_rgb(r, g, b));

    match material.diffuse_texture.as_deref().map(str::trim) {
        Some(texture) if !texture.is_empty() => Material::texture_reference(color, directory.join(texture)),
        _ => Material::color(color),
    }
}
