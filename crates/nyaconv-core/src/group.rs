//! Mesh group input model
//!
//! A [`Group`] owns shared pools of vertices, normals and texture
//! coordinates plus a name to [`Material`] map. [`Model`]s hold faces whose
//! indices point into those pools.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result, ResultExt};
use crate::material::Material;
use crate::types::Vector3;

/// Polygon referencing the pools of its group
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Face {
    /// Indices into [`Group::vertices`]
    pub vertices: Vec<usize>,
    /// Indices into [`Group::normals`], may be empty
    pub normals: Vec<usize>,
    /// Indices into [`Group::uv`], may be empty
    pub uv: Vec<usize>,
    /// Key into [`Group::materials`]
    pub material: String,
    pub double_sided: bool,
    pub mesh_effect: bool,
    pub half_transparent: bool,
    pub flat: bool,
    pub half_bright: bool,
    /// Depth sort mode, 0..=3
    pub sort_mode: u8,
    pub wireframe: bool,
    pub no_light: bool,
}

impl Face {
    /// Create a face over the given vertex indices
    pub fn new(material: impl Into<String>, vertices: Vec<usize>) -> Self {
        Self {
            vertices,
            material: material.into(),
            ..Self::default()
        }
    }

    pub fn with_uv(mut self, uv: Vec<usize>) -> Self {
        self.uv = uv;
        self
    }

    pub fn with_normals(mut self, normals: Vec<usize>) -> Self {
        self.normals = normals;
        self
    }

    fn offset(&mut self, vertices: usize, normals: usize, uv: usize) {
        self.vertices.iter_mut().for_each(|i| *i += vertices);
        self.normals.iter_mut().for_each(|i| *i += normals);
        self.uv.iter_mut().for_each(|i| *i += uv);
    }
}

/// Named list of faces
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
    pub name: String,
    pub faces: Vec<Face>,
}

impl Model {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            faces: Vec::new(),
        }
    }

    pub fn with_faces(mut self, faces: Vec<Face>) -> Self {
        self.faces = faces;
        self
    }
}

/// Shared pools plus the models that index into them
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub vertices: Vec<Vector3>,
    pub normals: Vec<Vector3>,
    pub uv: Vec<Vector3>,
    pub materials: BTreeMap<String, Material>,
    pub models: Vec<Model>,
}

impl Group {
    pub fn new() -> Self {
        Self::default()
    }

    /// Vertex at `index`, or an `InvalidReference` error
    pub fn vertex(&self, index: usize) -> Result<Vector3> {
        lookup(&self.vertices, "vertex", index)
    }

    /// Normal at `index`, or an `InvalidReference` error
    pub fn normal(&self, index: usize) -> Result<Vector3> {
        lookup(&self.normals, "normal", index)
    }

    /// UV coordinate at `index`, or an `InvalidReference` error
    pub fn uv(&self, index: usize) -> Result<Vector3> {
        lookup(&self.uv, "uv", index)
    }

    /// Material by name
    pub fn material(&self, name: &str) -> Option<&Material> {
        self.materials.get(name)
    }

    /// Total number of faces over all models
    pub fn face_count(&self) -> usize {
        self.models.iter().map(|m| m.faces.len()).sum()
    }

    /// Sort models by name; faces keep their order
    pub fn sort_models_by_name(&mut self) {
        self.models.sort_by(|a, b| a.name.cmp(&b.name));
    }

    /// Check that every face index points inside its pool
    pub fn validate(&self) -> Result<()> {
        for model in &self.models {
            for (face_index, face) in model.faces.iter().enumerate() {
                self.validate_face(face)
                    .with_context(|| format!("face {} of model '{}'", face_index, model.name))?;
            }
        }
        Ok(())
    }

    fn validate_face(&self, face: &Face) -> Result<()> {
        check_indices(&face.vertices, self.vertices.len(), "vertex")?;
        check_indices(&face.normals, self.normals.len(), "normal")?;
        check_indices(&face.uv, self.uv.len(), "uv")
    }

    /// Append another group, offsetting its face indices past this group's pools.
    ///
    /// Materials already present keep their first definition; a different
    /// definition under the same name is reported and dropped.
    pub fn merge(&mut self, other: Group) {
        let vertex_start = self.vertices.len();
        let normal_start = self.normals.len();
        let uv_start = self.uv.len();

        self.vertices.extend(other.vertices);
        self.normals.extend(other.normals);
        self.uv.extend(other.uv);

        for (name, material) in other.materials {
            match self.materials.get(&name) {
                None => {
                    self.materials.insert(name, material);
                }
                Some(existing) if *existing != material => {
                    warn!(
                        "Different material with same name '{}' already exists, keeping the first occurrence",
                        name
                    );
                }
                Some(_) => {}
            }
        }

        let model_count = other.models.len();
        for mut model in other.models {
            for face in &mut model.faces {
                face.offset(vertex_start, normal_start, uv_start);
            }
            self.models.push(model);
        }

        debug!(
            models = model_count,
            vertex_offset = vertex_start,
            "Merged group"
        );
    }
}

impl FromIterator<Group> for Group {
    fn from_iter<I: IntoIterator<Item = Group>>(iter: I) -> Self {
        let mut merged = Group::new();
        for group in iter {
            merged.merge(group);
        }
        merged
    }
}

fn lookup(pool: &[Vector3], name: &'static str, index: usize) -> Result<Vector3> {
    pool.get(index)
        .copied()
        .ok_or_else(|| Error::invalid_reference(name, index, pool.len()))
}

fn check_indices(indices: &[usize], len: usize, name: &'static str) -> Result<()> {
    match indices.iter().find(|&&i| i >= len) {
        Some(&index) => Err(Error::invalid_reference(name, index, len)),
        None => Ok(()),
    }
}
