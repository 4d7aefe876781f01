//! Face materials
//!
//! A material is either a plain color, an embedded bitmap or a reference to
//! an image file on disk. Every variant carries a base color used when the
//! texture cannot be resolved.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::Color;

/// Material assigned to faces by name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Material {
    /// Flat colored material
    Color {
        color: Color,
    },
    /// Bitmap stored inline, row-major
    Texture {
        color: Color,
        width: u32,
        height: u32,
        pixels: Vec<Color>,
    },
    /// Bitmap loaded from an image file
    TextureReference {
        color: Color,
        path: PathBuf,
    },
}

impl Material {
    /// Flat colored material
    pub fn color(color: Color) -> Self {
        Material::Color { color }
    }

    /// Embedded bitmap; `pixels` must hold exactly `width * height` entries
    pub fn embedded(color: Color, width: u32, height: u32, pixels: Vec<Color>) -> Result<Self> {
        let expected = width as usize * height as usize;
        if pixels.len() != expected {
            return Err(Error::invalid_data(format!(
                "embedded texture {}x{} expects {} pixels, got {}",
                width,
                height,
                expected,
                pixels.len()
            )));
        }

        Ok(Material::Texture {
            color,
            width,
            height,
            pixels,
        })
    }

    /// Texture loaded from `path` at export time
    pub fn texture_reference(color: Color, path: impl Into<PathBuf>) -> Self {
        Material::TextureReference {
            color,
            path: path.into(),
        }
    }

    /// Color used when the face is not textured
    pub fn base_color(&self) -> Color {
        match self {
            Material::Color { color }
            | Material::Texture { color, .. }
            | Material::TextureReference { color, .. } => *color,
        }
    }

    /// Embedded bitmap or texture path
    pub fn is_textured(&self) -> bool {
        !matches!(self, Material::Color { .. })
    }
}

impl Default for Material {
    fn default() -> Self {
        Material::color(Color::WHITE)
    }
}
