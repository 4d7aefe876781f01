//! nyaconv core library
//!
//! Geometric primitives, colors, materials and the mesh group model shared
//! by the codec, the export pipeline and the importers.

pub mod error;
pub mod geometry;
pub mod group;
pub mod material;
pub mod types;

pub use error::{Error, Result, ResultExt};
pub use geometry::{average_normal, face_normal};
pub use group::{Face, Group, Model};
pub use material::Material;
pub use types::*;

/// Re-export commonly used items
pub mod prelude {
    pub use crate::error::{Error, Result, ResultExt};
    pub use crate::geometry::{average_normal, face_normal};
    pub use crate::group::{Face, Group, Model};
    pub use crate::material::Material;
    pub use crate::types::*;
}
