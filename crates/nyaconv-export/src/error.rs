//! Export errors

use thiserror::Error;

use nyaconv_codec::CodecError;

/// Errors that abort an export. Nothing is written when one is raised.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Encoding failed: {0}")]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Core(#[from] nyaconv_core::Error),

    #[error("Face {face} of model '{model}' has {vertices} vertices, only triangles and quads are supported")]
    UnsupportedTopology {
        model: String,
        face: usize,
        vertices: usize,
    },

    #[error("Model '{model}' has more than {max} distinct points")]
    TooManyPoints { model: String, max: usize },

    #[error("Too many textures: {count}")]
    TooManyTextures { count: usize },

    #[error("Texture '{name}' is too large: {width}x{height} (max 65535x65535)")]
    TextureTooLarge {
        name: String,
        width: u64,
        height: u64,
    },

    #[error("Texture '{name}' holds {actual} samples, expected {expected}")]
    InvalidTextureData {
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("Expected a {expected} mesh group, found kind {found}")]
    UnexpectedMeshKind { expected: &'static str, found: i32 },

    #[error("{context}: {source}")]
    Nested {
        context: String,
        #[source]
        source: Box<ExportError>,
    },
}

impl ExportError {
    /// Wrap this error with additional context
    pub fn with_context(self, context: impl Into<String>) -> Self {
        ExportError::Nested {
            context: context.into(),
            source: Box::new(self),
        }
    }
}

/// Result type alias for export operations
pub type ExportResult<T> = Result<T, ExportError>;
