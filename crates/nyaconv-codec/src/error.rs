//! Codec errors

use thiserror::Error;

/// Errors raised while encoding or decoding a schema-described object
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Negative array size: {size}")]
    NegativeSize { size: i64 },

    #[error("Array size mismatch: expected {expected} elements, found {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    #[error("Size field '{name}' not found in any enclosing object")]
    MissingSizeField { name: &'static str },

    #[error("Size field '{name}' does not hold an integer")]
    NotAnInteger { name: &'static str },

    #[error("Unsupported type {type_name}: {reason}")]
    Unsupported {
        type_name: &'static str,
        reason: &'static str,
    },

    #[error("Sequence field has neither a fixed nor a dynamic size")]
    UnsizedArray,

    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("Invalid {type_name} discriminant: {value}")]
    InvalidDiscriminant { type_name: &'static str, value: i64 },

    #[error("No value for field '{field}'")]
    MissingValue { field: &'static str },

    #[error("Unexpected end of stream at offset {offset}")]
    UnexpectedEof { offset: u64 },

    #[error("Invalid char scalar value 0x{0:08X}")]
    InvalidChar(u32),

    #[error("{remaining} trailing bytes after decoded object")]
    TrailingBytes { remaining: usize },

    #[error("{type_name}.{field}: {source}")]
    InField {
        type_name: &'static str,
        field: &'static str,
        #[source]
        source: Box<CodecError>,
    },
}

impl CodecError {
    /// Attribute this error to a field of a composite type
    pub fn in_field(self, type_name: &'static str, field: &'static str) -> Self {
        CodecError::InField {
            type_name,
            field,
            source: Box::new(self),
        }
    }

    /// Innermost error, with field attribution stripped
    pub fn root_cause(&self) -> &CodecError {
        match self {
            CodecError::InField { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Dotted path of fields the error was raised in, outermost first
    pub fn field_path(&self) -> Vec<&'static str> {
        let mut path = Vec::new();
        let mut current = self;
        while let CodecError::InField { field, source, .. } = current {
            path.push(*field);
            current = source;
        }
        path
    }
}

/// Result type alias for codec operations
pub type CodecResult<T> = Result<T, CodecError>;
