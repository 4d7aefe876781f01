//! nyaconv binary schema codec
//!
//! Converts object graphs to and from fixed, hand-specified big-endian byte
//! layouts. Each composite type publishes a [`Schema`] listing its fields with
//! an order tag and an optional array size, either fixed or read from a
//! sibling value of the same or an enclosing object.
//!
//! ```ignore
//! impl Schematic for Blob {
//!     fn schema() -> Schema {
//!         Schema::builder("Blob")
//!             .field::<i32>("len", 0)
//!             .dynamic_array::<Vec<u8>>("data", 1, "len")
//!             .build()
//!     }
//! }
//!
//! let bytes = nyaconv_codec::encode(&blob)?;
//! let back: Blob = nyaconv_codec::decode(&bytes)?;
//! ```

pub mod decoder;
pub mod encoder;
pub mod error;
pub mod schema;
pub mod scope;
pub mod value;

pub use decoder::{decode, decode_prefix, decode_record};
pub use encoder::{encode, encode_record};
pub use error::{CodecError, CodecResult};
pub use schema::{FieldDescriptor, FieldKind, FieldType, Primitive, Schema, SchemaBuilder};
pub use scope::Frame;
pub use value::{Encodable, Record, Schematic, Value};
