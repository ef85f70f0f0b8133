//! Reading and writing BioWare GFF (Generic File Format) resources.
//!
//! A GFF file is a tree of structs whose fields are stored in flat tables
//! and addressed by index or byte offset. [`decode`] materializes that tree
//! into a [`Document`]; [`encode`] plans a fresh layout and writes it back.
//!
//! ```
//! use gff_core::{Document, Struct, decode, encode};
//!
//! let mut doc = Document::new(*b"GAM ");
//! doc.root_mut().set("Gold", 500i32);
//!
//! let bytes = encode(&doc).unwrap();
//! let decoded = decode(&bytes, *b"GAM ").unwrap();
//! assert_eq!(decoded.root().get_i32("Gold"), Ok(500));
//! assert_eq!(decoded.root().struct_id, Struct::ROOT_ID);
//! ```

pub mod decode;
pub mod document;
pub mod encode;
pub mod error;
pub mod field_type;
pub mod gender;
pub mod header;
pub mod language;
pub mod layout;
pub mod path;
pub mod reader;
pub mod resource;
pub mod structure;
pub mod value;

pub use decode::{DEFAULT_MAX_DEPTH, DecodeOptions, decode, decode_with};
pub use document::{Document, SourceLayout, TableOrder};
pub use encode::{EncodeOptions, LABEL_MAX_LEN, check_label, encode, encode_with};
pub use error::{AccessError, FormatError, Location, Result};
pub use field_type::{FieldType, Storage, VectorLayout};
pub use gender::Gender;
pub use header::{FileType, Header, Version};
pub use language::Language;
pub use layout::{FileLayout, SectionId};
pub use path::FieldPath;
pub use resource::ResourceKind;
pub use structure::{Field, Struct};
pub use value::{FromValue, LocalizedString, RESREF_MAX_LEN, ResRef, Substring, Value};
