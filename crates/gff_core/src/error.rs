use std::fmt;

use thiserror::Error;

use crate::field_type::FieldType;
use crate::header::FileType;
use crate::language::Language;
use crate::layout::SectionId;

/// Where in the file a decode problem was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    Header,
    Struct(u32),
    Field(u32),
    Label(u32),
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Header => f.write_str("header"),
            Self::Struct(i) => write!(f, "struct {i}"),
            Self::Field(i) => write!(f, "field {i}"),
            Self::Label(i) => write!(f, "label {i}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("bad file type: expected {expected}, found {found}")]
    BadSignature { expected: FileType, found: FileType },

    #[error("unsupported version tag {}", String::from_utf8_lossy(.found))]
    BadVersion { found: [u8; 4] },

    #[error("truncated {section}: needs {needed} bytes, buffer has {available}")]
    Truncated {
        section: SectionId,
        needed: u64,
        available: u64,
    },

    #[error("unknown field type code {code} at field {field_index}")]
    UnknownFieldType { field_index: u32, code: u32 },

    #[error("{section} reference {value} out of bounds (limit {limit}) at {location}")]
    OutOfBounds {
        section: SectionId,
        value: u64,
        limit: u64,
        location: Location,
    },

    #[error("label {label:?} is {len} bytes, limit is 16")]
    LabelTooLong { label: String, len: usize },

    #[error("label {label:?} contains a NUL byte")]
    LabelContainsNul { label: String },

    #[error("resref {resref:?} is {len} bytes, limit is 16")]
    ResRefTooLong { resref: String, len: usize },

    #[error("struct {struct_index} references one of its own ancestors")]
    CyclicReference { struct_index: u32 },

    #[error("struct {struct_index} is referenced again from {location}")]
    SharedStruct {
        struct_index: u32,
        location: Location,
    },

    #[error("struct nesting exceeds {limit} levels at struct {struct_index}")]
    NestingTooDeep { struct_index: u32, limit: usize },

    #[error("{what} at {location} declares {declared} bytes but holds {actual}")]
    SizeMismatch {
        what: &'static str,
        location: Location,
        declared: u64,
        actual: u64,
    },

    #[error("language {language} has no substring id of its own")]
    UnencodableLanguage { language: Language },

    #[error("string ref 0xFFFFFFFF is reserved for \"no reference\"")]
    ReservedStringRef,

    #[error("{section} grew past the 32-bit limit of the format")]
    SectionOverflow { section: SectionId },
}

pub type Result<T, E = FormatError> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessError {
    #[error("no field labelled {label:?}")]
    Missing { label: String },

    #[error("field {label:?} is {found}, not {expected}")]
    TypeMismatch {
        label: String,
        expected: FieldType,
        found: FieldType,
    },

    #[error("invalid field path {path:?}: {reason}")]
    BadPath { path: String, reason: String },

    #[error("list {label:?} has {len} entries, index {index} requested")]
    IndexOutOfRange {
        label: String,
        index: usize,
        len: usize,
    },

    #[error("field {label:?} is {found} and cannot contain {segment:?}")]
    NotAContainer {
        label: String,
        found: FieldType,
        segment: String,
    },

    #[error("cannot parse {text:?} as {expected}: {reason}")]
    InvalidText {
        text: String,
        expected: FieldType,
        reason: String,
    },
}
