//! The field-type table shared by the decoder and the encoder.
//!
//! Codes 0 through 15 are the same in every GFF resource. Codes 16 and 17
//! carry the two float vectors, and their assignment differs between the
//! resource-format documents, so the mapping goes through [`VectorLayout`].

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    U64,
    I64,
    Single,
    Double,
    String,
    ResRef,
    LocString,
    Binary,
    Struct,
    List,
    Vector3,
    Vector4,
}

/// Where a field's value lives in the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Storage {
    /// Packed into the field entry's 4-byte data word.
    Inline,
    /// The data word is a byte offset into the field-data section.
    FieldData,
    /// The data word is a struct-table index.
    StructIndex,
    /// The data word is a byte offset into the list-indices section.
    ListOffset,
}

/// Assignment of the two vector types to codes 16 and 17.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VectorLayout {
    /// 16 = vector4 (orientation), 17 = vector3.
    #[default]
    OrientationFirst,
    /// 16 = vector3, 17 = vector4.
    VectorFirst,
}

impl VectorLayout {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OrientationFirst => "orientation-first",
            Self::VectorFirst => "vector-first",
        }
    }
}

impl FieldType {
    pub const ALL: [FieldType; 18] = [
        Self::U8,
        Self::I8,
        Self::U16,
        Self::I16,
        Self::U32,
        Self::I32,
        Self::U64,
        Self::I64,
        Self::Single,
        Self::Double,
        Self::String,
        Self::ResRef,
        Self::LocString,
        Self::Binary,
        Self::Struct,
        Self::List,
        Self::Vector3,
        Self::Vector4,
    ];

    pub fn code(&self, layout: VectorLayout) -> u32 {
        match (self, layout) {
            (Self::Vector4, VectorLayout::OrientationFirst) => 16,
            (Self::Vector3, VectorLayout::OrientationFirst) => 17,
            (Self::Vector3, VectorLayout::VectorFirst) => 16,
            (Self::Vector4, VectorLayout::VectorFirst) => 17,
            (other, _) => *other as u32,
        }
    }

    pub fn from_code(code: u32, layout: VectorLayout) -> Option<Self> {
        match code {
            0..=15 => Some(Self::ALL[code as usize]),
            16 | 17 => Self::ALL[16..]
                .iter()
                .copied()
                .find(|t| t.code(layout) == code),
            _ => None,
        }
    }

    pub fn storage(&self) -> Storage {
        match self {
            Self::U8
            | Self::I8
            | Self::U16
            | Self::I16
            | Self::U32
            | Self::I32
            | Self::Single => Storage::Inline,
            Self::Struct => Storage::StructIndex,
            Self::List => Storage::ListOffset,
            _ => Storage::FieldData,
        }
    }

    /// Payload width in bytes for fixed-size types, `None` when the payload
    /// carries its own length or lives in another table.
    pub fn fixed_width(&self) -> Option<usize> {
        match self {
            Self::U8 | Self::I8 => Some(1),
            Self::U16 | Self::I16 => Some(2),
            Self::U32 | Self::I32 | Self::Single => Some(4),
            Self::U64 | Self::I64 | Self::Double => Some(8),
            Self::Vector3 => Some(12),
            Self::Vector4 => Some(16),
            Self::String
            | Self::ResRef
            | Self::LocString
            | Self::Binary
            | Self::Struct
            | Self::List => None,
        }
    }

    /// True for every type whose value is not packed into the field entry.
    pub fn is_complex(&self) -> bool {
        self.storage() != Storage::Inline
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::U8 => "uint8",
            Self::I8 => "int8",
            Self::U16 => "uint16",
            Self::I16 => "int16",
            Self::U32 => "uint32",
            Self::I32 => "int32",
            Self::U64 => "uint64",
            Self::I64 => "int64",
            Self::Single => "single",
            Self::Double => "double",
            Self::String => "string",
            Self::ResRef => "resref",
            Self::LocString => "localized_string",
            Self::Binary => "binary",
            Self::Struct => "struct",
            Self::List => "list",
            Self::Vector3 => "vector3",
            Self::Vector4 => "vector4",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name() == name)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_codes_ignore_vector_layout() {
        for layout in [VectorLayout::OrientationFirst, VectorLayout::VectorFirst] {
            assert_eq!(FieldType::I32.code(layout), 5);
            assert_eq!(FieldType::List.code(layout), 15);
            assert_eq!(FieldType::from_code(12, layout), Some(FieldType::LocString));
        }
    }

    #[test]
    fn vector_codes_follow_layout() {
        assert_eq!(FieldType::Vector4.code(VectorLayout::OrientationFirst), 16);
        assert_eq!(FieldType::Vector3.code(VectorLayout::OrientationFirst), 17);
        assert_eq!(FieldType::Vector3.code(VectorLayout::VectorFirst), 16);
        assert_eq!(FieldType::Vector4.code(VectorLayout::VectorFirst), 17);
        assert_eq!(
            FieldType::from_code(16, VectorLayout::VectorFirst),
            Some(FieldType::Vector3)
        );
    }

    #[test]
    fn every_type_round_trips_through_its_code() {
        for layout in [VectorLayout::OrientationFirst, VectorLayout::VectorFirst] {
            for t in FieldType::ALL {
                assert_eq!(FieldType::from_code(t.code(layout), layout), Some(t));
            }
        }
        assert_eq!(FieldType::from_code(18, VectorLayout::default()), None);
    }

    #[test]
    fn wide_numbers_are_not_inline() {
        assert_eq!(FieldType::Single.storage(), Storage::Inline);
        assert_eq!(FieldType::Double.storage(), Storage::FieldData);
        assert_eq!(FieldType::U64.storage(), Storage::FieldData);
        assert_eq!(FieldType::I64.storage(), Storage::FieldData);
        assert!(FieldType::Vector3.is_complex());
        assert!(!FieldType::U16.is_complex());
    }
}
