use std::fmt;
use std::str::FromStr;

use byteorder::{ByteOrder, LittleEndian};
use serde::{Deserialize, Serialize};

use crate::error::{FormatError, Result};
use crate::field_type::VectorLayout;
use crate::layout::{ByteRange, FileLayout, SectionId, SectionLayout};
use crate::resource::ResourceKind;

pub const HEADER_SIZE: usize = 56;
pub const STRUCT_ENTRY_SIZE: u64 = 12;
pub const FIELD_ENTRY_SIZE: u64 = 12;
pub const LABEL_SIZE: u64 = 16;
pub const FIELD_INDEX_SIZE: u64 = 4;

/// Four-character resource tag stored in the first header word, e.g. `"GAM "`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileType([u8; 4]);

impl FileType {
    pub const GFF: FileType = FileType(*b"GFF ");

    pub const fn new(tag: [u8; 4]) -> Self {
        Self(tag)
    }

    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }

    pub fn as_str(&self) -> String {
        String::from_utf8_lossy(&self.0).into_owned()
    }

    /// The generic `"GFF "` tag matches any sub-type.
    pub fn is_generic(&self) -> bool {
        *self == Self::GFF
    }

    pub fn accepts(&self, found: FileType) -> bool {
        self.is_generic() || *self == found
    }

    pub fn resource_kind(&self) -> Option<ResourceKind> {
        ResourceKind::from_tag(*self)
    }

    pub fn vector_layout(&self) -> VectorLayout {
        self.resource_kind()
            .map(|kind| kind.vector_layout())
            .unwrap_or_default()
    }
}

impl From<[u8; 4]> for FileType {
    fn from(tag: [u8; 4]) -> Self {
        Self(tag)
    }
}

impl From<&[u8; 4]> for FileType {
    fn from(tag: &[u8; 4]) -> Self {
        Self(*tag)
    }
}

impl From<ResourceKind> for FileType {
    fn from(kind: ResourceKind) -> Self {
        kind.tag()
    }
}

/// Accepts `"GAM"`, `"gam"` or `"GAM "`; shorter tags are space-padded.
impl FromStr for FileType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        if bytes.is_empty() || bytes.len() > 4 || !s.is_ascii() {
            return Err(format!("file type must be 1-4 ASCII characters, got {s:?}"));
        }
        let mut tag = *b"    ";
        for (slot, b) in tag.iter_mut().zip(bytes) {
            *slot = b.to_ascii_uppercase();
        }
        Ok(Self(tag))
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.as_str())
    }
}

impl fmt::Debug for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FileType({:?})", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Version {
    #[default]
    V3_2,
    V3_3,
    V4_0,
    V4_1,
}

impl Version {
    pub const ALL: [Version; 4] = [Self::V3_2, Self::V3_3, Self::V4_0, Self::V4_1];

    pub fn tag(&self) -> [u8; 4] {
        match self {
            Self::V3_2 => *b"V3.2",
            Self::V3_3 => *b"V3.3",
            Self::V4_0 => *b"V4.0",
            Self::V4_1 => *b"V4.1",
        }
    }

    pub fn from_tag(tag: [u8; 4]) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|v| v.tag() == tag)
            .ok_or(FormatError::BadVersion { found: tag })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::V3_2 => "V3.2",
            Self::V3_3 => "V3.3",
            Self::V4_0 => "V4.0",
            Self::V4_1 => "V4.1",
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Version {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|v| v.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown version {s:?}, expected V3.2, V3.3, V4.0 or V4.1"))
    }
}

/// An `(offset, count)` pair from the header. The unit of `count` depends on
/// the section: entries for the tables, bytes for the two arenas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TableRef {
    pub offset: u32,
    pub count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub file_type: FileType,
    pub version: Version,
    pub structs: TableRef,
    pub fields: TableRef,
    pub labels: TableRef,
    /// `count` is a byte size.
    pub field_data: TableRef,
    /// `count` is a number of `u32` entries.
    pub field_indices: TableRef,
    /// `count` is a byte size.
    pub list_indices: TableRef,
}

impl Header {
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(FormatError::Truncated {
                section: SectionId::Header,
                needed: HEADER_SIZE as u64,
                available: bytes.len() as u64,
            });
        }

        let mut file_type = [0u8; 4];
        file_type.copy_from_slice(&bytes[0..4]);
        let mut version = [0u8; 4];
        version.copy_from_slice(&bytes[4..8]);
        let version = Version::from_tag(version)?;

        let word = |i: usize| LittleEndian::read_u32(&bytes[8 + i * 4..12 + i * 4]);
        let pair = |i: usize| TableRef {
            offset: word(i * 2),
            count: word(i * 2 + 1),
        };

        Ok(Self {
            file_type: FileType(file_type),
            version,
            structs: pair(0),
            fields: pair(1),
            labels: pair(2),
            field_data: pair(3),
            field_indices: pair(4),
            list_indices: pair(5),
        })
    }

    pub fn check_file_type(&self, expected: FileType) -> Result<()> {
        if expected.accepts(self.file_type) {
            Ok(())
        } else {
            Err(FormatError::BadSignature {
                expected,
                found: self.file_type,
            })
        }
    }

    pub fn write(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(self.file_type.as_bytes());
        out.extend_from_slice(&self.version.tag());
        for table in [
            self.structs,
            self.fields,
            self.labels,
            self.field_data,
            self.field_indices,
            self.list_indices,
        ] {
            let mut buf = [0u8; 8];
            LittleEndian::write_u32(&mut buf[0..4], table.offset);
            LittleEndian::write_u32(&mut buf[4..8], table.count);
            out.extend_from_slice(&buf);
        }
    }

    pub fn section_range(&self, id: SectionId) -> ByteRange {
        let (table, unit) = match id {
            SectionId::Header => {
                return ByteRange {
                    start: 0,
                    end: HEADER_SIZE as u64,
                };
            }
            SectionId::Structs => (self.structs, STRUCT_ENTRY_SIZE),
            SectionId::Fields => (self.fields, FIELD_ENTRY_SIZE),
            SectionId::Labels => (self.labels, LABEL_SIZE),
            SectionId::FieldData => (self.field_data, 1),
            SectionId::FieldIndices => (self.field_indices, FIELD_INDEX_SIZE),
            SectionId::ListIndices => (self.list_indices, 1),
        };
        let start = u64::from(table.offset);
        ByteRange {
            start,
            end: start + u64::from(table.count) * unit,
        }
    }

    /// Byte ranges of all sections, checked against a buffer of `file_len`.
    pub fn sections(&self, file_len: u64) -> Result<FileLayout> {
        let layout = FileLayout {
            file_len,
            sections: SectionId::ALL
                .into_iter()
                .map(|id| SectionLayout {
                    id,
                    range: self.section_range(id),
                })
                .collect(),
        };
        layout.validate()?;
        Ok(layout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Header {
        Header {
            file_type: FileType::new(*b"GAM "),
            version: Version::V3_2,
            structs: TableRef { offset: 56, count: 1 },
            fields: TableRef { offset: 68, count: 1 },
            labels: TableRef { offset: 80, count: 1 },
            field_data: TableRef { offset: 96, count: 0 },
            field_indices: TableRef { offset: 96, count: 0 },
            list_indices: TableRef { offset: 96, count: 0 },
        }
    }

    #[test]
    fn header_write_then_parse_is_stable() {
        let header = sample();
        let mut out = Vec::new();
        header.write(&mut out);
        assert_eq!(out.len(), HEADER_SIZE);
        assert_eq!(&out[0..8], b"GAM V3.2");
        assert_eq!(Header::parse(&out).unwrap(), header);
    }

    #[test]
    fn unknown_version_is_rejected() {
        let mut out = Vec::new();
        sample().write(&mut out);
        out[4..8].copy_from_slice(b"V9.9");
        assert_eq!(
            Header::parse(&out),
            Err(FormatError::BadVersion { found: *b"V9.9" })
        );
    }

    #[test]
    fn short_buffer_is_truncated() {
        assert!(matches!(
            Header::parse(&[0u8; 20]),
            Err(FormatError::Truncated {
                section: SectionId::Header,
                needed: 56,
                available: 20,
            })
        ));
    }

    #[test]
    fn generic_tag_accepts_any_subtype() {
        let header = sample();
        assert!(header.check_file_type(FileType::GFF).is_ok());
        assert!(header.check_file_type(FileType::new(*b"GAM ")).is_ok());
        assert_eq!(
            header.check_file_type(FileType::new(*b"JRL ")),
            Err(FormatError::BadSignature {
                expected: FileType::new(*b"JRL "),
                found: FileType::new(*b"GAM "),
            })
        );
    }

    #[test]
    fn file_type_parses_short_names() {
        assert_eq!("gam".parse::<FileType>().unwrap(), FileType::new(*b"GAM "));
        assert_eq!("GFF ".parse::<FileType>().unwrap(), FileType::GFF);
        assert!("TOOLONG".parse::<FileType>().is_err());
    }

    #[test]
    fn sections_detect_struct_table_past_end() {
        let mut header = sample();
        header.structs.count = 10;
        assert!(matches!(
            header.sections(96),
            Err(FormatError::Truncated {
                section: SectionId::Structs,
                ..
            })
        ));
    }
}
