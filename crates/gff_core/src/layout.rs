use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{FormatError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SectionId {
    Header,
    Structs,
    Fields,
    Labels,
    FieldData,
    FieldIndices,
    ListIndices,
}

impl SectionId {
    pub const ALL: [SectionId; 7] = [
        Self::Header,
        Self::Structs,
        Self::Fields,
        Self::Labels,
        Self::FieldData,
        Self::FieldIndices,
        Self::ListIndices,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Header => "header",
            Self::Structs => "struct array",
            Self::Fields => "field array",
            Self::Labels => "label array",
            Self::FieldData => "field data",
            Self::FieldIndices => "field indices",
            Self::ListIndices => "list indices",
        }
    }
}

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionLayout {
    pub id: SectionId,
    pub range: ByteRange,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileLayout {
    pub file_len: u64,
    pub sections: Vec<SectionLayout>,
}

impl FileLayout {
    pub fn section(&self, id: SectionId) -> Option<&SectionLayout> {
        self.sections.iter().find(|s| s.id == id)
    }

    /// Every section must lie inside the file; sections may leave gaps.
    pub fn validate(&self) -> Result<()> {
        for section in &self.sections {
            if section.range.end < section.range.start || section.range.end > self.file_len {
                return Err(FormatError::Truncated {
                    section: section.id,
                    needed: section.range.end,
                    available: self.file_len,
                });
            }
        }
        Ok(())
    }

    /// True when the sections, sorted by offset, tile the file with no gaps,
    /// overlaps or trailing bytes.
    pub fn is_contiguous(&self) -> bool {
        let mut ranges: Vec<ByteRange> = self.sections.iter().map(|s| s.range).collect();
        ranges.sort_by_key(|r| (r.start, r.end));

        let mut expected = 0u64;
        for range in ranges {
            if range.start != expected {
                return false;
            }
            expected = range.end;
        }
        expected == self.file_len
    }
}
