use std::collections::HashMap;

use log::debug;

use crate::document::{Document, TableOrder};
use crate::error::{FormatError, Result};
use crate::field_type::VectorLayout;
use crate::header::{
    FIELD_ENTRY_SIZE, FIELD_INDEX_SIZE, FileType, HEADER_SIZE, Header, LABEL_SIZE,
    STRUCT_ENTRY_SIZE, TableRef, Version,
};
use crate::language::substring_id;
use crate::layout::SectionId;
use crate::structure::{Field, Struct};
use crate::value::{LocalizedString, RESREF_MAX_LEN, Value};

pub const LABEL_MAX_LEN: usize = LABEL_SIZE as usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EncodeOptions {
    /// Lay a decoded document out the way its source was: labels keep the
    /// source label table, and while the tree keeps its decoded shape every
    /// struct and field returns to its source table slot.
    pub preserve_layout: bool,
}

impl EncodeOptions {
    pub fn preserving_layout() -> Self {
        Self {
            preserve_layout: true,
        }
    }
}

pub fn encode(document: &Document) -> Result<Vec<u8>> {
    encode_with(document, &EncodeOptions::default())
}

pub fn encode_with(document: &Document, options: &EncodeOptions) -> Result<Vec<u8>> {
    let source = document.source().filter(|_| options.preserve_layout);
    let order = source.and_then(|s| s.table_order.as_ref());
    let order = order.filter(|o| o.fits(document.root()));
    if source.is_some() && order.is_none() {
        debug!("source table order does not apply, numbering tables in pre-order");
    }

    let mut planner = Planner::new(document.vector_layout(), order);
    if let Some(source) = source {
        planner.labels.seed(&source.labels);
    }
    planner.add_struct(document.root())?;
    planner.finish(document.file_type(), document.version())
}

/// One 16-byte slot per distinct label, in first-use order.
#[derive(Debug, Default)]
struct LabelTable {
    entries: Vec<String>,
    index: HashMap<String, u32>,
}

impl LabelTable {
    fn seed(&mut self, labels: &[String]) {
        for label in labels {
            let next = self.entries.len() as u32;
            self.index.entry(label.clone()).or_insert(next);
            self.entries.push(label.clone());
        }
    }

    fn intern(&mut self, label: &str) -> Result<u32> {
        if let Some(&i) = self.index.get(label) {
            return Ok(i);
        }
        check_label(label)?;
        let i = to_u32(self.entries.len(), SectionId::Labels)?;
        self.entries.push(label.to_owned());
        self.index.insert(label.to_owned(), i);
        Ok(i)
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct EncodedStruct {
    id: i32,
    data: u32,
    field_count: u32,
}

#[derive(Debug, Clone, Copy, Default)]
struct EncodedField {
    code: u32,
    label: u32,
    data: u32,
}

struct Planner<'a> {
    vector_layout: VectorLayout,
    /// Source slots by visit number; `None` numbers tables in visit order.
    order: Option<&'a TableOrder>,
    structs: Vec<EncodedStruct>,
    fields: Vec<EncodedField>,
    labels: LabelTable,
    field_data: Vec<u8>,
    field_indices: Vec<u32>,
    list_indices: Vec<u8>,
}

impl<'a> Planner<'a> {
    fn new(vector_layout: VectorLayout, order: Option<&'a TableOrder>) -> Self {
        Self {
            vector_layout,
            order,
            structs: Vec::new(),
            fields: Vec::new(),
            labels: LabelTable::default(),
            field_data: Vec::new(),
            field_indices: Vec::new(),
            list_indices: Vec::new(),
        }
    }

    /// Pre-order: the struct takes the next table index and reserves a
    /// contiguous run of field entries before any nested struct is visited.
    fn add_struct(&mut self, s: &Struct) -> Result<u32> {
        let index = self.structs.len();
        let count = s.len();
        let first = self.fields.len();

        self.structs.push(EncodedStruct {
            id: s.struct_id,
            data: 0,
            field_count: to_u32(count, SectionId::Fields)?,
        });
        self.fields.resize(first + count, EncodedField::default());

        self.structs[index].data = match count {
            0 => u32::MAX,
            1 => self.field_slot(first)?,
            _ => {
                let offset = self.field_indices.len() * FIELD_INDEX_SIZE as usize;
                for i in first..first + count {
                    let slot = self.field_slot(i)?;
                    self.field_indices.push(slot);
                }
                to_u32(offset, SectionId::FieldIndices)?
            }
        };

        for (i, field) in s.fields().iter().enumerate() {
            self.fields[first + i] = self.encode_field(field)?;
        }

        self.struct_slot(index)
    }

    /// Table index of the `visit`-th struct.
    fn struct_slot(&self, visit: usize) -> Result<u32> {
        match self.order {
            Some(order) => Ok(order.structs[visit]),
            None => to_u32(visit, SectionId::Structs),
        }
    }

    fn field_slot(&self, visit: usize) -> Result<u32> {
        match self.order {
            Some(order) => Ok(order.fields[visit]),
            None => to_u32(visit, SectionId::Fields),
        }
    }

    fn encode_field(&mut self, field: &Field) -> Result<EncodedField> {
        let label = self.labels.intern(&field.label)?;
        let code = field.field_type().code(self.vector_layout);

        let data = match &field.value {
            Value::U8(v) => u32::from(*v),
            Value::I8(v) => u32::from(*v as u8),
            Value::U16(v) => u32::from(*v),
            Value::I16(v) => u32::from(*v as u16),
            Value::U32(v) => *v,
            Value::I32(v) => *v as u32,
            Value::Single(v) => v.to_bits(),
            Value::U64(v) => self.push_data(&v.to_le_bytes())?,
            Value::I64(v) => self.push_data(&v.to_le_bytes())?,
            Value::Double(v) => self.push_data(&v.to_le_bytes())?,
            Value::String(s) => self.push_prefixed(s.as_bytes())?,
            Value::ResRef(r) => {
                let bytes = r.as_str().as_bytes();
                if bytes.len() > RESREF_MAX_LEN {
                    return Err(FormatError::ResRefTooLong {
                        resref: r.as_str().to_owned(),
                        len: bytes.len(),
                    });
                }
                let offset = self.push_data(&[bytes.len() as u8])?;
                self.field_data.extend_from_slice(bytes);
                offset
            }
            Value::LocString(loc) => {
                let block = locstring_block(loc)?;
                self.push_prefixed(&block)?
            }
            Value::Binary(bytes) => self.push_prefixed(bytes)?,
            Value::Vector3(v) => self.push_floats(v)?,
            Value::Vector4(v) => self.push_floats(v)?,
            Value::Struct(s) => self.add_struct(s)?,
            Value::List(items) => self.add_list(items)?,
        };

        Ok(EncodedField { code, label, data })
    }

    fn add_list(&mut self, items: &[Struct]) -> Result<u32> {
        let offset = self.list_indices.len();
        self.list_indices
            .extend_from_slice(&to_u32(items.len(), SectionId::ListIndices)?.to_le_bytes());
        let slots = self.list_indices.len();
        self.list_indices.resize(slots + items.len() * 4, 0);

        for (i, item) in items.iter().enumerate() {
            let struct_index = self.add_struct(item)?;
            let at = slots + i * 4;
            self.list_indices[at..at + 4].copy_from_slice(&struct_index.to_le_bytes());
        }

        to_u32(offset, SectionId::ListIndices)
    }

    /// Append raw bytes to the field-data arena and return their offset.
    fn push_data(&mut self, bytes: &[u8]) -> Result<u32> {
        let offset = to_u32(self.field_data.len(), SectionId::FieldData)?;
        self.field_data.extend_from_slice(bytes);
        Ok(offset)
    }

    fn push_prefixed(&mut self, bytes: &[u8]) -> Result<u32> {
        let len = to_u32(bytes.len(), SectionId::FieldData)?;
        let offset = self.push_data(&len.to_le_bytes())?;
        self.field_data.extend_from_slice(bytes);
        Ok(offset)
    }

    fn push_floats(&mut self, values: &[f32]) -> Result<u32> {
        let offset = to_u32(self.field_data.len(), SectionId::FieldData)?;
        for v in values {
            self.field_data.extend_from_slice(&v.to_le_bytes());
        }
        Ok(offset)
    }

    fn finish(self, file_type: FileType, version: Version) -> Result<Vec<u8>> {
        let structs = arrange(self.structs, self.order.map(|o| o.structs.as_slice()));
        let fields = arrange(self.fields, self.order.map(|o| o.fields.as_slice()));

        let struct_count = structs.len() as u64;
        let field_count = fields.len() as u64;
        let label_count = self.labels.entries.len() as u64;
        let field_index_count = self.field_indices.len() as u64;

        let structs_at = HEADER_SIZE as u64;
        let fields_at = structs_at + struct_count * STRUCT_ENTRY_SIZE;
        let labels_at = fields_at + field_count * FIELD_ENTRY_SIZE;
        let data_at = labels_at + label_count * LABEL_SIZE;
        let field_indices_at = data_at + self.field_data.len() as u64;
        let list_indices_at = field_indices_at + field_index_count * FIELD_INDEX_SIZE;
        let total = list_indices_at + self.list_indices.len() as u64;

        let table = |offset: u64, count: u64, section: SectionId| -> Result<TableRef> {
            Ok(TableRef {
                offset: u64_to_u32(offset, section)?,
                count: u64_to_u32(count, section)?,
            })
        };
        let header = Header {
            file_type,
            version,
            structs: table(structs_at, struct_count, SectionId::Structs)?,
            fields: table(fields_at, field_count, SectionId::Fields)?,
            labels: table(labels_at, label_count, SectionId::Labels)?,
            field_data: table(
                data_at,
                self.field_data.len() as u64,
                SectionId::FieldData,
            )?,
            field_indices: table(
                field_indices_at,
                field_index_count,
                SectionId::FieldIndices,
            )?,
            list_indices: table(
                list_indices_at,
                self.list_indices.len() as u64,
                SectionId::ListIndices,
            )?,
        };
        u64_to_u32(total, SectionId::ListIndices)?;

        let mut out = Vec::with_capacity(total as usize);
        header.write(&mut out);
        for s in &structs {
            out.extend_from_slice(&s.id.to_le_bytes());
            out.extend_from_slice(&s.data.to_le_bytes());
            out.extend_from_slice(&s.field_count.to_le_bytes());
        }
        for f in &fields {
            out.extend_from_slice(&f.code.to_le_bytes());
            out.extend_from_slice(&f.label.to_le_bytes());
            out.extend_from_slice(&f.data.to_le_bytes());
        }
        for label in &self.labels.entries {
            let mut slot = [0u8; LABEL_MAX_LEN];
            slot[..label.len()].copy_from_slice(label.as_bytes());
            out.extend_from_slice(&slot);
        }
        out.extend_from_slice(&self.field_data);
        for index in &self.field_indices {
            out.extend_from_slice(&index.to_le_bytes());
        }
        out.extend_from_slice(&self.list_indices);

        debug!(
            "encoded {} {}: {} structs, {} fields, {} labels, {} bytes",
            file_type,
            version,
            struct_count,
            field_count,
            label_count,
            out.len()
        );
        Ok(out)
    }
}

/// Moves each row from its visit position to its table slot.
fn arrange<T: Copy + Default>(rows: Vec<T>, slots: Option<&[u32]>) -> Vec<T> {
    let Some(slots) = slots else {
        return rows;
    };
    let mut table = vec![T::default(); rows.len()];
    for (row, &slot) in rows.into_iter().zip(slots) {
        table[slot as usize] = row;
    }
    table
}

/// Rejects labels that do not survive the 16-byte NUL-padded label slot.
pub fn check_label(label: &str) -> Result<()> {
    if label.len() > LABEL_MAX_LEN {
        return Err(FormatError::LabelTooLong {
            label: label.to_owned(),
            len: label.len(),
        });
    }
    if label.contains('\0') {
        return Err(FormatError::LabelContainsNul {
            label: label.to_owned(),
        });
    }
    Ok(())
}

/// Everything after the size word: string ref, count, then the substrings.
fn locstring_block(loc: &LocalizedString) -> Result<Vec<u8>> {
    if loc.string_ref == Some(LocalizedString::NO_STRING_REF) {
        return Err(FormatError::ReservedStringRef);
    }
    let mut block = Vec::new();
    block.extend_from_slice(&loc.raw_string_ref().to_le_bytes());
    block.extend_from_slice(&to_u32(loc.substrings.len(), SectionId::FieldData)?.to_le_bytes());
    for sub in &loc.substrings {
        let id = substring_id(sub.language, sub.gender).ok_or(
            FormatError::UnencodableLanguage {
                language: sub.language,
            },
        )?;
        block.extend_from_slice(&id.to_le_bytes());
        block.extend_from_slice(&to_u32(sub.text.len(), SectionId::FieldData)?.to_le_bytes());
        block.extend_from_slice(sub.text.as_bytes());
    }
    Ok(block)
}

fn to_u32(value: usize, section: SectionId) -> Result<u32> {
    u32::try_from(value).map_err(|_| FormatError::SectionOverflow { section })
}

fn u64_to_u32(value: u64, section: SectionId) -> Result<u32> {
    u32::try_from(value).map_err(|_| FormatError::SectionOverflow { section })
}
