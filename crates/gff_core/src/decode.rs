use log::{debug, trace};

use crate::document::{Document, SourceLayout, TableOrder};
use crate::error::{FormatError, Location, Result};
use crate::field_type::{FieldType, VectorLayout};
use crate::header::{FileType, Header};
use crate::layout::SectionId;
use crate::language::split_substring_id;
use crate::reader::{LittleEndianReader, decode_text};
use crate::structure::{Field, Struct};
use crate::value::{LocalizedString, RESREF_MAX_LEN, ResRef, Substring, Value};

pub const DEFAULT_MAX_DEPTH: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Tag the file must carry. `"GFF "` accepts any tag.
    pub expected: FileType,
    /// Override for the codes of vector fields; looked up from the file's
    /// tag when `None`.
    pub vector_layout: Option<VectorLayout>,
    /// Deepest struct/list nesting accepted below the root.
    pub max_depth: usize,
    /// Keep a copy of the input for layout-preserving re-encoding.
    pub retain_source: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            expected: FileType::GFF,
            vector_layout: None,
            max_depth: DEFAULT_MAX_DEPTH,
            retain_source: true,
        }
    }
}

impl DecodeOptions {
    pub fn expecting(expected: impl Into<FileType>) -> Self {
        Self {
            expected: expected.into(),
            ..Self::default()
        }
    }
}

pub fn decode(bytes: &[u8], expected: impl Into<FileType>) -> Result<Document> {
    decode_with(bytes, &DecodeOptions::expecting(expected))
}

pub fn decode_with(bytes: &[u8], options: &DecodeOptions) -> Result<Document> {
    let header = Header::parse(bytes)?;
    header.check_file_type(options.expected)?;
    let layout = header.sections(bytes.len() as u64)?;
    let vector_layout = options
        .vector_layout
        .unwrap_or_else(|| header.file_type.vector_layout());

    let section = |id: SectionId| {
        let range = header.section_range(id);
        LittleEndianReader::new(id, &bytes[range.start as usize..range.end as usize])
    };

    let labels = read_labels(section(SectionId::Labels), header.labels.count)?;
    let structs = read_structs(section(SectionId::Structs), header.structs.count)?;
    let fields = read_fields(
        section(SectionId::Fields),
        header.fields.count,
        labels.len(),
        vector_layout,
    )?;

    debug!(
        "decoding {} {}: {} structs, {} fields, {} labels, {} bytes of field data",
        header.file_type,
        header.version,
        structs.len(),
        fields.len(),
        labels.len(),
        header.field_data.count
    );

    let mut builder = TreeBuilder {
        structs: &structs,
        fields: &fields,
        labels: &labels,
        field_data: section(SectionId::FieldData),
        field_indices: section(SectionId::FieldIndices),
        list_indices: section(SectionId::ListIndices),
        on_path: vec![false; structs.len()],
        materialized: vec![false; structs.len()],
        max_depth: options.max_depth,
        order: TableOrder::default(),
    };
    let root = builder.build_struct(0, 0, Location::Header)?;
    let order = builder.order;

    let source = options.retain_source.then(|| SourceLayout {
        bytes: bytes.to_vec(),
        labels: labels.clone(),
        layout,
        table_order: order
            .covers(structs.len(), fields.len())
            .then_some(order),
    });

    Ok(Document::from_decoded(
        header.file_type,
        header.version,
        vector_layout,
        root,
        source,
    ))
}

#[derive(Debug, Clone, Copy)]
struct RawStruct {
    id: i32,
    data: u32,
    field_count: u32,
}

#[derive(Debug, Clone, Copy)]
struct RawField {
    field_type: FieldType,
    label: u32,
    data: u32,
}

fn read_labels(mut r: LittleEndianReader<'_>, count: u32) -> Result<Vec<String>> {
    (0..count)
        .map(|i| {
            r = r.at(u64::from(i) * 16, Location::Label(i));
            r.read_fixed_string(16)
        })
        .collect()
}

fn read_structs(mut r: LittleEndianReader<'_>, count: u32) -> Result<Vec<RawStruct>> {
    (0..count)
        .map(|i| {
            r = r.at(u64::from(i) * 12, Location::Struct(i));
            Ok(RawStruct {
                id: r.read_i32()?,
                data: r.read_u32()?,
                field_count: r.read_u32()?,
            })
        })
        .collect()
}

fn read_fields(
    mut r: LittleEndianReader<'_>,
    count: u32,
    label_count: usize,
    vector_layout: VectorLayout,
) -> Result<Vec<RawField>> {
    (0..count)
        .map(|i| {
            r = r.at(u64::from(i) * 12, Location::Field(i));
            let code = r.read_u32()?;
            let label = r.read_u32()?;
            let data = r.read_u32()?;

            let field_type = FieldType::from_code(code, vector_layout).ok_or(
                FormatError::UnknownFieldType {
                    field_index: i,
                    code,
                },
            )?;
            if label as usize >= label_count {
                return Err(FormatError::OutOfBounds {
                    section: SectionId::Labels,
                    value: u64::from(label),
                    limit: label_count as u64,
                    location: Location::Field(i),
                });
            }

            Ok(RawField {
                field_type,
                label,
                data,
            })
        })
        .collect()
}

struct TreeBuilder<'a> {
    structs: &'a [RawStruct],
    fields: &'a [RawField],
    labels: &'a [String],
    field_data: LittleEndianReader<'a>,
    field_indices: LittleEndianReader<'a>,
    list_indices: LittleEndianReader<'a>,
    /// Structs currently being materialized, i.e. ancestors of the current node.
    on_path: Vec<bool>,
    /// Each struct entry backs at most one node of the tree.
    materialized: Vec<bool>,
    max_depth: usize,
    order: TableOrder,
}

impl TreeBuilder<'_> {
    fn build_struct(&mut self, index: u32, depth: usize, referrer: Location) -> Result<Struct> {
        let raw = *self
            .structs
            .get(index as usize)
            .ok_or(FormatError::OutOfBounds {
                section: SectionId::Structs,
                value: u64::from(index),
                limit: self.structs.len() as u64,
                location: referrer,
            })?;
        if depth > self.max_depth {
            return Err(FormatError::NestingTooDeep {
                struct_index: index,
                limit: self.max_depth,
            });
        }
        if self.on_path[index as usize] {
            return Err(FormatError::CyclicReference {
                struct_index: index,
            });
        }
        if self.materialized[index as usize] {
            return Err(FormatError::SharedStruct {
                struct_index: index,
                location: referrer,
            });
        }
        self.materialized[index as usize] = true;

        trace!(
            "struct {index} (id {}): {} fields at depth {depth}",
            raw.id, raw.field_count
        );

        let location = Location::Struct(index);
        let field_indices = match raw.field_count {
            0 => Vec::new(),
            1 => vec![raw.data],
            n => self
                .field_indices
                .at(u64::from(raw.data), location)
                .read_u32_run(n)?,
        };

        if let Some(&bad) = field_indices
            .iter()
            .find(|&&i| i as usize >= self.fields.len())
        {
            return Err(FormatError::OutOfBounds {
                section: SectionId::Fields,
                value: u64::from(bad),
                limit: self.fields.len() as u64,
                location,
            });
        }
        self.order.structs.push(index);
        self.order.field_counts.push(field_indices.len());
        self.order.fields.extend_from_slice(&field_indices);

        self.on_path[index as usize] = true;
        let mut fields = Vec::with_capacity(field_indices.len());
        for field_index in field_indices {
            fields.push(self.build_field(field_index, depth)?);
        }
        self.on_path[index as usize] = false;

        Ok(Struct::with_fields(raw.id, fields))
    }

    fn build_field(&mut self, index: u32, depth: usize) -> Result<Field> {
        let raw = self.fields[index as usize];
        let location = Location::Field(index);
        let data = raw.data;
        let mut r = self.field_data.at(u64::from(data), location);

        let value = match raw.field_type {
            FieldType::U8 => Value::U8(data as u8),
            FieldType::I8 => Value::I8(data as u8 as i8),
            FieldType::U16 => Value::U16(data as u16),
            FieldType::I16 => Value::I16(data as u16 as i16),
            FieldType::U32 => Value::U32(data),
            FieldType::I32 => Value::I32(data as i32),
            FieldType::Single => Value::Single(f32::from_bits(data)),
            FieldType::U64 => Value::U64(r.read_u64()?),
            FieldType::I64 => Value::I64(r.read_i64()?),
            FieldType::Double => Value::Double(r.read_f64()?),
            FieldType::String => {
                let len = r.read_u32()?;
                Value::String(decode_text(r.read_bytes(u64::from(len))?))
            }
            FieldType::ResRef => {
                let len = r.read_u8()?;
                let text = decode_text(r.read_bytes(u64::from(len))?);
                if usize::from(len) > RESREF_MAX_LEN {
                    return Err(FormatError::ResRefTooLong {
                        resref: text,
                        len: usize::from(len),
                    });
                }
                Value::ResRef(ResRef::new(text))
            }
            FieldType::LocString => Value::LocString(read_locstring(&mut r, location)?),
            FieldType::Binary => {
                let len = r.read_u32()?;
                Value::Binary(r.read_bytes(u64::from(len))?.to_vec())
            }
            FieldType::Vector3 => Value::Vector3(r.read_f32_array::<3>()?),
            FieldType::Vector4 => Value::Vector4(r.read_f32_array::<4>()?),
            FieldType::Struct => Value::Struct(self.build_struct(data, depth + 1, location)?),
            FieldType::List => {
                let mut list = self.list_indices.at(u64::from(data), location);
                let count = list.read_u32()?;
                let members = list.read_u32_run(count)?;
                let mut items = Vec::with_capacity(members.len());
                for member in members {
                    items.push(self.build_struct(member, depth + 1, location)?);
                }
                Value::List(items)
            }
        };

        Ok(Field {
            label: self.labels[raw.label as usize].clone(),
            value,
        })
    }
}

/// `total_size` counts the bytes after itself. Writers that count the size
/// word too are tolerated; substrings running past the declared block are not.
fn read_locstring(r: &mut LittleEndianReader<'_>, location: Location) -> Result<LocalizedString> {
    let total_size = r.read_u32()?;
    let start = r.position();
    let string_ref = r.read_u32()?;
    let count = r.read_u32()?;

    let mut substrings = Vec::with_capacity(count.min(16) as usize);
    for _ in 0..count {
        let (language, gender) = split_substring_id(r.read_u32()?);
        let len = r.read_u32()?;
        let text = decode_text(r.read_bytes(u64::from(len))?);
        substrings.push(Substring {
            language,
            gender,
            text,
        });
    }

    let consumed = r.position() - start;
    if consumed > u64::from(total_size) {
        return Err(FormatError::SizeMismatch {
            what: "localized string",
            location,
            declared: u64::from(total_size),
            actual: consumed,
        });
    }

    Ok(LocalizedString {
        string_ref: LocalizedString::ref_from_raw(string_ref),
        substrings,
    })
}
