#![allow(dead_code)]

/// Hand-assembled GFF buffer. Sections are laid out back to back after the
/// header in the usual order; every table is written exactly as given.
pub struct RawGff {
    pub file_type: [u8; 4],
    pub version: [u8; 4],
    /// `(struct_id, data_or_offset, field_count)`
    pub structs: Vec<(i32, u32, u32)>,
    /// `(type_code, label_index, data_or_offset)`
    pub fields: Vec<(u32, u32, u32)>,
    pub labels: Vec<&'static str>,
    pub field_data: Vec<u8>,
    pub field_indices: Vec<u32>,
    pub list_indices: Vec<u32>,
}

impl RawGff {
    pub fn new(file_type: &[u8; 4]) -> Self {
        Self {
            file_type: *file_type,
            version: *b"V3.2",
            structs: Vec::new(),
            fields: Vec::new(),
            labels: Vec::new(),
            field_data: Vec::new(),
            field_indices: Vec::new(),
            list_indices: Vec::new(),
        }
    }

    pub fn build(&self) -> Vec<u8> {
        let structs_at = 56u32;
        let fields_at = structs_at + 12 * self.structs.len() as u32;
        let labels_at = fields_at + 12 * self.fields.len() as u32;
        let data_at = labels_at + 16 * self.labels.len() as u32;
        let field_indices_at = data_at + self.field_data.len() as u32;
        let list_indices_at = field_indices_at + 4 * self.field_indices.len() as u32;

        let mut out = Vec::new();
        out.extend_from_slice(&self.file_type);
        out.extend_from_slice(&self.version);
        for word in [
            structs_at,
            self.structs.len() as u32,
            fields_at,
            self.fields.len() as u32,
            labels_at,
            self.labels.len() as u32,
            data_at,
            self.field_data.len() as u32,
            field_indices_at,
            self.field_indices.len() as u32,
            list_indices_at,
            4 * self.list_indices.len() as u32,
        ] {
            out.extend_from_slice(&word.to_le_bytes());
        }
        for &(id, data, count) in &self.structs {
            out.extend_from_slice(&id.to_le_bytes());
            out.extend_from_slice(&data.to_le_bytes());
            out.extend_from_slice(&count.to_le_bytes());
        }
        for &(code, label, data) in &self.fields {
            out.extend_from_slice(&code.to_le_bytes());
            out.extend_from_slice(&label.to_le_bytes());
            out.extend_from_slice(&data.to_le_bytes());
        }
        for label in &self.labels {
            let mut slot = [0u8; 16];
            slot[..label.len()].copy_from_slice(label.as_bytes());
            out.extend_from_slice(&slot);
        }
        out.extend_from_slice(&self.field_data);
        for index in &self.field_indices {
            out.extend_from_slice(&index.to_le_bytes());
        }
        for word in &self.list_indices {
            out.extend_from_slice(&word.to_le_bytes());
        }
        out
    }
}

/// Root struct (id -1) holding one int32 field `Gold = 500`.
pub fn gold_document(file_type: &[u8; 4]) -> Vec<u8> {
    let mut raw = RawGff::new(file_type);
    raw.structs.push((-1, 0, 1));
    raw.fields.push((5, 0, 500));
    raw.labels.push("Gold");
    raw.build()
}

pub fn le_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes(bytes[at..at + 4].try_into().expect("four bytes"))
}
