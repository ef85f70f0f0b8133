use crate::error::{AccessError, Result};
use crate::field_type::VectorLayout;
use crate::header::{FileType, Version};
use crate::layout::FileLayout;
use crate::path::FieldPath;
use crate::structure::Struct;
use crate::value::Value;
use crate::{decode, encode};

/// Bytes and table order of the buffer a document was decoded from.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceLayout {
    pub bytes: Vec<u8>,
    pub labels: Vec<String>,
    pub layout: FileLayout,
    /// `None` when the source tables hold entries the tree never reaches.
    pub table_order: Option<TableOrder>,
}

/// Where each struct and field of the decoded tree sat in the source tables,
/// listed in the order the encoder visits them: structs in pre-order, and
/// each struct's fields as one run before any nested struct.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TableOrder {
    pub structs: Vec<u32>,
    /// Field count of each struct in `structs`.
    pub field_counts: Vec<usize>,
    pub fields: Vec<u32>,
}

impl TableOrder {
    /// True when every struct and field entry of the source was visited
    /// exactly once.
    pub(crate) fn covers(&self, struct_count: usize, field_count: usize) -> bool {
        is_permutation(&self.structs, struct_count) && is_permutation(&self.fields, field_count)
    }

    /// True when `root` still has the shape the order was recorded from.
    pub fn fits(&self, root: &Struct) -> bool {
        let mut counts = Vec::with_capacity(self.field_counts.len());
        collect_field_counts(root, &mut counts);
        counts == self.field_counts
    }
}

fn is_permutation(indices: &[u32], len: usize) -> bool {
    if indices.len() != len {
        return false;
    }
    let mut seen = vec![false; len];
    indices.iter().all(|&i| match seen.get_mut(i as usize) {
        Some(slot) if !*slot => {
            *slot = true;
            true
        }
        _ => false,
    })
}

fn collect_field_counts(s: &Struct, out: &mut Vec<usize>) {
    out.push(s.len());
    for field in s.fields() {
        match &field.value {
            Value::Struct(child) => collect_field_counts(child, out),
            Value::List(items) => items.iter().for_each(|item| collect_field_counts(item, out)),
            _ => {}
        }
    }
}

#[derive(Debug, Clone)]
pub struct Document {
    file_type: FileType,
    version: Version,
    vector_layout: VectorLayout,
    root: Struct,
    source: Option<SourceLayout>,
    dirty: bool,
}

impl Document {
    /// Empty document with a root struct of id -1.
    pub fn new(file_type: impl Into<FileType>) -> Self {
        let file_type = file_type.into();
        Self {
            file_type,
            version: Version::default(),
            vector_layout: file_type.vector_layout(),
            root: Struct::new(Struct::ROOT_ID),
            source: None,
            dirty: true,
        }
    }

    pub fn with_root(file_type: impl Into<FileType>, root: Struct) -> Self {
        Self {
            root,
            ..Self::new(file_type)
        }
    }

    pub(crate) fn from_decoded(
        file_type: FileType,
        version: Version,
        vector_layout: VectorLayout,
        root: Struct,
        source: Option<SourceLayout>,
    ) -> Self {
        Self {
            file_type,
            version,
            vector_layout,
            root,
            source,
            dirty: false,
        }
    }

    pub fn decode(bytes: &[u8], expected: impl Into<FileType>) -> Result<Self> {
        decode::decode(bytes, expected)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        encode::encode(self)
    }

    pub fn file_type(&self) -> FileType {
        self.file_type
    }

    pub fn set_file_type(&mut self, file_type: impl Into<FileType>) {
        self.file_type = file_type.into();
        self.dirty = true;
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn set_version(&mut self, version: Version) {
        self.version = version;
        self.dirty = true;
    }

    pub fn vector_layout(&self) -> VectorLayout {
        self.vector_layout
    }

    pub fn set_vector_layout(&mut self, layout: VectorLayout) {
        self.vector_layout = layout;
        self.dirty = true;
    }

    pub fn root(&self) -> &Struct {
        &self.root
    }

    /// Mutable access to the tree. Marks the document dirty.
    pub fn root_mut(&mut self) -> &mut Struct {
        self.dirty = true;
        &mut self.root
    }

    pub fn into_root(self) -> Struct {
        self.root
    }

    /// False for a freshly decoded document until it is mutated.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn source(&self) -> Option<&SourceLayout> {
        self.source.as_ref()
    }

    pub fn get(&self, path: &str) -> std::result::Result<&Value, AccessError> {
        self.root.lookup(&FieldPath::parse(path)?)
    }

    /// Replace the value at `path`, parsing `text` as the existing field's
    /// type.
    pub fn set_from_text(&mut self, path: &str, text: &str) -> std::result::Result<(), AccessError> {
        let path = FieldPath::parse(path)?;
        let slot = self.root_mut().lookup_mut(&path)?;
        *slot = slot.parse_like(text)?;
        Ok(())
    }
}

/// Structural equality: type tag, version and tree. Retained source bytes and
/// the dirty flag are bookkeeping and do not participate.
impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.file_type == other.file_type
            && self.version == other.version
            && self.vector_layout == other.vector_layout
            && self.root == other.root
    }
}
