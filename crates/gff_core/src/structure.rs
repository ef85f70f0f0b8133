use serde::{Deserialize, Serialize};

use crate::error::AccessError;
use crate::field_type::FieldType;
use crate::path::{FieldPath, Segment};
use crate::value::{FromValue, LocalizedString, ResRef, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub label: String,
    pub value: Value,
}

impl Field {
    pub fn new(label: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }

    pub fn field_type(&self) -> FieldType {
        self.value.field_type()
    }
}

/// An ordered record of labelled fields with an application-defined id.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Struct {
    pub struct_id: i32,
    fields: Vec<Field>,
}

macro_rules! typed_getters {
    ($($name:ident -> $ty:ty),* $(,)?) => {
        $(
            pub fn $name(&self, label: &str) -> Result<$ty, AccessError> {
                self.get_as::<$ty>(label)
            }
        )*
    };
}

impl Struct {
    pub const ROOT_ID: i32 = -1;

    pub fn new(struct_id: i32) -> Self {
        Self {
            struct_id,
            fields: Vec::new(),
        }
    }

    pub fn with_fields(struct_id: i32, fields: Vec<Field>) -> Self {
        Self { struct_id, fields }
    }

    /// Builder-style [`Struct::set`].
    pub fn with(mut self, label: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(label, value);
        self
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn fields_mut(&mut self) -> &mut Vec<Field> {
        &mut self.fields
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.label.as_str())
    }

    pub fn contains(&self, label: &str) -> bool {
        self.get(label).is_some()
    }

    /// First field with exactly this label.
    pub fn get(&self, label: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|f| f.label == label)
            .map(|f| &f.value)
    }

    pub fn get_mut(&mut self, label: &str) -> Option<&mut Value> {
        self.fields
            .iter_mut()
            .find(|f| f.label == label)
            .map(|f| &mut f.value)
    }

    pub fn get_as<T: FromValue>(&self, label: &str) -> Result<T, AccessError> {
        let value = self.get(label).ok_or_else(|| AccessError::Missing {
            label: label.to_owned(),
        })?;
        T::from_value(value).ok_or_else(|| AccessError::TypeMismatch {
            label: label.to_owned(),
            expected: T::FIELD_TYPE,
            found: value.field_type(),
        })
    }

    typed_getters! {
        get_u8 -> u8,
        get_i8 -> i8,
        get_u16 -> u16,
        get_i16 -> i16,
        get_u32 -> u32,
        get_i32 -> i32,
        get_u64 -> u64,
        get_i64 -> i64,
        get_single -> f32,
        get_double -> f64,
        get_string -> String,
        get_resref -> ResRef,
        get_locstring -> LocalizedString,
        get_binary -> Vec<u8>,
        get_vector3 -> [f32; 3],
        get_vector4 -> [f32; 4],
    }

    pub fn get_struct(&self, label: &str) -> Result<&Struct, AccessError> {
        match self.get(label) {
            Some(Value::Struct(s)) => Ok(s),
            other => Err(wrong_type(label, FieldType::Struct, other)),
        }
    }

    pub fn get_list(&self, label: &str) -> Result<&[Struct], AccessError> {
        match self.get(label) {
            Some(Value::List(items)) => Ok(items),
            other => Err(wrong_type(label, FieldType::List, other)),
        }
    }

    pub fn list_mut(&mut self, label: &str) -> Result<&mut Vec<Struct>, AccessError> {
        let found = self
            .get(label)
            .map(Value::field_type)
            .ok_or_else(|| AccessError::Missing {
                label: label.to_owned(),
            })?;
        match self.get_mut(label) {
            Some(Value::List(items)) => Ok(items),
            _ => Err(AccessError::TypeMismatch {
                label: label.to_owned(),
                expected: FieldType::List,
                found,
            }),
        }
    }

    /// Append to the list `label`, creating an empty list field first if the
    /// label is absent.
    pub fn push_to_list(&mut self, label: &str, item: Struct) -> Result<(), AccessError> {
        if !self.contains(label) {
            self.push_field(Field::new(label, Value::List(Vec::new())));
        }
        self.list_mut(label)?.push(item);
        Ok(())
    }

    /// Replace the first field called `label`, or append a new one. The
    /// replacement may change the field's type.
    pub fn set(&mut self, label: impl Into<String>, value: impl Into<Value>) {
        let label = label.into();
        let value = value.into();
        match self.get_mut(&label) {
            Some(slot) => *slot = value,
            None => self.fields.push(Field { label, value }),
        }
    }

    /// Append without checking for an existing field of the same label.
    pub fn push_field(&mut self, field: Field) {
        self.fields.push(field);
    }

    pub fn remove(&mut self, label: &str) -> Option<Value> {
        let index = self.fields.iter().position(|f| f.label == label)?;
        Some(self.fields.remove(index).value)
    }

    /// Resolve a path such as `Categories[1].Tag`. Every segment but the last
    /// must name a struct field or a list entry; the last names a field.
    pub fn lookup(&self, path: &FieldPath) -> Result<&Value, AccessError> {
        let mut current = self;
        for segment in path.containers() {
            current = current.child_struct(segment, path)?;
        }
        current.get(path.field()).ok_or_else(|| AccessError::Missing {
            label: path.field().to_owned(),
        })
    }

    pub fn lookup_mut(&mut self, path: &FieldPath) -> Result<&mut Value, AccessError> {
        let mut current = self;
        for segment in path.containers() {
            current = current.child_struct_mut(segment, path)?;
        }
        current
            .get_mut(path.field())
            .ok_or_else(|| AccessError::Missing {
                label: path.field().to_owned(),
            })
    }

    fn child_struct(&self, segment: &Segment, path: &FieldPath) -> Result<&Struct, AccessError> {
        let value = self
            .get(&segment.label)
            .ok_or_else(|| AccessError::Missing {
                label: segment.label.clone(),
            })?;
        match (value, segment.index) {
            (Value::Struct(s), None) => Ok(s),
            (Value::List(items), Some(index)) => {
                items
                    .get(index)
                    .ok_or_else(|| AccessError::IndexOutOfRange {
                        label: segment.label.clone(),
                        index,
                        len: items.len(),
                    })
            }
            (other, _) => Err(not_a_container(segment, other, path)),
        }
    }

    fn child_struct_mut(
        &mut self,
        segment: &Segment,
        path: &FieldPath,
    ) -> Result<&mut Struct, AccessError> {
        let value = self
            .get_mut(&segment.label)
            .ok_or_else(|| AccessError::Missing {
                label: segment.label.clone(),
            })?;
        match (value, segment.index) {
            (Value::Struct(s), None) => Ok(s),
            (Value::List(items), Some(index)) => {
                let len = items.len();
                items
                    .get_mut(index)
                    .ok_or_else(|| AccessError::IndexOutOfRange {
                        label: segment.label.clone(),
                        index,
                        len,
                    })
            }
            (other, _) => Err(not_a_container(segment, other, path)),
        }
    }
}

fn not_a_container(segment: &Segment, found: &Value, path: &FieldPath) -> AccessError {
    AccessError::NotAContainer {
        label: segment.label.clone(),
        found: found.field_type(),
        segment: path.to_string(),
    }
}

fn wrong_type(label: &str, expected: FieldType, found: Option<&Value>) -> AccessError {
    match found {
        Some(value) => AccessError::TypeMismatch {
            label: label.to_owned(),
            expected,
            found: value.field_type(),
        },
        None => AccessError::Missing {
            label: label.to_owned(),
        },
    }
}
