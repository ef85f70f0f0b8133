use std::fmt::Write as _;

use gff_core::value::{parse_hex, to_hex};
use gff_core::{
    Document, Field, FieldType, FileType, FormatError, Gender, Language, LocalizedString,
    RESREF_MAX_LEN, ResRef, Struct, Substring, Value, Version, check_label,
};
use serde_json::{Map as JsonMap, Value as JsonValue};
use thiserror::Error;

const INDENT: &str = "  ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextRenderOptions {
    /// Print `#id` after every struct and list entry.
    pub show_struct_ids: bool,
}

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("{path}: expected {expected}")]
    Shape { path: String, expected: &'static str },

    #[error("{path}: unknown field type {name:?}")]
    UnknownType { path: String, name: String },

    #[error("{path}: {reason}")]
    InvalidValue { path: String, reason: String },

    #[error(transparent)]
    Format(#[from] FormatError),
}

// --- JSON ---

pub fn render_json(document: &Document) -> JsonValue {
    let mut out = JsonMap::new();
    out.insert(
        "file_type".to_string(),
        JsonValue::String(document.file_type().as_str().trim_end().to_string()),
    );
    out.insert(
        "version".to_string(),
        JsonValue::String(document.version().to_string()),
    );
    out.insert("root".to_string(), struct_to_json(document.root()));
    JsonValue::Object(out)
}

fn struct_to_json(s: &Struct) -> JsonValue {
    let fields = s
        .fields()
        .iter()
        .map(|field| {
            let mut out = JsonMap::new();
            out.insert("label".to_string(), JsonValue::String(field.label.clone()));
            out.insert(
                "type".to_string(),
                JsonValue::String(field.field_type().name().to_string()),
            );
            out.insert("value".to_string(), value_to_json(&field.value));
            JsonValue::Object(out)
        })
        .collect();

    let mut out = JsonMap::new();
    out.insert("struct_id".to_string(), JsonValue::from(s.struct_id));
    out.insert("fields".to_string(), JsonValue::Array(fields));
    JsonValue::Object(out)
}

fn value_to_json(value: &Value) -> JsonValue {
    match value {
        Value::U8(v) => JsonValue::from(*v),
        Value::I8(v) => JsonValue::from(*v),
        Value::U16(v) => JsonValue::from(*v),
        Value::I16(v) => JsonValue::from(*v),
        Value::U32(v) => JsonValue::from(*v),
        Value::I32(v) => JsonValue::from(*v),
        Value::U64(v) => JsonValue::from(*v),
        Value::I64(v) => JsonValue::from(*v),
        Value::Single(v) => float_to_json(f64::from(*v)),
        Value::Double(v) => float_to_json(*v),
        Value::String(s) => JsonValue::String(s.clone()),
        Value::ResRef(r) => JsonValue::String(r.as_str().to_string()),
        Value::LocString(loc) => locstring_to_json(loc),
        Value::Binary(bytes) => JsonValue::String(to_hex(bytes)),
        Value::Struct(s) => struct_to_json(s),
        Value::List(items) => JsonValue::Array(items.iter().map(struct_to_json).collect()),
        Value::Vector3(v) => floats_to_json(v),
        Value::Vector4(v) => floats_to_json(v),
    }
}

/// Non-finite floats have no JSON number form and are written as strings.
fn float_to_json(v: f64) -> JsonValue {
    if v.is_finite() {
        JsonValue::from(v)
    } else {
        JsonValue::String(v.to_string())
    }
}

fn floats_to_json(values: &[f32]) -> JsonValue {
    JsonValue::Array(values.iter().map(|v| float_to_json(f64::from(*v))).collect())
}

fn locstring_to_json(loc: &LocalizedString) -> JsonValue {
    let substrings = loc
        .substrings
        .iter()
        .map(|sub| {
            let mut out = JsonMap::new();
            out.insert(
                "language".to_string(),
                match sub.language {
                    Language::Unknown(raw) => JsonValue::from(raw),
                    known => JsonValue::String(known.as_str().to_string()),
                },
            );
            out.insert(
                "gender".to_string(),
                JsonValue::String(sub.gender.as_str().to_string()),
            );
            out.insert("text".to_string(), JsonValue::String(sub.text.clone()));
            JsonValue::Object(out)
        })
        .collect();

    let mut out = JsonMap::new();
    out.insert(
        "string_ref".to_string(),
        match loc.string_ref {
            Some(v) => JsonValue::from(v),
            None => JsonValue::Null,
        },
    );
    out.insert("substrings".to_string(), JsonValue::Array(substrings));
    JsonValue::Object(out)
}

// --- JSON import ---

pub fn document_from_json(json: &JsonValue) -> Result<Document, ImportError> {
    let obj = as_object(json, "$")?;
    let file_type: FileType = as_str(member(obj, "file_type", "$")?, "$.file_type")?
        .parse()
        .map_err(|reason| invalid("$.file_type", reason))?;
    let version: Version = as_str(member(obj, "version", "$")?, "$.version")?
        .parse()
        .map_err(|reason| invalid("$.version", reason))?;
    let root = struct_from_json(member(obj, "root", "$")?, "$.root")?;

    let mut document = Document::with_root(file_type, root);
    document.set_version(version);
    Ok(document)
}

fn struct_from_json(json: &JsonValue, path: &str) -> Result<Struct, ImportError> {
    let obj = as_object(json, path)?;
    let id_path = format!("{path}.struct_id");
    let struct_id = member(obj, "struct_id", path)?
        .as_i64()
        .and_then(|v| i32::try_from(v).ok())
        .ok_or_else(|| shape(&id_path, "32-bit signed integer"))?;

    let fields_path = format!("{path}.fields");
    let entries = member(obj, "fields", path)?
        .as_array()
        .ok_or_else(|| shape(&fields_path, "array"))?;

    let mut fields = Vec::with_capacity(entries.len());
    for (i, entry) in entries.iter().enumerate() {
        let entry_path = format!("{fields_path}[{i}]");
        let entry_obj = as_object(entry, &entry_path)?;
        let label = as_str(
            member(entry_obj, "label", &entry_path)?,
            &format!("{entry_path}.label"),
        )?;
        check_label(label)?;
        let type_name = as_str(
            member(entry_obj, "type", &entry_path)?,
            &format!("{entry_path}.type"),
        )?;
        let field_type =
            FieldType::from_name(type_name).ok_or_else(|| ImportError::UnknownType {
                path: format!("{entry_path}.type"),
                name: type_name.to_string(),
            })?;
        let value = value_from_json(
            field_type,
            member(entry_obj, "value", &entry_path)?,
            &format!("{entry_path}.value"),
        )?;
        fields.push(Field::new(label, value));
    }

    Ok(Struct::with_fields(struct_id, fields))
}

fn value_from_json(
    field_type: FieldType,
    json: &JsonValue,
    path: &str,
) -> Result<Value, ImportError> {
    Ok(match field_type {
        FieldType::U8 => Value::U8(unsigned(json, path)?),
        FieldType::I8 => Value::I8(signed(json, path)?),
        FieldType::U16 => Value::U16(unsigned(json, path)?),
        FieldType::I16 => Value::I16(signed(json, path)?),
        FieldType::U32 => Value::U32(unsigned(json, path)?),
        FieldType::I32 => Value::I32(signed(json, path)?),
        FieldType::U64 => Value::U64(unsigned(json, path)?),
        FieldType::I64 => Value::I64(signed(json, path)?),
        FieldType::Single => Value::Single(float(json, path)? as f32),
        FieldType::Double => Value::Double(float(json, path)?),
        FieldType::String => Value::String(as_str(json, path)?.to_string()),
        FieldType::ResRef => {
            let name = as_str(json, path)?;
            if name.len() > RESREF_MAX_LEN {
                return Err(FormatError::ResRefTooLong {
                    resref: name.to_string(),
                    len: name.len(),
                }
                .into());
            }
            Value::ResRef(ResRef::new(name))
        }
        FieldType::LocString => Value::LocString(locstring_from_json(json, path)?),
        FieldType::Binary => {
            Value::Binary(parse_hex(as_str(json, path)?).map_err(|reason| invalid(path, reason))?)
        }
        FieldType::Struct => Value::Struct(struct_from_json(json, path)?),
        FieldType::List => {
            let items = json.as_array().ok_or_else(|| shape(path, "array"))?;
            let mut list = Vec::with_capacity(items.len());
            for (i, item) in items.iter().enumerate() {
                list.push(struct_from_json(item, &format!("{path}[{i}]"))?);
            }
            Value::List(list)
        }
        FieldType::Vector3 => Value::Vector3(float_array(json, path)?),
        FieldType::Vector4 => Value::Vector4(float_array(json, path)?),
    })
}

fn locstring_from_json(json: &JsonValue, path: &str) -> Result<LocalizedString, ImportError> {
    let obj = as_object(json, path)?;
    let ref_path = format!("{path}.string_ref");
    let string_ref = match member(obj, "string_ref", path)? {
        JsonValue::Null => None,
        other => match unsigned::<u32>(other, &ref_path)? {
            LocalizedString::NO_STRING_REF => {
                return Err(invalid(
                    &ref_path,
                    "0xFFFFFFFF is reserved, use null".to_string(),
                ));
            }
            v => Some(v),
        },
    };

    let subs_path = format!("{path}.substrings");
    let entries = member(obj, "substrings", path)?
        .as_array()
        .ok_or_else(|| shape(&subs_path, "array"))?;

    let mut substrings = Vec::with_capacity(entries.len());
    for (i, entry) in entries.iter().enumerate() {
        let entry_path = format!("{subs_path}[{i}]");
        let entry_obj = as_object(entry, &entry_path)?;

        let lang_path = format!("{entry_path}.language");
        let language = match member(entry_obj, "language", &entry_path)? {
            JsonValue::String(name) => Language::from_name(name)
                .ok_or_else(|| invalid(&lang_path, format!("unknown language {name:?}")))?,
            other => Language::from_raw(unsigned(other, &lang_path)?),
        };

        let gender_path = format!("{entry_path}.gender");
        let gender = match member(entry_obj, "gender", &entry_path)? {
            JsonValue::String(name) => Gender::from_name(name)
                .ok_or_else(|| invalid(&gender_path, format!("unknown gender {name:?}")))?,
            other => {
                let raw = unsigned(other, &gender_path)?;
                Gender::from_raw(raw)
                    .ok_or_else(|| invalid(&gender_path, format!("{raw} is not 0 or 1")))?
            }
        };

        let text = as_str(
            member(entry_obj, "text", &entry_path)?,
            &format!("{entry_path}.text"),
        )?;
        substrings.push(Substring {
            language,
            gender,
            text: text.to_string(),
        });
    }

    Ok(LocalizedString {
        string_ref,
        substrings,
    })
}

fn member<'a>(
    obj: &'a JsonMap<String, JsonValue>,
    key: &str,
    path: &str,
) -> Result<&'a JsonValue, ImportError> {
    obj.get(key).ok_or_else(|| ImportError::InvalidValue {
        path: path.to_string(),
        reason: format!("missing {key:?}"),
    })
}

fn as_object<'a>(
    json: &'a JsonValue,
    path: &str,
) -> Result<&'a JsonMap<String, JsonValue>, ImportError> {
    json.as_object().ok_or_else(|| shape(path, "object"))
}

fn as_str<'a>(json: &'a JsonValue, path: &str) -> Result<&'a str, ImportError> {
    json.as_str().ok_or_else(|| shape(path, "string"))
}

fn unsigned<T: TryFrom<u64>>(json: &JsonValue, path: &str) -> Result<T, ImportError> {
    let v = json
        .as_u64()
        .ok_or_else(|| shape(path, "non-negative integer"))?;
    T::try_from(v).map_err(|_| invalid(path, format!("{v} is out of range")))
}

fn signed<T: TryFrom<i64>>(json: &JsonValue, path: &str) -> Result<T, ImportError> {
    let v = json.as_i64().ok_or_else(|| shape(path, "integer"))?;
    T::try_from(v).map_err(|_| invalid(path, format!("{v} is out of range")))
}

fn float(json: &JsonValue, path: &str) -> Result<f64, ImportError> {
    match json {
        JsonValue::String(s) => s
            .parse()
            .map_err(|_| invalid(path, format!("{s:?} is not a number"))),
        other => other.as_f64().ok_or_else(|| shape(path, "number")),
    }
}

fn float_array<const N: usize>(json: &JsonValue, path: &str) -> Result<[f32; N], ImportError> {
    let items = json.as_array().ok_or_else(|| shape(path, "array"))?;
    if items.len() != N {
        return Err(invalid(
            path,
            format!("expected {N} components, found {}", items.len()),
        ));
    }
    let mut out = [0f32; N];
    for (i, (slot, item)) in out.iter_mut().zip(items).enumerate() {
        *slot = float(item, &format!("{path}[{i}]"))? as f32;
    }
    Ok(out)
}

fn shape(path: &str, expected: &'static str) -> ImportError {
    ImportError::Shape {
        path: path.to_string(),
        expected,
    }
}

fn invalid(path: &str, reason: String) -> ImportError {
    ImportError::InvalidValue {
        path: path.to_string(),
        reason,
    }
}

// --- Text ---

pub fn render_text(document: &Document, options: TextRenderOptions) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} {}",
        document.file_type().as_str().trim_end(),
        document.version()
    );
    if options.show_struct_ids {
        let _ = writeln!(out, "root #{}", document.root().struct_id);
    }
    write_struct(&mut out, document.root(), 0, options);
    out
}

fn write_struct(out: &mut String, s: &Struct, depth: usize, options: TextRenderOptions) {
    for field in s.fields() {
        let indent = INDENT.repeat(depth);
        match &field.value {
            Value::Struct(child) => {
                let _ = write!(out, "{indent}{}: struct", field.label);
                if options.show_struct_ids {
                    let _ = write!(out, " #{}", child.struct_id);
                }
                out.push('\n');
                write_struct(out, child, depth + 1, options);
            }
            Value::List(items) => {
                let _ = writeln!(out, "{indent}{}: list ({})", field.label, items.len());
                for (i, item) in items.iter().enumerate() {
                    let _ = write!(out, "{indent}{INDENT}[{i}]");
                    if options.show_struct_ids {
                        let _ = write!(out, " #{}", item.struct_id);
                    }
                    out.push('\n');
                    write_struct(out, item, depth + 2, options);
                }
            }
            value => {
                let _ = writeln!(
                    out,
                    "{indent}{}: {} = {}",
                    field.label,
                    value.field_type(),
                    render_value(value)
                );
            }
        }
    }
}

/// One-line form of a value. Scalars use the same syntax that
/// [`Value::parse_like`] accepts, apart from strings, which are quoted.
pub fn render_value(value: &Value) -> String {
    match value {
        Value::U8(v) => v.to_string(),
        Value::I8(v) => v.to_string(),
        Value::U16(v) => v.to_string(),
        Value::I16(v) => v.to_string(),
        Value::U32(v) => v.to_string(),
        Value::I32(v) => v.to_string(),
        Value::U64(v) => v.to_string(),
        Value::I64(v) => v.to_string(),
        Value::Single(v) => v.to_string(),
        Value::Double(v) => v.to_string(),
        Value::String(s) => format!("{s:?}"),
        Value::ResRef(r) => r.to_string(),
        Value::LocString(loc) => render_locstring(loc),
        Value::Binary(bytes) => to_hex(bytes),
        Value::Struct(s) => format!("struct #{} ({} fields)", s.struct_id, s.len()),
        Value::List(items) => format!("list ({} entries)", items.len()),
        Value::Vector3(v) => join_floats(v),
        Value::Vector4(v) => join_floats(v),
    }
}

fn render_locstring(loc: &LocalizedString) -> String {
    let mut out = match loc.string_ref {
        Some(v) => format!("strref {v}"),
        None => "strref none".to_string(),
    };
    for sub in &loc.substrings {
        let _ = write!(out, ", {}/{} {:?}", sub.language, sub.gender, sub.text);
    }
    out
}

fn join_floats(values: &[f32]) -> String {
    values
        .iter()
        .map(f32::to_string)
        .collect::<Vec<_>>()
        .join(",")
}
