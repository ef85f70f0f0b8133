use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::AccessError;
use crate::field_type::FieldType;
use crate::gender::Gender;
use crate::language::Language;
use crate::structure::Struct;

pub const RESREF_MAX_LEN: usize = 16;

/// Short resource name, at most 16 bytes once encoded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ResRef(String);

impl ResRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_valid(&self) -> bool {
        self.0.len() <= RESREF_MAX_LEN
    }
}

impl fmt::Display for ResRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResRef {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Substring {
    pub language: Language,
    pub gender: Gender,
    pub text: String,
}

/// A string-table reference plus inline per-language text.
///
/// `string_ref` is `None` when the file stores `0xFFFFFFFF`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LocalizedString {
    pub string_ref: Option<u32>,
    pub substrings: Vec<Substring>,
}

impl LocalizedString {
    pub const NO_STRING_REF: u32 = 0xFFFF_FFFF;

    pub fn from_string_ref(string_ref: u32) -> Self {
        Self {
            string_ref: Self::ref_from_raw(string_ref),
            substrings: Vec::new(),
        }
    }

    pub fn ref_from_raw(raw: u32) -> Option<u32> {
        (raw != Self::NO_STRING_REF).then_some(raw)
    }

    pub fn raw_string_ref(&self) -> u32 {
        self.string_ref.unwrap_or(Self::NO_STRING_REF)
    }

    pub fn get(&self, language: Language, gender: Gender) -> Option<&str> {
        self.substrings
            .iter()
            .find(|s| s.language == language && s.gender == gender)
            .map(|s| s.text.as_str())
    }

    /// Replace the text for `(language, gender)` or append a new substring.
    pub fn set(&mut self, language: Language, gender: Gender, text: impl Into<String>) {
        let text = text.into();
        match self
            .substrings
            .iter_mut()
            .find(|s| s.language == language && s.gender == gender)
        {
            Some(existing) => existing.text = text,
            None => self.substrings.push(Substring {
                language,
                gender,
                text,
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    U8(u8),
    I8(i8),
    U16(u16),
    I16(i16),
    U32(u32),
    I32(i32),
    U64(u64),
    I64(i64),
    Single(f32),
    Double(f64),
    String(String),
    ResRef(ResRef),
    LocString(LocalizedString),
    Binary(Vec<u8>),
    Struct(Struct),
    List(Vec<Struct>),
    Vector3([f32; 3]),
    Vector4([f32; 4]),
}

impl Value {
    pub fn field_type(&self) -> FieldType {
        match self {
            Self::U8(_) => FieldType::U8,
            Self::I8(_) => FieldType::I8,
            Self::U16(_) => FieldType::U16,
            Self::I16(_) => FieldType::I16,
            Self::U32(_) => FieldType::U32,
            Self::I32(_) => FieldType::I32,
            Self::U64(_) => FieldType::U64,
            Self::I64(_) => FieldType::I64,
            Self::Single(_) => FieldType::Single,
            Self::Double(_) => FieldType::Double,
            Self::String(_) => FieldType::String,
            Self::ResRef(_) => FieldType::ResRef,
            Self::LocString(_) => FieldType::LocString,
            Self::Binary(_) => FieldType::Binary,
            Self::Struct(_) => FieldType::Struct,
            Self::List(_) => FieldType::List,
            Self::Vector3(_) => FieldType::Vector3,
            Self::Vector4(_) => FieldType::Vector4,
        }
    }

    /// Parse `text` into a value of the same type as `self`.
    ///
    /// Localized strings keep their string reference and replace the
    /// English/male substring. Vectors are written `x,y,z[,w]`. Binary is hex.
    pub fn parse_like(&self, text: &str) -> Result<Value, AccessError> {
        let expected = self.field_type();
        let invalid = |reason: String| AccessError::InvalidText {
            text: text.to_owned(),
            expected,
            reason,
        };
        let t = text.trim();

        Ok(match self {
            Self::U8(_) => Self::U8(t.parse().map_err(|e| invalid(format!("{e}")))?),
            Self::I8(_) => Self::I8(t.parse().map_err(|e| invalid(format!("{e}")))?),
            Self::U16(_) => Self::U16(t.parse().map_err(|e| invalid(format!("{e}")))?),
            Self::I16(_) => Self::I16(t.parse().map_err(|e| invalid(format!("{e}")))?),
            Self::U32(_) => Self::U32(t.parse().map_err(|e| invalid(format!("{e}")))?),
            Self::I32(_) => Self::I32(t.parse().map_err(|e| invalid(format!("{e}")))?),
            Self::U64(_) => Self::U64(t.parse().map_err(|e| invalid(format!("{e}")))?),
            Self::I64(_) => Self::I64(t.parse().map_err(|e| invalid(format!("{e}")))?),
            Self::Single(_) => Self::Single(t.parse().map_err(|e| invalid(format!("{e}")))?),
            Self::Double(_) => Self::Double(t.parse().map_err(|e| invalid(format!("{e}")))?),
            Self::String(_) => Self::String(text.to_owned()),
            Self::ResRef(_) => {
                if text.len() > RESREF_MAX_LEN {
                    return Err(invalid(format!(
                        "{} bytes, limit is {RESREF_MAX_LEN}",
                        text.len()
                    )));
                }
                Self::ResRef(ResRef::new(text))
            }
            Self::LocString(existing) => {
                let mut loc = existing.clone();
                loc.set(Language::English, Gender::Male, text);
                Self::LocString(loc)
            }
            Self::Binary(_) => Self::Binary(parse_hex(t).map_err(invalid)?),
            Self::Vector3(_) => Self::Vector3(parse_floats::<3>(t).map_err(invalid)?),
            Self::Vector4(_) => Self::Vector4(parse_floats::<4>(t).map_err(invalid)?),
            Self::Struct(_) | Self::List(_) => {
                return Err(invalid("containers cannot be set from text".to_owned()));
            }
        })
    }
}

pub fn parse_hex(text: &str) -> Result<Vec<u8>, String> {
    if text.len() % 2 != 0 {
        return Err("hex input must have an even number of digits".to_owned());
    }
    (0..text.len())
        .step_by(2)
        .map(|i| {
            text.get(i..i + 2)
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                .ok_or_else(|| format!("invalid hex digits at position {i}"))
        })
        .collect()
}

pub fn to_hex(bytes: &[u8]) -> String {
    use std::fmt::Write as _;

    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(out, "{b:02x}");
    }
    out
}

fn parse_floats<const N: usize>(text: &str) -> Result<[f32; N], String> {
    let parts: Vec<&str> = text.split(',').map(str::trim).collect();
    if parts.len() != N {
        return Err(format!("expected {N} comma-separated numbers"));
    }
    let mut out = [0f32; N];
    for (slot, part) in out.iter_mut().zip(parts) {
        *slot = part.parse().map_err(|e| format!("{part:?}: {e}"))?;
    }
    Ok(out)
}

macro_rules! value_conversions {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v)
                }
            }

            impl FromValue for $ty {
                const FIELD_TYPE: FieldType = FieldType::$variant;

                fn from_value(value: &Value) -> Option<Self> {
                    match value {
                        Value::$variant(v) => Some(v.clone()),
                        _ => None,
                    }
                }
            }
        )*
    };
}

/// Typed extraction used by [`Struct::get_as`](crate::Struct::get_as).
pub trait FromValue: Sized {
    const FIELD_TYPE: FieldType;

    fn from_value(value: &Value) -> Option<Self>;
}

value_conversions! {
    u8 => U8,
    i8 => I8,
    u16 => U16,
    i16 => I16,
    u32 => U32,
    i32 => I32,
    u64 => U64,
    i64 => I64,
    f32 => Single,
    f64 => Double,
    String => String,
    ResRef => ResRef,
    LocalizedString => LocString,
    Vec<u8> => Binary,
    Struct => Struct,
    Vec<Struct> => List,
    [f32; 3] => Vector3,
    [f32; 4] => Vector4,
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_like_keeps_the_field_type() {
        assert_eq!(Value::I32(0).parse_like("-42"), Ok(Value::I32(-42)));
        assert_eq!(
            Value::Vector3([0.0; 3]).parse_like("1, 2.5, -3"),
            Ok(Value::Vector3([1.0, 2.5, -3.0]))
        );
        assert_eq!(
            Value::Binary(vec![]).parse_like("00ff10"),
            Ok(Value::Binary(vec![0x00, 0xff, 0x10]))
        );
        assert!(Value::U8(0).parse_like("300").is_err());
        assert!(
            Value::ResRef(ResRef::default())
                .parse_like("a_name_that_is_far_too_long")
                .is_err()
        );
    }

    #[test]
    fn parse_like_updates_english_substring() {
        let mut loc = LocalizedString::from_string_ref(12);
        loc.set(Language::French, Gender::Male, "Bonjour");
        let updated = Value::LocString(loc).parse_like("Hello").unwrap();
        let Value::LocString(loc) = updated else {
            panic!("expected a localized string");
        };
        assert_eq!(loc.string_ref, Some(12));
        assert_eq!(loc.get(Language::English, Gender::Male), Some("Hello"));
        assert_eq!(loc.get(Language::French, Gender::Male), Some("Bonjour"));
    }

    #[test]
    fn sentinel_string_ref_is_none() {
        assert_eq!(LocalizedString::from_string_ref(0xFFFF_FFFF).string_ref, None);
        assert_eq!(LocalizedString::default().raw_string_ref(), 0xFFFF_FFFF);
    }

    #[test]
    fn hex_helpers_agree() {
        assert_eq!(to_hex(&[0xde, 0xad, 0x01]), "dead01");
        assert_eq!(parse_hex("dead01"), Ok(vec![0xde, 0xad, 0x01]));
        assert!(parse_hex("abc").is_err());
    }
}
