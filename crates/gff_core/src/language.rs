use std::fmt;

use serde::{Deserialize, Serialize};

use crate::gender::Gender;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Language {
    #[default]
    English,
    French,
    German,
    Italian,
    Spanish,
    Polish,
    Korean,
    ChineseTraditional,
    ChineseSimplified,
    Japanese,
    Unknown(u32),
}

const KNOWN: [(Language, u32, &str); 10] = [
    (Language::English, 0, "English"),
    (Language::French, 1, "French"),
    (Language::German, 2, "German"),
    (Language::Italian, 3, "Italian"),
    (Language::Spanish, 4, "Spanish"),
    (Language::Polish, 5, "Polish"),
    (Language::Korean, 128, "Korean"),
    (Language::ChineseTraditional, 129, "ChineseTraditional"),
    (Language::ChineseSimplified, 130, "ChineseSimplified"),
    (Language::Japanese, 131, "Japanese"),
];

impl Language {
    pub fn from_raw(raw: u32) -> Self {
        KNOWN
            .iter()
            .find(|(_, id, _)| *id == raw)
            .map(|(lang, _, _)| *lang)
            .unwrap_or(Self::Unknown(raw))
    }

    pub fn raw(&self) -> u32 {
        match *self {
            Self::Unknown(raw) => raw,
            known => KNOWN
                .iter()
                .find(|(lang, _, _)| *lang == known)
                .map(|(_, id, _)| *id)
                .unwrap_or_default(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        KNOWN
            .iter()
            .find(|(lang, _, _)| lang == self)
            .map(|(_, _, name)| *name)
            .unwrap_or("Unknown")
    }

    pub fn from_name(name: &str) -> Option<Self> {
        KNOWN
            .iter()
            .find(|(_, _, n)| n.eq_ignore_ascii_case(name))
            .map(|(lang, _, _)| *lang)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Unknown(v) => write!(f, "Unknown ({})", v),
            _ => f.write_str(self.as_str()),
        }
    }
}

/// Packs a language and gender into the substring id stored on disk.
///
/// `None` when the language has no id of its own: an `Unknown` value that
/// names a known language, or one too large to leave room for the gender bit.
pub fn substring_id(language: Language, gender: Gender) -> Option<u32> {
    if Language::from_raw(language.raw()) != language {
        return None;
    }
    language.raw().checked_mul(2).map(|id| id | gender.raw())
}

/// Splits an on-disk substring id into its language and gender.
pub fn split_substring_id(id: u32) -> (Language, Gender) {
    (Language::from_raw(id >> 1), Gender::from_id_bit(id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substring_ids_pack_language_and_gender() {
        assert_eq!(substring_id(Language::English, Gender::Male), Some(0));
        assert_eq!(substring_id(Language::French, Gender::Female), Some(3));
        assert_eq!(substring_id(Language::Korean, Gender::Male), Some(256));
        assert_eq!(
            split_substring_id(263),
            (Language::Japanese, Gender::Female)
        );
    }

    #[test]
    fn unknown_languages_survive() {
        let (lang, gender) = split_substring_id(41);
        assert_eq!(lang, Language::Unknown(20));
        assert_eq!(substring_id(lang, gender), Some(41));

        let (lang, gender) = split_substring_id(u32::MAX);
        assert_eq!(lang, Language::Unknown(0x7FFF_FFFF));
        assert_eq!(substring_id(lang, gender), Some(u32::MAX));
    }

    #[test]
    fn languages_without_their_own_id_have_no_substring_id() {
        assert_eq!(substring_id(Language::Unknown(1), Gender::Male), None);
        assert_eq!(substring_id(Language::Unknown(130), Gender::Female), None);
        assert_eq!(
            substring_id(Language::Unknown(0x8000_0000), Gender::Male),
            None
        );
    }
}
