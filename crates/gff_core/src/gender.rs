use std::fmt;

use serde::{Deserialize, Serialize};

/// Grammatical gender of a localized substring. On disk it is the low bit of
/// the substring id, so there is no room for any other value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Gender {
    #[default]
    Male = 0,
    Female = 1,
}

impl Gender {
    /// Gender carried by the low bit of a substring id.
    pub fn from_id_bit(id: u32) -> Self {
        if id & 1 == 0 { Self::Male } else { Self::Female }
    }

    pub fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(Self::Male),
            1 => Some(Self::Female),
            _ => None,
        }
    }

    pub fn raw(self) -> u32 {
        self as u32
    }

    pub fn from_name(name: &str) -> Option<Self> {
        [Self::Male, Self::Female]
            .into_iter()
            .find(|g| g.as_str().eq_ignore_ascii_case(name))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Male => "Male",
            Self::Female => "Female",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
