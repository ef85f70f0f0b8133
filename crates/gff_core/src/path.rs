use std::fmt;
use std::str::FromStr;

use crate::error::AccessError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub label: String,
    pub index: Option<usize>,
}

/// Dotted address of a field, e.g. `Mod_Area_list[0].Area_Name`.
///
/// Each segment is a label, optionally followed by `[n]` to select a list
/// entry. The final segment must be a plain label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    containers: Vec<Segment>,
    field: String,
}

impl FieldPath {
    pub fn parse(text: &str) -> Result<Self, AccessError> {
        let bad = |reason: &str| AccessError::BadPath {
            path: text.to_owned(),
            reason: reason.to_owned(),
        };

        if text.is_empty() {
            return Err(bad("path is empty"));
        }

        let mut segments = Vec::new();
        for part in text.split('.') {
            let (label, index) = match part.find('[') {
                Some(open) => {
                    let Some(inner) = part[open + 1..].strip_suffix(']') else {
                        return Err(bad("unterminated list index"));
                    };
                    let index = inner
                        .parse::<usize>()
                        .map_err(|_| bad("list index must be a non-negative integer"))?;
                    (&part[..open], Some(index))
                }
                None => (part, None),
            };
            if label.is_empty() {
                return Err(bad("empty label"));
            }
            segments.push(Segment {
                label: label.to_owned(),
                index,
            });
        }

        let Some(last) = segments.pop() else {
            return Err(bad("path is empty"));
        };
        if last.index.is_some() {
            return Err(bad("path must end at a field, not a list entry"));
        }

        Ok(Self {
            containers: segments,
            field: last.label,
        })
    }

    /// Struct fields and list entries leading to the addressed field.
    pub fn containers(&self) -> &[Segment] {
        &self.containers
    }

    pub fn field(&self) -> &str {
        &self.field
    }
}

impl FromStr for FieldPath {
    type Err = AccessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.containers {
            f.write_str(&segment.label)?;
            if let Some(index) = segment.index {
                write!(f, "[{index}]")?;
            }
            f.write_str(".")?;
        }
        f.write_str(&self.field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nested_list_paths() {
        let path = FieldPath::parse("Categories[1].EntryList[0].Text").unwrap();
        let labels: Vec<_> = path
            .containers()
            .iter()
            .map(|s| (s.label.as_str(), s.index))
            .collect();
        assert_eq!(labels, vec![("Categories", Some(1)), ("EntryList", Some(0))]);
        assert_eq!(path.field(), "Text");
        assert_eq!(path.to_string(), "Categories[1].EntryList[0].Text");
    }

    #[test]
    fn rejects_malformed_paths() {
        for text in ["", "A..B", "List[x].B", "List[1", "List[2]"] {
            assert!(FieldPath::parse(text).is_err(), "{text} should be rejected");
        }
    }
}
