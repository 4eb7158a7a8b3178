use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;
use crate::model::ids::{ElementId, SetId};

/// The two element categories the catalog knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    /// A stamp.
    Stempel,
    /// A die.
    Stanze,
}

impl ElementKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stempel => "stempel",
            Self::Stanze => "stanze",
        }
    }

    /// Parse an optional kind as entered by a user; blank means unspecified.
    pub fn parse_optional(raw: &str) -> Result<Option<Self>, Error> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(None);
        }
        raw.parse().map(Some)
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ElementKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "stempel" => Ok(Self::Stempel),
            "stanze" => Ok(Self::Stanze),
            other => Err(Error::InvalidData(format!("invalid element kind: {other}"))),
        }
    }
}

/// A sub-component of an item-set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    pub id: ElementId,
    pub set_id: SetId,
    pub name: String,
    pub kind: Option<ElementKind>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_parse_case_insensitive() {
        assert_eq!("Stempel".parse::<ElementKind>().unwrap(), ElementKind::Stempel);
        assert_eq!(" STANZE ".parse::<ElementKind>().unwrap(), ElementKind::Stanze);
    }

    #[test]
    fn test_kind_parse_rejects_unknown() {
        assert!("brush".parse::<ElementKind>().is_err());
    }

    #[test]
    fn test_kind_parse_optional_blank() {
        assert_eq!(ElementKind::parse_optional("  ").unwrap(), None);
        assert_eq!(
            ElementKind::parse_optional("stanze").unwrap(),
            Some(ElementKind::Stanze)
        );
    }
}
