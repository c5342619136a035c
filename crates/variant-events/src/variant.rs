//! Variant and Gender Tags
//!
//! The two competing variants plus the "could not be categorized" tag, and the
//! speaker gender carried by every exemplar.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Category of an exemplar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Variant {
    #[serde(rename = "A")]
    A,
    #[serde(rename = "B")]
    B,
    /// A percept too dissimilar from both categories to be stored.
    #[serde(rename = "undefined")]
    Undefined,
}

impl Variant {
    /// Whether this is one of the two storable categories.
    pub fn is_defined(self) -> bool {
        !matches!(self, Variant::Undefined)
    }

    /// Index into per-category tables (`A` = 0, `B` = 1).
    pub fn index(self) -> Option<usize> {
        match self {
            Variant::A => Some(0),
            Variant::B => Some(1),
            Variant::Undefined => None,
        }
    }

    /// The two storable categories in index order.
    pub fn defined() -> [Variant; 2] {
        [Variant::A, Variant::B]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Variant::A => "A",
            Variant::B => "B",
            Variant::Undefined => "undefined",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a tag string is not recognized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseTagError(pub String);

impl fmt::Display for ParseTagError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unrecognized tag: {:?}", self.0)
    }
}

impl std::error::Error for ParseTagError {}

impl FromStr for Variant {
    type Err = ParseTagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A" | "a" => Ok(Variant::A),
            "B" | "b" => Ok(Variant::B),
            "undefined" => Ok(Variant::Undefined),
            other => Err(ParseTagError(other.to_string())),
        }
    }
}

/// Speaker gender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    #[serde(rename = "m")]
    Male,
    #[serde(rename = "f")]
    Female,
}

impl Gender {
    pub fn as_str(self) -> &'static str {
        match self {
            Gender::Male => "m",
            Gender::Female => "f",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = ParseTagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "m" => Ok(Gender::Male),
            "f" => Ok(Gender::Female),
            other => Err(ParseTagError(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variant_serialization() {
        assert_eq!(serde_json::to_string(&Variant::A).unwrap(), r#""A""#);
        assert_eq!(serde_json::to_string(&Variant::B).unwrap(), r#""B""#);
        assert_eq!(serde_json::to_string(&Variant::Undefined).unwrap(), r#""undefined""#);
    }

    #[test]
    fn test_variant_index() {
        assert_eq!(Variant::A.index(), Some(0));
        assert_eq!(Variant::B.index(), Some(1));
        assert_eq!(Variant::Undefined.index(), None);
        assert!(!Variant::Undefined.is_defined());
    }

    #[test]
    fn test_tag_parsing() {
        assert_eq!("A".parse::<Variant>().unwrap(), Variant::A);
        assert_eq!("undefined".parse::<Variant>().unwrap(), Variant::Undefined);
        assert!("C".parse::<Variant>().is_err());
        assert_eq!("f".parse::<Gender>().unwrap(), Gender::Female);
        assert!("x".parse::<Gender>().is_err());
    }
}
