//! Identifier types for terms and query variables.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Surrogate id of an RDF term.
///
/// Ids are assigned by an external dictionary. The value 0 is reserved as
/// "no value": tries use it as their terminator label and leaps report an
/// exhausted level with it, so real ids start at 1.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[repr(transparent)]
pub struct TermId(pub u32);

impl TermId {
    /// The reserved "no value" id.
    pub const NONE: Self = Self(0);

    /// Creates a new TermId from a raw u32 value.
    #[inline]
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw u32 value.
    #[inline]
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    /// Checks if this id may appear in a triple.
    #[inline]
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Debug for TermId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "TermId({})", self.0)
        } else {
            write!(f, "TermId(NONE)")
        }
    }
}

impl fmt::Display for TermId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for TermId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl From<TermId> for u32 {
    fn from(id: TermId) -> Self {
        id.0
    }
}

/// A query variable token.
///
/// Variables are small integers handed out by whoever builds the query;
/// their numeric value carries no meaning beyond identity.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[repr(transparent)]
pub struct VarId(pub u32);

impl VarId {
    /// Creates a new VarId from a raw u32 value.
    #[inline]
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw u32 value.
    #[inline]
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for VarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VarId({})", self.0)
    }
}

impl fmt::Display for VarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "?{}", self.0)
    }
}

impl From<u32> for VarId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_term_id_none() {
        assert!(!TermId::NONE.is_valid());
        assert!(TermId::new(1).is_valid());
        assert_eq!(format!("{:?}", TermId::NONE), "TermId(NONE)");
        assert_eq!(format!("{:?}", TermId(9)), "TermId(9)");
    }

    #[test]
    fn test_conversions() {
        let id: TermId = 17u32.into();
        assert_eq!(u32::from(id), 17);
        assert_eq!(id.as_u32(), 17);
        assert_eq!(VarId::from(3).to_string(), "?3");
    }

    #[test]
    fn test_ordering_follows_raw_value() {
        assert!(TermId(2) < TermId(10));
        assert!(VarId(0) < VarId(1));
    }
}
