//! Triples and the attributes that name their positions.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::TermId;

/// One of the three positions of a triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Attribute {
    /// The subject position.
    Subject = 0,
    /// The predicate position.
    Predicate = 1,
    /// The object position.
    Object = 2,
}

impl Attribute {
    /// All attributes in S, P, O order.
    pub const ALL: [Self; 3] = [Self::Subject, Self::Predicate, Self::Object];

    /// Returns the position of this attribute inside a triple (0, 1 or 2).
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Subject => write!(f, "S"),
            Self::Predicate => write!(f, "P"),
            Self::Object => write!(f, "O"),
        }
    }
}

/// A (subject, predicate, object) record of surrogate ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Triple {
    /// The subject id.
    pub subject: TermId,
    /// The predicate id.
    pub predicate: TermId,
    /// The object id.
    pub object: TermId,
}

impl Triple {
    /// Creates a new triple.
    #[must_use]
    pub fn new(
        subject: impl Into<TermId>,
        predicate: impl Into<TermId>,
        object: impl Into<TermId>,
    ) -> Self {
        Self {
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.into(),
        }
    }

    /// Returns the id stored at `attribute`.
    #[inline]
    #[must_use]
    pub const fn get(&self, attribute: Attribute) -> TermId {
        match attribute {
            Attribute::Subject => self.subject,
            Attribute::Predicate => self.predicate,
            Attribute::Object => self.object,
        }
    }

    /// Returns the raw ids in S, P, O order.
    #[inline]
    #[must_use]
    pub const fn to_array(&self) -> [u32; 3] {
        [self.subject.0, self.predicate.0, self.object.0]
    }

    /// Builds a triple from raw ids in S, P, O order.
    #[inline]
    #[must_use]
    pub const fn from_array(ids: [u32; 3]) -> Self {
        Self {
            subject: TermId(ids[0]),
            predicate: TermId(ids[1]),
            object: TermId(ids[2]),
        }
    }

    /// Returns `true` when no position holds the reserved id 0.
    #[inline]
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.subject.is_valid() && self.predicate.is_valid() && self.object.is_valid()
    }
}

impl From<(u32, u32, u32)> for Triple {
    fn from((s, p, o): (u32, u32, u32)) -> Self {
        Self::from_array([s, p, o])
    }
}

impl fmt::Display for Triple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.subject, self.predicate, self.object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_by_attribute() {
        let t = Triple::new(1, 2, 3);
        assert_eq!(t.get(Attribute::Subject), TermId(1));
        assert_eq!(t.get(Attribute::Predicate), TermId(2));
        assert_eq!(t.get(Attribute::Object), TermId(3));
        assert_eq!(t.to_array(), [1, 2, 3]);
    }

    #[test]
    fn test_validity() {
        assert!(Triple::new(1, 1, 1).is_valid());
        assert!(!Triple::new(1, 0, 1).is_valid());
    }

    #[test]
    fn test_display() {
        assert_eq!(Triple::from((4, 5, 6)).to_string(), "(4, 5, 6)");
        assert_eq!(Attribute::Predicate.to_string(), "P");
    }
}
