//! Triple patterns: the building blocks of a basic graph pattern query.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{Attribute, TermId, VarId};

/// One position of a triple pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Term {
    /// A fixed surrogate id.
    Constant(TermId),
    /// A join variable.
    Variable(VarId),
}

impl Term {
    /// Shorthand for a constant term.
    #[must_use]
    pub const fn constant(id: u32) -> Self {
        Self::Constant(TermId(id))
    }

    /// Shorthand for a variable term.
    #[must_use]
    pub const fn var(id: u32) -> Self {
        Self::Variable(VarId(id))
    }

    /// Returns the variable, if this term is one.
    #[must_use]
    pub const fn as_variable(&self) -> Option<VarId> {
        match self {
            Self::Variable(v) => Some(*v),
            Self::Constant(_) => None,
        }
    }

    /// Returns the constant, if this term is one.
    #[must_use]
    pub const fn as_constant(&self) -> Option<TermId> {
        match self {
            Self::Constant(c) => Some(*c),
            Self::Variable(_) => None,
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Constant(c) => write!(f, "{c}"),
            Self::Variable(v) => write!(f, "{v}"),
        }
    }
}

/// A triple whose positions are constants or variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TriplePattern {
    /// Subject term.
    pub subject: Term,
    /// Predicate term.
    pub predicate: Term,
    /// Object term.
    pub object: Term,
}

impl TriplePattern {
    /// Creates a new pattern.
    #[must_use]
    pub const fn new(subject: Term, predicate: Term, object: Term) -> Self {
        Self {
            subject,
            predicate,
            object,
        }
    }

    /// Returns the term at `attribute`.
    #[inline]
    #[must_use]
    pub const fn term(&self, attribute: Attribute) -> Term {
        match attribute {
            Attribute::Subject => self.subject,
            Attribute::Predicate => self.predicate,
            Attribute::Object => self.object,
        }
    }

    /// Returns the position holding `var`, checking S, then P, then O.
    #[must_use]
    pub fn attribute_of(&self, var: VarId) -> Option<Attribute> {
        Attribute::ALL
            .into_iter()
            .find(|&a| self.term(a).as_variable() == Some(var))
    }

    /// Iterates over the variables of this pattern in S, P, O order.
    pub fn variables(&self) -> impl Iterator<Item = (Attribute, VarId)> + '_ {
        Attribute::ALL
            .into_iter()
            .filter_map(|a| self.term(a).as_variable().map(|v| (a, v)))
    }

    /// Returns `true` when every position is a constant.
    #[must_use]
    pub fn is_ground(&self) -> bool {
        self.variables().next().is_none()
    }
}

impl fmt::Display for TriplePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.subject, self.predicate, self.object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_of() {
        let p = TriplePattern::new(Term::var(0), Term::constant(1), Term::var(1));
        assert_eq!(p.attribute_of(VarId(0)), Some(Attribute::Subject));
        assert_eq!(p.attribute_of(VarId(1)), Some(Attribute::Object));
        assert_eq!(p.attribute_of(VarId(7)), None);
    }

    #[test]
    fn test_variables_order() {
        let p = TriplePattern::new(Term::var(4), Term::var(2), Term::constant(9));
        let vars: Vec<_> = p.variables().collect();
        assert_eq!(
            vars,
            vec![(Attribute::Subject, VarId(4)), (Attribute::Predicate, VarId(2))]
        );
        assert!(!p.is_ground());
    }

    #[test]
    fn test_display() {
        let p = TriplePattern::new(Term::var(0), Term::constant(1), Term::constant(3));
        assert_eq!(p.to_string(), "?0 1 3");
        assert!(
            TriplePattern::new(Term::constant(1), Term::constant(1), Term::constant(2))
                .is_ground()
        );
    }
}
