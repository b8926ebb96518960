//! Cardinality estimates that drive the variable order.

use std::fmt;
use tristore_common::VarId;

use super::TrieIterator;
use crate::index::trie::TrieCapability;

/// How a variable's weight is estimated from one of its iterators.
///
/// The weight of a variable is the minimum estimate over all iterators that
/// mention it; the variable order binds the lightest variable first. Both
/// estimates are read straight off the trie layout in O(1).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum CardinalityEstimator {
    /// Number of triples below the fixed prefix of the pattern.
    #[default]
    SubtreeSize,
    /// Number of distinct values the variable can take next.
    DistinctCount,
}

impl CardinalityEstimator {
    /// Estimates how many values `var` contributes through `iter`.
    #[must_use]
    pub fn estimate<T: TrieCapability>(self, iter: &TrieIterator<'_, T>, var: VarId) -> u64 {
        match self {
            Self::SubtreeSize => iter.subtree_size(var),
            Self::DistinctCount => iter.distinct_values(var),
        }
    }

    /// Short lowercase name, as used in configuration and logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::SubtreeSize => "subtree-size",
            Self::DistinctCount => "distinct-count",
        }
    }
}

impl fmt::Display for CardinalityEstimator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::trie::SixTrieIndex;
    use tristore_common::{Term, Triple, TriplePattern};

    #[test]
    fn test_estimators_disagree_on_fan_out() {
        // Subject 1 has one predicate but many objects
        let index = SixTrieIndex::from_triples((1..=5).map(|o| Triple::new(1, 7, o)));
        let pattern = TriplePattern::new(Term::constant(1), Term::var(0), Term::var(1));
        let iter = TrieIterator::new(&index, pattern);

        assert_eq!(CardinalityEstimator::SubtreeSize.estimate(&iter, VarId(0)), 5);
        assert_eq!(CardinalityEstimator::DistinctCount.estimate(&iter, VarId(0)), 1);
        assert_eq!(CardinalityEstimator::DistinctCount.estimate(&iter, VarId(1)), 5);
    }

    #[test]
    fn test_default_and_names() {
        assert_eq!(CardinalityEstimator::default(), CardinalityEstimator::SubtreeSize);
        assert_eq!(CardinalityEstimator::DistinctCount.to_string(), "distinct-count");
    }
}
