//! Attribute permutations of the six-trie index.
//!
//! A permutation names the attribute stored at each trie level. The six
//! orders come in pairs sharing a root attribute: SPO/SOP, POS/PSO and
//! OSP/OPS. The even member of each pair is the full trie, the odd member is
//! the partial one that borrows its sibling's root level.
//!
//! [`choose_trie`] is the table iterators use to decide which trie answers a
//! lookup, given what is already bound.

use tristore_common::Attribute;

use Attribute::{Object as O, Predicate as P, Subject as S};

/// Number of tries in the index.
pub const TRIE_COUNT: usize = 6;

/// An attribute order, root first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Permutation {
    order: [Attribute; 3],
}

/// The six permutations, indexed by trie number.
pub const PERMUTATIONS: [Permutation; TRIE_COUNT] = [
    Permutation::new([S, P, O]),
    Permutation::new([S, O, P]),
    Permutation::new([P, O, S]),
    Permutation::new([P, S, O]),
    Permutation::new([O, S, P]),
    Permutation::new([O, P, S]),
];

impl Permutation {
    /// Creates a permutation from its level order.
    #[must_use]
    pub const fn new(order: [Attribute; 3]) -> Self {
        Self { order }
    }

    /// Returns the attribute stored at `level` (0 = root).
    #[inline]
    #[must_use]
    pub const fn attribute(&self, level: usize) -> Attribute {
        self.order[level]
    }

    /// Returns the root attribute.
    #[inline]
    #[must_use]
    pub const fn root(&self) -> Attribute {
        self.order[0]
    }

    /// Rearranges ids given in S, P, O order into this trie's level order.
    #[inline]
    #[must_use]
    pub const fn arrange(&self, spo: [u32; 3]) -> [u32; 3] {
        [
            spo[self.order[0].index()],
            spo[self.order[1].index()],
            spo[self.order[2].index()],
        ]
    }

    /// Inverse of [`arrange`](Self::arrange): level order back to S, P, O.
    #[inline]
    #[must_use]
    pub const fn restore(&self, key: [u32; 3]) -> [u32; 3] {
        let mut spo = [0; 3];
        spo[self.order[0].index()] = key[0];
        spo[self.order[1].index()] = key[1];
        spo[self.order[2].index()] = key[2];
        spo
    }

    /// Short name such as `"SPO"`.
    #[must_use]
    pub fn name(&self) -> String {
        self.order.iter().map(ToString::to_string).collect()
    }
}

/// Returns whether trie `trie` is the partial member of its pair.
#[inline]
#[must_use]
pub const fn is_partial(trie: usize) -> bool {
    trie & 1 == 1
}

/// Which trie to read and which of the iterator's two cursors to read it
/// through. Slot 0 follows the full trie of the bound root, slot 1 its
/// partial sibling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrieChoice {
    /// Trie number in the index.
    pub trie: usize,
    /// Cursor slot (0 = full, 1 = partial).
    pub slot: usize,
}

/// Picks the trie that lists the values of `next` once `bound` is fixed.
///
/// | bound | next | trie | slot |
/// |-------|------|------|------|
/// | none | a | 2a | 0 |
/// | S | P | 0 (SPO) | 0 |
/// | S | O | 1 (SOP) | 1 |
/// | P | O | 2 (POS) | 0 |
/// | P | S | 3 (PSO) | 1 |
/// | O | S | 4 (OSP) | 0 |
/// | O | P | 5 (OPS) | 1 |
///
/// # Panics
///
/// Panics if `next` is the attribute that is already bound.
#[inline]
#[must_use]
pub fn choose_trie(bound: Option<Attribute>, next: Attribute) -> TrieChoice {
    let (trie, slot) = match (bound, next) {
        (None, attr) => (2 * attr.index(), 0),
        (Some(S), P) => (0, 0),
        (Some(S), O) => (1, 1),
        (Some(P), O) => (2, 0),
        (Some(P), S) => (3, 1),
        (Some(O), S) => (4, 0),
        (Some(O), P) => (5, 1),
        (Some(a), b) => unreachable!("attribute {b} is already bound as {a}"),
    };
    TrieChoice { trie, slot }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names() {
        let names: Vec<String> = PERMUTATIONS.iter().map(Permutation::name).collect();
        assert_eq!(names, vec!["SPO", "SOP", "POS", "PSO", "OSP", "OPS"]);
    }

    #[test]
    fn test_pairs_share_root() {
        for pair in 0..3 {
            assert_eq!(PERMUTATIONS[2 * pair].root(), PERMUTATIONS[2 * pair + 1].root());
            assert!(!is_partial(2 * pair));
            assert!(is_partial(2 * pair + 1));
        }
    }

    #[test]
    fn test_arrange_and_restore() {
        let spo = [10, 20, 30];
        assert_eq!(PERMUTATIONS[2].arrange(spo), [20, 30, 10]);
        assert_eq!(PERMUTATIONS[5].arrange(spo), [30, 20, 10]);
        for perm in PERMUTATIONS {
            assert_eq!(perm.restore(perm.arrange(spo)), spo);
        }
    }

    #[test]
    fn test_choose_trie_matches_levels() {
        for bound in Attribute::ALL {
            for next in Attribute::ALL.into_iter().filter(|&a| a != bound) {
                let choice = choose_trie(Some(bound), next);
                let perm = PERMUTATIONS[choice.trie];
                assert_eq!(perm.attribute(0), bound);
                assert_eq!(perm.attribute(1), next);
                assert_eq!(choice.slot, choice.trie & 1);
            }
        }
    }

    #[test]
    fn test_choose_trie_unbound_uses_full_tries() {
        assert_eq!(choose_trie(None, S), TrieChoice { trie: 0, slot: 0 });
        assert_eq!(choose_trie(None, P), TrieChoice { trie: 2, slot: 0 });
        assert_eq!(choose_trie(None, O), TrieChoice { trie: 4, slot: 0 });
    }
}
