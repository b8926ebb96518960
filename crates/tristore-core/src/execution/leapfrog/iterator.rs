//! Per-pattern cursor over the six-trie index.
//!
//! A [`TrieIterator`] walks down the index one attribute at a time, in
//! whatever order the join binds the pattern's variables. At each depth it
//! picks the trie whose next level lists the attribute asked for (see
//! [`choose_trie`]) and searches that level's group with [`leap`].
//!
//! The iterator always keeps two cursors below a fixed root: one in the full
//! trie of the root's pair and one in the partial sibling. Which of the two a
//! lookup follows is the `slot` of the [`TrieChoice`].
//!
//! [`leap`]: TrieIterator::leap

use tristore_common::{Attribute, TermId, TriplePattern, VarId};

use crate::index::trie::{DynamicTrie, SixTrieIndex, TrieCapability, TrieChoice, choose_trie};

/// Cursor state at one depth.
#[derive(Debug, Clone, Copy, Default)]
struct Level {
    /// Group starts of the children of the fixed prefix, per slot.
    nodes: [usize; 2],
    /// Current candidate position in the chosen trie.
    begin: usize,
    /// Last position of the group being searched.
    end: usize,
}

/// Cursor of one triple pattern.
///
/// Constants are resolved at construction, so the iterator starts at the
/// depth of its last constant. If a constant is not in the index the
/// iterator is [empty](Self::is_empty) and produces nothing.
#[derive(Debug, Clone)]
pub struct TrieIterator<'a, T: TrieCapability = DynamicTrie> {
    index: &'a SixTrieIndex<T>,
    pattern: TriplePattern,
    levels: [Level; 4],
    /// The range at a depth has to be recomputed from its parent.
    redo: [bool; 4],
    fixed: [Attribute; 3],
    nfixed: usize,
    choice: TrieChoice,
    empty: bool,
}

impl<'a, T: TrieCapability> TrieIterator<'a, T> {
    /// Opens a cursor for `pattern` and descends through its constants in
    /// S, P, O order.
    #[must_use]
    pub fn new(index: &'a SixTrieIndex<T>, pattern: TriplePattern) -> Self {
        let mut iter = Self {
            index,
            pattern,
            levels: [Level::default(); 4],
            redo: [true; 4],
            fixed: [Attribute::Subject; 3],
            nfixed: 0,
            choice: TrieChoice { trie: 0, slot: 0 },
            empty: index.is_empty(),
        };

        for attr in Attribute::ALL {
            if iter.empty {
                break;
            }
            if let Some(value) = pattern.term(attr).as_constant() {
                if iter.exists(attr, value) {
                    iter.fix(attr);
                } else {
                    iter.empty = true;
                }
            }
        }
        iter
    }

    /// The pattern this cursor answers.
    #[must_use]
    pub fn pattern(&self) -> &TriplePattern {
        &self.pattern
    }

    /// Returns `true` if a constant of the pattern is missing from the index.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.empty
    }

    /// Number of attributes fixed so far.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.nfixed
    }

    /// Returns `true` when exactly one attribute is left, so the next level
    /// is the leaf level.
    #[must_use]
    pub fn in_last_level(&self) -> bool {
        self.nfixed == 2
    }

    fn attribute(&self, var: VarId) -> Attribute {
        match self.pattern.attribute_of(var) {
            Some(attr) => attr,
            None => unreachable!("variable {var} is not part of pattern {}", self.pattern),
        }
    }

    /// Trie and slot that list `attr` below the current prefix.
    fn choose(&self, attr: Attribute) -> TrieChoice {
        match self.nfixed {
            0 => choose_trie(None, attr),
            1 => choose_trie(Some(self.fixed[0]), attr),
            _ => self.choice,
        }
    }

    /// First position of the group of candidates at the current depth.
    fn group_start(&self, choice: TrieChoice) -> usize {
        if self.nfixed == 0 {
            0
        } else {
            self.levels[self.nfixed].nodes[choice.slot]
        }
    }

    /// Resets the current depth's range to the full group under the parent.
    fn reset_range(&mut self) {
        let trie = self.index.get_trie(self.choice.trie);
        let begin = self.group_start(self.choice);
        let level = &mut self.levels[self.nfixed];
        level.begin = begin;
        level.end = begin + trie.children(begin) - 1;
        self.redo[self.nfixed] = false;
    }

    /// Looks `value` up as the next `attr` below the current prefix and, if
    /// found, leaves the cursor on it.
    pub fn exists(&mut self, attr: Attribute, value: TermId) -> bool {
        self.choice = self.choose(attr);
        self.reset_range();

        let trie = self.index.get_trie(self.choice.trie);
        let level = &mut self.levels[self.nfixed];
        match trie.seek(level.begin, level.end, value.as_u32()) {
            (Some(label), pos) if label == value.as_u32() => {
                level.begin = pos;
                true
            }
            _ => false,
        }
    }

    /// Moves to the smallest value of `var` that is `>= bound` under the
    /// current prefix, or to the first value when there is no bound.
    ///
    /// The search resumes from the previous answer at this depth unless
    /// [`leap_done`](Self::leap_done) or a descent reset it.
    pub fn leap(&mut self, var: VarId, bound: Option<TermId>) -> Option<TermId> {
        if self.empty {
            return None;
        }
        self.choice = self.choose(self.attribute(var));
        if self.redo[self.nfixed] {
            self.reset_range();
        }

        let trie = self.index.get_trie(self.choice.trie);
        let level = &mut self.levels[self.nfixed];
        let Some(bound) = bound else {
            return Some(TermId(trie.label(level.begin)));
        };
        match trie.seek(level.begin, level.end, bound.as_u32()) {
            (Some(label), pos) => {
                level.begin = pos;
                Some(TermId(label))
            }
            (None, _) => None,
        }
    }

    /// Forgets the cursor of the current depth; the next leap starts over
    /// from the parent.
    pub fn leap_done(&mut self) {
        self.redo[self.nfixed] = true;
    }

    /// Fixes `var` to the value the cursor is on.
    pub fn down(&mut self, var: VarId) {
        self.fix(self.attribute(var));
    }

    fn fix(&mut self, attr: Attribute) {
        let pos = self.levels[self.nfixed].begin;
        match self.nfixed {
            0 => {
                let pair = 2 * attr.index();
                self.levels[1].nodes = [
                    self.index.get_trie(pair).child(pos, 1, 1),
                    self.index.get_trie(pair + 1).child(pos, 1, 0),
                ];
            }
            1 => {
                let TrieChoice { trie, slot } = self.choice;
                let gap = if slot == 1 { self.index.gap(trie / 2) } else { 1 };
                self.levels[2].nodes[slot] = self.index.get_trie(trie).child(pos, 1, gap);
            }
            _ => {}
        }
        self.fixed[self.nfixed] = attr;
        self.nfixed += 1;
        self.redo[self.nfixed] = true;
    }

    /// Releases the most recently fixed attribute.
    pub fn up(&mut self) {
        debug_assert!(self.nfixed > 0, "up() on an iterator at the root");
        self.nfixed -= 1;
    }

    /// Every value of `var` under the current prefix, in ascending order.
    ///
    /// Only the index is borrowed, so the caller can keep moving this cursor
    /// while consuming the values.
    pub fn seek_all(&mut self, var: VarId) -> impl Iterator<Item = TermId> + use<'a, T> {
        let index = self.index;
        let (trie, begin, len) = if self.empty {
            (index.get_trie(0), 0, 0)
        } else {
            self.choice = self.choose(self.attribute(var));
            let trie = index.get_trie(self.choice.trie);
            let begin = self.group_start(self.choice);
            (trie, begin, trie.children(begin))
        };
        (begin..begin + len).map(move |pos| TermId(trie.label(pos)))
    }

    /// Number of distinct values `var` can take below the current prefix.
    #[must_use]
    pub fn distinct_values(&self, var: VarId) -> u64 {
        if self.empty {
            return 0;
        }
        let attr = self.attribute(var);
        let (trie, group) = match self.nfixed {
            0 => (2 * attr.index(), 0),
            _ => {
                let choice = self.choose(attr);
                (choice.trie, self.levels[self.nfixed].nodes[choice.slot])
            }
        };
        self.index.get_trie(trie).children(group) as u64
    }

    /// Upper bound on the rows this pattern contributes below the current
    /// prefix.
    ///
    /// With nothing fixed there is no useful bound and the answer is
    /// `u64::MAX`. With one attribute fixed it is the number of triples under
    /// that root; with two, the degree of the fixed pair.
    #[must_use]
    pub fn subtree_size(&self, var: VarId) -> u64 {
        if self.empty {
            return 0;
        }
        match self.nfixed {
            0 => u64::MAX,
            1 => {
                let trie = self.index.get_trie(2 * self.fixed[0].index());
                let node = self.levels[1].nodes[0];
                let count = trie.children(node);
                let leftmost = trie.child(node, 1, 1);
                let last = trie.child(node, count, 1);
                (last + trie.children(last) - leftmost) as u64
            }
            _ => {
                let choice = self.choose(self.attribute(var));
                let trie = self.index.get_trie(choice.trie);
                trie.children(self.levels[self.nfixed].nodes[choice.slot]) as u64
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tristore_common::{Term, Triple};

    fn index() -> SixTrieIndex {
        SixTrieIndex::from_triples([
            Triple::new(1, 1, 2),
            Triple::new(1, 1, 3),
            Triple::new(1, 4, 2),
            Triple::new(2, 1, 3),
        ])
    }

    fn pattern(s: Term, p: Term, o: Term) -> TriplePattern {
        TriplePattern::new(s, p, o)
    }

    fn collect(iter: &mut TrieIterator<'_>, var: VarId) -> Vec<u32> {
        let mut out = Vec::new();
        let mut bound = None;
        while let Some(v) = iter.leap(var, bound) {
            out.push(v.as_u32());
            bound = Some(TermId(v.as_u32() + 1));
        }
        iter.leap_done();
        out
    }

    #[test]
    fn test_unbound_root_levels() {
        let index = index();
        let (x, y, z) = (VarId(0), VarId(1), VarId(2));
        let mut iter = TrieIterator::new(&index, pattern(Term::var(0), Term::var(1), Term::var(2)));
        assert!(!iter.is_empty());
        assert_eq!(collect(&mut iter, x), vec![1, 2]);
        assert_eq!(collect(&mut iter, y), vec![1, 4]);
        assert_eq!(collect(&mut iter, z), vec![2, 3]);
    }

    #[test]
    fn test_constant_prefix() {
        let index = index();
        let x = VarId(0);
        let mut iter = TrieIterator::new(&index, pattern(Term::var(0), Term::constant(1), Term::constant(3)));
        assert_eq!(iter.depth(), 2);
        assert!(iter.in_last_level());
        assert_eq!(collect(&mut iter, x), vec![1, 2]);
    }

    #[test]
    fn test_missing_constant_is_empty() {
        let index = index();
        let iter = TrieIterator::new(&index, pattern(Term::var(0), Term::constant(9), Term::var(1)));
        assert!(iter.is_empty());

        let iter = TrieIterator::new(&index, pattern(Term::constant(2), Term::constant(4), Term::var(1)));
        assert!(iter.is_empty());
    }

    #[test]
    fn test_empty_index() {
        let index = SixTrieIndex::new();
        let mut iter = TrieIterator::new(&index, pattern(Term::var(0), Term::var(1), Term::var(2)));
        assert!(iter.is_empty());
        assert_eq!(iter.leap(VarId(0), None), None);
        assert_eq!(iter.seek_all(VarId(0)).count(), 0);
    }

    #[test]
    fn test_descend_through_partial_trie() {
        let index = index();
        let (s, p, o) = (VarId(0), VarId(1), VarId(2));
        let mut iter = TrieIterator::new(&index, pattern(Term::var(0), Term::var(1), Term::var(2)));

        // Fix S = 1, then walk O through SOP
        assert_eq!(iter.leap(s, None), Some(TermId(1)));
        iter.down(s);
        assert_eq!(collect(&mut iter, o), vec![2, 3]);

        assert_eq!(iter.leap(o, Some(TermId(3))), Some(TermId(3)));
        iter.down(o);
        assert_eq!(collect(&mut iter, p), vec![1]);
        iter.up();

        // Leaps only move forward until the depth is reset
        assert_eq!(iter.leap(o, Some(TermId(2))), Some(TermId(3)));
        iter.leap_done();
        assert_eq!(iter.leap(o, Some(TermId(2))), Some(TermId(2)));
        iter.down(o);
        assert_eq!(collect(&mut iter, p), vec![1, 4]);
    }

    #[test]
    fn test_leap_resumes_and_ends() {
        let index = index();
        let p = VarId(1);
        let mut iter = TrieIterator::new(&index, pattern(Term::constant(1), Term::var(1), Term::var(2)));
        assert_eq!(iter.leap(p, Some(TermId(2))), Some(TermId(4)));
        assert_eq!(iter.leap(p, Some(TermId(5))), None);
    }

    #[test]
    fn test_seek_all() {
        let index = index();
        let o = VarId(2);
        let mut iter = TrieIterator::new(&index, pattern(Term::constant(1), Term::constant(1), Term::var(2)));
        let values: Vec<TermId> = iter.seek_all(o).collect();
        assert_eq!(values, vec![TermId(2), TermId(3)]);
        iter.down(o);
        assert_eq!(iter.depth(), 3);
        iter.up();
        assert!(iter.in_last_level());
    }

    #[test]
    fn test_estimates() {
        let index = index();
        let (s, p, o) = (VarId(0), VarId(1), VarId(2));
        let mut iter = TrieIterator::new(&index, pattern(Term::var(0), Term::var(1), Term::var(2)));
        assert_eq!(iter.subtree_size(s), u64::MAX);
        assert_eq!(iter.distinct_values(s), 2);
        assert_eq!(iter.distinct_values(p), 2);

        // Subject 1 has three triples, two predicates and two objects
        iter.leap(s, None);
        iter.down(s);
        assert_eq!(iter.subtree_size(p), 3);
        assert_eq!(iter.distinct_values(p), 2);
        assert_eq!(iter.distinct_values(o), 2);

        // (1, 1, _) has two objects
        iter.leap(p, Some(TermId(1)));
        iter.down(p);
        assert_eq!(iter.subtree_size(o), 2);
        assert_eq!(iter.distinct_values(o), 2);
    }

    #[test]
    fn test_estimates_with_predicate_root() {
        let index = index();
        let (s, o) = (VarId(0), VarId(2));
        let iter = TrieIterator::new(&index, pattern(Term::var(0), Term::constant(1), Term::var(2)));
        // Predicate 1 appears in three triples with subjects {1, 2}, objects {2, 3}
        assert_eq!(iter.subtree_size(s), 3);
        assert_eq!(iter.distinct_values(s), 2);
        assert_eq!(iter.distinct_values(o), 2);
    }
}
