//! The six-trie index: every triple in all six attribute orders.
//!
//! Updates walk each trie from the root with binary search, remember where
//! every level matched or would have to be inserted, and only then touch the
//! tries, deepest level first. Working bottom-up keeps the positions found
//! during the walk valid, because every level lies after its parent level
//! in the breadth-first layout.
//!
//! A partial trie has no root level of its own. Its walk starts at level one
//! and borrows the root step of its full sibling, which is why the tries are
//! always visited in order 0..6.

use serde::{Deserialize, Serialize};
use tristore_common::{Attribute, Error, Result, Triple};

use super::capability::TrieCapability;
use super::dynamic::DynamicTrie;
use super::permutation::{PERMUTATIONS, TRIE_COUNT, is_partial};

/// Where one level of a walk landed.
#[derive(Debug, Clone, Copy, Default)]
struct Step {
    /// Position of the node, or where it has to be inserted.
    pos: usize,
    /// The new node goes in front of the current first child of its group.
    first_child: bool,
    /// The node does not exist yet.
    fresh: bool,
    /// The node is the only member of its group.
    only_child: bool,
}

type Walk = [Step; 4];

/// Level the walk of `trie` starts at.
#[inline]
const fn first_level(trie: usize) -> usize {
    if is_partial(trie) { 1 } else { 0 }
}

/// Outcome of [`SixTrieIndex::remove_and_report`].
///
/// `freeable[a]` is set when, after the removal, the id at attribute `a` no
/// longer occurs anywhere it could be looked up from. Subjects and objects
/// share one id space, so a subject is only freeable when it is not an object
/// either, and vice versa.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RemoveReport {
    /// Whether the triple was present and has been removed.
    pub removed: bool,
    /// Per attribute (S, P, O): the id is no longer referenced.
    pub freeable: [bool; 3],
}

impl RemoveReport {
    /// Returns whether the id at `attribute` can be released.
    #[inline]
    #[must_use]
    pub const fn is_freeable(&self, attribute: Attribute) -> bool {
        self.freeable[attribute.index()]
    }

    /// Returns whether any id of the removed triple can be released.
    #[must_use]
    pub fn any_freeable(&self) -> bool {
        self.freeable.iter().any(|&f| f)
    }
}

/// Six compact tries, one per attribute permutation, kept in sync.
///
/// The pair gaps count the distinct subjects, predicates and objects; the
/// partial tries need them to find their level-two groups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SixTrieIndex<T = DynamicTrie> {
    tries: [T; TRIE_COUNT],
    gaps: [usize; 3],
    triple_count: usize,
}

impl SixTrieIndex<DynamicTrie> {
    /// Creates an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an index from a list of triples. Duplicates are dropped.
    #[must_use]
    pub fn from_triples(triples: impl IntoIterator<Item = Triple>) -> Self {
        Self::build(triples)
    }
}

impl<T: TrieCapability> Default for SixTrieIndex<T> {
    fn default() -> Self {
        Self {
            tries: std::array::from_fn(|_| T::default()),
            gaps: [0; 3],
            triple_count: 0,
        }
    }
}

impl<T: TrieCapability> SixTrieIndex<T> {
    /// Builds an index over any trie implementation.
    ///
    /// Each permutation sorts its own copy of the input once and hands it to
    /// [`TrieCapability::build`], which lays the trie out level by level.
    #[must_use]
    pub fn build(triples: impl IntoIterator<Item = Triple>) -> Self {
        let spo: Vec<[u32; 3]> = triples.into_iter().map(|t| t.to_array()).collect();
        let mut index = Self::default();

        for (i, perm) in PERMUTATIONS.iter().enumerate() {
            let mut keys: Vec<[u32; 3]> = spo.iter().map(|&t| perm.arrange(t)).collect();
            keys.sort_unstable();
            keys.dedup();

            if !is_partial(i) {
                index.gaps[i / 2] = keys.chunk_by(|a, b| a[0] == b[0]).count();
            }
            if i == 0 {
                index.triple_count = keys.len();
            }
            index.tries[i] = T::build(&keys, is_partial(i));
        }

        tracing::info!(
            "Six-trie index built: {} triples ({} input), gaps {:?}",
            index.triple_count,
            spo.len(),
            index.gaps
        );
        index
    }

    /// Returns trie `i` (see [`PERMUTATIONS`] for the order it stores).
    #[inline]
    #[must_use]
    pub fn get_trie(&self, i: usize) -> &T {
        &self.tries[i]
    }

    /// Number of distinct root values of pair `pair` (0 = subjects,
    /// 1 = predicates, 2 = objects).
    #[inline]
    #[must_use]
    pub fn gap(&self, pair: usize) -> usize {
        self.gaps[pair]
    }

    /// All three pair gaps.
    #[inline]
    #[must_use]
    pub fn gaps(&self) -> [usize; 3] {
        self.gaps
    }

    /// Number of stored triples.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.triple_count
    }

    /// Returns `true` if the index holds no triples.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.triple_count == 0
    }

    /// Gap to pass to `child` when descending from `level - 1` to `level` in
    /// `trie`.
    #[inline]
    fn descent_gap(&self, trie: usize, level: usize) -> usize {
        match (is_partial(trie), level) {
            (false, _) => 1,
            (true, 1) => 0,
            (true, _) => self.gaps[trie / 2],
        }
    }

    /// Inclusive bounds of the group holding the level-`level` children of
    /// the node at `parent`.
    fn group_range(&self, trie: usize, level: usize, parent: usize) -> (usize, usize) {
        let t = &self.tries[trie];
        let begin = if level == 0 {
            0
        } else {
            t.child(parent, 1, self.descent_gap(trie, level))
        };
        (begin, begin + t.children(begin) - 1)
    }

    /// Follows `key` down `trie`, filling `walk[1..]` with exact matches.
    ///
    /// Returns the number of levels (counted from the root) that matched, so
    /// 3 means the key is present. For partial tries `walk[1]` has to hold
    /// the sibling's root step already.
    fn locate(&self, trie: usize, key: [u32; 3], walk: &mut Walk) -> usize {
        let t = &self.tries[trie];
        for level in first_level(trie)..3 {
            let (begin, end) = self.group_range(trie, level, walk[level].pos);
            match t.seek(begin, end, key[level]) {
                (Some(label), pos) if label == key[level] => {
                    walk[level + 1] = Step {
                        pos,
                        only_child: begin == end,
                        ..Step::default()
                    };
                }
                _ => return level,
            }
        }
        3
    }

    /// Like [`locate`](Self::locate), but records where missing levels have
    /// to be inserted instead of stopping.
    fn plan_insert(&self, trie: usize, key: [u32; 3], walk: &mut Walk) {
        let t = &self.tries[trie];
        for level in first_level(trie)..3 {
            let parent = walk[level];
            walk[level + 1] = if parent.fresh {
                // A new parent gets a new group in front of the group its
                // position currently points at
                Step {
                    pos: t.child(parent.pos, 1, self.descent_gap(trie, level)),
                    fresh: true,
                    ..Step::default()
                }
            } else {
                let (begin, end) = self.group_range(trie, level, parent.pos);
                match t.seek(begin, end, key[level]) {
                    (Some(label), pos) if label == key[level] => Step {
                        pos,
                        ..Step::default()
                    },
                    (_, pos) => Step {
                        pos,
                        first_child: pos == begin,
                        fresh: true,
                        only_child: false,
                    },
                }
            };
        }
    }

    /// Inserts a triple. Returns `false` if it was already present.
    pub fn insert(&mut self, triple: Triple) -> bool {
        let spo = triple.to_array();

        if self.triple_count == 0 {
            for (i, perm) in PERMUTATIONS.iter().enumerate() {
                self.tries[i] = T::build(&[perm.arrange(spo)], is_partial(i));
            }
            self.gaps = [1; 3];
            self.triple_count = 1;
            return true;
        }

        let mut walks = [Walk::default(); TRIE_COUNT];
        for (i, perm) in PERMUTATIONS.iter().enumerate() {
            if is_partial(i) {
                walks[i][1] = walks[i - 1][1];
            }
            self.plan_insert(i, perm.arrange(spo), &mut walks[i]);
            if i == 0 && !walks[0][3].fresh {
                return false;
            }
        }

        let mut grown = [false; 3];
        for (i, (perm, walk)) in PERMUTATIONS.iter().zip(&walks).enumerate() {
            let key = perm.arrange(spo);
            let trie = &mut self.tries[i];
            for j in (first_level(i) + 1..=3).rev() {
                if !walk[j].fresh {
                    break;
                }
                trie.insert(walk[j].pos, key[j - 1], walk[j - 1].fresh, walk[j].first_child);
                if j == 1 {
                    grown[i / 2] = true;
                }
            }
        }

        for (gap, grew) in self.gaps.iter_mut().zip(grown) {
            *gap += usize::from(grew);
        }
        self.triple_count += 1;
        true
    }

    /// Removes a triple. Returns `false` if it was not present.
    pub fn remove(&mut self, triple: Triple) -> bool {
        self.remove_entry(triple.to_array()).is_some()
    }

    /// Removes a triple and reports which of its ids became unreferenced.
    pub fn remove_and_report(&mut self, triple: Triple) -> RemoveReport {
        let [s, _, o] = triple.to_array();
        let Some(shrunk) = self.remove_entry(triple.to_array()) else {
            return RemoveReport::default();
        };

        RemoveReport {
            removed: true,
            freeable: [
                shrunk[0] && !self.root_contains(4, s),
                shrunk[1],
                s != o && shrunk[2] && !self.root_contains(0, o),
            ],
        }
    }

    /// Removes `spo` from every trie and returns, per pair, whether a root
    /// value disappeared.
    fn remove_entry(&mut self, spo: [u32; 3]) -> Option<[bool; 3]> {
        let mut walks = [Walk::default(); TRIE_COUNT];
        for (i, perm) in PERMUTATIONS.iter().enumerate() {
            if is_partial(i) {
                walks[i][1] = walks[i - 1][1];
            }
            if self.locate(i, perm.arrange(spo), &mut walks[i]) < 3 {
                if i > 0 {
                    tracing::warn!(
                        "Triple {:?} is in SPO but missing from {}",
                        spo,
                        perm.name()
                    );
                }
                return None;
            }
        }

        let mut shrunk = [false; 3];
        for (i, walk) in walks.iter().enumerate() {
            let trie = &mut self.tries[i];
            for j in (first_level(i) + 1..=3).rev() {
                trie.remove(walk[j].pos, !walk[j].only_child);
                if j == 1 {
                    shrunk[i / 2] = true;
                }
                if !walk[j].only_child {
                    break;
                }
            }
        }

        for (gap, gone) in self.gaps.iter_mut().zip(shrunk) {
            *gap -= usize::from(gone);
        }
        self.triple_count -= 1;
        Some(shrunk)
    }

    /// Returns whether `value` is a root of full trie `trie`.
    fn root_contains(&self, trie: usize, value: u32) -> bool {
        let gap = self.gaps[trie / 2];
        if gap == 0 {
            return false;
        }
        self.tries[trie].seek(0, gap - 1, value).0 == Some(value)
    }

    /// Counts the tries that contain `triple`.
    ///
    /// A consistent index always answers 0 or 6. Partial tries are only
    /// searched when their sibling found the root value.
    #[must_use]
    pub fn test_exists(&self, triple: Triple) -> usize {
        let spo = triple.to_array();
        let mut walk = Walk::default();
        let mut root_found = false;
        let mut found = 0;

        for (i, perm) in PERMUTATIONS.iter().enumerate() {
            if is_partial(i) {
                if !root_found {
                    continue;
                }
            } else {
                walk = Walk::default();
            }

            let depth = self.locate(i, perm.arrange(spo), &mut walk);
            if !is_partial(i) {
                root_found = depth > 0;
            }
            if depth == 3 {
                found += 1;
            }
        }
        found
    }

    /// Returns `true` if the triple is stored. Only SPO is consulted.
    #[must_use]
    pub fn contains(&self, triple: Triple) -> bool {
        let mut walk = Walk::default();
        self.locate(0, triple.to_array(), &mut walk) == 3
    }

    /// Enumerates the keys of trie `i` in that trie's order.
    ///
    /// # Panics
    ///
    /// Panics if `i >= 6`.
    #[must_use]
    pub fn entries(&self, i: usize) -> Vec<[u32; 3]> {
        let mut out = Vec::with_capacity(self.triple_count);
        if self.is_empty() {
            return out;
        }

        let full = &self.tries[i - i % 2];
        let trie = &self.tries[i];
        let roots = self.gaps[i / 2];
        let (mid_gap, leaf_gap) = (self.descent_gap(i, 1), self.descent_gap(i, 2));

        for r in 0..roots {
            let mid = trie.child(r, 1, mid_gap);
            for q in mid..mid + trie.children(mid) {
                let leaf = trie.child(q, 1, leaf_gap);
                for l in leaf..leaf + trie.children(leaf) {
                    out.push([full.label(r), trie.label(q), trie.label(l)]);
                }
            }
        }
        out
    }

    /// All triples in SPO order.
    #[must_use]
    pub fn triples(&self) -> Vec<Triple> {
        self.entries(0).into_iter().map(Triple::from_array).collect()
    }

    /// Checks that all six tries are well formed, hold the same triples and
    /// that the counts and gaps match them.
    ///
    /// Safe to call on an index of unknown origin: the layout of every trie
    /// is checked before any of them is walked.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Corruption`] describing the first disagreement.
    pub fn verify(&self) -> Result<()> {
        for (i, perm) in PERMUTATIONS.iter().enumerate() {
            self.tries[i]
                .check_layout(is_partial(i), self.gaps[i / 2])
                .map_err(|e| match e {
                    Error::Corruption(what) => Error::Corruption(format!("{}: {what}", perm.name())),
                    other => other,
                })?;
        }

        let mut reference = self.entries(0);
        if reference.len() != self.triple_count {
            return Err(Error::Corruption(format!(
                "SPO holds {} triples, count says {}",
                reference.len(),
                self.triple_count
            )));
        }
        reference.sort_unstable();

        for (i, perm) in PERMUTATIONS.iter().enumerate().skip(1) {
            let mut spo: Vec<[u32; 3]> =
                self.entries(i).into_iter().map(|k| perm.restore(k)).collect();
            spo.sort_unstable();
            if spo != reference {
                return Err(Error::Corruption(format!(
                    "{} disagrees with SPO ({} vs {} triples)",
                    perm.name(),
                    spo.len(),
                    reference.len()
                )));
            }
        }

        if let Some(&key) = reference
            .iter()
            .find(|&&key| self.test_exists(Triple::from_array(key)) != TRIE_COUNT)
        {
            return Err(Error::Corruption(format!(
                "triple {} is not found in all six tries",
                Triple::from_array(key)
            )));
        }
        Ok(())
    }

    /// Returns the memory footprint in bytes.
    #[must_use]
    pub fn size_bytes(&self) -> usize {
        std::mem::size_of::<Self>()
            + self
                .tries
                .iter()
                .map(|t| t.size_bytes().saturating_sub(std::mem::size_of::<T>()))
                .sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::collections::BTreeSet;

    fn t(s: u32, p: u32, o: u32) -> Triple {
        Triple::new(s, p, o)
    }

    fn scenario() -> SixTrieIndex {
        let mut index = SixTrieIndex::from_triples([t(1, 1, 2), t(1, 1, 3)]);
        assert!(index.insert(t(2, 1, 3)));
        index
    }

    #[test]
    fn test_empty_index() {
        let index = SixTrieIndex::new();
        assert!(index.is_empty());
        assert_eq!(index.len(), 0);
        assert_eq!(index.gaps(), [0, 0, 0]);
        assert_eq!(index.test_exists(t(1, 2, 3)), 0);
        assert!(index.triples().is_empty());
        assert!(index.verify().is_ok());
    }

    #[test]
    fn test_first_insert_sets_gaps() {
        let mut index = SixTrieIndex::new();
        assert!(index.insert(t(4, 5, 6)));
        assert_eq!(index.gaps(), [1, 1, 1]);
        assert_eq!(index.test_exists(t(4, 5, 6)), 6);
        assert_eq!(index.test_exists(t(4, 5, 7)), 0);
    }

    #[test]
    fn test_scenario() {
        let mut index = scenario();
        assert_eq!(index.len(), 3);
        assert_eq!(index.gaps(), [2, 1, 2]);
        for triple in [t(1, 1, 2), t(1, 1, 3), t(2, 1, 3)] {
            assert_eq!(index.test_exists(triple), 6);
        }
        assert_eq!(index.test_exists(t(2, 1, 2)), 0);

        assert!(index.remove(t(1, 1, 2)));
        assert_eq!(index.test_exists(t(1, 1, 2)), 0);
        assert_eq!(index.gaps(), [2, 1, 1]);
        assert_eq!(index.triples(), vec![t(1, 1, 3), t(2, 1, 3)]);
        assert!(index.verify().is_ok());
    }

    #[test]
    fn test_incremental_matches_bulk_layout() {
        let triples = [t(1, 1, 2), t(1, 1, 3), t(2, 1, 3)];
        assert_eq!(scenario(), SixTrieIndex::from_triples(triples));
    }

    #[test]
    fn test_duplicate_insert() {
        let mut index = scenario();
        let before = index.clone();
        assert!(!index.insert(t(1, 1, 3)));
        assert_eq!(index, before);
    }

    #[test]
    fn test_remove_missing() {
        let mut index = scenario();
        let before = index.clone();
        assert!(!index.remove(t(3, 1, 2)));
        assert!(!index.remove(t(1, 2, 3)));
        assert_eq!(index, before);
    }

    #[test]
    fn test_insert_then_remove_restores() {
        let original = scenario();
        let mut index = original.clone();
        assert!(index.insert(t(9, 8, 7)));
        assert_eq!(index.gaps(), [3, 2, 3]);
        assert!(index.remove(t(9, 8, 7)));
        assert_eq!(index, original);
    }

    #[test]
    fn test_remove_last_triple_empties() {
        let mut index = SixTrieIndex::new();
        index.insert(t(1, 2, 3));
        assert!(index.remove(t(1, 2, 3)));
        assert_eq!(index, SixTrieIndex::new());
        // And the index is usable again
        assert!(index.insert(t(3, 2, 1)));
        assert_eq!(index.test_exists(t(3, 2, 1)), 6);
    }

    #[test]
    fn test_remove_and_report() {
        let mut index = SixTrieIndex::from_triples([t(1, 5, 2), t(2, 5, 3)]);

        // 2 is still a subject, 5 still a predicate
        let report = index.remove_and_report(t(1, 5, 2));
        assert!(report.removed);
        assert_eq!(report.freeable, [true, false, false]);

        let report = index.remove_and_report(t(2, 5, 3));
        assert_eq!(report.freeable, [true, true, true]);
        assert!(report.any_freeable());

        let report = index.remove_and_report(t(2, 5, 3));
        assert_eq!(report, RemoveReport::default());
    }

    #[test]
    fn test_report_self_loop_frees_subject_only() {
        let mut index = SixTrieIndex::from_triples([t(7, 1, 7)]);
        let report = index.remove_and_report(t(7, 1, 7));
        assert!(report.is_freeable(Attribute::Subject));
        assert!(report.is_freeable(Attribute::Predicate));
        assert!(!report.is_freeable(Attribute::Object));
    }

    #[test]
    fn test_report_keeps_id_used_in_other_position() {
        // 3 is an object here and a subject below
        let mut index = SixTrieIndex::from_triples([t(1, 2, 3), t(3, 4, 5)]);
        let report = index.remove_and_report(t(1, 2, 3));
        assert_eq!(report.freeable, [true, true, false]);
    }

    #[test]
    fn test_entries_follow_trie_order() {
        let index = scenario();
        assert_eq!(index.entries(1), vec![[1, 2, 1], [1, 3, 1], [2, 3, 1]]);
        assert_eq!(index.entries(5), vec![[2, 1, 1], [3, 1, 1], [3, 1, 2]]);
    }

    #[test]
    fn test_verify_detects_bad_gap() {
        let mut index = scenario();
        index.gaps[1] += 1;
        assert!(matches!(index.verify(), Err(Error::Corruption(_))));
    }

    #[test]
    fn test_verify_detects_swapped_trie() {
        let mut index = scenario();
        // SOP replaced by a well-formed trie over different keys
        index.tries[1] = DynamicTrie::build(&[[1, 2, 1], [2, 3, 1]], true);
        let err = index.verify().unwrap_err();
        assert!(err.to_string().contains("SOP"), "{err}");
    }

    #[test]
    fn test_verify_rejects_layout_before_walking() {
        let mut index = scenario();
        // OPS with a single root while the pair's gap is 2
        index.tries[5] = DynamicTrie::build(&[[3, 1, 1]], true);
        assert!(matches!(index.verify(), Err(Error::Corruption(_))));

        let mut index = scenario();
        index.triple_count = 0;
        assert!(matches!(index.verify(), Err(Error::Corruption(_))));
    }

    #[test]
    fn test_remove_then_insert_restores() {
        let mut rng = StdRng::seed_from_u64(17);
        for _ in 0..50 {
            let count = rng.random_range(1..=40);
            let original = SixTrieIndex::from_triples((0..count).map(|_| {
                t(
                    rng.random_range(1..=8u32),
                    rng.random_range(1..=5u32),
                    rng.random_range(1..=8u32),
                )
            }));

            let mut index = original.clone();
            for triple in original.triples() {
                assert!(index.remove(triple));
                assert!(index.insert(triple));
                assert_eq!(index, original, "after removing and re-inserting {triple}");
            }
        }
    }

    #[test]
    fn test_serde_round_trip_keeps_layout() {
        let index = scenario();
        let config = bincode::config::standard();
        let bytes = bincode::serde::encode_to_vec(&index, config).unwrap();
        let (decoded, _): (SixTrieIndex, _) =
            bincode::serde::decode_from_slice(&bytes, config).unwrap();
        assert_eq!(decoded, index);
        assert!(decoded.verify().is_ok());
    }

    #[test]
    fn test_random_updates_agree_with_bulk_build() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut index = SixTrieIndex::new();
        let mut reference = BTreeSet::new();

        for round in 0..600 {
            let triple = t(
                rng.random_range(1..=6u32),
                rng.random_range(1..=4u32),
                rng.random_range(1..=6u32),
            );
            if round % 3 == 2 {
                assert_eq!(index.remove(triple), reference.remove(&triple));
            } else {
                assert_eq!(index.insert(triple), reference.insert(triple));
            }
        }

        assert_eq!(index.len(), reference.len());
        assert_eq!(index.triples(), reference.iter().copied().collect::<Vec<_>>());
        assert_eq!(index, SixTrieIndex::from_triples(reference.iter().copied()));
        assert!(index.verify().is_ok());

        for s in 1..=6 {
            for p in 1..=4 {
                for o in 1..=6 {
                    let expected = if reference.contains(&t(s, p, o)) { 6 } else { 0 };
                    assert_eq!(index.test_exists(t(s, p, o)), expected);
                }
            }
        }
    }

    #[test]
    fn test_size_grows_with_content() {
        let small = SixTrieIndex::from_triples([t(1, 1, 1)]);
        let large = SixTrieIndex::from_triples((1..200).map(|i| t(i, 1, i + 1)));
        assert!(large.size_bytes() > small.size_bytes());
    }
}
