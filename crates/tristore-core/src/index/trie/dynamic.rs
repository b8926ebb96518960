//! A vector-backed dynamic trie.
//!
//! Labels live in one `Vec<u32>` in breadth-first order. Instead of a bit
//! vector with rank/select support, the positions of set group bits are kept
//! as a sorted `Vec<usize>`, which makes `select` a plain index and the
//! "next set bit" query a binary search.
//!
//! Updates shift both vectors, so they cost O(n) moves. That is fine for an
//! in-memory store of moderate size and keeps the structure easy to check.

use serde::{Deserialize, Serialize};
use tristore_common::{Error, Result};

use super::capability::TrieCapability;

/// A trie stored as a label sequence plus the positions that start a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DynamicTrie {
    /// Labels in breadth-first order; the last one is the terminator `0`.
    labels: Vec<u32>,
    /// Ascending positions whose group bit is set. The last entry is the
    /// terminator.
    starts: Vec<usize>,
}

impl DynamicTrie {
    /// Creates an empty trie holding only the terminator.
    #[must_use]
    pub fn new() -> Self {
        Self {
            labels: vec![0],
            starts: vec![0],
        }
    }

    /// Returns whether the trie stores no labels.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.len() <= 1
    }

    /// Number of children groups, not counting the terminator.
    #[must_use]
    pub fn group_count(&self) -> usize {
        self.starts.len().saturating_sub(1)
    }

    /// Returns whether the group bit at `pos` is set.
    #[must_use]
    pub fn is_group_start(&self, pos: usize) -> bool {
        self.starts.binary_search(&pos).is_ok()
    }

    /// The label sequence, terminator included.
    #[must_use]
    pub fn labels(&self) -> &[u32] {
        &self.labels
    }

    /// Position of the first set group bit at or after `pos`.
    fn next_start(&self, pos: usize) -> usize {
        let idx = self.starts.partition_point(|&s| s < pos);
        self.starts.get(idx).copied().unwrap_or(self.labels.len())
    }
}

impl Default for DynamicTrie {
    fn default() -> Self {
        Self::new()
    }
}

impl TrieCapability for DynamicTrie {
    fn build(sorted: &[[u32; 3]], partial: bool) -> Self {
        if sorted.is_empty() {
            return Self::new();
        }

        let mut labels = Vec::with_capacity(sorted.len() * 2 + 1);
        let mut starts = Vec::new();

        if !partial {
            starts.push(0);
            labels.extend(sorted.chunk_by(|a, b| a[0] == b[0]).map(|run| run[0][0]));
        }

        // One group per root value, holding its distinct second labels
        for run in sorted.chunk_by(|a, b| a[0] == b[0]) {
            starts.push(labels.len());
            labels.extend(run.chunk_by(|a, b| a[1] == b[1]).map(|g| g[0][1]));
        }

        // One group per (root, second) prefix, holding the leaves
        for run in sorted.chunk_by(|a, b| a[0] == b[0] && a[1] == b[1]) {
            starts.push(labels.len());
            labels.extend(run.iter().map(|key| key[2]));
        }

        starts.push(labels.len());
        labels.push(0);

        Self { labels, starts }
    }

    #[inline]
    fn node_count(&self) -> usize {
        self.labels.len() - 1
    }

    #[inline]
    fn label(&self, pos: usize) -> u32 {
        self.labels[pos]
    }

    #[inline]
    fn child(&self, node: usize, n: usize, gap: usize) -> usize {
        self.starts[node + gap + n - 1]
    }

    #[inline]
    fn children(&self, group_start: usize) -> usize {
        self.next_start(group_start + 1) - group_start
    }

    fn seek(&self, lo: usize, hi: usize, value: u32) -> (Option<u32>, usize) {
        if lo > hi {
            return (None, lo);
        }
        let pos = lo + self.labels[lo..=hi].partition_point(|&label| label < value);
        if pos > hi {
            (None, hi + 1)
        } else {
            (Some(self.labels[pos]), pos)
        }
    }

    fn insert(&mut self, pos: usize, label: u32, group_start: bool, first_child: bool) {
        self.labels.insert(pos, label);

        let idx = self.starts.partition_point(|&s| s < pos);
        for start in &mut self.starts[idx..] {
            *start += 1;
        }

        if group_start {
            self.starts.insert(idx, pos);
        } else if first_child {
            // The displaced first child now sits at pos + 1 and gives up its bit
            debug_assert_eq!(self.starts.get(idx), Some(&(pos + 1)));
            self.starts[idx] = pos;
        }
    }

    fn remove(&mut self, pos: usize, more: bool) {
        self.labels.remove(pos);

        let idx = self.starts.partition_point(|&s| s < pos);
        let was_start = self.starts.get(idx) == Some(&pos);

        let shift_from = if was_start && more {
            // The next sibling slides into pos and keeps the bit
            idx + 1
        } else {
            if was_start {
                self.starts.remove(idx);
            }
            idx
        };
        for start in &mut self.starts[shift_from..] {
            *start -= 1;
        }
    }

    fn size_bytes(&self) -> usize {
        std::mem::size_of::<Self>()
            + self.labels.capacity() * std::mem::size_of::<u32>()
            + self.starts.capacity() * std::mem::size_of::<usize>()
    }

    fn check_layout(&self, partial: bool, roots: usize) -> Result<()> {
        let corrupt = |what: String| Err(Error::Corruption(what));

        let Some(terminator) = self.labels.len().checked_sub(1) else {
            return corrupt("trie has no terminator".to_string());
        };
        if self.labels[terminator] != 0 || self.starts.last() != Some(&terminator) {
            return corrupt(format!("trie does not end with a terminator at {terminator}"));
        }
        if self.labels[..terminator].contains(&0) {
            return corrupt("trie stores the reserved label 0".to_string());
        }
        if self.starts.first() != Some(&0) || !self.starts.windows(2).all(|w| w[0] < w[1]) {
            return corrupt("group starts do not ascend strictly from 0".to_string());
        }

        if terminator == 0 || roots == 0 {
            return if terminator == 0 && roots == 0 {
                Ok(())
            } else {
                corrupt(format!("{terminator} labels under {roots} roots"))
            };
        }
        if !partial && self.starts[1] != roots {
            return corrupt(format!(
                "root group holds {} values, gap says {roots}",
                self.starts[1]
            ));
        }

        // Groups of level two, then one leaf group per level-two node
        let mids = if partial { 0..roots } else { 1..roots + 1 };
        let (Some(&mid_begin), Some(&mid_end)) =
            (self.starts.get(mids.start), self.starts.get(mids.end))
        else {
            return corrupt(format!("too few groups for {roots} roots"));
        };
        let expected = mids.end + (mid_end - mid_begin);
        if self.group_count() != expected {
            return corrupt(format!(
                "{} groups, layout needs {expected}",
                self.group_count()
            ));
        }

        for w in self.starts.windows(2) {
            if !self.labels[w[0]..w[1]].windows(2).all(|pair| pair[0] < pair[1]) {
                return corrupt(format!("group at {} is not strictly ascending", w[0]));
            }
        }
        Ok(())
    }
}
