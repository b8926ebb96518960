//! The navigation contract every trie of the index has to fulfil.

use tristore_common::{Error, Result};

/// An ordered forest stored as a breadth-first label sequence.
///
/// Positions index that sequence. Every children group starts at a position
/// whose group bit is set; the sequence ends with a terminator `(0, 1)` so
/// that the last real group is closed. `select(j)` below means "position of
/// the j-th set bit", counting from 1.
///
/// Full tries begin with the root group at position 0 and the children of
/// the node at position `k` live in group `k + 2`. Partial tries have no root
/// group: group `r + 1` holds the children of the sibling's root value at
/// position `r`, and level-two node `q` owns group `q + gap + 1`.
pub trait TrieCapability: Default {
    /// Builds a trie from keys already arranged in this trie's attribute
    /// order, sorted and without duplicates. With `partial` set the first
    /// level is left out.
    fn build(sorted: &[[u32; 3]], partial: bool) -> Self;

    /// Number of stored labels, not counting the terminator.
    fn node_count(&self) -> usize;

    /// Label at `pos`.
    fn label(&self, pos: usize) -> u32;

    /// First position of the children group of the `n`-th node counted from
    /// `node`, that is `select(node + gap + n)`.
    fn child(&self, node: usize, n: usize, gap: usize) -> usize;

    /// Size of the group starting at `group_start`.
    fn children(&self, group_start: usize) -> usize;

    /// Finds the first label `>= value` within `lo..=hi`.
    ///
    /// Returns the label and its position, or `(None, hi + 1)` when every
    /// label in the range is smaller.
    fn seek(&self, lo: usize, hi: usize, value: u32) -> (Option<u32>, usize);

    /// Inserts `label` at `pos`.
    ///
    /// `group_start` opens a new group at `pos`. Otherwise, with
    /// `first_child` set, the new label becomes the first member of the group
    /// that used to start at `pos`.
    fn insert(&mut self, pos: usize, label: u32, group_start: bool, first_child: bool);

    /// Removes the label at `pos`.
    ///
    /// When it started a group and `more` is set, the following sibling
    /// inherits the group start; without `more` the whole group disappears.
    fn remove(&mut self, pos: usize, more: bool);

    /// Returns the heap footprint in bytes.
    fn size_bytes(&self) -> usize;

    /// Checks that the sequence is a well-formed three-level trie whose first
    /// level holds `roots` values (for a partial trie, its sibling's roots).
    ///
    /// Navigation trusts the layout, so a trie read back from a snapshot has
    /// to pass this before it is walked.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Corruption`] describing the first broken rule.
    fn check_layout(&self, partial: bool, roots: usize) -> Result<()>;
}
