//! Six-permutation compact trie index for RDF triples.
//!
//! Every triple is stored once per attribute order, so any combination of
//! bound attributes has a trie whose prefix matches it. Two permutations that
//! share a root attribute also share that root level: the "full" trie keeps
//! it, the "partial" sibling only stores levels two and three and finds its
//! groups through the pair's **gap** (the number of distinct root values).
//!
//! # Layout
//!
//! | Trie | Order | Kind | Pair |
//! |------|-------|------|------|
//! | 0 | SPO | full | 0 |
//! | 1 | SOP | partial | 0 |
//! | 2 | POS | full | 1 |
//! | 3 | PSO | partial | 1 |
//! | 4 | OSP | full | 2 |
//! | 5 | OPS | partial | 2 |
//!
//! Each trie is a breadth-first sequence of labels where a bit marks the
//! first child of every group, terminated by a `(0, 1)` sentinel. See
//! [`TrieCapability`] for the navigation primitives.
//!
//! # Example
//!
//! ```
//! use tristore_common::Triple;
//! use tristore_core::index::trie::SixTrieIndex;
//!
//! let mut index: SixTrieIndex = SixTrieIndex::from_triples([
//!     Triple::new(1, 1, 2),
//!     Triple::new(1, 1, 3),
//! ]);
//! assert!(index.insert(Triple::new(2, 1, 3)));
//! assert_eq!(index.test_exists(Triple::new(2, 1, 3)), 6);
//! assert_eq!(index.gaps(), [2, 1, 2]);
//! ```

mod capability;
mod dynamic;
mod permutation;
mod six_trie;

pub use capability::TrieCapability;
pub use dynamic::DynamicTrie;
pub use permutation::{PERMUTATIONS, Permutation, TRIE_COUNT, TrieChoice, choose_trie};
pub use six_trie::{RemoveReport, SixTrieIndex};
