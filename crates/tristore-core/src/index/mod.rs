//! Index structures for triple storage.
//!
//! | Index | Use Case | Complexity |
//! |-------|----------|------------|
//! | [`trie::SixTrieIndex`] | Any triple pattern, incremental updates | O(log d) per level |
//!
//! The index keeps all six S/P/O permutations so that every combination of
//! bound attributes has a trie whose prefix matches it.

pub mod trie;
