//! # tristore-core
//!
//! The two halves of tristore that have to agree with each other exactly:
//!
//! - [`index`] - the six-permutation trie index with online insert/remove
//! - [`execution`] - trie iterators, the adaptive variable order and the
//!   Leapfrog Triejoin driver that runs over them
//!
//! Everything here is single-threaded. Wrap a [`SixTrieIndex`] in a lock (as
//! `tristore-engine` does) if it has to be shared.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod execution;
pub mod index;

pub use execution::leapfrog::{
    CardinalityEstimator, JoinEngine, JoinOptions, JoinOutcome, TrieIterator, VariableOrder,
};
pub use execution::{CountingSink, ResultRow, ResultSink, RowCollector};
pub use index::trie::{DynamicTrie, RemoveReport, SixTrieIndex, TrieCapability};
