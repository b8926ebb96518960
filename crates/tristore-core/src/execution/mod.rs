//! Query execution over the six-trie index.
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`leapfrog`] | Trie iterators, adaptive variable order and the join driver |
//! | [`collector`] | Where result rows go |
//!
//! A query is a basic graph pattern: a list of [`TriplePattern`]s sharing
//! variables. The [`JoinEngine`](leapfrog::JoinEngine) opens one
//! [`TrieIterator`](leapfrog::TrieIterator) per pattern and intersects them
//! one variable at a time.
//!
//! [`TriplePattern`]: tristore_common::TriplePattern

pub mod collector;
pub mod leapfrog;

pub use collector::{CountingSink, ResultRow, ResultSink, RowCollector};
