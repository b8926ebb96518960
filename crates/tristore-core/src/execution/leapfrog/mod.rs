//! Leapfrog Triejoin over the six-trie index.
//!
//! The join binds one variable at a time. For the chosen variable, every
//! pattern that mentions it contributes a [`TrieIterator`] positioned under
//! the values bound so far; the iterators leap over each other until they
//! agree on a value, the value is bound, and the join recurses.
//!
//! | Piece | Role |
//! |-------|------|
//! | [`TrieIterator`] | Cursor of one pattern: `leap`, `down`, `up`, `seek_all` |
//! | [`VariableOrder`] | Adaptive choice of the next variable |
//! | [`CardinalityEstimator`] | How variable weights are estimated |
//! | [`JoinEngine`] | Drives the recursion and feeds a [`ResultSink`] |
//!
//! # Example
//!
//! ```
//! use tristore_common::{Term, Triple, TriplePattern};
//! use tristore_core::SixTrieIndex;
//! use tristore_core::execution::RowCollector;
//! use tristore_core::execution::leapfrog::{JoinEngine, JoinOptions, JoinOutcome};
//!
//! let index = SixTrieIndex::from_triples([
//!     Triple::new(1, 7, 2),
//!     Triple::new(2, 7, 3),
//!     Triple::new(3, 7, 1),
//! ]);
//!
//! // ?x knows ?y . ?y knows ?z . ?z knows ?x
//! let knows = Term::constant(7);
//! let patterns = [
//!     TriplePattern::new(Term::var(0), knows, Term::var(1)),
//!     TriplePattern::new(Term::var(1), knows, Term::var(2)),
//!     TriplePattern::new(Term::var(2), knows, Term::var(0)),
//! ];
//! let engine = JoinEngine::new(&index, &patterns, JoinOptions::default())?;
//! let mut rows = RowCollector::new();
//! let outcome = engine.join(&mut rows);
//!
//! assert_eq!(outcome, JoinOutcome::Completed);
//! // One rotation of the triangle per starting vertex
//! assert_eq!(rows.rows().len(), 3);
//! # Ok::<(), tristore_common::Error>(())
//! ```
//!
//! [`ResultSink`]: crate::execution::ResultSink

mod estimator;
mod iterator;
mod join;
mod order;

use smallvec::SmallVec;
use tristore_common::VarId;
use tristore_common::collections::TristoreMap;

pub use estimator::CardinalityEstimator;
pub use iterator::TrieIterator;
pub use join::{JoinEngine, JoinOptions, JoinOutcome};
pub use order::VariableOrder;

/// For every variable, the positions of the iterators (one per pattern)
/// that mention it.
pub type IteratorGroups = TristoreMap<VarId, SmallVec<[usize; 4]>>;
