//! Result sinks for the join.
//!
//! The join hands every complete binding to a [`ResultSink`] and asks it for
//! its size to enforce row limits. What the sink does with the row is up to
//! it: [`RowCollector`] materializes rows, [`CountingSink`] only counts them.
//!
//! # Example
//!
//! ```
//! use tristore_common::{Term, Triple, TriplePattern};
//! use tristore_core::execution::{CountingSink, RowCollector};
//! use tristore_core::{JoinEngine, JoinOptions, SixTrieIndex};
//!
//! let index = SixTrieIndex::from_triples([Triple::new(1, 2, 3), Triple::new(1, 2, 4)]);
//! let patterns = [TriplePattern::new(Term::constant(1), Term::constant(2), Term::var(0))];
//!
//! let mut rows = RowCollector::new();
//! JoinEngine::new(&index, &patterns, JoinOptions::default())?.join(&mut rows);
//! let printed: Vec<String> = rows.rows().iter().map(ToString::to_string).collect();
//! assert_eq!(printed, ["{?0=3}", "{?0=4}"]);
//!
//! let mut count = CountingSink::new();
//! JoinEngine::new(&index, &patterns, JoinOptions::default())?.join(&mut count);
//! assert_eq!(count.count(), 2);
//! # Ok::<(), tristore_common::Error>(())
//! ```

use smallvec::SmallVec;
use std::fmt;
use tristore_common::{TermId, VarId};

/// Receives the rows produced by a join.
pub trait ResultSink {
    /// Accepts one row: every query variable with its value, ordered by
    /// variable.
    fn add(&mut self, row: &[(VarId, TermId)]);

    /// Number of rows accepted so far.
    fn len(&self) -> usize;

    /// Returns `true` if no row has been accepted.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One solution of a query: (variable, value) pairs ordered by variable.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResultRow {
    bindings: SmallVec<[(VarId, TermId); 4]>,
}

impl ResultRow {
    /// Creates a row from bindings that are already ordered by variable.
    #[must_use]
    pub fn from_sorted(bindings: &[(VarId, TermId)]) -> Self {
        debug_assert!(bindings.windows(2).all(|w| w[0].0 < w[1].0));
        Self {
            bindings: SmallVec::from_slice(bindings),
        }
    }

    /// Returns the value bound to `var`.
    #[must_use]
    pub fn get(&self, var: VarId) -> Option<TermId> {
        self.bindings
            .binary_search_by_key(&var, |&(v, _)| v)
            .ok()
            .map(|i| self.bindings[i].1)
    }

    /// The bindings, ordered by variable.
    #[must_use]
    pub fn bindings(&self) -> &[(VarId, TermId)] {
        &self.bindings
    }

    /// The values, in variable order.
    pub fn values(&self) -> impl Iterator<Item = TermId> + '_ {
        self.bindings.iter().map(|&(_, value)| value)
    }

    /// Number of bound variables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Returns `true` for the row of a query without variables.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl fmt::Display for ResultRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (var, value)) in self.bindings.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{var}={value}")?;
        }
        write!(f, "}}")
    }
}

/// Materializes every row.
///
/// Be careful with unbounded queries over large stores; pair it with a row
/// limit if the result size is unknown.
#[derive(Debug, Clone, Default)]
pub struct RowCollector {
    rows: Vec<ResultRow>,
}

impl RowCollector {
    /// Creates an empty collector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The rows collected so far, in production order.
    #[must_use]
    pub fn rows(&self) -> &[ResultRow] {
        &self.rows
    }

    /// Consumes the collector and returns its rows.
    #[must_use]
    pub fn into_rows(self) -> Vec<ResultRow> {
        self.rows
    }
}

impl ResultSink for RowCollector {
    fn add(&mut self, row: &[(VarId, TermId)]) {
        self.rows.push(ResultRow::from_sorted(row));
    }

    fn len(&self) -> usize {
        self.rows.len()
    }
}

/// Counts rows without keeping them.
#[derive(Debug, Clone, Copy, Default)]
pub struct CountingSink {
    count: usize,
}

impl CountingSink {
    /// Creates a sink at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows seen so far.
    #[must_use]
    pub fn count(&self) -> usize {
        self.count
    }
}

impl ResultSink for CountingSink {
    fn add(&mut self, _row: &[(VarId, TermId)]) {
        self.count += 1;
    }

    fn len(&self) -> usize {
        self.count
    }
}
