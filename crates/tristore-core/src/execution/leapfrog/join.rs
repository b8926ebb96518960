//! The Leapfrog Triejoin driver.

use smallvec::SmallVec;
use std::fmt;
use std::ops::ControlFlow;
use std::time::{Duration, Instant};
use tristore_common::collections::TristoreMap;
use tristore_common::{Attribute, QueryError, Result, TermId, TriplePattern, VarId};

use super::{CardinalityEstimator, IteratorGroups, TrieIterator, VariableOrder};
use crate::execution::collector::ResultSink;
use crate::index::trie::{DynamicTrie, SixTrieIndex, TrieCapability};

/// Per-query knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinOptions {
    /// Stop once the sink holds this many rows.
    pub limit: Option<usize>,
    /// Stop once the join has run this long.
    pub timeout: Option<Duration>,
    /// Enumerate a lonely variable straight from its leaf group instead of
    /// leaping through it.
    pub lonely_fast_path: bool,
    /// Estimator for the variable order.
    pub estimator: CardinalityEstimator,
}

impl Default for JoinOptions {
    fn default() -> Self {
        Self {
            limit: None,
            timeout: None,
            lonely_fast_path: true,
            estimator: CardinalityEstimator::default(),
        }
    }
}

impl JoinOptions {
    /// Sets the row limit.
    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Sets the timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Enables or disables the lonely-variable fast path.
    #[must_use]
    pub fn with_lonely_fast_path(mut self, enabled: bool) -> Self {
        self.lonely_fast_path = enabled;
        self
    }

    /// Sets the cardinality estimator.
    #[must_use]
    pub fn with_estimator(mut self, estimator: CardinalityEstimator) -> Self {
        self.estimator = estimator;
        self
    }
}

/// How a join ended. Rows produced before a stop stay in the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoinOutcome {
    /// Every solution was produced.
    Completed,
    /// The row limit was hit.
    LimitReached,
    /// The timeout expired.
    TimedOut,
}

impl JoinOutcome {
    /// Returns `true` if the result is complete.
    #[must_use]
    pub const fn is_complete(self) -> bool {
        matches!(self, Self::Completed)
    }
}

impl fmt::Display for JoinOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed => write!(f, "completed"),
            Self::LimitReached => write!(f, "limit reached"),
            Self::TimedOut => write!(f, "timed out"),
        }
    }
}

/// Worst-case optimal join of a basic graph pattern.
///
/// The engine owns all mutable per-query state: one iterator per pattern,
/// the variable order and the row being built. [`join`](Self::join) consumes
/// it, so a stopped join can not be resumed.
pub struct JoinEngine<'a, T: TrieCapability = DynamicTrie> {
    iterators: Vec<TrieIterator<'a, T>>,
    groups: IteratorGroups,
    order: VariableOrder,
    /// Every variable with its current value, ordered by variable.
    row: Vec<(VarId, TermId)>,
    slots: TristoreMap<VarId, usize>,
    options: JoinOptions,
    started: Instant,
    empty: bool,
}

impl<'a, T: TrieCapability> JoinEngine<'a, T> {
    /// Validates `patterns` and opens their iterators.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::EmptyQuery`] without patterns,
    /// [`QueryError::ReservedConstant`] for a constant equal to 0 and
    /// [`QueryError::RepeatedVariable`] when a variable occurs twice in one
    /// pattern.
    pub fn new(
        index: &'a SixTrieIndex<T>,
        patterns: &[TriplePattern],
        options: JoinOptions,
    ) -> Result<Self> {
        validate(patterns)?;

        let iterators: Vec<TrieIterator<'a, T>> = patterns
            .iter()
            .map(|&pattern| TrieIterator::new(index, pattern))
            .collect();

        let mut groups = IteratorGroups::default();
        for (i, pattern) in patterns.iter().enumerate() {
            for attr in [Attribute::Object, Attribute::Predicate, Attribute::Subject] {
                if let Some(var) = pattern.term(attr).as_variable() {
                    groups.entry(var).or_default().push(i);
                }
            }
        }

        let mut vars: Vec<VarId> = groups.keys().copied().collect();
        vars.sort_unstable();
        let slots = vars.iter().enumerate().map(|(slot, &var)| (var, slot)).collect();
        let row = vars.iter().map(|&var| (var, TermId::NONE)).collect();

        let order = VariableOrder::new(&iterators, &groups, options.estimator);
        let empty = iterators.iter().any(TrieIterator::is_empty);

        Ok(Self {
            iterators,
            groups,
            order,
            row,
            slots,
            options,
            started: Instant::now(),
            empty,
        })
    }

    /// The query variables in ascending order; rows follow the same order.
    pub fn variables(&self) -> impl Iterator<Item = VarId> + '_ {
        self.row.iter().map(|&(var, _)| var)
    }

    /// Returns `true` if some pattern can not match, so the join is known to
    /// produce nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.empty
    }

    /// Runs the join, handing every solution to `sink`.
    pub fn join<S: ResultSink + ?Sized>(mut self, sink: &mut S) -> JoinOutcome {
        tracing::debug!(
            "Join started: {} patterns, {} variables, estimator={}",
            self.iterators.len(),
            self.row.len(),
            self.options.estimator
        );
        self.started = Instant::now();

        let outcome = if self.empty {
            JoinOutcome::Completed
        } else {
            match self.search(0, sink) {
                ControlFlow::Continue(()) => JoinOutcome::Completed,
                ControlFlow::Break(outcome) => outcome,
            }
        };

        let elapsed = self.started.elapsed();
        if outcome == JoinOutcome::TimedOut {
            tracing::warn!("Join timed out after {:?} with {} rows", elapsed, sink.len());
        }
        tracing::debug!("Join {outcome}: {} rows in {:?}", sink.len(), elapsed);
        outcome
    }

    fn bind(&mut self, var: VarId, value: TermId) {
        let slot = self.slots[&var];
        self.row[slot].1 = value;
    }

    fn search<S: ResultSink + ?Sized>(
        &mut self,
        depth: usize,
        sink: &mut S,
    ) -> ControlFlow<JoinOutcome> {
        debug_assert_eq!(self.order.frame_depth(), depth);

        if let Some(timeout) = self.options.timeout
            && self.started.elapsed() > timeout
        {
            return ControlFlow::Break(JoinOutcome::TimedOut);
        }
        if let Some(limit) = self.options.limit
            && sink.len() >= limit
        {
            return ControlFlow::Break(JoinOutcome::LimitReached);
        }

        if depth == self.row.len() {
            sink.add(&self.row);
            return ControlFlow::Continue(());
        }

        let Some(var) = self.order.next() else {
            return ControlFlow::Continue(());
        };
        let group = self.groups[&var].clone();

        if self.options.lonely_fast_path
            && group.len() == 1
            && self.iterators[group[0]].in_last_level()
        {
            let it = group[0];
            for value in self.iterators[it].seek_all(var) {
                self.bind(var, value);
                self.iterators[it].down(var);
                self.order.down(&self.iterators, &self.groups);

                let flow = self.search(depth + 1, sink);

                self.order.up();
                self.iterators[it].up();
                if flow.is_break() {
                    return flow;
                }
            }
        } else {
            let flow = self.intersect(var, &group, depth, sink);
            if flow.is_break() {
                return flow;
            }
        }

        self.order.done();
        ControlFlow::Continue(())
    }

    /// Round-robin leapfrog over the iterators of `var`, recursing on every
    /// value they all agree on.
    fn intersect<S: ResultSink + ?Sized>(
        &mut self,
        var: VarId,
        group: &[usize],
        depth: usize,
        sink: &mut S,
    ) -> ControlFlow<JoinOutcome> {
        let mut bound: Option<TermId> = None;
        let mut agreeing = 0;
        let mut i = 0;

        while let Some(value) = self.iterators[group[i]].leap(var, bound) {
            if bound == Some(value) {
                agreeing += 1;
            } else {
                bound = Some(value);
                agreeing = 1;
            }

            if agreeing == group.len() {
                self.bind(var, value);
                for &it in group {
                    self.iterators[it].down(var);
                }
                self.order.down(&self.iterators, &self.groups);

                let flow = self.search(depth + 1, sink);

                self.order.up();
                for &it in group {
                    self.iterators[it].up();
                }
                if flow.is_break() {
                    return flow;
                }

                let Some(next) = value.as_u32().checked_add(1) else {
                    break;
                };
                bound = Some(TermId(next));
                agreeing = 0;
            }
            i = (i + 1) % group.len();
        }

        for &it in group {
            self.iterators[it].leap_done();
        }
        ControlFlow::Continue(())
    }
}

fn validate(patterns: &[TriplePattern]) -> Result<()> {
    if patterns.is_empty() {
        return Err(QueryError::EmptyQuery.into());
    }
    for (i, pattern) in patterns.iter().enumerate() {
        let reserved = Attribute::ALL
            .into_iter()
            .filter_map(|attr| pattern.term(attr).as_constant())
            .any(|id| !id.is_valid());
        if reserved {
            return Err(QueryError::ReservedConstant { pattern: i }.into());
        }

        let mut seen: SmallVec<[VarId; 3]> = SmallVec::new();
        for (_, var) in pattern.variables() {
            if seen.contains(&var) {
                return Err(QueryError::RepeatedVariable {
                    pattern: i,
                    variable: var.as_u32(),
                }
                .into());
            }
            seen.push(var);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::collector::{CountingSink, RowCollector};
    use tristore_common::{Error, Term, Triple};

    fn scenario() -> SixTrieIndex {
        SixTrieIndex::from_triples([Triple::new(1, 1, 2), Triple::new(1, 1, 3), Triple::new(2, 1, 3)])
    }

    fn p(s: Term, p: Term, o: Term) -> TriplePattern {
        TriplePattern::new(s, p, o)
    }

    fn v(id: u32) -> Term {
        Term::var(id)
    }

    fn c(id: u32) -> Term {
        Term::constant(id)
    }

    fn run(
        index: &SixTrieIndex,
        patterns: &[TriplePattern],
        options: JoinOptions,
    ) -> (Vec<Vec<u32>>, JoinOutcome) {
        let engine = JoinEngine::new(index, patterns, options).expect("valid query");
        let mut sink = RowCollector::new();
        let outcome = engine.join(&mut sink);
        let mut rows: Vec<Vec<u32>> = sink
            .rows()
            .iter()
            .map(|row| row.values().map(TermId::as_u32).collect())
            .collect();
        rows.sort();
        (rows, outcome)
    }

    fn triangle_index() -> SixTrieIndex {
        SixTrieIndex::from_triples([
            Triple::new(1, 1, 2),
            Triple::new(2, 1, 3),
            Triple::new(3, 1, 1),
            Triple::new(1, 1, 3),
            Triple::new(3, 1, 4),
        ])
    }

    fn triangle() -> [TriplePattern; 3] {
        [p(v(0), c(1), v(1)), p(v(1), c(1), v(2)), p(v(2), c(1), v(0))]
    }

    #[test]
    fn test_scenario_queries() {
        let mut index = scenario();

        let (rows, outcome) = run(&index, &[p(v(0), c(1), v(1))], JoinOptions::default());
        assert_eq!(outcome, JoinOutcome::Completed);
        assert_eq!(rows, vec![vec![1, 2], vec![1, 3], vec![2, 3]]);

        let (rows, _) = run(&index, &[p(v(0), c(1), c(3))], JoinOptions::default());
        assert_eq!(rows, vec![vec![1], vec![2]]);

        index.remove(Triple::new(1, 1, 2));
        let (rows, _) = run(&index, &[p(v(0), c(1), v(1))], JoinOptions::default());
        assert_eq!(rows, vec![vec![1, 3], vec![2, 3]]);
    }

    #[test]
    fn test_triangle() {
        let index = triangle_index();
        let (rows, outcome) = run(&index, &triangle(), JoinOptions::default());
        assert!(outcome.is_complete());
        assert_eq!(rows, vec![vec![1, 2, 3], vec![2, 3, 1], vec![3, 1, 2]]);
    }

    #[test]
    fn test_options_do_not_change_results() {
        let index = triangle_index();
        let path = [p(v(0), c(1), v(1)), p(v(1), c(1), v(2))];
        for patterns in [&triangle()[..], &path[..]] {
            let (expected, _) = run(&index, patterns, JoinOptions::default());
            for fast in [true, false] {
                for estimator in [CardinalityEstimator::SubtreeSize, CardinalityEstimator::DistinctCount] {
                    let options = JoinOptions::default()
                        .with_lonely_fast_path(fast)
                        .with_estimator(estimator);
                    assert_eq!(run(&index, patterns, options).0, expected);
                }
            }
        }
    }

    #[test]
    fn test_star_with_unbound_predicate() {
        let index = triangle_index();
        // Everything 1 points at, and what those point at in turn
        let (rows, _) = run(&index, &[p(c(1), v(0), v(1)), p(v(1), v(2), v(3))], JoinOptions::default());
        assert_eq!(
            rows,
            vec![vec![1, 2, 1, 3], vec![1, 3, 1, 1], vec![1, 3, 1, 4]]
        );
    }

    #[test]
    fn test_ground_patterns() {
        let index = scenario();

        let (rows, _) = run(&index, &[p(c(1), c(1), c(2))], JoinOptions::default());
        assert_eq!(rows, vec![Vec::<u32>::new()]);

        let (rows, _) = run(&index, &[p(c(1), c(1), c(9))], JoinOptions::default());
        assert!(rows.is_empty());

        // A failing filter empties the whole query
        let (rows, _) = run(
            &index,
            &[p(v(0), c(1), v(1)), p(c(2), c(1), c(2))],
            JoinOptions::default(),
        );
        assert!(rows.is_empty());
    }

    #[test]
    fn test_shared_variable_across_positions() {
        let index = triangle_index();
        // Nodes that are both pointed at by 1 and point at 1
        let (rows, _) = run(&index, &[p(c(1), c(1), v(0)), p(v(0), c(1), c(1))], JoinOptions::default());
        assert_eq!(rows, vec![vec![3]]);
    }

    #[test]
    fn test_limit() {
        let index = scenario();
        let (rows, outcome) = run(&index, &[p(v(0), c(1), v(1))], JoinOptions::default().with_limit(2));
        assert_eq!(outcome, JoinOutcome::LimitReached);
        assert_eq!(rows.len(), 2);

        let (rows, outcome) = run(&index, &[p(v(0), c(1), v(1))], JoinOptions::default().with_limit(0));
        assert_eq!(outcome, JoinOutcome::LimitReached);
        assert!(rows.is_empty());
    }

    #[test]
    fn test_zero_timeout_returns_subset() {
        let index = triangle_index();
        let (all, _) = run(&index, &triangle(), JoinOptions::default());
        let (rows, outcome) = run(&index, &triangle(), JoinOptions::default().with_timeout(Duration::ZERO));
        assert!(rows.iter().all(|row| all.contains(row)));
        assert!(outcome == JoinOutcome::TimedOut || rows == all);
    }

    #[test]
    fn test_counting_sink() {
        let index = triangle_index();
        let engine = JoinEngine::new(&index, &triangle(), JoinOptions::default()).expect("valid query");
        let mut sink = CountingSink::new();
        assert_eq!(engine.join(&mut sink), JoinOutcome::Completed);
        assert_eq!(sink.count(), 3);
    }

    #[test]
    fn test_variables_sorted() {
        let index = scenario();
        let engine = JoinEngine::new(&index, &[p(v(5), c(1), v(2))], JoinOptions::default())
            .expect("valid query");
        assert_eq!(engine.variables().collect::<Vec<_>>(), vec![VarId(2), VarId(5)]);
        assert!(!engine.is_empty());
    }

    #[test]
    fn test_validation() {
        let index = scenario();
        let err = |patterns: &[TriplePattern]| {
            JoinEngine::new(&index, patterns, JoinOptions::default()).err()
        };

        assert_eq!(err(&[]), Some(Error::Query(QueryError::EmptyQuery)));
        assert_eq!(
            err(&[p(v(0), c(1), v(1)), p(v(0), c(0), v(1))]),
            Some(Error::Query(QueryError::ReservedConstant { pattern: 1 }))
        );
        assert_eq!(
            err(&[p(v(3), c(1), v(3))]),
            Some(Error::Query(QueryError::RepeatedVariable { pattern: 0, variable: 3 }))
        );
    }

    #[test]
    fn test_empty_index() {
        let index = SixTrieIndex::new();
        let engine = JoinEngine::new(&index, &triangle(), JoinOptions::default()).expect("valid query");
        assert!(engine.is_empty());
        let (rows, outcome) = run(&index, &triangle(), JoinOptions::default());
        assert!(rows.is_empty());
        assert_eq!(outcome, JoinOutcome::Completed);
    }
}
