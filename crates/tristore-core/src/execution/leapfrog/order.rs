//! Adaptive variable elimination order.
//!
//! Instead of fixing the variable order before the join, [`VariableOrder`]
//! picks the next variable at every depth: the unbound variable with the
//! smallest weight wins. Binding a variable narrows the iterators it shares
//! with its neighbours, so after every binding the weights of the related
//! unbound variables are re-estimated and, if they shrank, lowered. The
//! lowered weights are recorded in a frame and restored on the way back up.
//!
//! Variables that occur in a single pattern ("lonely" variables) do not
//! take part in any intersection. They are always bound last, in the order
//! they were registered.

use smallvec::SmallVec;
use tristore_common::VarId;
use tristore_common::collections::{TristoreMap, tristore_map};

use super::{CardinalityEstimator, IteratorGroups, TrieIterator};
use crate::index::trie::TrieCapability;

/// Bookkeeping of one non-lonely variable.
#[derive(Debug, Clone)]
struct VarInfo {
    var: VarId,
    weight: u64,
    /// Positions (in `VariableOrder::info`) of variables sharing a pattern.
    related: SmallVec<[usize; 4]>,
    bound: bool,
}

type Frame = SmallVec<[(usize, u64); 4]>;

/// Picks the next variable to bind during a join.
#[derive(Debug, Clone)]
pub struct VariableOrder {
    estimator: CardinalityEstimator,
    info: Vec<VarInfo>,
    positions: TristoreMap<VarId, usize>,
    /// Unbound non-lonely variables, in registration order.
    not_bound: Vec<usize>,
    /// Bound non-lonely variables, in binding order.
    bound: Vec<usize>,
    lonely: Vec<VarId>,
    /// Weight changes made by each `down`, innermost last.
    frames: Vec<Frame>,
    /// Number of variables handed out by `next` and not yet returned.
    index: usize,
}

impl VariableOrder {
    /// Registers the variables of all patterns and computes their initial
    /// weights from the iterators as they stand.
    ///
    /// `iterators` holds one iterator per pattern; `groups` maps every
    /// variable to the iterators that mention it.
    #[must_use]
    pub fn new<T: TrieCapability>(
        iterators: &[TrieIterator<'_, T>],
        groups: &IteratorGroups,
        estimator: CardinalityEstimator,
    ) -> Self {
        let mut order = Self {
            estimator,
            info: Vec::new(),
            positions: tristore_map(),
            not_bound: Vec::new(),
            bound: Vec::new(),
            lonely: Vec::new(),
            frames: Vec::new(),
            index: 0,
        };

        for iter in iterators {
            for (_, var) in iter.pattern().variables() {
                let group = &groups[&var];
                if group.len() == 1 {
                    order.lonely.push(var);
                } else if !order.positions.contains_key(&var) {
                    let pos = order.info.len();
                    let weight = order.weigh(iterators, group, var);
                    order.info.push(VarInfo {
                        var,
                        weight,
                        related: SmallVec::new(),
                        bound: false,
                    });
                    order.positions.insert(var, pos);
                    order.not_bound.push(pos);
                }
            }
        }

        for iter in iterators {
            let members: SmallVec<[usize; 3]> = iter
                .pattern()
                .variables()
                .filter_map(|(_, var)| order.positions.get(&var).copied())
                .collect();
            for &a in &members {
                for &b in &members {
                    if a != b && !order.info[a].related.contains(&b) {
                        order.info[a].related.push(b);
                    }
                }
            }
        }

        order
    }

    /// Number of variables in the query.
    #[must_use]
    pub fn len(&self) -> usize {
        self.info.len() + self.lonely.len()
    }

    /// Returns `true` for a query without variables.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Variables that occur in a single pattern, in registration order.
    #[must_use]
    pub fn lonely(&self) -> &[VarId] {
        &self.lonely
    }

    /// Current weight of `var`, or `None` for lonely and unknown variables.
    #[must_use]
    pub fn weight(&self, var: VarId) -> Option<u64> {
        self.positions.get(&var).map(|&pos| self.info[pos].weight)
    }

    /// Number of pending frames, which equals the recursion depth of the
    /// join that drives this order.
    #[must_use]
    pub fn frame_depth(&self) -> usize {
        self.frames.len()
    }

    fn weigh<T: TrieCapability>(
        &self,
        iterators: &[TrieIterator<'_, T>],
        group: &[usize],
        var: VarId,
    ) -> u64 {
        group
            .iter()
            .map(|&i| self.estimator.estimate(&iterators[i], var))
            .min()
            .unwrap_or(u64::MAX)
    }

    /// Hands out the next variable to bind.
    ///
    /// The lightest unbound non-lonely variable comes first (ties go to the
    /// earliest registered), then the lonely ones.
    #[allow(clippy::should_implement_trait)] // Not an iterator: done() gives variables back
    pub fn next(&mut self) -> Option<VarId> {
        let lightest = self
            .not_bound
            .iter()
            .enumerate()
            .min_by_key(|&(k, &pos)| (self.info[pos].weight, k))
            .map(|(k, _)| k);

        let var = if let Some(k) = lightest {
            let pos = self.not_bound.remove(k);
            self.info[pos].bound = true;
            self.bound.push(pos);
            self.info[pos].var
        } else {
            let k = self.index.checked_sub(self.info.len())?;
            *self.lonely.get(k)?
        };
        self.index += 1;
        Some(var)
    }

    /// Re-estimates the neighbours of the variable just bound, after its
    /// iterators went down.
    pub fn down<T: TrieCapability>(
        &mut self,
        iterators: &[TrieIterator<'_, T>],
        groups: &IteratorGroups,
    ) {
        let mut frame = Frame::new();

        if self.index <= self.info.len()
            && let Some(&last) = self.bound.last()
        {
            for k in 0..self.info[last].related.len() {
                let pos = self.info[last].related[k];
                let info = &self.info[pos];
                if info.bound {
                    continue;
                }
                let weight = self.weigh(iterators, &groups[&info.var], info.var);
                if weight < info.weight {
                    frame.push((pos, info.weight));
                    self.info[pos].weight = weight;
                }
            }
        }

        self.frames.push(frame);
    }

    /// Restores the weights changed by the matching [`down`](Self::down).
    pub fn up(&mut self) {
        if let Some(frame) = self.frames.pop() {
            for (pos, weight) in frame {
                self.info[pos].weight = weight;
            }
        }
    }

    /// Takes back the variable handed out by the last [`next`](Self::next).
    pub fn done(&mut self) {
        debug_assert!(self.index > 0, "done() without next()");
        self.index -= 1;
        if self.index < self.info.len()
            && let Some(pos) = self.bound.pop()
        {
            self.info[pos].bound = false;
            self.not_bound.push(pos);
        }
    }
}
