//! Cooperative search cancellation: node, iteration, and wall-clock limits
//! shared by every recursive search routine (the CP engine, the corner-point
//! filler, and the outer branch-and-bound).
//!
//! The original algorithm tracked this through a handful of module-global
//! counters and booleans (`stopped`, `nodes`/`subnodes`, `iterat`/`subiterat`).
//! Here it is a single struct threaded through the recursion by `&mut`
//! reference, so that two solves running concurrently never share state.
//!
//! Two counters advance independently, mirroring the original's separation:
//! `node_limit` is ticked only by the outer branch-and-bound's own recursion
//! entries (`enter_node`, the original's `a->nodes`/`subnodes`, ticked only
//! from `rec_binpack`); `iter_limit` and `time_limit` are ticked by every
//! nested search routine (`enter_subsearch`, the original's
//! `a->iterat`/`subiterat`, ticked from `recpack` and `branch`). A single
//! shared `stopped` flag, once set by either counter or the wall clock, halts
//! every routine sharing this budget — separate from a sub-search's own
//! "this particular decision is settled" signal, which each engine tracks
//! locally instead (the original's module-global `terminate`, reset at the
//! start of every top-level call).

use std::time::{Duration, Instant};

/// How many raw recursion entries make up one countable batch for limit
/// checks (the original's `IUNIT`).
const IUNIT: u64 = 1000;

/// Default per-call iteration cap for a single bounded sub-search (the
/// general-packing feasibility test in "fast" mode, and the base unit the
/// m-cut heuristic scales its own cap from). Counted in raw recursion
/// entries, not `IUNIT` batches — it bounds one engine call, not the whole
/// search.
pub const MAXITER: u64 = 1000;

/// Why a search stopped short of exhausting the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationReason {
    /// The search space was fully explored (or an optimal/feasible solution
    /// matching the lower bound was found and proven optimal).
    Optimal,
    NodeLimit,
    IterLimit,
    TimeLimit,
}

/// Search budget and termination bookkeeping for one top-level solve.
///
/// `node_limit`/`node_used` and `iter_limit`/`iter_used` are both expressed
/// in units of `IUNIT` recursion entries, matching the original's `nodes`
/// and `iterat`.
pub struct Budget {
    node_limit: Option<u64>,
    iter_limit: Option<u64>,
    time_limit: Option<Duration>,
    start: Instant,
    node_sub: u64,
    node_batches: u64,
    iter_sub: u64,
    iter_batches: u64,
    stopped: bool,
    reason: Option<TerminationReason>,
}

impl Budget {
    pub fn new(node_limit: Option<u64>, iter_limit: Option<u64>, time_limit: Option<Duration>) -> Self {
        Self {
            node_limit,
            iter_limit,
            time_limit,
            start: Instant::now(),
            node_sub: 0,
            node_batches: 0,
            iter_sub: 0,
            iter_batches: 0,
            stopped: false,
            reason: None,
        }
    }

    pub fn unbounded() -> Self {
        Self::new(None, None, None)
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub fn reason(&self) -> Option<TerminationReason> {
        self.reason
    }

    /// Completed `IUNIT`-sized batches of outer-search recursion entries
    /// consumed so far (the original's `nodes`), the same unit `node_limit`
    /// is expressed in.
    pub fn nodes_used(&self) -> u64 {
        self.node_batches
    }

    /// Completed `IUNIT`-sized batches of nested-search recursion entries
    /// consumed so far (the original's `iterat`), the same unit `iter_limit`
    /// is expressed in.
    pub fn iters_used(&self) -> u64 {
        self.iter_batches
    }

    /// Wall-clock time elapsed since this budget was created.
    pub fn time_used(&self) -> Duration {
        self.start.elapsed()
    }

    fn stop(&mut self, reason: TerminationReason) {
        if !self.stopped {
            self.stopped = true;
            self.reason = Some(reason);
        }
    }

    /// Called once per outer branch-and-bound recursion node
    /// (`rec_binpack`). Returns `true` if the search should continue.
    /// Advances `node_limit`'s counter; a long-running nested search called
    /// from within this node (the CP engine, the corner filler) does not
    /// retick it — see `enter_subsearch`.
    pub fn enter_node(&mut self) -> bool {
        if self.stopped {
            return false;
        }
        self.node_sub += 1;
        if self.node_sub == IUNIT {
            self.node_sub = 0;
            self.node_batches += 1;
            self.check_node_limit();
            self.check_time_limit();
        }
        !self.stopped
    }

    /// Called once per nested-search recursion node (`recpack`, `branch`).
    /// Advances `iter_limit`/`time_limit`'s counter, so a long single-bin CP
    /// decision or corner-fill search is still interruptible by the
    /// caller's global limits. Returns `true` if the search should continue.
    pub fn enter_subsearch(&mut self) -> bool {
        if self.stopped {
            return false;
        }
        self.iter_sub += 1;
        if self.iter_sub == IUNIT {
            self.iter_sub = 0;
            self.iter_batches += 1;
            self.check_iter_limit();
            self.check_time_limit();
        }
        !self.stopped
    }

    fn check_node_limit(&mut self) {
        if let Some(limit) = self.node_limit {
            if self.node_batches >= limit {
                self.stop(TerminationReason::NodeLimit);
            }
        }
    }

    fn check_iter_limit(&mut self) {
        if let Some(limit) = self.iter_limit {
            if self.iter_batches >= limit {
                self.stop(TerminationReason::IterLimit);
            }
        }
    }

    fn check_time_limit(&mut self) {
        if let Some(limit) = self.time_limit {
            if self.start.elapsed() >= limit {
                self.stop(TerminationReason::TimeLimit);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unbounded_budget_never_stops_on_its_own() {
        let mut b = Budget::unbounded();
        for _ in 0..5000 {
            assert!(b.enter_node());
            assert!(b.enter_subsearch());
        }
    }

    #[test]
    fn node_limit_stops_the_search_after_the_given_number_of_iunit_batches() {
        // node_limit is in IUNIT(=1000)-sized batches: a limit of 2 allows
        // 2000 raw recursion entries before stopping on the 2001st.
        let mut b = Budget::new(Some(2), None, None);
        for _ in 0..2000 {
            assert!(b.enter_node());
        }
        assert!(!b.enter_node());
        assert_eq!(b.reason(), Some(TerminationReason::NodeLimit));
        assert_eq!(b.nodes_used(), 2);
    }

    #[test]
    fn iter_limit_stops_nested_searches_without_touching_node_counting() {
        let mut b = Budget::new(None, Some(1), None);
        for _ in 0..999 {
            assert!(b.enter_subsearch());
        }
        assert!(!b.enter_subsearch());
        assert_eq!(b.reason(), Some(TerminationReason::IterLimit));
        assert_eq!(b.iters_used(), 1);
        assert_eq!(b.nodes_used(), 0);
    }

    #[test]
    fn node_and_iter_counters_advance_independently() {
        // Ticking only enter_node never trips an iter_limit, and vice versa.
        let mut b = Budget::new(Some(1), Some(1), None);
        for _ in 0..999 {
            assert!(b.enter_node());
        }
        assert!(b.nodes_used() == 0 && b.iters_used() == 0);
        assert!(b.enter_node());
        assert!(b.is_stopped());
        assert_eq!(b.reason(), Some(TerminationReason::NodeLimit));
        assert_eq!(b.iters_used(), 0);
    }
}
