//! Constraint-programming engine for deciding whether a set of boxes fits
//! into one bin, by assigning a directional relation to every pair of boxes.
//!
//! Each pair `(i, j)` starts with all six relations possible. `recpack`
//! assigns relations one pair at a time; after each assignment, constraint
//! propagation (`reduce_domain`) drops relations from other pairs' domains
//! that can no longer lead to a feasible coordinate assignment, fixing any
//! domain that collapses to a single possibility. Coordinates are derived
//! from the currently-fixed relations by repeated relaxation
//! (`find_coordinates`) rather than by a topological sort followed by a
//! critical-path pass — simpler to implement, and fast enough in practice
//! for the box counts this engine is used at.
//!
//! All engine state (the relation table, the per-pair domains, the
//! backtracking log) lives in this struct rather than in shared globals, so
//! that nested or concurrent solves never interfere with each other.

use crate::budget::Budget;
use crate::geometry::PackedBox;
use crate::relation::{Domain, Relation, RELATIONS};

enum UndoEntry {
    /// Restore `domain[i][j].set(rel, true)` on backtrack.
    Domain { i: usize, j: usize, rel: Relation },
    /// Restore `relation[i][j] = old` on backtrack.
    Relation { i: usize, j: usize, old: Relation },
}

pub struct CpEngine {
    n: usize,
    w: i32,
    h: i32,
    d: i32,
    relation: Vec<Relation>,
    domain: Vec<Domain>,
    undo: Vec<UndoEntry>,
    feasible: bool,
    solution: Vec<PackedBox>,
    /// Set once this call's decision is settled (feasible found, or the
    /// local iteration cap below was hit) — local to one `general_pack`
    /// call, distinct from `budget`'s own shared stop flag.
    terminate: bool,
    local_iters: u64,
    max_local_iters: Option<u64>,
}

impl CpEngine {
    pub fn new(n: usize, w: i32, h: i32, d: i32) -> Self {
        Self {
            n,
            w,
            h,
            d,
            relation: vec![Relation::Undef; n * n],
            domain: vec![Domain::all(); n * n],
            undo: Vec::new(),
            feasible: false,
            solution: Vec::new(),
            terminate: false,
            local_iters: 0,
            max_local_iters: None,
        }
    }

    fn at(&self, i: usize, j: usize) -> usize {
        i * self.n + j
    }

    fn rel(&self, i: usize, j: usize) -> Relation {
        self.relation[self.at(i, j)]
    }

    fn set_rel(&mut self, i: usize, j: usize, value: Relation) {
        let idx = self.at(i, j);
        self.relation[idx] = value;
    }

    fn dom(&self, i: usize, j: usize) -> &Domain {
        &self.domain[self.at(i, j)]
    }

    fn dom_mut(&mut self, i: usize, j: usize) -> &mut Domain {
        let idx = self.at(i, j);
        &mut self.domain[idx]
    }

    /// Resets the engine and decides whether `boxes[..n]` can be packed into
    /// one bin of the given dimensions, breaking the symmetry between the
    /// first two boxes the way the original solver does (box 0 is never
    /// placed to the right of, above, or behind box 1). On success,
    /// `boxes[..n]` holds a feasible coordinate assignment.
    ///
    /// `max_local_iters`, if set, caps how many recursion entries this one
    /// call may take before giving up inconclusively (`false`) — it never
    /// touches `budget`'s own shared node/iter/time limits, which remain in
    /// effect (and can still cut this call short) regardless.
    pub fn general_pack(&mut self, boxes: &mut [PackedBox], max_local_iters: Option<u64>, budget: &mut Budget) -> bool {
        self.relation.fill(Relation::Undef);
        for dom in self.domain.iter_mut() {
            *dom = Domain::all();
        }
        if self.n >= 2 {
            let d01 = self.dom_mut(0, 1);
            d01.set(Relation::Right, false);
            d01.set(Relation::Above, false);
            d01.set(Relation::Behind, false);
        }
        self.undo.clear();
        self.feasible = false;
        self.terminate = false;
        self.local_iters = 0;
        self.max_local_iters = max_local_iters;

        if self.n < 2 {
            self.feasible = true;
            self.solution = boxes[..self.n].to_vec();
        } else {
            self.recpack(0, 0, boxes, Relation::Undef, budget);
        }

        if self.feasible {
            boxes[..self.n].copy_from_slice(&self.solution);
        }
        self.feasible
    }

    fn recpack(&mut self, i: usize, j: usize, boxes: &mut [PackedBox], rel: Relation, budget: &mut Budget) {
        if self.terminate {
            return;
        }
        self.local_iters += 1;
        if let Some(max) = self.max_local_iters {
            if self.local_iters >= max {
                self.terminate = true;
                return;
            }
        }
        if !budget.enter_subsearch() {
            return;
        }
        self.set_rel(i, j, rel);

        if !self.find_coordinates(boxes) {
            return;
        }

        if i == self.n - 2 && j == self.n - 1 {
            self.feasible = true;
            self.terminate = true;
            self.solution = boxes[..self.n].to_vec();
            return;
        }

        let mark = self.undo.len();
        if self.reduce_domain(boxes) {
            let (ni, nj) = next_pair(i, j);
            for &cand in &RELATIONS {
                if self.terminate || budget.is_stopped() {
                    break;
                }
                if self.dom(ni, nj).get(cand) {
                    self.recpack(ni, nj, boxes, cand, budget);
                }
            }
        }
        self.popdomains(mark);
    }

    /// Constraint propagation: for every still-undecided pair, try each of
    /// the six relations in turn (`check_domain`), drop the ones that turn
    /// out infeasible, and fix any pair whose domain has collapsed to one
    /// relation. Returns `false` if a domain empties out.
    fn reduce_domain(&mut self, boxes: &mut [PackedBox]) -> bool {
        if self.n < 2 {
            return true;
        }
        for i in 0..self.n - 1 {
            for j in (i + 1)..self.n {
                if self.rel(i, j) != Relation::Undef {
                    continue;
                }
                for &cand in &RELATIONS {
                    self.check_domain(i, j, cand, boxes);
                }
                self.set_rel(i, j, Relation::Undef);

                let mut count = 0;
                let mut only = Relation::Undef;
                for &cand in &RELATIONS {
                    if self.dom(i, j).get(cand) {
                        count += 1;
                        only = cand;
                    }
                }
                if count == 0 {
                    return false;
                }
                if count == 1 {
                    self.undo.push(UndoEntry::Relation { i, j, old: Relation::Undef });
                    self.set_rel(i, j, only);
                }
            }
        }
        true
    }

    /// Tentatively imposes `value` between `i` and `j` and checks whether
    /// coordinates can still be found. If not, `value` is dropped from the
    /// pair's domain and the removal is logged for backtracking.
    fn check_domain(&mut self, i: usize, j: usize, value: Relation, boxes: &mut [PackedBox]) {
        if !self.dom(i, j).get(value) {
            return;
        }
        self.set_rel(i, j, value);
        if !self.find_coordinates(boxes) {
            self.dom_mut(i, j).set(value, false);
            self.undo.push(UndoEntry::Domain { i, j, rel: value });
        }
    }

    fn popdomains(&mut self, mark: usize) {
        while self.undo.len() > mark {
            match self.undo.pop().expect("checked len above") {
                UndoEntry::Domain { i, j, rel } => self.dom_mut(i, j).set(rel, true),
                UndoEntry::Relation { i, j, old } => self.set_rel(i, j, old),
            }
        }
    }

    /// Derives coordinates for `boxes[..n]` consistent with the currently
    /// fixed relations, by repeatedly pushing boxes apart until nothing
    /// moves. Returns `false` if no assignment is feasible — either a box
    /// would be pushed outside the bin, or some pair has no relation fixed
    /// and no candidate left in its domain.
    fn find_coordinates(&self, boxes: &mut [PackedBox]) -> bool {
        for i in 0..self.n {
            for j in (i + 1)..self.n {
                if self.rel(i, j) == Relation::Undef && self.dom(i, j).is_empty() {
                    return false;
                }
            }
        }

        for b in boxes.iter_mut().take(self.n) {
            b.x = 0;
            b.y = 0;
            b.z = 0;
        }

        for _ in 0..self.n {
            let mut changed = false;
            for i in 0..self.n {
                for j in (i + 1)..self.n {
                    match self.rel(i, j) {
                        Relation::Undef => {}
                        Relation::Left => {
                            let sum = boxes[i].x + boxes[i].w;
                            if boxes[j].x < sum {
                                boxes[j].x = sum;
                                changed = true;
                                if sum + boxes[j].w > self.w {
                                    return false;
                                }
                            }
                        }
                        Relation::Right => {
                            let sum = boxes[j].x + boxes[j].w;
                            if boxes[i].x < sum {
                                boxes[i].x = sum;
                                changed = true;
                                if sum + boxes[i].w > self.w {
                                    return false;
                                }
                            }
                        }
                        Relation::Under => {
                            let sum = boxes[i].y + boxes[i].h;
                            if boxes[j].y < sum {
                                boxes[j].y = sum;
                                changed = true;
                                if sum + boxes[j].h > self.h {
                                    return false;
                                }
                            }
                        }
                        Relation::Above => {
                            let sum = boxes[j].y + boxes[j].h;
                            if boxes[i].y < sum {
                                boxes[i].y = sum;
                                changed = true;
                                if sum + boxes[i].h > self.h {
                                    return false;
                                }
                            }
                        }
                        Relation::Front => {
                            let sum = boxes[i].z + boxes[i].d;
                            if boxes[j].z < sum {
                                boxes[j].z = sum;
                                changed = true;
                                if sum + boxes[j].d > self.d {
                                    return false;
                                }
                            }
                        }
                        Relation::Behind => {
                            let sum = boxes[j].z + boxes[j].d;
                            if boxes[i].z < sum {
                                boxes[i].z = sum;
                                changed = true;
                                if sum + boxes[i].d > self.d {
                                    return false;
                                }
                            }
                        }
                    }
                }
            }
            if !changed {
                return true;
            }
        }
        false
    }
}

/// Advances to the next box pair in the fixed enumeration order
/// `(0,1), (0,2), (1,2), (0,3), (1,3), (2,3), ...`.
fn next_pair(i: usize, j: usize) -> (usize, usize) {
    let mut ni = i + 1;
    let mut nj = j;
    if ni >= nj {
        ni = 0;
        nj += 1;
    }
    (ni, nj)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine_for(boxes: &[PackedBox], w: i32, h: i32, d: i32) -> (CpEngine, Vec<PackedBox>) {
        (CpEngine::new(boxes.len(), w, h, d), boxes.to_vec())
    }

    #[test]
    fn next_pair_enumerates_all_pairs_for_four_boxes() {
        let mut pairs = vec![(0usize, 1usize)];
        let mut cur = (0, 1);
        for _ in 0..5 {
            cur = next_pair(cur.0, cur.1);
            pairs.push(cur);
        }
        assert_eq!(pairs, vec![(0, 1), (0, 2), (1, 2), (0, 3), (1, 3), (2, 3)]);
    }

    #[test]
    fn two_boxes_that_fit_side_by_side_are_feasible() {
        let boxes = vec![PackedBox::new(1, 5, 10, 10), PackedBox::new(2, 5, 10, 10)];
        let (mut engine, mut scratch) = engine_for(&boxes, 10, 10, 10);
        let mut budget = Budget::unbounded();
        assert!(engine.general_pack(&mut scratch, None, &mut budget));
        assert_eq!(scratch[0].x + scratch[0].w, scratch[1].x.max(scratch[0].w));
    }

    #[test]
    fn four_oversized_boxes_are_infeasible() {
        let boxes = vec![
            PackedBox::new(1, 6, 6, 6),
            PackedBox::new(2, 6, 6, 6),
            PackedBox::new(3, 6, 6, 6),
            PackedBox::new(4, 6, 6, 6),
        ];
        let (mut engine, mut scratch) = engine_for(&boxes, 10, 10, 10);
        let mut budget = Budget::unbounded();
        assert!(!engine.general_pack(&mut scratch, None, &mut budget));
    }

    #[test]
    fn four_small_boxes_that_tile_exactly_are_feasible() {
        let boxes = vec![
            PackedBox::new(1, 5, 5, 10),
            PackedBox::new(2, 5, 5, 10),
            PackedBox::new(3, 5, 5, 10),
            PackedBox::new(4, 5, 5, 10),
        ];
        let (mut engine, mut scratch) = engine_for(&boxes, 10, 10, 10);
        let mut budget = Budget::unbounded();
        assert!(engine.general_pack(&mut scratch, None, &mut budget));
        for b in &scratch {
            assert!(b.fits_within(10, 10, 10));
        }
        for i in 0..scratch.len() {
            for j in (i + 1)..scratch.len() {
                assert!(!scratch[i].overlaps(&scratch[j]));
            }
        }
    }

    #[test]
    fn node_limit_can_cut_the_search_short() {
        // node_limit is in IUNIT(=1000)-sized batches; exhaust it directly
        // before handing the budget to the engine, so a feasible instance
        // still comes back infeasible once the budget is already stopped.
        let boxes = vec![
            PackedBox::new(1, 5, 5, 10),
            PackedBox::new(2, 5, 5, 10),
            PackedBox::new(3, 5, 5, 10),
            PackedBox::new(4, 5, 5, 10),
        ];
        let (mut engine, mut scratch) = engine_for(&boxes, 10, 10, 10);
        let mut budget = Budget::new(Some(1), None, None);
        for _ in 0..1000 {
            budget.enter_node();
        }
        assert!(budget.is_stopped());
        assert!(!engine.general_pack(&mut scratch, None, &mut budget));
    }
}
