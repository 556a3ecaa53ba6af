//! Exact outer branch-and-bound: assigns boxes to bins one at a time, in
//! decreasing-volume order, deciding for each box whether it joins an
//! already-open bin or starts a new one. Feasibility of adding a box to a
//! bin is decided by [`onebin_decision`]; [`close::try_close`] closes bins
//! early when no further box could possibly join them, which both prunes
//! the tree and lets deeper recursion levels skip over bins that can no
//! longer change.

use crate::budget::{Budget, MAXITER};
use crate::bounds::l2;
use crate::cp_engine::CpEngine;
use crate::geometry::{volume, PackedBox};
use crate::small_cases::{fits2, fits3};

/// Checks whether the boxes in `boxes` (coordinates assumed already zeroed)
/// fit into one bin, using the specialized two/three-box tests for small
/// sets and the CP engine otherwise. `fast` bounds the CP engine's node
/// count instead of letting it run to exhaustion — used when the caller
/// only needs a heuristic yes/no, not a certificate.
pub fn onebin_heuristic(boxes: &mut [PackedBox], w: i32, h: i32, d: i32, fast: bool, budget: &mut Budget) -> bool {
    for b in boxes.iter_mut() {
        b.x = 0;
        b.y = 0;
        b.z = 0;
    }
    match boxes.len() {
        0 => true,
        1 => true,
        2 => {
            let (head, tail) = boxes.split_at_mut(1);
            fits2(&head[0], &mut tail[0], w, h, d)
        }
        3 => fits3(boxes, 0, 1, 2, w, h, d),
        _ => fitsm(boxes, w, h, d, fast, budget),
    }
}

/// L2 (3-rotation) bound on `boxes` alone; above 1, no single bin can hold
/// them all, so the CP engine needn't even be tried.
///
/// The CP engine runs against the caller's own outer search budget, so a
/// long single-bin decision is still cut short by the outer `time_limit`
/// or `iter_limit`. `fast` mode additionally caps this one call at
/// `MAXITER` recursion entries; an exhausted fast cap just makes this
/// single decision inconclusive (`false`) without touching the shared
/// budget — see [`CpEngine::general_pack`]'s local iteration cap.
fn fitsm(boxes: &mut [PackedBox], w: i32, h: i32, d: i32, fast: bool, budget: &mut Budget) -> bool {
    if budget.is_stopped() {
        return false;
    }
    let dims: Vec<(i32, i32, i32)> = boxes.iter().map(|b| (b.w, b.h, b.d)).collect();
    if l2(&dims, w, h, d) > 1 {
        return false;
    }
    let mut engine = CpEngine::new(boxes.len(), w, h, d);
    let cap = if fast { Some(MAXITER) } else { None };
    engine.general_pack(boxes, cap, budget)
}

/// Checks whether box `cand` (by index) fits into bin `bin_no` together with
/// whatever is already assigned there, using the exact (unbounded) test.
/// On success, updates the coordinates of every box now in that bin —
/// `cand` included — leaving `bno`/`chosen` assignment to the caller.
pub fn onebin_decision(boxes: &mut [PackedBox], cand: usize, bin_no: usize, w: i32, h: i32, d: i32, budget: &mut Budget) -> bool {
    let mut members: Vec<usize> = boxes
        .iter()
        .enumerate()
        .filter(|(idx, b)| *idx != cand && b.bno == bin_no)
        .map(|(idx, _)| idx)
        .collect();
    members.push(cand);

    let mut scratch: Vec<PackedBox> = members.iter().map(|&idx| boxes[idx]).collect();
    let fits = onebin_heuristic(&mut scratch, w, h, d, false, budget);
    if fits {
        for (slot, &idx) in members.iter().enumerate() {
            boxes[idx].x = scratch[slot].x;
            boxes[idx].y = scratch[slot].y;
            boxes[idx].z = scratch[slot].z;
        }
    }
    fits
}

/// State for the exact outer search: the full box list (placement and bin
/// number as currently decided), the fixed decreasing-volume processing
/// order, and which bin numbers are permanently closed.
pub struct ExactSearch {
    pub(crate) boxes: Vec<PackedBox>,
    pub(crate) order: Vec<usize>,
    pub(crate) closed: Vec<bool>,
    pub(crate) w: i32,
    pub(crate) h: i32,
    pub(crate) d: i32,
    pub(crate) bvol: i64,
    /// Number of currently closed bins, mirroring the original's `a->noc`.
    pub(crate) noc: usize,
    best_bins: usize,
    best_solution: Vec<PackedBox>,
}

impl ExactSearch {
    pub fn new(boxes: Vec<PackedBox>, w: i32, h: i32, d: i32) -> Self {
        let order: Vec<usize> = (0..boxes.len()).collect();
        let n = boxes.len();
        Self {
            boxes,
            order,
            closed: vec![false; n + 2],
            w,
            h,
            d,
            bvol: volume(w, h, d),
            noc: 0,
            best_bins: n + 1,
            best_solution: Vec::new(),
        }
    }

    pub fn best_bins(&self) -> usize {
        self.best_bins
    }

    pub fn best_solution(&self) -> &[PackedBox] {
        &self.best_solution
    }

    /// The first (in fixed order) box not yet assigned to any bin.
    pub(crate) fn next_pending(&self) -> Option<usize> {
        self.order.iter().copied().find(|&idx| self.boxes[idx].bno == 0)
    }

    /// Runs the exact search, starting from an all-unassigned state and
    /// the given incumbent lower bound (used purely for pruning; an
    /// already-known heuristic solution should be loaded via
    /// `seed_incumbent` first).
    pub fn solve(&mut self, lb: i64, budget: &mut Budget) {
        self.rec_binpack(0, lb, 1, budget);
    }

    /// Seeds the incumbent (e.g. from a heuristic solution) so the search
    /// only looks for strictly better solutions.
    pub fn seed_incumbent(&mut self, solution: Vec<PackedBox>, bins: usize) {
        self.best_solution = solution;
        self.best_bins = bins;
    }

    fn save_solution(&mut self, bno: usize) {
        if bno < self.best_bins {
            self.best_bins = bno;
            self.best_solution = self.boxes.clone();
        }
    }

    fn rec_binpack(&mut self, bno: usize, lb: i64, level: usize, budget: &mut Budget) {
        if bno >= self.best_bins {
            return;
        }
        if i64::from(self.best_bins as i32) <= lb {
            return;
        }
        if !budget.enter_node() {
            return;
        }

        let Some(_first) = self.next_pending() else {
            self.save_solution(bno);
            return;
        };

        let snapshot = self.try_close(bno, level, budget);

        let Some(i) = self.next_pending() else {
            self.save_solution(bno);
            if let Some(s) = snapshot {
                self.restore(s);
            }
            return;
        };

        let mut lb = lb;
        if snapshot.is_some() {
            let dims: Vec<(i32, i32, i32)> = self
                .order
                .iter()
                .filter(|&&idx| self.boxes[idx].bno == 0)
                .map(|&idx| (self.boxes[idx].w, self.boxes[idx].h, self.boxes[idx].d))
                .collect();
            lb = lb.max(self.noc as i64 + l2(&dims, self.w, self.h, self.d));
        }

        if lb < self.best_bins as i64 {
            for b in 1..=bno {
                if self.closed[b] {
                    continue;
                }
                if onebin_decision(&mut self.boxes, i, b, self.w, self.h, self.d, budget) {
                    self.boxes[i].bno = b;
                    self.rec_binpack(bno, lb, level + 1, budget);
                    self.boxes[i].bno = 0;
                }
                if budget.is_stopped() {
                    break;
                }
            }
            if !budget.is_stopped() {
                self.boxes[i].bno = bno + 1;
                self.boxes[i].x = 0;
                self.boxes[i].y = 0;
                self.boxes[i].z = 0;
                if bno + 1 < self.closed.len() {
                    self.closed[bno + 1] = false;
                }
                self.rec_binpack(bno + 1, lb, level + 1, budget);
                self.boxes[i].bno = 0;
            }
        }

        if let Some(s) = snapshot {
            self.restore(s);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::budget::Budget;

    #[test]
    fn onebin_decision_accepts_a_box_that_fits_alongside_an_existing_one() {
        let mut boxes = vec![PackedBox::new(1, 5, 10, 10), PackedBox::new(2, 5, 10, 10)];
        boxes[0].bno = 1;
        let mut budget = Budget::unbounded();
        assert!(onebin_decision(&mut boxes, 1, 1, 10, 10, 10, &mut budget));
    }

    #[test]
    fn exact_search_packs_eight_cubes_into_one_bin() {
        let boxes: Vec<PackedBox> = (1..=8).map(|no| PackedBox::new(no, 5, 5, 5)).collect();
        let mut search = ExactSearch::new(boxes, 10, 10, 10);
        let mut budget = Budget::unbounded();
        search.solve(1, &mut budget);
        assert_eq!(search.best_bins(), 1);
    }

    #[test]
    fn exact_search_needs_two_bins_for_two_half_volume_boxes_that_cannot_share() {
        let boxes = vec![PackedBox::new(1, 10, 10, 6), PackedBox::new(2, 10, 10, 6)];
        let mut search = ExactSearch::new(boxes, 10, 10, 10);
        let mut budget = Budget::unbounded();
        search.solve(1, &mut budget);
        assert_eq!(search.best_bins(), 2);
    }
}
