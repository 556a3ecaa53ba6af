//! Bin-closing subroutine: proves that a candidate bin can never usefully
//! change again, so the outer search can stop branching on it.
//!
//! A bin qualifies once its committed volume reaches half the bin volume
//! *and* the set of its current occupants, together with every
//! still-unplaced box that individually fits alongside them, admits a
//! simultaneous single-bin packing. That combined packing is then final:
//! nothing left in the search can ever improve on it, so the bin is marked
//! closed and its boxes are committed.
//!
//! Bounded by `MAXCLOSE` recursion depth (levels below the root of the
//! search tree) purely as a performance throttle — it does not affect
//! optimality, since a bin that qualifies for closing at a shallower level
//! would have qualified again were it checked deeper.

use crate::budget::Budget;
use crate::geometry::PackedBox;
use crate::search::{onebin_decision, onebin_heuristic, ExactSearch};

/// Recursion depth below which `try_close` is attempted at all.
pub const MAXCLOSE: usize = 16;

/// Snapshot of everything `try_close` may mutate, taken lazily the first
/// time a bin actually closes so that the common case (nothing closes)
/// pays no cost.
pub struct CloseSnapshot {
    closed: Vec<bool>,
    boxes: Vec<PackedBox>,
    noc: usize,
}

impl ExactSearch {
    /// Attempts to close every open bin among `1..=bno`. Returns a snapshot
    /// of prior state if at least one bin closed, so the caller can restore
    /// it on backtrack via [`ExactSearch::restore`]; returns `None` (no
    /// snapshot needed) if nothing changed.
    pub(crate) fn try_close(&mut self, bno: usize, level: usize, budget: &mut Budget) -> Option<CloseSnapshot> {
        if level > MAXCLOSE {
            return None;
        }

        let mut snapshot: Option<CloseSnapshot> = None;

        for b in 1..=bno {
            if self.closed[b] {
                continue;
            }

            let members: Vec<usize> = self
                .order
                .iter()
                .copied()
                .filter(|&idx| self.boxes[idx].bno == b)
                .collect();
            if members.is_empty() {
                debug_assert!(false, "bin {b} has no boxes at close time");
                continue;
            }
            let mut vol: i64 = members.iter().map(|&idx| self.boxes[idx].vol).sum();
            if vol < self.bvol / 2 {
                continue;
            }

            let mut extra: Vec<usize> = Vec::new();
            for &idx in &self.order {
                if self.boxes[idx].bno != 0 {
                    continue;
                }
                if onebin_decision(&mut self.boxes, idx, b, self.w, self.h, self.d, budget) {
                    extra.push(idx);
                    vol += self.boxes[idx].vol;
                }
                if vol > self.bvol {
                    break;
                }
            }
            if vol > self.bvol {
                continue;
            }

            let mut combined = members;
            combined.extend(extra);
            let mut scratch: Vec<PackedBox> = combined.iter().map(|&idx| self.boxes[idx]).collect();
            if !onebin_heuristic(&mut scratch, self.w, self.h, self.d, true, budget) {
                continue;
            }

            if snapshot.is_none() {
                snapshot = Some(CloseSnapshot {
                    closed: self.closed.clone(),
                    boxes: self.boxes.clone(),
                    noc: self.noc,
                });
            }
            self.closed[b] = true;
            self.noc += 1;
            for (slot, &idx) in combined.iter().enumerate() {
                self.boxes[idx].x = scratch[slot].x;
                self.boxes[idx].y = scratch[slot].y;
                self.boxes[idx].z = scratch[slot].z;
                self.boxes[idx].bno = b;
                self.boxes[idx].chosen = true;
            }
        }

        snapshot
    }

    /// Undoes every change `try_close` made, restoring the exact state from
    /// before the first bin closed this node.
    pub(crate) fn restore(&mut self, snapshot: CloseSnapshot) {
        self.closed = snapshot.closed;
        self.boxes = snapshot.boxes;
        self.noc = snapshot.noc;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::PackedBox;

    #[test]
    fn closes_a_half_full_bin_once_no_more_boxes_can_join() {
        // Bin is 10x10x10. Box 1 (10x10x6) occupies more than half the
        // volume; the only remaining box (10x10x5) cannot join it, so the
        // bin should close.
        let mut boxes = vec![PackedBox::new(1, 10, 10, 6), PackedBox::new(2, 10, 10, 5)];
        boxes[0].bno = 1;
        boxes[0].chosen = true;
        let mut search = ExactSearch::new(boxes, 10, 10, 10);
        let mut budget = Budget::unbounded();
        let snapshot = search.try_close(1, 1, &mut budget);
        assert!(snapshot.is_some());
        assert!(search.closed[1]);
        assert_eq!(search.noc, 1);
    }

    #[test]
    fn restore_undoes_a_close() {
        let mut boxes = vec![PackedBox::new(1, 10, 10, 6), PackedBox::new(2, 10, 10, 5)];
        boxes[0].bno = 1;
        boxes[0].chosen = true;
        let mut search = ExactSearch::new(boxes, 10, 10, 10);
        let mut budget = Budget::unbounded();
        let snapshot = search.try_close(1, 1, &mut budget).expect("bin should close");
        search.restore(snapshot);
        assert!(!search.closed[1]);
        assert_eq!(search.noc, 0);
    }

    #[test]
    fn leaves_bin_open_when_below_half_full() {
        // try_close only considers bins at or above half the bin volume;
        // a single small box never qualifies for the attempt at all.
        let mut boxes = vec![PackedBox::new(1, 6, 6, 6), PackedBox::new(2, 4, 4, 4)];
        boxes[0].bno = 1;
        boxes[0].chosen = true;
        let mut search = ExactSearch::new(boxes, 10, 10, 10);
        let mut budget = Budget::unbounded();
        let snapshot = search.try_close(1, 1, &mut budget);
        assert!(snapshot.is_none());
        assert!(!search.closed[1]);
    }
}
