//! Heuristic bin fillings: a layer (shelf) heuristic and an m-cut heuristic,
//! each run across all three axial orientations, keeping whichever used the
//! fewest bins.
//!
//! Both heuristics place boxes bin by bin and never backtrack across bins —
//! once a bin is closed its contents are final. They exist to give the
//! exact search (`search::rec_binpack`) a strong incumbent to prune against,
//! and to provide a usable answer cheaply when a problem's budget is
//! exhausted before the exact search converges.

use crate::budget::{Budget, MAXITER};
use crate::corner_fill::CornerFiller;
use crate::geometry::{rotate_dims, PackedBox};

/// Caps the 1D bin-packing sub-solve used to combine layers into bins.
const MAXBPP: u64 = 1_000_000;

/// Packs boxes named by `order` (already sorted by decreasing height) into
/// vertical shelves spanning width `w`, height `h`. A box joins the first
/// shelf it fits in; once the bin width is exhausted, boxes that don't fit
/// an existing shelf are left unassigned for a later layer.
fn one_layer(boxes: &mut [PackedBox], order: &[usize], w: i32, h: i32, assigned: &mut [bool]) {
    struct Shelf {
        x: i32,
        width: i32,
        height: i32,
    }
    let mut shelves: Vec<Shelf> = Vec::new();
    let mut remaining_width = w;

    for &idx in order {
        let bw = boxes[idx].w;
        let bh = boxes[idx].h;
        if bh > h {
            continue;
        }

        if let Some(shelf) = shelves.iter_mut().find(|s| bw <= s.width && s.height + bh <= h) {
            boxes[idx].x = shelf.x;
            boxes[idx].y = shelf.height;
            shelf.height += bh;
            assigned[idx] = true;
            continue;
        }

        if remaining_width <= 0 {
            continue;
        }
        let shelf_x = w - remaining_width;
        let shelf_width = bw.min(remaining_width);
        remaining_width -= shelf_width;
        boxes[idx].x = shelf_x;
        boxes[idx].y = 0;
        shelves.push(Shelf { x: shelf_x, width: shelf_width, height: bh });
        assigned[idx] = true;
    }
}

/// Exact small branch-and-bound for 1D bin packing: assigns each of
/// `depths` to an open bin of the given capacity or starts a new one,
/// minimizing the bin count. Capped at `MAXBPP` recursive calls.
struct OneDimBinPack {
    calls: u64,
    best_bins: usize,
    assignment: Vec<usize>,
    best_assignment: Vec<usize>,
}

impl OneDimBinPack {
    fn run(depths: &[i32], capacity: i32) -> Vec<usize> {
        let n = depths.len();
        if n == 0 {
            return Vec::new();
        }
        let mut solver = OneDimBinPack {
            calls: 0,
            best_bins: n + 1,
            assignment: vec![0; n],
            best_assignment: vec![0; n],
        };
        let mut remaining: Vec<i32> = Vec::new();
        solver.recurse(depths, 0, &mut remaining, capacity);
        if solver.calls > MAXBPP {
            tracing::debug!(calls = solver.calls, n, "one_dim_binpack hit MAXBPP cap; layer combination may be suboptimal");
        }
        solver.best_assignment
    }

    fn recurse(&mut self, depths: &[i32], i: usize, remaining: &mut Vec<i32>, capacity: i32) {
        self.calls += 1;
        if self.calls > MAXBPP {
            return;
        }
        if remaining.len() >= self.best_bins {
            return;
        }
        if i == depths.len() {
            self.best_bins = remaining.len();
            self.best_assignment = self.assignment.clone();
            return;
        }
        for b in 0..remaining.len() {
            if depths[i] <= remaining[b] {
                remaining[b] -= depths[i];
                self.assignment[i] = b;
                self.recurse(depths, i + 1, remaining, capacity);
                remaining[b] += depths[i];
            }
        }
        remaining.push(capacity - depths[i]);
        self.assignment[i] = remaining.len() - 1;
        self.recurse(depths, i + 1, remaining, capacity);
        remaining.pop();
    }
}

/// Builds layers (width x height slabs of whatever depth their tallest box
/// needs), then solves a 1D bin-packing problem on the layer depths to
/// combine layers into as few bins as possible.
pub fn layer_heuristic(boxes: &[PackedBox], w: i32, h: i32, d: i32) -> (Vec<PackedBox>, usize) {
    let mut boxes: Vec<PackedBox> = boxes.to_vec();
    for b in &mut boxes {
        b.clear_placement();
    }

    let mut remaining: Vec<usize> = (0..boxes.len()).collect();
    let mut layer_depth: Vec<i32> = Vec::new();
    let mut layer_of = vec![usize::MAX; boxes.len()];
    let cap_area = 2i64 * i64::from(w) * i64::from(h);

    while !remaining.is_empty() {
        remaining.sort_by(|&a, &b| boxes[b].d.cmp(&boxes[a].d));

        let mut area = 0i64;
        let mut cutoff = remaining.len();
        for (pos, &idx) in remaining.iter().enumerate() {
            area += i64::from(boxes[idx].w) * i64::from(boxes[idx].h);
            if area > cap_area {
                cutoff = pos + 1;
                break;
            }
        }
        let mut subset: Vec<usize> = remaining[..cutoff].to_vec();
        subset.sort_by(|&a, &b| boxes[b].h.cmp(&boxes[a].h));

        let mut assigned = vec![false; boxes.len()];
        one_layer(&mut boxes, &subset, w, h, &mut assigned);

        let lno = layer_depth.len();
        let mut depth = 0;
        let mut placed_any = false;
        remaining.retain(|&idx| {
            if assigned[idx] {
                layer_of[idx] = lno;
                depth = depth.max(boxes[idx].d);
                placed_any = true;
                false
            } else {
                true
            }
        });
        if !placed_any {
            break;
        }
        layer_depth.push(depth);
    }

    let bin_of_layer = OneDimBinPack::run(&layer_depth, d);
    let used_bins = bin_of_layer.iter().copied().max().map_or(0, |m| m + 1);

    let mut z_of_layer = vec![0i32; layer_depth.len()];
    for bno in 0..used_bins {
        let mut z = 0;
        for (lno, &b) in bin_of_layer.iter().enumerate() {
            if b == bno {
                z_of_layer[lno] = z;
                z += layer_depth[lno];
            }
        }
    }

    for (idx, b) in boxes.iter_mut().enumerate() {
        let lno = layer_of[idx];
        if lno == usize::MAX {
            continue;
        }
        b.z = z_of_layer[lno];
        b.bno = bin_of_layer[lno] + 1;
        b.chosen = true;
    }

    (boxes, used_bins)
}

/// Fills bins one at a time with `corner_fill::CornerFiller`, capping its
/// branching fanout (`mcut`) according to problem size, the way the exact
/// corner-point search is turned into a cheap heuristic.
pub fn mcut_heuristic(boxes: &[PackedBox], w: i32, h: i32, d: i32) -> (Vec<PackedBox>, usize) {
    let n = boxes.len();
    let mcut = if n < 10 {
        4
    } else if n < 15 {
        3
    } else {
        2
    };

    let mut boxes: Vec<PackedBox> = boxes.to_vec();
    for b in &mut boxes {
        b.clear_placement();
    }

    let mut bno = 0usize;
    loop {
        let open: Vec<usize> = (0..boxes.len()).filter(|&i| boxes[i].bno == 0).collect();
        if open.is_empty() {
            break;
        }
        bno += 1;

        let mut subset: Vec<PackedBox> = open.iter().map(|&i| boxes[i]).collect();
        let n_subset = subset.len();
        let mut filler = CornerFiller::new(w, h, d, mcut);
        let mut budget = Budget::new(None, Some(5 * MAXITER), None);
        filler.fill(&mut subset, n_subset, 0, &mut budget);

        let solved = filler.best_solution();
        for (pos, &idx) in open.iter().enumerate() {
            if solved[pos].chosen {
                boxes[idx].x = solved[pos].x;
                boxes[idx].y = solved[pos].y;
                boxes[idx].z = solved[pos].z;
                boxes[idx].bno = bno;
                boxes[idx].chosen = true;
            }
        }
    }

    (boxes, bno)
}

/// Runs `fill` across all three axial orientations and keeps the best
/// result, carrying the previous best through each rotation in lockstep so
/// that whichever orientation wins ends up expressed in the original frame.
fn run_three_rotations<F>(boxes: &[PackedBox], w: i32, h: i32, d: i32, mut fill: F) -> (Vec<PackedBox>, usize)
where
    F: FnMut(&[PackedBox], i32, i32, i32) -> (Vec<PackedBox>, usize),
{
    let n = boxes.len();
    let mut cur: Vec<PackedBox> = boxes.to_vec();
    let mut best: Vec<PackedBox> = boxes.to_vec();
    let mut best_bins = n + 1;
    let (mut cw, mut ch, mut cd) = (w, h, d);

    for _ in 0..3 {
        let (trial, bins) = fill(&cur, cw, ch, cd);
        if bins < best_bins {
            best_bins = bins;
            best = trial;
        }
        for b in &mut best {
            b.rotate();
        }
        for b in &mut cur {
            b.rotate();
        }
        let (nw, nh, nd) = rotate_dims(cw, ch, cd);
        cw = nw;
        ch = nh;
        cd = nd;
    }
    (best, best_bins)
}

pub fn layer3_heuristic(boxes: &[PackedBox], w: i32, h: i32, d: i32) -> (Vec<PackedBox>, usize) {
    run_three_rotations(boxes, w, h, d, layer_heuristic)
}

pub fn mcut3_heuristic(boxes: &[PackedBox], w: i32, h: i32, d: i32) -> (Vec<PackedBox>, usize) {
    run_three_rotations(boxes, w, h, d, mcut_heuristic)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_dim_binpack_combines_exactly_tileable_depths() {
        let depths = vec![4, 4, 4, 4, 4];
        let assignment = OneDimBinPack::run(&depths, 10);
        let bins_used = assignment.iter().copied().max().unwrap() + 1;
        assert_eq!(bins_used, 2);
    }

    #[test]
    fn layer_heuristic_packs_a_single_flat_layer_of_cubes() {
        let boxes: Vec<PackedBox> = (1..=4).map(|no| PackedBox::new(no, 5, 5, 5)).collect();
        let (solution, bins) = layer_heuristic(&boxes, 10, 10, 5);
        assert_eq!(bins, 1);
        for b in &solution {
            assert!(b.chosen);
            assert!(b.fits_within(10, 10, 5));
        }
    }

    #[test]
    fn mcut_heuristic_fills_a_single_bin_exactly() {
        let boxes: Vec<PackedBox> = (1..=8).map(|no| PackedBox::new(no, 5, 5, 5)).collect();
        let (solution, bins) = mcut_heuristic(&boxes, 10, 10, 10);
        assert_eq!(bins, 1);
        for b in &solution {
            assert!(b.chosen);
        }
    }

    #[test]
    fn three_rotation_driver_returns_original_dimensions() {
        let boxes: Vec<PackedBox> = vec![PackedBox::new(1, 3, 4, 5)];
        let (solution, _bins) = layer3_heuristic(&boxes, 10, 10, 10);
        assert_eq!((solution[0].w, solution[0].h, solution[0].d), (3, 4, 5));
    }
}
