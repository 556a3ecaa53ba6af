//! Top-level entry point: validates input, computes the global lower bound,
//! seeds an incumbent from the two initial heuristics, then runs the exact
//! search and assembles the result the CLI and HTTP server both build on.

use std::time::Duration;

use crate::bounds::global_lb;
use crate::budget::{Budget, TerminationReason};
use crate::error::PackError;
use crate::geometry::{check_solution, volume, PackedBox, MAXBOXES};
use crate::heuristics::{layer3_heuristic, mcut3_heuristic};
use crate::search::ExactSearch;

/// One box to be packed, as given by a caller (CLI arguments or an HTTP
/// request body) before numbering and sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoxSpec {
    pub w: i32,
    pub h: i32,
    pub d: i32,
}

/// A box as placed in the returned solution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacedBox {
    pub no: usize,
    pub w: i32,
    pub h: i32,
    pub d: i32,
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub bno: usize,
}

/// Search limits. `None` (or zero, at the CLI/HTTP boundary) disables a
/// given limit.
#[derive(Debug, Clone, Copy, Default)]
pub struct SolveLimits {
    pub node_limit: Option<u64>,
    pub iter_limit: Option<u64>,
    pub time_limit: Option<Duration>,
}

/// How much of the search budget was actually consumed.
#[derive(Debug, Clone, Copy, Default)]
pub struct UsageStats {
    pub node_used: u64,
    pub iter_used: u64,
    pub time_used: Duration,
}

/// The full result of a `binpack3d` call.
#[derive(Debug, Clone)]
pub struct SolveOutcome {
    pub placements: Vec<PlacedBox>,
    pub lb: i64,
    pub ub: usize,
    pub usage: UsageStats,
    pub termination: TerminationReason,
}

/// Orders boxes by decreasing volume, ties broken by decreasing `no`
/// (mirroring the original's `vcomp` comparator) so that processing order
/// is deterministic and independent of input order.
fn vcomp(a: &PackedBox, b: &PackedBox) -> std::cmp::Ordering {
    b.vol.cmp(&a.vol).then(b.no.cmp(&a.no))
}

fn validate(w: i32, h: i32, d: i32, boxes: &[BoxSpec]) -> Result<(), PackError> {
    if w <= 0 || h <= 0 || d <= 0 {
        return Err(PackError::InvalidBin { w, h, d });
    }
    if boxes.is_empty() {
        return Err(PackError::Empty);
    }
    if boxes.len() + 1 > MAXBOXES {
        return Err(PackError::TooManyBoxes { n: boxes.len() });
    }
    for (idx, b) in boxes.iter().enumerate() {
        let no = idx + 1;
        if b.w < 1 || b.w > w {
            return Err(PackError::InvalidDimension { no, dim: "w", value: b.w, limit: w });
        }
        if b.h < 1 || b.h > h {
            return Err(PackError::InvalidDimension { no, dim: "h", value: b.h, limit: h });
        }
        if b.d < 1 || b.d > d {
            return Err(PackError::InvalidDimension { no, dim: "d", value: b.d, limit: d });
        }
    }
    Ok(())
}

/// Packs `boxes` into the fewest possible `w x h x d` bins.
///
/// Validates input, computes the global lower bound once, seeds an
/// incumbent from whichever of the layer and m-cut heuristics uses fewer
/// bins (both are tried across all three axial orientations), then hands
/// off to the exact branch-and-bound. On budget exhaustion the best
/// incumbent found so far is returned, with `lb` left at the last proven
/// bound (strictly below `ub`) and `termination` set accordingly.
pub fn binpack3d(w: i32, h: i32, d: i32, boxes: &[BoxSpec], limits: SolveLimits) -> Result<SolveOutcome, PackError> {
    validate(w, h, d, boxes)?;

    let packed: Vec<PackedBox> = boxes
        .iter()
        .enumerate()
        .map(|(idx, b)| PackedBox::new(idx + 1, b.w, b.h, b.d))
        .collect();

    let mut sorted = packed.clone();
    sorted.sort_by(vcomp);

    let dims: Vec<(i32, i32, i32)> = sorted.iter().map(|b| (b.w, b.h, b.d)).collect();
    let bvol = volume(w, h, d);
    let lb0 = global_lb(&dims, w, h, d, bvol);

    let (layer_solution, layer_bins) = layer3_heuristic(&sorted, w, h, d);
    let (mcut_solution, mcut_bins) = mcut3_heuristic(&sorted, w, h, d);
    let (incumbent, incumbent_bins) =
        if mcut_bins < layer_bins { (mcut_solution, mcut_bins) } else { (layer_solution, layer_bins) };

    let mut search = ExactSearch::new(sorted, w, h, d);
    search.seed_incumbent(incumbent, incumbent_bins);

    let mut budget = Budget::new(limits.node_limit, limits.iter_limit, limits.time_limit);
    search.solve(lb0, &mut budget);

    let ub = search.best_bins();
    let solution = search.best_solution();
    check_solution(solution, w, h, d, ub);

    let lb = if budget.is_stopped() && budget.reason() != Some(TerminationReason::Optimal) {
        lb0.min(ub as i64)
    } else {
        ub as i64
    };
    let termination = budget.reason().unwrap_or(TerminationReason::Optimal);

    let mut placements: Vec<PlacedBox> = solution
        .iter()
        .map(|b| PlacedBox { no: b.no, w: b.w, h: b.h, d: b.d, x: b.x, y: b.y, z: b.z, bno: b.bno })
        .collect();
    placements.sort_by_key(|p| p.no);

    Ok(SolveOutcome {
        placements,
        lb,
        ub,
        usage: UsageStats { node_used: budget.nodes_used(), iter_used: budget.iters_used(), time_used: budget.time_used() },
        termination,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_box_list() {
        let err = binpack3d(10, 10, 10, &[], SolveLimits::default()).unwrap_err();
        assert_eq!(err, PackError::Empty);
    }

    #[test]
    fn rejects_zero_bin_dimension() {
        let boxes = [BoxSpec { w: 1, h: 1, d: 1 }];
        let err = binpack3d(10, 0, 10, &boxes, SolveLimits::default()).unwrap_err();
        assert_eq!(err, PackError::InvalidBin { w: 10, h: 0, d: 10 });
    }

    #[test]
    fn rejects_box_larger_than_bin() {
        let boxes = [BoxSpec { w: 20, h: 1, d: 1 }];
        let err = binpack3d(10, 10, 10, &boxes, SolveLimits::default()).unwrap_err();
        assert_eq!(err, PackError::InvalidDimension { no: 1, dim: "w", value: 20, limit: 10 });
    }

    #[test]
    fn packs_eight_cubes_into_one_bin() {
        let boxes = [BoxSpec { w: 5, h: 5, d: 5 }; 8];
        let outcome = binpack3d(10, 10, 10, &boxes, SolveLimits::default()).unwrap();
        assert_eq!(outcome.ub, 1);
        assert_eq!(outcome.lb, 1);
        assert_eq!(outcome.termination, TerminationReason::Optimal);
        assert_eq!(outcome.placements.len(), 8);
        for p in &outcome.placements {
            assert_eq!(p.bno, 1);
        }
    }

    #[test]
    fn needs_two_bins_for_two_half_volume_boxes_that_cannot_share() {
        let boxes = [BoxSpec { w: 10, h: 10, d: 6 }, BoxSpec { w: 10, h: 10, d: 6 }];
        let outcome = binpack3d(10, 10, 10, &boxes, SolveLimits::default()).unwrap();
        assert_eq!(outcome.ub, 2);
    }

    #[test]
    fn placements_are_returned_in_input_numbering_order() {
        let boxes = [
            BoxSpec { w: 3, h: 3, d: 3 },
            BoxSpec { w: 2, h: 2, d: 2 },
            BoxSpec { w: 1, h: 1, d: 1 },
        ];
        let outcome = binpack3d(10, 10, 10, &boxes, SolveLimits::default()).unwrap();
        let nos: Vec<usize> = outcome.placements.iter().map(|p| p.no).collect();
        assert_eq!(nos, vec![1, 2, 3]);
    }

    #[test]
    fn a_tight_node_limit_reports_a_non_optimal_termination() {
        let boxes: Vec<BoxSpec> = (0..20).map(|_| BoxSpec { w: 3, h: 3, d: 3 }).collect();
        let limits = SolveLimits { node_limit: Some(1), ..SolveLimits::default() };
        let outcome = binpack3d(10, 10, 10, &boxes, limits).unwrap();
        assert_ne!(outcome.termination, TerminationReason::Optimal);
        assert!(outcome.lb <= outcome.ub as i64);
    }

    /// Scenario (a): two half-height slabs stack along the free axis.
    #[test]
    fn two_half_height_slabs_share_one_bin() {
        let boxes = [BoxSpec { w: 10, h: 10, d: 5 }, BoxSpec { w: 10, h: 10, d: 5 }];
        let outcome = binpack3d(10, 10, 10, &boxes, SolveLimits::default()).unwrap();
        assert_eq!(outcome.ub, 1);
        assert_eq!(outcome.lb, 1);
    }

    /// Scenario (c): four mixed-size boxes that exactly tile one 10x10 face
    /// at a shared depth of 5 (two side-by-side pairs, one per half of the
    /// face) all fit in a single bin with room to spare behind them.
    #[test]
    fn four_mixed_size_boxes_tiling_one_face_pack_into_one_bin() {
        let boxes = [
            BoxSpec { w: 6, h: 4, d: 5 },
            BoxSpec { w: 4, h: 4, d: 5 },
            BoxSpec { w: 5, h: 6, d: 5 },
            BoxSpec { w: 5, h: 6, d: 5 },
        ];
        let outcome = binpack3d(10, 10, 10, &boxes, SolveLimits::default()).unwrap();
        assert_eq!(outcome.ub, 1);
    }

    /// Scenario (e): four boxes each strictly over half the bin along every
    /// axis can never share a bin pairwise, so each needs its own — L1
    /// should establish this without the exact search needing to prove it
    /// box by box.
    #[test]
    fn four_pairwise_exclusive_boxes_need_four_bins() {
        let boxes = [BoxSpec { w: 7, h: 7, d: 7 }; 4];
        let outcome = binpack3d(10, 10, 10, &boxes, SolveLimits::default()).unwrap();
        assert_eq!(outcome.ub, 4);
        assert_eq!(outcome.lb, 4);
    }

    /// Idempotence: boxes exactly matching the bin's dimensions always need
    /// one bin each, however many there are.
    #[test]
    fn boxes_matching_bin_dimensions_need_one_bin_each() {
        let boxes = [BoxSpec { w: 10, h: 10, d: 10 }; 3];
        let outcome = binpack3d(10, 10, 10, &boxes, SolveLimits::default()).unwrap();
        assert_eq!(outcome.ub, 3);
    }

    /// Rotation law: cyclically permuting the bin and every box's dimensions
    /// (W,H,D -> H,D,W) must not change the optimal bin count.
    #[test]
    fn cyclic_dimension_rotation_preserves_the_optimal_bin_count() {
        let boxes = [
            BoxSpec { w: 7, h: 4, d: 3 },
            BoxSpec { w: 6, h: 6, d: 5 },
            BoxSpec { w: 5, h: 5, d: 5 },
            BoxSpec { w: 4, h: 3, d: 8 },
        ];
        let original = binpack3d(10, 10, 10, &boxes, SolveLimits::default()).unwrap();

        let rotated_boxes: Vec<BoxSpec> = boxes.iter().map(|b| BoxSpec { w: b.h, h: b.d, d: b.w }).collect();
        let rotated = binpack3d(10, 10, 10, &rotated_boxes, SolveLimits::default()).unwrap();

        assert_eq!(original.ub, rotated.ub);
    }

    /// Budget property: an unlimited rerun never needs more bins than a
    /// tightly node-limited one.
    #[test]
    fn unlimited_budget_matches_or_beats_a_tight_node_limit() {
        let boxes: Vec<BoxSpec> = (0..8).map(|_| BoxSpec { w: 4, h: 4, d: 4 }).collect();
        let limited = binpack3d(10, 10, 10, &boxes, SolveLimits { node_limit: Some(1), ..SolveLimits::default() }).unwrap();
        let unlimited = binpack3d(10, 10, 10, &boxes, SolveLimits::default()).unwrap();
        assert!(unlimited.ub <= limited.ub);
        assert_eq!(unlimited.termination, TerminationReason::Optimal);
    }
}
