//! Lower bounds L0, L1, L2 on the number of bins required.
//!
//! All three bounds operate on plain `(w, h, d)` dimension tuples rather
//! than on `PackedBox` directly, so that computing a bound under one of the
//! three axial orientations never needs to mutate (or clone-and-restore)
//! actual problem boxes — the orientation is just a different read of the
//! same tuples (see `rotate_all` / the "pure transform" design note).

use crate::geometry::volume;

type Dims = (i32, i32, i32);

fn rotate_all(dims: &[Dims]) -> Vec<Dims> {
    dims.iter().map(|&(w, h, d)| (h, d, w)).collect()
}

/// L0: the continuous volume bound, ⌈Σ vol / BVOL⌉.
pub fn l0(dims: &[Dims], bvol: i64) -> i64 {
    let vsum: i64 = dims.iter().map(|&(w, h, d)| volume(w, h, d)).sum();
    (vsum + bvol - 1) / bvol
}

/// Distinct box dimension values (along `pick`) that are `<= limit`,
/// sorted ascending.
fn plist(dims: &[Dims], limit: i32, pick: impl Fn(&Dims) -> i32) -> Vec<i32> {
    let mut v: Vec<i32> = dims.iter().map(pick).filter(|&x| x <= limit).collect();
    v.sort_unstable();
    v.dedup();
    v
}

/// L1 for the current orientation (height axis = `h`).
fn bound_one_x(dims: &[Dims], w: i32, h: i32, d: i32) -> i64 {
    if dims.is_empty() {
        return 0;
    }
    let w2 = w / 2;
    let d2 = d / 2;
    let chosen: Vec<Dims> = dims
        .iter()
        .copied()
        .filter(|&(bw, _, bd)| bw > w2 && bd > d2)
        .collect();
    if chosen.is_empty() {
        return 1;
    }
    let h2 = h / 2;
    let ps = plist(&chosen, h2, |&(_, bh, _)| bh);
    let mut lb: i64 = 1;
    for &p in &ps {
        let mut j1 = 0i64;
        let mut j2 = 0i64;
        let mut j2h = 0i64;
        let mut j2hp = 0i64;
        let mut j3 = 0i64;
        let mut j3h = 0i64;
        for &(_, bh, _) in &chosen {
            if bh > h - p {
                j1 += 1;
            }
            if h - p >= bh && bh > h2 {
                j2 += 1;
                j2h += i64::from(bh);
                j2hp += i64::from((h - bh) / p);
            }
            if h2 >= bh && bh >= p {
                j3 += 1;
                j3h += i64::from(bh);
            }
        }
        let alpha = ((j3h - (j2 * i64::from(h) - j2h)) as f64 / f64::from(h)).ceil() as i64;
        let beta = ((j3 - j2hp) as f64 / f64::from(h / p) as f64).ceil() as i64;
        let lb_one = j1 + j2 + alpha.max(0).max(beta.max(0));
        lb = lb.max(lb_one);
    }
    lb
}

/// L1: the best of the per-axis `bound_one_x` over all three orientations.
pub fn l1(dims: &[Dims], w: i32, h: i32, d: i32) -> i64 {
    let mut lb = 0;
    let mut cur_dims = dims.to_vec();
    let (mut cw, mut ch, mut cd) = (w, h, d);
    for _ in 0..3 {
        lb = lb.max(bound_one_x(&cur_dims, cw, ch, cd));
        cur_dims = rotate_all(&cur_dims);
        let (nw, nh, nd) = (ch, cd, cw);
        cw = nw;
        ch = nh;
        cd = nd;
    }
    lb
}

/// L2 for the current orientation: refines L1 by also restricting
/// the W and D axes.
fn bound_two_x(dims: &[Dims], w: i32, h: i32, d: i32) -> i64 {
    let lb1 = bound_one_x(dims, w, h, d);
    let mut lb = lb1;
    let hlb1 = i64::from(h) * lb1;
    let w2 = w / 2;
    let d2 = d / 2;
    let wd = f64::from(w) * f64::from(d);
    let bvol = volume(w, h, d);
    let ps = plist(dims, w2, |&(bw, _, _)| bw);
    let qs = plist(dims, d2, |&(_, _, bd)| bd);
    for &p in &ps {
        for &q in &qs {
            let mut k1h: i64 = 0;
            let mut k23v: i64 = 0;
            for &(bw, bh, bd) in dims {
                if bw > w - p && bd > d - q {
                    k1h += i64::from(bh);
                    continue;
                }
                if bw >= p && bd >= q {
                    k23v += volume(bw, bh, bd);
                }
            }
            let fract_num = k23v as f64 - (hlb1 - k1h) as f64 * wd;
            let fract = (fract_num / bvol as f64).ceil() as i64;
            lb = lb.max(lb1 + fract.max(0));
        }
    }
    lb
}

/// L2: the best of the per-axis `bound_two_x` over all three orientations.
pub fn l2(dims: &[Dims], w: i32, h: i32, d: i32) -> i64 {
    let mut lb = 0;
    let mut cur_dims = dims.to_vec();
    let (mut cw, mut ch, mut cd) = (w, h, d);
    for _ in 0..3 {
        lb = lb.max(bound_two_x(&cur_dims, cw, ch, cd));
        cur_dims = rotate_all(&cur_dims);
        let (nw, nh, nd) = (ch, cd, cw);
        cw = nw;
        ch = nh;
        cd = nd;
    }
    lb
}

/// The global lower bound: max(L0, L1, L2).
pub fn global_lb(dims: &[Dims], w: i32, h: i32, d: i32, bvol: i64) -> i64 {
    l0(dims, bvol).max(l1(dims, w, h, d)).max(l2(dims, w, h, d))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn l0_matches_tileable_instance() {
        let dims = vec![(5, 5, 5); 8];
        assert_eq!(l0(&dims, volume(10, 10, 10)), 1);
    }

    #[test]
    fn l1_forces_one_per_bin_when_pairwise_exclusive() {
        // 4 boxes of (7,7,7) in a 10x10x10 bin: no two can share a bin along h.
        let dims = vec![(7, 7, 7); 4];
        assert_eq!(l1(&dims, 10, 10, 10), 4);
    }

    #[test]
    fn l2_is_never_below_l1() {
        let dims = vec![(6, 6, 6), (6, 6, 6), (6, 6, 6)];
        assert!(l2(&dims, 10, 10, 10) >= l1(&dims, 10, 10, 10));
    }

    #[test]
    fn global_lb_catches_height_exclusion_volume_misses() {
        // three (10,10,6) boxes in a 10x10x10 bin: L0 says 2 bins suffice by
        // volume, but two 6-deep boxes can never share a 10-deep bin.
        let dims = vec![(10, 10, 6), (10, 10, 6), (10, 10, 6)];
        let bvol = volume(10, 10, 10);
        assert_eq!(l0(&dims, bvol), 2);
        assert!(global_lb(&dims, 10, 10, 10, bvol) >= 3);
    }
}
