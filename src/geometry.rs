//! Box and bin geometry primitives: volume, axis rotation, overlap testing,
//! and whole-solution validation.

/// Upper bound on the number of boxes a single `Problem` may hold (plus one
/// scratch slot), mirroring the original solver's `MAXBOXES`.
pub const MAXBOXES: usize = 101;

/// One of the three coordinate axes a box or bin is measured along.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    W,
    H,
    D,
}

/// A box with fixed (non-rotatable) integer dimensions, carrying whatever
/// placement has been assigned to it so far.
///
/// `bno == 0` means unplaced; `chosen` is a transient flag used only by the
/// corner-point filler to mark boxes committed within one `branch` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackedBox {
    pub no: usize,
    pub w: i32,
    pub h: i32,
    pub d: i32,
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub bno: usize,
    pub chosen: bool,
    pub vol: i64,
}

impl PackedBox {
    pub fn new(no: usize, w: i32, h: i32, d: i32) -> Self {
        Self {
            no,
            w,
            h,
            d,
            x: 0,
            y: 0,
            z: 0,
            bno: 0,
            chosen: false,
            vol: volume(w, h, d),
        }
    }

    /// Resets placement state, keeping identity and dimensions.
    pub fn clear_placement(&mut self) {
        self.x = 0;
        self.y = 0;
        self.z = 0;
        self.bno = 0;
        self.chosen = false;
    }

    /// Rotates this box's dimensions and any assigned coordinates one step
    /// through the cycle w -> h -> d -> w.
    pub fn rotate(&mut self) {
        let w = self.w;
        self.w = self.h;
        self.h = self.d;
        self.d = w;
        let x = self.x;
        self.x = self.y;
        self.y = self.z;
        self.z = x;
    }

    pub fn fits_within(&self, w: i32, h: i32, d: i32) -> bool {
        self.x >= 0
            && self.y >= 0
            && self.z >= 0
            && self.x + self.w <= w
            && self.y + self.h <= h
            && self.z + self.d <= d
    }

    /// True if the two boxes' axis-aligned volumes have nonzero intersection.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.x + self.w > other.x
            && other.x + other.w > self.x
            && self.y + self.h > other.y
            && other.y + other.h > self.y
            && self.z + self.d > other.z
            && other.z + other.d > self.z
    }
}

pub fn volume(w: i32, h: i32, d: i32) -> i64 {
    i64::from(w) * i64::from(h) * i64::from(d)
}

/// Rotates bin dimensions one step through the cycle W -> H -> D -> W.
pub fn rotate_dims(w: i32, h: i32, d: i32) -> (i32, i32, i32) {
    (h, d, w)
}

/// Checks that a complete placement is internally consistent: every box with
/// a positive bin number lies inside the bin, and no two boxes sharing a bin
/// overlap. Panics on violation: these are implementation-bug-class
/// invariants, not recoverable conditions.
pub fn check_solution(boxes: &[PackedBox], w: i32, h: i32, d: i32, ub: usize) {
    let mut seen = vec![false; boxes.iter().map(|b| b.no).max().unwrap_or(0) + 1];
    for i in boxes {
        if !i.chosen {
            continue;
        }
        assert!(
            !seen[i.no],
            "duplicated box {} in solution",
            i.no
        );
        seen[i.no] = true;
        assert!(
            (1..=ub).contains(&i.bno),
            "illegal bin {} for box {}",
            i.bno,
            i.no
        );
        assert!(
            i.fits_within(w, h, d),
            "box {} [{},{},{}]@({},{},{}) does not fit bin {}x{}x{}",
            i.no,
            i.w,
            i.h,
            i.d,
            i.x,
            i.y,
            i.z,
            w,
            h,
            d
        );
    }
    for (idx, i) in boxes.iter().enumerate() {
        if !i.chosen {
            continue;
        }
        for j in &boxes[idx + 1..] {
            if !j.chosen || i.bno != j.bno {
                continue;
            }
            assert!(
                !i.overlaps(j),
                "overlap between box {} and box {} in bin {}",
                i.no,
                j.no,
                i.bno
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn volume_is_product_of_dims() {
        assert_eq!(volume(2, 3, 4), 24);
    }

    #[test]
    fn rotate_cycles_back_after_three_steps() {
        let mut b = PackedBox::new(1, 2, 3, 4);
        b.rotate();
        b.rotate();
        b.rotate();
        assert_eq!((b.w, b.h, b.d), (2, 3, 4));
    }

    #[test]
    fn disjoint_boxes_do_not_overlap() {
        let mut a = PackedBox::new(1, 5, 5, 5);
        let mut b = PackedBox::new(2, 5, 5, 5);
        b.x = 5;
        a.bno = 1;
        b.bno = 1;
        assert!(!a.overlaps(&b));
    }

    #[test]
    fn shifted_boxes_overlap() {
        let mut a = PackedBox::new(1, 5, 5, 5);
        let mut b = PackedBox::new(2, 5, 5, 5);
        b.x = 4;
        a.bno = 1;
        b.bno = 1;
        assert!(a.overlaps(&b));
    }

    #[test]
    #[should_panic(expected = "overlap")]
    fn check_solution_panics_on_overlap() {
        let mut a = PackedBox::new(1, 5, 5, 5);
        a.bno = 1;
        a.chosen = true;
        let mut b = PackedBox::new(2, 5, 5, 5);
        b.bno = 1;
        b.chosen = true;
        check_solution(&[a, b], 10, 10, 10, 1);
    }
}
