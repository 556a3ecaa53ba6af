//! Typed errors surfaced at the library boundary.
//!
//! These cover input validation only. Invariants that would indicate a bug
//! in the solver itself (duplicate box ids, overlapping placements, a
//! corrupted relation table) panic instead: they are not recoverable
//! conditions a caller can act on.

use std::fmt;

use crate::geometry::MAXBOXES;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackError {
    InvalidBin {
        w: i32,
        h: i32,
        d: i32,
    },
    InvalidDimension {
        no: usize,
        dim: &'static str,
        value: i32,
        limit: i32,
    },
    Empty,
    TooManyBoxes {
        n: usize,
    },
}

impl fmt::Display for PackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PackError::InvalidBin { w, h, d } => {
                write!(f, "bin dimensions must be positive, got {w}x{h}x{d}")
            }
            PackError::InvalidDimension { no, dim, value, limit } => write!(
                f,
                "box {no} has dimension {dim} = {value}, outside [1, {limit}]"
            ),
            PackError::Empty => write!(f, "no boxes given"),
            PackError::TooManyBoxes { n } => write!(
                f,
                "{n} boxes exceeds the cap of {} (MAXBOXES - 1)",
                MAXBOXES - 1
            ),
        }
    }
}

impl std::error::Error for PackError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variants_format_without_panicking() {
        let errs = [
            PackError::InvalidBin { w: 0, h: 5, d: 5 },
            PackError::InvalidDimension { no: 3, dim: "w", value: 20, limit: 10 },
            PackError::Empty,
            PackError::TooManyBoxes { n: 200 },
        ];
        for e in &errs {
            assert!(!e.to_string().is_empty());
        }
    }
}
