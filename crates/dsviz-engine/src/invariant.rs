//! Structural invariants.
//!
//! A violation means an engine bug, never bad input, so mutating operations
//! call [`enforce`] and panic instead of reporting it to the caller.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("heap order broken at index {index}: parent {parent} < child {child}")]
    HeapOrder { index: usize, parent: i64, child: i64 },

    #[error("search-tree order broken: {left} is not less than {right}")]
    SearchOrder { left: i64, right: i64 },

    #[error("duplicate value {0} in an ordered structure")]
    DuplicateValue(i64),

    #[error("node {child} does not point back to its parent {parent:?}")]
    ParentLink { child: u64, parent: Option<u64> },

    #[error("array slot {index} is occupied but its parent slot is empty")]
    OrphanSlot { index: usize },

    #[error("size {reported} disagrees with {actual} reachable elements")]
    SizeMismatch { reported: usize, actual: usize },

    #[error("sort result is not ascending at position {index}")]
    Unsorted { index: usize },

    #[error("link to arena slot {slot}, which holds no node")]
    DanglingLink { slot: usize },

    #[error("tail is slot {tail:?} but the walk from head ends at {last:?}")]
    TailLink {
        tail: Option<usize>,
        last: Option<usize>,
    },
}

/// Panic on a violated invariant.
#[track_caller]
pub fn enforce(check: Result<(), InvariantViolation>) {
    if let Err(violation) = check {
        violated(violation);
    }
}

#[track_caller]
pub fn violated(violation: InvariantViolation) -> ! {
    panic!("structural invariant violated: {violation}")
}

/// `Unsorted` at the first descent, if any.
pub fn ascending(values: &[i64]) -> Result<(), InvariantViolation> {
    match values.windows(2).position(|w| w[0] > w[1]) {
        Some(index) => Err(InvariantViolation::Unsorted { index: index + 1 }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascending_detects_descent() {
        assert!(ascending(&[]).is_ok());
        assert!(ascending(&[1, 1, 2]).is_ok());
        assert_eq!(
            ascending(&[1, 3, 2]),
            Err(InvariantViolation::Unsorted { index: 2 })
        );
    }

    #[test]
    #[should_panic(expected = "structural invariant violated")]
    fn enforce_panics() {
        enforce(Err(InvariantViolation::OrphanSlot { index: 3 }));
    }
}
