//! Abstract layout hints.
//!
//! Engines never produce pixels. A hint is a `(depth, breadth)` pair the
//! renderer maps to screen space:
//! - linear structures: depth 0, breadth = position in discipline order
//! - trees: depth = level, breadth = index within a full level of `2^depth`

use std::collections::HashMap;

use crate::value::ElementId;

/// Logical coordinate of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PositionHint {
    pub depth: u32,
    pub breadth: u64,
}

impl PositionHint {
    pub const ROOT: Self = Self { depth: 0, breadth: 0 };

    pub const fn new(depth: u32, breadth: u64) -> Self {
        Self { depth, breadth }
    }

    /// Position `i` of a linear structure.
    pub const fn linear(position: usize) -> Self {
        Self {
            depth: 0,
            breadth: position as u64,
        }
    }

    /// Position of breadth-first index `i` in an implicit binary tree.
    ///
    /// `level = floor(log2(i + 1))`, `breadth = i - (2^level - 1)`.
    pub fn of_index(index: usize) -> Self {
        let n = index as u64 + 1;
        let level = 63 - n.leading_zeros();
        Self {
            depth: level,
            breadth: n - (1u64 << level),
        }
    }

    /// Hint for the left child of a tree position.
    pub fn left(&self) -> Self {
        Self {
            depth: self.depth + 1,
            breadth: self.breadth.saturating_mul(2),
        }
    }

    /// Hint for the right child of a tree position.
    pub fn right(&self) -> Self {
        Self {
            depth: self.depth + 1,
            breadth: self.breadth.saturating_mul(2).saturating_add(1),
        }
    }
}

/// Left child index in an array-addressed tree.
#[inline]
pub const fn left_child(index: usize) -> usize {
    2 * index + 1
}

/// Right child index in an array-addressed tree.
#[inline]
pub const fn right_child(index: usize) -> usize {
    2 * index + 2
}

/// Parent index in an array-addressed tree, `None` for the root.
#[inline]
pub const fn parent(index: usize) -> Option<usize> {
    if index == 0 {
        None
    } else {
        Some((index - 1) / 2)
    }
}

/// Elements whose hint changed between two layouts, in `after` order.
///
/// Elements missing from `before` are new and included; elements missing
/// from `after` are gone and skipped.
pub fn moved(
    before: &HashMap<ElementId, PositionHint>,
    after: &[(ElementId, PositionHint)],
) -> Vec<(ElementId, PositionHint)> {
    after
        .iter()
        .filter(|(id, pos)| before.get(id) != Some(pos))
        .copied()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_formula() {
        assert_eq!(left_child(0), 1);
        assert_eq!(right_child(0), 2);
        assert_eq!(left_child(2), 5);
        assert_eq!(right_child(2), 6);
        assert_eq!(parent(0), None);
        assert_eq!(parent(1), Some(0));
        assert_eq!(parent(2), Some(0));
        assert_eq!(parent(6), Some(2));
    }

    #[test]
    fn index_to_position() {
        assert_eq!(PositionHint::of_index(0), PositionHint::ROOT);
        assert_eq!(PositionHint::of_index(1), PositionHint::new(1, 0));
        assert_eq!(PositionHint::of_index(2), PositionHint::new(1, 1));
        assert_eq!(PositionHint::of_index(3), PositionHint::new(2, 0));
        assert_eq!(PositionHint::of_index(6), PositionHint::new(2, 3));
        assert_eq!(PositionHint::of_index(7), PositionHint::new(3, 0));
    }

    #[test]
    fn child_hints_match_index_hints() {
        for i in 0..32 {
            let here = PositionHint::of_index(i);
            assert_eq!(here.left(), PositionHint::of_index(left_child(i)));
            assert_eq!(here.right(), PositionHint::of_index(right_child(i)));
        }
    }

    #[test]
    fn moved_reports_changes_only() {
        let before: HashMap<_, _> = [
            (ElementId(1), PositionHint::linear(0)),
            (ElementId(2), PositionHint::linear(1)),
            (ElementId(3), PositionHint::linear(2)),
        ]
        .into_iter()
        .collect();
        let after = [
            (ElementId(2), PositionHint::linear(0)),
            (ElementId(3), PositionHint::linear(2)),
            (ElementId(4), PositionHint::linear(3)),
        ];
        assert_eq!(
            moved(&before, &after),
            vec![
                (ElementId(2), PositionHint::linear(0)),
                (ElementId(4), PositionHint::linear(3)),
            ]
        );
    }
}
