//! Index-addressed binary tree with gap-leaving deletion.
//!
//! Children of slot `i` live at `2i+1` and `2i+2`. Deleting a label empties
//! the whole subtree rooted at its slot; nothing is relinked or compacted.
//! Inserts fill the lowest empty slot before appending.

use std::collections::{BTreeSet, VecDeque};

use crate::config::StepDurations;
use crate::engine::{Animated, Engine, Outcome, StructureKind};
use crate::error::Result;
use crate::invariant::{self, InvariantViolation};
use crate::layout::{left_child, parent, right_child, PositionHint};
use crate::snapshot::{or_null, NodeView, Snapshot};
use crate::timeline::{Notice, StepTimeline, Tone};
use crate::traversal::{self, Order, TreeShape};
use crate::value::{parse_label, Element, IdAllocator, ScalarValue};

#[derive(Debug, Clone, Default)]
pub struct ArrayTreeEngine {
    slots: Vec<Option<Element<String>>>,
    gaps: BTreeSet<usize>,
    ids: IdAllocator,
    durations: StepDurations,
}

impl ArrayTreeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_durations(durations: StepDurations) -> Self {
        Self {
            durations,
            ..Self::default()
        }
    }

    fn occupied(&self, index: usize) -> Option<&Element<String>> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    /// Place a label in the lowest gap, or append.
    ///
    /// Returns the slot index used.
    pub fn insert(&mut self, input: &str) -> Result<Animated<usize>> {
        let label = parse_label(input)?;
        let id = self.ids.allocate();
        let index = match self.gaps.pop_first() {
            Some(gap) => gap,
            None => {
                self.slots.push(None);
                self.slots.len() - 1
            }
        };

        tracing::debug!(%id, %label, index, "array tree insert");
        self.slots[index] = Some(Element { id, value: label });
        invariant::enforce(self.verify());

        let mut timeline = StepTimeline::new();
        timeline.move_to(id, PositionHint::of_index(index), self.durations.slide);
        Ok(Animated::new(index, timeline))
    }

    /// Empty the subtree rooted at the first slot (index order) holding the
    /// label. Returns the removed root label, `None` on a miss.
    pub fn delete(&mut self, input: &str) -> Result<Animated<Option<String>>> {
        let needle = parse_label(input)?;
        let found = self
            .slots
            .iter()
            .position(|s| s.as_ref().is_some_and(|e| e.value == needle));
        let Some(root) = found else {
            let timeline = StepTimeline::new().with_notice(Notice::not_found(
                &needle,
                StructureKind::BinaryTree.noun(),
                self.durations.notice,
            ));
            return Ok(Animated::new(None, timeline));
        };

        let doomed = self.subtree(root);
        let mut timeline = StepTimeline::new();
        let mut removed_label = None;
        let last = doomed.len().saturating_sub(1);
        for (n, &index) in doomed.iter().enumerate() {
            if let Some(element) = self.slots[index].take() {
                timeline.remove(element.id, if n == last { self.durations.slide } else { 0 });
                if index == root {
                    removed_label = Some(element.value);
                }
                self.gaps.insert(index);
            }
        }

        tracing::debug!(root, removed = doomed.len(), "array tree subtree delete");
        invariant::enforce(self.verify());
        Ok(Animated::new(removed_label, timeline))
    }

    /// Occupied slots of the subtree rooted at `index`, preorder.
    fn subtree(&self, index: usize) -> Vec<usize> {
        let mut out = Vec::new();
        let mut stack = vec![index];
        while let Some(i) = stack.pop() {
            if self.occupied(i).is_none() {
                continue;
            }
            out.push(i);
            stack.push(right_child(i));
            stack.push(left_child(i));
        }
        out
    }

    /// Breadth-first from slot 0, one highlight per visited slot.
    ///
    /// Returns the slot index of the match.
    pub fn search(&self, input: &str) -> Result<Animated<Option<usize>>> {
        let needle = parse_label(input)?;
        let mut timeline = StepTimeline::new();
        let mut queue: VecDeque<usize> = self.root_slot().into_iter().collect();

        while let Some(index) = queue.pop_front() {
            let Some(element) = self.occupied(index) else {
                continue;
            };
            timeline.highlight(element.id, Tone::Visiting, self.durations.visit);
            if element.value == needle {
                timeline.recolor(element.id, Tone::Found, 0);
                timeline.set_notice(Notice::found_at(
                    &needle,
                    "node",
                    index,
                    self.durations.notice,
                ));
                return Ok(Animated::new(Some(index), timeline));
            }
            timeline.recolor(element.id, Tone::Default, 0);
            queue.extend(self.left(index));
            queue.extend(self.right(index));
        }

        timeline.set_notice(Notice::not_found(
            &needle,
            StructureKind::BinaryTree.noun(),
            self.durations.notice,
        ));
        Ok(Animated::new(None, timeline))
    }

    pub fn clear(&mut self) -> Animated<usize> {
        let mut timeline = StepTimeline::new();
        for element in self.slots.iter().flatten() {
            timeline.remove(element.id, 0);
        }
        let count = self.len();
        self.slots.clear();
        self.gaps.clear();
        Animated::new(count, timeline)
    }

    fn root_slot(&self) -> Option<usize> {
        self.occupied(0).map(|_| 0)
    }

    pub fn root(&self) -> Option<&str> {
        self.occupied(0).map(|e| e.value.as_str())
    }

    /// Occupied slots.
    pub fn len(&self) -> usize {
        self.slots.len() - self.gaps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Backing length including gaps.
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn label_at(&self, index: usize) -> Option<&str> {
        self.occupied(index).map(|e| e.value.as_str())
    }

    /// Empty slots below the backing length, lowest first.
    pub fn gaps(&self) -> impl Iterator<Item = usize> + '_ {
        self.gaps.iter().copied()
    }

    pub fn height(&self) -> usize {
        traversal::height(self)
    }

    pub fn traverse(&self, order: Order) -> Vec<&str> {
        traversal::traverse(self, order)
            .into_iter()
            .filter_map(|i| self.label_at(i))
            .collect()
    }

    /// Every occupied slot hangs off an occupied parent, and the gap set
    /// is exactly the empty slots.
    pub fn verify(&self) -> std::result::Result<(), InvariantViolation> {
        for (index, slot) in self.slots.iter().enumerate() {
            match slot {
                Some(_) => {
                    if let Some(p) = parent(index) {
                        if self.occupied(p).is_none() {
                            return Err(InvariantViolation::OrphanSlot { index });
                        }
                    }
                }
                None if !self.gaps.contains(&index) => {
                    return Err(InvariantViolation::SizeMismatch {
                        reported: self.len(),
                        actual: self.slots.iter().flatten().count(),
                    });
                }
                None => {}
            }
        }
        Ok(())
    }
}

impl TreeShape for ArrayTreeEngine {
    type Node = usize;

    fn root(&self) -> Option<usize> {
        self.root_slot()
    }

    fn left(&self, node: usize) -> Option<usize> {
        let l = left_child(node);
        self.occupied(l).map(|_| l)
    }

    fn right(&self, node: usize) -> Option<usize> {
        let r = right_child(node);
        self.occupied(r).map(|_| r)
    }
}

impl Engine for ArrayTreeEngine {
    fn kind(&self) -> StructureKind {
        StructureKind::BinaryTree
    }

    fn insert(&mut self, input: &str) -> Outcome {
        ArrayTreeEngine::insert(self, input).into()
    }

    fn delete(&mut self, input: &str) -> Outcome {
        ArrayTreeEngine::delete(self, input).into()
    }

    fn search(&self, input: &str) -> Outcome {
        ArrayTreeEngine::search(self, input).into()
    }

    fn clear(&mut self) -> Outcome {
        Outcome::Animated(ArrayTreeEngine::clear(self).timeline)
    }

    fn snapshot(&self) -> Snapshot {
        let mut snap = Snapshot::new(StructureKind::BinaryTree);
        let id_at = |i: usize| self.occupied(i).map(|e| e.id);
        snap.nodes = self
            .slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|e| (i, e)))
            .map(|(i, e)| {
                NodeView::new(
                    e.id,
                    ScalarValue::Label(e.value.clone()),
                    PositionHint::of_index(i),
                )
                .with_slot(i)
                .with_links(
                    parent(i).and_then(id_at),
                    id_at(left_child(i)),
                    id_at(right_child(i)),
                )
            })
            .collect();
        snap.push_readout("root", or_null(ArrayTreeEngine::root(self)));
        snap.push_readout("size", ArrayTreeEngine::len(self).to_string());
        snap.push_readout("height", self.height().to_string());
        for order in Order::ALL {
            snap.push_readout(order.label(), traversal::join(self.traverse(order)));
        }
        snap
    }

    fn len(&self) -> usize {
        ArrayTreeEngine::len(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree_of(labels: &[&str]) -> ArrayTreeEngine {
        let mut tree = ArrayTreeEngine::new();
        for l in labels {
            tree.insert(l).unwrap();
        }
        tree
    }

    #[test]
    fn inserts_fill_breadth_first() {
        let tree = tree_of(&["1", "2", "3", "4"]);
        assert_eq!(tree.label_at(0), Some("1"));
        assert_eq!(tree.label_at(1), Some("2"));
        assert_eq!(tree.label_at(2), Some("3"));
        assert_eq!(tree.label_at(3), Some("4"));
        assert_eq!(tree.height(), 3);
    }

    #[test]
    fn delete_reuses_gap_before_append() {
        let mut tree = tree_of(&["1", "2", "3"]);
        let removed = tree.delete("2").unwrap();
        assert_eq!(removed.value.as_deref(), Some("2"));
        assert_eq!(tree.gaps().collect::<Vec<_>>(), vec![1]);

        let placed = tree.insert("4").unwrap();
        assert_eq!(placed.value, 1);
        assert_eq!(tree.label_at(1), Some("4"));
        assert_eq!(tree.slot_count(), 3);
    }

    #[test]
    fn delete_takes_the_whole_subtree() {
        // 0:a  1:b  2:c  3:d  4:e  5:f
        let mut tree = tree_of(&["a", "b", "c", "d", "e", "f"]);
        let removed = tree.delete("b").unwrap();
        assert_eq!(removed.timeline.len(), 3);
        assert_eq!(tree.len(), 3);
        assert_eq!(tree.label_at(3), None);
        assert_eq!(tree.label_at(4), None);
        assert_eq!(tree.label_at(5), Some("f"));
        assert_eq!(tree.gaps().collect::<Vec<_>>(), vec![1, 3, 4]);

        // refills lowest first
        assert_eq!(tree.insert("x").unwrap().value, 1);
        assert_eq!(tree.insert("y").unwrap().value, 3);
        assert!(tree.verify().is_ok());
    }

    #[test]
    fn deleting_root_empties_everything() {
        let mut tree = tree_of(&["a", "b", "c"]);
        tree.delete("a").unwrap();
        assert!(tree.is_empty());
        assert_eq!(tree.snapshot().readout("root"), Some("null"));
        assert_eq!(tree.insert("z").unwrap().value, 0);
    }

    #[test]
    fn delete_first_index_order_match() {
        let mut tree = tree_of(&["a", "x", "x"]);
        tree.delete("x").unwrap();
        assert_eq!(tree.label_at(1), None);
        assert_eq!(tree.label_at(2), Some("x"));
    }

    #[test]
    fn search_is_level_order() {
        let tree = tree_of(&["a", "b", "c", "d"]);
        let hit = tree.search("d").unwrap();
        assert_eq!(hit.value, Some(3));
        let visited = hit
            .timeline
            .events()
            .iter()
            .filter(|e| matches!(e.kind, crate::timeline::StepKind::Highlight { .. }))
            .count();
        assert_eq!(visited, 4);
        assert_eq!(hit.timeline.notice().unwrap().text, "Found value \"d\" at node 4");
    }

    #[test]
    fn search_skips_gaps() {
        let mut tree = tree_of(&["a", "b", "c"]);
        tree.delete("b").unwrap();
        let miss = tree.search("zz").unwrap();
        assert_eq!(miss.value, None);
        // a and c visited, each highlighted then reset
        assert_eq!(miss.timeline.len(), 4);
    }

    #[test]
    fn traversal_readouts() {
        let tree = tree_of(&["1", "2", "3", "4", "5"]);
        let snap = tree.snapshot();
        assert_eq!(snap.readout("preorder"), Some("1, 2, 4, 5, 3"));
        assert_eq!(snap.readout("inorder"), Some("4, 2, 5, 1, 3"));
        assert_eq!(snap.readout("postorder"), Some("4, 5, 2, 3, 1"));
        assert_eq!(snap.readout("levelorder"), Some("1, 2, 3, 4, 5"));
        let four = &snap.nodes[3];
        assert_eq!(four.slot, Some(3));
        assert_eq!(four.parent, Some(snap.nodes[1].id));
    }
}
