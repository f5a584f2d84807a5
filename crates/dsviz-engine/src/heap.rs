//! Dense array max-heap over unique integers.
//!
//! Shares the index arithmetic of the array tree but never leaves gaps:
//! deletion compacts the array and re-heapifies from the last internal node.

use std::collections::HashMap;

use crate::config::StepDurations;
use crate::engine::{Animated, Engine, Outcome, StructureKind};
use crate::error::{EngineError, Result};
use crate::invariant::{self, InvariantViolation};
use crate::layout::{self, left_child, parent, right_child, PositionHint};
use crate::snapshot::{or_null, NodeView, Snapshot};
use crate::timeline::{Notice, StepTimeline, Tone};
use crate::traversal::{self, Order, TreeShape};
use crate::value::{parse_number, Element, ElementId, IdAllocator, ScalarValue};

#[derive(Debug, Clone, Default)]
pub struct MaxHeapEngine {
    items: Vec<Element<i64>>,
    ids: IdAllocator,
    durations: StepDurations,
}

impl MaxHeapEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_durations(durations: StepDurations) -> Self {
        Self {
            durations,
            ..Self::default()
        }
    }

    fn layout(&self) -> Vec<(ElementId, PositionHint)> {
        self.items
            .iter()
            .enumerate()
            .map(|(i, e)| (e.id, PositionHint::of_index(i)))
            .collect()
    }

    fn layout_map(&self) -> HashMap<ElementId, PositionHint> {
        self.layout().into_iter().collect()
    }

    /// Light both, exchange, then settle both back.
    fn swap_slots(&mut self, a: usize, b: usize, timeline: &mut StepTimeline) {
        let (id_a, id_b) = (self.items[a].id, self.items[b].id);
        timeline.highlight(id_a, Tone::Visiting, 0);
        timeline.highlight(id_b, Tone::Visiting, self.durations.swap_half);
        timeline.swap(id_a, id_b, self.durations.swap_half);
        timeline.recolor(id_a, Tone::Default, 0);
        timeline.recolor(id_b, Tone::Default, 0);
        self.items.swap(a, b);
    }

    fn sift_up(&mut self, mut index: usize, timeline: &mut StepTimeline) {
        while let Some(p) = parent(index) {
            if self.items[index].value <= self.items[p].value {
                break;
            }
            self.swap_slots(index, p, timeline);
            index = p;
        }
    }

    fn sift_down(&mut self, mut index: usize, timeline: &mut StepTimeline) {
        let len = self.items.len();
        loop {
            let mut largest = index;
            for child in [left_child(index), right_child(index)] {
                if child < len && self.items[child].value > self.items[largest].value {
                    largest = child;
                }
            }
            if largest == index {
                break;
            }
            self.swap_slots(index, largest, timeline);
            index = largest;
        }
    }

    /// Append and sift up. Duplicates are rejected.
    pub fn insert(&mut self, input: &str) -> Result<Animated<ElementId>> {
        let value = parse_number(input)?;
        if self.contains(value) {
            return Err(EngineError::Duplicate(value));
        }

        let id = self.ids.allocate();
        let mut timeline = StepTimeline::new();
        let index = self.items.len();
        timeline.move_to(id, PositionHint::of_index(index), self.durations.slide);
        self.items.push(Element { id, value });
        self.sift_up(index, &mut timeline);

        tracing::debug!(%id, value, "heap insert");
        invariant::enforce(self.verify());
        Ok(Animated::new(id, timeline))
    }

    /// Remove the first array-order match, compact, then rebuild heap order.
    pub fn delete(&mut self, input: &str) -> Result<Animated<Option<i64>>> {
        let value = parse_number(input)?;
        let Some(index) = self.items.iter().position(|e| e.value == value) else {
            let timeline = StepTimeline::new().with_notice(Notice::not_found(
                &value,
                StructureKind::MaxHeap.noun(),
                self.durations.notice,
            ));
            return Ok(Animated::new(None, timeline));
        };

        let before = self.layout_map();
        let removed = self.items.remove(index);
        let mut timeline = StepTimeline::new();
        timeline.remove(removed.id, self.durations.slide);
        timeline.move_together(&layout::moved(&before, &self.layout()), self.durations.slide);

        if !self.items.is_empty() {
            for i in (0..=(self.items.len() - 1) / 2).rev() {
                self.sift_down(i, &mut timeline);
            }
        }

        tracing::debug!(value, index, remaining = self.items.len(), "heap delete");
        invariant::enforce(self.verify());
        Ok(Animated::new(Some(removed.value), timeline))
    }

    /// Linear scan in array order.
    pub fn search(&self, input: &str) -> Result<Animated<Option<usize>>> {
        let value = parse_number(input)?;
        let mut timeline = StepTimeline::new();
        for (index, element) in self.items.iter().enumerate() {
            timeline.highlight(element.id, Tone::Visiting, self.durations.visit);
            if element.value == value {
                timeline.recolor(element.id, Tone::Found, 0);
                timeline.set_notice(Notice::found(&value, self.durations.notice));
                return Ok(Animated::new(Some(index), timeline));
            }
            timeline.recolor(element.id, Tone::Default, 0);
        }
        timeline.set_notice(Notice::not_found(
            &value,
            StructureKind::MaxHeap.noun(),
            self.durations.notice,
        ));
        Ok(Animated::new(None, timeline))
    }

    pub fn clear(&mut self) -> Animated<usize> {
        let mut timeline = StepTimeline::new();
        for element in &self.items {
            timeline.remove(element.id, 0);
        }
        let count = self.items.len();
        self.items.clear();
        Animated::new(count, timeline)
    }

    pub fn contains(&self, value: i64) -> bool {
        self.items.iter().any(|e| e.value == value)
    }

    pub fn peek(&self) -> Option<i64> {
        self.items.first().map(|e| e.value)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Values in array order.
    pub fn values(&self) -> Vec<i64> {
        self.items.iter().map(|e| e.value).collect()
    }

    pub fn height(&self) -> usize {
        traversal::height(self)
    }

    pub fn traverse(&self, order: Order) -> Vec<i64> {
        traversal::traverse(self, order)
            .into_iter()
            .map(|i| self.items[i].value)
            .collect()
    }

    pub fn verify(&self) -> std::result::Result<(), InvariantViolation> {
        for (index, child) in self.items.iter().enumerate().skip(1) {
            if let Some(p) = parent(index) {
                let up = self.items[p].value;
                if up < child.value {
                    return Err(InvariantViolation::HeapOrder {
                        index,
                        parent: up,
                        child: child.value,
                    });
                }
            }
        }
        let mut sorted = self.values();
        sorted.sort_unstable();
        if let Some(pair) = sorted.windows(2).find(|w| w[0] == w[1]) {
            return Err(InvariantViolation::DuplicateValue(pair[0]));
        }
        Ok(())
    }
}

impl TreeShape for MaxHeapEngine {
    type Node = usize;

    fn root(&self) -> Option<usize> {
        (!self.items.is_empty()).then_some(0)
    }

    fn left(&self, node: usize) -> Option<usize> {
        let l = left_child(node);
        (l < self.items.len()).then_some(l)
    }

    fn right(&self, node: usize) -> Option<usize> {
        let r = right_child(node);
        (r < self.items.len()).then_some(r)
    }
}

impl Engine for MaxHeapEngine {
    fn kind(&self) -> StructureKind {
        StructureKind::MaxHeap
    }

    fn insert(&mut self, input: &str) -> Outcome {
        MaxHeapEngine::insert(self, input).into()
    }

    fn delete(&mut self, input: &str) -> Outcome {
        MaxHeapEngine::delete(self, input).into()
    }

    fn search(&self, input: &str) -> Outcome {
        MaxHeapEngine::search(self, input).into()
    }

    fn clear(&mut self) -> Outcome {
        Outcome::Animated(MaxHeapEngine::clear(self).timeline)
    }

    fn snapshot(&self) -> Snapshot {
        let mut snap = Snapshot::new(StructureKind::MaxHeap);
        let id_at = |i: usize| self.items.get(i).map(|e| e.id);
        snap.nodes = self
            .items
            .iter()
            .enumerate()
            .map(|(i, e)| {
                NodeView::new(e.id, ScalarValue::Int(e.value), PositionHint::of_index(i))
                    .with_slot(i)
                    .with_links(
                        parent(i).and_then(id_at),
                        id_at(left_child(i)),
                        id_at(right_child(i)),
                    )
            })
            .collect();
        snap.push_readout("root", or_null(self.peek()));
        snap.push_readout("size", self.len().to_string());
        snap.push_readout("height", self.height().to_string());
        for order in Order::ALL {
            snap.push_readout(order.label(), traversal::join(self.traverse(order)));
        }
        snap
    }

    fn len(&self) -> usize {
        self.items.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::StepKind;

    fn heap_of(values: &[i64]) -> MaxHeapEngine {
        let mut heap = MaxHeapEngine::new();
        for v in values {
            heap.insert(&v.to_string()).unwrap();
        }
        heap
    }

    #[test]
    fn insert_sifts_up() {
        let mut heap = heap_of(&[3, 1]);
        let out = heap.insert("5").unwrap();
        assert_eq!(heap.peek(), Some(5));
        assert_eq!(heap.values(), vec![5, 1, 3]);

        let swaps: Vec<_> = out
            .timeline
            .events()
            .iter()
            .filter(|e| matches!(e.kind, StepKind::Swap { .. }))
            .collect();
        assert_eq!(swaps.len(), 1);
        assert_eq!(swaps[0].target, out.value);
    }

    #[test]
    fn swap_is_highlight_then_exchange() {
        let mut heap = heap_of(&[1]);
        let out = heap.insert("2").unwrap();
        let names: Vec<_> = out.timeline.events().iter().map(|e| e.kind_name()).collect();
        assert_eq!(
            names,
            vec!["Move", "Highlight", "Highlight", "Swap", "Recolor", "Recolor"]
        );
    }

    #[test]
    fn duplicates_are_rejected() {
        let mut heap = heap_of(&[4, 2]);
        assert_eq!(heap.insert("4").unwrap_err(), EngineError::Duplicate(4));
        assert_eq!(heap.len(), 2);
    }

    #[test]
    fn delete_compacts_then_heapifies() {
        let mut heap = heap_of(&[9, 5, 8, 1, 2]);
        assert_eq!(heap.values(), vec![9, 5, 8, 1, 2]);
        let out = heap.delete("9").unwrap();
        assert_eq!(out.value, Some(9));
        assert_eq!(heap.values(), vec![8, 5, 1, 2]);
        assert_eq!(out.timeline.events()[0].kind, StepKind::Remove);
        assert!(heap.verify().is_ok());
    }

    #[test]
    fn delete_last_leaves_empty() {
        let mut heap = heap_of(&[7]);
        heap.delete("7").unwrap();
        assert!(heap.is_empty());
        assert_eq!(heap.snapshot().readout("root"), Some("null"));
    }

    #[test]
    fn delete_miss_notice() {
        let mut heap = heap_of(&[7]);
        let out = heap.delete("42").unwrap();
        assert_eq!(out.value, None);
        assert_eq!(
            out.timeline.notice().unwrap().text,
            "Value \"42\" not found in heap."
        );
    }

    #[test]
    fn search_is_array_order() {
        let heap = heap_of(&[9, 5, 8]);
        let hit = heap.search("8").unwrap();
        assert_eq!(hit.value, Some(2));
        assert_eq!(hit.timeline.len(), 6);
        assert_eq!(hit.timeline.notice().unwrap().text, "Found value \"8\"");
    }

    #[test]
    fn snapshot_shows_slots_and_orders() {
        let heap = heap_of(&[9, 5, 8]);
        let snap = heap.snapshot();
        assert_eq!(snap.nodes[2].slot, Some(2));
        assert_eq!(snap.nodes[2].parent, Some(snap.nodes[0].id));
        assert_eq!(snap.readout("levelorder"), Some("9, 5, 8"));
        assert_eq!(snap.readout("inorder"), Some("5, 9, 8"));
        assert_eq!(snap.readout("height"), Some("2"));
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        #[derive(Debug, Clone)]
        enum Op {
            Insert(i64),
            Delete(i64),
        }

        fn op() -> impl Strategy<Value = Op> {
            prop_oneof![
                (-100i64..100).prop_map(Op::Insert),
                (-100i64..100).prop_map(Op::Delete),
            ]
        }

        proptest! {
            #[test]
            fn heap_order_after_every_op(ops in prop::collection::vec(op(), 0..80)) {
                let mut heap = MaxHeapEngine::new();
                for op in ops {
                    match op {
                        Op::Insert(v) => { let _ = heap.insert(&v.to_string()); }
                        Op::Delete(v) => { heap.delete(&v.to_string()).unwrap(); }
                    }
                    let values = heap.values();
                    for i in 1..values.len() {
                        prop_assert!(values[(i - 1) / 2] >= values[i]);
                    }
                }
            }
        }
    }
}
