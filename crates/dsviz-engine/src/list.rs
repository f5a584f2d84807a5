//! Singly linked list with head and tail inserts.
//!
//! Nodes live in an arena and link forward by slot index. Position is derived
//! by walking from `head`, never stored, so unlinking from the middle touches
//! one link and no identities.

use std::collections::HashMap;

use crate::config::StepDurations;
use crate::engine::{Animated, Engine, Outcome, StructureKind};
use crate::error::Result;
use crate::invariant::{self, InvariantViolation};
use crate::layout::{self, PositionHint};
use crate::snapshot::{or_null, NodeView, Snapshot};
use crate::timeline::{Notice, StepTimeline, Tone};
use crate::value::{parse_label, ElementId, IdAllocator, ScalarValue};

type Slot = usize;

#[derive(Debug, Clone)]
struct ListNode {
    id: ElementId,
    label: String,
    next: Option<Slot>,
}

#[derive(Debug, Clone, Default)]
pub struct ListEngine {
    arena: Vec<Option<ListNode>>,
    free: Vec<Slot>,
    head: Option<Slot>,
    tail: Option<Slot>,
    len: usize,
    ids: IdAllocator,
    durations: StepDurations,
}

/// Head-to-tail walk over the links.
struct Walk<'a> {
    list: &'a ListEngine,
    cursor: Option<Slot>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = (Slot, &'a ListNode);

    fn next(&mut self) -> Option<Self::Item> {
        let slot = self.cursor?;
        let node = self.list.node(slot);
        self.cursor = node.next;
        Some((slot, node))
    }
}

impl ListEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_durations(durations: StepDurations) -> Self {
        Self {
            durations,
            ..Self::default()
        }
    }

    #[track_caller]
    fn node(&self, slot: Slot) -> &ListNode {
        self.arena
            .get(slot)
            .and_then(Option::as_ref)
            .unwrap_or_else(|| invariant::violated(InvariantViolation::DanglingLink { slot }))
    }

    #[track_caller]
    fn node_mut(&mut self, slot: Slot) -> &mut ListNode {
        self.arena
            .get_mut(slot)
            .and_then(Option::as_mut)
            .unwrap_or_else(|| invariant::violated(InvariantViolation::DanglingLink { slot }))
    }

    fn alloc(&mut self, node: ListNode) -> Slot {
        self.len += 1;
        match self.free.pop() {
            Some(slot) => {
                self.arena[slot] = Some(node);
                slot
            }
            None => {
                self.arena.push(Some(node));
                self.arena.len() - 1
            }
        }
    }

    fn release(&mut self, slot: Slot) -> ListNode {
        let node = self
            .arena
            .get_mut(slot)
            .and_then(Option::take)
            .unwrap_or_else(|| invariant::violated(InvariantViolation::DanglingLink { slot }));
        self.free.push(slot);
        self.len -= 1;
        node
    }

    fn walk(&self) -> Walk<'_> {
        Walk {
            list: self,
            cursor: self.head,
        }
    }

    fn layout(&self) -> Vec<(ElementId, PositionHint)> {
        self.walk()
            .enumerate()
            .map(|(i, (_, n))| (n.id, PositionHint::linear(i)))
            .collect()
    }

    fn layout_map(&self) -> HashMap<ElementId, PositionHint> {
        self.layout().into_iter().collect()
    }

    /// The walk from `head` must reach exactly `len` nodes and end at `tail`.
    pub fn verify(&self) -> std::result::Result<(), InvariantViolation> {
        let mut actual = 0;
        let mut last = None;
        for (slot, _) in self.walk() {
            actual += 1;
            last = Some(slot);
            if actual > self.len {
                break;
            }
        }
        if actual != self.len {
            return Err(InvariantViolation::SizeMismatch {
                reported: self.len,
                actual,
            });
        }
        if last != self.tail {
            return Err(InvariantViolation::TailLink {
                tail: self.tail,
                last,
            });
        }
        Ok(())
    }

    fn linked(
        &mut self,
        id: ElementId,
        label: String,
        before: HashMap<ElementId, PositionHint>,
    ) -> Animated<ElementId> {
        tracing::debug!(%id, %label, size = self.len, "list insert");
        invariant::enforce(self.verify());
        let mut timeline = StepTimeline::new();
        timeline.move_together(&layout::moved(&before, &self.layout()), self.durations.slide);
        Animated::new(id, timeline)
    }

    /// New head; existing nodes shift one place right.
    pub fn insert_front(&mut self, input: &str) -> Result<Animated<ElementId>> {
        let label = parse_label(input)?;
        let id = self.ids.allocate();
        let before = self.layout_map();

        let slot = self.alloc(ListNode {
            id,
            label: label.clone(),
            next: self.head,
        });
        self.head = Some(slot);
        if self.tail.is_none() {
            self.tail = Some(slot);
        }
        Ok(self.linked(id, label, before))
    }

    /// New tail.
    pub fn insert_back(&mut self, input: &str) -> Result<Animated<ElementId>> {
        let label = parse_label(input)?;
        let id = self.ids.allocate();
        let before = self.layout_map();

        let slot = self.alloc(ListNode {
            id,
            label: label.clone(),
            next: None,
        });
        match self.tail {
            Some(tail) => self.node_mut(tail).next = Some(slot),
            None => self.head = Some(slot),
        }
        self.tail = Some(slot);
        Ok(self.linked(id, label, before))
    }

    /// Unlink the first node (head to tail) carrying the label.
    ///
    /// A miss leaves the list untouched and returns `None` with a not-found
    /// notice.
    pub fn delete(&mut self, input: &str) -> Result<Animated<Option<String>>> {
        let needle = parse_label(input)?;
        let mut prev = None;
        let mut found = None;
        for (slot, node) in self.walk() {
            if node.label == needle {
                found = Some(slot);
                break;
            }
            prev = Some(slot);
        }
        let Some(slot) = found else {
            let timeline = StepTimeline::new().with_notice(Notice::not_found(
                &needle,
                StructureKind::LinkedList.noun(),
                self.durations.notice,
            ));
            return Ok(Animated::new(None, timeline));
        };

        let before = self.layout_map();
        let removed = self.release(slot);
        match prev {
            Some(p) => self.node_mut(p).next = removed.next,
            None => self.head = removed.next,
        }
        if self.tail == Some(slot) {
            self.tail = prev;
        }
        tracing::debug!(id = %removed.id, label = %removed.label, "list delete");
        invariant::enforce(self.verify());

        let mut timeline = StepTimeline::new();
        timeline.remove(removed.id, self.durations.slide);
        timeline.move_together(&layout::moved(&before, &self.layout()), self.durations.slide);
        Ok(Animated::new(Some(removed.label), timeline))
    }

    /// Walk from the head; the first match wins.
    pub fn search(&self, input: &str) -> Result<Animated<Option<usize>>> {
        let needle = parse_label(input)?;
        let mut timeline = StepTimeline::new();
        for (position, (_, node)) in self.walk().enumerate() {
            timeline.highlight(node.id, Tone::Visiting, self.durations.visit);
            if node.label == needle {
                timeline.recolor(node.id, Tone::Found, 0);
                timeline.set_notice(Notice::found_at(
                    &needle,
                    "position",
                    position,
                    self.durations.notice,
                ));
                return Ok(Animated::new(Some(position), timeline));
            }
            timeline.recolor(node.id, Tone::Default, 0);
        }
        timeline.set_notice(Notice::not_found(
            &needle,
            StructureKind::LinkedList.noun(),
            self.durations.notice,
        ));
        Ok(Animated::new(None, timeline))
    }

    pub fn clear(&mut self) -> Animated<usize> {
        let mut timeline = StepTimeline::new();
        for (_, node) in self.walk() {
            timeline.remove(node.id, 0);
        }
        let count = self.len;
        self.arena.clear();
        self.free.clear();
        self.head = None;
        self.tail = None;
        self.len = 0;
        Animated::new(count, timeline)
    }

    pub fn head(&self) -> Option<&str> {
        self.head.map(|slot| self.node(slot).label.as_str())
    }

    pub fn tail(&self) -> Option<&str> {
        self.tail.map(|slot| self.node(slot).label.as_str())
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Labels head to tail.
    pub fn labels(&self) -> Vec<&str> {
        self.walk().map(|(_, n)| n.label.as_str()).collect()
    }
}

impl Engine for ListEngine {
    fn kind(&self) -> StructureKind {
        StructureKind::LinkedList
    }

    /// Appends at the tail.
    fn insert(&mut self, input: &str) -> Outcome {
        self.insert_back(input).into()
    }

    fn delete(&mut self, input: &str) -> Outcome {
        ListEngine::delete(self, input).into()
    }

    fn search(&self, input: &str) -> Outcome {
        ListEngine::search(self, input).into()
    }

    fn clear(&mut self) -> Outcome {
        Outcome::Animated(ListEngine::clear(self).timeline)
    }

    fn snapshot(&self) -> Snapshot {
        let mut snap = Snapshot::new(StructureKind::LinkedList);
        snap.nodes = self
            .walk()
            .enumerate()
            .map(|(i, (_, n))| {
                let mut node = NodeView::new(
                    n.id,
                    ScalarValue::Label(n.label.clone()),
                    PositionHint::linear(i),
                );
                node.next = n.next.map(|slot| self.node(slot).id);
                node
            })
            .collect();
        snap.push_readout("head", or_null(self.head()));
        snap.push_readout("tail", or_null(self.tail()));
        snap.push_readout("size", self.len.to_string());
        snap
    }

    fn len(&self) -> usize {
        self.len
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::StepKind;

    #[test]
    fn front_and_back_inserts() {
        let mut list = ListEngine::new();
        list.insert_back("b").unwrap();
        list.insert_front("a").unwrap();
        list.insert_back("c").unwrap();
        assert_eq!(list.labels(), vec!["a", "b", "c"]);
        assert_eq!(list.head(), Some("a"));
        assert_eq!(list.tail(), Some("c"));
        assert_eq!(list.verify(), Ok(()));
    }

    #[test]
    fn insert_front_moves_everyone() {
        let mut list = ListEngine::new();
        let b = list.insert_back("b").unwrap().value;
        let a = list.insert_front("a").unwrap();
        let moves: Vec<_> = a
            .timeline
            .events()
            .iter()
            .filter_map(|e| match e.kind {
                StepKind::Move { to } => Some((e.target, to)),
                _ => None,
            })
            .collect();
        assert_eq!(
            moves,
            vec![
                (a.value, PositionHint::linear(0)),
                (b, PositionHint::linear(1)),
            ]
        );
    }

    #[test]
    fn delete_first_match_only() {
        let mut list = ListEngine::new();
        let ids: Vec<ElementId> = ["x", "y", "x"]
            .iter()
            .map(|l| list.insert_back(l).unwrap().value)
            .collect();
        let removed = ListEngine::delete(&mut list, "x").unwrap();
        assert_eq!(removed.value.as_deref(), Some("x"));
        assert_eq!(removed.timeline.events()[0].target, ids[0]);
        assert_eq!(list.labels(), vec!["y", "x"]);

        let snap = list.snapshot();
        assert_eq!(snap.nodes[0].id, ids[1]);
        assert_eq!(snap.nodes[0].next, Some(ids[2]));
        assert_eq!(snap.nodes[1].next, None);
    }

    #[test]
    fn deleting_tail_moves_tail_back() {
        let mut list = ListEngine::new();
        for l in ["a", "b", "c"] {
            list.insert_back(l).unwrap();
        }
        ListEngine::delete(&mut list, "c").unwrap();
        assert_eq!(list.tail(), Some("b"));
        list.insert_back("d").unwrap();
        assert_eq!(list.labels(), vec!["a", "b", "d"]);
        assert_eq!(list.verify(), Ok(()));
    }

    #[test]
    fn deleting_only_node_empties_list() {
        let mut list = ListEngine::new();
        list.insert_front("solo").unwrap();
        ListEngine::delete(&mut list, "solo").unwrap();
        assert!(list.is_empty());
        assert_eq!(list.head(), None);
        assert_eq!(list.tail(), None);
        list.insert_back("again").unwrap();
        assert_eq!(list.head(), Some("again"));
        assert_eq!(list.tail(), Some("again"));
    }

    #[test]
    fn freed_slots_are_reused() {
        let mut list = ListEngine::new();
        for l in ["a", "b", "c"] {
            list.insert_back(l).unwrap();
        }
        ListEngine::delete(&mut list, "b").unwrap();
        list.insert_front("z").unwrap();
        assert_eq!(list.arena.len(), 3);
        assert_eq!(list.labels(), vec!["z", "a", "c"]);
        assert_eq!(list.verify(), Ok(()));
    }

    #[test]
    fn delete_miss_is_animated_notice() {
        let mut list = ListEngine::new();
        list.insert_back("a").unwrap();
        let miss = ListEngine::delete(&mut list, "q").unwrap();
        assert_eq!(miss.value, None);
        assert!(miss.timeline.is_empty());
        assert_eq!(miss.timeline.notice().unwrap().text, "Value \"q\" not found in list.");
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn empty_reads_are_null() {
        let list = ListEngine::new();
        let snap = list.snapshot();
        assert_eq!(snap.readout("head"), Some("null"));
        assert_eq!(snap.readout("tail"), Some("null"));
        assert_eq!(snap.readout("size"), Some("0"));
    }

    #[test]
    fn search_reports_position() {
        let mut list = ListEngine::new();
        for l in ["a", "b", "c"] {
            list.insert_back(l).unwrap();
        }
        let hit = list.search("c").unwrap();
        assert_eq!(hit.value, Some(2));
        assert_eq!(hit.timeline.notice().unwrap().text, "Found value \"c\" at position 3");
    }
}
