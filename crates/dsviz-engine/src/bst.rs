//! Binary search tree over unique integers.
//!
//! Nodes live in an arena and link by slot index. Children are owned
//! top-down; `parent` is a lookup-only back link and never decides what gets
//! freed. A two-child delete copies the in-order successor's value into the
//! target and frees the successor's node, so the target keeps its identity.

use std::collections::{HashMap, VecDeque};

use crate::config::StepDurations;
use crate::engine::{Animated, Engine, Outcome, StructureKind};
use crate::error::{EngineError, Result};
use crate::invariant::{self, InvariantViolation};
use crate::layout::{self, PositionHint};
use crate::snapshot::{or_null, NodeView, Snapshot};
use crate::timeline::{Notice, StepTimeline, Tone};
use crate::traversal::{self, Order, TreeShape};
use crate::value::{parse_number, ElementId, IdAllocator, ScalarValue};

type Slot = usize;

#[derive(Debug, Clone)]
struct BstNode {
    id: ElementId,
    value: i64,
    parent: Option<Slot>,
    left: Option<Slot>,
    right: Option<Slot>,
}

#[derive(Debug, Clone, Default)]
pub struct BstEngine {
    arena: Vec<Option<BstNode>>,
    free: Vec<Slot>,
    root: Option<Slot>,
    len: usize,
    ids: IdAllocator,
    durations: StepDurations,
}

impl BstEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_durations(durations: StepDurations) -> Self {
        Self {
            durations,
            ..Self::default()
        }
    }

    fn get(&self, slot: Slot) -> Option<&BstNode> {
        self.arena.get(slot).and_then(Option::as_ref)
    }

    /// Follow a link that the tree guarantees is live.
    #[track_caller]
    fn node(&self, slot: Slot) -> &BstNode {
        self.get(slot)
            .unwrap_or_else(|| invariant::violated(InvariantViolation::DanglingLink { slot }))
    }

    #[track_caller]
    fn node_mut(&mut self, slot: Slot) -> &mut BstNode {
        self.arena
            .get_mut(slot)
            .and_then(Option::as_mut)
            .unwrap_or_else(|| invariant::violated(InvariantViolation::DanglingLink { slot }))
    }

    fn alloc(&mut self, node: BstNode) -> Slot {
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

    #[track_caller]
    fn release(&mut self, slot: Slot) -> BstNode {
        let node = self
            .arena
            .get_mut(slot)
            .and_then(Option::take)
            .unwrap_or_else(|| invariant::violated(InvariantViolation::DanglingLink { slot }));
        self.free.push(slot);
        node
    }

    /// Element positions in level order.
    fn layout(&self) -> Vec<(ElementId, PositionHint)> {
        let mut out = Vec::with_capacity(self.len);
        let mut queue: VecDeque<(Slot, PositionHint)> =
            self.root.map(|r| (r, PositionHint::ROOT)).into_iter().collect();
        while let Some((slot, at)) = queue.pop_front() {
            let node = self.node(slot);
            out.push((node.id, at));
            if let Some(l) = node.left {
                queue.push_back((l, at.left()));
            }
            if let Some(r) = node.right {
                queue.push_back((r, at.right()));
            }
        }
        out
    }

    fn layout_map(&self) -> HashMap<ElementId, PositionHint> {
        self.layout().into_iter().collect()
    }

    fn find(&self, value: i64) -> Option<Slot> {
        let mut cursor = self.root;
        while let Some(slot) = cursor {
            let node = self.node(slot);
            if value == node.value {
                return Some(slot);
            }
            cursor = if value < node.value { node.left } else { node.right };
        }
        None
    }

    fn min_of(&self, mut slot: Slot) -> Slot {
        while let Some(l) = self.node(slot).left {
            slot = l;
        }
        slot
    }

    /// Attach a new leaf. Duplicates are rejected before anything changes.
    pub fn insert(&mut self, input: &str) -> Result<Animated<ElementId>> {
        let value = parse_number(input)?;
        let mut timeline = StepTimeline::new();
        let mut path = Vec::new();
        let mut parent = None;
        let mut go_left = false;
        let mut cursor = self.root;

        while let Some(slot) = cursor {
            let node = self.node(slot);
            if value == node.value {
                return Err(EngineError::Duplicate(value));
            }
            timeline.highlight(node.id, Tone::Visiting, self.durations.swap_half);
            path.push(node.id);
            parent = Some(slot);
            go_left = value < node.value;
            cursor = if go_left { node.left } else { node.right };
        }

        let before = self.layout_map();
        let id = self.ids.allocate();
        let slot = self.alloc(BstNode {
            id,
            value,
            parent,
            left: None,
            right: None,
        });
        match parent {
            None => self.root = Some(slot),
            Some(p) if go_left => self.node_mut(p).left = Some(slot),
            Some(p) => self.node_mut(p).right = Some(slot),
        }
        self.len += 1;
        tracing::debug!(%id, value, depth = path.len(), "bst insert");
        invariant::enforce(self.verify());

        for visited in path {
            timeline.recolor(visited, Tone::Default, 0);
        }
        timeline.move_together(&layout::moved(&before, &self.layout()), self.durations.slide);
        Ok(Animated::new(id, timeline))
    }

    /// Remove a value. A miss changes nothing and carries a notice.
    pub fn delete(&mut self, input: &str) -> Result<Animated<Option<i64>>> {
        let value = parse_number(input)?;
        let Some(target) = self.find(value) else {
            let timeline = StepTimeline::new().with_notice(Notice::not_found(
                &value,
                StructureKind::BinarySearchTree.noun(),
                self.durations.notice,
            ));
            return Ok(Animated::new(None, timeline));
        };

        let before = self.layout_map();
        let mut timeline = StepTimeline::new();
        self.unlink(target, &mut timeline);
        self.len -= 1;
        tracing::debug!(value, remaining = self.len, "bst delete");
        invariant::enforce(self.verify());

        timeline.move_together(&layout::moved(&before, &self.layout()), self.durations.slide);
        Ok(Animated::new(Some(value), timeline))
    }

    fn unlink(&mut self, slot: Slot, timeline: &mut StepTimeline) {
        let (left, right) = {
            let node = self.node(slot);
            (node.left, node.right)
        };
        match (left, right) {
            (Some(_), Some(r)) => {
                let successor = self.min_of(r);
                let (succ_id, succ_value) = {
                    let s = self.node(successor);
                    (s.id, s.value)
                };
                timeline.highlight(succ_id, Tone::Visiting, self.durations.visit);

                let target = self.node_mut(slot);
                target.value = succ_value;
                let target_id = target.id;
                timeline.relabel(
                    target_id,
                    Tone::Default,
                    ScalarValue::Int(succ_value),
                    self.durations.swap_half,
                );
                // the successor has no left child
                self.unlink(successor, timeline);
            }
            (child, None) | (None, child) => {
                self.splice(slot, child);
                let gone = self.release(slot);
                timeline.remove(gone.id, self.durations.slide);
            }
        }
    }

    /// Replace `slot` with `child` under its parent.
    fn splice(&mut self, slot: Slot, child: Option<Slot>) {
        let parent = self.node(slot).parent;
        if let Some(c) = child {
            self.node_mut(c).parent = parent;
        }
        match parent {
            None => self.root = child,
            Some(p) => {
                let up = self.node_mut(p);
                if up.left == Some(slot) {
                    up.left = child;
                } else {
                    up.right = child;
                }
            }
        }
    }

    /// Root-to-leaf descent. The visited path stays lit until the end.
    pub fn search(&self, input: &str) -> Result<Animated<Option<ElementId>>> {
        let value = parse_number(input)?;
        let mut timeline = StepTimeline::new();
        let mut path = Vec::new();
        let mut cursor = self.root;
        let mut hit = None;

        while let Some(slot) = cursor {
            let node = self.node(slot);
            timeline.highlight(node.id, Tone::Visiting, self.durations.visit);
            if value == node.value {
                hit = Some(node.id);
                break;
            }
            path.push(node.id);
            cursor = if value < node.value { node.left } else { node.right };
        }

        for visited in path {
            timeline.recolor(visited, Tone::Default, 0);
        }
        match hit {
            Some(id) => {
                timeline.recolor(id, Tone::Found, 0);
                timeline.set_notice(Notice::found(&value, self.durations.notice));
            }
            None => timeline.set_notice(Notice::not_found(
                &value,
                StructureKind::BinarySearchTree.noun(),
                self.durations.notice,
            )),
        }
        Ok(Animated::new(hit, timeline))
    }

    pub fn clear(&mut self) -> Animated<usize> {
        let mut timeline = StepTimeline::new();
        for (id, _) in self.layout() {
            timeline.remove(id, 0);
        }
        let count = self.len;
        self.arena.clear();
        self.free.clear();
        self.root = None;
        self.len = 0;
        Animated::new(count, timeline)
    }

    pub fn contains(&self, value: i64) -> bool {
        self.find(value).is_some()
    }

    pub fn root_value(&self) -> Option<i64> {
        self.root.map(|r| self.node(r).value)
    }

    pub fn root_id(&self) -> Option<ElementId> {
        self.root.map(|r| self.node(r).id)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn height(&self) -> usize {
        traversal::height(self)
    }

    pub fn traverse(&self, order: Order) -> Vec<i64> {
        traversal::traverse(self, order)
            .into_iter()
            .map(|slot| self.node(slot).value)
            .collect()
    }

    pub fn inorder(&self) -> Vec<i64> {
        self.traverse(Order::In)
    }

    /// Parent links agree with child links, in-order is strictly
    /// increasing, and `len` counts exactly the reachable nodes.
    pub fn verify(&self) -> std::result::Result<(), InvariantViolation> {
        let mut reachable = 0;
        let mut stack: Vec<(Slot, Option<Slot>)> = self.root.map(|r| (r, None)).into_iter().collect();
        while let Some((slot, expected_parent)) = stack.pop() {
            let node = self.get(slot).ok_or(InvariantViolation::DanglingLink { slot })?;
            if node.parent != expected_parent {
                return Err(InvariantViolation::ParentLink {
                    child: node.id.0,
                    parent: expected_parent.and_then(|p| self.get(p)).map(|p| p.id.0),
                });
            }
            reachable += 1;
            stack.extend(node.left.map(|l| (l, Some(slot))));
            stack.extend(node.right.map(|r| (r, Some(slot))));
        }

        if reachable != self.len || self.arena.iter().flatten().count() != self.len {
            return Err(InvariantViolation::SizeMismatch {
                reported: self.len,
                actual: reachable,
            });
        }

        for pair in self.inorder().windows(2) {
            if pair[0] == pair[1] {
                return Err(InvariantViolation::DuplicateValue(pair[0]));
            }
            if pair[0] > pair[1] {
                return Err(InvariantViolation::SearchOrder {
                    left: pair[0],
                    right: pair[1],
                });
            }
        }
        Ok(())
    }
}

impl TreeShape for BstEngine {
    type Node = Slot;

    fn root(&self) -> Option<Slot> {
        self.root
    }

    fn left(&self, node: Slot) -> Option<Slot> {
        self.get(node).and_then(|n| n.left)
    }

    fn right(&self, node: Slot) -> Option<Slot> {
        self.get(node).and_then(|n| n.right)
    }
}

impl Engine for BstEngine {
    fn kind(&self) -> StructureKind {
        StructureKind::BinarySearchTree
    }

    fn insert(&mut self, input: &str) -> Outcome {
        BstEngine::insert(self, input).into()
    }

    fn delete(&mut self, input: &str) -> Outcome {
        BstEngine::delete(self, input).into()
    }

    fn search(&self, input: &str) -> Outcome {
        BstEngine::search(self, input).into()
    }

    fn clear(&mut self) -> Outcome {
        Outcome::Animated(BstEngine::clear(self).timeline)
    }

    fn snapshot(&self) -> Snapshot {
        let mut snap = Snapshot::new(StructureKind::BinarySearchTree);
        let id_of = |slot: Option<Slot>| slot.map(|s| self.node(s).id);
        snap.nodes = traversal::levelorder(self)
            .into_iter()
            .zip(self.layout())
            .map(|(slot, (_, position))| {
                let node = self.node(slot);
                NodeView::new(node.id, ScalarValue::Int(node.value), position).with_links(
                    id_of(node.parent),
                    id_of(node.left),
                    id_of(node.right),
                )
            })
            .collect();
        snap.push_readout("root", or_null(self.root_value()));
        snap.push_readout("size", self.len.to_string());
        snap.push_readout("height", self.height().to_string());
        for order in Order::ALL {
            snap.push_readout(order.label(), traversal::join(self.traverse(order)));
        }
        snap
    }

    fn len(&self) -> usize {
        self.len
    }
}
