//! FIFO queue.

use std::collections::VecDeque;

use crate::config::StepDurations;
use crate::engine::{Animated, Engine, Outcome, StructureKind};
use crate::error::{EngineError, Result};
use crate::layout::PositionHint;
use crate::snapshot::{or_null, NodeView, Snapshot};
use crate::timeline::{Notice, StepTimeline, Tone};
use crate::value::{parse_label, Element, ElementId, IdAllocator, ScalarValue};

#[derive(Debug, Clone, Default)]
pub struct QueueEngine {
    items: VecDeque<Element<String>>,
    ids: IdAllocator,
    durations: StepDurations,
}

impl QueueEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_durations(durations: StepDurations) -> Self {
        Self {
            durations,
            ..Self::default()
        }
    }

    /// Join at the rear.
    pub fn enqueue(&mut self, input: &str) -> Result<Animated<ElementId>> {
        let label = parse_label(input)?;
        let id = self.ids.allocate();
        let mut timeline = StepTimeline::new();
        timeline.move_to(id, PositionHint::linear(self.items.len()), self.durations.slide);
        if self.items.is_empty() {
            timeline.recolor(id, Tone::Top, 0);
        }

        tracing::debug!(%id, %label, position = self.items.len(), "enqueue");
        self.items.push_back(Element { id, value: label });
        Ok(Animated::new(id, timeline))
    }

    /// Leave from the front; everyone behind slides up one place.
    pub fn dequeue(&mut self) -> Result<Animated<String>> {
        let front = self.items.pop_front().ok_or(EngineError::Empty)?;
        let mut timeline = StepTimeline::new();
        timeline.remove(front.id, self.durations.slide);

        let shifts: Vec<_> = self
            .items
            .iter()
            .enumerate()
            .map(|(i, e)| (e.id, PositionHint::linear(i)))
            .collect();
        timeline.move_together(&shifts, self.durations.slide);
        if let Some(new_front) = self.items.front() {
            timeline.recolor(new_front.id, Tone::Top, 0);
        }

        tracing::debug!(id = %front.id, label = %front.value, "dequeue");
        Ok(Animated::new(front.value, timeline))
    }

    pub fn front(&self) -> Option<&str> {
        self.items.front().map(|e| e.value.as_str())
    }

    pub fn rear(&self) -> Option<&str> {
        self.items.back().map(|e| e.value.as_str())
    }

    /// Scan front to back; the first match wins.
    pub fn search(&self, input: &str) -> Result<Animated<Option<usize>>> {
        let needle = parse_label(input)?;
        let mut timeline = StepTimeline::new();
        for (position, element) in self.items.iter().enumerate() {
            timeline.highlight(element.id, Tone::Visiting, self.durations.visit);
            if element.value == needle {
                timeline.recolor(element.id, Tone::Found, 0);
                timeline.set_notice(Notice::found_at(
                    &needle,
                    "position",
                    position,
                    self.durations.notice,
                ));
                return Ok(Animated::new(Some(position), timeline));
            }
            let resting = if position == 0 { Tone::Top } else { Tone::Default };
            timeline.recolor(element.id, resting, 0);
        }

        timeline.set_notice(Notice::not_found(
            &needle,
            StructureKind::Queue.noun(),
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

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Labels front to rear.
    pub fn labels(&self) -> Vec<&str> {
        self.items.iter().map(|e| e.value.as_str()).collect()
    }
}

impl Engine for QueueEngine {
    fn kind(&self) -> StructureKind {
        StructureKind::Queue
    }

    fn insert(&mut self, input: &str) -> Outcome {
        self.enqueue(input).into()
    }

    /// Dequeues; the input is not consulted.
    fn delete(&mut self, _input: &str) -> Outcome {
        self.dequeue().into()
    }

    fn search(&self, input: &str) -> Outcome {
        QueueEngine::search(self, input).into()
    }

    fn clear(&mut self) -> Outcome {
        Outcome::Animated(QueueEngine::clear(self).timeline)
    }

    fn snapshot(&self) -> Snapshot {
        let mut snap = Snapshot::new(StructureKind::Queue);
        let ids: Vec<_> = self.items.iter().map(|e| e.id).collect();
        snap.nodes = self
            .items
            .iter()
            .enumerate()
            .map(|(i, e)| {
                let mut node = NodeView::new(
                    e.id,
                    ScalarValue::Label(e.value.clone()),
                    PositionHint::linear(i),
                );
                node.next = ids.get(i + 1).copied();
                node
            })
            .collect();
        snap.push_readout("front", or_null(self.front()));
        snap.push_readout("rear", or_null(self.rear()));
        snap.push_readout("size", self.len().to_string());
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

    fn queue_of(labels: &[&str]) -> QueueEngine {
        let mut queue = QueueEngine::new();
        for l in labels {
            queue.enqueue(l).unwrap();
        }
        queue
    }

    #[test]
    fn fifo_front_after_dequeue() {
        let mut queue = queue_of(&["a", "b", "c"]);
        assert_eq!(queue.dequeue().unwrap().value, "a");
        assert_eq!(queue.front(), Some("b"));
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn dequeue_shifts_the_rest() {
        let mut queue = queue_of(&["a", "b", "c"]);
        let b = queue.items[1].id;
        let c = queue.items[2].id;
        let out = queue.dequeue().unwrap();

        let moves: Vec<_> = out
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
            vec![(b, PositionHint::linear(0)), (c, PositionHint::linear(1))]
        );
        assert_eq!(out.timeline.events()[0].kind, StepKind::Remove);
    }

    #[test]
    fn dequeue_empty_is_error() {
        let mut queue = QueueEngine::new();
        assert_eq!(queue.dequeue(), Err(EngineError::Empty));
        assert_eq!(queue.snapshot().readout("front"), Some("null"));
    }

    #[test]
    fn search_front_to_back() {
        let queue = queue_of(&["x", "y", "y"]);
        let hit = queue.search("y").unwrap();
        assert_eq!(hit.value, Some(1));
        assert_eq!(hit.timeline.notice().unwrap().text, "Found value \"y\" at position 2");

        let miss = queue.search("q").unwrap();
        assert_eq!(miss.value, None);
        // one highlight and one reset per element
        assert_eq!(miss.timeline.len(), 6);
    }

    #[test]
    fn snapshot_links_successors() {
        let queue = queue_of(&["a", "b"]);
        let snap = queue.snapshot();
        assert_eq!(snap.nodes[0].next, Some(snap.nodes[1].id));
        assert_eq!(snap.nodes[1].next, None);
        assert_eq!(snap.readout("rear"), Some("b"));
    }
}
